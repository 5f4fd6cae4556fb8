use oru_state::WorkingSet;

use crate::{
    CommitmentHash, CommitmentPointer, Level, RollupConstants, RollupStaking, StakerIndex,
};

/// The last cemented commitment pointer.
#[derive(Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LastCementedResponse {
    pub last_cemented: Option<CommitmentPointer>,
}

/// The rollup's economic constants.
#[derive(Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConstantsResponse {
    pub constants: Option<RollupConstants>,
}

/// The commitments published at one inbox level.
#[derive(Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CommitmentsAtLevelResponse {
    pub commitments: Vec<CommitmentHash>,
}

/// The stakers of one commitment.
#[derive(Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StakersResponse {
    pub stakers: Vec<StakerIndex>,
}

impl<C: oru_modules_api::Context> RollupStaking<C> {
    pub fn last_cemented_response(
        &self,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> LastCementedResponse {
        LastCementedResponse {
            last_cemented: self.last_cemented.get(working_set),
        }
    }

    pub fn constants_response(
        &self,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> ConstantsResponse {
        ConstantsResponse {
            constants: self.constants.get(working_set),
        }
    }

    /// The commitments published at `level`. After cementation only the
    /// cemented commitment remains visible; deallocated siblings are gone.
    pub fn commitments_at_level(
        &self,
        level: Level,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> CommitmentsAtLevelResponse {
        CommitmentsAtLevelResponse {
            commitments: self
                .commitments_at_inbox_level
                .get(&level, working_set)
                .unwrap_or_default(),
        }
    }

    pub fn stakers_of(
        &self,
        hash: &CommitmentHash,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> StakersResponse {
        StakersResponse {
            stakers: self
                .commitment_stakers
                .get(hash, working_set)
                .unwrap_or_default(),
        }
    }
}
