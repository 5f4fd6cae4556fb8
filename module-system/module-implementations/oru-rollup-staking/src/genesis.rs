use anyhow::{ensure, Result};
use oru_state::WorkingSet;

use crate::{
    Commitment, CommitmentHash, CommitmentPointer, Level, RollupConstants, RollupStaking,
    StateHash,
};

/// Initial configuration for the oru-rollup-staking module.
pub struct RollupStakingConfig {
    /// Economic constants of the rollup.
    pub constants: RollupConstants,
    /// The state claimed by the genesis commitment.
    pub genesis_state_hash: StateHash,
    /// The inbox level of the genesis commitment.
    pub genesis_inbox_level: Level,
}

impl<C: oru_modules_api::Context> RollupStaking<C> {
    pub(crate) fn init_module(
        &self,
        config: &RollupStakingConfig,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> Result<()> {
        let constants = &config.constants;
        ensure!(constants.stake_amount > 0, "Stake amount must be non-zero");
        ensure!(
            constants.commitment_period > 0,
            "Commitment period must be non-zero"
        );
        ensure!(
            constants.max_lookahead >= constants.commitment_period,
            "Lookahead must admit at least one commitment"
        );
        ensure!(
            constants.number_of_sections >= 2,
            "A dissection needs at least two sections"
        );
        ensure!(
            constants.cemented_commitments_kept > 0,
            "At least the last cemented commitment must be retained"
        );
        self.constants.set(constants, working_set);

        // The genesis commitment anchors the tree. It has no predecessor and
        // zero ticks; `publish` never accepts such a commitment, so it is
        // unambiguous in storage.
        let genesis = Commitment {
            predecessor: CommitmentHash::default(),
            inbox_level: config.genesis_inbox_level,
            compressed_state: config.genesis_state_hash,
            number_of_ticks: 0,
        };
        let hash = genesis.hash::<C::Hasher>();
        self.commitments.set(&hash, &genesis, working_set);
        self.commitment_added_level
            .set(&hash, &config.genesis_inbox_level, working_set);
        self.last_cemented.set(
            &CommitmentPointer {
                hash,
                inbox_level: config.genesis_inbox_level,
            },
            working_set,
        );

        self.cemented_commitments.set(&0, &hash, working_set);
        self.oldest_cemented.set(&0, working_set);
        self.next_cemented.set(&1, working_set);
        Ok(())
    }
}
