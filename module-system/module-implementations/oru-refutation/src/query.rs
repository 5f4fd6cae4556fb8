use oru_rollup_staking::StakerIndex;
use oru_state::WorkingSet;

use crate::{ProofVerifier, Refutation, RefutationGame};

/// The open game between two stakers, if any.
#[derive(Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GameResponse {
    pub game: Option<RefutationGame>,
}

impl<C: oru_modules_api::Context, Vm: ProofVerifier> Refutation<C, Vm> {
    pub fn game_response(
        &self,
        a: StakerIndex,
        b: StakerIndex,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> GameResponse {
        GameResponse {
            game: self.game(a, b, working_set),
        }
    }
}
