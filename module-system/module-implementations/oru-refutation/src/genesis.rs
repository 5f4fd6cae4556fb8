use anyhow::{ensure, Result};
use oru_state::WorkingSet;

use crate::{ProofVerifier, Refutation};

/// Initial configuration for the oru-refutation module.
pub struct RefutationConfig {
    /// Blocks a player has to move before it can be timed out.
    pub timeout_period: u64,
}

impl<C: oru_modules_api::Context, Vm: ProofVerifier> Refutation<C, Vm> {
    pub(crate) fn init_module(
        &self,
        config: &RefutationConfig,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> Result<()> {
        ensure!(
            config.timeout_period > 0,
            "Timeout period must be non-zero"
        );
        self.timeout_period.set(&config.timeout_period, working_set);
        Ok(())
    }
}
