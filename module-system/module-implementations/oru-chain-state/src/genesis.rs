use anyhow::Result;
use oru_state::WorkingSet;

use crate::{ChainState, ChainStateConfig};

impl<C: oru_modules_api::Context> ChainState<C> {
    pub(crate) fn init_module(
        &self,
        config: &ChainStateConfig,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> Result<()> {
        self.current_level.set(&config.initial_level, working_set);
        Ok(())
    }
}
