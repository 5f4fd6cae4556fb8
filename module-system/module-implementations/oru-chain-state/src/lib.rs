pub mod genesis;

#[cfg(test)]
mod tests;

use oru_modules_api::{Error, ModuleInfo, NonInstantiable, Prefix};
use oru_state::WorkingSet;

/// A rollup block height. All protocol deadlines (commitment period,
/// challenge window, curfew, move timeouts) are expressed in levels.
pub type Level = u64;

/// Initial configuration for the oru-chain-state module.
pub struct ChainStateConfig {
    pub initial_level: Level,
}

/// The oru-chain-state module tracks the current block level. The enclosing
/// block pipeline advances it once per block; every other module reads it for
/// deadline comparisons.
#[derive(Clone)]
pub struct ChainState<C: oru_modules_api::Context> {
    /// The address of the oru-chain-state module.
    pub(crate) address: C::Address,

    /// The current block level.
    pub(crate) current_level: oru_state::StateValue<Level>,
}

impl<C: oru_modules_api::Context> Default for ChainState<C> {
    fn default() -> Self {
        Self {
            address: oru_modules_api::module_address::<C>(module_path!(), "ChainState"),
            current_level: oru_state::StateValue::new(
                Prefix::new_storage(module_path!(), "ChainState", "current_level").into(),
            ),
        }
    }
}

impl<C: oru_modules_api::Context> ModuleInfo for ChainState<C> {
    type Context = C;

    fn address(&self) -> &C::Address {
        &self.address
    }
}

impl<C: oru_modules_api::Context> oru_modules_api::Module for ChainState<C> {
    type Context = C;

    type Config = ChainStateConfig;

    type CallMessage = NonInstantiable;

    fn genesis(
        &self,
        config: &Self::Config,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> Result<(), Error> {
        Ok(self.init_module(config, working_set)?)
    }
}

impl<C: oru_modules_api::Context> ChainState<C> {
    /// Returns the current block level.
    pub fn current_level(&self, working_set: &mut WorkingSet<C::Storage>) -> Level {
        self.current_level.get(working_set).unwrap_or_default()
    }

    /// Advances the level by one block. Invoked by the block pipeline at the
    /// start of each block; tests drive it directly.
    pub fn advance_level(&self, working_set: &mut WorkingSet<C::Storage>) -> Level {
        let next = self.current_level(working_set) + 1;
        self.current_level.set(&next, working_set);
        next
    }

    /// Jumps the level forward, for simulating the passage of many blocks.
    pub fn set_level(&self, level: Level, working_set: &mut WorkingSet<C::Storage>) {
        self.current_level.set(&level, working_set);
    }
}
