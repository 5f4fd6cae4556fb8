pub mod call;
pub mod genesis;
#[cfg(feature = "native")]
pub mod query;

#[cfg(test)]
mod tests;

use oru_modules_api::{Error, ModuleInfo, Prefix};
use oru_state::WorkingSet;

/// Token amounts held or frozen by the bank.
pub type Amount = u64;

/// The balances of an account after a bank operation, returned to callers so
/// they can emit audit events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceUpdate {
    pub spendable: Amount,
    pub frozen: Amount,
}

/// Initial configuration for the oru-bank module.
pub struct BankConfig<C: oru_modules_api::Context> {
    pub address_and_balances: Vec<(C::Address, Amount)>,
}

/// The oru-bank module manages the single rollup token. It tracks spendable
/// account balances and the frozen bonds backing rollup stakes, and exposes
/// the freeze/release/burn lifecycle those bonds move through.
#[derive(Clone)]
pub struct Bank<C: oru_modules_api::Context> {
    /// The address of the oru-bank module.
    pub(crate) address: C::Address,

    /// A mapping of addresses to spendable balances.
    pub(crate) balances: oru_state::StateMap<C::Address, Amount>,

    /// A mapping of addresses to bond amounts frozen for the rollup.
    pub(crate) frozen: oru_state::StateMap<C::Address, Amount>,
}

impl<C: oru_modules_api::Context> Default for Bank<C> {
    fn default() -> Self {
        Self {
            address: oru_modules_api::module_address::<C>(module_path!(), "Bank"),
            balances: oru_state::StateMap::new(
                Prefix::new_storage(module_path!(), "Bank", "balances").into(),
            ),
            frozen: oru_state::StateMap::new(
                Prefix::new_storage(module_path!(), "Bank", "frozen").into(),
            ),
        }
    }
}

impl<C: oru_modules_api::Context> ModuleInfo for Bank<C> {
    type Context = C;

    fn address(&self) -> &C::Address {
        &self.address
    }
}

impl<C: oru_modules_api::Context> oru_modules_api::Module for Bank<C> {
    type Context = C;

    type Config = BankConfig<C>;

    type CallMessage = call::CallMessage<C>;

    fn genesis(
        &self,
        config: &Self::Config,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> Result<(), Error> {
        Ok(self.init_module(config, working_set)?)
    }

    fn call(
        &self,
        msg: Self::CallMessage,
        context: &Self::Context,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> Result<oru_modules_api::CallResponse, Error> {
        match msg {
            call::CallMessage::Transfer { to, amount } => {
                Ok(self.transfer(to, amount, context, working_set)?)
            }
        }
    }
}
