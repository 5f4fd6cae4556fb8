use oru_state::WorkingSet;

use crate::{Amount, Bank};

/// Balances of a single account.
#[derive(Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BalanceResponse {
    pub spendable: Amount,
    pub frozen: Amount,
}

impl<C: oru_modules_api::Context> Bank<C> {
    pub fn balance(
        &self,
        address: &C::Address,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> BalanceResponse {
        BalanceResponse {
            spendable: self.balance_of(address, working_set),
            frozen: self.frozen_of(address, working_set),
        }
    }
}
