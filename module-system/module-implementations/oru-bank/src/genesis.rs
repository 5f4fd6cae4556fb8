use anyhow::{bail, Result};
use oru_state::WorkingSet;

use crate::{Bank, BankConfig};

impl<C: oru_modules_api::Context> Bank<C> {
    pub(crate) fn init_module(
        &self,
        config: &BankConfig<C>,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> Result<()> {
        for (address, balance) in config.address_and_balances.iter() {
            if self.balances.get(address, working_set).is_some() {
                bail!("Duplicate genesis balance for address {}", address);
            }
            self.balances.set(address, balance, working_set);
        }
        Ok(())
    }
}
