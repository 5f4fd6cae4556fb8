use anyhow::Result;
use oru_modules_api::CallResponse;
use oru_state::WorkingSet;
use thiserror::Error;

use crate::{Amount, BalanceUpdate, Bank};

/// This enumeration represents the available call messages for interacting
/// with the oru-bank module.
#[derive(borsh::BorshDeserialize, borsh::BorshSerialize, Debug, PartialEq, Clone)]
pub enum CallMessage<C: oru_modules_api::Context> {
    /// Transfers a specified amount of tokens to the specified address.
    Transfer {
        /// The address to which the tokens will be transferred.
        to: C::Address,
        /// The amount of tokens to transfer.
        amount: Amount,
    },
}

/// Errors raised by bank balance movements.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BankError {
    #[error("Insufficient funds for {address}: needed {needed}, available {available}")]
    InsufficientFunds {
        address: String,
        needed: Amount,
        available: Amount,
    },
    #[error("No frozen bond exists for {address}")]
    NothingFrozen { address: String },
    #[error("Balance overflow for {address}")]
    BalanceOverflow { address: String },
}

impl<C: oru_modules_api::Context> Bank<C> {
    pub fn transfer(
        &self,
        to: C::Address,
        amount: Amount,
        context: &C,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> Result<CallResponse> {
        let from = context.sender();
        let from_balance = self.balance_of(from, working_set);
        let new_from_balance = from_balance.checked_sub(amount).ok_or_else(|| {
            BankError::InsufficientFunds {
                address: from.to_string(),
                needed: amount,
                available: from_balance,
            }
        })?;
        let new_to_balance = self
            .balance_of(&to, working_set)
            .checked_add(amount)
            .ok_or_else(|| anyhow::anyhow!("Balance overflow for {}", &to))?;

        self.balances.set(from, &new_from_balance, working_set);
        self.balances.set(&to, &new_to_balance, working_set);

        working_set.add_event(
            "Bank transfer",
            &format!("from={from}, to={to}, amount={amount}"),
        );
        Ok(CallResponse::default())
    }

    /// Moves `amount` from the spendable balance of `staker` into its frozen
    /// bond. Used when a stake is deposited.
    pub fn freeze(
        &self,
        staker: &C::Address,
        amount: Amount,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> Result<BalanceUpdate, BankError> {
        let balance = self.balance_of(staker, working_set);
        let new_balance =
            balance
                .checked_sub(amount)
                .ok_or_else(|| BankError::InsufficientFunds {
                    address: staker.to_string(),
                    needed: amount,
                    available: balance,
                })?;
        let new_frozen = self
            .frozen_of(staker, working_set)
            .checked_add(amount)
            .ok_or_else(|| BankError::BalanceOverflow {
                address: staker.to_string(),
            })?;

        self.balances.set(staker, &new_balance, working_set);
        self.frozen.set(staker, &new_frozen, working_set);

        Ok(BalanceUpdate {
            spendable: new_balance,
            frozen: new_frozen,
        })
    }

    /// Returns the whole frozen bond of `staker` to its spendable balance.
    /// Used on clean stake withdrawal.
    pub fn release(
        &self,
        staker: &C::Address,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> Result<BalanceUpdate, BankError> {
        let frozen = self
            .frozen
            .get(staker, working_set)
            .ok_or_else(|| BankError::NothingFrozen {
                address: staker.to_string(),
            })?;
        let new_balance = self
            .balance_of(staker, working_set)
            .checked_add(frozen)
            .ok_or_else(|| BankError::BalanceOverflow {
                address: staker.to_string(),
            })?;
        self.frozen.delete(staker, working_set);
        self.balances.set(staker, &new_balance, working_set);

        Ok(BalanceUpdate {
            spendable: new_balance,
            frozen: 0,
        })
    }

    /// Destroys the whole frozen bond of `staker`. Used when a staker is
    /// slashed; the tokens leave circulation.
    pub fn burn(
        &self,
        staker: &C::Address,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> Result<BalanceUpdate, BankError> {
        self.frozen
            .remove(staker, working_set)
            .ok_or_else(|| BankError::NothingFrozen {
                address: staker.to_string(),
            })?;

        Ok(BalanceUpdate {
            spendable: self.balance_of(staker, working_set),
            frozen: 0,
        })
    }

    pub fn balance_of(
        &self,
        address: &C::Address,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> Amount {
        self.balances.get(address, working_set).unwrap_or_default()
    }

    pub fn frozen_of(
        &self,
        address: &C::Address,
        working_set: &mut WorkingSet<C::Storage>,
    ) -> Amount {
        self.frozen.get(address, working_set).unwrap_or_default()
    }
}
