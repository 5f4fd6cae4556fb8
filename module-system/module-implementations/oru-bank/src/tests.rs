use oru_modules_api::default_context::DefaultContext;
use oru_modules_api::utils::generate_address;
use oru_modules_api::{Context, Module};
use oru_state::{MockStorage, WorkingSet};

use crate::call::BankError;
use crate::{Bank, BankConfig};

type C = DefaultContext;

fn setup(balances: &[(&str, u64)]) -> (Bank<C>, WorkingSet<MockStorage>) {
    let bank = Bank::<C>::default();
    let mut working_set = WorkingSet::new(MockStorage::new());
    let config = BankConfig {
        address_and_balances: balances
            .iter()
            .map(|(name, balance)| (generate_address::<C>(name), *balance))
            .collect(),
    };
    bank.genesis(&config, &mut working_set).unwrap();
    (bank, working_set)
}

#[test]
fn transfer_moves_balance() {
    let (bank, mut ws) = setup(&[("alice", 100), ("bob", 5)]);
    let alice = generate_address::<C>("alice");
    let bob = generate_address::<C>("bob");

    bank.transfer(bob, 30, &C::new(alice), &mut ws).unwrap();
    assert_eq!(70, bank.balance_of(&alice, &mut ws));
    assert_eq!(35, bank.balance_of(&bob, &mut ws));

    assert!(bank.transfer(alice, 100, &C::new(bob), &mut ws).is_err());
}

#[test]
fn freeze_release_round_trip() {
    let (bank, mut ws) = setup(&[("alice", 100)]);
    let alice = generate_address::<C>("alice");

    let update = bank.freeze(&alice, 40, &mut ws).unwrap();
    assert_eq!(60, update.spendable);
    assert_eq!(40, update.frozen);
    assert_eq!(40, bank.frozen_of(&alice, &mut ws));

    let update = bank.release(&alice, &mut ws).unwrap();
    assert_eq!(100, update.spendable);
    assert_eq!(0, update.frozen);
    assert_eq!(0, bank.frozen_of(&alice, &mut ws));
}

#[test]
fn freeze_fails_without_funds() {
    let (bank, mut ws) = setup(&[("alice", 10)]);
    let alice = generate_address::<C>("alice");

    let err = bank.freeze(&alice, 40, &mut ws).unwrap_err();
    assert!(matches!(err, BankError::InsufficientFunds { .. }));
    assert_eq!(10, bank.balance_of(&alice, &mut ws));
    assert_eq!(0, bank.frozen_of(&alice, &mut ws));
}

#[test]
fn bond_arithmetic_checks_for_overflow() {
    let (bank, mut ws) = setup(&[("alice", u64::MAX), ("bob", 100)]);
    let alice = generate_address::<C>("alice");
    let bob = generate_address::<C>("bob");

    bank.freeze(&bob, 100, &mut ws).unwrap();
    bank.transfer(bob, u64::MAX, &C::new(alice), &mut ws).unwrap();

    // Freezing on top of an existing bond must not wrap the frozen total.
    assert!(matches!(
        bank.freeze(&bob, u64::MAX, &mut ws),
        Err(BankError::BalanceOverflow { .. })
    ));
    // Neither may returning the bond wrap the spendable balance.
    assert!(matches!(
        bank.release(&bob, &mut ws),
        Err(BankError::BalanceOverflow { .. })
    ));
    assert_eq!(100, bank.frozen_of(&bob, &mut ws));
}

#[test]
fn burn_destroys_bond() {
    let (bank, mut ws) = setup(&[("alice", 100)]);
    let alice = generate_address::<C>("alice");

    bank.freeze(&alice, 40, &mut ws).unwrap();
    let update = bank.burn(&alice, &mut ws).unwrap();
    assert_eq!(60, update.spendable);
    assert_eq!(0, update.frozen);

    // A second burn has nothing left to take.
    assert!(matches!(
        bank.burn(&alice, &mut ws),
        Err(BankError::NothingFrozen { .. })
    ));
}
