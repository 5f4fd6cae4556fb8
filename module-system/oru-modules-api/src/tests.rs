use crate::default_context::DefaultContext;
use crate::utils::generate_address;
use crate::{module_address, Address, Prefix};

#[test]
fn test_prefix_is_unique_per_storage_name() {
    let a = Prefix::new_storage("my_module", "Staking", "bonds");
    let b = Prefix::new_storage("my_module", "Staking", "commitments");
    let a: oru_state::Prefix = a.into();
    let b: oru_state::Prefix = b.into();
    assert_ne!(a, b);
}

#[test]
fn test_prefix_serialization() {
    let prefix = Prefix::new_storage("my_module", "Staking", "bonds");
    let converted: oru_state::Prefix = prefix.into();
    assert_eq!(
        converted,
        oru_state::Prefix::new(b"my_module::Staking/bonds/".to_vec())
    );
}

#[test]
fn test_module_address_is_stable() {
    let addr_1 = module_address::<DefaultContext>("my_module", "Staking");
    let addr_2 = module_address::<DefaultContext>("my_module", "Staking");
    assert_eq!(addr_1, addr_2);

    let other = module_address::<DefaultContext>("my_module", "Refutation");
    assert_ne!(addr_1, other);
}

#[test]
fn test_generate_address_roundtrip() {
    let addr = generate_address::<DefaultContext>("staker_1");
    let display = format!("{}", addr);
    assert!(display.starts_with("0x"));
    assert_eq!(display.len(), 2 + 64);

    let parsed = Address::try_from(addr.as_ref()).unwrap();
    assert_eq!(addr, parsed);
}
