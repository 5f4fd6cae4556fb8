use crate::{Context, Hasher, Spec};

/// Derives a deterministic address from an arbitrary key string. Used in
/// tests and genesis configs to mint account addresses.
pub fn generate_address<C: Context>(key: &str) -> <C as Spec>::Address {
    let hash = <C as Spec>::Hasher::digest(key.as_bytes());
    <C as Spec>::Address::from(hash)
}
