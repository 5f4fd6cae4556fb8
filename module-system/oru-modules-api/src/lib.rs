#![doc = include_str!("../README.md")]

pub mod default_context;
mod error;
mod hasher;
mod prefix;
mod response;
pub mod utils;

#[cfg(test)]
mod tests;

use core::fmt::{self, Debug, Display};
use std::hash::Hash;

use borsh::{BorshDeserialize, BorshSerialize};
pub use error::Error;
pub use hasher::Hasher;
pub use oru_state::{Event, Storage, WorkingSet};
pub use prefix::Prefix;
pub use response::CallResponse;

/// A type that can't be instantiated. Used as the `CallMessage` of modules
/// that expose no calls.
#[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum NonInstantiable {}

impl BorshDeserialize for NonInstantiable {
    fn deserialize_reader<R: std::io::Read>(_reader: &mut R) -> std::io::Result<Self> {
        Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            "NonInstantiable type cannot be deserialized",
        ))
    }
}

impl BorshSerialize for NonInstantiable {
    fn serialize<W: std::io::Write>(&self, _writer: &mut W) -> std::io::Result<()> {
        unreachable!()
    }
}

/// Types which can be used as on-rollup account identifiers.
pub trait AddressTrait:
    PartialEq
    + Clone
    + Debug
    + Send
    + Sync
    + Eq
    + Hash
    + From<[u8; 32]>
    + AsRef<[u8]>
    + Display
    + 'static
{
}

/// The default 32-byte address type.
#[derive(PartialEq, Eq, Clone, Copy, Hash, borsh::BorshDeserialize, borsh::BorshSerialize)]
pub struct Address {
    addr: [u8; 32],
}

impl AddressTrait for Address {}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.addr
    }
}

impl<'a> TryFrom<&'a [u8]> for Address {
    type Error = anyhow::Error;

    fn try_from(addr: &'a [u8]) -> Result<Self, Self::Error> {
        if addr.len() != 32 {
            anyhow::bail!("Address must be 32 bytes long");
        }
        let mut addr_bytes = [0u8; 32];
        addr_bytes.copy_from_slice(addr);
        Ok(Self { addr: addr_bytes })
    }
}

impl From<[u8; 32]> for Address {
    fn from(addr: [u8; 32]) -> Self {
        Self { addr }
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.addr))
    }
}

impl Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.addr))
    }
}

/// The `Spec` trait configures certain key primitives to be used by a
/// particular instance of a rollup. `Spec` is almost always implemented on a
/// Context object; since all modules are generic over a Context, rollup
/// developers can easily optimize their code for different environments by
/// simply swapping out the Context (and by extension, the Spec).
pub trait Spec {
    /// The Address type used on the rollup. Typically calculated as the hash
    /// of a public key.
    type Address: AddressTrait + BorshSerialize + BorshDeserialize;

    /// State storage used by the rollup.
    type Storage: Storage + Clone + Send + Sync;

    /// The hasher preferred by the rollup, such as Sha256.
    type Hasher: Hasher;
}

/// A context contains information which is passed to modules during
/// transaction execution. Currently, context includes the sender of the
/// transaction as recovered from its signature.
///
/// Context objects also implement the [`Spec`] trait, which specifies the
/// types to be used in this instance of the state transition function.
pub trait Context: Spec + Clone + Debug + PartialEq {
    /// Sender of the transaction.
    fn sender(&self) -> &Self::Address;

    /// Constructor for the Context.
    fn new(sender: Self::Address) -> Self;
}

/// Every module has to implement this trait. A module:
/// - Must contain an address field, derived from its prefix
/// - Can contain any number of state containers and references to other
///   modules
///
/// The `Default` impl wires every state container to its
/// `Prefix::new_storage(module_path!(), module_name, field_name)` key.
pub trait ModuleInfo: Default {
    type Context: Context;

    /// Returns the address of the module.
    fn address(&self) -> &<Self::Context as Spec>::Address;
}

/// Implemented by modules to participate in genesis and transaction
/// execution.
pub trait Module {
    /// Execution context.
    type Context: Context;

    /// Configuration for the genesis method.
    type Config;

    /// Module defined argument to the call method.
    type CallMessage: Debug + BorshSerialize + BorshDeserialize;

    /// Genesis is called when a rollup is deployed and can be used to set
    /// initial state values in the module.
    fn genesis(
        &self,
        _config: &Self::Config,
        _working_set: &mut WorkingSet<<Self::Context as Spec>::Storage>,
    ) -> Result<(), Error> {
        Ok(())
    }

    /// Call allows interaction with the module and invokes state changes.
    /// It takes a module defined type and a context as parameters.
    fn call(
        &self,
        _message: Self::CallMessage,
        _context: &Self::Context,
        _working_set: &mut WorkingSet<<Self::Context as Spec>::Storage>,
    ) -> Result<CallResponse, Error> {
        unreachable!()
    }
}

/// Derives the address of a module from its prefix, the way the module
/// `Default` impls construct their `address` field.
pub fn module_address<C: Context>(module_path: &'static str, module_name: &'static str) -> C::Address {
    let prefix = Prefix::new_module(module_path, module_name);
    C::Address::from(prefix.hash::<C>())
}
