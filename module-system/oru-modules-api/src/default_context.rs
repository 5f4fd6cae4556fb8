use oru_state::MockStorage;

use crate::{Address, Context, Spec};

/// A [`Context`] over in-memory storage, suitable for tests and native
/// execution alike.
#[derive(Clone, Debug, PartialEq)]
pub struct DefaultContext {
    pub sender: Address,
}

impl Spec for DefaultContext {
    type Address = Address;
    type Storage = MockStorage;
    type Hasher = sha2::Sha256;
}

impl Context for DefaultContext {
    fn sender(&self) -> &Self::Address {
        &self.sender
    }

    fn new(sender: Self::Address) -> Self {
        Self { sender }
    }
}
