/// A key-value pair of strings emitted by a module call.
///
/// Events are the observability channel of the module system: every
/// state-changing operation records what it did here, and the enclosing
/// pipeline surfaces them alongside the transaction receipt.
#[derive(Debug, PartialEq, Eq, Clone, borsh::BorshDeserialize, borsh::BorshSerialize)]
pub struct Event {
    key: String,
    value: String,
}

impl Event {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}
