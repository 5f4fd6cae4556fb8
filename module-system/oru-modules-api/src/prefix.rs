use core::fmt;

use crate::{Context, Hasher};

const DOMAIN_SEPARATOR: [u8; 2] = *b"::";
const PREFIX_SEPARATOR: [u8; 1] = *b"/";

/// A prefix prepended to each key under a module's storage. Built from the
/// module's Rust path, the module's name, and (for state containers) the
/// name of the container field, so that no two containers in a rollup can
/// collide.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Prefix {
    module_path: String,
    module_name: String,
    storage_name: Option<String>,
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.storage_name {
            Some(storage_name) => {
                write!(f, "{}::{}/{}/", self.module_path, self.module_name, storage_name)
            }
            None => write!(f, "{}::{}/", self.module_path, self.module_name),
        }
    }
}

impl Prefix {
    /// Creates a prefix for a state container field of a module.
    pub fn new_storage(
        module_path: &str,
        module_name: &str,
        storage_name: &str,
    ) -> Self {
        Self {
            module_path: module_path.to_string(),
            module_name: module_name.to_string(),
            storage_name: Some(storage_name.to_string()),
        }
    }

    /// Creates a prefix for the module itself, used to derive its address.
    pub fn new_module(module_path: &str, module_name: &str) -> Self {
        Self {
            module_path: module_path.to_string(),
            module_name: module_name.to_string(),
            storage_name: None,
        }
    }

    fn combine_prefix(&self) -> Vec<u8> {
        let storage_name_len = self
            .storage_name
            .as_ref()
            .map(|name| name.len() + PREFIX_SEPARATOR.len())
            .unwrap_or_default();

        let mut combined_prefix = Vec::with_capacity(
            self.module_path.len()
                + DOMAIN_SEPARATOR.len()
                + self.module_name.len()
                + PREFIX_SEPARATOR.len()
                + storage_name_len,
        );

        combined_prefix.extend(self.module_path.as_bytes());
        combined_prefix.extend(DOMAIN_SEPARATOR);
        combined_prefix.extend(self.module_name.as_bytes());
        combined_prefix.extend(PREFIX_SEPARATOR);
        if let Some(storage_name) = &self.storage_name {
            combined_prefix.extend(storage_name.as_bytes());
            combined_prefix.extend(PREFIX_SEPARATOR);
        }
        combined_prefix
    }

    /// Hashes the combined prefix with the context's preferred hasher.
    pub fn hash<C: Context>(&self) -> [u8; 32] {
        let combined_prefix = self.combine_prefix();
        C::Hasher::digest(combined_prefix)
    }
}

impl From<Prefix> for oru_state::Prefix {
    fn from(prefix: Prefix) -> Self {
        let combined_prefix = prefix.combine_prefix();
        oru_state::Prefix::new(combined_prefix)
    }
}
