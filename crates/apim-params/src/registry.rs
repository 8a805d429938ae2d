//! Immutable key registry.
//!
//! The registry is a lookup table over a fixed set of [`Key`] declarations,
//! built once and never mutated. [`KeyRegistry::builtin`] exposes the
//! management plane keys from [`crate::keys`].

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::error::{ParamError, Result};
use crate::key::Key;
use crate::keys::BUILTIN_KEYS;

static BUILTIN: OnceLock<KeyRegistry> = OnceLock::new();

/// Lookup table of compiled-in keys by identifier and canonical name.
#[derive(Debug, Clone)]
pub struct KeyRegistry {
    keys: Vec<Key>,
    by_id: HashMap<&'static str, usize>,
    by_name: HashMap<&'static str, usize>,
}

impl KeyRegistry {
    /// Returns the process-wide registry of built-in keys.
    ///
    /// # Panics
    ///
    /// Never in practice: the built-in table is checked by the crate's tests.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn builtin() -> &'static Self {
        BUILTIN.get_or_init(|| {
            Self::from_keys(BUILTIN_KEYS.iter().copied())
                .expect("built-in key table is consistent")
        })
    }

    /// Builds a registry from key declarations, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::Config`] for duplicate identifiers or names, and
    /// for keys that declare no scope.
    pub fn from_keys(keys: impl IntoIterator<Item = Key>) -> Result<Self> {
        let keys: Vec<Key> = keys.into_iter().collect();
        let mut by_id = HashMap::with_capacity(keys.len());
        let mut by_name = HashMap::with_capacity(keys.len());

        for (index, key) in keys.iter().enumerate() {
            if key.scopes().is_empty() {
                return Err(ParamError::Config(format!(
                    "key {} declares no scope",
                    key.id()
                )));
            }
            if by_id.insert(key.id(), index).is_some() {
                return Err(ParamError::Config(format!(
                    "duplicate key identifier {}",
                    key.id()
                )));
            }
            if by_name.insert(key.name(), index).is_some() {
                return Err(ParamError::Config(format!(
                    "duplicate key name {}",
                    key.name()
                )));
            }
        }

        Ok(Self {
            keys,
            by_id,
            by_name,
        })
    }

    /// Looks up a key by identifier (e.g. `PORTAL_RATING_ENABLED`).
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::UnknownKey`] if no key has this identifier.
    pub fn get(&self, id: &str) -> Result<&Key> {
        self.by_id
            .get(id)
            .map(|&index| &self.keys[index])
            .ok_or_else(|| ParamError::UnknownKey(id.to_string()))
    }

    /// Looks up a key by canonical name (e.g. `portal.rating.enabled`).
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::UnknownKey`] if no key has this name.
    pub fn by_name(&self, name: &str) -> Result<&Key> {
        self.by_name
            .get(name)
            .map(|&index| &self.keys[index])
            .ok_or_else(|| ParamError::UnknownKey(name.to_string()))
    }

    /// Iterates keys in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Key> {
        self.keys.iter()
    }

    /// Number of registered keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if no key is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
