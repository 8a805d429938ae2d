//! Collaborator contracts for parameter persistence and scope lookup.
//!
//! The resolver reaches persisted state only through these traits:
//! - [`ParameterStore`]: CRUD on parameter records, keyed by (key, scope id, scope type)
//! - [`EnvironmentLookup`]: owning organization of an environment
//!
//! Implementations report failures with [`apim_core::Error`]. A store that
//! enforces uniqueness must answer a colliding `create` with
//! [`Error::Conflict`](apim_core::Error::Conflict); the service surfaces it as a
//! conflict instead of overwriting.
//!
//! In-memory implementations are provided for tests and embedded use.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use apim_core::error::{Error, Result};
use apim_core::{EnvironmentId, OrganizationId, ScopeType};
use async_trait::async_trait;

use crate::parameter::Parameter;

/// Persisted parameter storage.
#[async_trait]
pub trait ParameterStore: Send + Sync + 'static {
    /// Finds the record for `key` at the given scope.
    ///
    /// Returns `None` if no record exists.
    async fn find(
        &self,
        key: &str,
        scope_id: &str,
        scope_type: ScopeType,
    ) -> Result<Option<Parameter>>;

    /// Finds the records for several keys at one scope.
    ///
    /// Missing keys are simply absent from the result; order is unspecified.
    async fn find_by_keys(
        &self,
        keys: &[&str],
        scope_id: &str,
        scope_type: ScopeType,
    ) -> Result<Vec<Parameter>>;

    /// Creates a record.
    ///
    /// Returns `Error::Conflict` if a record already exists for the same
    /// (key, scope id, scope type).
    async fn create(&self, parameter: Parameter) -> Result<Parameter>;

    /// Replaces the value of an existing record.
    ///
    /// Returns `Error::NotFound` if the record does not exist.
    async fn update(&self, parameter: Parameter) -> Result<Parameter>;

    /// Deletes a record.
    ///
    /// Succeeds even if the record doesn't exist (idempotent).
    async fn delete(&self, key: &str, scope_id: &str, scope_type: ScopeType) -> Result<()>;
}

/// Resolves the organization that owns an environment.
#[async_trait]
pub trait EnvironmentLookup: Send + Sync + 'static {
    /// Returns the owning organization of `environment_id`.
    ///
    /// Returns `Error::ResourceNotFound` for an unknown environment.
    async fn organization_id_of(&self, environment_id: &EnvironmentId) -> Result<OrganizationId>;
}

type RecordKey = (ScopeType, String, String);

fn record_key(key: &str, scope_id: &str, scope_type: ScopeType) -> RecordKey {
    (scope_type, scope_id.to_string(), key.to_string())
}

fn poisoned() -> Error {
    Error::Internal {
        message: "lock poisoned".into(),
    }
}

/// In-memory parameter store.
///
/// Thread-safe via `RwLock`. Enforces one record per (key, scope id, scope type).
#[derive(Debug, Default, Clone)]
pub struct MemoryParameterStore {
    records: Arc<RwLock<BTreeMap<RecordKey, Parameter>>>,
}

impl MemoryParameterStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-loaded with records. Later duplicates replace earlier ones.
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = Parameter>) -> Self {
        let records = records
            .into_iter()
            .map(|p| (record_key(&p.key, &p.reference_id, p.reference_type), p))
            .collect();
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    /// Snapshot of all records in (scope type, scope id, key) order.
    ///
    /// # Errors
    ///
    /// Returns `Error::Internal` if the lock is poisoned.
    pub fn records(&self) -> Result<Vec<Parameter>> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.values().cloned().collect())
    }
}

#[async_trait]
impl ParameterStore for MemoryParameterStore {
    async fn find(
        &self,
        key: &str,
        scope_id: &str,
        scope_type: ScopeType,
    ) -> Result<Option<Parameter>> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.get(&record_key(key, scope_id, scope_type)).cloned())
    }

    async fn find_by_keys(
        &self,
        keys: &[&str],
        scope_id: &str,
        scope_type: ScopeType,
    ) -> Result<Vec<Parameter>> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(keys
            .iter()
            .filter_map(|key| records.get(&record_key(key, scope_id, scope_type)))
            .cloned()
            .collect())
    }

    async fn create(&self, parameter: Parameter) -> Result<Parameter> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let id = record_key(&parameter.key, &parameter.reference_id, parameter.reference_type);
        if records.contains_key(&id) {
            return Err(Error::conflict(format!(
                "parameter {} already exists for {} {}",
                parameter.key, parameter.reference_type, parameter.reference_id
            )));
        }
        records.insert(id, parameter.clone());
        Ok(parameter)
    }

    async fn update(&self, parameter: Parameter) -> Result<Parameter> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let id = record_key(&parameter.key, &parameter.reference_id, parameter.reference_type);
        match records.get_mut(&id) {
            Some(existing) => {
                existing.value.clone_from(&parameter.value);
                Ok(parameter)
            }
            None => Err(Error::NotFound(format!(
                "parameter {} for {} {}",
                parameter.key, parameter.reference_type, parameter.reference_id
            ))),
        }
    }

    async fn delete(&self, key: &str, scope_id: &str, scope_type: ScopeType) -> Result<()> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        records.remove(&record_key(key, scope_id, scope_type));
        Ok(())
    }
}

/// In-memory environment → organization directory.
#[derive(Debug, Default, Clone)]
pub struct MemoryEnvironmentDirectory {
    owners: Arc<RwLock<HashMap<EnvironmentId, OrganizationId>>>,
}

impl MemoryEnvironmentDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an environment under its owning organization.
    ///
    /// # Errors
    ///
    /// Returns `Error::Internal` if the lock is poisoned.
    pub fn register(&self, environment_id: EnvironmentId, organization_id: OrganizationId) -> Result<()> {
        let mut owners = self.owners.write().map_err(|_| poisoned())?;
        owners.insert(environment_id, organization_id);
        Ok(())
    }
}

impl FromIterator<(EnvironmentId, OrganizationId)> for MemoryEnvironmentDirectory {
    fn from_iter<T: IntoIterator<Item = (EnvironmentId, OrganizationId)>>(iter: T) -> Self {
        Self {
            owners: Arc::new(RwLock::new(iter.into_iter().collect())),
        }
    }
}

#[async_trait]
impl EnvironmentLookup for MemoryEnvironmentDirectory {
    async fn organization_id_of(&self, environment_id: &EnvironmentId) -> Result<OrganizationId> {
        let owners = self.owners.read().map_err(|_| poisoned())?;
        owners
            .get(environment_id)
            .cloned()
            .ok_or_else(|| Error::resource_not_found("environment", environment_id))
    }
}
