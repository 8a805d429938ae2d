//! Test collaborators with operation tracing and fault injection.
//!
//! [`TracingParameterStore`] wraps the in-memory store and records every call
//! for later assertion. Failures can be injected per operation.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use apim_core::error::{Error, Result};
use apim_core::{EnvironmentId, OrganizationId, ScopeType};
use apim_params::{EnvironmentLookup, MemoryParameterStore, Parameter, ParameterStore};
use async_trait::async_trait;

/// Record of a store call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    /// Single-key lookup.
    Find {
        /// Key name.
        key: String,
        /// Scope id.
        scope_id: String,
        /// Scope level.
        scope_type: ScopeType,
    },
    /// Multi-key lookup.
    FindByKeys {
        /// Key names requested.
        keys: Vec<String>,
        /// Scope id.
        scope_id: String,
        /// Scope level.
        scope_type: ScopeType,
    },
    /// Record creation.
    Create {
        /// Record written.
        parameter: Parameter,
    },
    /// Record update.
    Update {
        /// Record written.
        parameter: Parameter,
    },
    /// Record deletion.
    Delete {
        /// Key name.
        key: String,
        /// Scope id.
        scope_id: String,
        /// Scope level.
        scope_type: ScopeType,
    },
}

impl StoreOp {
    /// Operation name, matching the store method.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Find { .. } => "find",
            Self::FindByKeys { .. } => "find_by_keys",
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }

    /// Returns true for create, update and delete.
    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(
            self,
            Self::Create { .. } | Self::Update { .. } | Self::Delete { .. }
        )
    }
}

/// In-memory parameter store with operation tracing.
///
/// Records all calls, including failed ones, for later assertion in tests.
#[derive(Debug, Clone, Default)]
pub struct TracingParameterStore {
    inner: MemoryParameterStore,
    operations: Arc<Mutex<Vec<StoreOp>>>,
    fail_operations: Arc<Mutex<HashSet<&'static str>>>,
}

impl TracingParameterStore {
    /// Creates a new empty tracing store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tracing store pre-loaded with records. Seeding is not recorded.
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = Parameter>) -> Self {
        Self {
            inner: MemoryParameterStore::with_records(records),
            ..Self::default()
        }
    }

    /// Returns all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<StoreOp> {
        self.operations.lock().expect("lock").clone()
    }

    /// Returns recorded operations with the given name.
    #[must_use]
    pub fn operations_named(&self, name: &str) -> Vec<StoreOp> {
        self.operations()
            .into_iter()
            .filter(|op| op.name() == name)
            .collect()
    }

    /// Number of recorded create, update and delete calls.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.operations().iter().filter(|op| op.is_write()).count()
    }

    /// Clears recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().expect("lock").clear();
    }

    /// Makes every call to `operation` fail with a storage error.
    pub fn inject_failure(&self, operation: &'static str) {
        self.fail_operations.lock().expect("lock").insert(operation);
    }

    /// Clears all injected failures.
    pub fn clear_failures(&self) {
        self.fail_operations.lock().expect("lock").clear();
    }

    /// Snapshot of stored records.
    #[must_use]
    pub fn records(&self) -> Vec<Parameter> {
        self.inner.records().expect("records")
    }

    /// Stored record for (key, scope), if any.
    #[must_use]
    pub fn record(&self, key: &str, scope_id: &str, scope_type: ScopeType) -> Option<Parameter> {
        self.records()
            .into_iter()
            .find(|p| p.key == key && p.reference_id == scope_id && p.reference_type == scope_type)
    }

    fn record_op(&self, op: StoreOp) -> Result<()> {
        let name = op.name();
        self.operations.lock().expect("lock").push(op);
        if self.fail_operations.lock().expect("lock").contains(name) {
            return Err(Error::storage(format!("injected failure for {name}")));
        }
        Ok(())
    }
}

#[async_trait]
impl ParameterStore for TracingParameterStore {
    async fn find(
        &self,
        key: &str,
        scope_id: &str,
        scope_type: ScopeType,
    ) -> Result<Option<Parameter>> {
        self.record_op(StoreOp::Find {
            key: key.to_string(),
            scope_id: scope_id.to_string(),
            scope_type,
        })?;
        self.inner.find(key, scope_id, scope_type).await
    }

    async fn find_by_keys(
        &self,
        keys: &[&str],
        scope_id: &str,
        scope_type: ScopeType,
    ) -> Result<Vec<Parameter>> {
        self.record_op(StoreOp::FindByKeys {
            keys: keys.iter().map(ToString::to_string).collect(),
            scope_id: scope_id.to_string(),
            scope_type,
        })?;
        self.inner.find_by_keys(keys, scope_id, scope_type).await
    }

    async fn create(&self, parameter: Parameter) -> Result<Parameter> {
        self.record_op(StoreOp::Create {
            parameter: parameter.clone(),
        })?;
        self.inner.create(parameter).await
    }

    async fn update(&self, parameter: Parameter) -> Result<Parameter> {
        self.record_op(StoreOp::Update {
            parameter: parameter.clone(),
        })?;
        self.inner.update(parameter).await
    }

    async fn delete(&self, key: &str, scope_id: &str, scope_type: ScopeType) -> Result<()> {
        self.record_op(StoreOp::Delete {
            key: key.to_string(),
            scope_id: scope_id.to_string(),
            scope_type,
        })?;
        self.inner.delete(key, scope_id, scope_type).await
    }
}

/// Environment lookup that always fails and counts its calls.
#[derive(Debug, Clone, Default)]
pub struct FailingEnvironmentLookup {
    calls: Arc<Mutex<usize>>,
}

impl FailingEnvironmentLookup {
    /// Creates a new failing lookup.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of lookups attempted.
    #[must_use]
    pub fn calls(&self) -> usize {
        *self.calls.lock().expect("lock")
    }
}

#[async_trait]
impl EnvironmentLookup for FailingEnvironmentLookup {
    async fn organization_id_of(&self, environment_id: &EnvironmentId) -> Result<OrganizationId> {
        *self.calls.lock().expect("lock") += 1;
        Err(Error::storage(format!(
            "environment directory unreachable for {environment_id}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_calls_in_order() {
        let store = TracingParameterStore::new();
        store
            .create(Parameter::new("email.host", "org-1", ScopeType::Organization, "smtp"))
            .await
            .unwrap();
        store
            .find("email.host", "org-1", ScopeType::Organization)
            .await
            .unwrap();

        let names: Vec<_> = store.operations().iter().map(StoreOp::name).collect();
        assert_eq!(names, vec!["create", "find"]);
        assert_eq!(store.write_count(), 1);
        assert!(store.record("email.host", "org-1", ScopeType::Organization).is_some());
    }

    #[tokio::test]
    async fn injected_failure_is_recorded_and_returned() {
        let store = TracingParameterStore::new();
        store.inject_failure("find");

        let err = store
            .find("email.host", "org-1", ScopeType::Organization)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage { .. }));
        assert_eq!(store.operations_named("find").len(), 1);

        store.clear_failures();
        assert!(store
            .find("email.host", "org-1", ScopeType::Organization)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn failing_lookup_counts_calls() {
        let lookup = FailingEnvironmentLookup::new();
        let env = EnvironmentId::new("env-1").unwrap();
        assert!(lookup.organization_id_of(&env).await.is_err());
        assert_eq!(lookup.calls(), 1);
    }
}
