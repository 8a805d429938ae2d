//! Pre-built test fixtures for common parameter scenarios.
//!
//! Provides a wired [`ParameterService`] over recording collaborators.

use std::sync::Arc;

use apim_core::audit::{AuditEmitter, TestAuditSink};
use apim_core::{EnvironmentId, OrganizationId, ScopeType};
use apim_params::{
    EnvironmentLookup, MapOverrideSource, MemoryEnvironmentDirectory, Parameter,
    ParameterService, ParameterServiceConfig, ResolutionContext,
};

use crate::storage::TracingParameterStore;

/// Organization owning [`ServiceFixture::environment_id`].
pub const ORG_ID: &str = "org-1";

/// Environment registered in every fixture.
pub const ENV_ID: &str = "env-1";

/// Service wired to a tracing store, a one-environment directory and a
/// capturing audit sink.
pub struct ServiceFixture {
    /// Recording store behind the service.
    pub store: Arc<TracingParameterStore>,
    /// Directory holding `env-1 → org-1`.
    pub directory: Arc<MemoryEnvironmentDirectory>,
    /// Captured audit events.
    pub audit: Arc<TestAuditSink>,
    /// Service under test.
    pub service: ParameterService,
}

impl ServiceFixture {
    /// Creates a fixture with no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a fixture with the given overrides.
    #[must_use]
    pub fn with_overrides(overrides: MapOverrideSource) -> Self {
        Self::builder().overrides(overrides).build()
    }

    /// Starts a customised fixture.
    #[must_use]
    pub fn builder() -> ServiceFixtureBuilder {
        ServiceFixtureBuilder::default()
    }

    /// The fixture organization.
    #[must_use]
    pub fn organization_id(&self) -> OrganizationId {
        OrganizationId::new(ORG_ID).expect("valid organization id")
    }

    /// The fixture environment.
    #[must_use]
    pub fn environment_id(&self) -> EnvironmentId {
        EnvironmentId::new(ENV_ID).expect("valid environment id")
    }

    /// Fresh context for `env-1` under `org-1`.
    #[must_use]
    pub fn env_context(&self) -> ResolutionContext {
        ResolutionContext::for_environment(self.organization_id(), self.environment_id())
            .with_actor("user:test")
            .with_request_id(unique_id("req"))
    }

    /// Fresh organization-level context for `org-1`.
    #[must_use]
    pub fn org_context(&self) -> ResolutionContext {
        ResolutionContext::new(self.organization_id())
            .with_actor("user:test")
            .with_request_id(unique_id("req"))
    }

    /// Registers an extra environment under `organization_id`.
    pub fn register_environment(&self, environment_id: &str, organization_id: &str) {
        self.directory
            .register(
                EnvironmentId::new(environment_id).expect("valid environment id"),
                OrganizationId::new(organization_id).expect("valid organization id"),
            )
            .expect("register environment");
    }
}

impl Default for ServiceFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`ServiceFixture`].
#[derive(Default)]
pub struct ServiceFixtureBuilder {
    records: Vec<Parameter>,
    overrides: MapOverrideSource,
    config: Option<ParameterServiceConfig>,
    environments: Option<Arc<dyn EnvironmentLookup>>,
}

impl ServiceFixtureBuilder {
    /// Seeds a stored record.
    #[must_use]
    pub fn record(mut self, key: &str, scope_id: &str, scope_type: ScopeType, value: &str) -> Self {
        self.records.push(Parameter::new(key, scope_id, scope_type, value));
        self
    }

    /// Uses the given overrides.
    #[must_use]
    pub fn overrides(mut self, overrides: MapOverrideSource) -> Self {
        self.overrides = overrides;
        self
    }

    /// Uses the given configuration.
    #[must_use]
    pub fn config(mut self, config: ParameterServiceConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replaces the environment lookup wired into the service.
    ///
    /// The fixture's `directory` field still holds the default directory.
    #[must_use]
    pub fn environments(mut self, environments: Arc<dyn EnvironmentLookup>) -> Self {
        self.environments = Some(environments);
        self
    }

    /// Builds the fixture.
    #[must_use]
    pub fn build(self) -> ServiceFixture {
        let store = Arc::new(TracingParameterStore::with_records(self.records));
        let directory = Arc::new(
            [(
                EnvironmentId::new(ENV_ID).expect("valid environment id"),
                OrganizationId::new(ORG_ID).expect("valid organization id"),
            )]
            .into_iter()
            .collect::<MemoryEnvironmentDirectory>(),
        );
        let audit = Arc::new(TestAuditSink::new());
        let environments = self
            .environments
            .unwrap_or_else(|| directory.clone() as Arc<dyn EnvironmentLookup>);

        let service = ParameterService::new(store.clone(), environments)
            .with_overrides(Arc::new(self.overrides))
            .with_audit(AuditEmitter::with_test_sink(audit.clone()))
            .with_config(self.config.unwrap_or_default());

        ServiceFixture {
            store,
            directory,
            audit,
            service,
        }
    }
}

/// Unique identifier with a readable prefix.
#[must_use]
pub fn unique_id(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4().as_simple())
}
