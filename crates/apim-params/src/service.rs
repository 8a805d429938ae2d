//! The parameter resolver.
//!
//! [`ParameterService`] produces the effective value of a key for one
//! organization or environment by checking, in order:
//!
//! 1. the request context memo
//! 2. the process-wide override source, when the key is overridable
//! 3. the value persisted at the requested scope
//! 4. for environment scope, the value persisted at the owning organization,
//!    when the key may be stored there
//! 5. the key's compiled-in default
//!
//! Only "no value found" falls through to the next stage. Store and lookup
//! failures reach the caller and are never replaced by a default.
//!
//! Writes go through [`ParameterService::save`], which creates, updates or
//! deletes the record for one scope and emits an audit event for every
//! effective create or update.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use apim_core::audit::{AuditAction, AuditEmitter, AuditEvent};
use apim_core::observability::parameter_span;
use apim_core::{EnvironmentId, OrganizationId, ScopeType};
use tracing::Instrument;

use crate::codec::{decode_list, decode_list_filtered, decode_map, encode_list, encode_map, encode_override};
use crate::config::ParameterServiceConfig;
use crate::context::ResolutionContext;
use crate::error::{ParamError, Result};
use crate::key::Key;
use crate::metrics;
use crate::override_source::{EnvOverrideSource, NoOverrides, OverrideSource};
use crate::parameter::{Parameter, SaveOutcome};
use crate::store::{EnvironmentLookup, ParameterStore};

/// Audit property naming the changed parameter.
pub const AUDIT_PARAMETER_PROPERTY: &str = "PARAMETER";

/// Stage of the cascade that produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionSource {
    /// Returned from the request context memo.
    Memoized,
    /// Taken from the override source.
    Override,
    /// Persisted at the requested scope.
    Scope,
    /// Persisted at the environment's owning organization.
    ParentScope,
    /// The key's compiled-in default.
    Default,
}

impl ResolutionSource {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Memoized => "memoized",
            Self::Override => "override",
            Self::Scope => "scope",
            Self::ParentScope => "parent_scope",
            Self::Default => "default",
        }
    }
}

impl std::fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An effective value and the stage that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Effective value (possibly empty).
    pub value: String,
    /// Stage that answered.
    pub source: ResolutionSource,
}

/// Resolves and persists scoped configuration parameters.
///
/// Cheap to clone; collaborators are shared.
#[derive(Clone)]
pub struct ParameterService {
    store: Arc<dyn ParameterStore>,
    environments: Arc<dyn EnvironmentLookup>,
    overrides: Arc<dyn OverrideSource>,
    audit: AuditEmitter,
    config: ParameterServiceConfig,
}

impl std::fmt::Debug for ParameterService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ParameterService {
    /// Creates a service with no overrides, tracing audit and default config.
    #[must_use]
    pub fn new(store: Arc<dyn ParameterStore>, environments: Arc<dyn EnvironmentLookup>) -> Self {
        Self {
            store,
            environments,
            overrides: Arc::new(NoOverrides),
            audit: AuditEmitter::with_tracing(),
            config: ParameterServiceConfig::default(),
        }
    }

    /// Creates a service from configuration.
    ///
    /// With `env_overrides` enabled, overrides come from a snapshot of the
    /// process environment taken now.
    #[must_use]
    pub fn from_config(
        config: ParameterServiceConfig,
        store: Arc<dyn ParameterStore>,
        environments: Arc<dyn EnvironmentLookup>,
    ) -> Self {
        let overrides: Arc<dyn OverrideSource> = if config.env_overrides {
            Arc::new(EnvOverrideSource::from_env(config.override_prefix.as_deref()))
        } else {
            Arc::new(NoOverrides)
        };
        Self::new(store, environments)
            .with_overrides(overrides)
            .with_config(config)
    }

    /// Replaces the override source.
    #[must_use]
    pub fn with_overrides(mut self, overrides: Arc<dyn OverrideSource>) -> Self {
        self.overrides = overrides;
        self
    }

    /// Replaces the audit emitter.
    #[must_use]
    pub fn with_audit(mut self, audit: AuditEmitter) -> Self {
        self.audit = audit;
        self
    }

    /// Replaces the configuration. The override source is left as is.
    #[must_use]
    pub fn with_config(mut self, config: ParameterServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ParameterServiceConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------------

    /// Resolves the effective value of `key`.
    ///
    /// `scope_id` defaults to the context's id for `scope_type`. The result is
    /// never "missing": an unset key resolves to its default, which may be
    /// empty.
    ///
    /// # Errors
    ///
    /// - [`ParamError::InvalidKeyScope`] if `key` may not live at `scope_type`
    /// - [`ParamError::MissingScopeId`] if no scope id is available
    /// - [`ParamError::StoreUnavailable`] if the store or the environment lookup fails
    /// - [`ParamError::UnknownScope`] if the environment has no owning organization
    pub async fn resolve(
        &self,
        key: &Key,
        scope_id: Option<&str>,
        scope_type: ScopeType,
        ctx: &mut ResolutionContext,
    ) -> Result<String> {
        self.resolve_with_source(key, scope_id, scope_type, ctx)
            .await
            .map(|resolution| resolution.value)
    }

    /// Like [`resolve`](Self::resolve), also reporting which stage answered.
    ///
    /// # Errors
    ///
    /// Same as [`resolve`](Self::resolve).
    pub async fn resolve_with_source(
        &self,
        key: &Key,
        scope_id: Option<&str>,
        scope_type: ScopeType,
        ctx: &mut ResolutionContext,
    ) -> Result<Resolution> {
        check_scope(key, scope_type)?;
        let scope_id = ctx.scope_id(scope_id, scope_type)?;
        let span = parameter_span("resolve", key.name(), scope_type, &scope_id);
        self.resolve_one(key, &scope_id, scope_type, ctx)
            .instrument(span)
            .await
    }

    async fn resolve_one(
        &self,
        key: &Key,
        scope_id: &str,
        scope_type: ScopeType,
        ctx: &mut ResolutionContext,
    ) -> Result<Resolution> {
        if self.config.memoize {
            if let Some(value) = ctx.memoized(key, scope_type, scope_id) {
                return Ok(resolved(value.to_string(), ResolutionSource::Memoized));
            }
        }

        let resolution = if let Some(value) = self.override_value(key) {
            resolved(value, ResolutionSource::Override)
        } else if let Some(found) = self.find(key, scope_id, scope_type).await? {
            resolved(found.value, ResolutionSource::Scope)
        } else if let Some(found) = self.find_in_parent(key, scope_id, scope_type, ctx).await? {
            resolved(found.value, ResolutionSource::ParentScope)
        } else {
            resolved(key.default_value().to_string(), ResolutionSource::Default)
        };

        if self.config.memoize {
            ctx.memoize(key, scope_type, scope_id, &resolution.value);
        }
        Ok(resolution)
    }

    /// Resolves several keys at one scope.
    ///
    /// Produces the same values as calling [`resolve`](Self::resolve) per key,
    /// with at most one store query per scope level. The result is keyed by
    /// canonical name; duplicate keys are resolved once.
    ///
    /// # Errors
    ///
    /// Every key is validated before any store access. Other errors as in
    /// [`resolve`](Self::resolve).
    pub async fn resolve_many(
        &self,
        keys: &[Key],
        scope_id: Option<&str>,
        scope_type: ScopeType,
        ctx: &mut ResolutionContext,
    ) -> Result<BTreeMap<String, String>> {
        for key in keys {
            check_scope(key, scope_type)?;
        }
        let scope_id = ctx.scope_id(scope_id, scope_type)?;
        let span = parameter_span("resolve_many", "*", scope_type, &scope_id);
        let started = Instant::now();
        let resolved = self
            .resolve_batch(keys, &scope_id, scope_type, ctx)
            .instrument(span)
            .await?;
        metrics::record_resolve_many(started.elapsed().as_secs_f64());
        Ok(resolved)
    }

    async fn resolve_batch(
        &self,
        keys: &[Key],
        scope_id: &str,
        scope_type: ScopeType,
        ctx: &mut ResolutionContext,
    ) -> Result<BTreeMap<String, String>> {
        let mut values = BTreeMap::new();
        let mut seen = HashSet::new();
        let mut pending: Vec<&Key> = Vec::new();

        for key in keys {
            if !seen.insert(key.id()) {
                continue;
            }
            let early = self
                .config
                .memoize
                .then(|| ctx.memoized(key, scope_type, scope_id))
                .flatten()
                .map(|value| (value.to_string(), ResolutionSource::Memoized))
                .or_else(|| {
                    self.override_value(key)
                        .map(|value| (value, ResolutionSource::Override))
                });
            match early {
                Some((value, source)) => {
                    self.finish(key, scope_id, scope_type, ctx, &value, source);
                    values.insert(key.name().to_string(), value);
                }
                None => pending.push(key),
            }
        }

        if !pending.is_empty() {
            let mut found = self.find_many(&pending, scope_id, scope_type).await?;
            pending.retain(|key| match found.remove(key.name()) {
                Some(value) => {
                    self.finish(key, scope_id, scope_type, ctx, &value, ResolutionSource::Scope);
                    values.insert(key.name().to_string(), value);
                    false
                }
                None => true,
            });
        }

        let inherits: Vec<&Key> = pending
            .iter()
            .copied()
            .filter(|key| inherits_from_organization(key, scope_type))
            .collect();
        if !inherits.is_empty() {
            let organization_id = self.owning_organization(scope_id, ctx).await?;
            let mut found = self
                .find_many(&inherits, organization_id.as_str(), ScopeType::Organization)
                .await?;
            pending.retain(|key| match found.remove(key.name()) {
                Some(value) => {
                    self.finish(key, scope_id, scope_type, ctx, &value, ResolutionSource::ParentScope);
                    values.insert(key.name().to_string(), value);
                    false
                }
                None => true,
            });
        }

        for key in pending {
            let value = key.default_value().to_string();
            self.finish(key, scope_id, scope_type, ctx, &value, ResolutionSource::Default);
            values.insert(key.name().to_string(), value);
        }

        Ok(values)
    }

    fn finish(
        &self,
        key: &Key,
        scope_id: &str,
        scope_type: ScopeType,
        ctx: &mut ResolutionContext,
        value: &str,
        source: ResolutionSource,
    ) {
        if self.config.memoize && source != ResolutionSource::Memoized {
            ctx.memoize(key, scope_type, scope_id, value);
        }
        metrics::record_resolution(source.as_str());
        tracing::debug!(key = key.name(), source = source.as_str(), "parameter resolved");
    }

    // ------------------------------------------------------------------------
    // Typed accessors
    // ------------------------------------------------------------------------

    /// Resolves `key` as a boolean: true iff the value is `"true"`, ignoring case.
    ///
    /// # Errors
    ///
    /// Same as [`resolve`](Self::resolve).
    pub async fn find_as_boolean(
        &self,
        key: &Key,
        scope_id: Option<&str>,
        scope_type: ScopeType,
        ctx: &mut ResolutionContext,
    ) -> Result<bool> {
        let value = self.resolve(key, scope_id, scope_type, ctx).await?;
        Ok(value.eq_ignore_ascii_case("true"))
    }

    /// Resolves `key` as a list.
    ///
    /// # Errors
    ///
    /// Same as [`resolve`](Self::resolve).
    pub async fn find_as_list(
        &self,
        key: &Key,
        scope_id: Option<&str>,
        scope_type: ScopeType,
        ctx: &mut ResolutionContext,
    ) -> Result<Vec<String>> {
        let value = self.resolve(key, scope_id, scope_type, ctx).await?;
        Ok(decode_list(&value))
    }

    /// Resolves `key` as a list, keeping only items accepted by `filter`.
    ///
    /// # Errors
    ///
    /// Same as [`resolve`](Self::resolve).
    pub async fn find_as_list_filtered(
        &self,
        key: &Key,
        filter: impl Fn(&str) -> bool,
        scope_id: Option<&str>,
        scope_type: ScopeType,
        ctx: &mut ResolutionContext,
    ) -> Result<Vec<String>> {
        let value = self.resolve(key, scope_id, scope_type, ctx).await?;
        Ok(decode_list_filtered(&value, filter))
    }

    /// Resolves `key` as ordered `key@value` entries.
    ///
    /// # Errors
    ///
    /// Same as [`resolve`](Self::resolve).
    pub async fn find_as_map(
        &self,
        key: &Key,
        scope_id: Option<&str>,
        scope_type: ScopeType,
        ctx: &mut ResolutionContext,
    ) -> Result<Vec<(String, String)>> {
        let value = self.resolve(key, scope_id, scope_type, ctx).await?;
        Ok(decode_map(&value))
    }

    /// Resolves `key` as a signed integer.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::InvalidValue`] if the value is not an integer.
    /// Other errors as in [`resolve`](Self::resolve).
    pub async fn find_as_i64(
        &self,
        key: &Key,
        scope_id: Option<&str>,
        scope_type: ScopeType,
        ctx: &mut ResolutionContext,
    ) -> Result<i64> {
        let value = self.resolve(key, scope_id, scope_type, ctx).await?;
        value
            .trim()
            .parse::<i64>()
            .map_err(|err| ParamError::InvalidValue {
                key: key.name().to_string(),
                message: format!("{value:?} is not an integer: {err}"),
            })
    }

    /// Batched variant of [`find_as_list`](Self::find_as_list), keyed by canonical name.
    ///
    /// # Errors
    ///
    /// Same as [`resolve_many`](Self::resolve_many).
    pub async fn resolve_many_as_lists(
        &self,
        keys: &[Key],
        scope_id: Option<&str>,
        scope_type: ScopeType,
        ctx: &mut ResolutionContext,
    ) -> Result<BTreeMap<String, Vec<String>>> {
        let values = self.resolve_many(keys, scope_id, scope_type, ctx).await?;
        Ok(values
            .into_iter()
            .map(|(name, value)| {
                let items = decode_list(&value);
                (name, items)
            })
            .collect())
    }

    // ------------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------------

    /// Persists `value` for `key` at one scope; `None` deletes the record.
    ///
    /// An active override pins the key: nothing is written and the outcome
    /// carries the override value. Creates and updates emit one audit event
    /// each; unchanged values and deletes emit none. A failed audit emission
    /// is logged and counted, never rolled back.
    ///
    /// # Errors
    ///
    /// - [`ParamError::InvalidKeyScope`] if `key` may not live at `scope_type`
    /// - [`ParamError::MissingScopeId`] if no scope id is available
    /// - [`ParamError::Conflict`] if a concurrent create won the race
    /// - [`ParamError::StoreUnavailable`] if the store fails
    pub async fn save(
        &self,
        key: &Key,
        value: Option<&str>,
        scope_id: Option<&str>,
        scope_type: ScopeType,
        ctx: &mut ResolutionContext,
    ) -> Result<SaveOutcome> {
        check_scope(key, scope_type)?;
        let scope_id = ctx.scope_id(scope_id, scope_type)?;
        let span = parameter_span("save", key.name(), scope_type, &scope_id);
        let outcome = self
            .save_one(key, value, &scope_id, scope_type, ctx)
            .instrument(span.clone())
            .await?;

        if outcome.wrote() {
            ctx.forget(key);
        }
        span.in_scope(|| {
            if outcome.wrote() {
                tracing::info!(outcome = outcome.label(), "parameter saved");
            } else {
                tracing::debug!(outcome = outcome.label(), "parameter left unchanged");
            }
        });
        metrics::record_save(outcome.label());
        Ok(outcome)
    }

    async fn save_one(
        &self,
        key: &Key,
        value: Option<&str>,
        scope_id: &str,
        scope_type: ScopeType,
        ctx: &ResolutionContext,
    ) -> Result<SaveOutcome> {
        if let Some(pinned) = self.override_value(key) {
            return Ok(SaveOutcome::Overridden(Parameter::new(
                key.name(),
                scope_id,
                scope_type,
                pinned,
            )));
        }

        let existing = self.find(key, scope_id, scope_type).await?;
        let outcome = match (value, existing) {
            (None, Some(previous)) => {
                self.store
                    .delete(key.name(), scope_id, scope_type)
                    .await
                    .map_err(|err| store_failure("delete", err, key, scope_id, scope_type))?;
                SaveOutcome::Deleted(previous)
            }
            (None, None) => SaveOutcome::Absent,
            (Some(value), None) => {
                let created = self
                    .store
                    .create(Parameter::new(key.name(), scope_id, scope_type, value))
                    .await
                    .map_err(|err| store_failure("create", err, key, scope_id, scope_type))?;
                self.audit(AuditAction::ParameterCreated, key, None, &created, ctx);
                SaveOutcome::Created(created)
            }
            (Some(value), Some(previous)) if previous.value == value => {
                SaveOutcome::Unchanged(previous)
            }
            (Some(value), Some(previous)) => {
                let current = self
                    .store
                    .update(previous.with_value(value))
                    .await
                    .map_err(|err| store_failure("update", err, key, scope_id, scope_type))?;
                self.audit(AuditAction::ParameterUpdated, key, Some(&previous), &current, ctx);
                SaveOutcome::Updated { previous, current }
            }
        };
        Ok(outcome)
    }

    /// Persists a list value; an empty list deletes the record.
    ///
    /// # Errors
    ///
    /// Same as [`save`](Self::save).
    pub async fn save_list<I, S>(
        &self,
        key: &Key,
        values: I,
        scope_id: Option<&str>,
        scope_type: ScopeType,
        ctx: &mut ResolutionContext,
    ) -> Result<SaveOutcome>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let encoded = encode_list(values);
        self.save(key, encoded.as_deref(), scope_id, scope_type, ctx)
            .await
    }

    /// Persists map entries in iteration order; no entries deletes the record.
    ///
    /// # Errors
    ///
    /// Same as [`save`](Self::save).
    pub async fn save_map<I, K, V>(
        &self,
        key: &Key,
        entries: I,
        scope_id: Option<&str>,
        scope_type: ScopeType,
        ctx: &mut ResolutionContext,
    ) -> Result<SaveOutcome>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let encoded = encode_map(entries);
        self.save(key, encoded.as_deref(), scope_id, scope_type, ctx)
            .await
    }

    // ------------------------------------------------------------------------
    // Collaborators
    // ------------------------------------------------------------------------

    fn override_value(&self, key: &Key) -> Option<String> {
        if !key.is_overridable() || !self.overrides.has_property(key.name()) {
            return None;
        }
        self.overrides
            .get_property(key.name())
            .map(|raw| encode_override(key.kind(), &raw))
    }

    async fn find(&self, key: &Key, scope_id: &str, scope_type: ScopeType) -> Result<Option<Parameter>> {
        self.store
            .find(key.name(), scope_id, scope_type)
            .await
            .map_err(|err| store_failure("find", err, key, scope_id, scope_type))
    }

    async fn find_many(
        &self,
        keys: &[&Key],
        scope_id: &str,
        scope_type: ScopeType,
    ) -> Result<HashMap<String, String>> {
        let names: Vec<&str> = keys.iter().map(|key| key.name()).collect();
        let found = self
            .store
            .find_by_keys(&names, scope_id, scope_type)
            .await
            .map_err(|err| {
                metrics::record_store_error("find_by_keys");
                tracing::warn!(scope_type = %scope_type, scope_id, error = %err, "parameter batch lookup failed");
                ParamError::StoreUnavailable {
                    operation: "find_by_keys",
                    source: err,
                }
            })?;
        Ok(found
            .into_iter()
            .filter(|p| p.reference_type == scope_type && p.reference_id == scope_id)
            .map(|p| (p.key, p.value))
            .collect())
    }

    async fn find_in_parent(
        &self,
        key: &Key,
        scope_id: &str,
        scope_type: ScopeType,
        ctx: &mut ResolutionContext,
    ) -> Result<Option<Parameter>> {
        if !inherits_from_organization(key, scope_type) {
            return Ok(None);
        }
        let organization_id = self.owning_organization(scope_id, ctx).await?;
        self.find(key, organization_id.as_str(), ScopeType::Organization)
            .await
    }

    async fn owning_organization(
        &self,
        environment_id: &str,
        ctx: &mut ResolutionContext,
    ) -> Result<OrganizationId> {
        let environment_id = EnvironmentId::new_unchecked(environment_id);
        if self.config.memoize {
            if let Some(organization_id) = ctx.parent_of(&environment_id) {
                return Ok(organization_id.clone());
            }
        }

        let organization_id = self
            .environments
            .organization_id_of(&environment_id)
            .await
            .map_err(|err| {
                metrics::record_store_error("organization_id_of");
                tracing::warn!(environment_id = %environment_id, error = %err, "owning organization lookup failed");
                if err.is_not_found() {
                    ParamError::UnknownScope {
                        environment_id: environment_id.to_string(),
                        source: err,
                    }
                } else {
                    ParamError::StoreUnavailable {
                        operation: "organization_id_of",
                        source: err,
                    }
                }
            })?;
        tracing::debug!(
            environment_id = %environment_id,
            organization_id = %organization_id,
            "resolved owning organization"
        );

        if self.config.memoize {
            ctx.remember_parent(environment_id, organization_id.clone());
        }
        Ok(organization_id)
    }

    fn audit(
        &self,
        action: AuditAction,
        key: &Key,
        previous: Option<&Parameter>,
        current: &Parameter,
        ctx: &ResolutionContext,
    ) {
        let mut builder = AuditEvent::builder()
            .action(action)
            .reference(current.reference_type, current.reference_id.clone())
            .property(AUDIT_PARAMETER_PROPERTY, key.name())
            .new_value(current.snapshot());
        if let Some(previous) = previous {
            builder = builder.old_value(previous.snapshot());
        }
        if let Some(actor) = ctx.actor() {
            builder = builder.actor(actor);
        }
        if let Some(request_id) = ctx.request_id() {
            builder = builder.request_id(request_id);
        }

        let emitted = match builder.try_build() {
            Ok(event) => self.audit.emit_best_effort(event),
            Err(err) => {
                tracing::warn!(target: "audit", error = %err, "invalid audit event");
                false
            }
        };
        if !emitted {
            metrics::record_audit_failure();
        }
    }
}

fn resolved(value: String, source: ResolutionSource) -> Resolution {
    metrics::record_resolution(source.as_str());
    tracing::debug!(source = source.as_str(), "parameter resolved");
    Resolution { value, source }
}

fn store_failure(
    operation: &'static str,
    err: apim_core::Error,
    key: &Key,
    scope_id: &str,
    scope_type: ScopeType,
) -> ParamError {
    let err = ParamError::from_store(operation, err, key.name(), scope_type, scope_id);
    if err.is_collaborator_failure() {
        metrics::record_store_error(operation);
        tracing::warn!(operation, error = %err, "parameter store call failed");
    }
    err
}

fn check_scope(key: &Key, scope_type: ScopeType) -> Result<()> {
    if key.allows(scope_type) {
        Ok(())
    } else {
        Err(ParamError::InvalidKeyScope {
            key: key.name().to_string(),
            scope_type,
        })
    }
}

fn inherits_from_organization(key: &Key, scope_type: ScopeType) -> bool {
    scope_type == ScopeType::Environment && key.allows(ScopeType::Organization)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;
    use crate::override_source::MapOverrideSource;
    use crate::store::{MemoryEnvironmentDirectory, MemoryParameterStore};
    use apim_core::audit::TestAuditSink;

    struct Harness {
        store: MemoryParameterStore,
        sink: Arc<TestAuditSink>,
        service: ParameterService,
    }

    fn harness(overrides: MapOverrideSource) -> Harness {
        let store = MemoryParameterStore::new();
        let directory: MemoryEnvironmentDirectory = [(
            EnvironmentId::new("env-1").unwrap(),
            OrganizationId::new("org-1").unwrap(),
        )]
        .into_iter()
        .collect();
        let sink = Arc::new(TestAuditSink::new());
        let service = ParameterService::new(Arc::new(store.clone()), Arc::new(directory))
            .with_overrides(Arc::new(overrides))
            .with_audit(AuditEmitter::with_test_sink(sink.clone()));
        Harness { store, sink, service }
    }

    fn ctx() -> ResolutionContext {
        ResolutionContext::for_environment(
            OrganizationId::new("org-1").unwrap(),
            EnvironmentId::new("env-1").unwrap(),
        )
    }

    #[tokio::test]
    async fn unset_key_resolves_to_default() {
        let h = harness(MapOverrideSource::new());
        let mut ctx = ctx();
        let resolution = h
            .service
            .resolve_with_source(&keys::PORTAL_RATING_ENABLED, None, ScopeType::Environment, &mut ctx)
            .await
            .unwrap();
        assert_eq!(resolution.value, "false");
        assert_eq!(resolution.source, ResolutionSource::Default);
    }

    #[tokio::test]
    async fn second_resolution_is_memoized() {
        let h = harness(MapOverrideSource::new());
        let mut ctx = ctx();
        h.service
            .resolve(&keys::CORS_MAX_AGE, None, ScopeType::Environment, &mut ctx)
            .await
            .unwrap();
        let again = h
            .service
            .resolve_with_source(&keys::CORS_MAX_AGE, None, ScopeType::Environment, &mut ctx)
            .await
            .unwrap();
        assert_eq!(again.source, ResolutionSource::Memoized);
        assert_eq!(again.value, "1728000");
    }

    #[tokio::test]
    async fn memoization_can_be_disabled() {
        let h = harness(MapOverrideSource::new());
        let service = h.service.clone().with_config(ParameterServiceConfig {
            memoize: false,
            ..ParameterServiceConfig::default()
        });
        let mut ctx = ctx();
        service
            .resolve(&keys::CORS_MAX_AGE, None, ScopeType::Environment, &mut ctx)
            .await
            .unwrap();
        assert_eq!(ctx.memoized_len(), 0);
    }

    #[tokio::test]
    async fn override_encodes_list_values() {
        let h = harness(MapOverrideSource::new().with("http.cors.allow-origin", "https://a.io,https://b.io"));
        let mut ctx = ctx();
        let origins = h
            .service
            .find_as_list(&keys::CORS_ALLOW_ORIGIN, None, ScopeType::Environment, &mut ctx)
            .await
            .unwrap();
        assert_eq!(origins, vec!["https://a.io", "https://b.io"]);
    }

    #[tokio::test]
    async fn update_emits_old_and_new_snapshots() {
        let h = harness(MapOverrideSource::new());
        let mut ctx = ctx().with_actor("user:admin");
        h.service
            .save(&keys::EMAIL_HOST, Some("smtp.a"), None, ScopeType::Organization, &mut ctx)
            .await
            .unwrap();
        let outcome = h
            .service
            .save(&keys::EMAIL_HOST, Some("smtp.b"), None, ScopeType::Organization, &mut ctx)
            .await
            .unwrap();

        assert_eq!(outcome.label(), "updated");
        assert_eq!(h.sink.len(), 2);
        let event = h.sink.last().unwrap();
        assert_eq!(event.action, AuditAction::ParameterUpdated);
        assert_eq!(event.actor, "user:admin");
        assert_eq!(event.properties[AUDIT_PARAMETER_PROPERTY], "email.host");
        assert_eq!(event.old_value.unwrap()["value"], "smtp.a");
        assert_eq!(event.new_value.unwrap()["value"], "smtp.b");
        assert_eq!(h.store.records().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn find_as_i64_rejects_malformed_values() {
        let h = harness(MapOverrideSource::new().with("email.port", "twenty-five"));
        let mut ctx = ctx();
        let err = h
            .service
            .find_as_i64(&keys::EMAIL_PORT, None, ScopeType::Organization, &mut ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ParamError::InvalidValue { .. }));

        let h = harness(MapOverrideSource::new());
        let port = h
            .service
            .find_as_i64(&keys::EMAIL_PORT, None, ScopeType::Organization, &mut self::ctx())
            .await
            .unwrap();
        assert_eq!(port, 587);
    }

    #[test]
    fn source_labels() {
        assert_eq!(ResolutionSource::ParentScope.to_string(), "parent_scope");
        assert_eq!(ResolutionSource::Memoized.as_str(), "memoized");
    }
}
