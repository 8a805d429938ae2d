//! Request-scoped resolution context.
//!
//! A context is created at the start of a logical operation, passed by
//! `&mut` through every parameter call of that operation, and dropped at its
//! end. It carries the effective organization and environment, the caller
//! identity for audit events, and two memo tables: resolved values and
//! environment → organization lookups.
//!
//! Contexts are never shared between requests.

use std::collections::HashMap;

use apim_core::{EnvironmentId, OrganizationId, ScopeType};

use crate::error::{ParamError, Result};
use crate::key::Key;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MemoKey {
    key_id: &'static str,
    scope_type: ScopeType,
    scope_id: String,
}

/// Request-scoped state for parameter resolution.
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    organization_id: OrganizationId,
    environment_id: Option<EnvironmentId>,
    actor: Option<String>,
    request_id: Option<String>,
    values: HashMap<MemoKey, String>,
    parents: HashMap<EnvironmentId, OrganizationId>,
}

impl ResolutionContext {
    /// Creates a context for an organization-level operation.
    #[must_use]
    pub fn new(organization_id: OrganizationId) -> Self {
        Self {
            organization_id,
            environment_id: None,
            actor: None,
            request_id: None,
            values: HashMap::new(),
            parents: HashMap::new(),
        }
    }

    /// Creates a context for an environment-level operation.
    #[must_use]
    pub fn for_environment(organization_id: OrganizationId, environment_id: EnvironmentId) -> Self {
        Self::new(organization_id).with_environment(environment_id)
    }

    /// Sets the current environment.
    #[must_use]
    pub fn with_environment(mut self, environment_id: EnvironmentId) -> Self {
        self.environment_id = Some(environment_id);
        self
    }

    /// Sets the actor recorded in audit events.
    #[must_use]
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Sets the request id recorded in audit events.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Effective organization.
    #[must_use]
    pub fn organization_id(&self) -> &OrganizationId {
        &self.organization_id
    }

    /// Effective environment, if the operation is environment-scoped.
    #[must_use]
    pub fn environment_id(&self) -> Option<&EnvironmentId> {
        self.environment_id.as_ref()
    }

    /// Caller identity for audit events.
    #[must_use]
    pub fn actor(&self) -> Option<&str> {
        self.actor.as_deref()
    }

    /// Request id for audit events.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Returns the explicit scope id, or the context's id for `scope_type`.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::MissingScopeId`] when no explicit id is given and
    /// the context has no environment for an environment-scoped call.
    pub fn scope_id(&self, explicit: Option<&str>, scope_type: ScopeType) -> Result<String> {
        if let Some(id) = explicit {
            return Ok(id.to_string());
        }
        match scope_type {
            ScopeType::Organization => Ok(self.organization_id.to_string()),
            ScopeType::Environment => self
                .environment_id
                .as_ref()
                .map(ToString::to_string)
                .ok_or(ParamError::MissingScopeId { scope_type }),
        }
    }

    /// Memoized value for `key` at the given scope.
    #[must_use]
    pub fn memoized(&self, key: &Key, scope_type: ScopeType, scope_id: &str) -> Option<&str> {
        self.values
            .get(&MemoKey {
                key_id: key.id(),
                scope_type,
                scope_id: scope_id.to_string(),
            })
            .map(String::as_str)
    }

    /// Remembers the resolved value for `key` at the given scope.
    pub fn memoize(&mut self, key: &Key, scope_type: ScopeType, scope_id: &str, value: &str) {
        self.values.insert(
            MemoKey {
                key_id: key.id(),
                scope_type,
                scope_id: scope_id.to_string(),
            },
            value.to_string(),
        );
    }

    /// Forgets every memoized value of `key`, at every scope.
    ///
    /// Organization writes feed environment fallback, so a write at any scope
    /// can change what another scope resolves to.
    pub fn forget(&mut self, key: &Key) {
        self.values.retain(|memo, _| memo.key_id != key.id());
    }

    /// Number of memoized values.
    #[must_use]
    pub fn memoized_len(&self) -> usize {
        self.values.len()
    }

    /// Known owning organization of an environment.
    #[must_use]
    pub fn parent_of(&self, environment_id: &EnvironmentId) -> Option<&OrganizationId> {
        self.parents.get(environment_id)
    }

    /// Remembers the owning organization of an environment.
    pub fn remember_parent(&mut self, environment_id: EnvironmentId, organization_id: OrganizationId) {
        self.parents.insert(environment_id, organization_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;

    fn ctx() -> ResolutionContext {
        ResolutionContext::for_environment(
            OrganizationId::new("org-1").unwrap(),
            EnvironmentId::new("env-1").unwrap(),
        )
        .with_actor("user:admin")
        .with_request_id("req-7")
    }

    #[test]
    fn scope_id_prefers_explicit_value() {
        let ctx = ctx();
        assert_eq!(ctx.scope_id(Some("env-9"), ScopeType::Environment).unwrap(), "env-9");
        assert_eq!(ctx.scope_id(None, ScopeType::Environment).unwrap(), "env-1");
        assert_eq!(ctx.scope_id(None, ScopeType::Organization).unwrap(), "org-1");
        assert_eq!(ctx.actor(), Some("user:admin"));
        assert_eq!(ctx.request_id(), Some("req-7"));
    }

    #[test]
    fn missing_environment_is_reported() {
        let ctx = ResolutionContext::new(OrganizationId::new("org-1").unwrap());
        let err = ctx.scope_id(None, ScopeType::Environment).unwrap_err();
        assert!(matches!(
            err,
            ParamError::MissingScopeId {
                scope_type: ScopeType::Environment
            }
        ));
    }

    #[test]
    fn memo_is_keyed_by_scope() {
        let mut ctx = ctx();
        ctx.memoize(&keys::CORS_MAX_AGE, ScopeType::Environment, "env-1", "60");

        assert_eq!(
            ctx.memoized(&keys::CORS_MAX_AGE, ScopeType::Environment, "env-1"),
            Some("60")
        );
        assert_eq!(ctx.memoized(&keys::CORS_MAX_AGE, ScopeType::Environment, "env-2"), None);
        assert_eq!(ctx.memoized(&keys::CORS_MAX_AGE, ScopeType::Organization, "env-1"), None);
    }

    #[test]
    fn forget_drops_all_scopes_of_one_key() {
        let mut ctx = ctx();
        ctx.memoize(&keys::CORS_MAX_AGE, ScopeType::Environment, "env-1", "60");
        ctx.memoize(&keys::CORS_MAX_AGE, ScopeType::Organization, "org-1", "120");
        ctx.memoize(&keys::EMAIL_HOST, ScopeType::Organization, "org-1", "smtp");

        ctx.forget(&keys::CORS_MAX_AGE);

        assert_eq!(ctx.memoized_len(), 1);
        assert_eq!(
            ctx.memoized(&keys::EMAIL_HOST, ScopeType::Organization, "org-1"),
            Some("smtp")
        );
    }
}
