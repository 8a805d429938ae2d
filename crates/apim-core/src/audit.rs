//! Audit event infrastructure for configuration changes.
//!
//! Every effective change to persisted configuration produces one audit event
//! carrying the scope it applies to, the properties that identify the changed
//! record, and JSON snapshots of the record before and after the change.
//!
//! ## Design Principles
//!
//! 1. **Never include secrets**: snapshot strings matching secret patterns are redacted
//! 2. **Append-only semantics**: events are immutable once built
//! 3. **Fail-open**: a failed emission is reported but never undoes the change
//!
//! ## Usage
//!
//! ```rust
//! use apim_core::audit::{AuditAction, AuditEvent};
//! use apim_core::scope::ScopeType;
//!
//! let event = AuditEvent::builder()
//!     .action(AuditAction::ParameterCreated)
//!     .actor("user:admin")
//!     .reference(ScopeType::Environment, "env-1")
//!     .property("PARAMETER", "portal.rating.enabled")
//!     .new_value(serde_json::json!({"value": "true"}))
//!     .try_build()
//!     .unwrap();
//!
//! assert_eq!(event.properties["PARAMETER"], "portal.rating.enabled");
//! assert!(event.old_value.is_none());
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::scope::ScopeType;

/// Version of the audit event schema.
///
/// Increment when making breaking changes to the schema.
pub const AUDIT_EVENT_VERSION: u32 = 1;

/// Actor recorded when the caller supplies none.
pub const SYSTEM_ACTOR: &str = "system";

/// Configuration changes that are audited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum AuditAction {
    /// A parameter was persisted for the first time.
    ParameterCreated,
    /// A persisted parameter changed value.
    ParameterUpdated,
}

impl AuditAction {
    /// Returns the category of this action for grouping.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::ParameterCreated | Self::ParameterUpdated => "parameter",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ParameterCreated => "PARAMETER_CREATED",
            Self::ParameterUpdated => "PARAMETER_UPDATED",
        };
        write!(f, "{s}")
    }
}

/// An audit event describing one configuration change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    /// Schema version for evolution.
    pub event_version: u32,

    /// Unique event identifier (ULID format).
    pub event_id: String,

    /// When the change happened (UTC).
    pub created_at: DateTime<Utc>,

    /// Request ID for correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// Actor identity: "user:{id}", "service:{name}" or [`SYSTEM_ACTOR`].
    pub actor: String,

    /// Scope level the changed record is attached to.
    pub reference_type: ScopeType,

    /// Identifier of the organization or environment.
    pub reference_id: String,

    /// The change that happened.
    pub action: AuditAction,

    /// Identifying properties of the changed record (e.g. `PARAMETER`).
    pub properties: BTreeMap<String, String>,

    /// Snapshot before the change; `None` on creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,

    /// Snapshot after the change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

impl AuditEvent {
    /// Creates a new builder for constructing audit events.
    #[must_use]
    pub fn builder() -> AuditEventBuilder {
        AuditEventBuilder::default()
    }

    /// Redacts snapshot strings and properties that look like secrets.
    ///
    /// The redacted value names the kind of secret detected.
    pub fn redact_secrets(&mut self) {
        for value in self.properties.values_mut() {
            *value = redact_if_secret(value);
        }
        if let Some(old) = self.old_value.as_mut() {
            redact_json(old);
        }
        if let Some(new) = self.new_value.as_mut() {
            redact_json(new);
        }
    }
}

/// Patterns that indicate potential secrets in audit data.
const SECRET_PATTERNS: &[(&str, &str)] = &[
    ("Bearer ", "bearer_token"),
    ("token=", "token_param"),
    ("secret=", "secret_param"),
    ("password=", "password_param"),
    ("AWSAccessKeyId", "aws_key"),
    ("-----BEGIN", "pem_block"),
];

fn detect_secret_pattern(value: &str) -> Option<&'static str> {
    if looks_like_jwt(value) {
        return Some("jwt_token");
    }
    let lower = value.to_lowercase();
    SECRET_PATTERNS
        .iter()
        .find(|(pattern, _)| lower.contains(&pattern.to_lowercase()))
        .map(|(_, name)| *name)
}

/// Compact JWS shape: three non-empty dot-separated segments, the first starting with `eyJ`.
fn looks_like_jwt(value: &str) -> bool {
    let value = value.trim();
    value.starts_with("eyJ")
        && value.split('.').count() == 3
        && value.split('.').all(|segment| !segment.is_empty())
}

fn redact_if_secret(value: &str) -> String {
    detect_secret_pattern(value).map_or_else(|| value.to_string(), |p| format!("[REDACTED:{p}]"))
}

fn redact_json(value: &mut Value) {
    match value {
        Value::String(s) => {
            if detect_secret_pattern(s).is_some() {
                *s = redact_if_secret(s);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_json),
        Value::Object(map) => map.values_mut().for_each(redact_json),
        _ => {}
    }
}

/// Error type for audit event validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuditValidationError {
    /// A required field is missing.
    #[error("audit event missing required field: {field}")]
    MissingField {
        /// The name of the missing field.
        field: String,
    },
}

/// Builder for constructing [`AuditEvent`] instances.
#[derive(Debug, Default)]
pub struct AuditEventBuilder {
    action: Option<AuditAction>,
    actor: Option<String>,
    reference: Option<(ScopeType, String)>,
    request_id: Option<String>,
    properties: BTreeMap<String, String>,
    old_value: Option<Value>,
    new_value: Option<Value>,
    created_at: Option<DateTime<Utc>>,
}

impl AuditEventBuilder {
    /// Sets the action for this event.
    #[must_use]
    pub fn action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Sets the actor identity.
    #[must_use]
    pub fn actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Sets the scope the changed record belongs to.
    #[must_use]
    pub fn reference(mut self, scope_type: ScopeType, id: impl Into<String>) -> Self {
        self.reference = Some((scope_type, id.into()));
        self
    }

    /// Sets the request ID for correlation.
    #[must_use]
    pub fn request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Adds an identifying property.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Sets the snapshot taken before the change.
    #[must_use]
    pub fn old_value(mut self, value: Value) -> Self {
        self.old_value = Some(value);
        self
    }

    /// Sets the snapshot taken after the change.
    #[must_use]
    pub fn new_value(mut self, value: Value) -> Self {
        self.new_value = Some(value);
        self
    }

    /// Overrides the event timestamp (defaults to now).
    #[must_use]
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Builds the audit event.
    ///
    /// A missing actor is recorded as [`SYSTEM_ACTOR`].
    ///
    /// # Errors
    ///
    /// Returns an error if the action or reference is missing.
    pub fn try_build(self) -> Result<AuditEvent, AuditValidationError> {
        let action = self
            .action
            .ok_or_else(|| AuditValidationError::MissingField {
                field: "action".to_string(),
            })?;
        let (reference_type, reference_id) =
            self.reference
                .ok_or_else(|| AuditValidationError::MissingField {
                    field: "reference".to_string(),
                })?;

        let mut event = AuditEvent {
            event_version: AUDIT_EVENT_VERSION,
            event_id: ulid::Ulid::new().to_string(),
            created_at: self.created_at.unwrap_or_else(Utc::now),
            request_id: self.request_id,
            actor: self.actor.unwrap_or_else(|| SYSTEM_ACTOR.to_string()),
            reference_type,
            reference_id,
            action,
            properties: self.properties,
            old_value: self.old_value,
            new_value: self.new_value,
        };

        // secrets are masked, never rejected
        event.redact_secrets();

        Ok(event)
    }
}

// ============================================================================
// Audit Sink Infrastructure
// ============================================================================

/// Error returned by a sink that could not record an event.
#[derive(Debug, Clone, thiserror::Error)]
#[error("audit emit error: {message}")]
pub struct AuditEmitError {
    /// Description of the failure.
    pub message: String,
}

impl AuditEmitError {
    /// Creates a new emission error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Trait for audit event sinks.
///
/// Implementations should be lightweight; `emit` runs on the save path.
pub trait AuditSink: Send + Sync {
    /// Records an audit event.
    ///
    /// # Errors
    ///
    /// Returns an error if the event could not be recorded.
    fn emit(&self, event: AuditEvent) -> Result<(), AuditEmitError>;
}

/// Audit emitter routing events to a configured sink.
#[derive(Clone)]
pub struct AuditEmitter {
    sink: Arc<dyn AuditSink>,
}

impl std::fmt::Debug for AuditEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditEmitter").finish_non_exhaustive()
    }
}

impl AuditEmitter {
    /// Creates a new audit emitter with the given sink.
    #[must_use]
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Creates an audit emitter with tracing sink (default for production).
    #[must_use]
    pub fn with_tracing() -> Self {
        Self::new(Arc::new(TracingAuditSink))
    }

    /// Creates an audit emitter with a test sink for unit testing.
    #[must_use]
    pub fn with_test_sink(sink: Arc<TestAuditSink>) -> Self {
        Self::new(sink)
    }

    /// Emits an audit event, propagating sink failures.
    ///
    /// # Errors
    ///
    /// Returns the sink's error when the event could not be recorded.
    pub fn emit(&self, event: AuditEvent) -> Result<(), AuditEmitError> {
        self.sink.emit(event)
    }

    /// Emits an audit event, logging instead of propagating a failure.
    ///
    /// Returns `true` when the sink accepted the event.
    pub fn emit_best_effort(&self, event: AuditEvent) -> bool {
        let event_id = event.event_id.clone();
        let action = event.action;
        match self.sink.emit(event) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(
                    target: "audit",
                    event_id = %event_id,
                    action = %action,
                    error = %err,
                    "failed to record audit event"
                );
                false
            }
        }
    }
}

/// Audit sink that emits events via tracing.
///
/// Events are emitted at INFO level with the `audit` target.
#[derive(Debug, Default, Clone)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: AuditEvent) -> Result<(), AuditEmitError> {
        let old_value = event.old_value.as_ref().map(Value::to_string);
        let new_value = event.new_value.as_ref().map(Value::to_string);
        tracing::info!(
            target: "audit",
            event_id = %event.event_id,
            action = %event.action,
            actor = %event.actor,
            reference_type = %event.reference_type,
            reference_id = %event.reference_id,
            properties = ?event.properties,
            old_value = ?old_value,
            new_value = ?new_value,
            request_id = ?event.request_id,
            "configuration_change"
        );
        Ok(())
    }
}

/// Test audit sink that captures events for assertions.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use apim_core::audit::{AuditAction, AuditEmitter, AuditEvent, TestAuditSink};
/// use apim_core::scope::ScopeType;
///
/// let sink = Arc::new(TestAuditSink::new());
/// let emitter = AuditEmitter::with_test_sink(sink.clone());
///
/// let event = AuditEvent::builder()
///     .action(AuditAction::ParameterUpdated)
///     .reference(ScopeType::Organization, "DEFAULT")
///     .try_build()
///     .unwrap();
/// emitter.emit(event).unwrap();
///
/// assert_eq!(sink.len(), 1);
/// assert_eq!(sink.events()[0].action, AuditAction::ParameterUpdated);
/// ```
#[derive(Debug, Default)]
pub struct TestAuditSink {
    events: std::sync::Mutex<Vec<AuditEvent>>,
}

impl TestAuditSink {
    /// Creates a new empty test sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all captured events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Returns the number of captured events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    /// Returns true if no events have been captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears all captured events.
    pub fn clear(&self) {
        if let Ok(mut guard) = self.events.lock() {
            guard.clear();
        }
    }

    /// Returns the last captured event, if any.
    #[must_use]
    pub fn last(&self) -> Option<AuditEvent> {
        self.events
            .lock()
            .ok()
            .and_then(|guard| guard.last().cloned())
    }

    /// Finds events by action type.
    #[must_use]
    pub fn find_by_action(&self, action: AuditAction) -> Vec<AuditEvent> {
        self.events
            .lock()
            .map(|guard| {
                guard
                    .iter()
                    .filter(|e| e.action == action)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl AuditSink for TestAuditSink {
    fn emit(&self, event: AuditEvent) -> Result<(), AuditEmitError> {
        self.events
            .lock()
            .map(|mut guard| guard.push(event))
            .map_err(|_| AuditEmitError::new("test sink lock poisoned"))
    }
}
