//! Persisted parameter record.

use apim_core::ScopeType;
use serde::{Deserialize, Serialize};

/// A persisted key/value record attached to one organization or environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    /// Canonical key name.
    pub key: String,
    /// Organization or environment id.
    pub reference_id: String,
    /// Scope level of `reference_id`.
    pub reference_type: ScopeType,
    /// Stored value in its encoded form.
    pub value: String,
}

impl Parameter {
    /// Creates a new record.
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        reference_id: impl Into<String>,
        reference_type: ScopeType,
        value: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            reference_id: reference_id.into(),
            reference_type,
            value: value.into(),
        }
    }

    /// Returns a copy carrying `value`.
    #[must_use]
    pub fn with_value(&self, value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..self.clone()
        }
    }

    /// JSON snapshot used in audit events.
    #[must_use]
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "key": self.key,
            "referenceId": self.reference_id,
            "referenceType": self.reference_type,
            "value": self.value,
        })
    }
}

/// Result of a [`save`](crate::ParameterService::save) call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A new record was written.
    Created(Parameter),
    /// An existing record changed value.
    Updated {
        /// Record before the update.
        previous: Parameter,
        /// Record after the update.
        current: Parameter,
    },
    /// The stored value already matched; nothing was written.
    Unchanged(Parameter),
    /// The record was deleted.
    Deleted(Parameter),
    /// Delete requested but nothing was stored.
    Absent,
    /// An override pins the key; nothing was written. Carries the effective value.
    Overridden(Parameter),
}

impl SaveOutcome {
    /// The record to hand back to callers; `None` after a delete or a no-op delete.
    #[must_use]
    pub fn parameter(&self) -> Option<&Parameter> {
        match self {
            Self::Created(p) | Self::Unchanged(p) | Self::Overridden(p) => Some(p),
            Self::Updated { current, .. } => Some(current),
            Self::Deleted(_) | Self::Absent => None,
        }
    }

    /// Owned variant of [`parameter`](Self::parameter).
    #[must_use]
    pub fn into_parameter(self) -> Option<Parameter> {
        match self {
            Self::Created(p) | Self::Unchanged(p) | Self::Overridden(p) => Some(p),
            Self::Updated { current, .. } => Some(current),
            Self::Deleted(_) | Self::Absent => None,
        }
    }

    /// Returns true if the store was written to.
    #[must_use]
    pub const fn wrote(&self) -> bool {
        matches!(
            self,
            Self::Created(_) | Self::Updated { .. } | Self::Deleted(_)
        )
    }

    /// Label used in logs and metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Created(_) => "created",
            Self::Updated { .. } => "updated",
            Self::Unchanged(_) => "unchanged",
            Self::Deleted(_) => "deleted",
            Self::Absent => "absent",
            Self::Overridden(_) => "overridden",
        }
    }
}
