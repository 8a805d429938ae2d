//! Error types for parameter resolution.

use apim_core::ScopeType;
use thiserror::Error;

/// Result type alias for parameter operations.
pub type Result<T> = std::result::Result<T, ParamError>;

/// Errors that can occur while resolving or saving parameters.
///
/// Only "no value found" falls through to a key's default. Every variant here
/// reaches the caller.
#[derive(Debug, Error)]
pub enum ParamError {
    /// The parameter store failed.
    #[error("parameter store unavailable during {operation}: {source}")]
    StoreUnavailable {
        /// Store operation that failed (`find`, `create`, ...).
        operation: &'static str,
        /// Underlying store error.
        #[source]
        source: apim_core::Error,
    },

    /// A create collided with an existing record.
    #[error("parameter {key} already exists for {scope_type} {scope_id}")]
    Conflict {
        /// Canonical key name.
        key: String,
        /// Scope level of the write.
        scope_type: ScopeType,
        /// Scope identifier of the write.
        scope_id: String,
    },

    /// The owning organization of an environment could not be resolved.
    #[error("cannot resolve owning organization of environment {environment_id}: {source}")]
    UnknownScope {
        /// Environment that failed to resolve.
        environment_id: String,
        /// Underlying lookup error.
        #[source]
        source: apim_core::Error,
    },

    /// The key may not be stored at the requested scope.
    #[error("parameter {key} is not allowed at {scope_type} scope")]
    InvalidKeyScope {
        /// Canonical key name.
        key: String,
        /// Requested scope level.
        scope_type: ScopeType,
    },

    /// No scope id was given and the context carries none for this scope.
    #[error("no {scope_type} id available in resolution context")]
    MissingScopeId {
        /// Requested scope level.
        scope_type: ScopeType,
    },

    /// No key is registered under the given identifier or name.
    #[error("unknown parameter key: {0}")]
    UnknownKey(String),

    /// A resolved value could not be converted to the requested type.
    #[error("invalid value for parameter {key}: {message}")]
    InvalidValue {
        /// Canonical key name.
        key: String,
        /// Description of the conversion failure.
        message: String,
    },

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ParamError {
    /// Wraps a store failure, mapping uniqueness violations to [`ParamError::Conflict`].
    pub(crate) fn from_store(
        operation: &'static str,
        source: apim_core::Error,
        key: &str,
        scope_type: ScopeType,
        scope_id: &str,
    ) -> Self {
        if source.is_conflict() {
            Self::Conflict {
                key: key.to_string(),
                scope_type,
                scope_id: scope_id.to_string(),
            }
        } else {
            Self::StoreUnavailable { operation, source }
        }
    }

    /// Returns true for failures of an external collaborator (store or lookup).
    #[must_use]
    pub const fn is_collaborator_failure(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. } | Self::UnknownScope { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_is_mapped_from_store_error() {
        let err = ParamError::from_store(
            "create",
            apim_core::Error::conflict("duplicate"),
            "portal.rating.enabled",
            ScopeType::Environment,
            "env-1",
        );
        assert!(matches!(err, ParamError::Conflict { .. }));
        assert_eq!(
            err.to_string(),
            "parameter portal.rating.enabled already exists for ENVIRONMENT env-1"
        );
    }

    #[test]
    fn other_store_errors_are_unavailable() {
        let err = ParamError::from_store(
            "find",
            apim_core::Error::storage("connection reset"),
            "email.host",
            ScopeType::Organization,
            "DEFAULT",
        );
        assert!(matches!(err, ParamError::StoreUnavailable { operation: "find", .. }));
        assert!(err.is_collaborator_failure());
    }

    #[test]
    fn validation_errors_are_not_collaborator_failures() {
        let err = ParamError::InvalidKeyScope {
            key: "portal.rating.enabled".into(),
            scope_type: ScopeType::Organization,
        };
        assert!(!err.is_collaborator_failure());
        assert_eq!(
            err.to_string(),
            "parameter portal.rating.enabled is not allowed at ORGANIZATION scope"
        );
    }
}
