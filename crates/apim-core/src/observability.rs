//! Observability infrastructure.
//!
//! Structured logging with consistent spans. This module provides the
//! initialization helper and span constructors shared by control plane
//! services.

use std::sync::Once;
use tracing::Span;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::scope::ScopeType;

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON structured logs (for production).
    Json,
    /// Pretty-printed logs (for development).
    #[default]
    Pretty,
}

/// Initializes the logging subsystem.
///
/// Call once at application startup. Safe to call multiple times;
/// subsequent calls are no-ops.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Controls log levels (e.g., `info`, `apim_params=debug`)
///
/// # Example
///
/// ```rust
/// use apim_core::observability::{init_logging, LogFormat};
///
/// init_logging(LogFormat::Pretty);
/// ```
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        // try_init: an embedding application may already own the global subscriber
        let _ = match format {
            LogFormat::Json => tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .try_init(),
            LogFormat::Pretty => tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .try_init(),
        };
    });
}

/// Creates a span for parameter operations with standard fields.
///
/// # Example
///
/// ```rust
/// use apim_core::observability::parameter_span;
/// use apim_core::scope::ScopeType;
///
/// let span = parameter_span("resolve", "portal.rating.enabled", ScopeType::Environment, "env-1");
/// let _guard = span.enter();
/// ```
#[must_use]
pub fn parameter_span(operation: &str, key: &str, scope_type: ScopeType, scope_id: &str) -> Span {
    tracing::info_span!(
        "parameter",
        op = operation,
        key = key,
        scope_type = %scope_type,
        scope_id = scope_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_succeeds() {
        init_logging(LogFormat::Pretty);
        init_logging(LogFormat::Json); // second call is a no-op
    }

    #[test]
    fn test_parameter_span_creates_span() {
        let span = parameter_span("save", "email.host", ScopeType::Organization, "DEFAULT");
        let _guard = span.enter();
        tracing::info!("message in parameter span");
    }
}
