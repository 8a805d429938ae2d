//! Parameter service metrics.
//!
//! Counters for resolution stages, save outcomes and collaborator failures.
//! These complement the structured logging emitted by the service.

use metrics::{counter, describe_counter, describe_histogram, histogram};

// ============================================================================
// Resolution Metrics
// ============================================================================

/// Resolutions by answering stage.
pub const RESOLUTIONS: &str = "apim_parameter_resolutions_total";

/// Batch resolution duration histogram.
pub const RESOLVE_MANY_DURATION: &str = "apim_parameter_resolve_many_duration_seconds";

// ============================================================================
// Write Metrics
// ============================================================================

/// Saves by outcome.
pub const SAVES: &str = "apim_parameter_saves_total";

/// Audit events that could not be emitted.
pub const AUDIT_FAILURES: &str = "apim_parameter_audit_failures_total";

// ============================================================================
// Collaborator Metrics
// ============================================================================

/// Store and lookup failures by operation.
pub const STORE_ERRORS: &str = "apim_parameter_store_errors_total";

// ============================================================================
// Metric Registration
// ============================================================================

/// Registers all parameter metric descriptions.
///
/// Call this once at application startup after installing the metrics recorder.
pub fn register_metrics() {
    describe_counter!(RESOLUTIONS, "Parameter resolutions by answering stage");
    describe_histogram!(
        RESOLVE_MANY_DURATION,
        "Duration of batched parameter resolutions in seconds"
    );
    describe_counter!(SAVES, "Parameter saves by outcome");
    describe_counter!(AUDIT_FAILURES, "Parameter audit events that failed to emit");
    describe_counter!(STORE_ERRORS, "Parameter store and lookup failures");
}

// ============================================================================
// Recording
// ============================================================================

/// Records one resolution answered by `source`.
pub fn record_resolution(source: &'static str) {
    counter!(RESOLUTIONS, "source" => source).increment(1);
}

/// Records the duration of a batched resolution.
pub fn record_resolve_many(duration_secs: f64) {
    histogram!(RESOLVE_MANY_DURATION).record(duration_secs);
}

/// Records a save by outcome label.
pub fn record_save(outcome: &'static str) {
    counter!(SAVES, "outcome" => outcome).increment(1);
}

/// Records an audit emission failure.
pub fn record_audit_failure() {
    counter!(AUDIT_FAILURES).increment(1);
}

/// Records a collaborator failure.
pub fn record_store_error(operation: &'static str) {
    counter!(STORE_ERRORS, "operation" => operation).increment(1);
}
