//! Custom assertion helpers and failing collaborators for integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use apim_core::audit::{AuditAction, AuditEmitError, AuditEvent, AuditSink, TestAuditSink};

use crate::storage::{StoreOp, TracingParameterStore};

/// Asserts that the store saw no create, update or delete.
///
/// # Panics
///
/// Panics if any write was recorded.
pub fn assert_no_writes(store: &TracingParameterStore) {
    let writes: Vec<StoreOp> = store
        .operations()
        .into_iter()
        .filter(StoreOp::is_write)
        .collect();
    assert!(writes.is_empty(), "Expected no store writes, found {writes:?}");
}

/// Asserts the exact number of store writes.
///
/// # Panics
///
/// Panics if the count differs.
pub fn assert_write_count(store: &TracingParameterStore, expected: usize) {
    assert_eq!(
        store.write_count(),
        expected,
        "Unexpected store writes: {:?}",
        store.operations()
    );
}

/// Asserts that the store was never called.
///
/// # Panics
///
/// Panics if any operation was recorded.
pub fn assert_store_untouched(store: &TracingParameterStore) {
    let ops = store.operations();
    assert!(ops.is_empty(), "Expected no store calls, found {ops:?}");
}

/// Asserts that exactly one audit event with `action` was captured for `key`.
///
/// # Panics
///
/// Panics if the count or parameter property differs.
pub fn assert_single_audit(sink: &TestAuditSink, action: AuditAction, key: &str) -> AuditEvent {
    let events = sink.find_by_action(action);
    assert_eq!(events.len(), 1, "Expected one {action} event, found {events:?}");
    let event = events.into_iter().next().expect("one event");
    assert_eq!(
        event.properties.get(apim_params::AUDIT_PARAMETER_PROPERTY).map(String::as_str),
        Some(key),
        "Audit event names the wrong parameter"
    );
    event
}

/// Audit sink that rejects every event and counts attempts.
#[derive(Debug, Default)]
pub struct FailingAuditSink {
    attempts: AtomicUsize,
}

impl FailingAuditSink {
    /// Creates a new failing sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rejected events.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl AuditSink for FailingAuditSink {
    fn emit(&self, event: AuditEvent) -> Result<(), AuditEmitError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(AuditEmitError::new(format!(
            "audit sink unavailable for {}",
            event.event_id
        )))
    }
}
