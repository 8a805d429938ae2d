//! Shared test utilities for apim integration tests.
//!
//! This crate provides:
//! - [`TracingParameterStore`]: In-memory parameter store with call recording
//! - [`ServiceFixture`]: Pre-wired parameter service
//! - Failing collaborators for error-path tests
//! - Custom assertion helpers
//!
//! # Example
//!
//! ```rust,ignore
//! use apim_core::ScopeType;
//! use apim_params::keys;
//! use apim_test_utils::{ServiceFixture, assert_no_writes};
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let fx = ServiceFixture::new();
//!     let mut ctx = fx.env_context();
//!     let value = fx
//!         .service
//!         .resolve(&keys::PORTAL_RATING_ENABLED, None, ScopeType::Environment, &mut ctx)
//!         .await
//!         .unwrap();
//!     assert_eq!(value, "false");
//!     assert_no_writes(&fx.store);
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
// Test utilities use expect/unwrap for cleaner test code - panics are acceptable in tests
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc)]

pub mod assertions;
pub mod fixtures;
pub mod storage;

pub use assertions::*;
pub use fixtures::*;
pub use storage::*;

/// Initialize test logging (call once per test module).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("apim_params=debug".parse().expect("valid directive")),
        )
        .with_test_writer()
        .try_init();
}
