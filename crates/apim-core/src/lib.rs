//! # apim-core
//!
//! Core abstractions shared by the API management control plane services.
//!
//! - **Scopes**: Organization and environment identifiers and the scope levels
//! - **Audit**: Configuration change events, sinks and the emitter
//! - **Error Types**: Shared error definitions and result types
//! - **Observability**: Logging initialization and span helpers
//!
//! ## Example
//!
//! ```rust
//! use apim_core::prelude::*;
//!
//! let org = OrganizationId::new("DEFAULT").unwrap();
//! let env = EnvironmentId::new("env-1").unwrap();
//! assert_eq!(ScopeType::Environment.parent(), Some(ScopeType::Organization));
//! # let _ = (org, env);
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod audit;
pub mod error;
pub mod observability;
pub mod scope;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::audit::{AuditAction, AuditEmitter, AuditEvent, AuditSink};
    pub use crate::error::{Error, Result};
    pub use crate::scope::{EnvironmentId, OrganizationId, ScopeType};
}

// Re-export key types at crate root for ergonomics
pub use audit::{AuditAction, AuditEmitError, AuditEmitter, AuditEvent, AuditSink};
pub use error::{Error, Result};
pub use observability::{LogFormat, init_logging, parameter_span};
pub use scope::{EnvironmentId, OrganizationId, ScopeType};
