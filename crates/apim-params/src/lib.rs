//! # apim-params
//!
//! Scoped configuration parameters for the API management control plane.
//!
//! A parameter is a key/value setting stored per organization or per
//! environment. [`ParameterService`] computes the effective value of a key
//! through a fixed cascade: request memo, process override, the scope's own
//! record, the owning organization's record (environment scope only), and
//! finally the key's compiled-in default.
//!
//! ## Modules
//!
//! - **Keys**: [`Key`] declarations, the built-in [`keys`] and the [`KeyRegistry`]
//! - **Codec**: `;`-joined list and `key@value` map encodings
//! - **Collaborators**: [`ParameterStore`], [`EnvironmentLookup`] and [`OverrideSource`]
//! - **Service**: resolution, batched resolution, typed accessors and audited saves
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use apim_core::{EnvironmentId, OrganizationId, ScopeType};
//! use apim_params::{
//!     keys, MemoryEnvironmentDirectory, MemoryParameterStore, ParameterService,
//!     ResolutionContext,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let org = OrganizationId::new("org-1").unwrap();
//! let env = EnvironmentId::new("env-1").unwrap();
//! let directory: MemoryEnvironmentDirectory = [(env.clone(), org.clone())].into_iter().collect();
//! let service = ParameterService::new(Arc::new(MemoryParameterStore::new()), Arc::new(directory));
//!
//! let mut ctx = ResolutionContext::for_environment(org, env);
//! let enabled = service
//!     .find_as_boolean(&keys::PORTAL_RATING_ENABLED, None, ScopeType::Environment, &mut ctx)
//!     .await
//!     .unwrap();
//! assert!(!enabled);
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod codec;
pub mod config;
pub mod context;
pub mod error;
pub mod key;
pub mod keys;
pub mod metrics;
pub mod override_source;
pub mod parameter;
pub mod registry;
pub mod service;
pub mod store;

pub use config::ParameterServiceConfig;
pub use context::ResolutionContext;
pub use error::{ParamError, Result};
pub use key::{Key, ValueKind};
pub use override_source::{EnvOverrideSource, MapOverrideSource, NoOverrides, OverrideSource};
pub use parameter::{Parameter, SaveOutcome};
pub use registry::KeyRegistry;
pub use service::{AUDIT_PARAMETER_PROPERTY, ParameterService, Resolution, ResolutionSource};
pub use store::{EnvironmentLookup, MemoryEnvironmentDirectory, MemoryParameterStore, ParameterStore};
