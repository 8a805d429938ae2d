//! Scope primitives for organization and environment configuration.
//!
//! Configuration in the control plane is attached at one of two levels:
//! - **Organization**: the top-level tenant boundary
//! - **Environment**: a deployment space owned by exactly one organization
//!
//! An environment never exists without its owning organization, which is why
//! environment-level lookups can fall back to organization-level values.
//!
//! # Example
//!
//! ```rust
//! use apim_core::scope::{EnvironmentId, OrganizationId, ScopeType};
//!
//! let org = OrganizationId::new("DEFAULT").unwrap();
//! let env = EnvironmentId::new("env-1").unwrap();
//! assert_eq!(ScopeType::Environment.to_string(), "ENVIRONMENT");
//! assert_eq!(org.as_str(), "DEFAULT");
//! assert_eq!(env.as_str(), "env-1");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Maximum length of a scope identifier.
pub const MAX_SCOPE_ID_LEN: usize = 128;

/// The level a configuration value is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScopeType {
    /// Organization-wide configuration.
    Organization,
    /// Environment-specific configuration.
    Environment,
}

impl ScopeType {
    /// Returns the canonical upper-case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Organization => "ORGANIZATION",
            Self::Environment => "ENVIRONMENT",
        }
    }

    /// Returns the parent scope, if any.
    ///
    /// Environments are owned by organizations; organizations have no parent.
    #[must_use]
    pub const fn parent(&self) -> Option<Self> {
        match self {
            Self::Organization => None,
            Self::Environment => Some(Self::Organization),
        }
    }
}

impl fmt::Display for ScopeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScopeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ORGANIZATION" => Ok(Self::Organization),
            "ENVIRONMENT" => Ok(Self::Environment),
            _ => Err(Error::InvalidInput(format!("unknown scope type: {s}"))),
        }
    }
}

/// Identifier of an organization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganizationId(String);

impl OrganizationId {
    /// Creates a new organization ID after validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the ID is empty, too long, or contains characters
    /// outside `[A-Za-z0-9._-]`.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate_scope_id(&id, "organization ID")?;
        Ok(Self(id))
    }

    /// Creates an organization ID without validation.
    ///
    /// Intended for IDs read back from a store that validated them on write.
    #[must_use]
    pub fn new_unchecked(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for OrganizationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifier of an environment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvironmentId(String);

impl EnvironmentId {
    /// Creates a new environment ID after validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the ID is empty, too long, or contains characters
    /// outside `[A-Za-z0-9._-]`.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate_scope_id(&id, "environment ID")?;
        Ok(Self(id))
    }

    /// Creates an environment ID without validation.
    #[must_use]
    pub fn new_unchecked(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EnvironmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EnvironmentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn validate_scope_id(id: &str, field: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::InvalidId {
            message: format!("{field} cannot be empty"),
        });
    }

    if id.len() > MAX_SCOPE_ID_LEN {
        return Err(Error::InvalidId {
            message: format!("{field} '{id}' is too long (maximum {MAX_SCOPE_ID_LEN} characters)"),
        });
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(Error::InvalidId {
            message: format!(
                "{field} '{id}' contains invalid characters (allowed: A-Z, a-z, 0-9, '-', '_', '.')"
            ),
        });
    }

    Ok(())
}
