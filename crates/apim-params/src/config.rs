//! Parameter service configuration.

use serde::{Deserialize, Serialize};

use crate::error::{ParamError, Result};

/// Environment variable toggling per-context memoization.
pub const MEMOIZE_VAR: &str = "APIM_PARAMS_MEMOIZE";

/// Environment variable toggling environment-variable overrides.
pub const ENV_OVERRIDES_VAR: &str = "APIM_PARAMS_ENV_OVERRIDES";

/// Environment variable holding the override variable prefix.
pub const OVERRIDE_PREFIX_VAR: &str = "APIM_PARAMS_OVERRIDE_PREFIX";

/// Runtime settings of [`ParameterService`](crate::ParameterService).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParameterServiceConfig {
    /// Remember resolved values in the request context.
    pub memoize: bool,
    /// Read overrides from process environment variables.
    pub env_overrides: bool,
    /// Prefix required on override variables (`APIM` matches `APIM_EMAIL_HOST`).
    pub override_prefix: Option<String>,
}

impl Default for ParameterServiceConfig {
    fn default() -> Self {
        Self {
            memoize: true,
            env_overrides: true,
            override_prefix: None,
        }
    }
}

impl ParameterServiceConfig {
    /// Loads configuration from process environment variables.
    ///
    /// Supported env vars:
    /// - `APIM_PARAMS_MEMOIZE` (`true`/`false`, default `true`)
    /// - `APIM_PARAMS_ENV_OVERRIDES` (`true`/`false`, default `true`)
    /// - `APIM_PARAMS_OVERRIDE_PREFIX` (optional)
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::Config`] when a boolean variable is malformed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::Config`] when a boolean variable is malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            memoize: parse_bool(&lookup, MEMOIZE_VAR, defaults.memoize)?,
            env_overrides: parse_bool(&lookup, ENV_OVERRIDES_VAR, defaults.env_overrides)?,
            override_prefix: non_empty(&lookup, OVERRIDE_PREFIX_VAR),
        })
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|value| value.trim().to_string())
        .and_then(|value| if value.is_empty() { None } else { Some(value) })
}

fn parse_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> Result<bool> {
    let Some(value) = non_empty(lookup, key) else {
        return Ok(default);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Ok(true),
        "0" | "false" | "no" | "n" => Ok(false),
        _ => Err(ParamError::Config(format!(
            "{key} must be a boolean (true/false/1/0)"
        ))),
    }
}
