//! Process-wide override sources.
//!
//! An override source pre-empts persisted configuration for overridable keys.
//! It is read-only and queried on every resolution of such a key.
//!
//! [`EnvOverrideSource`] accepts both the canonical dotted name and its
//! environment-variable form: `portal.rating.enabled` also matches
//! `PORTAL_RATING_ENABLED` (or `APIM_PORTAL_RATING_ENABLED` with a prefix).

use std::collections::BTreeMap;

/// Read-only source of override values, keyed by canonical key name.
pub trait OverrideSource: Send + Sync {
    /// Returns true if the source defines `name`.
    fn has_property(&self, name: &str) -> bool {
        self.get_property(name).is_some()
    }

    /// Returns the raw value of `name`, if defined.
    fn get_property(&self, name: &str) -> Option<String>;
}

/// Source that never overrides anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOverrides;

impl OverrideSource for NoOverrides {
    fn has_property(&self, _name: &str) -> bool {
        false
    }

    fn get_property(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Fixed set of overrides keyed by canonical name.
#[derive(Debug, Default, Clone)]
pub struct MapOverrideSource {
    values: BTreeMap<String, String>,
}

impl MapOverrideSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an override.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapOverrideSource {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl OverrideSource for MapOverrideSource {
    fn get_property(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

/// Overrides taken from process environment variables.
///
/// Variables are captured when the source is built; the source never changes
/// afterwards.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrideSource {
    prefix: Option<String>,
    vars: BTreeMap<String, String>,
}

impl EnvOverrideSource {
    /// Captures the current process environment.
    #[must_use]
    pub fn from_env(prefix: Option<&str>) -> Self {
        Self::from_vars(prefix, std::env::vars())
    }

    /// Builds the source from explicit variables.
    #[must_use]
    pub fn from_vars<I, K, V>(prefix: Option<&str>, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            prefix: prefix
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Environment-variable form of a canonical name.
    ///
    /// Separators (`.`, `-`) become `_`, camel-case boundaries become `_`,
    /// and the result is upper-cased.
    ///
    /// ```rust
    /// use apim_params::EnvOverrideSource;
    ///
    /// let source = EnvOverrideSource::from_vars(Some("APIM"), Vec::<(String, String)>::new());
    /// assert_eq!(source.variable_name("portal.rating.enabled"), "APIM_PORTAL_RATING_ENABLED");
    /// assert_eq!(source.variable_name("portal.userCreation.enabled"), "APIM_PORTAL_USER_CREATION_ENABLED");
    /// assert_eq!(source.variable_name("http.cors.allow-origin"), "APIM_HTTP_CORS_ALLOW_ORIGIN");
    /// ```
    #[must_use]
    pub fn variable_name(&self, name: &str) -> String {
        let mut var = String::with_capacity(name.len() + 8);
        if let Some(prefix) = &self.prefix {
            var.push_str(&prefix.to_ascii_uppercase());
            var.push('_');
        }
        let mut previous_lower = false;
        for c in name.chars() {
            match c {
                '.' | '-' => {
                    var.push('_');
                    previous_lower = false;
                }
                c if c.is_ascii_uppercase() && previous_lower => {
                    var.push('_');
                    var.push(c);
                    previous_lower = false;
                }
                c => {
                    var.push(c.to_ascii_uppercase());
                    previous_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
                }
            }
        }
        var
    }

    /// Number of captured variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Returns true if no variable was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl OverrideSource for EnvOverrideSource {
    fn get_property(&self, name: &str) -> Option<String> {
        // an exact match wins over the relaxed form
        if self.prefix.is_none() {
            if let Some(value) = self.vars.get(name) {
                return Some(value.clone());
            }
        }
        self.vars.get(&self.variable_name(name)).cloned()
    }
}
