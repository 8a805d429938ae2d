//! Parameter key definitions.
//!
//! A [`Key`] is an immutable, compiled-in description of one configuration
//! entry: its canonical name, its default value, the scopes it may be stored
//! at, whether a process-wide override may pre-empt it, and the shape of its
//! value.

use std::fmt;

use apim_core::ScopeType;

/// Shape of a parameter value, used only for encoding decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// A single string (booleans and numbers included).
    Scalar,
    /// A `;`-separated list of strings.
    List,
    /// A `;`-separated list of `key@value` pairs.
    Map,
}

/// A compiled-in configuration key.
///
/// Keys are declared as `const` values (see [`crate::keys`]) and gathered in a
/// [`KeyRegistry`](crate::KeyRegistry).
///
/// ```rust
/// use apim_core::ScopeType;
/// use apim_params::{Key, ValueKind};
///
/// const THEME_COLORS: Key = Key::map(
///     "THEME_COLORS",
///     "portal.theme.colors",
///     "",
///     &[ScopeType::Environment],
/// )
/// .not_overridable();
///
/// assert_eq!(THEME_COLORS.kind(), ValueKind::Map);
/// assert!(!THEME_COLORS.is_overridable());
/// assert!(THEME_COLORS.allows(ScopeType::Environment));
/// assert!(!THEME_COLORS.allows(ScopeType::Organization));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    id: &'static str,
    name: &'static str,
    default_value: &'static str,
    scopes: &'static [ScopeType],
    overridable: bool,
    kind: ValueKind,
}

impl Key {
    /// Declares a scalar key. Keys are overridable unless marked otherwise.
    #[must_use]
    pub const fn scalar(
        id: &'static str,
        name: &'static str,
        default_value: &'static str,
        scopes: &'static [ScopeType],
    ) -> Self {
        Self {
            id,
            name,
            default_value,
            scopes,
            overridable: true,
            kind: ValueKind::Scalar,
        }
    }

    /// Declares a list key.
    #[must_use]
    pub const fn list(
        id: &'static str,
        name: &'static str,
        default_value: &'static str,
        scopes: &'static [ScopeType],
    ) -> Self {
        Self {
            kind: ValueKind::List,
            ..Self::scalar(id, name, default_value, scopes)
        }
    }

    /// Declares a map key.
    #[must_use]
    pub const fn map(
        id: &'static str,
        name: &'static str,
        default_value: &'static str,
        scopes: &'static [ScopeType],
    ) -> Self {
        Self {
            kind: ValueKind::Map,
            ..Self::scalar(id, name, default_value, scopes)
        }
    }

    /// Marks the key as immune to process-wide overrides.
    #[must_use]
    pub const fn not_overridable(self) -> Self {
        Self {
            overridable: false,
            ..self
        }
    }

    /// Identifier, e.g. `PORTAL_RATING_ENABLED`.
    #[must_use]
    pub const fn id(&self) -> &'static str {
        self.id
    }

    /// Canonical name used for storage and overrides, e.g. `portal.rating.enabled`.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Compiled-in default; may be empty.
    #[must_use]
    pub const fn default_value(&self) -> &'static str {
        self.default_value
    }

    /// Scopes the key may be stored at.
    #[must_use]
    pub const fn scopes(&self) -> &'static [ScopeType] {
        self.scopes
    }

    /// Whether an override source may pre-empt persisted values.
    #[must_use]
    pub const fn is_overridable(&self) -> bool {
        self.overridable
    }

    /// Shape of the value.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Returns true if the key may be stored at `scope`.
    #[must_use]
    pub fn allows(&self, scope: ScopeType) -> bool {
        self.scopes.contains(&scope)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOTH: &[ScopeType] = &[ScopeType::Organization, ScopeType::Environment];

    #[test]
    fn constructors_set_kind_and_default_overridable() {
        let list = Key::list("CORS_ORIGINS", "http.cors.allow-origin", "*", BOTH);
        assert_eq!(list.kind(), ValueKind::List);
        assert!(list.is_overridable());
        assert_eq!(list.default_value(), "*");

        let scalar = Key::scalar("TITLE", "management.title", "", BOTH).not_overridable();
        assert_eq!(scalar.kind(), ValueKind::Scalar);
        assert!(!scalar.is_overridable());
        assert_eq!(scalar.to_string(), "management.title");
    }

    #[test]
    fn allows_checks_declared_scopes() {
        let env_only = Key::scalar("X", "x", "", &[ScopeType::Environment]);
        assert!(env_only.allows(ScopeType::Environment));
        assert!(!env_only.allows(ScopeType::Organization));
    }
}
