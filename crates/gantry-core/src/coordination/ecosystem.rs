//! Ecosystem membership
//!
//! Decides whether a dependency name belongs to the coordinated ecosystem.
//! An in-ecosystem dependency that is absent from the known package set is
//! a `missing` conflict; any other unknown dependency is an ordinary
//! third-party package and is ignored.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::error::{ConfigError, Result};

/// Predicate over dependency names
#[derive(Clone, Default)]
pub enum EcosystemMatcher {
    /// Nothing is considered part of the ecosystem
    #[default]
    None,
    /// Names starting with a prefix, such as an npm scope
    Prefix(String),
    /// Names matching a regular expression
    Pattern(Regex),
    /// Caller-supplied predicate
    Custom(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl EcosystemMatcher {
    /// Match names starting with `prefix`
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::Prefix(prefix.into())
    }

    /// Match names against a regular expression
    pub fn pattern(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| ConfigError::InvalidValue {
            field: "ecosystem.pattern".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::Pattern(regex))
    }

    /// Match names with an arbitrary predicate
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(predicate))
    }

    /// Check whether a dependency name belongs to the ecosystem
    pub fn is_member(&self, name: &str) -> bool {
        match self {
            Self::None => false,
            Self::Prefix(prefix) => name.starts_with(prefix.as_str()),
            Self::Pattern(regex) => regex.is_match(name),
            Self::Custom(predicate) => predicate(name),
        }
    }
}

impl fmt::Debug for EcosystemMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Prefix(prefix) => f.debug_tuple("Prefix").field(prefix).finish(),
            Self::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}
