//! Configuration types

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::coordination::{EcosystemMatcher, PublishingOptions, RetryConfig};
use crate::error::Result;
use crate::types::CoordinationStrategy;

/// Main configuration for Gantry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ecosystem name, used in reports
    pub name: Option<String>,

    /// Coordination strategy
    pub coordination: CoordinationStrategy,

    /// Which dependency names belong to the ecosystem
    pub ecosystem: EcosystemConfig,

    /// Publishing configuration
    pub publish: PublishConfig,
}

impl Config {
    /// Ecosystem predicate described by the `ecosystem` section
    pub fn ecosystem_matcher(&self) -> Result<EcosystemMatcher> {
        self.ecosystem.matcher()
    }

    /// Retry policy described by the `publish` section
    pub fn retry_config(&self) -> RetryConfig {
        self.publish.retry_config()
    }

    /// Staged publishing options described by the `publish` section
    pub fn publishing_options(&self) -> PublishingOptions {
        PublishingOptions {
            parallel: self.publish.parallel,
            retry: self.retry_config(),
            timeout: (self.publish.timeout_secs > 0)
                .then(|| Duration::from_secs(self.publish.timeout_secs)),
        }
    }
}

/// Ecosystem membership configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcosystemConfig {
    /// Names starting with this prefix are in-ecosystem (e.g. "@acme/")
    pub prefix: Option<String>,

    /// Names matching this regular expression are in-ecosystem
    pub pattern: Option<String>,
}

impl EcosystemConfig {
    /// Build the matcher; with neither field set nothing is in-ecosystem
    pub fn matcher(&self) -> Result<EcosystemMatcher> {
        match (&self.prefix, &self.pattern) {
            (Some(prefix), _) => Ok(EcosystemMatcher::prefix(prefix.clone())),
            (None, Some(pattern)) => EcosystemMatcher::pattern(pattern),
            (None, None) => Ok(EcosystemMatcher::None),
        }
    }
}

/// Publishing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Publish the packages of a stage concurrently
    pub parallel: bool,

    /// Per-package command timeout in seconds (0 disables it)
    pub timeout_secs: u64,

    /// Attempts per package, including the first
    pub max_attempts: u32,

    /// Delay after the first failed attempt
    pub initial_delay_ms: u64,

    /// Backoff factor between attempts
    pub backoff_multiplier: f64,

    /// Upper bound on a single backoff delay
    pub max_delay_ms: u64,

    /// Planning estimate per package
    pub estimate_per_package_secs: u64,

    /// Shell command run per package; supports {name}, {version} and {path}
    pub command: Option<String>,

    /// Shell command that undoes a publish
    pub rollback_command: Option<String>,

    /// Roll back published packages when a stage fails
    pub rollback_on_failure: bool,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            timeout_secs: 300,
            max_attempts: 3,
            initial_delay_ms: 1000,
            backoff_multiplier: 2.0,
            max_delay_ms: 30_000,
            estimate_per_package_secs: 30,
            command: None,
            rollback_command: None,
            rollback_on_failure: false,
        }
    }
}

impl PublishConfig {
    /// Retry policy for publishing
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            backoff_multiplier: self.backoff_multiplier,
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }

    /// Planning estimate per package
    pub fn estimate_per_package(&self) -> Duration {
        Duration::from_secs(self.estimate_per_package_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publishing_options_from_config() {
        let config = Config {
            publish: PublishConfig {
                parallel: true,
                timeout_secs: 0,
                max_attempts: 5,
                initial_delay_ms: 200,
                ..PublishConfig::default()
            },
            ..Config::default()
        };

        let options = config.publishing_options();
        assert!(options.parallel);
        assert!(options.timeout.is_none());
        assert_eq!(options.retry.max_attempts, 5);
        assert_eq!(options.retry.initial_delay, Duration::from_millis(200));
        assert_eq!(options.retry.max_delay, Duration::from_secs(30));
    }

    #[test]
    fn test_default_matches_retry_defaults() {
        let config = Config::default();
        assert_eq!(config.retry_config(), RetryConfig::default());
        assert_eq!(config.publishing_options().timeout, Some(Duration::from_secs(300)));
        assert_eq!(config.publish.estimate_per_package(), Duration::from_secs(30));
    }

    #[test]
    fn test_ecosystem_matcher_from_config() {
        let prefix = EcosystemConfig {
            prefix: Some("@acme/".to_string()),
            pattern: None,
        };
        assert!(prefix.matcher().unwrap().is_member("@acme/tokens"));

        let pattern = EcosystemConfig {
            prefix: None,
            pattern: Some("^acme-".to_string()),
        };
        assert!(pattern.matcher().unwrap().is_member("acme-utils"));

        assert!(!EcosystemConfig::default()
            .matcher()
            .unwrap()
            .is_member("@acme/tokens"));
    }
}
