//! Configuration validation

use tracing::debug;

use crate::coordination::EcosystemMatcher;
use crate::error::{ConfigError, Result};

use super::types::Config;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_coordination(config)?;
    validate_ecosystem(config)?;
    validate_publish(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}

fn validate_coordination(config: &Config) -> Result<()> {
    let coordination = &config.coordination;

    if coordination.core_package_sync && coordination.core_packages.is_empty() {
        return Err(invalid(
            "coordination.core_packages",
            "core_package_sync requires at least one core package",
        )
        .into());
    }

    if let Some(name) = coordination
        .core_packages
        .iter()
        .find(|name| coordination.independent_packages.contains(name))
    {
        return Err(invalid(
            "coordination.independent_packages",
            format!("{} cannot be both a core and an independent package", name),
        )
        .into());
    }

    Ok(())
}

fn validate_ecosystem(config: &Config) -> Result<()> {
    let ecosystem = &config.ecosystem;

    if ecosystem.prefix.is_some() && ecosystem.pattern.is_some() {
        return Err(invalid("ecosystem", "set either prefix or pattern, not both").into());
    }

    if let Some(pattern) = &ecosystem.pattern {
        EcosystemMatcher::pattern(pattern)?;
    }

    Ok(())
}

fn validate_publish(config: &Config) -> Result<()> {
    let publish = &config.publish;

    if publish.max_attempts == 0 {
        return Err(invalid("publish.max_attempts", "must be at least 1").into());
    }

    if publish.backoff_multiplier.is_nan() || publish.backoff_multiplier < 1.0 {
        return Err(invalid("publish.backoff_multiplier", "must be at least 1.0").into());
    }

    if publish.initial_delay_ms > publish.max_delay_ms {
        return Err(invalid(
            "publish.initial_delay_ms",
            "must not exceed publish.max_delay_ms",
        )
        .into());
    }

    for (field, command) in [
        ("publish.command", &publish.command),
        ("publish.rollback_command", &publish.rollback_command),
    ] {
        if command.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(invalid(field, "command cannot be empty").into());
        }
    }

    Ok(())
}
