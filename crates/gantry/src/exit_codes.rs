//! Exit codes for the CLI

use gantry_core::{ConfigError, GantryError, PublishError};

/// Success
pub const SUCCESS: i32 = 0;

/// General error
pub const ERROR: i32 = 1;

/// Configuration error
pub const CONFIG_ERROR: i32 = 2;

/// Validation error: conflicts, incompatible ranges or a bad order
pub const VALIDATION_ERROR: i32 = 5;

/// A publishing stage failed
pub const PUBLISH_HALTED: i32 = 6;

/// A command finished but must report a specific exit code
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct CommandFailure {
    /// Exit code to report
    pub code: i32,
    /// Message printed to stderr
    pub message: String,
}

impl CommandFailure {
    /// Validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            code: VALIDATION_ERROR,
            message: message.into(),
        }
    }
}

/// Map an error returned by a command to an exit code
pub fn for_error(error: &anyhow::Error) -> i32 {
    if let Some(failure) = error.downcast_ref::<CommandFailure>() {
        return failure.code;
    }
    if error.downcast_ref::<ConfigError>().is_some() {
        return CONFIG_ERROR;
    }

    match error.downcast_ref::<GantryError>() {
        Some(GantryError::Config(_)) => CONFIG_ERROR,
        Some(GantryError::Publish(PublishError::Halted { .. })) => PUBLISH_HALTED,
        _ => ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_mapping() {
        let validation = anyhow::Error::from(CommandFailure::validation("2 conflicts"));
        assert_eq!(for_error(&validation), VALIDATION_ERROR);

        let config = anyhow::Error::from(GantryError::from(ConfigError::ParseError(
            "bad".to_string(),
        )));
        assert_eq!(for_error(&config), CONFIG_ERROR);

        let halted = anyhow::Error::from(GantryError::from(PublishError::Halted {
            stage: 1,
            failed: 2,
        }));
        assert_eq!(for_error(&halted), PUBLISH_HALTED);

        assert_eq!(for_error(&anyhow::anyhow!("boom")), ERROR);
    }
}
