//! Configuration validation utilities.

use std::collections::HashSet;

use super::error::{ConfigError, ConfigResult};
use super::schema::{DispatchConfig, HeraldConfig, LogOutput, LoggingConfig, RuntimeConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &HeraldConfig) -> ConfigResult<()> {
    validate_dispatch_config(&config.dispatch)?;
    validate_logging_config(&config.logging)?;
    validate_runtime_config(&config.runtime)?;
    Ok(())
}

fn validate_dispatch_config(dispatch: &DispatchConfig) -> ConfigResult<()> {
    if dispatch.prefix.is_empty() {
        return Err(ConfigError::validation("Prefix must not be empty"));
    }

    // Tokens are split on whitespace, so such a prefix could never match.
    if dispatch.prefix.chars().any(char::is_whitespace) {
        return Err(ConfigError::validation(format!(
            "Prefix must not contain whitespace: {:?}",
            dispatch.prefix
        )));
    }

    let mut seen = HashSet::new();
    for owner in &dispatch.owners {
        if owner.trim().is_empty() {
            return Err(ConfigError::validation("Owner ids must not be empty"));
        }
        if !seen.insert(owner) {
            return Err(ConfigError::validation(format!(
                "Duplicate owner id: {owner}"
            )));
        }
    }

    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    if logging.filters.keys().any(|target| target.trim().is_empty()) {
        return Err(ConfigError::validation("Log filter targets must not be empty"));
    }

    Ok(())
}

fn validate_runtime_config(runtime: &RuntimeConfig) -> ConfigResult<()> {
    if !runtime.unbounded_error_channel && runtime.error_channel_capacity == 0 {
        return Err(ConfigError::validation(
            "Error channel capacity must be greater than 0",
        ));
    }

    Ok(())
}
