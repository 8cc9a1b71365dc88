use crate::config::types::{Config, LimitsConfig, OutputConfig, SessionConfig, TargetEntry};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_session_config(&config.session)?;
    validate_limits_config(&config.limits)?;
    validate_output_config(&config.output)?;
    validate_targets(&config.targets)?;
    Ok(())
}

/// Validates session timing configuration
fn validate_session_config(config: &SessionConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            config.base_url
        )));
    }

    if config.wait_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "wait-timeout-ms must be >= 100ms, got {}ms",
            config.wait_timeout_ms
        )));
    }

    Ok(())
}

/// Validates traversal and extraction limits
fn validate_limits_config(config: &LimitsConfig) -> Result<(), ConfigError> {
    if config.chunk_size < 1 {
        return Err(ConfigError::Validation(format!(
            "chunk-size must be >= 1, got {}",
            config.chunk_size
        )));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.max_scroll_depth == Some(0) {
        return Err(ConfigError::Validation(
            "max-scroll-depth must be >= 1 when set".to_string(),
        ));
    }

    if config.max_comment_expansions < 1 {
        return Err(ConfigError::Validation(format!(
            "max-comment-expansions must be >= 1, got {}",
            config.max_comment_expansions
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (key, value) in [
        ("database-path", &config.database_path),
        ("summary-path", &config.summary_path),
        ("images-folder", &config.images_folder),
        ("thumbnails-folder", &config.thumbnails_folder),
    ] {
        if value.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", key)));
        }
    }

    Ok(())
}

/// Validates the target list
fn validate_targets(targets: &[TargetEntry]) -> Result<(), ConfigError> {
    if targets.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[target]] is required".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for target in targets {
        if target.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "target name cannot be empty".to_string(),
            ));
        }

        if !names.insert(target.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate target name '{}'",
                target.name
            )));
        }

        validate_target_id(&target.id)?;
    }

    Ok(())
}

/// Target ids end up in a URL path, so only path-safe characters are accepted
fn validate_target_id(id: &str) -> Result<(), ConfigError> {
    if id.is_empty() {
        return Err(ConfigError::Validation(
            "target id cannot be empty".to_string(),
        ));
    }

    if !id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(ConfigError::Validation(format!(
            "target id '{}' contains invalid characters",
            id
        )));
    }

    Ok(())
}
