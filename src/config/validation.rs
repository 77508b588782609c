use crate::config::types::{BrowserConfig, Config, CrawlerConfig, DetectionConfig, OutputConfig};
use crate::ConfigError;

/// Upper bound on pool width; anything wider is a flood, not a crawl
const MAX_WORKERS: u32 = 32;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    validate_detection_config(&config.detection)?;
    validate_browser_config(&config.browser)?;

    if config.input.url_list.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "url_list cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_workers < 1 || config.max_workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "max_workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.max_workers
        )));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.navigation_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "navigation_timeout_ms must be > 0".to_string(),
        ));
    }

    if config.max_wait_ms < config.min_wait_ms {
        return Err(ConfigError::Validation(format!(
            "max_wait_ms ({}ms) must be >= min_wait_ms ({}ms)",
            config.max_wait_ms, config.min_wait_ms
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.save_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "save_dir cannot be empty".to_string(),
        ));
    }

    if config.completed_ledger.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "completed_ledger cannot be empty".to_string(),
        ));
    }

    if config.log_file.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "log_file cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the block detector settings
fn validate_detection_config(config: &DetectionConfig) -> Result<(), ConfigError> {
    validate_tag_name(&config.marker_tag)?;

    if config.block_keywords.iter().any(|k| k.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "block_keywords cannot contain empty entries".to_string(),
        ));
    }

    Ok(())
}

fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if let Some(ua) = &config.user_agent {
        if ua.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user_agent cannot be blank when set".to_string(),
            ));
        }
    }

    Ok(())
}

/// The marker is queried as a bare tag selector, so only tag-name characters are allowed
fn validate_tag_name(tag: &str) -> Result<(), ConfigError> {
    if tag.is_empty() {
        return Err(ConfigError::InvalidTag("marker_tag cannot be empty".to_string()));
    }

    let mut chars = tag.chars();
    let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    if !starts_alpha || !chars.all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ConfigError::InvalidTag(format!(
            "'{}' is not a valid HTML tag name",
            tag
        )));
    }

    Ok(())
}
