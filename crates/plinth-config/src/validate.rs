//! Post-merge configuration validation.

use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::types::SiteConfig;

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &SiteConfig) -> ConfigResult<()> {
    validate_base_url(&config.base_url)?;
    validate_i18n(config)?;
    validate_paths(config)?;
    validate_plugins(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn validate_base_url(base_url: &str) -> ConfigResult<()> {
    if !base_url.starts_with('/') || !base_url.ends_with('/') {
        return Err(invalid(
            "base_url",
            format!("'{base_url}' must start and end with '/'"),
        ));
    }
    Ok(())
}

fn validate_i18n(config: &SiteConfig) -> ConfigResult<()> {
    let i18n = &config.i18n;
    if i18n.locales.is_empty() {
        return Err(invalid("i18n.locales", "at least one locale is required"));
    }
    if !i18n.locales.contains(&i18n.default_locale) {
        return Err(invalid(
            "i18n.default_locale",
            format!("'{}' is not one of {:?}", i18n.default_locale, i18n.locales),
        ));
    }
    let current = config.current_locale();
    if !i18n.locales.iter().any(|l| l == current) {
        return Err(invalid(
            "i18n.current_locale",
            format!("'{current}' is not one of {:?}", i18n.locales),
        ));
    }
    Ok(())
}

fn validate_relative_dir(field: &str, dir: &Path) -> ConfigResult<()> {
    if dir.as_os_str().is_empty() {
        return Err(invalid(field, "must not be empty"));
    }
    if dir.is_absolute() {
        return Err(invalid(
            field,
            format!("'{}' must be relative to the site directory", dir.display()),
        ));
    }
    Ok(())
}

fn validate_paths(config: &SiteConfig) -> ConfigResult<()> {
    validate_relative_dir("paths.generated_files_dir", &config.paths.generated_files_dir)?;
    validate_relative_dir("paths.i18n_dir", &config.paths.i18n_dir)
}

fn validate_plugins(config: &SiteConfig) -> ConfigResult<()> {
    if config.plugins.hook_timeout_secs == Some(0) {
        return Err(invalid(
            "plugins.hook_timeout_secs",
            "must be greater than zero; omit it to disable the timeout",
        ));
    }
    Ok(())
}

fn validate_logging(config: &SiteConfig) -> ConfigResult<()> {
    let format = config.logging.format.as_str();
    if !matches!(format, "pretty" | "compact" | "json" | "full") {
        return Err(invalid(
            "logging.format",
            format!("unsupported format '{format}'; expected one of: pretty, compact, json, full"),
        ));
    }
    Ok(())
}
