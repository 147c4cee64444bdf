//! Config file discovery and layered loading.
//!
//! Implements [`load`]:
//! 1. Parse the embedded `defaults.toml` → base
//! 2. Merge `{site}/plinth.toml` (site)
//! 3. Apply `PLINTH_*` environment overrides
//! 4. Deserialize merged tree → [`SiteConfig`]
//! 5. Validate

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::merge::{deep_merge, set_path};
use crate::types::SiteConfig;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Name of the site configuration file inside the site directory.
pub const CONFIG_FILE_NAME: &str = "plinth.toml";

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: usize = 1_048_576;

/// Environment variables that override config fields, with the dotted path
/// they set.
pub const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("PLINTH_BASE_URL", "base_url"),
    ("PLINTH_LOCALE", "i18n.current_locale"),
];

/// Load the site configuration from `site_dir` with the process environment.
///
/// # Errors
///
/// Returns a [`ConfigError`] if `plinth.toml` is unreadable or malformed, an
/// override is empty, or the merged configuration fails validation.
pub fn load(site_dir: &Path) -> ConfigResult<SiteConfig> {
    load_with_env(site_dir, &collect_env_vars())
}

/// Load the site configuration from `site_dir` with explicit environment
/// variables.
///
/// # Errors
///
/// See [`load`].
pub fn load_with_env(
    site_dir: &Path,
    env_vars: &HashMap<String, String>,
) -> ConfigResult<SiteConfig> {
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    let site_path = site_dir.join(CONFIG_FILE_NAME);
    if let Some(overlay) = try_load_file(&site_path)? {
        deep_merge(&mut merged, &overlay);
        info!(path = %site_path.display(), "loaded site config");
    }

    let env_count = apply_env_overrides(&mut merged, env_vars)?;
    if env_count > 0 {
        debug!(count = env_count, "applied environment variable overrides");
    }

    let config: SiteConfig = merged
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::ParseError {
            path: "<merged config>".to_owned(),
            source: e,
        })?;

    validate::validate(&config)?;
    Ok(config)
}

/// Load a config from a specific file on top of the embedded defaults, with
/// no environment overrides.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read or parsed, or the
/// result fails validation.
pub fn load_file(path: &Path) -> ConfigResult<SiteConfig> {
    let overlay = try_load_file(path)?.ok_or_else(|| ConfigError::ReadError {
        path: path.display().to_string(),
        source: std::io::Error::from(std::io::ErrorKind::NotFound),
    })?;

    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;
    deep_merge(&mut merged, &overlay);

    let config: SiteConfig = merged
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::ParseError {
            path: path.display().to_string(),
            source: e,
        })?;
    validate::validate(&config)?;
    Ok(config)
}

/// Collect the `PLINTH_*` variables from the process environment.
fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(key, _)| key.starts_with("PLINTH_"))
        .collect()
}

/// Apply [`ENV_OVERRIDES`] present in `env_vars`. Returns how many were
/// applied.
fn apply_env_overrides(
    merged: &mut toml::Value,
    env_vars: &HashMap<String, String>,
) -> ConfigResult<usize> {
    let mut applied: usize = 0;
    for (var_name, path) in ENV_OVERRIDES {
        let Some(value) = env_vars.get(*var_name) else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            return Err(ConfigError::EnvError {
                var_name: (*var_name).to_owned(),
                message: "value is empty".to_owned(),
            });
        }
        set_path(merged, path, toml::Value::from(value));
        debug!(var = var_name, field = path, "applied environment override");
        applied = applied.saturating_add(1);
    }
    Ok(applied)
}

/// Try to load a file, returning `None` if the file doesn't exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    if content.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit",
                content.len(),
            ),
        });
    }

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_config(dir: &Path, content: &str) {
        std::fs::write(dir.join(CONFIG_FILE_NAME), content).unwrap();
    }

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_defaults_deserialize_to_default_config() {
        let config: SiteConfig = toml::from_str(DEFAULTS_TOML).unwrap();
        assert_eq!(config, SiteConfig::default());
    }

    #[test]
    fn test_load_without_site_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_with_env(dir.path(), &HashMap::new()).unwrap();
        assert_eq!(config, SiteConfig::default());
    }

    #[test]
    fn test_site_file_merges_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            r#"
title = "Docs"
base_url = "/docs/"
trailing_slash = true

[theme_config.navbar]
title = "Docs"

[i18n]
locales = ["en", "fr"]
"#,
        );

        let config = load_with_env(dir.path(), &HashMap::new()).unwrap();
        assert_eq!(config.title, "Docs");
        assert_eq!(config.base_url, "/docs/");
        assert_eq!(config.trailing_slash, Some(true));
        assert_eq!(config.i18n.default_locale, "en");
        assert_eq!(config.i18n.locales, ["en", "fr"]);
        assert_eq!(
            config.theme_config.get("navbar"),
            Some(&json!({"title": "Docs"}))
        );
        assert_eq!(config.logging.format, "compact");
    }

    #[test]
    fn test_env_overrides_site_file() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            "base_url = \"/docs/\"\n[i18n]\nlocales = [\"en\", \"fr\"]\n",
        );

        let config = load_with_env(
            dir.path(),
            &env(&[("PLINTH_BASE_URL", "/v2/"), ("PLINTH_LOCALE", "fr")]),
        )
        .unwrap();
        assert_eq!(config.base_url, "/v2/");
        assert_eq!(config.current_locale(), "fr");
    }

    #[test]
    fn test_env_override_is_validated() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_with_env(dir.path(), &env(&[("PLINTH_LOCALE", "fr")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ValidationError { ref field, .. } if field == "i18n.current_locale"
        ));
    }

    #[test]
    fn test_empty_env_override_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_with_env(dir.path(), &env(&[("PLINTH_BASE_URL", "  ")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::EnvError { ref var_name, .. } if var_name == "PLINTH_BASE_URL"
        ));
    }

    #[test]
    fn test_malformed_site_file() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), "title = ");
        let err = load_with_env(dir.path(), &HashMap::new()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_wrong_type_reports_merged_config() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), "[i18n]\nlocales = \"en\"\n");
        let err = load_with_env(dir.path(), &HashMap::new()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ParseError { ref path, .. } if path == "<merged config>"
        ));
    }

    #[test]
    fn test_load_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn test_load_file_ignores_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "title = \"Custom\"\n[plugins]\nhook_timeout_secs = 5\n").unwrap();
        let config = load_file(&path).unwrap();
        assert_eq!(config.title, "Custom");
        assert_eq!(config.plugins.hook_timeout_secs, Some(5));
    }
}
