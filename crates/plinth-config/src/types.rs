//! Configuration types for a Plinth site.
//!
//! Every struct implements [`Default`] with the same values as the embedded
//! `defaults.toml`, so a bare `[section]` header in `plinth.toml` produces a
//! working configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Top-level SiteConfig
// ---------------------------------------------------------------------------

/// Root configuration of a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site title.
    pub title: String,
    /// Public URL the site is deployed to, without the base URL.
    pub url: String,
    /// Path the site is served under. Starts and ends with `/`.
    pub base_url: String,
    /// Trailing-slash policy for route paths. Unset leaves paths untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailing_slash: Option<bool>,
    /// Free-form theme configuration, shared with and extended by plugins.
    pub theme_config: Map<String, Value>,
    /// Locales.
    pub i18n: I18nSection,
    /// Site-relative directories.
    pub paths: PathsSection,
    /// Plugin pipeline settings.
    pub plugins: PluginsSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "My Site".to_owned(),
            url: "http://localhost".to_owned(),
            base_url: "/".to_owned(),
            trailing_slash: None,
            theme_config: Map::new(),
            i18n: I18nSection::default(),
            paths: PathsSection::default(),
            plugins: PluginsSection::default(),
            logging: LoggingSection::default(),
        }
    }
}

impl SiteConfig {
    /// Locale being built. Falls back to the default locale when unset.
    #[must_use]
    pub fn current_locale(&self) -> &str {
        self.i18n
            .current_locale
            .as_deref()
            .unwrap_or(&self.i18n.default_locale)
    }

    /// `{site_dir}/{i18n_dir}/{current_locale}`: where the current locale's
    /// translation files live.
    #[must_use]
    pub fn localization_dir(&self, site_dir: &Path) -> PathBuf {
        site_dir
            .join(&self.paths.i18n_dir)
            .join(self.current_locale())
    }

    /// `{site_dir}/{generated_files_dir}`: where plugins write generated data.
    #[must_use]
    pub fn generated_files_dir(&self, site_dir: &Path) -> PathBuf {
        site_dir.join(&self.paths.generated_files_dir)
    }

    /// Per-hook timeout, if one is configured.
    #[must_use]
    pub fn hook_timeout(&self) -> Option<Duration> {
        self.plugins.hook_timeout_secs.map(Duration::from_secs)
    }
}

// ---------------------------------------------------------------------------
// I18nSection
// ---------------------------------------------------------------------------

/// Locale configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct I18nSection {
    /// Locale used when no current locale is set.
    pub default_locale: String,
    /// Every locale the site is built in.
    pub locales: Vec<String>,
    /// Locale of the current build. `None` builds the default locale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_locale: Option<String>,
}

impl Default for I18nSection {
    fn default() -> Self {
        Self {
            default_locale: "en".to_owned(),
            locales: vec!["en".to_owned()],
            current_locale: None,
        }
    }
}

// ---------------------------------------------------------------------------
// PathsSection
// ---------------------------------------------------------------------------

/// Directories relative to the site directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    /// Where plugins write generated data.
    pub generated_files_dir: PathBuf,
    /// Root of the per-locale translation directories.
    pub i18n_dir: PathBuf,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            generated_files_dir: PathBuf::from(".plinth"),
            i18n_dir: PathBuf::from("i18n"),
        }
    }
}

// ---------------------------------------------------------------------------
// PluginsSection
// ---------------------------------------------------------------------------

/// Plugin pipeline settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginsSection {
    /// Upper bound on every hook invocation, in seconds. Unset means hooks
    /// may run indefinitely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_timeout_secs: Option<u64>,
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"` or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["plinth_plugins=debug"]`).
    pub directives: Vec<String>,
    /// Log when every timed pipeline section opens and closes.
    pub span_events: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
            span_events: false,
        }
    }
}
