//! Load context shared by every plugin during a pipeline run.

use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use plinth_config::SiteConfig;
use serde_json::{Map, Value};

/// The site's theme configuration.
///
/// This is the one piece of state plugins mutate concurrently: each plugin's
/// translation step merges its translated slice back in place. Every plugin
/// must own a disjoint set of top-level keys. Two plugins writing the same
/// key race and the last write wins.
#[derive(Debug, Default)]
pub struct ThemeConfig {
    inner: RwLock<Map<String, Value>>,
}

impl ThemeConfig {
    #[must_use]
    pub fn new(config: Map<String, Value>) -> Self {
        Self {
            inner: RwLock::new(config),
        }
    }

    /// A copy of the current theme config.
    #[must_use]
    pub fn snapshot(&self) -> Map<String, Value> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Read a single top-level key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Shallow-merge `slice` into the theme config: every top-level key of
    /// the slice replaces the existing value.
    pub fn merge_slice(&self, slice: Map<String, Value>) {
        let mut config = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in slice {
            config.insert(key, value);
        }
    }
}

/// Site-level settings plugins can read during loading.
#[derive(Debug)]
pub struct SiteSettings {
    pub title: String,
    pub url: String,
    pub base_url: String,
    /// `Some(true)` forces a trailing slash on route paths, `Some(false)`
    /// strips it, `None` leaves paths untouched.
    pub trailing_slash: Option<bool>,
    pub theme_config: ThemeConfig,
}

/// Context provided to every plugin during one pipeline run (or one reload).
#[derive(Debug)]
pub struct LoadContext {
    pub site_dir: PathBuf,
    pub site: SiteSettings,
    /// Directory holding the current locale's translation files.
    pub localization_dir: PathBuf,
    /// Directory plugins write generated data into.
    pub generated_files_dir: PathBuf,
    pub current_locale: String,
}

impl LoadContext {
    /// Build a load context from a validated site configuration.
    #[must_use]
    pub fn from_config(site_dir: impl Into<PathBuf>, config: &SiteConfig) -> Self {
        let site_dir = site_dir.into();
        Self {
            localization_dir: config.localization_dir(&site_dir),
            generated_files_dir: config.generated_files_dir(&site_dir),
            current_locale: config.current_locale().to_owned(),
            site: SiteSettings {
                title: config.title.clone(),
                url: config.url.clone(),
                base_url: config.base_url.clone(),
                trailing_slash: config.trailing_slash,
                theme_config: ThemeConfig::new(config.theme_config.clone()),
            },
            site_dir,
        }
    }

    /// A copy of this context whose theme config starts over from `theme_config`.
    #[must_use]
    pub fn with_theme_config(&self, theme_config: Map<String, Value>) -> Self {
        Self {
            site_dir: self.site_dir.clone(),
            site: SiteSettings {
                title: self.site.title.clone(),
                url: self.site.url.clone(),
                base_url: self.site.base_url.clone(),
                trailing_slash: self.site.trailing_slash,
                theme_config: ThemeConfig::new(theme_config),
            },
            localization_dir: self.localization_dir.clone(),
            generated_files_dir: self.generated_files_dir.clone(),
            current_locale: self.current_locale.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_merge_slice_is_shallow() {
        let theme = ThemeConfig::new(object(json!({
            "navbar": {"title": "Site", "items": []},
            "footer": {"copyright": "me"},
        })));

        theme.merge_slice(object(json!({"navbar": {"title": "Sitio"}})));

        assert_eq!(theme.get("navbar"), Some(json!({"title": "Sitio"})));
        assert_eq!(theme.get("footer"), Some(json!({"copyright": "me"})));
    }

    #[test]
    fn test_from_config_paths() {
        let config = SiteConfig::default();
        let ctx = LoadContext::from_config("/srv/site", &config);
        assert_eq!(ctx.site.base_url, "/");
        assert_eq!(ctx.current_locale, "en");
        assert_eq!(ctx.localization_dir, PathBuf::from("/srv/site/i18n/en"));
        assert_eq!(ctx.generated_files_dir, PathBuf::from("/srv/site/.plinth"));
    }

    #[test]
    fn test_with_theme_config_drops_merged_slices() {
        let mut config = SiteConfig::default();
        config.theme_config = object(json!({"navbar": {"title": "Site"}}));
        let ctx = LoadContext::from_config("/srv/site", &config);
        ctx.site.theme_config.merge_slice(object(json!({"navbar": {"title": "Sitio"}})));

        let fresh = ctx.with_theme_config(config.theme_config.clone());
        assert_eq!(fresh.site.theme_config.get("navbar"), Some(json!({"title": "Site"})));
        assert_eq!(fresh.localization_dir, ctx.localization_dir);
        assert_eq!(fresh.site.base_url, "/");
    }
}
