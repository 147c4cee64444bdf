//! Test fixtures: site configuration, load contexts and pipelines.

use std::path::Path;
use std::sync::Arc;

use plinth_config::SiteConfig;
use plinth_plugins::{
    LoadContext, Plugin, PluginPipeline, StaticPluginInitializer, TranslationLocalizer,
};
use serde_json::Value;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

/// Create a site config with the defaults plus a title and theme config
/// suitable for tests.
#[must_use]
pub fn test_site_config() -> SiteConfig {
    SiteConfig {
        title: "Test Site".to_owned(),
        url: "https://test.example".to_owned(),
        ..SiteConfig::default()
    }
}

/// Install a test-writer subscriber so pipeline logs show up in failing
/// tests. Safe to call from every test.
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// A throwaway site directory with its configuration.
///
/// The directory is deleted when the `TestSite` is dropped.
#[derive(Debug)]
pub struct TestSite {
    dir: TempDir,
    config: SiteConfig,
}

impl Default for TestSite {
    fn default() -> Self {
        Self::new()
    }
}

impl TestSite {
    /// Create a site with [`test_site_config`].
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(test_site_config())
    }

    /// Create a site with a specific configuration.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn with_config(config: SiteConfig) -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create test site dir"),
            config,
        }
    }

    /// The site directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The site configuration.
    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// A fresh load context for this site. Each call gets its own theme
    /// config, starting from the site configuration.
    #[must_use]
    pub fn context(&self) -> LoadContext {
        LoadContext::from_config(self.path(), &self.config)
    }

    /// Write a localized translation file for `plugin_dir` (the plugin
    /// name, or `name-id` for non-default instances) in the current locale.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write_translation(&self, plugin_dir: &str, path: &str, messages: &Value) {
        let dir = self.config.localization_dir(self.path()).join(plugin_dir);
        std::fs::create_dir_all(&dir).expect("failed to create translation dir");
        std::fs::write(
            dir.join(format!("{path}.json")),
            serde_json::to_vec_pretty(messages).expect("failed to serialize translation"),
        )
        .expect("failed to write translation file");
    }

    /// A pipeline initializing exactly `plugins`, with the site's hook
    /// timeout and the default JSON file localizer.
    #[must_use]
    pub fn pipeline(&self, plugins: Vec<Arc<dyn Plugin>>) -> PluginPipeline {
        PluginPipeline::new(Arc::new(StaticPluginInitializer::new(plugins)))
            .with_hook_timeout(self.config.hook_timeout())
    }

    /// Like [`pipeline`](Self::pipeline) with a custom localizer.
    #[must_use]
    pub fn pipeline_with_localizer(
        &self,
        plugins: Vec<Arc<dyn Plugin>>,
        localizer: Arc<dyn TranslationLocalizer>,
    ) -> PluginPipeline {
        self.pipeline(plugins).with_localizer(localizer)
    }
}
