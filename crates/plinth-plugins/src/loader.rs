//! Plugin initialization: turning configuration into initialized plugins.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::LoadContext;
use crate::error::PluginResult;
use crate::plugin::Plugin;

/// Produces the initialized user plugins for a site.
///
/// Implementations must return plugins with unique `(name, id)` pairs.
#[async_trait]
pub trait PluginInitializer: Send + Sync {
    /// Initialize the site's plugins in their configured order.
    ///
    /// # Errors
    /// Returns a `PluginError` if a plugin cannot be instantiated.
    async fn init_plugins(&self, context: &LoadContext) -> PluginResult<Vec<Arc<dyn Plugin>>>;
}

/// Initializer returning a fixed list of already-constructed plugins.
#[derive(Clone, Default)]
pub struct StaticPluginInitializer {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl StaticPluginInitializer {
    #[must_use]
    pub fn new(plugins: Vec<Arc<dyn Plugin>>) -> Self {
        Self { plugins }
    }

    /// Append a plugin.
    #[must_use]
    pub fn with_plugin(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }
}

#[async_trait]
impl PluginInitializer for StaticPluginInitializer {
    async fn init_plugins(&self, _context: &LoadContext) -> PluginResult<Vec<Arc<dyn Plugin>>> {
        Ok(self.plugins.clone())
    }
}

impl std::fmt::Debug for StaticPluginInitializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self
            .plugins
            .iter()
            .map(|p| format!("{}@{}", p.name(), p.id()))
            .collect();
        f.debug_struct("StaticPluginInitializer")
            .field("plugins", &names)
            .finish()
    }
}
