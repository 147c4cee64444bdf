//! Built-in plugins appended to every full load.

use std::sync::Arc;

use crate::context::LoadContext;
use crate::plugin::Plugin;

/// Name of the bootstrap plugin.
pub const BOOTSTRAP_PLUGIN_NAME: &str = "plinth-bootstrap-plugin";

/// Name of the MDX fallback plugin.
pub const MDX_FALLBACK_PLUGIN_NAME: &str = "plinth-mdx-fallback-plugin";

/// Supplies the two synthetic plugins every full load appends after the
/// user plugins. Never consulted during a single-plugin reload.
pub trait SyntheticPlugins: Send + Sync {
    fn bootstrap(&self, context: &LoadContext) -> Arc<dyn Plugin>;

    fn mdx_fallback(&self, context: &LoadContext) -> Arc<dyn Plugin>;
}

/// The default synthetic plugins. Neither implements a content hook.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSyntheticPlugins;

impl SyntheticPlugins for DefaultSyntheticPlugins {
    fn bootstrap(&self, _context: &LoadContext) -> Arc<dyn Plugin> {
        Arc::new(BootstrapPlugin)
    }

    fn mdx_fallback(&self, _context: &LoadContext) -> Arc<dyn Plugin> {
        Arc::new(MdxFallbackPlugin)
    }
}

#[derive(Debug)]
struct BootstrapPlugin;

impl Plugin for BootstrapPlugin {
    fn name(&self) -> &str {
        BOOTSTRAP_PLUGIN_NAME
    }
}

/// Handles MDX files under the site dir that no content plugin claimed.
#[derive(Debug)]
struct MdxFallbackPlugin;

impl Plugin for MdxFallbackPlugin {
    fn name(&self) -> &str {
        MDX_FALLBACK_PLUGIN_NAME
    }
}
