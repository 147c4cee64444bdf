//! Plinth Plugins - plugin lifecycle orchestration for the Plinth static
//! site generator.
//!
//! This crate provides:
//! - The [`Plugin`] trait and its optional lifecycle hooks
//! - The two-phase load pipeline ([`PluginPipeline`]) with translation,
//!   route and global data merging
//! - Single-plugin reloads and a debounced [`ReloadCoordinator`] for the
//!   dev server
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use plinth_config::SiteConfig;
//! use plinth_plugins::{LoadContext, PluginPipeline, StaticPluginInitializer};
//!
//! # async fn run() -> plinth_plugins::PluginResult<()> {
//! let config = SiteConfig::default();
//! let context = LoadContext::from_config("/srv/site", &config);
//!
//! let pipeline = PluginPipeline::new(Arc::new(StaticPluginInitializer::default()));
//! let result = pipeline.load_plugins(&context).await?;
//! tracing::info!(routes = result.routes.len(), "Site loaded");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod actions;
pub mod aggregate;
pub mod context;
pub mod error;
pub mod identifier;
pub mod loader;
pub mod pipeline;
pub mod plugin;
pub mod reload;
pub mod route;
pub mod synthetic;
pub mod translations;

mod guard;
mod perf;

pub use actions::PluginActions;
pub use aggregate::{AllContent, GlobalData};
pub use context::{LoadContext, SiteSettings, ThemeConfig};
pub use error::{BoxError, HookResult, PluginError, PluginResult};
pub use identifier::{DEFAULT_PLUGIN_ID, Identified, PluginIdentifier};
pub use loader::{PluginInitializer, StaticPluginInitializer};
pub use pipeline::{AllContentLoadedResult, LoadPluginsResult, PluginContribution, PluginPipeline};
pub use plugin::{
    AllContentLoaded, ContentLoaded, GetTranslationFiles, LifecycleHook, LoadContent,
    LoadedPlugin, Plugin, TranslateContent, TranslateThemeConfig,
};
pub use reload::{ReloadCoordinator, ReloadOutcome, ReloadRequest};
pub use route::RouteConfig;
pub use synthetic::{DefaultSyntheticPlugins, SyntheticPlugins};
pub use translations::{
    JsonFileLocalizer, TranslationFile, TranslationLocalizer, TranslationMessage,
};
