//! Plugin trait, lifecycle hooks and loaded plugin state.
//!
//! A plugin is a capability object: every lifecycle hook is optional. The
//! [`Plugin`] trait exposes one accessor per hook returning `Some` only when
//! the plugin implements it, and the pipeline checks for presence before
//! invoking anything.
//!
//! ```rust,ignore
//! struct DocsPlugin;
//!
//! impl Plugin for DocsPlugin {
//!     fn name(&self) -> &str {
//!         "docs"
//!     }
//!
//!     fn as_content_loaded(&self) -> Option<&dyn ContentLoaded> {
//!         Some(self)
//!     }
//! }
//!
//! #[async_trait]
//! impl ContentLoaded for DocsPlugin {
//!     async fn content_loaded(
//!         &self,
//!         _content: &Value,
//!         actions: &mut PluginActions,
//!     ) -> HookResult<()> {
//!         actions.add_route(RouteConfig::new("/docs/intro", "DocPage"));
//!         Ok(())
//!     }
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::actions::PluginActions;
use crate::aggregate::AllContent;
use crate::error::HookResult;
use crate::identifier::{DEFAULT_PLUGIN_ID, Identified};
use crate::route::RouteConfig;
use crate::translations::TranslationFile;

/// The lifecycle hooks a plugin may implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleHook {
    LoadContent,
    GetTranslationFiles,
    TranslateContent,
    TranslateThemeConfig,
    ContentLoaded,
    AllContentLoaded,
}

impl fmt::Display for LifecycleHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LoadContent => "loadContent",
            Self::GetTranslationFiles => "getTranslationFiles",
            Self::TranslateContent => "translateContent",
            Self::TranslateThemeConfig => "translateThemeConfig",
            Self::ContentLoaded => "contentLoaded",
            Self::AllContentLoaded => "allContentLoaded",
        })
    }
}

/// Loads the plugin's raw content.
#[async_trait]
pub trait LoadContent: Send + Sync {
    async fn load_content(&self) -> HookResult<Value>;
}

/// Lists the translation files the plugin's content needs.
#[async_trait]
pub trait GetTranslationFiles: Send + Sync {
    async fn get_translation_files(&self, content: &Value) -> HookResult<Vec<TranslationFile>>;
}

/// Applies localized translation files to the plugin's content.
#[async_trait]
pub trait TranslateContent: Send + Sync {
    async fn translate_content(
        &self,
        content: Value,
        translation_files: &[TranslationFile],
    ) -> HookResult<Value>;
}

/// Translates the plugin's own slice of the theme config.
///
/// The returned map is merged into the shared theme config, replacing
/// top-level keys. A plugin must only return keys it owns.
#[async_trait]
pub trait TranslateThemeConfig: Send + Sync {
    async fn translate_theme_config(
        &self,
        theme_config: &Map<String, Value>,
        translation_files: &[TranslationFile],
    ) -> HookResult<Option<Map<String, Value>>>;
}

/// Reacts to the plugin's own content being loaded, typically by adding
/// routes and global data.
#[async_trait]
pub trait ContentLoaded: Send + Sync {
    async fn content_loaded(&self, content: &Value, actions: &mut PluginActions)
    -> HookResult<()>;
}

/// Reacts to every plugin's content being loaded.
#[async_trait]
pub trait AllContentLoaded: Send + Sync {
    async fn all_content_loaded(
        &self,
        all_content: &AllContent,
        actions: &mut PluginActions,
    ) -> HookResult<()>;
}

/// An initialized plugin instance.
pub trait Plugin: Send + Sync {
    /// The plugin name.
    fn name(&self) -> &str;

    /// The instance id, unique among plugins sharing the same name.
    fn id(&self) -> &str {
        DEFAULT_PLUGIN_ID
    }

    fn as_load_content(&self) -> Option<&dyn LoadContent> {
        None
    }

    fn as_get_translation_files(&self) -> Option<&dyn GetTranslationFiles> {
        None
    }

    fn as_translate_content(&self) -> Option<&dyn TranslateContent> {
        None
    }

    fn as_translate_theme_config(&self) -> Option<&dyn TranslateThemeConfig> {
        None
    }

    fn as_content_loaded(&self) -> Option<&dyn ContentLoaded> {
        None
    }

    fn as_all_content_loaded(&self) -> Option<&dyn AllContentLoaded> {
        None
    }
}

impl Identified for Arc<dyn Plugin> {
    fn name(&self) -> &str {
        Plugin::name(self.as_ref())
    }

    fn id(&self) -> &str {
        Plugin::id(self.as_ref())
    }
}

/// A plugin after content loading: the initialized plugin plus its
/// translated content and the routes and global data it produced in
/// `contentLoaded`.
///
/// Created once per plugin per pipeline run. A reload produces a new
/// `LoadedPlugin` rather than mutating this one.
#[derive(Clone)]
pub struct LoadedPlugin {
    pub plugin: Arc<dyn Plugin>,
    /// `Value::Null` when the plugin has no `loadContent` hook.
    pub content: Arc<Value>,
    pub routes: Vec<RouteConfig>,
    pub global_data: Option<Value>,
}

impl Identified for LoadedPlugin {
    fn name(&self) -> &str {
        Plugin::name(self.plugin.as_ref())
    }

    fn id(&self) -> &str {
        Plugin::id(self.plugin.as_ref())
    }
}

impl fmt::Debug for LoadedPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedPlugin")
            .field("name", &Identified::name(self))
            .field("id", &Identified::id(self))
            .field("content", &self.content)
            .field("routes", &self.routes)
            .field("global_data", &self.global_data)
            .finish()
    }
}
