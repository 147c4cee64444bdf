//! Translation files and the translation step of content loading.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::context::LoadContext;
use crate::error::{HookResult, PluginError, PluginResult};
use crate::guard::HookGuard;
use crate::identifier::{DEFAULT_PLUGIN_ID, PluginIdentifier};
use crate::plugin::{LifecycleHook, Plugin};

/// One translatable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationMessage {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TranslationMessage {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            description: None,
        }
    }
}

/// A plugin translation file: a relative path (without extension) and its
/// messages keyed by message id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationFile {
    pub path: String,
    pub content: BTreeMap<String, TranslationMessage>,
}

impl TranslationFile {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_message(mut self, id: impl Into<String>, message: impl Into<String>) -> Self {
        self.content
            .insert(id.into(), TranslationMessage::new(message));
        self
    }

    /// The message text for `id`, if present.
    #[must_use]
    pub fn message(&self, id: &str) -> Option<&str> {
        self.content.get(id).map(|m| m.message.as_str())
    }
}

/// Turns a plugin's default translation file into its localized version.
///
/// Called once per translation file; calls for distinct files may run
/// concurrently.
#[async_trait]
pub trait TranslationLocalizer: Send + Sync {
    async fn localize(
        &self,
        localization_dir: &Path,
        translation_file: TranslationFile,
        plugin: &dyn Plugin,
    ) -> HookResult<TranslationFile>;
}

/// Localizer backed by JSON files on disk.
///
/// Looks up `{localization_dir}/{plugin dir}/{path}.json` where the plugin
/// dir is the plugin name, suffixed with `-{id}` for non-default instances.
/// Messages present in that file override the defaults; messages missing
/// from it keep their default text. A missing file leaves the translation
/// file unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFileLocalizer;

impl JsonFileLocalizer {
    /// Path of the localized file for `translation_file`.
    #[must_use]
    pub fn localized_path(
        localization_dir: &Path,
        plugin: &PluginIdentifier,
        translation_file: &TranslationFile,
    ) -> PathBuf {
        let plugin_dir = if plugin.id == DEFAULT_PLUGIN_ID {
            plugin.name.clone()
        } else {
            format!("{}-{}", plugin.name, plugin.id)
        };
        localization_dir
            .join(plugin_dir)
            .join(format!("{}.json", translation_file.path))
    }
}

#[async_trait]
impl TranslationLocalizer for JsonFileLocalizer {
    async fn localize(
        &self,
        localization_dir: &Path,
        mut translation_file: TranslationFile,
        plugin: &dyn Plugin,
    ) -> HookResult<TranslationFile> {
        let identifier = PluginIdentifier::new(plugin.name(), plugin.id());
        let path = Self::localized_path(localization_dir, &identifier, &translation_file);

        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No localized translation file");
                return Ok(translation_file);
            },
            Err(e) => return Err(e.into()),
        };

        let localized: BTreeMap<String, TranslationMessage> = serde_json::from_str(&raw)?;
        translation_file.content.extend(localized);
        Ok(translation_file)
    }
}

/// Run the translation step for one plugin and return its translated
/// content.
///
/// The plugin's translation files are localized concurrently and handed to
/// `translateContent` in the order the plugin listed them. If the plugin
/// translates its theme config slice, the slice is merged into the shared
/// theme config before returning.
pub(crate) async fn translate_plugin_content(
    plugin: &dyn Plugin,
    content: Value,
    context: &LoadContext,
    localizer: &dyn TranslationLocalizer,
    guard: HookGuard,
) -> PluginResult<Value> {
    let identifier = PluginIdentifier::new(plugin.name(), plugin.id());

    let raw_translation_files = match plugin.as_get_translation_files() {
        Some(hook) => {
            guard
                .run(
                    &identifier,
                    LifecycleHook::GetTranslationFiles,
                    hook.get_translation_files(&content),
                )
                .await?
        },
        None => Vec::new(),
    };

    let translation_files = try_join_all(raw_translation_files.into_iter().map(|file| {
        let identifier = &identifier;
        async move {
            let path = file.path.clone();
            let localized = guard
                .bounded(localizer.localize(&context.localization_dir, file, plugin))
                .await
                .map_err(|elapsed| PluginError::Localization {
                    identifier: identifier.clone(),
                    path: path.clone(),
                    source: Box::new(elapsed),
                })?;
            localized.map_err(|source| PluginError::Localization {
                identifier: identifier.clone(),
                path,
                source,
            })
        }
    }))
    .await?;

    let translated = match plugin.as_translate_content() {
        Some(hook) => {
            guard
                .run(
                    &identifier,
                    LifecycleHook::TranslateContent,
                    hook.translate_content(content, &translation_files),
                )
                .await?
        },
        None => content,
    };

    if let Some(hook) = plugin.as_translate_theme_config() {
        let theme_config = context.site.theme_config.snapshot();
        let slice = guard
            .run(
                &identifier,
                LifecycleHook::TranslateThemeConfig,
                hook.translate_theme_config(&theme_config, &translation_files),
            )
            .await?;
        if let Some(slice) = slice {
            debug!(
                plugin = %identifier,
                keys = slice.len(),
                "Merging translated theme config slice"
            );
            context.site.theme_config.merge_slice(slice);
        }
    }

    Ok(translated)
}
