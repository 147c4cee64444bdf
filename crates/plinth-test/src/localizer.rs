//! A translation localizer that records every call.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use plinth_plugins::{
    HookResult, Plugin, PluginIdentifier, TranslationFile, TranslationLocalizer,
};

/// One recorded `localize` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizeCall {
    /// The plugin the file belongs to.
    pub plugin: PluginIdentifier,
    /// The translation file path.
    pub path: String,
    /// The localization dir the call was made with.
    pub localization_dir: PathBuf,
}

/// In-memory [`TranslationLocalizer`] that records its calls.
///
/// Localized messages are configured per `(plugin name, file path)` and
/// override the defaults key by key. Files without configured messages are
/// returned unchanged. A per-file delay makes calls resolve out of order.
#[derive(Debug, Default)]
pub struct RecordingLocalizer {
    messages: BTreeMap<(String, String), BTreeMap<String, String>>,
    failing: HashSet<String>,
    delays: BTreeMap<String, Duration>,
    calls: Mutex<Vec<LocalizeCall>>,
    completed: Mutex<Vec<String>>,
}

impl RecordingLocalizer {
    /// Create a localizer with no localized messages.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Localize message `id` of `plugin`'s file `path` to `text`.
    #[must_use]
    pub fn with_message(
        mut self,
        plugin: impl Into<String>,
        path: impl Into<String>,
        id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        self.messages
            .entry((plugin.into(), path.into()))
            .or_default()
            .insert(id.into(), text.into());
        self
    }

    /// Fail every call for file `path`.
    #[must_use]
    pub fn failing_on(mut self, path: impl Into<String>) -> Self {
        self.failing.insert(path.into());
        self
    }

    /// Delay every call for file `path` by `delay` before it resolves.
    #[must_use]
    pub fn with_delay(mut self, path: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(path.into(), delay);
        self
    }

    /// Paths of the calls that resolved so far, in completion order.
    #[must_use]
    pub fn completed(&self) -> Vec<String> {
        self.completed
            .lock()
            .map(|completed| completed.clone())
            .unwrap_or_default()
    }

    /// Every call made so far, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<LocalizeCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Number of calls made so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }
}

#[async_trait]
impl TranslationLocalizer for RecordingLocalizer {
    async fn localize(
        &self,
        localization_dir: &Path,
        mut translation_file: TranslationFile,
        plugin: &dyn Plugin,
    ) -> HookResult<TranslationFile> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(LocalizeCall {
                plugin: PluginIdentifier::new(plugin.name(), plugin.id()),
                path: translation_file.path.clone(),
                localization_dir: localization_dir.to_path_buf(),
            });
        }

        if let Some(delay) = self.delays.get(&translation_file.path) {
            tokio::time::sleep(*delay).await;
        }
        if let Ok(mut completed) = self.completed.lock() {
            completed.push(translation_file.path.clone());
        }

        if self.failing.contains(&translation_file.path) {
            return Err(format!("no translations for {}", translation_file.path).into());
        }

        let key = (plugin.name().to_owned(), translation_file.path.clone());
        if let Some(messages) = self.messages.get(&key) {
            for (id, text) in messages {
                if let Some(message) = translation_file.content.get_mut(id) {
                    message.message.clone_from(text);
                }
            }
        }
        Ok(translation_file)
    }
}
