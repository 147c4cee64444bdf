//! A plugin whose hooks are scripted with closures.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use plinth_plugins::{
    AllContent, AllContentLoaded, ContentLoaded, DEFAULT_PLUGIN_ID, GetTranslationFiles,
    HookResult, LifecycleHook, LoadContent, Plugin, PluginActions, TranslateContent,
    TranslateThemeConfig, TranslationFile,
};
use serde_json::{Map, Value};

type LoadContentFn = dyn Fn() -> HookResult<Value> + Send + Sync;
type TranslationFilesFn = dyn Fn(&Value) -> HookResult<Vec<TranslationFile>> + Send + Sync;
type TranslateContentFn = dyn Fn(Value, &[TranslationFile]) -> HookResult<Value> + Send + Sync;
type ThemeConfigSlice = Option<Map<String, Value>>;
type TranslateThemeConfigFn =
    dyn Fn(&Map<String, Value>, &[TranslationFile]) -> HookResult<ThemeConfigSlice> + Send + Sync;
type ContentLoadedFn = dyn Fn(&Value, &mut PluginActions) -> HookResult<()> + Send + Sync;
type AllContentLoadedFn = dyn Fn(&AllContent, &mut PluginActions) -> HookResult<()> + Send + Sync;

/// How `loadContent` produces content.
enum ContentSource {
    Fixed(Mutex<Value>),
    Script(Box<LoadContentFn>),
}

/// Plugin whose hooks are closures, recording every hook invocation.
///
/// A hook is implemented only if it was scripted. Keep an `Arc` to the
/// plugin to inspect its calls after handing a clone to a pipeline.
pub struct ScriptedPlugin {
    name: String,
    id: String,
    content: Option<ContentSource>,
    translation_files: Option<Box<TranslationFilesFn>>,
    translate_content: Option<Box<TranslateContentFn>>,
    translate_theme_config: Option<Box<TranslateThemeConfigFn>>,
    content_loaded: Option<Box<ContentLoadedFn>>,
    all_content_loaded: Option<Box<AllContentLoadedFn>>,
    delay: Option<Duration>,
    calls: Mutex<Vec<LifecycleHook>>,
}

impl ScriptedPlugin {
    /// Create a plugin with the default id and no hooks.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: DEFAULT_PLUGIN_ID.to_owned(),
            content: None,
            translation_files: None,
            translate_content: None,
            translate_theme_config: None,
            content_loaded: None,
            all_content_loaded: None,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Set the instance id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Implement `loadContent` by returning `content`. Change it later with
    /// [`set_content`](Self::set_content).
    #[must_use]
    pub fn with_content(mut self, content: Value) -> Self {
        self.content = Some(ContentSource::Fixed(Mutex::new(content)));
        self
    }

    /// Implement `loadContent` with a closure.
    #[must_use]
    pub fn with_load_content<F>(mut self, f: F) -> Self
    where
        F: Fn() -> HookResult<Value> + Send + Sync + 'static,
    {
        self.content = Some(ContentSource::Script(Box::new(f)));
        self
    }

    /// Implement `getTranslationFiles` by always returning `files`.
    #[must_use]
    pub fn with_translation_files(mut self, files: Vec<TranslationFile>) -> Self {
        self.translation_files = Some(Box::new(move |_| Ok(files.clone())));
        self
    }

    /// Implement `getTranslationFiles` with a closure.
    #[must_use]
    pub fn with_get_translation_files<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> HookResult<Vec<TranslationFile>> + Send + Sync + 'static,
    {
        self.translation_files = Some(Box::new(f));
        self
    }

    /// Implement `translateContent`.
    #[must_use]
    pub fn with_translate_content<F>(mut self, f: F) -> Self
    where
        F: Fn(Value, &[TranslationFile]) -> HookResult<Value> + Send + Sync + 'static,
    {
        self.translate_content = Some(Box::new(f));
        self
    }

    /// Implement `translateThemeConfig`.
    #[must_use]
    pub fn with_translate_theme_config<F>(mut self, f: F) -> Self
    where
        F: Fn(&Map<String, Value>, &[TranslationFile]) -> HookResult<Option<Map<String, Value>>>
            + Send
            + Sync
            + 'static,
    {
        self.translate_theme_config = Some(Box::new(f));
        self
    }

    /// Implement `contentLoaded`.
    #[must_use]
    pub fn with_content_loaded<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &mut PluginActions) -> HookResult<()> + Send + Sync + 'static,
    {
        self.content_loaded = Some(Box::new(f));
        self
    }

    /// Implement `allContentLoaded`.
    #[must_use]
    pub fn with_all_content_loaded<F>(mut self, f: F) -> Self
    where
        F: Fn(&AllContent, &mut PluginActions) -> HookResult<()> + Send + Sync + 'static,
    {
        self.all_content_loaded = Some(Box::new(f));
        self
    }

    /// Sleep for `delay` at the start of every hook.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Replace the content returned by a fixed `loadContent`. Has no effect
    /// on a scripted `loadContent`.
    pub fn set_content(&self, content: Value) {
        if let Some(ContentSource::Fixed(fixed)) = &self.content
            && let Ok(mut current) = fixed.lock()
        {
            *current = content;
        }
    }

    /// Every hook invocation so far, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<LifecycleHook> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// How many times `hook` was invoked.
    #[must_use]
    pub fn call_count(&self, hook: LifecycleHook) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.iter().filter(|h| **h == hook).count())
            .unwrap_or(0)
    }

    async fn enter(&self, hook: LifecycleHook) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(hook);
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl std::fmt::Debug for ScriptedPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedPlugin")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("calls", &self.calls())
            .finish_non_exhaustive()
    }
}

impl Plugin for ScriptedPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn as_load_content(&self) -> Option<&dyn LoadContent> {
        self.content.as_ref().map(|_| self as &dyn LoadContent)
    }

    fn as_get_translation_files(&self) -> Option<&dyn GetTranslationFiles> {
        self.translation_files
            .as_ref()
            .map(|_| self as &dyn GetTranslationFiles)
    }

    fn as_translate_content(&self) -> Option<&dyn TranslateContent> {
        self.translate_content
            .as_ref()
            .map(|_| self as &dyn TranslateContent)
    }

    fn as_translate_theme_config(&self) -> Option<&dyn TranslateThemeConfig> {
        self.translate_theme_config
            .as_ref()
            .map(|_| self as &dyn TranslateThemeConfig)
    }

    fn as_content_loaded(&self) -> Option<&dyn ContentLoaded> {
        self.content_loaded
            .as_ref()
            .map(|_| self as &dyn ContentLoaded)
    }

    fn as_all_content_loaded(&self) -> Option<&dyn AllContentLoaded> {
        self.all_content_loaded
            .as_ref()
            .map(|_| self as &dyn AllContentLoaded)
    }
}

fn not_scripted(hook: LifecycleHook) -> plinth_plugins::BoxError {
    format!("{hook} is not scripted").into()
}

#[async_trait]
impl LoadContent for ScriptedPlugin {
    async fn load_content(&self) -> HookResult<Value> {
        self.enter(LifecycleHook::LoadContent).await;
        match &self.content {
            Some(ContentSource::Fixed(fixed)) => fixed
                .lock()
                .map(|content| content.clone())
                .map_err(|e| e.to_string().into()),
            Some(ContentSource::Script(f)) => f(),
            None => Err(not_scripted(LifecycleHook::LoadContent)),
        }
    }
}

#[async_trait]
impl GetTranslationFiles for ScriptedPlugin {
    async fn get_translation_files(&self, content: &Value) -> HookResult<Vec<TranslationFile>> {
        self.enter(LifecycleHook::GetTranslationFiles).await;
        let f = self
            .translation_files
            .as_ref()
            .ok_or_else(|| not_scripted(LifecycleHook::GetTranslationFiles))?;
        f(content)
    }
}

#[async_trait]
impl TranslateContent for ScriptedPlugin {
    async fn translate_content(
        &self,
        content: Value,
        translation_files: &[TranslationFile],
    ) -> HookResult<Value> {
        self.enter(LifecycleHook::TranslateContent).await;
        let f = self
            .translate_content
            .as_ref()
            .ok_or_else(|| not_scripted(LifecycleHook::TranslateContent))?;
        f(content, translation_files)
    }
}

#[async_trait]
impl TranslateThemeConfig for ScriptedPlugin {
    async fn translate_theme_config(
        &self,
        theme_config: &Map<String, Value>,
        translation_files: &[TranslationFile],
    ) -> HookResult<Option<Map<String, Value>>> {
        self.enter(LifecycleHook::TranslateThemeConfig).await;
        let f = self
            .translate_theme_config
            .as_ref()
            .ok_or_else(|| not_scripted(LifecycleHook::TranslateThemeConfig))?;
        f(theme_config, translation_files)
    }
}

#[async_trait]
impl ContentLoaded for ScriptedPlugin {
    async fn content_loaded(
        &self,
        content: &Value,
        actions: &mut PluginActions,
    ) -> HookResult<()> {
        self.enter(LifecycleHook::ContentLoaded).await;
        let f = self
            .content_loaded
            .as_ref()
            .ok_or_else(|| not_scripted(LifecycleHook::ContentLoaded))?;
        f(content, actions)
    }
}

#[async_trait]
impl AllContentLoaded for ScriptedPlugin {
    async fn all_content_loaded(
        &self,
        all_content: &AllContent,
        actions: &mut PluginActions,
    ) -> HookResult<()> {
        self.enter(LifecycleHook::AllContentLoaded).await;
        let f = self
            .all_content_loaded
            .as_ref()
            .ok_or_else(|| not_scripted(LifecycleHook::AllContentLoaded))?;
        f(all_content, actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_only_scripted_hooks_are_exposed() {
        let plugin = ScriptedPlugin::new("docs").with_content(json!({}));
        assert!(plugin.as_load_content().is_some());
        assert!(plugin.as_content_loaded().is_none());
        assert!(plugin.as_all_content_loaded().is_none());
        assert_eq!(plugin.id(), "default");
    }

    #[tokio::test]
    async fn test_set_content_and_call_counts() {
        let plugin = ScriptedPlugin::new("docs").with_content(json!(1));
        assert_eq!(plugin.load_content().await.unwrap(), json!(1));

        plugin.set_content(json!(2));
        assert_eq!(plugin.load_content().await.unwrap(), json!(2));
        assert_eq!(plugin.call_count(LifecycleHook::LoadContent), 2);
        assert_eq!(plugin.call_count(LifecycleHook::ContentLoaded), 0);
    }
}
