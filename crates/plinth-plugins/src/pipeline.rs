//! The plugin pipeline: drives every plugin through content loading and
//! all-content-loaded, then merges their routes and global data.
//!
//! # Phases
//!
//! ```text
//! init (external) + synthetic plugins
//!   → phase 1: content loading, every plugin concurrently
//!       loadContent → translation → contentLoaded
//!   → barrier
//!   → phase 2: allContentLoaded, every plugin concurrently,
//!       each seeing the AllContent snapshot
//!   → merge: phase-1 routes ++ phase-2 routes, sorted
//!            phase-1 global data ⊕ phase-2 global data
//! ```
//!
//! A single-plugin reload re-runs phase 1 for the target plugin only and
//! reuses every other plugin's phase-1 output, but always re-runs phase 2
//! and the merge over the whole collection.
//!
//! Concurrency is cooperative: fan-out uses `try_join_all` on the calling
//! task, results keep plugin order, and the first failure aborts the phase.
//! Hooks are not preemptible. Without a hook timeout a hung hook hangs the
//! phase.

use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use serde_json::Value;
use tracing::{debug, info};

use crate::actions::PluginActions;
use crate::aggregate::{
    AllContent, GlobalData, aggregate_all_content, aggregate_global_data, aggregate_routes,
    merge_global_data,
};
use crate::context::LoadContext;
use crate::error::PluginResult;
use crate::guard::HookGuard;
use crate::identifier::{
    Identified, PluginIdentifier, ensure_unique_identifiers, position_by_identifier,
};
use crate::loader::PluginInitializer;
use crate::perf::timed;
use crate::plugin::{LifecycleHook, LoadedPlugin, Plugin};
use crate::route::{RouteConfig, sort_routes};
use crate::synthetic::{DefaultSyntheticPlugins, SyntheticPlugins};
use crate::translations::{JsonFileLocalizer, TranslationLocalizer, translate_plugin_content};

/// Routes and global data one plugin produced in `allContentLoaded`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginContribution {
    pub routes: Vec<RouteConfig>,
    pub global_data: Option<Value>,
}

/// Combined output of the all-content-loaded phase.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllContentLoadedResult {
    /// Phase-2 routes of every plugin, concatenated in plugin order.
    pub routes: Vec<RouteConfig>,
    pub global_data: GlobalData,
}

/// Result of a full load or a single-plugin reload.
#[derive(Debug, Clone)]
pub struct LoadPluginsResult {
    pub plugins: Vec<LoadedPlugin>,
    pub routes: Vec<RouteConfig>,
    pub global_data: GlobalData,
}

fn actions_for(plugin: &dyn Plugin, context: &LoadContext) -> PluginActions {
    PluginActions::new(
        PluginIdentifier::new(plugin.name(), plugin.id()),
        &context.generated_files_dir,
        context.site.base_url.clone(),
        context.site.trailing_slash,
    )
}

/// Drives plugins through their lifecycle.
pub struct PluginPipeline {
    initializer: Arc<dyn PluginInitializer>,
    synthetic: Arc<dyn SyntheticPlugins>,
    localizer: Arc<dyn TranslationLocalizer>,
    guard: HookGuard,
}

impl PluginPipeline {
    /// Create a pipeline using the default synthetic plugins, the JSON file
    /// localizer and no hook timeout.
    #[must_use]
    pub fn new(initializer: Arc<dyn PluginInitializer>) -> Self {
        Self {
            initializer,
            synthetic: Arc::new(DefaultSyntheticPlugins),
            localizer: Arc::new(JsonFileLocalizer),
            guard: HookGuard::default(),
        }
    }

    #[must_use]
    pub fn with_localizer(mut self, localizer: Arc<dyn TranslationLocalizer>) -> Self {
        self.localizer = localizer;
        self
    }

    #[must_use]
    pub fn with_synthetic_plugins(mut self, synthetic: Arc<dyn SyntheticPlugins>) -> Self {
        self.synthetic = synthetic;
        self
    }

    /// Bound every hook invocation and localization call by `timeout`.
    #[must_use]
    pub fn with_hook_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.guard = HookGuard::new(timeout);
        self
    }

    /// Run content loading for one plugin: `loadContent`, translation, then
    /// `contentLoaded` in a fresh actions scope.
    ///
    /// # Errors
    ///
    /// Returns the first hook or localization failure, attributed to the
    /// plugin.
    pub async fn execute_plugin_content_loading(
        &self,
        plugin: Arc<dyn Plugin>,
        context: &LoadContext,
    ) -> PluginResult<LoadedPlugin> {
        let label = format!("single plugin content loading {}", plugin.identifier());
        timed(&label, self.load_plugin_content(plugin, context)).await
    }

    async fn load_plugin_content(
        &self,
        plugin: Arc<dyn Plugin>,
        context: &LoadContext,
    ) -> PluginResult<LoadedPlugin> {
        let identifier = plugin.identifier();

        let content = match plugin.as_load_content() {
            Some(hook) => {
                self.guard
                    .run(&identifier, LifecycleHook::LoadContent, hook.load_content())
                    .await?
            },
            None => Value::Null,
        };

        let content = translate_plugin_content(
            plugin.as_ref(),
            content,
            context,
            self.localizer.as_ref(),
            self.guard,
        )
        .await?;

        let Some(hook) = plugin.as_content_loaded() else {
            return Ok(LoadedPlugin {
                content: Arc::new(content),
                routes: Vec::new(),
                global_data: None,
                plugin,
            });
        };

        let mut actions = actions_for(plugin.as_ref(), context);
        self.guard
            .run(
                &identifier,
                LifecycleHook::ContentLoaded,
                hook.content_loaded(&content, &mut actions),
            )
            .await?;
        let (routes, global_data) = actions.into_parts();

        debug!(
            plugin = %identifier,
            routes = routes.len(),
            has_global_data = global_data.is_some(),
            "Plugin content loaded"
        );
        Ok(LoadedPlugin {
            content: Arc::new(content),
            routes,
            global_data,
            plugin,
        })
    }

    /// Run content loading for every plugin concurrently. The result keeps
    /// the input order.
    ///
    /// # Errors
    ///
    /// Fails the whole phase on the first plugin failure.
    pub async fn execute_all_plugins_content_loading(
        &self,
        plugins: Vec<Arc<dyn Plugin>>,
        context: &LoadContext,
    ) -> PluginResult<Vec<LoadedPlugin>> {
        timed(
            "all plugins content loading",
            try_join_all(
                plugins
                    .into_iter()
                    .map(|plugin| self.execute_plugin_content_loading(plugin, context)),
            ),
        )
        .await
    }

    /// Run `allContentLoaded` for one loaded plugin in a fresh actions scope.
    ///
    /// # Errors
    ///
    /// Returns the hook failure, attributed to the plugin.
    pub async fn execute_plugin_all_content_loaded(
        &self,
        plugin: &LoadedPlugin,
        context: &LoadContext,
        all_content: &AllContent,
    ) -> PluginResult<PluginContribution> {
        let label = format!("allContentLoaded {}", plugin.identifier());
        timed(&label, self.run_all_content_loaded(plugin, context, all_content)).await
    }

    async fn run_all_content_loaded(
        &self,
        plugin: &LoadedPlugin,
        context: &LoadContext,
        all_content: &AllContent,
    ) -> PluginResult<PluginContribution> {
        let Some(hook) = plugin.plugin.as_all_content_loaded() else {
            return Ok(PluginContribution::default());
        };

        let mut actions = actions_for(plugin.plugin.as_ref(), context);
        self.guard
            .run(
                &plugin.identifier(),
                LifecycleHook::AllContentLoaded,
                hook.all_content_loaded(all_content, &mut actions),
            )
            .await?;
        let (routes, global_data) = actions.into_parts();
        Ok(PluginContribution {
            routes,
            global_data,
        })
    }

    /// Run `allContentLoaded` for every plugin concurrently against a fresh
    /// all-content snapshot, then combine their contributions in plugin
    /// order.
    ///
    /// # Errors
    ///
    /// Fails the whole phase on the first plugin failure.
    pub async fn execute_all_plugins_all_content_loaded(
        &self,
        plugins: &[LoadedPlugin],
        context: &LoadContext,
    ) -> PluginResult<AllContentLoadedResult> {
        timed(
            "allContentLoaded",
            self.run_all_plugins_all_content_loaded(plugins, context),
        )
        .await
    }

    async fn run_all_plugins_all_content_loaded(
        &self,
        plugins: &[LoadedPlugin],
        context: &LoadContext,
    ) -> PluginResult<AllContentLoadedResult> {
        let all_content = aggregate_all_content(plugins);

        let contributions = try_join_all(plugins.iter().map(|plugin| {
            self.execute_plugin_all_content_loaded(plugin, context, &all_content)
        }))
        .await?;

        let mut result = AllContentLoadedResult::default();
        for (plugin, contribution) in plugins.iter().zip(contributions) {
            result.routes.extend(contribution.routes);
            if let Some(data) = contribution.global_data {
                result.global_data.insert(&plugin.identifier(), data);
            }
        }
        Ok(result)
    }

    /// Initialize the site's plugins, append the synthetic plugins and run
    /// both phases and the merge.
    ///
    /// # Errors
    ///
    /// Returns an initialization failure, a duplicate identifier, or the
    /// first plugin failure of either phase.
    pub async fn load_plugins(&self, context: &LoadContext) -> PluginResult<LoadPluginsResult> {
        timed("loadPlugins", self.run_load_plugins(context)).await
    }

    async fn run_load_plugins(&self, context: &LoadContext) -> PluginResult<LoadPluginsResult> {
        let mut initialized = timed("initPlugins", self.initializer.init_plugins(context)).await?;
        initialized.push(self.synthetic.bootstrap(context));
        initialized.push(self.synthetic.mdx_fallback(context));
        ensure_unique_identifiers(&initialized)?;

        let plugins = self
            .execute_all_plugins_content_loading(initialized, context)
            .await?;
        let all_content_loaded = self
            .execute_all_plugins_all_content_loaded(&plugins, context)
            .await?;
        let (routes, global_data) =
            merge_results(&plugins, all_content_loaded, &context.site.base_url);

        info!(
            plugins = plugins.len(),
            routes = routes.len(),
            global_data = global_data.len(),
            "Plugins loaded"
        );
        Ok(LoadPluginsResult {
            plugins,
            routes,
            global_data,
        })
    }

    /// Reload one plugin.
    ///
    /// Content loading re-runs for the target only. Every other plugin's
    /// content-loading output is reused as is. All-content-loaded and the
    /// merge re-run over the whole updated collection. `previous` is never
    /// modified.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::NotFound`](crate::PluginError::NotFound) if
    /// `identifier` is not in `previous`, or the first plugin failure of
    /// either phase.
    pub async fn reload_plugin(
        &self,
        identifier: &PluginIdentifier,
        previous: &[LoadedPlugin],
        context: &LoadContext,
    ) -> PluginResult<LoadPluginsResult> {
        timed(
            "reloadPlugin",
            self.run_reload_plugin(identifier, previous, context),
        )
        .await
    }

    async fn run_reload_plugin(
        &self,
        identifier: &PluginIdentifier,
        previous: &[LoadedPlugin],
        context: &LoadContext,
    ) -> PluginResult<LoadPluginsResult> {
        let index = position_by_identifier(previous, identifier)?;
        let target = Arc::clone(&previous[index].plugin);
        let reloaded = self
            .execute_plugin_content_loading(target, context)
            .await?;

        let mut plugins = previous.to_vec();
        plugins[index] = reloaded;

        let all_content_loaded = self
            .execute_all_plugins_all_content_loaded(&plugins, context)
            .await?;
        let (routes, global_data) =
            merge_results(&plugins, all_content_loaded, &context.site.base_url);

        info!(
            plugin = %identifier,
            routes = routes.len(),
            "Plugin reloaded"
        );
        Ok(LoadPluginsResult {
            plugins,
            routes,
            global_data,
        })
    }
}

impl std::fmt::Debug for PluginPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginPipeline")
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}

/// Combine both phases: content-loading routes of every plugin followed by
/// all-content-loaded routes, sorted, and the two global data maps merged
/// with all-content-loaded data applied last.
#[must_use]
pub fn merge_results(
    plugins: &[LoadedPlugin],
    all_content_loaded: AllContentLoadedResult,
    base_url: &str,
) -> (Vec<RouteConfig>, GlobalData) {
    let mut routes = aggregate_routes(plugins);
    routes.extend(all_content_loaded.routes);
    sort_routes(&mut routes, base_url);

    let global_data = merge_global_data(&[
        &aggregate_global_data(plugins),
        &all_content_loaded.global_data,
    ]);
    (routes, global_data)
}
