//! Reload coordination for the dev server.
//!
//! Owns the last-known-good [`LoadPluginsResult`] and publishes every
//! successful load on a `watch` channel. A failed reload is logged and the
//! previous result keeps being served.
//!
//! # Architecture
//!
//! ```text
//! change notifications (ReloadRequest)
//!   → debounce 500ms per request
//!   → single-flight: one load or reload at a time
//!       plugin requests queued while a reload runs are coalesced
//!   → publish on success, keep previous result on failure
//! ```

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use plinth_config::{ConfigResult, SiteConfig, loader};
use serde_json::{Map, Value};
use tokio::sync::{Mutex, mpsc, watch};
use tracing::{debug, error, info};

use crate::context::LoadContext;
use crate::error::{PluginError, PluginResult};
use crate::identifier::PluginIdentifier;
use crate::pipeline::{LoadPluginsResult, PluginPipeline};

/// Default debounce interval for reload requests.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Something changed and part of the site needs reloading.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReloadRequest {
    /// Files owned by one plugin instance changed.
    Plugin(PluginIdentifier),
    /// Site configuration changed; every plugin is re-initialized.
    Site,
}

/// What happened to a reload request.
#[derive(Debug)]
pub enum ReloadOutcome {
    /// A new result was published.
    Reloaded,
    /// Another caller's reload already covered this request. `failed` is
    /// set when that reload failed and the previous result is still current.
    Coalesced { failed: bool },
    /// The reload failed. The previous result is still current.
    Failed(PluginError),
}

impl ReloadOutcome {
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::Coalesced { failed: true })
    }
}

/// Where a site reload gets its configuration from.
enum SiteSource {
    /// Re-read `plinth.toml` from the site directory.
    Dir {
        site_dir: PathBuf,
        /// Environment overrides. `None` reads the process environment.
        env_vars: Option<HashMap<String, String>>,
    },
    /// The context is fixed. A site reload starts over from the theme
    /// config the context had before the first load.
    Fixed { theme_config: Map<String, Value> },
}

impl SiteSource {
    fn load_config(
        site_dir: &Path,
        env_vars: Option<&HashMap<String, String>>,
    ) -> ConfigResult<SiteConfig> {
        match env_vars {
            Some(env_vars) => loader::load_with_env(site_dir, env_vars),
            None => loader::load(site_dir),
        }
    }

    /// Build the context for a full load.
    fn context(&self, current: &LoadContext) -> PluginResult<LoadContext> {
        match self {
            Self::Dir { site_dir, env_vars } => {
                let config = Self::load_config(site_dir, env_vars.as_ref())
                    .map_err(|source| PluginError::Config { source })?;
                Ok(LoadContext::from_config(site_dir.clone(), &config))
            },
            Self::Fixed { theme_config } => Ok(current.with_theme_config(theme_config.clone())),
        }
    }
}

/// Serializes reloads and publishes their results.
pub struct ReloadCoordinator {
    pipeline: Arc<PluginPipeline>,
    source: SiteSource,
    /// Context of the last successful full load. Replaced only together
    /// with `state`.
    context: RwLock<Arc<LoadContext>>,
    state: watch::Sender<Arc<LoadPluginsResult>>,
    /// Held for the whole duration of a load or reload.
    in_flight: Mutex<()>,
    /// Plugin reloads requested but not yet picked up by a reload.
    pending: std::sync::Mutex<BTreeSet<PluginIdentifier>>,
    /// Whether the latest reload of each plugin failed, for callers whose
    /// request was coalesced into it.
    handled: std::sync::Mutex<HashMap<PluginIdentifier, bool>>,
}

impl ReloadCoordinator {
    /// Run the initial full load against a fixed context and start serving
    /// its result.
    ///
    /// Site reloads keep the context's site settings and restore the theme
    /// config it had before this load. Use [`for_site`](Self::for_site) to
    /// pick up edits to the site configuration.
    ///
    /// # Errors
    ///
    /// Returns the initial load failure. There is no previous result to fall
    /// back on.
    pub async fn new(
        pipeline: Arc<PluginPipeline>,
        context: Arc<LoadContext>,
    ) -> PluginResult<Self> {
        let source = SiteSource::Fixed {
            theme_config: context.site.theme_config.snapshot(),
        };
        Self::start(pipeline, source, context).await
    }

    /// Load the configuration of the site in `site_dir`, run the initial
    /// full load and start serving its result.
    ///
    /// Every site reload reads `plinth.toml` and the `PLINTH_*` environment
    /// again.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Config`] if the configuration is invalid, or the
    /// initial load failure.
    pub async fn for_site(
        pipeline: Arc<PluginPipeline>,
        site_dir: impl Into<PathBuf>,
    ) -> PluginResult<Self> {
        Self::from_dir(pipeline, site_dir.into(), None).await
    }

    /// Like [`for_site`](Self::for_site) with explicit environment overrides
    /// instead of the process environment.
    ///
    /// # Errors
    ///
    /// See [`for_site`](Self::for_site).
    pub async fn for_site_with_env(
        pipeline: Arc<PluginPipeline>,
        site_dir: impl Into<PathBuf>,
        env_vars: HashMap<String, String>,
    ) -> PluginResult<Self> {
        Self::from_dir(pipeline, site_dir.into(), Some(env_vars)).await
    }

    async fn from_dir(
        pipeline: Arc<PluginPipeline>,
        site_dir: PathBuf,
        env_vars: Option<HashMap<String, String>>,
    ) -> PluginResult<Self> {
        let config = SiteSource::load_config(&site_dir, env_vars.as_ref())
            .map_err(|source| PluginError::Config { source })?;
        let context = Arc::new(LoadContext::from_config(site_dir.clone(), &config));
        Self::start(pipeline, SiteSource::Dir { site_dir, env_vars }, context).await
    }

    async fn start(
        pipeline: Arc<PluginPipeline>,
        source: SiteSource,
        context: Arc<LoadContext>,
    ) -> PluginResult<Self> {
        let initial = pipeline.load_plugins(&context).await?;
        let (state, _) = watch::channel(Arc::new(initial));
        Ok(Self {
            pipeline,
            source,
            context: RwLock::new(context),
            state,
            in_flight: Mutex::new(()),
            pending: std::sync::Mutex::new(BTreeSet::new()),
            handled: std::sync::Mutex::new(HashMap::new()),
        })
    }

    /// Subscribe to published results. The receiver starts at the current
    /// result.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<LoadPluginsResult>> {
        self.state.subscribe()
    }

    /// The last successfully loaded result.
    #[must_use]
    pub fn current(&self) -> Arc<LoadPluginsResult> {
        Arc::clone(&self.state.borrow())
    }

    /// The context the current result was loaded with.
    #[must_use]
    pub fn context(&self) -> Arc<LoadContext> {
        Arc::clone(&self.context.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Reload one plugin against the current result.
    ///
    /// If another reload is running, the request is queued. Whichever caller
    /// next acquires the reload slot runs every queued plugin reload in
    /// identifier order, and later callers whose request was already handled
    /// get [`ReloadOutcome::Coalesced`] carrying whether that reload failed.
    pub async fn reload_plugin(&self, identifier: &PluginIdentifier) -> ReloadOutcome {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identifier.clone());

        let _slot = self.in_flight.lock().await;
        let queued = std::mem::take(
            &mut *self
                .pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        if !queued.contains(identifier) {
            let failed = self
                .handled
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(identifier)
                .copied()
                .unwrap_or(false);
            debug!(plugin = %identifier, failed, "Reload already handled by a concurrent reload");
            return ReloadOutcome::Coalesced { failed };
        }

        let mut outcome = ReloadOutcome::Coalesced { failed: false };
        for queued_identifier in queued {
            let result = self.reload_one(&queued_identifier).await;
            self.handled
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(queued_identifier.clone(), result.is_failed());
            if &queued_identifier == identifier {
                outcome = result;
            }
        }
        outcome
    }

    /// Re-run the full load, re-initializing every plugin.
    ///
    /// The load runs against a fresh context: the site configuration is read
    /// again for a coordinator built with [`for_site`](Self::for_site). The
    /// new context replaces the current one only if the load succeeds.
    pub async fn reload_site(&self) -> ReloadOutcome {
        let _slot = self.in_flight.lock().await;
        // A full load supersedes any queued single-plugin reload.
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();

        let context = match self.source.context(&self.context()) {
            Ok(context) => Arc::new(context),
            Err(e) => {
                error!(error = %e, "Site reload failed, keeping previous result");
                return ReloadOutcome::Failed(e);
            },
        };

        match self.pipeline.load_plugins(&context).await {
            Ok(result) => {
                info!(
                    routes = result.routes.len(),
                    base_url = %context.site.base_url,
                    "Site reloaded"
                );
                *self.context.write().unwrap_or_else(PoisonError::into_inner) = context;
                self.state.send_replace(Arc::new(result));
                ReloadOutcome::Reloaded
            },
            Err(e) => {
                error!(error = %e, "Site reload failed, keeping previous result");
                ReloadOutcome::Failed(e)
            },
        }
    }

    async fn reload_one(&self, identifier: &PluginIdentifier) -> ReloadOutcome {
        let previous = self.current();
        let context = self.context();
        match self
            .pipeline
            .reload_plugin(identifier, &previous.plugins, &context)
            .await
        {
            Ok(result) => {
                self.state.send_replace(Arc::new(result));
                ReloadOutcome::Reloaded
            },
            Err(e) => {
                error!(
                    plugin = %identifier,
                    error = %e,
                    "Plugin reload failed, keeping previous result"
                );
                ReloadOutcome::Failed(e)
            },
        }
    }

    /// Process reload requests until the sender side closes.
    ///
    /// Requests are debounced: a request fires once no identical request has
    /// arrived for `debounce`. Requests still pending when the channel closes
    /// are flushed before returning.
    pub async fn run(&self, mut requests: mpsc::Receiver<ReloadRequest>, debounce: Duration) {
        let mut pending: HashMap<ReloadRequest, tokio::time::Instant> = HashMap::new();

        loop {
            let next_deadline = pending.values().copied().min();

            tokio::select! {
                biased;

                () = async {
                    match next_deadline {
                        Some(deadline) => tokio::time::sleep_until(deadline).await,
                        None => std::future::pending::<()>().await,
                    }
                } => {
                    let now = tokio::time::Instant::now();
                    let ready: Vec<ReloadRequest> = pending
                        .iter()
                        .filter(|(_, deadline)| **deadline <= now)
                        .map(|(request, _)| request.clone())
                        .collect();
                    for request in ready {
                        pending.remove(&request);
                        self.dispatch(request).await;
                    }
                }

                request = requests.recv() => {
                    let Some(request) = request else {
                        debug!("Reload request channel closed, flushing pending requests");
                        break;
                    };
                    debug!(request = ?request, "Reload requested");
                    #[allow(clippy::arithmetic_side_effects)]
                    // Instant + Duration cannot overflow in practice
                    let deadline = tokio::time::Instant::now() + debounce;
                    pending.insert(request, deadline);
                }
            }
        }

        // Site reloads first; they make queued plugin reloads redundant.
        if pending.remove(&ReloadRequest::Site).is_some() {
            self.dispatch(ReloadRequest::Site).await;
        } else {
            for request in pending.into_keys() {
                self.dispatch(request).await;
            }
        }
    }

    async fn dispatch(&self, request: ReloadRequest) {
        let outcome = match &request {
            ReloadRequest::Plugin(identifier) => self.reload_plugin(identifier).await,
            ReloadRequest::Site => self.reload_site().await,
        };
        debug!(request = ?request, failed = outcome.is_failed(), "Reload request processed");
    }
}

impl std::fmt::Debug for ReloadCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReloadCoordinator")
            .field("pipeline", &self.pipeline)
            .field("context", &self.context())
            .finish_non_exhaustive()
    }
}
