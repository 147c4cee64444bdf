//! Actions available to a plugin inside `contentLoaded` and
//! `allContentLoaded`.
//!
//! A fresh [`PluginActions`] scope is created for every hook invocation and
//! only ever sees what that invocation recorded.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::{PluginError, PluginResult};
use crate::identifier::PluginIdentifier;
use crate::route::RouteConfig;

/// Apply the trailing slash policy to a route path.
///
/// The base URL itself is never altered, so `/` and `/site/` stay as they
/// are even when trailing slashes are stripped.
#[must_use]
pub fn apply_trailing_slash(path: &str, trailing_slash: Option<bool>, base_url: &str) -> String {
    if path == base_url {
        return path.to_string();
    }
    let (route, suffix) = match path.find(['?', '#']) {
        Some(index) => path.split_at(index),
        None => (path, ""),
    };
    let route = match trailing_slash {
        Some(true) if !route.ends_with('/') => format!("{route}/"),
        Some(false) if route.len() > 1 => route.trim_end_matches('/').to_string(),
        _ => route.to_string(),
    };
    format!("{route}{suffix}")
}

fn apply_route_trailing_slash(
    mut route: RouteConfig,
    trailing_slash: Option<bool>,
    base_url: &str,
) -> RouteConfig {
    route.path = apply_trailing_slash(&route.path, trailing_slash, base_url);
    route.routes = route.routes.map(|children| {
        children
            .into_iter()
            .map(|child| apply_route_trailing_slash(child, trailing_slash, base_url))
            .collect()
    });
    route
}

/// Mutation entry points for one plugin hook invocation.
#[derive(Debug)]
pub struct PluginActions {
    plugin: PluginIdentifier,
    data_dir: PathBuf,
    base_url: String,
    trailing_slash: Option<bool>,
    routes: Vec<RouteConfig>,
    global_data: Option<Value>,
}

impl PluginActions {
    /// Create a fresh scope for `plugin`. Generated data is written under
    /// `{generated_files_dir}/{name}/{id}`.
    #[must_use]
    pub fn new(
        plugin: PluginIdentifier,
        generated_files_dir: &Path,
        base_url: impl Into<String>,
        trailing_slash: Option<bool>,
    ) -> Self {
        let data_dir = generated_files_dir.join(&plugin.name).join(&plugin.id);
        Self {
            plugin,
            data_dir,
            base_url: base_url.into(),
            trailing_slash,
            routes: Vec::new(),
            global_data: None,
        }
    }

    /// The plugin this scope belongs to.
    #[must_use]
    pub fn plugin(&self) -> &PluginIdentifier {
        &self.plugin
    }

    /// Directory generated data for this plugin is written to.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Record a route, normalizing its path with the trailing slash policy.
    pub fn add_route(&mut self, route: RouteConfig) {
        let route = apply_route_trailing_slash(route, self.trailing_slash, &self.base_url);
        debug!(plugin = %self.plugin, path = %route.path, "Route added");
        self.routes.push(route);
    }

    /// Set this plugin's global data. A later call replaces an earlier one.
    pub fn set_global_data(&mut self, data: Value) {
        self.global_data = Some(data);
    }

    /// Write a generated data file and return its path.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Io`] if the directory or file cannot be written.
    pub async fn create_data(&self, name: &str, content: &str) -> PluginResult<PathBuf> {
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|source| PluginError::Io {
                path: self.data_dir.clone(),
                source,
            })?;
        let path = self.data_dir.join(name);
        tokio::fs::write(&path, content)
            .await
            .map_err(|source| PluginError::Io {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }

    /// Routes recorded so far.
    #[must_use]
    pub fn routes(&self) -> &[RouteConfig] {
        &self.routes
    }

    /// Global data recorded so far.
    #[must_use]
    pub fn global_data(&self) -> Option<&Value> {
        self.global_data.as_ref()
    }

    /// Consume the scope, returning what the hook recorded.
    #[must_use]
    pub fn into_parts(self) -> (Vec<RouteConfig>, Option<Value>) {
        (self.routes, self.global_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trailing_slash_policy() {
        assert_eq!(apply_trailing_slash("/docs", Some(true), "/"), "/docs/");
        assert_eq!(apply_trailing_slash("/docs/", Some(false), "/"), "/docs");
        assert_eq!(apply_trailing_slash("/docs/", None, "/"), "/docs/");
        assert_eq!(apply_trailing_slash("/", Some(false), "/"), "/");
        assert_eq!(apply_trailing_slash("/site/", Some(false), "/site/"), "/site/");
        assert_eq!(
            apply_trailing_slash("/docs?tab=1#x", Some(true), "/"),
            "/docs/?tab=1#x"
        );
    }

    #[test]
    fn test_routes_normalized_recursively() {
        let mut actions = PluginActions::new(
            PluginIdentifier::with_default_id("docs"),
            Path::new("/tmp/gen"),
            "/",
            Some(false),
        );
        actions.add_route(
            RouteConfig::new("/docs/", "Docs")
                .with_routes(vec![RouteConfig::new("/docs/intro/", "Doc")]),
        );
        let (routes, global_data) = actions.into_parts();
        assert_eq!(routes[0].path, "/docs");
        assert_eq!(routes[0].routes.as_ref().unwrap()[0].path, "/docs/intro");
        assert!(global_data.is_none());
    }

    #[test]
    fn test_global_data_last_call_wins() {
        let mut actions = PluginActions::new(
            PluginIdentifier::with_default_id("docs"),
            Path::new("/tmp/gen"),
            "/",
            None,
        );
        actions.set_global_data(json!({"version": "0.9"}));
        actions.set_global_data(json!({"version": "1.0"}));
        assert_eq!(actions.global_data(), Some(&json!({"version": "1.0"})));
    }

    #[tokio::test]
    async fn test_create_data_under_plugin_dir() {
        let dir = tempfile::tempdir().unwrap();
        let actions = PluginActions::new(
            PluginIdentifier::new("blog", "community"),
            dir.path(),
            "/",
            None,
        );
        let path = actions.create_data("posts.json", "[]").await.unwrap();
        assert_eq!(path, dir.path().join("blog/community/posts.json"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "[]");
    }
}
