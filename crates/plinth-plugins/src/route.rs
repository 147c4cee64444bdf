//! Route configuration and deterministic route ordering.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A node in the route tree contributed by a plugin.
///
/// The pipeline only concatenates and sorts routes; everything beyond the
/// sort keys (`path`, `priority`, nested `routes`) is passed through to the
/// renderer untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteConfig {
    /// URL path, including the site base URL.
    pub path: String,
    /// Rendering target for this route.
    pub component: String,
    /// Whether the path must match exactly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exact: Option<bool>,
    /// Higher priority routes sort before lower ones with the same nesting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    /// Modules the component needs, keyed by prop name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub modules: BTreeMap<String, String>,
    /// Nested child routes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routes: Option<Vec<RouteConfig>>,
    /// Free-form data passed to the renderer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl RouteConfig {
    #[must_use]
    pub fn new(path: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            component: component.into(),
            exact: None,
            priority: None,
            modules: BTreeMap::new(),
            routes: None,
            metadata: None,
        }
    }

    #[must_use]
    pub fn exact(mut self) -> Self {
        self.exact = Some(true);
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    #[must_use]
    pub fn with_module(mut self, prop: impl Into<String>, module: impl Into<String>) -> Self {
        self.modules.insert(prop.into(), module.into());
        self
    }

    #[must_use]
    pub fn with_routes(mut self, routes: Vec<RouteConfig>) -> Self {
        self.routes = Some(routes);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Order two sibling routes.
///
/// 1. The base URL root route comes first.
/// 2. Leaf routes come before routes with nested routes.
/// 3. Higher `priority` comes first, a missing priority counts as 0.
/// 4. Ascending byte order of `path`.
fn compare_routes(a: &RouteConfig, b: &RouteConfig, base_url: &str) -> Ordering {
    let a_root = a.path == base_url;
    let b_root = b.path == base_url;
    b_root
        .cmp(&a_root)
        .then_with(|| a.routes.is_some().cmp(&b.routes.is_some()))
        .then_with(|| b.priority.unwrap_or(0).cmp(&a.priority.unwrap_or(0)))
        .then_with(|| a.path.cmp(&b.path))
}

/// Sort routes in place into their final deterministic order, recursing
/// into nested routes.
///
/// The sort is stable, so routes that compare equal on every key keep the
/// order in which plugins contributed them.
pub fn sort_routes(routes: &mut [RouteConfig], base_url: &str) {
    routes.sort_by(|a, b| compare_routes(a, b, base_url));
    for route in routes.iter_mut() {
        if let Some(children) = route.routes.as_mut() {
            sort_routes(children, base_url);
        }
    }
}
