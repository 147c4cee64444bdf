//! Cross-plugin views over a loaded plugin collection.
//!
//! Provides the `name → id → value` maps used for all-content visibility
//! and global data, plus the route and global data aggregation used by the
//! final merge.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identifier::{Identified, PluginIdentifier};
use crate::plugin::LoadedPlugin;
use crate::route::RouteConfig;

/// Every plugin's content, keyed by plugin name then instance id.
///
/// A read-only snapshot rebuilt from the loaded plugin collection right
/// before the all-content-loaded phase.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllContent {
    content: BTreeMap<String, BTreeMap<String, Arc<Value>>>,
}

impl AllContent {
    /// Content of the plugin instance `name@id`.
    #[must_use]
    pub fn get(&self, name: &str, id: &str) -> Option<&Value> {
        self.content.get(name)?.get(id).map(AsRef::as_ref)
    }

    /// Content of every instance of plugin `name`, keyed by id.
    #[must_use]
    pub fn instances(&self, name: &str) -> Option<&BTreeMap<String, Arc<Value>>> {
        self.content.get(name)
    }

    /// Plugin names with content.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.content.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.content.values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Plugin global data, keyed by plugin name then instance id.
///
/// Only plugins that actually produced global data have an entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GlobalData {
    data: BTreeMap<String, BTreeMap<String, Value>>,
}

impl GlobalData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `data` for the plugin instance, replacing any previous entry.
    pub fn insert(&mut self, identifier: &PluginIdentifier, data: Value) {
        self.data
            .entry(identifier.name.clone())
            .or_default()
            .insert(identifier.id.clone(), data);
    }

    #[must_use]
    pub fn get(&self, name: &str, id: &str) -> Option<&Value> {
        self.data.get(name)?.get(id)
    }

    /// Global data of every instance of plugin `name`, keyed by id.
    #[must_use]
    pub fn instances(&self, name: &str) -> Option<&BTreeMap<String, Value>> {
        self.data.get(name)
    }

    /// Every `(identifier, data)` entry in name then id order.
    pub fn iter(&self) -> impl Iterator<Item = (PluginIdentifier, &Value)> {
        self.data.iter().flat_map(|(name, ids)| {
            ids.iter()
                .map(move |(id, data)| (PluginIdentifier::new(name.clone(), id.clone()), data))
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Build the all-content snapshot from a loaded plugin collection.
#[must_use]
pub fn aggregate_all_content(plugins: &[LoadedPlugin]) -> AllContent {
    let mut content: BTreeMap<String, BTreeMap<String, Arc<Value>>> = BTreeMap::new();
    for plugin in plugins {
        content
            .entry(plugin.name().to_string())
            .or_default()
            .entry(plugin.id().to_string())
            .or_insert_with(|| Arc::clone(&plugin.content));
    }
    AllContent { content }
}

/// Concatenate every plugin's content-loading routes in plugin order.
#[must_use]
pub fn aggregate_routes(plugins: &[LoadedPlugin]) -> Vec<RouteConfig> {
    plugins
        .iter()
        .flat_map(|p| p.routes.iter().cloned())
        .collect()
}

/// Collect the content-loading global data of every plugin that produced
/// some.
#[must_use]
pub fn aggregate_global_data(plugins: &[LoadedPlugin]) -> GlobalData {
    let mut global_data = GlobalData::new();
    for plugin in plugins {
        if let Some(data) = &plugin.global_data {
            global_data.insert(&plugin.identifier(), data.clone());
        }
    }
    global_data
}

/// Merge two global data values for the same plugin instance.
///
/// Two objects are shallow-merged with `later` winning on shared keys. An
/// object absorbs a non-object overlay and is kept as is. When `earlier` is
/// not an object, `later` replaces it entirely.
#[must_use]
pub fn merge_data(earlier: Value, later: Value) -> Value {
    match (earlier, later) {
        (Value::Object(mut merged), Value::Object(overlay)) => {
            merged.extend(overlay);
            Value::Object(merged)
        },
        (Value::Object(merged), _) => Value::Object(merged),
        (_, later) => later,
    }
}

/// Merge global data maps, earliest first.
///
/// A plugin instance present in a single map is copied through unchanged.
/// One present in several is folded with [`merge_data`].
#[must_use]
pub fn merge_global_data(global_data_list: &[&GlobalData]) -> GlobalData {
    let mut result = GlobalData::new();
    for global_data in global_data_list {
        for (name, ids) in &global_data.data {
            let merged_ids = result.data.entry(name.clone()).or_default();
            for (id, data) in ids {
                let merged = match merged_ids.remove(id) {
                    Some(existing) => merge_data(existing, data.clone()),
                    None => data.clone(),
                };
                merged_ids.insert(id.clone(), merged);
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::Plugin;
    use serde_json::json;

    struct Named(&'static str, &'static str);

    impl Plugin for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn id(&self) -> &str {
            self.1
        }
    }

    fn loaded(
        name: &'static str,
        id: &'static str,
        content: Value,
        routes: &[&str],
        global_data: Option<Value>,
    ) -> LoadedPlugin {
        LoadedPlugin {
            plugin: Arc::new(Named(name, id)),
            content: Arc::new(content),
            routes: routes.iter().map(|p| RouteConfig::new(*p, "Page")).collect(),
            global_data,
        }
    }

    fn global(entries: &[(&str, &str, Value)]) -> GlobalData {
        let mut data = GlobalData::new();
        for (name, id, value) in entries {
            data.insert(&PluginIdentifier::new(*name, *id), value.clone());
        }
        data
    }

    #[test]
    fn test_all_content_two_levels() {
        let plugins = vec![
            loaded("docs", "default", json!({"docs": 3}), &[], None),
            loaded("docs", "community", json!({"docs": 1}), &[], None),
            loaded("pages", "default", Value::Null, &[], None),
        ];
        let all = aggregate_all_content(&plugins);
        assert_eq!(all.get("docs", "community"), Some(&json!({"docs": 1})));
        assert_eq!(all.get("pages", "default"), Some(&Value::Null));
        assert_eq!(all.get("blog", "default"), None);
        assert_eq!(all.instances("docs").map(BTreeMap::len), Some(2));
        assert_eq!(all.len(), 3);
        assert_eq!(all.names().collect::<Vec<_>>(), ["docs", "pages"]);
    }

    #[test]
    fn test_routes_in_plugin_order() {
        let plugins = vec![
            loaded("blog", "default", Value::Null, &["/blog", "/blog/a"], None),
            loaded("docs", "default", Value::Null, &["/docs"], None),
        ];
        let routes = aggregate_routes(&plugins);
        let paths: Vec<_> = routes.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, ["/blog", "/blog/a", "/docs"]);
    }

    #[test]
    fn test_global_data_skips_plugins_without_data() {
        let plugins = vec![
            loaded("docs", "default", Value::Null, &[], Some(json!({"version": "1.0"}))),
            loaded("blog", "default", Value::Null, &[], None),
        ];
        let data = aggregate_global_data(&plugins);
        assert_eq!(data.len(), 1);
        assert_eq!(data.get("docs", "default"), Some(&json!({"version": "1.0"})));
        assert!(data.instances("blog").is_none());
    }

    #[test]
    fn test_merge_disjoint_keys_any_order() {
        let a = global(&[("A", "default", json!({"x": 1}))]);
        let b = global(&[("A", "default", json!({"y": 2}))]);
        let expected = global(&[("A", "default", json!({"x": 1, "y": 2}))]);
        assert_eq!(merge_global_data(&[&a, &b]), expected);
        assert_eq!(merge_global_data(&[&b, &a]), expected);
    }

    #[test]
    fn test_merge_with_empty_is_identity() {
        let a = global(&[("A", "default", json!(["not", "an", "object"]))]);
        let empty = GlobalData::new();
        assert_eq!(merge_global_data(&[&a, &empty]), a);
        assert_eq!(merge_global_data(&[&empty, &a]), a);
    }

    #[test]
    fn test_merge_later_wins() {
        let a = global(&[("A", "default", json!({"x": 1, "shared": "early"}))]);
        let b = global(&[("A", "default", json!({"shared": "late"}))]);
        assert_eq!(
            merge_global_data(&[&a, &b]).get("A", "default"),
            Some(&json!({"x": 1, "shared": "late"}))
        );
    }

    #[test]
    fn test_merge_data_non_objects() {
        assert_eq!(merge_data(json!(1), json!({"a": 1})), json!({"a": 1}));
        assert_eq!(merge_data(json!({"a": 1}), json!("text")), json!({"a": 1}));
        assert_eq!(merge_data(json!({"a": 1}), Value::Null), json!({"a": 1}));
        assert_eq!(merge_data(json!([1]), json!([2])), json!([2]));
        assert_eq!(merge_data(json!("text"), json!(2)), json!(2));
    }

    #[test]
    fn test_merge_is_associative() {
        let a = global(&[("A", "default", json!({"x": 1}))]);
        let b = global(&[("A", "default", json!({"y": 2})), ("B", "x", json!(3))]);
        let c = global(&[("A", "default", json!({"z": 3}))]);
        let left = merge_global_data(&[&merge_global_data(&[&a, &b]), &c]);
        let right = merge_global_data(&[&a, &merge_global_data(&[&b, &c])]);
        assert_eq!(left, right);
        assert_eq!(merge_global_data(&[&a, &b, &c]), left);
    }

    #[test]
    fn test_merge_is_associative_across_object_and_scalar() {
        let a = global(&[("A", "default", json!({"x": 1}))]);
        let b = global(&[("A", "default", json!("scalar"))]);
        let c = global(&[("A", "default", json!({"y": 2}))]);
        let left = merge_global_data(&[&merge_global_data(&[&a, &b]), &c]);
        let right = merge_global_data(&[&a, &merge_global_data(&[&b, &c])]);
        assert_eq!(left, right);
        assert_eq!(left.get("A", "default"), Some(&json!({"x": 1, "y": 2})));
        assert_eq!(merge_global_data(&[&a, &b, &c]), left);
    }

    #[test]
    fn test_global_data_serializes_as_nested_map() {
        let data = global(&[("docs", "default", json!({"version": "1.0"}))]);
        assert_eq!(
            serde_json::to_value(&data).unwrap(),
            json!({"docs": {"default": {"version": "1.0"}}})
        );
    }
}
