//! Plugin identifiers and lookup.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PluginError, PluginResult};

/// The instance id used when a plugin is registered only once.
pub const DEFAULT_PLUGIN_ID: &str = "default";

/// Identifies one plugin instance: its name plus the instance id that
/// disambiguates several registrations of the same plugin.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PluginIdentifier {
    /// Plugin name, shared by all instances of the plugin.
    pub name: String,
    /// Instance id, unique among instances sharing `name`.
    pub id: String,
}

impl PluginIdentifier {
    #[must_use]
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }

    /// Identifier for the single, default instance of a plugin.
    #[must_use]
    pub fn with_default_id(name: impl Into<String>) -> Self {
        Self::new(name, DEFAULT_PLUGIN_ID)
    }

    #[must_use]
    pub fn is_default_id(&self) -> bool {
        self.id == DEFAULT_PLUGIN_ID
    }

    fn matches(&self, name: &str, id: &str) -> bool {
        self.name == name && self.id == id
    }
}

impl fmt::Display for PluginIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.id)
    }
}

/// Anything that carries a plugin name and instance id.
pub trait Identified {
    /// The plugin name.
    fn name(&self) -> &str;

    /// The plugin instance id.
    fn id(&self) -> &str;

    /// The `(name, id)` pair as an owned identifier.
    fn identifier(&self) -> PluginIdentifier {
        PluginIdentifier::new(self.name(), self.id())
    }
}

/// Find the position of the plugin matching `identifier` exactly.
///
/// # Errors
///
/// Returns [`PluginError::NotFound`] if no plugin matches.
pub fn position_by_identifier<P: Identified>(
    plugins: &[P],
    identifier: &PluginIdentifier,
) -> PluginResult<usize> {
    plugins
        .iter()
        .position(|p| identifier.matches(p.name(), p.id()))
        .ok_or_else(|| PluginError::NotFound {
            identifier: identifier.clone(),
        })
}

/// Find the plugin matching `identifier` exactly.
///
/// # Errors
///
/// Returns [`PluginError::NotFound`] if no plugin matches.
pub fn find_by_identifier<'a, P: Identified>(
    plugins: &'a [P],
    identifier: &PluginIdentifier,
) -> PluginResult<&'a P> {
    let index = position_by_identifier(plugins, identifier)?;
    plugins.get(index).ok_or_else(|| PluginError::NotFound {
        identifier: identifier.clone(),
    })
}

/// Check that no two plugins share an identifier.
///
/// # Errors
///
/// Returns [`PluginError::DuplicateIdentifier`] naming the first repeated
/// identifier.
pub fn ensure_unique_identifiers<P: Identified>(plugins: &[P]) -> PluginResult<()> {
    let mut seen = std::collections::HashSet::with_capacity(plugins.len());
    for plugin in plugins {
        let identifier = plugin.identifier();
        if !seen.insert(identifier.clone()) {
            return Err(PluginError::DuplicateIdentifier { identifier });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str, &'static str);

    impl Identified for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn id(&self) -> &str {
            self.1
        }
    }

    fn collection() -> Vec<Named> {
        vec![
            Named("docs", "default"),
            Named("docs", "community"),
            Named("blog", "default"),
        ]
    }

    #[test]
    fn test_display() {
        assert_eq!(
            PluginIdentifier::with_default_id("docs").to_string(),
            "docs@default"
        );
    }

    #[test]
    fn test_find_exact_instance() {
        let plugins = collection();
        let found =
            find_by_identifier(&plugins, &PluginIdentifier::new("docs", "community")).unwrap();
        assert_eq!((found.0, found.1), ("docs", "community"));
        assert_eq!(
            position_by_identifier(&plugins, &PluginIdentifier::new("blog", "default")).unwrap(),
            2
        );
    }

    #[test]
    fn test_find_requires_both_parts() {
        let plugins = collection();
        let err = find_by_identifier(&plugins, &PluginIdentifier::new("blog", "community"))
            .err()
            .unwrap();
        assert!(matches!(err, PluginError::NotFound { .. }));
        assert!(err.to_string().contains("blog@community"));
    }

    #[test]
    fn test_unique_identifiers() {
        assert!(ensure_unique_identifiers(&collection()).is_ok());

        let mut plugins = collection();
        plugins.push(Named("docs", "community"));
        let err = ensure_unique_identifiers(&plugins).unwrap_err();
        assert!(matches!(
            err,
            PluginError::DuplicateIdentifier { ref identifier }
                if identifier == &PluginIdentifier::new("docs", "community")
        ));
    }
}
