use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::identifier::PluginIdentifier;
use crate::plugin::LifecycleHook;

/// Error type returned by plugin-authored hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type returned by plugin-authored hooks.
pub type HookResult<T> = Result<T, BoxError>;

/// Errors that can occur while driving plugins through their lifecycle.
#[derive(Debug, Error)]
pub enum PluginError {
    /// No plugin in the collection matches the identifier.
    #[error("Plugin not found for identifier {identifier}")]
    NotFound {
        /// The identifier that failed to resolve.
        identifier: PluginIdentifier,
    },

    /// Two plugins in one collection share the same identifier.
    #[error("Duplicate plugin identifier {identifier}")]
    DuplicateIdentifier {
        /// The identifier registered more than once.
        identifier: PluginIdentifier,
    },

    /// A plugin hook returned an error.
    #[error("Plugin {identifier} failed in {hook}: {source}")]
    HookFailed {
        /// The plugin whose hook failed.
        identifier: PluginIdentifier,
        /// The hook that failed.
        hook: LifecycleHook,
        /// The error raised by the plugin.
        #[source]
        source: BoxError,
    },

    /// Localizing one of a plugin's translation files failed.
    #[error("Plugin {identifier} failed to localize translation file {path}: {source}")]
    Localization {
        /// The plugin owning the translation file.
        identifier: PluginIdentifier,
        /// Relative path of the translation file.
        path: String,
        /// The localizer error.
        #[source]
        source: BoxError,
    },

    /// A hook did not complete within the configured timeout.
    #[error("Plugin {identifier} timed out in {hook} after {timeout:?}")]
    HookTimedOut {
        /// The plugin whose hook hung.
        identifier: PluginIdentifier,
        /// The hook that hung.
        hook: LifecycleHook,
        /// The configured timeout.
        timeout: Duration,
    },

    /// Writing generated data failed.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Re-reading the site configuration for a site reload failed.
    #[error("Failed to load site configuration: {source}")]
    Config {
        #[source]
        source: plinth_config::ConfigError,
    },
}

impl PluginError {
    /// The identifier of the plugin this error is attributed to, if any.
    #[must_use]
    pub fn identifier(&self) -> Option<&PluginIdentifier> {
        match self {
            Self::NotFound { identifier }
            | Self::DuplicateIdentifier { identifier }
            | Self::HookFailed { identifier, .. }
            | Self::Localization { identifier, .. }
            | Self::HookTimedOut { identifier, .. } => Some(identifier),
            Self::Io { .. } | Self::Config { .. } => None,
        }
    }
}

/// A specialized Result type for plugin lifecycle operations.
pub type PluginResult<T> = Result<T, PluginError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_not_found_mentions_identifier() {
        let err = PluginError::NotFound {
            identifier: PluginIdentifier::new("docs", "default"),
        };
        assert_eq!(
            err.to_string(),
            "Plugin not found for identifier docs@default"
        );
    }

    #[test]
    fn test_hook_failure_chains_source() {
        let err = PluginError::HookFailed {
            identifier: PluginIdentifier::new("blog", "community"),
            hook: LifecycleHook::ContentLoaded,
            source: "boom".into(),
        };
        let display = err.to_string();
        assert!(display.contains("blog@community"));
        assert!(display.contains("contentLoaded"));
        assert_eq!(err.source().unwrap().to_string(), "boom");
        assert_eq!(
            err.identifier(),
            Some(&PluginIdentifier::new("blog", "community"))
        );
    }
}
