//! Prelude module - commonly used types for convenient import.
//!
//! Use `use plinth_plugins::prelude::*;` when writing a plugin.

// Errors
pub use crate::{BoxError, HookResult, PluginError, PluginResult};

// Plugin definition
pub use crate::{
    AllContentLoaded, ContentLoaded, GetTranslationFiles, LoadContent, Plugin, TranslateContent,
    TranslateThemeConfig,
};

// Hook inputs and outputs
pub use crate::{AllContent, PluginActions, RouteConfig, TranslationFile, TranslationMessage};

// Identification
pub use crate::{Identified, PluginIdentifier};
