#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Site configuration for the Plinth static site generator.
//!
//! This crate provides a single [`SiteConfig`] type describing a site: its
//! URLs, theme configuration, locales, generated-file locations, plugin
//! pipeline settings and logging.
//!
//! # Usage
//!
//! ```rust,no_run
//! use plinth_config::SiteConfig;
//!
//! let site_dir = std::path::Path::new(".");
//! let config = SiteConfig::load(site_dir).unwrap();
//! println!("Building {} in {}", config.title, config.current_locale());
//! ```
//!
//! # Configuration Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Environment variables** (`PLINTH_BASE_URL`, `PLINTH_LOCALE`)
//! 2. **Site** (`{site}/plinth.toml`)
//! 3. **Embedded defaults** (`defaults.toml` compiled into binary)

/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// Layered configuration merging.
pub mod merge;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

// Re-export primary types at the crate root.
pub use error::{ConfigError, ConfigResult};
pub use types::*;

impl SiteConfig {
    /// Load the configuration of the site in `site_dir`.
    ///
    /// See [`loader::load`] for the full algorithm.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `plinth.toml` is malformed or the final
    /// configuration fails validation.
    pub fn load(site_dir: &std::path::Path) -> ConfigResult<Self> {
        loader::load(site_dir)
    }
}
