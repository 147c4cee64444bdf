//! Plinth Test - Shared test utilities for the Plinth plugin pipeline.
//!
//! This crate provides scripted plugins, a recording localizer and context
//! fixtures that can be used across Plinth crates as a dev-dependency.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use plinth_plugins::{LifecycleHook, RouteConfig};
//! use plinth_test::{ScriptedPlugin, TestSite};
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_docs_routes() {
//!     let docs = Arc::new(
//!         ScriptedPlugin::new("docs")
//!             .with_content(json!({"docs": ["intro"]}))
//!             .with_content_loaded(|_, actions| {
//!                 actions.add_route(RouteConfig::new("/docs/intro", "DocPage"));
//!                 Ok(())
//!             }),
//!     );
//!
//!     let site = TestSite::new();
//!     let result = site.pipeline(vec![docs.clone()]).load_plugins(&site.context()).await.unwrap();
//!
//!     assert_eq!(result.routes.len(), 1);
//!     assert_eq!(docs.call_count(LifecycleHook::LoadContent), 1);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod localizer;
pub mod scripted;

pub use fixtures::*;
pub use localizer::*;
pub use scripted::*;
