//! Prelude module - commonly used test utilities.
//!
//! Use `use plinth_test::prelude::*;` in test modules.

pub use crate::{
    LocalizeCall, RecordingLocalizer, ScriptedPlugin, TestSite, init_test_logging,
    test_site_config,
};
