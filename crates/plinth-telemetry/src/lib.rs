//! Plinth Telemetry - logging setup for hosts embedding the Plinth plugin
//! pipeline.
//!
//! The pipeline emits `tracing` spans and events (including the
//! `plinth.perf` section timings). This crate installs a subscriber that
//! renders them.
//!
//! # Example
//!
//! ```rust,no_run
//! use plinth_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), plinth_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("plinth_plugins=debug");
//!
//! setup_logging(&config)?;
//! tracing::info!("Starting build");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget, setup_default_logging,
    setup_logging,
};
