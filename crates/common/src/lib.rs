//! Orangeface Common Utilities
//!
//! Shared infrastructure for all Orangeface crates:
//! - Error types and result aliases
//! - Frame pacing and throughput measurement
//! - Tracing/logging initialization
//! - Shared configuration sections and the config file location

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
