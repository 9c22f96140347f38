//! layerlog - capacity-bounded in-process log buffer
//!
//! Records messages with severity, timestamp and call site, evicts the oldest
//! entries past a configured capacity, optionally collapses duplicates, and
//! offers stable sorted views plus durable snapshots.

pub mod config;
pub mod error;
pub mod logging;

pub use config::BufferConfig;
pub use error::{BufferError, Result};
pub use logging::{CallSite, Level, LogBuffer, LogSink, Message, SortBy};
