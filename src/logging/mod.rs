//! Logging system for layerlog
//!
//! Provides the capacity-bounded message buffer, ordered views over it,
//! snapshot persistence and mirroring of messages to a sink.

mod buffer;
mod macros;
mod message;
mod sink;
mod snapshot;
mod sort;
mod subscriber;

pub use buffer::{LogBuffer, RESET_MESSAGE};
#[doc(hidden)]
pub use message::function_from_type_name;
pub use message::{CallSite, Level, Message};
pub use sink::{LogSink, TracingSink};
pub use snapshot::{
    default_snapshot_path, load_from_disk, snapshot_path_in, SNAPSHOT_EXTENSION, SNAPSHOT_FORMAT,
    SNAPSHOT_VERSION,
};
pub use sort::SortBy;
pub use subscriber::{env_filter, init_console_logging, DEFAULT_DIRECTIVE};
