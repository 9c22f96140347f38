//! Pass-through notification of logged messages
//!
//! A sink is told about every message whose level meets the buffer's verbosity
//! threshold. It never influences retention or ordering.

use super::message::Level;

/// Receiver for mirrored log messages
///
/// Invoked synchronously from the logging call, after the message has been
/// stored. Implementations cannot report errors back into the logger.
pub trait LogSink: Send + Sync {
    fn notify(&self, content: &str, level: Level);
}

impl<F> LogSink for F
where
    F: Fn(&str, Level) + Send + Sync,
{
    fn notify(&self, content: &str, level: Level) {
        self(content, level)
    }
}

/// Sink that re-emits messages as `tracing` events
///
/// Events use the `layerlog::mirror` target and carry the buffer name as a
/// field, so a subscriber's filter decides where they end up.
#[derive(Debug, Clone)]
pub struct TracingSink {
    buffer: String,
}

impl TracingSink {
    pub fn new(buffer: impl Into<String>) -> Self {
        Self {
            buffer: buffer.into(),
        }
    }
}

impl LogSink for TracingSink {
    fn notify(&self, content: &str, level: Level) {
        let buffer = self.buffer.as_str();
        match level {
            Level::Debug => tracing::debug!(target: "layerlog::mirror", buffer, "{}", content),
            Level::Info => tracing::info!(target: "layerlog::mirror", buffer, "{}", content),
            Level::Warning => tracing::warn!(target: "layerlog::mirror", buffer, "{}", content),
            Level::Critical => tracing::error!(target: "layerlog::mirror", buffer, "{}", content),
        }
    }
}
