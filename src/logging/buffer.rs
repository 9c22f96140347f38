//! In-memory log buffer
//!
//! Provides a thread-safe, capacity-bounded buffer that records messages in
//! insertion order, evicts the oldest entry when full and optionally keeps only
//! the most recent occurrence of each distinct message.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use crate::config::BufferConfig;

use super::message::{CallSite, Level, Message};
use super::sink::{LogSink, TracingSink};

/// Content of the entry recorded by [`LogBuffer::reset`]
pub const RESET_MESSAGE: &str = "LogBuffer reset, logs erased";

/// State guarded by the buffer lock
#[derive(Debug)]
pub(super) struct Inner {
    pub(super) messages: VecDeque<Message>,
    pub(super) config: BufferConfig,
    /// Latest timestamp handed out, kept across eviction and reset
    last_timestamp: Option<DateTime<Utc>>,
    /// Bumped on every change to `messages`
    generation: u64,
}

impl Inner {
    fn new(config: BufferConfig, messages: VecDeque<Message>) -> Self {
        let last_timestamp = messages.back().map(Message::timestamp);
        Self {
            messages,
            config,
            last_timestamp,
            generation: 0,
        }
    }

    /// Current time, never earlier than the previous message
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let timestamp = match self.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_timestamp = Some(timestamp);
        timestamp
    }

    /// Stamp and append a message; returns whether it should be mirrored
    fn record(&mut self, call_site: CallSite, content: String, level: Level) -> bool {
        let timestamp = self.next_timestamp();
        let mirror = level >= self.config.verbosity;
        self.append(Message::at(timestamp, content, level, call_site));
        mirror
    }

    fn append(&mut self, message: Message) {
        self.generation += 1;
        if self.config.dedup {
            if let Some(pos) = self.messages.iter().position(|m| m.same_content(&message)) {
                self.messages.remove(pos);
            }
        }
        self.messages.push_back(message);
        self.enforce_capacity();
    }

    /// Evict from the head until the capacity invariant holds; returns evicted count
    fn enforce_capacity(&mut self) -> usize {
        let mut evicted = 0;
        if self.config.is_bounded() {
            while self.messages.len() > self.config.max_capacity {
                self.messages.pop_front();
                self.generation += 1;
                evicted += 1;
            }
        }
        evicted
    }

    /// Drop earlier duplicates so each content appears once, at its latest position
    fn collapse_duplicates(&mut self) -> usize {
        let before = self.messages.len();
        let mut seen = HashSet::with_capacity(before);
        let mut kept: VecDeque<Message> = VecDeque::with_capacity(before);
        for message in self.messages.drain(..).rev() {
            if seen.insert(message.content().to_string()) {
                kept.push_front(message);
            }
        }
        self.messages = kept;
        self.generation += 1;
        before - self.messages.len()
    }
}

/// Buffer state captured before an undoable append
#[derive(Debug)]
pub(super) struct Checkpoint {
    messages: VecDeque<Message>,
    last_timestamp: Option<DateTime<Utc>>,
    /// Generation right after the undoable append
    generation: u64,
}

/// Thread-safe, capacity-bounded buffer of log messages
///
/// All mutating operations take a single write lock, views take the read lock
/// for the duration of their copy. Logging never fails: a poisoned lock is
/// recovered rather than surfaced.
pub struct LogBuffer {
    inner: RwLock<Inner>,
    /// Receives messages at or above the configured verbosity
    sink: Option<Arc<dyn LogSink>>,
}

impl LogBuffer {
    /// Create an empty buffer with default settings
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(BufferConfig::named(name))
    }

    /// Create an empty buffer mirroring to a [`TracingSink`]
    pub fn with_config(config: BufferConfig) -> Self {
        Self::from_parts(config, VecDeque::new())
    }

    /// Build a buffer around already-retained messages
    pub(super) fn from_parts(config: BufferConfig, messages: VecDeque<Message>) -> Self {
        let sink: Arc<dyn LogSink> = Arc::new(TracingSink::new(config.name.clone()));
        Self {
            inner: RwLock::new(Inner::new(config, messages)),
            sink: Some(sink),
        }
    }

    /// Replace the sink that mirrored messages are sent to
    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Disable mirroring entirely
    pub fn without_sink(mut self) -> Self {
        self.sink = None;
        self
    }

    pub(super) fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a message at the given level, attributed to the caller's location
    ///
    /// The call site is the caller's `file:line`. Use the `log_*!` macros to
    /// attribute messages to the enclosing function name instead; `file:line`
    /// call sites sort lexicographically, so `a.rs:100` orders before `a.rs:20`.
    #[track_caller]
    pub fn log(&self, content: impl Into<String>, level: Level) {
        self.log_at(CallSite::caller(), content, level);
    }

    /// Record a message with an explicit call site
    ///
    /// Applies the dedup policy, appends at the tail, evicts from the head when
    /// over capacity, then notifies the sink if the level meets the verbosity
    /// threshold.
    pub fn log_at(&self, call_site: CallSite, content: impl Into<String>, level: Level) {
        let content = content.into();
        let mirror = self.write().record(call_site, content.clone(), level);
        if mirror {
            self.notify(&content, level);
        }
    }

    fn notify(&self, content: &str, level: Level) {
        if let Some(sink) = &self.sink {
            sink.notify(content, level);
        }
    }

    #[track_caller]
    pub fn debug(&self, content: impl Into<String>) {
        self.log_at(CallSite::caller(), content, Level::Debug);
    }

    #[track_caller]
    pub fn info(&self, content: impl Into<String>) {
        self.log_at(CallSite::caller(), content, Level::Info);
    }

    #[track_caller]
    pub fn warn(&self, content: impl Into<String>) {
        self.log_at(CallSite::caller(), content, Level::Warning);
    }

    #[track_caller]
    pub fn critical(&self, content: impl Into<String>) {
        self.log_at(CallSite::caller(), content, Level::Critical);
    }

    /// Erase all messages, leaving a single entry that records the reset
    ///
    /// Capacity, dedup and verbosity settings are unaffected.
    #[track_caller]
    pub fn reset(&self) {
        let call_site = CallSite::caller();
        let mirror = {
            let mut inner = self.write();
            inner.messages.clear();
            inner.generation += 1;
            inner.record(call_site, RESET_MESSAGE.to_string(), Level::Info)
        };
        if mirror {
            self.notify(RESET_MESSAGE, Level::Info);
        }
    }

    /// Record a message that [`LogBuffer::rollback`] can take back
    ///
    /// The prior state is captured under the same lock as the append, so the
    /// checkpoint describes exactly what this message changed.
    pub(super) fn log_undoable(
        &self,
        call_site: CallSite,
        content: impl Into<String>,
        level: Level,
    ) -> Checkpoint {
        let content = content.into();
        let (mirror, checkpoint) = {
            let mut inner = self.write();
            let messages = inner.messages.clone();
            let last_timestamp = inner.last_timestamp;
            let mirror = inner.record(call_site, content.clone(), level);
            let checkpoint = Checkpoint {
                messages,
                last_timestamp,
                generation: inner.generation,
            };
            (mirror, checkpoint)
        };
        if mirror {
            self.notify(&content, level);
        }
        checkpoint
    }

    /// Undo the append behind `checkpoint`, restoring any message it evicted
    ///
    /// Returns false and leaves the buffer alone when other messages were
    /// recorded in the meantime.
    pub(super) fn rollback(&self, checkpoint: Checkpoint) -> bool {
        let mut inner = self.write();
        if inner.generation != checkpoint.generation {
            tracing::warn!(
                buffer = %inner.config.name,
                "Buffer changed since checkpoint, keeping current messages"
            );
            return false;
        }
        inner.messages = checkpoint.messages;
        inner.last_timestamp = checkpoint.last_timestamp;
        inner.generation += 1;
        true
    }

    /// Identifying name of this buffer
    pub fn name(&self) -> String {
        self.read().config.name.clone()
    }

    /// Get the number of retained messages
    pub fn len(&self) -> usize {
        self.read().messages.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get all retained messages in insertion order
    pub fn messages(&self) -> Vec<Message> {
        self.read().messages.iter().cloned().collect()
    }

    /// Get retained messages at or above a level, in insertion order
    pub fn at_or_above(&self, level: Level) -> Vec<Message> {
        self.read()
            .messages
            .iter()
            .filter(|m| m.level() >= level)
            .cloned()
            .collect()
    }

    /// Get a copy of the current configuration
    pub fn config(&self) -> BufferConfig {
        self.read().config.clone()
    }

    pub fn max_capacity(&self) -> usize {
        self.read().config.max_capacity
    }

    pub fn dedup(&self) -> bool {
        self.read().config.dedup
    }

    pub fn verbosity(&self) -> Level {
        self.read().config.verbosity
    }

    /// Change the capacity, evicting the oldest messages if the buffer is now over it
    pub fn set_max_capacity(&self, max_capacity: usize) {
        let mut inner = self.write();
        inner.config.max_capacity = max_capacity;
        let evicted = inner.enforce_capacity();
        if evicted > 0 {
            tracing::debug!(
                buffer = %inner.config.name,
                max_capacity,
                evicted,
                "Capacity lowered, evicted oldest messages"
            );
        }
    }

    /// Enable or disable dedup; enabling collapses existing duplicates
    pub fn set_dedup(&self, dedup: bool) {
        let mut inner = self.write();
        inner.config.dedup = dedup;
        if dedup {
            let removed = inner.collapse_duplicates();
            if removed > 0 {
                tracing::debug!(
                    buffer = %inner.config.name,
                    removed,
                    "Dedup enabled, collapsed duplicate messages"
                );
            }
        }
    }

    pub fn set_verbosity(&self, verbosity: Level) {
        self.write().config.verbosity = verbosity;
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::with_config(BufferConfig::default())
    }
}

impl fmt::Debug for LogBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.read();
        f.debug_struct("LogBuffer")
            .field("name", &inner.config.name)
            .field("len", &inner.messages.len())
            .field("max_capacity", &inner.config.max_capacity)
            .field("dedup", &inner.config.dedup)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}
