//! Ordered views over a buffer's messages
//!
//! Every view copies the retained messages under the read lock and sorts the
//! copy; the buffer's own order is never touched. All sorts are stable, so
//! messages with equal keys stay in insertion order.

use std::fmt;
use std::str::FromStr;

use crate::error::{BufferError, Result};

use super::buffer::LogBuffer;
use super::message::Message;

/// Criterion for [`LogBuffer::sorted_by`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortBy {
    /// Ascending by creation time
    Time,
    /// Ascending by severity
    Level,
    /// Ascending lexicographic by call site
    CallSite,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Time => "time",
            SortBy::Level => "level",
            SortBy::CallSite => "call-site",
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortBy {
    type Err = BufferError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "time" => Ok(SortBy::Time),
            "level" => Ok(SortBy::Level),
            "call-site" | "callsite" | "call_site" | "function" => Ok(SortBy::CallSite),
            other => Err(BufferError::InvalidArgument(format!(
                "unknown sort criterion '{}' (expected time, level or call-site)",
                other
            ))),
        }
    }
}

/// Numeric criterion codes used by older snapshot viewers
impl TryFrom<u8> for SortBy {
    type Error = BufferError;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(SortBy::CallSite),
            1 => Ok(SortBy::Level),
            2 => Ok(SortBy::Time),
            other => Err(BufferError::InvalidArgument(format!(
                "unknown sort criterion code {}",
                other
            ))),
        }
    }
}

impl LogBuffer {
    /// Messages ordered by timestamp
    pub fn by_time(&self) -> Vec<Message> {
        let mut messages = self.messages();
        messages.sort_by_key(Message::timestamp);
        messages
    }

    /// Messages ordered by severity, least severe first
    pub fn by_level(&self) -> Vec<Message> {
        let mut messages = self.messages();
        messages.sort_by_key(Message::level);
        messages
    }

    /// Messages ordered by call site
    pub fn by_call_site(&self) -> Vec<Message> {
        let mut messages = self.messages();
        messages.sort_by(|a, b| a.call_site().cmp(b.call_site()));
        messages
    }

    /// Messages ordered by the given criterion
    pub fn sorted_by(&self, criterion: SortBy) -> Vec<Message> {
        match criterion {
            SortBy::Time => self.by_time(),
            SortBy::Level => self.by_level(),
            SortBy::CallSite => self.by_call_site(),
        }
    }

    /// Messages ordered by a criterion given by name
    pub fn sorted_by_name(&self, criterion: &str) -> Result<Vec<Message>> {
        Ok(self.sorted_by(criterion.parse()?))
    }
}
