//! Immutable log messages
//!
//! A [`Message`] records one logged event: its text, severity, creation time and
//! the call site that produced it.

use std::fmt;
use std::panic::Location;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BufferError;

/// Message severity, ordered from least to most severe
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    #[default]
    Info,
    Warning,
    Critical,
}

impl Level {
    /// All levels in ascending severity
    pub const ALL: [Level; 4] = [Level::Debug, Level::Info, Level::Warning, Level::Critical];

    /// Get the display name for this level
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Critical => "CRITICAL",
        }
    }

    /// Check if this level is a warning or critical
    pub fn is_alert(&self) -> bool {
        matches!(self, Level::Warning | Level::Critical)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Level {
    type Err = BufferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warning),
            "critical" => Ok(Level::Critical),
            other => Err(BufferError::InvalidArgument(format!(
                "unknown level '{}' (expected debug, info, warning or critical)",
                other
            ))),
        }
    }
}

/// Identity of the code location that invoked a logging operation
///
/// Either a bare function name (injected by the logging macros), an explicit
/// caller-supplied identifier, or a `file:line` location captured through
/// `#[track_caller]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallSite(String);

impl CallSite {
    /// Create a call site from an explicit identifier
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Capture the source location of the caller
    ///
    /// The result is a plain `file:line` string, so it sorts lexicographically:
    /// `a.rs:100` comes before `a.rs:20`.
    ///
    /// Every public logging method is `#[track_caller]`, so the location resolves
    /// to the first frame outside the buffer regardless of how many wrappers sit
    /// in between.
    #[track_caller]
    pub fn caller() -> Self {
        Self::from_location(Location::caller())
    }

    /// Build a call site from a source location
    pub fn from_location(location: &Location<'_>) -> Self {
        Self(format!("{}:{}", location.file(), location.line()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for CallSite {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for CallSite {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Reduce a `type_name` path of a function-local item to the enclosing function name
///
/// `my_crate::module::nested::__here` becomes `nested`; closure segments are
/// skipped so a log call inside a closure is attributed to the function that
/// defines it.
#[doc(hidden)]
pub fn function_from_type_name(path: &'static str) -> &'static str {
    let mut path = path.strip_suffix("::__here").unwrap_or(path);
    while let Some(outer) = path.strip_suffix("::{{closure}}") {
        path = outer;
    }
    path.rsplit("::").next().unwrap_or(path)
}

/// A single logged event
///
/// Messages are immutable once created. Equality compares every field; the
/// buffer's dedup policy uses [`Message::same_content`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    content: String,
    level: Level,
    timestamp: DateTime<Utc>,
    call_site: CallSite,
}

impl Message {
    /// Create a message stamped with the current time
    pub fn new(content: impl Into<String>, level: Level, call_site: CallSite) -> Self {
        Self::at(Utc::now(), content, level, call_site)
    }

    /// Create a message with an explicit timestamp
    pub fn at(
        timestamp: DateTime<Utc>,
        content: impl Into<String>,
        level: Level,
        call_site: CallSite,
    ) -> Self {
        Self {
            content: content.into(),
            level,
            timestamp,
            call_site,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn call_site(&self) -> &CallSite {
        &self.call_site
    }

    /// Dedup equality: two messages are the same event when their text matches
    pub fn same_content(&self, other: &Message) -> bool {
        self.content == other.content
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {}: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.call_site,
            self.level,
            self.content
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warning);
        assert!(Level::Warning < Level::Critical);
        assert_eq!(Level::default(), Level::Info);
    }

    #[test]
    fn test_level_is_alert() {
        assert!(!Level::Debug.is_alert());
        assert!(!Level::Info.is_alert());
        assert!(Level::Warning.is_alert());
        assert!(Level::Critical.is_alert());
    }

    #[test]
    fn test_level_from_str() {
        assert_eq!("debug".parse::<Level>().unwrap(), Level::Debug);
        assert_eq!("INFO".parse::<Level>().unwrap(), Level::Info);
        assert_eq!("warn".parse::<Level>().unwrap(), Level::Warning);
        assert_eq!(" Critical ".parse::<Level>().unwrap(), Level::Critical);
        assert!(matches!(
            "fatal".parse::<Level>(),
            Err(BufferError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_call_site_caller_points_here() {
        let site = CallSite::caller();
        assert!(site.as_str().starts_with(file!()), "got {}", site);
    }

    #[test]
    fn test_function_from_type_name() {
        assert_eq!(
            function_from_type_name("layerlog::logging::tests::nested::__here"),
            "nested"
        );
        assert_eq!(
            function_from_type_name("layerlog::worker::run::{{closure}}::{{closure}}::__here"),
            "run"
        );
        assert_eq!(function_from_type_name("main::__here"), "main");
    }

    #[test]
    fn test_same_content_ignores_other_fields() {
        let a = Message::new("same", Level::Debug, CallSite::new("a"));
        let b = Message::new("same", Level::Critical, CallSite::new("b"));
        let c = Message::new("other", Level::Debug, CallSite::new("a"));
        assert!(a.same_content(&b));
        assert!(!a.same_content(&c));
        assert_ne!(a, b);
    }

    #[test]
    fn test_message_display() {
        let message = Message::new("disk almost full", Level::Warning, CallSite::new("check"));
        let rendered = message.to_string();
        assert!(rendered.ends_with("| check | WARNING: disk almost full"));
    }
}
