//! Snapshot persistence for log buffers
//!
//! A snapshot captures a buffer's configuration and every retained message so
//! that a new buffer can be reconstructed with identical contents and order.
//!
//! # File Format
//!
//! Snapshots are versioned JSON documents:
//!
//! ```text
//! {
//!   "format": "layerlog-snapshot",
//!   "version": 1,
//!   "config": { "name": ..., "max_capacity": ..., "dedup": ..., "verbosity": ... },
//!   "messages": [ { "content": ..., "level": ..., "timestamp": ..., "call_site": ... }, ... ]
//! }
//! ```
//!
//! Auto-generated snapshot files are named `YYYYMMDD_HHMMSS.llog` in the system
//! temporary directory.

use std::collections::{HashSet, VecDeque};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::config::BufferConfig;
use crate::error::{BufferError, Result};

use super::buffer::LogBuffer;
use super::message::{CallSite, Level, Message};

/// Format tag written into every snapshot
pub const SNAPSHOT_FORMAT: &str = "layerlog-snapshot";

/// Current snapshot schema version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Extension used for auto-generated snapshot files
pub const SNAPSHOT_EXTENSION: &str = "llog";

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    format: String,
    version: u32,
    config: BufferConfig,
    messages: Vec<Message>,
}

impl Snapshot {
    fn validate(&self) -> Result<()> {
        if self.format != SNAPSHOT_FORMAT {
            return Err(BufferError::CorruptData(format!(
                "unexpected format tag '{}'",
                self.format
            )));
        }
        if self.version != SNAPSHOT_VERSION {
            return Err(BufferError::CorruptData(format!(
                "unsupported snapshot version {}",
                self.version
            )));
        }
        if self.config.is_bounded() && self.messages.len() > self.config.max_capacity {
            return Err(BufferError::CorruptData(format!(
                "{} messages exceed capacity {}",
                self.messages.len(),
                self.config.max_capacity
            )));
        }
        if self.config.dedup {
            let mut seen = HashSet::with_capacity(self.messages.len());
            for message in &self.messages {
                if !seen.insert(message.content()) {
                    return Err(BufferError::CorruptData(format!(
                        "duplicate message '{}' in dedup snapshot",
                        message.content()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Generate a timestamped snapshot path in the system temporary directory
pub fn default_snapshot_path() -> PathBuf {
    snapshot_path_in(&std::env::temp_dir())
}

/// Generate a timestamped snapshot path inside `dir`
pub fn snapshot_path_in(dir: &Path) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("{}.{}", timestamp, SNAPSHOT_EXTENSION))
}

impl LogBuffer {
    /// Encode the buffer's full state
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let snapshot = {
            let inner = self.read();
            Snapshot {
                format: SNAPSHOT_FORMAT.to_string(),
                version: SNAPSHOT_VERSION,
                config: inner.config.clone(),
                messages: inner.messages.iter().cloned().collect(),
            }
        };
        serde_json::to_vec(&snapshot).map_err(|e| BufferError::Serialization(e.to_string()))
    }

    /// Reconstruct a buffer from bytes produced by [`LogBuffer::serialize`]
    ///
    /// The restored buffer mirrors to a fresh [`TracingSink`](super::TracingSink);
    /// sinks are not part of a snapshot.
    pub fn restore(bytes: &[u8]) -> Result<Self> {
        let snapshot: Snapshot =
            serde_json::from_slice(bytes).map_err(|e| BufferError::CorruptData(e.to_string()))?;
        snapshot.validate()?;

        let messages: VecDeque<Message> = snapshot.messages.into();
        Ok(LogBuffer::from_parts(snapshot.config, messages))
    }

    /// Write a snapshot to `path`, or to a timestamped file in the temp directory
    ///
    /// The file is created exclusively; an existing file is never overwritten.
    /// A message recording the write is logged before encoding, so it is part
    /// of the snapshot. If the write fails that message is taken back and the
    /// partial file removed. Returns the path written.
    #[track_caller]
    pub fn save_to_disk(&self, path: Option<&Path>) -> Result<PathBuf> {
        let call_site = CallSite::caller();
        let path = path.map(Path::to_path_buf).unwrap_or_else(default_snapshot_path);

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| BufferError::io(&path, e))?;

        if let Err(e) = self.write_snapshot(call_site, &path, &mut file) {
            drop(file);
            if let Err(cleanup) = fs::remove_file(&path) {
                tracing::warn!(
                    "Failed to remove partial snapshot {}: {}",
                    path.display(),
                    cleanup
                );
            }
            return Err(e);
        }

        tracing::debug!(buffer = %self.name(), "Saved snapshot to {}", path.display());
        Ok(path)
    }

    /// Log the write notice, then encode into `writer`; undo the notice on failure
    fn write_snapshot<W: Write>(
        &self,
        call_site: CallSite,
        path: &Path,
        writer: &mut W,
    ) -> Result<()> {
        let checkpoint = self.log_undoable(
            call_site,
            format!("LogBuffer: serializing and writing to path -- {}", path.display()),
            Level::Info,
        );

        let written = self.serialize().and_then(|bytes| {
            writer
                .write_all(&bytes)
                .and_then(|()| writer.flush())
                .map_err(|e| BufferError::io(path, e))
        });

        if written.is_err() {
            self.rollback(checkpoint);
        }
        written
    }

    /// Read a snapshot file and reconstruct the buffer it describes
    pub fn load_from_disk(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| BufferError::io(path, e))?;
        let buffer = Self::restore(&bytes)?;
        tracing::debug!(
            buffer = %buffer.name(),
            messages = buffer.len(),
            "Loaded snapshot from {}",
            path.display()
        );
        Ok(buffer)
    }
}

/// Read a snapshot file and reconstruct the buffer it describes
pub fn load_from_disk(path: impl AsRef<Path>) -> Result<LogBuffer> {
    LogBuffer::load_from_disk(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_buffer() -> LogBuffer {
        let buffer = LogBuffer::with_config(
            BufferConfig::named("snapshot")
                .with_max_capacity(5)
                .with_dedup(true)
                .with_verbosity(Level::Warning),
        )
        .without_sink();
        buffer.log_at(CallSite::new("start"), "booting", Level::Info);
        buffer.log_at(CallSite::new("sample"), "sensor flaky", Level::Warning);
        buffer.log_at(CallSite::new("sample"), "", Level::Debug);
        buffer.log_at(CallSite::new("halt"), "fatal: überhitzt", Level::Critical);
        buffer
    }

    #[test]
    fn test_serialize_restore_round_trip() {
        let buffer = sample_buffer();

        let restored = LogBuffer::restore(&buffer.serialize().unwrap()).unwrap();

        assert_eq!(restored.messages(), buffer.messages());
        assert_eq!(restored.config(), buffer.config());
        assert_eq!(restored.name(), "snapshot");
        assert_eq!(restored.max_capacity(), 5);
        assert!(restored.dedup());
    }

    #[test]
    fn test_restored_buffer_keeps_policies() {
        let restored = LogBuffer::restore(&sample_buffer().serialize().unwrap()).unwrap();

        restored.info("booting");
        restored.info("one");
        restored.info("two");

        let contents: Vec<String> = restored
            .messages()
            .iter()
            .map(|m| m.content().to_string())
            .collect();
        assert_eq!(contents, vec!["", "fatal: überhitzt", "booting", "one", "two"]);
    }

    #[test]
    fn test_restore_garbage_is_corrupt() {
        let err = LogBuffer::restore(b"\x00\x01not json").unwrap_err();
        assert!(matches!(err, BufferError::CorruptData(_)));
    }

    #[test]
    fn test_restore_wrong_format_is_corrupt() {
        let json = br#"{"format":"other","version":1,"config":{},"messages":[]}"#;
        let err = LogBuffer::restore(json).unwrap_err();
        assert!(matches!(err, BufferError::CorruptData(_)));
    }

    #[test]
    fn test_restore_future_version_is_corrupt() {
        let json = br#"{"format":"layerlog-snapshot","version":99,"config":{},"messages":[]}"#;
        let err = LogBuffer::restore(json).unwrap_err();
        assert!(matches!(err, BufferError::CorruptData(_)));
    }

    #[test]
    fn test_restore_over_capacity_is_corrupt() {
        let buffer = LogBuffer::with_config(BufferConfig::named("big").with_max_capacity(0))
            .without_sink();
        for i in 0..4 {
            buffer.info(i.to_string());
        }
        let mut value: serde_json::Value =
            serde_json::from_slice(&buffer.serialize().unwrap()).unwrap();
        value["config"]["max_capacity"] = serde_json::json!(2);

        let err = LogBuffer::restore(value.to_string().as_bytes()).unwrap_err();
        assert!(matches!(err, BufferError::CorruptData(_)));
    }

    #[test]
    fn test_restore_duplicates_in_dedup_snapshot_is_corrupt() {
        let buffer = LogBuffer::with_config(BufferConfig::named("dup")).without_sink();
        buffer.info("same");
        buffer.info("same");
        let mut value: serde_json::Value =
            serde_json::from_slice(&buffer.serialize().unwrap()).unwrap();
        value["config"]["dedup"] = serde_json::json!(true);

        let err = LogBuffer::restore(value.to_string().as_bytes()).unwrap_err();
        assert!(matches!(err, BufferError::CorruptData(_)));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("run.llog");
        let buffer = sample_buffer();

        let written = buffer.save_to_disk(Some(&path)).unwrap();
        assert_eq!(written, path);

        // The write notice is logged before encoding, so it is persisted too
        let last = buffer.messages().last().cloned().unwrap();
        assert!(last.content().contains("serializing and writing to path"));
        assert!(last.content().contains("run.llog"));

        let loaded = load_from_disk(&path).unwrap();
        assert_eq!(loaded.messages(), buffer.messages());
        assert_eq!(loaded.config(), buffer.config());
    }

    /// Writer that fails like a full disk
    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("No space left on device"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_write_keeps_full_buffer_intact() {
        let buffer = LogBuffer::with_config(BufferConfig::named("full").with_max_capacity(3))
            .without_sink();
        for i in 0..3 {
            buffer.info(i.to_string());
        }
        let before = buffer.messages();

        let err = buffer
            .write_snapshot(CallSite::new("save"), Path::new("/tmp/full.llog"), &mut FullDisk)
            .unwrap_err();

        assert!(matches!(err, BufferError::Io { .. }));
        assert_eq!(buffer.messages(), before);
        assert_eq!(buffer.messages()[0].content(), "0");
    }

    #[test]
    fn test_failed_write_keeps_dedup_order() {
        let buffer = LogBuffer::with_config(BufferConfig::named("dedup").with_dedup(true))
            .without_sink();
        let notice = "LogBuffer: serializing and writing to path -- /tmp/full.llog";
        buffer.info(notice);
        buffer.info("after");
        let before = buffer.messages();

        assert!(buffer
            .write_snapshot(CallSite::new("save"), Path::new("/tmp/full.llog"), &mut FullDisk)
            .is_err());

        assert_eq!(buffer.messages(), before);
    }

    #[test]
    fn test_successful_write_keeps_notice() {
        let buffer = sample_buffer();
        let mut bytes = Vec::new();

        buffer
            .write_snapshot(CallSite::new("save"), Path::new("mem.llog"), &mut bytes)
            .unwrap();

        let restored = LogBuffer::restore(&bytes).unwrap();
        assert_eq!(restored.messages(), buffer.messages());
        assert!(restored.messages().last().unwrap().content().contains("mem.llog"));
    }

    #[test]
    fn test_save_never_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("taken.llog");
        fs::write(&path, b"keep me").unwrap();
        let buffer = sample_buffer();
        let before = buffer.messages();

        let err = buffer.save_to_disk(Some(&path)).unwrap_err();

        assert!(matches!(err, BufferError::Io { .. }));
        assert_eq!(fs::read(&path).unwrap(), b"keep me");
        assert_eq!(buffer.messages(), before);
    }

    #[test]
    fn test_save_to_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("run.llog");
        let buffer = sample_buffer();
        let before = buffer.messages();

        let err = buffer.save_to_disk(Some(&path)).unwrap_err();

        assert!(matches!(err, BufferError::Io { .. }));
        assert_eq!(buffer.messages(), before);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = load_from_disk(temp_dir.path().join("absent.llog")).unwrap_err();
        assert!(matches!(err, BufferError::Io { .. }));
    }

    #[test]
    fn test_load_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.llog");
        fs::write(&path, b"{\"format\":").unwrap();

        let err = load_from_disk(&path).unwrap_err();
        assert!(matches!(err, BufferError::CorruptData(_)));
    }

    #[test]
    fn test_snapshot_path_in() {
        let dir = PathBuf::from("/tmp/layerlog");
        let path = snapshot_path_in(&dir);
        let name = path.file_name().unwrap().to_string_lossy().to_string();

        assert!(path.starts_with(&dir));
        assert!(name.ends_with(".llog"));
        // YYYYMMDD_HHMMSS.llog
        assert_eq!(name.len(), 20);
        assert_eq!(name.as_bytes()[8], b'_');
    }

    #[test]
    fn test_default_snapshot_path_uses_temp_dir() {
        assert!(default_snapshot_path().starts_with(std::env::temp_dir()));
    }
}
