//! In-process remote store.
//!
//! Stands in for the shared copy in tests and offline sessions. Version
//! tokens are content hashes, so callers exercise the same token-comparison
//! path the real remote takes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::error::{Result, SitevetError};

use super::engine::content_hash;
use super::{RemoteRead, RemoteStore, WriteOutcome};

/// An in-memory remote copy of the dataset.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    content: Mutex<Option<String>>,
    offline: AtomicBool,
}

impl MemoryRemote {
    /// Create an empty remote (no shared copy yet).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a remote that already holds content.
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: Mutex::new(Some(content.into())),
            offline: AtomicBool::new(false),
        }
    }

    /// Simulate a transport outage: reads and writes fail until cleared.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Overwrite the remote copy out-of-band, as another session would.
    pub fn put_external(&self, content: impl Into<String>) {
        *self.content.lock().unwrap() = Some(content.into());
    }

    /// Current remote content, if any.
    pub fn content(&self) -> Option<String> {
        self.content.lock().unwrap().clone()
    }

    /// Current version token, if a copy exists.
    pub fn version(&self) -> Option<String> {
        self.content
            .lock()
            .unwrap()
            .as_deref()
            .map(content_hash)
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(SitevetError::Remote("remote unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

impl RemoteStore for MemoryRemote {
    fn read(&self) -> Result<RemoteRead> {
        self.check_online()?;
        Ok(match self.content.lock().unwrap().as_ref() {
            None => RemoteRead::Absent,
            Some(content) => RemoteRead::Present {
                content: content.clone(),
                version: content_hash(content),
            },
        })
    }

    fn write(
        &self,
        content: &str,
        expected_version: Option<&str>,
        _message: &str,
    ) -> Result<WriteOutcome> {
        self.check_online()?;
        let mut guard = self.content.lock().unwrap();
        let current_version = guard.as_deref().map(content_hash);

        let matches = match (&current_version, expected_version) {
            (None, None) => true,
            (Some(current), Some(expected)) => current == expected,
            _ => false,
        };

        if !matches {
            return Ok(WriteOutcome::VersionMismatch {
                current: current_version.unwrap_or_default(),
            });
        }

        *guard = Some(content.to_string());
        Ok(WriteOutcome::Committed {
            version: content_hash(content),
        })
    }
}
