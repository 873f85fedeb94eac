//! Sync and persistence: durable local writes plus compare-and-swap
//! reconciliation with a shared remote copy.

mod engine;
mod http;
mod memory;

pub use engine::{RemoteOutcome, SyncEngine, SyncReport};
pub use http::HttpRemote;
pub use memory::MemoryRemote;

use std::sync::Arc;

use crate::error::Result;

/// What a read of the remote copy returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteRead {
    /// No shared copy exists yet (a 404 on the read path).
    Absent,
    /// The current shared copy and its version token.
    Present { content: String, version: String },
}

/// Outcome of a conditional remote write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The write landed; the token now identifying the remote copy.
    Committed { version: String },
    /// The expected version token did not match the remote copy.
    VersionMismatch { current: String },
}

/// The remote shared copy of the dataset.
///
/// Transport failures are `Err`; "the copy does not exist" and "someone
/// else wrote first" are ordinary values, because the sync engine has to
/// act on both.
pub trait RemoteStore {
    /// Fetch the current remote content and version token.
    fn read(&self) -> Result<RemoteRead>;

    /// Write `content`, optionally conditioned on an expected version token.
    ///
    /// `expected_version` of `None` asserts the copy is absent (create).
    fn write(
        &self,
        content: &str,
        expected_version: Option<&str>,
        message: &str,
    ) -> Result<WriteOutcome>;
}

impl<T: RemoteStore> RemoteStore for Arc<T> {
    fn read(&self) -> Result<RemoteRead> {
        (**self).read()
    }

    fn write(
        &self,
        content: &str,
        expected_version: Option<&str>,
        message: &str,
    ) -> Result<WriteOutcome> {
        (**self).write(content, expected_version, message)
    }
}
