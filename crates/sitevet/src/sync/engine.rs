//! The sync engine: local-first persistence with last-writer-wins
//! remote reconciliation.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::error::{Result, SitevetError};
use crate::record::RecordTable;

use super::{RemoteRead, RemoteStore, WriteOutcome};

/// How the remote leg of a persist ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOutcome {
    /// Remote copy overwritten; no concurrent change was observed.
    Synced { version: String },
    /// No remote copy existed; one was created.
    Created { version: String },
    /// The remote changed since this session last observed it. The local
    /// table overwrote it anyway (last-writer-wins) - the concurrent edit
    /// is lost, which is the documented data-loss risk of this protocol.
    ConflictOverwritten { version: String },
    /// The remote write did not happen; it will be retried on the next
    /// persist. The local write stands regardless.
    Pending { reason: String },
    /// No remote store is configured for this session.
    Disabled,
}

/// Report of one persist: where the local write went and how the remote
/// reconciliation ended.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub local_path: PathBuf,
    /// sha256 of the serialized table, in `sha256:<hex>` form.
    pub content_hash: String,
    pub remote: RemoteOutcome,
    pub at: DateTime<Utc>,
}

impl SyncReport {
    /// Check whether the remote copy still needs this write.
    pub fn remote_pending(&self) -> bool {
        matches!(self.remote, RemoteOutcome::Pending { .. })
    }
}

/// Persists the record table: durable local CSV first, then CAS-style
/// reconciliation with the remote copy.
pub struct SyncEngine {
    local_path: PathBuf,
    remote: Option<Box<dyn RemoteStore>>,
    last_seen_version: Option<String>,
    commit_message: String,
}

impl SyncEngine {
    /// Create an engine that only writes the local file.
    pub fn local_only(local_path: impl Into<PathBuf>) -> Self {
        Self {
            local_path: local_path.into(),
            remote: None,
            last_seen_version: None,
            commit_message: "Update validation dataset".to_string(),
        }
    }

    /// Create an engine that also reconciles with a remote store.
    pub fn new(local_path: impl Into<PathBuf>, remote: Box<dyn RemoteStore>) -> Self {
        Self {
            remote: Some(remote),
            ..Self::local_only(local_path)
        }
    }

    /// Set the commit message sent with remote writes.
    pub fn with_commit_message(mut self, message: impl Into<String>) -> Self {
        self.commit_message = message.into();
        self
    }

    /// Version token this session last observed on the remote.
    pub fn last_seen_version(&self) -> Option<&str> {
        self.last_seen_version.as_deref()
    }

    /// Record a version token observed out-of-band (e.g. when the session
    /// bootstrapped its table from the remote copy).
    pub fn observe_version(&mut self, version: impl Into<String>) {
        self.last_seen_version = Some(version.into());
    }

    /// Path of the durable local form.
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Persist the table.
    ///
    /// The local write happens first and is the only fallible step: once it
    /// succeeds the reviewer's decision is durable, and any remote failure
    /// is reported in the returned [`SyncReport`] rather than raised.
    pub fn persist(&mut self, table: &RecordTable) -> Result<SyncReport> {
        let content = table.to_csv()?;

        fs::write(&self.local_path, &content).map_err(|e| SitevetError::Io {
            path: self.local_path.clone(),
            source: e,
        })?;

        let remote = match self.remote.as_deref() {
            None => RemoteOutcome::Disabled,
            Some(store) => reconcile(
                store,
                self.last_seen_version.as_deref(),
                &content,
                &self.commit_message,
            ),
        };

        match &remote {
            RemoteOutcome::Synced { version }
            | RemoteOutcome::Created { version }
            | RemoteOutcome::ConflictOverwritten { version } => {
                self.last_seen_version = Some(version.clone());
            }
            RemoteOutcome::Pending { .. } | RemoteOutcome::Disabled => {}
        }

        Ok(SyncReport {
            local_path: self.local_path.clone(),
            content_hash: content_hash(&content),
            remote,
            at: Utc::now(),
        })
    }
}

/// Run the CAS-then-overwrite protocol against the remote store.
fn reconcile(
    store: &dyn RemoteStore,
    last_seen: Option<&str>,
    content: &str,
    message: &str,
) -> RemoteOutcome {
    let read = match store.read() {
        Ok(read) => read,
        Err(e) => {
            return RemoteOutcome::Pending {
                reason: format!("remote read failed: {}", e),
            }
        }
    };

    match read {
        RemoteRead::Absent => match store.write(content, None, message) {
            Ok(WriteOutcome::Committed { version }) => RemoteOutcome::Created { version },
            Ok(WriteOutcome::VersionMismatch { .. }) => RemoteOutcome::Pending {
                reason: "remote copy appeared during create".to_string(),
            },
            Err(e) => RemoteOutcome::Pending {
                reason: format!("remote create failed: {}", e),
            },
        },
        RemoteRead::Present { version: current, .. } => {
            // Conflict means someone else wrote since our last observation.
            // Last-writer-wins: overwrite anyway, but say so.
            let conflict = last_seen.is_some_and(|seen| seen != current);
            match store.write(content, Some(&current), message) {
                Ok(WriteOutcome::Committed { version }) => {
                    if conflict {
                        RemoteOutcome::ConflictOverwritten { version }
                    } else {
                        RemoteOutcome::Synced { version }
                    }
                }
                Ok(WriteOutcome::VersionMismatch { .. }) => RemoteOutcome::Pending {
                    reason: "remote changed between read and write".to_string(),
                },
                Err(e) => RemoteOutcome::Pending {
                    reason: format!("remote write failed: {}", e),
                },
            }
        }
    }
}

/// Content hash in the same form the remote tokens use.
pub(crate) fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("sha256:{:x}", hasher.finalize())
}
