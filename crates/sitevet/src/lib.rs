//! Sitevet: review-and-persistence engine for geotagged site validation.
//!
//! Sitevet drives a human-in-the-loop review of candidate site records
//! (wastewater-treatment-plant locations): a reviewer inspects one record at
//! a time with its geographic neighbors for context, accepts, rejects, or
//! edits it, and every committed decision is written to durable local storage
//! and reconciled with a shared remote copy.
//!
//! # Core Principles
//!
//! - **Local first**: a committed decision is written to disk before any
//!   remote reconciliation; a remote failure never discards it
//! - **Recover, don't raise**: malformed numeric or coordinate cells become
//!   "no value"/"no location", never errors
//! - **Explicit ownership**: the record table is owned by the active
//!   [`ReviewSession`], not by an ambient global
//!
//! # Example
//!
//! ```no_run
//! use sitevet::{Predicates, RecordTable, ReviewSession, SyncEngine};
//!
//! let table = RecordTable::load("validation_dataset.csv").unwrap();
//! let sync = SyncEngine::local_only("validation_dataset.csv");
//! let mut session = ReviewSession::new(table, sync);
//!
//! let predicates = Predicates::new().allow("Country", ["Egypt"]);
//! session.apply_filters(&predicates, 0, 10);
//!
//! for id in session.selection().ids().to_vec() {
//!     let view = session.record_view(id).unwrap();
//!     println!("{} neighbors within 5 km", view.neighbors.len());
//!     session.accept(id).unwrap();
//! }
//! ```

pub mod error;
pub mod filter;
pub mod geo;
pub mod neighbors;
pub mod record;
pub mod session;
pub mod sync;

pub use error::{Result, SitevetError};
pub use filter::{select, Predicates, ReviewSelection, SelectionNotice};
pub use geo::{distance_km, Coordinates};
pub use neighbors::{neighbors_within, Neighbor, DEFAULT_RADIUS_KM};
pub use record::{
    ColumnSummary, Record, RecordId, RecordTable, StatusCounts, TableConfig, ValidationStatus,
    STATUS_COLUMN,
};
pub use session::{ImageRef, RecordView, ReviewSession, ReviewState, SessionConfig};
pub use sync::{
    HttpRemote, MemoryRemote, RemoteOutcome, RemoteRead, RemoteStore, SyncEngine, SyncReport,
    WriteOutcome,
};
