//! Review session controller: drives one record at a time through the
//! view/edit/decide state machine and commits decisions to storage.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::Result;
use crate::filter::{select, Predicates, ReviewSelection};
use crate::neighbors::{neighbors_within, DEFAULT_RADIUS_KM};
use crate::record::{Record, RecordId, RecordTable, ValidationStatus};
use crate::sync::{SyncEngine, SyncReport};

/// Where a record stands in the current review pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    /// Presented for inspection; nothing mutated yet.
    Viewing,
    /// The reviewer is proposing field changes.
    Editing,
    /// Accepted or rejected in this pass.
    Decided,
}

/// Session configuration.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Neighbor search radius in kilometers.
    pub radius_km: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            radius_km: DEFAULT_RADIUS_KM,
        }
    }
}

/// An image reference the presentation layer can act on explicitly,
/// instead of a load attempt whose failure gets swallowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// Directly displayable (png/jpeg/web formats).
    Direct(String),
    /// A TIFF that needs decoding before display.
    Tiff(String),
}

impl ImageRef {
    fn from_url(url: &str) -> Self {
        let lower = url.to_ascii_lowercase();
        if lower.ends_with(".tif") || lower.ends_with(".tiff") {
            ImageRef::Tiff(url.to_string())
        } else {
            ImageRef::Direct(url.to_string())
        }
    }

    /// The underlying URL.
    pub fn url(&self) -> &str {
        match self {
            ImageRef::Direct(url) | ImageRef::Tiff(url) => url,
        }
    }
}

/// Everything the presentation surface needs to render one record.
#[derive(Debug)]
pub struct RecordView<'a> {
    pub record: &'a Record,
    /// Nearby records with their distances, in table order.
    pub neighbors: Vec<(&'a Record, f64)>,
    pub status: ValidationStatus,
    pub state: ReviewState,
    pub image: Option<ImageRef>,
}

/// One reviewer's session over the record table.
///
/// Owns the table and the sync engine outright; the presentation layer
/// calls in synchronously and each operation runs to completion, so no
/// locking is needed within a session. Every committed decision is
/// persisted before the call returns.
pub struct ReviewSession {
    table: RecordTable,
    sync: SyncEngine,
    config: SessionConfig,
    selection: ReviewSelection,
    states: HashMap<RecordId, ReviewState>,
}

impl ReviewSession {
    /// Start a session over the whole table with the default radius.
    pub fn new(table: RecordTable, sync: SyncEngine) -> Self {
        Self::with_config(table, sync, SessionConfig::default())
    }

    /// Start a session with custom configuration.
    pub fn with_config(table: RecordTable, sync: SyncEngine, config: SessionConfig) -> Self {
        let selection = select(&table, &Predicates::new(), 0, table.len().max(1));
        Self {
            table,
            sync,
            config,
            selection,
            states: HashMap::new(),
        }
    }

    /// The owned record table.
    pub fn table(&self) -> &RecordTable {
        &self.table
    }

    /// The current review selection.
    pub fn selection(&self) -> &ReviewSelection {
        &self.selection
    }

    /// Recompute the selection from new filter criteria and row range.
    ///
    /// Starts a fresh pass: per-record states reset to Viewing.
    pub fn apply_filters(
        &mut self,
        predicates: &Predicates,
        start: usize,
        end: usize,
    ) -> &ReviewSelection {
        self.selection = select(&self.table, predicates, start, end);
        self.states.clear();
        &self.selection
    }

    /// State of a record in the current pass.
    pub fn state(&self, id: RecordId) -> ReviewState {
        self.states.get(&id).copied().unwrap_or(ReviewState::Viewing)
    }

    /// Assemble the presentation contract for one record: the record, its
    /// neighbors with distances, its status, and an explicit image
    /// reference when one is available.
    pub fn record_view(&self, id: RecordId) -> Result<RecordView<'_>> {
        let record = self.table.get(id)?;
        let neighbors = neighbors_within(&self.table, id, self.config.radius_km)?
            .into_iter()
            .map(|n| Ok((self.table.get(n.id)?, n.distance_km)))
            .collect::<Result<Vec<_>>>()?;

        Ok(RecordView {
            record,
            neighbors,
            status: record.status(),
            state: self.state(id),
            image: record.image_url().map(ImageRef::from_url),
        })
    }

    /// Enter the Editing state for a record.
    pub fn begin_edit(&mut self, id: RecordId) -> Result<()> {
        self.table.get(id)?;
        self.states.insert(id, ReviewState::Editing);
        Ok(())
    }

    /// Abandon an edit without touching the table.
    pub fn cancel_edit(&mut self, id: RecordId) {
        if self.state(id) == ReviewState::Editing {
            self.states.insert(id, ReviewState::Viewing);
        }
    }

    /// Commit proposed field changes: apply the edit, persist, return to
    /// Viewing.
    ///
    /// The updates map may be the form's full fieldset; unknown fields are
    /// ignored and numeric fields are re-coerced.
    pub fn submit_edit(
        &mut self,
        id: RecordId,
        updates: &IndexMap<String, String>,
    ) -> Result<SyncReport> {
        self.table.apply_edit(id, updates)?;
        let report = self.sync.persist(&self.table)?;
        self.states.insert(id, ReviewState::Viewing);
        Ok(report)
    }

    /// Accept a record and persist the decision.
    pub fn accept(&mut self, id: RecordId) -> Result<SyncReport> {
        self.decide(id, ValidationStatus::Accepted)
    }

    /// Reject a record and persist the decision.
    pub fn reject(&mut self, id: RecordId) -> Result<SyncReport> {
        self.decide(id, ValidationStatus::Rejected)
    }

    fn decide(&mut self, id: RecordId, status: ValidationStatus) -> Result<SyncReport> {
        self.table.set_status(id, status)?;
        let report = self.sync.persist(&self.table)?;
        self.states.insert(id, ReviewState::Decided);
        Ok(report)
    }

    /// Give the table back, ending the session.
    pub fn into_table(self) -> RecordTable {
        self.table
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::record::TableConfig;
    use crate::sync::MemoryRemote;

    fn session_in(dir: &tempfile::TempDir) -> (ReviewSession, Arc<MemoryRemote>) {
        let csv = "Country,Latitude,Longitude,Url_Image\n\
                   Egypt,30.0,31.0,https://example.com/a.tiff\n\
                   Egypt,30.03,31.0,https://example.com/b.png\n\
                   Jordan,,35.9,\n";
        let table = RecordTable::from_csv(csv, TableConfig::default()).unwrap();
        let remote = Arc::new(MemoryRemote::new());
        let sync = SyncEngine::new(dir.path().join("data.csv"), Box::new(remote.clone()));
        (ReviewSession::new(table, sync), remote)
    }

    #[test]
    fn test_initial_selection_covers_table() {
        let dir = tempfile::tempdir().unwrap();
        let (session, _) = session_in(&dir);
        assert_eq!(session.selection().len(), 3);
    }

    #[test]
    fn test_record_view_contract() {
        let dir = tempfile::tempdir().unwrap();
        let (session, _) = session_in(&dir);

        let view = session.record_view(RecordId(0)).unwrap();
        assert_eq!(view.status, ValidationStatus::Unreviewed);
        assert_eq!(view.state, ReviewState::Viewing);
        assert_eq!(view.neighbors.len(), 1);
        assert_eq!(view.neighbors[0].0.id(), RecordId(1));
        assert_eq!(
            view.image,
            Some(ImageRef::Tiff("https://example.com/a.tiff".to_string()))
        );

        let second = session.record_view(RecordId(1)).unwrap();
        assert_eq!(
            second.image,
            Some(ImageRef::Direct("https://example.com/b.png".to_string()))
        );

        let third = session.record_view(RecordId(2)).unwrap();
        assert!(third.image.is_none());
        assert!(third.neighbors.is_empty());
    }

    #[test]
    fn test_edit_cycle_returns_to_viewing() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, _) = session_in(&dir);
        let id = RecordId(0);

        session.begin_edit(id).unwrap();
        assert_eq!(session.state(id), ReviewState::Editing);

        let mut updates = IndexMap::new();
        updates.insert("Country".to_string(), "Sudan".to_string());
        session.submit_edit(id, &updates).unwrap();

        assert_eq!(session.state(id), ReviewState::Viewing);
        assert_eq!(session.table().get(id).unwrap().field("Country"), Some("Sudan"));
    }

    #[test]
    fn test_cancel_edit_leaves_table_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, _) = session_in(&dir);
        let id = RecordId(0);

        session.begin_edit(id).unwrap();
        session.cancel_edit(id);
        assert_eq!(session.state(id), ReviewState::Viewing);
        assert_eq!(session.table().get(id).unwrap().field("Country"), Some("Egypt"));
    }

    #[test]
    fn test_accept_persists_and_decides() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, remote) = session_in(&dir);
        let id = RecordId(0);

        let report = session.accept(id).unwrap();
        assert!(!report.remote_pending());
        assert_eq!(session.state(id), ReviewState::Decided);
        assert_eq!(
            session.table().get(id).unwrap().status(),
            ValidationStatus::Accepted
        );
        // The decision reached the shared copy.
        assert!(remote.content().unwrap().contains("Accepted"));
    }

    #[test]
    fn test_reject_is_independent_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, _) = session_in(&dir);

        session.reject(RecordId(1)).unwrap();
        assert_eq!(session.state(RecordId(1)), ReviewState::Decided);
        assert_eq!(session.state(RecordId(0)), ReviewState::Viewing);
    }

    #[test]
    fn test_filter_change_starts_fresh_pass() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, _) = session_in(&dir);
        session.accept(RecordId(0)).unwrap();

        let predicates = Predicates::new().allow("Country", ["Jordan"]);
        let selection = session.apply_filters(&predicates, 0, 10);
        assert_eq!(selection.ids(), &[RecordId(2)]);
        // State machine resets, but the persisted status survives.
        assert_eq!(session.state(RecordId(0)), ReviewState::Viewing);
        assert_eq!(
            session.table().get(RecordId(0)).unwrap().status(),
            ValidationStatus::Accepted
        );
    }

    #[test]
    fn test_filtering_by_status_excludes_decided() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, _) = session_in(&dir);
        session.accept(RecordId(0)).unwrap();

        let predicates = Predicates::new().allow(crate::STATUS_COLUMN, [""]);
        let selection = session.apply_filters(&predicates, 0, 10);
        assert_eq!(selection.ids(), &[RecordId(1), RecordId(2)]);
    }
}
