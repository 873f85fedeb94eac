//! Filter and pagination: narrowing the table to one review session's subset.

use std::collections::{HashMap, HashSet};

use crate::record::{Record, RecordId, RecordTable};

/// Categorical predicates: field name to allowed value set.
///
/// A record passes when, for every supplied field, its value is a member of
/// the allowed set. Fields with no predicate are unconstrained.
#[derive(Debug, Clone, Default)]
pub struct Predicates {
    allowed: HashMap<String, HashSet<String>>,
}

impl Predicates {
    /// Create an empty predicate set (everything passes).
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrain a field to a set of allowed values.
    pub fn allow<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.allowed
            .insert(field.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Check whether any constraint is present.
    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }

    /// Test a record against all supplied predicates.
    pub fn matches(&self, record: &Record) -> bool {
        self.allowed.iter().all(|(field, values)| {
            record
                .field(field)
                .map(|v| values.contains(v.trim()))
                .unwrap_or(false)
        })
    }
}

/// Why a selection came back empty when rows exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionNotice {
    /// The requested row range had `start >= end`. Valid, but there is
    /// nothing to review until the range is fixed.
    EmptyRange,
}

/// The filtered, paginated, ordered subset of records under review.
///
/// Ephemeral: valid for one session pass, recomputed whenever the filter
/// criteria or row range change, never persisted.
#[derive(Debug, Clone)]
pub struct ReviewSelection {
    ids: Vec<RecordId>,
    filtered_len: usize,
    notice: Option<SelectionNotice>,
}

impl ReviewSelection {
    /// Selected record ids, in canonical table order.
    pub fn ids(&self) -> &[RecordId] {
        &self.ids
    }

    /// Number of selected records.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check whether nothing was selected.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of records that passed the filter, before pagination.
    pub fn filtered_len(&self) -> usize {
        self.filtered_len
    }

    /// User-visible notice about the selection, if any.
    pub fn notice(&self) -> Option<SelectionNotice> {
        self.notice
    }
}

/// Select the records passing `predicates`, then apply `[start, end)` to the
/// filtered sequence.
///
/// Both bounds are clamped to the filtered length. `start >= end` yields an
/// empty selection with an [`SelectionNotice::EmptyRange`] notice rather
/// than an error.
pub fn select(
    table: &RecordTable,
    predicates: &Predicates,
    start: usize,
    end: usize,
) -> ReviewSelection {
    let filtered: Vec<RecordId> = table
        .records()
        .iter()
        .filter(|r| predicates.matches(r))
        .map(|r| r.id())
        .collect();
    let filtered_len = filtered.len();

    if start >= end {
        return ReviewSelection {
            ids: Vec::new(),
            filtered_len,
            notice: Some(SelectionNotice::EmptyRange),
        };
    }

    let start = start.min(filtered_len);
    let end = end.min(filtered_len);
    ReviewSelection {
        ids: filtered[start..end].to_vec(),
        filtered_len,
        notice: None,
    }
}
