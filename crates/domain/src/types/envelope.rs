//! `{meta, data}` request envelopes and per-item bulk reports

use serde::{Deserialize, Serialize};

/// Request body shape shared by bulk dataset endpoints: `meta` carries the
/// operation options, `data` the payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<M, D> {
    pub meta: M,
    pub data: D,
}

impl<M, D> Envelope<M, D> {
    pub const fn new(meta: M, data: D) -> Self {
        Self { meta, data }
    }
}

/// Options for bulk creation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverwriteMeta {
    /// Replace items whose name already exists instead of skipping them
    pub overwrite_existing: bool,
}

/// Options for bulk deletion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteMeta {
    /// Cascade to the records attached to the deleted items
    pub delete_records: bool,
}

/// Server report for a bulk insert
///
/// Indices refer to positions in the submitted list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertMetadata {
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub errors: Vec<(usize, String)>,
    #[serde(default)]
    pub inserted_idx: Vec<usize>,
    #[serde(default)]
    pub existing_idx: Vec<usize>,
}

impl InsertMetadata {
    pub fn success(&self) -> bool {
        self.errors.is_empty() && self.error_description.is_none()
    }

    pub fn n_inserted(&self) -> usize {
        self.inserted_idx.len()
    }

    pub fn n_existing(&self) -> usize {
        self.existing_idx.len()
    }

    /// Outcome for the item at `idx`
    pub fn outcome(&self, idx: usize) -> ItemOutcome {
        if self.inserted_idx.contains(&idx) {
            ItemOutcome::Inserted
        } else if self.existing_idx.contains(&idx) {
            ItemOutcome::Existing
        } else if let Some((_, msg)) = self.errors.iter().find(|(i, _)| *i == idx) {
            ItemOutcome::Rejected(msg.clone())
        } else {
            let msg = self
                .error_description
                .clone()
                .unwrap_or_else(|| "no outcome reported by server".to_string());
            ItemOutcome::Rejected(msg)
        }
    }
}

/// Server report for a bulk delete
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteMetadata {
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub errors: Vec<(usize, String)>,
    #[serde(default)]
    pub deleted_idx: Vec<usize>,
    #[serde(default)]
    pub n_children_deleted: usize,
}

impl DeleteMetadata {
    pub fn success(&self) -> bool {
        self.errors.is_empty() && self.error_description.is_none()
    }

    pub fn n_deleted(&self) -> usize {
        self.deleted_idx.len()
    }
}

/// Server report for a bulk modification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateMetadata {
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub errors: Vec<(usize, String)>,
    #[serde(default)]
    pub updated_idx: Vec<usize>,
}

impl UpdateMetadata {
    pub fn success(&self) -> bool {
        self.errors.is_empty() && self.error_description.is_none()
    }

    pub fn n_updated(&self) -> usize {
        self.updated_idx.len()
    }
}

/// What happened to one item of a bulk request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Newly created
    Inserted,
    /// Already present; left untouched
    Existing,
    /// Refused by the server
    Rejected(String),
}

/// Per-name view of an [`InsertMetadata`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkReport {
    pub items: Vec<(String, ItemOutcome)>,
}

impl BulkReport {
    /// Pair submitted names (in submission order) with the server's verdicts
    pub fn from_insert_metadata<I, S>(names: I, meta: &InsertMetadata) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items = names
            .into_iter()
            .enumerate()
            .map(|(idx, name)| (name.into(), meta.outcome(idx)))
            .collect();
        Self { items }
    }

    /// Names the server created
    pub fn inserted(&self) -> impl Iterator<Item = &str> {
        self.with_outcome(|o| matches!(o, ItemOutcome::Inserted))
    }

    /// Names the server already had
    pub fn existing(&self) -> impl Iterator<Item = &str> {
        self.with_outcome(|o| matches!(o, ItemOutcome::Existing))
    }

    /// Names refused by the server, with the reason
    pub fn rejected(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items.iter().filter_map(|(name, outcome)| match outcome {
            ItemOutcome::Rejected(msg) => Some((name.as_str(), msg.as_str())),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    fn with_outcome(&self, pred: impl Fn(&ItemOutcome) -> bool) -> impl Iterator<Item = &str> {
        self.items.iter().filter(move |(_, o)| pred(o)).map(|(name, _)| name.as_str())
    }
}
