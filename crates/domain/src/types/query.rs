//! Query, fetch and modification bodies

use serde::{Deserialize, Serialize};

use crate::types::dataset::DatasetType;
use crate::types::record::{Priority, RecordStatus};

/// Field projection; the server returns a reduced shape when set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,
}

impl Projection {
    pub fn include<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { include: Some(fields.into_iter().map(Into::into).collect()), exclude: None }
    }

    pub fn exclude<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { include: None, exclude: Some(fields.into_iter().map(Into::into).collect()) }
    }

    pub const fn is_empty(&self) -> bool {
        self.include.is_none() && self.exclude.is_none()
    }
}

/// Body of `POST v1/datasets/query`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetQueryBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_type: Option<DatasetType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_name: Option<String>,
    #[serde(flatten)]
    pub projection: Projection,
}

/// Body of `POST v1/records/bulkFetch`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordsFetchBody {
    pub ids: Vec<i64>,
    #[serde(flatten)]
    pub projection: Projection,
    #[serde(default)]
    pub missing_ok: bool,
}

/// Body of `POST .../entries/bulkFetch`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFetchBody {
    pub names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<String>>,
    #[serde(default)]
    pub missing_ok: bool,
}

/// `data` half of a record item fetch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordItemQuery {
    #[serde(default)]
    pub entry_names: Option<Vec<String>>,
    #[serde(default)]
    pub specification_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Vec<RecordStatus>>,
}

/// `meta` half of a submit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Reuse existing records with identical inputs instead of creating new ones
    pub find_existing: bool,
}

impl Default for SubmitMeta {
    fn default() -> Self {
        Self { tag: None, priority: None, find_existing: true }
    }
}

/// `meta` half of a bulk record modification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordModification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RecordStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub delete_tag: bool,
}

impl RecordModification {
    pub fn status(status: RecordStatus) -> Self {
        Self { status: Some(status), ..Self::default() }
    }

    pub fn priority(priority: Priority) -> Self {
        Self { priority: Some(priority), ..Self::default() }
    }

    pub fn tag(tag: impl Into<String>) -> Self {
        Self { tag: Some(tag.into()), ..Self::default() }
    }

    pub const fn is_noop(&self) -> bool {
        self.status.is_none()
            && self.priority.is_none()
            && self.tag.is_none()
            && self.comment.is_none()
            && !self.delete_tag
    }
}

/// `meta` half of a revert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevertMeta {
    /// The status being undone (e.g. `deleted`, `invalid`, `cancelled`)
    pub revert_status: RecordStatus,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn projection_is_flattened_into_query() {
        let body = DatasetQueryBody {
            dataset_type: Some(DatasetType::Singlepoint),
            dataset_name: Some("S22".into()),
            projection: Projection::include(["id", "name"]),
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"dataset_type": "singlepoint", "dataset_name": "S22", "include": ["id", "name"]})
        );
    }

    #[test]
    fn submit_meta_defaults_to_find_existing() {
        assert_eq!(
            serde_json::to_value(SubmitMeta::default()).unwrap(),
            json!({"find_existing": true})
        );
    }

    #[test]
    fn modification_skips_unset_fields() {
        let modification = RecordModification::priority(Priority::High);
        assert_eq!(
            serde_json::to_value(&modification).unwrap(),
            json!({"priority": 2, "delete_tag": false})
        );
        assert!(!modification.is_noop());
        assert!(RecordModification::default().is_noop());
    }
}
