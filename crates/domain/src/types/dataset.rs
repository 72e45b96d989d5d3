//! Dataset metadata, specifications and record items

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::impl_wire_str_conversions;
use crate::types::record::{Priority, Record, RecordStatus};

/// The closed set of dataset kinds a server hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DatasetType {
    Singlepoint,
    Optimization,
    Torsiondrive,
    Gridoptimization,
    Manybody,
    Reaction,
}

impl_wire_str_conversions!(DatasetType {
    Singlepoint => "singlepoint",
    Optimization => "optimization",
    Torsiondrive => "torsiondrive",
    Gridoptimization => "gridoptimization",
    Manybody => "manybody",
    Reaction => "reaction",
});

/// Dataset-level fields returned by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub id: i64,
    #[serde(alias = "collection_type")]
    pub dataset_type: DatasetType,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub group: String,
    #[serde(default = "default_visibility")]
    pub visibility: bool,
    #[serde(default)]
    pub provenance: Map<String, Value>,
    #[serde(default, alias = "default_compute_tag")]
    pub default_tag: Option<String>,
    #[serde(default, alias = "default_compute_priority")]
    pub default_priority: Option<Priority>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

const fn default_visibility() -> bool {
    true
}

/// One row of `GET v1/datasets`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetListItem {
    pub id: i64,
    #[serde(alias = "collection_type")]
    pub dataset_type: DatasetType,
    #[serde(alias = "name")]
    pub dataset_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body for creating a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetAddBody {
    pub name: String,
    pub description: String,
    pub tagline: String,
    pub tags: Vec<String>,
    pub group: String,
    pub provenance: Map<String, Value>,
    pub visibility: bool,
    pub default_tag: String,
    pub default_priority: Priority,
    pub metadata: Map<String, Value>,
    /// Return the existing dataset instead of failing when the name is taken
    pub existing_ok: bool,
}

impl DatasetAddBody {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            tagline: String::new(),
            tags: Vec::new(),
            group: "default".to_string(),
            provenance: Map::new(),
            visibility: true,
            default_tag: "*".to_string(),
            default_priority: Priority::Normal,
            metadata: Map::new(),
            existing_ok: false,
        }
    }
}

/// A named, reusable description of how to compute
///
/// The specification body is kind-specific and opaque to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSpecification {
    pub name: String,
    pub specification: Value,
    #[serde(default)]
    pub description: Option<String>,
}

impl DatasetSpecification {
    pub fn new(name: impl Into<String>, specification: Value) -> Self {
        Self { name: name.into(), specification, description: None }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Key of the record map: (entry name, specification name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    pub entry_name: String,
    pub specification_name: String,
}

impl RecordKey {
    pub fn new(entry_name: impl Into<String>, specification_name: impl Into<String>) -> Self {
        Self { entry_name: entry_name.into(), specification_name: specification_name.into() }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.entry_name, self.specification_name)
    }
}

/// Association of an entry and a specification with a record, as returned by
/// the record item endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecordItem {
    pub entry_name: String,
    pub specification_name: String,
    pub record_id: i64,
    #[serde(default)]
    pub record: Option<Record>,
}

impl DatasetRecordItem {
    pub fn key(&self) -> RecordKey {
        RecordKey::new(&self.entry_name, &self.specification_name)
    }
}

/// Entries × specifications selector; `None` on either side selects all
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSelection {
    #[serde(default)]
    pub entry_names: Option<Vec<String>>,
    #[serde(default)]
    pub specification_names: Option<Vec<String>>,
}

impl RecordSelection {
    /// Every record of the dataset
    pub fn all() -> Self {
        Self::default()
    }

    pub fn entries<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entry_names: Some(names.into_iter().map(Into::into).collect()),
            specification_names: None,
        }
    }

    pub fn specifications<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entry_names: None,
            specification_names: Some(names.into_iter().map(Into::into).collect()),
        }
    }

    #[must_use]
    pub fn and_specifications<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.specification_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn and_entries<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entry_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// `true` when `key` falls inside this selection
    pub fn matches(&self, key: &RecordKey) -> bool {
        let entry_ok =
            self.entry_names.as_ref().is_none_or(|names| names.contains(&key.entry_name));
        let spec_ok =
            self.specification_names
                .as_ref()
                .is_none_or(|names| names.contains(&key.specification_name));
        entry_ok && spec_ok
    }
}

/// Status counts per specification, as returned by `.../status`
pub type DatasetStatus = BTreeMap<String, BTreeMap<RecordStatus, u64>>;
