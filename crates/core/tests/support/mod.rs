//! Shared test helpers for `qcportal-core` integration tests.
//!
//! The fake server keeps datasets in memory and advances record statuses on
//! each poll, so cache and polling tests can run without HTTP.

#![allow(dead_code)]

pub mod server;

use std::sync::Arc;

use qcportal_core::Dataset;
use qcportal_domain::{
    DatasetKind, DatasetMetadata, DatasetType, MoleculeEntryInput, MoleculeInput, NewEntry,
    Singlepoint,
};
use serde_json::json;

pub use server::{Calls, FakeServer};

pub const DATASET_ID: i64 = 17;

/// Metadata for a dataset of the given kind
pub fn metadata(dataset_type: DatasetType) -> DatasetMetadata {
    serde_json::from_value(json!({
        "id": DATASET_ID,
        "dataset_type": dataset_type.as_str(),
        "name": format!("test {dataset_type} dataset"),
    }))
    .expect("metadata fixture should deserialize")
}

/// A singlepoint dataset backed by `server`
pub fn singlepoint(server: &Arc<FakeServer>) -> Dataset<Singlepoint> {
    Dataset::new(metadata(Singlepoint::DATASET_TYPE), server.clone()).expect("kind should match")
}

/// New singlepoint entry referencing an existing molecule
pub fn sp_entry(name: &str, molecule_id: i64) -> NewEntry<MoleculeEntryInput> {
    NewEntry::new(name, MoleculeEntryInput { molecule: MoleculeInput::Id(molecule_id) })
}

pub fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| (*n).to_string()).collect()
}
