//! Port interface between the dataset cache and the server

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use qcportal_domain::{
    DatasetKind, DatasetRecordItem, DatasetSpecification, DatasetStatus, DeleteMetadata,
    InsertMetadata, Projection, Record, RecordItemQuery, RecordModification, RecordSelection,
    RecordStatus, Result, SubmitMeta, UpdateMetadata,
};
use serde_json::Value;

/// Server-side operations on one dataset of kind `K`
///
/// Every method is a single round trip. The dataset type in endpoint paths
/// comes from `K::DATASET_TYPE`.
#[async_trait]
pub trait DatasetPort<K: DatasetKind>: Send + Sync {
    /// Names of all entries in the dataset
    async fn fetch_entry_names(&self, dataset_id: i64) -> Result<Vec<String>>;

    /// Fetch entries by name with server-side includes
    async fn fetch_entries(
        &self,
        dataset_id: i64,
        names: &[String],
        include: Option<BTreeSet<String>>,
    ) -> Result<Vec<K::Entry>>;

    /// Bulk-create entries
    async fn add_entries(
        &self,
        dataset_id: i64,
        entries: &[K::NewEntry],
        overwrite_existing: bool,
    ) -> Result<InsertMetadata>;

    /// All specifications, keyed by name
    async fn fetch_specifications(
        &self,
        dataset_id: i64,
    ) -> Result<BTreeMap<String, DatasetSpecification>>;

    /// Bulk-create specifications
    async fn add_specifications(
        &self,
        dataset_id: i64,
        specifications: &[DatasetSpecification],
        overwrite_existing: bool,
    ) -> Result<InsertMetadata>;

    /// Create (or find) records for every selected (entry, specification) pair
    async fn submit(
        &self,
        dataset_id: i64,
        selection: &RecordSelection,
        meta: &SubmitMeta,
    ) -> Result<InsertMetadata>;

    /// Record items matching `query`; full records are embedded when
    /// `include_records` is set
    async fn fetch_record_items(
        &self,
        dataset_id: i64,
        query: &RecordItemQuery,
        include_records: bool,
    ) -> Result<Vec<DatasetRecordItem>>;

    /// Projected record items in whatever shape the server returns
    async fn query_record_items(
        &self,
        dataset_id: i64,
        query: &RecordItemQuery,
        projection: &Projection,
    ) -> Result<Vec<Value>>;

    /// Full records by id
    async fn fetch_records(&self, record_ids: &[i64]) -> Result<Vec<Record>>;

    /// Apply a bulk state change to the selected records
    async fn modify_records(
        &self,
        dataset_id: i64,
        selection: &RecordSelection,
        modification: &RecordModification,
    ) -> Result<UpdateMetadata>;

    /// Undo a previous `revert_status` transition on the selected records
    async fn revert_records(
        &self,
        dataset_id: i64,
        selection: &RecordSelection,
        revert_status: RecordStatus,
    ) -> Result<UpdateMetadata>;

    async fn delete_entries(
        &self,
        dataset_id: i64,
        names: &[String],
        delete_records: bool,
    ) -> Result<DeleteMetadata>;

    async fn delete_specifications(
        &self,
        dataset_id: i64,
        names: &[String],
        delete_records: bool,
    ) -> Result<DeleteMetadata>;

    /// Detach the selected records from the dataset, deleting them too when
    /// `delete_records` is set
    async fn delete_record_items(
        &self,
        dataset_id: i64,
        selection: &RecordSelection,
        delete_records: bool,
    ) -> Result<DeleteMetadata>;

    /// Status counts per specification
    async fn status(&self, dataset_id: i64) -> Result<DatasetStatus>;
}
