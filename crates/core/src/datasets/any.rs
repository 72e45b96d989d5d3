//! Runtime selection over dataset kinds
//!
//! The kind of a dataset is only known once its metadata arrives, so
//! lookups by name return an [`AnyDataset`]. Callers that know the kind
//! match on the variant to reach the typed [`Dataset`].

use std::sync::Arc;

use qcportal_domain::{
    BulkReport, DatasetMetadata, DatasetStatus, DatasetType, DeleteMetadata, Gridoptimization,
    Manybody, Optimization, Projection, Reaction, Record, RecordItemQuery, RecordKey,
    RecordModification, RecordSelection, RecordStatus, Result, Singlepoint, Torsiondrive,
    UpdateMetadata,
};
use serde_json::Value;

use super::cache::{Dataset, SubmitOptions, SubmitReport};
use super::ports::DatasetPort;
use super::sync::{PollOptions, UpdateReport};

/// A port able to serve every dataset kind
pub trait AnyDatasetPort:
    DatasetPort<Singlepoint>
    + DatasetPort<Optimization>
    + DatasetPort<Torsiondrive>
    + DatasetPort<Gridoptimization>
    + DatasetPort<Manybody>
    + DatasetPort<Reaction>
    + 'static
{
}

impl<T> AnyDatasetPort for T where
    T: DatasetPort<Singlepoint>
        + DatasetPort<Optimization>
        + DatasetPort<Torsiondrive>
        + DatasetPort<Gridoptimization>
        + DatasetPort<Manybody>
        + DatasetPort<Reaction>
        + 'static
{
}

/// A dataset of any kind, selected by its `dataset_type` tag
#[derive(Debug)]
pub enum AnyDataset {
    Singlepoint(Dataset<Singlepoint>),
    Optimization(Dataset<Optimization>),
    Torsiondrive(Dataset<Torsiondrive>),
    Gridoptimization(Dataset<Gridoptimization>),
    Manybody(Dataset<Manybody>),
    Reaction(Dataset<Reaction>),
}

macro_rules! with_dataset {
    ($value:expr, $ds:ident => $body:expr) => {
        match $value {
            AnyDataset::Singlepoint($ds) => $body,
            AnyDataset::Optimization($ds) => $body,
            AnyDataset::Torsiondrive($ds) => $body,
            AnyDataset::Gridoptimization($ds) => $body,
            AnyDataset::Manybody($ds) => $body,
            AnyDataset::Reaction($ds) => $body,
        }
    };
}

impl AnyDataset {
    /// Build the variant named by `metadata.dataset_type`
    pub fn from_metadata<P: AnyDatasetPort>(
        metadata: DatasetMetadata,
        port: Arc<P>,
    ) -> Result<Self> {
        Ok(match metadata.dataset_type {
            DatasetType::Singlepoint => {
                Self::Singlepoint(Dataset::<Singlepoint>::new(metadata, port)?)
            }
            DatasetType::Optimization => {
                Self::Optimization(Dataset::<Optimization>::new(metadata, port)?)
            }
            DatasetType::Torsiondrive => {
                Self::Torsiondrive(Dataset::<Torsiondrive>::new(metadata, port)?)
            }
            DatasetType::Gridoptimization => {
                Self::Gridoptimization(Dataset::<Gridoptimization>::new(metadata, port)?)
            }
            DatasetType::Manybody => Self::Manybody(Dataset::<Manybody>::new(metadata, port)?),
            DatasetType::Reaction => Self::Reaction(Dataset::<Reaction>::new(metadata, port)?),
        })
    }

    pub fn id(&self) -> i64 {
        with_dataset!(self, ds => ds.id())
    }

    pub fn name(&self) -> &str {
        with_dataset!(self, ds => ds.name())
    }

    pub fn dataset_type(&self) -> DatasetType {
        with_dataset!(self, ds => ds.dataset_type())
    }

    pub fn metadata(&self) -> &DatasetMetadata {
        with_dataset!(self, ds => ds.metadata())
    }

    pub async fn entry_names(&mut self) -> Result<&[String]> {
        with_dataset!(self, ds => ds.entry_names().await)
    }

    pub async fn specification_names(&mut self) -> Result<Vec<String>> {
        with_dataset!(self, ds => ds.specification_names().await)
    }

    pub async fn add_specification(
        &mut self,
        name: impl Into<String>,
        specification: Value,
        description: Option<String>,
    ) -> Result<BulkReport> {
        let name = name.into();
        with_dataset!(self, ds => ds.add_specification(name, specification, description).await)
    }

    pub async fn submit(&mut self, options: SubmitOptions) -> Result<SubmitReport> {
        with_dataset!(self, ds => ds.submit(options).await)
    }

    pub async fn fetch_records(
        &mut self,
        query: RecordItemQuery,
        include_records: bool,
    ) -> Result<Vec<RecordKey>> {
        with_dataset!(self, ds => ds.fetch_records(query, include_records).await)
    }

    pub async fn query_records(
        &self,
        query: &RecordItemQuery,
        projection: &Projection,
    ) -> Result<Vec<Value>> {
        with_dataset!(self, ds => ds.query_records(query, projection).await)
    }

    pub async fn record(
        &mut self,
        entry_name: &str,
        specification_name: &str,
    ) -> Result<Option<&Record>> {
        with_dataset!(self, ds => ds.record(entry_name, specification_name).await)
    }

    pub fn pending_keys(&self) -> Vec<RecordKey> {
        with_dataset!(self, ds => ds.pending_keys())
    }

    pub async fn iterate_updated(&mut self, options: PollOptions) -> Result<UpdateReport> {
        with_dataset!(self, ds => ds.iterate_updated(options).await)
    }

    pub async fn modify_records(
        &mut self,
        selection: RecordSelection,
        modification: RecordModification,
    ) -> Result<UpdateMetadata> {
        with_dataset!(self, ds => ds.modify_records(selection, modification).await)
    }

    pub async fn revert_records(
        &mut self,
        selection: RecordSelection,
        revert_status: RecordStatus,
    ) -> Result<UpdateMetadata> {
        with_dataset!(self, ds => ds.revert_records(selection, revert_status).await)
    }

    pub async fn delete_entries(
        &mut self,
        names: &[String],
        delete_records: bool,
    ) -> Result<DeleteMetadata> {
        with_dataset!(self, ds => ds.delete_entries(names, delete_records).await)
    }

    pub async fn delete_specifications(
        &mut self,
        names: &[String],
        delete_records: bool,
    ) -> Result<DeleteMetadata> {
        with_dataset!(self, ds => ds.delete_specifications(names, delete_records).await)
    }

    pub async fn delete_records(
        &mut self,
        selection: RecordSelection,
        delete_records: bool,
    ) -> Result<DeleteMetadata> {
        with_dataset!(self, ds => ds.delete_records(selection, delete_records).await)
    }

    pub async fn status(&self) -> Result<DatasetStatus> {
        with_dataset!(self, ds => ds.status().await)
    }
}
