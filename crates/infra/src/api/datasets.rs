//! HTTP adapter for the dataset port
//!
//! Every dataset endpoint lives under `v1/datasets/{type}/{id}/`. Bulk
//! endpoints take a `{meta, data}` envelope. A 409 answer means the server
//! refused to break an entry/specification/record association and is
//! reported as [`PortalError::Conflict`].

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use qcportal_core::DatasetPort;
use qcportal_domain::constants::{ENDPOINT_DATASETS, ENDPOINT_RECORDS_BULK_FETCH};
use qcportal_domain::{
    DatasetKind, DatasetRecordItem, DatasetSpecification, DatasetStatus, DeleteMeta, DeleteMetadata,
    EntryFetchBody, Envelope, InsertMetadata, OverwriteMeta, PortalError, Projection, Record,
    RecordItemQuery, RecordModification, RecordSelection, RecordStatus, RecordsFetchBody, Result,
    RevertMeta, SubmitMeta, UpdateMetadata,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use super::client::PortalClient;
use super::dispatcher::Endpoint;

/// `meta` half of a record item fetch
#[derive(Debug, Default, Serialize)]
struct RecordItemsMeta<'a> {
    #[serde(flatten)]
    projection: Option<&'a Projection>,
    include_records: bool,
}

fn dataset_path<K: DatasetKind>(dataset_id: i64, tail: &str) -> String {
    format!("{ENDPOINT_DATASETS}/{}/{dataset_id}/{tail}", K::DATASET_TYPE)
}

fn post_to<K: DatasetKind>(dataset_id: i64, tail: &str) -> Endpoint {
    Endpoint::post(dataset_path::<K>(dataset_id, tail))
}

/// Map a 409 answer to `Conflict`; everything else passes through
fn conflict(err: PortalError) -> PortalError {
    match err.as_request_error() {
        Some(request) if request.status_code == 409 => {
            PortalError::Conflict(request.message.clone())
        }
        _ => err,
    }
}

impl PortalClient {
    async fn dataset_get<K: DatasetKind, R: DeserializeOwned>(
        &self,
        dataset_id: i64,
        tail: &str,
    ) -> Result<R> {
        let endpoint = Endpoint::get(dataset_path::<K>(dataset_id, tail));
        self.dispatcher().request(&endpoint).await.map_err(conflict)
    }

    async fn dataset_call<B, R>(&self, endpoint: Endpoint, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        self.dispatcher().request_with_body(&endpoint.with_body(), body).await.map_err(conflict)
    }
}

#[async_trait]
impl<K: DatasetKind> DatasetPort<K> for PortalClient {
    #[instrument(skip(self))]
    async fn fetch_entry_names(&self, dataset_id: i64) -> Result<Vec<String>> {
        self.dataset_get::<K, _>(dataset_id, "entry_names").await
    }

    #[instrument(skip(self, names), fields(n = names.len()))]
    async fn fetch_entries(
        &self,
        dataset_id: i64,
        names: &[String],
        include: Option<BTreeSet<String>>,
    ) -> Result<Vec<K::Entry>> {
        let body = EntryFetchBody {
            names: names.to_vec(),
            include: include.map(|set| set.into_iter().collect()),
            missing_ok: false,
        };
        self.dataset_call(post_to::<K>(dataset_id, "entries/bulkFetch"), &body).await
    }

    #[instrument(skip(self, entries), fields(n = entries.len()))]
    async fn add_entries(
        &self,
        dataset_id: i64,
        entries: &[K::NewEntry],
        overwrite_existing: bool,
    ) -> Result<InsertMetadata> {
        let body = Envelope::new(OverwriteMeta { overwrite_existing }, entries);
        self.dataset_call(post_to::<K>(dataset_id, "entries/bulkCreate"), &body).await
    }

    #[instrument(skip(self))]
    async fn fetch_specifications(
        &self,
        dataset_id: i64,
    ) -> Result<BTreeMap<String, DatasetSpecification>> {
        self.dataset_get::<K, _>(dataset_id, "specifications").await
    }

    #[instrument(skip(self, specifications), fields(n = specifications.len()))]
    async fn add_specifications(
        &self,
        dataset_id: i64,
        specifications: &[DatasetSpecification],
        overwrite_existing: bool,
    ) -> Result<InsertMetadata> {
        let body = Envelope::new(OverwriteMeta { overwrite_existing }, specifications);
        self.dataset_call(post_to::<K>(dataset_id, "specifications/bulkCreate"), &body).await
    }

    #[instrument(skip(self, selection, meta))]
    async fn submit(
        &self,
        dataset_id: i64,
        selection: &RecordSelection,
        meta: &SubmitMeta,
    ) -> Result<InsertMetadata> {
        let body = Envelope::new(meta, selection);
        self.dataset_call(post_to::<K>(dataset_id, "submit"), &body).await
    }

    #[instrument(skip(self, query))]
    async fn fetch_record_items(
        &self,
        dataset_id: i64,
        query: &RecordItemQuery,
        include_records: bool,
    ) -> Result<Vec<DatasetRecordItem>> {
        let body = Envelope::new(RecordItemsMeta { projection: None, include_records }, query);
        self.dataset_call(post_to::<K>(dataset_id, "records/bulkFetch"), &body).await
    }

    #[instrument(skip(self, query, projection))]
    async fn query_record_items(
        &self,
        dataset_id: i64,
        query: &RecordItemQuery,
        projection: &Projection,
    ) -> Result<Vec<Value>> {
        let meta = RecordItemsMeta { projection: Some(projection), include_records: false };
        let body = Envelope::new(meta, query);
        self.dataset_call(post_to::<K>(dataset_id, "records/bulkFetch"), &body).await
    }

    #[instrument(skip(self, record_ids), fields(n = record_ids.len()))]
    async fn fetch_records(&self, record_ids: &[i64]) -> Result<Vec<Record>> {
        if record_ids.is_empty() {
            return Ok(Vec::new());
        }
        let body = RecordsFetchBody {
            ids: record_ids.to_vec(),
            projection: Projection::default(),
            missing_ok: false,
        };
        let endpoint = Endpoint::post(ENDPOINT_RECORDS_BULK_FETCH).with_body();
        self.dispatcher().request_with_body(&endpoint, &body).await
    }

    #[instrument(skip(self, selection, modification))]
    async fn modify_records(
        &self,
        dataset_id: i64,
        selection: &RecordSelection,
        modification: &RecordModification,
    ) -> Result<UpdateMetadata> {
        let body = Envelope::new(modification, selection);
        self.dataset_call(Endpoint::patch(dataset_path::<K>(dataset_id, "records")), &body).await
    }

    #[instrument(skip(self, selection))]
    async fn revert_records(
        &self,
        dataset_id: i64,
        selection: &RecordSelection,
        revert_status: RecordStatus,
    ) -> Result<UpdateMetadata> {
        let body = Envelope::new(RevertMeta { revert_status }, selection);
        self.dataset_call(post_to::<K>(dataset_id, "records/revert"), &body).await
    }

    #[instrument(skip(self, names), fields(n = names.len()))]
    async fn delete_entries(
        &self,
        dataset_id: i64,
        names: &[String],
        delete_records: bool,
    ) -> Result<DeleteMetadata> {
        let body = Envelope::new(DeleteMeta { delete_records }, names);
        let endpoint = post_to::<K>(dataset_id, "entries/bulkDelete");
        let meta: DeleteMetadata = self.dataset_call(endpoint, &body).await?;
        debug!(deleted = meta.n_deleted(), children = meta.n_children_deleted, "entries deleted");
        Ok(meta)
    }

    #[instrument(skip(self, names), fields(n = names.len()))]
    async fn delete_specifications(
        &self,
        dataset_id: i64,
        names: &[String],
        delete_records: bool,
    ) -> Result<DeleteMetadata> {
        let body = Envelope::new(DeleteMeta { delete_records }, names);
        let endpoint = post_to::<K>(dataset_id, "specifications/bulkDelete");
        let meta: DeleteMetadata = self.dataset_call(endpoint, &body).await?;
        debug!(
            deleted = meta.n_deleted(),
            children = meta.n_children_deleted,
            "specifications deleted"
        );
        Ok(meta)
    }

    #[instrument(skip(self, selection))]
    async fn delete_record_items(
        &self,
        dataset_id: i64,
        selection: &RecordSelection,
        delete_records: bool,
    ) -> Result<DeleteMetadata> {
        let body = Envelope::new(DeleteMeta { delete_records }, selection);
        self.dataset_call(post_to::<K>(dataset_id, "records/bulkDelete"), &body).await
    }

    #[instrument(skip(self))]
    async fn status(&self, dataset_id: i64) -> Result<DatasetStatus> {
        self.dataset_get::<K, _>(dataset_id, "status").await
    }
}
