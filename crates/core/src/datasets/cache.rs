//! Local mirror of one dataset
//!
//! A [`Dataset`] holds a partial, monotonically growing view of the server's
//! entries × specifications × records structure. Nothing is evicted except
//! by an explicit delete, and record payloads are fetched once on first use.
//!
//! The cache is not synchronized: mutating methods take `&mut self`, so a
//! caller sharing one dataset between tasks must wrap it in a lock.

use std::collections::btree_map::Entry as MapEntry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use qcportal_domain::{
    BulkReport, DatasetKind, DatasetMetadata, DatasetRecordItem, DatasetSpecification,
    DatasetStatus, DatasetType, DeleteMetadata, Lazy, NamedEntry, PortalError, Priority,
    Projection, Record, RecordItemQuery, RecordKey, RecordModification, RecordSelection,
    RecordStatus, Result, SubmitMeta, UpdateMetadata,
};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::ports::DatasetPort;

/// What the cache knows about the record of one (entry, specification) pair
#[derive(Debug, Clone, PartialEq)]
pub struct RecordRef {
    pub record_id: i64,
    /// Last status seen; `None` until a payload or status has been fetched
    pub status: Option<RecordStatus>,
    pub record: Lazy<Record>,
}

impl RecordRef {
    fn from_item(item: DatasetRecordItem) -> Self {
        let status = item.record.as_ref().map(|r| r.status);
        Self { record_id: item.record_id, status, record: item.record.into() }
    }

    /// `true` once the record reached a status it will not leave on its own
    pub fn is_terminal(&self) -> bool {
        self.status.is_some_and(RecordStatus::is_terminal)
    }
}

/// How bulk creation treats names that already exist on the server
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Leave the existing item untouched and report it as existing
    #[default]
    Skip,
    /// Replace the existing item
    Overwrite,
}

/// Parameters for [`Dataset::submit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOptions {
    pub specification_name: String,
    /// Entries to pair; every known entry when `None`
    pub entry_names: Option<Vec<String>>,
    pub tag: Option<String>,
    pub priority: Option<Priority>,
    /// Ask the server which pairs already exist and submit only the rest
    pub missing_only: bool,
}

impl SubmitOptions {
    pub fn new(specification_name: impl Into<String>) -> Self {
        Self {
            specification_name: specification_name.into(),
            entry_names: None,
            tag: None,
            priority: None,
            missing_only: false,
        }
    }

    #[must_use]
    pub fn entries<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entry_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    #[must_use]
    pub const fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    #[must_use]
    pub const fn missing_only(mut self) -> Self {
        self.missing_only = true;
        self
    }
}

/// Result of [`Dataset::submit`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitReport {
    /// Server verdict per submitted entry: `Inserted` is a new record,
    /// `Existing` a reused one
    pub report: BulkReport,
    /// Entries not sent because they were already paired
    pub skipped: Vec<String>,
}

/// Local mirror of one dataset of kind `K`
pub struct Dataset<K: DatasetKind> {
    metadata: DatasetMetadata,
    port: Arc<dyn DatasetPort<K>>,
    entry_names: Lazy<Vec<String>>,
    entries: BTreeMap<String, K::Entry>,
    specifications: Lazy<BTreeMap<String, DatasetSpecification>>,
    records: BTreeMap<RecordKey, RecordRef>,
}

impl<K: DatasetKind> fmt::Debug for Dataset<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dataset")
            .field("id", &self.metadata.id)
            .field("dataset_type", &K::DATASET_TYPE)
            .field("name", &self.metadata.name)
            .field("entries_cached", &self.entries.len())
            .field("records_cached", &self.records.len())
            .finish_non_exhaustive()
    }
}

impl<K: DatasetKind> Dataset<K> {
    /// Wrap server metadata; fails if the metadata is for another kind
    pub fn new(metadata: DatasetMetadata, port: Arc<dyn DatasetPort<K>>) -> Result<Self> {
        if metadata.dataset_type != K::DATASET_TYPE {
            return Err(PortalError::Contract(format!(
                "dataset {} is a {} dataset, not {}",
                metadata.id,
                metadata.dataset_type,
                K::DATASET_TYPE
            )));
        }

        Ok(Self {
            metadata,
            port,
            entry_names: Lazy::NotFetched,
            entries: BTreeMap::new(),
            specifications: Lazy::NotFetched,
            records: BTreeMap::new(),
        })
    }

    pub const fn id(&self) -> i64 {
        self.metadata.id
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub const fn dataset_type(&self) -> DatasetType {
        K::DATASET_TYPE
    }

    pub const fn metadata(&self) -> &DatasetMetadata {
        &self.metadata
    }

    // ------------------------------------------------------------------
    // Entries
    // ------------------------------------------------------------------

    /// All entry names, fetched on first use
    pub async fn entry_names(&mut self) -> Result<&[String]> {
        if !self.entry_names.is_fetched() {
            self.refresh_entry_names().await?;
        }
        Ok(self.entry_names.get().map_or(&[][..], Vec::as_slice))
    }

    /// Re-read entry names from the server; cached entry payloads are kept
    #[instrument(skip(self), fields(dataset_id = self.id()))]
    pub async fn refresh_entry_names(&mut self) -> Result<()> {
        let names = self.port.fetch_entry_names(self.id()).await?;
        debug!(count = names.len(), "fetched entry names");
        self.entry_names.set(names);
        Ok(())
    }

    /// Entry payload if it is already cached
    pub fn cached_entry(&self, name: &str) -> Option<&K::Entry> {
        self.entries.get(name)
    }

    pub fn cached_entries(&self) -> impl Iterator<Item = &K::Entry> {
        self.entries.values()
    }

    /// Fetch entry payloads into the cache (all entries when `names` is
    /// `None`). `include` uses the user-facing field names, e.g. `molecule`.
    #[instrument(skip(self, names, include), fields(dataset_id = self.id()))]
    pub async fn fetch_entries(
        &mut self,
        names: Option<&[String]>,
        include: Option<&[String]>,
    ) -> Result<usize> {
        let names = match names {
            Some(names) => names.to_vec(),
            None => self.entry_names().await?.to_vec(),
        };
        if names.is_empty() {
            return Ok(0);
        }

        let include = K::transform_entry_includes(include);
        let fetched = self.port.fetch_entries(self.id(), &names, include).await?;
        let count = fetched.len();

        for entry in fetched {
            let name = entry.name().to_string();
            self.remember_entry_name(&name);
            self.entries.insert(name, entry);
        }

        debug!(requested = names.len(), fetched = count, "fetched entries");
        Ok(count)
    }

    /// One entry, fetched on first use; `None` if the server has no such entry
    pub async fn get_entry(&mut self, name: &str) -> Result<Option<&K::Entry>> {
        if !self.entries.contains_key(name) {
            self.fetch_entries(Some(&[name.to_string()]), None).await?;
        }
        Ok(self.entries.get(name))
    }

    /// Add entries, skipping names that already exist
    pub async fn add_entries(&mut self, entries: Vec<K::NewEntry>) -> Result<BulkReport> {
        self.add_entries_with(entries, DuplicatePolicy::Skip).await
    }

    /// Add entries with an explicit duplicate policy
    ///
    /// Only names the server accepted are merged into the local name list.
    /// Existing entries keep their cached payload unless `Overwrite` is
    /// requested, in which case the stale payload is dropped and refetched
    /// on next access.
    #[instrument(skip(self, entries), fields(dataset_id = self.id(), count = entries.len()))]
    pub async fn add_entries_with(
        &mut self,
        entries: Vec<K::NewEntry>,
        policy: DuplicatePolicy,
    ) -> Result<BulkReport> {
        if entries.is_empty() {
            return Ok(BulkReport::default());
        }
        ensure_unique_names(entries.iter().map(NamedEntry::name), "entry")?;

        let overwrite = policy == DuplicatePolicy::Overwrite;
        let meta = self.port.add_entries(self.id(), &entries, overwrite).await?;
        let report =
            BulkReport::from_insert_metadata(entries.iter().map(|e| e.name().to_string()), &meta);

        for name in report.inserted().chain(report.existing()) {
            self.remember_entry_name(name);
        }
        if overwrite {
            for name in report.inserted().chain(report.existing()) {
                self.entries.remove(name);
            }
        }

        log_rejections(&report, "entry");
        info!(
            inserted = meta.n_inserted(),
            existing = meta.n_existing(),
            rejected = meta.errors.len(),
            "added entries"
        );
        Ok(report)
    }

    fn remember_entry_name(&mut self, name: &str) {
        if let Some(names) = self.entry_names.get_mut() {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }

    // ------------------------------------------------------------------
    // Specifications
    // ------------------------------------------------------------------

    /// All specifications, fetched on first use
    pub async fn specifications(&mut self) -> Result<&BTreeMap<String, DatasetSpecification>> {
        if !self.specifications.is_fetched() {
            self.refresh_specifications().await?;
        }
        self.specifications
            .get()
            .ok_or_else(|| PortalError::Internal("specifications missing after fetch".to_string()))
    }

    /// Re-read specifications from the server
    #[instrument(skip(self), fields(dataset_id = self.id()))]
    pub async fn refresh_specifications(&mut self) -> Result<()> {
        let specs = self.port.fetch_specifications(self.id()).await?;
        debug!(count = specs.len(), "fetched specifications");
        self.specifications.set(specs);
        Ok(())
    }

    pub async fn specification_names(&mut self) -> Result<Vec<String>> {
        Ok(self.specifications().await?.keys().cloned().collect())
    }

    /// Add one specification
    pub async fn add_specification(
        &mut self,
        name: impl Into<String>,
        specification: Value,
        description: Option<String>,
    ) -> Result<BulkReport> {
        let spec = DatasetSpecification { name: name.into(), specification, description };
        self.add_specifications(vec![spec]).await
    }

    /// Add specifications, skipping names that already exist
    pub async fn add_specifications(
        &mut self,
        specifications: Vec<DatasetSpecification>,
    ) -> Result<BulkReport> {
        self.add_specifications_with(specifications, DuplicatePolicy::Skip).await
    }

    /// Add specifications with an explicit duplicate policy
    #[instrument(
        skip(self, specifications),
        fields(dataset_id = self.id(), count = specifications.len())
    )]
    pub async fn add_specifications_with(
        &mut self,
        specifications: Vec<DatasetSpecification>,
        policy: DuplicatePolicy,
    ) -> Result<BulkReport> {
        if specifications.is_empty() {
            return Ok(BulkReport::default());
        }
        ensure_unique_names(specifications.iter().map(|s| s.name.as_str()), "specification")?;

        let overwrite = policy == DuplicatePolicy::Overwrite;
        let meta = self.port.add_specifications(self.id(), &specifications, overwrite).await?;
        let report =
            BulkReport::from_insert_metadata(specifications.iter().map(|s| s.name.clone()), &meta);

        let accepted: BTreeSet<&str> = if overwrite {
            report.inserted().chain(report.existing()).collect()
        } else {
            report.inserted().collect()
        };

        if let Some(cached) = self.specifications.get_mut() {
            for spec in specifications.into_iter().filter(|s| accepted.contains(s.name.as_str())) {
                cached.insert(spec.name.clone(), spec);
            }
            // The server's version of a skipped duplicate is unknown locally
            if report.existing().any(|name| !cached.contains_key(name)) {
                self.specifications = Lazy::NotFetched;
            }
        }

        log_rejections(&report, "specification");
        info!(
            inserted = meta.n_inserted(),
            existing = meta.n_existing(),
            rejected = meta.errors.len(),
            "added specifications"
        );
        Ok(report)
    }

    // ------------------------------------------------------------------
    // Records
    // ------------------------------------------------------------------

    /// Pair entries with one specification, creating or reusing records
    ///
    /// A pair that is already in the record map is never re-paired, so a
    /// second submit with different keyword overrides is a no-op for that
    /// pair. With `missing_only`, the server is asked first which pairs exist.
    #[instrument(
        skip(self, options),
        fields(dataset_id = self.id(), specification = %options.specification_name)
    )]
    pub async fn submit(&mut self, options: SubmitOptions) -> Result<SubmitReport> {
        let SubmitOptions { specification_name: spec, entry_names, tag, priority, missing_only } =
            options;

        if !self.specifications().await?.contains_key(&spec) {
            return Err(PortalError::NotFound(format!(
                "specification '{spec}' does not exist in dataset '{}'",
                self.name()
            )));
        }

        let known = self.entry_names().await?.to_vec();
        let requested = match entry_names {
            Some(names) => {
                if let Some(unknown) = names.iter().find(|n| !known.contains(n)) {
                    return Err(PortalError::NotFound(format!(
                        "entry '{unknown}' does not exist in dataset '{}'",
                        self.name()
                    )));
                }
                dedup_preserving_order(names)
            }
            None => known,
        };

        if missing_only && !requested.is_empty() {
            self.refresh_pairs(&requested, &spec).await?;
        }

        let (to_submit, skipped): (Vec<String>, Vec<String>) = requested
            .into_iter()
            .partition(|name| !self.records.contains_key(&RecordKey::new(name, &spec)));

        if to_submit.is_empty() {
            info!(skipped = skipped.len(), "nothing to submit");
            return Ok(SubmitReport { report: BulkReport::default(), skipped });
        }

        let selection = RecordSelection::entries(to_submit.iter().cloned())
            .and_specifications([spec.clone()]);
        let meta = SubmitMeta { tag, priority, find_existing: true };
        let inserted = self.port.submit(self.id(), &selection, &meta).await?;
        let report = BulkReport::from_insert_metadata(to_submit.iter().cloned(), &inserted);

        self.refresh_pairs(&to_submit, &spec).await?;

        log_rejections(&report, "submission");
        info!(
            created = inserted.n_inserted(),
            reused = inserted.n_existing(),
            skipped = skipped.len(),
            "submitted records"
        );
        Ok(SubmitReport { report, skipped })
    }

    /// Learn record ids for the given pairs without touching pairs already
    /// mapped
    async fn refresh_pairs(&mut self, entries: &[String], spec: &str) -> Result<()> {
        let query = RecordItemQuery {
            entry_names: Some(entries.to_vec()),
            specification_names: Some(vec![spec.to_string()]),
            status: None,
        };
        let items = self.port.fetch_record_items(self.id(), &query, false).await?;
        for item in items {
            self.records.entry(item.key()).or_insert_with(|| RecordRef::from_item(item));
        }
        Ok(())
    }

    /// Fetch record items matching `query` and merge them into the record map
    ///
    /// Returns the keys the server reported.
    #[instrument(skip(self, query), fields(dataset_id = self.id()))]
    pub async fn fetch_records(
        &mut self,
        query: RecordItemQuery,
        include_records: bool,
    ) -> Result<Vec<RecordKey>> {
        let items = self.port.fetch_record_items(self.id(), &query, include_records).await?;
        let keys: Vec<RecordKey> = items.iter().map(DatasetRecordItem::key).collect();
        for item in items {
            self.merge_item(item);
        }
        debug!(count = keys.len(), "merged record items");
        Ok(keys)
    }

    /// Projected record query; the result is transient and the cache is
    /// left untouched
    pub async fn query_records(
        &self,
        query: &RecordItemQuery,
        projection: &Projection,
    ) -> Result<Vec<Value>> {
        self.port.query_record_items(self.id(), query, projection).await
    }

    /// Record items with embedded records, without merging
    pub(crate) async fn port_fetch_items(
        &self,
        query: &RecordItemQuery,
    ) -> Result<Vec<DatasetRecordItem>> {
        self.port.fetch_record_items(self.id(), query, true).await
    }

    /// Merge a server record item; returns `true` when the observed status
    /// changed
    pub(crate) fn merge_item(&mut self, item: DatasetRecordItem) -> bool {
        match self.records.entry(item.key()) {
            MapEntry::Vacant(slot) => {
                let record_ref = RecordRef::from_item(item);
                let changed = record_ref.status.is_some();
                slot.insert(record_ref);
                changed
            }
            MapEntry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                if existing.record_id != item.record_id {
                    *existing = RecordRef::from_item(item);
                    return true;
                }
                match item.record {
                    Some(record) => {
                        let changed = existing.status != Some(record.status);
                        existing.status = Some(record.status);
                        existing.record.set(record);
                        changed
                    }
                    None => false,
                }
            }
        }
    }

    pub fn record_ref(&self, entry_name: &str, specification_name: &str) -> Option<&RecordRef> {
        self.records.get(&RecordKey::new(entry_name, specification_name))
    }

    /// Every cached (entry, specification) pair
    pub fn record_keys(&self) -> impl Iterator<Item = &RecordKey> {
        self.records.keys()
    }

    /// Cached record references of one specification, by entry name
    pub fn records_for<'a>(
        &'a self,
        specification_name: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a RecordRef)> {
        self.records
            .iter()
            .filter(move |(key, _)| key.specification_name == specification_name)
            .map(|(key, record_ref)| (key.entry_name.as_str(), record_ref))
    }

    /// Keys whose record is not known to be terminal
    pub fn pending_keys(&self) -> Vec<RecordKey> {
        self.records.iter().filter(|(_, r)| !r.is_terminal()).map(|(key, _)| key.clone()).collect()
    }

    /// Full record of a pair, fetched once and memoized
    ///
    /// `None` when the pair has never been submitted.
    pub async fn record(
        &mut self,
        entry_name: &str,
        specification_name: &str,
    ) -> Result<Option<&Record>> {
        let key = RecordKey::new(entry_name, specification_name);

        if !self.records.contains_key(&key) {
            let query = RecordItemQuery {
                entry_names: Some(vec![key.entry_name.clone()]),
                specification_names: Some(vec![key.specification_name.clone()]),
                status: None,
            };
            self.fetch_records(query, true).await?;
        }

        let missing_payload = match self.records.get(&key) {
            None => return Ok(None),
            Some(record_ref) if record_ref.record.is_fetched() => None,
            Some(record_ref) => Some(record_ref.record_id),
        };

        if let Some(record_id) = missing_payload {
            let record = self
                .port
                .fetch_records(&[record_id])
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| PortalError::NotFound(format!("record {record_id} for {key}")))?;
            if let Some(record_ref) = self.records.get_mut(&key) {
                record_ref.status = Some(record.status);
                record_ref.record.set(record);
            }
        }

        Ok(self.records.get(&key).and_then(|r| r.record.get()))
    }

    /// Apply a bulk state change, then reload the affected records
    #[instrument(skip(self, selection, modification), fields(dataset_id = self.id()))]
    pub async fn modify_records(
        &mut self,
        selection: RecordSelection,
        modification: RecordModification,
    ) -> Result<UpdateMetadata> {
        if modification.is_noop() {
            return Ok(UpdateMetadata::default());
        }
        let meta = self.port.modify_records(self.id(), &selection, &modification).await?;
        self.reload_selection(&selection).await?;
        info!(updated = meta.n_updated(), errors = meta.errors.len(), "modified records");
        Ok(meta)
    }

    /// Undo a `revert_status` transition, then reload the affected records
    #[instrument(skip(self, selection), fields(dataset_id = self.id()))]
    pub async fn revert_records(
        &mut self,
        selection: RecordSelection,
        revert_status: RecordStatus,
    ) -> Result<UpdateMetadata> {
        let meta = self.port.revert_records(self.id(), &selection, revert_status).await?;
        self.reload_selection(&selection).await?;
        info!(updated = meta.n_updated(), errors = meta.errors.len(), "reverted records");
        Ok(meta)
    }

    async fn reload_selection(&mut self, selection: &RecordSelection) -> Result<()> {
        let query = RecordItemQuery {
            entry_names: selection.entry_names.clone(),
            specification_names: selection.specification_names.clone(),
            status: None,
        };
        self.fetch_records(query, true).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Deletion
    // ------------------------------------------------------------------

    /// Delete entries; entries with records need `delete_records`
    #[instrument(skip(self, names), fields(dataset_id = self.id(), count = names.len()))]
    pub async fn delete_entries(
        &mut self,
        names: &[String],
        delete_records: bool,
    ) -> Result<DeleteMetadata> {
        if names.is_empty() {
            return Ok(DeleteMetadata::default());
        }
        if !delete_records {
            if let Some(key) = self.records.keys().find(|k| names.contains(&k.entry_name)) {
                return Err(PortalError::Conflict(format!(
                    "entry '{}' still has records (e.g. {key}); set delete_records to cascade",
                    key.entry_name
                )));
            }
        }

        let meta = self.port.delete_entries(self.id(), names, delete_records).await?;
        for name in deleted_names(names, &meta) {
            self.entries.remove(name);
            if let Some(cached) = self.entry_names.get_mut() {
                cached.retain(|n| n != name);
            }
            self.records.retain(|key, _| key.entry_name != *name);
        }

        info!(deleted = meta.n_deleted(), children = meta.n_children_deleted, "deleted entries");
        Ok(meta)
    }

    /// Delete specifications; specifications with records need
    /// `delete_records`
    #[instrument(skip(self, names), fields(dataset_id = self.id(), count = names.len()))]
    pub async fn delete_specifications(
        &mut self,
        names: &[String],
        delete_records: bool,
    ) -> Result<DeleteMetadata> {
        if names.is_empty() {
            return Ok(DeleteMetadata::default());
        }
        if !delete_records {
            if let Some(key) = self.records.keys().find(|k| names.contains(&k.specification_name)) {
                return Err(PortalError::Conflict(format!(
                    "specification '{}' still has records (e.g. {key}); set delete_records to cascade",
                    key.specification_name
                )));
            }
        }

        let meta = self.port.delete_specifications(self.id(), names, delete_records).await?;
        for name in deleted_names(names, &meta) {
            if let Some(cached) = self.specifications.get_mut() {
                cached.remove(name);
            }
            self.records.retain(|key, _| key.specification_name != *name);
        }

        info!(
            deleted = meta.n_deleted(),
            children = meta.n_children_deleted,
            "deleted specifications"
        );
        Ok(meta)
    }

    /// Detach records from the dataset (and delete them when
    /// `delete_records` is set)
    #[instrument(skip(self, selection), fields(dataset_id = self.id()))]
    pub async fn delete_records(
        &mut self,
        selection: RecordSelection,
        delete_records: bool,
    ) -> Result<DeleteMetadata> {
        let meta = self.port.delete_record_items(self.id(), &selection, delete_records).await?;
        let mut removed = BTreeMap::new();
        self.records.retain(|key, record_ref| {
            if selection.matches(key) {
                removed.insert(key.clone(), record_ref.clone());
                false
            } else {
                true
            }
        });

        if !meta.success() {
            warn!(
                errors = meta.errors.len(),
                "some record items were not removed; reloading selection"
            );
            let query = RecordItemQuery {
                entry_names: selection.entry_names.clone(),
                specification_names: selection.specification_names.clone(),
                status: None,
            };
            // Survivors keep their status and memoized payload.
            for key in self.fetch_records(query, false).await? {
                let Some(previous) = removed.remove(&key) else { continue };
                if self.records.get(&key).is_some_and(|r| r.record_id == previous.record_id) {
                    self.records.insert(key, previous);
                }
            }
        }

        info!(deleted = meta.n_deleted(), "deleted record items");
        Ok(meta)
    }

    /// Status counts per specification, straight from the server
    pub async fn status(&self) -> Result<DatasetStatus> {
        self.port.status(self.id()).await
    }
}

fn ensure_unique_names<'a>(names: impl Iterator<Item = &'a str>, what: &str) -> Result<()> {
    let mut seen = BTreeSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(PortalError::Contract(format!(
                "{what} name '{name}' appears more than once in one request"
            )));
        }
    }
    Ok(())
}

fn dedup_preserving_order(names: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    names.into_iter().filter(|n| seen.insert(n.clone())).collect()
}

fn deleted_names<'a>(
    names: &'a [String],
    meta: &DeleteMetadata,
) -> impl Iterator<Item = &'a String> {
    let deleted: BTreeSet<usize> = meta.deleted_idx.iter().copied().collect();
    names.iter().enumerate().filter(move |(idx, _)| deleted.contains(idx)).map(|(_, name)| name)
}

fn log_rejections(report: &BulkReport, what: &str) {
    for (name, reason) in report.rejected() {
        warn!(name, reason, "{what} rejected by server");
    }
}
