//! In-memory stand-in for the dataset endpoints

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;
use qcportal_core::DatasetPort;
use qcportal_domain::{
    DatasetKind, DatasetRecordItem, DatasetSpecification, DatasetStatus, DeleteMetadata,
    InsertMetadata, NamedEntry, PortalError, Projection, Record, RecordItemQuery, RecordKey,
    RecordModification, RecordSelection, RecordStatus, Result, SubmitMeta, UpdateMetadata,
};
use serde_json::{json, Map, Value};

/// Number of calls per port operation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Calls {
    pub entry_names: usize,
    pub fetch_entries: usize,
    pub add_entries: usize,
    pub fetch_specifications: usize,
    pub submit: usize,
    pub record_items: usize,
    pub record_queries: usize,
    pub record_payloads: usize,
    pub deletes: usize,
}

#[derive(Debug, Clone, Copy)]
struct FakeRecord {
    id: i64,
    status: RecordStatus,
    polls_left: u32,
}

#[derive(Debug, Default)]
struct State {
    entry_order: Vec<String>,
    entries: BTreeMap<String, Value>,
    specifications: BTreeMap<String, DatasetSpecification>,
    records: BTreeMap<RecordKey, FakeRecord>,
    /// Record items that refuse to be deleted
    protected: BTreeSet<RecordKey>,
    next_record_id: i64,
    next_molecule_id: i64,
    polls_to_complete: u32,
    calls: Calls,
}

impl State {
    fn new_record(&mut self) -> FakeRecord {
        self.next_record_id += 1;
        FakeRecord {
            id: self.next_record_id,
            status: RecordStatus::Waiting,
            polls_left: self.polls_to_complete,
        }
    }

    /// Store an entry, resolving molecule ids the way the server does
    fn store_entry(&mut self, mut entry: Value) -> String {
        let obj = entry.as_object_mut().expect("entries serialize to objects");
        for field in ["molecule", "initial_molecule"] {
            if let Some(molecule) = obj.get(field).cloned() {
                let id = molecule.as_i64().unwrap_or_else(|| {
                    self.next_molecule_id += 1;
                    self.next_molecule_id
                });
                obj.insert(format!("{field}_id"), json!(id));
                obj.insert(field.to_string(), json!({"id": id}));
            }
        }
        let name = obj["name"].as_str().expect("entries carry a name").to_string();
        if !self.entries.contains_key(&name) {
            self.entry_order.push(name.clone());
        }
        self.entries.insert(name.clone(), entry);
        name
    }

    fn selected_keys(&self, selection: &RecordSelection) -> Vec<RecordKey> {
        self.records.keys().filter(|key| selection.matches(key)).cloned().collect()
    }

    /// Remove every record matching `pred`; returns how many were removed
    fn drop_records(&mut self, pred: impl Fn(&RecordKey) -> bool) -> usize {
        let before = self.records.len();
        self.records.retain(|key, _| !pred(key));
        before - self.records.len()
    }
}

/// Fake dataset server
///
/// Records created by a submit start as `waiting`, turn `running` on the
/// first poll and `complete` after `polls_to_complete` polls. Only fetches
/// that embed records count as polls.
#[derive(Debug)]
pub struct FakeServer {
    state: Mutex<State>,
}

impl Default for FakeServer {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeServer {
    pub fn new() -> Self {
        let state = State { polls_to_complete: 1, next_molecule_id: 1000, ..State::default() };
        Self { state: Mutex::new(state) }
    }

    #[must_use]
    pub fn with_entry(self, name: &str, molecule_id: i64) -> Self {
        self.lock().store_entry(json!({"name": name, "molecule": molecule_id}));
        self
    }

    #[must_use]
    pub fn with_specification(self, name: &str) -> Self {
        let spec = DatasetSpecification::new(name, json!({"program": "psi4", "method": name}));
        self.lock().specifications.insert(name.to_string(), spec);
        self
    }

    /// Seed a record that already exists on the server
    #[must_use]
    pub fn with_record(self, entry: &str, specification: &str, status: RecordStatus) -> Self {
        {
            let mut state = self.lock();
            let mut record = state.new_record();
            record.status = status;
            state.records.insert(RecordKey::new(entry, specification), record);
        }
        self
    }

    /// Make deleting the record item of a pair fail
    #[must_use]
    pub fn protect_record(self, entry: &str, specification: &str) -> Self {
        self.lock().protected.insert(RecordKey::new(entry, specification));
        self
    }

    /// Polls needed before a new record completes; `u32::MAX` never completes
    #[must_use]
    pub fn polls_to_complete(self, polls: u32) -> Self {
        self.lock().polls_to_complete = polls;
        self
    }

    pub fn calls(&self) -> Calls {
        self.lock().calls.clone()
    }

    pub fn record_count(&self) -> usize {
        self.lock().records.len()
    }

    pub fn record_status(&self, entry: &str, specification: &str) -> Option<RecordStatus> {
        self.lock().records.get(&RecordKey::new(entry, specification)).map(|r| r.status)
    }

    pub fn stored_entry(&self, name: &str) -> Option<Value> {
        self.lock().entries.get(name).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("fake server state poisoned")
    }
}

fn to_record<K: DatasetKind>(record: &FakeRecord) -> Record {
    Record {
        id: record.id,
        record_type: Some(K::DATASET_TYPE.to_string()),
        status: record.status,
        is_service: false,
        compute_tag: Some("*".to_string()),
        compute_priority: None,
        created_on: None,
        modified_on: None,
        extra: Map::new(),
    }
}

/// Strip embedded molecules unless they were asked for
fn project_entry(stored: &Value, include: Option<&BTreeSet<String>>) -> Value {
    let mut entry = stored.clone();
    if let Some(obj) = entry.as_object_mut() {
        for field in ["molecule", "initial_molecule"] {
            if !include.is_some_and(|inc| inc.contains(field)) {
                obj.remove(field);
            }
        }
    }
    entry
}

#[async_trait]
impl<K: DatasetKind> DatasetPort<K> for FakeServer {
    async fn fetch_entry_names(&self, _dataset_id: i64) -> Result<Vec<String>> {
        let mut state = self.lock();
        state.calls.entry_names += 1;
        Ok(state.entry_order.clone())
    }

    async fn fetch_entries(
        &self,
        _dataset_id: i64,
        names: &[String],
        include: Option<BTreeSet<String>>,
    ) -> Result<Vec<K::Entry>> {
        let mut state = self.lock();
        state.calls.fetch_entries += 1;
        names
            .iter()
            .filter_map(|name| state.entries.get(name))
            .map(|stored| Ok(serde_json::from_value(project_entry(stored, include.as_ref()))?))
            .collect()
    }

    async fn add_entries(
        &self,
        _dataset_id: i64,
        entries: &[K::NewEntry],
        overwrite_existing: bool,
    ) -> Result<InsertMetadata> {
        let mut state = self.lock();
        state.calls.add_entries += 1;
        let mut meta = InsertMetadata::default();
        for (idx, entry) in entries.iter().enumerate() {
            if entry.name().is_empty() {
                meta.errors.push((idx, "entry name must not be empty".to_string()));
            } else if state.entries.contains_key(entry.name()) {
                if overwrite_existing {
                    state.store_entry(serde_json::to_value(entry)?);
                }
                meta.existing_idx.push(idx);
            } else {
                state.store_entry(serde_json::to_value(entry)?);
                meta.inserted_idx.push(idx);
            }
        }
        Ok(meta)
    }

    async fn fetch_specifications(
        &self,
        _dataset_id: i64,
    ) -> Result<BTreeMap<String, DatasetSpecification>> {
        let mut state = self.lock();
        state.calls.fetch_specifications += 1;
        Ok(state.specifications.clone())
    }

    async fn add_specifications(
        &self,
        _dataset_id: i64,
        specifications: &[DatasetSpecification],
        overwrite_existing: bool,
    ) -> Result<InsertMetadata> {
        let mut state = self.lock();
        let mut meta = InsertMetadata::default();
        for (idx, spec) in specifications.iter().enumerate() {
            if state.specifications.contains_key(&spec.name) {
                if overwrite_existing {
                    state.specifications.insert(spec.name.clone(), spec.clone());
                }
                meta.existing_idx.push(idx);
            } else {
                state.specifications.insert(spec.name.clone(), spec.clone());
                meta.inserted_idx.push(idx);
            }
        }
        Ok(meta)
    }

    async fn submit(
        &self,
        _dataset_id: i64,
        selection: &RecordSelection,
        _meta: &SubmitMeta,
    ) -> Result<InsertMetadata> {
        let mut state = self.lock();
        state.calls.submit += 1;

        let entries = selection.entry_names.clone().unwrap_or_else(|| state.entry_order.clone());
        let specs = selection
            .specification_names
            .clone()
            .unwrap_or_else(|| state.specifications.keys().cloned().collect());

        let mut meta = InsertMetadata::default();
        let mut idx = 0;
        for spec in &specs {
            for entry in &entries {
                if !state.entries.contains_key(entry) || !state.specifications.contains_key(spec) {
                    meta.errors.push((idx, format!("unknown pair ({entry}, {spec})")));
                } else {
                    let key = RecordKey::new(entry, spec);
                    if state.records.contains_key(&key) {
                        meta.existing_idx.push(idx);
                    } else {
                        let record = state.new_record();
                        state.records.insert(key, record);
                        meta.inserted_idx.push(idx);
                    }
                }
                idx += 1;
            }
        }
        Ok(meta)
    }

    async fn fetch_record_items(
        &self,
        _dataset_id: i64,
        query: &RecordItemQuery,
        include_records: bool,
    ) -> Result<Vec<DatasetRecordItem>> {
        let mut state = self.lock();
        state.calls.record_items += 1;

        let selection = RecordSelection {
            entry_names: query.entry_names.clone(),
            specification_names: query.specification_names.clone(),
        };
        let mut items = Vec::new();
        for key in state.selected_keys(&selection) {
            let Some(record) = state.records.get_mut(&key) else { continue };
            if include_records && !record.status.is_terminal() {
                record.polls_left = record.polls_left.saturating_sub(1);
                record.status = if record.polls_left == 0 {
                    RecordStatus::Complete
                } else {
                    RecordStatus::Running
                };
            }
            if query.status.as_ref().is_some_and(|wanted| !wanted.contains(&record.status)) {
                continue;
            }
            items.push(DatasetRecordItem {
                entry_name: key.entry_name.clone(),
                specification_name: key.specification_name.clone(),
                record_id: record.id,
                record: include_records.then(|| to_record::<K>(record)),
            });
        }
        Ok(items)
    }

    async fn query_record_items(
        &self,
        _dataset_id: i64,
        query: &RecordItemQuery,
        projection: &Projection,
    ) -> Result<Vec<Value>> {
        let mut state = self.lock();
        state.calls.record_queries += 1;

        let selection = RecordSelection {
            entry_names: query.entry_names.clone(),
            specification_names: query.specification_names.clone(),
        };
        let rows = state
            .selected_keys(&selection)
            .into_iter()
            .map(|key| {
                let record = state.records[&key];
                let mut row = json!({
                    "entry_name": key.entry_name,
                    "specification_name": key.specification_name,
                    "record_id": record.id,
                    "status": record.status,
                });
                if let (Some(include), Some(obj)) = (&projection.include, row.as_object_mut()) {
                    obj.retain(|field, _| include.contains(field));
                }
                row
            })
            .collect();
        Ok(rows)
    }

    async fn fetch_records(&self, record_ids: &[i64]) -> Result<Vec<Record>> {
        let mut state = self.lock();
        state.calls.record_payloads += 1;
        Ok(record_ids
            .iter()
            .filter_map(|id| state.records.values().find(|r| r.id == *id))
            .map(to_record::<K>)
            .collect())
    }

    async fn modify_records(
        &self,
        _dataset_id: i64,
        selection: &RecordSelection,
        modification: &RecordModification,
    ) -> Result<UpdateMetadata> {
        let mut state = self.lock();
        let mut meta = UpdateMetadata::default();
        for (idx, key) in state.selected_keys(selection).into_iter().enumerate() {
            if let (Some(status), Some(record)) =
                (modification.status, state.records.get_mut(&key))
            {
                record.status = status;
            }
            meta.updated_idx.push(idx);
        }
        Ok(meta)
    }

    async fn revert_records(
        &self,
        _dataset_id: i64,
        selection: &RecordSelection,
        revert_status: RecordStatus,
    ) -> Result<UpdateMetadata> {
        let mut state = self.lock();
        let polls = state.polls_to_complete;
        let mut meta = UpdateMetadata::default();
        for (idx, key) in state.selected_keys(selection).into_iter().enumerate() {
            if let Some(record) = state.records.get_mut(&key) {
                if record.status == revert_status {
                    record.status = RecordStatus::Waiting;
                    record.polls_left = polls;
                    meta.updated_idx.push(idx);
                }
            }
        }
        Ok(meta)
    }

    async fn delete_entries(
        &self,
        _dataset_id: i64,
        names: &[String],
        delete_records: bool,
    ) -> Result<DeleteMetadata> {
        let mut state = self.lock();
        state.calls.deletes += 1;

        if !delete_records {
            if let Some(key) = state.records.keys().find(|k| names.contains(&k.entry_name)) {
                return Err(PortalError::Conflict(format!(
                    "entry '{}' has records",
                    key.entry_name
                )));
            }
        }

        let mut meta = DeleteMetadata::default();
        for (idx, name) in names.iter().enumerate() {
            if state.entries.remove(name).is_none() {
                meta.errors.push((idx, format!("entry '{name}' does not exist")));
                continue;
            }
            state.entry_order.retain(|n| n != name);
            meta.n_children_deleted += state.drop_records(|key| key.entry_name == *name);
            meta.deleted_idx.push(idx);
        }
        Ok(meta)
    }

    async fn delete_specifications(
        &self,
        _dataset_id: i64,
        names: &[String],
        delete_records: bool,
    ) -> Result<DeleteMetadata> {
        let mut state = self.lock();
        state.calls.deletes += 1;

        if !delete_records {
            if let Some(key) =
                state.records.keys().find(|k| names.contains(&k.specification_name))
            {
                return Err(PortalError::Conflict(format!(
                    "specification '{}' has records",
                    key.specification_name
                )));
            }
        }

        let mut meta = DeleteMetadata::default();
        for (idx, name) in names.iter().enumerate() {
            if state.specifications.remove(name).is_none() {
                meta.errors.push((idx, format!("specification '{name}' does not exist")));
                continue;
            }
            meta.n_children_deleted += state.drop_records(|key| key.specification_name == *name);
            meta.deleted_idx.push(idx);
        }
        Ok(meta)
    }

    async fn delete_record_items(
        &self,
        _dataset_id: i64,
        selection: &RecordSelection,
        _delete_records: bool,
    ) -> Result<DeleteMetadata> {
        let mut state = self.lock();
        state.calls.deletes += 1;
        let keys = state.selected_keys(selection);
        let mut meta = DeleteMetadata::default();
        for (idx, key) in keys.iter().enumerate() {
            if state.protected.contains(key) {
                meta.errors.push((idx, format!("record item {key} is locked")));
                continue;
            }
            state.records.remove(key);
            meta.deleted_idx.push(idx);
        }
        Ok(meta)
    }

    async fn status(&self, _dataset_id: i64) -> Result<DatasetStatus> {
        let state = self.lock();
        let mut status = DatasetStatus::new();
        for (key, record) in &state.records {
            *status
                .entry(key.specification_name.clone())
                .or_default()
                .entry(record.status)
                .or_default() += 1;
        }
        Ok(status)
    }
}
