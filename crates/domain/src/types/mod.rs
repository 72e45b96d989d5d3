//! Wire models exchanged with the server

pub mod dataset;
pub mod envelope;
pub mod kinds;
pub mod lazy;
pub mod query;
pub mod record;
pub mod server;

pub use dataset::{
    DatasetAddBody, DatasetListItem, DatasetMetadata, DatasetRecordItem, DatasetSpecification,
    DatasetStatus, DatasetType, RecordKey, RecordSelection,
};
pub use envelope::{
    BulkReport, DeleteMeta, DeleteMetadata, Envelope, InsertMetadata, ItemOutcome, OverwriteMeta,
    UpdateMetadata,
};
pub use kinds::{
    DatasetKind, Entry, Gridoptimization, InitialMoleculeData, InitialMoleculeInput,
    InitialMoleculesData, InitialMoleculesInput, Manybody, MoleculeEntryData, MoleculeEntryInput,
    MoleculeInput, NamedEntry, NewEntry, Optimization, Reaction, ReactionData, ReactionInput,
    Singlepoint, StoichiometryData, StoichiometryInput, Torsiondrive,
};
pub use lazy::Lazy;
pub use query::{
    DatasetQueryBody, EntryFetchBody, Projection, RecordItemQuery, RecordModification,
    RecordsFetchBody, RevertMeta, SubmitMeta,
};
pub use record::{Priority, Record, RecordStatus};
pub use server::ServerInfo;
