//! # QCPortal Core
//!
//! Dataset cache and synchronization engine - no HTTP.
//!
//! This crate contains:
//! - The `DatasetPort` interface the server adapter implements
//! - `Dataset<K>`, the lazily populated local mirror of one dataset
//! - `AnyDataset`, runtime selection over the dataset kinds
//! - The bounded `iterate_updated` polling loop
//!
//! ## Architecture Principles
//! - Only depends on `qcportal-domain`
//! - All server access goes through `DatasetPort`
//! - Mutating cache operations take `&mut self`; callers serialize access

pub mod datasets;

// Re-export specific items to avoid ambiguity
pub use datasets::{
    AnyDataset, AnyDatasetPort, Dataset, DatasetPort, DuplicatePolicy, PollExit, PollOptions,
    RecordRef, SubmitOptions, SubmitReport, UpdateReport,
};
