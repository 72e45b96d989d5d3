//! Dataset cache and synchronization
//!
//! [`Dataset`] mirrors one server dataset behind the [`DatasetPort`] trait,
//! [`AnyDataset`] selects the kind at runtime, and `iterate_updated` waits
//! for asynchronous computation to finish.

pub mod any;
pub mod cache;
pub mod ports;
pub mod sync;

pub use any::{AnyDataset, AnyDatasetPort};
pub use cache::{Dataset, DuplicatePolicy, RecordRef, SubmitOptions, SubmitReport};
pub use ports::DatasetPort;
pub use sync::{PollExit, PollOptions, UpdateReport};
