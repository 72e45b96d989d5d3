//! # QCPortal Domain
//!
//! Value types and the error taxonomy shared by every QCPortal crate.
//!
//! This crate contains:
//! - Wire models (server info, records, datasets, bulk-operation metadata)
//! - The dataset kind capabilities (`DatasetKind`) and per-kind entry payloads
//! - Domain error types and the `Result` alias
//! - Client configuration structures
//!
//! ## Architecture
//! - No dependencies on other QCPortal crates
//! - No I/O; transport and caching live in `qcportal-infra` and `qcportal-core`

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
pub use utils::version::Version;
