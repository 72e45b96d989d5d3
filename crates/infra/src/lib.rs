//! # QCPortal Infrastructure
//!
//! Network-facing implementations of the QCPortal client.
//!
//! This crate contains:
//! - The HTTP transport and wire encodings
//! - Session authentication (login, token refresh)
//! - The typed request dispatcher and [`PortalClient`]
//! - The HTTP implementation of the dataset port from `qcportal-core`
//! - The YAML configuration loader and logging bootstrap
//!
//! ## Architecture
//! - Implements traits defined in `qcportal-core`
//! - Depends on `qcportal-domain` and `qcportal-core`
//! - Contains all "impure" code (network and file I/O)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod logging;

// Re-export commonly used items
pub use api::{
    AccessTokenProvider, AuthManager, AuthState, ClientOptions, Dispatcher, Endpoint, PortalClient,
};
pub use config::load_from_file;
pub use http::{Encoding, HttpClient};
pub use logging::init_tracing;
