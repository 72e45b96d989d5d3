//! Server API client
//!
//! This module provides the authenticated, typed client for a portal
//! server: JWT login and refresh, contract-checked request dispatch, the
//! top-level dataset and record operations, and the HTTP implementation of
//! the dataset port used by `qcportal-core`.
//!
//! # Architecture
//!
//! - All traffic goes through [`crate::http::HttpClient`] (no direct reqwest)
//! - One reactive token refresh per request on an expired-token 401
//! - No retries; connectivity failures surface immediately

pub mod auth;
pub mod client;
pub mod datasets;
pub mod dispatcher;
pub mod errors;

pub use auth::{AccessTokenProvider, AuthManager, AuthState};
pub use client::{ClientOptions, PortalClient};
pub use dispatcher::{query_pairs, Dispatcher, Endpoint};
pub use errors::{error_details, request_error};
