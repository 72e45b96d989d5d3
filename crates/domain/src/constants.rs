//! Client constants
//!
//! Centralized location for the wire-level and configuration constants used
//! throughout the client.

// Configuration constants
pub const CONFIG_FILE_NAME: &str = "qcportal_config.yaml";
pub const CONFIG_HOME_DIR: &str = ".qca";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const USER_AGENT_PREFIX: &str = "qcportal";

/// Version of this client, checked against the server's allowed window
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

// Authentication
pub const EXPIRED_TOKEN_MESSAGE: &str = "Token has expired";
pub const MAX_TOKEN_REFRESHES: u32 = 1;

// Content types
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_CBOR: &str = "application/cbor";

// Server endpoints (relative to the base address)
pub const ENDPOINT_INFORMATION: &str = "v1/information";
pub const ENDPOINT_PING: &str = "v1/ping";
pub const ENDPOINT_LOGIN: &str = "v1/login";
pub const ENDPOINT_REFRESH: &str = "v1/refresh";
pub const ENDPOINT_DATASETS: &str = "v1/datasets";
pub const ENDPOINT_RECORDS_BULK_FETCH: &str = "v1/records/bulkFetch";

// Update polling defaults
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_POLL_MAX_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_POLL_BACKOFF_FACTOR: f64 = 1.5;
pub const DEFAULT_POLL_MAX_ITERATIONS: u32 = 100;
