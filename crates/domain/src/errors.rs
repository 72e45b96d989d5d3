//! Error types used throughout the client

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::constants::EXPIRED_TOKEN_MESSAGE;

/// Why a connection to the server could not be established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivityFailure {
    /// The TLS handshake failed (untrusted, expired or self-signed certificate)
    TlsHandshake,
    /// DNS failure, refused connection or unreachable host
    Unreachable,
    /// The exchange did not finish within the session timeout
    TimedOut,
}

impl ConnectivityFailure {
    /// Human guidance attached to connectivity errors
    pub const fn guidance(self) -> &'static str {
        match self {
            Self::TlsHandshake => {
                "SSL handshake failed. This is likely caused by a failure to verify the server \
                 certificate. If you trust the server you are connecting to, try again with \
                 `verify: false`"
            }
            Self::Unreachable => {
                "please make sure the server is running and the address is correct"
            }
            Self::TimedOut => "the request timed out before the server responded",
        }
    }
}

impl fmt::Display for ConnectivityFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::TlsHandshake => "tls handshake",
            Self::Unreachable => "unreachable",
            Self::TimedOut => "timed out",
        };
        f.write_str(label)
    }
}

/// Error reported by the server for an exchange that completed with a
/// non-200 status
///
/// `details` always carries a `msg` key; when the server body has none, the
/// HTTP reason phrase is used.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("Request failed: {message} (HTTP status {status_code})")]
pub struct RequestError {
    /// Message shown to callers
    pub message: String,
    /// HTTP status code of the failed exchange
    pub status_code: u16,
    /// Decoded error body
    pub details: Map<String, Value>,
}

impl RequestError {
    /// Builds a request error from a decoded body, falling back to `reason`
    /// when the body carries no `msg`
    pub fn from_details(status_code: u16, mut details: Map<String, Value>, reason: &str) -> Self {
        if !details.contains_key("msg") {
            details.insert("msg".to_string(), Value::String(reason.to_string()));
        }

        let message = match details.get("msg") {
            Some(Value::String(msg)) => msg.clone(),
            Some(other) => other.to_string(),
            None => reason.to_string(),
        };

        Self { message, status_code, details }
    }

    /// `true` when the server rejected the access token because it expired
    pub fn is_expired_token(&self) -> bool {
        self.status_code == 401 && self.message.contains(EXPIRED_TOKEN_MESSAGE)
    }
}

/// Coarse grouping of errors for callers that branch on the kind of failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-level failures
    Connectivity,
    /// Login or token refresh failures
    Authentication,
    /// The server answered with a non-200 status
    Request,
    /// The caller misused an endpoint or a cached object
    Contract,
    /// Client and server versions are incompatible
    Compatibility,
    /// Configuration could not be loaded
    Config,
    /// Wire data could not be encoded or decoded
    Data,
    /// Anything else
    Internal,
}

/// Main error type for the QCPortal client
#[derive(Error, Debug)]
pub enum PortalError {
    #[error("Could not connect to server {address}: {}", failure.guidance())]
    Connectivity { address: String, failure: ConnectivityFailure },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Unable to refresh JWT authorization token: {0}")]
    TokenRefresh(String),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("Invalid use of endpoint: {0}")]
    Contract(String),

    #[error(
        "This client version {client} does not fall within the server's allowed client versions \
         of [{lower}, {upper}]. You may need to upgrade or downgrade"
    )]
    VersionIncompatible { client: String, lower: String, upper: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PortalError {
    /// Shorthand for a connectivity error against `address`
    pub fn connectivity(address: impl Into<String>, failure: ConnectivityFailure) -> Self {
        Self::Connectivity { address: address.into(), failure }
    }

    /// Error category used for branching and logging
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Connectivity { .. } => ErrorCategory::Connectivity,
            Self::Authentication(_) | Self::TokenRefresh(_) => ErrorCategory::Authentication,
            Self::Request(_) | Self::NotFound(_) | Self::Conflict(_) => ErrorCategory::Request,
            Self::Contract(_) => ErrorCategory::Contract,
            Self::VersionIncompatible { .. } => ErrorCategory::Compatibility,
            Self::Config(_) => ErrorCategory::Config,
            Self::Serialization(_) => ErrorCategory::Data,
            Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Only network failures are worth retrying; server verdicts are final
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Connectivity { .. })
    }

    /// HTTP status of the failed exchange, if the server answered
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Request(err) => Some(err.status_code),
            _ => None,
        }
    }

    /// Borrow the request error, if this is one
    pub const fn as_request_error(&self) -> Option<&RequestError> {
        match self {
            Self::Request(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for PortalError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for QCPortal operations
pub type Result<T> = std::result::Result<T, PortalError>;
