//! Conversions from external infrastructure errors into domain errors.

use std::error::Error as StdError;

use qcportal_domain::{ConnectivityFailure, PortalError};
use reqwest::Error as HttpError;

/// Conversion that needs the server address to produce a useful message.
pub trait IntoPortalError {
    fn into_portal(self, address: &str) -> PortalError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → PortalError */
/* -------------------------------------------------------------------------- */

impl IntoPortalError for HttpError {
    fn into_portal(self, address: &str) -> PortalError {
        if self.is_builder() {
            return PortalError::Config(format!("failed to build HTTP request: {self}"));
        }
        if self.is_decode() {
            return PortalError::Serialization(format!("failed to read response body: {self}"));
        }
        if self.is_timeout() {
            return PortalError::connectivity(address, ConnectivityFailure::TimedOut);
        }
        if is_tls_failure(&self) {
            return PortalError::connectivity(address, ConnectivityFailure::TlsHandshake);
        }
        PortalError::connectivity(address, ConnectivityFailure::Unreachable)
    }
}

/// Walk the source chain looking for a TLS or certificate failure
///
/// reqwest reports handshake failures as plain connect errors; only the
/// messages of the underlying rustls/io errors tell them apart.
pub(crate) fn is_tls_failure(err: &(dyn StdError + 'static)) -> bool {
    const MARKERS: [&str; 4] = ["certificate", "tls", "ssl", "handshake"];

    let mut current = Some(err);
    while let Some(e) = current {
        let message = e.to_string().to_ascii_lowercase();
        if MARKERS.iter().any(|marker| message.contains(marker)) {
            return true;
        }
        current = e.source();
    }
    false
}
