//! Client configuration structures

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{PortalError, Result};

/// Connection settings, usually read from `qcportal_config.yaml`
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Server address, with or without scheme (`host:port` implies https)
    pub address: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    /// Verify the server's TLS certificate
    #[serde(default = "default_verify")]
    pub verify: bool,
}

impl fmt::Debug for PortalConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortalConfig")
            .field("address", &self.address)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("verify", &self.verify)
            .finish()
    }
}

const fn default_verify() -> bool {
    true
}

impl PortalConfig {
    /// Anonymous configuration for `address`
    pub fn new(address: impl Into<String>) -> Self {
        Self { address: address.into(), username: None, password: None, verify: true }
    }

    /// Attach login credentials
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Toggle TLS certificate verification
    #[must_use]
    pub const fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Credentials, when both halves are present
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }

    /// Normalized base address and the effective verification flag
    ///
    /// A missing scheme becomes `https://`, plain `http://` always verifies
    /// and the result ends with `/`.
    pub fn normalized(&self) -> Result<(String, bool)> {
        let trimmed = self.address.trim();
        if trimmed.is_empty() {
            return Err(PortalError::Config("address must not be empty".to_string()));
        }

        let mut address = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };

        let verify = if address.starts_with("https://") { self.verify } else { true };

        if !address.ends_with('/') {
            address.push('/');
        }

        Ok((address, verify))
    }
}
