//! Server information returned by `v1/information`

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{PortalError, Result};
use crate::utils::version::Version;

/// General information about a server, cached by the client at connect time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    /// Per-endpoint row limits (e.g. `get_records`)
    #[serde(default)]
    pub api_limits: BTreeMap<String, u64>,
    pub client_version_lower_limit: String,
    pub client_version_upper_limit: String,
    /// Fields this client does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServerInfo {
    /// Row limit for a named API operation
    pub fn api_limit(&self, name: &str) -> Option<u64> {
        self.api_limits.get(name).copied()
    }

    /// Reject clients outside `[client_version_lower_limit, client_version_upper_limit]`
    pub fn check_client_version(&self, client: &Version) -> Result<()> {
        let lower: Version =
            self.client_version_lower_limit.parse().map_err(PortalError::Serialization)?;
        let upper: Version =
            self.client_version_upper_limit.parse().map_err(PortalError::Serialization)?;

        if client.within(&lower, &upper) {
            Ok(())
        } else {
            Err(PortalError::VersionIncompatible {
                client: client.to_string(),
                lower: lower.to_string(),
                upper: upper.to_string(),
            })
        }
    }
}
