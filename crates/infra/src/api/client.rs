//! Portal client
//!
//! [`PortalClient`] owns one authenticated session against one server. It
//! is built with [`PortalClient::connect`], which logs in when credentials
//! are configured, fetches the server information and refuses to continue
//! when this client's version is outside the server's accepted window.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use qcportal_core::AnyDataset;
use qcportal_domain::constants::{
    CLIENT_VERSION, DEFAULT_TIMEOUT_SECS, ENDPOINT_DATASETS, ENDPOINT_INFORMATION, ENDPOINT_PING,
    ENDPOINT_RECORDS_BULK_FETCH,
};
use qcportal_domain::{
    DatasetAddBody, DatasetListItem, DatasetMetadata, DatasetQueryBody, DatasetType, DeleteMeta,
    PortalConfig, PortalError, Projection, Record, RecordsFetchBody, Result, ServerInfo, Version,
};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::auth::{AuthManager, AuthState};
use super::dispatcher::{Dispatcher, Endpoint};
use crate::config::load_from_file;
use crate::http::{decode_response, Encoding, HttpClient, PreparedRequest};

/// Session options that are not part of the on-disk configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Per-request timeout
    pub timeout: Duration,
    /// Encoding of request bodies
    pub encoding: Encoding,
    /// Overrides the default `qcportal/<version>` user agent
    pub user_agent: Option<String>,
    /// Version reported for the compatibility check; defaults to this crate's
    pub client_version: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            encoding: Encoding::Json,
            user_agent: None,
            client_version: None,
        }
    }
}

impl ClientOptions {
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    #[must_use]
    pub fn client_version(mut self, version: impl Into<String>) -> Self {
        self.client_version = Some(version.into());
        self
    }

    fn version(&self) -> Result<Version> {
        self.client_version
            .as_deref()
            .unwrap_or(CLIENT_VERSION)
            .parse()
            .map_err(|e| PortalError::Config(format!("invalid client version: {e}")))
    }
}

/// Client for one server session
#[derive(Debug)]
pub struct PortalClient {
    dispatcher: Dispatcher,
    auth: Arc<AuthManager>,
    server_info: ServerInfo,
}

impl PortalClient {
    /// Open a session against the configured server
    ///
    /// # Errors
    /// - `Connectivity` when the server cannot be reached
    /// - `Authentication` when the configured credentials are rejected
    /// - `VersionIncompatible` when the server does not accept this client
    #[instrument(skip(config, options), fields(address = %config.address))]
    pub async fn connect(config: &PortalConfig, options: ClientOptions) -> Result<Arc<Self>> {
        let (address, verify) = config.normalized()?;
        let client_version = options.version()?;

        let mut builder =
            HttpClient::builder(address)
                .timeout(options.timeout)
                .encoding(options.encoding)
                .verify(verify);
        if let Some(agent) = &options.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        let http = builder.build()?;

        let auth = Arc::new(AuthManager::new(http.clone()));
        if let Some((username, password)) = config.credentials() {
            auth.login(username, password).await?;
        } else {
            debug!("no credentials configured; using an anonymous session");
        }

        let dispatcher = Dispatcher::new(http, auth.clone());
        let server_info: ServerInfo =
            dispatcher.request(&Endpoint::get(ENDPOINT_INFORMATION)).await?;
        server_info.check_client_version(&client_version)?;

        info!(server = %server_info.name, version = ?server_info.version, "connected");
        Ok(Arc::new(Self { dispatcher, auth, server_info }))
    }

    /// Connect with a configuration read from disk
    ///
    /// See [`crate::config::load_from_file`] for how `path` is resolved.
    pub async fn from_file(path: Option<PathBuf>) -> Result<Arc<Self>> {
        let config = load_from_file(path)?;
        Self::connect(&config, ClientOptions::default()).await
    }

    /// Server information fetched at connect time
    pub const fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    pub fn server_name(&self) -> &str {
        &self.server_info.name
    }

    pub const fn api_limits(&self) -> &BTreeMap<String, u64> {
        &self.server_info.api_limits
    }

    pub fn address(&self) -> &str {
        self.dispatcher.http().address()
    }

    pub async fn auth_state(&self) -> AuthState {
        self.auth.state().await
    }

    pub(crate) const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Whether the server answers at all
    ///
    /// Connectivity failures yield `Ok(false)`; other failures still
    /// surface as errors.
    #[instrument(skip(self))]
    pub async fn ping(&self) -> Result<bool> {
        let request = PreparedRequest::new(Method::GET, ENDPOINT_PING);
        let response = match self.dispatcher.http().send(&request, None).await {
            Ok(response) => response,
            Err(err @ PortalError::Connectivity { .. }) => {
                warn!(error = %err, "ping failed");
                return Ok(false);
            }
            Err(err) => return Err(err),
        };

        if !response.is_success() {
            return Err(super::errors::request_error(&response).into());
        }

        Ok(match decode_response::<Value>(response.content_type.as_deref(), &response.body)? {
            Value::Bool(up) => up,
            Value::Object(map) => map.get("success").and_then(Value::as_bool).unwrap_or(false),
            _ => false,
        })
    }

    /// All datasets visible to this session
    #[instrument(skip(self))]
    pub async fn list_datasets(&self) -> Result<Vec<DatasetListItem>> {
        self.dispatcher.request(&Endpoint::get(ENDPOINT_DATASETS)).await
    }

    /// Load a dataset by kind and name
    ///
    /// # Errors
    /// `NotFound` when no dataset of that kind has that name.
    #[instrument(skip(self))]
    pub async fn get_dataset(
        self: &Arc<Self>,
        dataset_type: DatasetType,
        name: &str,
    ) -> Result<AnyDataset> {
        let body = DatasetQueryBody {
            dataset_type: Some(dataset_type),
            dataset_name: Some(name.to_string()),
            projection: Projection::default(),
        };
        let endpoint = Endpoint::post(format!("{ENDPOINT_DATASETS}/query")).with_body();
        let found: Vec<DatasetMetadata> =
            self.dispatcher.request_with_body(&endpoint, &body).await?;

        let metadata = found
            .into_iter()
            .next()
            .ok_or_else(|| PortalError::NotFound(format!("{dataset_type} dataset '{name}'")))?;
        AnyDataset::from_metadata(metadata, Arc::clone(self))
    }

    /// Load a dataset by id
    #[instrument(skip(self))]
    pub async fn get_dataset_by_id(self: &Arc<Self>, dataset_id: i64) -> Result<AnyDataset> {
        let metadata: DatasetMetadata = self
            .dispatcher
            .request(&Endpoint::get(format!("{ENDPOINT_DATASETS}/{dataset_id}")))
            .await
            .map_err(|err| match err.status_code() {
                Some(404) => PortalError::NotFound(format!("dataset {dataset_id}")),
                _ => err,
            })?;
        AnyDataset::from_metadata(metadata, Arc::clone(self))
    }

    /// Create a dataset and load it
    #[instrument(skip(self, body), fields(name = %body.name))]
    pub async fn add_dataset(
        self: &Arc<Self>,
        dataset_type: DatasetType,
        body: &DatasetAddBody,
    ) -> Result<AnyDataset> {
        let endpoint = Endpoint::post(format!("{ENDPOINT_DATASETS}/{dataset_type}")).with_body();
        let dataset_id: i64 = self.dispatcher.request_with_body(&endpoint, body).await?;

        info!(dataset_id, "dataset created");
        self.get_dataset_by_id(dataset_id).await
    }

    /// Delete a dataset, and its records too when `delete_records` is set
    #[instrument(skip(self))]
    pub async fn delete_dataset(&self, dataset_id: i64, delete_records: bool) -> Result<()> {
        let endpoint = Endpoint::delete(format!("{ENDPOINT_DATASETS}/{dataset_id}")).with_query();
        self.dispatcher
            .auto_request_ack::<(), _>(&endpoint, None, Some(&DeleteMeta { delete_records }))
            .await
            .map_err(|err| match err.status_code() {
                Some(404) => PortalError::NotFound(format!("dataset {dataset_id}")),
                _ => err,
            })
    }

    /// Records by id, in request order
    ///
    /// With `missing_ok`, unknown ids come back as `None`; otherwise the
    /// server rejects the whole request.
    #[instrument(skip(self, record_ids, include), fields(n = record_ids.len()))]
    pub async fn get_records(
        &self,
        record_ids: &[i64],
        include: Option<&[String]>,
        missing_ok: bool,
    ) -> Result<Vec<Option<Record>>> {
        if record_ids.is_empty() {
            return Ok(Vec::new());
        }

        let projection = include.map_or_else(Projection::default, |fields| {
            Projection::include(fields.iter().cloned())
        });
        let body = RecordsFetchBody { ids: record_ids.to_vec(), projection, missing_ok };
        let endpoint = Endpoint::post(ENDPOINT_RECORDS_BULK_FETCH).with_body();
        self.dispatcher.request_with_body(&endpoint, &body).await
    }
}
