//! Typed request dispatch
//!
//! [`Dispatcher::auto_request`] checks the caller's body and query against
//! the endpoint's declared shape, encodes them with the session encoding,
//! sends the request through the authenticated session and decodes the
//! answer by its own `Content-Type`.

use std::fmt;
use std::sync::Arc;

use qcportal_domain::constants::MAX_TOKEN_REFRESHES;
use qcportal_domain::{PortalError, Result};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::auth::AccessTokenProvider;
use super::errors::request_error;
use crate::http::{decode_response, Encoding, HttpClient, PreparedRequest, RawResponse};

/// Declared shape of one server endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub method: Method,
    pub path: String,
    /// The endpoint expects a request body
    pub takes_body: bool,
    /// The endpoint expects query parameters
    pub takes_query: bool,
}

impl Endpoint {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), takes_body: false, takes_query: false }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    #[must_use]
    pub const fn with_body(mut self) -> Self {
        self.takes_body = true;
        self
    }

    #[must_use]
    pub const fn with_query(mut self) -> Self {
        self.takes_query = true;
        self
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Typed, authenticated request dispatch over one session
pub struct Dispatcher {
    http: HttpClient,
    auth: Arc<dyn AccessTokenProvider>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher").field("http", &self.http).finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(http: HttpClient, auth: Arc<dyn AccessTokenProvider>) -> Self {
        Self { http, auth }
    }

    pub const fn http(&self) -> &HttpClient {
        &self.http
    }

    pub const fn encoding(&self) -> Encoding {
        self.http.encoding()
    }

    /// Send a request and decode the typed response
    ///
    /// A body (or query) supplied to an endpoint that does not take one, or
    /// missing for one that does, fails before anything is sent.
    #[instrument(skip(self, body, query), fields(endpoint = %endpoint))]
    pub async fn auto_request<B, Q, R>(
        &self,
        endpoint: &Endpoint,
        body: Option<&B>,
        query: Option<&Q>,
    ) -> Result<R>
    where
        B: Serialize + ?Sized + Sync,
        Q: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let request = self.prepare(endpoint, body, query)?;
        let response = self.execute(&request).await?;
        decode_response(response.content_type.as_deref(), &response.body)
    }

    /// Send a request whose response carries nothing of interest
    #[instrument(skip(self, body, query), fields(endpoint = %endpoint))]
    pub async fn auto_request_ack<B, Q>(
        &self,
        endpoint: &Endpoint,
        body: Option<&B>,
        query: Option<&Q>,
    ) -> Result<()>
    where
        B: Serialize + ?Sized + Sync,
        Q: Serialize + ?Sized + Sync,
    {
        let request = self.prepare(endpoint, body, query)?;
        self.execute(&request).await?;
        Ok(())
    }

    /// Endpoint without body or query
    pub async fn request<R: DeserializeOwned>(&self, endpoint: &Endpoint) -> Result<R> {
        self.auto_request::<(), (), R>(endpoint, None, None).await
    }

    pub async fn request_with_body<B, R>(&self, endpoint: &Endpoint, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        self.auto_request::<B, (), R>(endpoint, Some(body), None).await
    }

    pub async fn request_with_query<Q, R>(&self, endpoint: &Endpoint, query: &Q) -> Result<R>
    where
        Q: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        self.auto_request::<(), Q, R>(endpoint, None, Some(query)).await
    }

    /// Check the request against the endpoint shape and encode it
    pub fn prepare<B, Q>(
        &self,
        endpoint: &Endpoint,
        body: Option<&B>,
        query: Option<&Q>,
    ) -> Result<PreparedRequest>
    where
        B: Serialize + ?Sized,
        Q: Serialize + ?Sized,
    {
        match (endpoint.takes_body, body.is_some()) {
            (false, true) => {
                return Err(PortalError::Contract(format!(
                    "{endpoint} takes no body, but one was supplied"
                )))
            }
            (true, false) => {
                return Err(PortalError::Contract(format!("{endpoint} requires a body")))
            }
            _ => {}
        }
        match (endpoint.takes_query, query.is_some()) {
            (false, true) => {
                return Err(PortalError::Contract(format!(
                    "{endpoint} takes no query parameters, but some were supplied"
                )))
            }
            (true, false) => {
                return Err(PortalError::Contract(format!("{endpoint} requires query parameters")))
            }
            _ => {}
        }

        let mut request = PreparedRequest::new(endpoint.method.clone(), endpoint.path.clone());
        if let Some(body) = body {
            request = request.with_body(self.encoding().encode(body)?);
        }
        if let Some(query) = query {
            request = request.with_query(query_pairs(query)?);
        }
        Ok(request)
    }

    /// Send with the session token, refreshing it at most once on expiry
    async fn execute(&self, request: &PreparedRequest) -> Result<RawResponse> {
        let mut token = self.auth.access_token().await;
        let mut refreshes = 0;

        loop {
            let response = self.http.send(request, token.as_deref()).await?;
            if response.is_success() {
                return Ok(response);
            }

            let err = request_error(&response);
            if token.is_some() && refreshes < MAX_TOKEN_REFRESHES && err.is_expired_token() {
                refreshes += 1;
                token = Some(self.auth.refresh_access_token().await?);
                debug!(endpoint = %request.endpoint, "retrying with refreshed token");
                continue;
            }

            warn!(
                endpoint = %request.endpoint,
                status = err.status_code,
                message = %err.message,
                "request failed"
            );
            return Err(err.into());
        }
    }
}

/// Flatten a serializable value into query pairs
///
/// Sequences become repeated keys and `null` fields are dropped. Nested
/// objects have no query representation.
pub fn query_pairs<Q: Serialize + ?Sized>(query: &Q) -> Result<Vec<(String, String)>> {
    let fields = match serde_json::to_value(query)? {
        Value::Object(map) => map,
        Value::Null => return Ok(Vec::new()),
        other => {
            return Err(PortalError::Contract(format!(
                "query parameters must be a mapping, got {other}"
            )))
        }
    };

    let mut pairs = Vec::new();
    for (key, value) in fields {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    pairs.push((key.clone(), scalar(&key, item)?));
                }
            }
            other => pairs.push((key.clone(), scalar(&key, other)?)),
        }
    }
    Ok(pairs)
}

fn scalar(key: &str, value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => {
            Err(PortalError::Contract(format!(
                "query parameter '{key}' must be a scalar or a list of scalars"
            )))
        }
    }
}
