use std::time::Duration;

use qcportal_domain::constants::{CLIENT_VERSION, DEFAULT_TIMEOUT_SECS, USER_AGENT_PREFIX};
use qcportal_domain::{PortalError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client as ReqwestClient, Method};
use tracing::debug;
use url::Url;

use super::encoding::Encoding;
use crate::errors::IntoPortalError;

/// A request ready to be sent: endpoint relative to the base address plus an
/// already-encoded body and flattened query parameters
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub endpoint: String,
    pub body: Option<Vec<u8>>,
    pub query: Vec<(String, String)>,
}

impl PreparedRequest {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self { method, endpoint: endpoint.into(), body: None, query: Vec::new() }
    }

    #[must_use]
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }
}

/// A completed exchange, whatever its status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    /// Canonical reason phrase of `status`
    pub reason: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// HTTP session bound to one server address
///
/// Headers, timeout and TLS verification are fixed when the client is built.
/// The client performs exactly one exchange per [`HttpClient::send`] call.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    base_url: Url,
    encoding: Encoding,
}

impl HttpClient {
    /// Start building a client for `base_url`.
    pub fn builder(base_url: impl Into<String>) -> HttpClientBuilder {
        HttpClientBuilder::new(base_url)
    }

    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Server address as shown in connectivity errors
    pub fn address(&self) -> &str {
        self.base_url.as_str()
    }

    pub const fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Perform one exchange
    ///
    /// Any status is returned as a [`RawResponse`]; only failures to complete
    /// the exchange become errors.
    pub async fn send(
        &self,
        request: &PreparedRequest,
        bearer: Option<&str>,
    ) -> Result<RawResponse> {
        let url = self.base_url.join(&request.endpoint).map_err(|e| {
            PortalError::Contract(format!("invalid endpoint '{}': {e}", request.endpoint))
        })?;

        let mut builder = self.client.request(request.method.clone(), url.clone());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }

        let method = &request.method;
        debug!(%method, %url, "sending HTTP request");

        let response = builder.send().await.map_err(|err| {
            debug!(%method, %url, error = %err, "HTTP request failed");
            err.into_portal(self.address())
        })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(|err| err.into_portal(self.address()))?.to_vec();

        debug!(%method, %url, %status, bytes = body.len(), "received HTTP response");

        Ok(RawResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown status").to_string(),
            content_type,
            body,
        })
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    base_url: String,
    timeout: Duration,
    user_agent: Option<String>,
    encoding: Encoding,
    verify: bool,
}

impl HttpClientBuilder {
    fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: None,
            encoding: Encoding::default(),
            verify: true,
        }
    }

    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Encoding used for request bodies and advertised in `Accept`
    #[must_use]
    pub const fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Verify the server's TLS certificate. Turning this off only affects
    /// this client.
    #[must_use]
    pub const fn verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn build(self) -> Result<HttpClient> {
        let base_url = Url::parse(&self.base_url)
            .map_err(|e| {
                PortalError::Config(format!("invalid server address '{}': {e}", self.base_url))
            })?;

        let mime = HeaderValue::from_static(self.encoding.content_type());
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, mime.clone());
        headers.insert(ACCEPT, mime);

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("{USER_AGENT_PREFIX}/{CLIENT_VERSION}"));

        let client = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(user_agent)
            .default_headers(headers)
            .danger_accept_invalid_certs(!self.verify)
            .build()
            .map_err(|err| err.into_portal(&self.base_url))?;

        Ok(HttpClient { client, base_url, encoding: self.encoding })
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use qcportal_domain::ConnectivityFailure;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(uri: &str) -> HttpClient {
        HttpClient::builder(format!("{uri}/")).build().expect("http client")
    }

    #[tokio::test]
    async fn sends_session_headers_and_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/ping"))
            .and(header("accept", "application/json"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_string("true"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let request = PreparedRequest::new(Method::GET, "v1/ping");
        let response = client.send(&request, Some("abc")).await.unwrap();

        assert!(response.is_success());
        assert_eq!(response.body, b"true");
    }

    #[tokio::test]
    async fn user_agent_names_the_client() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        client.send(&PreparedRequest::new(Method::GET, "v1/ping"), None).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let agent = requests[0].headers.get("user-agent").unwrap().to_str().unwrap();
        assert!(agent.starts_with("qcportal/"));
    }

    #[tokio::test]
    async fn query_pairs_are_appended() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1/datasets/4"))
            .and(query_param("delete_records", "true"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let request = PreparedRequest::new(Method::DELETE, "v1/datasets/4")
            .with_query(vec![("delete_records".into(), "true".into())]);
        client_for(&server.uri()).send(&request, None).await.unwrap();
    }

    #[tokio::test]
    async fn error_statuses_are_returned_not_raised() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let request = PreparedRequest::new(Method::GET, "v1/information");
        let response = client_for(&server.uri()).send(&request, None).await.unwrap();

        assert_eq!(response.status, 503);
        assert_eq!(response.reason, "Service Unavailable");
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(&format!("http://{addr}"));
        let request = PreparedRequest::new(Method::GET, "v1/ping");
        let err = client.send(&request, None).await.unwrap_err();

        match err {
            PortalError::Connectivity { address, failure } => {
                assert_eq!(failure, ConnectivityFailure::Unreachable);
                assert!(address.contains(&addr.port().to_string()));
            }
            other => panic!("expected connectivity error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let client = HttpClient::builder(format!("{}/", server.uri()))
            .timeout(Duration::from_millis(100))
            .build()
            .unwrap();
        let request = PreparedRequest::new(Method::GET, "v1/ping");
        let err = client.send(&request, None).await.unwrap_err();

        assert!(matches!(
            err,
            PortalError::Connectivity { failure: ConnectivityFailure::TimedOut, .. }
        ));
        assert!(err.is_retryable());
    }

    #[test]
    fn invalid_address_is_a_config_error() {
        let err = HttpClient::builder("not a url").build().unwrap_err();
        assert!(matches!(err, PortalError::Config(_)));
    }
}
