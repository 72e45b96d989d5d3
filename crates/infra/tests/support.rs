use std::sync::Arc;

use qcportal_domain::PortalConfig;
use qcportal_infra::{ClientOptions, PortalClient};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const USERNAME: &str = "alice";
pub const PASSWORD: &str = "secret";
pub const DATASET_ID: i64 = 7;

/// Client version accepted by [`mount_information`]
pub const CLIENT_VERSION: &str = "0.50";

pub fn information() -> Value {
    json!({
        "name": "Mock Portal",
        "version": "0.50",
        "api_limits": {"get_records": 1000, "get_dataset_entries": 500},
        "client_version_lower_limit": "0.40",
        "client_version_upper_limit": "0.59"
    })
}

pub async fn mount_information(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/information"))
        .respond_with(ResponseTemplate::new(200).set_body_json(information()))
        .mount(server)
        .await;
}

/// Login answering with access token `a1` and refresh token `r1`
pub async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/login"))
        .and(body_json(json!({"username": USERNAME, "password": PASSWORD})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "a1", "refresh_token": "r1"})),
        )
        .expect(1)
        .mount(server)
        .await;
}

pub fn expired_token() -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(json!({"msg": "Token has expired"}))
}

pub fn options() -> ClientOptions {
    ClientOptions::default().client_version(CLIENT_VERSION)
}

/// Anonymous session against `server`
pub async fn connect(server: &MockServer) -> Arc<PortalClient> {
    mount_information(server).await;
    PortalClient::connect(&PortalConfig::new(server.uri()), options()).await.unwrap()
}

/// Logged-in session against `server`
pub async fn connect_as_alice(server: &MockServer) -> Arc<PortalClient> {
    mount_information(server).await;
    mount_login(server).await;
    let config = PortalConfig::new(server.uri()).with_credentials(USERNAME, PASSWORD);
    PortalClient::connect(&config, options()).await.unwrap()
}

pub fn singlepoint_metadata() -> Value {
    json!({
        "id": DATASET_ID,
        "dataset_type": "singlepoint",
        "name": "S22",
        "description": "Noncovalent interaction energies",
        "tags": ["benchmark"]
    })
}

pub fn record(id: i64, status: &str) -> Value {
    json!({"id": id, "record_type": "singlepoint", "status": status, "compute_priority": 1})
}
