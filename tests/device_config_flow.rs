//! Integration tests for ASA config updates using wiremock.
//!
//! The credential tests inspect the request bodies wiremock received, so they
//! can check both the plaintext shape and that encrypted values decrypt with
//! the connector's private key.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cdo_client::client::CdoClient;
use cdo_client::context::Context;
use cdo_client::device_config::{self, ConfigState, UpdateInput, UpdateLocationInput};
use cdo_client::error::CdoError;
use cdo_client::model::PublicKey;
use rand::rngs::OsRng;
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONFIG_PATH: &str = "/aegis/rest/v1/services/asa/configs/44444444-4444-4444-4444-444444444444";
const SPECIFIC_UID: &str = "44444444-4444-4444-4444-444444444444";

fn mock_client(server: &MockServer) -> CdoClient {
    CdoClient::with_base_url(&server.uri(), "test-token").unwrap()
}

fn connector_key() -> (RsaPrivateKey, PublicKey) {
    let private_key = RsaPrivateKey::new(&mut OsRng, 1024).unwrap();
    let pem = private_key
        .to_public_key()
        .to_public_key_pem(LineEnding::LF)
        .unwrap();
    let public_key = PublicKey {
        encoded_key: STANDARD.encode(pem),
        version: 1,
        key_id: "key-01".to_string(),
    };
    (private_key, public_key)
}

fn decrypt(private_key: &RsaPrivateKey, value: &str) -> String {
    let ciphertext = STANDARD.decode(value).unwrap();
    String::from_utf8(private_key.decrypt(Pkcs1v15Encrypt, &ciphertext).unwrap()).unwrap()
}

/// Mounts a single expected PUT on the config path.
async fn mount_put(server: &MockServer) {
    Mock::given(method("PUT"))
        .and(path(CONFIG_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "uid": SPECIFIC_UID
        })))
        .expect(1)
        .mount(server)
        .await;
}

/// Body of the only request the server received.
async fn sent_body(server: &MockServer) -> serde_json::Value {
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1, "exactly one request should be sent");
    serde_json::from_slice(&requests[0].body).unwrap()
}

fn embedded_credentials(raw: &serde_json::Value) -> serde_json::Value {
    serde_json::from_str(raw.as_str().expect("credentials should be a JSON string")).unwrap()
}

// ── update ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_sends_plaintext_credentials_without_key() {
    let server = MockServer::start().await;
    let client = mock_client(&server);
    mount_put(&server).await;

    let input = UpdateInput::new(SPECIFIC_UID, "admin", "hunter2", None, ConfigState::New);
    let output = device_config::update(&client, &Context::background(), &input)
        .await
        .unwrap();
    assert_eq!(output.uid, SPECIFIC_UID);

    let body = sent_body(&server).await;
    assert_eq!(body["state"], "CERT_VALIDATED");
    let credentials = embedded_credentials(&body["credentials"]);
    assert_eq!(
        credentials,
        serde_json::json!({"username": "admin", "password": "hunter2"})
    );
}

#[tokio::test]
async fn update_encrypts_credentials_with_connector_key() {
    let server = MockServer::start().await;
    let client = mock_client(&server);
    mount_put(&server).await;
    let (private_key, public_key) = connector_key();

    let input = UpdateInput::new(
        SPECIFIC_UID,
        "admin",
        "hunter2",
        Some(public_key),
        ConfigState::New,
    );
    device_config::update(&client, &Context::background(), &input)
        .await
        .unwrap();

    let body = sent_body(&server).await;
    let credentials = embedded_credentials(&body["credentials"]);
    assert_eq!(credentials["keyId"], "key-01");
    let username = credentials["username"].as_str().unwrap();
    assert_ne!(username, "admin");
    assert_eq!(decrypt(&private_key, username), "admin");
    assert_eq!(
        decrypt(&private_key, credentials["password"].as_str().unwrap()),
        "hunter2"
    );
}

#[tokio::test]
async fn update_with_malformed_key_fails_before_sending() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    let bad_key = PublicKey {
        encoded_key: "not base64!".to_string(),
        version: 1,
        key_id: "key-01".to_string(),
    };
    let input = UpdateInput::new(SPECIFIC_UID, "admin", "hunter2", Some(bad_key), ConfigState::New);
    let err = device_config::update(&client, &Context::background(), &input)
        .await
        .unwrap_err();

    assert!(matches!(err, CdoError::Encryption(_)), "got: {err:?}");
    assert!(server.received_requests().await.unwrap().is_empty());
}

// ── update_credentials ─────────────────────────────────────────────────

#[tokio::test]
async fn update_credentials_in_waiting_state_omits_state() {
    let server = MockServer::start().await;
    let client = mock_client(&server);
    mount_put(&server).await;

    let input = UpdateInput::new(
        SPECIFIC_UID,
        "admin",
        "hunter2",
        None,
        ConfigState::from("$pre_wait_for_user_to_update_creds"),
    );
    device_config::update_credentials(&client, &Context::background(), &input)
        .await
        .unwrap();

    let body = sent_body(&server).await;
    assert!(body.get("state").is_none(), "body: {body}");
    let credentials = embedded_credentials(&body["stateMachineContext"]["credentials"]);
    assert_eq!(credentials["username"], "admin");
}

#[tokio::test]
async fn update_credentials_in_other_state_requests_wait_state() {
    let server = MockServer::start().await;
    let client = mock_client(&server);
    mount_put(&server).await;
    let (private_key, public_key) = connector_key();

    let input = UpdateInput::new(
        SPECIFIC_UID,
        "admin",
        "hunter2",
        Some(public_key),
        ConfigState::BadCredentials,
    );
    device_config::update_credentials(&client, &Context::background(), &input)
        .await
        .unwrap();

    let body = sent_body(&server).await;
    assert_eq!(body["state"], "WAIT_FOR_USER_TO_UPDATE_CREDS");
    let credentials = embedded_credentials(&body["stateMachineContext"]["credentials"]);
    assert_eq!(credentials["keyId"], "key-01");
    assert_eq!(
        decrypt(&private_key, credentials["password"].as_str().unwrap()),
        "hunter2"
    );
}

// ── update_location / read ─────────────────────────────────────────────

#[tokio::test]
async fn update_location_queues_location_change() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("PUT"))
        .and(path(CONFIG_PATH))
        .and(body_json(serde_json::json!({
            "queueTriggerState": "PENDING_LOCATION_UPDATE",
            "stateMachineContext": {"ipv4": "10.0.0.2:8443"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "uid": SPECIFIC_UID
        })))
        .expect(1)
        .mount(&server)
        .await;

    device_config::update_location(
        &client,
        &Context::background(),
        &UpdateLocationInput {
            specific_uid: SPECIFIC_UID.to_string(),
            location: "10.0.0.2:8443".to_string(),
        },
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn read_parses_state_case_insensitively() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("GET"))
        .and(path(CONFIG_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "uid": SPECIFIC_UID,
            "state": "Bad_Credentials"
        })))
        .mount(&server)
        .await;

    let config = device_config::read(&client, &Context::background(), SPECIFIC_UID)
        .await
        .unwrap();
    assert_eq!(config.state, ConfigState::BadCredentials);
}

#[tokio::test]
async fn read_all_empty_body_is_empty_vec() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("GET"))
        .and(path("/aegis/rest/v1/services/asa/configs"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    assert!(device_config::read_all(&client, &Context::background())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn read_all_empty_array_is_empty_vec() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("GET"))
        .and(path("/aegis/rest/v1/services/asa/configs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    assert!(device_config::read_all(&client, &Context::background())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn read_all_server_error_is_api_error() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("GET"))
        .and(path("/aegis/rest/v1/services/asa/configs"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal server error"))
        .mount(&server)
        .await;

    let err = device_config::read_all(&client, &Context::background())
        .await
        .unwrap_err();
    assert!(
        matches!(&err, CdoError::Api { status, .. } if status.as_u16() == 500),
        "got: {err:?}"
    );
}
