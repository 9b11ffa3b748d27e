//! ASA device configuration records and their credential state machine.
//!
//! An ASA's specific-device record (an "ASA config") drives onboarding:
//! it waits for credentials, validates the certificate, reads the running
//! config and ends in `DONE`. This module reads and updates that record.
//!
//! Credentials are sent as a JSON string embedded in the request body.
//! When the device sits behind an on-prem connector, username and password
//! are first encrypted with the connector's public key and the key id is
//! included; otherwise they travel in clear over TLS.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::CdoClient;
use crate::context::Context;
use crate::crypto::Cipher;
use crate::error::Result;
use crate::model::{PublicKey, QueueTriggerState};
use crate::url;

// ── State machine ──────────────────────────────────────────────────────

/// Stage of an ASA config's state machine.
///
/// Parsed case-insensitively. Unrecognized stages keep their raw value in
/// `Unknown` so they can be logged and round-tripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConfigState {
    /// Freshly created, nothing pushed yet.
    New,
    /// Waiting for credentials to be pushed.
    WaitForUserToUpdateCreds,
    /// Intermediate stage entered before `WAIT_FOR_USER_TO_UPDATE_CREDS`.
    PreWaitForUserToUpdateCreds,
    /// A new `host:port` is queued.
    PendingLocationUpdate,
    /// The device certificate was accepted.
    CertValidated,
    /// Onboarding finished; the device is usable.
    Done,
    Error,
    /// The device rejected the pushed credentials.
    BadCredentials,
    /// Any stage this client does not know about.
    Unknown(String),
}

impl ConfigState {
    /// Wire name of the state; `Unknown` returns the raw value as received.
    pub fn as_str(&self) -> &str {
        match self {
            ConfigState::New => "NEW",
            ConfigState::WaitForUserToUpdateCreds => "WAIT_FOR_USER_TO_UPDATE_CREDS",
            ConfigState::PreWaitForUserToUpdateCreds => "$PRE_WAIT_FOR_USER_TO_UPDATE_CREDS",
            ConfigState::PendingLocationUpdate => "PENDING_LOCATION_UPDATE",
            ConfigState::CertValidated => "CERT_VALIDATED",
            ConfigState::Done => "DONE",
            ConfigState::Error => "ERROR",
            ConfigState::BadCredentials => "BAD_CREDENTIALS",
            ConfigState::Unknown(raw) => raw,
        }
    }
}

impl From<&str> for ConfigState {
    fn from(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "NEW" => ConfigState::New,
            "WAIT_FOR_USER_TO_UPDATE_CREDS" => ConfigState::WaitForUserToUpdateCreds,
            "$PRE_WAIT_FOR_USER_TO_UPDATE_CREDS" => ConfigState::PreWaitForUserToUpdateCreds,
            "PENDING_LOCATION_UPDATE" => ConfigState::PendingLocationUpdate,
            "CERT_VALIDATED" => ConfigState::CertValidated,
            "DONE" => ConfigState::Done,
            "ERROR" => ConfigState::Error,
            "BAD_CREDENTIALS" => ConfigState::BadCredentials,
            _ => ConfigState::Unknown(raw.to_string()),
        }
    }
}

impl From<String> for ConfigState {
    fn from(raw: String) -> Self {
        ConfigState::from(raw.as_str())
    }
}

impl From<ConfigState> for String {
    fn from(state: ConfigState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for ConfigState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Response types ─────────────────────────────────────────────────────

/// An ASA config as returned by CDO.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReadOutput {
    /// Specific uid of the config.
    pub uid: String,
    /// Current state-machine stage.
    pub state: ConfigState,
}

/// Output of [`create`]; the created config.
pub type CreateOutput = ReadOutput;

/// Returned by every update call; only the uid is of interest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateOutput {
    /// Specific uid of the updated config.
    pub uid: String,
}

// ── Request types ──────────────────────────────────────────────────────

/// Body of [`create`].
#[derive(Debug, Clone, Serialize)]
pub struct CreateInput {
    /// Initial state-machine stage.
    pub state: ConfigState,
}

/// Credentials to push to an ASA config.
#[derive(Debug, Clone)]
pub struct UpdateInput {
    /// Specific uid of the config, from [`crate::device::read_specific`].
    pub specific_uid: String,
    /// Plaintext username; encrypted before sending when a key is given.
    pub username: String,
    /// Plaintext password; encrypted before sending when a key is given.
    pub password: String,
    /// Connector key to encrypt with; `None` sends credentials in clear.
    pub public_key: Option<PublicKey>,
    /// Current state of the config, used by [`update_credentials`].
    pub state: ConfigState,
}

impl UpdateInput {
    /// Builds an update from borrowed strings.
    pub fn new(
        specific_uid: &str,
        username: &str,
        password: &str,
        public_key: Option<PublicKey>,
        state: ConfigState,
    ) -> Self {
        UpdateInput {
            specific_uid: specific_uid.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            public_key,
            state,
        }
    }
}

/// Input of [`update_location`].
#[derive(Debug, Clone)]
pub struct UpdateLocationInput {
    /// Specific uid of the config.
    pub specific_uid: String,
    /// New `host:port` of the device.
    pub location: String,
}

#[derive(Debug, Serialize)]
struct UpdateBody {
    state: ConfigState,
    credentials: String,
}

#[derive(Debug, Serialize)]
struct SmContext {
    credentials: String,
}

/// Body of [`update_credentials`].
///
/// While the config already waits for credentials, sending a `state` again
/// would request a duplicate transition, so that shape omits it.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum UpdateCredentialsBody {
    WithState {
        state: ConfigState,
        #[serde(rename = "stateMachineContext")]
        sm_context: SmContext,
    },
    WithoutState {
        #[serde(rename = "stateMachineContext")]
        sm_context: SmContext,
    },
}

#[derive(Debug, Serialize)]
struct UpdateLocationBody<'a> {
    #[serde(rename = "queueTriggerState")]
    queue_trigger_state: QueueTriggerState,
    #[serde(rename = "stateMachineContext")]
    sm_context: LocationSmContext<'a>,
}

#[derive(Debug, Serialize)]
struct LocationSmContext<'a> {
    ipv4: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Credentials {
    username: String,
    password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    key_id: Option<String>,
}

/// Serializes credentials, encrypting them when a public key is present.
fn make_credentials(input: &UpdateInput) -> Result<String> {
    let credentials = match &input.public_key {
        Some(key) => {
            let cipher = Cipher::from_public_key(key)?;
            Credentials {
                username: cipher.encrypt(&input.username)?,
                password: cipher.encrypt(&input.password)?,
                key_id: Some(key.key_id.clone()),
            }
        }
        None => Credentials {
            username: input.username.clone(),
            password: input.password.clone(),
            key_id: None,
        },
    };
    Ok(serde_json::to_string(&credentials)?)
}

fn make_update_credentials_body(state: &ConfigState, credentials: String) -> UpdateCredentialsBody {
    let sm_context = SmContext { credentials };
    match state {
        ConfigState::WaitForUserToUpdateCreds | ConfigState::PreWaitForUserToUpdateCreds => {
            UpdateCredentialsBody::WithoutState { sm_context }
        }
        ConfigState::New
        | ConfigState::PendingLocationUpdate
        | ConfigState::CertValidated
        | ConfigState::Done
        | ConfigState::Error
        | ConfigState::BadCredentials
        | ConfigState::Unknown(_) => UpdateCredentialsBody::WithState {
            state: ConfigState::WaitForUserToUpdateCreds,
            sm_context,
        },
    }
}

// ── Endpoint functions ─────────────────────────────────────────────────

/// Creates an ASA config record.
///
/// # Errors
///
/// `CdoError::Api` when CDO rejects the record.
pub async fn create(client: &CdoClient, ctx: &Context, input: &CreateInput) -> Result<CreateOutput> {
    client
        .post(ctx, &url::create_asa_config(client.base_url()), input)
        .await
}

/// Reads an ASA config by its specific uid.
///
/// # Errors
///
/// `CdoError::Api` on a non-success status (404 for an unknown uid).
pub async fn read(client: &CdoClient, ctx: &Context, specific_uid: &str) -> Result<ReadOutput> {
    client
        .get(ctx, &url::read_asa_config(client.base_url(), specific_uid))
        .await
}

/// Lists every ASA config. An empty tenant yields an empty `Vec`.
///
/// # Errors
///
/// `CdoError::Api` on a non-success status; no partial list is returned.
pub async fn read_all(client: &CdoClient, ctx: &Context) -> Result<Vec<ReadOutput>> {
    client
        .get_list(ctx, &url::read_all_asa_configs(client.base_url()))
        .await
}

/// Pushes credentials and marks the certificate as validated.
///
/// # Errors
///
/// - `CdoError::Encryption` when the public key is unusable; nothing is sent.
/// - `CdoError::Api` when CDO rejects the update.
pub async fn update(client: &CdoClient, ctx: &Context, input: &UpdateInput) -> Result<UpdateOutput> {
    info!(parent: client.span(), specific_uid = %input.specific_uid, "updating asa config");
    let body = UpdateBody {
        state: ConfigState::CertValidated,
        credentials: make_credentials(input)?,
    };
    client
        .put(ctx, &url::update_asa_config(client.base_url(), &input.specific_uid), &body)
        .await
}

/// Pushes new credentials, choosing the body shape from `input.state`.
///
/// # Errors
///
/// - `CdoError::Encryption` when the public key is unusable; nothing is sent.
/// - `CdoError::Api` when CDO rejects the update.
pub async fn update_credentials(
    client: &CdoClient,
    ctx: &Context,
    input: &UpdateInput,
) -> Result<UpdateOutput> {
    info!(
        parent: client.span(),
        specific_uid = %input.specific_uid,
        state = %input.state,
        "updating asa config credentials"
    );
    let body = make_update_credentials_body(&input.state, make_credentials(input)?);
    client
        .put(ctx, &url::update_asa_config(client.base_url(), &input.specific_uid), &body)
        .await
}

/// Points the config at a new `host:port`.
///
/// # Errors
///
/// `CdoError::Api` when CDO refuses the location change.
pub async fn update_location(
    client: &CdoClient,
    ctx: &Context,
    input: &UpdateLocationInput,
) -> Result<UpdateOutput> {
    info!(parent: client.span(), specific_uid = %input.specific_uid, "updating asa config location");
    let body = UpdateLocationBody {
        queue_trigger_state: QueueTriggerState::PendingLocationUpdate,
        sm_context: LocationSmContext {
            ipv4: &input.location,
        },
    };
    client
        .put(ctx, &url::update_asa_config(client.base_url(), &input.specific_uid), &body)
        .await
}

/// Deletes an ASA config.
///
/// # Errors
///
/// `CdoError::Api` on a non-success status.
pub async fn delete(client: &CdoClient, ctx: &Context, specific_uid: &str) -> Result<()> {
    client
        .delete(ctx, &url::delete_asa_config(client.base_url(), specific_uid))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_input(state: ConfigState) -> UpdateInput {
        UpdateInput::new("config-1", "admin", "hunter2", None, state)
    }

    #[test]
    fn state_parses_case_insensitively() {
        assert_eq!(
            ConfigState::from("wait_for_user_to_update_creds"),
            ConfigState::WaitForUserToUpdateCreds
        );
        assert_eq!(
            ConfigState::from("$pre_wait_for_user_to_update_creds"),
            ConfigState::PreWaitForUserToUpdateCreds
        );
        assert_eq!(
            ConfigState::from("SOMETHING_NEW"),
            ConfigState::Unknown("SOMETHING_NEW".to_string())
        );
    }

    #[test]
    fn state_serializes_to_wire_name() {
        let json = serde_json::to_string(&ConfigState::CertValidated).unwrap();
        assert_eq!(json, "\"CERT_VALIDATED\"");
        let read: ReadOutput = serde_json::from_str(r#"{"uid": "u", "state": "done"}"#).unwrap();
        assert_eq!(read.state, ConfigState::Done);
    }

    #[test]
    fn plaintext_credentials_have_no_key_id() {
        let creds = make_credentials(&plain_input(ConfigState::New)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&creds).unwrap();
        assert_eq!(json["username"], "admin");
        assert_eq!(json["password"], "hunter2");
        assert!(json.get("keyId").is_none());
    }

    #[test]
    fn waiting_states_omit_top_level_state() {
        for state in [
            ConfigState::from("WAIT_FOR_USER_TO_UPDATE_CREDS"),
            ConfigState::from("Wait_For_User_To_Update_Creds"),
            ConfigState::from("$PRE_WAIT_FOR_USER_TO_UPDATE_CREDS"),
        ] {
            let body = make_update_credentials_body(&state, "{}".to_string());
            let json = serde_json::to_value(&body).unwrap();
            assert!(json.get("state").is_none(), "state must be omitted for {state}");
            assert_eq!(json["stateMachineContext"]["credentials"], "{}");
        }
    }

    #[test]
    fn other_states_request_wait_for_credentials() {
        for state in [ConfigState::New, ConfigState::Done, ConfigState::from("WEIRD")] {
            let body = make_update_credentials_body(&state, "{}".to_string());
            let json = serde_json::to_value(&body).unwrap();
            assert_eq!(json["state"], "WAIT_FOR_USER_TO_UPDATE_CREDS");
            assert_eq!(json["stateMachineContext"]["credentials"], "{}");
        }
    }

    #[test]
    fn location_body_uses_queue_trigger_state() {
        let body = UpdateLocationBody {
            queue_trigger_state: QueueTriggerState::PendingLocationUpdate,
            sm_context: LocationSmContext { ipv4: "10.0.0.2:443" },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["queueTriggerState"], "PENDING_LOCATION_UPDATE");
        assert_eq!(json["stateMachineContext"]["ipv4"], "10.0.0.2:443");
    }
}
