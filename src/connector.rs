//! Secure device connectors.
//!
//! Connectors are the CDO proxies devices are reached through: the shared
//! cloud connector (CDG) or an on-prem secure device connector (SDC). On-prem
//! connectors publish an RSA public key that device credentials must be
//! encrypted with (see [`crate::device_config`]).
//!
//! ## Endpoints
//!
//! | Function | API Path |
//! |----------|----------|
//! | [`create`] | POST `/aegis/rest/v1/services/targets/proxies` |
//! | [`read`] | GET `.../proxies/{uid}` or `.../proxies?q=name:{name}` |
//! | [`read_all`] | GET `.../proxies` |
//! | [`update`] | PUT `.../proxies/{uid}` |
//! | [`delete`] | DELETE `.../proxies/{uid}` |

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::CdoClient;
use crate::context::Context;
use crate::error::{CdoError, Result};
use crate::model::{ConnectorType, PublicKey};
use crate::url;

// ── Response types ─────────────────────────────────────────────────────

/// A connector as returned by CDO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadOutput {
    /// Connector uid, used as `larUid` on devices.
    pub uid: String,
    pub name: String,
    /// Lifecycle status, e.g. `ACTIVE`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub tenant_uid: Option<String>,
    /// Whether the connector currently reaches CDO, e.g. `ONLINE`.
    #[serde(default)]
    pub service_connectivity_state: Option<String>,
    /// `true` for the shared cloud connector.
    #[serde(default)]
    pub cdg: bool,
    /// `true` for the tenant's default connector.
    #[serde(default)]
    pub default_lar: bool,
    /// Only on-prem connectors publish a key.
    #[serde(rename = "larPublicKey", default)]
    pub public_key: Option<PublicKey>,
}

impl ReadOutput {
    /// `Cdg` for the cloud connector, `Sdc` otherwise.
    pub fn connector_type(&self) -> ConnectorType {
        if self.cdg {
            ConnectorType::Cdg
        } else {
            ConnectorType::Sdc
        }
    }
}

/// Output of [`create`].
pub type CreateOutput = ReadOutput;
/// Output of [`update`].
pub type UpdateOutput = ReadOutput;

// ── Request types ──────────────────────────────────────────────────────

/// Body of [`create`].
#[derive(Debug, Clone, Serialize)]
pub struct CreateInput {
    pub name: String,
}

impl CreateInput {
    /// A connector registration for `name`.
    pub fn new(name: &str) -> Self {
        CreateInput {
            name: name.to_string(),
        }
    }
}

/// How to look a connector up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadInput {
    /// Direct read of `/proxies/{uid}`.
    Uid(String),
    /// Name query; the first match wins.
    Name(String),
}

/// Input of [`update`].
#[derive(Debug, Clone)]
pub struct UpdateInput {
    /// Connector to rename.
    pub uid: String,
    /// New name.
    pub name: String,
}

#[derive(Serialize)]
struct UpdateRequestBody<'a> {
    name: &'a str,
}

// ── Endpoint functions ─────────────────────────────────────────────────

/// Registers a new on-prem connector.
///
/// # Errors
///
/// `CdoError::Api` when CDO rejects the name.
pub async fn create(client: &CdoClient, ctx: &Context, input: &CreateInput) -> Result<CreateOutput> {
    info!(parent: client.span(), name = %input.name, "creating connector");
    client
        .post(ctx, &url::create_connector(client.base_url()), input)
        .await
}

/// Reads a connector by uid or by name.
///
/// # Errors
///
/// - `CdoError::NotFound`: no connector has the requested name.
/// - `CdoError::Api`: non-success status (404 for an unknown uid).
pub async fn read(client: &CdoClient, ctx: &Context, input: &ReadInput) -> Result<ReadOutput> {
    match input {
        ReadInput::Uid(uid) => {
            client
                .get(ctx, &url::read_connector_by_uid(client.base_url(), uid))
                .await
        }
        ReadInput::Name(name) => {
            let matches: Vec<ReadOutput> = client
                .get_list(ctx, &url::read_connector_by_name(client.base_url(), name)?)
                .await?;
            matches
                .into_iter()
                .next()
                .ok_or_else(|| CdoError::NotFound {
                    resource: format!("connector {name:?}"),
                })
        }
    }
}

/// Lists every connector of the tenant. An empty tenant yields an empty `Vec`.
///
/// # Errors
///
/// `CdoError::Api` on a non-success status; no partial list is returned.
pub async fn read_all(client: &CdoClient, ctx: &Context) -> Result<Vec<ReadOutput>> {
    client
        .get_list(ctx, &url::read_all_connectors(client.base_url()))
        .await
}

/// Renames a connector.
///
/// # Errors
///
/// `CdoError::Api` on a non-success status.
pub async fn update(client: &CdoClient, ctx: &Context, input: &UpdateInput) -> Result<UpdateOutput> {
    info!(parent: client.span(), uid = %input.uid, "updating connector");
    client
        .put(
            ctx,
            &url::update_connector(client.base_url(), &input.uid),
            &UpdateRequestBody { name: &input.name },
        )
        .await
}

/// Deletes a connector.
///
/// # Errors
///
/// `CdoError::Api` on a non-success status, e.g. 409 while devices use it.
pub async fn delete(client: &CdoClient, ctx: &Context, uid: &str) -> Result<()> {
    info!(parent: client.span(), uid, "deleting connector");
    client
        .delete(ctx, &url::delete_connector(client.base_url(), uid))
        .await
}
