//! Generic device records.
//!
//! Every managed device (ASA, cloud FTD, cloud FMC, ...) has a generic
//! record under `/aegis/rest/v1/services/targets/devices` and a
//! type-specialized "specific device" record layered on top. The specific
//! record carries the device's state machine; see [`read_specific`].

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::CdoClient;
use crate::context::Context;
use crate::error::{CdoError, Result};
use crate::model::{ConnectorType, DeviceType, Tags};
use crate::url;

// ── Response types ─────────────────────────────────────────────────────

/// A device record as returned by CDO.
///
/// Only `uid` and `name` are guaranteed; the rest depends on device type
/// and onboarding stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadOutput {
    /// Device uid assigned by CDO.
    pub uid: String,
    /// Display name; unique per device type.
    pub name: String,
    /// Creation time, epoch milliseconds.
    #[serde(default)]
    pub created_date: Option<i64>,
    /// Last modification time, epoch milliseconds.
    #[serde(default)]
    pub last_updated_date: Option<i64>,
    #[serde(default)]
    pub device_type: Option<DeviceType>,
    /// Connector the device is reached through.
    #[serde(rename = "larUid", default)]
    pub connector_uid: Option<String>,
    #[serde(rename = "larType", default)]
    pub connector_type: Option<ConnectorType>,
    /// `host:port` the connector reaches the device at.
    #[serde(rename = "ipv4", default)]
    pub socket_address: Option<String>,
    /// Host part of `socket_address`.
    #[serde(default)]
    pub host: Option<String>,
    /// Port part of `socket_address`, as CDO sends it (a string).
    #[serde(default)]
    pub port: Option<String>,
    /// Whether the device certificate is trusted without validation.
    #[serde(default)]
    pub ignore_certificate: Option<bool>,
    /// Numeric connectivity code; positive means reachable.
    #[serde(default)]
    pub connectivity_state: Option<i32>,
    /// Last connectivity failure, if any.
    #[serde(default)]
    pub connectivity_error: Option<String>,
    /// Onboarding stage of the generic record.
    #[serde(default)]
    pub state: Option<String>,
    /// Sync status, e.g. `IDLE`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tags: Tags,
}

/// Output of [`create`].
pub type CreateOutput = ReadOutput;
/// Output of [`update`].
pub type UpdateOutput = ReadOutput;

/// The type-specialized record of a device.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReadSpecificOutput {
    /// Uid of the specific record, distinct from the device uid.
    #[serde(rename = "uid")]
    pub specific_uid: String,
    /// Current stage of the device's state machine.
    #[serde(default)]
    pub state: String,
    /// Service namespace, e.g. `asa` or `firepower`.
    #[serde(default)]
    pub namespace: Option<String>,
    /// Record type within the namespace, e.g. `configs`.
    #[serde(rename = "type", default)]
    pub specific_type: Option<String>,
}

// ── Request types ──────────────────────────────────────────────────────

/// Request body for POST `/devices`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInput {
    pub name: String,
    pub device_type: DeviceType,
    /// Connector that will reach the device.
    #[serde(rename = "larUid")]
    pub connector_uid: String,
    #[serde(rename = "larType")]
    pub connector_type: ConnectorType,
    /// `host:port` of the device.
    #[serde(rename = "ipv4")]
    pub socket_address: String,
    /// Model devices are placeholders; always `false` from [`CreateInput::new`].
    pub model: bool,
    pub ignore_certificate: bool,
    pub tags: Tags,
}

impl CreateInput {
    /// Builds a non-model device creation request.
    pub fn new(
        name: &str,
        device_type: DeviceType,
        connector_uid: &str,
        connector_type: ConnectorType,
        socket_address: &str,
        ignore_certificate: bool,
        tags: Tags,
    ) -> Self {
        CreateInput {
            name: name.to_string(),
            device_type,
            connector_uid: connector_uid.to_string(),
            connector_type,
            socket_address: socket_address.to_string(),
            model: false,
            ignore_certificate,
            tags,
        }
    }
}

/// How to look a device up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadInput {
    /// Direct read of `/devices/{uid}`.
    Uid(String),
    /// Device names are only unique per device type.
    Name { name: String, device_type: DeviceType },
}

/// Request body for PUT `/devices/{uid}`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateInput {
    /// Device to update; part of the URL, not the body.
    #[serde(skip)]
    pub uid: String,
    /// New display name.
    pub name: String,
    /// Replacement tags.
    pub tags: Tags,
}

// ── Endpoint functions ─────────────────────────────────────────────────

/// Creates a device record. Onboarding itself is driven by the
/// type-specific workflows in [`crate::asa`] and [`crate::cloud_ftd`].
///
/// # Errors
///
/// `CdoError::Api` when CDO rejects the record (e.g. a duplicate name).
pub async fn create(client: &CdoClient, ctx: &Context, input: &CreateInput) -> Result<CreateOutput> {
    info!(parent: client.span(), name = %input.name, device_type = %input.device_type, "creating device");
    client
        .post(ctx, &url::create_device(client.base_url()), input)
        .await
}

/// Reads a device by uid, or by name and type.
///
/// # Errors
///
/// - `CdoError::NotFound`: no device of that type has the requested name.
/// - `CdoError::Api`: non-success status (404 for an unknown uid).
pub async fn read(client: &CdoClient, ctx: &Context, input: &ReadInput) -> Result<ReadOutput> {
    match input {
        ReadInput::Uid(uid) => client.get(ctx, &url::read_device(client.base_url(), uid)).await,
        ReadInput::Name { name, device_type } => {
            let matches: Vec<ReadOutput> = client
                .get_list(
                    ctx,
                    &url::read_device_by_name_and_type(client.base_url(), name, device_type.as_str())?,
                )
                .await?;
            matches
                .into_iter()
                .next()
                .ok_or_else(|| CdoError::NotFound {
                    resource: format!("{device_type} device {name:?}"),
                })
        }
    }
}

/// Lists every device of the tenant. An empty tenant yields an empty `Vec`.
///
/// # Errors
///
/// `CdoError::Api` on a non-success status; no partial list is returned.
pub async fn read_all(client: &CdoClient, ctx: &Context) -> Result<Vec<ReadOutput>> {
    client
        .get_list(ctx, &url::read_all_devices(client.base_url()))
        .await
}

/// Renames and retags a device.
///
/// # Errors
///
/// `CdoError::Api` on a non-success status.
pub async fn update(client: &CdoClient, ctx: &Context, input: &UpdateInput) -> Result<UpdateOutput> {
    info!(parent: client.span(), uid = %input.uid, "updating device");
    client
        .put(ctx, &url::update_device(client.base_url(), &input.uid), input)
        .await
}

/// Deletes a device record.
///
/// # Errors
///
/// `CdoError::Api` on a non-success status (404 once it is gone).
pub async fn delete(client: &CdoClient, ctx: &Context, uid: &str) -> Result<()> {
    info!(parent: client.span(), uid, "deleting device");
    client
        .delete(ctx, &url::delete_device(client.base_url(), uid))
        .await
}

/// Reads the type-specialized record layered on device `uid`.
///
/// # Errors
///
/// `CdoError::Api` on a non-success status.
pub async fn read_specific(client: &CdoClient, ctx: &Context, uid: &str) -> Result<ReadSpecificOutput> {
    client
        .get(ctx, &url::read_specific_device(client.base_url(), uid))
        .await
}
