//! ASA onboarding.
//!
//! An ASA is onboarded by creating its device record, handing CDO the
//! device credentials through the ASA config, and waiting for the config's
//! state machine to reach `DONE`. Behind an on-prem connector the
//! credentials are encrypted with that connector's public key.

use tracing::{info, warn};

use crate::client::CdoClient;
use crate::connector;
use crate::context::Context;
use crate::device::{self, ReadInput};
use crate::device_config::{self, ConfigState};
use crate::error::{CdoError, Result};
use crate::model::{ConnectorType, DeviceType, Tags};
use crate::retry::{self, PollConfig, RetryOptions};

/// An ASA is a plain device record.
pub type ReadOutput = device::ReadOutput;
/// Output of [`create`], read back after onboarding finished.
pub type CreateOutput = device::ReadOutput;
/// Output of [`update`].
pub type UpdateOutput = device::ReadOutput;

/// Input of [`create`].
#[derive(Debug, Clone)]
pub struct CreateInput {
    pub name: String,
    /// Connector that reaches the ASA.
    pub connector_uid: String,
    /// `Sdc` connectors get encrypted credentials, `Cdg` ones plaintext.
    pub connector_type: ConnectorType,
    /// `host:port` the connector reaches the ASA at.
    pub socket_address: String,
    /// ASA admin username.
    pub username: String,
    /// ASA admin password; never logged.
    pub password: String,
    /// Trust the ASA certificate without validation.
    pub ignore_certificate: bool,
    pub tags: Tags,
}

/// Input of [`update`].
#[derive(Debug, Clone)]
pub struct UpdateInput {
    /// Device uid of the ASA.
    pub uid: String,
    pub name: String,
    pub tags: Tags,
    /// New `host:port`; `None` keeps the current address.
    pub socket_address: Option<String>,
}

/// Onboards an ASA and waits until CDO has read its configuration.
///
/// # Errors
///
/// - `CdoError::StateMachine` when the config ends in `ERROR` or
///   `BAD_CREDENTIALS`.
/// - `CdoError::RetryExhausted` / `CdoError::Timeout` when it never reaches
///   `DONE`.
/// - Any error from an underlying call, unchanged.
pub async fn create(
    client: &CdoClient,
    ctx: &Context,
    input: &CreateInput,
    poll_config: Option<&PollConfig>,
) -> Result<CreateOutput> {
    info!(parent: client.span(), name = %input.name, "creating asa");

    let created = device::create(
        client,
        ctx,
        &device::CreateInput::new(
            &input.name,
            DeviceType::Asa,
            &input.connector_uid,
            input.connector_type,
            &input.socket_address,
            input.ignore_certificate,
            input.tags.clone(),
        ),
    )
    .await?;

    let specific = device::read_specific(client, ctx, &created.uid).await?;

    let public_key = match input.connector_type {
        ConnectorType::Sdc => {
            let lookup = connector::ReadInput::Uid(input.connector_uid.clone());
            let sdc = connector::read(client, ctx, &lookup).await?;
            if sdc.public_key.is_none() {
                warn!(
                    parent: client.span(),
                    connector_uid = %sdc.uid,
                    "connector has no public key, sending credentials unencrypted"
                );
            }
            sdc.public_key
        }
        ConnectorType::Cdg => None,
    };

    info!(parent: client.span(), specific_uid = %specific.specific_uid, "updating asa credentials");
    device_config::update_credentials(
        client,
        ctx,
        &device_config::UpdateInput::new(
            &specific.specific_uid,
            &input.username,
            &input.password,
            public_key,
            ConfigState::from(specific.state.as_str()),
        ),
    )
    .await?;

    let options = RetryOptions::new("Waiting for ASA to be onboarded to CDO...")
        .poll(poll_config.cloned().unwrap_or_default())
        .span(client.span().clone())
        .early_exit_on_error(true);
    retry::run(ctx, &options, || until_config_done(client, ctx, &specific.specific_uid)).await?;

    device::read(client, ctx, &ReadInput::Uid(created.uid)).await
}

async fn until_config_done(client: &CdoClient, ctx: &Context, specific_uid: &str) -> Result<Option<()>> {
    let config = device_config::read(client, ctx, specific_uid).await?;
    match config.state {
        ConfigState::Done => Ok(Some(())),
        ConfigState::Error | ConfigState::BadCredentials => Err(CdoError::StateMachine {
            state: config.state.to_string(),
            message: "ASA onboarding failed".to_string(),
        }),
        ConfigState::New
        | ConfigState::WaitForUserToUpdateCreds
        | ConfigState::PreWaitForUserToUpdateCreds
        | ConfigState::PendingLocationUpdate
        | ConfigState::CertValidated
        | ConfigState::Unknown(_) => Ok(None),
    }
}

/// Reads an ASA by device uid.
///
/// # Errors
///
/// `CdoError::Api` on a non-success status (404 for an unknown uid).
pub async fn read(client: &CdoClient, ctx: &Context, uid: &str) -> Result<ReadOutput> {
    device::read(client, ctx, &ReadInput::Uid(uid.to_string())).await
}

/// Looks an ASA up by name.
///
/// # Errors
///
/// `CdoError::NotFound` when no `ASA` device has that name.
pub async fn read_by_name(client: &CdoClient, ctx: &Context, name: &str) -> Result<ReadOutput> {
    device::read(
        client,
        ctx,
        &ReadInput::Name {
            name: name.to_string(),
            device_type: DeviceType::Asa,
        },
    )
    .await
}

/// Renames and retags an ASA, moving it when its socket address changed.
///
/// # Errors
///
/// `CdoError::Api` from the read, the device update or the location update.
/// A failed location update leaves the rename in place.
pub async fn update(client: &CdoClient, ctx: &Context, input: &UpdateInput) -> Result<UpdateOutput> {
    info!(parent: client.span(), uid = %input.uid, "updating asa");

    let current = read(client, ctx, &input.uid).await?;
    let updated = device::update(
        client,
        ctx,
        &device::UpdateInput {
            uid: input.uid.clone(),
            name: input.name.clone(),
            tags: input.tags.clone(),
        },
    )
    .await?;

    match &input.socket_address {
        Some(location) if current.socket_address.as_deref() != Some(location.as_str()) => {
            let specific = device::read_specific(client, ctx, &input.uid).await?;
            device_config::update_location(
                client,
                ctx,
                &device_config::UpdateLocationInput {
                    specific_uid: specific.specific_uid,
                    location: location.clone(),
                },
            )
            .await?;
            read(client, ctx, &input.uid).await
        }
        _ => Ok(updated),
    }
}

/// Deletes an ASA's device record.
///
/// # Errors
///
/// `CdoError::Api` on a non-success status.
pub async fn delete(client: &CdoClient, ctx: &Context, uid: &str) -> Result<()> {
    info!(parent: client.span(), uid, "deleting asa");
    device::delete(client, ctx, uid).await
}
