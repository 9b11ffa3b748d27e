//! Cloud-managed FTDs (device type `FTDC`), registered to the tenant's
//! cloud FMC.
//!
//! Creating one is a multi-step workflow: CDO only allocates the record and
//! then works out, asynchronously, the `configure manager` command the user
//! has to paste into the FTD CLI. [`create`] drives every step and waits for
//! that command; [`delete`] asks the FMC to unregister the FTD and waits for
//! the record to disappear.
//!
//! Neither workflow rolls back: a failure after the device was posted leaves
//! the partially onboarded record in CDO.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::CdoClient;
use crate::cloud_fmc;
use crate::context::Context;
use crate::device;
use crate::error::{CdoError, Result};
use crate::model::{DeviceType, License, Tags, Tier};
pub use crate::model::QueueTriggerState;
use crate::retry::{self, PollConfig, RetryOptions};
use crate::url;

/// Page size used to look the access policy up.
pub const ACCESS_POLICY_LIMIT: usize = 1000;

/// Number of polls made while waiting for the registration command.
pub const CREATE_POLL_RETRIES: u32 = 3;

// ── Types ──────────────────────────────────────────────────────────────

/// Onboarding metadata of a cloud FTD. Absent fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Access policy the FTD is assigned to.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub access_policy_name: Option<String>,
    /// Uuid of that policy on the cloud FMC.
    #[serde(rename = "accessPolicyUuid", skip_serializing_if = "Option::is_none", default)]
    pub access_policy_uid: Option<String>,
    /// Comma-joined licenses, see [`License::serialize_all`].
    #[serde(rename = "license_caps", skip_serializing_if = "Option::is_none", default)]
    pub license_caps: Option<String>,
    /// Tier of a virtual FTD; never set for physical ones.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub performance_tier: Option<Tier>,
    /// The `configure manager add ...` command to run on the FTD.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub generated_command: Option<String>,
    /// Hostname of the cloud FMC the FTD registers with.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cloud_manager_domain: Option<String>,
    /// NAT id embedded in the registration command.
    #[serde(rename = "natID", skip_serializing_if = "Option::is_none", default)]
    pub nat_id: Option<String>,
    /// Registration key embedded in the registration command.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reg_key: Option<String>,
}

impl Metadata {
    fn has_generated_command(&self) -> bool {
        self.generated_command
            .as_deref()
            .is_some_and(|command| !command.is_empty())
    }
}

/// A cloud FTD as returned by CDO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadOutput {
    /// Device uid assigned by CDO.
    pub uid: String,
    pub name: String,
    /// Absent until CDO has produced any onboarding metadata.
    #[serde(default)]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub tags: Tags,
}

/// Output of [`create`]; `metadata` holds the polled registration command.
pub type CreateOutput = ReadOutput;
/// Output of [`update`].
pub type UpdateOutput = ReadOutput;

/// Input of [`create`].
#[derive(Debug, Clone)]
pub struct CreateInput {
    pub name: String,
    /// Name of an access policy on the cloud FMC, matched exactly.
    pub access_policy_name: String,
    /// Only sent for virtual FTDs.
    pub performance_tier: Option<Tier>,
    /// FTDv rather than a physical appliance.
    pub is_virtual: bool,
    /// Smart licenses to enable; may be empty.
    pub licenses: Vec<License>,
    pub tags: Tags,
}

/// Input of [`update`]; serialized as the PUT body.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateInput {
    /// Device to update; part of the URL, not the body.
    #[serde(skip)]
    pub uid: String,
    pub name: String,
    pub tags: Tags,
}

/// Input of [`update_specific`].
#[derive(Debug, Clone, Serialize)]
pub struct UpdateSpecificInput {
    /// Specific uid from [`device::read_specific`]; part of the URL.
    #[serde(skip)]
    pub specific_uid: String,
    /// Transition to queue.
    #[serde(rename = "queueTriggerState")]
    pub queue_trigger_state: QueueTriggerState,
}

/// Output of [`update_specific`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateSpecificOutput {
    /// Specific uid of the updated record.
    pub uid: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequestBody<'a> {
    #[serde(rename = "associatedDeviceUid")]
    fmc_uid: &'a str,
    device_type: DeviceType,
    metadata: Metadata,
    name: &'a str,
    state: &'static str,
    #[serde(rename = "type")]
    record_type: &'static str,
    model: bool,
    tags: &'a Tags,
}

#[derive(Debug, Serialize)]
struct DeleteRequestBody<'a> {
    #[serde(rename = "queueTriggerState")]
    queue_trigger_state: QueueTriggerState,
    #[serde(rename = "stateMachineContext")]
    sm_context: DeleteSmContext<'a>,
}

#[derive(Debug, Serialize)]
struct DeleteSmContext<'a> {
    #[serde(rename = "ftdCDOUid")]
    ftd_uid: &'a str,
}

// ── Workflows ──────────────────────────────────────────────────────────

/// Onboards a cloud FTD and waits for its registration command.
///
/// `poll_config` overrides how long to wait for the command; by default the
/// device is polled [`CREATE_POLL_RETRIES`] times after the first attempt.
///
/// # Errors
///
/// - `CdoError::NotFound` when the tenant has no cloud FMC.
/// - `CdoError::DomainNotFound` when the FMC reports no domain.
/// - `CdoError::PolicyNotFound` when no access policy has the given name;
///   nothing is created in that case.
/// - `CdoError::RetryExhausted` / `CdoError::Timeout` when the command never
///   shows up.
/// - Any error from an underlying call, unchanged.
pub async fn create(
    client: &CdoClient,
    ctx: &Context,
    input: &CreateInput,
    poll_config: Option<&PollConfig>,
) -> Result<CreateOutput> {
    info!(parent: client.span(), name = %input.name, "creating cloud ftd");

    let fmc = cloud_fmc::read(client, ctx).await?;

    let domains = cloud_fmc::read_domain_info(client, ctx, &fmc.host).await?;
    let domain = domains.items.first().ok_or(CdoError::DomainNotFound)?;

    let policies =
        cloud_fmc::read_access_policies(client, ctx, &fmc.host, &domain.uuid, ACCESS_POLICY_LIMIT)
            .await?;
    let policy = policies
        .find(&input.access_policy_name)
        .ok_or_else(|| CdoError::PolicyNotFound {
            name: input.access_policy_name.clone(),
            available: policies.names(),
        })?;

    let license_caps = License::serialize_all(&input.licenses);
    // Physical FTDs have no performance tier.
    let performance_tier = if input.is_virtual {
        input.performance_tier
    } else {
        None
    };

    info!(parent: client.span(), "posting ftd device");
    let body = CreateRequestBody {
        fmc_uid: &fmc.uid,
        device_type: DeviceType::CloudFtd,
        metadata: Metadata {
            access_policy_name: Some(policy.name.clone()),
            access_policy_uid: Some(policy.id.clone()),
            license_caps: (!license_caps.is_empty()).then_some(license_caps),
            performance_tier,
            ..Metadata::default()
        },
        name: &input.name,
        state: "NEW",
        record_type: "devices",
        model: false,
        tags: &input.tags,
    };
    let created: ReadOutput = client
        .post(ctx, &url::create_device(client.base_url()), &body)
        .await?;

    info!(parent: client.span(), uid = %created.uid, "reading ftd specific device");
    let specific = device::read_specific(client, ctx, &created.uid).await?;

    update_specific(
        client,
        ctx,
        &UpdateSpecificInput {
            specific_uid: specific.specific_uid,
            queue_trigger_state: QueueTriggerState::InitiateFtdcOnboarding,
        },
    )
    .await?;

    let poll = poll_config
        .cloned()
        .unwrap_or_else(|| PollConfig::default().with_retries(CREATE_POLL_RETRIES));
    let options = RetryOptions::new("Waiting for FTD record to be created in CDO...")
        .poll(poll)
        .span(client.span().clone())
        .early_exit_on_error(true);
    let metadata = retry::run(ctx, &options, || {
        until_generated_command_available(client, ctx, &created.uid)
    })
    .await?;

    Ok(CreateOutput {
        uid: created.uid,
        name: created.name,
        metadata: Some(metadata),
        tags: created.tags,
    })
}

async fn until_generated_command_available(
    client: &CdoClient,
    ctx: &Context,
    uid: &str,
) -> Result<Option<Metadata>> {
    let ftd = read(client, ctx, uid).await?;
    Ok(ftd.metadata.filter(Metadata::has_generated_command))
}

/// Unregisters a cloud FTD from the cloud FMC and waits until CDO has
/// removed its record.
///
/// # Errors
///
/// - `CdoError::NotFound` when the tenant has no cloud FMC.
/// - `CdoError::RetryExhausted` / `CdoError::Timeout` when the record never
///   disappears.
/// - Any other error from an underlying call or poll read, unchanged.
pub async fn delete(
    client: &CdoClient,
    ctx: &Context,
    uid: &str,
    poll_config: Option<&PollConfig>,
) -> Result<()> {
    info!(parent: client.span(), uid, "deleting cloud ftd");

    let fmc = cloud_fmc::read(client, ctx).await?;
    let fmc_specific = device::read_specific(client, ctx, &fmc.uid).await?;

    let body = DeleteRequestBody {
        queue_trigger_state: QueueTriggerState::PendingDeleteFtdc,
        sm_context: DeleteSmContext { ftd_uid: uid },
    };
    let _: serde::de::IgnoredAny = client
        .put(
            ctx,
            &url::update_fmc_appliance(client.base_url(), &fmc_specific.specific_uid),
            &body,
        )
        .await?;

    let options = RetryOptions::new("Waiting for FTD to be deleted from CDO...")
        .poll(poll_config.cloned().unwrap_or_default())
        .span(client.span().clone())
        .early_exit_on_error(true);
    retry::run(ctx, &options, || async move {
        match device::read(client, ctx, &device::ReadInput::Uid(uid.to_string())).await {
            Ok(_) => Ok(None),
            Err(e) if e.is_not_found() => Ok(Some(())),
            Err(e) => Err(e),
        }
    })
    .await
}

// ── Endpoint functions ─────────────────────────────────────────────────

/// Reads a cloud FTD by device uid.
///
/// # Errors
///
/// `CdoError::Api` on a non-success status (404 for an unknown uid).
pub async fn read(client: &CdoClient, ctx: &Context, uid: &str) -> Result<ReadOutput> {
    client
        .get(ctx, &url::read_device(client.base_url(), uid))
        .await
}

/// Looks a cloud FTD up by name.
///
/// # Errors
///
/// `CdoError::NotFound` when no `FTDC` device has that name.
pub async fn read_by_name(client: &CdoClient, ctx: &Context, name: &str) -> Result<ReadOutput> {
    let matches: Vec<ReadOutput> = client
        .get_list(
            ctx,
            &url::read_device_by_name_and_type(client.base_url(), name, DeviceType::CloudFtd.as_str())?,
        )
        .await?;
    matches.into_iter().next().ok_or_else(|| CdoError::NotFound {
        resource: format!("cloud FTD {name:?}"),
    })
}

/// Renames and retags a cloud FTD.
///
/// # Errors
///
/// `CdoError::Api` on a non-success status.
pub async fn update(client: &CdoClient, ctx: &Context, input: &UpdateInput) -> Result<UpdateOutput> {
    info!(parent: client.span(), uid = %input.uid, "updating cloud ftd");
    client
        .put(ctx, &url::update_device(client.base_url(), &input.uid), input)
        .await
}

/// Queues a state transition on the FTD's specific record.
///
/// # Errors
///
/// `CdoError::Api` when CDO refuses the transition.
pub async fn update_specific(
    client: &CdoClient,
    ctx: &Context,
    input: &UpdateSpecificInput,
) -> Result<UpdateSpecificOutput> {
    info!(
        parent: client.span(),
        specific_uid = %input.specific_uid,
        state = ?input.queue_trigger_state,
        "updating ftd specific device"
    );
    client
        .put(
            ctx,
            &url::update_ftd_specific(client.base_url(), &input.specific_uid),
            input,
        )
        .await
}
