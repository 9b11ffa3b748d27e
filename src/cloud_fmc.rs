//! The tenant's cloud-delivered FMC and the FMC APIs behind it.
//!
//! CDO exposes the cloud FMC as an ordinary device record of type `FMCE`.
//! The FMC's own REST API is reached through CDO's FMC proxy: the request
//! goes to `{base}/fmc/api/...` with the FMC host in the `fmc-hostname`
//! header (see [`CdoClient::get_via_fmc`]).

use serde::Deserialize;
use tracing::debug;

use crate::client::CdoClient;
use crate::context::Context;
use crate::error::{CdoError, Result};
use crate::url;

// ── Response types ─────────────────────────────────────────────────────

/// The cloud FMC device record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadOutput {
    /// Device uid of the FMC in CDO.
    pub uid: String,
    pub name: String,
    /// Hostname used to route requests through the FMC proxy.
    pub host: String,
    /// Onboarding state reported by CDO.
    #[serde(default)]
    pub state: Option<String>,
    /// Connectivity status reported by CDO.
    #[serde(default)]
    pub status: Option<String>,
}

/// Domains of an FMC. The first one is the domain devices register into.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DomainInfo {
    /// FMC omits `items` when it reports no domains.
    #[serde(default)]
    pub items: Vec<Domain>,
}

/// One FMC domain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Domain {
    /// Domain uid used in FMC config URLs.
    pub uuid: String,
    /// Domain path, e.g. `Global`.
    pub name: String,
    #[serde(rename = "type", default)]
    pub domain_type: Option<String>,
}

/// One page of access policies.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccessPolicies {
    /// FMC omits `items` when a domain has no policies.
    #[serde(default)]
    pub items: Vec<AccessPolicy>,
    /// Paging info; absent on some FMC versions.
    #[serde(default)]
    pub paging: Option<Paging>,
}

impl AccessPolicies {
    /// Returns the policy whose name equals `name` exactly.
    pub fn find(&self, name: &str) -> Option<&AccessPolicy> {
        self.items.iter().find(|policy| policy.name == name)
    }

    /// Names of every policy on the page, in FMC order.
    pub fn names(&self) -> Vec<String> {
        self.items.iter().map(|policy| policy.name.clone()).collect()
    }
}

/// An FMC access control policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccessPolicy {
    /// Policy uuid, sent as `accessPolicyUuid` when onboarding an FTD.
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub policy_type: Option<String>,
}

/// FMC paging block.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub pages: u64,
}

// ── Endpoint functions ─────────────────────────────────────────────────

/// Reads the tenant's cloud FMC record.
///
/// # Errors
///
/// - `CdoError::NotFound` when the tenant has no cloud FMC.
/// - `CdoError::Api` when CDO rejects the lookup.
pub async fn read(client: &CdoClient, ctx: &Context) -> Result<ReadOutput> {
    let fmcs: Vec<ReadOutput> = client
        .get_list(ctx, &url::read_cloud_fmc(client.base_url()))
        .await?;
    if fmcs.len() > 1 {
        debug!(parent: client.span(), count = fmcs.len(), "multiple cloud FMC records, using the first");
    }
    fmcs.into_iter().next().ok_or_else(|| CdoError::NotFound {
        resource: "cloud FMC".to_string(),
    })
}

/// Reads the domains of the FMC at `fmc_host`.
///
/// # Errors
///
/// `CdoError::Api` when the proxy or the FMC rejects the request.
pub async fn read_domain_info(client: &CdoClient, ctx: &Context, fmc_host: &str) -> Result<DomainInfo> {
    client
        .get_via_fmc(ctx, &url::read_fmc_domain_info(client.base_url()), fmc_host)
        .await
}

/// Reads up to `limit` access policies of `domain_uid`.
///
/// # Errors
///
/// `CdoError::Api` when the proxy or the FMC rejects the request.
pub async fn read_access_policies(
    client: &CdoClient,
    ctx: &Context,
    fmc_host: &str,
    domain_uid: &str,
    limit: usize,
) -> Result<AccessPolicies> {
    client
        .get_via_fmc(
            ctx,
            &url::read_access_policies(client.base_url(), domain_uid, limit),
            fmc_host,
        )
        .await
}
