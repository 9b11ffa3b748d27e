//! Endpoint URL builders.
//!
//! Pure functions from a base URL (and resource ids) to fully qualified
//! endpoint URLs. Keeping every path in one place makes it easy to check
//! them against `manifest/endpoints.toml`.
//!
//! Name lookups carry caller-supplied text in the query string, so those
//! builders form-encode it and can fail on a base URL that does not parse.

use crate::error::{CdoError, Result};

const TARGETS: &str = "aegis/rest/v1/services/targets";

/// Collection of secure device connectors.
pub fn read_all_connectors(base_url: &str) -> String {
    format!("{base_url}/{TARGETS}/proxies")
}

/// Create a secure device connector.
pub fn create_connector(base_url: &str) -> String {
    read_all_connectors(base_url)
}

/// A single connector by uid; also the update and delete endpoint.
pub fn read_connector_by_uid(base_url: &str, uid: &str) -> String {
    format!("{base_url}/{TARGETS}/proxies/{uid}")
}

/// Connector lookup by name.
///
/// # Errors
///
/// `CdoError::Config` when `base_url` is not an absolute URL.
pub fn read_connector_by_name(base_url: &str, name: &str) -> Result<String> {
    with_query(
        format!("{base_url}/{TARGETS}/proxies"),
        "q",
        &format!("name:{name}"),
    )
}

pub fn update_connector(base_url: &str, uid: &str) -> String {
    read_connector_by_uid(base_url, uid)
}

pub fn delete_connector(base_url: &str, uid: &str) -> String {
    read_connector_by_uid(base_url, uid)
}

/// Collection of devices; also the device creation endpoint.
pub fn read_all_devices(base_url: &str) -> String {
    format!("{base_url}/{TARGETS}/devices")
}

pub fn create_device(base_url: &str) -> String {
    read_all_devices(base_url)
}

/// A single device by uid; also the update and delete endpoint.
pub fn read_device(base_url: &str, uid: &str) -> String {
    format!("{base_url}/{TARGETS}/devices/{uid}")
}

/// Device lookup by name, restricted to one device type.
///
/// # Errors
///
/// `CdoError::Config` when `base_url` is not an absolute URL.
pub fn read_device_by_name_and_type(
    base_url: &str,
    name: &str,
    device_type: &str,
) -> Result<String> {
    with_query(
        format!("{base_url}/{TARGETS}/devices"),
        "q",
        &format!("name:{name} AND deviceType:{device_type}"),
    )
}

pub fn update_device(base_url: &str, uid: &str) -> String {
    read_device(base_url, uid)
}

pub fn delete_device(base_url: &str, uid: &str) -> String {
    read_device(base_url, uid)
}

/// The type-specialized sub-resource of a device.
pub fn read_specific_device(base_url: &str, uid: &str) -> String {
    format!("{base_url}/aegis/rest/v1/device/{uid}/specific-device")
}

/// The cloud FMC record of the tenant.
pub fn read_cloud_fmc(base_url: &str) -> String {
    format!("{base_url}/{TARGETS}/devices?q=deviceType:FMCE")
}

/// FMC domain info, routed through the CDO FMC proxy.
pub fn read_fmc_domain_info(base_url: &str) -> String {
    format!("{base_url}/fmc/api/fmc_platform/v1/info/domain")
}

/// Access policies of an FMC domain, routed through the CDO FMC proxy.
pub fn read_access_policies(base_url: &str, domain_uid: &str, limit: usize) -> String {
    format!(
        "{base_url}/fmc/api/fmc_config/v1/domain/{domain_uid}/policy/accesspolicies?limit={limit}"
    )
}

/// Specific (type-specialized) record of a cloud FTD.
pub fn update_ftd_specific(base_url: &str, specific_uid: &str) -> String {
    format!("{base_url}/aegis/rest/v1/services/firepower/ftds/{specific_uid}")
}

/// Specific (type-specialized) record of the cloud FMC appliance.
pub fn update_fmc_appliance(base_url: &str, fmc_specific_uid: &str) -> String {
    format!("{base_url}/aegis/rest/v1/services/fmc/appliance/{fmc_specific_uid}")
}

/// Collection of ASA configs.
pub fn read_all_asa_configs(base_url: &str) -> String {
    format!("{base_url}/aegis/rest/v1/services/asa/configs")
}

pub fn create_asa_config(base_url: &str) -> String {
    read_all_asa_configs(base_url)
}

/// A single ASA config by its specific uid; also the update and delete endpoint.
pub fn read_asa_config(base_url: &str, specific_uid: &str) -> String {
    format!("{base_url}/aegis/rest/v1/services/asa/configs/{specific_uid}")
}

pub fn update_asa_config(base_url: &str, specific_uid: &str) -> String {
    read_asa_config(base_url, specific_uid)
}

pub fn delete_asa_config(base_url: &str, specific_uid: &str) -> String {
    read_asa_config(base_url, specific_uid)
}

/// Appends one form-encoded query pair to `url`.
fn with_query(url: String, key: &str, value: &str) -> Result<String> {
    let mut parsed = reqwest::Url::parse(&url)
        .map_err(|e| CdoError::Config(format!("invalid URL {url:?}: {e}")))?;
    parsed.query_pairs_mut().append_pair(key, value);
    Ok(parsed.to_string())
}
