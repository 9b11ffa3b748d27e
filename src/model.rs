//! Types shared across the resource modules: tags, device types, FTD
//! performance tiers, licenses, queue trigger states and connector public
//! keys.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Device tags, keyed by category. Plain labels live under `"labels"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(pub BTreeMap<String, Vec<String>>);

impl Tags {
    /// Tags holding only the given labels.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        let mut map = BTreeMap::new();
        if !labels.is_empty() {
            map.insert("labels".to_string(), labels);
        }
        Tags(map)
    }

    /// The plain labels, empty if there are none.
    pub fn labels(&self) -> &[String] {
        self.0.get("labels").map(Vec::as_slice).unwrap_or_default()
    }
}

/// CDO device type.
///
/// `Unknown` catches device types this client does not model, so listing
/// a tenant with exotic devices does not fail deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceType {
    #[serde(rename = "ASA")]
    Asa,
    #[serde(rename = "IOS")]
    Ios,
    #[serde(rename = "FTD")]
    Ftd,
    /// An FTD managed by a cloud-delivered FMC.
    #[serde(rename = "FTDC")]
    CloudFtd,
    /// A cloud-delivered FMC.
    #[serde(rename = "FMCE")]
    CloudFmc,
    #[serde(other)]
    Unknown,
}

impl DeviceType {
    /// Wire name, as used in query filters.
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceType::Asa => "ASA",
            DeviceType::Ios => "IOS",
            DeviceType::Ftd => "FTD",
            DeviceType::CloudFtd => "FTDC",
            DeviceType::CloudFmc => "FMCE",
            DeviceType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Performance tier of a virtual FTD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    #[serde(rename = "FTDv5")]
    FtdV5,
    #[serde(rename = "FTDv10")]
    FtdV10,
    #[serde(rename = "FTDv20")]
    FtdV20,
    #[serde(rename = "FTDv30")]
    FtdV30,
    #[serde(rename = "FTDv50")]
    FtdV50,
    #[serde(rename = "FTDv100")]
    FtdV100,
    /// Legacy, untiered FTDv.
    #[serde(rename = "FTDv")]
    FtdV,
}

impl Tier {
    pub fn parse(s: &str) -> Option<Tier> {
        let tier = match s {
            "FTDv5" => Tier::FtdV5,
            "FTDv10" => Tier::FtdV10,
            "FTDv20" => Tier::FtdV20,
            "FTDv30" => Tier::FtdV30,
            "FTDv50" => Tier::FtdV50,
            "FTDv100" => Tier::FtdV100,
            "FTDv" => Tier::FtdV,
            _ => return None,
        };
        Some(tier)
    }
}

/// FTD smart license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum License {
    #[serde(rename = "BASE")]
    Base,
    #[serde(rename = "CARRIER")]
    Carrier,
    #[serde(rename = "THREAT")]
    Threat,
    #[serde(rename = "MALWARE")]
    Malware,
    #[serde(rename = "URLFilter")]
    UrlFilter,
}

impl License {
    pub fn as_str(self) -> &'static str {
        match self {
            License::Base => "BASE",
            License::Carrier => "CARRIER",
            License::Threat => "THREAT",
            License::Malware => "MALWARE",
            License::UrlFilter => "URLFilter",
        }
    }

    pub fn parse(s: &str) -> Option<License> {
        [
            License::Base,
            License::Carrier,
            License::Threat,
            License::Malware,
            License::UrlFilter,
        ]
        .into_iter()
        .find(|l| l.as_str().eq_ignore_ascii_case(s))
    }

    /// Serializes licenses the way CDO stores them in `license_caps`.
    pub fn serialize_all(licenses: &[License]) -> String {
        licenses
            .iter()
            .map(|l| l.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Kind of secure device connector a device is reached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectorType {
    /// Cloud connector ("cloud device gateway").
    #[serde(rename = "CDG")]
    Cdg,
    /// On-prem secure device connector.
    #[serde(rename = "SDC")]
    Sdc,
}

/// State transitions the client asks CDO to queue on a specific device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueTriggerState {
    /// Start registering a cloud FTD with the cloud FMC.
    InitiateFtdcOnboarding,
    /// Unregister a cloud FTD; sent to the FMC appliance.
    PendingDeleteFtdc,
    /// Re-point an ASA config at a new `host:port`.
    PendingLocationUpdate,
}

/// RSA public key published by an on-prem connector.
///
/// `encoded_key` is the base64 encoding of a PEM `PUBLIC KEY` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKey {
    /// Base64 of the PEM-encoded key.
    pub encoded_key: String,
    /// Key rotation counter.
    #[serde(default)]
    pub version: i64,
    /// Identifier echoed back as `keyId` with encrypted credentials.
    pub key_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_serialize_labels_under_labels_key() {
        let tags = Tags::new(["prod", "branch"]);
        let json = serde_json::to_value(&tags).unwrap();
        assert_eq!(json, serde_json::json!({"labels": ["prod", "branch"]}));
        assert_eq!(tags.labels(), ["prod", "branch"]);
    }

    #[test]
    fn empty_tags_serialize_as_empty_object() {
        let json = serde_json::to_value(Tags::new(Vec::<String>::new())).unwrap();
        assert_eq!(json, serde_json::json!({}));
        assert!(Tags::default().labels().is_empty());
    }

    #[test]
    fn device_type_wire_names() {
        assert_eq!(serde_json::to_string(&DeviceType::CloudFtd).unwrap(), "\"FTDC\"");
        assert_eq!(serde_json::to_string(&DeviceType::CloudFmc).unwrap(), "\"FMCE\"");
        let unknown: DeviceType = serde_json::from_str("\"MERAKI_MX\"").unwrap();
        assert_eq!(unknown, DeviceType::Unknown);
    }

    #[test]
    fn tier_wire_names_and_parse() {
        assert_eq!(serde_json::to_string(&Tier::FtdV100).unwrap(), "\"FTDv100\"");
        assert_eq!(Tier::parse("FTDv30"), Some(Tier::FtdV30));
        assert_eq!(Tier::parse("FTDv7"), None);
    }

    #[test]
    fn licenses_serialize_comma_joined() {
        let caps = License::serialize_all(&[License::Base, License::Threat, License::UrlFilter]);
        assert_eq!(caps, "BASE,THREAT,URLFilter");
        assert_eq!(License::serialize_all(&[]), "");
        assert_eq!(License::parse("urlfilter"), Some(License::UrlFilter));
    }

    #[test]
    fn queue_trigger_states_use_wire_names() {
        let names: Vec<String> = [
            QueueTriggerState::InitiateFtdcOnboarding,
            QueueTriggerState::PendingDeleteFtdc,
            QueueTriggerState::PendingLocationUpdate,
        ]
        .iter()
        .map(|state| serde_json::to_value(state).unwrap().as_str().unwrap().to_string())
        .collect();
        assert_eq!(
            names,
            ["INITIATE_FTDC_ONBOARDING", "PENDING_DELETE_FTDC", "PENDING_LOCATION_UPDATE"]
        );
    }

    #[test]
    fn public_key_uses_camel_case() {
        let json = r#"{"encodedKey":"abc","version":164,"keyId":"k-1"}"#;
        let key: PublicKey = serde_json::from_str(json).unwrap();
        assert_eq!(key.key_id, "k-1");
        assert_eq!(key.version, 164);
    }
}
