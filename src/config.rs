//! Client configuration: base URL, API token, regions and HTTP timeouts.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CdoError, Result};

/// Where users are pointed when an error needs a maintainer's attention.
pub const ISSUES_URL: &str = "https://github.com/CiscoDevnet/terraform-provider-cdo/issues";

/// Connect timeout for CDO API calls (TCP + TLS handshake only).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall per-request timeout for CDO API calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// A CDO deployment region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// United States.
    Us,
    /// Europe.
    Eu,
    /// Asia-Pacific-Japan.
    Apj,
    /// Australia.
    Aus,
    /// India.
    In,
}

impl Region {
    /// Base URL of the CDO tenant API for this region.
    pub fn base_url(self) -> &'static str {
        match self {
            Region::Us => "https://www.defenseorchestrator.com",
            Region::Eu => "https://www.defenseorchestrator.eu",
            Region::Apj => "https://apj.cdo.cisco.com",
            Region::Aus => "https://aus.cdo.cisco.com",
            Region::In => "https://in.cdo.cisco.com",
        }
    }
}

impl FromStr for Region {
    type Err = CdoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "us" => Ok(Region::Us),
            "eu" => Ok(Region::Eu),
            "apj" => Ok(Region::Apj),
            "aus" => Ok(Region::Aus),
            "in" => Ok(Region::In),
            other => Err(CdoError::Config(format!(
                "unknown region {other:?}, expected one of: us, eu, apj, aus, in"
            ))),
        }
    }
}

/// Settings needed to build a [`crate::client::CdoClient`].
///
/// `Debug` redacts the API token so configs can be logged safely.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the CDO tenant, without a trailing slash.
    pub base_url: String,
    /// CDO API token, sent as a bearer token.
    pub api_token: String,
    /// TCP + TLS handshake timeout.
    pub connect_timeout: Duration,
    /// Full request round-trip timeout.
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Creates a config for an explicit base URL with default timeouts.
    pub fn new(base_url: &str, api_token: &str) -> Self {
        ClientConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Creates a config targeting the given region.
    pub fn for_region(region: Region, api_token: &str) -> Self {
        ClientConfig::new(region.base_url(), api_token)
    }

    /// Overrides the connect and request timeouts.
    pub fn with_timeouts(mut self, connect_timeout: Duration, request_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.request_timeout = request_timeout;
        self
    }

    /// Checks that the base URL is an absolute http(s) URL and a token is set.
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| CdoError::Config(format!("invalid base URL {:?}: {e}", self.base_url)))?;
        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(CdoError::Config(format!(
                "base URL must use http or https, got {:?}",
                url.scheme()
            )));
        }
        if self.api_token.trim().is_empty() {
            return Err(CdoError::Config("API token must not be empty".to_string()));
        }
        Ok(())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &"<redacted>")
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_parses_case_insensitively() {
        assert_eq!("EU".parse::<Region>().unwrap(), Region::Eu);
        assert_eq!("apj".parse::<Region>().unwrap(), Region::Apj);
        assert!("mars".parse::<Region>().is_err());
    }

    #[test]
    fn for_region_uses_regional_base_url() {
        let config = ClientConfig::for_region(Region::Us, "token");
        assert_eq!(config.base_url, "https://www.defenseorchestrator.com");
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
    }

    #[test]
    fn new_strips_trailing_slash() {
        let config = ClientConfig::new("https://unittest.cdo.cisco.com/", "token");
        assert_eq!(config.base_url, "https://unittest.cdo.cisco.com");
    }

    #[test]
    fn validate_rejects_relative_url_and_empty_token() {
        assert!(ClientConfig::new("not a url", "token").validate().is_err());
        assert!(ClientConfig::new("ftp://cdo.example.com", "token").validate().is_err());
        assert!(ClientConfig::new("https://cdo.example.com", "  ").validate().is_err());
        assert!(ClientConfig::new("https://cdo.example.com", "token").validate().is_ok());
    }

    #[test]
    fn debug_redacts_token() {
        let config = ClientConfig::new("https://cdo.example.com", "super-secret");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
