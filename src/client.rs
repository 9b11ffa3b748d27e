//! Authenticated HTTP client for the CDO REST API.
//!
//! `CdoClient` wraps a `reqwest::Client`, the tenant base URL and the API
//! token. It provides JSON request helpers (`get`, `get_list`,
//! `get_via_fmc`, `post`, `put`, `delete`). Every helper takes the caller's
//! [`Context`], so a cancelled context drops the in-flight request.
//!
//! Unlike `error_for_status()`, non-2xx responses are turned into
//! [`CdoError::Api`] with the body preserved. CDO reports validation
//! failures and state-machine conflicts in that body.
//!
//! Logging goes to the span the client was built with. Callers who want the
//! client's output nested under their own span inject it with
//! [`CdoClient::with_span`].

use std::fmt;

use reqwest::{Client, Method};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{Span, debug, info_span, warn};

use crate::config::ClientConfig;
use crate::context::Context;
use crate::error::{CdoError, Result};

/// Header the CDO FMC proxy uses to route a request to a cloud FMC.
const FMC_HOSTNAME_HEADER: &str = "fmc-hostname";

const USER_AGENT: &str = concat!("cdo-client/", env!("CARGO_PKG_VERSION"));

/// Authenticated HTTP client for the CDO REST API.
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Clone)]
pub struct CdoClient {
    client: Client,
    base_url: String,
    api_token: String,
    span: Span,
}

impl CdoClient {
    /// Builds a client from a validated [`ClientConfig`].
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build()?;
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(CdoClient {
            client,
            span: info_span!("cdo_client", base_url = %base_url),
            base_url,
            api_token: config.api_token.clone(),
        })
    }

    /// Builds a client with default timeouts for an explicit base URL.
    /// Tests use it to point at a local mock server.
    pub fn with_base_url(base_url: &str, api_token: &str) -> Result<Self> {
        CdoClient::new(&ClientConfig::new(base_url, api_token))
    }

    /// Replaces the span this client logs into.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Base URL of the CDO tenant, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Span that operations using this client log into.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Core HTTP method: sends an authenticated request and returns the
    /// response body text of a 2xx response.
    ///
    /// `url` is fully qualified (see [`crate::url`]). `body` is serialized as
    /// JSON when present. `fmc_host` routes the request through the CDO FMC
    /// proxy to that FMC.
    async fn send<B: Serialize + ?Sized>(
        &self,
        ctx: &Context,
        method: Method,
        url: &str,
        body: Option<&B>,
        fmc_host: Option<&str>,
    ) -> Result<String> {
        let mut req = self
            .client
            .request(method.clone(), url)
            .bearer_auth(&self.api_token)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(host) = fmc_host {
            req = req.header(FMC_HOSTNAME_HEADER, host);
        }
        if let Some(payload) = body {
            req = req.json(payload);
        }

        debug!(parent: &self.span, %method, url, "sending request");
        ctx.run(async {
            let resp = req.send().await?;
            let status = resp.status();
            if !status.is_success() {
                // Keep CDO's error message; an unreadable body becomes "".
                let body = resp.text().await.unwrap_or_default();
                warn!(parent: &self.span, %method, url, %status, "request failed");
                return Err(CdoError::Api { status, body });
            }
            Ok(resp.text().await?)
        })
        .await
    }

    /// Sends an authenticated GET request and deserializes the JSON response.
    pub async fn get<T: DeserializeOwned>(&self, ctx: &Context, url: &str) -> Result<T> {
        let text = self.send::<()>(ctx, Method::GET, url, None, None).await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Sends an authenticated GET request for a collection.
    ///
    /// A 200 with an empty body, `null` or `[]` yields an empty `Vec`, never
    /// an error.
    pub async fn get_list<T: DeserializeOwned>(&self, ctx: &Context, url: &str) -> Result<Vec<T>> {
        let text = self.send::<()>(ctx, Method::GET, url, None, None).await?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let items: Option<Vec<T>> = serde_json::from_str(&text)?;
        Ok(items.unwrap_or_default())
    }

    /// Sends an authenticated GET through the CDO FMC proxy to `fmc_host`.
    pub async fn get_via_fmc<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        url: &str,
        fmc_host: &str,
    ) -> Result<T> {
        let text = self
            .send::<()>(ctx, Method::GET, url, None, Some(fmc_host))
            .await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Sends an authenticated POST request with a JSON body and deserializes
    /// the response.
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        ctx: &Context,
        url: &str,
        body: &B,
    ) -> Result<T> {
        let text = self.send(ctx, Method::POST, url, Some(body), None).await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Sends an authenticated PUT request with a JSON body and deserializes
    /// the response.
    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        ctx: &Context,
        url: &str,
        body: &B,
    ) -> Result<T> {
        let text = self.send(ctx, Method::PUT, url, Some(body), None).await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Sends an authenticated DELETE request. Any response body is ignored.
    pub async fn delete(&self, ctx: &Context, url: &str) -> Result<()> {
        self.send::<()>(ctx, Method::DELETE, url, None, None)
            .await
            .map(|_| ())
    }
}

impl fmt::Debug for CdoClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CdoClient")
            .field("base_url", &self.base_url)
            .field("api_token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_invalid_base_url() {
        let result = CdoClient::with_base_url("definitely not a url", "token");
        assert!(matches!(result, Err(CdoError::Config(_))));
    }

    #[test]
    fn new_normalizes_trailing_slash() {
        let client = CdoClient::with_base_url("https://unittest.cdo.cisco.com/", "token").unwrap();
        assert_eq!(client.base_url(), "https://unittest.cdo.cisco.com");
    }

    #[test]
    fn user_agent_carries_crate_version() {
        assert!(USER_AGENT.starts_with("cdo-client/"));
    }
}
