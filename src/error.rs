//! Typed error hierarchy for the cdo-client crate.
//!
//! `CdoError` covers every failure boundary the client crosses:
//! - `Network` wraps `reqwest::Error` for transport-level failures (DNS,
//!   TCP, TLS, client-side timeouts) that never produced an HTTP status.
//! - `Api` is a non-2xx answer from CDO. The response body is kept because
//!   CDO puts its diagnostic messages there.
//! - The `*NotFound` variants are lookups that succeeded at the HTTP level
//!   but returned nothing usable.
//! - `RetryExhausted` and `Timeout` come only from the poll loop in
//!   [`crate::retry`], so callers can tell "the server never became ready"
//!   apart from "the server rejected the request".
//! - `Cancelled` and `DeadlineExceeded` come from the caller's
//!   [`crate::context::Context`].

use std::time::Duration;

use reqwest::StatusCode;

use crate::config::ISSUES_URL;

/// Unified error type for all cdo-client operations.
#[derive(Debug, thiserror::Error)]
pub enum CdoError {
    /// A network-level failure occurred before an HTTP status was received.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// CDO returned a non-success HTTP status code.
    #[error("API error {status}: {body}")]
    Api {
        /// The HTTP status code returned by CDO.
        status: StatusCode,
        /// The raw response body text, empty if the body could not be read.
        body: String,
    },

    /// JSON (de)serialization failed.
    #[error("failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// A lookup succeeded but matched no resource.
    #[error("{resource} not found")]
    NotFound {
        /// Human-readable description of what was looked up.
        resource: String,
    },

    /// The FMC domain info endpoint returned no domains.
    #[error("fmc domain info not found")]
    DomainNotFound,

    /// No access policy on the cloud FMC carries the requested name.
    ///
    /// The message lists every available policy so the caller can fix a
    /// typo without a second round-trip.
    #[error(
        "access policy: \"{name}\" not found, available policies: [{}]. In rare cases where you have more than 1000 access policies, please raise an issue at: {}",
        .available.join(", "),
        ISSUES_URL
    )]
    PolicyNotFound {
        /// The access policy name that was requested.
        name: String,
        /// Names of all access policies the FMC returned.
        available: Vec<String>,
    },

    /// The poll loop used up its retries without the check reporting ready.
    #[error("{message}: not ready after {attempts} attempt(s)")]
    RetryExhausted {
        /// The progress message of the poll loop.
        message: String,
        /// Number of check invocations made.
        attempts: u32,
    },

    /// The poll loop ran past its total timeout.
    #[error("{message}: timed out after {elapsed:?}")]
    Timeout {
        /// The progress message of the poll loop.
        message: String,
        /// Time spent polling when the timeout was detected.
        elapsed: Duration,
    },

    /// The caller's context was cancelled.
    #[error("operation cancelled")]
    Cancelled,

    /// The caller's context deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// Credentials could not be encrypted with the connector's public key.
    #[error("failed to encrypt credentials: {0}")]
    Encryption(String),

    /// The remote state machine reached a failure state.
    #[error("device reached state {state}: {message}")]
    StateMachine {
        /// The remote state that was reached.
        state: String,
        /// What the client was waiting for.
        message: String,
    },

    /// The client configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CdoError {
    /// Returns `true` when CDO answered `404 Not Found`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CdoError::Api { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, CdoError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn api_error_preserves_status_and_body() {
        let err = CdoError::Api {
            status: StatusCode::BAD_REQUEST,
            body: r#"{"errorCode":"INVALID_INPUT","errorMessage":"name is required"}"#.to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("400"), "display should include status code");
        assert!(msg.contains("name is required"), "display should include body");
    }

    #[test]
    fn policy_not_found_lists_every_candidate_and_issue_url() {
        let err = CdoError::PolicyNotFound {
            name: "Missing Policy".to_string(),
            available: vec!["Default Access Control Policy".to_string(), "Branch".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("\"Missing Policy\""));
        assert!(msg.contains("Default Access Control Policy"));
        assert!(msg.contains("Branch"));
        assert!(msg.contains(ISSUES_URL));
    }

    #[test]
    fn retry_exhausted_and_timeout_are_distinct() {
        let exhausted = CdoError::RetryExhausted {
            message: "Waiting for FTD".to_string(),
            attempts: 4,
        };
        let timeout = CdoError::Timeout {
            message: "Waiting for FTD".to_string(),
            elapsed: Duration::from_secs(601),
        };
        assert!(exhausted.to_string().contains("4 attempt(s)"));
        assert!(timeout.to_string().contains("601"));
        assert!(!matches!(timeout, CdoError::RetryExhausted { .. }));
    }

    #[test]
    fn is_not_found_only_matches_404() {
        let not_found = CdoError::Api {
            status: StatusCode::NOT_FOUND,
            body: String::new(),
        };
        let server_error = CdoError::Api {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: String::new(),
        };
        assert!(not_found.is_not_found());
        assert!(!server_error.is_not_found());
        assert!(!CdoError::DomainNotFound.is_not_found());
    }

    #[test]
    fn parse_error_wraps_serde_json() {
        let json_err: serde_json::Error = serde_json::from_str::<String>("{{bad").unwrap_err();
        let err = CdoError::Parse(json_err);
        assert!(err.to_string().contains("failed to parse response"));
        assert!(err.source().is_some());
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CdoError>();
    }
}
