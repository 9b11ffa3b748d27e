//! Async Rust client library for Cisco Defense Orchestrator (CDO).
//!
//! Provides a bearer-token HTTP client, typed CRUD operations for connectors,
//! devices and ASA configs, and orchestration workflows that onboard cloud
//! FTDs and ASAs and wait for CDO's server-side state machines to finish.
//!
//! # Modules
//!
//! - [`config`]: Base URL, API token, regions and HTTP timeouts.
//! - [`context`]: Cancellation token plus optional deadline for every call.
//! - [`client`]: Authenticated HTTP wrapper for the CDO REST API.
//! - [`error`]: Typed error hierarchy (`CdoError`) for all library operations.
//! - [`url`]: Endpoint URL builders.
//! - [`retry`]: Poll-until-ready loop.
//! - [`crypto`]: RSA encryption of device credentials.
//! - [`model`]: Tags, device types, performance tiers, licenses.
//! - [`connector`], [`device`], [`device_config`], [`cloud_fmc`]: Resource CRUD.
//! - [`cloud_ftd`], [`asa`]: Onboarding workflows.
//!
//! # Quick Start
//!
//! ```ignore
//! use cdo_client::client::CdoClient;
//! use cdo_client::cloud_ftd::{self, CreateInput};
//! use cdo_client::config::{ClientConfig, Region};
//! use cdo_client::context::Context;
//! use cdo_client::model::{License, Tags, Tier};
//!
//! let client = CdoClient::new(&ClientConfig::for_region(Region::Us, "api-token"))?;
//! let input = CreateInput {
//!     name: "branch-ftd".to_string(),
//!     access_policy_name: "Default Access Control Policy".to_string(),
//!     performance_tier: Some(Tier::FtdV10),
//!     is_virtual: true,
//!     licenses: vec![License::Base],
//!     tags: Tags::new(["branch"]),
//! };
//! let ftd = cloud_ftd::create(&client, &Context::background(), &input, None).await?;
//! println!("{:?}", ftd.metadata.and_then(|m| m.generated_command));
//! ```

pub mod asa;
pub mod client;
pub mod cloud_fmc;
pub mod cloud_ftd;
pub mod config;
pub mod connector;
pub mod context;
pub mod crypto;
pub mod device;
pub mod device_config;
pub mod error;
pub mod model;
pub mod retry;
pub mod url;
