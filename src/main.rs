//! CLI entry point for cdo, a Cisco Defense Orchestrator client.
//!
//! Authenticates with a CDO API token, then dispatches to the selected
//! subcommand. Results are printed to stdout as pretty JSON; logs go to
//! stderr and are filtered with `RUST_LOG` (default `info`).
//!
//! Exit codes:
//! - 0: success
//! - 1: runtime error (API error, onboarding failure, timeout, Ctrl-C, etc.)
//! - 2: argument validation error (clap handles this automatically)

use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use cdo_client::asa;
use cdo_client::client::CdoClient;
use cdo_client::cloud_ftd;
use cdo_client::config::{ClientConfig, Region};
use cdo_client::connector;
use cdo_client::context::Context;
use cdo_client::device;
use cdo_client::error::{CdoError, Result};
use cdo_client::model::{License, Tags, Tier};

#[derive(Parser)]
#[command(name = "cdo", version, about, long_about = None)]
struct Cli {
    /// CDO API token. Prefer setting via the CDO_API_TOKEN environment
    /// variable to keep it out of process listings and shell history.
    #[arg(long, env = "CDO_API_TOKEN", hide_env_values = true, global = true)]
    api_token: Option<String>,

    /// Base URL of the CDO tenant. Overrides --region.
    #[arg(long, env = "CDO_BASE_URL", global = true)]
    base_url: Option<String>,

    /// CDO region (us, eu, apj, aus, in) used when no base URL is given.
    #[arg(long, env = "CDO_REGION", default_value = "us", global = true)]
    region: Region,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Secure device connectors.
    #[command(subcommand)]
    Connectors(ConnectorsCommand),
    /// Generic device records.
    #[command(subcommand)]
    Devices(DevicesCommand),
    /// Cloud-managed FTDs.
    #[command(subcommand)]
    Ftd(FtdCommand),
    /// ASAs.
    #[command(subcommand)]
    Asa(AsaCommand),
}

#[derive(Subcommand)]
enum ConnectorsCommand {
    /// List every connector of the tenant.
    List,
}

#[derive(Subcommand)]
enum DevicesCommand {
    /// List every device of the tenant.
    List,
}

#[derive(Subcommand)]
enum FtdCommand {
    /// Onboard a cloud FTD and print its registration command.
    Create(FtdCreateArgs),
    /// Unregister a cloud FTD and wait for its removal.
    Delete {
        /// Uid of the cloud FTD device.
        #[arg(long)]
        uid: String,
    },
}

#[derive(Args)]
struct FtdCreateArgs {
    #[arg(long)]
    name: String,

    /// Access policy on the cloud FMC, matched exactly.
    #[arg(long)]
    access_policy: String,

    /// Performance tier, e.g. FTDv10. Only used with --virtual.
    #[arg(long, value_parser = parse_tier)]
    tier: Option<Tier>,

    /// Onboard a virtual FTD.
    #[arg(long = "virtual")]
    is_virtual: bool,

    /// Smart licenses, comma separated (BASE, CARRIER, THREAT, MALWARE, URLFilter).
    #[arg(long, value_delimiter = ',', value_parser = parse_license, required = true)]
    licenses: Vec<License>,

    /// Tag labels; repeat for several.
    #[arg(long = "label")]
    labels: Vec<String>,
}

#[derive(Subcommand)]
enum AsaCommand {
    /// Onboard an ASA and wait until CDO has read its configuration.
    Create(AsaCreateArgs),
}

#[derive(Args)]
struct AsaCreateArgs {
    #[arg(long)]
    name: String,

    /// Name of the connector the ASA is reached through.
    #[arg(long)]
    connector: String,

    /// `host:port` of the ASA as seen from the connector.
    #[arg(long)]
    address: String,

    #[arg(long)]
    username: String,

    /// Device password. Prefer setting via the CDO_ASA_PASSWORD environment
    /// variable.
    #[arg(long, env = "CDO_ASA_PASSWORD", hide_env_values = true)]
    password: String,

    #[arg(long)]
    ignore_certificate: bool,

    /// Tag labels; repeat for several.
    #[arg(long = "label")]
    labels: Vec<String>,
}

fn parse_tier(s: &str) -> std::result::Result<Tier, String> {
    Tier::parse(s).ok_or_else(|| format!("unknown performance tier {s:?}"))
}

fn parse_license(s: &str) -> std::result::Result<License, String> {
    License::parse(s.trim()).ok_or_else(|| format!("unknown license {s:?}"))
}

impl Cli {
    fn client_config(&self) -> Result<ClientConfig> {
        let token = self.api_token.as_deref().ok_or_else(|| {
            CdoError::Config("an API token is required (--api-token or CDO_API_TOKEN)".to_string())
        })?;
        Ok(match &self.base_url {
            Some(base_url) => ClientConfig::new(base_url, token),
            None => ClientConfig::for_region(self.region, token),
        })
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: &Cli, client: &CdoClient, ctx: &Context) -> Result<()> {
    match &cli.command {
        Command::Connectors(ConnectorsCommand::List) => {
            print_json(&connector::read_all(client, ctx).await?)
        }
        Command::Devices(DevicesCommand::List) => print_json(&device::read_all(client, ctx).await?),
        Command::Ftd(FtdCommand::Create(args)) => {
            let input = cloud_ftd::CreateInput {
                name: args.name.clone(),
                access_policy_name: args.access_policy.clone(),
                performance_tier: args.tier,
                is_virtual: args.is_virtual,
                licenses: args.licenses.clone(),
                tags: Tags::new(args.labels.iter().cloned()),
            };
            print_json(&cloud_ftd::create(client, ctx, &input, None).await?)
        }
        Command::Ftd(FtdCommand::Delete { uid }) => {
            cloud_ftd::delete(client, ctx, uid, None).await?;
            eprintln!("Deleted cloud FTD {uid}");
            Ok(())
        }
        Command::Asa(AsaCommand::Create(args)) => {
            let lookup = connector::ReadInput::Name(args.connector.clone());
            let lar = connector::read(client, ctx, &lookup).await?;
            let input = asa::CreateInput {
                name: args.name.clone(),
                connector_uid: lar.uid.clone(),
                connector_type: lar.connector_type(),
                socket_address: args.address.clone(),
                username: args.username.clone(),
                password: args.password.clone(),
                ignore_certificate: args.ignore_certificate,
                tags: Tags::new(args.labels.iter().cloned()),
            };
            print_json(&asa::create(client, ctx, &input, None).await?)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let client = match cli.client_config().and_then(|config| CdoClient::new(&config)) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let token = CancellationToken::new();
    let ctx = Context::with_token(token.clone());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling");
            token.cancel();
        }
    });

    match run(&cli, &client, &ctx).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connectors_list_parses() {
        let cli = Cli::try_parse_from(["cdo", "--api-token", "t", "connectors", "list"])
            .expect("should parse connectors list");
        assert!(matches!(
            cli.command,
            Command::Connectors(ConnectorsCommand::List)
        ));
        assert_eq!(cli.api_token.as_deref(), Some("t"));
    }

    #[test]
    fn missing_subcommand_is_rejected() {
        let result = Cli::try_parse_from(["cdo", "--api-token", "t"]);
        assert!(result.is_err(), "parsing should fail without a subcommand");
    }

    #[test]
    fn global_flags_are_accepted_after_subcommand() {
        let cli = Cli::try_parse_from([
            "cdo",
            "devices",
            "list",
            "--base-url",
            "https://tenant.example",
            "--api-token",
            "t",
        ])
        .expect("global flags should parse after the subcommand");
        let config = cli.client_config().unwrap();
        assert_eq!(config.base_url, "https://tenant.example");
    }

    #[test]
    fn region_selects_base_url_when_no_base_url_given() {
        let cli = Cli::try_parse_from(["cdo", "--region", "EU", "--api-token", "t", "devices", "list"])
            .expect("should parse with region");
        assert_eq!(cli.region, Region::Eu);
        let config = cli.client_config().unwrap();
        assert_eq!(config.base_url, Region::Eu.base_url());
    }

    #[test]
    fn unknown_region_is_rejected() {
        let result = Cli::try_parse_from(["cdo", "--region", "mars", "devices", "list"]);
        assert!(result.is_err(), "parsing should fail for an unknown region");
    }

    #[test]
    fn ftd_create_parses_licenses_and_tier() {
        let cli = Cli::try_parse_from([
            "cdo",
            "ftd",
            "create",
            "--name",
            "branch-ftd",
            "--access-policy",
            "Default Access Control Policy",
            "--virtual",
            "--tier",
            "FTDv10",
            "--licenses",
            "base,THREAT,URLFilter",
            "--label",
            "branch",
        ])
        .expect("should parse a complete ftd create");
        let Command::Ftd(FtdCommand::Create(args)) = cli.command else {
            panic!("expected ftd create");
        };
        assert!(args.is_virtual);
        assert_eq!(args.tier, Some(Tier::FtdV10));
        assert_eq!(
            args.licenses,
            [License::Base, License::Threat, License::UrlFilter]
        );
        assert_eq!(args.labels, ["branch"]);
    }

    #[test]
    fn ftd_create_rejects_unknown_license() {
        let result = Cli::try_parse_from([
            "cdo",
            "ftd",
            "create",
            "--name",
            "f",
            "--access-policy",
            "p",
            "--licenses",
            "GOLD",
        ]);
        assert!(result.is_err(), "parsing should fail for an unknown license");
    }

    #[test]
    fn asa_create_parses_with_password_flag() {
        let cli = Cli::try_parse_from([
            "cdo",
            "asa",
            "create",
            "--name",
            "asa-1",
            "--connector",
            "My SDC",
            "--address",
            "10.0.0.1:443",
            "--username",
            "admin",
            "--password",
            "hunter2",
            "--ignore-certificate",
        ])
        .expect("should parse asa create");
        let Command::Asa(AsaCommand::Create(args)) = cli.command else {
            panic!("expected asa create");
        };
        assert_eq!(args.connector, "My SDC");
        assert!(args.ignore_certificate);
        assert!(args.labels.is_empty());
    }

    #[test]
    fn missing_token_is_a_config_error() {
        let cli = Cli {
            api_token: None,
            base_url: None,
            region: Region::Us,
            command: Command::Devices(DevicesCommand::List),
        };
        assert!(matches!(cli.client_config(), Err(CdoError::Config(_))));
    }
}
