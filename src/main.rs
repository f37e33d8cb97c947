mod azure;
mod commands;
mod config;
mod context;
mod output;
mod traits;
mod workflow;

use anyhow::{Context as _, Result};
use azure::{ArmSqlClient, ClientSecretAuthenticator};
use clap::Parser;
use commands::{LinkCommand, LinkOutcome};
use config::{AppConfig, Overrides};
use context::Context;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use traits::RealFileSystem;

#[derive(Parser)]
#[command(name = "sql-pool-link")]
#[command(about = "Import a BACPAC into an Azure SQL server and link the new database to an Elastic Pool", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.sql-pool-link/config.yaml)
    #[arg(short, long, env = "SQL_POOL_LINK_CONFIG")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Azure AD tenant ID
    #[arg(long, env = "AZURE_TENANT_ID")]
    tenant_id: Option<String>,

    /// Service principal client ID
    #[arg(long, env = "AZURE_CLIENT_ID")]
    client_id: Option<String>,

    /// Service principal client secret
    #[arg(long, env = "AZURE_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Subscription that holds the resource group
    #[arg(long, env = "AZURE_SUBSCRIPTION_ID")]
    subscription_id: Option<String>,

    /// Access key of the storage account holding the BACPAC
    #[arg(long, env = "AZURE_STORAGE_KEY", hide_env_values = true)]
    storage_key: Option<String>,

    /// Blob URI of the BACPAC to import
    #[arg(long, env = "AZURE_BACPAC_URI")]
    bacpac_uri: Option<String>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            tenant_id: self.tenant_id.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            subscription_id: self.subscription_id.clone(),
            storage_key: self.storage_key.clone(),
            blob_uri: self.bacpac_uri.clone(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = AppConfig::load(&RealFileSystem, cli.config.as_deref())?.resolve(cli.overrides())?;
    debug!(?settings, "Resolved settings");

    let token = ClientSecretAuthenticator::new(settings.authority.clone())
        .acquire_token(&settings.credentials)
        .context("Could not authenticate with Azure")?;

    let client = ArmSqlClient::new(
        token,
        settings.subscription_id.clone(),
        settings.management.clone(),
        settings.poll_interval,
    );
    let ctx = Context::new(Arc::new(client));

    match LinkCommand::execute(&ctx, &settings)? {
        LinkOutcome::Linked { database, pool } => info!(%database, %pool, "Done"),
        LinkOutcome::NoElasticPools => info!("Stopped: no elastic pools on the selected server"),
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    // RUST_LOG wins over the verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "sql_pool_link=warn",
            1 => "sql_pool_link=info",
            2 => "sql_pool_link=debug",
            _ => "sql_pool_link=trace,reqwest=debug",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact(),
        )
        .init();
}
