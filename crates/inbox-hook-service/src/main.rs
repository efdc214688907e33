//! # Inbox-Hook Service
//!
//! Binary entry point for the Inbox-Hook HTTP service.
//!
//! This executable:
//! - Loads configuration from files, environment and command line
//! - Initializes structured logging
//! - Builds one intake pipeline per configured provider
//! - Starts the HTTP server from inbox-hook-api
//!
//! Exit codes: `1` bind failure, `2` server failure, `3` configuration error.

use clap::Parser;
use inbox_hook_api::{start_server, ProviderRegistry, ServiceConfig, ServiceError};
use inbox_hook_core::TracingSink;
use std::{path::PathBuf, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Receive email and calendar change notifications over webhook and pub/sub push
#[derive(Debug, Parser)]
#[command(name = "inbox-hook-service")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Configuration file (YAML, JSON or TOML, by extension)
    #[arg(short, long, env = "INBOX_HOOK_CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Override the listen address
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

impl Args {
    /// Apply command line overrides on top of the loaded configuration.
    fn apply(&self, config: &mut ServiceConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.log_json {
            config.logging.json_format = true;
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match ServiceConfig::load(args.config.as_deref()) {
        Ok(mut config) => {
            args.apply(&mut config);
            config
        }
        Err(e) => {
            init_tracing("info", args.log_json);
            error!(error = %e, "Failed to load configuration; aborting");
            std::process::exit(ServiceError::Configuration(e).exit_code());
        }
    };

    init_tracing(&config.logging.level, config.logging.json_format);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Inbox-Hook Service");

    if let Err(e) = run(config).await {
        error!(error = %e, "Service terminated");
        std::process::exit(e.exit_code());
    }
}

async fn run(config: ServiceConfig) -> Result<(), ServiceError> {
    config.validate()?;

    let registry = ProviderRegistry::from_config(&config, Arc::new(TracingSink))?;

    info!(
        host = %config.server.host,
        port = config.server.port,
        providers = ?registry.provider_ids(),
        "Configuration loaded"
    );

    start_server(config, registry).await
}

/// `RUST_LOG` wins over the configured level when set.
fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "inbox_hook_service={level},inbox_hook_core={level},inbox_hook_api={level},tower_http=info"
        ))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
