//! `portfoliod`: the portfolio server binary.
//!
//! Usage:
//!   portfoliod -c <context-name-or-path> [--listen <addr>]
//!   portfoliod hash-password <password>
//!
//! The context name resolves to `/etc/portfolio/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod bootstrap;
mod config;
mod routes;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use portfolio::service::PortfolioConfig;
use portfolio::PortfolioModule;
use tracing::info;

use config::ServerConfig;

/// Portfolio server.
#[derive(Parser, Debug)]
#[command(name = "portfoliod", about = "Portfolio server")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config")]
    config: Option<String>,

    /// Listen address.
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print an argon2id hash for `[superuser] password_hash`.
    HashPassword { password: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Some(Command::HashPassword { password }) = &cli.command {
        println!("{}", portfolio::service::session::hash_password(password)?);
        return Ok(());
    }
    let Some(config_arg) = cli.config.as_deref() else {
        anyhow::bail!("--config is required");
    };

    // Load server configuration.
    let config_path = ServerConfig::resolve_path(config_arg);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;
    bootstrap::verify_config(&server_config)?;

    // Initialize storage.
    let data_dir = std::path::PathBuf::from(&server_config.storage.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let core_config = portfolio_core::ServiceConfig {
        data_dir: Some(data_dir),
        listen: cli.listen.clone(),
        ..Default::default()
    };

    let kv: Arc<dyn portfolio_kv::KVStore> = Arc::new(
        portfolio_kv::RedbStore::open(&core_config.resolve_db_path())
            .map_err(|e| anyhow::anyhow!("failed to open KV store: {}", e))?,
    );

    bootstrap::seed_permissions(&kv, &server_config)?;

    let module = PortfolioModule::new(
        Arc::clone(&kv),
        PortfolioConfig {
            jwt_secret: server_config.jwt.secret.clone(),
            token_ttl: server_config.jwt.expire_secs,
        },
    )?;
    info!("Portfolio module initialized");

    bootstrap::ensure_superuser(module.service(), &server_config)?;

    let app = routes::build_router(&[&module]);

    let listener = tokio::net::TcpListener::bind(&core_config.listen).await?;
    info!("Portfolio server listening on {}", core_config.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
