mod config;
mod logging;
mod shutdown;

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tokio::sync::Notify;
use tower_http::trace::TraceLayer;
use user_admin::UserAdmin;
use user_admin::api::rest::auth::JwtAuth;

use crate::config::AppConfig;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// User Admin Server - bulk operations, import and export for user accounts
#[derive(Parser)]
#[command(name = "user-admin-server")]
#[command(about = "User Admin Server - bulk operations, import and export for user accounts")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port override for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print effective configuration (YAML) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Validate configuration and exit
    Check,
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) defaults -> 2) YAML (if provided) -> 3) env (USER_ADMIN__*) -> 4) CLI overrides
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(cli.port, cli.verbose);

    if cli.print_config {
        println!("Effective configuration:\n{}", config.to_yaml()?);
        return Ok(());
    }

    logging::init(&config.logging);
    tracing::info!("User Admin Server starting");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(&config),
        Commands::Migrate => {
            config.validate()?;
            let db = connect(&config).await?;
            UserAdmin::migrate(&db).await
        }
    }
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    config.validate()?;
    println!("Configuration is valid");
    println!("{}", config.to_yaml()?);
    Ok(())
}

async fn connect(config: &AppConfig) -> Result<DatabaseConnection> {
    let mut opts = ConnectOptions::new(config.database.dsn.clone());
    opts.max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
        .sqlx_logging(false);
    tracing::info!(max_connections = config.database.max_connections, "Connecting to database");
    Database::connect(opts)
        .await
        .context("failed to connect to database")
}

async fn run_server(config: AppConfig) -> Result<()> {
    config.validate()?;
    let secret = config
        .auth
        .jwt_secret
        .as_deref()
        .context("auth.jwt_secret is required to serve requests")?;
    let auth = Arc::new(JwtAuth::new(secret, config.auth.issuer.as_deref()));

    let db = connect(&config).await?;
    if config.database.auto_migrate {
        UserAdmin::migrate(&db).await?;
    }

    let module = UserAdmin::new(db, config.user_admin.clone());
    let app = module
        .router(Some(auth))
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server.host/server.port")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "Server listening");

    let signalled = Arc::new(Notify::new());
    let notify = Arc::clone(&signalled);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown::signal().await;
            notify.notify_one();
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => return result.context("server error"),
        () = signalled.notified() => {}
    }

    let grace = Duration::from_secs(config.server.shutdown_timeout_secs);
    match tokio::time::timeout(grace, server).await {
        Ok(result) => result.context("server error")?,
        Err(_) => tracing::warn!(?grace, "in-flight requests did not finish in time"),
    }
    tracing::info!("Server stopped");
    Ok(())
}
