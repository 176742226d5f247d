mod config;
mod logging;
mod signals;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use schema_migrator::SchemaMigratorModule;
use tenant_db::{DbConnConfig, build_db_handle};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Schema Migrator Server - tenant table migrations over HTTP
#[derive(Parser)]
#[command(name = "schema-migrator-server")]
#[command(about = "Schema Migrator Server - tenant table migrations over HTTP")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port override for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print effective configuration and exit
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
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config
        && !path.is_file()
    {
        anyhow::bail!("config file does not exist: {}", path.display());
    }

    // defaults -> YAML -> env (APP__*) -> CLI
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli_overrides(cli.port, cli.verbose)?;

    logging::init(&config.logging);

    if cli.print_config {
        println!("{}", config.render_redacted()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(&config),
    }
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    config.bind_addr()?;
    config.schema_migrator.validate()?;
    tenant_db::build_connect_options(&app_db(config)).context("database")?;
    println!("Configuration is valid");
    Ok(())
}

async fn run_server(config: AppConfig) -> Result<()> {
    tracing::info!("Schema Migrator Server starting");

    let addr = config.bind_addr()?;
    std::fs::create_dir_all(&config.server.home_dir)
        .with_context(|| format!("cannot create home_dir {}", config.server.home_dir.display()))?;

    let db = build_db_handle(app_db(&config))
        .await
        .context("failed to open the application database")?;
    tracing::info!(dsn = %db.dsn(), "Application database connected");

    let module = SchemaMigratorModule::init(&db, &config.schema_migrator).await?;

    let app = module
        .router()
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = signals::wait_for_shutdown().await {
                tracing::error!(error = %e, "Signal handling failed; shutting down");
            }
        })
        .await
        .context("HTTP server failed")?;

    db.close().await;
    tracing::info!("Schema Migrator Server stopped");
    Ok(())
}

fn app_db(config: &AppConfig) -> DbConnConfig {
    config.database.clone().unwrap_or_default()
}
