//! CLI entry point for the intake gate: starts the HTTP intake service.

use clap::{Parser, Subcommand};
use intake_service::http;
use intake_service::state::{AppState, LogPaths};
use intake_store::config::IntakeConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "intake-gate", arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the intake HTTP service.
    Serve(ServeArgs),
}

#[derive(clap::Args, Debug)]
struct ServeArgs {
    /// Path to a TOML config file. Absent knobs fall back to documented defaults.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Address to bind the HTTP listener to.
    #[arg(long, default_value = "0.0.0.0:8080")]
    listen: String,
    /// Directory for append-only audit logs (rejections, submission-guard, edge-loader).
    #[arg(long, default_value = "./var/log")]
    log_dir: PathBuf,
}

fn load_config(path: Option<&PathBuf>) -> Result<IntakeConfig, String> {
    let mut config = match path {
        None => IntakeConfig::default(),
        Some(path) => {
            let raw = std::fs::read_to_string(path).map_err(|e| format!("reading {}: {e}", path.display()))?;
            IntakeConfig::from_toml_str(&raw).map_err(|e| e.to_string())?
        }
    };
    config.apply_env_overrides();
    Ok(config)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(args) => run_serve(args),
    }
}

fn run_serve(args: ServeArgs) -> ExitCode {
    let config = match load_config(args.config.as_ref()) {
        Ok(cfg) => cfg,
        Err(reason) => {
            tracing::error!(%reason, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(err) => {
            tracing::error!(error = %err, "failed to start tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(async move {
        let build_id = std::env::var("INTAKE_BUILD_ID").unwrap_or_else(|_| "dev".to_string());
        let log_paths = LogPaths::under(args.log_dir);
        let state = AppState::new(config, log_paths, build_id);
        let app = http::router(state);

        let listener = match tokio::net::TcpListener::bind(&args.listen).await {
            Ok(listener) => listener,
            Err(err) => {
                tracing::error!(listen = %args.listen, error = %err, "failed to bind listener");
                return ExitCode::FAILURE;
            }
        };
        tracing::info!(listen = %args.listen, "intake gate listening");

        if let Err(err) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
        {
            tracing::error!(error = %err, "server exited with error");
            return ExitCode::FAILURE;
        }
        ExitCode::SUCCESS
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
