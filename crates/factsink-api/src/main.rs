//! factsink entry point.
//!
//! Binary name: `factsink`
//!
//! Parses CLI arguments, sets up tracing, loads configuration, then runs the
//! Lambda loop, the SNS HTTP endpoint or a one-shot CLI command.

mod cli;
mod http;
mod lambda;
mod state;

use anyhow::{Context, Result};
use clap::Parser;

use factsink_infra::config::load_config;
use factsink_infra::lambda::{LambdaRuntimeClient, RUNTIME_API_ENV};
use factsink_observe::{LogFormat, TracingOptions, init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::{AppState, build_memory_store};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let under_lambda = matches!(cli.command, Commands::Lambda)
        || std::env::var_os(RUNTIME_API_ENV).is_some();
    let options = TracingOptions {
        default_filter: match cli.verbose {
            0 => "info",
            1 => "info,factsink=debug",
            _ => "trace",
        }
        .to_string(),
        format: if under_lambda { LogFormat::Json } else { LogFormat::Text },
        otel: false,
    }
    .with_env_overrides(|key| std::env::var(key).ok());
    init_tracing(&options).map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> Result<()> {
    let backends = cli.backend_options();
    let config_path = cli.config.clone();

    match cli.command {
        Commands::Lambda => {
            let client = LambdaRuntimeClient::from_env()?;
            // Config errors must reach /init/error, so loading happens inside.
            lambda::run(client, async {
                let config = load_config(config_path.as_deref()).await?;
                AppState::init(&config, &backends).await
            })
            .await?;
        }

        Commands::Serve { port, host } => {
            let config = load_config(config_path.as_deref()).await?;
            let state = AppState::init(&config, &backends).await?;

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {addr}"))?;

            println!(
                "  {} factsink listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}/sns")).cyan()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let router = http::router::build_router(state);
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            println!("\n  Server stopped.");
        }

        Commands::Process { input } => {
            let config = load_config(config_path.as_deref()).await?;
            let state = AppState::init(&config, &backends).await?;
            cli::process::process_file(&state, &input, cli.json).await?;
        }

        Commands::Memory { action } => {
            let config = load_config(config_path.as_deref()).await?;
            let store = build_memory_store(&config, &backends).await?;
            cli::memory::run(&store, action, cli.json).await?;
        }
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
