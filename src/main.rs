// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context, Result};
use clap::Parser;
use dnsweave::config::{Config, Pipeline};
use dnsweave::constants::{DEFAULT_CONFIG_PATH, TOKIO_WORKER_THREADS};
use dnsweave::server;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Periodic DNS record aggregation, authoritative answering and declarative sync.
#[derive(Debug, Parser)]
#[command(name = "dnsweave", version, about)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,

    /// Run a single sync cycle and exit
    #[arg(long, conflicts_with = "check")]
    once: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("dnsweave")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli))
}

fn init_logging() {
    // Respects RUST_LOG, defaulting to INFO.
    // RUST_LOG_FORMAT=json switches to structured output.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

async fn async_main(cli: Cli) -> Result<()> {
    init_logging();

    let config = Config::load(&cli.config)
        .with_context(|| format!("Invalid configuration {}", cli.config.display()))?;
    info!(
        path = %cli.config.display(),
        sources = config.sources.len(),
        modifiers = config.modifiers.len(),
        sinks = config.sinks.len(),
        "Configuration loaded"
    );
    if cli.check {
        info!("Configuration is valid");
        return Ok(());
    }

    let http_listen_addr = config.http_listen_addr;
    let Pipeline {
        mut orchestrator,
        sinks,
    } = Pipeline::build(config).await?;

    let token = CancellationToken::new();
    let mut tasks = tokio::task::JoinSet::new();

    for responder in sinks.responders {
        tasks.spawn(responder.serve(token.clone()));
    }

    if let Some(addr) = http_listen_addr {
        let listener = server::bind(addr).await?;
        let router = server::router(sinks.router);
        let server_token = token.clone();
        tasks.spawn(async move {
            if let Err(e) = server::serve(listener, router, server_token).await {
                error!(error = %format!("{e:#}"), "HTTP server stopped");
            }
        });
    }

    if cli.once {
        let report = orchestrator.run_cycle(&token).await;
        token.cancel();
        while tasks.join_next().await.is_some() {}
        return match report.error {
            Some(err) => Err(err.into()),
            None => Ok(()),
        };
    }

    let signal_token = token.clone();
    tokio::spawn(async move {
        if let Err(e) = server::shutdown_signal().await {
            error!(error = %format!("{e:#}"), "Signal handling failed, shutting down");
        }
        signal_token.cancel();
    });

    orchestrator.run(token.clone()).await;
    token.cancel();

    debug!("Waiting for listeners to stop");
    while tasks.join_next().await.is_some() {}
    info!("Shutdown complete");
    Ok(())
}
