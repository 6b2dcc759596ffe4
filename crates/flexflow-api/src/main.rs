//! FlexFlow CLI and REST API entry point.
//!
//! Binary name: `flexflow`
//!
//! Parses CLI arguments, initializes tracing, database and services, then
//! dispatches to the command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use flexflow_observe::tracing_setup::{LogFormat, TracingOptions, init_tracing, shutdown_tracing};
use flexflow_types::id::UserId;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need tracing or app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "flexflow", &mut std::io::stdout());
        return Ok(());
    }

    let default_filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,flexflow_core=debug",
        _ => "trace",
    };
    let (format, enable_otel) = match &cli.command {
        Commands::Serve { log_json, otel, .. } => (
            if *log_json { LogFormat::Json } else { LogFormat::Pretty },
            *otel,
        ),
        _ => (LogFormat::Pretty, false),
    };
    // A server with no -v still wants its request log.
    let default_filter = match (&cli.command, cli.verbose, cli.quiet) {
        (Commands::Serve { .. }, 0, false) => "info",
        _ => default_filter,
    };
    init_tracing(TracingOptions {
        default_filter,
        format,
        enable_otel,
    })
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let state = AppState::init(cli.data_dir.as_deref()).await?;
    let user = UserId::new(cli.user);
    let json = cli.json;

    match cli.command {
        Commands::Workflow { action } => {
            cli::workflow::handle_workflow_command(action, &state, user, json).await?;
        }

        Commands::Node { action } => {
            cli::graph::handle_node_command(action, &state, json).await?;
        }

        Commands::Edge { action } => {
            cli::graph::handle_edge_command(action, &state, json).await?;
        }

        Commands::Item { action } => {
            cli::item::handle_item_command(action, &state, user, json).await?;
        }

        Commands::Decide { item, node, status } => {
            cli::item::decide(&state, &item, &node, &status, user, json).await?;
        }

        Commands::Serve { port, host, .. } => {
            let host = host.unwrap_or_else(|| state.config.server.host.clone());
            let port = port.unwrap_or(state.config.server.port);
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            tracing::info!(
                %addr,
                data_dir = %state.data_dir.display(),
                dead_end_policy = ?state.config.routing.dead_end_policy,
                "FlexFlow API listening"
            );
            println!(
                "  {} FlexFlow API listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            println!("\n  Server stopped.");
        }

        Commands::Completions { .. } => unreachable!("handled in main"),
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
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
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
