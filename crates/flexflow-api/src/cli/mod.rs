//! CLI command definitions for the `flexflow` binary.
//!
//! Uses clap derive macros for argument parsing. Commands are grouped by
//! resource (e.g., `flexflow workflow create`, `flexflow item pending`).

pub mod graph;
pub mod item;
pub mod workflow;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use comfy_table::{Cell, Color};

use flexflow_types::id::{ItemId, NodeId};
use flexflow_types::item::PlacementStatus;

/// Route items through approval workflows.
#[derive(Parser)]
#[command(name = "flexflow", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all log output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Identity recorded as issuer, author or decider.
    #[arg(
        long,
        global = true,
        env = "FLEXFLOW_USER",
        default_value = "anonymous"
    )]
    pub user: String,

    /// Data directory holding config.toml and the database.
    #[arg(long, global = true, env = "FLEXFLOW_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage workflows (create, list, show).
    #[command(alias = "wf")]
    Workflow {
        #[command(subcommand)]
        action: workflow::WorkflowCommand,
    },

    /// Manage the review stations of a workflow.
    Node {
        #[command(subcommand)]
        action: graph::NodeCommand,
    },

    /// Manage the transitions between nodes.
    Edge {
        #[command(subcommand)]
        action: graph::EdgeCommand,
    },

    /// Submit and inspect items.
    Item {
        #[command(subcommand)]
        action: item::ItemCommand,
    },

    /// Approve or reject an item at a node.
    Decide {
        /// Item id.
        item: ItemId,

        /// Node the item is pending at.
        node: NodeId,

        /// `approved` or `rejected` (case-insensitive).
        status: String,
    },

    /// Start the REST API server.
    Serve {
        /// Port to listen on (defaults to `server.port` in config.toml).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (defaults to `server.host` in config.toml).
        #[arg(long)]
        host: Option<String>,

        /// Emit logs as JSON lines.
        #[arg(long)]
        log_json: bool,

        /// Also export spans through OpenTelemetry (stdout exporter).
        #[arg(long)]
        otel: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Colored table cell for a placement status.
pub(crate) fn status_cell(status: PlacementStatus) -> Cell {
    match status {
        PlacementStatus::Pending => Cell::new("○ pending").fg(Color::Yellow),
        PlacementStatus::Approved => Cell::new("● approved").fg(Color::Green),
        PlacementStatus::Rejected => Cell::new("✗ rejected").fg(Color::Red),
    }
}

/// Print `value` as pretty JSON on stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_decide() {
        let item = ItemId::new();
        let node = NodeId::new();
        let cli = Cli::try_parse_from([
            "flexflow",
            "--user",
            "bob",
            "decide",
            &item.to_string(),
            &node.to_string(),
            "APPROVED",
        ])
        .unwrap();

        assert_eq!(cli.user, "bob");
        match cli.command {
            Commands::Decide {
                item: i,
                node: n,
                status,
            } => {
                assert_eq!((i, n), (item, node));
                assert_eq!(status, "APPROVED");
            }
            _ => panic!("expected decide"),
        }
    }

    #[test]
    fn test_rejects_malformed_ids() {
        let parsed = Cli::try_parse_from(["flexflow", "item", "show", "not-a-uuid"]);
        assert!(parsed.is_err());
    }
}
