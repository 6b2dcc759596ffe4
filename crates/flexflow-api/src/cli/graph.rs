//! Node and edge CLI commands.

use anyhow::Result;
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use flexflow_types::graph::{CreateEdgeRequest, CreateNodeRequest};
use flexflow_types::id::{NodeId, WorkflowId};

use super::print_json;
use crate::state::AppState;

#[derive(Subcommand)]
pub enum NodeCommand {
    /// Add a node to a workflow.
    Add {
        /// Workflow id.
        workflow: WorkflowId,

        /// Node title.
        title: String,

        #[arg(short, long, default_value = "")]
        description: String,

        /// A decision here finishes the item.
        #[arg(long)]
        terminal: bool,
    },

    /// List the nodes of a workflow.
    #[command(alias = "ls")]
    List {
        /// Workflow id.
        workflow: WorkflowId,
    },
}

#[derive(Subcommand)]
pub enum EdgeCommand {
    /// Connect two nodes of a workflow.
    Add {
        /// Workflow id.
        workflow: WorkflowId,

        /// Source node id.
        from: NodeId,

        /// Target node id.
        to: NodeId,
    },

    /// List the edges of a workflow.
    #[command(alias = "ls")]
    List {
        /// Workflow id.
        workflow: WorkflowId,
    },
}

pub async fn handle_node_command(cmd: NodeCommand, state: &AppState, json: bool) -> Result<()> {
    match cmd {
        NodeCommand::Add {
            workflow,
            title,
            description,
            terminal,
        } => {
            let node = state
                .graph_service
                .add_node(
                    &workflow,
                    CreateNodeRequest {
                        title,
                        description,
                        is_terminal: terminal,
                    },
                )
                .await?;

            if json {
                return print_json(&node);
            }
            println!();
            println!(
                "  {} Added node '{}'{}",
                style("ok").green(),
                style(&node.title).cyan(),
                if node.is_terminal { " (terminal)" } else { "" }
            );
            println!("  {}", style(node.id).dim());
            println!();
            Ok(())
        }

        NodeCommand::List { workflow } => {
            let nodes = state.graph_service.list_nodes(&workflow).await?;
            let entries = state.graph_service.entry_nodes(&workflow).await?;

            if json {
                return print_json(&nodes);
            }

            let mut table = Table::new();
            table.load_preset(presets::UTF8_FULL_CONDENSED);
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec![
                Cell::new("Id").fg(Color::White),
                Cell::new("Title").fg(Color::White),
                Cell::new("Role").fg(Color::White),
            ]);

            for node in &nodes {
                let role = if node.is_terminal {
                    Cell::new("terminal").fg(Color::Magenta)
                } else if entries.iter().any(|e| e.id == node.id) {
                    Cell::new("entry").fg(Color::Green)
                } else {
                    Cell::new("")
                };
                table.add_row(vec![
                    Cell::new(node.id).fg(Color::DarkGrey),
                    Cell::new(&node.title).fg(Color::Cyan),
                    role,
                ]);
            }

            println!();
            println!("{table}");
            println!();
            Ok(())
        }
    }
}

pub async fn handle_edge_command(cmd: EdgeCommand, state: &AppState, json: bool) -> Result<()> {
    match cmd {
        EdgeCommand::Add { workflow, from, to } => {
            let edge = state
                .graph_service
                .add_edge(&workflow, CreateEdgeRequest { from, to })
                .await?;

            if json {
                return print_json(&edge);
            }
            println!();
            println!(
                "  {} Connected {} -> {}",
                style("ok").green(),
                style(edge.from).cyan(),
                style(edge.to).cyan()
            );
            println!();
            Ok(())
        }

        EdgeCommand::List { workflow } => {
            let edges = state.graph_service.list_edges(&workflow).await?;

            if json {
                return print_json(&edges);
            }

            let nodes = state.graph_service.list_nodes(&workflow).await?;
            let title_of = |id: NodeId| {
                nodes
                    .iter()
                    .find(|n| n.id == id)
                    .map(|n| n.title.clone())
                    .unwrap_or_else(|| id.to_string())
            };

            let mut table = Table::new();
            table.load_preset(presets::UTF8_FULL_CONDENSED);
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec![
                Cell::new("From").fg(Color::White),
                Cell::new("To").fg(Color::White),
            ]);
            for edge in &edges {
                table.add_row(vec![
                    Cell::new(title_of(edge.from)).fg(Color::Cyan),
                    Cell::new(title_of(edge.to)).fg(Color::Cyan),
                ]);
            }

            println!();
            println!("{table}");
            println!();
            Ok(())
        }
    }
}
