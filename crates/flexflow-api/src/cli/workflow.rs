//! Workflow CLI commands: create, list, show.

use anyhow::Result;
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use flexflow_types::graph::CreateWorkflowRequest;
use flexflow_types::id::{NodeId, UserId, WorkflowId};

use super::print_json;
use crate::state::AppState;

#[derive(Subcommand)]
pub enum WorkflowCommand {
    /// Create a new, empty workflow.
    Create {
        /// Workflow title.
        title: String,

        /// Longer description.
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// List all workflows.
    #[command(alias = "ls")]
    List,

    /// Show a workflow with its nodes and edges.
    Show {
        /// Workflow id.
        id: WorkflowId,
    },
}

pub async fn handle_workflow_command(
    cmd: WorkflowCommand,
    state: &AppState,
    user: UserId,
    json: bool,
) -> Result<()> {
    match cmd {
        WorkflowCommand::Create { title, description } => {
            create_workflow(state, user, title, description, json).await
        }
        WorkflowCommand::List => list_workflows(state, json).await,
        WorkflowCommand::Show { id } => show_workflow(state, &id, json).await,
    }
}

async fn create_workflow(
    state: &AppState,
    user: UserId,
    title: String,
    description: String,
    json: bool,
) -> Result<()> {
    let workflow = state
        .graph_service
        .create_workflow(user, CreateWorkflowRequest { title, description })
        .await?;

    if json {
        return print_json(&workflow);
    }

    println!();
    println!(
        "  {} Created workflow '{}'",
        style("ok").green(),
        style(&workflow.title).cyan().bold()
    );
    println!("  {}", style(workflow.id).dim());
    println!();
    println!(
        "  Next: {}",
        style(format!("flexflow node add {} <title>", workflow.id)).yellow()
    );
    println!();
    Ok(())
}

async fn list_workflows(state: &AppState, json: bool) -> Result<()> {
    let workflows = state.graph_service.list_workflows().await?;

    if json {
        return print_json(&workflows);
    }

    if workflows.is_empty() {
        println!();
        println!(
            "  {} No workflows yet. Create one with: {}",
            style("i").blue().bold(),
            style("flexflow workflow create <title>").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Id").fg(Color::White),
        Cell::new("Title").fg(Color::White),
        Cell::new("Created By").fg(Color::White),
        Cell::new("Created").fg(Color::White),
    ]);

    for wf in &workflows {
        table.add_row(vec![
            Cell::new(wf.id).fg(Color::DarkGrey),
            Cell::new(&wf.title).fg(Color::Cyan),
            Cell::new(&wf.created_by),
            Cell::new(wf.created_at.format("%Y-%m-%d %H:%M")).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} workflow{}",
        style(workflows.len()).bold(),
        if workflows.len() == 1 { "" } else { "s" }
    );
    println!();
    Ok(())
}

async fn show_workflow(state: &AppState, id: &WorkflowId, json: bool) -> Result<()> {
    let workflow = state.graph_service.get_workflow(id).await?;
    let nodes = state.graph_service.list_nodes(id).await?;
    let edges = state.graph_service.list_edges(id).await?;
    let entries = state.graph_service.entry_nodes(id).await?;

    if json {
        return print_json(&serde_json::json!({
            "workflow": workflow,
            "nodes": nodes,
            "edges": edges,
            "entry_nodes": entries.iter().map(|n| n.id).collect::<Vec<_>>(),
        }));
    }

    let title_of = |node_id: NodeId| {
        nodes
            .iter()
            .find(|n| n.id == node_id)
            .map(|n| n.title.as_str())
            .unwrap_or("?")
    };

    println!();
    println!("  {}", style(&workflow.title).cyan().bold());
    if !workflow.description.is_empty() {
        println!("  {}", workflow.description);
    }
    println!(
        "  {} by {}",
        style(workflow.id).dim(),
        style(&workflow.created_by).white()
    );
    println!();

    println!("  {}", style("Nodes").bold());
    for node in &nodes {
        let mut markers = Vec::new();
        if entries.iter().any(|e| e.id == node.id) {
            markers.push(style("entry").green().to_string());
        }
        if node.is_terminal {
            markers.push(style("terminal").magenta().to_string());
        }
        println!(
            "    {} {} {}",
            style(node.id).dim(),
            node.title,
            markers.join(" ")
        );
    }
    if nodes.is_empty() {
        println!("    {}", style("(none)").dim());
    }
    println!();

    println!("  {}", style("Edges").bold());
    for edge in &edges {
        println!("    {} -> {}", title_of(edge.from), title_of(edge.to));
    }
    if edges.is_empty() {
        println!("    {}", style("(none)").dim());
    }
    println!();
    Ok(())
}
