//! Item CLI commands: submit, show, list, pending, history, and `decide`.

use std::collections::HashMap;

use anyhow::Result;
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use flexflow_types::id::{ItemId, NodeId, UserId, WorkflowId};
use flexflow_types::item::{Decision, Placement};

use super::{print_json, status_cell};
use crate::state::AppState;

#[derive(Subcommand)]
pub enum ItemCommand {
    /// Submit an item into a workflow.
    Submit {
        /// Workflow id.
        workflow: WorkflowId,

        /// Payload: JSON, or free text stored as a JSON string.
        payload: String,
    },

    /// Show an item with all its placements.
    Show {
        /// Item id.
        id: ItemId,
    },

    /// List the items of a workflow.
    #[command(alias = "ls")]
    List {
        /// Workflow id.
        workflow: WorkflowId,
    },

    /// Where an item currently waits for a decision.
    Pending {
        /// Item id.
        id: ItemId,
    },

    /// The item's decision history.
    History {
        /// Item id.
        id: ItemId,
    },
}

pub async fn handle_item_command(
    cmd: ItemCommand,
    state: &AppState,
    user: UserId,
    json: bool,
) -> Result<()> {
    match cmd {
        ItemCommand::Submit { workflow, payload } => {
            submit(state, &workflow, user, &payload, json).await
        }
        ItemCommand::Show { id } => show(state, &id, json).await,
        ItemCommand::List { workflow } => list(state, &workflow, json).await,
        ItemCommand::Pending { id } => pending(state, &id, json).await,
        ItemCommand::History { id } => history(state, &id, json).await,
    }
}

/// Parse a CLI payload: valid JSON is kept as-is, anything else becomes a
/// JSON string.
fn parse_payload(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

async fn node_titles(state: &AppState, workflow: &WorkflowId) -> Result<HashMap<NodeId, String>> {
    Ok(state
        .graph_service
        .list_nodes(workflow)
        .await?
        .into_iter()
        .map(|n| (n.id, n.title))
        .collect())
}

fn placement_table(placements: &[Placement], titles: &HashMap<NodeId, String>) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Node").fg(Color::White),
        Cell::new("Node Id").fg(Color::White),
        Cell::new("Status").fg(Color::White),
        Cell::new("Decided").fg(Color::White),
    ]);

    for p in placements {
        let title = titles.get(&p.node_id).map(String::as_str).unwrap_or("?");
        let decided = match (&p.decided_at, &p.collapsed_by) {
            (Some(at), Some(_)) => format!("{} (collapsed)", at.format("%Y-%m-%d %H:%M")),
            (Some(at), None) => at.format("%Y-%m-%d %H:%M").to_string(),
            (None, _) => String::new(),
        };
        table.add_row(vec![
            Cell::new(title).fg(Color::Cyan),
            Cell::new(p.node_id).fg(Color::DarkGrey),
            status_cell(p.status),
            Cell::new(decided).fg(Color::DarkGrey),
        ]);
    }
    table
}

async fn submit(
    state: &AppState,
    workflow: &WorkflowId,
    user: UserId,
    raw_payload: &str,
    json: bool,
) -> Result<()> {
    let item = state
        .routing
        .submit(workflow, user, parse_payload(raw_payload))
        .await?;

    if json {
        return print_json(&item);
    }

    let placements = state.routing.list_pending_placements(&item.id).await?;
    let titles = node_titles(state, workflow).await?;
    let names: Vec<&str> = placements
        .iter()
        .filter_map(|p| titles.get(&p.node_id).map(String::as_str))
        .collect();

    println!();
    let id = style(item.id).cyan();
    println!("  {} Submitted item {id}", style("ok").green());
    println!("  Waiting at: {}", style(names.join(", ")).yellow());
    println!();
    Ok(())
}

async fn show(state: &AppState, id: &ItemId, json: bool) -> Result<()> {
    let item = state.routing.get_item(id).await?;
    let placements = state.routing.list_placements(id).await?;

    if json {
        return print_json(&serde_json::json!({
            "item": item,
            "placements": placements,
        }));
    }

    let titles = node_titles(state, &item.workflow_id).await?;
    let finished = placements.iter().all(|p| !p.is_pending());

    println!();
    println!("  {} {}", style("Item").bold(), style(item.id).cyan());
    println!("  Workflow:  {}", style(item.workflow_id).dim());
    println!("  Issuer:    {}", item.issuer);
    let submitted = item.created_at.format("%Y-%m-%d %H:%M:%S");
    println!("  Submitted: {submitted}");
    println!("  Payload:   {}", serde_json::to_string(&item.payload)?);
    println!(
        "  State:     {}",
        if finished {
            style("finished").green()
        } else {
            style("in review").yellow()
        }
    );
    println!();
    println!("{}", placement_table(&placements, &titles));
    println!();
    Ok(())
}

async fn list(state: &AppState, workflow: &WorkflowId, json: bool) -> Result<()> {
    let items = state.routing.list_items(workflow).await?;

    if json {
        return print_json(&items);
    }

    if items.is_empty() {
        println!();
        println!(
            "  {} No items submitted. Submit one with: {}",
            style("i").blue().bold(),
            style(format!("flexflow item submit {workflow} <payload>")).yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Id").fg(Color::White),
        Cell::new("Issuer").fg(Color::White),
        Cell::new("Pending").fg(Color::White),
        Cell::new("Submitted").fg(Color::White),
    ]);

    for item in &items {
        let pending = state.routing.list_pending_placements(&item.id).await?.len();
        let pending_cell = if pending == 0 {
            Cell::new("done").fg(Color::Green)
        } else {
            Cell::new(pending).fg(Color::Yellow)
        };
        table.add_row(vec![
            Cell::new(item.id).fg(Color::DarkGrey),
            Cell::new(&item.issuer),
            pending_cell,
            Cell::new(item.created_at.format("%Y-%m-%d %H:%M")).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    Ok(())
}

async fn pending(state: &AppState, id: &ItemId, json: bool) -> Result<()> {
    let item = state.routing.get_item(id).await?;
    let placements = state.routing.list_pending_placements(id).await?;

    if json {
        return print_json(&placements);
    }

    if placements.is_empty() {
        println!();
        println!(
            "  {} Item {} is not waiting anywhere",
            style("i").blue().bold(),
            style(id).cyan()
        );
        println!();
        return Ok(());
    }

    let titles = node_titles(state, &item.workflow_id).await?;
    println!();
    println!("{}", placement_table(&placements, &titles));
    println!();
    Ok(())
}

async fn history(state: &AppState, id: &ItemId, json: bool) -> Result<()> {
    let entries = state.routing.read_history(id).await?;

    if json {
        return print_json(&entries);
    }

    if entries.is_empty() {
        println!();
        println!("  {} No decisions recorded yet", style("i").blue().bold());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("#").fg(Color::White),
        Cell::new("Node").fg(Color::White),
        Cell::new("Decision").fg(Color::White),
        Cell::new("By").fg(Color::White),
        Cell::new("At").fg(Color::White),
    ]);

    for entry in &entries {
        let decision = match entry.decision {
            Decision::Approved => Cell::new("approved").fg(Color::Green),
            Decision::Rejected => Cell::new("rejected").fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(entry.seq),
            Cell::new(&entry.node.title).fg(Color::Cyan),
            decision,
            Cell::new(&entry.decided_by),
            Cell::new(entry.decided_at.format("%Y-%m-%d %H:%M:%S")).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    Ok(())
}

/// `flexflow decide <item> <node> <status>`
pub async fn decide(
    state: &AppState,
    item_id: &ItemId,
    node_id: &NodeId,
    status: &str,
    user: UserId,
    json: bool,
) -> Result<()> {
    let decision: Decision = status.parse()?;
    let item = state.routing.get_item(item_id).await?;

    let transition = state
        .routing
        .decide(&item.workflow_id, item_id, node_id, user, decision)
        .await?;

    if json {
        return print_json(&transition);
    }

    let titles = node_titles(state, &item.workflow_id).await?;
    let title_of = |id: &NodeId| titles.get(id).cloned().unwrap_or_else(|| id.to_string());

    println!();
    println!(
        "  {} {} at '{}'",
        style("ok").green(),
        match decision {
            Decision::Approved => style("Approved").green().bold(),
            Decision::Rejected => style("Rejected").red().bold(),
        },
        style(title_of(node_id)).cyan()
    );
    if !transition.spawned.is_empty() {
        let next: Vec<String> = transition
            .spawned
            .iter()
            .map(|p| title_of(&p.node_id))
            .collect();
        println!("  Moved on to: {}", style(next.join(", ")).yellow());
    }
    if transition.reached_end {
        println!(
            "  {} Item finished ({} other branch{} closed)",
            style("■").magenta(),
            transition.collapsed.len(),
            if transition.collapsed.len() == 1 { "" } else { "es" }
        );
    }
    println!();
    Ok(())
}
