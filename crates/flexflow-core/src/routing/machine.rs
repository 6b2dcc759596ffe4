//! The per-placement approve/reject state machine.
//!
//! `plan_transition` turns one decision into a [`Transition`]: which
//! placement is decided, which placements are spawned one level deeper, and
//! which still-pending branches are collapsed because this branch reached
//! the end of the graph. It performs no I/O; the engine commits the plan
//! through the item repository in a single transaction.
//!
//! Placement states:
//!
//! ```text
//! Pending --approve--> Approved
//! Pending --reject---> Rejected
//! ```
//!
//! There are no other transitions and no re-opening.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use flexflow_types::config::DeadEndPolicy;
use flexflow_types::error::RoutingError;
use flexflow_types::graph::Node;
use flexflow_types::history::HistoryEntry;
use flexflow_types::id::{ItemId, NodeId, PlacementId, UserId};
use flexflow_types::item::{Decision, Placement, PlacementStatus};

/// Everything the state machine needs to decide one placement.
#[derive(Debug)]
pub struct DecisionInput<'a> {
    pub item_id: ItemId,
    /// The node the decision is made at.
    pub node: &'a Node,
    /// Every placement of the item, any status.
    pub placements: &'a [Placement],
    /// `next_nodes(node)` from the graph index.
    pub next_nodes: &'a HashSet<NodeId>,
    pub decision: Decision,
    pub decided_by: &'a UserId,
    pub dead_end_policy: DeadEndPolicy,
}

/// The effect of one decision, ready to be committed atomically.
#[derive(Debug, Clone, Serialize)]
pub struct Transition {
    pub item_id: ItemId,
    /// The placement the decision targeted.
    pub decided: PlacementId,
    pub status: PlacementStatus,
    pub decided_at: DateTime<Utc>,
    /// New `Pending` placements one level deeper (approval fan-out).
    pub spawned: Vec<Placement>,
    /// Other pending placements force-resolved to `status`.
    pub collapsed: Vec<PlacementId>,
    /// True when this branch reached a terminal or dead-end node.
    pub reached_end: bool,
    pub entry: HistoryEntry,
}

/// Plan the transition for `input.decision` at `input.node`.
///
/// # Errors
///
/// - `PlacementNotFound` if the item has no pending placement at the node.
/// - `DeadEndNode` if the node has no outgoing edges, is not flagged
///   terminal, and the policy is [`DeadEndPolicy::Reject`].
pub fn plan_transition(input: DecisionInput<'_>) -> Result<Transition, RoutingError> {
    let node = input.node;

    let target = input
        .placements
        .iter()
        .find(|p| p.node_id == node.id && p.is_pending())
        .ok_or(RoutingError::PlacementNotFound {
            item: input.item_id,
            node: node.id,
        })?;

    let dead_end = input.next_nodes.is_empty();
    if dead_end && !node.is_terminal && input.dead_end_policy == DeadEndPolicy::Reject {
        return Err(RoutingError::DeadEndNode(node.id));
    }
    let reached_end = dead_end || node.is_terminal;

    let status = PlacementStatus::from(input.decision);

    // Fan-out only happens mid-graph. A next node that already holds a
    // pending placement of this item is a join: the branches merge there.
    let spawned = match input.decision {
        Decision::Approved if !reached_end => {
            let already_pending: HashSet<NodeId> = input
                .placements
                .iter()
                .filter(|p| p.is_pending())
                .map(|p| p.node_id)
                .collect();

            let mut targets: Vec<NodeId> = input
                .next_nodes
                .iter()
                .filter(|n| !already_pending.contains(n))
                .copied()
                .collect();
            targets.sort();

            targets
                .into_iter()
                .map(|n| Placement::pending(input.item_id, n))
                .collect()
        }
        Decision::Approved | Decision::Rejected => Vec::new(),
    };

    let collapsed = if reached_end {
        input
            .placements
            .iter()
            .filter(|p| p.is_pending() && p.id != target.id)
            .map(|p| p.id)
            .collect()
    } else {
        Vec::new()
    };

    let entry = HistoryEntry::new(input.decided_by.clone(), input.decision, node);

    Ok(Transition {
        item_id: input.item_id,
        decided: target.id,
        status,
        decided_at: entry.decided_at,
        spawned,
        collapsed,
        reached_end,
        entry,
    })
}
