//! Routing engine: item lifecycle, decisions and read paths.
//!
//! `RoutingEngine` is generic over the repository traits so it can run on
//! SQLite in production and on an in-memory store in tests. Each call loads
//! its own snapshot of the workflow's edges; the graph is never re-read
//! halfway through an operation.

use flexflow_types::config::DeadEndPolicy;
use flexflow_types::error::{RepositoryError, RoutingError};
use flexflow_types::history::HistoryEntry;
use flexflow_types::id::{ItemId, NodeId, UserId, WorkflowId};
use flexflow_types::item::{Decision, Item, Placement};

use crate::graph::index::GraphIndex;
use crate::repository::graph::GraphRepository;
use crate::repository::history::HistoryRepository;
use crate::repository::item::ItemRepository;

use super::locks::ItemLocks;
use super::machine::{DecisionInput, Transition, plan_transition};

/// Routes items through workflow graphs.
pub struct RoutingEngine<G: GraphRepository, I: ItemRepository, H: HistoryRepository> {
    graphs: G,
    items: I,
    history: H,
    locks: ItemLocks,
    dead_end_policy: DeadEndPolicy,
}

impl<G: GraphRepository, I: ItemRepository, H: HistoryRepository> RoutingEngine<G, I, H> {
    pub fn new(graphs: G, items: I, history: H) -> Self {
        Self {
            graphs,
            items,
            history,
            locks: ItemLocks::new(),
            dead_end_policy: DeadEndPolicy::default(),
        }
    }

    /// Set how decisions on unflagged dead-end nodes are handled.
    pub fn with_dead_end_policy(mut self, policy: DeadEndPolicy) -> Self {
        self.dead_end_policy = policy;
        self
    }

    async fn load_index(&self, workflow_id: &WorkflowId) -> Result<GraphIndex, RoutingError> {
        let edges = self.graphs.list_edges(workflow_id).await?;
        let index = GraphIndex::build(workflow_id, &edges);
        tracing::debug!(%workflow_id, edges = index.edge_count(), "graph index built");
        Ok(index)
    }

    // -----------------------------------------------------------------------
    // Item lifecycle
    // -----------------------------------------------------------------------

    /// Submit a new item and place it, `Pending`, at every entry node.
    ///
    /// The item and its placements are written in one transaction.
    ///
    /// # Errors
    ///
    /// `WorkflowNotFound`, or `NoEntryNodes` if the graph has no node that is
    /// a source and never a target.
    pub async fn submit(
        &self,
        workflow_id: &WorkflowId,
        issuer: UserId,
        payload: serde_json::Value,
    ) -> Result<Item, RoutingError> {
        self.graphs
            .get_workflow(workflow_id)
            .await?
            .ok_or(RoutingError::WorkflowNotFound(*workflow_id))?;

        let index = self.load_index(workflow_id).await?;
        let mut entries: Vec<NodeId> = index.entry_nodes().into_iter().collect();
        if entries.is_empty() {
            tracing::warn!(%workflow_id, "submission refused: workflow has no entry nodes");
            return Err(RoutingError::NoEntryNodes(*workflow_id));
        }
        entries.sort();

        let item = Item::new(*workflow_id, issuer, payload);
        let placements: Vec<Placement> = entries
            .iter()
            .map(|node_id| Placement::pending(item.id, *node_id))
            .collect();

        self.items.create_item(&item, &placements).await?;

        tracing::info!(
            item_id = %item.id,
            %workflow_id,
            entry_nodes = placements.len(),
            "item submitted"
        );
        Ok(item)
    }

    // -----------------------------------------------------------------------
    // Routing
    // -----------------------------------------------------------------------

    /// Record `decision` on the pending placement of `item_id` at `node_id`.
    ///
    /// Runs under the item's exclusive lock: fan-out, terminal collapse and
    /// the history append all see one consistent placement set, and are
    /// committed in one transaction.
    ///
    /// # Errors
    ///
    /// - `ItemNotFound` if the item does not exist in `workflow_id`.
    /// - `PlacementNotFound` if the item has no pending placement at the
    ///   node, including when it was already decided.
    /// - `DeadEndNode` under [`DeadEndPolicy::Reject`].
    pub async fn decide(
        &self,
        workflow_id: &WorkflowId,
        item_id: &ItemId,
        node_id: &NodeId,
        decided_by: UserId,
        decision: Decision,
    ) -> Result<Transition, RoutingError> {
        let guard = self.locks.acquire(*item_id).await;
        tracing::debug!(%item_id, "item lock acquired");

        let result = self
            .decide_locked(workflow_id, item_id, node_id, decided_by, decision)
            .await;

        drop(guard);
        self.locks.prune();
        result
    }

    async fn decide_locked(
        &self,
        workflow_id: &WorkflowId,
        item_id: &ItemId,
        node_id: &NodeId,
        decided_by: UserId,
        decision: Decision,
    ) -> Result<Transition, RoutingError> {
        let item = self
            .items
            .get_item(item_id)
            .await?
            .filter(|item| item.workflow_id == *workflow_id)
            .ok_or(RoutingError::ItemNotFound(*item_id))?;

        let placements = self.items.list_placements(&item.id).await?;
        let pending_here = placements
            .iter()
            .any(|p| p.node_id == *node_id && p.is_pending());
        if !pending_here {
            return Err(RoutingError::PlacementNotFound {
                item: item.id,
                node: *node_id,
            });
        }

        let node = self
            .graphs
            .get_node(node_id)
            .await?
            .ok_or(RoutingError::NodeNotFound(*node_id))?;

        let index = self.load_index(workflow_id).await?;
        let next_nodes = index.next_nodes(node_id);

        let transition = plan_transition(DecisionInput {
            item_id: item.id,
            node: &node,
            placements: &placements,
            next_nodes: &next_nodes,
            decision,
            decided_by: &decided_by,
            dead_end_policy: self.dead_end_policy,
        })?;

        if transition.reached_end && next_nodes.is_empty() && !node.is_terminal {
            tracing::warn!(
                %node_id,
                "node has no outgoing edges and is not flagged terminal; collapsing as terminal"
            );
        }

        self.items
            .commit_transition(&transition)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => RoutingError::PlacementNotFound {
                    item: item.id,
                    node: *node_id,
                },
                other => RoutingError::from(other),
            })?;

        tracing::info!(
            %item_id,
            %node_id,
            decision = decision.as_str(),
            decided_by = %decided_by,
            spawned = transition.spawned.len(),
            collapsed = transition.collapsed.len(),
            reached_end = transition.reached_end,
            "decision recorded"
        );
        Ok(transition)
    }

    // -----------------------------------------------------------------------
    // Read paths
    // -----------------------------------------------------------------------

    pub async fn get_item(&self, item_id: &ItemId) -> Result<Item, RoutingError> {
        self.items
            .get_item(item_id)
            .await?
            .ok_or(RoutingError::ItemNotFound(*item_id))
    }

    pub async fn list_items(&self, workflow_id: &WorkflowId) -> Result<Vec<Item>, RoutingError> {
        self.graphs
            .get_workflow(workflow_id)
            .await?
            .ok_or(RoutingError::WorkflowNotFound(*workflow_id))?;
        Ok(self.items.list_items(workflow_id).await?)
    }

    /// Every placement of an item, decided ones included.
    pub async fn list_placements(&self, item_id: &ItemId) -> Result<Vec<Placement>, RoutingError> {
        self.get_item(item_id).await?;
        Ok(self.items.list_placements(item_id).await?)
    }

    /// Where the item currently waits for a decision. Empty once finished.
    pub async fn list_pending_placements(
        &self,
        item_id: &ItemId,
    ) -> Result<Vec<Placement>, RoutingError> {
        let placements = self.list_placements(item_id).await?;
        Ok(placements
            .into_iter()
            .filter(Placement::is_pending)
            .collect())
    }

    /// The item's decision ledger in insertion order. Empty before the
    /// first decision.
    pub async fn read_history(&self, item_id: &ItemId) -> Result<Vec<HistoryEntry>, RoutingError> {
        self.get_item(item_id).await?;
        Ok(self.history.list(item_id).await?)
    }
}
