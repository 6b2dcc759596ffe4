//! In-memory implementation of the repository traits for engine tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use flexflow_types::error::RepositoryError;
use flexflow_types::graph::{Edge, Node, Workflow};
use flexflow_types::history::HistoryEntry;
use flexflow_types::id::{ItemId, NodeId, WorkflowId};
use flexflow_types::item::{Item, Placement};

use crate::repository::graph::GraphRepository;
use crate::repository::history::HistoryRepository;
use crate::repository::item::ItemRepository;
use crate::routing::machine::Transition;

#[derive(Default)]
struct State {
    workflows: Vec<Workflow>,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    items: Vec<Item>,
    placements: Vec<Placement>,
    history: HashMap<ItemId, Vec<HistoryEntry>>,
}

/// Shared in-memory store. Clones see the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag a node terminal after its edges exist, which the graph service
    /// would refuse to build in that order.
    pub fn mark_terminal(&self, id: &NodeId) {
        self.with(|s| {
            for node in s.nodes.iter_mut().filter(|n| n.id == *id) {
                node.is_terminal = true;
            }
        });
    }

    fn with<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }
}

fn append_entry(state: &mut State, item_id: &ItemId, entry: &HistoryEntry) -> HistoryEntry {
    let ledger = state.history.entry(*item_id).or_default();
    let mut stored = entry.clone();
    stored.seq = ledger.len() as u32 + 1;
    ledger.push(stored.clone());
    stored
}

impl GraphRepository for MemoryStore {
    async fn create_workflow(&self, workflow: &Workflow) -> Result<(), RepositoryError> {
        self.with(|s| s.workflows.push(workflow.clone()));
        Ok(())
    }

    async fn get_workflow(&self, id: &WorkflowId) -> Result<Option<Workflow>, RepositoryError> {
        Ok(self.with(|s| s.workflows.iter().find(|w| w.id == *id).cloned()))
    }

    async fn list_workflows(&self) -> Result<Vec<Workflow>, RepositoryError> {
        Ok(self.with(|s| s.workflows.clone()))
    }

    async fn create_node(&self, node: &Node) -> Result<(), RepositoryError> {
        self.with(|s| s.nodes.push(node.clone()));
        Ok(())
    }

    async fn get_node(&self, id: &NodeId) -> Result<Option<Node>, RepositoryError> {
        Ok(self.with(|s| s.nodes.iter().find(|n| n.id == *id).cloned()))
    }

    async fn list_nodes(&self, workflow_id: &WorkflowId) -> Result<Vec<Node>, RepositoryError> {
        Ok(self.with(|s| {
            s.nodes
                .iter()
                .filter(|n| n.workflow_id == *workflow_id)
                .cloned()
                .collect()
        }))
    }

    async fn create_edge(&self, edge: &Edge) -> Result<(), RepositoryError> {
        self.with(|s| {
            let exists = s
                .edges
                .iter()
                .any(|e| e.from == edge.from && e.to == edge.to);
            if exists {
                return Err(RepositoryError::Conflict("edge exists".to_string()));
            }
            s.edges.push(edge.clone());
            Ok(())
        })
    }

    async fn list_edges(&self, workflow_id: &WorkflowId) -> Result<Vec<Edge>, RepositoryError> {
        Ok(self.with(|s| {
            s.edges
                .iter()
                .filter(|e| e.workflow_id == *workflow_id)
                .cloned()
                .collect()
        }))
    }
}

impl ItemRepository for MemoryStore {
    async fn create_item(
        &self,
        item: &Item,
        placements: &[Placement],
    ) -> Result<(), RepositoryError> {
        self.with(|s| {
            s.items.push(item.clone());
            s.placements.extend_from_slice(placements);
        });
        Ok(())
    }

    async fn get_item(&self, id: &ItemId) -> Result<Option<Item>, RepositoryError> {
        Ok(self.with(|s| s.items.iter().find(|i| i.id == *id).cloned()))
    }

    async fn list_items(&self, workflow_id: &WorkflowId) -> Result<Vec<Item>, RepositoryError> {
        Ok(self.with(|s| {
            s.items
                .iter()
                .filter(|i| i.workflow_id == *workflow_id)
                .cloned()
                .collect()
        }))
    }

    async fn list_placements(&self, item_id: &ItemId) -> Result<Vec<Placement>, RepositoryError> {
        Ok(self.with(|s| {
            s.placements
                .iter()
                .filter(|p| p.item_id == *item_id)
                .cloned()
                .collect()
        }))
    }

    async fn commit_transition(&self, t: &Transition) -> Result<(), RepositoryError> {
        self.with(|s| {
            let decided = s
                .placements
                .iter_mut()
                .find(|p| p.id == t.decided && p.is_pending())
                .ok_or_else(|| RepositoryError::Conflict("placement already decided".to_string()))?;
            decided.status = t.status;
            decided.decided_at = Some(t.decided_at);

            s.placements.extend(t.spawned.iter().cloned());

            for p in s
                .placements
                .iter_mut()
                .filter(|p| t.reached_end && p.item_id == t.item_id && p.is_pending())
            {
                p.status = t.status;
                p.decided_at = Some(t.decided_at);
                p.collapsed_by = Some(t.decided);
            }

            append_entry(s, &t.item_id, &t.entry);
            Ok(())
        })
    }
}

impl HistoryRepository for MemoryStore {
    async fn append(
        &self,
        item_id: &ItemId,
        entry: &HistoryEntry,
    ) -> Result<HistoryEntry, RepositoryError> {
        Ok(self.with(|s| append_entry(s, item_id, entry)))
    }

    async fn list(&self, item_id: &ItemId) -> Result<Vec<HistoryEntry>, RepositoryError> {
        Ok(self.with(|s| s.history.get(item_id).cloned().unwrap_or_default()))
    }
}
