//! Read-only queries over a workflow's edge set.
//!
//! `GraphIndex` is built from one snapshot of a workflow's edges and keyed
//! both by `from` and by `to`, so entry nodes and next hops are plain set
//! lookups. It never mutates the graph.

use std::collections::{HashMap, HashSet};

use flexflow_types::graph::Edge;
use flexflow_types::id::{NodeId, WorkflowId};
use petgraph::algo::has_path_connecting;
use petgraph::graphmap::DiGraphMap;

/// Adjacency index over one workflow's edges.
#[derive(Debug, Clone, Default)]
pub struct GraphIndex {
    outgoing: HashMap<NodeId, HashSet<NodeId>>,
    incoming: HashMap<NodeId, HashSet<NodeId>>,
}

impl GraphIndex {
    /// Index the edges that belong to `workflow_id`. Edges of any other
    /// workflow are ignored.
    pub fn build(workflow_id: &WorkflowId, edges: &[Edge]) -> Self {
        let mut index = Self::default();
        for edge in edges.iter().filter(|e| e.workflow_id == *workflow_id) {
            index.outgoing.entry(edge.from).or_default().insert(edge.to);
            index.incoming.entry(edge.to).or_default().insert(edge.from);
        }
        index
    }

    /// Nodes that are the source of at least one edge and the target of none.
    ///
    /// Isolated nodes never appear: they have no edges and so are neither
    /// sources nor targets.
    pub fn entry_nodes(&self) -> HashSet<NodeId> {
        self.outgoing
            .keys()
            .filter(|node| !self.incoming.contains_key(node))
            .copied()
            .collect()
    }

    /// Distinct targets of edges leaving `node`. Empty for a dead end.
    pub fn next_nodes(&self, node: &NodeId) -> HashSet<NodeId> {
        self.outgoing.get(node).cloned().unwrap_or_default()
    }

    pub fn contains_edge(&self, from: &NodeId, to: &NodeId) -> bool {
        self.outgoing
            .get(from)
            .is_some_and(|targets| targets.contains(to))
    }

    /// Whether adding `from -> to` would close a cycle, i.e. `from` is
    /// already reachable from `to`.
    pub fn would_create_cycle(&self, from: &NodeId, to: &NodeId) -> bool {
        if from == to {
            return true;
        }

        let mut graph = DiGraphMap::<NodeId, ()>::new();
        for (source, targets) in &self.outgoing {
            for target in targets {
                graph.add_edge(*source, *target, ());
            }
        }

        if !graph.contains_node(*from) || !graph.contains_node(*to) {
            return false;
        }
        has_path_connecting(&graph, *to, *from, None)
    }

    pub fn edge_count(&self) -> usize {
        self.outgoing.values().map(HashSet::len).sum()
    }
}
