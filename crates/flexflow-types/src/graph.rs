//! Workflow graph types.
//!
//! A workflow is a directed graph of review stations (nodes) connected by
//! transitions (edges). The graph is authored once and read by the routing
//! engine for every submission and decision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{EdgeId, NodeId, UserId, WorkflowId};

/// An approval workflow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    pub title: String,
    pub description: String,
    /// Author of the workflow. Ownership checks live outside the engine.
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// A review station inside a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub workflow_id: WorkflowId,
    pub title: String,
    pub description: String,
    /// Marks an end-of-process decision point, independent of topology.
    ///
    /// A decision here ends the whole item even if the node still has
    /// outgoing edges, and no new edge may originate from it.
    pub is_terminal: bool,
}

/// A directed transition `from -> to` between two nodes of one workflow.
///
/// The ordered pair `(from, to)` is unique within a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub workflow_id: WorkflowId,
    pub from: NodeId,
    pub to: NodeId,
}

impl Edge {
    pub fn new(workflow_id: WorkflowId, from: NodeId, to: NodeId) -> Self {
        Self {
            id: EdgeId::new(),
            workflow_id,
            from,
            to,
        }
    }
}

/// Request payload for creating a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkflowRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Request payload for adding a node to a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNodeRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_terminal: bool,
}

/// Request payload for connecting two nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEdgeRequest {
    pub from: NodeId,
    pub to: NodeId,
}
