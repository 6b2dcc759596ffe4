use thiserror::Error;

use crate::id::{ItemId, NodeId, WorkflowId};

/// Reasons an edge may not be added to a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EdgeValidationError {
    #[error("both nodes must belong to the workflow the edge is created in")]
    CrossWorkflow,

    #[error("cannot create an edge from terminal node {0}")]
    FromTerminal(NodeId),

    #[error("an edge may not connect node {0} to itself")]
    SelfLoop(NodeId),

    #[error("edge {from} -> {to} already exists")]
    Duplicate { from: NodeId, to: NodeId },

    #[error("edge {from} -> {to} would create a cycle")]
    Cycle { from: NodeId, to: NodeId },
}

/// Errors from graph authoring operations.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("workflow {0} not found")]
    WorkflowNotFound(WorkflowId),

    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("invalid title: {0}")]
    InvalidTitle(String),

    #[error("invalid edge: {0}")]
    Edge(#[from] EdgeValidationError),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors from submitting items and routing decisions.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("workflow {0} not found")]
    WorkflowNotFound(WorkflowId),

    #[error("item {0} not found")]
    ItemNotFound(ItemId),

    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// The workflow graph has no node that is a source and never a target.
    #[error("workflow {0} has no entry nodes")]
    NoEntryNodes(WorkflowId),

    #[error("no pending placement of item {item} at node {node}")]
    PlacementNotFound { item: ItemId, node: NodeId },

    #[error("invalid status '{0}': must be approved or rejected")]
    InvalidStatus(String),

    /// Only raised under the `reject` dead-end policy.
    #[error("node {0} has no outgoing edges and is not marked terminal")]
    DeadEndNode(NodeId),

    #[error("storage error: {0}")]
    Storage(String),
}

impl RoutingError {
    /// True for the configuration class of failures (graph unusable for routing).
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            RoutingError::NoEntryNodes(_) | RoutingError::DeadEndNode(_)
        )
    }
}

/// Errors from repository operations (used by trait definitions in flexflow-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<RepositoryError> for GraphError {
    fn from(e: RepositoryError) -> Self {
        GraphError::Storage(e.to_string())
    }
}

impl From<RepositoryError> for RoutingError {
    fn from(e: RepositoryError) -> Self {
        RoutingError::Storage(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_status_display() {
        let err = RoutingError::InvalidStatus("maybe".to_string());
        assert_eq!(
            err.to_string(),
            "invalid status 'maybe': must be approved or rejected"
        );
    }

    #[test]
    fn test_edge_error_wraps_into_graph_error() {
        let node = NodeId::new();
        let err: GraphError = EdgeValidationError::FromTerminal(node).into();
        assert!(err.to_string().contains("terminal"));
        assert!(err.to_string().contains(&node.to_string()));
    }

    #[test]
    fn test_configuration_classification() {
        let no_entries = RoutingError::NoEntryNodes(WorkflowId::new());
        assert!(no_entries.is_configuration());
        assert!(!RoutingError::InvalidStatus("x".into()).is_configuration());
    }

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }
}
