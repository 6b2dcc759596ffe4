//! Graph repository trait definition.
//!
//! Defines the storage interface for workflow definitions, their nodes and
//! their edges. The routing engine only ever reads through this trait; the
//! write methods serve graph authoring.

use flexflow_types::error::RepositoryError;
use flexflow_types::graph::{Edge, Node, Workflow};
use flexflow_types::id::{NodeId, WorkflowId};

/// Repository trait for workflow graph persistence.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait GraphRepository: Send + Sync {
    // -----------------------------------------------------------------------
    // Workflows
    // -----------------------------------------------------------------------

    /// Insert a new workflow.
    fn create_workflow(
        &self,
        workflow: &Workflow,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a workflow by id.
    fn get_workflow(
        &self,
        id: &WorkflowId,
    ) -> impl std::future::Future<Output = Result<Option<Workflow>, RepositoryError>> + Send;

    /// List all workflows, oldest first.
    fn list_workflows(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Workflow>, RepositoryError>> + Send;

    // -----------------------------------------------------------------------
    // Nodes
    // -----------------------------------------------------------------------

    /// Insert a new node.
    fn create_node(
        &self,
        node: &Node,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a node by id, regardless of workflow.
    fn get_node(
        &self,
        id: &NodeId,
    ) -> impl std::future::Future<Output = Result<Option<Node>, RepositoryError>> + Send;

    /// List the nodes of one workflow, oldest first.
    fn list_nodes(
        &self,
        workflow_id: &WorkflowId,
    ) -> impl std::future::Future<Output = Result<Vec<Node>, RepositoryError>> + Send;

    // -----------------------------------------------------------------------
    // Edges
    // -----------------------------------------------------------------------

    /// Insert a new edge. Returns `Conflict` if `(from, to)` already exists.
    fn create_edge(
        &self,
        edge: &Edge,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// List every edge of one workflow.
    fn list_edges(
        &self,
        workflow_id: &WorkflowId,
    ) -> impl std::future::Future<Output = Result<Vec<Edge>, RepositoryError>> + Send;
}
