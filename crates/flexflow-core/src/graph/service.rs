//! Workflow graph authoring service.
//!
//! Creates workflows, nodes and edges on behalf of the CLI and REST layers.
//! Every new edge goes through [`validate_edge`] against the workflow's
//! current edge set before it is stored.

use flexflow_types::error::{EdgeValidationError, GraphError, RepositoryError};
use flexflow_types::graph::{
    CreateEdgeRequest, CreateNodeRequest, CreateWorkflowRequest, Edge, Node, Workflow,
};
use flexflow_types::id::{NodeId, UserId, WorkflowId};

use crate::repository::graph::GraphRepository;

use super::index::GraphIndex;
use super::validate::validate_edge;

/// Service for building workflow graphs.
pub struct GraphService<G: GraphRepository> {
    repo: G,
}

impl<G: GraphRepository> GraphService<G> {
    pub fn new(repo: G) -> Self {
        Self { repo }
    }

    pub async fn create_workflow(
        &self,
        created_by: UserId,
        request: CreateWorkflowRequest,
    ) -> Result<Workflow, GraphError> {
        let title = validate_title(&request.title)?;

        let workflow = Workflow {
            id: WorkflowId::new(),
            title,
            description: request.description.trim().to_string(),
            created_by,
            created_at: chrono::Utc::now(),
        };
        self.repo.create_workflow(&workflow).await?;

        tracing::info!(
            workflow_id = %workflow.id,
            title = workflow.title.as_str(),
            "workflow created"
        );
        Ok(workflow)
    }

    pub async fn get_workflow(&self, id: &WorkflowId) -> Result<Workflow, GraphError> {
        self.repo
            .get_workflow(id)
            .await?
            .ok_or(GraphError::WorkflowNotFound(*id))
    }

    pub async fn list_workflows(&self) -> Result<Vec<Workflow>, GraphError> {
        Ok(self.repo.list_workflows().await?)
    }

    pub async fn add_node(
        &self,
        workflow_id: &WorkflowId,
        request: CreateNodeRequest,
    ) -> Result<Node, GraphError> {
        self.get_workflow(workflow_id).await?;
        let title = validate_title(&request.title)?;

        let node = Node {
            id: NodeId::new(),
            workflow_id: *workflow_id,
            title,
            description: request.description.trim().to_string(),
            is_terminal: request.is_terminal,
        };
        self.repo.create_node(&node).await?;

        tracing::info!(
            %workflow_id,
            node_id = %node.id,
            is_terminal = node.is_terminal,
            "node added"
        );
        Ok(node)
    }

    pub async fn list_nodes(&self, workflow_id: &WorkflowId) -> Result<Vec<Node>, GraphError> {
        self.get_workflow(workflow_id).await?;
        Ok(self.repo.list_nodes(workflow_id).await?)
    }

    /// Connect two nodes after checking the edge rules.
    pub async fn add_edge(
        &self,
        workflow_id: &WorkflowId,
        request: CreateEdgeRequest,
    ) -> Result<Edge, GraphError> {
        self.get_workflow(workflow_id).await?;
        let from = self.get_node(&request.from).await?;
        let to = self.get_node(&request.to).await?;

        let edges = self.repo.list_edges(workflow_id).await?;
        let index = GraphIndex::build(workflow_id, &edges);
        validate_edge(workflow_id, &from, &to, &index)?;

        let edge = Edge::new(*workflow_id, from.id, to.id);
        self.repo.create_edge(&edge).await.map_err(|e| match e {
            // Lost a race with an identical insert.
            RepositoryError::Conflict(_) => GraphError::Edge(EdgeValidationError::Duplicate {
                from: from.id,
                to: to.id,
            }),
            other => GraphError::from(other),
        })?;

        tracing::info!(%workflow_id, from = %from.id, to = %to.id, "edge added");
        Ok(edge)
    }

    pub async fn list_edges(&self, workflow_id: &WorkflowId) -> Result<Vec<Edge>, GraphError> {
        self.get_workflow(workflow_id).await?;
        Ok(self.repo.list_edges(workflow_id).await?)
    }

    /// The nodes a new submission would be placed at.
    pub async fn entry_nodes(&self, workflow_id: &WorkflowId) -> Result<Vec<Node>, GraphError> {
        let nodes = self.list_nodes(workflow_id).await?;
        let edges = self.repo.list_edges(workflow_id).await?;
        let entries = GraphIndex::build(workflow_id, &edges).entry_nodes();
        Ok(nodes
            .into_iter()
            .filter(|n| entries.contains(&n.id))
            .collect())
    }

    async fn get_node(&self, id: &NodeId) -> Result<Node, GraphError> {
        self.repo
            .get_node(id)
            .await?
            .ok_or(GraphError::NodeNotFound(*id))
    }
}

fn validate_title(title: &str) -> Result<String, GraphError> {
    let title = title.trim();
    if title.is_empty() {
        let message = "title cannot be empty".to_string();
        return Err(GraphError::InvalidTitle(message));
    }
    if title.len() > 255 {
        let message = "title must be at most 255 characters".to_string();
        return Err(GraphError::InvalidTitle(message));
    }
    Ok(title.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryStore;

    fn service() -> GraphService<MemoryStore> {
        GraphService::new(MemoryStore::new())
    }

    fn node_req(title: &str, is_terminal: bool) -> CreateNodeRequest {
        CreateNodeRequest {
            title: title.to_string(),
            description: String::new(),
            is_terminal,
        }
    }

    fn edge_req(from: &Node, to: &Node) -> CreateEdgeRequest {
        CreateEdgeRequest {
            from: from.id,
            to: to.id,
        }
    }

    async fn workflow(svc: &GraphService<MemoryStore>) -> Workflow {
        svc.create_workflow(
            UserId::new("author"),
            CreateWorkflowRequest {
                title: "Purchase approval".to_string(),
                description: String::new(),
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_workflow_trims_and_rejects_empty_title() {
        let svc = service();
        let wf = svc
            .create_workflow(
                UserId::new("author"),
                CreateWorkflowRequest {
                    title: "  Expenses  ".to_string(),
                    description: "travel".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(wf.title, "Expenses");

        let err = svc
            .create_workflow(
                UserId::new("author"),
                CreateWorkflowRequest {
                    title: "   ".to_string(),
                    description: String::new(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidTitle(_)));
    }

    #[tokio::test]
    async fn test_add_node_requires_existing_workflow() {
        let svc = service();
        let missing = WorkflowId::new();
        let err = svc
            .add_node(&missing, node_req("A", false))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GraphError::WorkflowNotFound(id) if id == missing
        ));
    }

    #[tokio::test]
    async fn test_add_edge_and_entry_nodes() {
        let svc = service();
        let wf = workflow(&svc).await;
        let a = svc.add_node(&wf.id, node_req("A", false)).await.unwrap();
        let b = svc.add_node(&wf.id, node_req("B", true)).await.unwrap();
        let _isolated = svc
            .add_node(&wf.id, node_req("Unused", false))
            .await
            .unwrap();

        svc.add_edge(&wf.id, edge_req(&a, &b)).await.unwrap();

        let entries = svc.entry_nodes(&wf.id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, a.id);
        assert_eq!(svc.list_edges(&wf.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_edge_enforces_rules() {
        let svc = service();
        let wf = workflow(&svc).await;
        let other = workflow(&svc).await;
        let a = svc.add_node(&wf.id, node_req("A", false)).await.unwrap();
        let done = svc.add_node(&wf.id, node_req("Done", true)).await.unwrap();
        let foreign = svc.add_node(&other.id, node_req("X", false)).await.unwrap();

        let err = svc.add_edge(&wf.id, edge_req(&done, &a)).await.unwrap_err();
        assert!(matches!(err, GraphError::Edge(EdgeValidationError::FromTerminal(_))));

        let err = svc
            .add_edge(&wf.id, edge_req(&a, &foreign))
            .await
            .unwrap_err();
        assert!(matches!(err, GraphError::Edge(EdgeValidationError::CrossWorkflow)));

        svc.add_edge(&wf.id, edge_req(&a, &done)).await.unwrap();
        let err = svc.add_edge(&wf.id, edge_req(&a, &done)).await.unwrap_err();
        assert!(matches!(err, GraphError::Edge(EdgeValidationError::Duplicate { .. })));

        let dangling = CreateEdgeRequest {
            from: a.id,
            to: NodeId::new(),
        };
        let err = svc.add_edge(&wf.id, dangling).await.unwrap_err();
        assert!(matches!(err, GraphError::NodeNotFound(_)));
    }
}
