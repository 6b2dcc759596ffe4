//! Workflow graph handlers: workflows, nodes, edges and entry nodes.

use axum::Json;
use axum::extract::{Path, State};

use flexflow_types::graph::{
    CreateEdgeRequest, CreateNodeRequest, CreateWorkflowRequest, Edge, Node, Workflow,
};
use flexflow_types::id::WorkflowId;

use crate::http::error::AppError;
use crate::http::extractors::user::ActingUser;
use crate::http::response::{ApiResponse, RequestContext};
use crate::state::AppState;

/// POST /api/v1/workflows - Create a workflow.
pub async fn create_workflow(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Json(body): Json<CreateWorkflowRequest>,
) -> Result<ApiResponse<Workflow>, AppError> {
    let ctx = RequestContext::start();
    let workflow = state.graph_service.create_workflow(user, body).await?;
    let self_link = format!("/api/v1/workflows/{}", workflow.id);
    let nodes_link = format!("{self_link}/nodes");

    Ok(ctx
        .success(workflow)
        .created()
        .with_link("self", &self_link)
        .with_link("nodes", &nodes_link))
}

/// GET /api/v1/workflows - List workflows.
pub async fn list_workflows(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<Workflow>>, AppError> {
    let ctx = RequestContext::start();
    let workflows = state.graph_service.list_workflows().await?;
    Ok(ctx
        .success(workflows)
        .with_link("self", "/api/v1/workflows"))
}

/// GET /api/v1/workflows/{id} - Get one workflow.
pub async fn get_workflow(
    State(state): State<AppState>,
    Path(id): Path<WorkflowId>,
) -> Result<ApiResponse<Workflow>, AppError> {
    let ctx = RequestContext::start();
    let workflow = state.graph_service.get_workflow(&id).await?;
    let base = format!("/api/v1/workflows/{id}");

    Ok(ctx
        .success(workflow)
        .with_link("self", &base)
        .with_link("nodes", &format!("{base}/nodes"))
        .with_link("edges", &format!("{base}/edges"))
        .with_link("items", &format!("{base}/items")))
}

/// POST /api/v1/workflows/{id}/nodes - Add a node.
pub async fn create_node(
    State(state): State<AppState>,
    Path(id): Path<WorkflowId>,
    Json(body): Json<CreateNodeRequest>,
) -> Result<ApiResponse<Node>, AppError> {
    let ctx = RequestContext::start();
    let node = state.graph_service.add_node(&id, body).await?;
    Ok(ctx
        .success(node)
        .created()
        .with_link("workflow", &format!("/api/v1/workflows/{id}")))
}

/// GET /api/v1/workflows/{id}/nodes - List nodes.
pub async fn list_nodes(
    State(state): State<AppState>,
    Path(id): Path<WorkflowId>,
) -> Result<ApiResponse<Vec<Node>>, AppError> {
    let ctx = RequestContext::start();
    let nodes = state.graph_service.list_nodes(&id).await?;
    Ok(ctx
        .success(nodes)
        .with_link("self", &format!("/api/v1/workflows/{id}/nodes")))
}

/// POST /api/v1/workflows/{id}/edges - Connect two nodes.
pub async fn create_edge(
    State(state): State<AppState>,
    Path(id): Path<WorkflowId>,
    Json(body): Json<CreateEdgeRequest>,
) -> Result<ApiResponse<Edge>, AppError> {
    let ctx = RequestContext::start();
    let edge = state.graph_service.add_edge(&id, body).await?;
    Ok(ctx
        .success(edge)
        .created()
        .with_link("edges", &format!("/api/v1/workflows/{id}/edges")))
}

/// GET /api/v1/workflows/{id}/edges - List edges.
pub async fn list_edges(
    State(state): State<AppState>,
    Path(id): Path<WorkflowId>,
) -> Result<ApiResponse<Vec<Edge>>, AppError> {
    let ctx = RequestContext::start();
    let edges = state.graph_service.list_edges(&id).await?;
    Ok(ctx
        .success(edges)
        .with_link("self", &format!("/api/v1/workflows/{id}/edges")))
}

/// GET /api/v1/workflows/{id}/entry-nodes - Nodes a new item would start at.
pub async fn entry_nodes(
    State(state): State<AppState>,
    Path(id): Path<WorkflowId>,
) -> Result<ApiResponse<Vec<Node>>, AppError> {
    let ctx = RequestContext::start();
    let nodes = state.graph_service.entry_nodes(&id).await?;
    Ok(ctx
        .success(nodes)
        .with_link("workflow", &format!("/api/v1/workflows/{id}")))
}
