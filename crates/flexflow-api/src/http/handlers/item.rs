//! Item handlers: submission, decisions and read paths.

use axum::Json;
use axum::extract::{Path, State};

use flexflow_core::routing::machine::Transition;
use flexflow_types::history::HistoryEntry;
use flexflow_types::id::{ItemId, WorkflowId};
use flexflow_types::item::{Decision, DecisionRequest, Item, Placement, SubmitItemRequest};

use crate::http::error::AppError;
use crate::http::extractors::user::ActingUser;
use crate::http::response::{ApiResponse, RequestContext};
use crate::state::AppState;

fn item_links<T: serde::Serialize>(resp: ApiResponse<T>, id: &ItemId) -> ApiResponse<T> {
    let base = format!("/api/v1/items/{id}");
    resp.with_link("item", &base)
        .with_link("placements", &format!("{base}/placements"))
        .with_link("pending", &format!("{base}/pending"))
        .with_link("history", &format!("{base}/history"))
}

/// POST /api/v1/workflows/{id}/items - Submit an item.
pub async fn submit_item(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path(workflow_id): Path<WorkflowId>,
    Json(body): Json<SubmitItemRequest>,
) -> Result<ApiResponse<Item>, AppError> {
    let ctx = RequestContext::start();
    let item = state.routing.submit(&workflow_id, user, body.payload).await?;
    let id = item.id;
    Ok(item_links(ctx.success(item).created(), &id))
}

/// GET /api/v1/workflows/{id}/items - List a workflow's items.
pub async fn list_items(
    State(state): State<AppState>,
    Path(workflow_id): Path<WorkflowId>,
) -> Result<ApiResponse<Vec<Item>>, AppError> {
    let ctx = RequestContext::start();
    let items = state.routing.list_items(&workflow_id).await?;
    Ok(ctx
        .success(items)
        .with_link("self", &format!("/api/v1/workflows/{workflow_id}/items")))
}

/// GET /api/v1/items/{id} - Get one item.
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
) -> Result<ApiResponse<Item>, AppError> {
    let ctx = RequestContext::start();
    let item = state.routing.get_item(&id).await?;
    let workflow = format!("/api/v1/workflows/{}", item.workflow_id);
    let response = item_links(ctx.success(item), &id);
    Ok(response.with_link("workflow", &workflow))
}

/// GET /api/v1/items/{id}/placements - Every placement, any status.
pub async fn list_placements(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
) -> Result<ApiResponse<Vec<Placement>>, AppError> {
    let ctx = RequestContext::start();
    let placements = state.routing.list_placements(&id).await?;
    Ok(item_links(ctx.success(placements), &id))
}

/// GET /api/v1/items/{id}/pending - Where the item waits for a decision.
pub async fn list_pending(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
) -> Result<ApiResponse<Vec<Placement>>, AppError> {
    let ctx = RequestContext::start();
    let pending = state.routing.list_pending_placements(&id).await?;
    Ok(item_links(ctx.success(pending), &id))
}

/// POST /api/v1/items/{id}/decisions - Approve or reject at a node.
pub async fn decide(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path(id): Path<ItemId>,
    Json(body): Json<DecisionRequest>,
) -> Result<ApiResponse<Transition>, AppError> {
    let ctx = RequestContext::start();
    let decision: Decision = body.status.parse()?;
    let item = state.routing.get_item(&id).await?;

    let transition = state
        .routing
        .decide(&item.workflow_id, &id, &body.node, user, decision)
        .await?;
    Ok(item_links(ctx.success(transition).created(), &id))
}

/// GET /api/v1/items/{id}/history - The item's decision ledger.
pub async fn history(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
) -> Result<ApiResponse<Vec<HistoryEntry>>, AppError> {
    let ctx = RequestContext::start();
    let entries = state.routing.read_history(&id).await?;
    Ok(item_links(ctx.success(entries), &id))
}
