//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`. Middleware: CORS and request tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Workflow graph
        .route(
            "/workflows",
            post(handlers::workflow::create_workflow).get(handlers::workflow::list_workflows),
        )
        .route("/workflows/{id}", get(handlers::workflow::get_workflow))
        .route(
            "/workflows/{id}/nodes",
            post(handlers::workflow::create_node).get(handlers::workflow::list_nodes),
        )
        .route(
            "/workflows/{id}/edges",
            post(handlers::workflow::create_edge).get(handlers::workflow::list_edges),
        )
        .route(
            "/workflows/{id}/entry-nodes",
            get(handlers::workflow::entry_nodes),
        )
        // Items
        .route(
            "/workflows/{id}/items",
            post(handlers::item::submit_item).get(handlers::item::list_items),
        )
        .route("/items/{id}", get(handlers::item::get_item))
        .route(
            "/items/{id}/placements",
            get(handlers::item::list_placements),
        )
        .route("/items/{id}/pending", get(handlers::item::list_pending))
        .route("/items/{id}/decisions", post(handlers::item::decide))
        .route("/items/{id}/history", get(handlers::item::history));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use flexflow_infra::sqlite::pool::DatabasePool;
    use flexflow_types::config::GlobalConfig;
    use flexflow_types::id::WorkflowId;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn test_router() -> Router {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::open(dir.path()).await.unwrap();
        let data_dir = dir.path().to_path_buf();
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        let state = AppState::from_parts(pool, GlobalConfig::default(), data_dir);
        build_router(state)
    }

    async fn call(
        router: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-user-id", "alice");
        let body = match body {
            Some(v) => {
                builder = builder.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };

        let response = router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
        call(router, "GET", uri, None).await
    }

    async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        call(router, "POST", uri, Some(body)).await
    }

    async fn create(router: &Router, uri: &str, body: Value) -> Value {
        let (status, value) = post_json(router, uri, body).await;
        assert_eq!(status, StatusCode::CREATED, "POST {uri}: {value}");
        value["data"].clone()
    }

    fn id_of(value: &Value) -> String {
        value["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let router = test_router().await;
        let (status, body) = get_json(&router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_fork_and_terminal_rejection_over_http() {
        let router = test_router().await;

        let wf = create(&router, "/api/v1/workflows", json!({"title": "Purchase"})).await;
        assert_eq!(wf["created_by"], "alice");
        let wf_uri = format!("/api/v1/workflows/{}", id_of(&wf));
        let nodes_uri = format!("{wf_uri}/nodes");

        let a = create(&router, &nodes_uri, json!({"title": "Manager"})).await;
        let finance = json!({"title": "Finance", "is_terminal": true});
        let b = create(&router, &nodes_uri, finance).await;
        let legal = json!({"title": "Legal", "is_terminal": true});
        let c = create(&router, &nodes_uri, legal).await;

        let edges_uri = format!("{wf_uri}/edges");
        create(&router, &edges_uri, json!({"from": a["id"], "to": b["id"]})).await;
        create(&router, &edges_uri, json!({"from": a["id"], "to": c["id"]})).await;

        let (status, entries) = get_json(&router, &format!("{wf_uri}/entry-nodes")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(entries["data"].as_array().unwrap().len(), 1);
        assert_eq!(entries["data"][0]["id"], a["id"]);

        let items_uri = format!("{wf_uri}/items");
        let item = create(&router, &items_uri, json!({"payload": "new laptop"})).await;
        let item_uri = format!("/api/v1/items/{}", id_of(&item));
        let decisions_uri = format!("{item_uri}/decisions");

        let approve_a = json!({"node": a["id"], "status": "Approved"});
        let t = create(&router, &decisions_uri, approve_a).await;
        assert_eq!(t["spawned"].as_array().unwrap().len(), 2);

        let reject_b = json!({"node": b["id"], "status": "rejected"});
        let t = create(&router, &decisions_uri, reject_b).await;
        assert_eq!(t["reached_end"], true);

        let (_, pending) = get_json(&router, &format!("{item_uri}/pending")).await;
        assert!(pending["data"].as_array().unwrap().is_empty());

        let (_, placements) = get_json(&router, &format!("{item_uri}/placements")).await;
        let legal = placements["data"]
            .as_array()
            .unwrap()
            .iter()
            .find(|p| p["node_id"] == c["id"])
            .unwrap();
        assert_eq!(legal["status"], "rejected");

        let (_, history) = get_json(&router, &format!("{item_uri}/history")).await;
        let entries = history["data"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["decided_by"], "alice");
        assert_eq!(entries[1]["node"]["title"], "Finance");

        // Deciding again on an already-resolved placement.
        let approve_c = json!({"node": c["id"], "status": "approved"});
        let (status, body) = post_json(&router, &decisions_uri, approve_c).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["errors"][0]["code"], "PLACEMENT_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_error_mapping() {
        let router = test_router().await;
        let wf = create(&router, "/api/v1/workflows", json!({"title": "Empty"})).await;
        let wf_uri = format!("/api/v1/workflows/{}", id_of(&wf));

        // No nodes, so no entry nodes.
        let submission = json!({"payload": {"amount": 10}});
        let (status, body) = post_json(&router, &format!("{wf_uri}/items"), submission).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["errors"][0]["code"], "NO_ENTRY_NODES");

        let nodes_uri = format!("{wf_uri}/nodes");
        let node = create(&router, &nodes_uri, json!({"title": "Solo"})).await;
        let self_loop = json!({"from": node["id"], "to": node["id"]});
        let (status, body) = post_json(&router, &format!("{wf_uri}/edges"), self_loop).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"][0]["code"], "EDGE_SELF_LOOP");

        let missing = format!("/api/v1/workflows/{}", WorkflowId::new());
        let (status, body) = get_json(&router, &missing).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["errors"][0]["code"], "WORKFLOW_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_invalid_status_is_bad_request() {
        let router = test_router().await;
        let wf = create(&router, "/api/v1/workflows", json!({"title": "W"})).await;
        let wf_uri = format!("/api/v1/workflows/{}", id_of(&wf));
        let nodes_uri = format!("{wf_uri}/nodes");
        let a = create(&router, &nodes_uri, json!({"title": "A"})).await;
        let terminal = json!({"title": "B", "is_terminal": true});
        let b = create(&router, &nodes_uri, terminal).await;
        let edge = json!({"from": a["id"], "to": b["id"]});
        create(&router, &format!("{wf_uri}/edges"), edge).await;
        let item = create(&router, &format!("{wf_uri}/items"), json!({"payload": "x"})).await;

        let decisions_uri = format!("/api/v1/items/{}/decisions", id_of(&item));
        let maybe = json!({"node": a["id"], "status": "maybe"});
        let (status, body) = post_json(&router, &decisions_uri, maybe).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["code"], "INVALID_STATUS");
    }
}
