//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use flexflow_types::error::{EdgeValidationError, GraphError, RoutingError};

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    Graph(GraphError),
    Routing(RoutingError),
    /// Malformed request input.
    Validation(String),
}

impl From<GraphError> for AppError {
    fn from(e: GraphError) -> Self {
        AppError::Graph(e)
    }
}

impl From<RoutingError> for AppError {
    fn from(e: RoutingError) -> Self {
        AppError::Routing(e)
    }
}

impl AppError {
    /// HTTP status and machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Graph(e) => match e {
                GraphError::WorkflowNotFound(_) => (StatusCode::NOT_FOUND, "WORKFLOW_NOT_FOUND"),
                GraphError::NodeNotFound(_) => (StatusCode::NOT_FOUND, "NODE_NOT_FOUND"),
                GraphError::InvalidTitle(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                GraphError::Edge(edge) => (StatusCode::UNPROCESSABLE_ENTITY, edge_code(edge)),
                GraphError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            },
            AppError::Routing(e) => match e {
                RoutingError::WorkflowNotFound(_) => (StatusCode::NOT_FOUND, "WORKFLOW_NOT_FOUND"),
                RoutingError::ItemNotFound(_) => (StatusCode::NOT_FOUND, "ITEM_NOT_FOUND"),
                RoutingError::NodeNotFound(_) => (StatusCode::NOT_FOUND, "NODE_NOT_FOUND"),
                RoutingError::PlacementNotFound { .. } => {
                    (StatusCode::NOT_FOUND, "PLACEMENT_NOT_FOUND")
                }
                RoutingError::InvalidStatus(_) => (StatusCode::BAD_REQUEST, "INVALID_STATUS"),
                RoutingError::NoEntryNodes(_) => (StatusCode::CONFLICT, "NO_ENTRY_NODES"),
                RoutingError::DeadEndNode(_) => (StatusCode::CONFLICT, "DEAD_END_NODE"),
                RoutingError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            },
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Graph(e) => e.to_string(),
            AppError::Routing(e) => e.to_string(),
            AppError::Validation(msg) => msg.clone(),
        }
    }
}

fn edge_code(e: &EdgeValidationError) -> &'static str {
    match e {
        EdgeValidationError::CrossWorkflow => "EDGE_CROSS_WORKFLOW",
        EdgeValidationError::FromTerminal(_) => "EDGE_FROM_TERMINAL",
        EdgeValidationError::SelfLoop(_) => "EDGE_SELF_LOOP",
        EdgeValidationError::Duplicate { .. } => "EDGE_DUPLICATE",
        EdgeValidationError::Cycle { .. } => "EDGE_CYCLE",
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = self.message();
        let request_id = uuid::Uuid::now_v7().to_string();

        if status.is_server_error() {
            tracing::error!(%request_id, code, error = %message, "request failed");
        } else if matches!(&self, AppError::Routing(e) if e.is_configuration()) {
            tracing::warn!(%request_id, code, error = %message, "workflow cannot route items");
        } else {
            tracing::debug!(%request_id, code, error = %message, "request rejected");
        }

        ApiResponse::error(status, code, &message, request_id).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flexflow_types::id::{ItemId, NodeId, WorkflowId};

    #[test]
    fn test_routing_error_statuses() {
        let not_found = RoutingError::PlacementNotFound {
            item: ItemId::new(),
            node: NodeId::new(),
        };
        let cases = [
            (not_found, StatusCode::NOT_FOUND),
            (
                RoutingError::InvalidStatus("maybe".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                RoutingError::NoEntryNodes(WorkflowId::new()),
                StatusCode::CONFLICT,
            ),
            (
                RoutingError::Storage("disk".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status_and_code().0, expected);
        }
    }

    #[test]
    fn test_edge_errors_are_unprocessable() {
        let self_loop = EdgeValidationError::SelfLoop(NodeId::new());
        let err = AppError::from(GraphError::Edge(self_loop));
        assert_eq!(
            err.status_and_code(),
            (StatusCode::UNPROCESSABLE_ENTITY, "EDGE_SELF_LOOP")
        );
    }
}
