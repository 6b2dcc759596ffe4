//! SQLite graph repository implementation.
//!
//! Implements `GraphRepository` from `flexflow-core`: workflows, their nodes
//! and their edges. The `(from_node_id, to_node_id)` uniqueness constraint
//! surfaces as `RepositoryError::Conflict`.

use chrono::Utc;
use flexflow_core::repository::graph::GraphRepository;
use flexflow_types::error::RepositoryError;
use flexflow_types::graph::{Edge, Node, Workflow};
use flexflow_types::id::{NodeId, UserId, WorkflowId};
use sqlx::Row;

use super::convert::{format_datetime, is_unique_violation, parse_datetime, parse_id};
use super::pool::DatabasePool;

/// SQLite-backed implementation of `GraphRepository`.
#[derive(Clone)]
pub struct SqliteGraphRepository {
    pool: DatabasePool,
}

impl SqliteGraphRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Internal row types
// ---------------------------------------------------------------------------

struct WorkflowRow {
    id: String,
    title: String,
    description: String,
    created_by: String,
    created_at: String,
}

impl WorkflowRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_workflow(self) -> Result<Workflow, RepositoryError> {
        Ok(Workflow {
            id: parse_id(&self.id)?,
            title: self.title,
            description: self.description,
            created_by: UserId::new(self.created_by),
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

struct NodeRow {
    id: String,
    workflow_id: String,
    title: String,
    description: String,
    is_terminal: bool,
}

impl NodeRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            workflow_id: row.try_get("workflow_id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            is_terminal: row.try_get("is_terminal")?,
        })
    }

    fn into_node(self) -> Result<Node, RepositoryError> {
        Ok(Node {
            id: parse_id(&self.id)?,
            workflow_id: parse_id(&self.workflow_id)?,
            title: self.title,
            description: self.description,
            is_terminal: self.is_terminal,
        })
    }
}

fn edge_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Edge, RepositoryError> {
    let get = |col: &str| -> Result<String, RepositoryError> {
        row.try_get(col)
            .map_err(|e| RepositoryError::Query(e.to_string()))
    };
    Ok(Edge {
        id: parse_id(&get("id")?)?,
        workflow_id: parse_id(&get("workflow_id")?)?,
        from: parse_id(&get("from_node_id")?)?,
        to: parse_id(&get("to_node_id")?)?,
    })
}

// ---------------------------------------------------------------------------
// GraphRepository impl
// ---------------------------------------------------------------------------

impl GraphRepository for SqliteGraphRepository {
    async fn create_workflow(&self, workflow: &Workflow) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO workflows (id, title, description, created_by, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(workflow.id.to_string())
        .bind(&workflow.title)
        .bind(&workflow.description)
        .bind(workflow.created_by.as_str())
        .bind(format_datetime(&workflow.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn get_workflow(&self, id: &WorkflowId) -> Result<Option<Workflow>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM workflows WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let r = WorkflowRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(r.into_workflow()?))
            }
            None => Ok(None),
        }
    }

    async fn list_workflows(&self) -> Result<Vec<Workflow>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM workflows ORDER BY created_at ASC, id ASC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut workflows = Vec::with_capacity(rows.len());
        for row in &rows {
            let r = WorkflowRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            workflows.push(r.into_workflow()?);
        }
        Ok(workflows)
    }

    async fn create_node(&self, node: &Node) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO nodes (id, workflow_id, title, description, is_terminal, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(node.id.to_string())
        .bind(node.workflow_id.to_string())
        .bind(&node.title)
        .bind(&node.description)
        .bind(node.is_terminal)
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn get_node(&self, id: &NodeId) -> Result<Option<Node>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM nodes WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let r = NodeRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(r.into_node()?))
            }
            None => Ok(None),
        }
    }

    async fn list_nodes(&self, workflow_id: &WorkflowId) -> Result<Vec<Node>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM nodes WHERE workflow_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(workflow_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut nodes = Vec::with_capacity(rows.len());
        for row in &rows {
            let r = NodeRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            nodes.push(r.into_node()?);
        }
        Ok(nodes)
    }

    async fn create_edge(&self, edge: &Edge) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO edges (id, workflow_id, from_node_id, to_node_id, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(edge.id.to_string())
        .bind(edge.workflow_id.to_string())
        .bind(edge.from.to_string())
        .bind(edge.to.to_string())
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(RepositoryError::Conflict(format!(
                "edge {} -> {} already exists",
                edge.from, edge.to
            ))),
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn list_edges(&self, workflow_id: &WorkflowId) -> Result<Vec<Edge>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, workflow_id, from_node_id, to_node_id FROM edges
             WHERE workflow_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(workflow_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter().map(edge_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::open(dir.path()).await.unwrap();
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        pool
    }

    fn make_workflow(title: &str) -> Workflow {
        Workflow {
            id: WorkflowId::new(),
            title: title.to_string(),
            description: format!("{title} process"),
            created_by: UserId::new("author"),
            created_at: Utc::now(),
        }
    }

    fn make_node(workflow_id: WorkflowId, title: &str, is_terminal: bool) -> Node {
        Node {
            id: NodeId::new(),
            workflow_id,
            title: title.to_string(),
            description: String::new(),
            is_terminal,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_workflow() {
        let repo = SqliteGraphRepository::new(test_pool().await);
        let wf = make_workflow("Leave request");
        repo.create_workflow(&wf).await.unwrap();

        let fetched = repo.get_workflow(&wf.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, wf.id);
        assert_eq!(fetched.title, "Leave request");
        assert_eq!(fetched.created_by, UserId::new("author"));

        let missing = repo.get_workflow(&WorkflowId::new()).await.unwrap();
        assert!(missing.is_none());
        assert_eq!(repo.list_workflows().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_nodes_are_scoped_to_workflow() {
        let repo = SqliteGraphRepository::new(test_pool().await);
        let (a, b) = (make_workflow("A"), make_workflow("B"));
        repo.create_workflow(&a).await.unwrap();
        repo.create_workflow(&b).await.unwrap();

        let manager = make_node(a.id, "Manager", false);
        let finance = make_node(a.id, "Finance", true);
        repo.create_node(&manager).await.unwrap();
        repo.create_node(&finance).await.unwrap();
        let other = make_node(b.id, "Other", false);
        repo.create_node(&other).await.unwrap();

        let nodes = repo.list_nodes(&a.id).await.unwrap();
        assert_eq!(nodes.len(), 2);

        let fetched = repo.get_node(&finance.id).await.unwrap().unwrap();
        assert!(fetched.is_terminal);
        assert_eq!(fetched.workflow_id, a.id);
    }

    #[tokio::test]
    async fn test_duplicate_edge_is_conflict() {
        let repo = SqliteGraphRepository::new(test_pool().await);
        let wf = make_workflow("W");
        repo.create_workflow(&wf).await.unwrap();
        let (x, y) = (make_node(wf.id, "X", false), make_node(wf.id, "Y", false));
        repo.create_node(&x).await.unwrap();
        repo.create_node(&y).await.unwrap();

        repo.create_edge(&Edge::new(wf.id, x.id, y.id))
            .await
            .unwrap();
        let duplicate = Edge::new(wf.id, x.id, y.id);
        let err = repo.create_edge(&duplicate).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));

        let edges = repo.list_edges(&wf.id).await.unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!((edges[0].from, edges[0].to), (x.id, y.id));
    }

    #[tokio::test]
    async fn test_edge_requires_existing_nodes() {
        let repo = SqliteGraphRepository::new(test_pool().await);
        let wf = make_workflow("W");
        repo.create_workflow(&wf).await.unwrap();

        let err = repo
            .create_edge(&Edge::new(wf.id, NodeId::new(), NodeId::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Query(_)));
    }
}
