//! SQLite history ledger implementation.
//!
//! One `history_ledgers` row per item, created on the first append, and
//! one `history_entries` row per decision keyed by `(item_id, seq)`. The
//! node is stored as a snapshot so renaming a node never rewrites history.

use chrono::Utc;
use flexflow_core::repository::history::HistoryRepository;
use flexflow_types::error::RepositoryError;
use flexflow_types::history::{HistoryEntry, NodeSnapshot};
use flexflow_types::id::{ItemId, UserId};
use flexflow_types::item::Decision;
use sqlx::{Row, SqliteConnection};

use super::convert::{format_datetime, parse_datetime, parse_id};
use super::pool::DatabasePool;

/// SQLite-backed implementation of `HistoryRepository`.
#[derive(Clone)]
pub struct SqliteHistoryRepository {
    pool: DatabasePool,
}

impl SqliteHistoryRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct EntryRow {
    seq: i64,
    decided_by: String,
    decided_at: String,
    decision: String,
    node_id: String,
    node_title: String,
    node_description: String,
    node_is_terminal: bool,
}

impl EntryRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            seq: row.try_get("seq")?,
            decided_by: row.try_get("decided_by")?,
            decided_at: row.try_get("decided_at")?,
            decision: row.try_get("decision")?,
            node_id: row.try_get("node_id")?,
            node_title: row.try_get("node_title")?,
            node_description: row.try_get("node_description")?,
            node_is_terminal: row.try_get("node_is_terminal")?,
        })
    }

    fn into_entry(self) -> Result<HistoryEntry, RepositoryError> {
        let decision: Decision = self
            .decision
            .parse()
            .map_err(|_| RepositoryError::Query(format!("invalid decision: {}", self.decision)))?;
        let seq = u32::try_from(self.seq)
            .map_err(|_| RepositoryError::Query(format!("invalid seq: {}", self.seq)))?;

        Ok(HistoryEntry {
            seq,
            decided_by: UserId::new(self.decided_by),
            decided_at: parse_datetime(&self.decided_at)?,
            decision,
            node: NodeSnapshot {
                id: parse_id(&self.node_id)?,
                title: self.node_title,
                description: self.node_description,
                is_terminal: self.node_is_terminal,
            },
        })
    }
}

/// Append `entry` to the item's ledger on an open connection, creating the
/// ledger on first use. Callers own the surrounding transaction.
pub(super) async fn append_entry(
    conn: &mut SqliteConnection,
    item_id: &ItemId,
    entry: &HistoryEntry,
) -> Result<HistoryEntry, RepositoryError> {
    sqlx::query("INSERT OR IGNORE INTO history_ledgers (item_id, created_at) VALUES (?, ?)")
        .bind(item_id.to_string())
        .bind(format_datetime(&Utc::now()))
        .execute(&mut *conn)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

    let (next,): (i64,) = sqlx::query_as(
        "SELECT COALESCE(MAX(seq), 0) + 1 FROM history_entries WHERE item_id = ?",
    )
    .bind(item_id.to_string())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| RepositoryError::Query(e.to_string()))?;

    sqlx::query(
        "INSERT INTO history_entries
           (item_id, seq, decided_by, decided_at, decision,
            node_id, node_title, node_description, node_is_terminal)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(item_id.to_string())
    .bind(next)
    .bind(entry.decided_by.as_str())
    .bind(format_datetime(&entry.decided_at))
    .bind(entry.decision.as_str())
    .bind(entry.node.id.to_string())
    .bind(&entry.node.title)
    .bind(&entry.node.description)
    .bind(entry.node.is_terminal)
    .execute(&mut *conn)
    .await
    .map_err(|e| RepositoryError::Query(e.to_string()))?;

    let seq = u32::try_from(next)
        .map_err(|_| RepositoryError::Query(format!("ledger overflow for item {item_id}")))?;
    Ok(HistoryEntry {
        seq,
        ..entry.clone()
    })
}

impl HistoryRepository for SqliteHistoryRepository {
    async fn append(
        &self,
        item_id: &ItemId,
        entry: &HistoryEntry,
    ) -> Result<HistoryEntry, RepositoryError> {
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let stored = append_entry(&mut *tx, item_id, entry).await?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(stored)
    }

    async fn list(&self, item_id: &ItemId) -> Result<Vec<HistoryEntry>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM history_entries WHERE item_id = ? ORDER BY seq ASC")
            .bind(item_id.to_string())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            let r = EntryRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            entries.push(r.into_entry()?);
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::graph::SqliteGraphRepository;
    use crate::sqlite::item::SqliteItemRepository;
    use flexflow_core::repository::graph::GraphRepository;
    use flexflow_core::repository::item::ItemRepository;
    use flexflow_types::graph::{Node, Workflow};
    use flexflow_types::id::{NodeId, WorkflowId};
    use flexflow_types::item::Item;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::open(dir.path()).await.unwrap();
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        pool
    }

    async fn setup_item(pool: &DatabasePool) -> (Item, Node) {
        let graphs = SqliteGraphRepository::new(pool.clone());
        let wf = Workflow {
            id: WorkflowId::new(),
            title: "Review".to_string(),
            description: String::new(),
            created_by: UserId::new("author"),
            created_at: Utc::now(),
        };
        graphs.create_workflow(&wf).await.unwrap();
        let node = Node {
            id: NodeId::new(),
            workflow_id: wf.id,
            title: "Legal".to_string(),
            description: "contract check".to_string(),
            is_terminal: true,
        };
        graphs.create_node(&node).await.unwrap();

        let item = Item::new(wf.id, UserId::new("issuer"), serde_json::json!("hello"));
        SqliteItemRepository::new(pool.clone())
            .create_item(&item, &[])
            .await
            .unwrap();
        (item, node)
    }

    #[tokio::test]
    async fn test_empty_before_first_append() {
        let pool = test_pool().await;
        let (item, _) = setup_item(&pool).await;
        let repo = SqliteHistoryRepository::new(pool.clone());

        assert!(repo.list(&item.id).await.unwrap().is_empty());

        let (ledgers,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM history_ledgers")
            .fetch_one(&pool.reader)
            .await
            .unwrap();
        assert_eq!(ledgers, 0, "ledger is created lazily");
    }

    #[tokio::test]
    async fn test_append_assigns_sequence_and_keeps_order() {
        let pool = test_pool().await;
        let (item, node) = setup_item(&pool).await;
        let repo = SqliteHistoryRepository::new(pool);

        let approve = HistoryEntry::new(UserId::new("alice"), Decision::Approved, &node);
        let reject = HistoryEntry::new(UserId::new("bob"), Decision::Rejected, &node);
        let first = repo.append(&item.id, &approve).await.unwrap();
        let second = repo.append(&item.id, &reject).await.unwrap();
        assert_eq!((first.seq, second.seq), (1, 2));

        let entries = repo.list(&item.id).await.unwrap();
        assert_eq!(entries, vec![first, second]);
        assert_eq!(entries[0].node.title, "Legal");
        assert!(entries[1].node.is_terminal);
    }
}
