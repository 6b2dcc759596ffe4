//! SQLite item and placement repository implementation.
//!
//! Implements `ItemRepository` from `flexflow-core`. Submissions and routing
//! transitions are each written in a single writer transaction; a decision
//! only lands if its placement is still `pending` when the UPDATE runs.

use flexflow_core::repository::item::ItemRepository;
use flexflow_core::routing::machine::Transition;
use flexflow_types::error::RepositoryError;
use flexflow_types::id::{ItemId, UserId, WorkflowId};
use flexflow_types::item::{Item, Placement, PlacementStatus};
use sqlx::{Row, SqliteConnection};

use super::convert::{format_datetime, is_unique_violation, parse_datetime, parse_id};
use super::history::append_entry;
use super::pool::DatabasePool;

/// SQLite-backed implementation of `ItemRepository`.
#[derive(Clone)]
pub struct SqliteItemRepository {
    pool: DatabasePool,
}

impl SqliteItemRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Internal row types
// ---------------------------------------------------------------------------

struct ItemRow {
    id: String,
    workflow_id: String,
    issuer: String,
    payload: String,
    created_at: String,
}

impl ItemRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            workflow_id: row.try_get("workflow_id")?,
            issuer: row.try_get("issuer")?,
            payload: row.try_get("payload")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_item(self) -> Result<Item, RepositoryError> {
        let payload = serde_json::from_str(&self.payload)
            .map_err(|e| RepositoryError::Query(format!("invalid payload JSON: {e}")))?;

        Ok(Item {
            id: parse_id(&self.id)?,
            workflow_id: parse_id(&self.workflow_id)?,
            issuer: UserId::new(self.issuer),
            payload,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

struct PlacementRow {
    id: String,
    item_id: String,
    node_id: String,
    status: String,
    created_at: String,
    decided_at: Option<String>,
    collapsed_by: Option<String>,
}

impl PlacementRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            item_id: row.try_get("item_id")?,
            node_id: row.try_get("node_id")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            decided_at: row.try_get("decided_at")?,
            collapsed_by: row.try_get("collapsed_by")?,
        })
    }

    fn into_placement(self) -> Result<Placement, RepositoryError> {
        let status: PlacementStatus = self
            .status
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(Placement {
            id: parse_id(&self.id)?,
            item_id: parse_id(&self.item_id)?,
            node_id: parse_id(&self.node_id)?,
            status,
            created_at: parse_datetime(&self.created_at)?,
            decided_at: self.decided_at.as_deref().map(parse_datetime).transpose()?,
            collapsed_by: self.collapsed_by.as_deref().map(parse_id).transpose()?,
        })
    }
}

async fn insert_placement(
    conn: &mut SqliteConnection,
    placement: &Placement,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO placements (id, item_id, node_id, status, created_at, decided_at, collapsed_by)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(placement.id.to_string())
    .bind(placement.item_id.to_string())
    .bind(placement.node_id.to_string())
    .bind(placement.status.as_str())
    .bind(format_datetime(&placement.created_at))
    .bind(placement.decided_at.as_ref().map(format_datetime))
    .bind(placement.collapsed_by.map(|id| id.to_string()))
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            return RepositoryError::Conflict(format!(
                "item {} is already pending at node {}",
                placement.item_id, placement.node_id
            ));
        }
        RepositoryError::Query(e.to_string())
    })?;

    Ok(())
}

// ---------------------------------------------------------------------------
// ItemRepository impl
// ---------------------------------------------------------------------------

impl ItemRepository for SqliteItemRepository {
    async fn create_item(
        &self,
        item: &Item,
        placements: &[Placement],
    ) -> Result<(), RepositoryError> {
        let payload = serde_json::to_string(&item.payload)
            .map_err(|e| RepositoryError::Query(format!("serialize payload: {e}")))?;

        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        sqlx::query(
            "INSERT INTO items (id, workflow_id, issuer, payload, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(item.id.to_string())
        .bind(item.workflow_id.to_string())
        .bind(item.issuer.as_str())
        .bind(&payload)
        .bind(format_datetime(&item.created_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        for placement in placements {
            insert_placement(&mut *tx, placement).await?;
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn get_item(&self, id: &ItemId) -> Result<Option<Item>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM items WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let r = ItemRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(r.into_item()?))
            }
            None => Ok(None),
        }
    }

    async fn list_items(&self, workflow_id: &WorkflowId) -> Result<Vec<Item>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM items WHERE workflow_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(workflow_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            let r = ItemRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            items.push(r.into_item()?);
        }
        Ok(items)
    }

    async fn list_placements(&self, item_id: &ItemId) -> Result<Vec<Placement>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM placements WHERE item_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(item_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut placements = Vec::with_capacity(rows.len());
        for row in &rows {
            let r = PlacementRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            placements.push(r.into_placement()?);
        }
        Ok(placements)
    }

    async fn commit_transition(&self, transition: &Transition) -> Result<(), RepositoryError> {
        let decided_at = format_datetime(&transition.decided_at);
        let status = transition.status.as_str();

        // Dropping `tx` on any early return rolls everything back.
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let decided = sqlx::query(
            "UPDATE placements SET status = ?, decided_at = ?
             WHERE id = ? AND status = 'pending'",
        )
        .bind(status)
        .bind(&decided_at)
        .bind(transition.decided.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if decided.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(format!(
                "placement {} is no longer pending",
                transition.decided
            )));
        }

        for placement in &transition.spawned {
            insert_placement(&mut *tx, placement).await?;
        }

        // The planned `collapsed` list is a snapshot. Another process may have
        // spawned placements since, so collapse whatever is pending now.
        if transition.reached_end {
            let collapsed = sqlx::query(
                "UPDATE placements SET status = ?, decided_at = ?, collapsed_by = ?
                 WHERE item_id = ? AND status = 'pending' AND id != ?",
            )
            .bind(status)
            .bind(&decided_at)
            .bind(transition.decided.to_string())
            .bind(transition.item_id.to_string())
            .bind(transition.decided.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

            tracing::debug!(
                item_id = %transition.item_id,
                planned = transition.collapsed.len(),
                collapsed = collapsed.rows_affected(),
                "pending branches collapsed"
            );
        }

        append_entry(&mut *tx, &transition.item_id, &transition.entry).await?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }
}
