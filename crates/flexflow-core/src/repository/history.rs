//! History ledger trait definition.

use flexflow_types::error::RepositoryError;
use flexflow_types::history::HistoryEntry;
use flexflow_types::id::ItemId;

/// Append-only decision ledger, one ordered sequence per item.
///
/// The ledger for an item is created on its first append. Entries are
/// never edited or removed.
///
/// Routing decisions do not go through [`append`](Self::append): their
/// entry is written by `ItemRepository::commit_transition` in the same
/// transaction as the placement changes. `append` writes a standalone entry
/// in its own transaction.
pub trait HistoryRepository: Send + Sync {
    /// Append an entry, returning it with its assigned sequence number.
    fn append(
        &self,
        item_id: &ItemId,
        entry: &HistoryEntry,
    ) -> impl std::future::Future<Output = Result<HistoryEntry, RepositoryError>> + Send;

    /// All entries for an item in insertion order. Empty if none yet.
    fn list(
        &self,
        item_id: &ItemId,
    ) -> impl std::future::Future<Output = Result<Vec<HistoryEntry>, RepositoryError>> + Send;
}
