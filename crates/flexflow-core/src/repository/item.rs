//! Item repository trait definition.
//!
//! Items and their placements are only ever written in whole units: an item
//! together with its initial placements, or one routing transition. Both
//! must be applied atomically by implementations.

use flexflow_types::error::RepositoryError;
use flexflow_types::id::{ItemId, WorkflowId};
use flexflow_types::item::{Item, Placement};

use crate::routing::machine::Transition;

/// Repository trait for items and placements.
pub trait ItemRepository: Send + Sync {
    /// Insert an item and its initial placements in one transaction.
    ///
    /// Either the item and every placement exist afterwards, or none does.
    fn create_item(
        &self,
        item: &Item,
        placements: &[Placement],
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get an item by id.
    fn get_item(
        &self,
        id: &ItemId,
    ) -> impl std::future::Future<Output = Result<Option<Item>, RepositoryError>> + Send;

    /// List the items submitted to a workflow, oldest first.
    fn list_items(
        &self,
        workflow_id: &WorkflowId,
    ) -> impl std::future::Future<Output = Result<Vec<Item>, RepositoryError>> + Send;

    /// List every placement of an item (any status), oldest first.
    fn list_placements(
        &self,
        item_id: &ItemId,
    ) -> impl std::future::Future<Output = Result<Vec<Placement>, RepositoryError>> + Send;

    /// Apply one routing transition in a single transaction.
    ///
    /// - marks the decided placement, which must still be `Pending`
    /// - inserts the spawned placements
    /// - when the branch reached an end, marks every other placement of the
    ///   item that is still `Pending` at commit time, not only the planned
    ///   `collapsed` list
    /// - appends the history entry to the item's ledger, in the same
    ///   transaction
    ///
    /// Returns `Conflict` (and applies nothing) if the decided placement is
    /// no longer pending.
    fn commit_transition(
        &self,
        transition: &Transition,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
