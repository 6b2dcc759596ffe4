//! Decision history ledger types.
//!
//! Each item owns one append-only ledger, created lazily on its first
//! decision. Entries carry a snapshot of the node as it was when the
//! decision was made, so later edits to the node do not rewrite history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::graph::Node;
use crate::id::{NodeId, UserId};
use crate::item::Decision;

/// Frozen copy of the node a decision was made at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub title: String,
    pub description: String,
    pub is_terminal: bool,
}

impl From<&Node> for NodeSnapshot {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id,
            title: node.title.clone(),
            description: node.description.clone(),
            is_terminal: node.is_terminal,
        }
    }
}

/// One record in an item's history ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// 1-based position in the ledger. Assigned by the store on append;
    /// zero until then.
    #[serde(default)]
    pub seq: u32,
    pub decided_by: UserId,
    pub decided_at: DateTime<Utc>,
    pub decision: Decision,
    pub node: NodeSnapshot,
}

impl HistoryEntry {
    pub fn new(decided_by: UserId, decision: Decision, node: &Node) -> Self {
        Self {
            seq: 0,
            decided_by,
            decided_at: Utc::now(),
            decision,
            node: NodeSnapshot::from(node),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::WorkflowId;

    #[test]
    fn test_entry_snapshots_node() {
        let node = Node {
            id: NodeId::new(),
            workflow_id: WorkflowId::new(),
            title: "Finance".to_string(),
            description: "Budget sign-off".to_string(),
            is_terminal: true,
        };
        let entry = HistoryEntry::new(UserId::new("alice"), Decision::Approved, &node);
        assert_eq!(entry.seq, 0);
        assert_eq!(entry.node.id, node.id);
        assert_eq!(entry.node.title, "Finance");
        assert!(entry.node.is_terminal);
    }

    #[test]
    fn test_entry_json_shape() {
        let node = Node {
            id: NodeId::new(),
            workflow_id: WorkflowId::new(),
            title: "Legal".to_string(),
            description: String::new(),
            is_terminal: false,
        };
        let entry = HistoryEntry::new(UserId::new("bob"), Decision::Rejected, &node);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["decided_by"], "bob");
        assert_eq!(json["decision"], "rejected");
        assert_eq!(json["node"]["title"], "Legal");
    }
}
