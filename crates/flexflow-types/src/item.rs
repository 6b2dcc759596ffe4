//! Routed items and their placements.
//!
//! An item ("message") is submitted once and then travels through the
//! workflow graph as a set of placements, one per active branch. Each
//! placement transitions exactly once, from `Pending` to `Approved` or
//! `Rejected`, and is never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::error::RoutingError;
use crate::id::{ItemId, NodeId, PlacementId, UserId, WorkflowId};

/// A submitted unit of work routed through a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub workflow_id: WorkflowId,
    pub issuer: UserId,
    /// Opaque content. Free text is stored as a JSON string.
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Item {
    pub fn new(workflow_id: WorkflowId, issuer: UserId, payload: serde_json::Value) -> Self {
        Self {
            id: ItemId::new(),
            workflow_id,
            issuer,
            payload,
            created_at: Utc::now(),
        }
    }
}

/// Status of a single placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementStatus {
    Pending,
    Approved,
    Rejected,
}

impl PlacementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementStatus::Pending => "pending",
            PlacementStatus::Approved => "approved",
            PlacementStatus::Rejected => "rejected",
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, PlacementStatus::Pending)
    }
}

impl fmt::Display for PlacementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlacementStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(PlacementStatus::Pending),
            "approved" => Ok(PlacementStatus::Approved),
            "rejected" => Ok(PlacementStatus::Rejected),
            other => Err(format!("unknown placement status: '{other}'")),
        }
    }
}

/// A reviewer's verdict on one placement.
///
/// Closed on purpose: every routing branch matches on both variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approved => "approved",
            Decision::Rejected => "rejected",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = RoutingError;

    /// Case-insensitive: `"approved"`, `"Approved"` and `"APPROVED"` all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "approved" => Ok(Decision::Approved),
            "rejected" => Ok(Decision::Rejected),
            _ => Err(RoutingError::InvalidStatus(s.to_string())),
        }
    }
}

impl From<Decision> for PlacementStatus {
    fn from(d: Decision) -> Self {
        match d {
            Decision::Approved => PlacementStatus::Approved,
            Decision::Rejected => PlacementStatus::Rejected,
        }
    }
}

impl TryFrom<PlacementStatus> for Decision {
    type Error = RoutingError;

    fn try_from(status: PlacementStatus) -> Result<Self, Self::Error> {
        match status {
            PlacementStatus::Approved => Ok(Decision::Approved),
            PlacementStatus::Rejected => Ok(Decision::Rejected),
            PlacementStatus::Pending => Err(RoutingError::InvalidStatus(status.to_string())),
        }
    }
}

/// One position of an item at one node ("message holder").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub id: PlacementId,
    pub item_id: ItemId,
    pub node_id: NodeId,
    pub status: PlacementStatus,
    pub created_at: DateTime<Utc>,
    /// When the placement left `Pending`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
    /// The placement whose terminal decision force-resolved this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapsed_by: Option<PlacementId>,
}

impl Placement {
    /// A fresh `Pending` placement of `item_id` at `node_id`.
    pub fn pending(item_id: ItemId, node_id: NodeId) -> Self {
        Self {
            id: PlacementId::new(),
            item_id,
            node_id,
            status: PlacementStatus::Pending,
            created_at: Utc::now(),
            decided_at: None,
            collapsed_by: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status.is_pending()
    }
}

/// Request payload for submitting an item into a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitItemRequest {
    pub payload: serde_json::Value,
}

/// Request payload for deciding on the placement of an item at a node.
///
/// `status` stays a string here so that unknown values surface as
/// `InvalidStatus` rather than a generic deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub node: NodeId,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_parses_case_insensitively() {
        assert_eq!("approved".parse::<Decision>().unwrap(), Decision::Approved);
        assert_eq!("REJECTED".parse::<Decision>().unwrap(), Decision::Rejected);
        let padded: Decision = " Approved ".parse().unwrap();
        assert_eq!(padded, Decision::Approved);
    }

    #[test]
    fn test_decision_rejects_pending_and_garbage() {
        assert!(matches!(
            "pending".parse::<Decision>(),
            Err(RoutingError::InvalidStatus(_))
        ));
        assert!(matches!(
            "maybe".parse::<Decision>(),
            Err(RoutingError::InvalidStatus(s)) if s == "maybe"
        ));
    }

    #[test]
    fn test_decision_from_placement_status() {
        assert_eq!(
            Decision::try_from(PlacementStatus::Rejected).unwrap(),
            Decision::Rejected
        );
        assert!(Decision::try_from(PlacementStatus::Pending).is_err());
        assert_eq!(
            PlacementStatus::from(Decision::Approved),
            PlacementStatus::Approved
        );
    }

    #[test]
    fn test_placement_status_serde() {
        let json = serde_json::to_string(&PlacementStatus::Approved).unwrap();
        assert_eq!(json, "\"approved\"");
        let parsed: PlacementStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(parsed, PlacementStatus::Pending);
    }

    #[test]
    fn test_new_placement_is_pending() {
        let p = Placement::pending(ItemId::new(), NodeId::new());
        assert!(p.is_pending());
        assert!(p.decided_at.is_none());
        assert!(p.collapsed_by.is_none());
    }
}
