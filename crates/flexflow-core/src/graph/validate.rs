//! Edge creation rules.

use flexflow_types::error::EdgeValidationError;
use flexflow_types::graph::Node;
use flexflow_types::id::WorkflowId;

use super::index::GraphIndex;

/// Check that `from -> to` may be added to `workflow_id`.
///
/// `index` must be built from the workflow's current edges. Rules, in the
/// order they are checked:
/// 1. both endpoints belong to `workflow_id`
/// 2. `from` is not a terminal node
/// 3. `from` and `to` differ
/// 4. the edge does not already exist
/// 5. the edge does not close a cycle
pub fn validate_edge(
    workflow_id: &WorkflowId,
    from: &Node,
    to: &Node,
    index: &GraphIndex,
) -> Result<(), EdgeValidationError> {
    if from.workflow_id != *workflow_id || to.workflow_id != *workflow_id {
        return Err(EdgeValidationError::CrossWorkflow);
    }
    if from.is_terminal {
        return Err(EdgeValidationError::FromTerminal(from.id));
    }
    if from.id == to.id {
        return Err(EdgeValidationError::SelfLoop(from.id));
    }
    if index.contains_edge(&from.id, &to.id) {
        return Err(EdgeValidationError::Duplicate {
            from: from.id,
            to: to.id,
        });
    }
    if index.would_create_cycle(&from.id, &to.id) {
        return Err(EdgeValidationError::Cycle {
            from: from.id,
            to: to.id,
        });
    }
    Ok(())
}
