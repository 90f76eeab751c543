//! Typed errors surfaced across the planner's external interface (§7).

use crate::node::Node;

/// Every failure mode the planner can surface to its host.
///
/// `NoPathFound` and `Cancelled` carry the expansion trace accumulated up
/// to that point so a caller that matches on the error can still render
/// what the tree explored, matching the spec's "whatever expansion trace
/// accumulated" terminal behaviour.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("unknown planner variant: {0}")]
    UnknownPlanner(String),

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("start cell is off the grid")]
    StartOffGrid,

    #[error("goal cell is off the grid")]
    GoalOffGrid,

    #[error("goal cell is lethal")]
    GoalLethal,

    #[error("no path found after exhausting the sample budget")]
    NoPathFound { expansion: Vec<Node> },

    #[error("planning cancelled")]
    Cancelled { expansion: Vec<Node> },
}

impl PlanError {
    /// The expansion trace carried by `NoPathFound`/`Cancelled`, if any.
    pub fn expansion(&self) -> Option<&[Node]> {
        match self {
            PlanError::NoPathFound { expansion } | PlanError::Cancelled { expansion } => {
                Some(expansion)
            }
            _ => None,
        }
    }
}
