//! Sampling-based global path planners over 2D occupancy grids: RRT, RRT*,
//! RRT-Connect, Informed RRT*, and Quick-Informed RRT*, sharing one grid
//! representation, one tree/arena, and one steering routine.

pub mod config;
pub mod error;
pub mod grid;
pub mod node;
pub mod planner;
pub mod sampling;
pub mod steering;

pub use config::{PlannerConfig, PlannerVariant};
pub use error::PlanError;
pub use grid::Grid;
pub use node::{Node, Tree};
pub use planner::{PlanOutcome, Planner};
