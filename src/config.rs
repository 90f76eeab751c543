//! The value-typed configuration surface consumed by [`crate::planner::Planner`] (§6).

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// Selects which member of the RRT family a [`crate::planner::Planner`] runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannerVariant {
    Rrt,
    RrtStar,
    RrtConnect,
    InformedRrt,
    QuickInformedRrt,
}

impl PlannerVariant {
    /// Whether this variant rewires its neighborhood (RRT* and its
    /// descendants) versus accepting every steered sample as-is.
    pub fn optimizes(self) -> bool {
        !matches!(self, PlannerVariant::Rrt | PlannerVariant::RrtConnect)
    }
}

impl FromStr for PlannerVariant {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rrt" => Ok(PlannerVariant::Rrt),
            "rrt_star" => Ok(PlannerVariant::RrtStar),
            "rrt_connect" => Ok(PlannerVariant::RrtConnect),
            "informed_rrt" => Ok(PlannerVariant::InformedRrt),
            "quick_informed_rrt" => Ok(PlannerVariant::QuickInformedRrt),
            other => Err(PlanError::UnknownPlanner(other.to_string())),
        }
    }
}

/// All tunables recognized by `configure` (§6), as a plain value with no
/// process-global state. Defaults match the spec exactly.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub planner_name: PlannerVariant,
    pub sample_points: usize,
    pub sample_max_d: f64,
    pub optimization_r: f64,
    pub obstacle_factor: f64,
    pub outline_map: bool,
    pub default_tolerance: f64,

    // Quick-Informed RRT* only.
    pub prior_sample_set_r: f64,
    pub rewire_threads_num: usize,
    pub step_extend_d: f64,
    pub t_distr_freedom: f64,

    /// Seed for the planner's private RNG, not part of the spec's option
    /// table but required to satisfy the determinism invariant (§8.4)
    /// without resorting to process-global randomness.
    pub seed: u64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            planner_name: PlannerVariant::Rrt,
            sample_points: 500,
            sample_max_d: 5.0,
            optimization_r: 10.0,
            obstacle_factor: 0.5,
            outline_map: false,
            default_tolerance: 0.0,
            prior_sample_set_r: 10.0,
            rewire_threads_num: 2,
            step_extend_d: 5.0,
            t_distr_freedom: 1.0,
            seed: 0,
        }
    }
}

impl PlannerConfig {
    /// Rejects the non-positive/negative values the spec calls out as
    /// configuration errors (§7). `planner_name` is validated separately
    /// by [`PlannerVariant::from_str`] when the host configures by string.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.sample_points == 0 {
            return Err(PlanError::InvalidConfig {
                reason: "sample_points must be positive".into(),
            });
        }
        if self.sample_max_d <= 0.0 {
            return Err(PlanError::InvalidConfig {
                reason: "sample_max_d must be positive".into(),
            });
        }
        if self.optimization_r < 0.0 {
            return Err(PlanError::InvalidConfig {
                reason: "optimization_r must not be negative".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.obstacle_factor) {
            return Err(PlanError::InvalidConfig {
                reason: "obstacle_factor must be in [0, 1]".into(),
            });
        }
        if self.default_tolerance < 0.0 {
            return Err(PlanError::InvalidConfig {
                reason: "default_tolerance must not be negative".into(),
            });
        }
        if self.planner_name == PlannerVariant::QuickInformedRrt {
            if self.prior_sample_set_r < 0.0 {
                return Err(PlanError::InvalidConfig {
                    reason: "prior_sample_set_r must not be negative".into(),
                });
            }
            if self.rewire_threads_num == 0 {
                return Err(PlanError::InvalidConfig {
                    reason: "rewire_threads_num must be positive".into(),
                });
            }
            if self.step_extend_d <= 0.0 {
                return Err(PlanError::InvalidConfig {
                    reason: "step_extend_d must be positive".into(),
                });
            }
            if self.t_distr_freedom <= 0.0 {
                return Err(PlanError::InvalidConfig {
                    reason: "t_distr_freedom must be positive".into(),
                });
            }
        }
        Ok(())
    }
}
