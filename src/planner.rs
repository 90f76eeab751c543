//! The planner engine: one struct carrying a variant tag, dispatching to
//! per-variant grow loops built from the shared primitives in
//! [`crate::grid`], [`crate::node`], [`crate::sampling`], and
//! [`crate::steering`] (§9, "Polymorphism across variants").

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info_span, trace};

use crate::config::{PlannerConfig, PlannerVariant};
use crate::error::PlanError;
use crate::grid::{dist, Grid};
use crate::node::{Node, Tree};
use crate::sampling::{self, DiskSampling};
use crate::steering::steer;

/// A path waypoint in world coordinates.
pub type Waypoint = (f64, f64);

/// Geometric decay applied to `step_extend_d` on every improvement of
/// `c_best` in Quick-Informed RRT* (§4.8, "Adaptive step"). The source
/// does not pin down a formula; this crate picks a 10% geometric decay
/// floored at one cell (see DESIGN.md).
const ADAPTIVE_STEP_DECAY: f64 = 0.9;
const ADAPTIVE_STEP_FLOOR: f64 = 1.0;

/// How many grid cells a single `steer`/`extend` call may probe before
/// giving up on an informed or prior-set draw that keeps landing off the
/// grid.
const SAMPLE_RETRY_BUDGET: usize = 20;

/// The result of a successful [`Planner::plan`] call.
#[derive(Clone, Debug)]
pub struct PlanOutcome {
    pub path: Vec<Waypoint>,
    pub expansion: Vec<Node>,
    pub cost: f64,
}

enum ExtendStatus {
    Advanced,
    Reached,
}

/// A configured planner bound to a single grid snapshot.
pub struct Planner {
    config: PlannerConfig,
    grid: Grid,
}

impl Planner {
    /// Builds a planner over `grid`, validating `config` and applying the
    /// one-shot `outline_map` border injection if requested.
    pub fn new(mut grid: Grid, config: PlannerConfig) -> Result<Self, PlanError> {
        config.validate()?;
        if config.outline_map {
            grid.outline();
        }
        Ok(Self { config, grid })
    }

    /// Re-validates and swaps in a new configuration between `plan` calls.
    pub fn configure(&mut self, config: PlannerConfig) -> Result<(), PlanError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Mutates `obstacle_factor` without touching any other tunable.
    pub fn set_factor(&mut self, factor: f64) {
        self.config.obstacle_factor = factor.clamp(0.0, 1.0);
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn cost_grid(&self) -> &Grid {
        &self.grid
    }

    pub fn world_to_map(&self, wx: f64, wy: f64) -> Option<(usize, usize)> {
        self.grid.world_to_map(wx, wy)
    }

    pub fn map_to_world(&self, x: usize, y: usize) -> Waypoint {
        self.grid.map_to_world(x, y)
    }

    pub fn grid_to_index(&self, x: usize, y: usize) -> usize {
        self.grid.grid_to_index(x, y)
    }

    pub fn index_to_grid(&self, id: usize) -> (usize, usize) {
        self.grid.index_to_grid(id)
    }

    /// Runs the configured variant from `start_world` to `goal_world`
    /// (§4, §6). The whole call is a single state-machine run: `Idle →
    /// Initialized → Growing → {Found, Exhausted} → Extracted | NoPath`.
    /// Never cancellable; equivalent to [`Planner::plan_cancellable`] with a
    /// check that never trips.
    pub fn plan(&self, start_world: Waypoint, goal_world: Waypoint) -> Result<PlanOutcome, PlanError> {
        self.plan_cancellable(start_world, goal_world, &|| false)
    }

    /// As [`Planner::plan`], but `cancelled` is polled at each grow loop's
    /// iteration boundary (§5, §7); a `true` reading aborts the run with
    /// `PlanError::Cancelled`, carrying whatever expansion trace had
    /// accumulated so far.
    pub fn plan_cancellable(
        &self,
        start_world: Waypoint,
        goal_world: Waypoint,
        cancelled: &dyn Fn() -> bool,
    ) -> Result<PlanOutcome, PlanError> {
        let span = info_span!(
            "plan",
            planner = ?self.config.planner_name,
            sample_points = self.config.sample_points,
        );
        let _enter = span.enter();

        let start_cell = self
            .grid
            .world_to_map(start_world.0, start_world.1)
            .ok_or(PlanError::StartOffGrid)?;
        let goal_cell = self
            .grid
            .world_to_map(goal_world.0, goal_world.1)
            .ok_or(PlanError::GoalOffGrid)?;
        if self.grid.is_lethal(goal_cell.0, goal_cell.1) {
            return Err(PlanError::GoalLethal);
        }

        let mut rng = StdRng::seed_from_u64(self.config.seed);

        match self.config.planner_name {
            PlannerVariant::Rrt => self.run_rrt(start_cell, goal_cell, goal_world, &mut rng, false, cancelled),
            PlannerVariant::RrtStar => self.run_rrt(start_cell, goal_cell, goal_world, &mut rng, true, cancelled),
            PlannerVariant::InformedRrt => {
                self.run_informed(start_cell, goal_cell, goal_world, &mut rng, false, cancelled)
            }
            PlannerVariant::QuickInformedRrt => {
                self.run_informed(start_cell, goal_cell, goal_world, &mut rng, true, cancelled)
            }
            PlannerVariant::RrtConnect => {
                self.run_rrt_connect(start_cell, goal_cell, goal_world, &mut rng, cancelled)
            }
        }
    }

    /// Goal-connection distance threshold in cell units: the larger of
    /// the active step size and the world-frame `default_tolerance`
    /// converted to cells.
    fn goal_threshold(&self, step: f64) -> f64 {
        step.max(self.config.default_tolerance / self.grid.resolution())
    }

    // ---- RRT / RRT* -----------------------------------------------------

    fn run_rrt(
        &self,
        start: (usize, usize),
        goal: (usize, usize),
        goal_world: Waypoint,
        rng: &mut StdRng,
        optimize: bool,
        cancelled: &dyn Fn() -> bool,
    ) -> Result<PlanOutcome, PlanError> {
        let start_id = self.grid.grid_to_index(start.0, start.1);
        let mut tree = Tree::new(Node::root(start.0, start.1, start_id));
        let goal_point = (goal.0 as f64, goal.1 as f64);
        let threshold = self.goal_threshold(self.config.sample_max_d);

        let mut best_goal: Option<(usize, f64)> = None;

        for iter in 0..self.config.sample_points {
            if cancelled() {
                return Err(PlanError::Cancelled {
                    expansion: tree.expansion_trace(),
                });
            }

            let sample = sampling::uniform_grid_sample(rng, self.grid.nx(), self.grid.ny());
            let Some(nearest_id) = tree.nearest(sample) else {
                continue;
            };
            let Some(mut new_node) = steer(
                &self.grid,
                &tree,
                nearest_id,
                sample,
                self.config.sample_max_d,
                self.config.obstacle_factor,
            ) else {
                continue;
            };

            if optimize {
                let neighborhood = tree.within_radius(new_node.point(), self.config.optimization_r);
                self.choose_parent(&tree, &mut new_node, &neighborhood);
                self.rewire_serial(&mut tree, &new_node, &neighborhood);
            }
            tree.insert(new_node);
            trace!(iter, id = new_node.id, "node accepted");

            let d_goal = dist(new_node.point(), goal_point);
            if d_goal <= threshold && self.grid.line_of_sight((new_node.x, new_node.y), goal) {
                let cost = new_node.g + self.grid.edge_cost((new_node.x, new_node.y), goal, self.config.obstacle_factor);
                if best_goal.map_or(true, |(_, best_cost)| cost < best_cost) {
                    best_goal = Some((new_node.id, cost));
                    debug!(iter, cost, "goal connection improved");
                }
                if !optimize {
                    break;
                }
            }
        }

        self.finish(tree, best_goal, goal_world)
    }

    // ---- Informed RRT* / Quick-Informed RRT* -----------------------------

    fn run_informed(
        &self,
        start: (usize, usize),
        goal: (usize, usize),
        goal_world: Waypoint,
        rng: &mut StdRng,
        quick: bool,
        cancelled: &dyn Fn() -> bool,
    ) -> Result<PlanOutcome, PlanError> {
        let start_id = self.grid.grid_to_index(start.0, start.1);
        let mut tree = Tree::new(Node::root(start.0, start.1, start_id));
        let start_point = (start.0 as f64, start.1 as f64);
        let goal_point = (goal.0 as f64, goal.1 as f64);

        let mut best_goal: Option<(usize, f64)> = None;
        let mut best_path_cells: Vec<Waypoint> = Vec::new();
        let mut step = if quick {
            self.config.step_extend_d
        } else {
            self.config.sample_max_d
        };
        let disk = if quick {
            DiskSampling::TDistributed {
                freedom: self.config.t_distr_freedom,
            }
        } else {
            DiskSampling::Uniform
        };
        let prior_probability = if quick { self.prior_sampling_probability() } else { 0.0 };

        for iter in 0..self.config.sample_points {
            if cancelled() {
                return Err(PlanError::Cancelled {
                    expansion: tree.expansion_trace(),
                });
            }

            let c_best = best_goal.map_or(f64::INFINITY, |(_, c)| c);

            let sample = if quick && !best_path_cells.is_empty() && rng.gen_bool(prior_probability) {
                sampling::prior_set_sample(
                    rng,
                    &best_path_cells,
                    self.config.prior_sample_set_r,
                    self.grid.nx(),
                    self.grid.ny(),
                    SAMPLE_RETRY_BUDGET,
                )
            } else {
                sampling::ellipse_sample(
                    rng,
                    start_point,
                    goal_point,
                    c_best,
                    disk,
                    self.grid.nx(),
                    self.grid.ny(),
                    SAMPLE_RETRY_BUDGET,
                )
            }
            .unwrap_or_else(|| sampling::uniform_grid_sample(rng, self.grid.nx(), self.grid.ny()));

            let Some(nearest_id) = tree.nearest(sample) else {
                continue;
            };
            let Some(mut new_node) = steer(&self.grid, &tree, nearest_id, sample, step, self.config.obstacle_factor) else {
                continue;
            };

            let neighborhood = tree.within_radius(new_node.point(), self.config.optimization_r);
            self.choose_parent(&tree, &mut new_node, &neighborhood);
            if quick {
                self.rewire_parallel(&mut tree, &new_node, &neighborhood, self.config.rewire_threads_num);
            } else {
                self.rewire_serial(&mut tree, &new_node, &neighborhood);
            }
            tree.insert(new_node);
            trace!(iter, id = new_node.id, "node accepted");

            let threshold = self.goal_threshold(step);
            let d_goal = dist(new_node.point(), goal_point);
            if d_goal <= threshold && self.grid.line_of_sight((new_node.x, new_node.y), goal) {
                let cost = new_node.g + self.grid.edge_cost((new_node.x, new_node.y), goal, self.config.obstacle_factor);
                if best_goal.map_or(true, |(_, best_cost)| cost < best_cost) {
                    best_goal = Some((new_node.id, cost));
                    debug!(iter, cost, "goal connection improved");
                    best_path_cells = tree
                        .path_to_root(new_node.id)
                        .into_iter()
                        .map(|id| {
                            let (x, y) = self.grid.index_to_grid(id);
                            (x as f64, y as f64)
                        })
                        .collect();
                    if quick {
                        step = (step * ADAPTIVE_STEP_DECAY).max(ADAPTIVE_STEP_FLOOR);
                        debug!(new_step = step, "adaptive step decayed");
                    }
                }
            }
        }

        self.finish(tree, best_goal, goal_world)
    }

    /// Probability of drawing from the prior set rather than the informed
    /// ellipse (§4.8). The spec asks for a probability "proportional to"
    /// `prior_sample_set_r` without pinning a formula; this crate scales
    /// the radius against the grid diagonal and caps it so the ellipse is
    /// always sampled some of the time (see DESIGN.md).
    fn prior_sampling_probability(&self) -> f64 {
        let diag = dist((0.0, 0.0), (self.grid.nx() as f64, self.grid.ny() as f64));
        (self.config.prior_sample_set_r / (self.config.prior_sample_set_r + diag)).clamp(0.0, 0.9)
    }

    // ---- shared RRT* choose-parent / rewire ------------------------------

    fn choose_parent(&self, tree: &Tree, new_node: &mut Node, neighborhood: &[usize]) {
        let mut best_parent = new_node.pid.expect("steer always sets a parent");
        let mut best_g = new_node.g;
        for &nb_id in neighborhood {
            if nb_id == new_node.id {
                continue;
            }
            let nb = tree.get(nb_id).expect("neighborhood id must exist");
            if !self.grid.line_of_sight((nb.x, nb.y), (new_node.x, new_node.y)) {
                continue;
            }
            let candidate_g = nb.g + self.grid.edge_cost((nb.x, nb.y), (new_node.x, new_node.y), self.config.obstacle_factor);
            if candidate_g < best_g || (candidate_g == best_g && nb_id < best_parent) {
                best_g = candidate_g;
                best_parent = nb_id;
            }
        }
        new_node.pid = Some(best_parent);
        new_node.g = best_g;
    }

    fn rewire_serial(&self, tree: &mut Tree, new_node: &Node, neighborhood: &[usize]) {
        for &nb_id in neighborhood {
            if nb_id == new_node.id || Some(nb_id) == new_node.pid {
                continue;
            }
            let nb = *tree.get(nb_id).expect("neighborhood id must exist");
            if !self.grid.line_of_sight((new_node.x, new_node.y), (nb.x, nb.y)) {
                continue;
            }
            let candidate_g = new_node.g + self.grid.edge_cost((new_node.x, new_node.y), (nb.x, nb.y), self.config.obstacle_factor);
            if candidate_g < nb.g {
                tree.rewire(nb_id, new_node.id, candidate_g);
            }
        }
    }

    /// Parallel rewire (§4.8, §5): each of `threads` shards independently
    /// proposes `(neighbor_id, candidate_g)` pairs over its slice of the
    /// neighborhood, then a single serial commit pass applies the
    /// minimum-cost proposal per neighbor, guarding against a parent
    /// pointer ever moving to a stale/looser cost.
    fn rewire_parallel(&self, tree: &mut Tree, new_node: &Node, neighborhood: &[usize], threads: usize) {
        let threads = threads.max(1);
        let proposals: Vec<(usize, f64)> = (0..threads)
            .into_par_iter()
            .flat_map(|shard| {
                neighborhood
                    .iter()
                    .enumerate()
                    .filter(move |(i, _)| i % threads == shard)
                    .filter_map(|(_, &nb_id)| {
                        if nb_id == new_node.id || Some(nb_id) == new_node.pid {
                            return None;
                        }
                        let nb = tree.get(nb_id)?;
                        if !self.grid.line_of_sight((new_node.x, new_node.y), (nb.x, nb.y)) {
                            return None;
                        }
                        let candidate_g = new_node.g
                            + self.grid.edge_cost((new_node.x, new_node.y), (nb.x, nb.y), self.config.obstacle_factor);
                        (candidate_g < nb.g).then_some((nb_id, candidate_g))
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        let mut commit: HashMap<usize, f64> = HashMap::new();
        for (nb_id, candidate_g) in proposals {
            commit
                .entry(nb_id)
                .and_modify(|g| {
                    if candidate_g < *g {
                        *g = candidate_g;
                    }
                })
                .or_insert(candidate_g);
        }
        for (nb_id, g) in commit {
            if let Some(current) = tree.get(nb_id) {
                if g < current.g {
                    tree.rewire(nb_id, new_node.id, g);
                }
            }
        }
    }

    // ---- RRT-Connect ------------------------------------------------------

    /// Grows both trees of RRT-Connect. `budget` caps the *total* number of
    /// nodes inserted across `tree_a` and `tree_b` combined (one fewer than
    /// `sample_points`, since the two roots already account for one node
    /// each against the single-tree variants' "root + sample_points"
    /// ceiling) — without this, the inner connect sub-loop below can insert
    /// up to `grid_diagonal / sample_max_d` nodes in a single outer
    /// iteration, which would let the combined expansion trace exceed
    /// `sample_points + 1` (§8, invariant 3).
    fn run_rrt_connect(
        &self,
        start: (usize, usize),
        goal: (usize, usize),
        goal_world: Waypoint,
        rng: &mut StdRng,
        cancelled: &dyn Fn() -> bool,
    ) -> Result<PlanOutcome, PlanError> {
        let start_id = self.grid.grid_to_index(start.0, start.1);
        let goal_id = self.grid.grid_to_index(goal.0, goal.1);
        let mut tree_a = Tree::new(Node::root(start.0, start.1, start_id));
        let mut tree_b = Tree::new(Node::root(goal.0, goal.1, goal_id));
        let mut a_is_start = true;
        let mut budget = self.config.sample_points.saturating_sub(1);
        let mut iter = 0usize;

        while budget > 0 {
            if cancelled() {
                let mut expansion = tree_a.expansion_trace();
                expansion.extend(tree_b.expansion_trace());
                return Err(PlanError::Cancelled { expansion });
            }
            iter += 1;

            let sample = sampling::uniform_grid_sample(rng, self.grid.nx(), self.grid.ny());

            if let Some((_, new_id_a)) = self.extend(&mut tree_a, sample) {
                budget -= 1;
                let target = tree_a.get(new_id_a).expect("just inserted").point();

                let mut reached_id_b = None;
                while budget > 0 {
                    match self.extend(&mut tree_b, target) {
                        Some((ExtendStatus::Reached, id_b)) => {
                            budget -= 1;
                            reached_id_b = Some(id_b);
                            break;
                        }
                        Some((ExtendStatus::Advanced, _)) => {
                            budget -= 1;
                            continue;
                        }
                        None => break,
                    }
                }

                if let Some(id_b) = reached_id_b {
                    let (start_tree, start_leaf, goal_tree, goal_leaf) = if a_is_start {
                        (&tree_a, new_id_a, &tree_b, id_b)
                    } else {
                        (&tree_b, id_b, &tree_a, new_id_a)
                    };

                    let start_chain = start_tree.path_to_root(start_leaf);
                    let mut goal_chain = goal_tree.path_to_root(goal_leaf);
                    goal_chain.reverse();

                    let mut ids = start_chain;
                    ids.extend(goal_chain.into_iter().skip(1));

                    let mut cost = 0.0;
                    for pair in ids.windows(2) {
                        let a = self.grid.index_to_grid(pair[0]);
                        let b = self.grid.index_to_grid(pair[1]);
                        cost += self.grid.edge_cost(a, b, self.config.obstacle_factor);
                    }

                    let mut path: Vec<Waypoint> = ids
                        .iter()
                        .map(|&id| {
                            let (x, y) = self.grid.index_to_grid(id);
                            self.grid.map_to_world(x, y)
                        })
                        .collect();
                    if let Some(last) = path.last_mut() {
                        *last = goal_world;
                    }

                    let mut expansion = tree_a.expansion_trace();
                    expansion.extend(tree_b.expansion_trace());
                    debug!(iter, cost, "rrt-connect solution found");
                    return Ok(PlanOutcome { path, expansion, cost });
                }
            }

            std::mem::swap(&mut tree_a, &mut tree_b);
            a_is_start = !a_is_start;
        }

        let mut expansion = tree_a.expansion_trace();
        expansion.extend(tree_b.expansion_trace());
        Err(PlanError::NoPathFound { expansion })
    }

    fn extend(&self, tree: &mut Tree, target: Waypoint) -> Option<(ExtendStatus, usize)> {
        let nearest_id = tree.nearest(target)?;
        let new_node = steer(
            &self.grid,
            tree,
            nearest_id,
            target,
            self.config.sample_max_d,
            self.config.obstacle_factor,
        )?;
        let reached = dist(new_node.point(), target) < 1e-9;
        let id = new_node.id;
        tree.insert(new_node);
        Some((
            if reached {
                ExtendStatus::Reached
            } else {
                ExtendStatus::Advanced
            },
            id,
        ))
    }

    // ---- path extraction (§4.9) -------------------------------------------

    fn finish(&self, tree: Tree, best_goal: Option<(usize, f64)>, goal_world: Waypoint) -> Result<PlanOutcome, PlanError> {
        match best_goal {
            Some((connect_id, cost)) => {
                let chain = tree.path_to_root(connect_id);
                let mut path: Vec<Waypoint> = chain
                    .iter()
                    .map(|&id| {
                        let (x, y) = self.grid.index_to_grid(id);
                        self.grid.map_to_world(x, y)
                    })
                    .collect();
                if let Some(last) = path.last_mut() {
                    *last = goal_world;
                }
                Ok(PlanOutcome {
                    path,
                    expansion: tree.expansion_trace(),
                    cost,
                })
            }
            None => Err(PlanError::NoPathFound {
                expansion: tree.expansion_trace(),
            }),
        }
    }
}
