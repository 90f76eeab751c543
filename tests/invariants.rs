//! Property-based checks of the universal invariants (§8, items 1-4) plus
//! the informed-sampling-correctness check (item 6).

use gridrrt::grid::dist;
use gridrrt::{Grid, PlannerConfig, PlannerVariant, Planner};
use proptest::prelude::*;

fn empty_grid(nx: usize, ny: usize) -> Grid {
    Grid::new(nx, ny, 1.0, (0.0, 0.0), vec![0u8; nx * ny])
}

fn chain_reaches_root(expansion: &[gridrrt::Node]) -> bool {
    let by_id: std::collections::HashMap<usize, &gridrrt::Node> =
        expansion.iter().map(|n| (n.id, n)).collect();
    for node in expansion {
        let mut current = node;
        let mut steps = 0;
        loop {
            match current.pid {
                None => break,
                Some(parent_id) => match by_id.get(&parent_id) {
                    Some(parent) => {
                        current = parent;
                        steps += 1;
                        if steps > expansion.len() {
                            return false;
                        }
                    }
                    None => return false,
                },
            }
        }
    }
    true
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn path_starts_near_start_ends_at_goal_and_is_continuous(
        seed in any::<u64>(),
        sample_points in 200usize..1200,
    ) {
        let grid = empty_grid(25, 25);
        let cfg = PlannerConfig { planner_name: PlannerVariant::Rrt, sample_points, seed, ..Default::default() };
        let planner = Planner::new(grid, cfg).unwrap();
        let start = (1.5, 1.5);
        let goal = (23.5, 23.5);
        if let Ok(outcome) = planner.plan(start, goal) {
            prop_assert!(dist(outcome.path[0], start) <= PlannerConfig::default().sample_max_d);
            prop_assert_eq!(*outcome.path.last().unwrap(), goal);
            for pair in outcome.path.windows(2) {
                let a = planner.world_to_map(pair[0].0, pair[0].1).unwrap();
                let b = planner.world_to_map(pair[1].0, pair[1].1).unwrap();
                prop_assert!(planner.cost_grid().line_of_sight(a, b));
            }
        }
    }

    #[test]
    fn expansion_trace_respects_budget_and_pid_chain(
        seed in any::<u64>(),
        sample_points in 50usize..800,
    ) {
        let grid = empty_grid(20, 20);
        let cfg = PlannerConfig { planner_name: PlannerVariant::RrtStar, sample_points, seed, ..Default::default() };
        let planner = Planner::new(grid, cfg).unwrap();
        let expansion = match planner.plan((1.5, 1.5), (18.5, 18.5)) {
            Ok(outcome) => outcome.expansion,
            Err(err) => err.expansion().unwrap().to_vec(),
        };
        prop_assert!(expansion.len() <= sample_points + 1);
        prop_assert!(chain_reaches_root(&expansion));
    }

    #[test]
    fn plan_is_deterministic_given_a_seed(
        seed in any::<u64>(),
        sample_points in 100usize..1000,
    ) {
        let cfg = PlannerConfig { planner_name: PlannerVariant::RrtStar, sample_points, seed, ..Default::default() };
        let a = Planner::new(empty_grid(20, 20), cfg.clone()).unwrap().plan((1.5, 1.5), (18.5, 18.5));
        let b = Planner::new(empty_grid(20, 20), cfg).unwrap().plan((1.5, 1.5), (18.5, 18.5));
        match (a, b) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(a.path, b.path);
                prop_assert_eq!(a.cost, b.cost);
            }
            (Err(_), Err(_)) => {}
            _ => prop_assert!(false, "determinism violated: one run found a path, the other didn't"),
        }
    }
}

#[test]
fn informed_sampling_stays_within_the_ellipse_once_c_best_is_finite() {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use gridrrt::sampling::{ellipse_sample, DiskSampling};

    let mut rng = StdRng::seed_from_u64(123);
    let start = (1.0, 1.0);
    let goal = (18.0, 18.0);
    let c_best = 30.0;
    for _ in 0..500 {
        if let Some(sample) = ellipse_sample(&mut rng, start, goal, c_best, DiskSampling::Uniform, 20, 20, 50) {
            let via = dist(start, sample) + dist(sample, goal);
            assert!(via <= c_best + 1e-6, "sample {sample:?} escaped the ellipse (via={via}, c_best={c_best})");
        }
    }
}

#[test]
fn c_best_decreases_monotonically_and_approaches_the_optimum() {
    let grid = empty_grid(20, 20);
    let start = (1.5, 1.5);
    let goal = (18.5, 18.5);
    let optimum = dist(start, goal);

    let mut previous = f64::INFINITY;
    for sample_points in [500usize, 1500, 4000] {
        let cfg = PlannerConfig { planner_name: PlannerVariant::RrtStar, sample_points, seed: 5, ..Default::default() };
        let outcome = Planner::new(grid.clone(), cfg).unwrap().plan(start, goal).unwrap();
        assert!(outcome.cost <= previous + 1e-9, "cost grew from {previous} to {} as the budget increased", outcome.cost);
        previous = outcome.cost;
    }
    assert!(previous / optimum < 1.05, "c_best/c* = {}", previous / optimum);
}
