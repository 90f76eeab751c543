//! Named scenarios (§8) exercising each planner variant end to end.

use gridrrt::grid::dist;
use gridrrt::{Grid, PlanError, PlannerConfig, PlannerVariant, Planner};

fn empty_grid(nx: usize, ny: usize) -> Grid {
    Grid::new(nx, ny, 1.0, (0.0, 0.0), vec![0u8; nx * ny])
}

fn config(planner_name: PlannerVariant, sample_points: usize, seed: u64) -> PlannerConfig {
    PlannerConfig {
        planner_name,
        sample_points,
        seed,
        ..Default::default()
    }
}

#[test]
fn s1_rrt_on_empty_grid() {
    let grid = empty_grid(20, 20);
    let planner = Planner::new(grid, config(PlannerVariant::Rrt, 2000, 42)).unwrap();
    let outcome = planner.plan((1.5, 1.5), (18.5, 18.5)).unwrap();
    assert!((6..=40).contains(&outcome.path.len()));
    for &(x, y) in &outcome.path {
        let (cx, cy) = planner.world_to_map(x, y).unwrap();
        assert!(!planner.cost_grid().is_lethal(cx, cy));
    }
}

#[test]
fn s2_rrt_star_respects_cost_bound() {
    let grid = empty_grid(20, 20);
    let cfg = PlannerConfig {
        optimization_r: 5.0,
        ..config(PlannerVariant::RrtStar, 2000, 42)
    };
    let planner = Planner::new(grid, cfg).unwrap();
    let outcome = planner.plan((1.5, 1.5), (18.5, 18.5)).unwrap();
    let bound = 1.2 * dist((1.0, 1.0), (18.0, 18.0));
    assert!(outcome.cost <= bound, "cost {} exceeds bound {bound}", outcome.cost);
}

fn walled_grid() -> Grid {
    let mut grid = empty_grid(20, 20);
    for y in 0..15 {
        grid.set_cost(10, y, 255);
    }
    grid
}

#[test]
fn s3_rrt_connect_routes_around_the_wall() {
    let grid = walled_grid();
    let planner = Planner::new(grid, config(PlannerVariant::RrtConnect, 4000, 7)).unwrap();
    let outcome = planner.plan((2.5, 10.5), (18.5, 10.5)).unwrap();
    assert!(outcome.path.iter().any(|&(_, y)| y > 15.0));
}

#[test]
fn s4_informed_rrt_converges_near_homotopic_optimum() {
    let grid = walled_grid();
    let cfg = config(PlannerVariant::InformedRrt, 5000, 7);
    let planner = Planner::new(grid, cfg).unwrap();
    let outcome = planner.plan((2.5, 10.5), (18.5, 10.5)).unwrap();
    // Shortest homotopic route: across to x=10 above the wall gap, then down.
    let shortest = dist((2.5, 10.5), (10.5, 15.5)) + dist((10.5, 15.5), (18.5, 10.5));
    assert!(outcome.cost <= 1.1 * shortest, "cost {} vs shortest {shortest}", outcome.cost);
}

#[test]
fn s5_start_off_grid_is_rejected() {
    let grid = empty_grid(20, 20);
    let planner = Planner::new(grid, config(PlannerVariant::Rrt, 100, 1)).unwrap();
    let err = planner.plan((-1.0, -1.0), (18.5, 18.5)).unwrap_err();
    assert!(matches!(err, PlanError::StartOffGrid));
}

#[test]
fn s6_quick_informed_rewire_thread_count_does_not_change_cost() {
    let mut grid = empty_grid(50, 50);
    for d in 0..50 {
        if d != 25 && d != 26 {
            grid.set_cost(d, d, 255);
            if d + 1 < 50 {
                grid.set_cost(d + 1, d, 255);
            }
        }
    }
    let baseline = {
        let cfg = PlannerConfig {
            rewire_threads_num: 1,
            ..config(PlannerVariant::QuickInformedRrt, 3000, 99)
        };
        Planner::new(grid.clone(), cfg)
            .unwrap()
            .plan((0.5, 0.5), (49.5, 49.5))
            .unwrap()
            .cost
    };
    let cfg = PlannerConfig {
        rewire_threads_num: 4,
        ..config(PlannerVariant::QuickInformedRrt, 3000, 99)
    };
    let four_threads = Planner::new(grid, cfg)
        .unwrap()
        .plan((0.5, 0.5), (49.5, 49.5))
        .unwrap()
        .cost;
    assert!((baseline - four_threads).abs() < 1e-6, "{baseline} vs {four_threads}");
}
