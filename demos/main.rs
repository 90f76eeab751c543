//! Command-line demo: builds a synthetic occupancy grid with a wall gap,
//! runs the configured planner end to end, and prints the resulting path.
//!
//! ```bash
//! cargo run --example gridrrt-demo -- --planner rrt_star --sample-points 4000
//! cargo run --example gridrrt-demo -- --config demos/planner.toml
//! ```

use std::path::PathBuf;

use clap::Parser;
use gridrrt::{Grid, PlanError, PlannerConfig, PlannerVariant, Planner};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Run a sampling-based planner over a synthetic occupancy grid")]
struct Args {
    /// Load the full planner configuration from a TOML file instead of the
    /// flags below (any of `PlannerConfig`'s fields may be set; omitted
    /// fields take their `Default` value, per `#[serde(default)]`).
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "rrt_star")]
    planner: String,

    #[arg(long, default_value_t = 4000)]
    sample_points: usize,

    #[arg(long, default_value_t = 5.0)]
    sample_max_d: f64,

    #[arg(long, default_value_t = 10.0)]
    optimization_r: f64,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(long, default_value_t = 40)]
    width: usize,

    #[arg(long, default_value_t = 40)]
    height: usize,
}

fn load_config(path: &PathBuf) -> PlannerConfig {
    let text = std::fs::read_to_string(path).unwrap_or_else(|err| {
        eprintln!("failed to read {}: {err}", path.display());
        std::process::exit(1);
    });
    toml::from_str(&text).unwrap_or_else(|err| {
        eprintln!("failed to parse {}: {err}", path.display());
        std::process::exit(1);
    })
}

fn synthetic_grid(width: usize, height: usize) -> Grid {
    let mut costs = vec![0u8; width * height];
    let wall_x = width / 2;
    let gap = height / 2;
    for y in 0..height {
        if y != gap {
            costs[y * width + wall_x] = 255;
        }
    }
    Grid::new(width, height, 1.0, (0.0, 0.0), costs)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path),
        None => {
            let planner_name: PlannerVariant = match args.planner.parse() {
                Ok(variant) => variant,
                Err(PlanError::UnknownPlanner(name)) => {
                    eprintln!("unknown planner: {name}");
                    std::process::exit(1);
                }
                Err(err) => {
                    eprintln!("{err}");
                    std::process::exit(1);
                }
            };
            PlannerConfig {
                planner_name,
                sample_points: args.sample_points,
                sample_max_d: args.sample_max_d,
                optimization_r: args.optimization_r,
                seed: args.seed,
                ..Default::default()
            }
        }
    };

    let grid = synthetic_grid(args.width, args.height);
    let planner = match Planner::new(grid, config) {
        Ok(planner) => planner,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let start = (1.5, 1.5);
    let goal = (args.width as f64 - 1.5, args.height as f64 - 1.5);

    match planner.plan(start, goal) {
        Ok(outcome) => {
            println!("found path with {} waypoints, cost {:.2}", outcome.path.len(), outcome.cost);
            for (x, y) in &outcome.path {
                println!("  ({x:.2}, {y:.2})");
            }
        }
        Err(err) => {
            eprintln!("planning failed: {err}");
            if let Some(expansion) = err.expansion() {
                eprintln!("explored {} nodes before giving up", expansion.len());
            }
            std::process::exit(1);
        }
    }
}
