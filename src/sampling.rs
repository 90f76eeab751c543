//! Sampling strategies shared across planner variants: uniform grid
//! sampling, ellipsoidal informed sampling (§4.7), and the prior-set /
//! heavy-tailed refinements used by Quick-Informed RRT* (§4.8).

use rand::Rng;
use rand_distr::{Distribution, StudentT};

use crate::grid::{angle, dist};

/// How the unit-disk draw underlying ellipse and prior-set sampling is
/// generated. `TDistributed` replaces the uniform rejection sample with a
/// heavy-tailed radial component (§4.8, "t-distributed growth"), letting
/// occasional draws land far outside the unit disk to escape local
/// concavities; the ellipse/prior-set affine transform is unchanged
/// either way.
#[derive(Clone, Copy, Debug)]
pub enum DiskSampling {
    Uniform,
    TDistributed { freedom: f64 },
}

/// Draws `(u, v)` from the chosen radial distribution at a uniformly
/// random angle. For `Uniform` this is rejection sampling from the unit
/// disk; for `TDistributed` the radius is the absolute value of a
/// Student-t draw with the configured degrees of freedom, so `freedom`
/// controls tail heaviness: small values produce frequent long jumps,
/// large values converge toward the uniform disk's bounded spread.
fn sample_disk(rng: &mut impl Rng, method: DiskSampling) -> (f64, f64) {
    match method {
        DiskSampling::Uniform => loop {
            let u = rng.gen_range(-1.0..1.0);
            let v = rng.gen_range(-1.0..1.0);
            if u * u + v * v < 1.0 {
                return (u, v);
            }
        },
        DiskSampling::TDistributed { freedom } => {
            let student = StudentT::new(freedom).expect("t_distr_freedom must be positive");
            let radius = student.sample(rng).abs();
            let theta = rng.gen_range(0.0..std::f64::consts::TAU);
            (radius * theta.cos(), radius * theta.sin())
        }
    }
}

/// A uniformly random grid cell in `[0, nx) x [0, ny)` (§4.4 step 1).
pub fn uniform_grid_sample(rng: &mut impl Rng, nx: usize, ny: usize) -> (f64, f64) {
    let x = rng.gen_range(0..nx);
    let y = rng.gen_range(0..ny);
    (x as f64, y as f64)
}

/// Rejection-samples a cell inside the informed ellipse with foci
/// `start`/`goal` and current best cost `c_best` (§4.7). Returns `None`
/// when `c_best` is not yet finite (no solution exists: caller should
/// fall back to [`uniform_grid_sample`]) or every attempt landed off the
/// grid.
#[allow(clippy::too_many_arguments)]
pub fn ellipse_sample(
    rng: &mut impl Rng,
    start: (f64, f64),
    goal: (f64, f64),
    c_best: f64,
    disk: DiskSampling,
    nx: usize,
    ny: usize,
    max_attempts: usize,
) -> Option<(f64, f64)> {
    if !c_best.is_finite() {
        return None;
    }
    let c_min = dist(start, goal);
    let a = c_best / 2.0;
    let b = (a * a - c_min * c_min).max(0.0).sqrt();
    let theta = -angle(start, goal);
    let mid = ((start.0 + goal.0) / 2.0, (start.1 + goal.1) / 2.0);

    for _ in 0..max_attempts {
        let (u, v) = sample_disk(rng, disk);
        let (su, sv) = (u * a, v * b);
        let rx = su * theta.cos() - sv * theta.sin();
        let ry = su * theta.sin() + sv * theta.cos();
        let wx = (rx + mid.0).round();
        let wy = (ry + mid.1).round();
        if wx >= 0.0 && wy >= 0.0 && (wx as usize) < nx && (wy as usize) < ny {
            return Some((wx, wy));
        }
    }
    None
}

/// Draws a cell from a disk of radius `radius` centered on a uniformly
/// chosen node of `path` (§4.8, "prior-set sampling"). Returns `None` if
/// `path` is empty or every attempt landed off the grid.
pub fn prior_set_sample(
    rng: &mut impl Rng,
    path: &[(f64, f64)],
    radius: f64,
    nx: usize,
    ny: usize,
    max_attempts: usize,
) -> Option<(f64, f64)> {
    if path.is_empty() {
        return None;
    }
    let center = path[rng.gen_range(0..path.len())];
    for _ in 0..max_attempts {
        let (u, v) = sample_disk(rng, DiskSampling::Uniform);
        let wx = (center.0 + u * radius).round();
        let wy = (center.1 + v * radius).round();
        if wx >= 0.0 && wy >= 0.0 && (wx as usize) < nx && (wy as usize) < ny {
            return Some((wx, wy));
        }
    }
    None
}
