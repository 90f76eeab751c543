//! Occupancy grid and 2D geometry primitives shared by every planner variant.

/// Cost value at or above which a cell is impassable.
pub const DEFAULT_LETHAL: u8 = 253;

/// An immutable occupancy-cost snapshot over a `nx × ny` grid.
///
/// The grid owns no mutable state once constructed save for the one-shot
/// [`Grid::outline`] border injection performed before planning begins.
#[derive(Clone, Debug)]
pub struct Grid {
    nx: usize,
    ny: usize,
    res: f64,
    origin: (f64, f64),
    costs: Vec<u8>,
    lethal: u8,
}

impl Grid {
    /// Builds a grid from a row-major cost array of length `nx * ny`.
    ///
    /// Panics if `costs.len() != nx * ny`, the same contract the host must
    /// uphold when handing the planner its snapshot.
    pub fn new(nx: usize, ny: usize, res: f64, origin: (f64, f64), costs: Vec<u8>) -> Self {
        assert_eq!(costs.len(), nx * ny, "cost array does not match nx*ny");
        Self {
            nx,
            ny,
            res,
            origin,
            costs,
            lethal: DEFAULT_LETHAL,
        }
    }

    /// Overrides the lethal threshold (default [`DEFAULT_LETHAL`]).
    pub fn with_lethal(mut self, lethal: u8) -> Self {
        self.lethal = lethal;
        self
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    pub fn resolution(&self) -> f64 {
        self.res
    }

    pub fn origin(&self) -> (f64, f64) {
        self.origin
    }

    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.nx && (y as usize) < self.ny
    }

    /// Cell index `y * nx + x`. Callers must ensure `(x, y)` is in bounds.
    pub fn grid_to_index(&self, x: usize, y: usize) -> usize {
        y * self.nx + x
    }

    pub fn index_to_grid(&self, id: usize) -> (usize, usize) {
        (id % self.nx, id / self.nx)
    }

    pub fn cost(&self, x: usize, y: usize) -> u8 {
        self.costs[self.grid_to_index(x, y)]
    }

    pub fn is_lethal(&self, x: usize, y: usize) -> bool {
        self.cost(x, y) >= self.lethal
    }

    /// Overwrites the cost of a single cell, e.g. to place synthetic
    /// obstacles in tests and demos.
    pub fn set_cost(&mut self, x: usize, y: usize, cost: u8) {
        let id = self.grid_to_index(x, y);
        self.costs[id] = cost;
    }

    /// Paints the border row/column lethal in place. Called once at `plan`
    /// entry when `outline_map` is set.
    pub fn outline(&mut self) {
        for x in 0..self.nx {
            let top = self.grid_to_index(x, 0);
            let bottom = self.grid_to_index(x, self.ny - 1);
            self.costs[top] = self.lethal;
            self.costs[bottom] = self.lethal;
        }
        for y in 0..self.ny {
            let left = self.grid_to_index(0, y);
            let right = self.grid_to_index(self.nx - 1, y);
            self.costs[left] = self.lethal;
            self.costs[right] = self.lethal;
        }
    }

    /// Converts world metric coordinates to a grid cell via floor conversion.
    /// Returns `None` if the resulting cell is off-grid.
    pub fn world_to_map(&self, wx: f64, wy: f64) -> Option<(usize, usize)> {
        let mx = ((wx - self.origin.0) / self.res).floor();
        let my = ((wy - self.origin.1) / self.res).floor();
        if mx < 0.0 || my < 0.0 {
            return None;
        }
        let (mx, my) = (mx as i64, my as i64);
        if self.in_bounds(mx, my) {
            Some((mx as usize, my as usize))
        } else {
            None
        }
    }

    /// Converts a grid cell to the world coordinate of its center.
    pub fn map_to_world(&self, x: usize, y: usize) -> (f64, f64) {
        (
            self.origin.0 + (x as f64 + 0.5) * self.res,
            self.origin.1 + (y as f64 + 0.5) * self.res,
        )
    }

    /// Rasterized line-of-sight test between two cells (Bresenham). Fails
    /// iff any cell touched by the segment, including both endpoints, is
    /// lethal.
    pub fn line_of_sight(&self, a: (usize, usize), b: (usize, usize)) -> bool {
        for (x, y) in bresenham(a, b) {
            if !self.in_bounds(x as i64, y as i64) || self.is_lethal(x, y) {
                return false;
            }
        }
        true
    }

    /// The cost charged to `g` for traversing the edge `a..b`: the
    /// geometric distance scaled up by `factor` in proportion to the mean
    /// cell cost the edge passes through. `factor == 0.0` reduces to plain
    /// Euclidean distance regardless of cost.
    pub fn edge_cost(&self, a: (usize, usize), b: (usize, usize), factor: f64) -> f64 {
        let cells = bresenham(a, b);
        let mean_cost: f64 =
            cells.iter().map(|&(x, y)| self.cost(x, y) as f64).sum::<f64>() / cells.len() as f64;
        let geometric = dist((a.0 as f64, a.1 as f64), (b.0 as f64, b.1 as f64));
        geometric * (1.0 + factor * (mean_cost / 255.0))
    }
}

/// Euclidean distance between two cell-space points, in cell units.
pub fn dist(a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

/// Direction from `a` to `b`, in radians.
pub fn angle(a: (f64, f64), b: (f64, f64)) -> f64 {
    (b.1 - a.1).atan2(b.0 - a.0)
}

/// Integer Bresenham rasterization of the segment `a..=b`, inclusive of
/// both endpoints.
fn bresenham(a: (usize, usize), b: (usize, usize)) -> Vec<(usize, usize)> {
    let (mut x0, mut y0) = (a.0 as i64, a.1 as i64);
    let (x1, y1) = (b.0 as i64, b.1 as i64);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut cells = Vec::new();
    loop {
        cells.push((x0 as usize, y0 as usize));
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
    cells
}
