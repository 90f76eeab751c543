//! Steering and collision: projecting a sample onto the tree within a
//! maximum step distance, subject to line-of-sight (§4.3).

use crate::grid::{dist, Grid};
use crate::node::{Node, Tree};

/// Steers from `nearest` towards `sample`, capped at `max_dist`, and
/// returns the resulting node if the step is collision-free and does not
/// land on a cell already present in `tree`. Returns `None` (the spec's
/// "invalid" sentinel) otherwise. `obstacle_factor` scales the accumulated
/// edge cost (`Node::g`) by the mean cost of the cells the step crosses;
/// it has no effect on the geometric clamping against `max_dist`.
pub fn steer(
    grid: &Grid,
    tree: &Tree,
    nearest_id: usize,
    sample: (f64, f64),
    max_dist: f64,
    obstacle_factor: f64,
) -> Option<Node> {
    let nearest = tree.get(nearest_id).expect("nearest id must exist in tree");
    let from = nearest.point();
    let d = dist(from, sample);
    let target = if d <= max_dist {
        sample
    } else {
        let t = max_dist / d;
        (from.0 + t * (sample.0 - from.0), from.1 + t * (sample.1 - from.1))
    };

    let (tx, ty) = (target.0.round(), target.1.round());
    if tx < 0.0 || ty < 0.0 || !grid.in_bounds(tx as i64, ty as i64) {
        return None;
    }
    let (tx, ty) = (tx as usize, ty as usize);
    let target_id = grid.grid_to_index(tx, ty);
    if tree.contains(target_id) {
        return None;
    }
    if !grid.line_of_sight((nearest.x, nearest.y), (tx, ty)) {
        return None;
    }

    let edge_cost = grid.edge_cost((nearest.x, nearest.y), (tx, ty), obstacle_factor);
    Some(Node::child(tx, ty, target_id, nearest, edge_cost))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_grid(nx: usize, ny: usize) -> Grid {
        Grid::new(nx, ny, 1.0, (0.0, 0.0), vec![0u8; nx * ny])
    }

    #[test]
    fn steer_reaches_sample_within_max_dist() {
        let grid = empty_grid(20, 20);
        let root = Node::root(0, 0, grid.grid_to_index(0, 0));
        let tree = Tree::new(root);
        let new_node = steer(&grid, &tree, root.id, (3.0, 4.0), 10.0, 0.5).unwrap();
        assert_eq!((new_node.x, new_node.y), (3, 4));
        assert!((new_node.g - 5.0).abs() < 1e-9);
    }

    #[test]
    fn steer_clamps_to_max_dist() {
        let grid = empty_grid(20, 20);
        let root = Node::root(0, 0, grid.grid_to_index(0, 0));
        let tree = Tree::new(root);
        let new_node = steer(&grid, &tree, root.id, (10.0, 0.0), 3.0, 0.5).unwrap();
        assert_eq!((new_node.x, new_node.y), (3, 0));
    }

    #[test]
    fn steer_rejects_lethal_line_of_sight() {
        let mut grid = empty_grid(10, 10);
        grid.set_cost(3, 0, 255);
        let root = Node::root(0, 0, grid.grid_to_index(0, 0));
        let tree = Tree::new(root);
        assert!(steer(&grid, &tree, root.id, (6.0, 0.0), 10.0, 0.5).is_none());
    }

    #[test]
    fn steer_rejects_existing_cell() {
        let grid = empty_grid(10, 10);
        let root = Node::root(0, 0, grid.grid_to_index(0, 0));
        let mut tree = Tree::new(root);
        let a = Node::child(3, 0, grid.grid_to_index(3, 0), &root, 3.0);
        tree.insert(a);
        assert!(steer(&grid, &tree, root.id, (3.0, 0.0), 10.0, 0.5).is_none());
    }

    #[test]
    fn steer_scales_edge_cost_by_obstacle_factor() {
        let mut grid = empty_grid(10, 10);
        grid.set_cost(1, 0, 200);
        grid.set_cost(2, 0, 200);
        let root = Node::root(0, 0, grid.grid_to_index(0, 0));
        let tree = Tree::new(root);
        let unscaled = steer(&grid, &tree, root.id, (3.0, 0.0), 10.0, 0.0).unwrap();
        let scaled = steer(&grid, &tree, root.id, (3.0, 0.0), 10.0, 1.0).unwrap();
        assert!(scaled.g > unscaled.g);
    }
}
