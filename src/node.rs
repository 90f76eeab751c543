//! The tree vertex type and the flat arena that stores the sample set.

use std::collections::HashMap;

use crate::grid::dist;

/// A single tree vertex, identified by its grid cell index.
///
/// `pid` is `None` for the root of a tree (the spec's `pid == -1`
/// sentinel, expressed idiomatically). `h` is carried for interface
/// uniformity with heuristic-driven planners but is never read by any
/// sampling planner in this crate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Node {
    pub x: usize,
    pub y: usize,
    pub g: f64,
    pub h: f64,
    pub id: usize,
    pub pid: Option<usize>,
}

impl Node {
    pub fn root(x: usize, y: usize, id: usize) -> Self {
        Self {
            x,
            y,
            g: 0.0,
            h: 0.0,
            id,
            pid: None,
        }
    }

    pub fn child(x: usize, y: usize, id: usize, parent: &Node, edge_cost: f64) -> Self {
        Self {
            x,
            y,
            g: parent.g + edge_cost,
            h: 0.0,
            id,
            pid: Some(parent.id),
        }
    }

    pub fn point(&self) -> (f64, f64) {
        (self.x as f64, self.y as f64)
    }
}

/// Equality by `id`, matching the spec's identity rule.
impl Eq for Node {}

/// Lexicographic `(g, id)` ordering, used only for rewire tie-breaks.
impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.g
            .partial_cmp(&other.g)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// The sample set / tree store: a flat arena keyed by cell index, plus a
/// dense insertion-order vector used both as the expansion trace and as
/// the iteration order for neighborhood scans.
///
/// Insertion is idempotent on `id`: inserting a node whose `id` already
/// exists replaces it in place (used by rewire) without disturbing the
/// insertion-order vector, so the expansion trace always reflects first
/// discovery order.
#[derive(Clone, Debug)]
pub struct Tree {
    nodes: HashMap<usize, Node>,
    order: Vec<usize>,
    root: usize,
}

impl Tree {
    pub fn new(root: Node) -> Self {
        let id = root.id;
        let mut nodes = HashMap::new();
        nodes.insert(id, root);
        Self {
            nodes,
            order: vec![id],
            root: id,
        }
    }

    pub fn root(&self) -> usize {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: usize) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: usize) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Inserts or replaces a node. Returns `true` if this was a brand-new
    /// vertex (and thus should be appended to the expansion trace).
    pub fn insert(&mut self, node: Node) -> bool {
        let is_new = !self.nodes.contains_key(&node.id);
        if is_new {
            self.order.push(node.id);
        }
        self.nodes.insert(node.id, node);
        is_new
    }

    /// Updates an existing node's parent and cost (a rewire commit).
    /// No-op if `id` is not present.
    pub fn rewire(&mut self, id: usize, new_parent: usize, new_g: f64) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.pid = Some(new_parent);
            node.g = new_g;
        }
    }

    /// All node ids within Euclidean `radius` (cell units) of `p`.
    pub fn within_radius(&self, p: (f64, f64), radius: f64) -> Vec<usize> {
        self.nodes
            .values()
            .filter(|n| dist(n.point(), p) <= radius)
            .map(|n| n.id)
            .collect()
    }

    /// The node nearest to `p` by a linear scan, per the spec's explicit
    /// choice of correctness over throughput for nearest-neighbor queries.
    pub fn nearest(&self, p: (f64, f64)) -> Option<usize> {
        self.nodes
            .values()
            .min_by(|a, b| {
                dist(a.point(), p)
                    .partial_cmp(&dist(b.point(), p))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|n| n.id)
    }

    /// Walks `pid` from `id` to the root, returning ids start-first.
    /// Asserts rather than looping forever if a cycle is ever observed —
    /// the only fatal runtime condition per the spec's error design.
    pub fn path_to_root(&self, id: usize) -> Vec<usize> {
        let mut chain = vec![id];
        let mut current = id;
        for _ in 0..self.nodes.len() {
            let node = self.nodes.get(&current).expect("dangling pid");
            match node.pid {
                Some(parent) => {
                    chain.push(parent);
                    current = parent;
                }
                None => {
                    chain.reverse();
                    return chain;
                }
            }
        }
        panic!("sample set invariant violated: pid cycle detected");
    }

    /// Snapshot of every accepted vertex in discovery order (the
    /// expansion trace).
    pub fn expansion_trace(&self) -> Vec<Node> {
        self.order
            .iter()
            .map(|id| self.nodes[id])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_idempotent_on_id() {
        let root = Node::root(0, 0, 0);
        let mut tree = Tree::new(root);
        let a = Node::child(1, 0, 1, &root, 1.0);
        assert!(tree.insert(a));
        let a_rewired = Node {
            g: 0.5,
            pid: Some(0),
            ..a
        };
        assert!(!tree.insert(a_rewired));
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.get(1).unwrap().g, 0.5);
        assert_eq!(tree.expansion_trace().len(), 2);
    }

    #[test]
    fn path_to_root_is_start_first() {
        let root = Node::root(0, 0, 0);
        let mut tree = Tree::new(root);
        let a = Node::child(1, 0, 1, &root, 1.0);
        tree.insert(a);
        let b = Node::child(2, 0, 2, &a, 1.0);
        tree.insert(b);
        assert_eq!(tree.path_to_root(2), vec![0, 1, 2]);
    }

    #[test]
    fn nearest_and_within_radius() {
        let root = Node::root(0, 0, 0);
        let mut tree = Tree::new(root);
        tree.insert(Node::child(5, 0, 5, &root, 5.0));
        tree.insert(Node::child(1, 0, 1, &root, 1.0));
        assert_eq!(tree.nearest((1.2, 0.0)), Some(1));
        let mut near = tree.within_radius((0.0, 0.0), 1.5);
        near.sort();
        assert_eq!(near, vec![0, 1]);
    }
}
