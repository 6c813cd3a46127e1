//! Sparse visibility graph used for long-range path shortcuts.

use std::collections::BTreeSet;

use glam::Vec2;

/// Index of a node stored inside a [`NavMesh`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates a node identifier from its numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    fn slot(self) -> usize {
        self.0 as usize
    }
}

/// Undirected visibility graph over obstacle corners and boundary points.
///
/// Every node's neighbour list is sorted and free of duplicates, and
/// visibility is symmetric: adding an edge records it from both endpoints.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NavMesh {
    nodes: Vec<Vec2>,
    neighbors: Vec<BTreeSet<NodeId>>,
}

impl NavMesh {
    /// Creates a mesh with the provided nodes and no edges.
    #[must_use]
    pub fn with_nodes(nodes: Vec<Vec2>) -> Self {
        let neighbors = vec![BTreeSet::new(); nodes.len()];
        Self { nodes, neighbors }
    }

    /// Records mutual visibility between two nodes.
    ///
    /// Self-loops and unknown node identifiers are ignored.
    pub fn connect(&mut self, a: NodeId, b: NodeId) {
        if a == b || a.slot() >= self.nodes.len() || b.slot() >= self.nodes.len() {
            return;
        }
        let _ = self.neighbors[a.slot()].insert(b);
        let _ = self.neighbors[b.slot()].insert(a);
    }

    /// Number of nodes stored in the mesh.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of undirected edges stored in the mesh.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.neighbors.iter().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// Reports whether the mesh has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// World-space position of the node.
    #[must_use]
    pub fn position(&self, node: NodeId) -> Option<Vec2> {
        self.nodes.get(node.slot()).copied()
    }

    /// Iterator over all nodes and their positions in identifier order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, Vec2)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, position)| (NodeId::new(index as u32), *position))
    }

    /// Nodes directly visible from the provided node, in identifier order.
    pub fn visible_from(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.neighbors
            .get(node.slot())
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Reports whether the two nodes see each other.
    #[must_use]
    pub fn are_visible(&self, a: NodeId, b: NodeId) -> bool {
        self.neighbors
            .get(a.slot())
            .map_or(false, |set| set.contains(&b))
    }

    /// Each undirected edge exactly once as a pair of endpoint positions.
    ///
    /// Intended for debug overlays that draw one line per edge.
    pub fn edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        self.neighbors
            .iter()
            .enumerate()
            .flat_map(move |(index, set)| {
                set.iter()
                    .filter(move |other| other.slot() > index)
                    .map(move |other| (self.nodes[index], self.nodes[other.slot()]))
            })
    }
}
