//! Visibility mesh builder used by the world crate.

use glam::Vec2;
use log::info;
use tileworld_core::{NavMesh, NodeId, Rect};

/// Builds the visibility graph over wall corners and the map boundary.
///
/// Wall corners are pushed diagonally away from their wall by `corner_margin`
/// world units. Candidates that leave the map or fall inside a wall are
/// discarded, while the four boundary corners are always kept. Two nodes are
/// connected whenever the segment between them stays clear of every wall
/// interior.
pub(crate) fn build_nav_mesh(walls: &[Rect], bounds: Rect, corner_margin: f32) -> NavMesh {
    let mut nodes: Vec<Vec2> = Vec::new();
    for wall in walls {
        for (corner, outward) in wall.corners().into_iter().zip(OUTWARD) {
            let candidate = corner + outward * corner_margin;
            if !bounds.contains(candidate) {
                continue;
            }
            if walls.iter().any(|other| other.contains_interior(candidate)) {
                continue;
            }
            push_unique(&mut nodes, candidate);
        }
    }
    for corner in bounds.corners() {
        push_unique(&mut nodes, corner);
    }

    let mut mesh = NavMesh::with_nodes(nodes.clone());
    for (first, from) in nodes.iter().enumerate() {
        for (offset, to) in nodes[first + 1..].iter().enumerate() {
            let blocked = walls
                .iter()
                .any(|wall| wall.segment_crosses_interior(*from, *to));
            if !blocked {
                let second = first + 1 + offset;
                mesh.connect(NodeId::new(first as u32), NodeId::new(second as u32));
            }
        }
    }

    info!(
        "navigation mesh built with {} nodes and {} edges",
        mesh.node_count(),
        mesh.edge_count()
    );
    mesh
}

/// Outward diagonal for each corner in [`Rect::corners`] order.
const OUTWARD: [Vec2; 4] = [
    Vec2::new(-1.0, -1.0),
    Vec2::new(1.0, -1.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(-1.0, 1.0),
];

fn push_unique(nodes: &mut Vec<Vec2>, candidate: Vec2) {
    if !nodes.iter().any(|node| node.abs_diff_eq(candidate, 1e-4)) {
        nodes.push(candidate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Rect {
        Rect::from_xywh(0.0, 0.0, 100.0, 100.0)
    }

    #[test]
    fn empty_level_connects_boundary_corners() {
        let mesh = build_nav_mesh(&[], bounds(), 0.0);

        assert_eq!(mesh.node_count(), 4);
        assert_eq!(mesh.edge_count(), 6);
    }

    #[test]
    fn wall_blocks_diagonal_between_its_corners() {
        let wall = Rect::from_xywh(40.0, 40.0, 20.0, 20.0);
        let mesh = build_nav_mesh(&[wall], bounds(), 0.0);

        let top_left = NodeId::new(0);
        let top_right = NodeId::new(1);
        let bottom_right = NodeId::new(2);

        assert!(mesh.are_visible(top_left, top_right));
        assert!(!mesh.are_visible(top_left, bottom_right));
    }

    #[test]
    fn margin_pushes_corners_outward() {
        let wall = Rect::from_xywh(40.0, 40.0, 20.0, 20.0);
        let mesh = build_nav_mesh(&[wall], bounds(), 2.0);

        assert_eq!(mesh.position(NodeId::new(0)), Some(Vec2::new(38.0, 38.0)));
        assert_eq!(mesh.position(NodeId::new(2)), Some(Vec2::new(62.0, 62.0)));
    }

    #[test]
    fn corners_outside_the_map_or_inside_walls_are_dropped() {
        let walls = [
            Rect::from_xywh(0.0, 0.0, 20.0, 20.0),
            Rect::from_xywh(20.0, 0.0, 20.0, 40.0),
        ];
        let mesh = build_nav_mesh(&walls, bounds(), 1.0);

        let positions: Vec<_> = mesh.nodes().map(|(_, position)| position).collect();

        assert!(!positions.contains(&Vec2::new(-1.0, -1.0)));
        assert!(!positions.contains(&Vec2::new(21.0, 21.0)));
        assert!(!positions.contains(&Vec2::new(-1.0, 21.0)));
        assert!(positions.contains(&Vec2::new(41.0, 41.0)));
    }

    #[test]
    fn visibility_is_symmetric() {
        let walls = [
            Rect::from_xywh(10.0, 10.0, 30.0, 10.0),
            Rect::from_xywh(60.0, 30.0, 10.0, 50.0),
        ];
        let mesh = build_nav_mesh(&walls, bounds(), 1.0);

        for (node, _) in mesh.nodes() {
            for other in mesh.visible_from(node) {
                assert!(mesh.are_visible(other, node));
            }
        }
    }

    #[test]
    fn edges_never_cross_walls() {
        let walls = [
            Rect::from_xywh(10.0, 10.0, 30.0, 10.0),
            Rect::from_xywh(60.0, 30.0, 10.0, 50.0),
        ];
        let mesh = build_nav_mesh(&walls, bounds(), 0.5);

        assert!(mesh.edge_count() > 0);
        for (from, to) in mesh.edges() {
            for wall in &walls {
                assert!(!wall.segment_crosses_interior(from, to));
            }
        }
    }
}
