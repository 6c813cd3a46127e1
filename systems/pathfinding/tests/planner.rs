use approx::assert_relative_eq;
use glam::Vec2;
use rstest::rstest;
use tileworld_core::{NavMesh, NodeId, TileCoord, TileSize, WalkabilityGrid};
use tileworld_system_pathfinding::{plan, Adjacency, Planner};

const UNIT: TileSize = TileSize::new(1.0, 1.0);

fn barrier_grid() -> WalkabilityGrid {
    let mut blocking = vec![false; 100];
    for row in 4..=6 {
        for column in 0..10 {
            if column != 5 {
                blocking[row * 10 + column] = true;
            }
        }
    }
    WalkabilityGrid::from_blocking(10, 10, &blocking)
}

fn chain_mesh(points: &[Vec2]) -> NavMesh {
    let mut mesh = NavMesh::with_nodes(points.to_vec());
    for index in 1..points.len() {
        mesh.connect(NodeId::new(index as u32 - 1), NodeId::new(index as u32));
    }
    mesh
}

#[rstest]
#[case::horizontal(TileCoord::new(0, 3), TileCoord::new(9, 3))]
#[case::shallow(TileCoord::new(0, 0), TileCoord::new(7, 3))]
#[case::steep(TileCoord::new(2, 1), TileCoord::new(8, 9))]
#[case::upward(TileCoord::new(9, 0), TileCoord::new(0, 6))]
#[case::leftward(TileCoord::new(4, 8), TileCoord::new(1, 1))]
fn open_grid_routes_match_straight_line(
    #[values(Adjacency::Four, Adjacency::Eight)] adjacency: Adjacency,
    #[case] start: TileCoord,
    #[case] goal: TileCoord,
) {
    let grid = WalkabilityGrid::open(10, 10);

    let path = Planner::new(adjacency).plan(start, goal, &grid, &NavMesh::default(), UNIT);

    assert_eq!(path.waypoints(), &[goal]);
    assert_relative_eq!(
        path.length_from(start),
        start.euclidean_distance(goal),
        epsilon = 1e-4
    );
}

/// Samples the segment between two tile centres and reports whether every
/// sample lies on a walkable tile.
fn segment_is_walkable(grid: &WalkabilityGrid, from: TileCoord, to: TileCoord) -> bool {
    let a = Vec2::new(from.column() as f32 + 0.5, from.row() as f32 + 0.5);
    let b = Vec2::new(to.column() as f32 + 0.5, to.row() as f32 + 0.5);
    (0..=200).all(|step| {
        let point = a.lerp(b, step as f32 / 200.0);
        grid.is_walkable(TileCoord::new(point.x as u32, point.y as u32))
    })
}

#[rstest]
#[case::four(Adjacency::Four)]
#[case::eight(Adjacency::Eight)]
fn routes_only_take_unobstructed_legs(#[case] adjacency: Adjacency) {
    let grid = barrier_grid();
    let start = TileCoord::new(1, 2);
    let goal = TileCoord::new(8, 8);
    let mesh = chain_mesh(&[
        Vec2::new(4.9, 3.9),
        Vec2::new(6.1, 3.9),
        Vec2::new(4.9, 7.1),
        Vec2::new(6.1, 7.1),
    ]);

    let path = Planner::new(adjacency).plan(start, goal, &grid, &mesh, UNIT);

    assert_eq!(path.goal(), Some(goal));
    let mut previous = start;
    for waypoint in path.waypoints() {
        assert!(
            segment_is_walkable(&grid, previous, *waypoint),
            "{previous:?} -> {waypoint:?} crosses the barrier"
        );
        previous = *waypoint;
    }
    assert!(path.length_from(start) >= start.euclidean_distance(goal) - 1e-4);
}

#[test]
fn start_equal_to_goal_yields_empty_path() {
    let grid = WalkabilityGrid::open(4, 4);
    let tile = TileCoord::new(2, 2);

    assert!(plan(tile, tile, &grid, &NavMesh::default(), UNIT).is_empty());
}

#[test]
fn blocking_endpoints_yield_empty_path() {
    let grid = barrier_grid();
    let mesh = NavMesh::default();

    assert!(plan(TileCoord::new(0, 0), TileCoord::new(0, 5), &grid, &mesh, UNIT).is_empty());
    assert!(plan(TileCoord::new(0, 5), TileCoord::new(0, 0), &grid, &mesh, UNIT).is_empty());
    assert!(plan(TileCoord::new(0, 0), TileCoord::new(20, 0), &grid, &mesh, UNIT).is_empty());
}

#[test]
fn enclosed_goal_is_unreachable() {
    let mut blocking = vec![false; 25];
    for tile in [7, 11, 13, 17] {
        blocking[tile] = true;
    }
    let grid = WalkabilityGrid::from_blocking(5, 5, &blocking);

    for adjacency in [Adjacency::Four, Adjacency::Eight] {
        let path = Planner::new(adjacency).plan(
            TileCoord::new(0, 0),
            TileCoord::new(2, 2),
            &grid,
            &NavMesh::default(),
            UNIT,
        );
        assert!(path.is_empty(), "{adjacency:?} leaked into the enclosure");
    }
}

#[test]
fn grid_only_route_threads_the_gap() {
    let grid = barrier_grid();
    let start = TileCoord::new(0, 0);
    let goal = TileCoord::new(9, 9);

    let path = plan(start, goal, &grid, &NavMesh::default(), UNIT);

    assert_eq!(path.len(), 18);
    assert_eq!(path.goal(), Some(goal));
    for gap in 4..=6 {
        assert!(path.waypoints().contains(&TileCoord::new(5, gap)));
    }
    assert!(path.waypoints().iter().all(|tile| grid.is_walkable(*tile)));
}

#[test]
fn mesh_shortcuts_shorten_the_route() {
    let grid = barrier_grid();
    let start = TileCoord::new(0, 0);
    let goal = TileCoord::new(9, 9);
    let mesh = chain_mesh(&[
        Vec2::new(0.5, 0.5),
        Vec2::new(5.5, 3.5),
        Vec2::new(5.5, 6.5),
        Vec2::new(9.5, 9.5),
    ]);

    let grid_only = plan(start, goal, &grid, &NavMesh::default(), UNIT);
    let with_mesh = plan(start, goal, &grid, &mesh, UNIT);

    assert_eq!(with_mesh.goal(), Some(goal));
    assert!(with_mesh.waypoints().iter().all(|tile| grid.is_walkable(*tile)));
    assert!(with_mesh.length_from(start) < grid_only.length_from(start));
    assert!(with_mesh.length_from(start) >= start.euclidean_distance(goal) - 1e-4);
}

#[test]
fn boundary_corners_connect_opposite_tiles() {
    let grid = WalkabilityGrid::open(10, 10);
    let size = TileSize::new(10.0, 10.0);
    let corners = [
        Vec2::new(0.0, 0.0),
        Vec2::new(100.0, 0.0),
        Vec2::new(0.0, 100.0),
        Vec2::new(100.0, 100.0),
    ];
    let mut mesh = NavMesh::with_nodes(corners.to_vec());
    for a in 0..4 {
        for b in (a + 1)..4 {
            mesh.connect(NodeId::new(a), NodeId::new(b));
        }
    }

    let path = plan(TileCoord::new(0, 0), TileCoord::new(9, 9), &grid, &mesh, size);

    assert_eq!(path.waypoints(), &[TileCoord::new(9, 9)]);
}

#[test]
fn eight_way_routes_never_cut_corners() {
    let mut blocking = vec![false; 9];
    blocking[1] = true;
    blocking[3] = true;
    let grid = WalkabilityGrid::from_blocking(3, 3, &blocking);

    let path = Planner::new(Adjacency::Eight).plan(
        TileCoord::new(0, 0),
        TileCoord::new(1, 1),
        &grid,
        &NavMesh::default(),
        UNIT,
    );

    assert!(path.is_empty());
}

#[test]
fn planning_is_deterministic() {
    let grid = barrier_grid();
    let mesh = chain_mesh(&[Vec2::new(2.5, 2.5), Vec2::new(5.5, 8.5)]);

    let runs: Vec<_> = (0..3)
        .map(|_| {
            Planner::new(Adjacency::Eight).plan(
                TileCoord::new(0, 9),
                TileCoord::new(9, 0),
                &grid,
                &mesh,
                UNIT,
            )
        })
        .collect();

    assert!(!runs[0].is_empty());
    assert!(runs.windows(2).all(|pair| pair[0] == pair[1]));
}
