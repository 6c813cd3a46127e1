#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the tile-world simulation.
//!
//! This crate defines the value types and the message surface that connect
//! adapters, the authoritative world, and pure systems. Adapters submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then reports [`Event`] values
//! describing what changed. Systems never mutate the world directly; they
//! receive immutable views and answer with plain data.

mod geometry;
mod grid;
mod mesh;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use geometry::{Point, Rect};
pub use grid::WalkabilityGrid;
pub use mesh::{NavMesh, NodeId};

/// Location of a single map tile expressed as column and row indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    column: u32,
    row: u32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two tiles.
    #[must_use]
    pub fn manhattan_distance(self, other: TileCoord) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }

    /// Straight-line distance between two tiles measured in tile units.
    #[must_use]
    pub fn euclidean_distance(self, other: TileCoord) -> f32 {
        let columns = self.column.abs_diff(other.column) as f32;
        let rows = self.row.abs_diff(other.row) as f32;
        columns.hypot(rows)
    }
}

/// Dimensions of a single tile measured in world pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileSize {
    width: f32,
    height: f32,
}

impl TileSize {
    /// Creates a new tile size descriptor.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Width of a tile in pixels.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Height of a tile in pixels.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Reports whether both dimensions are finite and strictly positive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// World-space rectangle covered by the tile.
    #[must_use]
    pub fn tile_rect(&self, tile: TileCoord) -> Rect {
        Rect::from_xywh(
            tile.column() as f32 * self.width,
            tile.row() as f32 * self.height,
            self.width,
            self.height,
        )
    }

    /// World-space centre of the tile.
    #[must_use]
    pub fn tile_center(&self, tile: TileCoord) -> Point {
        Vec2::new(
            (tile.column() as f32 + 0.5) * self.width,
            (tile.row() as f32 + 0.5) * self.height,
        )
    }

    /// Tile containing the point, ignoring any grid bounds.
    ///
    /// Points with negative coordinates lie on no tile.
    #[must_use]
    pub fn tile_containing(&self, point: Point) -> Option<TileCoord> {
        if !self.is_valid() || !point.is_finite() || point.x < 0.0 || point.y < 0.0 {
            return None;
        }
        let column = (point.x / self.width).floor();
        let row = (point.y / self.height).floor();
        if column > u32::MAX as f32 || row > u32::MAX as f32 {
            return None;
        }
        Some(TileCoord::new(column as u32, row as u32))
    }
}

impl Default for TileSize {
    fn default() -> Self {
        Self::new(32.0, 16.0)
    }
}

/// Unique identifier assigned to an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Behavioural category of an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Externally controlled entity that autonomous agents keep away from.
    Player,
    /// Autonomous pedestrian that plans paths and keeps personal space.
    Pedestrian,
    /// Inert object that only takes part in collisions.
    Prop,
}

/// Outcome of resolving a single proposed displacement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// The full displacement was applied.
    Full,
    /// Only the vertical component was applied.
    SlideVertical,
    /// Only the horizontal component was applied.
    SlideHorizontal,
    /// Every fallback was rejected and the entity stayed in place.
    Blocked,
}

/// Ordered tile waypoints leading from a start tile to a goal tile.
///
/// The start tile itself is not part of the path; the last waypoint is the
/// goal. An empty path means either "already there" or "no route".
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Path {
    waypoints: Vec<TileCoord>,
}

impl Path {
    /// Creates a path from ordered waypoints.
    #[must_use]
    pub fn new(waypoints: Vec<TileCoord>) -> Self {
        Self { waypoints }
    }

    /// Path without waypoints.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Ordered waypoints of the path.
    #[must_use]
    pub fn waypoints(&self) -> &[TileCoord] {
        &self.waypoints
    }

    /// Number of waypoints in the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Reports whether the path has no waypoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Final waypoint of the path.
    #[must_use]
    pub fn goal(&self) -> Option<TileCoord> {
        self.waypoints.last().copied()
    }

    /// Cumulative straight-line length in tile units, starting from `start`.
    #[must_use]
    pub fn length_from(&self, start: TileCoord) -> f32 {
        let mut previous = start;
        let mut total = 0.0;
        for waypoint in &self.waypoints {
            total += previous.euclidean_distance(*waypoint);
            previous = *waypoint;
        }
        total
    }

    /// Consumes the path, yielding the waypoints.
    #[must_use]
    pub fn into_vec(self) -> Vec<TileCoord> {
        self.waypoints
    }
}

/// Reasons a level layout may be rejected at load time.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum LayoutError {
    /// Tile dimensions were zero, negative, or not finite.
    #[error("tile size {width}x{height} must be finite and positive")]
    InvalidTileSize {
        /// Rejected tile width.
        width: f32,
        /// Rejected tile height.
        height: f32,
    },
    /// The number of blocking flags does not match the grid dimensions.
    #[error("expected {expected} blocking flags for the grid, found {found}")]
    BlockingMismatch {
        /// Flags required by `columns * rows`.
        expected: usize,
        /// Flags actually supplied.
        found: usize,
    },
    /// A wall rectangle contained a non-finite component.
    #[error("wall rectangle {index} has non-finite geometry")]
    InvalidWall {
        /// Position of the rejected wall in the supplied list.
        index: usize,
    },
}

/// Static description of a level handed over by the map loader.
///
/// Decoded layouts pass through the same validation as [`LevelLayout::new`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLevelLayout")]
pub struct LevelLayout {
    columns: u32,
    rows: u32,
    tile_size: TileSize,
    blocking: Vec<bool>,
    walls: Vec<Rect>,
}

#[derive(Deserialize)]
struct RawLevelLayout {
    columns: u32,
    rows: u32,
    tile_size: TileSize,
    blocking: Vec<bool>,
    walls: Vec<Rect>,
}

impl TryFrom<RawLevelLayout> for LevelLayout {
    type Error = LayoutError;

    fn try_from(raw: RawLevelLayout) -> Result<Self, Self::Error> {
        Self::new(raw.columns, raw.rows, raw.tile_size, raw.blocking, raw.walls)
    }
}

impl LevelLayout {
    /// Creates a layout from blocking flags and explicit wall rectangles.
    pub fn new(
        columns: u32,
        rows: u32,
        tile_size: TileSize,
        blocking: Vec<bool>,
        walls: Vec<Rect>,
    ) -> Result<Self, LayoutError> {
        if !tile_size.is_valid() {
            return Err(LayoutError::InvalidTileSize {
                width: tile_size.width(),
                height: tile_size.height(),
            });
        }

        let expected = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(usize::MAX);
        if blocking.len() != expected {
            return Err(LayoutError::BlockingMismatch {
                expected,
                found: blocking.len(),
            });
        }

        if let Some(index) = walls.iter().position(|wall| !wall.is_finite()) {
            return Err(LayoutError::InvalidWall { index });
        }

        Ok(Self {
            columns,
            rows,
            tile_size,
            blocking,
            walls,
        })
    }

    /// Creates a layout whose walls are one tile-sized rectangle per blocking tile.
    pub fn from_blocking(
        columns: u32,
        rows: u32,
        tile_size: TileSize,
        blocking: Vec<bool>,
    ) -> Result<Self, LayoutError> {
        let mut walls = Vec::new();
        if tile_size.is_valid() && columns > 0 {
            for (index, blocked) in blocking.iter().enumerate() {
                if !blocked {
                    continue;
                }
                let column = (index % columns as usize) as u32;
                let row = (index / columns as usize) as u32;
                walls.push(tile_size.tile_rect(TileCoord::new(column, row)));
            }
        }
        Self::new(columns, rows, tile_size, blocking, walls)
    }

    /// Creates a fully walkable layout without walls.
    pub fn open(columns: u32, rows: u32, tile_size: TileSize) -> Result<Self, LayoutError> {
        let count = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        Self::new(columns, rows, tile_size, vec![false; count], Vec::new())
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Pixel dimensions of a tile.
    #[must_use]
    pub const fn tile_size(&self) -> TileSize {
        self.tile_size
    }

    /// Row-major blocking flags.
    #[must_use]
    pub fn blocking(&self) -> &[bool] {
        &self.blocking
    }

    /// Raw, possibly overlapping wall rectangles in world pixels.
    #[must_use]
    pub fn walls(&self) -> &[Rect] {
        &self.walls
    }

    /// World-space rectangle spanned by the whole map.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::from_xywh(
            0.0,
            0.0,
            self.columns as f32 * self.tile_size.width(),
            self.rows as f32 * self.tile_size.height(),
        )
    }

    /// Walkability grid derived from the blocking flags.
    #[must_use]
    pub fn walkability(&self) -> WalkabilityGrid {
        WalkabilityGrid::from_blocking(self.columns, self.rows, &self.blocking)
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the active level and removes every entity.
    LoadLevel {
        /// Layout describing the new level.
        layout: LevelLayout,
    },
    /// Adds an entity to the end of the update order.
    SpawnEntity {
        /// Behavioural category of the new entity.
        kind: EntityKind,
        /// World-space reference point of the entity.
        position: Point,
        /// Collision bounds relative to the reference point.
        footprint: Rect,
    },
    /// Removes an entity from the simulation.
    RemoveEntity {
        /// Identifier of the entity to remove.
        entity: EntityId,
    },
    /// Sets or clears the long-term goal of an agent.
    AssignGoal {
        /// Identifier of the agent receiving the goal.
        entity: EntityId,
        /// Goal tile, or `None` to release the agent.
        goal: Option<TileCoord>,
    },
    /// Moves an entity by the provided displacement, sliding along walls.
    MoveEntity {
        /// Identifier of the entity to move.
        entity: EntityId,
        /// Desired displacement in world pixels.
        delta: Vec2,
    },
    /// Advances every entity by one simulation tick.
    Tick,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a new level replaced the previous one.
    LevelLoaded {
        /// Number of tile columns in the level.
        columns: u32,
        /// Number of tile rows in the level.
        rows: u32,
        /// Number of disjoint wall rectangles after merging.
        walls: usize,
        /// Number of navigation mesh nodes.
        mesh_nodes: usize,
        /// Number of undirected navigation mesh edges.
        mesh_edges: usize,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Index of the tick that is being processed.
        tick: u64,
    },
    /// Confirms that an entity joined the simulation.
    EntitySpawned {
        /// Identifier assigned to the entity.
        entity: EntityId,
        /// Behavioural category of the entity.
        kind: EntityKind,
        /// Initial reference point of the entity.
        position: Point,
    },
    /// Confirms that an entity left the simulation.
    EntityRemoved {
        /// Identifier of the removed entity.
        entity: EntityId,
    },
    /// Confirms that an agent received or lost its long-term goal.
    GoalAssigned {
        /// Identifier of the agent.
        entity: EntityId,
        /// New long-term goal, if any.
        goal: Option<TileCoord>,
    },
    /// Reports that an entity changed position.
    EntityMoved {
        /// Identifier of the entity that moved.
        entity: EntityId,
        /// Position before the move.
        from: Point,
        /// Position after the move.
        to: Point,
        /// Which fallback produced the committed position.
        resolution: Resolution,
    },
    /// Reports that an agent obtained a new path.
    PathPlanned {
        /// Identifier of the agent.
        entity: EntityId,
        /// Long-term goal the path leads to.
        goal: TileCoord,
        /// Number of waypoints in the path.
        waypoints: usize,
    },
    /// Reports that no route to the goal exists from the agent's tile.
    PathUnavailable {
        /// Identifier of the agent.
        entity: EntityId,
        /// Goal that could not be reached.
        goal: TileCoord,
    },
    /// Reports that an agent arrived at its long-term goal.
    GoalReached {
        /// Identifier of the agent.
        entity: EntityId,
        /// Goal that was reached.
        goal: TileCoord,
    },
    /// Reports that an agent dropped its path after being blocked for too long.
    PathAbandoned {
        /// Identifier of the agent.
        entity: EntityId,
    },
}
