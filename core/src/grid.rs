//! Dense per-tile traversability derived from the level layout.

use glam::Vec2;

use crate::{TileCoord, TileSize};

/// Row-major grid of walkability flags, one per tile.
///
/// Queries outside the grid bounds always report the tile as blocking, so
/// callers never need to bounds-check before asking.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WalkabilityGrid {
    columns: u32,
    rows: u32,
    walkable: Vec<bool>,
}

impl WalkabilityGrid {
    /// Creates a grid in which every tile is walkable.
    #[must_use]
    pub fn open(columns: u32, rows: u32) -> Self {
        Self {
            columns,
            rows,
            walkable: vec![true; cell_count(columns, rows)],
        }
    }

    /// Builds a grid from row-major blocking flags.
    ///
    /// Missing flags are treated as blocking and surplus flags are ignored.
    #[must_use]
    pub fn from_blocking(columns: u32, rows: u32, blocking: &[bool]) -> Self {
        let count = cell_count(columns, rows);
        let walkable = (0..count)
            .map(|index| blocking.get(index).map_or(false, |blocked| !blocked))
            .collect();
        Self {
            columns,
            rows,
            walkable,
        }
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

    /// Total number of tiles in the grid.
    #[must_use]
    pub fn len(&self) -> usize {
        self.walkable.len()
    }

    /// Reports whether the grid contains no tiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.walkable.is_empty()
    }

    /// Reports whether the tile lies inside the grid.
    #[must_use]
    pub const fn contains(&self, tile: TileCoord) -> bool {
        tile.column() < self.columns && tile.row() < self.rows
    }

    /// Reports whether agents may occupy the tile.
    #[must_use]
    pub fn is_walkable(&self, tile: TileCoord) -> bool {
        self.index(tile)
            .and_then(|index| self.walkable.get(index).copied())
            .unwrap_or(false)
    }

    /// Row-major index of the tile, if it lies inside the grid.
    #[must_use]
    pub fn index(&self, tile: TileCoord) -> Option<usize> {
        if !self.contains(tile) {
            return None;
        }
        let row = usize::try_from(tile.row()).ok()?;
        let column = usize::try_from(tile.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    /// Tile stored at the provided row-major index.
    #[must_use]
    pub fn tile_at_index(&self, index: usize) -> Option<TileCoord> {
        if index >= self.walkable.len() || self.columns == 0 {
            return None;
        }
        let width = usize::try_from(self.columns).ok()?;
        let column = u32::try_from(index % width).ok()?;
        let row = u32::try_from(index / width).ok()?;
        Some(TileCoord::new(column, row))
    }

    /// Tile containing the world-space point, if it lies on the grid.
    #[must_use]
    pub fn tile_at(&self, point: Vec2, tile_size: TileSize) -> Option<TileCoord> {
        let tile = tile_size.tile_containing(point)?;
        self.contains(tile).then_some(tile)
    }

    /// Tile nearest to the world-space point, clamped onto the grid.
    #[must_use]
    pub fn nearest_tile(&self, point: Vec2, tile_size: TileSize) -> Option<TileCoord> {
        if self.columns == 0 || self.rows == 0 || !tile_size.is_valid() || !point.is_finite() {
            return None;
        }
        let column = (point.x / tile_size.width()).floor();
        let row = (point.y / tile_size.height()).floor();
        let column = column.clamp(0.0, (self.columns - 1) as f32) as u32;
        let row = row.clamp(0.0, (self.rows - 1) as f32) as u32;
        Some(TileCoord::new(column, row))
    }

    /// Iterator over every walkable tile in row-major order.
    pub fn walkable_tiles(&self) -> impl Iterator<Item = TileCoord> + '_ {
        self.walkable
            .iter()
            .enumerate()
            .filter(|(_, walkable)| **walkable)
            .filter_map(|(index, _)| self.tile_at_index(index))
    }
}

fn cell_count(columns: u32, rows: u32) -> usize {
    let count = u64::from(columns) * u64::from(rows);
    usize::try_from(count).unwrap_or(0)
}
