//! Static level geometry derived once per loaded layout.

use glam::Vec2;
use log::info;
use tileworld_core::{LevelLayout, NavMesh, Rect, TileCoord, TileSize, WalkabilityGrid};

use crate::{navigation::build_nav_mesh, walls::merge_walls};

/// Read-only geometry shared by every entity on the level.
#[derive(Clone, Debug)]
pub(crate) struct Level {
    tile_size: TileSize,
    bounds: Rect,
    grid: WalkabilityGrid,
    walls: Vec<Rect>,
    mesh: NavMesh,
}

impl Level {
    /// Level without tiles, walls, or mesh nodes.
    pub(crate) fn empty() -> Self {
        Self {
            tile_size: TileSize::default(),
            bounds: Rect::from_xywh(0.0, 0.0, 0.0, 0.0),
            grid: WalkabilityGrid::default(),
            walls: Vec::new(),
            mesh: NavMesh::default(),
        }
    }

    /// Merges the layout's walls and builds the navigation mesh over them.
    pub(crate) fn load(layout: &LevelLayout, corner_margin: f32) -> Self {
        let bounds = layout.bounds();
        let walls = merge_walls(layout.walls());
        info!(
            "loaded {}x{} level, merged {} wall rectangles into {}",
            layout.columns(),
            layout.rows(),
            layout.walls().len(),
            walls.len()
        );
        let mesh = build_nav_mesh(&walls, bounds, corner_margin);

        Self {
            tile_size: layout.tile_size(),
            bounds,
            grid: layout.walkability(),
            walls,
            mesh,
        }
    }

    pub(crate) const fn tile_size(&self) -> TileSize {
        self.tile_size
    }

    pub(crate) const fn bounds(&self) -> Rect {
        self.bounds
    }

    pub(crate) fn grid(&self) -> &WalkabilityGrid {
        &self.grid
    }

    pub(crate) fn walls(&self) -> &[Rect] {
        &self.walls
    }

    pub(crate) fn mesh(&self) -> &NavMesh {
        &self.mesh
    }

    /// Tile the position belongs to, clamped onto the grid.
    pub(crate) fn tile_of(&self, position: Vec2) -> Option<TileCoord> {
        self.grid.nearest_tile(position, self.tile_size)
    }
}
