//! Collision queries against walls and other entities.

use glam::Vec2;
use tileworld_core::{EntityId, Rect};

use crate::Entity;

/// Borrowed view of everything an entity may bump into.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Obstacles<'a> {
    walls: &'a [Rect],
    bounds: Rect,
    entities: &'a [Entity],
}

impl<'a> Obstacles<'a> {
    pub(crate) const fn new(walls: &'a [Rect], bounds: Rect, entities: &'a [Entity]) -> Self {
        Self {
            walls,
            bounds,
            entities,
        }
    }

    /// Reports whether `footprint` overlaps a wall or any entity other than
    /// `subject`.
    pub(crate) fn collides(&self, subject: EntityId, footprint: Rect) -> bool {
        if self.walls.iter().any(|wall| wall.intersects(&footprint)) {
            return true;
        }
        self.entities
            .iter()
            .filter(|other| other.id != subject)
            .any(|other| other.bounds().intersects(&footprint))
    }

    /// Reports whether `subject` may stand at `position`: the reference point
    /// must lie on the map and its footprint must be collision free.
    pub(crate) fn valid_position(&self, subject: &Entity, position: Vec2) -> bool {
        self.bounds.contains(position) && !self.collides(subject.id, subject.bounds_at(position))
    }
}
