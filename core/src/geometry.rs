//! Axis-aligned geometry shared by walls, entity bounds, and the navigation mesh.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// World-space coordinate measured in pixels.
pub type Point = Vec2;

/// Axis-aligned rectangle described by its upper-left origin and its size.
///
/// Rectangles are treated as closed regions for containment and as open
/// regions for overlap: two rectangles that merely share an edge or a corner do
/// not intersect.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    origin: Vec2,
    size: Vec2,
}

impl Rect {
    /// Creates a rectangle from its upper-left origin and size.
    #[must_use]
    pub const fn new(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }

    /// Creates a rectangle from scalar components.
    #[must_use]
    pub const fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    /// Creates the rectangle spanning the two provided corners.
    #[must_use]
    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self {
            origin: min,
            size: max - min,
        }
    }

    /// Upper-left corner of the rectangle.
    #[must_use]
    pub const fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Width and height of the rectangle.
    #[must_use]
    pub const fn size(&self) -> Vec2 {
        self.size
    }

    /// Smallest coordinate on both axes.
    #[must_use]
    pub fn min(&self) -> Vec2 {
        self.origin
    }

    /// Largest coordinate on both axes.
    #[must_use]
    pub fn max(&self) -> Vec2 {
        self.origin + self.size
    }

    /// Area covered by the rectangle.
    #[must_use]
    pub fn area(&self) -> f32 {
        self.size.x.max(0.0) * self.size.y.max(0.0)
    }

    /// Reports whether the rectangle covers no area.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    /// Reports whether every component is a finite number.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.origin.is_finite() && self.size.is_finite()
    }

    /// Returns the rectangle shifted by the provided offset.
    #[must_use]
    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            origin: self.origin + offset,
            size: self.size,
        }
    }

    /// Reports whether the point lies inside or on the border of the rectangle.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        let max = self.max();
        point.x >= self.origin.x && point.x <= max.x && point.y >= self.origin.y && point.y <= max.y
    }

    /// Reports whether the point lies strictly inside the rectangle.
    #[must_use]
    pub fn contains_interior(&self, point: Vec2) -> bool {
        let max = self.max();
        point.x > self.origin.x && point.x < max.x && point.y > self.origin.y && point.y < max.y
    }

    /// Reports whether the interiors of both rectangles overlap.
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        let (a_max, b_max) = (self.max(), other.max());
        self.origin.x < b_max.x
            && other.origin.x < a_max.x
            && self.origin.y < b_max.y
            && other.origin.y < a_max.y
    }

    /// Reports whether the rectangles overlap or share an edge segment of
    /// positive length. Rectangles that only meet at a corner do not touch.
    #[must_use]
    pub fn touches(&self, other: &Rect) -> bool {
        let (a_max, b_max) = (self.max(), other.max());
        let overlap_x = a_max.x.min(b_max.x) - self.origin.x.max(other.origin.x);
        let overlap_y = a_max.y.min(b_max.y) - self.origin.y.max(other.origin.y);
        (overlap_x >= 0.0 && overlap_y > 0.0) || (overlap_x > 0.0 && overlap_y >= 0.0)
    }

    /// Region covered by both rectangles, if their interiors overlap.
    #[must_use]
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        let min = self.origin.max(other.origin);
        let max = self.max().min(other.max());
        Some(Self::from_min_max(min, max))
    }

    /// Smallest rectangle enclosing both rectangles.
    #[must_use]
    pub fn union(&self, other: &Rect) -> Rect {
        Self::from_min_max(self.origin.min(other.origin), self.max().max(other.max()))
    }

    /// Splits the part of `self` not covered by `other` into at most four
    /// disjoint rectangles.
    #[must_use]
    pub fn subtract(&self, other: &Rect) -> Vec<Rect> {
        let Some(cut) = self.intersection(other) else {
            return vec![*self];
        };

        let (min, max) = (self.min(), self.max());
        let (cut_min, cut_max) = (cut.min(), cut.max());
        let candidates = [
            Self::from_min_max(min, Vec2::new(max.x, cut_min.y)),
            Self::from_min_max(Vec2::new(min.x, cut_max.y), max),
            Self::from_min_max(
                Vec2::new(min.x, cut_min.y),
                Vec2::new(cut_min.x, cut_max.y),
            ),
            Self::from_min_max(
                Vec2::new(cut_max.x, cut_min.y),
                Vec2::new(max.x, cut_max.y),
            ),
        ];

        candidates
            .into_iter()
            .filter(|piece| !piece.is_empty())
            .collect()
    }

    /// Corner points in clockwise order starting at the origin.
    #[must_use]
    pub fn corners(&self) -> [Vec2; 4] {
        let max = self.max();
        [
            self.origin,
            Vec2::new(max.x, self.origin.y),
            max,
            Vec2::new(self.origin.x, max.y),
        ]
    }

    /// Reports whether the straight segment between `from` and `to` passes
    /// through the interior of the rectangle.
    ///
    /// Segments that graze an edge or a corner are not considered crossing.
    #[must_use]
    pub fn segment_crosses_interior(&self, from: Vec2, to: Vec2) -> bool {
        if self.is_empty() {
            return false;
        }

        let delta = to - from;
        let (min, max) = (self.min(), self.max());
        let mut enter = 0.0_f32;
        let mut exit = 1.0_f32;

        for axis in 0..2 {
            let (start, step, low, high) = (from[axis], delta[axis], min[axis], max[axis]);
            if step.abs() <= f32::EPSILON {
                if start <= low || start >= high {
                    return false;
                }
                continue;
            }

            let mut near = (low - start) / step;
            let mut far = (high - start) / step;
            if near > far {
                std::mem::swap(&mut near, &mut far);
            }
            enter = enter.max(near);
            exit = exit.min(far);
            if enter >= exit {
                return false;
            }
        }

        (exit - enter) * delta.length() > SEGMENT_EPSILON
    }
}

const SEGMENT_EPSILON: f32 = 1e-4;
