//! Reduction of raw wall rectangles into a disjoint wall set.

use std::cmp::Ordering;

use tileworld_core::Rect;

/// Relative tolerance used when comparing a union's area with its parts.
const AREA_TOLERANCE: f32 = 1e-4;

/// Merges overlapping and edge-adjacent rectangles into a disjoint set that
/// covers exactly the same area.
///
/// Two touching rectangles are replaced by their bounding union whenever the
/// union adds no area. Overlapping pairs that cannot be unified are made
/// disjoint by cutting the overlap out of the later rectangle. The scan
/// restarts after every change until no pair qualifies, and the result is
/// sorted top-to-bottom, left-to-right. Empty and non-finite rectangles are
/// dropped.
#[must_use]
pub(crate) fn merge_walls(rects: &[Rect]) -> Vec<Rect> {
    let mut walls: Vec<Rect> = rects
        .iter()
        .copied()
        .filter(|rect| rect.is_finite() && !rect.is_empty())
        .collect();

    while let Some(change) = find_change(&walls) {
        match change {
            Change::Union { keep, remove } => {
                walls[keep] = walls[keep].union(&walls[remove]);
                let _ = walls.remove(remove);
            }
            Change::Cut { keep, cut } => {
                let pieces = walls[cut].subtract(&walls[keep]);
                let _ = walls.remove(cut);
                walls.extend(pieces);
            }
        }
    }

    walls.sort_by(compare_reading_order);
    walls
}

#[derive(Clone, Copy, Debug)]
enum Change {
    Union { keep: usize, remove: usize },
    Cut { keep: usize, cut: usize },
}

fn find_change(walls: &[Rect]) -> Option<Change> {
    for (first, a) in walls.iter().enumerate() {
        for (offset, b) in walls[first + 1..].iter().enumerate() {
            let second = first + 1 + offset;
            if !a.touches(b) {
                continue;
            }

            let overlap = a.intersection(b).map_or(0.0, |shared| shared.area());
            let union = a.union(b).area();
            let covered = a.area() + b.area() - overlap;
            if (union - covered).abs() <= AREA_TOLERANCE * union.max(1.0) {
                return Some(Change::Union {
                    keep: first,
                    remove: second,
                });
            }

            if overlap > 0.0 {
                return Some(Change::Cut {
                    keep: first,
                    cut: second,
                });
            }
        }
    }
    None
}

fn compare_reading_order(a: &Rect, b: &Rect) -> Ordering {
    a.origin()
        .y
        .total_cmp(&b.origin().y)
        .then(a.origin().x.total_cmp(&b.origin().x))
        .then(a.size().y.total_cmp(&b.size().y))
        .then(a.size().x.total_cmp(&b.size().x))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_of_tiles_becomes_one_rectangle() {
        let tiles: Vec<_> = (0..4)
            .map(|column| Rect::from_xywh(column as f32 * 32.0, 16.0, 32.0, 16.0))
            .collect();

        let merged = merge_walls(&tiles);

        assert_eq!(merged, vec![Rect::from_xywh(0.0, 16.0, 128.0, 16.0)]);
    }

    #[test]
    fn block_of_tiles_collapses_in_both_axes() {
        let mut tiles = Vec::new();
        for row in 0..3 {
            for column in 0..2 {
                tiles.push(Rect::from_xywh(column as f32, row as f32, 1.0, 1.0));
            }
        }

        let merged = merge_walls(&tiles);

        assert_eq!(merged, vec![Rect::from_xywh(0.0, 0.0, 2.0, 3.0)]);
    }

    #[test]
    fn l_shape_stays_split() {
        let tiles = [
            Rect::from_xywh(0.0, 0.0, 1.0, 1.0),
            Rect::from_xywh(1.0, 0.0, 1.0, 1.0),
            Rect::from_xywh(0.0, 1.0, 1.0, 1.0),
        ];

        let merged = merge_walls(&tiles);

        assert_eq!(merged.len(), 2);
        let area: f32 = merged.iter().map(Rect::area).sum();
        assert!((area - 3.0).abs() < 1e-6);
    }

    #[test]
    fn corner_contact_does_not_merge() {
        let tiles = [
            Rect::from_xywh(0.0, 0.0, 1.0, 1.0),
            Rect::from_xywh(1.0, 1.0, 1.0, 1.0),
        ];

        assert_eq!(merge_walls(&tiles).len(), 2);
    }

    #[test]
    fn contained_rectangle_is_absorbed() {
        let tiles = [
            Rect::from_xywh(0.0, 0.0, 10.0, 10.0),
            Rect::from_xywh(2.0, 2.0, 3.0, 3.0),
        ];

        assert_eq!(merge_walls(&tiles), vec![Rect::from_xywh(0.0, 0.0, 10.0, 10.0)]);
    }

    #[test]
    fn crossing_rectangles_become_disjoint() {
        let tiles = [
            Rect::from_xywh(0.0, 4.0, 12.0, 4.0),
            Rect::from_xywh(4.0, 0.0, 4.0, 12.0),
        ];

        let merged = merge_walls(&tiles);

        for (index, a) in merged.iter().enumerate() {
            for b in &merged[index + 1..] {
                assert!(!a.intersects(b), "{a:?} overlaps {b:?}");
            }
        }
        let area: f32 = merged.iter().map(Rect::area).sum();
        assert!((area - 80.0).abs() < 1e-4);
    }

    #[test]
    fn degenerate_input_is_dropped() {
        let tiles = [
            Rect::from_xywh(0.0, 0.0, 0.0, 5.0),
            Rect::from_xywh(0.0, 0.0, f32::NAN, 5.0),
        ];

        assert!(merge_walls(&tiles).is_empty());
    }
}
