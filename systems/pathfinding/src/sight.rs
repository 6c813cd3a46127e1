use tileworld_core::{TileCoord, WalkabilityGrid};

/// Reports whether the segment between the centres of `from` and `to` only
/// passes through walkable tiles.
///
/// Every tile the segment touches is visited in exact integer arithmetic.
/// When the segment passes through a tile corner, both tiles sharing that
/// corner must be walkable, so sight never slips between diagonal blockers.
pub(crate) fn line_of_sight(grid: &WalkabilityGrid, from: TileCoord, to: TileCoord) -> bool {
    let (mut column, mut row) = (i64::from(from.column()), i64::from(from.row()));
    if !walkable(grid, column, row) {
        return false;
    }

    let dx = i64::from(to.column()) - column;
    let dy = i64::from(to.row()) - row;
    let (nx, ny) = (dx.abs(), dy.abs());
    let (sx, sy) = (dx.signum(), dy.signum());
    let (mut ix, mut iy) = (0, 0);

    while ix < nx || iy < ny {
        let decision = (1 + 2 * ix) * ny - (1 + 2 * iy) * nx;
        if decision == 0 {
            if !walkable(grid, column + sx, row) || !walkable(grid, column, row + sy) {
                return false;
            }
            column += sx;
            row += sy;
            ix += 1;
            iy += 1;
        } else if decision < 0 {
            column += sx;
            ix += 1;
        } else {
            row += sy;
            iy += 1;
        }

        if !walkable(grid, column, row) {
            return false;
        }
    }

    true
}

fn walkable(grid: &WalkabilityGrid, column: i64, row: i64) -> bool {
    match (u32::try_from(column), u32::try_from(row)) {
        (Ok(column), Ok(row)) => grid.is_walkable(TileCoord::new(column, row)),
        _ => false,
    }
}
