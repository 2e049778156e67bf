//! Chamfer propagation masks for the two-pass Euclidean distance transform.
//!
//! Each cell tracks how far it is (in grid steps, decomposed as `v`/`h`/`d`
//! along three sweep-local axes) from the nearest seed, plus the Euclidean
//! `distance` those three components combine into. A mask function looks at a
//! small neighbourhood around a cell and returns whichever neighbour (stepped
//! by one grid cell) yields the smallest `distance`, including the cell
//! itself unchanged as one of the candidates.

use super::DtCell;
use super::grid::Grid3D;

#[inline]
fn step(grid: &Grid3D<DtCell>, z: usize, y: usize, x: usize, dv: i32, dh: i32, dd: i32) -> DtCell {
    let c = grid.get(z, y, x);
    DtCell::new(c.v + dv, c.h + dh, c.d + dd)
}

#[inline]
fn same(grid: &Grid3D<DtCell>, z: usize, y: usize, x: usize) -> DtCell {
    grid.get(z, y, x)
}

#[inline]
fn min_of(candidates: &[DtCell]) -> DtCell {
    let mut best = DtCell::INFTY;
    for &c in candidates {
        if c.distance < best.distance {
            best = c;
        }
    }
    best
}

/// 14-neighbour forward mask stepping from `x-1` (and the 5-neighbour
/// same-`x` pattern), used for the first pass over increasing `x`.
pub fn forward1(grid: &Grid3D<DtCell>, dim: usize, z: usize, y: usize, x: usize) -> DtCell {
    let mut c = [DtCell::INFTY; 14];
    if z > 0 && y > 0 && x > 0 {
        c[0] = step(grid, z - 1, y - 1, x - 1, 1, 1, 1);
    }
    if y > 0 && x > 0 {
        c[1] = step(grid, z, y - 1, x - 1, 1, 1, 0);
    }
    if z + 1 < dim && y > 0 && x > 0 {
        c[2] = step(grid, z + 1, y - 1, x - 1, 1, 1, 1);
    }
    if z > 0 && x > 0 {
        c[3] = step(grid, z - 1, y, x - 1, 1, 0, 1);
    }
    if x > 0 {
        c[4] = step(grid, z, y, x - 1, 1, 0, 0);
    }
    if x > 0 && z + 1 < dim {
        c[5] = step(grid, z + 1, y, x - 1, 1, 0, 1);
    }
    if x > 0 && z > 0 && y + 1 < dim {
        c[6] = step(grid, z - 1, y + 1, x - 1, 1, 1, 1);
    }
    if x > 0 && y + 1 < dim {
        c[7] = step(grid, z, y + 1, x - 1, 1, 1, 0);
    }
    if x > 0 && y + 1 < dim && z + 1 < dim {
        c[8] = step(grid, z + 1, y + 1, x - 1, 1, 1, 1);
    }
    if z > 0 && y > 0 {
        c[9] = step(grid, z - 1, y - 1, x, 0, 1, 1);
    }
    if y > 0 {
        c[10] = step(grid, z, y - 1, x, 0, 1, 0);
    }
    if z + 1 < dim && y > 0 {
        c[11] = step(grid, z + 1, y - 1, x, 0, 1, 1);
    }
    c[12] = same(grid, z, y, x);
    if z > 0 {
        c[13] = step(grid, z - 1, y, x, 0, 0, 1);
    }
    min_of(&c)
}

/// 2-neighbour forward mask along `+z`, used for the second sub-pass.
pub fn forward2(grid: &Grid3D<DtCell>, dim: usize, z: usize, y: usize, x: usize) -> DtCell {
    let mut c = [DtCell::INFTY; 2];
    if z + 1 < dim {
        c[0] = step(grid, z + 1, y, x, 0, 0, 1);
    }
    c[1] = same(grid, z, y, x);
    min_of(&c)
}

/// 5-neighbour forward mask along `+z`/`+y`, used for the third sub-pass
/// (decreasing `y`).
pub fn forward3(grid: &Grid3D<DtCell>, dim: usize, z: usize, y: usize, x: usize) -> DtCell {
    let mut c = [DtCell::INFTY; 5];
    if z + 1 < dim {
        c[0] = step(grid, z + 1, y, x, 0, 0, 1);
    }
    if y + 1 < dim && z + 1 < dim {
        c[1] = step(grid, z + 1, y, x, 0, 1, 1);
    }
    if y + 1 < dim {
        c[2] = step(grid, z, y + 1, x, 0, 1, 0);
    }
    c[3] = same(grid, z, y, x);
    if z > 0 && y + 1 < dim {
        c[4] = step(grid, z - 1, y + 1, x, 0, 1, 1);
    }
    min_of(&c)
}

/// 2-neighbour forward mask along `-z`, used for the fourth sub-pass.
pub fn forward4(grid: &Grid3D<DtCell>, _dim: usize, z: usize, y: usize, x: usize) -> DtCell {
    let mut c = [DtCell::INFTY; 2];
    if z > 0 {
        c[0] = step(grid, z - 1, y, x, 0, 0, 1);
    }
    c[1] = same(grid, z, y, x);
    min_of(&c)
}

/// 14-neighbour backward mask stepping from `x+1`, the mirror of [`forward1`].
pub fn backward1(grid: &Grid3D<DtCell>, dim: usize, z: usize, y: usize, x: usize) -> DtCell {
    let mut c = [DtCell::INFTY; 14];
    if z > 0 && y > 0 && x + 1 < dim {
        c[0] = step(grid, z - 1, y - 1, x + 1, 1, 1, 1);
    }
    if y > 0 && x + 1 < dim {
        c[1] = step(grid, z, y - 1, x + 1, 1, 1, 0);
    }
    if z + 1 < dim && y > 0 && x + 1 < dim {
        c[2] = step(grid, z + 1, y - 1, x + 1, 1, 1, 1);
    }
    if z > 0 && x + 1 < dim {
        c[3] = step(grid, z - 1, y, x + 1, 1, 0, 1);
    }
    if x + 1 < dim {
        c[4] = step(grid, z, y, x + 1, 1, 0, 0);
    }
    if x + 1 < dim && z + 1 < dim {
        c[5] = step(grid, z + 1, y, x + 1, 1, 0, 1);
    }
    if x + 1 < dim && z > 0 && y + 1 < dim {
        c[6] = step(grid, z - 1, y + 1, x + 1, 1, 1, 1);
    }
    if x + 1 < dim && y + 1 < dim {
        c[7] = step(grid, z, y + 1, x + 1, 1, 1, 0);
    }
    if x + 1 < dim && y + 1 < dim && z + 1 < dim {
        c[8] = step(grid, z + 1, y + 1, x + 1, 1, 1, 1);
    }
    if z + 1 < dim {
        c[9] = step(grid, z + 1, y, x, 0, 0, 1);
    }
    if y + 1 < dim && z + 1 < dim {
        c[10] = step(grid, z + 1, y, x, 0, 1, 1);
    }
    if y + 1 < dim {
        c[11] = step(grid, z, y + 1, x, 0, 1, 0);
    }
    c[12] = same(grid, z, y, x);
    if z > 0 && y + 1 < dim {
        c[13] = step(grid, z - 1, y + 1, x, 0, 1, 1);
    }
    min_of(&c)
}

/// 5-neighbour backward mask, the mirror of [`forward3`], used for the
/// second backward sub-pass (increasing `y`).
pub fn backward3(grid: &Grid3D<DtCell>, dim: usize, z: usize, y: usize, x: usize) -> DtCell {
    let mut c = [DtCell::INFTY; 5];
    if z > 0 && y > 0 {
        c[0] = step(grid, z - 1, y - 1, x, 0, 1, 1);
    }
    if y > 0 {
        c[1] = step(grid, z, y - 1, x, 0, 1, 0);
    }
    if z + 1 < dim && y > 0 {
        c[2] = step(grid, z + 1, y - 1, x, 0, 1, 1);
    }
    c[3] = same(grid, z, y, x);
    if z > 0 {
        c[4] = step(grid, z - 1, y, x, 0, 0, 1);
    }
    min_of(&c)
}
