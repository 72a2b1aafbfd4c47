//! Halo-bordered, double-buffered tile state and the stencil kernel.
//!
//! Each tile stores its owned rectangle plus a one-cell halo ring, twice:
//! a `current` plane read by the stencil and a staging plane that collects
//! pushed halos and stencil output. `swap` promotes the staging plane in
//! O(1) by flipping an index.
//!
//! Buffer layout for a `w` x `h` owned region (`pitch = w + 2`):
//!
//! ```text
//!   . r r r r .      r = halo ring (written by neighbors)
//!   r o o o o r      o = owned cells
//!   r o o o o r      . = ring corners, never read or written
//!   . r r r r .
//! ```
//!
//! Cross-thread writes go through [`Slot`], one `UnsafeCell` per cell. The
//! exchange schedule keeps every slot single-writer within a phase: during
//! the push phase neighbors write only the outermost ring of the staging
//! plane while the owner reads only rows one cell inside it, and different
//! sides write disjoint ring segments. Between the two barriers each plane
//! is touched by its owner alone.

use rayon::prelude::*;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::field::{GlobalField, BACKGROUND};
use crate::partition::OwnedRegion;
use crate::topology::Direction;

/// Tiles with fewer updatable rows than this run the stencil sequentially.
/// For short tiles the rayon dispatch overhead outweighs the row work.
const PARALLEL_ROW_THRESHOLD: usize = 256;

/// One cell slot that a neighbor's worker may write during the exchange
/// phase.
#[repr(transparent)]
struct Slot(UnsafeCell<f64>);

// Concurrent access is disjoint by the phase schedule documented at module
// level; no slot is ever read and written in the same phase.
unsafe impl Sync for Slot {}

/// One plane of the buffer region: owned rectangle plus halo ring.
struct Plane {
    cells: Box<[Slot]>,
}

impl Plane {
    fn filled(len: usize, value: f64) -> Self {
        let cells = (0..len).map(|_| Slot(UnsafeCell::new(value))).collect();
        Self { cells }
    }

    #[inline(always)]
    fn get(&self, i: usize) -> f64 {
        // Safety: the phase schedule gives this slot no concurrent writer.
        unsafe { *self.cells[i].0.get() }
    }

    #[inline(always)]
    fn set(&self, i: usize, value: f64) {
        // Safety: the phase schedule makes this slot's writer unique and
        // keeps readers out until after the next barrier.
        unsafe { *self.cells[i].0.get() = value }
    }

    /// View the whole plane as a plain slice.
    ///
    /// # Safety
    ///
    /// No other thread may access this plane for the lifetime of the view.
    unsafe fn as_slice(&self) -> &[f64] {
        std::slice::from_raw_parts(self.cells.as_ptr().cast::<f64>(), self.cells.len())
    }

    /// View the whole plane as a plain mutable slice.
    ///
    /// # Safety
    ///
    /// No other access to this plane, from any thread, may overlap the
    /// lifetime of the view.
    #[allow(clippy::mut_from_ref)]
    unsafe fn as_mut_slice(&self) -> &mut [f64] {
        let base = UnsafeCell::raw_get(self.cells.as_ptr() as *const UnsafeCell<f64>);
        std::slice::from_raw_parts_mut(base, self.cells.len())
    }
}

/// A worker's tile: owned-region geometry plus two buffer planes.
///
/// All run-phase methods take `&self` so tiles can be shared across the
/// worker pool as a plain slice; the solver's phase schedule is what makes
/// the interior mutability sound. They are `pub(crate)` so that schedule
/// is the only caller outside this module.
pub(crate) struct Tile {
    owned: OwnedRegion,
    /// Buffer row length: owned width + 2.
    pitch: usize,
    /// Buffer row count: owned height + 2.
    rows: usize,
    /// Updatable columns in buffer-local coordinates, half-open. Excludes
    /// the frozen global boundary; empty for boundary-only tiles.
    lx0: usize,
    lx1: usize,
    /// Updatable rows in buffer-local coordinates, half-open.
    ly0: usize,
    ly1: usize,
    planes: [Plane; 2],
    /// Index of the plane currently acting as `current`.
    front: AtomicUsize,
}

impl Tile {
    /// Build the tile for one owned rectangle of an `nx` x `ny` grid.
    /// Both planes start filled with the background value.
    pub(crate) fn new(owned: OwnedRegion, nx: usize, ny: usize) -> Self {
        let pitch = owned.width + 2;
        let rows = owned.height + 2;
        let (lx0, lx1) = local_span(owned.x0, owned.width, nx);
        let (ly0, ly1) = local_span(owned.y0, owned.height, ny);
        let len = pitch * rows;
        Self {
            owned,
            pitch,
            rows,
            lx0,
            lx1,
            ly0,
            ly1,
            planes: [Plane::filled(len, BACKGROUND), Plane::filled(len, BACKGROUND)],
            front: AtomicUsize::new(0),
        }
    }

    #[inline]
    fn current(&self) -> &Plane {
        &self.planes[self.front.load(Ordering::Relaxed)]
    }

    #[inline]
    fn staging(&self) -> &Plane {
        &self.planes[self.front.load(Ordering::Relaxed) ^ 1]
    }

    fn edge_len(&self, side: Direction) -> usize {
        match side {
            Direction::North | Direction::South => self.owned.width,
            Direction::East | Direction::West => self.owned.height,
        }
    }

    /// Copy the owned region out of `field` into both planes, mirroring the
    /// values so the staging plane starts identical to `current`.
    pub(crate) fn load(&mut self, field: &GlobalField) {
        for plane in &self.planes {
            // Safety: &mut self gives this thread exclusive access.
            let cells = unsafe { plane.as_mut_slice() };
            cells.fill(BACKGROUND);
            for ly in 0..self.owned.height {
                let src = &field.row(self.owned.y0 + ly)[self.owned.x0..][..self.owned.width];
                let dst = (ly + 1) * self.pitch + 1;
                cells[dst..dst + self.owned.width].copy_from_slice(src);
            }
        }
        self.front.store(0, Ordering::Relaxed);
    }

    /// The row or column of owned cells one cell inside the `side` edge,
    /// read from the staging plane.
    ///
    /// The staging plane holds the latest completed generation during the
    /// push phase, so this is what a neighbor's halo must see.
    pub(crate) fn boundary_values(&self, side: Direction) -> Vec<f64> {
        let plane = self.staging();
        let w = self.owned.width;
        let h = self.owned.height;
        match side {
            Direction::North => (0..w).map(|x| plane.get(self.pitch + 1 + x)).collect(),
            Direction::South => (0..w).map(|x| plane.get(h * self.pitch + 1 + x)).collect(),
            Direction::East => (0..h).map(|y| plane.get((y + 1) * self.pitch + w)).collect(),
            Direction::West => (0..h).map(|y| plane.get((y + 1) * self.pitch + 1)).collect(),
        }
    }

    /// Deposit a neighbor's offered edge into the staging plane's outermost
    /// ring on `side`. Ring corners stay untouched.
    ///
    /// Called by the neighbor's worker during the push phase; the schedule
    /// guarantees one writer per ring segment.
    pub(crate) fn receive_halo(&self, side: Direction, values: &[f64]) {
        debug_assert_eq!(values.len(), self.edge_len(side));
        let plane = self.staging();
        match side {
            Direction::North => {
                for (x, &v) in values.iter().enumerate() {
                    plane.set(1 + x, v);
                }
            }
            Direction::South => {
                let base = (self.rows - 1) * self.pitch;
                for (x, &v) in values.iter().enumerate() {
                    plane.set(base + 1 + x, v);
                }
            }
            Direction::East => {
                for (y, &v) in values.iter().enumerate() {
                    plane.set((y + 1) * self.pitch + self.pitch - 1, v);
                }
            }
            Direction::West => {
                for (y, &v) in values.iter().enumerate() {
                    plane.set((y + 1) * self.pitch, v);
                }
            }
        }
    }

    /// Promote the staging plane to `current`. O(1) index flip; the
    /// barriers on either side provide the cross-thread ordering.
    pub(crate) fn swap(&self) {
        self.front.fetch_xor(1, Ordering::Relaxed);
    }

    /// One forward-Euler step over the updatable cells:
    /// `next = current + alpha * (N + S + E + W - 4 * current)`.
    ///
    /// Frozen global-boundary cells are never written; they keep their
    /// loaded value in both planes. Called only by the owning worker
    /// between the two barriers.
    pub(crate) fn apply_stencil(&self, alpha: f64) {
        if self.lx0 >= self.lx1 || self.ly0 >= self.ly1 {
            return;
        }
        let pitch = self.pitch;
        let (lx0, lx1) = (self.lx0, self.lx1);
        let ly0 = self.ly0;

        // Safety: the owning worker is the only thread touching either
        // plane inside the compute window.
        let cur = unsafe { self.current().as_slice() };
        let next = unsafe { self.staging().as_mut_slice() };

        let band = &mut next[ly0 * pitch..self.ly1 * pitch];
        if self.ly1 - ly0 >= PARALLEL_ROW_THRESHOLD {
            band.par_chunks_mut(pitch)
                .enumerate()
                .for_each(|(row, out)| {
                    stencil_row(cur, out, pitch, ly0 + row, lx0, lx1, alpha);
                });
        } else {
            for (row, out) in band.chunks_mut(pitch).enumerate() {
                stencil_row(cur, out, pitch, ly0 + row, lx0, lx1, alpha);
            }
        }
    }

    /// Scatter the `current` plane's owned region back into the global
    /// field. Called after the worker pool has joined.
    pub(crate) fn write_back(&self, field: &mut GlobalField) {
        // Safety: workers have joined; this thread is the only accessor.
        let cur = unsafe { self.current().as_slice() };
        for ly in 0..self.owned.height {
            let src = &cur[(ly + 1) * self.pitch + 1..][..self.owned.width];
            let row = field.row_mut(self.owned.y0 + ly);
            row[self.owned.x0..][..self.owned.width].copy_from_slice(src);
        }
    }

    /// Value of the `current` plane at owned-local coordinates.
    #[cfg(test)]
    fn owned_value(&self, lx: usize, ly: usize) -> f64 {
        self.current().get((ly + 1) * self.pitch + lx + 1)
    }
}

/// Updatable span of one axis in buffer-local coordinates, half-open.
///
/// Clamps the owned extent `[x0, x0 + extent)` to the global interior
/// `[1, n - 1)`; a tile made entirely of global boundary gets the empty
/// span `(1, 1)`.
fn local_span(x0: usize, extent: usize, n: usize) -> (usize, usize) {
    let lo = x0.max(1);
    let hi = (x0 + extent).min(n - 1);
    if lo < hi {
        (lo - x0 + 1, hi - x0 + 1)
    } else {
        (1, 1)
    }
}

/// Update one buffer row. `out` is the full staging row at buffer row `y`;
/// only the updatable columns are written.
#[inline]
fn stencil_row(
    cur: &[f64],
    out: &mut [f64],
    pitch: usize,
    y: usize,
    lx0: usize,
    lx1: usize,
    alpha: f64,
) {
    let base = y * pitch;
    for x in lx0..lx1 {
        let idx = base + x;
        let center = cur[idx];
        let north = cur[idx - pitch];
        let south = cur[idx + pitch];
        let west = cur[idx - 1];
        let east = cur[idx + 1];
        let laplacian = north + south + east + west - 4.0 * center;
        out[x] = center + alpha * laplacian;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(x0: usize, y0: usize, width: usize, height: usize) -> OwnedRegion {
        OwnedRegion {
            x0,
            y0,
            width,
            height,
        }
    }

    #[test]
    fn test_updatable_spans_exclude_global_boundary() {
        // Northwest corner tile of an 8x8 grid: global row 0 and column 0
        // are frozen, so the span starts one cell further in.
        let tile = Tile::new(region(0, 0, 4, 4), 8, 8);
        assert_eq!((tile.lx0, tile.lx1), (2, 5));
        assert_eq!((tile.ly0, tile.ly1), (2, 5));

        // Southeast corner tile.
        let tile = Tile::new(region(4, 4, 4, 4), 8, 8);
        assert_eq!((tile.lx0, tile.lx1), (1, 4));
        assert_eq!((tile.ly0, tile.ly1), (1, 4));

        // Interior tile: every owned cell is updatable.
        let tile = Tile::new(region(3, 3, 2, 2), 8, 8);
        assert_eq!((tile.lx0, tile.lx1), (1, 3));
        assert_eq!((tile.ly0, tile.ly1), (1, 3));

        // Whole grid in one tile.
        let tile = Tile::new(region(0, 0, 8, 8), 8, 8);
        assert_eq!((tile.lx0, tile.lx1), (2, 8));
        assert_eq!(tile.pitch, 10);
        assert_eq!(tile.rows, 10);
    }

    #[test]
    fn test_load_write_back_round_trip() {
        let mut original = GlobalField::uniform(6, 5, 0.0);
        for y in 0..5 {
            for x in 0..6 {
                original.set(x, y, (y * 6 + x) as f64);
            }
        }

        let mut left = Tile::new(region(0, 0, 3, 5), 6, 5);
        let mut right = Tile::new(region(3, 0, 3, 5), 6, 5);
        left.load(&original);
        right.load(&original);

        let mut rebuilt = GlobalField::uniform(6, 5, -1.0);
        left.write_back(&mut rebuilt);
        right.write_back(&mut rebuilt);
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn test_boundary_values_read_owned_edges() {
        let mut field = GlobalField::uniform(7, 5, 0.0);
        for y in 0..5 {
            for x in 0..7 {
                field.set(x, y, (x + 10 * y) as f64);
            }
        }
        let mut tile = Tile::new(region(2, 1, 3, 2), 7, 5);
        tile.load(&field);

        assert_eq!(tile.boundary_values(Direction::North), vec![12.0, 13.0, 14.0]);
        assert_eq!(tile.boundary_values(Direction::South), vec![22.0, 23.0, 24.0]);
        assert_eq!(tile.boundary_values(Direction::West), vec![12.0, 22.0]);
        assert_eq!(tile.boundary_values(Direction::East), vec![14.0, 24.0]);
    }

    #[test]
    fn test_pushed_halo_feeds_the_stencil_after_swap() {
        let mut tile = Tile::new(region(2, 3, 4, 3), 9, 9);
        tile.load(&GlobalField::uniform(9, 9, 1.0));

        tile.receive_halo(Direction::West, &[7.0, 8.0, 9.0]);
        tile.swap();
        tile.apply_stencil(1.0);
        tile.swap();

        // West column cells pick up the pushed halo through the stencil.
        assert_eq!(tile.owned_value(0, 0), 7.0);
        assert_eq!(tile.owned_value(0, 1), 8.0);
        assert_eq!(tile.owned_value(0, 2), 9.0);
        // Cells away from the west edge see only uniform neighbors.
        assert_eq!(tile.owned_value(1, 1), 1.0);
        assert_eq!(tile.owned_value(3, 1), 1.0);
    }

    #[test]
    fn test_swap_flips_between_two_planes() {
        let tile = Tile::new(region(1, 1, 2, 2), 5, 5);
        assert_eq!(tile.front.load(Ordering::Relaxed), 0);
        tile.swap();
        assert_eq!(tile.front.load(Ordering::Relaxed), 1);
        tile.swap();
        assert_eq!(tile.front.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_single_tile_step_on_heated_block() {
        // 5x5 grid, heated block over [1,2]x[1,2], one step at alpha 0.25.
        let mut tile = Tile::new(region(0, 0, 5, 5), 5, 5);
        tile.load(&GlobalField::with_hot_block(5, 5));

        tile.swap();
        tile.apply_stencil(0.25);
        tile.swap();

        let expected = [
            [1.5, 1.5, 1.25],
            [1.5, 1.5, 1.25],
            [1.25, 1.25, 1.0],
        ];
        for (dy, row) in expected.iter().enumerate() {
            for (dx, &value) in row.iter().enumerate() {
                assert_eq!(
                    tile.owned_value(1 + dx, 1 + dy),
                    value,
                    "cell ({}, {})",
                    1 + dx,
                    1 + dy
                );
            }
        }
        // The frozen boundary keeps its loaded values.
        assert_eq!(tile.owned_value(0, 0), 1.0);
        assert_eq!(tile.owned_value(4, 4), 1.0);
        assert_eq!(tile.owned_value(0, 2), 1.0);
    }

    #[test]
    fn test_boundary_only_tile_is_inert() {
        // A width-1 tile on the global west edge owns only frozen cells.
        let mut tile = Tile::new(region(0, 0, 1, 5), 5, 5);
        tile.load(&GlobalField::with_hot_block(5, 5));
        assert_eq!((tile.lx0, tile.lx1), (1, 1));

        tile.swap();
        tile.apply_stencil(0.25);
        tile.swap();

        let mut field = GlobalField::uniform(5, 5, 0.0);
        tile.write_back(&mut field);
        for y in 0..5 {
            assert_eq!(field.get(0, y), 1.0);
        }
        // Its eastern offering is the frozen column itself.
        assert_eq!(tile.boundary_values(Direction::East), vec![1.0; 5]);
    }
}
