//! Domain decomposition: worker-grid shapes and owned-region rectangles.

use crate::error::{MeshError, Result};

/// Shape of the worker grid: `px` tile columns by `py` tile rows.
///
/// One worker owns exactly one tile, so the worker count is `px * py`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerGrid {
    px: usize,
    py: usize,
}

impl WorkerGrid {
    /// A worker grid with the given shape. Both sides must be nonzero.
    pub fn new(px: usize, py: usize) -> Result<Self> {
        if px == 0 || py == 0 {
            return Err(MeshError::InvalidConfig(format!(
                "worker grid {}x{} has an empty side",
                px, py
            )));
        }
        Ok(Self { px, py })
    }

    /// The most nearly square factorization of `workers`, wide side first.
    ///
    /// Prime counts degenerate to a single row of tiles.
    pub fn for_workers(workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(MeshError::InvalidConfig(
                "worker count must be at least 1".to_string(),
            ));
        }
        let mut py = (workers as f64).sqrt().floor() as usize;
        while py > 1 && workers % py != 0 {
            py -= 1;
        }
        Ok(Self {
            px: workers / py,
            py,
        })
    }

    /// Validate an explicit shape against an independently chosen worker
    /// count.
    pub fn with_count(workers: usize, px: usize, py: usize) -> Result<Self> {
        let grid = Self::new(px, py)?;
        if grid.worker_count() != workers {
            return Err(MeshError::WorkerCountMismatch { px, py, workers });
        }
        Ok(grid)
    }

    /// Tile columns.
    pub fn px(&self) -> usize {
        self.px
    }

    /// Tile rows.
    pub fn py(&self) -> usize {
        self.py
    }

    /// Total workers, one per tile.
    pub fn worker_count(&self) -> usize {
        self.px * self.py
    }

    /// Row-major tile index of grid position `(tx, ty)`.
    pub fn index_of(&self, tx: usize, ty: usize) -> usize {
        ty * self.px + tx
    }
}

/// A worker's owned rectangle in global cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnedRegion {
    /// First owned column.
    pub x0: usize,
    /// First owned row.
    pub y0: usize,
    /// Width in cells (at least 1).
    pub width: usize,
    /// Height in cells (at least 1).
    pub height: usize,
}

impl OwnedRegion {
    /// Number of owned cells.
    pub fn cells(&self) -> usize {
        self.width * self.height
    }

    /// Whether the region contains the global cell `(x, y)`.
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x0 && x < self.x0 + self.width && y >= self.y0 && y < self.y0 + self.height
    }
}

/// Split `n` cells across `k` workers as `(offset, extent)` pairs.
///
/// Extents differ by at most one, with the remainder going to the
/// lowest-indexed workers.
fn split_axis(n: usize, k: usize) -> Vec<(usize, usize)> {
    let base = n / k;
    let rem = n % k;
    let mut out = Vec::with_capacity(k);
    let mut offset = 0;
    for i in 0..k {
        let extent = base + usize::from(i < rem);
        out.push((offset, extent));
        offset += extent;
    }
    out
}

/// Decompose an `nx` x `ny` grid over a worker grid, row-major by tile.
///
/// The regions are contiguous, mutually disjoint, and cover the grid
/// exactly. Fails if the grid has no interior or if any tile would be
/// empty.
pub fn partition(nx: usize, ny: usize, grid: WorkerGrid) -> Result<Vec<OwnedRegion>> {
    if nx < 3 || ny < 3 {
        return Err(MeshError::GridTooSmall { nx, ny });
    }
    if grid.px > nx || grid.py > ny {
        return Err(MeshError::EmptyTile {
            px: grid.px,
            py: grid.py,
            nx,
            ny,
        });
    }
    let cols = split_axis(nx, grid.px);
    let rows = split_axis(ny, grid.py);
    let mut regions = Vec::with_capacity(grid.worker_count());
    for &(y0, height) in &rows {
        for &(x0, width) in &cols {
            regions.push(OwnedRegion {
                x0,
                y0,
                width,
                height,
            });
        }
    }
    Ok(regions)
}
