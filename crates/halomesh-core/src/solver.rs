//! The barrier-phased solver: worker pool, exchange protocol, aggregation.
//!
//! Each iteration runs the same five phases on every worker:
//!
//! 1. push boundary values into each present neighbor's halo ring
//! 2. barrier
//! 3. swap, promoting the freshly haloed staging plane to `current`
//! 4. apply the stencil into the new staging plane
//! 5. barrier
//!
//! The two barriers are the only cross-tile synchronization in the run;
//! halo values move by direct writes into the neighboring tile's buffer.
//! After the last iteration one extra swap promotes the final generation,
//! then the joined main thread scatters tiles back into the global field
//! and reduces the statistics.

use std::sync::Barrier;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::{MeshError, Result};
use crate::field::{FieldStats, GlobalField};
use crate::partition::{partition, OwnedRegion, WorkerGrid};
use crate::tile::Tile;
use crate::topology::{Direction, TileId, Topology};

/// Configuration for one solve.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Global grid width in cells (at least 3).
    pub nx: usize,
    /// Global grid height in cells (at least 3).
    pub ny: usize,
    /// Number of iterations to run.
    pub nt: usize,
    /// Stencil update coefficient.
    pub alpha: f64,
    /// Worker-grid shape; the run uses exactly one thread per tile.
    pub workers: WorkerGrid,
}

/// Outcome of a completed solve.
#[derive(Debug, Clone)]
pub struct SolveReport {
    /// Mean and population standard deviation of the final field.
    pub stats: FieldStats,
    /// Wall time spent inside the worker pool.
    pub elapsed: Duration,
    /// Iterations executed.
    pub iterations: usize,
    /// Worker-grid shape used.
    pub workers: WorkerGrid,
}

/// A configured diffusion solve over a decomposed grid.
///
/// Construction validates the configuration, partitions the grid, and
/// resolves the neighbor registry; `run` can then no longer fail on a
/// configuration problem.
pub struct DiffusionSolver {
    config: SolverConfig,
    regions: Vec<OwnedRegion>,
    topology: Topology,
    field: GlobalField,
}

impl DiffusionSolver {
    /// Validate the configuration and stage the canonical heated-block
    /// initial condition.
    pub fn new(config: SolverConfig) -> Result<Self> {
        let field = GlobalField::with_hot_block(config.nx, config.ny);
        Self::with_field(config, field)
    }

    /// Validate the configuration and stage a caller-supplied field.
    pub fn with_field(config: SolverConfig, field: GlobalField) -> Result<Self> {
        let regions = partition(config.nx, config.ny, config.workers)?;
        if field.nx() != config.nx || field.ny() != config.ny {
            return Err(MeshError::InvalidConfig(format!(
                "field is {}x{} but the configuration says {}x{}",
                field.nx(),
                field.ny(),
                config.nx,
                config.ny
            )));
        }
        let topology = Topology::new(config.workers);
        Ok(Self {
            config,
            regions,
            topology,
            field,
        })
    }

    /// The global field: the initial condition before [`run`](Self::run),
    /// the final state after it.
    pub fn field(&self) -> &GlobalField {
        &self.field
    }

    /// The solve configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Run the configured number of iterations from the current field
    /// state and report the final statistics.
    pub fn run(&mut self) -> SolveReport {
        let worker_count = self.config.workers.worker_count();
        info!(
            "decomposed {}x{} grid into {} tiles ({}x{} workers), running {} iterations",
            self.config.nx,
            self.config.ny,
            worker_count,
            self.config.workers.px(),
            self.config.workers.py(),
            self.config.nt
        );

        let mut tiles: Vec<Tile> = self
            .regions
            .iter()
            .map(|&owned| Tile::new(owned, self.config.nx, self.config.ny))
            .collect();
        for tile in &mut tiles {
            tile.load(&self.field);
        }

        let barrier = Barrier::new(worker_count);
        let topology = &self.topology;
        let alpha = self.config.alpha;
        let nt = self.config.nt;

        let started = Instant::now();
        thread::scope(|scope| {
            for (index, tile) in tiles.iter().enumerate() {
                let barrier = &barrier;
                let tiles = &tiles;
                scope.spawn(move || {
                    let id = TileId(index);
                    for _ in 0..nt {
                        for side in Direction::ALL {
                            if let Some(neighbor) = topology.neighbor(id, side) {
                                let edge = tile.boundary_values(side);
                                tiles[neighbor.0].receive_halo(side.opposite(), &edge);
                            }
                        }
                        barrier.wait();
                        tile.swap();
                        tile.apply_stencil(alpha);
                        barrier.wait();
                    }
                    // Promote the final generation for aggregation.
                    tile.swap();
                });
            }
        });
        let elapsed = started.elapsed();

        for tile in &tiles {
            tile.write_back(&mut self.field);
        }
        let stats = self.field.stats();

        debug!(
            "solve finished in {:.3} ms: mean {:.9}, std dev {:.9}",
            elapsed.as_secs_f64() * 1e3,
            stats.mean,
            stats.std_dev
        );

        SolveReport {
            stats,
            elapsed,
            iterations: nt,
            workers: self.config.workers,
        }
    }
}
