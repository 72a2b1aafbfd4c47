//! # halomesh-core
//!
//! Barrier-synchronized halo-exchange engine for explicit 2D diffusion.
//!
//! A global field is split into one rectangular tile per worker. Each tile
//! carries a one-cell halo ring and two buffer planes; per iteration every
//! worker pushes its boundary rows into its neighbors' halo rings, meets a
//! barrier, promotes the freshly haloed plane with an O(1) swap, applies
//! the five-point stencil, and meets a second barrier. Those two barriers
//! are the only cross-tile synchronization in the run, so the result is
//! bitwise identical for every worker-grid shape.
//!
//! ## Example
//!
//! ```
//! use halomesh_core::{DiffusionSolver, MeshError, SolverConfig, WorkerGrid};
//!
//! let config = SolverConfig {
//!     nx: 32,
//!     ny: 32,
//!     nt: 10,
//!     alpha: 0.25,
//!     workers: WorkerGrid::new(2, 2)?,
//! };
//! let mut solver = DiffusionSolver::new(config)?;
//! let report = solver.run();
//! println!("mean {:.6} (std dev {:.6})", report.stats.mean, report.stats.std_dev);
//! # Ok::<(), MeshError>(())
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod field;
pub mod params;
pub mod partition;
pub mod solver;
pub mod topology;

mod tile;

pub use error::{MeshError, Result};
pub use field::{FieldStats, GlobalField, BACKGROUND, HOT};
pub use params::DiffusionParams;
pub use partition::{partition, OwnedRegion, WorkerGrid};
pub use solver::{DiffusionSolver, SolveReport, SolverConfig};
pub use topology::{Direction, Neighborhood, TileId, Topology};
