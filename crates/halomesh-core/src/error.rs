//! Error types for the halomesh engine.

use thiserror::Error;

/// Result type for halomesh operations.
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors raised while configuring a solve.
///
/// Every variant is detected before the worker pool starts; a solve never
/// begins and then fails partway through on a configuration problem.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// The global grid has no interior cells to update.
    #[error("Grid {nx}x{ny} is too small: both dimensions must be at least 3")]
    GridTooSmall {
        /// Requested grid width.
        nx: usize,
        /// Requested grid height.
        ny: usize,
    },

    /// An explicit worker-grid shape does not multiply to the worker count.
    #[error("Worker grid {px}x{py} does not match worker count {workers}")]
    WorkerCountMismatch {
        /// Requested tile columns.
        px: usize,
        /// Requested tile rows.
        py: usize,
        /// Worker count the shape was checked against.
        workers: usize,
    },

    /// The decomposition would hand some worker a tile with no cells.
    #[error("Worker grid {px}x{py} produces an empty tile on a {nx}x{ny} grid")]
    EmptyTile {
        /// Tile columns.
        px: usize,
        /// Tile rows.
        py: usize,
        /// Grid width.
        nx: usize,
        /// Grid height.
        ny: usize,
    },

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
