//! Physical diffusion parameters and the derived update coefficient.

/// Physical parameters for a 2D diffusion problem.
///
/// The solver itself consumes a single dimensionless coefficient; this type
/// derives it from a physical description of the domain:
///
/// - `dx = x_len / (nx - 1)`, `dy = y_len / (ny - 1)`
/// - `dt = sigma * dx * dy / nu`
/// - `alpha = nu * dt / dx^2`
///
/// On square-cell grids (`dx == dy`) the coefficient reduces to `sigma`.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffusionParams {
    /// Domain extent along x.
    pub x_len: f64,
    /// Domain extent along y.
    pub y_len: f64,
    /// Stability factor scaling the time step.
    pub sigma: f64,
    /// Diffusion coefficient.
    pub nu: f64,
    /// Spatial step along x (derived).
    pub dx: f64,
    /// Spatial step along y (derived).
    pub dy: f64,
    /// Time step per iteration (derived).
    pub dt: f64,
}

impl Default for DiffusionParams {
    fn default() -> Self {
        Self::for_grid(64, 64)
    }
}

impl DiffusionParams {
    /// Create parameters for an `nx` x `ny` grid over an `x_len` x `y_len`
    /// domain, deriving the spatial steps and the time step.
    pub fn new(x_len: f64, y_len: f64, nx: usize, ny: usize, sigma: f64, nu: f64) -> Self {
        let dx = x_len / (nx - 1) as f64;
        let dy = y_len / (ny - 1) as f64;
        let dt = sigma * dx * dy / nu;
        Self {
            x_len,
            y_len,
            sigma,
            nu,
            dx,
            dy,
            dt,
        }
    }

    /// The canonical setup for an `nx` x `ny` grid: a 2.0 x 2.0 domain with
    /// sigma = 0.25 and nu = 0.05.
    pub fn for_grid(nx: usize, ny: usize) -> Self {
        Self::new(2.0, 2.0, nx, ny, 0.25, 0.05)
    }

    /// The dimensionless coefficient consumed by the stencil.
    pub fn alpha(&self) -> f64 {
        self.nu * self.dt / (self.dx * self.dx)
    }

    /// Whether the explicit scheme is stable at this coefficient.
    ///
    /// The 2D forward-Euler limit is `alpha <= 0.25`; beyond it the update
    /// amplifies high-frequency modes instead of damping them.
    pub fn is_stable(&self) -> bool {
        self.alpha() <= 0.25
    }
}
