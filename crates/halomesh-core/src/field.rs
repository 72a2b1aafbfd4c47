//! Global field storage, the canonical initial condition, and summary
//! statistics.

/// Background value of the canonical initial condition.
pub const BACKGROUND: f64 = 1.0;

/// Value of the heated block in the canonical initial condition.
pub const HOT: f64 = 2.0;

/// A dense 2D field of cell values, row-major with `y * nx + x` indexing.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalField {
    nx: usize,
    ny: usize,
    data: Vec<f64>,
}

impl GlobalField {
    /// A field filled with a single value.
    pub fn uniform(nx: usize, ny: usize, value: f64) -> Self {
        Self {
            nx,
            ny,
            data: vec![value; nx * ny],
        }
    }

    /// The canonical initial condition: [`BACKGROUND`] everywhere, with a
    /// heated block of [`HOT`] over `[nx/4, nx/2] x [ny/4, ny/2]`, both
    /// ranges inclusive.
    pub fn with_hot_block(nx: usize, ny: usize) -> Self {
        let mut field = Self::uniform(nx, ny, BACKGROUND);
        for y in ny / 4..=ny / 2 {
            for x in nx / 4..=nx / 2 {
                field.set(x, y, HOT);
            }
        }
        field
    }

    /// Grid width in cells.
    pub fn nx(&self) -> usize {
        self.nx
    }

    /// Grid height in cells.
    pub fn ny(&self) -> usize {
        self.ny
    }

    #[inline(always)]
    fn idx(&self, x: usize, y: usize) -> usize {
        y * self.nx + x
    }

    /// Value at `(x, y)`.
    #[inline(always)]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.data[self.idx(x, y)]
    }

    /// Set the value at `(x, y)`.
    #[inline(always)]
    pub fn set(&mut self, x: usize, y: usize, value: f64) {
        let idx = self.idx(x, y);
        self.data[idx] = value;
    }

    /// Row `y` as a slice.
    pub fn row(&self, y: usize) -> &[f64] {
        &self.data[y * self.nx..(y + 1) * self.nx]
    }

    pub(crate) fn row_mut(&mut self, y: usize) -> &mut [f64] {
        let nx = self.nx;
        &mut self.data[y * nx..(y + 1) * nx]
    }

    /// The whole field as a flat row-major slice.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mean and population standard deviation over all cells.
    pub fn stats(&self) -> FieldStats {
        FieldStats::compute(&self.data)
    }
}

/// Mean and population standard deviation of a set of cell values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldStats {
    /// Arithmetic mean.
    pub mean: f64,
    /// Population (biased) standard deviation.
    pub std_dev: f64,
}

impl FieldStats {
    /// Two-pass reduction: mean first, then the centered second moment.
    pub fn compute(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                mean: 0.0,
                std_dev: 0.0,
            };
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values
            .iter()
            .map(|v| {
                let d = v - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        Self {
            mean,
            std_dev: variance.sqrt(),
        }
    }
}
