//! Potential computation: the grid convolved with the kernel.
//!
//! Two strategies share one contract (output has the grid's shape):
//! the spectral path multiplies Fourier transforms and is `O(N log N)`,
//! the spatial path sums each neighbourhood directly in `O(N * side^2)`.

use std::fmt;
use std::str::FromStr;

use ndarray::{s, Zip};

use crate::compute::kernel::Kernel;
use crate::compute::spectral::{complex_mul_elem, real_part, ComplexMatrix, SpectralTransform};
use crate::config::SPATIAL_MAX_KERNEL_SIDE;
use crate::simulation::Matrix;

/// How the spatial path treats cells beyond the grid edge
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Boundary {
    /// Toroidal: the grid wraps, identical to the spectral path
    #[default]
    Wrap,
    /// Cells outside the grid count as zero
    Zero,
}

/// Concrete potential algorithm for one step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PotentialStrategy {
    Spectral,
    Spatial,
}

/// Selection rule for the potential algorithm
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PotentialPolicy {
    /// Always use the FFT path
    Spectral,
    /// Always use direct convolution
    Spatial,
    /// Direct convolution for kernels up to `max_spatial_side`, FFT above
    Auto { max_spatial_side: usize },
}

impl Default for PotentialPolicy {
    fn default() -> Self {
        PotentialPolicy::Auto {
            max_spatial_side: SPATIAL_MAX_KERNEL_SIDE,
        }
    }
}

impl PotentialPolicy {
    /// Pick the strategy for a kernel of the given side
    pub fn resolve(self, kernel_side: usize) -> PotentialStrategy {
        match self {
            PotentialPolicy::Spectral => PotentialStrategy::Spectral,
            PotentialPolicy::Spatial => PotentialStrategy::Spatial,
            PotentialPolicy::Auto { max_spatial_side } => {
                if kernel_side <= max_spatial_side {
                    PotentialStrategy::Spatial
                } else {
                    PotentialStrategy::Spectral
                }
            }
        }
    }
}

impl fmt::Display for PotentialPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PotentialPolicy::Spectral => write!(f, "spectral"),
            PotentialPolicy::Spatial => write!(f, "spatial"),
            PotentialPolicy::Auto { max_spatial_side } => write!(f, "auto(<={})", max_spatial_side),
        }
    }
}

impl FromStr for PotentialPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spectral" | "fft" => Ok(PotentialPolicy::Spectral),
            "spatial" | "direct" => Ok(PotentialPolicy::Spatial),
            "auto" => Ok(PotentialPolicy::default()),
            other => Err(format!("unknown policy '{}', expected auto, spectral or spatial", other)),
        }
    }
}

/// Spectral potential: `real(inverse(spectrum * forward(grid)))`
pub fn spectral_potential(grid: &Matrix, spectrum: &ComplexMatrix, fft: &SpectralTransform) -> Matrix {
    real_part(&fft.inverse(&complex_mul_elem(spectrum, &fft.forward(grid))))
}

/// Spatial potential with toroidal boundary, the counterpart of the spectral path
pub fn spatial_potential(grid: &Matrix, kernel: &Kernel) -> Matrix {
    convolve(grid, kernel, Boundary::Wrap)
}

/// Direct convolution: pad the grid by the kernel half-width, then sum each
/// `side x side` neighbourhood weighted by the kernel.
///
/// The kernel is radially symmetric, so no flip is needed.
pub fn convolve(grid: &Matrix, kernel: &Kernel, boundary: Boundary) -> Matrix {
    let (rows, cols) = grid.dim();
    let mut out = Matrix::zeros((rows, cols));
    if rows == 0 || cols == 0 {
        return out;
    }

    let side = kernel.side();
    let weights = kernel.weights();
    let padded = pad(grid, kernel.radius(), boundary);

    Zip::indexed(&mut out).par_for_each(|(i, j), cell| {
        let window = padded.slice(s![i..i + side, j..j + side]);
        *cell = Zip::from(window).and(weights).fold(0.0, |acc, x, k| acc + x * k);
    });
    out
}

/// Surround a matrix with `padding` cells on every side
fn pad(m: &Matrix, padding: usize, boundary: Boundary) -> Matrix {
    let (rows, cols) = m.dim();
    let shape = (rows + 2 * padding, cols + 2 * padding);
    match boundary {
        Boundary::Zero => {
            let mut padded = Matrix::zeros(shape);
            padded
                .slice_mut(s![padding..padding + rows, padding..padding + cols])
                .assign(m);
            padded
        }
        Boundary::Wrap => {
            if rows == 0 || cols == 0 {
                return Matrix::zeros(shape);
            }
            let p = padding as isize;
            Matrix::from_shape_fn(shape, |(i, j)| {
                let si = (i as isize - p).rem_euclid(rows as isize) as usize;
                let sj = (j as isize - p).rem_euclid(cols as isize) as usize;
                m[[si, sj]]
            })
        }
    }
}
