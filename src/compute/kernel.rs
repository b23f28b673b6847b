//! Ring-weighted radial kernel and its frequency-domain form.

use std::fmt;
use std::str::FromStr;

use ndarray::s;

use crate::compute::radial;
use crate::compute::spectral::{circular_shift, ComplexMatrix, SpectralTransform};
use crate::config::KERNEL_CORE_ALPHA;
use crate::error::{LeniaError, Result};
use crate::simulation::Matrix;

/// Radial profile of a single ring, evaluated on `r` in (0, 1).
///
/// Both profiles vanish at the ring boundaries and peak at `r = 0.5`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KernelCore {
    /// `exp(a - a / (4r(1-r)))`
    #[default]
    Exponential,
    /// `(4r(1-r))^a`
    Polynomial,
}

impl KernelCore {
    /// Evaluate the profile. Returns 0 outside the open interval (0, 1).
    pub fn eval(self, r: f64) -> f64 {
        if !(r > 0.0 && r < 1.0) {
            return 0.0;
        }
        let q = 4.0 * r * (1.0 - r);
        match self {
            KernelCore::Exponential => (KERNEL_CORE_ALPHA - KERNEL_CORE_ALPHA / q).exp(),
            KernelCore::Polynomial => q.powf(KERNEL_CORE_ALPHA),
        }
    }
}

impl fmt::Display for KernelCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelCore::Exponential => write!(f, "exponential"),
            KernelCore::Polynomial => write!(f, "polynomial"),
        }
    }
}

impl FromStr for KernelCore {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exp" | "exponential" => Ok(KernelCore::Exponential),
            "poly" | "polynomial" => Ok(KernelCore::Polynomial),
            other => Err(format!("unknown kernel core '{}', expected exponential or polynomial", other)),
        }
    }
}

/// Normalized convolution kernel of side `2R+1`
#[derive(Clone, Debug, PartialEq)]
pub struct Kernel {
    radius: usize,
    weights: Matrix,
}

impl Kernel {
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Side length, `2R+1`
    pub fn side(&self) -> usize {
        self.weights.nrows()
    }

    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    /// Weight at (row, col) with the center at (R, R)
    pub fn value(&self, row: usize, col: usize) -> Result<f64> {
        self.weights.get((row, col)).copied().ok_or(LeniaError::OutOfBounds {
            row,
            col,
            rows: self.side(),
            cols: self.side(),
        })
    }
}

/// Build the normalized kernel for radius `R`, spatial step `dx` and ring
/// weights `beta`.
///
/// Distances are scaled by `dx * len(beta)` so ring `k` covers ring index
/// `v` in `[k, k+1)`. Cells with `v >= len(beta)` are zero.
pub fn build_kernel(radius: usize, dx: f64, beta: &[f64], core: KernelCore) -> Result<Kernel> {
    if beta.is_empty() {
        return Err(LeniaError::invalid("Beta", "needs at least one ring weight"));
    }

    let rings = beta.len() as f64;
    let scale = dx * rings;

    let mut weights = radial::build(radius);
    weights.mapv_inplace(|distance| {
        let ring_index = distance * scale;
        if ring_index >= rings {
            0.0
        } else {
            beta[ring_index.floor() as usize] * core.eval(ring_index.fract())
        }
    });

    let total = weights.sum();
    if !(total > 0.0) || !total.is_finite() {
        return Err(LeniaError::DegenerateKernel {
            radius,
            rings: beta.len(),
        });
    }
    weights.mapv_inplace(|w| w / total);

    Ok(Kernel { radius, weights })
}

/// Frequency-domain kernel for a `rows x cols` grid.
///
/// The kernel is zero-padded into the grid and shifted by `-R` on both axes
/// so its center sits at (0, 0).
pub fn derive_spectrum(kernel: &Kernel, fft: &SpectralTransform) -> ComplexMatrix {
    let (rows, cols) = fft.shape();
    let side = kernel.side();
    debug_assert!(side <= rows && side <= cols, "kernel larger than grid");

    let (fit_rows, fit_cols) = (side.min(rows), side.min(cols));
    let mut padded = Matrix::zeros((rows, cols));
    padded
        .slice_mut(s![..fit_rows, ..fit_cols])
        .assign(&kernel.weights.slice(s![..fit_rows, ..fit_cols]));

    let r = kernel.radius as isize;
    fft.forward(&circular_shift(&padded, -r, -r))
}
