use std::fmt;
use std::str::FromStr;

use ndarray::{s, Array2, Zip};
use rand::Rng;

use crate::config::{
    PATCH_COUNT_MAX_DIVISOR, PATCH_COUNT_MIN_DIVISOR, PATCH_HALF_WIDTH_MAX, PATCH_HALF_WIDTH_MIN,
    PATCH_REFERENCE_SIDE,
};

/// Dense real matrix, indexed `[[row, col]]`.
///
/// Used for the world grid, the kernel, potentials and growth maps.
pub type Matrix = Array2<f64>;

/// Largest absolute difference between two matrices of the same shape
pub fn max_abs_diff(a: &Matrix, b: &Matrix) -> f64 {
    assert_eq!(a.dim(), b.dim(), "max_abs_diff: shape mismatch");
    Zip::from(a).and(b).fold(0.0f64, |acc, x, y| acc.max((x - y).abs()))
}

/// Initial-state policy for `reinitialize`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InitMode {
    /// Random rectangles of random values, zero elsewhere
    #[default]
    Patchy,
    /// Every cell random
    Full,
}

impl fmt::Display for InitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitMode::Patchy => write!(f, "patchy"),
            InitMode::Full => write!(f, "full"),
        }
    }
}

impl FromStr for InitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "patchy" => Ok(InitMode::Patchy),
            "full" => Ok(InitMode::Full),
            other => Err(format!("unknown init mode '{}', expected patchy or full", other)),
        }
    }
}

/// Generate a fresh grid with the given policy.
///
/// Every written value comes from `gen::<f64>()` and lies in [0, 1), so the
/// grid invariant holds without clipping.
pub fn seed_grid<R: Rng>(rows: usize, cols: usize, mode: InitMode, rng: &mut R) -> Matrix {
    let mut grid = Matrix::zeros((rows, cols));
    match mode {
        InitMode::Patchy => seed_patchy(&mut grid, rng),
        InitMode::Full => seed_full(&mut grid, rng),
    }
    grid
}

/// Fill every cell with an independent uniform value
pub fn seed_full<R: Rng>(grid: &mut Matrix, rng: &mut R) {
    grid.map_inplace(|v| *v = rng.gen::<f64>());
}

/// Fill random in-bounds rectangles with independent uniform values.
///
/// Overlapping patches simply overwrite each other.
pub fn seed_patchy<R: Rng>(grid: &mut Matrix, rng: &mut R) {
    let (rows, cols) = grid.dim();
    if rows == 0 || cols == 0 {
        return;
    }

    // Random number of patches according to grid width
    let min_count = (cols / PATCH_COUNT_MIN_DIVISOR).max(1);
    let max_count = (cols / PATCH_COUNT_MAX_DIVISOR).max(min_count);
    let count = rng.gen_range(min_count..=max_count);

    let (row_lo, row_hi) = half_width_range(rows);
    let (col_lo, col_hi) = half_width_range(cols);

    for _ in 0..count {
        let half_h = rng.gen_range(row_lo..=row_hi);
        let half_w = rng.gen_range(col_lo..=col_hi);

        // Center keeps [c - half, c + half) inside the grid
        let ci = rng.gen_range(half_h..=rows - half_h);
        let cj = rng.gen_range(half_w..=cols - half_w);

        grid.slice_mut(s![ci - half_h..ci + half_h, cj - half_w..cj + half_w])
            .map_inplace(|v| *v = rng.gen::<f64>());
    }
}

/// Inclusive half-width range for a grid side, scaled from the reference side
/// and small enough that a patch always fits.
fn half_width_range(side: usize) -> (usize, usize) {
    let fit = side / 2;
    let hi = (PATCH_HALF_WIDTH_MAX * side / PATCH_REFERENCE_SIDE)
        .clamp(1, PATCH_HALF_WIDTH_MAX)
        .min(fit);
    let lo = (PATCH_HALF_WIDTH_MIN * side / PATCH_REFERENCE_SIDE)
        .clamp(1, PATCH_HALF_WIDTH_MIN)
        .min(hi);
    (lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_max_abs_diff() {
        let a = Matrix::from_shape_fn((2, 3), |(i, j)| (i * 3 + j) as f64);
        let mut b = a.clone();
        assert_eq!(max_abs_diff(&a, &b), 0.0);
        b[[1, 2]] -= 0.5;
        b[[0, 0]] += 0.25;
        assert_eq!(max_abs_diff(&a, &b), 0.5);
    }

    #[test]
    fn test_full_values_in_unit_interval() {
        let mut rng = StdRng::seed_from_u64(7);
        let grid = seed_grid(40, 30, InitMode::Full, &mut rng);
        assert!(grid.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(grid.iter().any(|&v| v > 0.0));
    }

    #[test]
    fn test_patchy_leaves_background_empty() {
        let mut rng = StdRng::seed_from_u64(11);
        let grid = seed_grid(512, 512, InitMode::Patchy, &mut rng);
        assert!(grid.iter().all(|v| (0.0..=1.0).contains(v)));

        let filled = grid.iter().filter(|&&v| v > 0.0).count();
        assert!(filled > 0, "Patchy init should write some cells");
        assert!(filled < grid.len(), "Patchy init should leave zeros");
    }

    #[test]
    fn test_patchy_small_grids_stay_in_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        for side in [3, 4, 7, 16, 33, 64] {
            let grid = seed_grid(side, side + 1, InitMode::Patchy, &mut rng);
            assert_eq!(grid.dim(), (side, side + 1));
        }
    }

    #[test]
    fn test_half_width_range_scales() {
        assert_eq!(half_width_range(512), (20, 50));
        assert_eq!(half_width_range(64), (2, 6));
        let (lo, hi) = half_width_range(3);
        assert!(lo <= hi && 2 * hi <= 3);
    }

    #[test]
    fn test_init_mode_parse() {
        assert_eq!("Full".parse::<InitMode>(), Ok(InitMode::Full));
        assert_eq!("patchy".parse::<InitMode>(), Ok(InitMode::Patchy));
        assert!("checkered".parse::<InitMode>().is_err());
    }
}
