//! 2-D discrete Fourier transform plumbing for the spectral potential path.
//!
//! The forward transform is unnormalized and the inverse divides by the cell
//! count, so `inverse(forward(x))` reproduces `x`.

use std::fmt;
use std::sync::Arc;

use ndarray::{Array2, ArrayView1, Axis, Zip};
use rayon::prelude::*;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::simulation::Matrix;

/// Dense complex matrix, the frequency-domain counterpart of [`Matrix`]
pub type ComplexMatrix = Array2<Complex<f64>>;

/// Cached forward/inverse FFT plans for one grid shape.
///
/// Rows are transformed in parallel, then the transposed matrix is copied
/// into standard layout so the column pass also works on contiguous lanes.
#[derive(Clone)]
pub struct SpectralTransform {
    rows: usize,
    cols: usize,
    row_forward: Arc<dyn Fft<f64>>,
    row_inverse: Arc<dyn Fft<f64>>,
    col_forward: Arc<dyn Fft<f64>>,
    col_inverse: Arc<dyn Fft<f64>>,
}

impl fmt::Debug for SpectralTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectralTransform")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .finish()
    }
}

impl SpectralTransform {
    /// Plan transforms for `rows x cols` matrices
    pub fn new(rows: usize, cols: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            rows,
            cols,
            row_forward: planner.plan_fft_forward(cols),
            row_inverse: planner.plan_fft_inverse(cols),
            col_forward: planner.plan_fft_forward(rows),
            col_inverse: planner.plan_fft_inverse(rows),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Forward 2-D transform of a real matrix
    pub fn forward(&self, m: &Matrix) -> ComplexMatrix {
        assert_eq!(m.dim(), self.shape(), "forward: shape mismatch with plan");
        let lifted = m.mapv(|re| Complex::new(re, 0.0));
        self.transform(lifted, &self.row_forward, &self.col_forward)
    }

    /// Inverse 2-D transform, normalized by the cell count
    pub fn inverse(&self, m: &ComplexMatrix) -> ComplexMatrix {
        assert_eq!(m.dim(), self.shape(), "inverse: shape mismatch with plan");
        let mut out = self.transform(m.to_owned(), &self.row_inverse, &self.col_inverse);

        let n = (self.rows * self.cols) as f64;
        out.par_mapv_inplace(|z| z / n);
        out
    }

    fn transform(&self, mut data: ComplexMatrix, row_fft: &Arc<dyn Fft<f64>>, col_fft: &Arc<dyn Fft<f64>>) -> ComplexMatrix {
        if self.rows == 0 || self.cols == 0 {
            return data;
        }

        fft_rows(&mut data, row_fft);
        let mut columns = data.t().as_standard_layout().into_owned();
        fft_rows(&mut columns, col_fft);
        columns.t().as_standard_layout().into_owned()
    }
}

/// Run a 1-D transform over every row
fn fft_rows(data: &mut ComplexMatrix, fft: &Arc<dyn Fft<f64>>) {
    data.axis_iter_mut(Axis(0))
        .into_par_iter()
        .for_each(|mut row| match row.as_slice_mut() {
            Some(lane) => fft.process(lane),
            None => {
                let mut lane = row.to_vec();
                fft.process(&mut lane);
                row.assign(&ArrayView1::from(&lane[..]));
            }
        });
}

/// Elementwise complex product of two matrices of the same shape
pub fn complex_mul_elem(a: &ComplexMatrix, b: &ComplexMatrix) -> ComplexMatrix {
    assert_eq!(a.dim(), b.dim(), "complex_mul_elem: shape mismatch");
    Zip::from(a).and(b).par_map_collect(|x, y| x * y)
}

/// Drop the imaginary parts
pub fn real_part(m: &ComplexMatrix) -> Matrix {
    m.mapv(|z| z.re)
}

/// Move entry `[[i, j]]` to `[[(i + dy) mod H, (j + dx) mod W]]`
pub fn circular_shift(m: &Matrix, dy: isize, dx: isize) -> Matrix {
    let (rows, cols) = m.dim();
    if rows == 0 || cols == 0 {
        return m.clone();
    }
    Matrix::from_shape_fn((rows, cols), |(i, j)| {
        let si = (i as isize - dy).rem_euclid(rows as isize) as usize;
        let sj = (j as isize - dx).rem_euclid(cols as isize) as usize;
        m[[si, sj]]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::max_abs_diff;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_matrix(rows: usize, cols: usize, seed: u64) -> Matrix {
        let mut rng = StdRng::seed_from_u64(seed);
        Matrix::from_shape_fn((rows, cols), |_| rng.gen_range(-2.0..2.0))
    }

    #[test]
    fn test_roundtrip_reproduces_input() {
        for (rows, cols) in [(8, 8), (12, 20), (17, 5)] {
            let x = random_matrix(rows, cols, 42);
            let fft = SpectralTransform::new(rows, cols);
            let back = real_part(&fft.inverse(&fft.forward(&x)));
            let err = max_abs_diff(&back, &x);
            assert!(err < 1e-10, "Round trip error {} too large for {}x{}", err, rows, cols);
        }
    }

    #[test]
    fn test_forward_dc_term_is_sum() {
        let x = random_matrix(6, 10, 1);
        let fft = SpectralTransform::new(6, 10);
        let spectrum = fft.forward(&x);
        let dc = spectrum[[0, 0]];
        assert!((dc.re - x.sum()).abs() < 1e-10);
        assert!(dc.im.abs() < 1e-10);
    }

    #[test]
    fn test_forward_of_impulse_is_flat() {
        let mut x = Matrix::zeros((4, 4));
        x[[0, 0]] = 1.0;
        let spectrum = SpectralTransform::new(4, 4).forward(&x);
        for z in spectrum.iter() {
            assert!((z.re - 1.0).abs() < 1e-12 && z.im.abs() < 1e-12);
        }
    }

    #[test]
    fn test_complex_mul_elem() {
        let a = array![[Complex::new(1.0, 2.0), Complex::new(0.0, 1.0)]];
        let b = array![[Complex::new(3.0, -1.0), Complex::new(0.0, 1.0)]];
        let c = complex_mul_elem(&a, &b);
        assert_eq!(c[[0, 0]], Complex::new(5.0, 5.0));
        assert_eq!(c[[0, 1]], Complex::new(-1.0, 0.0));
    }

    #[test]
    fn test_circular_shift_wraps() {
        let m = Matrix::from_shape_fn((3, 4), |(i, j)| (i * 4 + j) as f64);
        let shifted = circular_shift(&m, 1, -1);
        assert_eq!(shifted[[1, 3]], m[[0, 0]]);
        assert_eq!(shifted[[0, 0]], m[[2, 1]]);

        let back = circular_shift(&shifted, -1, 1);
        assert_eq!(back, m);
    }
}
