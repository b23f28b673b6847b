use crate::simulation::Matrix;

/// Distance-from-center matrix of side `2R+1`.
///
/// Entry `[[R+i, R+j]]` is `sqrt(i^2 + j^2)` for `i, j` in `[-R, R]`.
pub fn build(radius: usize) -> Matrix {
    let side = 2 * radius + 1;
    let r = radius as f64;
    Matrix::from_shape_fn((side, side), |(row, col)| {
        let di = row as f64 - r;
        let dj = col as f64 - r;
        (di * di + dj * dj).sqrt()
    })
}
