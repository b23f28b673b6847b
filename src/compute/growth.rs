//! Growth mapping from neighbourhood potential to rate of change.

use crate::simulation::Matrix;

/// Gaussian growth: `2 exp(-(u - mu)^2 / (2 sigma^2)) - 1`, in (-1, 1]
#[inline]
pub fn growth(u: f64, mu: f64, sigma: f64) -> f64 {
    let d = u - mu;
    2.0 * (-(d * d) / (2.0 * sigma * sigma)).exp() - 1.0
}

/// Pointwise growth mapping over a potential matrix
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrowthMap {
    pub mu: f64,
    pub sigma: f64,
}

impl GrowthMap {
    pub fn new(mu: f64, sigma: f64) -> Self {
        Self { mu, sigma }
    }

    /// Map a potential to growth rates
    pub fn apply(&self, potential: &Matrix) -> Matrix {
        let mut out = potential.clone();
        self.apply_in_place(&mut out);
        out
    }

    /// Overwrite a potential matrix with its growth rates
    pub fn apply_in_place(&self, potential: &mut Matrix) {
        let (mu, sigma) = (self.mu, self.sigma);
        potential.par_mapv_inplace(|u| growth(u, mu, sigma));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maximum_at_mu() {
        let (mu, sigma) = (0.23, 0.024);
        assert_eq!(growth(mu, mu, sigma), 1.0);
        for d in [1e-6, 0.01, 0.05, 0.3] {
            assert!(growth(mu + d, mu, sigma) < 1.0);
            assert!(growth(mu - d, mu, sigma) < 1.0);
        }
    }

    #[test]
    fn test_symmetric_around_mu() {
        let (mu, sigma) = (0.15, 0.017);
        for d in [0.0, 0.003, 0.01, 0.02, 0.1, 5.0] {
            let up = growth(mu + d, mu, sigma);
            let down = growth(mu - d, mu, sigma);
            assert!((up - down).abs() < 1e-12, "g(mu+{d}) = {up}, g(mu-{d}) = {down}");
        }
    }

    #[test]
    fn test_range() {
        let (mu, sigma) = (0.5, 0.1);
        for i in 0..=100 {
            let g = growth(i as f64 / 100.0, mu, sigma);
            assert!(g > -1.0 && g <= 1.0);
        }
        // Far tails saturate at -1
        assert!((growth(100.0, mu, sigma) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_apply_matches_scalar() {
        let map = GrowthMap::new(0.3, 0.05);
        let potential = Matrix::from_shape_fn((3, 4), |(i, j)| (i * 4 + j) as f64 / 20.0);
        let grown = map.apply(&potential);
        assert_eq!(grown.dim(), (3, 4));
        ndarray::Zip::from(&grown)
            .and(&potential)
            .for_each(|&g, &u| assert_eq!(g, growth(u, 0.3, 0.05)));
    }
}
