//! Read-side adapters for an external renderer.
//!
//! Drawing is not done here; these only turn engine state into buffers that
//! a window or an image encoder can consume.

use crate::compute::Kernel;
use crate::simulation::Matrix;

/// Grid as single-precision luminance, ready for upload
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Luma(pub f32);

/// Row-major luminance frame
#[derive(Clone, Debug, PartialEq)]
pub struct GridFrame {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Luma>,
}

impl GridFrame {
    /// Convert a grid, clipping each value to [0, 1]
    pub fn from_grid(grid: &Matrix) -> Self {
        let (height, width) = grid.dim();
        let pixels = grid
            .iter()
            .map(|&v| {
                let clipped = if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
                Luma(clipped as f32)
            })
            .collect();
        Self { width, height, pixels }
    }

    /// Raw bytes for a storage buffer or texture upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }
}

/// Kernel scaled by its maximum so the peak ring shows as 1
pub fn kernel_view(kernel: &Kernel) -> Matrix {
    let weights = kernel.weights();
    let peak = weights.iter().copied().fold(0.0, f64::max);
    let peak = if peak > 0.0 { peak } else { 1.0 };
    weights.mapv(|w| (w / peak).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::{build_kernel, KernelCore};

    #[test]
    fn test_luma_size() {
        assert_eq!(std::mem::size_of::<Luma>(), 4);
    }

    #[test]
    fn test_frame_bytes() {
        let grid = ndarray::array![[0.0, 0.25], [1.0, f64::NAN]];
        let frame = GridFrame::from_grid(&grid);
        assert_eq!((frame.width, frame.height), (2, 2));
        assert_eq!(frame.as_bytes().len(), 16);
        assert_eq!(frame.pixels[1], Luma(0.25));
        assert_eq!(frame.pixels[3], Luma(0.0));
    }

    #[test]
    fn test_kernel_view_peaks_at_one() {
        let kernel = build_kernel(12, 1.0 / 12.0, &[1.0, 0.6, 0.3], KernelCore::Exponential).unwrap();
        let view = kernel_view(&kernel);
        assert_eq!(view.dim(), (25, 25));
        assert!((view.fold(0.0, |a: f64, &b| a.max(b)) - 1.0).abs() < 1e-12);
        assert!(view.iter().all(|v| (0.0..=1.0).contains(v)));
    }
}
