pub mod convolution;
pub mod growth;
pub mod kernel;
pub mod radial;
pub mod spectral;

pub use convolution::{convolve, spatial_potential, spectral_potential, Boundary, PotentialPolicy, PotentialStrategy};
pub use growth::{growth, GrowthMap};
pub use kernel::{build_kernel, derive_spectrum, Kernel, KernelCore};
pub use spectral::{circular_shift, complex_mul_elem, real_part, ComplexMatrix, SpectralTransform};
