/// Grid dimensions (512x512 = 262K cells)
pub const GRID_WIDTH: usize = 512;
pub const GRID_HEIGHT: usize = 512;

// ============================================
// Lenia Parameters
// ============================================

/// Kernel radius in cells
pub const DEFAULT_RADIUS: usize = 80;

/// Time steps per unit time (Dt = 1/T)
pub const DEFAULT_PERIOD: f64 = 40.0;

/// Growth center
pub const DEFAULT_MU: f64 = 0.23;

/// Growth width
pub const DEFAULT_SIGMA: f64 = 0.024;

/// Ring weights, comma separated (one ring per entry)
pub const DEFAULT_BETA: &str = "1,0.6,0.3";

/// Exponent `a` shared by the exponential and polynomial kernel cores
pub const KERNEL_CORE_ALPHA: f64 = 4.0;

// ============================================
// Potential Computation
// ============================================

/// Largest kernel side (2R+1) for which `PotentialPolicy::Auto` picks the
/// direct spatial convolution. Above this the FFT path is cheaper.
pub const SPATIAL_MAX_KERNEL_SIDE: usize = 11;

/// Tolerance used when cross-checking the spatial and spectral paths
pub const POTENTIAL_TOLERANCE: f64 = 1e-6;

// ============================================
// Initial State
// ============================================

/// Patch count is drawn from [width / MIN_DIVISOR, width / MAX_DIVISOR]
pub const PATCH_COUNT_MIN_DIVISOR: usize = 50;
pub const PATCH_COUNT_MAX_DIVISOR: usize = 30;

/// Patch half-widths at full scale (512 cells): drawn from [MIN, MAX)
pub const PATCH_HALF_WIDTH_MIN: usize = 20;
pub const PATCH_HALF_WIDTH_MAX: usize = 50;

/// Grid side at which the half-widths above apply unscaled
pub const PATCH_REFERENCE_SIDE: usize = 512;

// ============================================
// Tick Driver
// ============================================

/// Interval between ticks-per-second log lines
pub const RATE_LOG_INTERVAL_SECS: f64 = 1.0;

/// Default number of ticks for a headless run
pub const DEFAULT_STEPS: u64 = 200;

/// Sleep between polls while the driver is paused or waiting for a tick
pub const IDLE_POLL_MILLIS: u64 = 5;

/// Longest wall-clock wait between realtime ticks; larger `Dt` values
/// (tiny `T`) are capped to this
pub const MAX_TICK_PERIOD_SECS: u64 = 60;
