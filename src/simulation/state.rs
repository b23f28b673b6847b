use std::sync::Arc;

use rand::rngs::StdRng;
use ndarray::Zip;
use rand::SeedableRng;

use crate::compute::{
    build_kernel, derive_spectrum, spatial_potential, spectral_potential, ComplexMatrix, GrowthMap, Kernel,
    KernelCore, PotentialPolicy, PotentialStrategy, SpectralTransform,
};
use crate::error::{LeniaError, Result};
use crate::simulation::grid::{seed_grid, InitMode, Matrix};
use crate::simulation::params::{ParamUpdate, Parameters};

/// Construction options that are not physical parameters
#[derive(Clone, Debug, Default)]
pub struct SimulationOptions {
    /// RNG seed; `None` seeds from OS entropy
    pub seed: Option<u64>,
    /// Policy for the first grid
    pub init: InitMode,
    /// Radial profile of each kernel ring
    pub core: KernelCore,
    /// Spatial vs spectral potential selection
    pub policy: PotentialPolicy,
}

/// Summary of one `step()`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepStats {
    /// Number of steps taken so far, including this one
    pub step: u64,
    /// Mean activation after the step
    pub mass: f64,
    /// Cells whose update was NaN or infinite and got clamped
    pub non_finite: usize,
    /// Simulation time advanced by this step (`1/T` at the time of the step)
    pub dt: f64,
    /// Algorithm used for the potential
    pub strategy: PotentialStrategy,
}

/// A Lenia world: grid, parameters, kernel and its spectrum.
///
/// All mutation goes through `&mut self`, so a kernel rebuild can never
/// overlap a potential computation. For cross-thread use wrap it in
/// [`SharedSimulation`](crate::simulation::SharedSimulation).
#[derive(Debug)]
pub struct SimulationState {
    params: Parameters,
    grid: Arc<Matrix>,
    kernel: Kernel,
    spectrum: ComplexMatrix,
    /// Set when the kernel changed and the spectrum has not caught up
    spectrum_dirty: bool,
    fft: SpectralTransform,
    core: KernelCore,
    policy: PotentialPolicy,
    rng: StdRng,
    steps: u64,
}

/// Convenience constructor with default options
pub fn create_simulation(
    height: usize,
    width: usize,
    radius: usize,
    period: f64,
    mu: f64,
    sigma: f64,
    beta: Vec<f64>,
) -> Result<SimulationState> {
    let params = Parameters::new(radius, period, mu, sigma, beta);
    SimulationState::new(height, width, params, SimulationOptions::default())
}

impl SimulationState {
    /// Validate parameters, build the kernel and seed the first grid
    pub fn new(height: usize, width: usize, params: Parameters, options: SimulationOptions) -> Result<Self> {
        if height == 0 {
            return Err(LeniaError::invalid("height", "must be > 0"));
        }
        if width == 0 {
            return Err(LeniaError::invalid("width", "must be > 0"));
        }
        params.validate_for_grid(height, width)?;

        let kernel = build_kernel(params.radius, params.dx(), &params.beta, options.core)?;
        let fft = SpectralTransform::new(height, width);
        let spectrum = derive_spectrum(&kernel, &fft);

        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let grid = seed_grid(height, width, options.init, &mut rng);

        log::info!(
            "Created {}x{} world: R={} T={} Mu={} Sigma={} Beta={:?} ({} core, {} policy, {} init)",
            height,
            width,
            params.radius,
            params.period,
            params.mu,
            params.sigma,
            params.beta,
            options.core,
            options.policy,
            options.init
        );

        Ok(Self {
            params,
            grid: Arc::new(grid),
            kernel,
            spectrum,
            spectrum_dirty: false,
            fft,
            core: options.core,
            policy: options.policy,
            rng,
            steps: 0,
        })
    }

    /// Advance one tick: potential, growth, Euler update, clip, publish.
    pub fn step(&mut self) -> StepStats {
        let strategy = self.policy.resolve(self.kernel.side());
        let mut field = self.potential(strategy);

        let dt = self.params.dt();
        GrowthMap::new(self.params.mu, self.params.sigma).apply_in_place(&mut field);
        let (next, non_finite) = integrate(&self.grid, &field, dt);

        if non_finite > 0 {
            log::warn!("Step {}: clamped {} non-finite cell(s)", self.steps + 1, non_finite);
        }

        self.grid = Arc::new(next);
        self.steps += 1;

        let stats = StepStats {
            step: self.steps,
            mass: self.grid.mean().unwrap_or(0.0),
            non_finite,
            dt,
            strategy,
        };
        log::debug!("Step {}: mass {:.6} via {:?}", stats.step, stats.mass, stats.strategy);
        stats
    }

    /// Potential of the current grid with an explicit strategy
    pub fn potential(&mut self, strategy: PotentialStrategy) -> Matrix {
        match strategy {
            PotentialStrategy::Spectral => {
                self.refresh_spectrum();
                spectral_potential(&self.grid, &self.spectrum, &self.fft)
            }
            PotentialStrategy::Spatial => spatial_potential(&self.grid, &self.kernel),
        }
    }

    /// Replace the grid with a freshly generated one. Kernel and parameters are kept.
    pub fn reinitialize(&mut self, mode: InitMode) {
        let (rows, cols) = self.shape();
        self.grid = Arc::new(seed_grid(rows, cols, mode, &mut self.rng));
        log::info!("Reinitialized grid ({} init)", mode);
    }

    /// Replace the grid with caller data. Values must lie in [0, 1].
    pub fn set_grid(&mut self, grid: Matrix) -> Result<()> {
        if grid.dim() != self.shape() {
            return Err(LeniaError::invalid(
                "grid",
                format!("expected {:?}, got {:?}", self.shape(), grid.dim()),
            ));
        }
        if let Some(bad) = grid.iter().find(|v| !(0.0..=1.0).contains(*v)) {
            return Err(LeniaError::invalid("grid", format!("value {} outside [0, 1]", bad)));
        }
        self.grid = Arc::new(grid);
        Ok(())
    }

    /// Recompute kernel and spectrum from the current parameters
    pub fn rebuild_kernel(&mut self) -> Result<()> {
        self.kernel = build_kernel(self.params.radius, self.params.dx(), &self.params.beta, self.core)?;
        self.spectrum = derive_spectrum(&self.kernel, &self.fft);
        self.spectrum_dirty = false;
        log::info!(
            "Rebuilt kernel: side {} with {} ring(s)",
            self.kernel.side(),
            self.params.beta.len()
        );
        Ok(())
    }

    /// Validate and apply a parameter change.
    ///
    /// `R` and `Beta` changes build the new kernel before committing anything,
    /// so a degenerate kernel is rejected with the state untouched. The
    /// spectrum is re-derived before the next spectral potential.
    pub fn set_parameter(&mut self, update: ParamUpdate) -> Result<()> {
        let name = update.name();
        if update.affects_kernel() {
            let mut candidate = self.params.clone();
            candidate.apply(update)?;
            let (rows, cols) = self.shape();
            candidate.validate_for_grid(rows, cols)?;

            let kernel = build_kernel(candidate.radius, candidate.dx(), &candidate.beta, self.core)?;
            self.params = candidate;
            self.kernel = kernel;
            self.spectrum_dirty = true;
        } else {
            self.params.apply(update)?;
        }
        log::info!("Set {}: {:?}", name, self.params);
        Ok(())
    }

    /// Switch the ring profile and rebuild the kernel
    pub fn set_kernel_core(&mut self, core: KernelCore) -> Result<()> {
        let kernel = build_kernel(self.params.radius, self.params.dx(), &self.params.beta, core)?;
        self.core = core;
        self.kernel = kernel;
        self.spectrum_dirty = true;
        Ok(())
    }

    pub fn set_policy(&mut self, policy: PotentialPolicy) {
        self.policy = policy;
    }

    /// Grid value for display
    pub fn cell_value(&self, row: usize, col: usize) -> Result<f64> {
        let (rows, cols) = self.shape();
        self.grid
            .get((row, col))
            .copied()
            .ok_or(LeniaError::OutOfBounds { row, col, rows, cols })
    }

    /// Kernel weight for display, valid for `row, col < 2R+1`
    pub fn kernel_value(&self, row: usize, col: usize) -> Result<f64> {
        self.kernel.value(row, col)
    }

    pub fn grid(&self) -> &Matrix {
        &self.grid
    }

    /// Shared handle to the current grid; stays valid after later steps
    pub fn grid_arc(&self) -> Arc<Matrix> {
        Arc::clone(&self.grid)
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Kernel spectrum, re-derived first if the kernel changed
    pub fn kernel_spectrum(&mut self) -> &ComplexMatrix {
        self.refresh_spectrum();
        &self.spectrum
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn core(&self) -> KernelCore {
        self.core
    }

    pub fn policy(&self) -> PotentialPolicy {
        self.policy
    }

    /// Steps taken since creation
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// (height, width)
    pub fn shape(&self) -> (usize, usize) {
        self.grid.dim()
    }

    fn refresh_spectrum(&mut self) {
        if self.spectrum_dirty {
            self.spectrum = derive_spectrum(&self.kernel, &self.fft);
            self.spectrum_dirty = false;
            log::debug!("Re-derived kernel spectrum for side {}", self.kernel.side());
        }
    }
}

/// Euler update `clip(grid + dt * growth, 0, 1)`.
///
/// Returns the new grid and the number of cells whose raw update was not
/// finite. Those are clamped (NaN to 0) instead of propagated.
pub fn integrate(grid: &Matrix, growth: &Matrix, dt: f64) -> (Matrix, usize) {
    assert_eq!(grid.dim(), growth.dim(), "integrate: shape mismatch");
    let mut next = Zip::from(grid).and(growth).par_map_collect(|&v, &g| v + dt * g);
    let non_finite = next.iter().filter(|v| !v.is_finite()).count();
    next.par_mapv_inplace(clip_unit);
    (next, non_finite)
}

/// Clip into [0, 1], NaN to 0
#[inline]
fn clip_unit(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}
