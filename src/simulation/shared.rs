use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crate::error::{LeniaError, Result};
use crate::simulation::grid::{InitMode, Matrix};
use crate::simulation::params::ParamUpdate;
use crate::simulation::state::{SimulationState, StepStats};

/// Thread-safe handle to a simulation.
///
/// Every engine operation (step, reinitialize, reconfigure) holds the engine
/// lock for its whole duration, so a reinitialization waits for an in-flight
/// step and a kernel rebuild never overlaps a potential computation.
/// Readers go through the published grid: each step swaps in a new
/// `Arc<Matrix>`, so a snapshot is always a complete grid.
#[derive(Debug)]
pub struct SharedSimulation {
    engine: Mutex<SimulationState>,
    published: RwLock<Arc<Matrix>>,
}

impl SharedSimulation {
    pub fn new(state: SimulationState) -> Self {
        let published = RwLock::new(state.grid_arc());
        Self {
            engine: Mutex::new(state),
            published,
        }
    }

    /// Advance one tick and publish the result
    pub fn step(&self) -> StepStats {
        let mut engine = lock(&self.engine);
        let stats = engine.step();
        self.publish(engine.grid_arc());
        stats
    }

    /// Wait for any in-flight step, then replace the grid
    pub fn reinitialize(&self, mode: InitMode) {
        let mut engine = lock(&self.engine);
        engine.reinitialize(mode);
        self.publish(engine.grid_arc());
    }

    /// Apply a parameter change between steps
    pub fn set_parameter(&self, update: ParamUpdate) -> Result<()> {
        lock(&self.engine).set_parameter(update)
    }

    pub fn rebuild_kernel(&self) -> Result<()> {
        lock(&self.engine).rebuild_kernel()
    }

    /// Latest complete grid
    pub fn snapshot(&self) -> Arc<Matrix> {
        let guard = self.published.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Cell value from the latest published grid
    pub fn cell_value(&self, row: usize, col: usize) -> Result<f64> {
        let grid = self.snapshot();
        let (rows, cols) = grid.dim();
        grid.get((row, col))
            .copied()
            .ok_or(LeniaError::OutOfBounds { row, col, rows, cols })
    }

    pub fn kernel_value(&self, row: usize, col: usize) -> Result<f64> {
        lock(&self.engine).kernel_value(row, col)
    }

    /// Current time step `1/T`; waits for an in-flight step
    pub fn dt(&self) -> f64 {
        lock(&self.engine).params().dt()
    }

    /// Run `f` with exclusive access to the engine
    pub fn with_state<R>(&self, f: impl FnOnce(&mut SimulationState) -> R) -> R {
        let mut engine = lock(&self.engine);
        let result = f(&mut engine);
        self.publish(engine.grid_arc());
        result
    }

    fn publish(&self, grid: Arc<Matrix>) {
        let mut slot = self.published.write().unwrap_or_else(PoisonError::into_inner);
        *slot = grid;
    }
}

/// A panic inside a step leaves the previous grid intact, so a poisoned lock
/// is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::params::Parameters;
    use crate::simulation::state::SimulationOptions;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    fn shared(seed: u64) -> Arc<SharedSimulation> {
        let params = Parameters::new(5, 10.0, 0.15, 0.017, vec![1.0]);
        let options = SimulationOptions {
            seed: Some(seed),
            init: InitMode::Full,
            ..SimulationOptions::default()
        };
        Arc::new(SharedSimulation::new(SimulationState::new(32, 32, params, options).unwrap()))
    }

    #[test]
    fn test_snapshot_is_stable_across_steps() {
        let sim = shared(1);
        let before = sim.snapshot();
        let copy = (*before).clone();
        sim.step();
        assert_eq!(*before, copy, "Old snapshot must not change");
        assert!(!Arc::ptr_eq(&before, &sim.snapshot()));
    }

    #[test]
    fn test_published_grid_tracks_engine() {
        let sim = shared(2);
        sim.step();
        sim.reinitialize(InitMode::Patchy);
        let published = sim.snapshot();
        sim.with_state(|state| assert_eq!(state.grid(), &*published));
    }

    #[test]
    fn test_concurrent_step_and_reinitialize() {
        let sim = shared(3);
        let stepper = {
            let sim = Arc::clone(&sim);
            thread::spawn(move || {
                for _ in 0..40 {
                    sim.step();
                }
            })
        };
        let reader = {
            let sim = Arc::clone(&sim);
            thread::spawn(move || {
                for _ in 0..40 {
                    let grid = sim.snapshot();
                    assert!(grid.iter().all(|v| (0.0..=1.0).contains(v)));
                }
            })
        };
        for _ in 0..5 {
            sim.reinitialize(InitMode::Full);
            sim.set_parameter(ParamUpdate::Mu(0.2)).unwrap();
        }
        stepper.join().unwrap();
        reader.join().unwrap();

        assert_eq!(sim.with_state(|s| s.steps()), 40);
        assert!(sim.snapshot().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_kernel_rebuilds_race_stepping_thread() {
        let sim = shared(5);
        let done = Arc::new(AtomicBool::new(false));

        let stepper = {
            let sim = Arc::clone(&sim);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut steps = 0u64;
                while !done.load(Ordering::Acquire) {
                    let stats = sim.step();
                    assert_eq!(stats.non_finite, 0, "Step {} saw a half-built kernel", stats.step);
                    steps += 1;
                }
                steps
            })
        };
        let reader = {
            let sim = Arc::clone(&sim);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                while !done.load(Ordering::Acquire) {
                    let grid = sim.snapshot();
                    assert_eq!(grid.dim(), (32, 32));
                    assert!(grid.iter().all(|v| (0.0..=1.0).contains(v)));
                }
            })
        };

        let updates = [
            ParamUpdate::Radius(3),
            ParamUpdate::Beta(vec![1.0, 0.5]),
            ParamUpdate::Radius(6),
            ParamUpdate::Beta(vec![0.3, 1.0, 0.6]),
            ParamUpdate::Radius(4),
            ParamUpdate::Beta(vec![1.0]),
        ];
        for round in 0..4 {
            for update in updates.iter().cloned() {
                sim.set_parameter(update).unwrap();
                if round % 2 == 0 {
                    sim.rebuild_kernel().unwrap();
                }
                thread::yield_now();
            }
        }
        sim.set_parameter(ParamUpdate::Radius(5)).unwrap();
        sim.rebuild_kernel().unwrap();

        done.store(true, Ordering::Release);
        let steps = stepper.join().unwrap();
        reader.join().unwrap();
        assert!(steps > 0);

        sim.with_state(|state| {
            let kernel = state.kernel();
            assert_eq!(kernel.side(), 2 * 5 + 1);
            assert!((kernel.weights().sum() - 1.0).abs() < 1e-9);
            assert_eq!(state.params().beta, vec![1.0]);
        });
        assert!(sim.snapshot().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_radius_change_through_handle() {
        let sim = shared(4);
        sim.set_parameter(ParamUpdate::Radius(3)).unwrap();
        sim.rebuild_kernel().unwrap();
        assert!(sim.kernel_value(6, 6).is_ok());
        assert!(sim.kernel_value(7, 7).is_err());
        sim.step();
        assert!(sim.cell_value(31, 31).is_ok());
        assert!(sim.cell_value(32, 0).is_err());
    }
}
