mod grid;
mod params;
mod shared;
mod state;

pub use grid::{max_abs_diff, seed_full, seed_grid, seed_patchy, InitMode, Matrix};
pub use params::{parse_beta, ParamUpdate, Parameters};
pub use shared::SharedSimulation;
pub use state::{create_simulation, integrate, SimulationOptions, SimulationState, StepStats};
