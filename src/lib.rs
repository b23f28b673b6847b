//! Lenia: a continuous cellular automaton.
//!
//! A grid of activations in [0, 1] is convolved with a ring-weighted radial
//! kernel, mapped through a Gaussian growth function and integrated with an
//! explicit Euler step. Convolution runs either in frequency space (FFT) or
//! directly; both give the same potential.

pub mod app;
pub mod compute;
pub mod config;
pub mod display;
pub mod error;
pub mod simulation;

pub use error::{LeniaError, Result};
pub use simulation::{
    create_simulation, InitMode, Matrix, ParamUpdate, Parameters, SharedSimulation, SimulationOptions,
    SimulationState, StepStats,
};
