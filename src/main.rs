use std::error::Error;
use std::sync::Arc;

use clap::Parser;
use ndarray::s;

use lenia::app::App;
use lenia::compute::{KernelCore, PotentialPolicy};
use lenia::config::{
    DEFAULT_BETA, DEFAULT_MU, DEFAULT_PERIOD, DEFAULT_RADIUS, DEFAULT_SIGMA, DEFAULT_STEPS, GRID_HEIGHT, GRID_WIDTH,
};
use lenia::display::{kernel_view, GridFrame};
use lenia::simulation::{parse_beta, InitMode, ParamUpdate, Parameters, SharedSimulation, SimulationOptions, SimulationState};

/// Headless Lenia runner
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Kernel radius in cells
    #[arg(short = 'r', long, default_value_t = DEFAULT_RADIUS)]
    radius: usize,

    /// Time steps per unit time (Dt = 1/T)
    #[arg(short = 't', long, default_value_t = DEFAULT_PERIOD)]
    period: f64,

    /// Growth center
    #[arg(short = 'm', long, default_value_t = DEFAULT_MU)]
    mu: f64,

    /// Growth width
    #[arg(short = 's', long, default_value_t = DEFAULT_SIGMA)]
    sigma: f64,

    /// Ring weights separated by commas
    #[arg(short = 'b', long, default_value = DEFAULT_BETA)]
    beta: String,

    /// Report the kernel and exit
    #[arg(short = 'k', long)]
    kernel: bool,

    #[arg(long, default_value_t = GRID_WIDTH)]
    width: usize,

    #[arg(long, default_value_t = GRID_HEIGHT)]
    height: usize,

    /// Number of ticks before exiting
    #[arg(long, default_value_t = DEFAULT_STEPS)]
    steps: u64,

    /// RNG seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Initial state: patchy or full
    #[arg(long, default_value = "patchy")]
    init: InitMode,

    /// Potential computation: auto, spectral or spatial
    #[arg(long, default_value = "auto")]
    policy: PotentialPolicy,

    /// Kernel ring profile: exponential or polynomial
    #[arg(long, default_value = "exponential")]
    core: KernelCore,

    /// Parameter updates (name=value) applied halfway through the run
    #[arg(long = "set")]
    updates: Vec<ParamUpdate>,

    /// Tick every Dt seconds instead of as fast as possible
    #[arg(long)]
    realtime: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let params = Parameters::new(args.radius, args.period, args.mu, args.sigma, parse_beta(&args.beta)?);
    let options = SimulationOptions {
        seed: args.seed,
        init: args.init,
        core: args.core,
        policy: args.policy,
    };
    let mut state = SimulationState::new(args.height, args.width, params, options)?;

    if args.kernel {
        report_kernel(&mut state);
        return Ok(());
    }

    let sim = Arc::new(SharedSimulation::new(state));
    let mut app = App::new(Arc::clone(&sim), args.realtime);
    app.start();

    if !args.updates.is_empty() {
        app.wait_for_ticks(args.steps / 2);
        for update in args.updates {
            sim.set_parameter(update)?;
        }
        sim.rebuild_kernel()?;
    }

    app.wait_for_ticks(args.steps);
    app.stop();

    let grid = sim.snapshot();
    let frame = GridFrame::from_grid(&grid);
    log::info!(
        "Finished: mean activation {:.4}, peak {:.4}, final frame {}x{} ({} bytes)",
        grid.mean().unwrap_or(0.0),
        grid.iter().copied().fold(0.0, f64::max),
        frame.width,
        frame.height,
        frame.as_bytes().len()
    );
    Ok(())
}

/// Log kernel shape, its spectrum's DC term and the radial profile along
/// the center row
fn report_kernel(state: &mut SimulationState) {
    let dc = state.kernel_spectrum()[[0, 0]];
    let kernel = state.kernel();
    let view = kernel_view(kernel);
    let center = kernel.radius();

    log::info!(
        "Kernel: side {} ({} core), sum {:.9}, peak weight {:.3e}, spectrum DC {:.9}",
        kernel.side(),
        state.core(),
        kernel.weights().sum(),
        kernel.weights().iter().copied().fold(0.0, f64::max),
        dc.re
    );
    let profile: Vec<String> = view
        .slice(s![center, center..])
        .iter()
        .map(|v| format!("{:.2}", v))
        .collect();
    log::info!("Radial profile (center to rim): {}", profile.join(" "));
}
