use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::{IDLE_POLL_MILLIS, MAX_TICK_PERIOD_SECS, RATE_LOG_INTERVAL_SECS};
use crate::simulation::{InitMode, SharedSimulation};

/// Tick driver: steps a shared simulation on a background thread.
///
/// In realtime mode one tick is taken every `Dt` seconds (capped at
/// `MAX_TICK_PERIOD_SECS`), with `Dt` re-read each tick so period changes
/// apply at the next tick boundary. Otherwise ticks run back to back.
pub struct App {
    sim: Arc<SharedSimulation>,
    realtime: bool,
    running: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    worker: Option<JoinHandle<()>>,
}

impl App {
    pub fn new(sim: Arc<SharedSimulation>, realtime: bool) -> Self {
        Self {
            sim,
            realtime,
            running: Arc::new(AtomicBool::new(true)),
            shutdown: Arc::new(AtomicBool::new(false)),
            ticks: Arc::new(AtomicU64::new(0)),
            worker: None,
        }
    }

    /// Spawn the tick thread. Does nothing if it is already running.
    pub fn start(&mut self) {
        if self.worker.is_some() {
            return;
        }

        let sim = Arc::clone(&self.sim);
        let running = Arc::clone(&self.running);
        let shutdown = Arc::clone(&self.shutdown);
        let ticks = Arc::clone(&self.ticks);
        let realtime = self.realtime;

        log::info!("Starting tick driver ({})", if realtime { "realtime" } else { "unthrottled" });
        self.worker = Some(thread::spawn(move || {
            tick_loop(&sim, realtime, &running, &shutdown, &ticks);
        }));
    }

    /// Suspend ticking. A step already in flight finishes.
    pub fn pause(&self) {
        self.running.store(false, Ordering::Release);
        log::info!("Paused");
    }

    pub fn resume(&self) {
        self.running.store(true, Ordering::Release);
        log::info!("Resumed");
    }

    /// Flip between running and paused, returning the new state
    pub fn toggle(&self) -> bool {
        let now_running = !self.running.fetch_xor(true, Ordering::AcqRel);
        log::info!("{}", if now_running { "Resumed" } else { "Paused" });
        now_running
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Whether the tick thread has been started and has not exited
    pub fn is_alive(&self) -> bool {
        self.worker.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Stop ticking, drain the in-flight step, reseed the grid and restore
    /// the previous running state.
    pub fn restart(&self, mode: InitMode) {
        let was_running = self.running.swap(false, Ordering::AcqRel);
        // Takes the engine lock, so it waits for a running step
        self.sim.reinitialize(mode);
        self.running.store(was_running, Ordering::Release);
        log::info!("Restarted with {} init", mode);
    }

    /// Ticks completed since start
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Block until at least `target` ticks have completed or the worker exits
    pub fn wait_for_ticks(&self, target: u64) {
        while self.ticks() < target {
            match &self.worker {
                Some(handle) if !handle.is_finished() => thread::sleep(Duration::from_millis(1)),
                _ => break,
            }
        }
    }

    pub fn simulation(&self) -> &Arc<SharedSimulation> {
        &self.sim
    }

    /// Signal the tick thread and join it
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                log::error!("Tick thread panicked");
            }
            log::info!("Stopped after {} ticks", self.ticks());
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.stop();
    }
}

fn tick_loop(sim: &SharedSimulation, realtime: bool, running: &AtomicBool, shutdown: &AtomicBool, ticks: &AtomicU64) {
    let mut counter = RateCounter::new();
    let mut next_tick = Instant::now();
    let mut warned_cap = false;

    while !shutdown.load(Ordering::Acquire) {
        if !running.load(Ordering::Acquire) {
            thread::sleep(Duration::from_millis(IDLE_POLL_MILLIS));
            next_tick = Instant::now();
            continue;
        }

        let stats = sim.step();
        let done = ticks.fetch_add(1, Ordering::AcqRel) + 1;

        if let Some(rate) = counter.tick(stats.dt) {
            log::info!(
                "{:.1} ticks/s ({:.2} time units/s) - step {} - mass {:.4}{}",
                rate.ticks_per_sec,
                rate.sim_time_per_sec,
                stats.step,
                stats.mass,
                if stats.non_finite > 0 { " [clamped]" } else { "" }
            );
        }
        log::trace!("Tick {} done", done);

        if realtime {
            let dt = sim.dt();
            let period = tick_period(dt);
            if !warned_cap && dt > MAX_TICK_PERIOD_SECS as f64 {
                log::warn!("Dt = {:e}s is too long to wait for, ticking every {:?}", dt, period);
                warned_cap = true;
            }

            next_tick += period;
            let now = Instant::now();
            if next_tick > now {
                sleep_until(next_tick, shutdown);
            } else {
                // Fell behind; do not try to catch up with a burst
                next_tick = now;
            }
        }
    }
}

/// Wall-clock wait for one realtime tick of length `dt`.
///
/// Values that do not fit a `Duration` or exceed `MAX_TICK_PERIOD_SECS`
/// are capped.
fn tick_period(dt: f64) -> Duration {
    let cap = Duration::from_secs(MAX_TICK_PERIOD_SECS);
    Duration::try_from_secs_f64(dt).map_or(cap, |period| period.min(cap))
}

/// Sleep in short slices so a shutdown request is seen promptly
fn sleep_until(deadline: Instant, shutdown: &AtomicBool) {
    let slice = Duration::from_millis(IDLE_POLL_MILLIS);
    while !shutdown.load(Ordering::Acquire) {
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        thread::sleep((deadline - now).min(slice));
    }
}

/// Throughput over one log interval
#[derive(Clone, Copy, Debug, PartialEq)]
struct Rate {
    ticks_per_sec: f64,
    /// Simulation time covered per wall-clock second (sum of `Dt` per tick)
    sim_time_per_sec: f64,
}

/// Wall-clock rate counter for the tick driver.
///
/// Both figures are measured against real time: ticks per second, and how
/// much simulation time those ticks covered. In realtime mode the second one
/// stays near 1.
struct RateCounter {
    last_update: Instant,
    tick_count: u32,
    sim_time: f64,
}

impl RateCounter {
    fn new() -> Self {
        Self {
            last_update: Instant::now(),
            tick_count: 0,
            sim_time: 0.0,
        }
    }

    /// Count a tick that advanced the world by `dt`, returns Some(rate)
    /// every log interval
    fn tick(&mut self, dt: f64) -> Option<Rate> {
        self.tick_count += 1;
        self.sim_time += dt;
        let elapsed = self.last_update.elapsed().as_secs_f64();

        if elapsed >= RATE_LOG_INTERVAL_SECS {
            let rate = Rate {
                ticks_per_sec: self.tick_count as f64 / elapsed,
                sim_time_per_sec: self.sim_time / elapsed,
            };
            self.tick_count = 0;
            self.sim_time = 0.0;
            self.last_update = Instant::now();
            Some(rate)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{Parameters, SimulationOptions, SimulationState};

    fn app(realtime: bool, period: f64) -> App {
        let params = Parameters::new(3, period, 0.15, 0.017, vec![1.0]);
        let options = SimulationOptions {
            seed: Some(17),
            init: InitMode::Full,
            ..SimulationOptions::default()
        };
        let state = SimulationState::new(16, 16, params, options).unwrap();
        App::new(Arc::new(SharedSimulation::new(state)), realtime)
    }

    #[test]
    fn test_runs_and_stops() {
        let mut app = app(false, 10.0);
        app.start();
        app.wait_for_ticks(10);
        app.stop();

        let ticks = app.ticks();
        assert!(ticks >= 10);
        assert_eq!(app.simulation().with_state(|s| s.steps()), ticks);
    }

    #[test]
    fn test_pause_holds_ticks() {
        let mut app = app(false, 10.0);
        app.start();
        app.wait_for_ticks(3);
        app.pause();
        assert!(!app.is_running());

        let paused_at = app.ticks();
        thread::sleep(Duration::from_millis(30));
        // At most the step that was in flight when pausing
        assert!(app.ticks() <= paused_at + 1);

        assert!(app.toggle());
        app.wait_for_ticks(paused_at + 5);
        app.stop();
        assert!(app.ticks() >= paused_at + 5);
    }

    #[test]
    fn test_restart_preserves_running_state() {
        let mut app = app(false, 10.0);
        app.start();
        app.wait_for_ticks(2);

        app.restart(InitMode::Full);
        assert!(app.is_running());

        app.pause();
        app.restart(InitMode::Patchy);
        assert!(!app.is_running());

        app.stop();
        let grid = app.simulation().snapshot();
        assert!(grid.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_realtime_paces_ticks() {
        // T = 200 gives a 5 ms period
        let mut app = app(true, 200.0);
        let start = Instant::now();
        app.start();
        app.wait_for_ticks(4);
        app.stop();
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn test_huge_dt_keeps_driver_alive() {
        // T = 1e-30 is valid but Dt does not fit a Duration
        let mut app = app(true, 1e-30);
        app.start();
        app.wait_for_ticks(1);
        assert!(app.ticks() >= 1);
        thread::sleep(Duration::from_millis(20));
        assert!(app.is_alive(), "Tick thread exited");

        // Waiting on the capped period must not hold up shutdown
        let stopping = Instant::now();
        app.stop();
        assert!(stopping.elapsed() < Duration::from_secs(1));
        assert!(!app.is_alive());
    }

    #[test]
    fn test_tick_period_caps_long_steps() {
        let cap = Duration::from_secs(MAX_TICK_PERIOD_SECS);
        assert_eq!(tick_period(0.5), Duration::from_millis(500));
        assert_eq!(tick_period(2.0), Duration::from_secs(2));
        assert_eq!(tick_period(1e30), cap);
        assert_eq!(tick_period(f64::MAX), cap);
        assert_eq!(tick_period(MAX_TICK_PERIOD_SECS as f64 * 2.0), cap);
    }

    #[test]
    fn test_rate_counter_waits_for_interval() {
        let mut counter = RateCounter::new();
        assert_eq!(counter.tick(0.1), None);
        assert_eq!(counter.tick_count, 1);
        assert!((counter.sim_time - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_rate_counter_reports_sim_time() {
        let mut counter = RateCounter::new();
        assert_eq!(counter.tick(0.25), None);
        counter.last_update = Instant::now()
            .checked_sub(Duration::from_secs(2))
            .unwrap();
        let rate = counter.tick(0.25).unwrap();
        // Two ticks of Dt = 0.25 cover half a time unit
        assert!((rate.sim_time_per_sec / rate.ticks_per_sec - 0.25).abs() < 1e-9);
        assert_eq!(counter.tick_count, 0);
    }
}
