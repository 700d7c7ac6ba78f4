//! Frame timing and the day/night cycle.

use std::time::{Duration, Instant};

/// Length of one in-game day in real seconds (at time scale 1.0).
pub const DAY_LENGTH_SECONDS: f32 = 600.0;

/// Manages frame timing, the simulation time scale, and the time of day.
///
/// Time of day runs 0..1: 0.0 dawn, 0.25 noon, 0.5 dusk, 0.75 night.
#[derive(Debug)]
pub struct WorldClock {
    /// Time when the engine started.
    start_time: Instant,
    /// Time of the last frame.
    last_frame: Instant,
    /// Duration of the last frame.
    delta: Duration,
    /// Total elapsed time since start.
    elapsed: Duration,
    /// Frame count since start.
    frame_count: u64,
    /// Fixed timestep for simulation (default 30 Hz).
    fixed_timestep: Duration,
    /// Accumulated time for fixed updates.
    accumulator: Duration,
    /// Simulation speed multiplier (0.5 = slow-mo, 2.0 = fast-forward).
    time_scale: f32,
    /// Current time of day, 0..1.
    time_of_day: f32,
    /// Freeze the day cycle (debugging).
    pub freeze_time_of_day: bool,
}

impl Default for WorldClock {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start_time: now,
            last_frame: now,
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
            fixed_timestep: Duration::from_secs_f64(1.0 / 30.0),
            accumulator: Duration::ZERO,
            time_scale: 1.0,
            time_of_day: 0.1,
            freeze_time_of_day: false,
        }
    }

    /// Update timing at the start of a new frame.
    pub fn update(&mut self) {
        let now = Instant::now();
        self.tick(now - self.last_frame);
        self.last_frame = now;
        self.elapsed = now - self.start_time;
    }

    /// Advance by an explicit delta. `update` uses this internally; headless
    /// drivers and tests call it directly.
    pub fn tick(&mut self, delta: Duration) {
        self.delta = delta;
        self.frame_count += 1;
        self.accumulator += delta;
        if !self.freeze_time_of_day {
            let day_step = self.scaled_delta_seconds() / DAY_LENGTH_SECONDS;
            self.time_of_day = (self.time_of_day + day_step).rem_euclid(1.0);
        }
    }

    /// Raw delta time of the last frame in seconds.
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Delta time with the time scale applied; what simulation consumes.
    pub fn scaled_delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32() * self.time_scale
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Clamp to something sane; zero and negative scales freeze the sim.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.clamp(0.0, 8.0);
    }

    pub fn time_of_day(&self) -> f32 {
        self.time_of_day
    }

    pub fn set_time_of_day(&mut self, t: f32) {
        self.time_of_day = t.rem_euclid(1.0);
    }

    pub fn is_night(&self) -> bool {
        self.time_of_day >= 0.7 || self.time_of_day < 0.05
    }

    /// Daylight intensity 0..1 for renderer tinting, peaking at noon.
    pub fn daylight(&self) -> f32 {
        let angle = (self.time_of_day - 0.25) * std::f32::consts::TAU;
        (angle.cos() * 0.5 + 0.5).clamp(0.0, 1.0)
    }

    pub fn fixed_timestep_seconds(&self) -> f32 {
        self.fixed_timestep.as_secs_f32()
    }

    /// Check if a fixed update should run and consume the time.
    pub fn should_fixed_update(&mut self) -> bool {
        if self.accumulator >= self.fixed_timestep {
            self.accumulator -= self.fixed_timestep;
            true
        } else {
            false
        }
    }

    /// Set the fixed timestep rate in Hz.
    pub fn set_fixed_rate(&mut self, hz: f64) {
        self.fixed_timestep = Duration::from_secs_f64(1.0 / hz);
    }
}
