use std::time::{Duration, Instant};

/// Target tick cadence for host loops (~60 ticks/s). The scheduler treats
/// the actual inter-tick spacing as data, so hosts may drive it faster or
/// slower without breaking judgment timing.
pub const TICK_INTERVAL: Duration = Duration::from_micros(16_667);

/// Ticks whose wall-clock delta exceeds this are dropped instead of being
/// fed to game logic, so a suspended or stalled process cannot resolve a
/// whole chart in one giant simulated step.
pub const MAX_TICK_DELTA_S: f32 = 0.25;

/// Cooperative repeating-tick driver with deferred pause/resume.
///
/// `pause()` and `play()` only set flags; they are applied at the start of
/// the next `tick`, so a request arriving from a UI context can never
/// corrupt a tick already in progress. Resuming shifts the timing baseline
/// forward by exactly the paused duration, keeping paused time out of the
/// next delta. `stop()` is terminal for the session: a new scheduler is
/// created for a new session rather than restarting this one.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    active: bool,
    paused: bool,
    pause_scheduled: bool,
    play_scheduled: bool,
    pause_start: Option<Instant>,
    last_tick: Option<Instant>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.active = true;
        self.last_tick = None;
    }

    pub fn stop(&mut self) {
        self.active = false;
        self.paused = false;
        self.pause_scheduled = false;
        self.play_scheduled = false;
        self.pause_start = None;
        self.last_tick = None;
    }

    /// Requests a pause; takes effect at the start of the next tick.
    pub fn pause(&mut self) {
        if self.active && !self.paused {
            self.pause_scheduled = true;
        }
    }

    /// Requests a resume; takes effect at the start of the next tick.
    pub fn play(&mut self) {
        if self.active && self.paused {
            self.play_scheduled = true;
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Runs one tick: applies pending pause/resume, computes the wall-clock
    /// delta, and invokes `callback` with it. The callback is skipped while
    /// paused, on the baseline-establishing first tick, and for any delta
    /// failing the `MAX_TICK_DELTA_S` sanity guard.
    pub fn tick<F: FnMut(f32)>(&mut self, now: Instant, mut callback: F) {
        if !self.active {
            return;
        }

        if self.pause_scheduled {
            self.pause_start = Some(now);
            self.paused = true;
            self.pause_scheduled = false;
        }
        if self.play_scheduled {
            // Shift the baseline past the pause so the next delta only
            // covers time actually spent running.
            if let (Some(last), Some(pause_start)) = (self.last_tick, self.pause_start) {
                self.last_tick = Some(last + now.duration_since(pause_start));
            }
            self.pause_start = None;
            self.paused = false;
            self.play_scheduled = false;
        }
        if self.paused {
            return;
        }

        let Some(last) = self.last_tick else {
            self.last_tick = Some(now);
            return;
        };
        let dt = now.duration_since(last).as_secs_f32();
        self.last_tick = Some(now);
        if dt > MAX_TICK_DELTA_S {
            return;
        }
        callback(dt);
    }
}
