use std::time::Instant;

use log::{info, warn};

use crate::core::audio::PlaybackClock;

/// How close (ms) the estimated position must get to a known song length
/// before the song counts as over.
pub const END_WINDOW_MS: f64 = 50.0;

/// Longest wall-clock gap (ms) one update will integrate. After a host
/// stall the estimate advances by at most this much and then re-anchors
/// toward the real clock through damping, instead of fast-forwarding the
/// whole gap in one step.
pub const MAX_UPDATE_DELTA_MS: f64 = 250.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SongProgress {
    Continue,
    Ended,
}

/// Watches a `PlaybackClock` and reconciles its coarse position reports with
/// a wall-clock integrator, producing one authoritative, smoothly advancing
/// playback position for note spawning and judgment.
///
/// A raw poll of most audio backends produces visibly stepped timing, while
/// a pure integrator drifts from the real audio; averaging the two on every
/// fresh sample keeps motion smooth and periodically re-anchors to ground
/// truth.
pub struct Conductor<C: PlaybackClock> {
    clock: C,
    position_ms: f64,
    last_observed_ms: f64,
    last_poll: Option<Instant>,
}

impl<C: PlaybackClock> Conductor<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            position_ms: 0.0,
            last_observed_ms: 0.0,
            last_poll: None,
        }
    }

    /// Rewinds the clock and starts playback from zero. A clock that cannot
    /// start is fatal to the session.
    pub fn start(&mut self) -> Result<(), String> {
        self.start_at(Instant::now())
    }

    pub fn start_at(&mut self, now: Instant) -> Result<(), String> {
        self.clock.stop();
        self.clock.seek(0.0);
        self.position_ms = 0.0;
        self.last_observed_ms = 0.0;
        self.last_poll = Some(now);
        self.clock.play()?;
        info!(
            "Conductor started, song length: {}",
            match self.song_length_ms() {
                Some(ms) => format!("{ms:.0}ms"),
                None => "unknown".to_string(),
            }
        );
        Ok(())
    }

    pub fn update(&mut self) -> SongProgress {
        self.update_at(Instant::now())
    }

    /// Advances the estimate by the wall-clock delta since the last call,
    /// then re-anchors toward the clock whenever a fresh sample has arrived.
    /// Returns `Ended` once the estimate is within `END_WINDOW_MS` of a
    /// known song length; with an unknown length the song never ends here.
    pub fn update_at(&mut self, now: Instant) -> SongProgress {
        if let Some(prev) = self.last_poll {
            let delta_ms = now.duration_since(prev).as_secs_f64() * 1000.0;
            self.position_ms += delta_ms.min(MAX_UPDATE_DELTA_MS);
        }
        self.last_poll = Some(now);

        if let Some(length_ms) = self.song_length_ms()
            && (self.position_ms - length_ms).abs() < END_WINDOW_MS
        {
            return SongProgress::Ended;
        }

        let observed = self.clock.position_ms();
        if observed != self.last_observed_ms {
            // Fresh sample: average rather than snap, so low-rate position
            // reports do not step the estimate.
            self.position_ms = (self.position_ms + observed) / 2.0;
            self.last_observed_ms = observed;
        }
        SongProgress::Continue
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    /// Resumes playback. Re-arms the wall-clock reference first so the
    /// paused interval is not integrated into the position estimate.
    pub fn unpause(&mut self) {
        self.unpause_at(Instant::now());
    }

    pub fn unpause_at(&mut self, now: Instant) {
        self.last_poll = Some(now);
        if let Err(e) = self.clock.play() {
            // Mid-session resume failure is not fatal; the host may retry.
            warn!("Playback clock failed to resume: {e}");
        }
    }

    pub fn stop(&mut self) {
        self.clock.stop();
    }

    pub fn position_ms(&self) -> f64 {
        self.position_ms
    }

    /// `None` while the clock has not reported a duration; callers must not
    /// evaluate song-end until it is known.
    pub fn song_length_ms(&self) -> Option<f64> {
        self.clock.duration_ms()
    }
}
