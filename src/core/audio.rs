use std::time::Instant;

/// Control and position surface of the host's music playback.
///
/// Position reports may be coarse, stale, repeated, or non-monotonic; the
/// conductor is responsible for smoothing them into one authoritative
/// playback position. The clock is always polled, never pushes into the
/// simulation.
pub trait PlaybackClock {
    fn position_ms(&self) -> f64;

    /// Total track length, or `None` while the backing media has not
    /// reported one yet. Song-end detection is deferred until it is known.
    fn duration_ms(&self) -> Option<f64>;

    /// Begins or resumes playback. Failure here is fatal to session start;
    /// retry policy belongs to the host.
    fn play(&mut self) -> Result<(), String>;

    fn pause(&mut self);

    /// Halts playback and rewinds to the start.
    fn stop(&mut self);

    fn seek(&mut self, position_ms: f64);
}

/// Sink for the batched per-tick hit sound. Implementations must not block
/// the tick; a lost sound is preferable to a stalled frame.
pub trait HitSfx {
    fn play(&mut self);
}

/// Discards hit sounds. Used by headless runs and tests.
#[derive(Debug, Default)]
pub struct NullSfx;

impl HitSfx for NullSfx {
    fn play(&mut self) {}
}

/// A `PlaybackClock` driven by the process wall clock, with a fixed duration.
///
/// Positions are quantized down to a coarse report interval, repeating the
/// previous value in between, which matches how media backends surface
/// playback time and exercises the conductor's damping. Used by the demo
/// binary and by timing tests.
#[derive(Debug)]
pub struct TimerClock {
    duration_ms: f64,
    report_interval_ms: f64,
    /// Playback accumulated before the current play segment.
    played_ms: f64,
    playing_since: Option<Instant>,
}

impl TimerClock {
    pub fn new(duration_ms: f64) -> Self {
        // 100ms is a typical media-backend position report rate.
        Self::with_report_interval(duration_ms, 100.0)
    }

    pub fn with_report_interval(duration_ms: f64, report_interval_ms: f64) -> Self {
        Self {
            duration_ms: duration_ms.max(0.0),
            report_interval_ms,
            played_ms: 0.0,
            playing_since: None,
        }
    }

    fn raw_position_ms(&self) -> f64 {
        let playing = self
            .playing_since
            .map_or(0.0, |since| since.elapsed().as_secs_f64() * 1000.0);
        (self.played_ms + playing).min(self.duration_ms)
    }
}

impl PlaybackClock for TimerClock {
    fn position_ms(&self) -> f64 {
        if self.report_interval_ms <= 0.0 {
            return self.raw_position_ms();
        }
        (self.raw_position_ms() / self.report_interval_ms).floor() * self.report_interval_ms
    }

    fn duration_ms(&self) -> Option<f64> {
        Some(self.duration_ms)
    }

    fn play(&mut self) -> Result<(), String> {
        if self.playing_since.is_none() {
            self.playing_since = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(since) = self.playing_since.take() {
            self.played_ms += since.elapsed().as_secs_f64() * 1000.0;
        }
    }

    fn stop(&mut self) {
        self.playing_since = None;
        self.played_ms = 0.0;
    }

    fn seek(&mut self, position_ms: f64) {
        self.played_ms = position_ms.clamp(0.0, self.duration_ms);
        if self.playing_since.is_some() {
            self.playing_since = Some(Instant::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PlaybackClock, TimerClock};

    #[test]
    fn stopped_clock_reports_zero_and_known_duration() {
        let clock = TimerClock::new(60_000.0);
        assert_eq!(clock.position_ms(), 0.0);
        assert_eq!(clock.duration_ms(), Some(60_000.0));
    }

    #[test]
    fn positions_quantize_to_the_report_interval() {
        let mut clock = TimerClock::with_report_interval(60_000.0, 100.0);
        clock.seek(1_234.0);
        assert_eq!(clock.position_ms(), 1_200.0);
        clock.seek(99.9);
        assert_eq!(clock.position_ms(), 0.0);
    }

    #[test]
    fn seek_clamps_to_the_track() {
        let mut clock = TimerClock::with_report_interval(5_000.0, 0.0);
        clock.seek(-50.0);
        assert_eq!(clock.position_ms(), 0.0);
        clock.seek(99_999.0);
        assert_eq!(clock.position_ms(), 5_000.0);
    }

    #[test]
    fn stop_rewinds_to_the_start() {
        let mut clock = TimerClock::with_report_interval(5_000.0, 0.0);
        clock.seek(2_000.0);
        clock.stop();
        assert_eq!(clock.position_ms(), 0.0);
    }

    #[test]
    fn pause_freezes_the_position() {
        let mut clock = TimerClock::with_report_interval(5_000.0, 0.0);
        clock.seek(1_000.0);
        clock.play().unwrap();
        clock.pause();
        let frozen = clock.position_ms();
        assert!(frozen >= 1_000.0);
        assert_eq!(clock.position_ms(), frozen);
    }
}
