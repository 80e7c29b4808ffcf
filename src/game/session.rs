use std::time::Instant;

use log::info;

use crate::config;
use crate::core::audio::{HitSfx, NullSfx, PlaybackClock};
use crate::game::chart::Chart;
use crate::game::conductor::{Conductor, SongProgress};
use crate::game::engine::{EventBuf, JudgmentEngine};
use crate::game::metrics::{MetricsSnapshot, PlayMetrics};
use crate::game::note::{NUM_LANES, Note};
use crate::game::scheduler::FrameScheduler;

/// One play-through of one chart: owns the conductor, scheduler, judgment
/// engine, and metrics, and sequences them through a tick.
///
/// The host drives it with `update()` at roughly `TICK_INTERVAL` and routes
/// input through `press_lane`/`release_lane`; everything else happens inside
/// the tick. When the conductor reports song end the session finishes
/// itself: it stops the scheduler and clock, snapshots the metrics, and
/// fires the song-end callback exactly once.
pub struct PlaySession<C: PlaybackClock> {
    /// Retained for metadata only; its lanes were drained into the engine.
    chart: Chart,
    conductor: Conductor<C>,
    scheduler: FrameScheduler,
    engine: JudgmentEngine,
    metrics: PlayMetrics,
    sfx: Box<dyn HitSfx>,
    on_song_end: Option<Box<dyn FnMut(&MetricsSnapshot)>>,
    lane_pressed: [bool; NUM_LANES],
    /// Set once the hit sound has played since the last completed tick, so
    /// a chord or a press-plus-tick frame produces one sound, not one per
    /// note.
    hit_this_tick: bool,
    finished: bool,
    events: EventBuf,
}

impl<C: PlaybackClock> PlaySession<C> {
    pub fn new(mut chart: Chart, clock: C, autoplay: bool) -> Self {
        let lanes = std::mem::take(&mut chart.lanes);
        let note_count: usize = lanes.iter().map(Vec::len).sum();
        info!(
            "Session ready: \"{}\" [{}], {note_count} notes{}",
            chart.title,
            chart.difficulty,
            if autoplay { ", autoplay" } else { "" }
        );
        Self {
            chart,
            conductor: Conductor::new(clock),
            scheduler: FrameScheduler::new(),
            engine: JudgmentEngine::new(lanes, autoplay),
            metrics: PlayMetrics::new(),
            sfx: Box::new(NullSfx),
            on_song_end: None,
            lane_pressed: [false; NUM_LANES],
            hit_this_tick: false,
            finished: false,
            events: EventBuf::new(),
        }
    }

    pub fn with_sfx(mut self, sfx: Box<dyn HitSfx>) -> Self {
        self.sfx = sfx;
        self
    }

    /// Registers the results callback, replacing any previous one. It fires
    /// once, on the tick the song ends; a stopped or dropped session never
    /// fires it.
    pub fn set_on_song_end(&mut self, callback: impl FnMut(&MetricsSnapshot) + 'static) {
        self.on_song_end = Some(Box::new(callback));
    }

    pub fn start_game(&mut self) -> Result<(), String> {
        self.start_game_at(Instant::now())
    }

    pub fn start_game_at(&mut self, now: Instant) -> Result<(), String> {
        self.conductor.start_at(now)?;
        self.scheduler.start();
        Ok(())
    }

    pub fn update(&mut self) {
        self.update_at(Instant::now());
    }

    /// Runs one tick: advance the conductor, resolve notes, fold the events
    /// into the metrics, flush the batched hit sound, and finish the session
    /// if the song ended.
    pub fn update_at(&mut self, now: Instant) {
        if self.finished {
            return;
        }
        let Self {
            scheduler,
            conductor,
            engine,
            metrics,
            events,
            sfx,
            hit_this_tick,
            ..
        } = self;

        let mut ended = false;
        scheduler.tick(now, |_dt| {
            let progress = conductor.update_at(now);
            let position_ms = conductor.position_ms();

            if engine.tick(position_ms, events)
                && !*hit_this_tick
                && config::get().hitsound_volume > 0.0
            {
                sfx.play();
            }
            for event in events.drain(..) {
                metrics.apply(&event);
            }
            *hit_this_tick = false;
            if progress == SongProgress::Ended {
                ended = true;
            }
        });

        if ended {
            self.finish();
        }
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.scheduler.stop();
        self.conductor.stop();
        let snapshot = self.metrics.snapshot();
        info!(
            "Song over: score {}, accuracy {:.2}%, grade {}, max combo {}",
            snapshot.score, snapshot.accuracy, snapshot.grade, snapshot.max_combo
        );
        if let Some(callback) = self.on_song_end.as_mut() {
            callback(&snapshot);
        }
    }

    /// Pauses a running session or resumes a paused one. The scheduler side
    /// takes effect at the next tick boundary; the clock is told immediately.
    pub fn toggle_pause(&mut self) {
        self.toggle_pause_at(Instant::now());
    }

    pub fn toggle_pause_at(&mut self, now: Instant) {
        if self.finished || !self.scheduler.is_active() {
            return;
        }
        if self.scheduler.is_paused() {
            self.conductor.unpause_at(now);
            self.scheduler.play();
        } else {
            self.scheduler.pause();
            self.conductor.pause();
        }
    }

    /// Routes a lane press through the judgment engine at the current
    /// conductor position. Presses while paused or finished only update the
    /// held-lane state for the renderer.
    pub fn press_lane(&mut self, lane: usize) {
        if lane < NUM_LANES {
            self.lane_pressed[lane] = true;
        }
        if self.finished || self.scheduler.is_paused() || !self.scheduler.is_active() {
            return;
        }
        let position_ms = self.conductor.position_ms();
        if self.engine.press_lane(lane, position_ms, &mut self.events) && !self.hit_this_tick {
            // Sound the hit right away rather than waiting for the next
            // tick; the flag still caps it at one per tick.
            self.hit_this_tick = true;
            if config::get().hitsound_volume > 0.0 {
                self.sfx.play();
            }
        }
        for event in self.events.drain(..) {
            self.metrics.apply(&event);
        }
    }

    pub fn release_lane(&mut self, lane: usize) {
        if lane < NUM_LANES {
            self.lane_pressed[lane] = false;
        }
    }

    /// Aborts the session without recording a result; the song-end callback
    /// does not fire.
    pub fn stop(&mut self) {
        self.scheduler.stop();
        self.conductor.stop();
        self.finished = true;
    }

    pub fn metrics(&self) -> &PlayMetrics {
        &self.metrics
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    pub fn active_notes(&self, lane: usize) -> impl Iterator<Item = &Note> {
        self.engine.active_notes(lane)
    }

    pub fn lane_pressed(&self, lane: usize) -> bool {
        lane < NUM_LANES && self.lane_pressed[lane]
    }

    pub fn position_ms(&self) -> f64 {
        self.conductor.position_ms()
    }

    pub fn song_length_ms(&self) -> Option<f64> {
        self.conductor.song_length_ms()
    }

    pub fn is_paused(&self) -> bool {
        self.scheduler.is_paused()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
