use std::collections::VecDeque;

use smallvec::SmallVec;

use crate::game::judgment::{JudgeGrade, JudgmentEvent, MAX_HIT_WINDOW_MS, classify_offset_ms};
use crate::game::note::{NUM_LANES, Note};

/// Scratch buffer for the events one tick can emit. Four lanes rarely
/// resolve more than a handful of notes in a single frame.
pub type EventBuf = SmallVec<[JudgmentEvent; 8]>;

/// Owns the per-lane spawn and active queues and resolves every note exactly
/// once: by a manual press, an autoplay hit, or a timeout miss.
pub struct JudgmentEngine {
    /// Not-yet-visible notes, ordered by start time within each lane.
    spawn: [VecDeque<Note>; NUM_LANES],
    /// Spawned, still-judgable notes. The front element is the next note a
    /// press in that lane is judged against.
    active: [VecDeque<Note>; NUM_LANES],
    autoplay: bool,
}

impl JudgmentEngine {
    pub fn new(lanes: [Vec<Note>; NUM_LANES], autoplay: bool) -> Self {
        Self {
            spawn: lanes.map(VecDeque::from),
            active: std::array::from_fn(|_| VecDeque::new()),
            autoplay,
        }
    }

    pub fn autoplay(&self) -> bool {
        self.autoplay
    }

    /// Spawns due notes, applies autoplay hits, and expires missed notes,
    /// pushing one event per resolved note in order. Returns true when any
    /// hit was resolved, so the caller can batch the hit-sound side effect.
    pub fn tick(&mut self, position_ms: f64, events: &mut EventBuf) -> bool {
        self.spawn_due(position_ms);

        let mut hit_any = false;
        for lane in 0..NUM_LANES {
            if self.autoplay {
                // Autoplay resolves due notes as perfect at their end time;
                // it never misses and never consults the hit windows.
                while self.active[lane]
                    .front()
                    .is_some_and(|n| n.end_time_ms <= position_ms)
                {
                    if let Some(note) = self.active[lane].pop_front() {
                        events.push(JudgmentEvent::Hit {
                            grade: JudgeGrade::Perfect,
                            note,
                        });
                        hit_any = true;
                    }
                }
            }
            // A note left past its maximum resolvable lateness is missed.
            while self.active[lane]
                .front()
                .is_some_and(|n| position_ms > n.end_time_ms + MAX_HIT_WINDOW_MS)
            {
                if let Some(note) = self.active[lane].pop_front() {
                    events.push(JudgmentEvent::Miss { note });
                }
            }
        }
        hit_any
    }

    /// Judges a manual press against the front active note in `lane`. A
    /// press outside every window consumes nothing and carries no penalty.
    /// Returns true when a note was hit.
    pub fn press_lane(&mut self, lane: usize, position_ms: f64, events: &mut EventBuf) -> bool {
        if lane >= NUM_LANES {
            return false;
        }
        let Some(front) = self.active[lane].front() else {
            return false;
        };
        let Some(grade) = classify_offset_ms(position_ms - front.end_time_ms) else {
            return false;
        };
        if let Some(note) = self.active[lane].pop_front() {
            events.push(JudgmentEvent::Hit { grade, note });
            return true;
        }
        false
    }

    /// Spawned-but-unresolved notes in `lane`, front (next judgable) first.
    /// The renderer derives on-screen geometry from these timings.
    pub fn active_notes(&self, lane: usize) -> impl Iterator<Item = &Note> {
        self.active.get(lane).into_iter().flatten()
    }

    /// Notes not yet resolved, spawned or not.
    pub fn pending_count(&self) -> usize {
        self.spawn.iter().map(VecDeque::len).sum::<usize>()
            + self.active.iter().map(VecDeque::len).sum::<usize>()
    }

    fn spawn_due(&mut self, position_ms: f64) {
        for lane in 0..NUM_LANES {
            while self.spawn[lane]
                .front()
                .is_some_and(|n| n.start_time_ms <= position_ms)
            {
                if let Some(note) = self.spawn[lane].pop_front() {
                    self.active[lane].push_back(note);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EventBuf, JudgmentEngine};
    use crate::game::judgment::{JudgeGrade, JudgmentEvent};
    use crate::game::note::{NUM_LANES, Note};

    fn note(id: u32, lane: usize, start: f64, end: f64) -> Note {
        Note {
            id,
            lane,
            start_time_ms: start,
            end_time_ms: end,
            point_value: 5.0,
            fader: false,
        }
    }

    fn single_lane(notes: Vec<Note>) -> [Vec<Note>; NUM_LANES] {
        let mut lanes: [Vec<Note>; NUM_LANES] = Default::default();
        lanes[0] = notes;
        lanes
    }

    #[test]
    fn notes_spawn_when_their_start_time_is_reached() {
        let mut engine = JudgmentEngine::new(single_lane(vec![note(1, 0, 1000.0, 2000.0)]), false);
        let mut events = EventBuf::new();

        engine.tick(999.9, &mut events);
        assert_eq!(engine.active_notes(0).count(), 0);
        engine.tick(1000.0, &mut events);
        assert_eq!(engine.active_notes(0).count(), 1);
        assert!(events.is_empty(), "spawning emits no judgment events");
    }

    #[test]
    fn press_at_the_exact_end_time_is_perfect() {
        let mut engine = JudgmentEngine::new(single_lane(vec![note(1, 0, 1000.0, 2000.0)]), false);
        let mut events = EventBuf::new();
        engine.tick(1500.0, &mut events);

        assert!(engine.press_lane(0, 2000.0, &mut events));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].grade(), JudgeGrade::Perfect);
        assert_eq!(events[0].note().id, 1);
        assert_eq!(engine.active_notes(0).count(), 0);
    }

    #[test]
    fn press_outside_every_window_consumes_nothing() {
        let mut engine = JudgmentEngine::new(single_lane(vec![note(1, 0, 1000.0, 2000.0)]), false);
        let mut events = EventBuf::new();
        engine.tick(1500.0, &mut events);

        assert!(!engine.press_lane(0, 1500.0, &mut events), "500ms early");
        assert!(events.is_empty());
        assert_eq!(engine.active_notes(0).count(), 1, "note stays judgable");
    }

    #[test]
    fn press_on_an_empty_lane_is_a_no_op() {
        let mut engine = JudgmentEngine::new(single_lane(vec![]), false);
        let mut events = EventBuf::new();
        assert!(!engine.press_lane(2, 1000.0, &mut events));
        assert!(!engine.press_lane(99, 1000.0, &mut events), "bad lane index");
        assert!(events.is_empty());
    }

    #[test]
    fn notes_expire_as_misses_past_the_widest_window() {
        let mut engine = JudgmentEngine::new(single_lane(vec![note(1, 0, 1000.0, 2000.0)]), false);
        let mut events = EventBuf::new();
        engine.tick(1500.0, &mut events);

        engine.tick(2127.0, &mut events);
        assert!(events.is_empty(), "still within the OK window");
        engine.tick(2127.1, &mut events);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], JudgmentEvent::Miss { .. }));
        assert_eq!(engine.pending_count(), 0);
    }

    #[test]
    fn autoplay_resolves_due_notes_as_perfect() {
        let notes = (0..5)
            .map(|i| note(i + 1, 0, f64::from(i) * 500.0, f64::from(i) * 500.0 + 500.0))
            .collect();
        let mut engine = JudgmentEngine::new(single_lane(notes), true);
        let mut events = EventBuf::new();

        let mut hits = 0;
        let mut position = 0.0;
        while position <= 3000.0 {
            if engine.tick(position, &mut events) {
                hits += events.len();
            }
            for event in events.drain(..) {
                assert_eq!(event.grade(), JudgeGrade::Perfect, "autoplay never misses");
            }
            position += 16.0;
        }
        assert_eq!(hits, 5);
        assert_eq!(engine.pending_count(), 0);
    }

    #[test]
    fn one_tick_can_resolve_notes_across_lanes_in_lane_order() {
        let mut lanes: [Vec<Note>; NUM_LANES] = Default::default();
        lanes[0] = vec![note(1, 0, 0.0, 100.0)];
        lanes[3] = vec![note(2, 3, 0.0, 150.0)];
        let mut engine = JudgmentEngine::new(lanes, false);
        let mut events = EventBuf::new();
        engine.tick(50.0, &mut events);

        // Both notes are long gone: a single late tick resolves both misses.
        engine.tick(10_000.0, &mut events);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].note().id, 1);
        assert_eq!(events[1].note().id, 2);
    }

    #[test]
    fn backlogged_lane_misses_resolve_in_queue_order() {
        let notes = vec![note(1, 0, 0.0, 100.0), note(2, 0, 50.0, 200.0)];
        let mut engine = JudgmentEngine::new(single_lane(notes), false);
        let mut events = EventBuf::new();
        engine.tick(60.0, &mut events);
        assert_eq!(engine.active_notes(0).count(), 2);

        engine.tick(1_000.0, &mut events);
        let ids: Vec<u32> = events.iter().map(|e| e.note().id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn manual_press_only_reaches_the_front_note() {
        let notes = vec![note(1, 0, 0.0, 100.0), note(2, 0, 0.0, 120.0)];
        let mut engine = JudgmentEngine::new(single_lane(notes), false);
        let mut events = EventBuf::new();
        engine.tick(50.0, &mut events);

        // Press at the second note's end time: judged against the first.
        assert!(engine.press_lane(0, 120.0, &mut events));
        assert_eq!(events[0].note().id, 1);
        assert_eq!(events[0].grade(), JudgeGrade::Great, "20ms late on note 1");
    }
}
