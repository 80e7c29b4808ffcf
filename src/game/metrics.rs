use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game::judgment::{JudgeGrade, JudgmentEvent};

/// Letter grade for a finished (or in-progress) play. `S` is reserved for
/// zero-miss plays regardless of accuracy; below that the letter follows
/// accuracy thresholds alone.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    S,
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::S => "S",
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Running tallies for one play session, fed one `JudgmentEvent` at a time
/// in resolution order. Purely accumulative: it never looks back at the
/// chart or the queues.
#[derive(Clone, Debug, Default)]
pub struct PlayMetrics {
    /// Sum of accuracy weights over resolved notes.
    notes_hit: f64,
    /// Count of resolved notes, hit or missed.
    notes_passed: f64,
    combo: u32,
    max_combo: u32,
    score: i64,
    perfects: u32,
    greats: u32,
    goods: u32,
    oks: u32,
    misses: u32,
    last_judgment: Option<JudgeGrade>,
}

impl PlayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one resolved note into the tallies. Hits extend the combo and
    /// bank `combo * point_value` (truncated per note); misses break the
    /// combo after recording its peak.
    pub fn apply(&mut self, event: &JudgmentEvent) {
        self.notes_passed += 1.0;
        match event {
            JudgmentEvent::Hit { grade, note } => {
                self.notes_hit += grade.accuracy_weight();
                self.combo += 1;
                self.score += (f64::from(self.combo) * note.point_value) as i64;
                match grade {
                    JudgeGrade::Perfect => self.perfects += 1,
                    JudgeGrade::Great => self.greats += 1,
                    JudgeGrade::Good => self.goods += 1,
                    JudgeGrade::Ok => self.oks += 1,
                    JudgeGrade::Miss => {}
                }
                self.last_judgment = Some(*grade);
            }
            JudgmentEvent::Miss { .. } => {
                self.misses += 1;
                self.max_combo = self.max_combo.max(self.combo);
                self.combo = 0;
                self.last_judgment = Some(JudgeGrade::Miss);
            }
        }
    }

    /// Weighted percentage over resolved notes. A play with nothing resolved
    /// yet reports 100, so the HUD opens at full accuracy instead of zero.
    pub fn accuracy(&self) -> f64 {
        if self.notes_passed == 0.0 {
            100.0
        } else {
            self.notes_hit / self.notes_passed * 100.0
        }
    }

    pub fn grade(&self) -> Grade {
        if self.misses == 0 {
            return Grade::S;
        }
        let acc = self.accuracy();
        if acc >= 92.0 {
            Grade::A
        } else if acc >= 80.0 {
            Grade::B
        } else if acc >= 70.0 {
            Grade::C
        } else if acc >= 60.0 {
            Grade::D
        } else {
            Grade::F
        }
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    /// Peak combo. While no miss has broken the chain the current combo IS
    /// the peak, so a full-combo play reports it live; after that only the
    /// tracked maximum is reported, and a live run folds into it on the
    /// next miss.
    pub fn max_combo(&self) -> u32 {
        if self.misses == 0 {
            self.combo
        } else {
            self.max_combo
        }
    }

    pub fn perfects(&self) -> u32 {
        self.perfects
    }

    pub fn greats(&self) -> u32 {
        self.greats
    }

    pub fn goods(&self) -> u32 {
        self.goods
    }

    pub fn oks(&self) -> u32 {
        self.oks
    }

    pub fn misses(&self) -> u32 {
        self.misses
    }

    pub fn notes_passed(&self) -> u32 {
        self.notes_passed as u32
    }

    /// Grade of the most recently resolved note, for HUD flash text.
    pub fn last_judgment(&self) -> Option<JudgeGrade> {
        self.last_judgment
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            score: self.score,
            accuracy: self.accuracy(),
            grade: self.grade(),
            max_combo: self.max_combo(),
            perfects: self.perfects,
            greats: self.greats,
            goods: self.goods,
            oks: self.oks,
            misses: self.misses,
        }
    }
}

/// Immutable results summary handed to the song-end callback and to the
/// score store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub score: i64,
    pub accuracy: f64,
    pub grade: Grade,
    pub max_combo: u32,
    pub perfects: u32,
    pub greats: u32,
    pub goods: u32,
    pub oks: u32,
    pub misses: u32,
}

#[cfg(test)]
mod tests {
    use super::{Grade, PlayMetrics};
    use crate::game::judgment::{JudgeGrade, JudgmentEvent};
    use crate::game::note::Note;

    fn note(point_value: f64) -> Note {
        Note {
            id: 1,
            lane: 0,
            start_time_ms: 0.0,
            end_time_ms: 1000.0,
            point_value,
            fader: false,
        }
    }

    fn hit(grade: JudgeGrade, point_value: f64) -> JudgmentEvent {
        JudgmentEvent::Hit {
            grade,
            note: note(point_value),
        }
    }

    fn miss() -> JudgmentEvent {
        JudgmentEvent::Miss { note: note(5.0) }
    }

    #[test]
    fn fresh_metrics_read_as_a_clean_slate() {
        let metrics = PlayMetrics::new();
        assert_eq!(metrics.score(), 0);
        assert_eq!(metrics.combo(), 0);
        assert_eq!(metrics.accuracy(), 100.0, "no notes resolved yet");
        assert_eq!(metrics.grade(), Grade::S);
        assert_eq!(metrics.last_judgment(), None);
    }

    #[test]
    fn combo_multiplies_the_banked_points() {
        let mut metrics = PlayMetrics::new();
        for _ in 0..3 {
            metrics.apply(&hit(JudgeGrade::Perfect, 5.0));
        }
        // 1*5 + 2*5 + 3*5
        assert_eq!(metrics.score(), 30);
        assert_eq!(metrics.combo(), 3);
        assert_eq!(metrics.notes_passed(), 3);
    }

    #[test]
    fn each_note_truncates_its_contribution_separately() {
        let mut metrics = PlayMetrics::new();
        metrics.apply(&hit(JudgeGrade::Perfect, 2.5)); // 1 * 2.5 -> 2
        metrics.apply(&hit(JudgeGrade::Perfect, 2.5)); // 2 * 2.5 -> 5
        assert_eq!(metrics.score(), 7, "2.5 + 5.0 truncate to 2 + 5");
    }

    #[test]
    fn a_miss_breaks_the_combo_and_keeps_the_peak() {
        let mut metrics = PlayMetrics::new();
        for _ in 0..4 {
            metrics.apply(&hit(JudgeGrade::Great, 5.0));
        }
        metrics.apply(&miss());
        assert_eq!(metrics.combo(), 0);
        assert_eq!(metrics.max_combo(), 4);
        assert_eq!(metrics.last_judgment(), Some(JudgeGrade::Miss));

        // A shorter second run must not shrink the recorded peak.
        metrics.apply(&hit(JudgeGrade::Great, 5.0));
        assert_eq!(metrics.max_combo(), 4);
    }

    #[test]
    fn a_post_miss_run_only_counts_at_the_next_miss() {
        let mut metrics = PlayMetrics::new();
        for _ in 0..3 {
            metrics.apply(&hit(JudgeGrade::Perfect, 5.0));
        }
        metrics.apply(&miss());
        for _ in 0..5 {
            metrics.apply(&hit(JudgeGrade::Perfect, 5.0));
        }
        // The live 5-run is longer but has not been folded in yet.
        assert_eq!(metrics.max_combo(), 3);
        assert_eq!(metrics.snapshot().max_combo, 3);

        metrics.apply(&miss());
        assert_eq!(metrics.max_combo(), 5);
    }

    #[test]
    fn an_unbroken_combo_is_its_own_peak() {
        let mut metrics = PlayMetrics::new();
        for _ in 0..7 {
            metrics.apply(&hit(JudgeGrade::Perfect, 1.0));
        }
        assert_eq!(metrics.max_combo(), 7);
    }

    #[test]
    fn accuracy_is_the_weighted_percentage() {
        let mut metrics = PlayMetrics::new();
        metrics.apply(&hit(JudgeGrade::Perfect, 5.0)); // 1.0
        metrics.apply(&hit(JudgeGrade::Great, 5.0)); // 0.98
        metrics.apply(&hit(JudgeGrade::Good, 5.0)); // 0.65
        metrics.apply(&hit(JudgeGrade::Ok, 5.0)); // 0.25
        let expected = (1.0 + 0.98 + 0.65 + 0.25) / 4.0 * 100.0;
        assert!((metrics.accuracy() - expected).abs() < 1e-9);
        assert!(metrics.accuracy() <= 100.0);
    }

    #[test]
    fn s_grade_requires_a_missless_play() {
        let mut metrics = PlayMetrics::new();
        // All OK hits: terrible accuracy, but still S because nothing missed.
        for _ in 0..10 {
            metrics.apply(&hit(JudgeGrade::Ok, 5.0));
        }
        assert_eq!(metrics.grade(), Grade::S);

        metrics.apply(&miss());
        assert_eq!(metrics.grade(), Grade::F, "25% weighted accuracy with a miss");
    }

    #[test]
    fn letter_grades_follow_the_accuracy_thresholds() {
        // One miss forces the letter path; n perfects land at n/(n+1).
        let cases = [
            (60, Grade::A), // 98.4%
            (10, Grade::B), // 90.9%
            (3, Grade::C),  // 75.0%
            (2, Grade::D),  // 66.7%
            (1, Grade::F),  // 50.0%
        ];
        for (perfect_count, expected) in cases {
            let mut metrics = PlayMetrics::new();
            for _ in 0..perfect_count {
                metrics.apply(&hit(JudgeGrade::Perfect, 5.0));
            }
            metrics.apply(&miss());
            assert_eq!(
                metrics.grade(),
                expected,
                "{perfect_count} perfects + 1 miss -> {:.2}%",
                metrics.accuracy()
            );
        }
    }

    #[test]
    fn snapshot_mirrors_the_live_tallies() {
        let mut metrics = PlayMetrics::new();
        metrics.apply(&hit(JudgeGrade::Perfect, 5.0));
        metrics.apply(&hit(JudgeGrade::Good, 5.0));
        metrics.apply(&miss());

        let snap = metrics.snapshot();
        assert_eq!(snap.score, metrics.score());
        assert_eq!(snap.max_combo, 2);
        assert_eq!(snap.perfects, 1);
        assert_eq!(snap.goods, 1);
        assert_eq!(snap.misses, 1);
        assert_eq!(snap.grade, metrics.grade());
        assert!((snap.accuracy - metrics.accuracy()).abs() < 1e-12);
    }
}
