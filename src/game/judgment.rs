use crate::game::note::Note;

// ------------------ Hit windows (gameplay + evaluation) ------------------
// Inclusive half-widths in milliseconds, tightest first. The windows are
// nested, so checking in this order yields the minimal enclosing window.
pub const WINDOW_PERFECT_MS: f64 = 18.0;
pub const WINDOW_GREAT_MS: f64 = 43.0;
pub const WINDOW_GOOD_MS: f64 = 76.0;
pub const WINDOW_OK_MS: f64 = 127.0;

/// Widest offset at which a press can still consume a note. A press further
/// out registers nothing; the note eventually expires as a miss once the
/// position passes `end_time_ms + MAX_HIT_WINDOW_MS`.
pub const MAX_HIT_WINDOW_MS: f64 = WINDOW_OK_MS;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JudgeGrade {
    Perfect,
    Great,
    Good,
    Ok,
    Miss,
}

impl JudgeGrade {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Perfect => "Perfect",
            Self::Great => "Great",
            Self::Good => "Good",
            Self::Ok => "OK",
            Self::Miss => "Miss",
        }
    }

    /// Accuracy weight credited toward `notes_hit` when a note resolves with
    /// this grade.
    pub const fn accuracy_weight(&self) -> f64 {
        match self {
            Self::Perfect => 1.0,
            Self::Great => 0.98,
            Self::Good => 0.65,
            Self::Ok => 0.25,
            Self::Miss => 0.0,
        }
    }
}

/// Classify a signed timing offset (press position minus note time, ms) into
/// the tightest window containing it. Boundaries are inclusive on both
/// sides. Returns `None` beyond `MAX_HIT_WINDOW_MS`; never returns `Miss`.
#[inline(always)]
pub fn classify_offset_ms(offset_ms: f64) -> Option<JudgeGrade> {
    let abs = offset_ms.abs();
    if abs <= WINDOW_PERFECT_MS {
        Some(JudgeGrade::Perfect)
    } else if abs <= WINDOW_GREAT_MS {
        Some(JudgeGrade::Great)
    } else if abs <= WINDOW_GOOD_MS {
        Some(JudgeGrade::Good)
    } else if abs <= WINDOW_OK_MS {
        Some(JudgeGrade::Ok)
    } else {
        None
    }
}

/// Produced exactly once per note resolution and forwarded synchronously to
/// the metrics accumulator in emission order.
#[derive(Clone, Debug, PartialEq)]
pub enum JudgmentEvent {
    Hit { grade: JudgeGrade, note: Note },
    Miss { note: Note },
}

impl JudgmentEvent {
    pub fn note(&self) -> &Note {
        match self {
            Self::Hit { note, .. } | Self::Miss { note } => note,
        }
    }

    pub fn grade(&self) -> JudgeGrade {
        match self {
            Self::Hit { grade, .. } => *grade,
            Self::Miss { .. } => JudgeGrade::Miss,
        }
    }
}
