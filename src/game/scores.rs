use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use bincode::{Decode, Encode};
use log::{info, warn};

use crate::game::metrics::{Grade, MetricsSnapshot};

/// One finished play, as persisted. Records are append-only; ranking is
/// recomputed on read.
#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct ScoreRecord {
    pub score: i64,
    pub accuracy: f64,
    pub max_combo: u32,
    pub perfects: u32,
    pub greats: u32,
    pub goods: u32,
    pub oks: u32,
    pub misses: u32,
    pub grade_code: u8,
    /// Milliseconds since the Unix epoch when the play finished.
    pub recorded_at_ms: i64,
}

impl ScoreRecord {
    pub fn from_snapshot(snapshot: &MetricsSnapshot) -> Self {
        Self {
            score: snapshot.score,
            accuracy: snapshot.accuracy,
            max_combo: snapshot.max_combo,
            perfects: snapshot.perfects,
            greats: snapshot.greats,
            goods: snapshot.goods,
            oks: snapshot.oks,
            misses: snapshot.misses,
            grade_code: grade_to_code(snapshot.grade),
            recorded_at_ms: now_ms(),
        }
    }

    pub fn grade(&self) -> Grade {
        grade_from_code(self.grade_code)
    }
}

pub fn grade_to_code(grade: Grade) -> u8 {
    match grade {
        Grade::S => 0,
        Grade::A => 1,
        Grade::B => 2,
        Grade::C => 3,
        Grade::D => 4,
        Grade::F => 5,
    }
}

pub fn grade_from_code(code: u8) -> Grade {
    match code {
        0 => Grade::S,
        1 => Grade::A,
        2 => Grade::B,
        3 => Grade::C,
        4 => Grade::D,
        _ => Grade::F,
    }
}

/// Score files are keyed by the chart's content hash, so retitled or moved
/// chart files keep their history and edited ones start fresh.
pub fn score_path(dir: &Path, chart_hash: &str) -> PathBuf {
    dir.join(format!("{chart_hash}.scores"))
}

/// All recorded plays for a chart, oldest first. A missing file means no
/// plays yet; an undecodable file is treated the same after a warning.
pub fn load_scores(dir: &Path, chart_hash: &str) -> Vec<ScoreRecord> {
    let path = score_path(dir, chart_hash);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(_) => return Vec::new(),
    };
    match bincode::decode_from_slice(&bytes, bincode::config::standard()) {
        Ok((records, _)) => records,
        Err(e) => {
            warn!("Ignoring unreadable score file {}: {e}", path.display());
            Vec::new()
        }
    }
}

/// Appends one play to the chart's score file. Persistence failures are
/// logged and swallowed; losing a score must never take down session end.
pub fn append_score(dir: &Path, chart_hash: &str, snapshot: &MetricsSnapshot) {
    let mut records = load_scores(dir, chart_hash);
    records.push(ScoreRecord::from_snapshot(snapshot));

    let bytes = match bincode::encode_to_vec(&records, bincode::config::standard()) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to encode scores for {chart_hash}: {e}");
            return;
        }
    };
    if let Err(e) = fs::create_dir_all(dir) {
        warn!("Failed to create score directory {}: {e}", dir.display());
        return;
    }
    let path = score_path(dir, chart_hash);
    if let Err(e) = fs::write(&path, bytes) {
        warn!("Failed to write score file {}: {e}", path.display());
        return;
    }
    info!(
        "Recorded score {} ({} plays on record) for chart {chart_hash}",
        snapshot.score,
        records.len()
    );
}

/// Highest-scoring play on record, if any.
pub fn best_score(records: &[ScoreRecord]) -> Option<&ScoreRecord> {
    records.iter().max_by_key(|r| r.score)
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
