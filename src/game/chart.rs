use std::fs;
use std::hash::Hasher;
use std::path::Path;

use log::warn;
use twox_hash::XxHash64;

use crate::game::note::{NUM_LANES, Note};

/// Number of metadata lines preceding the note data in a chart file.
const HEADER_LINES: usize = 4;

/// The fixed note set for one song/difficulty: four header lines (title,
/// artist, difficulty label, preview time) followed by one note per line.
/// Built once per play session and consumed destructively by the judgment
/// engine's spawn queues.
#[derive(Clone, Debug, Default)]
pub struct Chart {
    pub title: String,
    pub artist: String,
    pub difficulty: String,
    /// Offset into the song used by menu previews. Negative values in the
    /// file clamp to zero.
    pub preview_time_ms: u32,
    /// Per-lane note queues, ordered by start time within each lane.
    pub lanes: [Vec<Note>; NUM_LANES],
    /// Stable identity for the score store, hashed over the raw chart text.
    pub short_hash: String,
}

impl Chart {
    pub fn load(path: &Path) -> Result<Self, std::io::Error> {
        let raw = fs::read_to_string(path)?;
        Ok(Self::parse(&raw))
    }

    /// Parses the chart text format. Malformed note lines are skipped
    /// individually and never abort the load; header fields degrade to
    /// defaults one by one.
    ///
    /// Note lines are `lane(0-3) pointValue startMs endMs [faderFlag]`,
    /// whitespace-separated; a fifth field of any content marks a fader.
    pub fn parse(raw: &str) -> Self {
        let mut chart = Self {
            short_hash: short_hash(raw),
            ..Self::default()
        };

        let mut lines = raw.lines();
        chart.title = lines.next().unwrap_or_default().trim().to_string();
        chart.artist = lines.next().unwrap_or_default().trim().to_string();
        chart.difficulty = lines.next().unwrap_or_default().trim().to_string();
        chart.preview_time_ms = match lines.next().map(str::trim) {
            Some(field) => match field.parse::<i64>() {
                // Negative preview times exist in converted charts; treat as 0.
                Ok(ms) => ms.max(0) as u32,
                Err(_) => {
                    warn!("Chart \"{}\": bad preview time {field:?}, using 0", chart.title);
                    0
                }
            },
            None => 0,
        };

        let mut next_id: u32 = 1;
        for (line_index, line) in lines.enumerate() {
            let Some(note) = parse_note_line(line, next_id) else {
                if !line.trim().is_empty() {
                    warn!(
                        "Chart \"{}\": skipping malformed note line {}: {line:?}",
                        chart.title,
                        line_index + HEADER_LINES + 1
                    );
                }
                continue;
            };
            next_id += 1;
            chart.lanes[note.lane].push(note);
        }
        chart
    }

    pub fn note_count(&self) -> usize {
        self.lanes.iter().map(Vec::len).sum()
    }

    /// Latest `end_time_ms` across all lanes, or 0 for an empty chart. Used
    /// to size a playback clock when no audio backend supplies a duration.
    pub fn last_note_end_ms(&self) -> f64 {
        self.lanes
            .iter()
            .flatten()
            .map(|n| n.end_time_ms)
            .fold(0.0, f64::max)
    }
}

fn parse_note_line(line: &str, id: u32) -> Option<Note> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 4 {
        return None;
    }
    let lane = fields[0].parse::<usize>().ok().filter(|&l| l < NUM_LANES)?;
    let point_value = fields[1].parse::<f64>().ok()?;
    let start_time_ms = fields[2].parse::<f64>().ok()?;
    let end_time_ms = fields[3].parse::<f64>().ok()?;
    Some(Note {
        id,
        lane,
        start_time_ms,
        end_time_ms,
        point_value,
        fader: fields.len() >= 5,
    })
}

fn short_hash(raw: &str) -> String {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(raw.as_bytes());
    format!("{:016x}", hasher.finish())
}
