/// Number of independent note lanes a player can hit.
pub const NUM_LANES: usize = 4;

#[derive(Clone, Debug, PartialEq)]
pub struct Note {
    pub id: u32,
    /// Lane index in `0..NUM_LANES`.
    pub lane: usize,
    /// When the note becomes visible and enters its lane's active queue.
    pub start_time_ms: f64,
    /// The moment the note should be hit; judgment offsets are measured
    /// against this.
    pub end_time_ms: f64,
    pub point_value: f64,
    /// Rendering hint: the note fades as it falls. Carried through for the
    /// presentation layer, ignored by judgment and scoring.
    pub fader: bool,
}
