//! Timing and judgment core for a four-lane rhythm game: chart note
//! scheduling, tiered hit judgment, miss resolution, and deterministic
//! score/accuracy/grade accumulation, driven by a frame scheduler and a
//! smoothed playback-position estimate. Rendering, input binding, and audio
//! playback live in the host; the core consumes them through small seams.

pub mod config;
pub mod core;
pub mod game;
