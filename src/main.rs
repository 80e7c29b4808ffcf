use std::path::PathBuf;
use std::time::Instant;

use log::info;

use lanesync::config;
use lanesync::core::audio::TimerClock;
use lanesync::game::chart::Chart;
use lanesync::game::scheduler::TICK_INTERVAL;
use lanesync::game::scores;
use lanesync::game::session::PlaySession;

/// Headless demo: plays a chart file end to end under autoplay against a
/// wall-clock timer, then prints the results and records the score next to
/// the chart.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install logger immediately, then set runtime max level from config after loading it.
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Trace)
        .try_init();
    // Startup default when config is missing or malformed.
    log::set_max_level(log::LevelFilter::Warn);

    config::load();
    log::set_max_level(config::get().log_level.as_level_filter());

    let chart_path = PathBuf::from(
        std::env::args()
            .nth(1)
            .ok_or("usage: lanesync <chart-file>")?,
    );
    let chart = Chart::load(&chart_path)?;
    info!(
        "Loaded \"{}\" by {} [{}], {} notes",
        chart.title,
        chart.artist,
        chart.difficulty,
        chart.note_count()
    );

    // No audio backend here: size a timer clock off the chart, with a short
    // tail after the last note so the final judgments land before song end.
    let clock = TimerClock::new(chart.last_note_end_ms() + 2_000.0);

    let chart_hash = chart.short_hash.clone();
    let score_dir = chart_path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    // The demo takes no input, so it always autoplays.
    let mut session = PlaySession::new(chart, clock, true);
    session.set_on_song_end(move |snapshot| {
        println!(
            "score {}  accuracy {:.2}%  grade {}  max combo {}",
            snapshot.score, snapshot.accuracy, snapshot.grade, snapshot.max_combo
        );
        if let Ok(json) = serde_json::to_string_pretty(snapshot) {
            println!("{json}");
        }
        scores::append_score(&score_dir, &chart_hash, snapshot);
    });

    session.start_game()?;
    while !session.is_finished() {
        session.update_at(Instant::now());
        std::thread::sleep(TICK_INTERVAL);
    }
    Ok(())
}
