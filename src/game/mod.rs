pub mod chart;
pub mod conductor;
pub mod engine;
pub mod judgment;
pub mod metrics;
pub mod note;
pub mod scheduler;
pub mod scores;
pub mod session;
