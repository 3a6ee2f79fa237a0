pub mod achievements;
pub mod app;
pub mod config;
pub mod date;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod state;
pub mod stats;
pub mod storage;
pub mod tracker;
pub mod ui;

pub use app::router;
pub use config::TrackerConfig;
pub use state::AppState;
pub use storage::{JsonFileStore, KeyValueStore};
pub use tracker::PuffTracker;
