use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/puff/add", post(handlers::puff_add))
        .route("/puff/undo", post(handlers::puff_undo))
        .route("/api/today", get(handlers::get_today))
        .route("/api/days/:date", get(handlers::get_day))
        .route("/api/events", post(handlers::record_event))
        .route("/api/events/undo", post(handlers::undo_event))
        .route("/api/months/:month", get(handlers::get_month))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/achievements", get(handlers::get_achievements))
        .route(
            "/api/settings",
            get(handlers::get_settings).put(handlers::put_settings),
        )
        .route("/api/settings/dark-mode", post(handlers::toggle_dark_mode))
        .route("/api/reset", post(handlers::reset))
        .with_state(state)
}
