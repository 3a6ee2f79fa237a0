use crate::achievements::AchievementStatus;
use crate::date::{DayKey, YearMonth};
use crate::errors::AppError;
use crate::models::{DateQuery, DayCountResponse, EventRequest, MonthlyBreakdown, Settings, StatsSummary};
use crate::state::AppState;
use crate::tracker::{Outcome, Recorded, SettingsUpdate};
use crate::ui::render_index;
use axum::{
    extract::{Path, Query, State},
    response::{Html, Redirect},
    Json,
};
use chrono::Local;
use tracing::warn;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let today = today_key();
    let tracker = state.tracker.lock().await;
    Html(render_index(&tracker.summary_at(today), tracker.settings()))
}

pub async fn get_today(State(state): State<AppState>) -> Json<DayCountResponse> {
    let today = today_key();
    let tracker = state.tracker.lock().await;
    Json(day_response(today, tracker.count_for_date(today), tracker.settings()))
}

pub async fn get_day(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<DayCountResponse>, AppError> {
    let date: DayKey = date.parse()?;
    let tracker = state.tracker.lock().await;
    Ok(Json(day_response(date, tracker.count_for_date(date), tracker.settings())))
}

pub async fn record_event(
    State(state): State<AppState>,
    Json(payload): Json<EventRequest>,
) -> Result<Json<Outcome<Recorded>>, AppError> {
    let date = resolve_date(payload.date.as_deref())?;
    let outcome = state.tracker.lock().await.record_event(date).await;
    log_failure(&outcome);
    Ok(Json(outcome))
}

pub async fn undo_event(
    State(state): State<AppState>,
    Json(payload): Json<EventRequest>,
) -> Result<Json<Outcome<u32>>, AppError> {
    let date = resolve_date(payload.date.as_deref())?;
    let outcome = state.tracker.lock().await.undo_event(date).await;
    log_failure(&outcome);
    Ok(Json(outcome))
}

pub async fn puff_add(State(state): State<AppState>) -> Redirect {
    let outcome = state.tracker.lock().await.record_event(today_key()).await;
    log_failure(&outcome);
    Redirect::to("/")
}

pub async fn puff_undo(State(state): State<AppState>) -> Redirect {
    let outcome = state.tracker.lock().await.undo_event(today_key()).await;
    log_failure(&outcome);
    Redirect::to("/")
}

pub async fn get_month(
    State(state): State<AppState>,
    Path(month): Path<String>,
) -> Result<Json<MonthlyBreakdown>, AppError> {
    let month: YearMonth = month.parse()?;
    let tracker = state.tracker.lock().await;
    Ok(Json(tracker.monthly_breakdown(month)))
}

pub async fn get_stats(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Result<Json<StatsSummary>, AppError> {
    let date = resolve_date(query.date.as_deref())?;
    let tracker = state.tracker.lock().await;
    Ok(Json(tracker.summary_at(date)))
}

pub async fn get_achievements(State(state): State<AppState>) -> Json<Vec<AchievementStatus>> {
    let tracker = state.tracker.lock().await;
    Json(tracker.achievements())
}

pub async fn get_settings(State(state): State<AppState>) -> Json<Settings> {
    let tracker = state.tracker.lock().await;
    Json(tracker.settings().clone())
}

pub async fn put_settings(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<Outcome<Settings>>, AppError> {
    let outcome = state.tracker.lock().await.save_settings(update).await?;
    log_failure(&outcome);
    Ok(Json(outcome))
}

pub async fn toggle_dark_mode(State(state): State<AppState>) -> Json<Outcome<bool>> {
    let outcome = state.tracker.lock().await.toggle_dark_mode().await;
    log_failure(&outcome);
    Json(outcome)
}

pub async fn reset(State(state): State<AppState>) -> Json<Outcome<()>> {
    let outcome = state.tracker.lock().await.reset().await;
    log_failure(&outcome);
    Json(outcome)
}

fn day_response(date: DayKey, count: u32, settings: &Settings) -> DayCountResponse {
    DayCountResponse {
        date: date.to_string(),
        count,
        daily_goal: settings.daily_goal,
        over_goal: count > settings.daily_goal,
    }
}

fn resolve_date(raw: Option<&str>) -> Result<DayKey, AppError> {
    match raw {
        Some(raw) => Ok(raw.parse()?),
        None => Ok(today_key()),
    }
}

fn log_failure<T>(outcome: &Outcome<T>) {
    if outcome.persistence.is_failed() {
        warn!("change kept in memory only: {:?}", outcome.persistence);
    }
}

fn today_key() -> DayKey {
    DayKey::new(Local::now().date_naive())
}
