use crate::achievements::{self, AchievementSnapshot, AchievementStatus};
use crate::config::Heuristics;
use crate::date::{DayKey, YearMonth};
use crate::errors::{SettingsError, StorageError};
use crate::models::{MonthlyBreakdown, Settings, StatsSummary, TimePeriod, TrackerState, UnlockedAchievement};
use crate::stats;
use crate::storage::{self, KeyValueStore};
use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Serialize};
use tracing::info;

/// What happened to the durability write behind a mutation. In-memory state
/// is updated regardless.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum Persistence {
    Saved,
    /// Nothing changed, so nothing was written.
    Skipped,
    Failed(String),
}

impl Persistence {
    pub fn is_failed(&self) -> bool {
        matches!(self, Persistence::Failed(_))
    }

    fn merge(self, other: Persistence) -> Persistence {
        match (self, other) {
            (failed @ Persistence::Failed(_), _) => failed,
            (_, failed @ Persistence::Failed(_)) => failed,
            (Persistence::Skipped, other) => other,
            (saved, _) => saved,
        }
    }
}

impl From<Result<(), StorageError>> for Persistence {
    fn from(result: Result<(), StorageError>) -> Self {
        match result {
            Ok(()) => Persistence::Saved,
            Err(err) => Persistence::Failed(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome<T> {
    pub value: T,
    pub persistence: Persistence,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recorded {
    pub date: DayKey,
    pub count: u32,
    pub unlocked: Vec<UnlockedAchievement>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub daily_goal: Option<u32>,
    pub cost_per_unit: Option<f64>,
    pub is_dark_mode: Option<bool>,
}

/// Owns the daily log, timestamps, settings and unlocked achievements, and
/// writes each change through to `S`.
pub struct PuffTracker<S> {
    store: S,
    state: TrackerState,
    heuristics: Heuristics,
}

impl<S: KeyValueStore> PuffTracker<S> {
    pub async fn open(store: S, heuristics: Heuristics) -> Self {
        let state = storage::load_state(&store).await;
        info!(
            days = state.daily.len(),
            achievements = state.achievements.len(),
            "loaded tracker state"
        );
        Self {
            store,
            state,
            heuristics,
        }
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn heuristics(&self) -> Heuristics {
        self.heuristics
    }

    pub fn settings(&self) -> &Settings {
        &self.state.settings
    }

    pub async fn record_event(&mut self, date: DayKey) -> Outcome<Recorded> {
        self.record_event_at(date, Local::now().fixed_offset()).await
    }

    pub async fn record_event_at(&mut self, date: DayKey, at: DateTime<FixedOffset>) -> Outcome<Recorded> {
        let count = {
            let entry = self.state.daily.entry(date).or_insert(0);
            *entry = entry.saturating_add(1);
            *entry
        };
        self.state.timestamps.entry(date).or_default().push(at);

        let mut persistence = Persistence::from(storage::persist_logs(&self.store, &self.state).await);

        let snapshot = self.snapshot(date, count);
        let unlocked = achievements::evaluate(&snapshot, &mut self.state.achievements, at);
        if !unlocked.is_empty() {
            for achievement in &unlocked {
                info!(id = %achievement.id, "achievement unlocked");
            }
            persistence = persistence.merge(
                storage::persist_achievements(&self.store, &self.state.achievements)
                    .await
                    .into(),
            );
        }

        Outcome {
            value: Recorded {
                date,
                count,
                unlocked,
            },
            persistence,
        }
    }

    /// Removes the most recent event of `date`. A day with no events is left
    /// untouched and nothing is written.
    pub async fn undo_event(&mut self, date: DayKey) -> Outcome<u32> {
        let Some(count) = self.state.daily.get_mut(&date) else {
            return Outcome {
                value: 0,
                persistence: Persistence::Skipped,
            };
        };
        *count = count.saturating_sub(1);
        let remaining = *count;
        if remaining == 0 {
            self.state.daily.remove(&date);
        }

        if let Some(stamps) = self.state.timestamps.get_mut(&date) {
            stamps.pop();
            if stamps.is_empty() {
                self.state.timestamps.remove(&date);
            }
        }

        let persistence = storage::persist_logs(&self.store, &self.state).await.into();
        Outcome {
            value: remaining,
            persistence,
        }
    }

    pub fn count_for_date(&self, date: DayKey) -> u32 {
        self.state.count_for(date)
    }

    pub fn monthly_breakdown(&self, month: YearMonth) -> MonthlyBreakdown {
        stats::monthly_breakdown(&self.state.daily, month)
    }

    pub fn daily_average(&self) -> f64 {
        stats::daily_average(&self.state.daily)
    }

    pub fn weekly_average(&self, reference: DayKey) -> f64 {
        stats::weekly_average(&self.state.daily, reference)
    }

    pub fn monthly_average(&self, reference: DayKey) -> f64 {
        stats::monthly_average(&self.state.daily, reference)
    }

    pub fn current_streak(&self, reference: DayKey) -> u32 {
        stats::current_streak(
            &self.state.daily,
            reference,
            self.state.settings.daily_goal,
            self.heuristics.streak_floor,
        )
    }

    pub fn weekly_improvement(&self, reference: DayKey) -> i64 {
        stats::weekly_improvement(&self.state.daily, reference)
    }

    pub fn peak_usage_hour(&self) -> Option<u32> {
        stats::peak_usage_hour(&self.state.timestamps)
    }

    pub fn most_active_period(&self) -> Option<TimePeriod> {
        stats::most_active_period(&self.state.timestamps)
    }

    pub fn cost_spent(&self, count: u64) -> f64 {
        stats::cost_spent(count, self.state.settings.cost_per_unit)
    }

    pub fn cost_saved(&self) -> f64 {
        stats::cost_saved(
            &self.state.daily,
            self.heuristics.baseline_daily,
            self.state.settings.cost_per_unit,
        )
    }

    pub fn summary_at(&self, reference: DayKey) -> StatsSummary {
        let daily = &self.state.daily;
        let today_count = self.count_for_date(reference);
        let total = stats::total(daily);

        StatsSummary {
            date: reference,
            today_count,
            total,
            days_tracked: daily.len(),
            daily_average: stats::round_one_decimal(self.daily_average()),
            weekly_average: stats::round_one_decimal(self.weekly_average(reference)),
            monthly_average: stats::round_one_decimal(self.monthly_average(reference)),
            current_streak: self.current_streak(reference),
            weekly_improvement: self.weekly_improvement(reference),
            peak_hour: self.peak_usage_hour(),
            most_active_period: self.most_active_period(),
            cost_spent_today: stats::round_cents(self.cost_spent(u64::from(today_count))),
            cost_spent_total: stats::round_cents(self.cost_spent(total)),
            cost_saved: stats::round_cents(self.cost_saved()),
            chart: stats::build_chart_at(reference, daily, self.state.settings.daily_goal),
        }
    }

    pub fn achievements(&self) -> Vec<AchievementStatus> {
        achievements::statuses(&self.state.achievements)
    }

    pub async fn save_settings(&mut self, update: SettingsUpdate) -> Result<Outcome<Settings>, SettingsError> {
        let mut settings = self.state.settings.clone();
        if let Some(goal) = update.daily_goal {
            if goal == 0 {
                return Err(SettingsError::InvalidGoal);
            }
            settings.daily_goal = goal;
        }
        if let Some(cost) = update.cost_per_unit {
            if !cost.is_finite() || cost < 0.0 {
                return Err(SettingsError::InvalidCost(cost));
            }
            settings.cost_per_unit = cost;
        }
        if let Some(dark) = update.is_dark_mode {
            settings.is_dark_mode = dark;
        }

        self.state.settings = settings.clone();
        let persistence = storage::persist_settings(&self.store, &settings).await.into();
        Ok(Outcome {
            value: settings,
            persistence,
        })
    }

    pub async fn set_dark_mode(&mut self, enabled: bool) -> Outcome<bool> {
        self.state.settings.is_dark_mode = enabled;
        let persistence = storage::persist_value(&self.store, storage::KEY_DARK_MODE, &enabled)
            .await
            .into();
        Outcome {
            value: enabled,
            persistence,
        }
    }

    pub async fn toggle_dark_mode(&mut self) -> Outcome<bool> {
        let enabled = !self.state.settings.is_dark_mode;
        self.set_dark_mode(enabled).await
    }

    /// Forgets every logged event and unlocked achievement. Settings stay.
    pub async fn reset(&mut self) -> Outcome<()> {
        self.state.daily.clear();
        self.state.timestamps.clear();
        self.state.achievements.clear();
        info!("tracker progress reset");

        Outcome {
            value: (),
            persistence: storage::clear_progress(&self.store).await.into(),
        }
    }

    fn snapshot(&self, date: DayKey, count: u32) -> AchievementSnapshot {
        AchievementSnapshot {
            today_count: count,
            daily_goal: self.state.settings.daily_goal,
            current_streak: self.logged_streak(date),
            cost_saved: self.cost_saved(),
        }
    }

    /// Streak that never reaches back before the first logged day, so days
    /// from before tracking started do not count toward achievements.
    fn logged_streak(&self, reference: DayKey) -> u32 {
        let floor = match self.state.daily.keys().next() {
            Some(first) => (*first).max(self.heuristics.streak_floor),
            None => self.heuristics.streak_floor,
        };
        stats::current_streak(&self.state.daily, reference, self.state.settings.daily_goal, floor)
    }
}
