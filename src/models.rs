use crate::date::{DayKey, YearMonth};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Event count per day. A day is present only while its count is positive.
pub type DailyLog = BTreeMap<DayKey, u32>;

/// Event timestamps per day, in the order they were recorded.
pub type TimestampLog = BTreeMap<DayKey, Vec<DateTime<FixedOffset>>>;

pub const DEFAULT_DAILY_GOAL: u32 = 10;
pub const DEFAULT_COST_PER_UNIT: f64 = 0.50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub daily_goal: u32,
    pub cost_per_unit: f64,
    pub is_dark_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            daily_goal: DEFAULT_DAILY_GOAL,
            cost_per_unit: DEFAULT_COST_PER_UNIT,
            is_dark_mode: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockedAchievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub unlocked_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerState {
    pub daily: DailyLog,
    pub timestamps: TimestampLog,
    pub settings: Settings,
    pub achievements: Vec<UnlockedAchievement>,
}

impl TrackerState {
    pub fn count_for(&self, day: DayKey) -> u32 {
        self.daily.get(&day).copied().unwrap_or(0)
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.achievements.iter().any(|unlocked| unlocked.id == id)
    }

    /// Brings loaded data back in line with the log invariants.
    ///
    /// Days written before timestamps were tracked keep their count with a
    /// shorter (possibly empty) timestamp list; lists longer than the count
    /// lose their newest entries.
    pub fn normalize(&mut self) {
        self.daily.retain(|_, count| *count > 0);

        let daily = &self.daily;
        self.timestamps.retain(|day, stamps| match daily.get(day) {
            Some(&count) => {
                stamps.truncate(count as usize);
                !stamps.is_empty()
            }
            None => false,
        });

        let mut seen = HashSet::new();
        self.achievements
            .retain(|unlocked| seen.insert(unlocked.id.clone()));
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyEntry {
    /// `MM-DD-YYYY`
    pub date: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyBreakdown {
    pub month: YearMonth,
    pub label: String,
    pub entries: Vec<MonthlyEntry>,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimePeriod {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimePeriod {
    pub const ALL: [TimePeriod; 4] = [
        TimePeriod::Morning,
        TimePeriod::Afternoon,
        TimePeriod::Evening,
        TimePeriod::Night,
    ];

    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => TimePeriod::Morning,
            12..=17 => TimePeriod::Afternoon,
            18..=23 => TimePeriod::Evening,
            _ => TimePeriod::Night,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimePeriod::Morning => "Morning",
            TimePeriod::Afternoon => "Afternoon",
            TimePeriod::Evening => "Evening",
            TimePeriod::Night => "Night",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DailyPoint {
    pub date: String,
    pub count: u32,
    pub over_goal: bool,
}

#[derive(Debug, Serialize)]
pub struct WeeklyPoint {
    pub week: String,
    pub start_date: String,
    pub end_date: String,
    pub total: u64,
}

#[derive(Debug, Serialize)]
pub struct WeeklyAveragePoint {
    pub week: String,
    pub days_counted: u8,
    pub average: f64,
}

#[derive(Debug, Serialize)]
pub struct ChartSeries {
    pub last_7_days: Vec<DailyPoint>,
    pub weekly_totals: Vec<WeeklyPoint>,
    pub weekly_averages: Vec<WeeklyAveragePoint>,
}

#[derive(Debug, Serialize)]
pub struct StatsSummary {
    pub date: DayKey,
    pub today_count: u32,
    pub total: u64,
    pub days_tracked: usize,
    pub daily_average: f64,
    pub weekly_average: f64,
    pub monthly_average: f64,
    pub current_streak: u32,
    pub weekly_improvement: i64,
    pub peak_hour: Option<u32>,
    pub most_active_period: Option<TimePeriod>,
    pub cost_spent_today: f64,
    pub cost_spent_total: f64,
    pub cost_saved: f64,
    pub chart: ChartSeries,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventRequest {
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DayCountResponse {
    pub date: String,
    pub count: u32,
    pub daily_goal: u32,
    pub over_goal: bool,
}
