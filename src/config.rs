use crate::date::DayKey;
use std::{env, path::PathBuf, str::FromStr};
use tracing::warn;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BASELINE_DAILY: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heuristics {
    /// Oldest day the streak walk may reach.
    pub streak_floor: DayKey,
    /// Assumed events per day before tracking started, used for cost saved.
    pub baseline_daily: u32,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            streak_floor: default_streak_floor(),
            baseline_daily: DEFAULT_BASELINE_DAILY,
        }
    }
}

fn default_streak_floor() -> DayKey {
    DayKey::from_ymd(2020, 1, 1).unwrap_or(DayKey::new(chrono::NaiveDate::MIN))
}

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub data_dir: PathBuf,
    pub port: u16,
    pub heuristics: Heuristics,
}

impl TrackerConfig {
    pub fn from_env() -> Self {
        let defaults = Heuristics::default();
        Self {
            data_dir: env::var("APP_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            port: env_or("PORT", DEFAULT_PORT),
            heuristics: Heuristics {
                streak_floor: env_or("PUFF_STREAK_FLOOR", defaults.streak_floor),
                baseline_daily: env_or("PUFF_BASELINE_DAILY", defaults.baseline_daily),
            },
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("ignoring invalid {name}={raw:?}");
            default
        }),
        Err(_) => default,
    }
}
