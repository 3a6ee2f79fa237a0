use crate::errors::StorageError;
use crate::models::{DailyLog, Settings, TimestampLog, TrackerState, UnlockedAchievement};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    future::Future,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::fs;
use tracing::{error, warn};

pub const KEY_PUFF_DATA: &str = "puffData";
pub const KEY_PUFF_TIMESTAMPS: &str = "puffTimestamps";
pub const KEY_DARK_MODE: &str = "isDarkMode";
pub const KEY_DAILY_GOAL: &str = "dailyGoal";
pub const KEY_COST_PER_UNIT: &str = "costPerUnit";
pub const KEY_ACHIEVEMENTS: &str = "achievements";

/// String-keyed, string-valued persistent storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;
    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<(), StorageError>> + Send;
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}

impl<T: KeyValueStore + Send + Sync> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).remove(key)
    }
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let temp = path.with_extension("tmp");
        fs::write(&temp, value).await?;
        fs::rename(&temp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Loads every persisted key, falling back to defaults for anything
/// missing, unreadable or malformed.
pub async fn load_state<S: KeyValueStore>(store: &S) -> TrackerState {
    let defaults = Settings::default();
    let mut state = TrackerState {
        daily: load_key::<_, DailyLog>(store, KEY_PUFF_DATA)
            .await
            .unwrap_or_default(),
        timestamps: load_key::<_, TimestampLog>(store, KEY_PUFF_TIMESTAMPS)
            .await
            .unwrap_or_default(),
        settings: Settings {
            daily_goal: load_key::<_, u32>(store, KEY_DAILY_GOAL)
                .await
                .filter(|goal| *goal > 0)
                .unwrap_or(defaults.daily_goal),
            cost_per_unit: load_key::<_, f64>(store, KEY_COST_PER_UNIT)
                .await
                .filter(|cost| cost.is_finite() && *cost >= 0.0)
                .unwrap_or(defaults.cost_per_unit),
            is_dark_mode: load_key::<_, bool>(store, KEY_DARK_MODE)
                .await
                .unwrap_or(defaults.is_dark_mode),
        },
        achievements: load_key::<_, Vec<UnlockedAchievement>>(store, KEY_ACHIEVEMENTS)
            .await
            .unwrap_or_default(),
    };
    state.normalize();
    state
}

async fn load_key<S: KeyValueStore, T: DeserializeOwned>(store: &S, key: &str) -> Option<T> {
    match store.get(key).await {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("ignoring malformed '{key}' entry: {err}");
                None
            }
        },
        Ok(None) => None,
        Err(err) => {
            error!("failed to read '{key}': {err}");
            None
        }
    }
}

pub async fn persist_value<S, T>(store: &S, key: &str, value: &T) -> Result<(), StorageError>
where
    S: KeyValueStore,
    T: Serialize + ?Sized,
{
    let payload = serde_json::to_string(value)?;
    store.set(key, payload).await.inspect_err(|err| {
        error!("failed to persist '{key}': {err}");
    })
}

pub async fn persist_logs<S: KeyValueStore>(
    store: &S,
    state: &TrackerState,
) -> Result<(), StorageError> {
    let daily = persist_value(store, KEY_PUFF_DATA, &state.daily).await;
    let timestamps = persist_value(store, KEY_PUFF_TIMESTAMPS, &state.timestamps).await;
    daily.and(timestamps)
}

pub async fn persist_settings<S: KeyValueStore>(
    store: &S,
    settings: &Settings,
) -> Result<(), StorageError> {
    let goal = persist_value(store, KEY_DAILY_GOAL, &settings.daily_goal).await;
    let cost = persist_value(store, KEY_COST_PER_UNIT, &settings.cost_per_unit).await;
    let dark = persist_value(store, KEY_DARK_MODE, &settings.is_dark_mode).await;
    goal.and(cost).and(dark)
}

pub async fn persist_achievements<S: KeyValueStore>(
    store: &S,
    achievements: &[UnlockedAchievement],
) -> Result<(), StorageError> {
    persist_value(store, KEY_ACHIEVEMENTS, achievements).await
}

/// Removes the log and achievement keys, leaving settings in place.
pub async fn clear_progress<S: KeyValueStore>(store: &S) -> Result<(), StorageError> {
    let mut result = Ok(());
    for key in [KEY_PUFF_DATA, KEY_PUFF_TIMESTAMPS, KEY_ACHIEVEMENTS] {
        if let Err(err) = store.remove(key).await {
            error!("failed to remove '{key}': {err}");
            if result.is_ok() {
                result = Err(err);
            }
        }
    }
    result
}


#[cfg(test)]
mod tests {
    use super::testing::MemoryStore;
    use super::*;
    use crate::date::DayKey;

    fn day(raw: &str) -> DayKey {
        raw.parse().unwrap()
    }

    fn unique_dir() -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!("puff_tracker_store_{}_{}", std::process::id(), nanos));
        path
    }

    #[tokio::test]
    async fn missing_keys_load_defaults() {
        let store = MemoryStore::new();
        let state = load_state(&store).await;
        assert_eq!(state, TrackerState::default());
    }

    #[tokio::test]
    async fn malformed_keys_fall_back_to_defaults() {
        let store = MemoryStore::new();
        store.insert_raw(KEY_PUFF_DATA, "{not json").await;
        store.insert_raw(KEY_DAILY_GOAL, "\"ten\"").await;
        store.insert_raw(KEY_COST_PER_UNIT, "0.75").await;
        store.insert_raw(KEY_ACHIEVEMENTS, "[{\"id\": 3}]").await;

        let state = load_state(&store).await;
        assert!(state.daily.is_empty());
        assert_eq!(state.settings.daily_goal, 10);
        assert_eq!(state.settings.cost_per_unit, 0.75);
        assert!(state.achievements.is_empty());
    }

    #[tokio::test]
    async fn persisted_shape_matches_storage_keys() {
        let store = MemoryStore::new();
        let mut state = TrackerState::default();
        state.daily.insert(day("2024-03-05"), 3);
        state.daily.insert(day("2024-03-02"), 7);
        persist_logs(&store, &state).await.unwrap();
        persist_settings(&store, &state.settings).await.unwrap();

        let raw = store.raw(KEY_PUFF_DATA).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, serde_json::json!({"2024-03-02": 7, "2024-03-05": 3}));
        assert_eq!(store.raw(KEY_DAILY_GOAL).await.as_deref(), Some("10"));
        assert_eq!(store.raw(KEY_DARK_MODE).await.as_deref(), Some("false"));
    }

    #[tokio::test]
    async fn persisted_achievements_use_camel_case_keys() {
        let store = MemoryStore::new();
        let unlocked = UnlockedAchievement {
            id: "first_log".into(),
            title: "First Step".into(),
            description: "Log your first puff".into(),
            icon: "🌱".into(),
            unlocked_at: chrono::DateTime::parse_from_rfc3339("2024-03-01T09:00:00+01:00").unwrap(),
        };
        persist_achievements(&store, &[unlocked]).await.unwrap();

        let raw = store.raw(KEY_ACHIEVEMENTS).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            parsed,
            serde_json::json!([{
                "id": "first_log",
                "title": "First Step",
                "description": "Log your first puff",
                "icon": "🌱",
                "unlockedAt": "2024-03-01T09:00:00+01:00"
            }])
        );
    }

    #[tokio::test]
    async fn load_save_reload_is_stable() {
        let store = MemoryStore::new();
        store
            .insert_raw(KEY_PUFF_DATA, r#"{"2024-03-01": 4, "2023-12-31": 1}"#)
            .await;
        store
            .insert_raw(
                KEY_PUFF_TIMESTAMPS,
                r#"{"2024-03-01": ["2024-03-01T08:15:00+01:00"]}"#,
            )
            .await;

        let first = load_state(&store).await;
        persist_logs(&store, &first).await.unwrap();
        persist_settings(&store, &first.settings).await.unwrap();
        persist_achievements(&store, &first.achievements).await.unwrap();
        let second = load_state(&store).await;

        assert_eq!(first, second);
        assert_eq!(second.count_for(day("2024-03-01")), 4);
    }

    #[tokio::test]
    async fn file_store_round_trips_and_removes() {
        let dir = unique_dir();
        let store = JsonFileStore::open(&dir).await.unwrap();

        assert_eq!(store.get(KEY_PUFF_DATA).await.unwrap(), None);
        store.set(KEY_PUFF_DATA, "{\"2024-03-01\":2}".into()).await.unwrap();
        assert_eq!(
            store.get(KEY_PUFF_DATA).await.unwrap().as_deref(),
            Some("{\"2024-03-01\":2}")
        );

        store.remove(KEY_PUFF_DATA).await.unwrap();
        store.remove(KEY_PUFF_DATA).await.unwrap();
        assert_eq!(store.get(KEY_PUFF_DATA).await.unwrap(), None);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn clear_progress_keeps_settings() {
        let store = MemoryStore::new();
        let mut state = TrackerState::default();
        state.daily.insert(day("2024-03-01"), 1);
        persist_logs(&store, &state).await.unwrap();
        persist_settings(&store, &state.settings).await.unwrap();

        clear_progress(&store).await.unwrap();

        assert_eq!(store.raw(KEY_PUFF_DATA).await, None);
        assert_eq!(store.raw(KEY_DAILY_GOAL).await.as_deref(), Some("10"));
    }
}
