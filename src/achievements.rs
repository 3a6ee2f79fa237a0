use crate::models::UnlockedAchievement;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// Aggregate state the achievement predicates are evaluated against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AchievementSnapshot {
    pub today_count: u32,
    pub daily_goal: u32,
    pub current_streak: u32,
    pub cost_saved: f64,
}

pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub predicate: fn(&AchievementSnapshot) -> bool,
}

impl std::fmt::Debug for Achievement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Achievement").field("id", &self.id).finish()
    }
}

impl Achievement {
    pub fn unlock(&self, at: DateTime<FixedOffset>) -> UnlockedAchievement {
        UnlockedAchievement {
            id: self.id.to_string(),
            title: self.title.to_string(),
            description: self.description.to_string(),
            icon: self.icon.to_string(),
            unlocked_at: at,
        }
    }
}

pub static CATALOG: &[Achievement] = &[
    Achievement {
        id: "first_log",
        title: "First Step",
        description: "Log your first puff",
        icon: "🌱",
        predicate: |s| s.today_count >= 1,
    },
    Achievement {
        id: "goal_met",
        title: "On Target",
        description: "Finish a logged day within your daily goal",
        icon: "🎯",
        predicate: |s| s.today_count >= 1 && s.today_count <= s.daily_goal,
    },
    Achievement {
        id: "streak_3",
        title: "Three in a Row",
        description: "Stay within your goal for 3 days straight",
        icon: "🔥",
        predicate: |s| s.current_streak >= 3,
    },
    Achievement {
        id: "streak_7",
        title: "Week Warrior",
        description: "Stay within your goal for 7 days straight",
        icon: "🏅",
        predicate: |s| s.current_streak >= 7,
    },
    Achievement {
        id: "streak_30",
        title: "Monthly Master",
        description: "Stay within your goal for 30 days straight",
        icon: "🏆",
        predicate: |s| s.current_streak >= 30,
    },
    Achievement {
        id: "saved_10",
        title: "Pocket Change",
        description: "Save 10 in estimated costs",
        icon: "💰",
        predicate: |s| s.cost_saved >= 10.0,
    },
    Achievement {
        id: "saved_50",
        title: "Money Saver",
        description: "Save 50 in estimated costs",
        icon: "💵",
        predicate: |s| s.cost_saved >= 50.0,
    },
    Achievement {
        id: "saved_100",
        title: "Big Saver",
        description: "Save 100 in estimated costs",
        icon: "💎",
        predicate: |s| s.cost_saved >= 100.0,
    },
];

pub fn find(id: &str) -> Option<&'static Achievement> {
    CATALOG.iter().find(|achievement| achievement.id == id)
}

/// Unlocks every catalog entry whose predicate holds and that is not in
/// `unlocked` yet. Returns the new unlocks in catalog order.
pub fn evaluate(
    snapshot: &AchievementSnapshot,
    unlocked: &mut Vec<UnlockedAchievement>,
    at: DateTime<FixedOffset>,
) -> Vec<UnlockedAchievement> {
    let mut fresh = Vec::new();
    for achievement in CATALOG {
        if unlocked.iter().any(|done| done.id == achievement.id) {
            continue;
        }
        if (achievement.predicate)(snapshot) {
            let entry = achievement.unlock(at);
            unlocked.push(entry.clone());
            fresh.push(entry);
        }
    }
    fresh
}

/// Catalog entry joined with its unlock time, for listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementStatus {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub unlocked_at: Option<DateTime<FixedOffset>>,
}

pub fn statuses(unlocked: &[UnlockedAchievement]) -> Vec<AchievementStatus> {
    CATALOG
        .iter()
        .map(|achievement| AchievementStatus {
            id: achievement.id,
            title: achievement.title,
            description: achievement.description,
            icon: achievement.icon,
            unlocked_at: unlocked
                .iter()
                .find(|done| done.id == achievement.id)
                .map(|done| done.unlocked_at),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-03-01T10:00:00+00:00").unwrap()
    }

    fn snapshot(today_count: u32, current_streak: u32, cost_saved: f64) -> AchievementSnapshot {
        AchievementSnapshot {
            today_count,
            daily_goal: 10,
            current_streak,
            cost_saved,
        }
    }

    fn ids(entries: &[UnlockedAchievement]) -> Vec<&str> {
        entries.iter().map(|entry| entry.id.as_str()).collect()
    }

    #[test]
    fn catalog_ids_are_unique() {
        for (index, achievement) in CATALOG.iter().enumerate() {
            assert!(
                CATALOG[index + 1..].iter().all(|other| other.id != achievement.id),
                "duplicate id {}",
                achievement.id
            );
        }
        assert!(find("goal_met").is_some());
        assert!(find("nope").is_none());
    }

    #[test]
    fn reports_every_new_unlock_in_catalog_order() {
        let mut unlocked = Vec::new();
        let fresh = evaluate(&snapshot(5, 3, 0.0), &mut unlocked, at());
        assert_eq!(ids(&fresh), vec!["first_log", "goal_met", "streak_3"]);
        assert_eq!(unlocked.len(), 3);
    }

    #[test]
    fn never_unlocks_twice() {
        let mut unlocked = Vec::new();
        evaluate(&snapshot(1, 0, 0.0), &mut unlocked, at());
        let again = evaluate(&snapshot(2, 0, 0.0), &mut unlocked, at());
        assert!(again.is_empty());
        assert_eq!(ids(&unlocked), vec!["first_log", "goal_met"]);
    }

    #[test]
    fn over_goal_day_does_not_meet_goal() {
        let mut unlocked = Vec::new();
        let fresh = evaluate(&snapshot(12, 0, 60.0), &mut unlocked, at());
        assert_eq!(ids(&fresh), vec!["first_log", "saved_10", "saved_50"]);
    }

    #[test]
    fn statuses_mark_unlocked_entries() {
        let mut unlocked = Vec::new();
        evaluate(&snapshot(1, 0, 0.0), &mut unlocked, at());
        let listing = statuses(&unlocked);
        assert_eq!(listing.len(), CATALOG.len());
        assert_eq!(listing[0].unlocked_at, Some(at()));
        assert_eq!(listing[2].unlocked_at, None);
    }
}
