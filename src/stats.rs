use crate::date::{DayKey, YearMonth};
use crate::models::{
    ChartSeries, DailyLog, DailyPoint, MonthlyBreakdown, MonthlyEntry, TimePeriod, TimestampLog,
    WeeklyAveragePoint, WeeklyPoint,
};
use chrono::{Datelike, Timelike};

const WEEK_COUNT: i64 = 8;

pub fn total(daily: &DailyLog) -> u64 {
    daily.values().map(|count| u64::from(*count)).sum()
}

fn window_total(daily: &DailyLog, start: DayKey, end: DayKey) -> u64 {
    daily
        .range(start..=end)
        .map(|(_, count)| u64::from(*count))
        .sum()
}

/// Mean over the days that have entries; empty input averages to zero.
fn present_average<'a>(counts: impl Iterator<Item = &'a u32>) -> f64 {
    let (days, sum) = counts.fold((0u64, 0u64), |(days, sum), count| {
        (days + 1, sum + u64::from(*count))
    });
    if days == 0 {
        return 0.0;
    }
    sum as f64 / days as f64
}

pub fn daily_average(daily: &DailyLog) -> f64 {
    present_average(daily.values())
}

/// Average over the recorded days of the Monday-Sunday week holding `reference`.
pub fn weekly_average(daily: &DailyLog, reference: DayKey) -> f64 {
    let start = reference.week_start();
    let end = start.offset(6);
    present_average(daily.range(start..=end).map(|(_, count)| count))
}

/// Average over the recorded days of the calendar month holding `reference`.
pub fn monthly_average(daily: &DailyLog, reference: DayKey) -> f64 {
    let month = reference.year_month();
    present_average(
        daily
            .iter()
            .filter(|(day, _)| month.contains(**day))
            .map(|(_, count)| count),
    )
}

/// Consecutive days at or under `goal`, walking back from `reference` and
/// never past `floor`. Days without entries count as zero and qualify.
pub fn current_streak(daily: &DailyLog, reference: DayKey, goal: u32, floor: DayKey) -> u32 {
    if reference < floor {
        return 0;
    }
    let days = match daily
        .range(floor..=reference)
        .rev()
        .find(|(_, count)| **count > goal)
    {
        Some((over, _)) => (reference.date() - over.date()).num_days(),
        None => (reference.date() - floor.date()).num_days() + 1,
    };
    u32::try_from(days).unwrap_or(u32::MAX)
}

/// Percentage drop of the trailing 7 days against the 7 before them.
/// Positive means fewer events. Zero when the earlier window is empty.
pub fn weekly_improvement(daily: &DailyLog, reference: DayKey) -> i64 {
    let current = window_total(daily, reference.offset(-6), reference);
    let previous = window_total(daily, reference.offset(-13), reference.offset(-7));
    if previous == 0 {
        return 0;
    }
    let change = (previous as f64 - current as f64) / previous as f64 * 100.0;
    change.round() as i64
}

fn hour_histogram(timestamps: &TimestampLog) -> [u32; 24] {
    let mut buckets = [0u32; 24];
    for stamp in timestamps.values().flatten() {
        buckets[stamp.hour() as usize] += 1;
    }
    buckets
}

/// Index of the largest bucket; ties keep the earliest. `None` when all are zero.
fn busiest(buckets: &[u32]) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;
    for (index, &count) in buckets.iter().enumerate() {
        if count == 0 {
            continue;
        }
        match best {
            Some((_, top)) if top >= count => {}
            _ => best = Some((index, count)),
        }
    }
    best.map(|(index, _)| index)
}

/// Hour of day (0-23, in the offset each event was stamped with) with the most events.
pub fn peak_usage_hour(timestamps: &TimestampLog) -> Option<u32> {
    busiest(&hour_histogram(timestamps)).map(|hour| hour as u32)
}

pub fn most_active_period(timestamps: &TimestampLog) -> Option<TimePeriod> {
    let hours = hour_histogram(timestamps);
    let mut periods = [0u32; 4];
    for (hour, count) in hours.iter().enumerate() {
        let period = TimePeriod::from_hour(hour as u32);
        if let Some(slot) = TimePeriod::ALL.iter().position(|p| *p == period) {
            periods[slot] += count;
        }
    }
    busiest(&periods).map(|slot| TimePeriod::ALL[slot])
}

pub fn cost_spent(count: u64, cost_per_unit: f64) -> f64 {
    count as f64 * cost_per_unit
}

/// Savings against an assumed prior habit of `baseline_daily` events on
/// every recorded day.
pub fn cost_saved(daily: &DailyLog, baseline_daily: u32, cost_per_unit: f64) -> f64 {
    let expected = daily.len() as u64 * u64::from(baseline_daily);
    expected.saturating_sub(total(daily)) as f64 * cost_per_unit
}

pub fn monthly_breakdown(daily: &DailyLog, month: YearMonth) -> MonthlyBreakdown {
    let entries: Vec<MonthlyEntry> = daily
        .iter()
        .filter(|(day, _)| month.contains(**day))
        .map(|(day, count)| MonthlyEntry {
            date: day.display_label(),
            count: *count,
        })
        .collect();
    let total = entries.iter().map(|entry| u64::from(entry.count)).sum();

    MonthlyBreakdown {
        month,
        label: month.label(),
        entries,
        total,
    }
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn build_chart_at(today: DayKey, daily: &DailyLog, goal: u32) -> ChartSeries {
    let mut last_7_days = Vec::with_capacity(7);
    for offset in (0..7).rev() {
        let date = today.offset(-offset);
        let count = daily.get(&date).copied().unwrap_or(0);
        last_7_days.push(DailyPoint {
            date: date.to_string(),
            count,
            over_goal: count > goal,
        });
    }

    let current_week_start = today.week_start();
    let mut weekly_totals = Vec::with_capacity(WEEK_COUNT as usize);
    let mut weekly_averages = Vec::with_capacity(WEEK_COUNT as usize);

    for offset in (0..WEEK_COUNT).rev() {
        let start = current_week_start.offset(-7 * offset);
        let end = start.offset(6);
        let days_counted = daily.range(start..=end).count() as u8;

        weekly_totals.push(WeeklyPoint {
            week: week_label(start),
            start_date: start.to_string(),
            end_date: end.to_string(),
            total: window_total(daily, start, end),
        });

        weekly_averages.push(WeeklyAveragePoint {
            week: week_label(start),
            days_counted,
            average: round_one_decimal(weekly_average(daily, start)),
        });
    }

    ChartSeries {
        last_7_days,
        weekly_totals,
        weekly_averages,
    }
}

fn week_label(day: DayKey) -> String {
    let iso = day.date().iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset};

    fn day(raw: &str) -> DayKey {
        raw.parse().unwrap()
    }

    fn log(entries: &[(&str, u32)]) -> DailyLog {
        entries.iter().map(|(raw, count)| (day(raw), *count)).collect()
    }

    fn stamps(raw: &[&str]) -> Vec<DateTime<FixedOffset>> {
        raw.iter()
            .map(|s| DateTime::parse_from_rfc3339(s).unwrap())
            .collect()
    }

    #[test]
    fn monthly_breakdown_sorted_and_filtered() {
        let daily = log(&[
            ("2024-03-05", 3),
            ("2024-03-02", 7),
            ("2024-02-29", 4),
            ("2024-04-01", 9),
        ]);
        let breakdown = monthly_breakdown(&daily, "2024-03".parse().unwrap());

        let rendered: Vec<(&str, u32)> = breakdown
            .entries
            .iter()
            .map(|entry| (entry.date.as_str(), entry.count))
            .collect();
        assert_eq!(rendered, vec![("03-02-2024", 7), ("03-05-2024", 3)]);
        assert_eq!(breakdown.total, 10);
        assert_eq!(breakdown.label, "March 2024");
    }

    #[test]
    fn monthly_breakdown_of_empty_month() {
        let daily = log(&[("2024-03-05", 3)]);
        let breakdown = monthly_breakdown(&daily, "2024-05".parse().unwrap());
        assert!(breakdown.entries.is_empty());
        assert_eq!(breakdown.total, 0);
    }

    #[test]
    fn averages_use_present_days_only() {
        // 2024-03-04 is a Monday
        let daily = log(&[
            ("2024-03-04", 4),
            ("2024-03-06", 8),
            ("2024-03-11", 30),
            ("2024-02-28", 2),
        ]);
        assert_eq!(daily_average(&daily), 11.0);
        assert_eq!(weekly_average(&daily, day("2024-03-10")), 6.0);
        assert_eq!(weekly_average(&daily, day("2024-03-18")), 0.0);
        assert_eq!(monthly_average(&daily, day("2024-03-20")), 14.0);
        assert_eq!(daily_average(&DailyLog::new()), 0.0);
        assert_eq!(round_one_decimal(10.0 / 3.0), 3.3);
    }

    #[test]
    fn streak_counts_gaps_and_stops_over_goal() {
        let floor = day("2024-02-01");
        let daily = log(&[("2024-03-01", 12), ("2024-03-03", 5)]);

        assert_eq!(current_streak(&daily, day("2024-03-01"), 10, floor), 0);
        assert_eq!(current_streak(&daily, day("2024-03-04"), 10, floor), 3);
        assert_eq!(current_streak(&daily, day("2024-02-29"), 10, floor), 29);
        assert_eq!(current_streak(&daily, day("2024-01-15"), 10, floor), 0);
    }

    #[test]
    fn streak_far_from_floor_is_computed_from_entries() {
        let floor = day("2020-01-01");
        assert_eq!(current_streak(&DailyLog::new(), day("9999-12-31"), 10, floor), 2_914_635);

        let daily = log(&[("2024-03-01", 5), ("9999-12-20", 3)]);
        assert_eq!(current_streak(&daily, day("9999-12-31"), 10, floor), 2_914_635);

        let broken = log(&[("9999-12-30", 11)]);
        assert_eq!(current_streak(&broken, day("9999-12-31"), 10, floor), 1);
        assert_eq!(current_streak(&broken, day("9999-12-30"), 10, floor), 0);
    }

    #[test]
    fn weekly_improvement_compares_trailing_windows() {
        let daily = log(&[("2024-03-01", 20), ("2024-03-09", 10), ("2024-03-14", 5)]);
        // current window 03-08..03-14 = 15, previous 03-01..03-07 = 20
        assert_eq!(weekly_improvement(&daily, day("2024-03-14")), 25);

        let worse = log(&[("2024-03-01", 10), ("2024-03-10", 15)]);
        assert_eq!(weekly_improvement(&worse, day("2024-03-14")), -50);

        let no_history = log(&[("2024-03-14", 5)]);
        assert_eq!(weekly_improvement(&no_history, day("2024-03-14")), 0);
    }

    #[test]
    fn peak_hour_and_period() {
        let mut timestamps = TimestampLog::new();
        assert_eq!(peak_usage_hour(&timestamps), None);
        assert_eq!(most_active_period(&timestamps), None);

        timestamps.insert(
            day("2024-03-01"),
            stamps(&[
                "2024-03-01T09:10:00+02:00",
                "2024-03-01T09:40:00+02:00",
                "2024-03-01T20:00:00+02:00",
                "2024-03-01T21:00:00+02:00",
                "2024-03-01T22:00:00+02:00",
            ]),
        );
        assert_eq!(peak_usage_hour(&timestamps), Some(9));
        assert_eq!(most_active_period(&timestamps), Some(TimePeriod::Evening));
    }

    #[test]
    fn peak_hour_ties_keep_first_bucket() {
        let mut timestamps = TimestampLog::new();
        timestamps.insert(
            day("2024-03-01"),
            stamps(&["2024-03-01T15:00:00+00:00", "2024-03-01T03:00:00+00:00"]),
        );
        assert_eq!(peak_usage_hour(&timestamps), Some(3));
        assert_eq!(most_active_period(&timestamps), Some(TimePeriod::Afternoon));
    }

    #[test]
    fn cost_figures() {
        assert_eq!(cost_spent(5, 0.5), 2.5);
        let daily = log(&[("2024-03-01", 5), ("2024-03-02", 30)]);
        // 2 days * 20 - 35 = 5 units saved
        assert_eq!(cost_saved(&daily, 20, 0.5), 2.5);
        let heavy = log(&[("2024-03-01", 50)]);
        assert_eq!(cost_saved(&heavy, 20, 0.5), 0.0);
    }

    #[test]
    fn chart_series_lengths() {
        let today = day("2026-01-05");
        let daily = log(&[("2026-01-03", 12), ("2026-01-05", 2)]);
        let chart = build_chart_at(today, &daily, 10);

        assert_eq!(chart.last_7_days.len(), 7);
        assert_eq!(chart.weekly_totals.len(), 8);
        assert_eq!(chart.weekly_averages.len(), 8);

        let point = chart
            .last_7_days
            .iter()
            .find(|point| point.date == "2026-01-03")
            .expect("missing day");
        assert_eq!(point.count, 12);
        assert!(point.over_goal);

        let current = chart.weekly_totals.last().unwrap();
        assert_eq!(current.start_date, "2026-01-05");
        assert_eq!(current.total, 2);
        let previous = &chart.weekly_totals[6];
        assert_eq!(previous.total, 12);
    }
}
