use crate::models::{Settings, StatsSummary};

pub fn render_index(summary: &StatsSummary, settings: &Settings) -> String {
    let theme = if settings.is_dark_mode { "dark" } else { "light" };
    let count_class = if summary.today_count > settings.daily_goal {
        "over"
    } else {
        "under"
    };
    let period = summary
        .most_active_period
        .map(|period| period.label())
        .unwrap_or("No data");
    let peak = summary
        .peak_hour
        .map(|hour| format!("{hour:02}:00"))
        .unwrap_or_else(|| "No data".to_string());

    INDEX_HTML
        .replace("{{THEME}}", theme)
        .replace("{{DATE}}", &summary.date.to_string())
        .replace("{{COUNT}}", &summary.today_count.to_string())
        .replace("{{COUNT_CLASS}}", count_class)
        .replace("{{GOAL}}", &settings.daily_goal.to_string())
        .replace("{{STREAK}}", &summary.current_streak.to_string())
        .replace("{{DAILY_AVG}}", &format!("{:.1}", summary.daily_average))
        .replace("{{WEEKLY_AVG}}", &format!("{:.1}", summary.weekly_average))
        .replace("{{IMPROVEMENT}}", &summary.weekly_improvement.to_string())
        .replace("{{SPENT}}", &format!("{:.2}", summary.cost_spent_today))
        .replace("{{SAVED}}", &format!("{:.2}", summary.cost_saved))
        .replace("{{PEAK}}", &peak)
        .replace("{{PERIOD}}", period)
        .replace("{{BARS}}", &render_bars(summary, settings.daily_goal))
}

fn render_bars(summary: &StatsSummary, goal: u32) -> String {
    let tallest = summary
        .chart
        .last_7_days
        .iter()
        .map(|point| point.count)
        .max()
        .unwrap_or(0)
        .max(goal)
        .max(1);

    summary
        .chart
        .last_7_days
        .iter()
        .map(|point| {
            let height = u64::from(point.count) * 100 / u64::from(tallest);
            let class = if point.over_goal { "bar over" } else { "bar" };
            format!(
                r#"<div class="{class}" style="height:{height}%" title="{date}: {count}"></div>"#,
                date = point.date,
                count = point.count,
            )
        })
        .collect()
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en" data-theme="{{THEME}}">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Puff Tracker</title>
  <style>
    :root {
      --bg: #ffffff;
      --card: #f9f9f9;
      --ink: #333333;
      --muted: #666666;
      --accent: #50cebb;
      --warn: #ff6b6b;
    }

    [data-theme="dark"] {
      --bg: #121212;
      --card: #1e1e1e;
      --ink: #f0f0f0;
      --muted: #aaaaaa;
      --accent: #7a7a7a;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 24px 16px;
    }

    .app {
      width: min(640px, 100%);
      display: grid;
      gap: 20px;
    }

    h1 {
      margin: 0;
      color: var(--accent);
    }

    .count {
      font-size: 4rem;
      font-weight: 600;
      text-align: center;
    }

    .count.over {
      color: var(--warn);
    }

    .actions {
      display: grid;
      grid-template-columns: 1fr 1fr;
      gap: 12px;
    }

    button {
      border: none;
      border-radius: 999px;
      padding: 14px;
      font-size: 1rem;
      font-weight: 600;
      color: white;
      background: var(--accent);
      cursor: pointer;
      width: 100%;
    }

    .panel {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(140px, 1fr));
      gap: 12px;
    }

    .stat {
      background: var(--card);
      border-radius: 14px;
      padding: 14px;
    }

    .stat .label {
      display: block;
      font-size: 0.8rem;
      text-transform: uppercase;
      color: var(--muted);
    }

    .stat .value {
      font-size: 1.4rem;
      font-weight: 600;
    }

    .chart {
      height: 140px;
      display: flex;
      align-items: flex-end;
      gap: 8px;
      background: var(--card);
      border-radius: 14px;
      padding: 12px;
    }

    .bar {
      flex: 1;
      min-height: 2px;
      background: var(--accent);
      border-radius: 6px 6px 0 0;
    }

    .bar.over {
      background: var(--warn);
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Puff Tracker</h1>
      <p>{{DATE}} &middot; goal {{GOAL}} per day</p>
    </header>

    <div class="count {{COUNT_CLASS}}">{{COUNT}}</div>

    <section class="actions">
      <form method="post" action="/puff/undo"><button type="submit">Undo</button></form>
      <form method="post" action="/puff/add"><button type="submit">Log puff</button></form>
    </section>

    <section class="panel">
      <div class="stat"><span class="label">Streak</span><span class="value">{{STREAK}} days</span></div>
      <div class="stat"><span class="label">Daily avg</span><span class="value">{{DAILY_AVG}}</span></div>
      <div class="stat"><span class="label">This week</span><span class="value">{{WEEKLY_AVG}}</span></div>
      <div class="stat"><span class="label">Vs last week</span><span class="value">{{IMPROVEMENT}}%</span></div>
      <div class="stat"><span class="label">Spent today</span><span class="value">${{SPENT}}</span></div>
      <div class="stat"><span class="label">Saved</span><span class="value">${{SAVED}}</span></div>
      <div class="stat"><span class="label">Peak hour</span><span class="value">{{PEAK}}</span></div>
      <div class="stat"><span class="label">Most active</span><span class="value">{{PERIOD}}</span></div>
    </section>

    <section class="chart" aria-label="Last 7 days">{{BARS}}</section>
  </main>
</body>
</html>
"#;
