use crate::filter::EventFilter;
use crate::models::{
    BehaviorHeatmap, ConversionFunnel, DailyTrendPoint, DashboardResponse, FilterOptions,
    HourlyDistribution, RepurchaseStats,
};
use std::fmt::Write;

pub fn render_index(
    options: &FilterOptions,
    filter: &EventFilter,
    dashboard: &DashboardResponse,
) -> String {
    INDEX_HTML
        .replace("{{FILTERS}}", &render_filters(options, filter))
        .replace("{{ROWS}}", &group_thousands(dashboard.filtered_rows))
        .replace("{{PV}}", &group_thousands(dashboard.pv_uv.pv))
        .replace("{{UV}}", &group_thousands(dashboard.pv_uv.uv))
        .replace("{{HOURLY}}", &render_hourly(&dashboard.hourly))
        .replace("{{FUNNEL}}", &render_funnel(&dashboard.funnel))
        .replace("{{HEATMAP}}", &render_heatmap(&dashboard.heatmap))
        .replace("{{TREND}}", &render_trend(&dashboard.daily_trend))
        .replace("{{REPURCHASE}}", &render_repurchase(&dashboard.repurchase))
}

fn render_filters(options: &FilterOptions, filter: &EventFilter) -> String {
    let (start, end) = match filter.date_range {
        Some((start, end)) => (start.to_string(), end.to_string()),
        None => (
            options.min_date.map(|d| d.to_string()).unwrap_or_default(),
            options.max_date.map(|d| d.to_string()).unwrap_or_default(),
        ),
    };
    let min = options.min_date.map(|d| d.to_string()).unwrap_or_default();
    let max = options.max_date.map(|d| d.to_string()).unwrap_or_default();

    let mut html = String::new();
    let _ = write!(
        html,
        r#"<label>From <input type="date" name="start" value="{start}" min="{min}" max="{max}" /></label>
        <label>To <input type="date" name="end" value="{end}" min="{min}" max="{max}" /></label>
        <input type="hidden" name="behaviors" value="" />"#
    );
    for behavior in &options.behavior_types {
        let checked = match &filter.behaviors {
            Some(selected) if !selected.contains(behavior) => "",
            _ => " checked",
        };
        let name = escape(behavior);
        let _ = write!(
            html,
            r#"<label class="check"><input type="checkbox" name="behaviors" value="{name}"{checked} /> {name}</label>"#
        );
    }
    html
}

fn render_hourly(hourly: &HourlyDistribution) -> String {
    if hourly.is_empty() {
        return EMPTY.to_string();
    }
    let max = hourly.buckets.iter().map(|b| b.count).max().unwrap_or(0);
    let mut html = String::from("<table><tr><th>Hour</th><th>Behavior</th><th>Count</th><th></th></tr>");
    for bucket in &hourly.buckets {
        let _ = write!(
            html,
            r#"<tr><td>{:02}:00</td><td>{}</td><td>{}</td><td class="bar-cell"><div class="bar" style="width:{:.1}%"></div></td></tr>"#,
            bucket.hour,
            escape(&bucket.behavior_type),
            group_thousands(bucket.count),
            percent_of(bucket.count, max),
        );
    }
    html.push_str("</table>");
    html
}

fn render_funnel(funnel: &ConversionFunnel) -> String {
    let max = funnel.stages.iter().map(|s| s.count).max().unwrap_or(0);
    let mut html = String::from(r#"<div class="funnel">"#);
    for stage in &funnel.stages {
        let _ = write!(
            html,
            r#"<div class="stage"><span class="label">{}</span><div class="bar" style="width:{:.1}%"></div><span>{}</span></div>"#,
            escape(&stage.stage),
            percent_of(stage.count, max),
            group_thousands(stage.count),
        );
    }
    html.push_str("</div>");
    html
}

fn render_heatmap(heatmap: &BehaviorHeatmap) -> String {
    let max = heatmap.max_count();
    let mut html = String::from("<table class=\"heatmap\"><tr><th></th>");
    for hour in &heatmap.hours {
        let _ = write!(html, "<th>{hour}</th>");
    }
    html.push_str("</tr>");
    for row in &heatmap.rows {
        let _ = write!(html, "<tr><th>{}</th>", escape(&row.behavior_type));
        for count in &row.counts {
            let _ = write!(
                html,
                r#"<td style="background:rgba(255,107,74,{:.2})" title="{count}">{count}</td>"#,
                percent_of(*count, max) / 100.0,
            );
        }
        html.push_str("</tr>");
    }
    html.push_str("</table>");
    html
}

fn render_trend(points: &[DailyTrendPoint]) -> String {
    if points.is_empty() {
        return EMPTY.to_string();
    }

    const WIDTH: f64 = 720.0;
    const HEIGHT: f64 = 240.0;
    const PAD: f64 = 32.0;

    let max = points
        .iter()
        .flat_map(|p| [p.pv, p.uv])
        .max()
        .unwrap_or(0)
        .max(1) as f64;
    let step = if points.len() > 1 {
        (WIDTH - 2.0 * PAD) / (points.len() - 1) as f64
    } else {
        0.0
    };
    let x = |i: usize| PAD + step * i as f64;
    let y = |v: u64| HEIGHT - PAD - (HEIGHT - 2.0 * PAD) * v as f64 / max;

    let polyline = |value: fn(&DailyTrendPoint) -> u64| {
        points
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{:.1},{:.1}", x(i), y(value(p))))
            .collect::<Vec<_>>()
            .join(" ")
    };

    let mut svg = format!(r#"<svg viewBox="0 0 {WIDTH} {HEIGHT}" class="trend">"#);
    let _ = write!(
        svg,
        r#"<polyline class="line-pv" points="{}" /><polyline class="line-uv" points="{}" />"#,
        polyline(|p| p.pv),
        polyline(|p| p.uv),
    );
    for (i, point) in points.iter().enumerate() {
        let _ = write!(
            svg,
            r#"<text class="chart-label" x="{:.1}" y="{:.1}" text-anchor="middle">{}</text>"#,
            x(i),
            HEIGHT - 8.0,
            point.date.format("%m-%d"),
        );
    }
    svg.push_str("</svg>");

    let mut table = String::from("<table><tr><th>Date</th><th>PV</th><th>UV</th></tr>");
    for point in points {
        let _ = write!(
            table,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            point.date,
            group_thousands(point.pv),
            group_thousands(point.uv),
        );
    }
    table.push_str("</table>");
    svg + &table
}

fn render_repurchase(stats: &RepurchaseStats) -> String {
    format!(
        r#"<div class="stat"><span class="label">Total Buyers</span><span class="value">{}</span></div>
      <div class="stat"><span class="label">Repurchase Rate</span><span class="value">{:.2}%</span></div>"#,
        group_thousands(stats.total_buyers),
        stats.repurchase_rate * 100.0,
    )
}

fn percent_of(value: u64, max: u64) -> f64 {
    if max == 0 {
        0.0
    } else {
        value as f64 * 100.0 / max as f64
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const EMPTY: &str = r#"<p class="hint">No events match the current filters.</p>"#;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>User Behavior Dashboard</title>
  <style>
    :root {
      --bg: #f8f3e6;
      --ink: #2b2a28;
      --accent: #ff6b4a;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.86);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      background: linear-gradient(135deg, var(--bg), #ffe9d4 60%, #f9f2e9 100%);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(1100px, 100%);
      margin: 0 auto;
      background: var(--card);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 28px;
    }

    h1 {
      font-family: "Georgia", serif;
      margin: 0;
    }

    h2 {
      margin: 0 0 12px;
      font-size: 1.3rem;
    }

    form.filters {
      display: flex;
      flex-wrap: wrap;
      gap: 12px 20px;
      align-items: center;
    }

    .check {
      display: inline-flex;
      gap: 6px;
    }

    button {
      border: none;
      border-radius: 999px;
      padding: 10px 18px;
      font-weight: 600;
      background: var(--accent);
      color: white;
      cursor: pointer;
    }

    .panel {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
      gap: 16px;
    }

    .stat {
      background: white;
      border-radius: 18px;
      padding: 18px;
      border: 1px solid rgba(47, 72, 88, 0.08);
      display: grid;
      gap: 8px;
    }

    .stat .label {
      font-size: 0.85rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: #8b857d;
    }

    .stat .value {
      font-size: 1.7rem;
      font-weight: 600;
      color: var(--accent-2);
    }

    table {
      border-collapse: collapse;
      width: 100%;
      font-size: 0.9rem;
    }

    th, td {
      padding: 4px 8px;
      text-align: left;
    }

    .heatmap td {
      text-align: center;
      font-size: 0.75rem;
    }

    .bar-cell {
      width: 50%;
    }

    .bar {
      height: 12px;
      border-radius: 6px;
      background: var(--accent);
    }

    .funnel .stage {
      display: grid;
      grid-template-columns: 160px 1fr 100px;
      gap: 12px;
      align-items: center;
      margin-bottom: 8px;
    }

    .trend {
      width: 100%;
      height: 240px;
    }

    .line-pv, .line-uv {
      fill: none;
      stroke-width: 3;
    }

    .line-pv {
      stroke: var(--accent);
    }

    .line-uv {
      stroke: var(--accent-2);
    }

    .chart-label {
      fill: #7a746d;
      font-size: 11px;
    }

    .hint {
      margin: 0;
      color: #6f6a65;
      font-size: 0.9rem;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>User Behavior Dashboard</h1>
      <p class="hint">Filtered Rows: {{ROWS}}</p>
    </header>

    <form class="filters" method="get" action="/">
      {{FILTERS}}
      <button type="submit">Apply</button>
    </form>

    <section>
      <h2>PV &amp; UV Overview</h2>
      <div class="panel">
        <div class="stat"><span class="label">Page Views (PV)</span><span class="value">{{PV}}</span></div>
        <div class="stat"><span class="label">Unique Visitors (UV)</span><span class="value">{{UV}}</span></div>
      </div>
    </section>

    <section>
      <h2>Hourly Activity Distribution</h2>
      {{HOURLY}}
    </section>

    <section>
      <h2>Conversion Funnel</h2>
      {{FUNNEL}}
    </section>

    <section>
      <h2>Behavior Heatmap by Hour</h2>
      {{HEATMAP}}
    </section>

    <section>
      <h2>Daily Visit Trend (PV / UV)</h2>
      {{TREND}}
    </section>

    <section>
      <h2>Repurchase Rate</h2>
      <p class="hint">Computed over the whole event log; filters above do not apply.</p>
      <div class="panel">
      {{REPURCHASE}}
      </div>
    </section>
  </main>
</body>
</html>
"#;
