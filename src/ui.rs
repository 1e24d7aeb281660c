use crate::models::SummaryResponse;
use crate::session::Notice;

const CHART_WIDTH: f64 = 600.0;
const CHART_HEIGHT: f64 = 220.0;
const CHART_PAD_X: f64 = 36.0;
const CHART_PAD_TOP: f64 = 18.0;
const CHART_PAD_BOTTOM: f64 = 30.0;

pub fn render_login(error: Option<&str>) -> String {
    let error = error
        .map(|message| notice_html("error", message))
        .unwrap_or_default();
    page("Visitor Counter · Login", &LOGIN_BODY.replace("{{ERROR}}", &error))
}

pub fn render_dashboard(summary: &SummaryResponse, notice: Option<&Notice>) -> String {
    let notice = notice
        .map(|notice| notice_html(notice.kind.as_str(), &notice.text))
        .unwrap_or_default();
    let warning = summary
        .warning
        .as_deref()
        .map(|warning| notice_html("warning", warning))
        .unwrap_or_default();

    let date_options = summary
        .dates
        .iter()
        .rev()
        .map(|date| {
            let selected = if *date == summary.selected_date { " selected" } else { "" };
            format!(r#"<option value="{date}"{selected}>{date}</option>"#)
        })
        .collect::<String>();

    let daily: Vec<(String, u64)> = summary
        .daily
        .iter()
        .map(|point| {
            let label = point.date.get(5..).unwrap_or(point.date.as_str());
            (label.to_string(), point.value)
        })
        .collect();
    let hourly: Vec<(String, u64)> = summary
        .hourly
        .iter()
        .map(|point| (point.hour.to_string(), point.value))
        .collect();

    // Free text goes in last so placeholders inside it are never expanded.
    let body = DASHBOARD_BODY
        .replace("{{CURRENT}}", &summary.current.to_string())
        .replace("{{TOTAL}}", &summary.total.to_string())
        .replace("{{SELECTED}}", &escape_html(&summary.selected_date))
        .replace("{{DATE_OPTIONS}}", &date_options)
        .replace("{{DAILY_CHART}}", &render_bar_chart(&daily, 1))
        .replace("{{HOURLY_CHART}}", &render_bar_chart(&hourly, 3))
        .replace("{{NOTICE}}", &notice)
        .replace("{{WARNING}}", &warning);
    page("Visitor Counter", &body)
}

fn notice_html(kind: &str, text: &str) -> String {
    format!(r#"<p class="notice" data-type="{kind}">{}</p>"#, escape_html(text))
}

/// Inline SVG bar chart. Every `label_every`-th bar gets an x-axis label.
pub fn render_bar_chart(points: &[(String, u64)], label_every: usize) -> String {
    let mut svg = format!(
        r#"<svg class="chart" viewBox="0 0 {CHART_WIDTH} {CHART_HEIGHT}" role="img">"#
    );
    if points.is_empty() {
        svg.push_str(
            r#"<text class="chart-label" x="50%" y="50%" text-anchor="middle">No data yet</text>"#,
        );
        svg.push_str("</svg>");
        return svg;
    }

    let max = points.iter().map(|(_, value)| *value).max().unwrap_or(0).max(1) as f64;
    let plot_width = CHART_WIDTH - CHART_PAD_X * 2.0;
    let plot_height = CHART_HEIGHT - CHART_PAD_TOP - CHART_PAD_BOTTOM;
    let slot = plot_width / points.len() as f64;
    let bar_width = (slot * 0.7).max(1.0);
    let baseline = CHART_HEIGHT - CHART_PAD_BOTTOM;
    let label_every = label_every.max(1);

    svg.push_str(&format!(
        r#"<line class="chart-axis" x1="{CHART_PAD_X}" y1="{baseline}" x2="{}" y2="{baseline}" />"#,
        CHART_WIDTH - CHART_PAD_X
    ));
    svg.push_str(&format!(
        r#"<text class="chart-label" x="{}" y="{}" text-anchor="end">{}</text>"#,
        CHART_PAD_X - 6.0,
        CHART_PAD_TOP + 4.0,
        max as u64
    ));

    for (index, (label, value)) in points.iter().enumerate() {
        let height = *value as f64 / max * plot_height;
        let x = CHART_PAD_X + slot * index as f64 + (slot - bar_width) / 2.0;
        let label = escape_html(label);
        svg.push_str(&format!(
            r#"<rect class="chart-bar" x="{x:.2}" y="{:.2}" "#,
            baseline - height
        ));
        svg.push_str(&format!(r#"width="{bar_width:.2}" height="{height:.2}">"#));
        svg.push_str(&format!("<title>{label}: {value}</title></rect>"));
        if index % label_every == 0 {
            svg.push_str(&format!(
                r#"<text class="chart-label" x="{:.2}" y="{}" text-anchor="middle">{label}</text>"#,
                x + bar_width / 2.0,
                baseline + 16.0
            ));
        }
    }
    svg.push_str("</svg>");
    svg
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '{' => escaped.push_str("&#123;"),
            '}' => escaped.push_str("&#125;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn page(title: &str, body: &str) -> String {
    PAGE_HTML.replace("{{TITLE}}", title).replace("{{BODY}}", body)
}

const PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}}</title>
  <style>
    :root {
      --bg-1: #f8f3e6;
      --bg-2: #f5d3a7;
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
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #ffe9d4 60%, #f9f2e9 100%);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(860px, 100%);
      background: var(--card);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 24px;
    }

    h1 {
      font-family: "Georgia", serif;
      font-size: clamp(2rem, 4vw, 2.6rem);
      margin: 0;
    }

    h2 {
      margin: 0 0 8px;
      font-size: 1.3rem;
    }

    .panel,
    .actions {
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
      font-size: 2.2rem;
      font-weight: 600;
      color: var(--accent-2);
    }

    button,
    input[type="password"],
    select {
      font-size: 1rem;
      border-radius: 999px;
      padding: 12px 18px;
    }

    button {
      appearance: none;
      border: none;
      font-weight: 600;
      cursor: pointer;
      width: 100%;
      color: white;
      background: var(--accent-2);
    }

    .btn-add {
      background: var(--accent);
    }

    .btn-reset {
      background: #c63b2b;
      width: auto;
    }

    input[type="password"],
    select {
      border: 1px solid rgba(47, 72, 88, 0.25);
    }

    details {
      background: white;
      border-radius: 18px;
      padding: 14px 18px;
    }

    summary {
      cursor: pointer;
      color: #8b857d;
    }

    .chart-card {
      background: white;
      border-radius: 20px;
      padding: 16px;
      border: 1px solid rgba(47, 72, 88, 0.08);
    }

    .chart {
      width: 100%;
      height: 220px;
      display: block;
    }

    .chart-bar {
      fill: var(--accent);
    }

    .chart-axis {
      stroke: rgba(47, 72, 88, 0.25);
    }

    .chart-label {
      fill: #7a746d;
      font-size: 11px;
    }

    .notice {
      margin: 0;
      padding: 12px 16px;
      border-radius: 14px;
      background: white;
    }

    .notice[data-type="success"] {
      color: #2d7a4b;
    }

    .notice[data-type="warning"] {
      color: #a66a00;
    }

    .notice[data-type="error"] {
      color: #c63b2b;
    }
  </style>
</head>
<body>
  <main class="app">
{{BODY}}
  </main>
</body>
</html>
"#;

const LOGIN_BODY: &str = r#"    <h1>Visitor Counter (login)</h1>
    {{ERROR}}
    <form method="post" action="/login" class="panel">
      <input type="password" name="password" placeholder="Password" autofocus required />
      <button type="submit">Log in</button>
    </form>"#;

const DASHBOARD_BODY: &str = r#"    <h1>Visitor Counter</h1>
    {{NOTICE}}
    {{WARNING}}
    <section class="panel">
      <div class="stat">
        <span class="label">Current visitors</span>
        <span id="current" class="value">{{CURRENT}}</span>
      </div>
      <div class="stat">
        <span class="label">Total visitors</span>
        <span id="total" class="value">{{TOTAL}}</span>
      </div>
    </section>

    <section class="actions">
      <form method="post" action="/count/add">
        <button class="btn-add" type="submit">+1 visitor</button>
      </form>
      <form method="post" action="/count/sub">
        <button type="submit">−1 visitor</button>
      </form>
    </section>

    <details>
      <summary>Admin reset (sets the count back to 0)</summary>
      <form method="post" action="/count/reset">
        <button class="btn-reset" type="submit">Reset</button>
      </form>
    </details>

    <section class="chart-card">
      <h2>Visitors by day</h2>
      {{DAILY_CHART}}
    </section>

    <section class="chart-card">
      <h2>Visitors by hour on {{SELECTED}}</h2>
      <form method="get" action="/">
        <select name="date" onchange="this.form.submit()">{{DATE_OPTIONS}}</select>
        <noscript><button type="submit">Show</button></noscript>
      </form>
      {{HOURLY_CHART}}
    </section>"#;
