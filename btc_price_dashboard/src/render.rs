//! HTML page shell for the dashboard.
//!
//! Everything here is a pure function of a [`DashboardSnapshot`]; the page
//! reloads itself to pick up the next snapshot.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::{ChartPoint, ConnectionStatus, DashboardSnapshot};

const CHART_WIDTH: f64 = 800.0;
const CHART_HEIGHT: f64 = 300.0;
const MARGIN_TOP: f64 = 10.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_BOTTOM: f64 = 30.0;
const MARGIN_LEFT: f64 = 80.0;

pub fn render_page(snapshot: &DashboardSnapshot, refresh_secs: u64, now: DateTime<Utc>) -> String {
    let mut body = String::new();

    if snapshot.loading {
        body.push_str(r#"<div class="spinner" role="status">Loading…</div>"#);
    } else {
        if let Some(error) = &snapshot.error {
            let _ = write!(body, r#"<div class="banner">{}</div>"#, escape_html(error));
        }
        body.push_str(&render_status(snapshot.connection));
        body.push_str(&render_price_card(snapshot, now));
        let _ = write!(
            body,
            r#"<section class="card"><h2>Price History</h2>{}</section>"#,
            render_chart(&snapshot.chart)
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta http-equiv="refresh" content="{refresh}">
<title>BTC Price Chart</title>
<style>
body {{ font-family: system-ui, sans-serif; background: #f9fafb; color: #111827; margin: 0; padding: 3rem 1rem; }}
main {{ max-width: 64rem; margin: 0 auto; }}
h1 {{ text-align: center; }}
.card {{ background: #fff; border: 1px solid #e5e7eb; border-radius: .5rem; padding: 1rem 1.5rem; margin-top: 1.5rem; }}
.banner {{ background: #fefce8; border: 1px solid #fef08a; color: #a16207; border-radius: .5rem; padding: 1rem; }}
.price {{ font-size: 1.875rem; font-weight: 700; }}
.up {{ color: #22c55e; }}
.down {{ color: #ef4444; }}
.muted {{ color: #6b7280; font-size: .875rem; }}
</style>
</head>
<body>
<main>
<h1>BTC Price Chart</h1>
{body}
</main>
</body>
</html>
"#,
        refresh = refresh_secs,
        body = body
    )
}

fn render_status(connection: ConnectionStatus) -> String {
    let class = match connection {
        ConnectionStatus::Realtime | ConnectionStatus::Polling => "up",
        ConnectionStatus::Connecting | ConnectionStatus::Disconnected => "down",
    };
    format!(
        r#"<p class="status">Socket Status: <strong class="{}">{}</strong></p>"#,
        class,
        connection.label()
    )
}

fn render_price_card(snapshot: &DashboardSnapshot, now: DateTime<Utc>) -> String {
    let metrics = &snapshot.metrics;
    let (class, arrow) = if metrics.is_price_up {
        ("up", "▲")
    } else {
        ("down", "▼")
    };
    let updated = snapshot
        .last_updated
        .map(|at| format!("{} ago", format_distance(at, now)))
        .unwrap_or_else(|| "never".to_string());

    format!(
        r#"<section class="card"><h2>Current BTC Price</h2><span class="price">${price}</span> <span class="{class}">{arrow} {change} ({pct:.2}%)</span><p class="muted">Last updated: {updated}</p></section>"#,
        price = format_usd(metrics.latest_price),
        class = class,
        arrow = arrow,
        change = format_usd(metrics.price_change.abs()),
        pct = metrics.price_change_percentage.abs(),
        updated = updated
    )
}

/// Inline SVG line chart. Points are spaced evenly along x, one per sample.
pub fn render_chart(points: &[ChartPoint]) -> String {
    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="100%" height="{h}">"#,
        w = CHART_WIDTH,
        h = CHART_HEIGHT
    );

    if points.is_empty() {
        svg.push_str(r#"<text x="50%" y="50%" text-anchor="middle">No data</text></svg>"#);
        return svg;
    }

    let (min, max) = price_domain(points);
    let plot_width = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let step = if points.len() > 1 {
        plot_width / (points.len() - 1) as f64
    } else {
        0.0
    };
    let to_x = |i: usize| MARGIN_LEFT + step * i as f64;
    let to_y = |price: f64| MARGIN_TOP + plot_height - (price - min) / (max - min) * plot_height;

    for price in [min, (min + max) / 2.0, max] {
        let y = to_y(price);
        let _ = write!(
            svg,
            r##"<line x1="{x1}" y1="{y:.1}" x2="{x2}" y2="{y:.1}" stroke="#9ca3af" stroke-dasharray="3 3" opacity="0.2"/><text x="{lx}" y="{y:.1}" font-size="12" text-anchor="end">${label}</text>"##,
            x1 = MARGIN_LEFT,
            x2 = CHART_WIDTH - MARGIN_RIGHT,
            lx = MARGIN_LEFT - 6.0,
            y = y,
            label = format_usd(price)
        );
    }

    let coords: Vec<String> = points
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{:.1},{:.1}", to_x(i), to_y(p.price)))
        .collect();
    let _ = write!(
        svg,
        r##"<polyline fill="none" stroke="#f7931a" stroke-width="2" points="{}"/>"##,
        coords.join(" ")
    );

    for (i, point) in points.iter().enumerate() {
        let (x, y) = (to_x(i), to_y(point.price));
        let _ = write!(
            svg,
            r##"<circle cx="{x:.1}" cy="{y:.1}" r="3" fill="#f7931a"><title>{date}: ${price}</title></circle><text x="{x:.1}" y="{ly}" font-size="12" text-anchor="middle">{date}</text>"##,
            x = x,
            y = y,
            ly = CHART_HEIGHT - 8.0,
            date = escape_html(&point.formatted_date),
            price = format_usd(point.price)
        );
    }

    svg.push_str("</svg>");
    svg
}

fn price_domain(points: &[ChartPoint]) -> (f64, f64) {
    let min = points.iter().map(|p| p.price).fold(f64::INFINITY, f64::min);
    let max = points.iter().map(|p| p.price).fold(f64::NEG_INFINITY, f64::max);
    let pad = ((max - min) * 0.1).max(1.0);
    (min - pad, max + pad)
}

/// `86300.5` -> `86,300.50`
pub fn format_usd(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}{}.{:02}", sign, grouped, cents % 100)
}

/// Coarse human distance between two instants, e.g. `3 minutes`.
pub fn format_distance(from: DateTime<Utc>, to: DateTime<Utc>) -> String {
    let minutes = (to - from).num_seconds().max(0) / 60;
    match minutes {
        0 => "less than a minute".to_string(),
        1 => "1 minute".to_string(),
        2..=44 => format!("{} minutes", minutes),
        45..=89 => "about 1 hour".to_string(),
        90..=1439 => format!("about {} hours", (minutes + 30) / 60),
        1440..=2519 => "1 day".to_string(),
        _ => format!("{} days", (minutes + 720) / 1440),
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
