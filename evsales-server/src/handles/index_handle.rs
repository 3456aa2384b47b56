use std::fmt::Write;

use axum::extract::{Query, State};
use axum::response::Html;
use serde::Deserialize;

use evsales_analyser::forecast::ManufacturerMetric;

use super::SalesState;

#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    pub manufacturer: Option<String>,
}

pub async fn index(Query(query): Query<IndexQuery>, State(state): State<SalesState>) -> Html<String> {
    let selected = query.manufacturer.as_deref().filter(|m| !m.is_empty());
    let result = selected.and_then(|m| state.context.metric(m));

    Html(render_index(state.context.manufacturers(), selected, result))
}

fn render_index<'a>(
    manufacturers: impl Iterator<Item = &'a str>,
    selected: Option<&str>,
    result: Option<&ManufacturerMetric>,
) -> String {
    let mut options = String::new();
    for manufacturer in manufacturers {
        let marker = if selected == Some(manufacturer) { " selected" } else { "" };
        let name = escape(manufacturer);
        let _ = writeln!(options, r#"      <option value="{name}"{marker}>{name}</option>"#);
    }

    let details = match (selected, result) {
        (_, Some(m)) => format!(
            r#"  <table class="metrics">
    <tr><th>Manufacturer</th><td>{}</td></tr>
    <tr><th>Average units sold 2015-2025</th><td>{:.2}</td></tr>
    <tr><th>Predicted units sold 2026</th><td>{:.2}</td></tr>
    <tr><th>Change</th><td>{:.2}</td></tr>
    <tr><th>Change %</th><td>{:.2}%</td></tr>
  </table>
"#,
            escape(&m.manufacturer),
            m.historical_average,
            m.predicted_average,
            m.change,
            m.change_pct,
        ),
        (Some(name), None) => format!("  <p class=\"missing\">No data for {}</p>\n", escape(name)),
        (None, None) => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>EV Sales Forecast</title>
</head>
<body>
  <h1>EV Sales Forecast</h1>
  <form method="get" action="/">
    <select name="manufacturer">
{options}    </select>
    <button type="submit">Show</button>
  </form>
{details}</body>
</html>
"#
    )
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"<b>"A&B"</b>"#), "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;");
    }

    #[test]
    fn test_render_selected_metrics() {
        let metric = ManufacturerMetric::new("Tesla".into(), 100.0, 150.0);
        let html = render_index(["BYD", "Tesla"].into_iter(), Some("Tesla"), Some(&metric));

        assert!(html.contains(r#"<option value="Tesla" selected>Tesla</option>"#));
        assert!(html.contains(r#"<option value="BYD">BYD</option>"#));
        assert!(html.contains("<td>50.00%</td>"));
    }

    #[test]
    fn test_render_unknown_selection() {
        let html = render_index(["BYD"].into_iter(), Some("<script>"), None);

        assert!(html.contains("No data for &lt;script&gt;"));
        assert!(!html.contains("<table"));
    }
}
