//! Shaping of raw service responses into the `AnalysisResult` invariants.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use curator_core::{AnalysisResult, TOPIC_UNCLASSIFIED};
use serde_json::Value;

/// Context for shaping one response.
pub struct ShapeContext<'a> {
    /// Human-readable source label, used for the summary placeholder.
    pub source_label: &'a str,
    /// Original input URL for the URL-analysis path; always ends up in
    /// the result's url list.
    pub input_url: Option<&'a str>,
    /// Date reported by the auxiliary fetcher, preferred over the
    /// service-provided one when it validates.
    pub aux_date: Option<&'a str>,
}

/// Coerce a raw service response into a well-formed result: arrays never
/// null, elements trimmed and non-empty, topic and summary defaulted, date
/// normalized.
pub fn shape_result(raw: &Value, ctx: &ShapeContext<'_>) -> AnalysisResult {
    let topic = raw
        .get("topic")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(TOPIC_UNCLASSIFIED)
        .to_string();

    let tags = coerce_list(raw.get("tags"));
    let mut urls = coerce_list(raw.get("urls"));

    if let Some(input_url) = ctx.input_url {
        if !urls.iter().any(|u| u == input_url) {
            urls.insert(0, input_url.to_string());
        }
    }

    let summary_html = raw
        .get("summaryHtml")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("<p>Content from {}</p>", ctx.source_label));

    let normalized_date = normalize_date(
        ctx.aux_date,
        raw.get("normalizedDate").and_then(Value::as_str),
    );

    AnalysisResult {
        topic,
        tags,
        summary_html,
        urls,
        normalized_date,
        advisories: Vec::new(),
    }
}

/// Accept an array of strings, or best-effort split a delimited string.
/// Anything else becomes an empty list.
fn coerce_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) => s
            .split([',', ';'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Normalize to `YYYY-MM-DD HH:mm:ss`, preferring the aux-fetched date,
/// then the service-provided one, then the current time.
pub fn normalize_date(aux: Option<&str>, service: Option<&str>) -> String {
    aux.and_then(parse_flexible)
        .or_else(|| service.and_then(parse_flexible))
        .unwrap_or_else(|| Local::now().naive_local())
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

fn parse_flexible(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    None
}
