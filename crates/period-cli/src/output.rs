//! Text and JSON rendering for `periodctl` answers.

use anyhow::{Context, Result};
use clap::ValueEnum;
use period_common::config::PeriodConfig;
use period_common::time::format_timestamp;
use period_core::{Period, PeriodBounds};
use serde::Serialize;
use std::time::Duration;

/// Output format selected with `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON document per answer.
    Json,
}

#[derive(Debug, Serialize)]
struct PeriodReport {
    #[serde(flatten)]
    bounds: PeriodBounds,
    start: Option<String>,
    end: Option<String>,
}

#[derive(Debug, Serialize)]
struct SpanReport {
    span_millis: u64,
    duration: String,
}

/// RFC 3339 text, or a marker for instants past year 9999.
fn text_timestamp(millis: u64) -> String {
    format_timestamp(millis).unwrap_or_else(|| "after 9999-12-31".to_string())
}

/// Render a period with its boundaries.
///
/// The sentinel renders as "no period" in text and `{"id": 0}` in JSON. A
/// period whose boundaries do not fit in a `u64` renders with its ID only.
/// Boundaries past year 9999 have no RFC 3339 form and render as `null` in JSON.
pub fn render_period(period: &Period, format: OutputFormat) -> Result<String> {
    if period.is_sentinel() {
        return Ok(match format {
            OutputFormat::Text => "no period (time source unavailable)".to_string(),
            OutputFormat::Json => serde_json::json!({ "id": 0 }).to_string(),
        });
    }
    let Some(bounds) = period.bounds() else {
        return Ok(match format {
            OutputFormat::Text => format!("{period}: beyond the last representable millisecond"),
            OutputFormat::Json => serde_json::json!({ "id": period.id() }).to_string(),
        });
    };

    match format {
        OutputFormat::Text => Ok(format!(
            "{period}: {} .. {} ({}..={})",
            text_timestamp(bounds.start_timestamp_millis),
            text_timestamp(bounds.end_timestamp_millis),
            bounds.start_timestamp_millis,
            bounds.end_timestamp_millis,
        )),
        OutputFormat::Json => {
            let report = PeriodReport {
                bounds,
                start: format_timestamp(bounds.start_timestamp_millis),
                end: format_timestamp(bounds.end_timestamp_millis),
            };
            serde_json::to_string(&report).context("Failed to encode period as JSON")
        }
    }
}

/// Render the configured span.
pub fn render_span(span: u64, duration: Duration, format: OutputFormat) -> Result<String> {
    let human = humantime::format_duration(duration).to_string();
    match format {
        OutputFormat::Text => Ok(format!("{span} ms ({human})")),
        OutputFormat::Json => serde_json::to_string(&SpanReport {
            span_millis: span,
            duration: human,
        })
        .context("Failed to encode span as JSON"),
    }
}

/// Render the resolved configuration: TOML for text, pretty JSON otherwise.
pub fn render_config(config: &PeriodConfig, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => config
            .to_toml()
            .map(|s| s.trim_end().to_string())
            .context("Failed to encode configuration as TOML"),
        OutputFormat::Json => {
            serde_json::to_string_pretty(config).context("Failed to encode configuration as JSON")
        }
    }
}
