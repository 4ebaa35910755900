//! Rendering and export of dashboard views.
//!
//! This module turns a [`DashboardView`] into plain text for the terminal and
//! writes it to files in various formats (TXT, CSV, JSON).

use crate::error::Result;
use crate::models::{Message, OutputFormat, Sentiment, SentimentPercentages, Theme};
use crate::session::DashboardView;
use crate::validation::InputValidator;
use csv::Writer;
use serde::Serialize;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One segment of the stacked percentage gauge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeSegment {
    /// Sentiment shown by the segment
    pub sentiment: Sentiment,
    /// Share in percent
    pub percentage: f64,
    /// Text drawn inside the segment, e.g. `25%`
    pub label: String,
    /// Fill color
    pub color: &'static str,
}

/// Gauge segments in display order
#[must_use]
pub fn gauge_segments(percentages: &SentimentPercentages, theme: Theme) -> Vec<GaugeSegment> {
    percentages
        .iter()
        .map(|(sentiment, &percentage)| GaugeSegment {
            sentiment,
            percentage,
            label: format!("{percentage}%"),
            color: sentiment.color(theme),
        })
        .collect()
}

/// Format a message as a single display line.
///
/// Format: `YYYY-MM-DD HH:MM | Score: 0.00 | @username : body`
#[must_use]
pub fn format_message_line(message: &Message) -> String {
    let created_at = message
        .created_at
        .map_or_else(|| "unknown time".to_string(), |t| t.format(TIMESTAMP_FORMAT).to_string());
    let score = message
        .sentiment_score
        .map_or_else(|| "n/a".to_string(), |s| format!("{s:.2}"));
    format!(
        "{created_at} | Score: {score} | @{} : {}",
        message.username,
        InputValidator::sanitize_text(&message.body)
    )
}

/// Write the header, gauge and daily series to `writer`
pub fn write_summary<W: Write>(view: &DashboardView, theme: Theme, writer: &mut W) -> Result<()> {
    let Some(symbol) = view.symbol.as_deref() else {
        writeln!(writer, "No messages loaded")?;
        return Ok(());
    };

    writeln!(writer, "Sentiment dashboard: {symbol}")?;
    writeln!(
        writer,
        "Messages: {} (negative {}, neutral {}, positive {})",
        view.counts.total(),
        view.counts.negative,
        view.counts.neutral,
        view.counts.positive
    )?;
    let gauge: Vec<String> = gauge_segments(&view.percentages, theme)
        .into_iter()
        .map(|segment| format!("{} {}", segment.sentiment, segment.label))
        .collect();
    writeln!(writer, "Gauge: {}", gauge.join(" | "))?;

    writeln!(writer)?;
    writeln!(writer, "Daily positive vs negative ({})", view.window)?;
    if view.series.is_empty() {
        writeln!(writer, "(no messages in window)")?;
    }
    for day in &view.series {
        writeln!(
            writer,
            "{}  positive {}  negative {}",
            day.date.format("%Y-%m-%d"),
            day.positive,
            day.negative
        )?;
    }

    writer.flush()?;
    Ok(())
}

/// Write the full plain-text dashboard, message lists included
pub fn write_text<W: Write>(view: &DashboardView, theme: Theme, writer: &mut W) -> Result<()> {
    write_summary(view, theme, writer)?;
    if view.symbol.is_none() {
        return Ok(());
    }

    for (sentiment, messages) in view.buckets.iter() {
        writeln!(writer)?;
        writeln!(
            writer,
            "{} messages (sorted by {})",
            capitalize(sentiment.as_str()),
            view.sort_keys.get(sentiment)
        )?;
        for message in messages {
            writeln!(writer, "{}", format_message_line(message))?;
        }
    }

    writer.flush()?;
    Ok(())
}

/// Render the plain-text dashboard into a string
pub fn render_text(view: &DashboardView, theme: Theme) -> Result<String> {
    let mut buffer = Vec::new();
    write_text(view, theme, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}

/// Write a dashboard view with timestamp-based directory structure.
///
/// Creates `output_dir/timestamp/` and writes:
/// - TXT: `dashboard.txt`
/// - CSV: `counts.csv`, `series.csv` and one `messages_<sentiment>.csv` per bucket
/// - JSON: `dashboard.json`
///
/// # Returns
///
/// Vector of paths to created files
pub fn export_view(
    view: &DashboardView,
    format: OutputFormat,
    theme: Theme,
    output_dir: &Path,
    timestamp: &str,
) -> Result<Vec<PathBuf>> {
    let date_dir = output_dir.join(timestamp);
    create_dir_all(&date_dir)?;

    let mut output_files = Vec::new();

    match format {
        OutputFormat::Txt => {
            let file_path = date_dir.join(format!("dashboard.{}", format.extension()));
            let mut writer = BufWriter::new(File::create(&file_path)?);
            write_text(view, theme, &mut writer)?;
            output_files.push(file_path);
        },
        OutputFormat::Csv => {
            let counts_path = date_dir.join("counts.csv");
            write_counts_csv(view, theme, &counts_path)?;
            output_files.push(counts_path);

            let series_path = date_dir.join("series.csv");
            write_series_csv(view, &series_path)?;
            output_files.push(series_path);

            for (sentiment, messages) in view.buckets.iter() {
                let path = date_dir.join(format!("messages_{sentiment}.csv"));
                write_messages_csv(messages, &path)?;
                output_files.push(path);
            }
        },
        OutputFormat::Json => {
            let file_path = date_dir.join(format!("dashboard.{}", format.extension()));
            write_json_file(view, theme, &file_path)?;
            output_files.push(file_path);
        },
    }

    tracing::info!(
        format = format.extension(),
        files = output_files.len(),
        directory = %date_dir.display(),
        "Exported dashboard view"
    );

    Ok(output_files)
}

/// Header: `sentiment, count, percentage, color`
fn write_counts_csv(view: &DashboardView, theme: Theme, file_path: &Path) -> Result<()> {
    let mut writer = Writer::from_path(file_path)?;
    writer.write_record(["sentiment", "count", "percentage", "color"])?;
    for segment in gauge_segments(&view.percentages, theme) {
        let count = view.counts.get(segment.sentiment).to_string();
        let percentage = segment.percentage.to_string();
        writer.write_record([
            segment.sentiment.as_str(),
            count.as_str(),
            percentage.as_str(),
            segment.color,
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Header: `date, positive, negative`
fn write_series_csv(view: &DashboardView, file_path: &Path) -> Result<()> {
    let mut writer = Writer::from_path(file_path)?;
    writer.write_record(["date", "positive", "negative"])?;
    for day in &view.series {
        writer.write_record([
            day.date.format("%Y-%m-%d").to_string(),
            day.positive.to_string(),
            day.negative.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Header: `rank, created_at, sentiment_score, username, body`
fn write_messages_csv(messages: &[Message], file_path: &Path) -> Result<()> {
    let mut writer = Writer::from_path(file_path)?;
    writer.write_record(["rank", "created_at", "sentiment_score", "username", "body"])?;
    for (i, message) in messages.iter().enumerate() {
        writer.write_record([
            &(i + 1).to_string(),
            &message
                .created_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
            &message.sentiment_score.map(|s| s.to_string()).unwrap_or_default(),
            &message.username,
            &message.body,
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct JsonExport<'a> {
    view: &'a DashboardView,
    gauge: Vec<GaugeSegment>,
}

fn write_json_file(view: &DashboardView, theme: Theme, file_path: &Path) -> Result<()> {
    let file = File::create(file_path)?;
    let writer = BufWriter::new(file);
    let export = JsonExport {
        view,
        gauge: gauge_segments(&view.percentages, theme),
    };
    serde_json::to_writer_pretty(writer, &export)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_format_message_line() {
        let message = Message {
            symbol: "AAPL".to_string(),
            sentiment: "positive".to_string(),
            sentiment_score: Some(0.912),
            username: "bull".to_string(),
            body: "to the moon".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 15).single(),
        };
        assert_eq!(
            format_message_line(&message),
            "2024-01-02 09:30 | Score: 0.91 | @bull : to the moon"
        );
    }

    #[test]
    fn test_format_message_line_missing_values() {
        let message = Message {
            symbol: "AAPL".to_string(),
            sentiment: "neutral".to_string(),
            sentiment_score: None,
            username: "bear".to_string(),
            body: "hmm".to_string(),
            created_at: None,
        };
        assert_eq!(
            format_message_line(&message),
            "unknown time | Score: n/a | @bear : hmm"
        );
    }

    #[test]
    fn test_gauge_segments_follow_theme() {
        let percentages = SentimentPercentages {
            negative: 25.0,
            neutral: 25.0,
            positive: 50.0,
        };
        let segments = gauge_segments(&percentages, Theme::Dark);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].sentiment, Sentiment::Negative);
        assert_eq!(segments[1].color, "#262730");
        assert_eq!(segments[2].label, "50%");
    }

    #[test]
    fn test_render_text_of_empty_view() {
        let text = render_text(&DashboardView::default(), Theme::Light).unwrap();
        assert_eq!(text, "No messages loaded\n");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("negative"), "Negative");
        assert_eq!(capitalize(""), "");
    }
}
