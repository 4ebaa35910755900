//! Sentiment aggregation over a message table.
//!
//! Every function here is pure: it reads the table and returns a new derived
//! view. Nothing is mutated and nothing is cached.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use tracing::{debug, trace};

use crate::clock::Clock;
use crate::models::{
    DailySentiment, Message, MessageTable, Sentiment, SentimentCounts, SentimentPercentages,
    SortKey, TimeWindow,
};

/// Count rows per known sentiment.
///
/// All three keys are always present. Rows with an unknown label are ignored,
/// so the total may be lower than the table length.
#[must_use]
pub fn sentiment_counts(table: &MessageTable) -> SentimentCounts {
    let mut counts = SentimentCounts::default();
    for sentiment in table.iter().filter_map(Message::kind) {
        *counts.get_mut(sentiment) += 1;
    }
    trace!(rows = table.len(), total = counts.total(), "Counted sentiments");
    counts
}

/// Convert counts to percentages rounded to two decimals.
///
/// A zero total yields all zeros.
#[must_use]
pub fn sentiment_percentages(counts: &SentimentCounts) -> SentimentPercentages {
    let total = counts.total();
    if total == 0 {
        debug!("No messages to compute percentages from, reporting zeros");
        return SentimentPercentages::default();
    }

    SentimentPercentages::from_fn(|sentiment| {
        round2(*counts.get(sentiment) as f64 / total as f64 * 100.0)
    })
}

/// Round half to even, so 3.125 becomes 3.12
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Daily positive/negative counts for `symbol` over the trailing `window`.
///
/// Rows without a parseable timestamp and neutral or unknown rows are skipped.
/// Only dates that have at least one qualifying row appear, in ascending order.
#[must_use]
pub fn daily_sentiment_series<C: Clock>(
    table: &MessageTable,
    symbol: &str,
    window: TimeWindow,
    clock: &C,
) -> Vec<DailySentiment> {
    let cutoff = clock.now() - Duration::days(i64::from(window.days()));

    let mut by_date: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();
    for message in table.iter().filter(|m| m.symbol == symbol) {
        let Some(created_at) = message.created_at else {
            continue;
        };
        if created_at < cutoff {
            continue;
        }
        let positive = match message.kind() {
            Some(Sentiment::Positive) => true,
            Some(Sentiment::Negative) => false,
            Some(Sentiment::Neutral) | None => continue,
        };
        let day = by_date.entry(created_at.date_naive()).or_default();
        if positive {
            day.0 += 1;
        } else {
            day.1 += 1;
        }
    }

    debug!(
        symbol,
        window_days = window.days(),
        %cutoff,
        days = by_date.len(),
        "Built daily sentiment series"
    );

    by_date
        .into_iter()
        .map(|(date, (positive, negative))| DailySentiment {
            date,
            positive,
            negative,
        })
        .collect()
}

/// Messages of one sentiment, sorted descending by `key` and capped at `limit`.
///
/// The sort is stable: ties keep table order. Recency ordering drops rows
/// without a timestamp. Score ordering places rows without a score last.
#[must_use]
pub fn sorted_bucket(
    table: &MessageTable,
    sentiment: Sentiment,
    key: SortKey,
    limit: Option<usize>,
) -> Vec<Message> {
    let mut bucket: Vec<&Message> = table
        .iter()
        .filter(|m| m.kind() == Some(sentiment))
        .filter(|m| key != SortKey::Recency || m.created_at.is_some())
        .collect();

    match key {
        SortKey::Recency => bucket.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortKey::Score => bucket.sort_by(|a, b| score_descending(a.sentiment_score, b.sentiment_score)),
    }

    if let Some(limit) = limit {
        bucket.truncate(limit);
    }

    bucket.into_iter().cloned().collect()
}

/// Like [`sorted_bucket`] but takes a raw label; unknown labels yield nothing.
#[must_use]
pub fn sorted_bucket_by_label(
    table: &MessageTable,
    label: &str,
    key: SortKey,
    limit: Option<usize>,
) -> Vec<Message> {
    Sentiment::from_label(label).map_or_else(Vec::new, |sentiment| {
        sorted_bucket(table, sentiment, key, limit)
    })
}

fn score_descending(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        // `+ 0.0` folds -0.0 into 0.0 so equal scores keep table order
        (Some(a), Some(b)) => (b + 0.0).total_cmp(&(a + 0.0)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{TimeZone, Utc};

    fn message(sentiment: &str, score: Option<f64>, day: u32, hour: u32) -> Message {
        Message {
            symbol: "AAPL".to_string(),
            sentiment: sentiment.to_string(),
            sentiment_score: score,
            username: format!("user{day}{hour}"),
            body: "text".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).single(),
        }
    }

    #[test]
    fn test_counts_ignore_unknown_labels() {
        let table = MessageTable::new(vec![
            message("positive", None, 1, 0),
            message("bullish", None, 1, 0),
            message("negative", None, 1, 0),
        ]);
        let counts = sentiment_counts(&table);
        assert_eq!(counts.positive, 1);
        assert_eq!(counts.negative, 1);
        assert_eq!(counts.neutral, 0);
        assert_eq!(counts.total(), 2);
    }

    #[test]
    fn test_percentages_round_to_two_decimals() {
        let counts = SentimentCounts {
            negative: 1,
            neutral: 1,
            positive: 1,
        };
        let pct = sentiment_percentages(&counts);
        assert!((pct.negative - 33.33).abs() < f64::EPSILON);
        assert!((pct.positive - 33.33).abs() < f64::EPSILON);
    }

    #[test]
    fn test_percentages_round_half_to_even() {
        let counts = SentimentCounts {
            negative: 1,
            neutral: 0,
            positive: 31,
        };
        let pct = sentiment_percentages(&counts);
        assert!((pct.negative - 3.12).abs() < f64::EPSILON);
        assert!((pct.positive - 96.88).abs() < f64::EPSILON);
        assert!((pct.negative + pct.neutral + pct.positive - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_signed_zero_scores_keep_table_order() {
        let mut first = message("positive", Some(-0.0), 1, 1);
        first.username = "first".to_string();
        let mut second = message("positive", Some(0.0), 1, 2);
        second.username = "second".to_string();
        let table = MessageTable::new(vec![first, second]);

        let bucket = sorted_bucket(&table, Sentiment::Positive, SortKey::Score, None);
        let order: Vec<&str> = bucket.iter().map(|m| m.username.as_str()).collect();
        assert_eq!(order, vec!["first", "second"]);
    }

    #[test]
    fn test_series_excludes_rows_before_cutoff() {
        let table = MessageTable::new(vec![
            message("positive", None, 1, 12),
            message("positive", None, 9, 12),
            message("negative", None, 10, 8),
        ]);
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap());

        let series = daily_sentiment_series(&table, "AAPL", TimeWindow::TwoDays, &clock);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, NaiveDate::from_ymd_opt(2024, 1, 9).unwrap());
        assert_eq!(series[1].negative, 1);
    }

    #[test]
    fn test_cutoff_is_inclusive() {
        let table = MessageTable::new(vec![message("positive", None, 8, 12)]);
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap());
        let series = daily_sentiment_series(&table, "AAPL", TimeWindow::TwoDays, &clock);
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_score_sort_places_missing_scores_last() {
        let table = MessageTable::new(vec![
            message("neutral", None, 1, 0),
            message("neutral", Some(0.1), 1, 1),
            message("neutral", Some(0.7), 1, 2),
        ]);
        let bucket = sorted_bucket(&table, Sentiment::Neutral, SortKey::Score, None);
        let scores: Vec<Option<f64>> = bucket.iter().map(|m| m.sentiment_score).collect();
        assert_eq!(scores, vec![Some(0.7), Some(0.1), None]);
    }

    #[test]
    fn test_limit_truncates() {
        let table = MessageTable::new((1..=5).map(|d| message("positive", None, d, 0)).collect());
        let bucket = sorted_bucket(&table, Sentiment::Positive, SortKey::Recency, Some(2));
        assert_eq!(bucket.len(), 2);
        assert_eq!(bucket[0].username, "user50");
    }

    #[test]
    fn test_unknown_label_yields_empty_bucket() {
        let table = MessageTable::new(vec![message("positive", None, 1, 0)]);
        assert!(sorted_bucket_by_label(&table, "mixed", SortKey::Score, None).is_empty());
        assert_eq!(
            sorted_bucket_by_label(&table, "positive", SortKey::Score, None).len(),
            1
        );
    }
}
