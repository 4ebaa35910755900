//! Data models for sentiment aggregation
//!
//! This module contains the message table loaded from the export file and the
//! display-ready summaries derived from it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SentimentError;

/// Sentiment classification of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    /// Bearish or otherwise negative tone
    Negative,
    /// No clear tone
    Neutral,
    /// Bullish or otherwise positive tone
    Positive,
}

impl Sentiment {
    /// All known sentiments in display order
    pub const ALL: [Self; 3] = [Self::Negative, Self::Neutral, Self::Positive];

    /// Label used in the export file
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Negative => "negative",
            Self::Neutral => "neutral",
            Self::Positive => "positive",
        }
    }

    /// Match a raw label exactly; unknown labels yield `None`.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "negative" => Some(Self::Negative),
            "neutral" => Some(Self::Neutral),
            "positive" => Some(Self::Positive),
            _ => None,
        }
    }

    /// Display color for charts and gauges
    #[must_use]
    pub const fn color(self, theme: Theme) -> &'static str {
        match (self, theme) {
            (Self::Negative, _) => "#ff5182",
            (Self::Positive, _) => "#42ff87",
            (Self::Neutral, Theme::Dark) => "#262730",
            (Self::Neutral, Theme::Light) => "#F0F2F6",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = SentimentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| SentimentError::InvalidSentiment(s.to_string()))
    }
}

/// One value per known sentiment.
///
/// Every key is always present, so consumers never have to handle a missing
/// bucket. Serializes as `{ "negative": .., "neutral": .., "positive": .. }`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerSentiment<T> {
    /// Value for negative messages
    pub negative: T,
    /// Value for neutral messages
    pub neutral: T,
    /// Value for positive messages
    pub positive: T,
}

impl<T> PerSentiment<T> {
    /// Build a value for each sentiment from a closure
    pub fn from_fn(mut f: impl FnMut(Sentiment) -> T) -> Self {
        Self {
            negative: f(Sentiment::Negative),
            neutral: f(Sentiment::Neutral),
            positive: f(Sentiment::Positive),
        }
    }

    /// Borrow the value for a sentiment
    #[must_use]
    pub const fn get(&self, sentiment: Sentiment) -> &T {
        match sentiment {
            Sentiment::Negative => &self.negative,
            Sentiment::Neutral => &self.neutral,
            Sentiment::Positive => &self.positive,
        }
    }

    /// Mutably borrow the value for a sentiment
    pub fn get_mut(&mut self, sentiment: Sentiment) -> &mut T {
        match sentiment {
            Sentiment::Negative => &mut self.negative,
            Sentiment::Neutral => &mut self.neutral,
            Sentiment::Positive => &mut self.positive,
        }
    }

    /// Iterate in display order
    pub fn iter(&self) -> impl Iterator<Item = (Sentiment, &T)> {
        Sentiment::ALL.into_iter().map(move |s| (s, self.get(s)))
    }
}

impl PerSentiment<usize> {
    /// Sum over the three known sentiments
    #[must_use]
    pub const fn total(&self) -> usize {
        self.negative + self.neutral + self.positive
    }
}

/// Number of messages per sentiment
pub type SentimentCounts = PerSentiment<usize>;

/// Share of messages per sentiment, in percent rounded to two decimals
pub type SentimentPercentages = PerSentiment<f64>;

/// A single row of the exported message table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Ticker the message is about
    pub symbol: String,
    /// Raw sentiment label as found in the source
    pub sentiment: String,
    /// Classifier score, `None` when missing or unparseable
    pub sentiment_score: Option<f64>,
    /// Author handle
    pub username: String,
    /// Message text
    pub body: String,
    /// Creation time, `None` when the source value could not be parsed
    pub created_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Known sentiment of this message, if the label is recognized
    #[must_use]
    pub fn kind(&self) -> Option<Sentiment> {
        Sentiment::from_label(&self.sentiment)
    }
}

/// Immutable, ordered collection of messages.
///
/// Row order only matters for tie-breaking when sorting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageTable {
    messages: Vec<Message>,
}

impl MessageTable {
    /// Wrap a list of messages
    #[must_use]
    pub const fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// All rows in source order
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Iterate rows in source order
    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True if the table has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Distinct symbols in order of first appearance
    #[must_use]
    pub fn symbols(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.messages
            .iter()
            .map(|m| m.symbol.as_str())
            .filter(|s| seen.insert(*s))
            .collect()
    }

    /// True if at least one row carries `symbol`
    #[must_use]
    pub fn contains_symbol(&self, symbol: &str) -> bool {
        self.messages.iter().any(|m| m.symbol == symbol)
    }

    /// Derived table holding only rows for `symbol`
    #[must_use]
    pub fn for_symbol(&self, symbol: &str) -> Self {
        Self::new(
            self.messages
                .iter()
                .filter(|m| m.symbol == symbol)
                .cloned()
                .collect(),
        )
    }
}

impl FromIterator<Message> for MessageTable {
    fn from_iter<I: IntoIterator<Item = Message>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a MessageTable {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

/// Positive and negative message counts for one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySentiment {
    /// Calendar date (UTC)
    pub date: NaiveDate,
    /// Positive messages on that day
    pub positive: usize,
    /// Negative messages on that day
    pub negative: usize,
}

/// Trailing window used by the daily series
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum TimeWindow {
    /// Last 2 days
    TwoDays,
    /// Last 10 days
    #[default]
    TenDays,
    /// Last 30 days
    ThirtyDays,
}

impl TimeWindow {
    /// Recognized windows, in selector order
    pub const ALL: [Self; 3] = [Self::TenDays, Self::TwoDays, Self::ThirtyDays];

    /// Window length in days
    #[must_use]
    pub const fn days(self) -> u32 {
        match self {
            Self::TwoDays => 2,
            Self::TenDays => 10,
            Self::ThirtyDays => 30,
        }
    }
}

impl TryFrom<u32> for TimeWindow {
    type Error = SentimentError;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        match days {
            2 => Ok(Self::TwoDays),
            10 => Ok(Self::TenDays),
            30 => Ok(Self::ThirtyDays),
            other => Err(SentimentError::InvalidWindow(other)),
        }
    }
}

impl From<TimeWindow> for u32 {
    fn from(window: TimeWindow) -> Self {
        window.days()
    }
}

impl FromStr for TimeWindow {
    type Err = SentimentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let days = s
            .trim()
            .parse::<u32>()
            .map_err(|_| SentimentError::Other(format!("Invalid time window: {s}")))?;
        Self::try_from(days)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "last {} days", self.days())
    }
}

/// Ordering applied to a sentiment bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Most recent first
    #[default]
    Recency,
    /// Highest score first
    Score,
}

impl SortKey {
    /// Label used in configuration and on the command line
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Recency => "recency",
            Self::Score => "score",
        }
    }
}

impl FromStr for SortKey {
    type Err = SentimentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "recency" | "date" => Ok(Self::Recency),
            "score" => Ok(Self::Score),
            _ => Err(SentimentError::InvalidSortKey(s.to_string())),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base color theme of the rendering surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light background
    #[default]
    Light,
    /// Dark background
    Dark,
}

impl FromStr for Theme {
    type Err = SentimentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(SentimentError::InvalidTheme(s.to_string())),
        }
    }
}

/// Output format for exported dashboard views
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Comma-separated values format
    Csv,
    /// Plain text format
    #[default]
    Txt,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Get the file extension for this format
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Txt => "txt",
            Self::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = SentimentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "txt" => Ok(Self::Txt),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(SentimentError::InvalidFormat(s.to_string())),
        }
    }
}
