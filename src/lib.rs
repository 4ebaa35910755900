//! StockTwits Sentiment - Aggregation over exported social-media messages
//!
//! A Rust library that loads a pre-exported table of ticker messages tagged
//! with a sentiment label and score, and derives display-ready summaries.
//!
//! # Features
//!
//! - Lenient CSV loading with row-level warnings and a memoized loader
//! - Sentiment counts and percentages
//! - Daily positive/negative series over a trailing window
//! - Per-sentiment message lists sorted by recency or score
//! - Event-driven dashboard sessions that recompute only what changed
//! - Export to multiple formats (TXT, CSV, JSON)

/// Pure aggregation functions
pub mod aggregator;
/// Injectable time source
pub mod clock;
/// Configuration management
pub mod config;
/// Error types
pub mod error;
/// Table loading and memoization
pub mod loader;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Rendering and export
pub mod report;
/// Dashboard session state
pub mod session;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use aggregator::{daily_sentiment_series, sentiment_counts, sentiment_percentages, sorted_bucket};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Result, SentimentError};
pub use loader::{CsvTableSource, TableLoader, TableSource};
pub use models::{Message, MessageTable, OutputFormat, Sentiment, SortKey, TimeWindow};
pub use session::{ControlEvent, DashboardSession, DashboardView};
