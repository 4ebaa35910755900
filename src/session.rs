//! Per-session dashboard state.
//!
//! A [`DashboardSession`] holds the loaded table and the current selector values,
//! and keeps every derived view up to date. Each [`ControlEvent`] recomputes only
//! the views whose inputs it changed.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregator::{daily_sentiment_series, sentiment_counts, sentiment_percentages, sorted_bucket};
use crate::clock::{Clock, SystemClock};
use crate::error::{Result, SentimentError};
use crate::loader::{LoadWarning, TableLoader, TableSource};
use crate::logging::OperationTimer;
use crate::metrics;
use crate::models::{
    DailySentiment, Message, MessageTable, PerSentiment, Sentiment, SentimentCounts,
    SentimentPercentages, SortKey, TimeWindow,
};
use crate::validation::InputValidator;

/// Initial selector values for a session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardSettings {
    /// Symbol to select first; falls back to the first symbol in the table
    pub default_symbol: Option<String>,
    /// Window of the daily series
    pub window: TimeWindow,
    /// Ordering applied to every bucket initially
    pub default_sort: SortKey,
    /// Cap on bucket length, unbounded when `None`
    pub bucket_limit: Option<usize>,
}

/// A change of one dashboard control
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    /// The symbol selector changed
    SelectSymbol(String),
    /// The time-window selector changed
    SelectWindow(TimeWindow),
    /// The sort selector of one bucket changed
    SelectSort {
        /// Bucket whose selector changed
        sentiment: Sentiment,
        /// New ordering
        key: SortKey,
    },
    /// The user asked to re-read the source
    Reload,
}

/// A derived view of the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// Counts and percentages
    Counts,
    /// Daily positive/negative series
    Series,
    /// Sorted message list of one sentiment
    Bucket(Sentiment),
}

impl ViewKind {
    /// Label used for logs and metrics
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Counts => "counts",
            Self::Series => "series",
            Self::Bucket(Sentiment::Negative) => "bucket_negative",
            Self::Bucket(Sentiment::Neutral) => "bucket_neutral",
            Self::Bucket(Sentiment::Positive) => "bucket_positive",
        }
    }

    fn all() -> Vec<Self> {
        let mut kinds = vec![Self::Counts, Self::Series];
        kinds.extend(Sentiment::ALL.into_iter().map(Self::Bucket));
        kinds
    }
}

/// Everything the dashboard displays for the current selection
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardView {
    /// Selected symbol, `None` only when the table is empty
    pub symbol: Option<String>,
    /// Selected series window
    pub window: TimeWindow,
    /// Selected ordering per bucket
    pub sort_keys: PerSentiment<SortKey>,
    /// Messages per sentiment for the symbol
    pub counts: SentimentCounts,
    /// Share per sentiment for the symbol
    pub percentages: SentimentPercentages,
    /// Daily positive/negative counts inside the window
    pub series: Vec<DailySentiment>,
    /// Sorted, capped message lists per sentiment
    pub buckets: PerSentiment<Vec<Message>>,
}

/// Dashboard state for one user session
pub struct DashboardSession<S, C = SystemClock> {
    loader: TableLoader<S>,
    clock: C,
    table: Arc<MessageTable>,
    symbol_rows: MessageTable,
    bucket_limit: Option<usize>,
    view: DashboardView,
}

impl<S: TableSource, C: Clock> DashboardSession<S, C> {
    /// Load the table and compute every view for the initial selection
    pub fn new(mut loader: TableLoader<S>, clock: C, settings: DashboardSettings) -> Result<Self> {
        if let Some(limit) = settings.bucket_limit {
            InputValidator::validate_bucket_limit(limit)?;
        }

        let table = loader.table()?;
        let symbol = initial_symbol(&table, settings.default_symbol.as_deref());
        info!(symbol = ?symbol, window_days = settings.window.days(), "Starting dashboard session");

        let mut session = Self {
            loader,
            clock,
            table,
            symbol_rows: MessageTable::default(),
            bucket_limit: settings.bucket_limit,
            view: DashboardView {
                symbol,
                window: settings.window,
                sort_keys: PerSentiment::from_fn(|_| settings.default_sort),
                ..DashboardView::default()
            },
        };
        session.refresh_all();
        Ok(session)
    }

    /// Current derived views
    pub const fn view(&self) -> &DashboardView {
        &self.view
    }

    /// The loaded table
    pub fn table(&self) -> &MessageTable {
        &self.table
    }

    /// Values for the symbol selector
    pub fn symbols(&self) -> Vec<&str> {
        self.table.symbols()
    }

    /// Row-level warnings from the current load
    pub fn warnings(&self) -> &[LoadWarning] {
        self.loader.warnings()
    }

    /// Handle a control change and report which views were recomputed.
    ///
    /// Re-selecting the current value recomputes nothing. Errors leave the
    /// session unchanged.
    pub fn apply(&mut self, event: ControlEvent) -> Result<Vec<ViewKind>> {
        debug!(?event, "Applying control event");
        match event {
            ControlEvent::SelectSymbol(symbol) => {
                InputValidator::validate_symbol(&symbol)?;
                if self.view.symbol.as_deref() == Some(symbol.as_str()) {
                    return Ok(Vec::new());
                }
                if !self.table.contains_symbol(&symbol) {
                    return Err(SentimentError::UnknownSymbol(symbol));
                }
                self.view.symbol = Some(symbol);
                Ok(self.refresh_all())
            },
            ControlEvent::SelectWindow(window) => {
                if self.view.window == window {
                    return Ok(Vec::new());
                }
                self.view.window = window;
                self.refresh_series();
                Ok(vec![ViewKind::Series])
            },
            ControlEvent::SelectSort { sentiment, key } => {
                if *self.view.sort_keys.get(sentiment) == key {
                    return Ok(Vec::new());
                }
                *self.view.sort_keys.get_mut(sentiment) = key;
                self.refresh_bucket(sentiment);
                Ok(vec![ViewKind::Bucket(sentiment)])
            },
            ControlEvent::Reload => {
                self.table = self.loader.reload()?;
                let still_present = self
                    .view
                    .symbol
                    .as_deref()
                    .is_some_and(|s| self.table.contains_symbol(s));
                if !still_present {
                    self.view.symbol = initial_symbol(&self.table, None);
                }
                Ok(self.refresh_all())
            },
        }
    }

    fn refresh_all(&mut self) -> Vec<ViewKind> {
        self.symbol_rows = self
            .view
            .symbol
            .as_deref()
            .map(|s| self.table.for_symbol(s))
            .unwrap_or_default();

        self.refresh_counts();
        self.refresh_series();
        for sentiment in Sentiment::ALL {
            self.refresh_bucket(sentiment);
        }
        ViewKind::all()
    }

    fn refresh_counts(&mut self) {
        let timer = OperationTimer::new(ViewKind::Counts.as_str());
        self.view.counts = sentiment_counts(&self.symbol_rows);
        self.view.percentages = sentiment_percentages(&self.view.counts);
        metrics::record_view_refresh(timer.operation(), timer.finish());
    }

    fn refresh_series(&mut self) {
        let timer = OperationTimer::new(ViewKind::Series.as_str());
        self.view.series = match self.view.symbol.as_deref() {
            Some(symbol) => daily_sentiment_series(&self.table, symbol, self.view.window, &self.clock),
            None => Vec::new(),
        };
        metrics::record_view_refresh(timer.operation(), timer.finish());
    }

    fn refresh_bucket(&mut self, sentiment: Sentiment) {
        let timer = OperationTimer::new(ViewKind::Bucket(sentiment).as_str());
        let key = *self.view.sort_keys.get(sentiment);
        *self.view.buckets.get_mut(sentiment) = sorted_bucket(&self.symbol_rows, sentiment, key, self.bucket_limit);
        metrics::record_view_refresh(timer.operation(), timer.finish());
    }
}

fn initial_symbol(table: &MessageTable, preferred: Option<&str>) -> Option<String> {
    if let Some(symbol) = preferred {
        if table.contains_symbol(symbol) {
            return Some(symbol.to_string());
        }
        warn!(symbol, "Configured default symbol not found in table");
    }
    table.symbols().first().map(|s| (*s).to_string())
}
