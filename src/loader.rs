//! Loading the exported message table.
//!
//! A [`TableSource`] produces a [`MessageTable`] plus the row-level warnings met
//! along the way. [`TableLoader`] memoizes that load for the lifetime of a
//! session and only reads the source again on an explicit [`TableLoader::reload`].

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{Result, SentimentError};
use crate::logging::OperationTimer;
use crate::metrics;
use crate::models::{Message, MessageTable};

/// Columns every input file must provide
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "symbol",
    "sentiment",
    "sentiment_score",
    "username",
    "body",
    "created_at",
];

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f %z",
];

const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// A non-fatal problem with a single input row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// The record could not be read (wrong field count, invalid UTF-8); row dropped
    MalformedRecord {
        /// 1-based line in the source
        line: u64,
        /// Reader error message
        reason: String,
    },
    /// The record has an empty symbol; row dropped
    MissingSymbol {
        /// 1-based line in the source
        line: u64,
    },
    /// `created_at` could not be parsed; row kept without a timestamp
    UnparseableTimestamp {
        /// 1-based line in the source
        line: u64,
        /// Raw value found in the column
        value: String,
    },
}

impl LoadWarning {
    /// True if the row was dropped from the table
    #[must_use]
    pub const fn drops_row(&self) -> bool {
        !matches!(self, Self::UnparseableTimestamp { .. })
    }
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedRecord { line, reason } => {
                write!(f, "line {line}: malformed record ({reason})")
            },
            Self::MissingSymbol { line } => write!(f, "line {line}: empty symbol"),
            Self::UnparseableTimestamp { line, value } => {
                write!(f, "line {line}: unparseable created_at {value:?}")
            },
        }
    }
}

/// A table together with the warnings raised while building it
#[derive(Debug, Clone, Default)]
pub struct LoadedTable {
    /// Accepted rows
    pub table: MessageTable,
    /// Row-level problems, in source order
    pub warnings: Vec<LoadWarning>,
}

/// Something a message table can be loaded from
pub trait TableSource {
    /// Stable identifier of the underlying data, used as the cache key
    fn identity(&self) -> String;

    /// Read the whole table
    fn load(&self) -> Result<LoadedTable>;
}

/// A CSV export on disk
#[derive(Debug, Clone)]
pub struct CsvTableSource {
    path: PathBuf,
}

impl CsvTableSource {
    /// Source reading from `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the CSV file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TableSource for CsvTableSource {
    fn identity(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<LoadedTable> {
        let file = File::open(&self.path)?;
        read_table(BufReader::new(file))
    }
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    symbol: String,
    sentiment: String,
    sentiment_score: String,
    username: String,
    body: String,
    created_at: String,
}

/// Parse a CSV message table from any reader.
///
/// Fails only when the header lacks required columns or the reader itself fails.
pub fn read_table<R: Read>(reader: R) -> Result<LoadedTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .map(ToString::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(SentimentError::MissingColumns(missing));
    }

    let mut messages = Vec::new();
    let mut warnings = Vec::new();

    for result in csv_reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => return Err(e.into()),
            Err(e) => {
                let line = e.position().map_or(0, csv::Position::line);
                warnings.push(LoadWarning::MalformedRecord {
                    line,
                    reason: e.to_string(),
                });
                continue;
            },
        };

        let line = record.position().map_or(0, csv::Position::line);
        let raw: RawRecord = match record.deserialize(Some(&headers)) {
            Ok(raw) => raw,
            Err(e) => {
                warnings.push(LoadWarning::MalformedRecord {
                    line,
                    reason: e.to_string(),
                });
                continue;
            },
        };

        if let Some(message) = to_message(raw, line, &mut warnings) {
            messages.push(message);
        }
    }

    for warning in &warnings {
        warn!(%warning, "Skipped or degraded input row");
    }

    Ok(LoadedTable {
        table: MessageTable::new(messages),
        warnings,
    })
}

fn to_message(raw: RawRecord, line: u64, warnings: &mut Vec<LoadWarning>) -> Option<Message> {
    let symbol = raw.symbol.trim();
    if symbol.is_empty() {
        warnings.push(LoadWarning::MissingSymbol { line });
        return None;
    }

    let created_at = parse_timestamp(&raw.created_at);
    if created_at.is_none() {
        warnings.push(LoadWarning::UnparseableTimestamp {
            line,
            value: raw.created_at.clone(),
        });
    }

    Some(Message {
        symbol: symbol.to_string(),
        sentiment: raw.sentiment.trim().to_string(),
        sentiment_score: parse_score(&raw.sentiment_score),
        username: raw.username,
        body: raw.body,
        created_at,
    })
}

fn parse_score(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|s| s.is_finite())
}

/// Parse a `created_at` value leniently.
///
/// Values without an offset are taken as UTC. Returns `None` instead of failing.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Some(dt) = OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(value, fmt).ok())
    {
        return Some(dt.with_timezone(&Utc));
    }

    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
    {
        return Some(Utc.from_utc_datetime(&naive));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

struct CachedTable {
    identity: String,
    table: Arc<MessageTable>,
    warnings: Vec<LoadWarning>,
}

/// Memoized access to a table source.
///
/// The first [`table`](Self::table) call loads the source; later calls return
/// the same table until [`reload`](Self::reload) is requested or the source is
/// swapped for one with a different identity.
pub struct TableLoader<S> {
    source: S,
    cached: Option<CachedTable>,
}

impl<S: TableSource> TableLoader<S> {
    /// Loader over `source`; nothing is read until the table is requested
    pub const fn new(source: S) -> Self {
        Self {
            source,
            cached: None,
        }
    }

    /// The underlying source
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Replace the source; the next table request loads from it if its identity differs
    pub fn set_source(&mut self, source: S) {
        self.source = source;
    }

    /// True if a table is currently memoized
    pub const fn is_loaded(&self) -> bool {
        self.cached.is_some()
    }

    /// Warnings from the memoized load, empty if nothing is loaded
    pub fn warnings(&self) -> &[LoadWarning] {
        self.cached
            .as_ref()
            .map(|c| c.warnings.as_slice())
            .unwrap_or_default()
    }

    /// The memoized table, loading it on first access
    pub fn table(&mut self) -> Result<Arc<MessageTable>> {
        let identity = self.source.identity();
        if let Some(cached) = self.cached.as_ref().filter(|c| c.identity == identity) {
            metrics::record_cache_lookup(true);
            debug!(source = %identity, "Using memoized message table");
            return Ok(Arc::clone(&cached.table));
        }

        metrics::record_cache_lookup(false);
        self.load(identity)
    }

    /// Read the source again, replacing the memoized table.
    ///
    /// On failure the previous table stays in place.
    pub fn reload(&mut self) -> Result<Arc<MessageTable>> {
        let identity = self.source.identity();
        info!(source = %identity, "Reloading message table");
        self.load(identity)
    }

    fn load(&mut self, identity: String) -> Result<Arc<MessageTable>> {
        let timer = OperationTimer::new("load_table");
        let LoadedTable { table, warnings } = self.source.load()?;
        let elapsed = timer.finish();

        metrics::record_table_load(table.len(), warnings.len(), elapsed);
        info!(
            source = %identity,
            rows = table.len(),
            warnings = warnings.len(),
            symbols = table.symbols().len(),
            "Loaded message table"
        );

        let table = Arc::new(table);
        self.cached = Some(CachedTable {
            identity,
            table: Arc::clone(&table),
            warnings,
        });
        Ok(table)
    }
}
