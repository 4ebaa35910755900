//! Metric names and recording helpers.
//!
//! The library never installs a recorder. Without one every call here is a
//! no-op, so embedding applications decide where metrics go.

use metrics::{counter, histogram};
use std::time::Duration;

/// Rows accepted into a loaded table
pub const ROWS_LOADED_TOTAL: &str = "sentiment_dashboard_rows_loaded_total";
/// Row-level warnings raised while loading
pub const LOAD_WARNINGS_TOTAL: &str = "sentiment_dashboard_load_warnings_total";
/// Time spent reading and parsing the source
pub const LOAD_DURATION: &str = "sentiment_dashboard_load_duration_seconds";
/// Table requests answered from the memoized load
pub const CACHE_HITS_TOTAL: &str = "sentiment_dashboard_cache_hits_total";
/// Table requests that triggered a load
pub const CACHE_MISSES_TOTAL: &str = "sentiment_dashboard_cache_misses_total";
/// Derived views recomputed, labelled by `view`
pub const VIEW_REFRESHES_TOTAL: &str = "sentiment_dashboard_view_refreshes_total";
/// Time spent recomputing a derived view, labelled by `view`
pub const VIEW_REFRESH_DURATION: &str = "sentiment_dashboard_view_refresh_duration_seconds";

/// Record a completed table load
pub fn record_table_load(rows: usize, warnings: usize, duration: Duration) {
    counter!(ROWS_LOADED_TOTAL).increment(rows as u64);
    counter!(LOAD_WARNINGS_TOTAL).increment(warnings as u64);
    histogram!(LOAD_DURATION).record(duration.as_secs_f64());
}

/// Record whether a table request was served from the memoized load
pub fn record_cache_lookup(hit: bool) {
    if hit {
        counter!(CACHE_HITS_TOTAL).increment(1);
    } else {
        counter!(CACHE_MISSES_TOTAL).increment(1);
    }
}

/// Record the recomputation of one derived view
pub fn record_view_refresh(view: &'static str, duration: Duration) {
    counter!(VIEW_REFRESHES_TOTAL, "view" => view).increment(1);
    histogram!(VIEW_REFRESH_DURATION, "view" => view).record(duration.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_table_load(10, 2, Duration::from_millis(5));
        record_cache_lookup(true);
        record_cache_lookup(false);
        record_view_refresh("series", Duration::from_micros(40));
    }

    #[test]
    fn test_metric_names_share_prefix() {
        for name in [
            ROWS_LOADED_TOTAL,
            LOAD_WARNINGS_TOTAL,
            LOAD_DURATION,
            CACHE_HITS_TOTAL,
            CACHE_MISSES_TOTAL,
            VIEW_REFRESHES_TOTAL,
            VIEW_REFRESH_DURATION,
        ] {
            assert!(name.starts_with("sentiment_dashboard_"));
        }
    }
}
