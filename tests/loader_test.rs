//! Tests for loading exported message tables

use std::cell::Cell;
use std::io::Write;
use std::rc::Rc;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use stocktwits_sentiment::loader::{read_table, CsvTableSource, LoadWarning, LoadedTable, TableLoader, TableSource};
use stocktwits_sentiment::models::{Message, MessageTable};
use stocktwits_sentiment::{Result, SentimentError};
use tempfile::{tempdir, NamedTempFile};

const HEADER: &str = "symbol,sentiment,sentiment_score,username,body,created_at\n";

fn write_csv(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// In-memory source that counts how often it is read
struct CountingSource {
    name: String,
    rows: Vec<Message>,
    loads: Rc<Cell<usize>>,
    fail: bool,
}

impl CountingSource {
    fn new(name: &str, symbols: &[&str], loads: &Rc<Cell<usize>>) -> Self {
        let rows = symbols
            .iter()
            .map(|symbol| Message {
                symbol: (*symbol).to_string(),
                sentiment: "positive".to_string(),
                sentiment_score: Some(0.5),
                username: "tester".to_string(),
                body: "hello".to_string(),
                created_at: None,
            })
            .collect();
        Self {
            name: name.to_string(),
            rows,
            loads: Rc::clone(loads),
            fail: false,
        }
    }
}

impl TableSource for CountingSource {
    fn identity(&self) -> String {
        self.name.clone()
    }

    fn load(&self) -> Result<LoadedTable> {
        self.loads.set(self.loads.get() + 1);
        if self.fail {
            return Err(SentimentError::Other("source unavailable".to_string()));
        }
        Ok(LoadedTable {
            table: MessageTable::new(self.rows.clone()),
            warnings: Vec::new(),
        })
    }
}

#[test]
fn test_read_valid_table() {
    let data = format!(
        "{HEADER}AAPL,positive,0.91,bull,to the moon,2024-01-02 09:30:00\n\
         TSLA,negative,-0.4,bear,\"overvalued, again\",2024-01-02T10:00:00Z\n\
         AAPL,neutral,,watcher,meh,2024-01-03 11:00:00+00:00\n"
    );
    let LoadedTable { table, warnings } = read_table(data.as_bytes()).unwrap();

    assert!(warnings.is_empty());
    assert_eq!(table.len(), 3);
    assert_eq!(table.symbols(), vec!["AAPL", "TSLA"]);

    let tsla = &table.messages()[1];
    assert_eq!(tsla.body, "overvalued, again");
    assert_eq!(tsla.sentiment_score, Some(-0.4));
    assert_eq!(tsla.created_at, Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).single());

    assert_eq!(table.messages()[2].sentiment_score, None);
}

#[test]
fn test_column_order_and_extra_columns_are_tolerated() {
    let data = "id,created_at,body,username,sentiment_score,sentiment,symbol\n\
                7,2024-01-02 09:30:00,hi,u,0.1,positive,AAPL\n";
    let LoadedTable { table, warnings } = read_table(data.as_bytes()).unwrap();
    assert!(warnings.is_empty());
    assert_eq!(table.messages()[0].symbol, "AAPL");
    assert_eq!(table.messages()[0].sentiment, "positive");
}

#[test]
fn test_missing_columns_are_listed() {
    let data = "symbol,sentiment,username\nAAPL,positive,u\n";
    let err = read_table(data.as_bytes()).unwrap_err();
    match err {
        SentimentError::MissingColumns(columns) => {
            assert_eq!(columns, vec!["sentiment_score", "body", "created_at"]);
        },
        other => panic!("expected MissingColumns, got {other:?}"),
    }
}

#[test]
fn test_bad_rows_become_warnings() {
    let data = format!(
        "{HEADER}AAPL,positive,0.5,a,ok,2024-01-02 09:30:00\n\
         AAPL,positive,0.5,b\n\
         ,negative,0.1,c,no symbol,2024-01-02 09:30:00\n\
         AAPL,negative,0.2,d,undated,yesterday\n"
    );
    let LoadedTable { table, warnings } = read_table(data.as_bytes()).unwrap();

    assert_eq!(table.len(), 2);
    assert_eq!(warnings.len(), 3);
    assert!(matches!(warnings[0], LoadWarning::MalformedRecord { line: 3, .. }));
    assert_eq!(warnings[1], LoadWarning::MissingSymbol { line: 4 });
    assert_eq!(
        warnings[2],
        LoadWarning::UnparseableTimestamp {
            line: 5,
            value: "yesterday".to_string()
        }
    );
    assert_eq!(warnings.iter().filter(|w| w.drops_row()).count(), 2);

    let undated = &table.messages()[1];
    assert_eq!(undated.username, "d");
    assert!(undated.created_at.is_none());
}

#[test]
fn test_unknown_labels_are_kept_raw() {
    let data = format!("{HEADER}AAPL, Bullish ,0.5,a,x,2024-01-02 09:30:00\n");
    let LoadedTable { table, .. } = read_table(data.as_bytes()).unwrap();
    assert_eq!(table.messages()[0].sentiment, "Bullish");
    assert!(table.messages()[0].kind().is_none());
}

#[test]
fn test_csv_source_reads_file() {
    let file = write_csv(&format!("{HEADER}AAPL,positive,0.5,a,x,2024-01-02 09:30:00\n"));
    let source = CsvTableSource::new(file.path());
    assert_eq!(source.path(), file.path());
    assert_eq!(source.identity(), file.path().display().to_string());
    assert_eq!(source.load().unwrap().table.len(), 1);
}

#[test]
fn test_csv_source_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let source = CsvTableSource::new(dir.path().join("absent.csv"));
    assert!(matches!(source.load(), Err(SentimentError::Io(_))));
}

#[test]
fn test_loader_memoizes_table() {
    let loads = Rc::new(Cell::new(0));
    let mut loader = TableLoader::new(CountingSource::new("mem", &["AAPL"], &loads));
    assert!(!loader.is_loaded());

    let first = loader.table().unwrap();
    let second = loader.table().unwrap();

    assert!(loader.is_loaded());
    assert_eq!(loads.get(), 1);
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_loader_reload_reads_again() {
    let loads = Rc::new(Cell::new(0));
    let mut loader = TableLoader::new(CountingSource::new("mem", &["AAPL"], &loads));
    let first = loader.table().unwrap();
    let reloaded = loader.reload().unwrap();

    assert_eq!(loads.get(), 2);
    assert!(!Arc::ptr_eq(&first, &reloaded));
    assert_eq!(*first, *reloaded);
}

#[test]
fn test_loader_failed_reload_keeps_previous_table() {
    let loads = Rc::new(Cell::new(0));
    let mut loader = TableLoader::new(CountingSource::new("mem", &["AAPL"], &loads));
    let first = loader.table().unwrap();

    let mut broken = CountingSource::new("mem", &[], &loads);
    broken.fail = true;
    loader.set_source(broken);

    assert!(loader.reload().is_err());
    assert!(loader.is_loaded());
    let cached = loader.table().unwrap();
    assert!(Arc::ptr_eq(&first, &cached));
}

#[test]
fn test_loader_new_identity_triggers_load() {
    let loads = Rc::new(Cell::new(0));
    let mut loader = TableLoader::new(CountingSource::new("first", &["AAPL"], &loads));
    loader.table().unwrap();

    loader.set_source(CountingSource::new("second", &["TSLA", "MSFT"], &loads));
    let table = loader.table().unwrap();

    assert_eq!(loads.get(), 2);
    assert_eq!(table.symbols(), vec!["TSLA", "MSFT"]);
    assert_eq!(loader.source().identity(), "second");
}

#[test]
fn test_loader_exposes_warnings() {
    let file = write_csv(&format!(
        "{HEADER}AAPL,positive,0.5,a,x,not a date\nAAPL,positive,0.5,b,y,2024-01-02 09:30:00\n"
    ));
    let mut loader = TableLoader::new(CsvTableSource::new(file.path()));
    assert!(loader.warnings().is_empty());

    loader.table().unwrap();
    assert_eq!(loader.warnings().len(), 1);
    assert!(!loader.warnings()[0].drops_row());
}
