use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use stocktwits_sentiment::config::AppConfig;
use stocktwits_sentiment::loader::{CsvTableSource, TableLoader};
use stocktwits_sentiment::logging::{init_logging, OperationTimer};
use stocktwits_sentiment::models::{OutputFormat, Sentiment, SortKey, TimeWindow};
use stocktwits_sentiment::report::{export_view, format_message_line, write_summary};
use stocktwits_sentiment::session::{ControlEvent, DashboardSession, DashboardSettings};
use stocktwits_sentiment::validation::InputValidator;
use stocktwits_sentiment::SystemClock;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (toml, yaml or json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// CSV export to read, overrides data.csv_path
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the symbols present in the export
    Symbols,
    /// Show counts, percentages and the daily series for a symbol
    Summary {
        /// Symbol to show (defaults to the configured or first symbol)
        #[arg(short, long)]
        symbol: Option<String>,

        /// Series window in days: 2, 10 or 30
        #[arg(short, long)]
        window: Option<TimeWindow>,
    },
    /// List the messages of one sentiment for a symbol
    Messages {
        /// Symbol to show (defaults to the configured or first symbol)
        #[arg(short, long)]
        symbol: Option<String>,

        /// positive, neutral or negative
        #[arg(long)]
        sentiment: Sentiment,

        /// recency or score
        #[arg(long)]
        sort: Option<SortKey>,

        /// Maximum number of messages
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Export the full dashboard view for a symbol
    Export {
        /// Symbol to export (defaults to the configured or first symbol)
        #[arg(short, long)]
        symbol: Option<String>,

        /// Series window in days: 2, 10 or 30
        #[arg(short, long)]
        window: Option<TimeWindow>,

        /// Output format (txt, csv or json)
        #[arg(short, long, default_value = "txt")]
        format: OutputFormat,

        /// Output directory
        #[arg(short, long, default_value = "./output")]
        output_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load_from(cli.config.as_deref()).context("Failed to load configuration")?;

    // Initialize logging
    let log_file = config.logging.file_path.as_ref().map(PathBuf::from);
    let _log_guard = init_logging(Some(&config.get_log_level()), log_file.as_deref(), config.json_logs())?;

    info!("Starting sentiment-dashboard");

    let data_path = cli.data.clone().unwrap_or_else(|| config.data_path());
    InputValidator::validate_data_path(&data_path)?;

    let mut settings = config.dashboard_settings()?;
    let theme = config.theme()?;

    let timer = OperationTimer::new("command");
    match cli.command {
        Commands::Symbols => {
            let session = open_session(&data_path, settings)?;
            let mut out = std::io::stdout().lock();
            for symbol in session.symbols() {
                writeln!(out, "{symbol}")?;
            }
        },
        Commands::Summary { symbol, window } => {
            if let Some(window) = window {
                settings.window = window;
            }
            let mut session = open_session(&data_path, settings)?;
            select_symbol(&mut session, symbol)?;
            write_summary(session.view(), theme, &mut std::io::stdout().lock())?;
        },
        Commands::Messages {
            symbol,
            sentiment,
            sort,
            limit,
        } => {
            if let Some(limit) = limit {
                InputValidator::validate_bucket_limit(limit)?;
                settings.bucket_limit = Some(limit);
            }
            let mut session = open_session(&data_path, settings)?;
            select_symbol(&mut session, symbol)?;
            if let Some(key) = sort {
                session.apply(ControlEvent::SelectSort { sentiment, key })?;
            }

            let mut out = std::io::stdout().lock();
            for message in session.view().buckets.get(sentiment) {
                writeln!(out, "{}", format_message_line(message))?;
            }
        },
        Commands::Export {
            symbol,
            window,
            format,
            output_dir,
        } => {
            InputValidator::validate_file_path(&output_dir)?;
            if let Some(window) = window {
                settings.window = window;
            }
            let mut session = open_session(&data_path, settings)?;
            select_symbol(&mut session, symbol)?;

            let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
            let files = export_view(session.view(), format, theme, &output_dir, &timestamp)?;
            let mut out = std::io::stdout().lock();
            for file in files {
                writeln!(out, "{}", file.display())?;
            }
        },
    }
    timer.finish();

    Ok(())
}

fn open_session(
    data_path: &std::path::Path,
    settings: DashboardSettings,
) -> Result<DashboardSession<CsvTableSource>> {
    let loader = TableLoader::new(CsvTableSource::new(data_path));
    let session = DashboardSession::new(loader, SystemClock, settings)
        .with_context(|| format!("Failed to load {}", data_path.display()))?;

    let skipped = session.warnings().iter().filter(|w| w.drops_row()).count();
    if !session.warnings().is_empty() {
        warn!(
            warnings = session.warnings().len(),
            skipped_rows = skipped,
            "Input contained rows with problems"
        );
    }
    Ok(session)
}

fn select_symbol(session: &mut DashboardSession<CsvTableSource>, symbol: Option<String>) -> Result<()> {
    if let Some(symbol) = symbol {
        session
            .apply(ControlEvent::SelectSymbol(symbol.clone()))
            .with_context(|| format!("Cannot select symbol {symbol}"))?;
    }
    Ok(())
}
