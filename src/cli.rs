//! CLI definition and dispatch.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::adapters::csv_adapter::CsvCandleAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_store::{JsonAlertHistory, JsonPreferenceStore};
use crate::domain::backtest::{self, BacktestRequest};
use crate::domain::candle::clean_series;
use crate::domain::condition::ConditionConfig;
use crate::domain::error::RatewatchError;
use crate::domain::monitor::{self, AlertEvent, CooldownTracker, MonitorSettings};
use crate::domain::signal;
use crate::ports::alert_port::{AlertHistory, NotificationSink};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::HistoricalDataProvider;

#[derive(Parser, Debug)]
#[command(name = "ratewatch", about = "Price-series condition monitor and backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest from a JSON request file
    Backtest {
        #[arg(short, long)]
        request: PathBuf,
        /// Directory of per-pair candle CSV files
        #[arg(short, long)]
        data_dir: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Evaluate a condition against a pair's latest history
    Evaluate {
        /// JSON condition file
        #[arg(short, long)]
        condition: PathBuf,
        #[arg(long)]
        pair: String,
        #[arg(long, default_value_t = 365)]
        days: u32,
        #[arg(short, long)]
        data_dir: PathBuf,
    },
    /// Validate a JSON condition file
    Validate {
        #[arg(short, long)]
        condition: PathBuf,
    },
    /// Run one monitoring cycle over a preferences file
    Cycle {
        /// INI settings file with a [monitoring] section
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// JSON array of alert preferences
        #[arg(short, long)]
        preferences: PathBuf,
        /// Directory of per-pair candle CSV files; falls back to the
        /// config's [data] candle_dir
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
        /// Append triggered alerts to this JSONL file
        #[arg(long)]
        history: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            request,
            data_dir,
            output,
        } => run_backtest(&request, data_dir, output.as_deref()),
        Command::Evaluate {
            condition,
            pair,
            days,
            data_dir,
        } => run_evaluate(&condition, &pair, days, data_dir),
        Command::Validate { condition } => run_validate(&condition),
        Command::Cycle {
            config,
            preferences,
            data_dir,
            history,
        } => run_cycle(config.as_deref(), &preferences, data_dir, history),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            (&err).into()
        }
    }
}

fn load_condition(path: &Path) -> Result<ConditionConfig, RatewatchError> {
    let content = fs::read_to_string(path)?;
    let condition: ConditionConfig = serde_json::from_str(&content)?;
    condition.validate()?;
    Ok(condition)
}

fn run_backtest(
    request_path: &Path,
    data_dir: PathBuf,
    output_path: Option<&Path>,
) -> Result<(), RatewatchError> {
    let content = fs::read_to_string(request_path)?;
    let request: BacktestRequest = serde_json::from_str(&content)?;
    request.entry.validate()?;
    if let Some(exit_signal) = &request.exit.exit_signal {
        exit_signal.validate()?;
    }

    let provider = CsvCandleAdapter::new(data_dir);
    eprintln!("Backtesting {} over {} days", request.pair, request.days);
    let response = backtest::execute(&provider, &request)?;

    let json = serde_json::to_string_pretty(&response)?;
    match output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }
    Ok(())
}

fn run_evaluate(
    condition_path: &Path,
    pair: &str,
    days: u32,
    data_dir: PathBuf,
) -> Result<(), RatewatchError> {
    let condition = load_condition(condition_path)?;
    let provider = CsvCandleAdapter::new(data_dir);
    let raw = provider.fetch_candles(pair, days)?;
    let candles = clean_series(&raw);
    eprintln!("Evaluating {} on {} usable candles", pair, candles.len());

    let verdict = signal::evaluate(&candles, &condition);
    println!("{}", serde_json::to_string_pretty(&verdict)?);
    Ok(())
}

fn run_validate(condition_path: &Path) -> Result<(), RatewatchError> {
    let condition = load_condition(condition_path)?;
    println!("ok: {}", serde_json::to_string(&condition)?);
    Ok(())
}

/// Prints each alert as a JSON line; a real deployment would swap in an
/// email or webhook sink behind the same port.
struct StdoutSink;

impl NotificationSink for StdoutSink {
    fn notify(&self, event: &AlertEvent) -> Result<(), RatewatchError> {
        println!("{}", serde_json::to_string(event)?);
        Ok(())
    }
}

struct NullHistory;

impl AlertHistory for NullHistory {
    fn record(&mut self, _event: &AlertEvent) -> Result<(), RatewatchError> {
        Ok(())
    }
}

fn run_cycle(
    config_path: Option<&Path>,
    preferences_path: &Path,
    data_dir: Option<PathBuf>,
    history_path: Option<PathBuf>,
) -> Result<(), RatewatchError> {
    let config = match config_path {
        Some(path) => Some(FileConfigAdapter::from_file(path).map_err(|e| {
            RatewatchError::ConfigParse {
                file: path.display().to_string(),
                reason: e.to_string(),
            }
        })?),
        None => None,
    };

    let settings = match &config {
        Some(config) => MonitorSettings::from_config(config),
        None => MonitorSettings::default(),
    };
    if settings.cooldown_secs < 0 {
        return Err(RatewatchError::ConfigInvalid {
            section: "monitoring".into(),
            key: "cooldown_secs".into(),
            reason: "must not be negative".into(),
        });
    }

    let candle_dir = match data_dir {
        Some(dir) => dir,
        None => config
            .as_ref()
            .and_then(|c| c.get_string("data", "candle_dir"))
            .map(PathBuf::from)
            .ok_or_else(|| RatewatchError::ConfigMissing {
                section: "data".into(),
                key: "candle_dir".into(),
            })?,
    };

    let provider = CsvCandleAdapter::new(candle_dir);
    let store = JsonPreferenceStore::new(preferences_path.to_path_buf());
    let sink = StdoutSink;
    let mut history: Box<dyn AlertHistory> = match history_path {
        Some(path) => Box::new(JsonAlertHistory::new(path)),
        None => Box::new(NullHistory),
    };
    let mut tracker = CooldownTracker::new(settings.cooldown_secs);
    let now = chrono::Utc::now().timestamp();

    let outcome = monitor::run_cycle(
        &provider,
        &store,
        &sink,
        history.as_mut(),
        &mut tracker,
        &settings,
        now,
    )?;

    for (pair, reason) in &outcome.failures {
        eprintln!("warning: {pair}: {reason}");
    }
    eprintln!(
        "{} alert(s), {} failure(s)",
        outcome.alerts.len(),
        outcome.failures.len()
    );
    Ok(())
}
