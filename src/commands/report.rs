//! The `report` command: fetch a repository's history and render its charts.

use super::Host;
use super::config::Config;
use crate::Result;
use crate::facts::{Cache, Provider, RepoSpec};
use crate::metrics::{Dashboard, Period};
use crate::reports::{ReportableRepo, generate_console, generate_csv, generate_json};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Args, ValueEnum};
use directories::BaseDirs;
use ohno::IntoAppError;
use std::fs;
use std::io::Write;

const LOG_TARGET: &str = "    report";

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    None,
    /// Only error messages
    Error,
    /// Warning and error messages
    Warn,
    /// Info, warning, and error messages
    Info,
    /// Debug and above messages
    Debug,
    /// All messages including trace
    Trace,
}

/// When to use colored console output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Always use colors
    Always,
    /// Never use colors
    Never,
    /// Use colors when writing to a terminal
    Auto,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Repository to analyze, as `owner/repo` or a repository URL
    #[arg(value_name = "REPO")]
    pub repository: String,

    /// Start of the reporting period, as YYYY-MM-DD or an RFC 3339 timestamp [default: first recorded activity]
    #[arg(long, value_name = "DATE", value_parser = parse_date)]
    pub from: Option<DateTime<Utc>>,

    /// End of the reporting period, exclusive [default: now]
    #[arg(long, value_name = "DATE", value_parser = parse_date)]
    pub to: Option<DateTime<Utc>>,

    /// Path to configuration file [default: repo-stats.toml]
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Directory where downloaded listings are cached [default: the platform cache directory]
    #[arg(long, value_name = "PATH")]
    pub cache_dir: Option<Utf8PathBuf>,

    /// GitHub personal access token
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Ignore cached listings and fetch everything again
    #[arg(long)]
    pub ignore_cached: bool,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    pub log_level: LogLevel,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,

    /// Write the charts to a JSON file
    #[arg(long, value_name = "PATH", help_heading = "Report Output")]
    pub json: Option<Utf8PathBuf>,

    /// Write the chart values to a CSV file
    #[arg(long, value_name = "PATH", help_heading = "Report Output")]
    pub csv: Option<Utf8PathBuf>,

    /// Print a summary to the console. This is the default when no other report is requested
    #[arg(long, help_heading = "Report Output")]
    pub console: bool,
}

pub async fn process_report<H: Host>(host: &mut H, args: &ReportArgs) -> Result<()> {
    init_logging(args.log_level);

    let config = Config::load(Utf8Path::new("."), args.config.as_ref())?;
    let repo: RepoSpec = args.repository.parse()?;

    let cache_dir = if let Some(cache_path) = &args.cache_dir {
        cache_path.as_std_path().to_path_buf()
    } else {
        BaseDirs::new()
            .into_app_err("could not determine cache directory")?
            .cache_dir()
            .join("repo-stats")
    };

    let now = Utc::now();
    let cache = Cache::new(cache_dir, config.cache_ttl, now, args.ignore_cached);
    let provider = Provider::new(args.github_token.as_deref(), &config.api_url, cache)?;
    let data = provider.get_repo_data(&repo).await?;

    let period = Period::new(args.from, args.to, data.collection_start(), data.collection_end());
    log::info!(target: LOG_TARGET, "Building charts for '{repo}' from {period}");

    let dashboard = Dashboard::build(&data, &config.dashboard_settings(), period)
        .into_app_err_with(|| format!("computing the metrics of '{repo}'"))?;

    let report = ReportableRepo::new(repo.to_string(), now, dashboard);
    write_reports(host, args, &report)
}

fn write_reports<H: Host>(host: &mut H, args: &ReportArgs, report: &ReportableRepo) -> Result<()> {
    let generating_reports = args.json.is_some() || args.csv.is_some();

    if args.console || !generating_reports {
        let use_colors = match args.color {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => {
                use std::io::{IsTerminal, stdout};
                stdout().is_terminal()
            }
        };

        let mut console_output = String::new();
        generate_console(report, use_colors, &mut console_output)?;
        let _ = write!(host.output(), "{console_output}");
    }

    if let Some(filename) = &args.csv {
        let mut csv_output = String::new();
        generate_csv(report, &mut csv_output)?;
        fs::write(filename, csv_output).into_app_err_with(|| format!("writing CSV report '{filename}'"))?;
    }

    if let Some(filename) = &args.json {
        let mut json_output = String::new();
        generate_json(report, &mut json_output)?;
        fs::write(filename, json_output).into_app_err_with(|| format!("writing JSON report '{filename}'"))?;
    }

    Ok(())
}

/// Initialize logger based on log level
fn init_logging(log_level: LogLevel) {
    let level = match log_level {
        LogLevel::None => return,
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    // a logger may already be installed when running more than one command in a process
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(matches!(log_level, LogLevel::Debug | LogLevel::Trace))
        .try_init();
}

/// Accept a calendar date (taken as UTC midnight) or a full RFC 3339 timestamp.
fn parse_date(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }

    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("expected YYYY-MM-DD or an RFC 3339 timestamp: {e}"))
}
