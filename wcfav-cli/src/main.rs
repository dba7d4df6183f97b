mod utils;

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Result, anyhow};
use chrono_tz::Tz;
use clap::{ArgAction, Parser};
use owo_colors::OwoColorize;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use wcfav_core::WcfavError;
use wcfav_core::constants::{DEFAULT_BATCH_SIZE, DEFAULT_CALENDAR_NAME, DEFAULT_OUTPUT_FILE};
use wcfav_core::error::InvalidInputError;
use wcfav_core::favorites::parse_favorites_url;
use wcfav_core::pipeline;
use wcfav_core::remote::WordCampClient;
use wcfav_core::report::Reporter;
use wcfav_core::settings::{FailurePolicy, Settings};

use crate::utils::tui;

#[derive(Parser)]
#[command(name = "wcfav", version)]
#[command(about = "Export your favorite WordCamp sessions to an ICS calendar")]
struct Cli {
    /// Schedule URL with favorites, e.g. https://us.wordcamp.org/2025/schedule/?fav-sessions=1834,1952
    schedule_url: String,

    /// Where to write the calendar
    #[arg(short, long, default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    /// Event timezone (e.g. "Europe/Berlin"). Defaults to the site's setting.
    #[arg(long, value_parser = parse_timezone)]
    timezone: Option<Tz>,

    /// Session ids per API request
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Per-request timeout (e.g. "30s")
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Length of sessions that have no end time or duration (e.g. "45m")
    #[arg(long, value_parser = humantime::parse_duration)]
    default_duration: Option<Duration>,

    /// Skip failed batches instead of aborting
    #[arg(long)]
    best_effort: bool,

    #[arg(long, default_value = DEFAULT_CALENDAR_NAME)]
    calendar_name: String,

    #[arg(long)]
    no_color: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn settings(&self) -> Result<Settings, InvalidInputError> {
        let defaults = Settings::default();

        let default_duration = match self.default_duration {
            Some(d) => chrono::Duration::from_std(d)
                .map_err(|_| InvalidInputError::new("default session duration is out of range"))?,
            None => defaults.default_duration,
        };

        Ok(Settings {
            batch_size: self.batch_size,
            request_timeout: self.timeout.unwrap_or(defaults.request_timeout),
            timezone_override: self.timezone,
            default_duration,
            failure_policy: if self.best_effort {
                FailurePolicy::BestEffort
            } else {
                FailurePolicy::Abort
            },
            output: self.output.clone(),
            calendar_name: self.calendar_name.clone(),
            color: !self.no_color && io::stdout().is_terminal(),
            ..defaults
        })
    }
}

fn parse_timezone(name: &str) -> Result<Tz, String> {
    name.parse::<Tz>()
        .map_err(|_| format!("'{name}' is not an IANA timezone name"))
}

fn init_tracing(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_writer(io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to initialize logging: {e}"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let color = !cli.no_color && io::stderr().is_terminal();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("{e}");
    }

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if color {
                eprintln!("{} {e}", "Error:".red());
            } else {
                eprintln!("Error: {e}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let request = parse_favorites_url(&cli.schedule_url).map_err(WcfavError::from)?;
    let settings = cli.settings().map_err(WcfavError::from)?;
    settings.validate().map_err(WcfavError::from)?;

    let client = WordCampClient::new(&request.api_base, settings.request_timeout)
        .map_err(|e| anyhow!("fetch failed: {e}"))?;

    let spinner = tui::create_spinner(format!("Fetching favorites from {}", request.host()));
    let mut reporter = Reporter::new(
        tui::SpinnerAware::new(&spinner, io::stdout()),
        settings.color,
    );
    let result = pipeline::run(&client, &request, &settings, &mut reporter).await;
    spinner.finish_and_clear();

    let summary = result?;
    debug!(
        events = summary.events.len(),
        skipped = summary.skipped.len(),
        missing = summary.missing.len(),
        timezone = summary.timezone.name(),
        "run complete"
    );
    Ok(())
}
