//! The end-to-end run: fetch, clean, validate, persist, evaluate, dispatch, archive.
//!
//! Every collaborator is injected through [`PipelineContext`], so a run can be driven
//! entirely from fixtures. A run never panics or returns an error: failures are
//! reported and folded into an [`RunStatus::Error`] summary.

use crate::alerts::condition::{build_default_conditions, check_all_conditions};
use crate::alerts::notifier::Notifier;
use crate::alerts::transport::Transport;
use crate::error::PipelineError;
use crate::extract::client::{ForecastWindow, WeatherSource};
use crate::extract::response::parse_weather_response;
use crate::load::storage::DataStorage;
use crate::reporting::{log_execution_summary, Reporter};
use crate::settings::Settings;
use crate::transform::cleaner::{clean, enrich};
use crate::transform::stats::compute_daily_stats;
use crate::transform::validator::validate;
use crate::types::frequency::Frequency;
use bon::Builder;
use chrono::{Local, NaiveDate};
use std::error::Error as _;
use std::fmt;
use std::time::{Duration, Instant};

const RAW_SOURCE: &str = "weather_forecast";
const PROCESSED_NAME: &str = "weather_processed";

/// Overall outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    /// Completed, and at least one condition triggered.
    Alerts,
    Error,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunStatus::Success => "SUCCESS",
            RunStatus::Alerts => "ALERTS",
            RunStatus::Error => "ERROR",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub status: RunStatus,
    pub records_processed: usize,
    pub alerts_triggered: usize,
    pub duration: Duration,
}

impl RunSummary {
    /// Process exit code: alerts are not a failure.
    pub fn exit_code(&self) -> u8 {
        match self.status {
            RunStatus::Success | RunStatus::Alerts => 0,
            RunStatus::Error => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Skip persistence and archival and notify on the console only.
    pub dry_run: bool,
    pub archive_after_days: u64,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            archive_after_days: 30,
        }
    }
}

/// Collaborators for one run.
///
/// # Examples
///
/// ```no_run
/// use weather_alerts::{
///     run_pipeline, LogReporter, NetworkTransport, OpenMeteoClient, PipelineContext,
///     PipelineOptions, Settings,
/// };
///
/// # fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = Settings::from_env()?;
/// let source = OpenMeteoClient::builder().build()?;
/// let transport = NetworkTransport::new()?;
/// let reporter = LogReporter::default();
///
/// let context = PipelineContext::builder()
///     .settings(&settings)
///     .source(&source)
///     .transport(&transport)
///     .reporter(&reporter)
///     .build();
/// let summary = run_pipeline(&context, &PipelineOptions::default());
/// std::process::exit(summary.exit_code().into());
/// # }
/// ```
#[derive(Builder)]
pub struct PipelineContext<'a> {
    settings: &'a Settings,
    source: &'a dyn WeatherSource,
    transport: &'a dyn Transport,
    reporter: &'a dyn Reporter,
    /// The day to fetch. Defaults to the local date.
    #[builder(default = Local::now().date_naive())]
    today: NaiveDate,
}

#[derive(Debug, Default)]
struct Progress {
    records_processed: usize,
    alerts_triggered: usize,
}

/// Runs the pipeline once and logs the execution summary.
pub fn run_pipeline(context: &PipelineContext<'_>, options: &PipelineOptions) -> RunSummary {
    let started = Instant::now();
    let reporter = context.reporter;
    let mut progress = Progress::default();

    let status = match execute(context, options, &mut progress) {
        Ok(status) => status,
        Err(e) => {
            report_error(reporter, &e);
            progress.alerts_triggered = 0;
            RunStatus::Error
        }
    };

    let summary = RunSummary {
        status,
        records_processed: progress.records_processed,
        alerts_triggered: progress.alerts_triggered,
        duration: started.elapsed(),
    };
    log_execution_summary(reporter, &summary);
    summary
}

fn execute(
    context: &PipelineContext<'_>,
    options: &PipelineOptions,
    progress: &mut Progress,
) -> Result<RunStatus, PipelineError> {
    let settings = context.settings;
    let reporter = context.reporter;

    reporter.info(&format!("🚀 Starting pipeline for {}", settings.location_name));
    reporter.info(&format!(
        "🌏 Coordinates: ({}, {})",
        settings.location.latitude(),
        settings.location.longitude()
    ));
    reporter.info(&format!("Dry run: {}", options.dry_run));

    let response = context.source.fetch(
        settings.location,
        ForecastWindow::Day(context.today),
        Frequency::Hourly,
    )?;
    let raw = parse_weather_response(
        &response,
        &settings.location_name,
        Frequency::Hourly,
        context.today,
    )?;
    reporter.info(&format!("Fetched {} records", raw.height()));
    if raw.is_empty() {
        return Err(PipelineError::NoData);
    }

    let batch = enrich(clean(raw.clone(), reporter)?)?;
    let validation = validate(&batch, reporter);
    if !validation.is_valid {
        return Err(PipelineError::InvalidData(validation.errors));
    }
    progress.records_processed = batch.height();

    let storage = if options.dry_run {
        reporter.info("[DRY RUN] Skipping data save");
        None
    } else {
        let storage = DataStorage::new(&settings.data_dir)?;
        storage.save_raw(&raw, RAW_SOURCE, reporter)?;
        storage.save_processed(&batch, PROCESSED_NAME, reporter)?;
        reporter.info("✅ Data saved successfully");
        Some(storage)
    };

    if let Some(stats) = compute_daily_stats(&batch)? {
        match serde_json::to_string(&stats) {
            Ok(json) => reporter.debug(&format!("Stats: {}", json)),
            Err(e) => reporter.warn(&format!("Could not serialize stats: {}", e)),
        }
    }

    let conditions = build_default_conditions(settings);
    let results = check_all_conditions(&batch, &conditions, reporter)?;
    let alerts_triggered = results.iter().filter(|result| result.triggered).count();
    progress.alerts_triggered = alerts_triggered;
    if alerts_triggered > 0 {
        reporter.warn(&format!("{} alert(s) triggered!", alerts_triggered));
    }

    if !settings.alert_enabled {
        reporter.info("Alerts disabled in configuration");
    } else if alerts_triggered > 0 {
        let notifier = if options.dry_run {
            Notifier::Console
        } else {
            Notifier::from_settings(settings)
        };
        reporter.info(&format!("Dispatching alerts via {}", notifier.channel_name()));
        let delivered = notifier.send(
            context.transport,
            &results,
            &settings.location_name,
            &batch,
            reporter,
        );
        if !delivered {
            reporter.error("❌ Failed to send notifications");
        }
    }

    if let Some(storage) = storage {
        let archived = storage.archive_old(options.archive_after_days, reporter)?;
        if archived > 0 {
            reporter.info(&format!("Archived {} old files", archived));
        }
    }

    Ok(if alerts_triggered > 0 {
        RunStatus::Alerts
    } else {
        RunStatus::Success
    })
}

fn report_error(reporter: &dyn Reporter, error: &PipelineError) {
    reporter.error(&format!("❌ Pipeline failed with error: {}", error));
    let mut source = error.source();
    while let Some(cause) = source {
        reporter.error(&format!("  caused by: {}", cause));
        source = cause.source();
    }
}
