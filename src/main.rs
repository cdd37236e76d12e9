//! `weather-alerts`: runs the weather pipeline once and exits.
//!
//! Meant to be invoked by an external scheduler. Configuration comes from the environment,
//! optionally seeded from a `.env` file. Exit code is 0 when the run completed (with or
//! without alerts) and 1 on any error.

use chrono::Local;
use clap::Parser;
use env_logger::{Env, Target};
use std::error::Error as _;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use weather_alerts::{
    load_env_file, run_pipeline, ConfigError, LogReporter, NetworkTransport, OpenMeteoClient,
    PipelineContext, PipelineError, PipelineOptions, Settings,
};

/// Fetch today's forecast, evaluate alert thresholds and notify.
#[derive(Parser)]
#[command(name = "weather-alerts")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Run without saving data or sending real alerts
    #[arg(long)]
    dry_run: bool,

    /// Environment file to load before reading configuration (default: ./.env)
    #[arg(long, env = "WEATHER_ALERTS_ENV_FILE", value_name = "PATH")]
    env_file: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    // before the logger, so RUST_LOG may come from the file
    let env_loaded = load_env_file(cli.env_file.as_deref());
    init_logger();

    let reporter = LogReporter::default();
    let (settings, source, transport) = match setup(env_loaded) {
        Ok(parts) => parts,
        Err(e) => {
            log::error!("❌ Startup failed: {}", e);
            let mut source = e.source();
            while let Some(cause) = source {
                log::error!("  caused by: {}", cause);
                source = cause.source();
            }
            return ExitCode::from(1);
        }
    };
    settings.log_config(&reporter);

    let context = PipelineContext::builder()
        .settings(&settings)
        .source(&source)
        .transport(&transport)
        .reporter(&reporter)
        .build();
    let options = PipelineOptions {
        dry_run: cli.dry_run,
        ..PipelineOptions::default()
    };

    let summary = run_pipeline(&context, &options);
    ExitCode::from(summary.exit_code())
}

fn setup(
    env_loaded: Result<(), ConfigError>,
) -> Result<(Settings, OpenMeteoClient, NetworkTransport), PipelineError> {
    env_loaded?;
    let settings = Settings::from_env()?;
    let source = OpenMeteoClient::builder().build()?;
    let transport = NetworkTransport::new()?;
    Ok((settings, source, transport))
}

fn init_logger() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} | {:<8} | {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .target(Target::Stdout)
        .init();
}
