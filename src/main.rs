//! CLI entry point for the mortality explorer.
//!
//! Provides subcommands for the national report, the weekly excess map,
//! per-state charts, per-age charts and the per-state summary table.

use anyhow::Result;
use clap::{Parser, Subcommand};
use mortality_explorer::config::Settings;
use mortality_explorer::pipeline::{
    self, Dataset, Datasets, parse_state, render_ages, render_all, render_map, render_state,
    write_summary,
};
use mortality_explorer::report::SvgRenderer;
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "mortality_explorer")]
#[command(about = "Explore US excess mortality during COVID-19", long_about = None)]
struct Cli {
    /// JSON settings file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<String>,

    /// Directory charts and tables are written to
    #[arg(short = 'd', long, global = true)]
    output_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every chart and table
    Report,
    /// Render the bubble map of normalized excess for one week
    Map {
        /// Weeks before the latest available week (0 = latest)
        #[arg(short, long)]
        weeks_ago: Option<usize>,
    },
    /// Render cases, case-fatality and cumulative excess for one state
    State {
        /// Two-letter code or full name
        #[arg(short, long)]
        state: Option<String>,

        /// Days between cases and the deaths compared against them
        #[arg(short, long)]
        lag: Option<usize>,
    },
    /// Render weekly deaths by age group for each year
    Ages {
        /// Comma-separated calendar years
        #[arg(short, long, value_delimiter = ',')]
        years: Vec<i32>,
    },
    /// Write the per-state threshold summary
    Summary {
        /// Days between cases and the deaths compared against them
        #[arg(short, long)]
        lag: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/mortality_explorer.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("mortality_explorer.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("RUST_LOG")
                .from_env_lossy(),
        );

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::DEBUG.into())
                .with_env_var("RUST_LOG_JSON")
                .from_env_lossy(),
        );

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::resolve(cli.config.as_deref())?;
    if let Some(dir) = cli.output_dir {
        settings.output_dir = dir;
    }

    let client = pipeline::client(&settings)?;
    let renderer = SvgRenderer::new(&settings.output_dir)?;
    let output_dir = Path::new(&settings.output_dir);

    let written = match cli.command {
        Commands::Report => {
            let data = Datasets::load(&client, &settings, &Dataset::ALL).await?;
            render_all(&renderer, &data, &settings)?
        }
        Commands::Map { weeks_ago } => {
            let weeks_ago = weeks_ago.unwrap_or(settings.weeks_ago);
            let data = Datasets::load(&client, &settings, &[Dataset::Weekly, Dataset::Locations]).await?;
            vec![render_map(&renderer, &data.weekly, &data.locations, weeks_ago)?]
        }
        Commands::State { state, lag } => {
            let state = parse_state(state.as_deref().unwrap_or(&settings.state))?;
            let lag = lag.unwrap_or(settings.fatality_lag);
            let data = Datasets::load(&client, &settings, &[Dataset::Weekly, Dataset::Daily]).await?;
            render_state(&renderer, &data, state, lag)?
        }
        Commands::Ages { years } => {
            let years = if years.is_empty() { settings.years.clone() } else { years };
            let data = Datasets::load(&client, &settings, &[Dataset::Ages]).await?;
            render_ages(&renderer, &data.ages, &years, output_dir)?
        }
        Commands::Summary { lag } => {
            let lag = lag.unwrap_or(settings.fatality_lag);
            let data = Datasets::load(&client, &settings, &[Dataset::Weekly, Dataset::Daily]).await?;
            vec![write_summary(&data, lag, output_dir)?]
        }
    };

    info!(files = written.len(), output_dir = %settings.output_dir, "Finished");
    Ok(())
}
