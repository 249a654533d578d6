//! Load, analyse, render.
//!
//! Each command loads only the datasets it needs, once, then hands the typed
//! records to the synchronous analysis and rendering steps.

use crate::analysis::{
    WeeklySelection, age_breakdown, age_totals, case_fatality, cumulative_excess,
    latest_case_fatality, map_snapshot, national_excess, select_weekly, state_cases_deaths,
    state_summary, states_exceeding,
};
use crate::config::Settings;
use crate::error::SchemaError;
use crate::fetch::auth::AppToken;
use crate::fetch::{BasicClient, HttpClient, load_source};
use crate::output::{print_json, print_pretty, write_csv};
use crate::parser::{RawTable, parse_table};
use crate::records::{
    AgeMortalityRecord, Category, DEFAULT_LOCATIONS, DailyCaseRecord, LocationRecord, State,
    WeeklyMortalityRecord,
};
use crate::report::{BubbleMap, ChartRenderer, DualAxisChart, LineChart, TimeSeries};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const SUMMARY_FILE: &str = "state_summary.csv";
pub const AGE_TOTALS_FILE: &str = "age_totals.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Weekly,
    Ages,
    Daily,
    Locations,
}

impl Dataset {
    pub const ALL: [Dataset; 4] = [Dataset::Weekly, Dataset::Ages, Dataset::Daily, Dataset::Locations];
}

/// Typed records for one run. Datasets that were not requested stay empty.
#[derive(Debug, Default)]
pub struct Datasets {
    pub weekly: Vec<WeeklyMortalityRecord>,
    pub ages: Vec<AgeMortalityRecord>,
    pub daily: Vec<DailyCaseRecord>,
    pub locations: Vec<LocationRecord>,
}

impl Datasets {
    /// Loads the `wanted` datasets one after another.
    #[tracing::instrument(skip(client, settings))]
    pub async fn load<C: HttpClient>(client: &C, settings: &Settings, wanted: &[Dataset]) -> Result<Self> {
        let mut data = Datasets::default();

        for dataset in wanted {
            match dataset {
                Dataset::Weekly => {
                    data.weekly = load_records(client, &settings.excess_deaths_url, WeeklyMortalityRecord::from_table).await?;
                }
                Dataset::Ages => {
                    data.ages = load_records(client, &settings.age_deaths_url, AgeMortalityRecord::from_table).await?;
                }
                Dataset::Daily => {
                    data.daily = load_records(client, &settings.daily_cases_url, DailyCaseRecord::from_table).await?;
                }
                Dataset::Locations => {
                    data.locations = match settings.locations_path.as_deref() {
                        Some(path) => load_records(client, path, LocationRecord::from_table).await?,
                        None => decode(DEFAULT_LOCATIONS.as_bytes(), "built-in locations", LocationRecord::from_table)?,
                    };
                }
            }
        }

        info!(
            weekly = data.weekly.len(),
            ages = data.ages.len(),
            daily = data.daily.len(),
            locations = data.locations.len(),
            "Datasets loaded"
        );
        Ok(data)
    }
}

/// Builds the HTTP client, attaching the Socrata application token when one
/// is configured.
pub fn client(settings: &Settings) -> Result<Box<dyn HttpClient>> {
    let basic = BasicClient::new().context("failed to build the HTTP client")?;
    match settings.app_token.as_deref() {
        Some(token) => {
            let authed = AppToken::new(basic, token).context("SOCRATA_APP_TOKEN is not a valid header value")?;
            Ok(Box::new(authed))
        }
        None => Ok(Box::new(basic)),
    }
}

/// Resolves a state given as a two-letter code or a full name.
pub fn parse_state(raw: &str) -> Result<State> {
    State::parse_token(raw).with_context(|| format!("unknown state: {raw}"))
}

async fn load_records<C, T>(
    client: &C,
    source: &str,
    build: fn(&RawTable) -> Result<Vec<T>, SchemaError>,
) -> Result<Vec<T>>
where
    C: HttpClient,
{
    let bytes = load_source(client, source)
        .await
        .with_context(|| format!("failed to load {source}"))?;
    decode(&bytes, source, build)
}

fn decode<T>(bytes: &[u8], source: &str, build: fn(&RawTable) -> Result<Vec<T>, SchemaError>) -> Result<Vec<T>> {
    let table = parse_table(bytes).with_context(|| format!("failed to parse {source}"))?;
    let records = build(&table).with_context(|| format!("unexpected contents in {source}"))?;
    debug!(source, rows = records.len(), "Dataset decoded");
    Ok(records)
}

fn warn_if_empty(what: &str, series: &[TimeSeries]) {
    if series.iter().all(TimeSeries::is_empty) {
        warn!(what, "Selection matched no rows");
    }
}

/// National observed/expected/threshold chart and the count of states above
/// threshold per week.
#[tracing::instrument(skip_all)]
pub fn render_national<R: ChartRenderer>(renderer: &R, weekly: &[WeeklyMortalityRecord]) -> Result<Vec<PathBuf>> {
    let rows = select_weekly(weekly, WeeklySelection::default());

    let excess = national_excess(&rows);
    warn_if_empty("national excess", &excess);
    let excess_chart = renderer.line_chart(
        "national_excess",
        &LineChart {
            title: "Weekly deaths, all states",
            y_desc: "Deaths",
            series: &excess,
        },
    )?;

    let exceeding = [states_exceeding(&rows)];
    warn_if_empty("states exceeding", &exceeding);
    let exceeding_chart = renderer.line_chart(
        "states_exceeding",
        &LineChart {
            title: "States above the upper bound threshold",
            y_desc: "States",
            series: &exceeding,
        },
    )?;

    info!("National charts rendered");
    Ok(vec![excess_chart, exceeding_chart])
}

/// Bubble map of normalized excess for the week `weeks_ago` weeks before the
/// latest one.
#[tracing::instrument(skip(renderer, weekly, locations))]
pub fn render_map<R: ChartRenderer>(
    renderer: &R,
    weekly: &[WeeklyMortalityRecord],
    locations: &[LocationRecord],
    weeks_ago: usize,
) -> Result<PathBuf> {
    let rows = select_weekly(weekly, WeeklySelection::default());
    let snapshot = map_snapshot(&rows, locations, weeks_ago);
    print_pretty(&snapshot);

    let title = match snapshot.week {
        Some(week) => format!("Normalized excess deaths, week ending {week}"),
        None => {
            warn!(weeks_ago, "No week that far back");
            "Normalized excess deaths".to_string()
        }
    };

    let path = renderer.bubble_map(
        &format!("excess_map_{weeks_ago}"),
        &BubbleMap {
            title: &title,
            flag_label: "Exceeds threshold",
            bubbles: &snapshot.bubbles,
        },
    )?;

    info!(bubbles = snapshot.bubbles.len(), "Map rendered");
    Ok(path)
}

/// Cases/deaths, case-fatality and cumulative excess charts for one state.
#[tracing::instrument(skip(renderer, data, state), fields(state = %state))]
pub fn render_state<R: ChartRenderer>(renderer: &R, data: &Datasets, state: State, lag: usize) -> Result<Vec<PathBuf>> {
    let prefix = state.abbr().to_lowercase();
    let name = state.name();

    let smoothed = state_cases_deaths(&data.daily, state);
    warn_if_empty("cases and deaths", &[smoothed.cases.clone(), smoothed.deaths.clone()]);
    let cases_deaths_title = format!("{name}: new cases and deaths");
    let cases_deaths = renderer.dual_axis_chart(
        &format!("{prefix}_cases_deaths"),
        &DualAxisChart {
            title: &cases_deaths_title,
            left: &smoothed.cases,
            left_desc: "Cases (7-day sum)",
            right: &smoothed.deaths,
            right_desc: "Deaths (7-day sum)",
        },
    )?;

    let fatality = [case_fatality(&data.daily, state, lag)];
    let fatality_title = format!("{name}: deaths relative to cases {lag} days earlier");
    let fatality_chart = renderer.line_chart(
        &format!("{prefix}_case_fatality"),
        &LineChart {
            title: &fatality_title,
            y_desc: "%",
            series: &fatality,
        },
    )?;

    let rows = select_weekly(&data.weekly, WeeklySelection::default());
    let excess = cumulative_excess(&rows, state);
    warn_if_empty("cumulative excess", &excess);
    let excess_title = format!("{name}: cumulative excess deaths");
    let excess_chart = renderer.line_chart(
        &format!("{prefix}_cumulative_excess"),
        &LineChart {
            title: &excess_title,
            y_desc: "Deaths",
            series: &excess,
        },
    )?;

    info!("State charts rendered");
    Ok(vec![cases_deaths, fatality_chart, excess_chart])
}

/// One weekly chart per year plus the yearly totals table.
#[tracing::instrument(skip(renderer, ages, output_dir))]
pub fn render_ages<R: ChartRenderer>(
    renderer: &R,
    ages: &[AgeMortalityRecord],
    years: &[i32],
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(years.len() + 1);

    for year in years {
        let series = age_breakdown(ages, *year);
        warn_if_empty("age breakdown", &series);
        let title = format!("COVID-19 deaths by age group, {year}");
        written.push(renderer.line_chart(
            &format!("ages_{year}"),
            &LineChart {
                title: &title,
                y_desc: "Deaths",
                series: &series,
            },
        )?);
    }

    let totals = age_totals(ages, years);
    if totals.is_empty() {
        warn!(what = "age totals", "Selection matched no rows");
    }
    let path = output_dir.join(AGE_TOTALS_FILE);
    write_csv(&path, &totals)?;
    written.push(path);

    info!(years = years.len(), "Age charts rendered");
    Ok(written)
}

/// Writes the per-state threshold summary and logs it as JSON.
#[tracing::instrument(skip(data, output_dir))]
pub fn write_summary(data: &Datasets, lag: usize, output_dir: &Path) -> Result<PathBuf> {
    let rows = select_weekly(&data.weekly, WeeklySelection::default());
    let fatality = latest_case_fatality(&data.daily, lag);
    let summary = state_summary(&rows, &fatality);
    if summary.is_empty() {
        warn!(what = "state summary", "Selection matched no rows");
    }

    let path = output_dir.join(SUMMARY_FILE);
    write_csv(&path, &summary)?;
    print_json(&summary)?;

    info!(states = summary.len(), path = %path.display(), "Summary written");
    Ok(path)
}

/// Every chart and table for the configured state, week and years.
pub fn render_all<R: ChartRenderer>(renderer: &R, data: &Datasets, settings: &Settings) -> Result<Vec<PathBuf>> {
    let state = parse_state(&settings.state)?;
    let output_dir = Path::new(&settings.output_dir);

    let mut written = render_national(renderer, &data.weekly)?;
    written.push(render_map(renderer, &data.weekly, &data.locations, settings.weeks_ago)?);
    written.extend(render_state(renderer, data, state, settings.fatality_lag)?);
    written.extend(render_ages(renderer, &data.ages, &settings.years, output_dir)?);
    written.push(write_summary(data, settings.fatality_lag, output_dir)?);

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::SvgRenderer;
    use std::fs;
    use tempfile::TempDir;

    const WEEKLY: &str = "\
Week Ending Date,State,Observed Number,Upper Bound Threshold,Exceeds Threshold,Average Expected Count,Excess Lower Estimate,Excess Higher Estimate,Type,Outcome
2020-04-04,Ohio,100,120,false,90,0,10,Predicted (weighted),All causes
2020-04-11,Ohio,150,120,true,90,30,60,Predicted (weighted),All causes
2020-04-11,United States,9000,8000,true,7000,1000,2000,Predicted (weighted),All causes
";

    fn settings_for(dir: &TempDir) -> Settings {
        let weekly = dir.path().join("weekly.csv");
        fs::write(&weekly, WEEKLY).unwrap();
        Settings {
            excess_deaths_url: weekly.to_string_lossy().into_owned(),
            output_dir: dir.path().join("out").to_string_lossy().into_owned(),
            ..Settings::default()
        }
    }

    #[test]
    fn test_parse_state() {
        assert_eq!(parse_state("ny").unwrap(), State::NewYork);
        assert_eq!(parse_state("New York City").unwrap(), State::NewYorkCity);
        assert!(parse_state("Gondor").is_err());
    }

    #[test]
    fn test_client_builds_without_token() {
        assert!(client(&Settings::default()).is_ok());
    }

    #[test]
    fn test_client_rejects_bad_token() {
        let settings = Settings {
            app_token: Some("bad\ntoken".to_string()),
            ..Settings::default()
        };
        assert!(client(&settings).is_err());
    }

    #[tokio::test]
    async fn test_load_only_wanted_datasets() {
        let tmp = TempDir::new().unwrap();
        let settings = settings_for(&tmp);

        let data = Datasets::load(&BasicClient::new().unwrap(), &settings, &[Dataset::Weekly, Dataset::Locations])
            .await
            .unwrap();

        assert_eq!(data.weekly.len(), 3);
        assert!(data.locations.len() >= 51);
        assert!(data.ages.is_empty());
        assert!(data.daily.is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let settings = Settings {
            excess_deaths_url: "/nonexistent/weekly.csv".to_string(),
            ..Settings::default()
        };
        assert!(Datasets::load(&BasicClient::new().unwrap(), &settings, &[Dataset::Weekly]).await.is_err());
    }

    #[tokio::test]
    async fn test_summary_and_national_charts() {
        let tmp = TempDir::new().unwrap();
        let settings = settings_for(&tmp);
        let data = Datasets::load(&BasicClient::new().unwrap(), &settings, &[Dataset::Weekly]).await.unwrap();

        let renderer = SvgRenderer::new(&settings.output_dir).unwrap();
        let charts = render_national(&renderer, &data.weekly).unwrap();
        assert_eq!(charts.len(), 2);
        assert!(charts.iter().all(|p| p.exists()));

        let summary = write_summary(&data, 14, renderer.output_dir()).unwrap();
        let content = fs::read_to_string(summary).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.lines().nth(1).unwrap().starts_with("Ohio,2,1,"));
    }

    #[tokio::test]
    async fn test_render_state_without_daily_rows() {
        let tmp = TempDir::new().unwrap();
        let settings = settings_for(&tmp);
        let data = Datasets::load(&BasicClient::new().unwrap(), &settings, &[Dataset::Weekly]).await.unwrap();

        let renderer = SvgRenderer::new(&settings.output_dir).unwrap();
        let charts = render_state(&renderer, &data, State::Ohio, 14).unwrap();

        assert_eq!(charts.len(), 3);
        assert!(charts[0].ends_with("oh_cases_deaths.svg"));
        assert!(charts.iter().all(|p| p.exists()));
    }
}
