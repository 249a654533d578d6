use mortality_explorer::aggregate::lag_ratio;
use mortality_explorer::analysis::{
    WeeklySelection, age_totals, case_fatality, latest_case_fatality, map_snapshot, select_weekly,
    state_summary,
};
use mortality_explorer::config::Settings;
use mortality_explorer::error::SchemaError;
use mortality_explorer::fetch::BasicClient;
use mortality_explorer::parser::parse_table;
use mortality_explorer::pipeline::{Dataset, Datasets, render_all, render_map};
use mortality_explorer::records::{State, WeeklyMortalityRecord};
use mortality_explorer::report::SvgRenderer;
use std::path::Path;
use tempfile::TempDir;

fn fixture(name: &str) -> String {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

fn settings(output_dir: &Path) -> Settings {
    Settings {
        excess_deaths_url: fixture("weekly_excess.csv"),
        age_deaths_url: fixture("deaths_by_age.csv"),
        daily_cases_url: fixture("daily_cases.csv"),
        output_dir: output_dir.to_string_lossy().into_owned(),
        state: "IA".to_string(),
        years: vec![2020, 2021],
        ..Settings::default()
    }
}

async fn load_all(settings: &Settings) -> Datasets {
    Datasets::load(&BasicClient::new().unwrap(), settings, &Dataset::ALL)
        .await
        .expect("Failed to load fixtures")
}

#[tokio::test]
async fn test_fixtures_load() {
    let tmp = TempDir::new().unwrap();
    let data = load_all(&settings(tmp.path())).await;

    assert_eq!(data.weekly.len(), 15);
    // All Ages and All Sexes roll-ups dropped
    assert_eq!(data.ages.len(), 5);
    assert_eq!(data.daily.len(), 8);
    assert!(data.daily.iter().any(|r| r.state == State::Micronesia));
    assert!(data.locations.iter().any(|l| l.state == State::Ohio));
}

#[tokio::test]
async fn test_selection_is_exact_subset() {
    let tmp = TempDir::new().unwrap();
    let data = load_all(&settings(tmp.path())).await;

    let selected = select_weekly(&data.weekly, WeeklySelection::default());

    let expected: Vec<WeeklyMortalityRecord> = data
        .weekly
        .iter()
        .filter(|r| {
            r.mortality_type == WeeklySelection::default().mortality_type
                && r.outcome == WeeklySelection::default().outcome
                && r.state != State::UnitedStates
        })
        .cloned()
        .collect();
    assert_eq!(selected.len(), 6);
    assert_eq!(selected, expected);
}

#[tokio::test]
async fn test_summary_counts_weeks_above_threshold() {
    let tmp = TempDir::new().unwrap();
    let data = load_all(&settings(tmp.path())).await;

    let rows = select_weekly(&data.weekly, WeeklySelection::default());
    let fatality = latest_case_fatality(&data.daily, 2);
    let summary = state_summary(&rows, &fatality);

    assert_eq!(summary.len(), 2);
    let ohio = &summary[0];
    assert_eq!(ohio.state, State::Ohio);
    assert_eq!(ohio.weeks, 3);
    assert_eq!(ohio.weeks_exceeding_threshold, 1);
    assert_eq!(ohio.observed, 340.0);

    let texas = &summary[1];
    assert_eq!(texas.state, State::Texas);
    assert_eq!(texas.weeks_exceeding_threshold, 2);
    assert_eq!(texas.case_fatality_pct, None);
}

#[tokio::test]
async fn test_case_fatality_lag_ratio() {
    let tmp = TempDir::new().unwrap();
    let data = load_all(&settings(tmp.path())).await;

    assert_eq!(lag_ratio(&[0.0, 0.0, 10.0], &[5.0, 5.0, 5.0], 2), vec![0.0, 0.0, 200.0]);

    // 7-day sums of cases are 5, 10, 15; deaths 0, 0, 10
    let iowa = case_fatality(&data.daily, State::Iowa, 2);
    assert_eq!(iowa.values(), vec![0.0, 0.0, 200.0]);

    let latest = latest_case_fatality(&data.daily, 2);
    let iowa_latest = latest.iter().find(|(s, _)| *s == State::Iowa).map(|(_, v)| *v);
    assert_eq!(iowa_latest, Some(200.0));
}

#[tokio::test]
async fn test_age_totals_per_year() {
    let tmp = TempDir::new().unwrap();
    let data = load_all(&settings(tmp.path())).await;

    let totals = age_totals(&data.ages, &[2020, 2021]);
    let flat: Vec<(i32, &str, f64)> = totals
        .iter()
        .map(|t| (t.year, t.age_group, t.covid_19_deaths))
        .collect();

    assert_eq!(
        flat,
        vec![
            (2020, "Under 1 year", 0.0),
            (2020, "85 years and over", 22.0),
            (2021, "65-74 years", 3.0),
            (2021, "85 years and over", 5.0),
        ]
    );
}

#[tokio::test]
async fn test_map_snapshot_out_of_range() {
    let tmp = TempDir::new().unwrap();
    let data = load_all(&settings(tmp.path())).await;
    let rows = select_weekly(&data.weekly, WeeklySelection::default());

    let latest = map_snapshot(&rows, &data.locations, 0);
    assert_eq!(latest.bubbles.len(), 2);
    assert!(latest.bubbles.iter().all(|b| b.size >= 0.0));

    let empty = map_snapshot(&rows, &data.locations, 10);
    assert!(empty.week.is_none());
    assert!(empty.bubbles.is_empty());

    // Still writes a placeholder chart
    let renderer = SvgRenderer::new(tmp.path()).unwrap();
    let path = render_map(&renderer, &data.weekly, &data.locations, 10).unwrap();
    assert!(path.exists());
}

#[tokio::test]
async fn test_render_all_writes_every_output() {
    let tmp = TempDir::new().unwrap();
    let settings = settings(tmp.path());
    let data = load_all(&settings).await;
    let renderer = SvgRenderer::new(&settings.output_dir).unwrap();

    let written = render_all(&renderer, &data, &settings).unwrap();

    for name in [
        "national_excess.svg",
        "states_exceeding.svg",
        "excess_map_0.svg",
        "ia_cases_deaths.svg",
        "ia_case_fatality.svg",
        "ia_cumulative_excess.svg",
        "ages_2020.svg",
        "ages_2021.svg",
        "age_totals.csv",
        "state_summary.csv",
    ] {
        let path = tmp.path().join(name);
        assert!(path.exists(), "missing {name}");
        assert!(written.contains(&path), "not reported: {name}");
    }
}

#[test]
fn test_unknown_state_is_schema_error() {
    let csv = "\
Week Ending Date,State,Observed Number,Upper Bound Threshold,Exceeds Threshold,Average Expected Count,Excess Lower Estimate,Excess Higher Estimate,Type,Outcome
2020-04-04,Atlantis,100,120,false,90,0,10,Predicted (weighted),All causes
";
    let table = parse_table(csv.as_bytes()).unwrap();
    let err = WeeklyMortalityRecord::from_table(&table).unwrap_err();

    assert!(matches!(err, SchemaError::UnknownCategory { row: 0, .. }));
}
