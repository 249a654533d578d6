//! Chart-ready views over the typed records.
//!
//! Every function here is pure: it takes records, filters and aggregates
//! them, and returns new series. A selection that matches nothing yields an
//! empty result rather than an error.

use crate::aggregate::{
    GroupIndex, ReduceOp, count_exceeding, cumulative_sum, exceeds, group_key, lag_ratio,
    moving_sum, normalized_excess, reduce, split, sum_by_key,
};
use crate::normalize::filter_rows;
use crate::records::{
    AgeGroup, AgeMortalityRecord, Category, DailyCaseRecord, LocationRecord, MortalityType,
    Outcome, State, WeeklyMortalityRecord,
};
use crate::report::{Bubble, TimeSeries};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;

/// Trailing window used to smooth daily reports.
pub const SMOOTHING_DAYS: usize = 7;

/// Days between a case report and the deaths attributed to it.
pub const DEFAULT_FATALITY_LAG: usize = 14;

/// Which baseline and cause-of-death rows of the weekly table to analyse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklySelection {
    pub mortality_type: MortalityType,
    pub outcome: Outcome,
}

impl Default for WeeklySelection {
    fn default() -> Self {
        Self {
            mortality_type: MortalityType::PredictedWeighted,
            outcome: Outcome::AllCauses,
        }
    }
}

/// Keeps one Type/Outcome combination and drops the national roll-up rows.
pub fn select_weekly(rows: &[WeeklyMortalityRecord], selection: WeeklySelection) -> Vec<WeeklyMortalityRecord> {
    filter_rows(rows, |r| {
        r.mortality_type == selection.mortality_type
            && r.outcome == selection.outcome
            && !r.state.is_aggregate()
    })
}

/// National observed, expected and threshold counts per week, summed over
/// the jurisdictions in `rows`.
pub fn national_excess(rows: &[WeeklyMortalityRecord]) -> Vec<TimeSeries> {
    let weeks: Vec<NaiveDate> = rows.iter().map(|r| r.week_ending_date).collect();
    let groups = group_key(&weeks);

    let column = |f: fn(&WeeklyMortalityRecord) -> f64| -> Vec<f64> {
        let values: Vec<f64> = rows.iter().map(f).collect();
        reduce(&values, &groups, ReduceOp::Sum)
    };

    vec![
        dated("Observed", &groups, column(|r| r.observed_number)),
        dated("Average expected", &groups, column(|r| r.average_expected_count)),
        dated("Upper bound threshold", &groups, column(|r| r.upper_bound_threshold)),
    ]
}

/// Number of jurisdictions flagged above their threshold, per week.
pub fn states_exceeding(rows: &[WeeklyMortalityRecord]) -> TimeSeries {
    let weeks: Vec<NaiveDate> = rows.iter().map(|r| r.week_ending_date).collect();
    let flags: Vec<bool> = rows.iter().map(|r| r.exceeds_threshold).collect();
    let groups = group_key(&weeks);
    let counts = count_exceeding(&flags, &groups)
        .into_iter()
        .map(|c| c as f64)
        .collect();

    dated("States above threshold", &groups, counts)
}

/// The weekly picture `weeks_ago` weeks before the latest week on record.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSnapshot {
    pub week: Option<NaiveDate>,
    pub bubbles: Vec<Bubble>,
}

/// One bubble per located jurisdiction for the selected week.
///
/// Bubble size is [`normalized_excess`]; the flag is the published
/// `Exceeds Threshold` value. Jurisdictions without a location are skipped.
pub fn map_snapshot(rows: &[WeeklyMortalityRecord], locations: &[LocationRecord], weeks_ago: usize) -> MapSnapshot {
    let mut weeks: Vec<NaiveDate> = rows.iter().map(|r| r.week_ending_date).collect();
    weeks.sort_unstable();
    weeks.dedup();

    let Some(week) = weeks.iter().rev().nth(weeks_ago).copied() else {
        return MapSnapshot {
            week: None,
            bubbles: Vec::new(),
        };
    };

    let positions: HashMap<State, &LocationRecord> = locations.iter().map(|l| (l.state, l)).collect();

    let mut bubbles: Vec<Bubble> = rows
        .iter()
        .filter(|r| r.week_ending_date == week)
        .filter_map(|r| {
            let loc = positions.get(&r.state)?;
            Some(Bubble {
                label: r.state.abbr().to_string(),
                latitude: loc.latitude,
                longitude: loc.longitude,
                size: normalized_excess(r.observed_number, r.upper_bound_threshold, r.average_expected_count),
                flagged: r.exceeds_threshold,
            })
        })
        .collect();
    bubbles.sort_by(|a, b| a.label.cmp(&b.label));

    MapSnapshot {
        week: Some(week),
        bubbles,
    }
}

/// Running totals of excess deaths for one jurisdiction: observed minus
/// expected, and the published lower/higher excess estimates.
pub fn cumulative_excess(rows: &[WeeklyMortalityRecord], state: State) -> Vec<TimeSeries> {
    let mut rows = filter_rows(rows, |r| r.state == state);
    rows.sort_by_key(|r| r.week_ending_date);

    let weeks: Vec<NaiveDate> = rows.iter().map(|r| r.week_ending_date).collect();
    let running = |f: fn(&WeeklyMortalityRecord) -> f64| -> Vec<(NaiveDate, f64)> {
        let values: Vec<f64> = rows.iter().map(f).collect();
        weeks.iter().copied().zip(cumulative_sum(&values)).collect()
    };

    vec![
        TimeSeries::new("Observed - expected", running(|r| r.observed_number - r.average_expected_count)),
        TimeSeries::new("Excess (lower estimate)", running(|r| r.excess_lower_estimate)),
        TimeSeries::new("Excess (higher estimate)", running(|r| r.excess_higher_estimate)),
    ]
}

/// Weekly COVID-19 deaths per age band for weeks ending in `year`, sexes
/// summed. Bands come youngest first.
pub fn age_breakdown(rows: &[AgeMortalityRecord], year: i32) -> Vec<TimeSeries> {
    let rows = filter_rows(rows, |r| r.end_week.year() == year);
    let keys: Vec<(AgeGroup, NaiveDate)> = rows.iter().map(|r| (r.age_group, r.end_week)).collect();
    let deaths: Vec<f64> = rows.iter().map(|r| r.covid_19_deaths).collect();

    let mut series: Vec<TimeSeries> = Vec::new();
    for ((group, week), total) in sum_by_key(&keys, &deaths) {
        match series.last_mut() {
            Some(s) if s.label == group.label() => s.points.push((week, total)),
            _ => series.push(TimeSeries::new(group.label(), vec![(week, total)])),
        }
    }
    series
}

/// Total COVID-19 deaths in one age band over one calendar year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeTotal {
    pub year: i32,
    pub age_group: &'static str,
    pub covid_19_deaths: f64,
}

/// Yearly totals per age band, restricted to `years`, ordered by year then
/// band.
pub fn age_totals(rows: &[AgeMortalityRecord], years: &[i32]) -> Vec<AgeTotal> {
    let rows = filter_rows(rows, |r| years.contains(&r.end_week.year()));
    let keys: Vec<(i32, AgeGroup)> = rows.iter().map(|r| (r.end_week.year(), r.age_group)).collect();
    let deaths: Vec<f64> = rows.iter().map(|r| r.covid_19_deaths).collect();

    sum_by_key(&keys, &deaths)
        .into_iter()
        .map(|((year, group), total)| AgeTotal {
            year,
            age_group: group.label(),
            covid_19_deaths: total,
        })
        .collect()
}

/// Smoothed daily cases and deaths for one jurisdiction.
#[derive(Debug, Clone, PartialEq)]
pub struct CasesDeaths {
    pub cases: TimeSeries,
    pub deaths: TimeSeries,
}

/// New cases and deaths of one jurisdiction per calendar day, from its first
/// to its last submission date. Days without a report count as zero, so a
/// positional offset of `n` is always `n` days.
#[derive(Debug)]
struct DailyTotals {
    days: Vec<NaiveDate>,
    cases: Vec<f64>,
    deaths: Vec<f64>,
}

fn daily_totals(rows: &[DailyCaseRecord]) -> DailyTotals {
    let dates: Vec<NaiveDate> = rows.iter().map(|r| r.submission_date).collect();
    let cases: Vec<f64> = rows.iter().map(|r| r.new_case).collect();
    let deaths: Vec<f64> = rows.iter().map(|r| r.new_death).collect();

    let groups = group_key(&dates);
    let reported_cases = reduce(&cases, &groups, ReduceOp::Sum);
    let reported_deaths = reduce(&deaths, &groups, ReduceOp::Sum);

    let mut totals = DailyTotals {
        days: Vec::new(),
        cases: Vec::new(),
        deaths: Vec::new(),
    };
    let (Some(first), Some(last)) = (groups.keys().first(), groups.keys().last()) else {
        return totals;
    };

    let mut next = 0;
    for day in first.iter_days().take_while(|d| d <= last) {
        totals.days.push(day);
        if groups.keys().get(next) == Some(&day) {
            totals.cases.push(reported_cases[next]);
            totals.deaths.push(reported_deaths[next]);
            next += 1;
        } else {
            totals.cases.push(0.0);
            totals.deaths.push(0.0);
        }
    }
    totals
}

/// Seven-day trailing sums of new cases and new deaths per calendar day.
pub fn state_cases_deaths(rows: &[DailyCaseRecord], state: State) -> CasesDeaths {
    let rows = filter_rows(rows, |r| r.state == state);
    let totals = daily_totals(&rows);

    let smoothed = |label: &str, values: &[f64]| {
        TimeSeries::new(
            label,
            totals
                .days
                .iter()
                .copied()
                .zip(moving_sum(values, SMOOTHING_DAYS))
                .collect(),
        )
    };

    CasesDeaths {
        cases: smoothed("New cases (7-day sum)", &totals.cases),
        deaths: smoothed("New deaths (7-day sum)", &totals.deaths),
    }
}

/// Seven-day deaths as a percentage of the seven-day cases `lag` days
/// earlier.
pub fn case_fatality(rows: &[DailyCaseRecord], state: State, lag: usize) -> TimeSeries {
    let smoothed = state_cases_deaths(rows, state);
    let ratio = lag_ratio(&smoothed.deaths.values(), &smoothed.cases.values(), lag);
    let points = smoothed
        .deaths
        .points
        .iter()
        .map(|(d, _)| *d)
        .zip(ratio)
        .collect();

    TimeSeries::new(format!("Deaths / cases {lag} days earlier (%)"), points)
}

/// Latest cumulative case-fatality ratio per jurisdiction: cumulative deaths
/// over the cumulative cases `lag` days before the last report.
pub fn latest_case_fatality(rows: &[DailyCaseRecord], lag: usize) -> Vec<(State, f64)> {
    let mut states: Vec<State> = rows.iter().map(|r| r.state).collect();
    states.sort_unstable();
    states.dedup();

    let mut keys: Vec<State> = Vec::new();
    let mut cases: Vec<f64> = Vec::new();
    let mut deaths: Vec<f64> = Vec::new();
    for state in states {
        let totals = daily_totals(&filter_rows(rows, |r| r.state == state));
        keys.extend(std::iter::repeat_n(state, totals.days.len()));
        cases.extend(totals.cases);
        deaths.extend(totals.deaths);
    }
    let groups = group_key(&keys);
    let running = |values: &[f64]| -> Vec<f64> {
        split(values, &groups)
            .iter()
            .flat_map(|g| cumulative_sum(g))
            .collect()
    };
    let cumulative_cases = running(&cases);
    let cumulative_deaths = running(&deaths);

    let ratios = reduce(
        &cumulative_deaths,
        &groups,
        ReduceOp::LagRatio {
            denominator: &cumulative_cases,
            lag,
        },
    );

    groups.keys().iter().copied().zip(ratios).collect()
}

/// Per-jurisdiction totals over the whole weekly history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSummary {
    pub state: State,
    pub weeks: usize,
    pub weeks_exceeding_threshold: usize,
    pub observed: f64,
    pub expected: f64,
    pub excess_lower_estimate: f64,
    pub excess_higher_estimate: f64,
    pub case_fatality_pct: Option<f64>,
}

/// Summarises each jurisdiction in `rows`, ascending by state. A week counts
/// as exceeding when its observed count is strictly above the threshold.
/// `fatality` supplies the optional case-fatality column.
pub fn state_summary(rows: &[WeeklyMortalityRecord], fatality: &[(State, f64)]) -> Vec<StateSummary> {
    let states: Vec<State> = rows.iter().map(|r| r.state).collect();
    let groups = group_key(&states);

    let flags: Vec<bool> = rows
        .iter()
        .map(|r| exceeds(r.observed_number, r.upper_bound_threshold))
        .collect();
    let exceeding = count_exceeding(&flags, &groups);
    let weeks = count_exceeding(&vec![true; rows.len()], &groups);

    let total = |f: fn(&WeeklyMortalityRecord) -> f64| -> Vec<f64> {
        let values: Vec<f64> = rows.iter().map(f).collect();
        reduce(&values, &groups, ReduceOp::Sum)
    };
    let observed = total(|r| r.observed_number);
    let expected = total(|r| r.average_expected_count);
    let lower = total(|r| r.excess_lower_estimate);
    let higher = total(|r| r.excess_higher_estimate);

    let fatality: HashMap<State, f64> = fatality.iter().copied().collect();

    groups
        .keys()
        .iter()
        .enumerate()
        .map(|(i, state)| StateSummary {
            state: *state,
            weeks: weeks[i],
            weeks_exceeding_threshold: exceeding[i],
            observed: observed[i],
            expected: expected[i],
            excess_lower_estimate: lower[i],
            excess_higher_estimate: higher[i],
            case_fatality_pct: fatality.get(state).copied(),
        })
        .collect()
}

fn dated(label: &str, groups: &GroupIndex<NaiveDate>, values: Vec<f64>) -> TimeSeries {
    TimeSeries::new(label, groups.keys().iter().copied().zip(values).collect())
}
