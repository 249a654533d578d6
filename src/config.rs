//! Run settings.
//!
//! Resolved in layers: built-in defaults, then an optional JSON file, then
//! environment variables (a `.env` file is loaded by the binary first).
//! Any field may be omitted from the JSON file:
//! ```json
//! {
//!   "daily_cases_url": "data/daily_cases.csv",
//!   "state": "TX",
//!   "years": [2020, 2021]
//! }
//! ```

use crate::analysis::DEFAULT_FATALITY_LAG;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const EXCESS_DEATHS_URL: &str = "https://data.cdc.gov/api/views/xkkf-xrst/rows.csv?accessType=DOWNLOAD";
pub const AGE_DEATHS_URL: &str = "https://data.cdc.gov/api/views/vsak-wrfu/rows.csv?accessType=DOWNLOAD";
pub const DAILY_CASES_URL: &str = "https://data.cdc.gov/api/views/9mfq-cb36/rows.csv?accessType=DOWNLOAD";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Weekly excess deaths by state (URL or path).
    pub excess_deaths_url: String,
    /// COVID-19 deaths by week, sex and age (URL or path).
    pub age_deaths_url: String,
    /// Daily cases and deaths by state (URL or path).
    pub daily_cases_url: String,
    /// State centroid table; the built-in table is used when unset.
    pub locations_path: Option<String>,
    /// Socrata application token sent with remote requests.
    pub app_token: Option<String>,
    pub output_dir: String,
    /// Jurisdiction for the per-state charts, full name or abbreviation.
    pub state: String,
    /// How many weeks back from the latest week the map shows.
    pub weeks_ago: usize,
    /// Calendar years for the age breakdown.
    pub years: Vec<i32>,
    /// Days between case reports and the deaths compared against them.
    pub fatality_lag: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            excess_deaths_url: EXCESS_DEATHS_URL.to_string(),
            age_deaths_url: AGE_DEATHS_URL.to_string(),
            daily_cases_url: DAILY_CASES_URL.to_string(),
            locations_path: None,
            app_token: None,
            output_dir: "charts".to_string(),
            state: "NY".to_string(),
            weeks_ago: 0,
            years: vec![2020, 2021, 2022, 2023],
            fatality_lag: DEFAULT_FATALITY_LAG,
        }
    }
}

impl Settings {
    /// Loads settings from a JSON file at `path`; omitted fields keep their
    /// defaults.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_context(|| format!("failed to read config {path}"))?;
        let settings = serde_json::from_str(&content).with_context(|| format!("invalid config {path}"))?;
        Ok(settings)
    }

    /// Defaults, overlaid with the JSON file at `path` if given, overlaid with
    /// the process environment.
    pub fn resolve(path: Option<&str>) -> Result<Self> {
        let base = match path {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        Ok(base.with_overrides(|key| std::env::var(key).ok()))
    }

    /// Applies variables found by `lookup`:
    /// `EXCESS_DEATHS_URL`, `AGE_DEATHS_URL`, `DAILY_CASES_URL`,
    /// `STATE_LOCATIONS_PATH`, `SOCRATA_APP_TOKEN` and `OUTPUT_DIR`.
    /// Empty values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("EXCESS_DEATHS_URL") {
            self.excess_deaths_url = v;
        }
        if let Some(v) = get("AGE_DEATHS_URL") {
            self.age_deaths_url = v;
        }
        if let Some(v) = get("DAILY_CASES_URL") {
            self.daily_cases_url = v;
        }
        if let Some(v) = get("STATE_LOCATIONS_PATH") {
            self.locations_path = Some(v);
        }
        if let Some(v) = get("SOCRATA_APP_TOKEN") {
            self.app_token = Some(v);
        }
        if let Some(v) = get("OUTPUT_DIR") {
            self.output_dir = v;
        }
        self
    }
}
