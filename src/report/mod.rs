//! Chart rendering.
//!
//! [`ChartRenderer`] is the seam between the analysis and the drawing
//! library; [`SvgRenderer`] implements it with plotters.

mod svg;

pub use svg::SvgRenderer;

use anyhow::Result;
use chrono::NaiveDate;
use std::path::PathBuf;

/// A named sequence of dated values.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    pub label: String,
    pub points: Vec<(NaiveDate, f64)>,
}

impl TimeSeries {
    pub fn new(label: impl Into<String>, points: Vec<(NaiveDate, f64)>) -> Self {
        Self {
            label: label.into(),
            points,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }
}

/// One marker on a bubble map.
#[derive(Debug, Clone, PartialEq)]
pub struct Bubble {
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Magnitude metric; drives the marker radius.
    pub size: f64,
    /// Categorical flag; drives the marker colour.
    pub flagged: bool,
}

/// Several series sharing one date axis and one value axis.
pub struct LineChart<'a> {
    pub title: &'a str,
    pub y_desc: &'a str,
    pub series: &'a [TimeSeries],
}

/// Two series in different units on one date axis.
pub struct DualAxisChart<'a> {
    pub title: &'a str,
    pub left: &'a TimeSeries,
    pub left_desc: &'a str,
    pub right: &'a TimeSeries,
    pub right_desc: &'a str,
}

pub struct BubbleMap<'a> {
    pub title: &'a str,
    pub flag_label: &'a str,
    pub bubbles: &'a [Bubble],
}

/// Renders charts to some output, returning where each one was written.
pub trait ChartRenderer {
    fn line_chart(&self, name: &str, chart: &LineChart<'_>) -> Result<PathBuf>;

    fn dual_axis_chart(&self, name: &str, chart: &DualAxisChart<'_>) -> Result<PathBuf>;

    fn bubble_map(&self, name: &str, chart: &BubbleMap<'_>) -> Result<PathBuf>;
}
