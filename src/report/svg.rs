//! SVG charts via plotters.
//!
//! The SVG backend keeps rendering free of system font and image codec
//! dependencies. Dates are plotted as day numbers and formatted back on the
//! axis.

use super::{BubbleMap, ChartRenderer, DualAxisChart, LineChart, TimeSeries};
use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use plotters::prelude::*;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::debug;

const SERIES_COLORS: [RGBColor; 12] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
    RGBColor(57, 59, 121),
    RGBColor(99, 121, 57),
];
const FLAGGED: RGBColor = RGBColor(214, 39, 40);
const UNFLAGGED: RGBColor = RGBColor(31, 119, 180);

const MIN_RADIUS: f64 = 4.0;
const MAX_EXTRA_RADIUS: f64 = 26.0;

/// Writes each chart as `<output_dir>/<name>.svg`.
pub struct SvgRenderer {
    output_dir: PathBuf,
    size: (u32, u32),
}

impl SvgRenderer {
    /// Creates the renderer, creating `output_dir` if needed.
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("failed to create {}", output_dir.display()))?;
        Ok(Self {
            output_dir,
            size: (1000, 600),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{name}.svg"))
    }
}

impl ChartRenderer for SvgRenderer {
    fn line_chart(&self, name: &str, chart: &LineChart<'_>) -> Result<PathBuf> {
        let path = self.path_for(name);
        let Some(xs) = x_range(chart.series.iter()) else {
            draw_no_data(&path, self.size, chart.title)?;
            return Ok(path);
        };
        let ys = y_range(chart.series.iter().flat_map(|s| s.points.iter().map(|(_, v)| *v)));

        {
            let root = SVGBackend::new(&path, self.size).into_drawing_area();
            root.fill(&WHITE)?;

            let mut ctx = ChartBuilder::on(&root)
                .caption(chart.title, ("sans-serif", 20))
                .margin(20)
                .x_label_area_size(40)
                .y_label_area_size(70)
                .build_cartesian_2d(xs, ys)?;

            ctx.configure_mesh()
                .x_labels(8)
                .x_label_formatter(&day_label)
                .y_desc(chart.y_desc)
                .draw()?;

            for (i, series) in chart.series.iter().enumerate() {
                let color = series_color(i);
                ctx.draw_series(LineSeries::new(
                    series.points.iter().map(|(d, v)| (day(d), *v)),
                    color.stroke_width(2),
                ))?
                .label(series.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
            }

            ctx.configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;

            root.present()?;
        }

        debug!(path = %path.display(), series = chart.series.len(), "Line chart written");
        Ok(path)
    }

    fn dual_axis_chart(&self, name: &str, chart: &DualAxisChart<'_>) -> Result<PathBuf> {
        let path = self.path_for(name);
        let Some(xs) = x_range([chart.left, chart.right]) else {
            draw_no_data(&path, self.size, chart.title)?;
            return Ok(path);
        };
        let left_ys = y_range(chart.left.points.iter().map(|(_, v)| *v));
        let right_ys = y_range(chart.right.points.iter().map(|(_, v)| *v));

        {
            let root = SVGBackend::new(&path, self.size).into_drawing_area();
            root.fill(&WHITE)?;

            let mut ctx = ChartBuilder::on(&root)
                .caption(chart.title, ("sans-serif", 20))
                .margin(20)
                .x_label_area_size(40)
                .y_label_area_size(70)
                .right_y_label_area_size(70)
                .build_cartesian_2d(xs.clone(), left_ys)?
                .set_secondary_coord(xs, right_ys);

            ctx.configure_mesh()
                .x_labels(8)
                .x_label_formatter(&day_label)
                .y_desc(chart.left_desc)
                .draw()?;
            ctx.configure_secondary_axes().y_desc(chart.right_desc).draw()?;

            let left_color = series_color(0);
            let right_color = series_color(3);

            ctx.draw_series(LineSeries::new(
                chart.left.points.iter().map(|(d, v)| (day(d), *v)),
                left_color.stroke_width(2),
            ))?
            .label(chart.left.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], left_color.stroke_width(2)));

            ctx.draw_secondary_series(LineSeries::new(
                chart.right.points.iter().map(|(d, v)| (day(d), *v)),
                right_color.stroke_width(2),
            ))?
            .label(chart.right.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], right_color.stroke_width(2)));

            ctx.configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;

            root.present()?;
        }

        debug!(path = %path.display(), "Dual-axis chart written");
        Ok(path)
    }

    fn bubble_map(&self, name: &str, chart: &BubbleMap<'_>) -> Result<PathBuf> {
        let path = self.path_for(name);
        if chart.bubbles.is_empty() {
            draw_no_data(&path, self.size, chart.title)?;
            return Ok(path);
        }

        let lon_range = padded_range(chart.bubbles.iter().map(|b| b.longitude), 3.0);
        let lat_range = padded_range(chart.bubbles.iter().map(|b| b.latitude), 3.0);
        let max_size = chart.bubbles.iter().map(|b| b.size).fold(0.0, f64::max);

        {
            let root = SVGBackend::new(&path, self.size).into_drawing_area();
            root.fill(&WHITE)?;

            let mut ctx = ChartBuilder::on(&root)
                .caption(chart.title, ("sans-serif", 20))
                .margin(20)
                .x_label_area_size(40)
                .y_label_area_size(50)
                .build_cartesian_2d(lon_range, lat_range)?;

            ctx.configure_mesh()
                .x_desc("Longitude")
                .y_desc("Latitude")
                .light_line_style(WHITE)
                .draw()?;

            ctx.draw_series(chart.bubbles.iter().map(|b| {
                let color = if b.flagged { FLAGGED } else { UNFLAGGED };
                Circle::new(
                    (b.longitude, b.latitude),
                    bubble_radius(b.size, max_size),
                    color.mix(0.6).filled(),
                )
            }))?;

            ctx.draw_series(chart.bubbles.iter().map(|b| {
                Text::new(
                    b.label.clone(),
                    (b.longitude, b.latitude),
                    ("sans-serif", 10).into_font().color(&BLACK),
                )
            }))?;

            ctx.draw_series(std::iter::empty::<Circle<(f64, f64), i32>>())?
                .label(chart.flag_label)
                .legend(|(x, y)| Circle::new((x + 10, y), 5, FLAGGED.mix(0.6).filled()));
            ctx.draw_series(std::iter::empty::<Circle<(f64, f64), i32>>())?
                .label(format!("Not: {}", chart.flag_label))
                .legend(|(x, y)| Circle::new((x + 10, y), 5, UNFLAGGED.mix(0.6).filled()));

            ctx.configure_series_labels()
                .position(SeriesLabelPosition::LowerRight)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;

            root.present()?;
        }

        debug!(path = %path.display(), bubbles = chart.bubbles.len(), "Bubble map written");
        Ok(path)
    }
}

fn draw_no_data(path: &Path, size: (u32, u32), title: &str) -> Result<()> {
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    root.draw(&Text::new(
        format!("{title}: no data"),
        (40, size.1 as i32 / 2),
        ("sans-serif", 20).into_font().color(&BLACK),
    ))?;
    root.present()?;
    debug!(path = %path.display(), "Empty chart written");
    Ok(())
}

fn series_color(idx: usize) -> RGBColor {
    SERIES_COLORS[idx % SERIES_COLORS.len()]
}

fn day(date: &NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce())
}

fn day_label(x: &f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Date span covered by the series, or `None` when they have no points.
fn x_range<'a>(series: impl IntoIterator<Item = &'a TimeSeries>) -> Option<Range<f64>> {
    let (lo, hi) = series
        .into_iter()
        .flat_map(|s| s.points.iter().map(|(d, _)| day(d)))
        .fold(None, |acc: Option<(f64, f64)>, x| match acc {
            None => Some((x, x)),
            Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
        })?;

    if lo == hi {
        Some(lo - 1.0..hi + 1.0)
    } else {
        Some(lo..hi)
    }
}

/// Value span anchored at zero, with headroom above the largest value.
fn y_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let span = (hi - lo).max(1.0);
    lo..hi + span * 0.1
}

fn padded_range(values: impl Iterator<Item = f64>, pad: f64) -> Range<f64> {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    (lo - pad)..(hi + pad)
}

fn bubble_radius(size: f64, max_size: f64) -> i32 {
    if max_size <= 0.0 || !size.is_finite() {
        return MIN_RADIUS as i32;
    }
    let scaled = (size.max(0.0) / max_size).sqrt() * MAX_EXTRA_RADIUS;
    (MIN_RADIUS + scaled).round() as i32
}
