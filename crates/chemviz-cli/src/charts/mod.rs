//! Chart derivation and best-effort rendering
//!
//! [`derive`] turns a view into the five chart datasets. [`render_all`] then
//! draws each with plotters into an RGB raster. A chart that cannot be drawn
//! yields an `Err` in its [`RenderedChart`] instead of failing the whole set,
//! so the caller decides how to show the gap.

mod draw;

pub use draw::{text_available, FONT_ENV};

use crate::filter::{flow_column, parse_timestamp, time_column, type_column};
use crate::insight::pearson;
use chemviz_common::summary::mean;
use chemviz_common::table::format_number;
use chemviz_common::Table;
use image::RgbImage;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CHART_WIDTH: u32 = 640;
pub const CHART_HEIGHT: u32 = 400;

/// Number of means kept for the numeric means chart.
pub const TOP_MEANS: usize = 6;

/// The line chart is thinned out above this many points.
pub const MAX_LINE_POINTS: usize = 200;

/// Columns need more numeric values than this to enter the heatmap.
pub const MIN_HEATMAP_VALUES: usize = 3;

/// Label for a missing category value.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Why a chart could not be drawn
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("no data to plot")]
    NoData,

    #[error("not enough numeric columns")]
    NotEnoughColumns,

    #[error("pie slices must be non-negative with a positive total")]
    InvalidSlices,

    #[error("drawing failed: {0}")]
    Drawing(String),
}

/// What a chart shows
#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    Bar { labels: Vec<String>, values: Vec<f64> },
    Line { labels: Vec<String>, values: Vec<f64> },
    Pie { labels: Vec<String>, values: Vec<f64> },
    Heatmap { labels: Vec<String>, matrix: Vec<Vec<f64>> },
}

/// A derived chart, named after the PNG it exports to
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub name: &'static str,
    pub title: &'static str,
    pub data: ChartData,
}

/// Outcome of drawing one chart
#[derive(Debug, Clone)]
pub struct RenderedChart {
    pub name: &'static str,
    pub title: &'static str,
    pub outcome: Result<RgbImage, RenderError>,
}

/// Derive all charts of a view, in display order.
pub fn derive(table: &Table) -> Vec<Chart> {
    let types = type_distribution(table);
    let means = top_numeric_means(table);
    let (line_labels, line_values) = unzip(flow_over_time(table));

    let pie = if !types.is_empty() { &types } else { &means };
    let (pie_labels, pie_values) = unzip(pie.clone());
    let (type_labels, type_values) = unzip(types);
    let (mean_labels, mean_values) = unzip(means);

    let (heat_labels, matrix) = correlation_matrix(table).unwrap_or_default();

    vec![
        Chart {
            name: "bar1",
            title: "Type distribution",
            data: ChartData::Bar {
                labels: type_labels,
                values: type_values,
            },
        },
        Chart {
            name: "bar2",
            title: "Numeric means",
            data: ChartData::Bar {
                labels: mean_labels,
                values: mean_values,
            },
        },
        Chart {
            name: "line",
            title: "Flow over time",
            data: ChartData::Line {
                labels: line_labels,
                values: line_values,
            },
        },
        Chart {
            name: "pie",
            title: "Distribution",
            data: ChartData::Pie {
                labels: pie_labels,
                values: pie_values,
            },
        },
        Chart {
            name: "heatmap",
            title: "Heatmap",
            data: ChartData::Heatmap {
                labels: heat_labels,
                matrix,
            },
        },
    ]
}

fn unzip(pairs: Vec<(String, f64)>) -> (Vec<String>, Vec<f64>) {
    pairs.into_iter().unzip()
}

/// Counts per category label, most frequent first. Missing labels count as
/// [`UNKNOWN_LABEL`].
pub fn type_distribution(table: &Table) -> Vec<(String, f64)> {
    let Some(index) = type_column(table) else {
        return Vec::new();
    };

    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for cell in table.column(index) {
        let label = cell.as_label().unwrap_or_else(|| UNKNOWN_LABEL.to_string());
        *counts.entry(label).or_insert(0) += 1;
    }

    let mut pairs: Vec<(String, u64)> = counts.into_iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1));
    pairs.into_iter().map(|(label, n)| (label, n as f64)).collect()
}

/// Means of the numeric columns, largest magnitude first, at most [`TOP_MEANS`].
pub fn top_numeric_means(table: &Table) -> Vec<(String, f64)> {
    let mut means: Vec<(String, f64)> = table
        .columns()
        .iter()
        .enumerate()
        .filter_map(|(i, name)| Some((name.clone(), mean(&table.numeric_values(i))?)))
        .collect();

    means.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
    means.truncate(TOP_MEANS);
    means
}

/// Flow values ordered by time, labelled `YYYY-mm-dd HH:MM:SS`.
///
/// Rows missing either value, or with an unparseable time, are left out.
/// Non-numeric flow values plot as 0. Above [`MAX_LINE_POINTS`] points only
/// every `len / MAX_LINE_POINTS`-th point is kept.
pub fn flow_over_time(table: &Table) -> Vec<(String, f64)> {
    let (Some(flow), Some(time)) = (flow_column(table), time_column(table)) else {
        return Vec::new();
    };

    let mut points: Vec<_> = table
        .rows()
        .iter()
        .filter(|row| !row[flow].is_missing() && !row[time].is_missing())
        .filter_map(|row| {
            let at = parse_timestamp(&row[time])?;
            Some((at, row[flow].as_number().unwrap_or(0.0)))
        })
        .collect();

    // Stable, so equal timestamps keep row order.
    points.sort_by_key(|(at, _)| *at);

    let step = if points.len() > MAX_LINE_POINTS {
        (points.len() / MAX_LINE_POINTS).max(1)
    } else {
        1
    };

    points
        .into_iter()
        .step_by(step)
        .map(|(at, value)| (at.format("%Y-%m-%d %H:%M:%S").to_string(), value))
        .collect()
}

/// Pearson correlation between every pair of columns with more than
/// [`MIN_HEATMAP_VALUES`] numeric values. `None` with fewer than two.
///
/// Series are paired by position and cut to the shorter one.
pub fn correlation_matrix(table: &Table) -> Option<(Vec<String>, Vec<Vec<f64>>)> {
    let columns: Vec<(String, Vec<f64>)> = table
        .columns()
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), table.numeric_values(i)))
        .filter(|(_, values)| values.len() > MIN_HEATMAP_VALUES)
        .collect();

    if columns.len() < 2 {
        return None;
    }

    let matrix = columns
        .iter()
        .map(|(_, a)| columns.iter().map(|(_, b)| pearson(a, b)).collect())
        .collect();
    let labels = columns.into_iter().map(|(name, _)| name).collect();

    Some((labels, matrix))
}

/// Draw every chart, logging the ones that fail.
pub fn render_all(charts: &[Chart]) -> Vec<RenderedChart> {
    charts
        .iter()
        .map(|chart| {
            let outcome = render(chart);
            if let Err(e) = &outcome {
                tracing::warn!(chart = chart.name, error = %e, "Chart not rendered");
            }
            RenderedChart {
                name: chart.name,
                title: chart.title,
                outcome,
            }
        })
        .collect()
}

/// Draw one chart, with labels when a font is available.
pub fn render(chart: &Chart) -> Result<RgbImage, RenderError> {
    draw::check(&chart.data)?;

    if text_available() {
        match draw::raster(chart.title, &chart.data, true) {
            Ok(img) => return Ok(img),
            Err(e) => {
                tracing::debug!(chart = chart.name, error = %e, "Retrying chart without text");
            },
        }
    }
    draw::raster(chart.title, &chart.data, false)
}

/// Write each rendered chart to `<dir>/<name>.png`, skipping failed ones.
pub fn export_png(rendered: &[RenderedChart], dir: &Path) -> crate::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let mut written = Vec::new();
    for chart in rendered {
        let Ok(img) = &chart.outcome else {
            continue;
        };
        let path = dir.join(format!("{}.png", chart.name));
        img.save(&path)?;
        tracing::debug!(path = %path.display(), "Chart exported");
        written.push(path);
    }
    Ok(written)
}

/// Text form of a chart's data, for terminals and reports without images.
pub fn describe(chart: &Chart) -> Vec<String> {
    let pairs = |labels: &[String], values: &[f64]| -> Vec<String> {
        labels
            .iter()
            .zip(values)
            .map(|(label, value)| format!("{}: {}", label, format_number(*value)))
            .collect()
    };

    match &chart.data {
        ChartData::Bar { labels, values } | ChartData::Pie { labels, values } => {
            pairs(labels, values)
        },
        ChartData::Line { labels, values } => match (labels.first(), labels.last()) {
            (Some(first), Some(last)) => vec![format!(
                "{} points from {} to {}",
                values.len(),
                first,
                last
            )],
            _ => Vec::new(),
        },
        ChartData::Heatmap { labels, matrix } => labels
            .iter()
            .zip(matrix)
            .map(|(label, row)| {
                let cells: Vec<String> = row.iter().map(|r| format!("{:.2}", r)).collect();
                format!("{}: {}", label, cells.join(" "))
            })
            .collect(),
    }
}
