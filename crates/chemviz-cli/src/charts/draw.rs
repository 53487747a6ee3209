//! Chart drawing on an in-memory plotters bitmap.
//!
//! Titles, tick labels and legends need a TrueType font. The first usable one
//! from `CHEMVIZ_CHART_FONT` or the usual system locations is registered once;
//! without one, charts are drawn without text.

use super::{ChartData, RenderError, CHART_HEIGHT, CHART_WIDTH};
use image::RgbImage;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{register_font, FontStyle};
use std::f64::consts::{FRAC_PI_2, TAU};
use std::path::PathBuf;
use std::sync::OnceLock;

/// Environment variable naming a `.ttf` file for chart text.
pub const FONT_ENV: &str = "CHEMVIZ_CHART_FONT";

const FONT_FAMILY: &str = "sans-serif";

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const MARGIN: u32 = 12;

pub(super) const PALETTE: [RGBColor; 8] = [
    RGBColor(37, 99, 235),
    RGBColor(16, 185, 129),
    RGBColor(245, 158, 11),
    RGBColor(239, 68, 68),
    RGBColor(139, 92, 246),
    RGBColor(14, 165, 233),
    RGBColor(236, 72, 153),
    RGBColor(100, 116, 139),
];

static FONT_READY: OnceLock<bool> = OnceLock::new();

/// Whether chart text can be drawn. Registers a font on first call.
pub fn text_available() -> bool {
    *FONT_READY.get_or_init(|| {
        let candidates = std::env::var_os(FONT_ENV)
            .map(PathBuf::from)
            .into_iter()
            .chain(FONT_CANDIDATES.iter().map(PathBuf::from));

        for path in candidates {
            let Ok(bytes) = std::fs::read(&path) else {
                continue;
            };
            // plotters keeps registered fonts for the life of the process.
            let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
            if register_font(FONT_FAMILY, FontStyle::Normal, bytes).is_ok() {
                tracing::debug!(path = %path.display(), "Chart font registered");
                return true;
            }
        }

        tracing::warn!("No chart font found (set {}), charts have no labels", FONT_ENV);
        false
    })
}

fn drawing(e: impl std::fmt::Display) -> RenderError {
    RenderError::Drawing(e.to_string())
}

/// Check that `data` can be drawn at all.
pub(super) fn check(data: &ChartData) -> Result<(), RenderError> {
    match data {
        ChartData::Bar { values, .. } | ChartData::Line { values, .. } if values.is_empty() => {
            Err(RenderError::NoData)
        },
        ChartData::Pie { values, .. } => {
            if values.is_empty() {
                return Err(RenderError::NoData);
            }
            let total: f64 = values.iter().sum();
            if values.iter().any(|v| *v < 0.0) || total <= 0.0 {
                return Err(RenderError::InvalidSlices);
            }
            Ok(())
        },
        ChartData::Heatmap { matrix, .. } => {
            let n = matrix.len();
            if n < 2 || matrix.iter().any(|row| row.len() != n) {
                return Err(RenderError::NotEnoughColumns);
            }
            Ok(())
        },
        _ => Ok(()),
    }
}

/// Draw `data` into a fresh RGB raster, with or without text.
pub(super) fn raster(title: &str, data: &ChartData, text: bool) -> Result<RgbImage, RenderError> {
    let mut buffer = vec![0u8; (CHART_WIDTH * CHART_HEIGHT * 3) as usize];
    {
        let root =
            BitMapBackend::with_buffer(&mut buffer, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(drawing)?;

        let area = if text {
            root.titled(title, (FONT_FAMILY, 22)).map_err(drawing)?
        } else {
            root.clone()
        };

        match data {
            ChartData::Bar { labels, values } => bars(&area, labels, values, text)?,
            ChartData::Line { labels, values } => line(&area, labels, values, text)?,
            ChartData::Pie { labels, values } => pie(&area, labels, values, text)?,
            ChartData::Heatmap { labels, matrix } => heatmap(&area, labels, matrix, text)?,
        }
        root.present().map_err(drawing)?;
    }

    RgbImage::from_raw(CHART_WIDTH, CHART_HEIGHT, buffer)
        .ok_or_else(|| RenderError::Drawing("bitmap size mismatch".to_string()))
}

/// Value axis covering zero and every value, never empty.
fn value_range(values: &[f64]) -> std::ops::Range<f64> {
    let lo = values.iter().copied().fold(0.0_f64, f64::min);
    let hi = values.iter().copied().fold(0.0_f64, f64::max);
    let pad = ((hi - lo) * 0.05).max(f64::EPSILON);
    if hi > lo {
        (if lo < 0.0 { lo - pad } else { lo })..hi + pad
    } else {
        lo..lo + 1.0
    }
}

fn short(label: &str, max: usize) -> String {
    if label.chars().count() <= max {
        label.to_string()
    } else {
        let mut cut: String = label.chars().take(max.saturating_sub(1)).collect();
        cut.push('.');
        cut
    }
}

fn bars(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    labels: &[String],
    values: &[f64],
    text: bool,
) -> Result<(), RenderError> {
    let n = values.len();
    let mut builder = ChartBuilder::on(area);
    builder.margin(MARGIN);
    if text {
        builder.x_label_area_size(36).y_label_area_size(56);
    }
    let mut chart = builder
        .build_cartesian_2d((0..n).into_segmented(), value_range(values))
        .map_err(drawing)?;

    if text {
        let name_of = |x: &SegmentValue<usize>| match x {
            SegmentValue::CenterOf(i) => labels.get(*i).map(|l| short(l, 12)).unwrap_or_default(),
            _ => String::new(),
        };
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&name_of)
            .y_label_formatter(&|v: &f64| format!("{:.2}", v))
            .label_style((FONT_FAMILY, 13))
            .draw()
            .map_err(drawing)?;
    }

    chart
        .draw_series(values.iter().enumerate().map(|(i, value)| {
            let (low, high) = if *value >= 0.0 { (0.0, *value) } else { (*value, 0.0) };
            let mut bar = Rectangle::new(
                [(SegmentValue::Exact(i), low), (SegmentValue::Exact(i + 1), high)],
                PALETTE[i % PALETTE.len()].filled(),
            );
            bar.set_margin(0, 0, 6, 6);
            bar
        }))
        .map_err(drawing)?;
    Ok(())
}

fn line(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    labels: &[String],
    values: &[f64],
    text: bool,
) -> Result<(), RenderError> {
    let last = values.len().saturating_sub(1).max(1);
    let mut builder = ChartBuilder::on(area);
    builder.margin(MARGIN);
    if text {
        builder.x_label_area_size(36).y_label_area_size(56);
    }
    let mut chart = builder
        .build_cartesian_2d(0..last, value_range(values))
        .map_err(drawing)?;

    if text {
        // Timestamps are "YYYY-mm-dd HH:MM:SS"; the date is enough on the axis.
        let date_of = |i: &usize| {
            labels.get(*i).map(|l| l.chars().take(10).collect()).unwrap_or_default()
        };
        chart
            .configure_mesh()
            .x_labels(5)
            .x_label_formatter(&date_of)
            .y_label_formatter(&|v: &f64| format!("{:.2}", v))
            .x_desc("Time")
            .y_desc("Flow")
            .label_style((FONT_FAMILY, 13))
            .draw()
            .map_err(drawing)?;
    }

    let color = PALETTE[0];
    chart
        .draw_series(LineSeries::new(
            values.iter().enumerate().map(|(i, v)| (i, *v)),
            color.stroke_width(2),
        ))
        .map_err(drawing)?;
    chart
        .draw_series(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| Circle::new((i, *v), 2, color.filled())),
        )
        .map_err(drawing)?;
    Ok(())
}

/// Slices as filled polygons, clockwise from twelve o'clock, legend on the right.
fn pie(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    labels: &[String],
    values: &[f64],
    text: bool,
) -> Result<(), RenderError> {
    let (width, height) = area.dim_in_pixel();
    let (plot, legend) = if text {
        area.split_horizontally(width * 3 / 5)
    } else {
        (area.clone(), area.clone())
    };

    let (plot_w, _) = plot.dim_in_pixel();
    let center = (f64::from(plot_w) / 2.0, f64::from(height) / 2.0);
    let radius = f64::from(plot_w.min(height)) / 2.0 - f64::from(MARGIN);
    let total: f64 = values.iter().sum();

    let mut start = 0.0;
    for (i, value) in values.iter().enumerate() {
        let sweep = value / total * TAU;
        let steps = ((sweep / TAU) * 180.0).ceil().max(1.0) as usize;
        let mut outline = vec![(center.0.round() as i32, center.1.round() as i32)];
        outline.extend((0..=steps).map(|k| {
            let angle = start + sweep * k as f64 / steps as f64 - FRAC_PI_2;
            (
                (center.0 + radius * angle.cos()).round() as i32,
                (center.1 + radius * angle.sin()).round() as i32,
            )
        }));
        plot.draw(&Polygon::new(outline, PALETTE[i % PALETTE.len()].filled()))
            .map_err(drawing)?;
        start += sweep;
    }

    if text {
        let font = (FONT_FAMILY, 14).into_font();
        for (i, (label, value)) in labels.iter().zip(values).enumerate() {
            let y = 24 + i as i32 * 24;
            legend
                .draw(&Rectangle::new(
                    [(8, y), (22, y + 14)],
                    PALETTE[i % PALETTE.len()].filled(),
                ))
                .map_err(drawing)?;
            let caption = format!("{} ({:.1}%)", short(label, 18), value / total * 100.0);
            legend
                .draw(&Text::new(caption, (30, y), font.clone()))
                .map_err(drawing)?;
        }
    }
    Ok(())
}

/// Blue for -1, white for 0, red for 1.
pub(super) fn diverging(value: f64) -> RGBColor {
    let v = value.clamp(-1.0, 1.0);
    let fade = |t: f64| (255.0 * (1.0 - t)).round() as u8;
    if v >= 0.0 {
        RGBColor(255, fade(v), fade(v))
    } else {
        RGBColor(fade(-v), fade(-v), 255)
    }
}

fn heatmap(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    labels: &[String],
    matrix: &[Vec<f64>],
    text: bool,
) -> Result<(), RenderError> {
    let n = matrix.len();
    let mut builder = ChartBuilder::on(area);
    builder.margin(MARGIN);
    if text {
        builder.x_label_area_size(36).y_label_area_size(96);
    }
    let mut chart = builder
        .build_cartesian_2d((0..n).into_segmented(), (0..n).into_segmented())
        .map_err(drawing)?;

    // Row 0 at the top.
    let flip = |i: usize| n - 1 - i;

    if text {
        let column = |x: &SegmentValue<usize>| match x {
            SegmentValue::CenterOf(j) => labels.get(*j).map(|l| short(l, 12)).unwrap_or_default(),
            _ => String::new(),
        };
        let row = |y: &SegmentValue<usize>| match y {
            SegmentValue::CenterOf(i) if *i < n => {
                labels.get(flip(*i)).map(|l| short(l, 12)).unwrap_or_default()
            },
            _ => String::new(),
        };
        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(n)
            .y_labels(n)
            .x_label_formatter(&column)
            .y_label_formatter(&row)
            .label_style((FONT_FAMILY, 13))
            .draw()
            .map_err(drawing)?;
    }

    chart
        .draw_series(matrix.iter().enumerate().flat_map(|(i, cells)| {
            cells.iter().enumerate().map(move |(j, r)| {
                let y = flip(i);
                Rectangle::new(
                    [
                        (SegmentValue::Exact(j), SegmentValue::Exact(y)),
                        (SegmentValue::Exact(j + 1), SegmentValue::Exact(y + 1)),
                    ],
                    diverging(*r).filled(),
                )
            })
        }))
        .map_err(drawing)?;

    if text {
        let style = TextStyle::from((FONT_FAMILY, 14).into_font())
            .pos(Pos::new(HPos::Center, VPos::Center));
        chart
            .draw_series(matrix.iter().enumerate().flat_map(|(i, cells)| {
                let style = style.clone();
                cells.iter().enumerate().map(move |(j, r)| {
                    Text::new(
                        format!("{:.2}", r),
                        (SegmentValue::CenterOf(j), SegmentValue::CenterOf(flip(i))),
                        style.clone(),
                    )
                })
            }))
            .map_err(drawing)?;
    }
    Ok(())
}
