//! Heuristic findings over a filtered view
//!
//! Checks run in a fixed order: variance of every numeric column, then
//! correlation of each numeric column with the flow column, then the trend
//! of the flow column. A numeric column is any column with at least one
//! value that coerces to a number; only those values take part.

use chemviz_common::summary::mean;
use chemviz_common::Table;
use std::fmt;

/// Correlation needs more paired values than this.
pub const MIN_CORRELATION_PAIRS: usize = 5;

/// Trend needs more flow values than this.
pub const MIN_TREND_POINTS: usize = 6;

/// |r| above this is called strong.
pub const STRONG_CORRELATION: f64 = 0.7;

/// One observation about a view
#[derive(Debug, Clone, PartialEq)]
pub enum Finding {
    NoData,
    HighVariance { column: String, variance: f64 },
    FlowCorrelation { column: String, coefficient: f64 },
    StrongCorrelation { column: String, coefficient: f64 },
    UpwardTrend,
    DownwardTrend,
    NothingSignificant,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::NoData => f.write_str("No data available for insights."),
            Finding::HighVariance { column, variance } => {
                write!(f, "High variance in {} (var={:.2}).", column, variance)
            },
            Finding::FlowCorrelation {
                column,
                coefficient,
            } => write!(f, "Corr Flow ↔ {}: {:.2}", column, coefficient),
            Finding::StrongCorrelation {
                column,
                coefficient,
            } => write!(
                f,
                "Strong correlation between Flow and {} ({:.2}).",
                column, coefficient
            ),
            Finding::UpwardTrend => f.write_str("Flow shows upward trend."),
            Finding::DownwardTrend => f.write_str("Flow shows downward trend."),
            Finding::NothingSignificant => f.write_str("No significant insights detected."),
        }
    }
}

/// Run every check over `table`.
///
/// Never empty: an empty table gives [`Finding::NoData`], and a table where
/// no check fires gives [`Finding::NothingSignificant`].
pub fn findings(table: &Table) -> Vec<Finding> {
    if table.is_empty() {
        return vec![Finding::NoData];
    }

    let numeric: Vec<(&str, Vec<f64>)> = table
        .columns()
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), table.numeric_values(i)))
        .filter(|(_, values)| !values.is_empty())
        .collect();

    let mut out = Vec::new();

    for (column, values) in &numeric {
        let (Some(avg), Some(variance)) = (mean(values), variance(values)) else {
            continue;
        };
        if variance > (avg.abs() + 1.0) * 10.0 {
            out.push(Finding::HighVariance {
                column: column.to_string(),
                variance,
            });
        }
    }

    let flow = numeric
        .iter()
        .position(|(name, _)| name.to_lowercase().contains("flow"));

    if let Some(flow_index) = flow {
        let flow_values = &numeric[flow_index].1;

        for (i, (column, values)) in numeric.iter().enumerate() {
            if i == flow_index {
                continue;
            }
            // Pairs by position: the shorter series decides the length.
            let n = flow_values.len().min(values.len());
            if n <= MIN_CORRELATION_PAIRS {
                continue;
            }
            let coefficient = pearson(&flow_values[..n], &values[..n]);
            out.push(Finding::FlowCorrelation {
                column: column.to_string(),
                coefficient,
            });
            if coefficient.abs() > STRONG_CORRELATION {
                out.push(Finding::StrongCorrelation {
                    column: column.to_string(),
                    coefficient,
                });
            }
        }

        if flow_values.len() > MIN_TREND_POINTS {
            match slope(flow_values) {
                Some(m) if m > 0.0 => out.push(Finding::UpwardTrend),
                Some(m) if m < 0.0 => out.push(Finding::DownwardTrend),
                _ => {},
            }
        }
    }

    if out.is_empty() {
        out.push(Finding::NothingSignificant);
    }
    out
}

/// Population variance.
pub fn variance(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    let var = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    var.is_finite().then_some(var)
}

/// Pearson correlation of two equally long series. Degenerate input is 0.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    let (Some(mx), Some(my)) = (mean(&xs[..n]), mean(&ys[..n])) else {
        return 0.0;
    };

    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (x, y) in xs.iter().zip(ys).take(n) {
        cov += (x - mx) * (y - my);
        vx += (x - mx).powi(2);
        vy += (y - my).powi(2);
    }

    let r = cov / (vx * vy).sqrt();
    if r.is_finite() {
        r.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Least-squares slope of `values` against their index. Exactly 0 for a
/// constant series, whatever rounding the mean picks up.
pub fn slope(values: &[f64]) -> Option<f64> {
    let (first, rest) = values.split_first()?;
    if rest.is_empty() {
        return None;
    }
    if rest.iter().all(|v| v == first) {
        return Some(0.0);
    }
    let n = values.len() as f64;
    let mx = (n - 1.0) / 2.0;
    let my = mean(values)?;

    let (num, den) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, y)| {
            let dx = i as f64 - mx;
            (num + dx * (y - my), den + dx * dx)
        });

    let m = num / den;
    m.is_finite().then_some(m)
}
