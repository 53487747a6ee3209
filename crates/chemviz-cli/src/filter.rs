//! Client-side filtering of a loaded table
//!
//! Columns are found by name heuristics, first match in header order:
//!
//! - time: name equal (ignoring case) to one of [`TIME_COLUMN_NAMES`]
//! - category: name containing `type`
//! - flow: name containing `flow`
//!
//! A filter whose column does not exist is skipped. Filters compose as AND
//! and never touch the source table.

use chemviz_common::summary::mean;
use chemviz_common::{Cell, Table};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::BTreeSet;

/// Header names recognized as the time column.
pub const TIME_COLUMN_NAMES: [&str; 4] = ["timestamp", "time", "date", "datetime"];

/// Category value meaning "no category filter".
pub const ALL_CATEGORIES: &str = "All";

/// Per-label candidate columns for the averages shown with a view.
pub const VIEW_AVERAGE_CANDIDATES: [(&str, &[&str]); 3] = [
    ("flowrate_avg", &["Flowrate", "flowrate", "flow_rate", "flowRate"]),
    ("pressure_avg", &["Pressure", "pressure"]),
    ("temperature_avg", &["Temperature", "temperature", "Temp"]),
];

/// Date layouts, tried in order. Month-first wins over day-first when both
/// read, so `01/05/2024` is the fifth of January.
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%d.%m.%Y"];

/// Time-of-day layouts after the date; `%.f` also accepts no fraction.
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];

pub fn time_column(table: &Table) -> Option<usize> {
    table.find_column(|name| TIME_COLUMN_NAMES.contains(&name.to_lowercase().as_str()))
}

pub fn type_column(table: &Table) -> Option<usize> {
    table.find_column_containing("type")
}

pub fn flow_column(table: &Table) -> Option<usize> {
    table.find_column_containing("flow")
}

/// Parse a cell as a point in time. Numbers and unrecognized text are `None`.
pub fn parse_timestamp(cell: &Cell) -> Option<NaiveDateTime> {
    let Cell::Text(raw) = cell else {
        return None;
    };
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }

    let (date, time) = match raw.split_once(|c: char| c == ' ' || c == 'T') {
        Some((date, time)) => (date, Some(time.trim())),
        None => (raw, None),
    };
    let date = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date, fmt).ok())?;
    let time = match time {
        Some(time) => TIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveTime::parse_from_str(time, fmt).ok())?,
        None => NaiveTime::MIN,
    };
    Some(date.and_time(time))
}

/// Minimum value a row's numeric column must reach.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericThreshold {
    /// Substring (case-insensitive) selecting the column
    pub column: String,
    pub min: f64,
}

impl NumericThreshold {
    /// Threshold on the first flow-like column.
    pub fn flow(min: f64) -> Self {
        Self {
            column: "flow".to_string(),
            min,
        }
    }
}

/// What to keep
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub threshold: Option<NumericThreshold>,
}

impl FilterSpec {
    fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .filter(|c| !c.is_empty() && *c != ALL_CATEGORIES)
    }

    /// Whether any predicate would drop rows.
    pub fn is_active(&self) -> bool {
        self.start_date.is_some()
            || self.end_date.is_some()
            || self.category().is_some()
            || self.threshold.is_some()
    }
}

/// Rows of a table that passed a filter
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView {
    pub table: Table,
    /// Positions of the kept rows in the source table
    pub row_indices: Vec<usize>,
}

impl FilteredView {
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Apply the filter to `table`, returning the kept rows as a new table.
pub fn apply(table: &Table, spec: &FilterSpec) -> FilteredView {
    let date_col = time_column(table).filter(|_| spec.start_date.is_some() || spec.end_date.is_some());
    let category = spec.category().and_then(|label| Some((type_column(table)?, label)));
    let threshold = spec.threshold.as_ref().and_then(|t| {
        let index = table.find_column_containing(&t.column)?;
        Some((index, t.min))
    });

    let row_indices: Vec<usize> = table
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            if let Some(index) = date_col {
                let Some(date) = parse_timestamp(&row[index]).map(|dt| dt.date()) else {
                    return false;
                };
                if spec.start_date.is_some_and(|start| date < start)
                    || spec.end_date.is_some_and(|end| date > end)
                {
                    return false;
                }
            }
            if let Some((index, label)) = category {
                if row[index].as_label().as_deref() != Some(label) {
                    return false;
                }
            }
            if let Some((index, min)) = threshold {
                if !row[index].as_number().is_some_and(|v| v >= min) {
                    return false;
                }
            }
            true
        })
        .map(|(i, _)| i)
        .collect();

    tracing::debug!(
        kept = row_indices.len(),
        total = table.len(),
        "Applied filters"
    );

    FilteredView {
        table: table.select_rows(&row_indices),
        row_indices,
    }
}

/// Sorted distinct labels of the category column.
pub fn category_options(table: &Table) -> Vec<String> {
    let Some(index) = type_column(table) else {
        return Vec::new();
    };
    table
        .column(index)
        .filter_map(Cell::as_label)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Earliest and latest parseable date of the time column.
pub fn date_bounds(table: &Table) -> Option<(NaiveDate, NaiveDate)> {
    let index = time_column(table)?;
    let dates: Vec<NaiveDate> = table
        .column(index)
        .filter_map(parse_timestamp)
        .map(|dt| dt.date())
        .collect();
    Some((*dates.iter().min()?, *dates.iter().max()?))
}

/// Averages over a view, per label, `None` when no candidate column has data.
pub fn view_averages(table: &Table) -> Vec<(&'static str, Option<f64>)> {
    VIEW_AVERAGE_CANDIDATES
        .iter()
        .map(|&(label, candidates)| {
            let values = candidates
                .iter()
                .filter_map(|name| table.column_index(name))
                .map(|index| table.numeric_values(index))
                .find(|values| !values.is_empty())
                .unwrap_or_default();
            (label, mean(&values))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chemviz_common::ingest::parse_text;

    const PLANT: &str = "Equipment Type,Flowrate,Pressure,Timestamp\n\
        Pump,10,1.5,2024-01-01 08:00:00\n\
        Valve,25,2.0,2024-01-02 08:00:00\n\
        Pump,40,,2024-01-03\n\
        Pump,oops,3.0,not a date\n\
        ,55,4.0,2024-01-05T09:30:00\n";

    fn plant() -> Table {
        parse_text(PLANT).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_column_heuristics() {
        let table = plant();
        assert_eq!(type_column(&table), Some(0));
        assert_eq!(flow_column(&table), Some(1));
        assert_eq!(time_column(&table), Some(3));

        let table = parse_text("Timestamps,Created Date\n1,2\n").unwrap();
        assert_eq!(time_column(&table), None);
    }

    #[test]
    fn test_empty_spec_is_identity() {
        let table = plant();
        let view = apply(&table, &FilterSpec::default());
        assert_eq!(view.table, table);
        assert_eq!(view.row_indices, vec![0, 1, 2, 3, 4]);
        assert!(!FilterSpec::default().is_active());
    }

    #[test]
    fn test_all_category_is_identity() {
        let table = plant();
        let spec = FilterSpec {
            category: Some(ALL_CATEGORIES.to_string()),
            ..Default::default()
        };
        assert!(!spec.is_active());
        assert_eq!(apply(&table, &spec).len(), 5);
    }

    #[test]
    fn test_category_filter() {
        let table = plant();
        let spec = FilterSpec {
            category: Some("Pump".to_string()),
            ..Default::default()
        };
        let view = apply(&table, &spec);
        assert_eq!(view.row_indices, vec![0, 2, 3]);
    }

    #[test]
    fn test_date_range_excludes_unparseable() {
        let table = plant();
        let spec = FilterSpec {
            start_date: Some(ymd(2024, 1, 2)),
            ..Default::default()
        };
        let view = apply(&table, &spec);
        assert_eq!(view.row_indices, vec![1, 2, 4]);

        let spec = FilterSpec {
            start_date: Some(ymd(2024, 1, 1)),
            end_date: Some(ymd(2024, 1, 3)),
            ..Default::default()
        };
        assert_eq!(apply(&table, &spec).row_indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_date_filter_without_time_column_is_skipped() {
        let table = parse_text("Type,Flowrate\nA,1\nB,2\n").unwrap();
        let spec = FilterSpec {
            start_date: Some(ymd(2030, 1, 1)),
            ..Default::default()
        };
        assert_eq!(apply(&table, &spec).len(), 2);
    }

    #[test]
    fn test_min_flow_excludes_non_numeric() {
        let table = plant();
        let spec = FilterSpec {
            threshold: Some(NumericThreshold::flow(25.0)),
            ..Default::default()
        };
        assert_eq!(apply(&table, &spec).row_indices, vec![1, 2, 4]);
    }

    #[test]
    fn test_filters_compose() {
        let table = plant();
        let spec = FilterSpec {
            category: Some("Pump".to_string()),
            threshold: Some(NumericThreshold::flow(20.0)),
            end_date: Some(ymd(2024, 1, 31)),
            ..Default::default()
        };
        assert_eq!(apply(&table, &spec).row_indices, vec![2]);
    }

    #[test]
    fn test_unknown_category_gives_empty_view() {
        let table = parse_text("Type,Flowrate\nA,10\nB,20\nA,30\n").unwrap();
        let spec = FilterSpec {
            category: Some("C".to_string()),
            ..Default::default()
        };
        let view = apply(&table, &spec);
        assert!(view.is_empty());
        assert_eq!(view.table.columns(), table.columns());
    }

    #[test]
    fn test_apply_is_idempotent_and_pure() {
        let table = plant();
        let before = table.clone();
        let spec = FilterSpec {
            category: Some("Pump".to_string()),
            threshold: Some(NumericThreshold::flow(5.0)),
            ..Default::default()
        };
        let once = apply(&table, &spec);
        let twice = apply(&once.table, &spec);
        assert_eq!(once.table, twice.table);
        assert_eq!(table, before);
    }

    #[test]
    fn test_category_options_and_date_bounds() {
        let table = plant();
        assert_eq!(category_options(&table), vec!["Pump", "Valve"]);
        assert_eq!(date_bounds(&table), Some((ymd(2024, 1, 1), ymd(2024, 1, 5))));

        let table = parse_text("Flowrate\n1\n").unwrap();
        assert!(category_options(&table).is_empty());
        assert_eq!(date_bounds(&table), None);
    }

    #[test]
    fn test_view_averages_candidates() {
        let table = parse_text("flow_rate,pressure,Temp\n10,x,1\n20,,3\n").unwrap();
        let averages = view_averages(&table);
        assert_eq!(
            averages,
            vec![
                ("flowrate_avg", Some(15.0)),
                ("pressure_avg", None),
                ("temperature_avg", Some(2.0)),
            ]
        );
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expect = ymd(2024, 3, 9).and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(parse_timestamp(&Cell::Text("2024-03-09".into())), Some(expect));
        assert_eq!(parse_timestamp(&Cell::Text("03/09/2024".into())), Some(expect));
        assert!(parse_timestamp(&Cell::Text("2024-03-09T10:00:00Z".into())).is_some());
        assert_eq!(parse_timestamp(&Cell::number(2024.0)), None);
        assert_eq!(parse_timestamp(&Cell::Missing), None);
    }

    #[test]
    fn test_parse_timestamp_slash_and_fraction_layouts() {
        let at = |y, m, d, h, min| ymd(y, m, d).and_hms_opt(h, min, 0).unwrap();
        let parse = |raw: &str| parse_timestamp(&Cell::Text(raw.into()));

        assert_eq!(parse("1/5/2024 9:30"), Some(at(2024, 1, 5, 9, 30)));
        assert_eq!(parse("2024/01/06 10:00"), Some(at(2024, 1, 6, 10, 0)));
        assert_eq!(parse("01/07/2024 10:00:00"), Some(at(2024, 1, 7, 10, 0)));
        assert_eq!(parse("25/01/2024"), Some(at(2024, 1, 25, 0, 0)));
        assert_eq!(parse("25/01/2024 08:15"), Some(at(2024, 1, 25, 8, 15)));
        assert_eq!(
            parse("2024/01/06 10:00:00.250"),
            ymd(2024, 1, 6).and_hms_milli_opt(10, 0, 0, 250)
        );
        assert_eq!(parse("2024-01-06 25:00"), None);
        assert_eq!(parse("13/13/2024"), None);
    }

    #[test]
    fn test_date_range_over_mixed_layouts() {
        let table = parse_text(
            "Type,Flowrate,Timestamp\n\
             A,1,1/5/2024 9:30\n\
             A,2,2024/01/06 10:00\n\
             B,3,2024-01-07 10:00:00\n",
        )
        .unwrap();
        let spec = FilterSpec {
            start_date: Some(ymd(2024, 1, 1)),
            ..Default::default()
        };
        assert_eq!(apply(&table, &spec).row_indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_numeric_category_matches_source_text() {
        let table = parse_text("Type,Flowrate\n1.0,5\n1,6\n1.0,7\n").unwrap();
        let spec = FilterSpec {
            category: Some("1.0".to_string()),
            ..Default::default()
        };
        assert_eq!(apply(&table, &spec).row_indices, vec![0, 2]);
        assert_eq!(category_options(&table), vec!["1", "1.0"]);
    }
}
