//! Describe-style statistics over every numeric column of the derived table.
//!
//! Missing entries (nulls and not-a-number) are skipped by every statistic.
//! Quantiles interpolate linearly between ranks, and the mode resolves ties
//! to the smallest value.

use std::fs::File;
use std::path::Path;

use log::info;
use polars::frame::DataFrame;
use polars::prelude::*;
use serde::{Serialize, Serializer};

use crate::dataset::{ensure_parent, file_name};
use crate::error::Result;

/// Row count of the summary preview written to the log.
const PREVIEW_ROWS: usize = 6;

/// One row of the summary table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    #[serde(rename = "")]
    pub column: String,
    #[serde(serialize_with = "nan_as_empty")]
    pub count: f64,
    #[serde(serialize_with = "nan_as_empty")]
    pub mean: f64,
    #[serde(serialize_with = "nan_as_empty")]
    pub std: f64,
    #[serde(serialize_with = "nan_as_empty")]
    pub min: f64,
    #[serde(rename = "25%", serialize_with = "nan_as_empty")]
    pub p25: f64,
    #[serde(rename = "50%", serialize_with = "nan_as_empty")]
    pub p50: f64,
    #[serde(rename = "70%", serialize_with = "nan_as_empty")]
    pub p70: f64,
    #[serde(rename = "100%", serialize_with = "nan_as_empty")]
    pub p100: f64,
    #[serde(serialize_with = "nan_as_empty")]
    pub max: f64,
    #[serde(serialize_with = "nan_as_empty")]
    pub median: f64,
    #[serde(serialize_with = "nan_as_empty")]
    pub mode: f64,
}

fn nan_as_empty<S: Serializer>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    if value.is_nan() {
        serializer.serialize_none()
    } else {
        serializer.serialize_f64(*value)
    }
}

impl ColumnSummary {
    pub fn from_values(column: &str, values: &[f64]) -> Self {
        let sorted = sorted_present(values);
        Self {
            column: column.to_string(),
            count: sorted.len() as f64,
            mean: mean(values),
            std: std_dev(values),
            min: sorted.first().copied().unwrap_or(f64::NAN),
            p25: quantile(&sorted, 0.25),
            p50: quantile(&sorted, 0.5),
            p70: quantile(&sorted, 0.7),
            p100: quantile(&sorted, 1.0),
            max: sorted.last().copied().unwrap_or(f64::NAN),
            median: quantile(&sorted, 0.5),
            mode: mode(values),
        }
    }
}

/// Values of a numeric column as `f64`, with nulls turned into not-a-number.
pub fn column_values(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    series_values(df.column(name)?)
}

fn series_values(series: &Series) -> Result<Vec<f64>> {
    let values = series.cast(&DataType::Float64)?;
    let values = values
        .f64()?
        .into_iter()
        .map(|value| value.unwrap_or(f64::NAN))
        .collect();
    Ok(values)
}

fn sorted_present(values: &[f64]) -> Vec<f64> {
    let mut present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    present.sort_by(f64::total_cmp);
    present
}

pub fn mean(values: &[f64]) -> f64 {
    let (sum, n) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0f64, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

/// Sample standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    let present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if present.len() < 2 {
        return f64::NAN;
    }
    let centre = mean(&present);
    let squares: f64 = present.iter().map(|v| (v - centre).powi(2)).sum();
    (squares / (present.len() - 1) as f64).sqrt()
}

pub fn max(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(f64::NAN, |acc, v| if acc.is_nan() || v > acc { v } else { acc })
}

/// Linear-interpolation quantile over already sorted values.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    if fraction == 0.0 {
        sorted[lower]
    } else {
        sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
    }
}

/// Most frequent value; the smallest wins a tie.
pub fn mode(values: &[f64]) -> f64 {
    let sorted = sorted_present(values);
    let mut best = f64::NAN;
    let mut best_count = 0;
    let mut i = 0;
    while i < sorted.len() {
        let run = sorted[i..].iter().take_while(|v| **v == sorted[i]).count();
        if run > best_count {
            best = sorted[i];
            best_count = run;
        }
        i += run;
    }
    best
}

/// One summary row per numeric column, in table order. Text columns are skipped.
pub fn summarize(df: &DataFrame) -> Result<Vec<ColumnSummary>> {
    info!("Generating summary statistics...");
    df.get_columns()
        .iter()
        .filter(|series| series.dtype().is_numeric())
        .map(|series| -> Result<ColumnSummary> {
            Ok(ColumnSummary::from_values(series.name(), &series_values(series)?))
        })
        .collect()
}

pub async fn write_summary<P: AsRef<Path>>(path: P, rows: &[ColumnSummary]) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_writer(File::create(path)?);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!("Saved: {}", file_name(path));
    Ok(())
}

/// Log the first few rows with the statistics people usually look at.
pub fn log_preview(rows: &[ColumnSummary]) {
    info!("Sample summary statistics (first {PREVIEW_ROWS} rows):");
    info!(
        "{:<20} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
        "", "mean", "median", "mode", "25%", "50%", "70%", "max"
    );
    for row in rows.iter().take(PREVIEW_ROWS) {
        info!(
            "{:<20} {:>12.6} {:>12.6} {:>12.6} {:>12.6} {:>12.6} {:>12.6} {:>12.6}",
            row.column, row.mean, row.median, row.mode, row.p25, row.p50, row.p70, row.max
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn quantiles_interpolate_between_ranks() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_close(quantile(&sorted, 0.25), 1.75);
        assert_close(quantile(&sorted, 0.5), 2.5);
        assert_close(quantile(&sorted, 0.7), 3.1);
        assert_close(quantile(&sorted, 1.0), 4.0);
        assert!(quantile(&[], 0.5).is_nan());
    }

    #[test]
    fn mode_prefers_smallest_on_tie() {
        assert_eq!(mode(&[3.0, 1.0, 3.0, 1.0, 2.0]), 1.0);
        assert_eq!(mode(&[5.0, 4.0, 5.0]), 5.0);
        assert_eq!(mode(&[f64::NAN, f64::NAN, 7.0]), 7.0);
        assert!(mode(&[]).is_nan());
    }

    #[test]
    fn missing_values_are_skipped() {
        let values = [1.0, f64::NAN, 3.0];
        let summary = ColumnSummary::from_values("x", &values);
        assert_eq!(summary.count, 2.0);
        assert_close(summary.mean, 2.0);
        assert_close(summary.std, 2f64.sqrt());
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 3.0);
        assert_close(summary.median, 2.0);
        assert_eq!(summary.p100, summary.max);
    }

    #[test]
    fn single_value_has_no_spread() {
        let summary = ColumnSummary::from_values("x", &[4.0]);
        assert!(summary.std.is_nan());
        assert_eq!(summary.mode, 4.0);
    }

    #[test]
    fn infinity_propagates_into_mean() {
        assert!(mean(&[1.0, f64::INFINITY]).is_infinite());
        assert_eq!(max(&[f64::NAN, 2.0, 9.0]), 9.0);
    }

    #[test]
    fn summarizes_numeric_columns_only() {
        let df = df!(
            "age" => &[63i64, 37, 41, 56],
            "label" => &["a", "b", "c", "d"],
            "oldpeak" => &[2.3f64, 3.5, 1.4, 0.8],
        )
        .unwrap();
        let rows = summarize(&df).unwrap();
        let names: Vec<&str> = rows.iter().map(|row| row.column.as_str()).collect();
        assert_eq!(names, vec!["age", "oldpeak"]);
        assert_close(rows[0].mean, 49.25);
        assert_close(rows[1].mean, 2.0);
    }

    #[tokio::test]
    async fn writes_header_in_fixed_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        let rows = vec![ColumnSummary::from_values("age", &[40.0, 60.0])];
        write_summary(&path, &rows).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let mut lines = written.lines();
        assert_eq!(
            lines.next(),
            Some(",count,mean,std,min,25%,50%,70%,100%,max,median,mode")
        );
        assert!(lines.next().unwrap().starts_with("age,2.0,50.0,"));
    }

    #[tokio::test]
    async fn undefined_statistics_are_blank() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        let rows = vec![ColumnSummary::from_values("empty", &[f64::NAN])];
        write_summary(&path, &rows).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().nth(1), Some("empty,0.0,,,,,,,,,,"));
    }
}
