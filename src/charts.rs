use std::collections::HashMap;
use std::path::Path;

use log::{debug, info};
use plotters::element::Pie;
use plotters::prelude::*;
use polars::frame::DataFrame;

use crate::dataset::{ensure_parent, file_name};
use crate::error::{PipelineError, Result};
use crate::summary::ColumnSummary;

/// Features compared in the grouped bar chart.
pub const BAR_FEATURES: [&str; 6] = ["age", "trestbps", "chol", "thalach", "oldpeak", "risk_score"];

const BAR_WIDTH: f64 = 0.13;
const MISSING_LABEL: &str = "NaN";

const COLORS: [RGBColor; 10] = [
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
];

type DrawResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// One statistic drawn for every feature.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub label: &'static str,
    pub values: Vec<f64>,
}

/// Bar series for `features`, one per statistic kind. Features without a
/// summary row get not-a-number and are not drawn.
pub fn summary_bars(rows: &[ColumnSummary], features: &[&str]) -> Vec<BarSeries> {
    let by_name: HashMap<&str, &ColumnSummary> =
        rows.iter().map(|row| (row.column.as_str(), row)).collect();
    let pick = |stat: fn(&ColumnSummary) -> f64| -> Vec<f64> {
        features
            .iter()
            .map(|feature| by_name.get(feature).map_or(f64::NAN, |row| stat(row)))
            .collect()
    };

    vec![
        BarSeries { label: "mean", values: pick(|row| row.mean) },
        BarSeries { label: "median", values: pick(|row| row.median) },
        BarSeries { label: "mode", values: pick(|row| row.mode) },
        BarSeries { label: "25%", values: pick(|row| row.p25) },
        BarSeries { label: "70%", values: pick(|row| row.p70) },
        BarSeries { label: "max", values: pick(|row| row.max) },
    ]
}

/// One category of a pie chart.
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub count: usize,
    pub percent: f64,
}

/// Category counts of a text column, largest first. Missing entries become
/// their own slice so the percentages always cover every row.
pub fn category_slices(df: &DataFrame, column: &str) -> Result<Vec<PieSlice>> {
    let values = df.column(column)?.utf8()?;
    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in values.into_iter() {
        *counts
            .entry(value.unwrap_or(MISSING_LABEL).to_string())
            .or_default() += 1;
    }

    let total = values.len() as f64;
    let mut slices: Vec<PieSlice> = counts
        .into_iter()
        .map(|(label, count)| PieSlice {
            label,
            count,
            percent: count as f64 / total * 100.0,
        })
        .collect();
    slices.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    Ok(slices)
}

fn chart_error(path: &Path, error: Box<dyn std::error::Error>) -> PipelineError {
    PipelineError::Chart {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}

fn draw_bar_chart(path: &Path, size: (u32, u32), features: &[&str], bars: &[BarSeries]) -> DrawResult<()> {
    let drawn = bars.iter().flat_map(|series| series.values.iter().copied()).filter(|v| v.is_finite());
    let (low, high) = drawn.fold((0.0f64, 0.0f64), |(low, high), v| (low.min(v), high.max(v)));
    let headroom = (high - low).max(1.0) * 0.05;

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Summary Statistics", ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..(features.len() as f64 - 0.5), (low - headroom)..(high + headroom))?;

    let tick_label = |x: &f64| {
        let index = x.round();
        if (x - index).abs() < 1e-6 && index >= 0.0 {
            features.get(index as usize).map(|name| name.to_string()).unwrap_or_default()
        } else {
            String::new()
        }
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(features.len())
        .x_label_formatter(&tick_label)
        .y_desc("Value")
        .draw()?;

    for (i, series) in bars.iter().enumerate() {
        let color = COLORS[i % COLORS.len()];
        let offset = (i as f64 - 3.0) * BAR_WIDTH;
        chart
            .draw_series(
                series
                    .values
                    .iter()
                    .enumerate()
                    .filter(|(_, value)| value.is_finite())
                    .map(|(x, value)| {
                        let left = x as f64 + offset - BAR_WIDTH / 2.0;
                        Rectangle::new([(left, 0.0), (left + BAR_WIDTH, *value)], color.filled())
                    }),
            )?
            .label(series.label)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

fn draw_pie_chart(path: &Path, size: (u32, u32), title: &str, slices: &[PieSlice]) -> DrawResult<()> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(title, ("sans-serif", 24))?;

    let (width, height) = root.dim_in_pixel();
    let center = (width as i32 / 2, height as i32 / 2);
    let radius = f64::from(width.min(height)) * 0.38;
    let sizes: Vec<f64> = slices.iter().map(|slice| slice.count as f64).collect();
    let colors: Vec<RGBColor> = (0..slices.len()).map(|i| COLORS[i % COLORS.len()]).collect();
    let labels: Vec<String> = slices.iter().map(|slice| slice.label.clone()).collect();

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.label_style(("sans-serif", 16).into_font().color(&BLACK));
    pie.percentages(("sans-serif", 14).into_font().color(&BLACK));
    root.draw(&pie)?;
    root.present()?;
    Ok(())
}

/// Grouped bar chart of the summary statistics for [`BAR_FEATURES`].
pub fn render_summary_chart(path: &Path, size: (u32, u32), rows: &[ColumnSummary]) -> Result<()> {
    info!("Creating summary plot...");
    ensure_parent(path)?;
    let bars = summary_bars(rows, &BAR_FEATURES);
    draw_bar_chart(path, size, &BAR_FEATURES, &bars).map_err(|e| chart_error(path, e))?;
    info!("Saved: {}", file_name(path));
    Ok(())
}

/// Pie chart of the categories in a text column.
pub fn render_distribution_chart(
    path: &Path,
    size: (u32, u32),
    df: &DataFrame,
    column: &str,
    title: &str,
) -> Result<()> {
    ensure_parent(path)?;
    let slices = category_slices(df, column)?;
    for slice in &slices {
        debug!("{column}: {} = {} ({:.1}%)", slice.label, slice.count, slice.percent);
    }
    draw_pie_chart(path, size, title, &slices).map_err(|e| chart_error(path, e))?;
    info!("Saved: {}", file_name(path));
    Ok(())
}
