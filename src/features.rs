use log::{debug, info};
use polars::frame::DataFrame;
use polars::prelude::*;

use crate::error::{PipelineError, Result};
use crate::records::{AGE, CHOL, EXANG, OLDPEAK, SEX, THALACH, TRESTBPS};
use crate::summary::{self, column_values};

pub const AGE_GROUP: &str = "age_group";
pub const AGE_DECADE: &str = "age_decade";
pub const RISK_SCORE: &str = "risk_score";
pub const SEX_STR: &str = "sex_str";

const AGE_GROUP_LABELS: &[&str] = &["Young", "Middle-aged", "Senior"];
const AGE_DECADE_LABELS: &[&str] = &["20s", "30s", "40s", "50s", "60s", "70s"];
const OLDPEAK_LABELS: &[&str] = &["low", "moderate", "high"];
const CHOL_LABELS: &[&str] = &["Desirable", "Borderline High", "High"];
const BP_LABELS: &[&str] = &[
    "Normal",
    "Elevated",
    "Hypertension Stage 1",
    "Hypertension Stage 2",
];

/// Which end of each bin interval is included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Closed {
    /// `(lo, hi]`
    Right,
    /// `[lo, hi)`
    Left,
}

/// Labelled intervals over a numeric column.
#[derive(Debug, Clone)]
pub struct Bins {
    edges: Vec<f64>,
    labels: &'static [&'static str],
    closed: Closed,
}

impl Bins {
    /// `edges` must be strictly increasing and hold one more entry than `labels`.
    pub fn new(
        column: &str,
        edges: Vec<f64>,
        labels: &'static [&'static str],
        closed: Closed,
    ) -> Result<Self> {
        let increasing = edges.windows(2).all(|pair| pair[0] < pair[1]);
        if !increasing || edges.len() != labels.len() + 1 {
            return Err(PipelineError::NonMonotonicBins {
                column: column.to_string(),
                edges,
            });
        }
        Ok(Self {
            edges,
            labels,
            closed,
        })
    }

    /// Label of the interval holding `value`, or `None` when it falls outside
    /// every interval (not-a-number included).
    pub fn assign(&self, value: f64) -> Option<&'static str> {
        self.edges
            .windows(2)
            .position(|pair| match self.closed {
                Closed::Right => pair[0] < value && value <= pair[1],
                Closed::Left => pair[0] <= value && value < pair[1],
            })
            .map(|i| self.labels[i])
    }

    fn apply(&self, column: &Series) -> PolarsResult<Series> {
        let values = column.cast(&DataType::Float64)?;
        let mut labelled: Utf8Chunked = values
            .f64()?
            .into_iter()
            .map(|value| value.and_then(|v| self.assign(v)))
            .collect();
        labelled.rename(column.name());
        Ok(labelled.into_series())
    }
}

/// The bin sets for one dataset. Two of them end at the column maximum, so
/// they are rebuilt from every frame that gets derived.
#[derive(Debug, Clone)]
pub struct FeatureBins {
    pub age_group: Bins,
    pub age_decade: Bins,
    pub oldpeak: Bins,
    pub chol: Bins,
    pub bp: Bins,
}

impl FeatureBins {
    pub fn for_dataset(df: &DataFrame) -> Result<Self> {
        let oldpeak_max = summary::max(&column_values(df, OLDPEAK)?);
        let chol_max = summary::max(&column_values(df, CHOL)?);
        debug!("Bin maxima: oldpeak={oldpeak_max}, chol={chol_max}");
        Self::with_maxima(oldpeak_max, chol_max)
    }

    pub fn with_maxima(oldpeak_max: f64, chol_max: f64) -> Result<Self> {
        Ok(Self {
            age_group: Bins::new(
                AGE,
                vec![0.0, 39.0, 59.0, 120.0],
                AGE_GROUP_LABELS,
                Closed::Right,
            )?,
            age_decade: Bins::new(
                AGE,
                (2..=8).map(|decade| f64::from(decade) * 10.0).collect(),
                AGE_DECADE_LABELS,
                Closed::Left,
            )?,
            oldpeak: Bins::new(
                OLDPEAK,
                vec![-0.1, 1.0, 2.0, oldpeak_max],
                OLDPEAK_LABELS,
                Closed::Right,
            )?,
            chol: Bins::new(
                CHOL,
                vec![0.0, 200.0, 240.0, chol_max],
                CHOL_LABELS,
                Closed::Right,
            )?,
            bp: Bins::new(
                TRESTBPS,
                vec![0.0, 120.0, 129.0, 139.0, 200.0],
                BP_LABELS,
                Closed::Right,
            )?,
        })
    }
}

pub fn sex_label(sex: f64) -> Option<&'static str> {
    if sex == 0.0 {
        Some("Female")
    } else if sex == 1.0 {
        Some("Male")
    } else {
        None
    }
}

fn float(name: &str) -> Expr {
    col(name).cast(DataType::Float64)
}

/// 0/1 column from a condition; a missing operand counts as not met.
fn flag(condition: Expr) -> Expr {
    condition.fill_null(lit(false)).cast(DataType::Int32)
}

fn high_cholesterol() -> Expr {
    float(CHOL).gt(lit(240.0)).fill_null(lit(false))
}

fn high_bp() -> Expr {
    float(TRESTBPS).gt(lit(130.0)).fill_null(lit(false))
}

/// Keeps the source dtype, so integer ages give an integer reserve.
fn heart_rate_reserve() -> Expr {
    lit(220) - col(AGE) - col(THALACH)
}

fn binned(source: &str, bins: Bins, name: &str) -> Expr {
    col(source)
        .apply(
            move |s| bins.apply(&s).map(Some),
            GetOutput::from_type(DataType::Utf8),
        )
        .alias(name)
}

fn sex_str() -> Expr {
    col(SEX)
        .apply(
            |s| {
                let values = s.cast(&DataType::Float64)?;
                let mut labels: Utf8Chunked = values
                    .f64()?
                    .into_iter()
                    .map(|value| value.and_then(sex_label))
                    .collect();
                labels.rename(s.name());
                Ok(Some(labels.into_series()))
            },
            GetOutput::from_type(DataType::Utf8),
        )
        .alias(SEX_STR)
}

/// Derived columns, in the order they are appended to the table.
pub fn feature_exprs(bins: &FeatureBins) -> Vec<Expr> {
    let at_risk = high_cholesterol().cast(DataType::Float64)
        + high_bp().cast(DataType::Float64)
        + float(EXANG);

    vec![
        binned(AGE, bins.age_group.clone(), AGE_GROUP),
        binned(AGE, bins.age_decade.clone(), AGE_DECADE),
        (float(CHOL) / float(AGE)).alias("chol_per_age"),
        (float(AGE) * lit(0.02)
            + float(TRESTBPS) * lit(0.015)
            + float(CHOL) * lit(0.01)
            + float(THALACH) * lit(-0.01)
            + float(OLDPEAK) * lit(0.03)
            + float(SEX) * lit(0.05)
            + float(EXANG) * lit(0.05))
        .alias(RISK_SCORE),
        (float(THALACH) / (float(EXANG) + lit(1.0))).alias("exercise_recovery"),
        (float(AGE) * float(OLDPEAK)).alias("age_oldpeak"),
        flag(high_cholesterol()).alias("high_cholesterol"),
        flag(high_bp()).alias("high_bp"),
        heart_rate_reserve().alias("heart_rate_reserve"),
        (float(THALACH) / (lit(220.0) - float(AGE))).alias("max_hr_percent"),
        (heart_rate_reserve().cast(DataType::Float64) / (float(OLDPEAK) + lit(1.0))).alias("hr_efficiency"),
        binned(OLDPEAK, bins.oldpeak.clone(), "oldpeak_category"),
        binned(CHOL, bins.chol.clone(), "chol_category"),
        binned(TRESTBPS, bins.bp.clone(), "bp_category"),
        flag(at_risk.gt_eq(lit(2.0))).alias("combined_risk_flag"),
        sex_str(),
    ]
}

/// Append every derived column to `df`. Source columns are left untouched.
pub fn derive_features(df: DataFrame) -> Result<DataFrame> {
    info!("Performing feature engineering...");
    let bins = FeatureBins::for_dataset(&df)?;
    let before = df.width();

    let derived = df.lazy().with_columns(feature_exprs(&bins)).collect()?;

    debug!("Added {} derived columns", derived.width() - before);
    Ok(derived)
}
