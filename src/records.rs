use polars::prelude::DataFrame;

use crate::error::{PipelineError, Result};

pub const AGE: &str = "age";
pub const SEX: &str = "sex";
pub const TRESTBPS: &str = "trestbps";
pub const CHOL: &str = "chol";
pub const THALACH: &str = "thalach";
pub const OLDPEAK: &str = "oldpeak";
pub const EXANG: &str = "exang";

/// Source columns of a cardiac health record. Anything else in the input is
/// carried through untouched.
pub struct HeartRecord {
}

impl HeartRecord {
    pub fn source_columns() -> [&'static str; 7] {
        [AGE, SEX, TRESTBPS, CHOL, THALACH, OLDPEAK, EXANG]
    }

    /// Fails on the first source column that is absent or not numeric.
    pub fn validate(df: &DataFrame) -> Result<()> {
        let names = df.get_column_names();
        for column in Self::source_columns() {
            if !names.contains(&column) {
                return Err(PipelineError::MissingColumn {
                    column: column.to_string(),
                });
            }
            let dtype = df.column(column)?.dtype();
            if !dtype.is_numeric() {
                return Err(PipelineError::NonNumericColumn {
                    column: column.to_string(),
                    dtype: dtype.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn accepts_extra_columns() {
        let df = df!(
            "age" => &[50i64],
            "sex" => &[1i64],
            "cp" => &[2i64],
            "trestbps" => &[120i64],
            "chol" => &[200i64],
            "thalach" => &[150i64],
            "oldpeak" => &[1.0f64],
            "exang" => &[0i64],
            "target" => &[1i64],
        )
        .unwrap();
        assert!(HeartRecord::validate(&df).is_ok());
    }

    #[test]
    fn reports_missing_column() {
        let df = df!(
            "age" => &[50i64],
            "sex" => &[1i64],
        )
        .unwrap();
        match HeartRecord::validate(&df) {
            Err(PipelineError::MissingColumn { column }) => assert_eq!(column, "trestbps"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn reports_text_column() {
        let df = df!(
            "age" => &["fifty"],
            "sex" => &[1i64],
            "trestbps" => &[120i64],
            "chol" => &[200i64],
            "thalach" => &[150i64],
            "oldpeak" => &[1.0f64],
            "exang" => &[0i64],
        )
        .unwrap();
        assert!(matches!(
            HeartRecord::validate(&df),
            Err(PipelineError::NonNumericColumn { .. })
        ));
    }
}
