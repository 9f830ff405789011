use std::fs::{self, File};
use std::path::Path;

use log::{debug, info};
use polars::frame::DataFrame;
use polars::prelude::*;

use crate::error::Result;
use crate::records::HeartRecord;

/// Read the input table and check that every source column is present.
///
/// Column types are inferred from every row, so a column whose first
/// hundred values look like integers still loads when a float shows up later.
pub async fn read_csv<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    let path = path.as_ref();
    debug!("Reading {}", path.display());
    let file = File::open(path)?;

    let df = CsvReader::new(file)
        .has_header(true)
        .infer_schema(None)
        .finish()?;
    HeartRecord::validate(&df)?;

    info!("Loaded: {} rows, {} columns", df.height(), df.width());
    Ok(df)
}

/// Write a frame as CSV with a header, creating the parent directory if needed.
pub async fn write_csv<P: AsRef<Path>>(path: P, df: &mut DataFrame) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let mut file = File::create(path)?;

    CsvWriter::new(&mut file).has_header(true).finish(df)?;

    info!("Saved: {}", file_name(path));
    Ok(())
}

pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use std::io::Write;

    fn write_input(dir: &Path, contents: &str) -> std::path::PathBuf {
        let path = dir.join("input.csv");
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[tokio::test]
    async fn reads_heart_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(
            dir.path(),
            "age,sex,cp,trestbps,chol,thalach,exang,oldpeak,target\n\
             63,1,3,145,233,150,0,2.3,1\n\
             37,1,2,130,250,187,0,3.5,1\n",
        );
        let df = read_csv(&path).await.unwrap();
        assert_eq!(df.shape(), (2, 9));
    }

    #[tokio::test]
    async fn late_float_widens_integer_column() {
        let dir = tempfile::tempdir().unwrap();
        let mut contents = String::from("age,sex,trestbps,chol,thalach,exang,oldpeak\n");
        for _ in 0..150 {
            contents.push_str("54,1,130,246,150,0,1\n");
        }
        contents.push_str("54,1,130,246,150,0,1.5\n");
        let path = write_input(dir.path(), &contents);

        let df = read_csv(&path).await.unwrap();
        assert_eq!(df.height(), 151);
        let oldpeak = df.column("oldpeak").unwrap();
        assert_eq!(oldpeak.dtype(), &DataType::Float64);
        assert_eq!(oldpeak.f64().unwrap().get(150), Some(1.5));
        assert_eq!(df.column("age").unwrap().dtype(), &DataType::Int64);
    }

    #[tokio::test]
    async fn missing_input_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_csv(dir.path().join("absent.csv")).await;
        assert!(matches!(result, Err(PipelineError::Io(_))));
    }

    #[tokio::test]
    async fn missing_source_column_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(dir.path(), "age,sex,trestbps,chol,thalach,oldpeak\n63,1,145,233,150,2.3\n");
        let result = read_csv(&path).await;
        assert!(matches!(result, Err(PipelineError::MissingColumn { column }) if column == "exang"));
    }

    #[tokio::test]
    async fn write_creates_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("out.csv");
        let mut df = df!("a" => &[1i64, 2], "b" => &["x", "y"]).unwrap();
        write_csv(&target, &mut df).await.unwrap();
        let written = fs::read_to_string(&target).unwrap();
        assert_eq!(written, "a,b\n1,x\n2,y\n");
    }
}
