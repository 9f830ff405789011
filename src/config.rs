//! Fixed locations and sizes for a pipeline run.

use std::path::{Path, PathBuf};

static INPUT_FILE: &str = "heart_cleaned_transformed.csv";
static OUTPUT_DIR: &str = "dw";
static ENRICHED_FILE_NAME: &str = "heart_engineered_features_extended_v2.csv";
static SUMMARY_FILE_NAME: &str = "heart_summary_stats_extended.csv";
static BAR_CHART_FILE_NAME: &str = "plot_mean_median_mode_v2.png";
static SEX_PIE_FILE_NAME: &str = "pie_sex_distribution.png";
static AGE_GROUP_PIE_FILE_NAME: &str = "pie_age_group_distribution.png";

/// Paths and chart sizes. There is no external source for these; `Default`
/// is the only configuration the binary uses.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    /// Width and height in pixels of the grouped bar chart
    pub bar_chart_size: (u32, u32),
    /// Width and height in pixels of each pie chart
    pub pie_chart_size: (u32, u32),
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(INPUT_FILE),
            output_dir: PathBuf::from(OUTPUT_DIR),
            bar_chart_size: (1400, 600),
            pie_chart_size: (640, 480),
        }
    }
}

impl PipelineConfig {
    /// Same file names, rooted somewhere else.
    pub fn with_paths<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output_dir: Q) -> Self {
        Self {
            input_path: input.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn enriched_path(&self) -> PathBuf {
        self.output_dir.join(ENRICHED_FILE_NAME)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.output_dir.join(SUMMARY_FILE_NAME)
    }

    pub fn bar_chart_path(&self) -> PathBuf {
        self.output_dir.join(BAR_CHART_FILE_NAME)
    }

    pub fn sex_pie_path(&self) -> PathBuf {
        self.output_dir.join(SEX_PIE_FILE_NAME)
    }

    pub fn age_group_pie_path(&self) -> PathBuf {
        self.output_dir.join(AGE_GROUP_PIE_FILE_NAME)
    }
}
