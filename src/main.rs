extern crate serde;

mod charts;
mod config;
mod dataset;
mod error;
mod features;
mod records;
mod summary;

use std::time::Instant;

use log::{error, info};
use polars::frame::DataFrame;
use sysinfo::{ProcessExt, System, SystemExt};

use config::PipelineConfig;
use dataset::{read_csv, write_csv};
use error::Result;
use features::{derive_features, AGE_GROUP, SEX_STR};
use summary::{log_preview, summarize, write_summary, ColumnSummary};

/// Resident memory of this process in bytes, or 0 when it cannot be read.
fn monitor_memory() -> u64 {
    let Ok(pid) = sysinfo::get_current_pid() else {
        return 0;
    };
    let mut system = System::new();
    system.refresh_process(pid);
    system.process(pid).map(|process| process.memory()).unwrap_or(0)
}

async fn process_features(config: &PipelineConfig) -> Result<DataFrame> {
    let df = read_csv(&config.input_path).await?;
    let mut enriched = derive_features(df)?;
    write_csv(config.enriched_path(), &mut enriched).await?;
    Ok(enriched)
}

async fn process_summary(config: &PipelineConfig, df: &DataFrame) -> Result<Vec<ColumnSummary>> {
    let rows = summarize(df)?;
    write_summary(config.summary_path(), &rows).await?;
    log_preview(&rows);
    Ok(rows)
}

fn process_charts(config: &PipelineConfig, df: &DataFrame, rows: &[ColumnSummary]) -> Result<()> {
    charts::render_summary_chart(&config.bar_chart_path(), config.bar_chart_size, rows)?;

    info!("Creating pie charts...");
    charts::render_distribution_chart(
        &config.sex_pie_path(),
        config.pie_chart_size,
        df,
        SEX_STR,
        "Sex Distribution",
    )?;
    charts::render_distribution_chart(
        &config.age_group_pie_path(),
        config.pie_chart_size,
        df,
        AGE_GROUP,
        "Age Group Distribution",
    )?;
    Ok(())
}

/// Load, derive, summarize and render. Stops at the first failure.
async fn run(config: &PipelineConfig) -> Result<()> {
    let enriched = process_features(config).await?;
    let rows = process_summary(config, &enriched).await?;
    process_charts(config, &enriched, &rows)?;
    Ok(())
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let start_time = Instant::now();
    let start_memory = monitor_memory();
    let config = PipelineConfig::default();

    if let Err(e) = run(&config).await {
        error!("Pipeline failed: {e}");
        return Err(e.into());
    }

    let end_memory = monitor_memory();
    let duration = start_time.elapsed();

    info!("Time elapsed: {:?}", duration);
    info!("Memory used: {} bytes", end_memory.saturating_sub(start_memory));
    info!(
        "All tasks completed. Outputs are saved in {}",
        config.output_dir.display()
    );

    Ok(())
}
