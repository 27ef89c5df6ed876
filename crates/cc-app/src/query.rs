//! Query helpers over stored output directories.

use std::collections::BTreeMap;
use std::path::PathBuf;

use cc_cda::{CdaTables, read_table};
use cc_params::ParamValue;
use cc_results::{ModelRun, filter_out_noprecip, load_runs, settings_report};

use crate::error::{AppError, AppResult};

/// Summary of one or more output directories.
#[derive(Debug, Clone)]
pub struct OutputSummary {
    pub model_count: usize,
    pub precipitating_models: usize,
    pub step_count_range: (usize, usize),
    pub all_output_rows: usize,
    pub match_rows: usize,
    pub settings: BTreeMap<String, Vec<ParamValue>>,
}

pub fn summarize_runs(runs: &[ModelRun]) -> AppResult<OutputSummary> {
    if runs.is_empty() {
        return Err(AppError::InvalidInput("No models loaded".to_string()));
    }
    let steps = runs.iter().map(|r| r.series.len());
    let min = steps.clone().min().unwrap_or(0);
    let max = steps.max().unwrap_or(0);

    Ok(OutputSummary {
        model_count: runs.len(),
        precipitating_models: filter_out_noprecip(runs).len(),
        step_count_range: (min, max),
        all_output_rows: 0,
        match_rows: 0,
        settings: settings_report(runs),
    })
}

/// Load `dirs`, summarize the merged runs and count rows in each
/// directory's CDA tables.
pub fn summarize(dirs: &[PathBuf]) -> AppResult<OutputSummary> {
    let runs = load_runs(dirs)?;
    let mut summary = summarize_runs(&runs)?;
    for dir in dirs {
        let tables = CdaTables::new(dir);
        if tables.all_outputs.exists() {
            summary.all_output_rows += read_table(&tables.all_outputs)?.rows.len();
        }
        if tables.matches.exists() {
            summary.match_rows += read_table(&tables.matches)?.rows.len();
        }
    }
    Ok(summary)
}
