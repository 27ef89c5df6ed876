//! Entry points shared by the front ends.

use std::path::{Path, PathBuf};

use cc_cda::run_rainfall_calculator;
use cc_params::{BatchConfig, ParameterSet, load_config};

use crate::batch::{BatchOptions, BatchReport, BatchRunner};
use crate::error::{AppError, AppResult};
use crate::progress::BatchProgressEvent;
use crate::solver::{ProcessSolverFactory, StaticStepPlanner};

/// Load and validate a batch config. A relative `output_dir` is taken
/// relative to the config file's directory.
pub fn load_batch_config(path: &Path) -> AppResult<BatchConfig> {
    let mut config = load_config(path)?;
    if config.output_dir.is_relative()
        && let Some(parent) = path.parent()
    {
        config.output_dir = parent.join(&config.output_dir);
    }
    Ok(config)
}

/// Request to execute a configured batch.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub config_path: PathBuf,
    pub force: bool,
    /// Overrides the configured mode with the parallel one.
    pub parallel: bool,
}

pub fn run_batch(
    request: &RunRequest,
    progress_cb: Option<&mut dyn FnMut(BatchProgressEvent)>,
) -> AppResult<BatchReport> {
    let config = load_batch_config(&request.config_path)?;
    let solver = config.solver.clone().ok_or_else(|| {
        AppError::InvalidInput(format!(
            "{} has no solver section",
            request.config_path.display()
        ))
    })?;

    let mut options = BatchOptions::from_config(&config);
    options.force = request.force;
    if request.parallel {
        options.mode = cc_params::RunMode::Parallel;
    }

    let runner = BatchRunner::new(
        StaticStepPlanner::new(config.steps.clone()),
        ProcessSolverFactory::new(solver),
        options,
    );
    runner.run_with_progress(config.parameter_sets(), progress_cb)
}

/// The model at position `index` in the config.
pub fn model_at(config: &BatchConfig, index: usize) -> AppResult<ParameterSet> {
    config
        .parameter_sets()
        .into_iter()
        .nth(index)
        .ok_or_else(|| {
            AppError::ModelNotFound(format!(
                "index {index} (config has {} models)",
                config.models.len()
            ))
        })
}

/// Run the rainfall calculator for one configured model, writing into the
/// batch output directory.
pub fn run_rainfall(config_path: &Path, index: usize) -> AppResult<PathBuf> {
    let config = load_batch_config(config_path)?;
    let params = model_at(&config, index)?;
    let (path, _) = run_rainfall_calculator(&params, &config.output_dir)?;
    Ok(path)
}
