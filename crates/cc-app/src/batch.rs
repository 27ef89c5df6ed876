//! Batch execution: solve, derive, match and persist every model.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use cc_cda::{CdaAccumulator, MatchEngine, ModelComparison};
use cc_params::{BatchConfig, MatchScope, ParameterSet, RunMode};
use cc_proxy::{StepSeries, derive_proxies};
use cc_results::{ModelRun, PreviousRuns, ResultStore};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::error::AppResult;
use crate::progress::{BatchProgressEvent, BatchStage};
use crate::solver::{SolverFactory, StepPlanner, solve_steps};

/// Lifecycle of one model within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Pending,
    Running,
    Completed,
    Reused,
    Failed,
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub output_dir: PathBuf,
    pub mode: RunMode,
    /// Look for identical parameter sets among the stored runs.
    pub reuse_previous: bool,
    /// Re-run every model even when a stored run matches.
    pub force: bool,
    pub scope: MatchScope,
}

impl BatchOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            mode: RunMode::Serial,
            reuse_previous: true,
            force: false,
            scope: MatchScope::AllSteps,
        }
    }

    pub fn from_config(config: &BatchConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            mode: config.mode,
            reuse_previous: config.reuse_previous,
            force: false,
            scope: config.cda.scope,
        }
    }
}

/// Outcome of a batch. `runs` and `states` are ordered by model id.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub runs: Vec<ModelRun>,
    pub states: Vec<(u32, RunState)>,
    pub failures: Vec<(u32, String)>,
    pub cda: CdaAccumulator,
    pub elapsed_wall_s: f64,
}

impl BatchReport {
    pub fn count(&self, state: RunState) -> usize {
        self.states.iter().filter(|(_, s)| *s == state).count()
    }

    pub fn state_of(&self, id: u32) -> Option<RunState> {
        self.states.iter().find(|(i, _)| *i == id).map(|(_, s)| *s)
    }
}

pub struct BatchRunner<P, F> {
    planner: P,
    factory: F,
    options: BatchOptions,
}

impl<P: StepPlanner, F: SolverFactory> BatchRunner<P, F> {
    pub fn new(planner: P, factory: F, options: BatchOptions) -> Self {
        Self {
            planner,
            factory,
            options,
        }
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    pub fn output_dir(&self) -> &Path {
        &self.options.output_dir
    }

    pub fn run(&self, models: Vec<ParameterSet>) -> AppResult<BatchReport> {
        self.run_with_progress(models, None)
    }

    /// Run every model, reusing stored runs where allowed, then save the
    /// ordered results to the output directory.
    ///
    /// A failing model is recorded in the report and the batch continues.
    /// Errors reading or writing the store abort the batch.
    pub fn run_with_progress(
        &self,
        models: Vec<ParameterSet>,
        mut progress_cb: Option<&mut dyn FnMut(BatchProgressEvent)>,
    ) -> AppResult<BatchReport> {
        let started = Instant::now();
        let total = models.len();
        let store = ResultStore::new(&self.options.output_dir);
        let mut emit = |stage, model_id, completed, message: Option<String>| {
            if let Some(cb) = progress_cb.as_deref_mut() {
                cb(BatchProgressEvent {
                    stage,
                    model_id,
                    completed,
                    total,
                    elapsed_wall_s: started.elapsed().as_secs_f64(),
                    message,
                });
            }
        };

        emit(BatchStage::CheckingPrevious, None, 0, None);
        let previous = if self.options.reuse_previous && !self.options.force {
            store.previous_runs()?
        } else {
            PreviousRuns::default()
        };

        let mut states: Vec<(u32, RunState)> = Vec::with_capacity(total);
        let mut runs: Vec<ModelRun> = Vec::with_capacity(total);
        let mut pending: Vec<ParameterSet> = Vec::new();
        // Models finished so far: reused, solved or failed.
        let mut processed = 0;
        for params in models {
            match previous.find(&params) {
                Some(hit) => {
                    info!(id = params.id, "model reused from previous run");
                    processed += 1;
                    emit(BatchStage::Reused, Some(params.id), processed, None);
                    states.push((params.id, RunState::Reused));
                    runs.push(ModelRun::new(params, hit.series.clone()));
                }
                None => {
                    states.push((params.id, RunState::Pending));
                    pending.push(params);
                }
            }
        }

        let engine = MatchEngine::new(&self.options.output_dir, self.options.scope);
        let outcomes = match self.options.mode {
            RunMode::Serial => {
                let mut outcomes = Vec::with_capacity(pending.len());
                for params in pending {
                    set_state(&mut states, params.id, RunState::Running);
                    emit(BatchStage::Solving, Some(params.id), processed, None);
                    let outcome = self.process(&params, &engine, None);
                    processed += 1;
                    outcomes.push((params, outcome));
                }
                outcomes
            }
            RunMode::Parallel => {
                if !self.factory.is_parallel_safe() {
                    warn!(
                        "parallel mode is experimental: solver instances may share state and results can differ from a serial run"
                    );
                }
                for (_, state) in states.iter_mut().filter(|(_, s)| *s == RunState::Pending) {
                    *state = RunState::Running;
                }
                let message = format!("{} models in parallel", pending.len());
                emit(BatchStage::Solving, None, processed, Some(message));
                let cda_lock = Mutex::new(());
                let outcomes = pending
                    .into_par_iter()
                    .map(|params| {
                        let outcome = self.process(&params, &engine, Some(&cda_lock));
                        (params, outcome)
                    })
                    .collect::<Vec<_>>();
                processed += outcomes.len();
                outcomes
            }
        };

        let mut cda = CdaAccumulator::default();
        let mut failures = Vec::new();
        for (params, outcome) in outcomes {
            match outcome {
                Ok((series, comparison)) => {
                    if let Some(comparison) = comparison {
                        cda = cda.absorb(comparison);
                    }
                    set_state(&mut states, params.id, RunState::Completed);
                    runs.push(ModelRun::new(params, series));
                }
                Err(err) => {
                    warn!(id = params.id, error = %err, "model failed");
                    emit(BatchStage::Failed, Some(params.id), processed, Some(err.to_string()));
                    set_state(&mut states, params.id, RunState::Failed);
                    failures.push((params.id, err.to_string()));
                }
            }
        }

        runs.sort_by_key(ModelRun::id);
        states.sort_by_key(|(id, _)| *id);
        cda.matches.sort_by_key(|m| m.model_id);

        if !runs.is_empty() {
            emit(BatchStage::SavingResults, None, processed, None);
            store.save(&runs)?;
        }

        let report = BatchReport {
            runs,
            states,
            failures,
            cda,
            elapsed_wall_s: started.elapsed().as_secs_f64(),
        };
        info!(
            completed = report.count(RunState::Completed),
            reused = report.count(RunState::Reused),
            failed = report.count(RunState::Failed),
            matches = report.cda.matches.len(),
            "batch finished"
        );
        emit(BatchStage::Completed, None, processed, None);
        Ok(report)
    }

    /// Solve one model, derive its proxies and run CDA matching. `cda_lock`
    /// serializes table writes when models run concurrently.
    fn process(
        &self,
        params: &ParameterSet,
        engine: &MatchEngine,
        cda_lock: Option<&Mutex<()>>,
    ) -> AppResult<(StepSeries, Option<ModelComparison>)> {
        let steps = self.planner.plan(params)?;
        let mut solver = self.factory.create()?;
        let mut series = solve_steps(solver.as_mut(), &steps)?;
        derive_proxies(&mut series, params)?;

        let comparison = match cda_lock {
            Some(lock) => {
                let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
                engine.match_one(&series, params)?
            }
            None => engine.match_one(&series, params)?,
        };
        Ok((series, comparison))
    }
}

fn set_state(states: &mut [(u32, RunState)], id: u32, state: RunState) {
    if let Some(entry) = states.iter_mut().find(|(i, _)| *i == id) {
        entry.1 = state;
    }
}
