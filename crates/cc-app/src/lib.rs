//! Shared application service layer for the CDA engine.
//!
//! Runs batches of models through the external solver, proxy derivation
//! and CDA matching, and answers summary queries over stored output.

pub mod batch;
pub mod error;
pub mod progress;
pub mod query;
pub mod service;
pub mod solver;

pub use batch::{BatchOptions, BatchReport, BatchRunner, RunState};
pub use error::{AppError, AppResult};
pub use progress::{BatchProgressEvent, BatchStage};
pub use query::{OutputSummary, summarize, summarize_runs};
pub use service::{RunRequest, load_batch_config, model_at, run_batch, run_rainfall};
pub use solver::{
    ProcessSolver, ProcessSolverFactory, ReactionSolver, SolverFactory, StaticStepPlanner,
    StepPlanner, StepSpec, solve_steps,
};
