//! Boundary to the external reaction solver.
//!
//! The solver is an opaque collaborator: it receives one [`StepSpec`] at a
//! time and reports the quantities it computed for that step. Building the
//! step specifications is the planner's job; nothing here parses solver
//! input syntax.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use cc_params::{ParameterSet, SolverConfig};
use cc_proxy::{StepOutput, StepSeries, StepSeriesBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{AppError, AppResult};

/// One reaction step handed to the solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSpec {
    pub description: String,
    pub payload: Value,
}

/// A single solver instance.
///
/// `invoke` takes `&mut self`: an instance serves one caller at a time and
/// may keep state between the steps of a model.
pub trait ReactionSolver {
    fn invoke(&mut self, step: &StepSpec) -> AppResult<StepOutput>;
}

/// Hands out one solver instance per model.
pub trait SolverFactory: Sync {
    fn create(&self) -> AppResult<Box<dyn ReactionSolver>>;

    /// Whether instances may run concurrently in one process. Parallel
    /// batches still run when this is false, with a warning.
    fn is_parallel_safe(&self) -> bool {
        false
    }
}

/// Turns a parameter set into the ordered steps of one model run.
pub trait StepPlanner: Sync {
    fn plan(&self, params: &ParameterSet) -> AppResult<Vec<StepSpec>>;
}

/// Uses a fixed list of step descriptions and embeds the model's parameter
/// map in every payload.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticStepPlanner {
    steps: Vec<String>,
}

impl StaticStepPlanner {
    pub fn new(steps: Vec<String>) -> Self {
        Self { steps }
    }
}

impl StepPlanner for StaticStepPlanner {
    fn plan(&self, params: &ParameterSet) -> AppResult<Vec<StepSpec>> {
        if self.steps.is_empty() {
            return Err(AppError::InvalidInput(format!(
                "no steps configured for model {}",
                params.id
            )));
        }
        Ok(self
            .steps
            .iter()
            .enumerate()
            .map(|(index, description)| StepSpec {
                description: description.clone(),
                payload: json!({
                    "model_id": params.id,
                    "step_index": index,
                    "parameters": params.values,
                }),
            })
            .collect())
    }
}

/// Runs an external program once per step: the [`StepSpec`] goes to stdin
/// as JSON and a JSON object of quantities is read from stdout. Non-numeric
/// entries in the reply are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSolver {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessSolver {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl ReactionSolver for ProcessSolver {
    fn invoke(&mut self, step: &StepSpec) -> AppResult<StepOutput> {
        let io_err = |source| AppError::SolverProcess {
            program: self.program.clone(),
            source,
        };
        let input = serde_json::to_vec(step).map_err(|e| AppError::Solver {
            step: step.description.clone(),
            message: e.to_string(),
        })?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(io_err)?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&input).map_err(io_err)?;
        }
        let output = child.wait_with_output().map_err(io_err)?;

        if !output.status.success() {
            return Err(AppError::Solver {
                step: step.description.clone(),
                message: format!(
                    "exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        parse_reply(&step.description, &output.stdout)
    }
}

fn parse_reply(step: &str, stdout: &[u8]) -> AppResult<StepOutput> {
    let reply: serde_json::Map<String, Value> =
        serde_json::from_slice(stdout).map_err(|e| AppError::Solver {
            step: step.to_string(),
            message: format!("unreadable reply: {e}"),
        })?;
    Ok(reply
        .into_iter()
        .filter_map(|(k, v)| v.as_f64().map(|x| (k, x)))
        .collect())
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSolverFactory {
    config: SolverConfig,
}

impl ProcessSolverFactory {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }
}

impl SolverFactory for ProcessSolverFactory {
    fn create(&self) -> AppResult<Box<dyn ReactionSolver>> {
        Ok(Box::new(ProcessSolver::new(
            self.config.program.clone(),
            self.config.args.clone(),
        )))
    }

    fn is_parallel_safe(&self) -> bool {
        self.config.parallel_safe
    }
}

/// Invoke `solver` for every step in order and collect the raw series.
pub fn solve_steps(solver: &mut dyn ReactionSolver, steps: &[StepSpec]) -> AppResult<StepSeries> {
    let mut builder = StepSeriesBuilder::new();
    for step in steps {
        let output = solver.invoke(step)?;
        debug!(step = %step.description, quantities = output.len(), "step solved");
        builder.push(step.description.clone(), &output);
    }
    Ok(builder.build()?)
}
