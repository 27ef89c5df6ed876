//! Batch configuration file schema.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::params::{ParamValue, ParameterSet};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchConfig {
    pub output_dir: PathBuf,
    #[serde(default)]
    pub mode: RunMode,
    #[serde(default = "default_true")]
    pub reuse_previous: bool,
    #[serde(default)]
    pub cda: CdaConfig,
    /// Step descriptions handed to the step planner, in order.
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solver: Option<SolverConfig>,
    #[serde(default)]
    pub models: Vec<ModelDef>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    #[default]
    Serial,
    /// Experimental: solver instances run concurrently.
    Parallel,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchScope {
    #[default]
    AllSteps,
    FinalStep,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CdaConfig {
    #[serde(default)]
    pub scope: MatchScope,
}

/// External solver program, run once per step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SolverConfig {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub parallel_safe: bool,
}

/// One already-expanded model. `id` defaults to the model's position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    #[serde(flatten)]
    pub values: BTreeMap<String, ParamValue>,
}

impl BatchConfig {
    pub fn parameter_sets(&self) -> Vec<ParameterSet> {
        self.models
            .iter()
            .enumerate()
            .map(|(i, model)| ParameterSet {
                id: model.id.unwrap_or(i as u32),
                values: model.values.clone(),
            })
            .collect()
    }
}
