//! Stored run types.

use cc_params::ParameterSet;
use cc_proxy::StepSeries;
use serde::{Deserialize, Serialize};

/// One model's settings and its derived step series.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRun {
    pub params: ParameterSet,
    pub series: StepSeries,
}

impl ModelRun {
    pub fn new(params: ParameterSet, series: StepSeries) -> Self {
        Self { params, series }
    }

    pub fn id(&self) -> u32 {
        self.params.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreManifest {
    pub created: String,
    pub updated: String,
    pub tool_version: String,
    pub models: usize,
    /// One per stored parameter set, index-aligned with `settings.json`.
    pub fingerprints: Vec<String>,
}
