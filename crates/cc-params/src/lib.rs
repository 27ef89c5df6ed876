//! cc-params: model parameter sets, tolerances and the batch configuration file.

pub mod config;
pub mod params;
pub mod tolerance;
pub mod validate;

pub use config::{BatchConfig, CdaConfig, MatchScope, ModelDef, RunMode, SolverConfig};
pub use params::{Mineralogy, ParamValue, ParameterSet};
pub use tolerance::{Proxy, ToleranceSet};
pub use validate::{ValidationError, validate_config};

use std::path::Path;

pub type ParamsResult<T> = Result<T, ParamsError>;

#[derive(thiserror::Error, Debug)]
pub enum ParamsError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Missing parameter '{key}' in model {id}")]
    MissingKey { id: u32, key: String },

    #[error("Parameter '{key}' in model {id} has the wrong type: expected {expected}")]
    WrongType {
        id: u32,
        key: String,
        expected: &'static str,
    },

    #[error("Unknown mineralogy '{value}' in model {id} (expected Calcite or Aragonite)")]
    UnknownMineralogy { id: u32, value: String },

    #[error("Unsupported config extension: {0}")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_yaml(path: &Path) -> ParamsResult<BatchConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: BatchConfig = serde_yaml::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn save_yaml(path: &Path, config: &BatchConfig) -> ParamsResult<()> {
    validate_config(config)?;
    let content = serde_yaml::to_string(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &Path) -> ParamsResult<BatchConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: BatchConfig = serde_json::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn save_json(path: &Path, config: &BatchConfig) -> ParamsResult<()> {
    validate_config(config)?;
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load a batch config, picking the format from the file extension.
pub fn load_config(path: &Path) -> ParamsResult<BatchConfig> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => load_yaml(path),
        Some("json") => load_json(path),
        other => Err(ParamsError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}
