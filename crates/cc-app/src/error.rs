//! Error types for the cc-app service layer.

use std::path::PathBuf;

/// Application error type wrapping the backend crates' errors for the CLI.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Proxy derivation failed: {0}")]
    Derive(String),

    #[error("CDA error: {0}")]
    Cda(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Solver error at step '{step}': {message}")]
    Solver { step: String, message: String },

    #[error("Failed to run solver program {program}")]
    SolverProcess {
        program: PathBuf,
        source: std::io::Error,
    },

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for cc-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<cc_params::ParamsError> for AppError {
    fn from(err: cc_params::ParamsError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<cc_params::ValidationError> for AppError {
    fn from(err: cc_params::ValidationError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<cc_proxy::ProxyError> for AppError {
    fn from(err: cc_proxy::ProxyError) -> Self {
        AppError::Derive(err.to_string())
    }
}

impl From<cc_cda::CdaError> for AppError {
    fn from(err: cc_cda::CdaError) -> Self {
        AppError::Cda(err.to_string())
    }
}

impl From<cc_results::ResultsError> for AppError {
    fn from(err: cc_results::ResultsError) -> Self {
        AppError::Results(err.to_string())
    }
}
