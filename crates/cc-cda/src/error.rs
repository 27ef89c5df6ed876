//! Comparison and table persistence errors.

use std::path::PathBuf;

use cc_params::ParamsError;
use cc_thermo::ThermoError;
use thiserror::Error;

pub type CdaResult<T> = Result<T, CdaError>;

#[derive(Error, Debug)]
pub enum CdaError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path}: no column containing '{column}'")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("{path}:{line}: {reason}")]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Measured data in {path} has no '{column}' values")]
    NoData { path: PathBuf, column: &'static str },

    #[error(transparent)]
    Params(#[from] ParamsError),

    #[error(transparent)]
    Thermo(#[from] ThermoError),
}

impl CdaError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        CdaError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
