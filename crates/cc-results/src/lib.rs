//! cc-results: persisted model runs, exports and evaluation filters.

pub mod export;
pub mod hash;
pub mod query;
pub mod store;
pub mod types;

pub use export::{export_csvs, export_struct, sanitize_field_name};
pub use hash::fingerprint;
pub use query::{
    filter_by_index, filter_by_setting, filter_by_step_desc, filter_out_noprecip,
    settings_report,
};
pub use store::{PreviousRuns, ResultStore, load_runs};
pub use types::*;

use std::path::PathBuf;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("No stored runs in {path}")]
    NotFound { path: PathBuf },

    #[error("{path}: {settings} parameter sets but {results} result series")]
    Misaligned {
        path: PathBuf,
        settings: usize,
        results: usize,
    },

    #[error("Table error: {0}")]
    Table(#[from] cc_cda::CdaError),
}
