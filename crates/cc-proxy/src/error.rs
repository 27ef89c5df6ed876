use cc_params::ParamsError;
use thiserror::Error;

pub type ProxyResult<T> = Result<T, ProxyError>;

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("No step description contains '{tag}'")]
    MissingStep { tag: &'static str },

    #[error("Model output is missing '{key}'")]
    MissingKey { key: String },

    #[error("Series '{key}' has {found} values, expected {expected}")]
    LengthMismatch {
        key: String,
        expected: usize,
        found: usize,
    },

    #[error("{what} needs at least {needed} steps, found {found}")]
    TooFewSteps {
        what: &'static str,
        needed: usize,
        found: usize,
    },

    #[error(transparent)]
    Params(#[from] ParamsError),
}
