//! Database lookup errors.

use std::path::PathBuf;
use thiserror::Error;

pub type ThermoResult<T> = Result<T, ThermoError>;

#[derive(Error, Debug)]
pub enum ThermoError {
    #[error("Failed to read database file: {path}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// No header line matched the requested entry.
    #[error("No {section} entry matched: {key}")]
    EntryNotFound { section: &'static str, key: String },

    #[error("Could not parse '{token}' in entry {entry}")]
    Parse { entry: String, token: String },

    #[error("Indirection too deep while resolving {key}")]
    IndirectionTooDeep { key: String },

    #[error("No isotope standard found for [{isotope}]")]
    IsotopeStandardNotFound { isotope: String },

    #[error("Entry {entry} evaluated to a non-finite value: {source}")]
    Numeric {
        entry: String,
        source: cc_core::CoreError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_names_the_key() {
        let err = ThermoError::EntryNotFound {
            section: "PHASES",
            key: "Ca+2 + CO3-2".into(),
        };
        assert!(err.to_string().contains("Ca+2 + CO3-2"));
        assert!(err.to_string().contains("PHASES"));
    }
}
