//! Content hashing of parameter sets.

use cc_params::ParameterSet;
use sha2::{Digest, Sha256};

/// SHA-256 over the parameter values, ignoring `id`. Equal fingerprints are a
/// prefilter only; reuse still requires [`ParameterSet::same_inputs`].
pub fn fingerprint(params: &ParameterSet) -> String {
    let mut hasher = Sha256::new();
    let values_json = serde_json::to_string(&params.values).unwrap_or_default();
    hasher.update(values_json.as_bytes());
    format!("{:x}", hasher.finalize())
}
