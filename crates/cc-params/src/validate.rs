//! Batch config validation.

use std::collections::HashSet;

use crate::config::BatchConfig;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate model id: {id}")]
    DuplicateId { id: u32 },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

pub fn validate_config(config: &BatchConfig) -> Result<(), ValidationError> {
    if config.output_dir.as_os_str().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "output_dir".to_string(),
            value: String::new(),
            reason: "must not be empty".to_string(),
        });
    }

    if config.steps.iter().any(|s| s.trim().is_empty()) {
        return Err(ValidationError::InvalidValue {
            field: "steps".to_string(),
            value: String::new(),
            reason: "step descriptions must not be blank".to_string(),
        });
    }

    let mut ids = HashSet::new();
    for set in config.parameter_sets() {
        if !ids.insert(set.id) {
            return Err(ValidationError::DuplicateId { id: set.id });
        }
        if set.precipitate_mineralogy().is_err() {
            let value = set.get("precipitate_mineralogy").filter(|v| !v.is_null());
            return Err(ValidationError::InvalidValue {
                field: format!("models[{}].precipitate_mineralogy", set.id),
                value: value.map(|v| v.to_string()).unwrap_or_default(),
                reason: match value {
                    Some(_) => "expected Calcite or Aragonite".to_string(),
                    None => "required".to_string(),
                },
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> BatchConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn accepts_minimal_config() {
        assert!(validate_config(&parse("output_dir: out\n")).is_ok());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let config = parse(
            "output_dir: out\nmodels:\n  - {id: 1, precipitate_mineralogy: Calcite}\n  - {precipitate_mineralogy: Calcite}\n  - {id: 1, precipitate_mineralogy: Calcite}\n",
        );
        assert!(matches!(
            validate_config(&config),
            Err(ValidationError::DuplicateId { id: 1 })
        ));
    }

    #[test]
    fn rejects_unknown_mineralogy() {
        let config = parse("output_dir: out\nmodels:\n  - precipitate_mineralogy: Vaterite\n");
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("Vaterite"));
    }

    #[test]
    fn rejects_model_without_mineralogy() {
        let config = parse("output_dir: out\nmodels:\n  - soil_pCO2: 3000\n");
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidValue { ref field, ref reason, .. }
                if field == "models[0].precipitate_mineralogy" && reason == "required"
        ));
    }
}
