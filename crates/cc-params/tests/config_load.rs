use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use cc_params::{
    BatchConfig, MatchScope, ParamsError, RunMode, load_config, save_json, save_yaml,
};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    dir
}

const CONFIG: &str = r#"
output_dir: results/run1
steps: [dissolve_bedrock, degas_1, CaCO3_precipitation_1]
models:
  - temperature: 10
    soil_pCO2: 24000
    precipitate_mineralogy: Calcite
    user_filepath: measured.csv
    tolerance_d13C: 0.25
  - temperature: 15
    soil_pCO2: 24000
    precipitate_mineralogy: Aragonite
"#;

#[test]
fn yaml_and_json_roundtrip() {
    let dir = unique_temp_dir("cc_params_config");
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    let yaml_path = dir.join("batch.yaml");
    fs::write(&yaml_path, CONFIG).expect("failed to write config");

    let config = load_config(&yaml_path).expect("failed to load yaml");
    assert_eq!(config.mode, RunMode::Serial);
    assert_eq!(config.cda.scope, MatchScope::AllSteps);
    let sets = config.parameter_sets();
    assert_eq!(sets.len(), 2);
    assert_eq!(sets[1].id, 1);
    assert_eq!(
        sets[0].tolerances().get(cc_params::Proxy::D13C),
        0.25
    );

    let json_path = dir.join("batch.json");
    save_json(&json_path, &config).expect("failed to save json");
    let reloaded = load_config(&json_path).expect("failed to load json");
    assert_eq!(reloaded, config);

    let yaml_again = dir.join("again.yml");
    save_yaml(&yaml_again, &config).expect("failed to save yaml");
    let reloaded: BatchConfig = load_config(&yaml_again).expect("failed to reload yaml");
    assert_eq!(reloaded.parameter_sets(), sets);
}

#[test]
fn unknown_extension_is_rejected() {
    let err = load_config(std::path::Path::new("batch.toml")).unwrap_err();
    assert!(matches!(err, ParamsError::UnsupportedFormat(ext) if ext == "toml"));
}
