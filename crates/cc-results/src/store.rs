//! Run storage API.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use cc_params::ParameterSet;
use cc_proxy::StepSeries;
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::hash::fingerprint;
use crate::types::{ModelRun, StoreManifest};
use crate::{ResultsError, ResultsResult};

const SETTINGS_FILE: &str = "settings.json";
const RESULTS_FILE: &str = "results.json";
const MANIFEST_FILE: &str = "manifest.json";

/// Index-aligned `settings.json` / `results.json` pair in one output
/// directory.
#[derive(Debug, Clone)]
pub struct ResultStore {
    root_dir: PathBuf,
}

impl ResultStore {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root_dir.join(SETTINGS_FILE)
    }

    pub fn results_path(&self) -> PathBuf {
        self.root_dir.join(RESULTS_FILE)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root_dir.join(MANIFEST_FILE)
    }

    pub fn has_runs(&self) -> bool {
        self.settings_path().exists() && self.results_path().exists()
    }

    /// Replace the stored runs with `runs`, in the given order.
    pub fn save(&self, runs: &[ModelRun]) -> ResultsResult<StoreManifest> {
        fs::create_dir_all(&self.root_dir).map_err(|source| ResultsError::Io {
            path: self.root_dir.clone(),
            source,
        })?;

        let settings: Vec<&ParameterSet> = runs.iter().map(|r| &r.params).collect();
        let results: Vec<&StepSeries> = runs.iter().map(|r| &r.series).collect();
        write_json(&self.settings_path(), &settings)?;
        write_json(&self.results_path(), &results)?;

        let now = Utc::now().to_rfc3339();
        let created = self
            .load_manifest()
            .map(|m| m.created)
            .unwrap_or_else(|_| now.clone());
        let manifest = StoreManifest {
            created,
            updated: now,
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            models: runs.len(),
            fingerprints: settings.iter().map(|p| fingerprint(p)).collect(),
        };
        write_json(&self.manifest_path(), &manifest)?;

        info!(dir = %self.root_dir.display(), models = runs.len(), "results saved");
        Ok(manifest)
    }

    pub fn load(&self) -> ResultsResult<Vec<ModelRun>> {
        if !self.has_runs() {
            return Err(ResultsError::NotFound {
                path: self.root_dir.clone(),
            });
        }
        let settings: Vec<ParameterSet> = read_json(&self.settings_path())?;
        let results: Vec<StepSeries> = read_json(&self.results_path())?;
        if settings.len() != results.len() {
            return Err(ResultsError::Misaligned {
                path: self.root_dir.clone(),
                settings: settings.len(),
                results: results.len(),
            });
        }
        Ok(settings
            .into_iter()
            .zip(results)
            .map(|(params, series)| ModelRun::new(params, series))
            .collect())
    }

    pub fn load_manifest(&self) -> ResultsResult<StoreManifest> {
        read_json(&self.manifest_path())
    }

    /// Previously stored runs, or none when the directory holds no results.
    ///
    /// Lookups are keyed by the manifest fingerprints. A missing or
    /// misaligned manifest falls back to fingerprinting the loaded settings.
    pub fn previous_runs(&self) -> ResultsResult<PreviousRuns> {
        if !self.has_runs() {
            return Ok(PreviousRuns::default());
        }
        let runs = self.load()?;
        match self.load_manifest() {
            Ok(manifest) if manifest.fingerprints.len() == runs.len() => {
                Ok(PreviousRuns::with_fingerprints(runs, manifest.fingerprints))
            }
            Ok(manifest) => {
                warn!(
                    dir = %self.root_dir.display(),
                    fingerprints = manifest.fingerprints.len(),
                    models = runs.len(),
                    "manifest out of step with settings, recomputing fingerprints"
                );
                Ok(PreviousRuns::new(runs))
            }
            Err(_) => Ok(PreviousRuns::new(runs)),
        }
    }
}

/// Load and concatenate the runs stored in several directories.
pub fn load_runs(dirs: &[PathBuf]) -> ResultsResult<Vec<ModelRun>> {
    let mut runs = Vec::new();
    for dir in dirs {
        let loaded = ResultStore::new(dir).load()?;
        info!(dir = %dir.display(), models = loaded.len(), "runs loaded");
        runs.extend(loaded);
    }
    Ok(runs)
}

/// Completed runs keyed by fingerprint, for reuse lookups.
#[derive(Debug, Clone, Default)]
pub struct PreviousRuns {
    runs: Vec<ModelRun>,
    by_fingerprint: HashMap<String, Vec<usize>>,
}

impl PreviousRuns {
    pub fn new(runs: Vec<ModelRun>) -> Self {
        let fingerprints = runs.iter().map(|run| fingerprint(&run.params)).collect();
        Self::with_fingerprints(runs, fingerprints)
    }

    /// Index `runs` by precomputed fingerprints, one per run in order.
    pub fn with_fingerprints(runs: Vec<ModelRun>, fingerprints: Vec<String>) -> Self {
        let mut by_fingerprint: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, key) in fingerprints.into_iter().enumerate().take(runs.len()) {
            by_fingerprint.entry(key).or_default().push(i);
        }
        Self {
            runs,
            by_fingerprint,
        }
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// A stored run whose inputs equal `params` exactly, `id` aside.
    pub fn find(&self, params: &ParameterSet) -> Option<&ModelRun> {
        self.by_fingerprint
            .get(&fingerprint(params))?
            .iter()
            .map(|&i| &self.runs[i])
            .find(|run| run.params.same_inputs(params))
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> ResultsResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|source| ResultsError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| ResultsError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> ResultsResult<T> {
    let content = fs::read_to_string(path).map_err(|source| ResultsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ResultsError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(id: u32, gas: f64) -> ModelRun {
        ModelRun::new(
            ParameterSet::new(id).with("gas_volume", gas),
            StepSeries::new(vec!["dissolve_bedrock".into()]),
        )
    }

    #[test]
    fn previous_runs_match_on_inputs_only() {
        let prev = PreviousRuns::new(vec![run(0, 10.0), run(1, 20.0)]);
        let hit = prev.find(&ParameterSet::new(7).with("gas_volume", 20.0));
        assert_eq!(hit.map(ModelRun::id), Some(1));
        assert!(prev.find(&ParameterSet::new(7).with("gas_volume", 21.0)).is_none());
        assert!(
            prev.find(&ParameterSet::new(7).with("gas_volume", 20.0).with("reprecip", false))
                .is_none()
        );
    }

    #[test]
    fn empty_directory_has_no_previous_runs() {
        let store = ResultStore::new(std::env::temp_dir().join("cc_results_never_written"));
        assert!(store.previous_runs().unwrap().is_empty());
        assert!(matches!(store.load(), Err(ResultsError::NotFound { .. })));
    }

    fn unique_temp_dir(prefix: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("{prefix}_{nanos}"))
    }

    #[test]
    fn reuse_lookup_is_keyed_by_manifest_fingerprints() {
        let dir = unique_temp_dir("cc_results_manifest_keys");
        let store = ResultStore::new(&dir);
        let mut manifest = store.save(&[run(0, 10.0), run(1, 20.0)]).unwrap();

        let wanted = ParameterSet::new(5).with("gas_volume", 20.0);
        let found = store.previous_runs().unwrap().find(&wanted).map(ModelRun::id);
        assert_eq!(found, Some(1));

        manifest.fingerprints[1] = "0".repeat(64);
        write_json(&store.manifest_path(), &manifest).unwrap();
        assert!(store.previous_runs().unwrap().find(&wanted).is_none());

        manifest.fingerprints.pop();
        write_json(&store.manifest_path(), &manifest).unwrap();
        let found = store.previous_runs().unwrap().find(&wanted).map(ModelRun::id);
        assert_eq!(found, Some(1));

        std::fs::remove_dir_all(&dir).ok();
    }
}
