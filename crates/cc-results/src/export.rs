//! Flat CSV and structured JSON exports of stored runs.

use std::fs;
use std::path::{Path, PathBuf};

use cc_cda::table::{Table, write_table};
use cc_params::ParamValue;
use serde_json::{Map, Value, json};
use tracing::info;

use crate::types::ModelRun;
use crate::{ResultsError, ResultsResult};

/// Stand-in for missing values in the structured export.
pub const MISSING_VALUE: f64 = -999.0;

/// Write `out_<i>.csv` per run into `dir`, columns in alphabetical order
/// with `step_desc` among them. Missing values are left empty.
pub fn export_csvs(runs: &[ModelRun], dir: &Path) -> ResultsResult<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|source| ResultsError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::with_capacity(runs.len());
    for (i, run) in runs.iter().enumerate() {
        let mut columns: Vec<(&str, Vec<String>)> = run
            .series
            .iter()
            .map(|(key, values)| {
                let cells = values
                    .iter()
                    .map(|v| v.map(|x| x.to_string()).unwrap_or_default())
                    .collect();
                (key, cells)
            })
            .collect();
        columns.push(("step_desc", run.series.step_desc().to_vec()));
        columns.sort_by(|a, b| a.0.cmp(b.0));

        let mut table = Table::new(columns.iter().map(|(k, _)| k.to_string()).collect());
        for step in 0..run.series.len() {
            table
                .rows
                .push(columns.iter().map(|(_, cells)| cells[step].clone()).collect());
        }

        let path = dir.join(format!("out_{i}.csv"));
        write_table(&path, &table)?;
        written.push(path);
    }
    info!(dir = %dir.display(), files = written.len(), "csv export written");
    Ok(written)
}

/// Field name with `(` turned into `_` and `)`, `-`, `/`, `[`, `]` dropped.
pub fn sanitize_field_name(key: &str) -> String {
    key.chars()
        .filter_map(|c| match c {
            '(' => Some('_'),
            ')' | '-' | '/' | '[' | ']' => None,
            c => Some(c),
        })
        .collect()
}

/// `{ "m<i>": { "settings": {..}, "results": {..} } }` for every run.
pub fn struct_value(runs: &[ModelRun]) -> Value {
    let mut models = Map::new();
    for (i, run) in runs.iter().enumerate() {
        let mut settings = Map::new();
        for (key, value) in &run.params.values {
            settings.insert(sanitize_field_name(key), param_json(value));
        }

        let mut results = Map::new();
        for (key, values) in run.series.iter() {
            let column: Vec<f64> = values.iter().map(|v| v.unwrap_or(MISSING_VALUE)).collect();
            results.insert(sanitize_field_name(key), json!(column));
        }
        results.insert("step_desc".to_string(), json!(run.series.step_desc()));

        models.insert(
            format!("m{i}"),
            json!({ "settings": settings, "results": results }),
        );
    }
    Value::Object(models)
}

pub fn export_struct(runs: &[ModelRun], path: &Path) -> ResultsResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ResultsError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let json = serde_json::to_string_pretty(&struct_value(runs)).map_err(|source| {
        ResultsError::Json {
            path: path.to_path_buf(),
            source,
        }
    })?;
    fs::write(path, json).map_err(|source| ResultsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), models = runs.len(), "structured export written");
    Ok(())
}

fn param_json(value: &ParamValue) -> Value {
    match value {
        ParamValue::Number(v) if v.is_finite() => json!(v),
        ParamValue::Number(_) | ParamValue::Null => json!(MISSING_VALUE),
        ParamValue::Bool(b) => json!(b),
        ParamValue::Text(s) => json!(s),
    }
}
