//! The four CDA tables kept in `<output_dir>/CDA Results`.
//!
//! Tolerances are overwritten, input ranges merged, all-outputs and matches
//! appended. A single writer must own these files at a time.

use std::fs;
use std::path::{Path, PathBuf};

use cc_params::{ParameterSet, Proxy};

use crate::engine::ModelComparison;
use crate::error::{CdaError, CdaResult};
use crate::record::record_header;
use crate::table::{Table, append_rows, read_table, write_table};

pub const RESULTS_DIR: &str = "CDA Results";

/// Swept inputs whose running min/max is reported.
pub const INPUT_RANGE_KEYS: [&str; 19] = [
    "soil_pCO2",
    "soil_d13C",
    "cave_pCO2",
    "gas_volume",
    "temperature",
    "atm_d18O",
    "bedrock_pyrite",
    "soil_U",
    "bedrock_UCa",
    "soil_Mg",
    "bedrock_MgCa",
    "soil_Ba",
    "bedrock_BaCa",
    "soil_Sr",
    "bedrock_SrCa",
    "soil_O2",
    "soil_R14C",
    "atm_pCO2",
    "atm_d13C",
];

#[derive(Debug, Clone, PartialEq)]
pub struct CdaTables {
    pub dir: PathBuf,
    pub tolerances: PathBuf,
    pub input_ranges: PathBuf,
    pub all_outputs: PathBuf,
    pub matches: PathBuf,
}

/// What one [`CdaTables::persist`] call wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistSummary {
    pub all_outputs: PathBuf,
    pub matches: PathBuf,
    pub created_all_outputs: bool,
    pub all_output_rows: usize,
    pub match_rows: usize,
}

impl CdaTables {
    pub fn new(output_dir: &Path) -> Self {
        let dir = output_dir.join(RESULTS_DIR);
        Self {
            tolerances: dir.join("Tolerances.csv"),
            input_ranges: dir.join("Input_Ranges.csv"),
            all_outputs: dir.join("All_outputs.csv"),
            matches: dir.join("Matches.csv"),
            dir,
        }
    }

    /// Write one model's comparison: tolerances, input ranges, all outputs,
    /// then matches when there are any.
    pub fn persist(&self, params: &ParameterSet, comparison: &ModelComparison) -> CdaResult<PersistSummary> {
        fs::create_dir_all(&self.dir).map_err(|e| CdaError::io(&self.dir, e))?;

        self.write_tolerances(comparison)?;
        self.merge_input_ranges(params)?;

        let header = record_header(&comparison.proxies);
        let created_all_outputs = !self.all_outputs.exists();
        let all_rows: Vec<_> = comparison
            .all_outputs
            .iter()
            .map(|r| r.cells(&comparison.proxies))
            .collect();
        let all_output_rows = append_rows(&self.all_outputs, &header, &all_rows)?;

        let match_rows = if comparison.matches.is_empty() {
            0
        } else {
            let rows: Vec<_> = comparison
                .matches
                .iter()
                .map(|r| r.cells(&comparison.proxies))
                .collect();
            append_rows(&self.matches, &header, &rows)?
        };

        Ok(PersistSummary {
            all_outputs: self.all_outputs.clone(),
            matches: self.matches.clone(),
            created_all_outputs,
            all_output_rows,
            match_rows,
        })
    }

    fn write_tolerances(&self, comparison: &ModelComparison) -> CdaResult<()> {
        let mut table = Table::new(vec!["Proxy".to_string(), "Tolerance Value".to_string()]);
        for (proxy, value) in comparison.tolerances.iter() {
            table.rows.push(vec![proxy.label().to_string(), value.to_string()]);
        }
        write_table(&self.tolerances, &table)
    }

    fn merge_input_ranges(&self, params: &ParameterSet) -> CdaResult<()> {
        let mut table = if self.input_ranges.exists() {
            read_table(&self.input_ranges)?
        } else {
            Table::new(vec![
                "Variable".to_string(),
                "Minimum".to_string(),
                "Maximum".to_string(),
            ])
        };

        for key in INPUT_RANGE_KEYS {
            let value = params.number(key);
            match table.rows.iter_mut().find(|row| row.first().map(String::as_str) == Some(key)) {
                Some(row) => {
                    row.resize(3, String::new());
                    let Some(v) = value else { continue };
                    row[1] = extreme(&row[1], v, f64::min);
                    row[2] = extreme(&row[2], v, f64::max);
                }
                None => {
                    let cell = value.map(|v| v.to_string()).unwrap_or_default();
                    table.rows.push(vec![key.to_string(), cell.clone(), cell]);
                }
            }
        }
        write_table(&self.input_ranges, &table)
    }

    /// Tolerances as last written, in table order.
    pub fn read_tolerances(&self) -> CdaResult<Vec<(Proxy, f64)>> {
        let table = read_table(&self.tolerances)?;
        Ok(table
            .rows
            .iter()
            .filter_map(|row| {
                let proxy = Proxy::from_label(row.first()?)?;
                let value = row.get(1)?.parse().ok()?;
                Some((proxy, value))
            })
            .collect())
    }
}

fn extreme(existing: &str, value: f64, pick: fn(f64, f64) -> f64) -> String {
    match existing.trim().parse::<f64>() {
        Ok(old) => pick(old, value).to_string(),
        Err(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_paths() {
        let t = CdaTables::new(Path::new("/tmp/out"));
        assert_eq!(t.dir, Path::new("/tmp/out/CDA Results"));
        assert!(t.matches.ends_with("CDA Results/Matches.csv"));
        assert!(t.input_ranges.ends_with("Input_Ranges.csv"));
    }

    #[test]
    fn extreme_keeps_running_bounds() {
        assert_eq!(extreme("", 3.0, f64::min), "3");
        assert_eq!(extreme("2", 3.0, f64::min), "2");
        assert_eq!(extreme("2", 3.0, f64::max), "3");
    }
}
