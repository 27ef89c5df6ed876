//! Measured proxy time series supplied by the user.

use std::path::{Path, PathBuf};

use cc_params::Proxy;

use crate::error::{CdaError, CdaResult};
use crate::table::{Table, read_table};

/// Substring identifying each measured column after normalisation. The
/// first column containing the substring is used.
pub const AGE_COLUMN: &str = "age";
pub const PROXY_COLUMNS: [(Proxy, &str); 8] = [
    (Proxy::D13C, "d13c"),
    (Proxy::D18O, "d18o"),
    (Proxy::MgCa, "mgca"),
    (Proxy::Dcp, "dcp"),
    (Proxy::D44Ca, "d44ca"),
    (Proxy::SrCa, "srca"),
    (Proxy::BaCa, "baca"),
    (Proxy::UCa, "uca"),
];

/// Trim, lower-case and keep only ASCII letters and digits.
///
/// `" d13C (‰ VPDB)"` becomes `"d13cvpdb"`.
pub fn normalize_column(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Index of the first normalised column containing `token`.
pub fn find_column(normalized: &[String], token: &str) -> Option<usize> {
    normalized.iter().position(|c| c.contains(token))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasuredSeries {
    pub source: PathBuf,
    pub ages: Vec<f64>,
    /// One entry per proxy in [`Proxy::ALL`] order; `None` when the file has
    /// no column for that proxy.
    columns: [Option<Vec<Option<f64>>>; 8],
}

impl MeasuredSeries {
    pub fn load(path: &Path) -> CdaResult<Self> {
        let table = read_table(path)?;
        Self::from_table(path, &table)
    }

    /// Rows with a blank or unparsable age are dropped. Blank proxy cells
    /// are missing for that row only.
    pub fn from_table(path: &Path, table: &Table) -> CdaResult<Self> {
        let normalized: Vec<String> = table.header.iter().map(|h| normalize_column(h)).collect();
        let age_col = find_column(&normalized, AGE_COLUMN).ok_or_else(|| CdaError::MissingColumn {
            path: path.to_path_buf(),
            column: AGE_COLUMN,
        })?;

        let proxy_cols: Vec<(Proxy, usize)> = PROXY_COLUMNS
            .iter()
            .filter_map(|(proxy, token)| find_column(&normalized, token).map(|c| (*proxy, c)))
            .collect();

        let mut series = MeasuredSeries {
            source: path.to_path_buf(),
            ..Default::default()
        };
        for (proxy, _) in &proxy_cols {
            series.columns[proxy.index()] = Some(Vec::new());
        }

        for row in &table.rows {
            let Some(age) = cell(row, age_col) else {
                continue;
            };
            series.ages.push(age);
            for (proxy, col) in &proxy_cols {
                if let Some(values) = series.columns[proxy.index()].as_mut() {
                    values.push(cell(row, *col));
                }
            }
        }
        Ok(series)
    }

    pub fn len(&self) -> usize {
        self.ages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ages.is_empty()
    }

    pub fn has(&self, proxy: Proxy) -> bool {
        self.columns[proxy.index()].is_some()
    }

    /// Proxies with a column in the file, in table order.
    pub fn present(&self) -> Vec<Proxy> {
        Proxy::ALL.into_iter().filter(|p| self.has(*p)).collect()
    }

    pub fn value(&self, proxy: Proxy, row: usize) -> Option<f64> {
        self.columns[proxy.index()].as_ref()?.get(row).copied().flatten()
    }
}

fn cell(row: &[String], col: usize) -> Option<f64> {
    row.get(col)?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(text: &str) -> Table {
        Table::parse(Path::new("m.csv"), text).unwrap()
    }

    #[test]
    fn normalization() {
        assert_eq!(normalize_column("  Mg/Ca (mmol/mol) "), "mgcammolmol");
        assert_eq!(normalize_column("δ13C"), "13c");
        assert_eq!(normalize_column("d13C_VPDB"), "d13cvpdb");
        assert_eq!(normalize_column("Age (ka BP)"), "agekabp");
    }

    #[test]
    fn fuzzy_column_matching() {
        let m = MeasuredSeries::from_table(
            Path::new("m.csv"),
            &table("Age (yr BP),d13C (permil),Sr/Ca\n100,-8.1,0.05\n200,-8.4,\n"),
        )
        .unwrap();
        assert_eq!(m.ages, vec![100.0, 200.0]);
        assert_eq!(m.present(), vec![Proxy::D13C, Proxy::SrCa]);
        assert_eq!(m.value(Proxy::D13C, 1), Some(-8.4));
        assert_eq!(m.value(Proxy::SrCa, 1), None);
        assert_eq!(m.value(Proxy::MgCa, 0), None);
    }

    #[test]
    fn rows_without_age_are_dropped() {
        let m = MeasuredSeries::from_table(
            Path::new("m.csv"),
            &table("age,d18o\n1,-5\n,-6\n3,NaN\n"),
        )
        .unwrap();
        assert_eq!(m.ages, vec![1.0, 3.0]);
        assert_eq!(m.value(Proxy::D18O, 0), Some(-5.0));
        assert_eq!(m.value(Proxy::D18O, 1), None);
    }

    #[test]
    fn age_column_is_required() {
        let err = MeasuredSeries::from_table(Path::new("m.csv"), &table("time,d13c\n1,2\n"))
            .unwrap_err();
        assert!(matches!(err, CdaError::MissingColumn { column: "age", .. }));
        assert!(err.to_string().contains("m.csv"));
    }

    #[test]
    fn header_only_file_is_empty() {
        let m = MeasuredSeries::from_table(Path::new("m.csv"), &table("age,d13c\n")).unwrap();
        assert!(m.is_empty());
        assert!(m.has(Proxy::D13C));
    }
}
