//! Paleo-rainfall estimate from measured d44Ca.
//!
//! Treats prior calcite precipitation as Rayleigh distillation of calcium:
//! the remaining fraction `f` follows from `R_s / (alpha * R_0) = f^(alpha-1)`
//! and rainfall scales with `f_paleo / f_modern`.

use std::fs;
use std::path::{Path, PathBuf};

use cc_core::celsius_to_kelvin;
use cc_params::{Mineralogy, ParameterSet, ParamsError, Proxy};
use cc_thermo::ThermoDatabase;
use tracing::info;

use crate::error::{CdaError, CdaResult};
use crate::measured::MeasuredSeries;
use crate::table::{Table, write_table};

pub const RAINFALL_FILE: &str = "rainfall_calculator.csv";

#[derive(Debug, Clone, PartialEq)]
pub struct RainfallInputs {
    pub database: PathBuf,
    pub measured: PathBuf,
    pub mineralogy: Mineralogy,
    pub temperature_c: f64,
    pub bedrock_d44ca: f64,
    pub d44ca_modern: f64,
    pub rainfall_amount: f64,
}

impl RainfallInputs {
    pub fn from_params(params: &ParameterSet) -> CdaResult<Self> {
        let path = |key: &str| -> CdaResult<PathBuf> {
            params
                .text(key)
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
                .ok_or_else(|| {
                    CdaError::Params(ParamsError::MissingKey {
                        id: params.id,
                        key: key.to_string(),
                    })
                })
        };
        Ok(Self {
            database: path("database")?,
            measured: path("user_filepath")?,
            mineralogy: params.precipitate_mineralogy()?,
            temperature_c: params.temperature()?,
            bedrock_d44ca: params.require_number("bedrock_d44Ca")?,
            d44ca_modern: params.require_number("d44Ca_modern")?,
            rainfall_amount: params.require_number("rainfall_amount")?,
        })
    }

    fn species_pair(&self) -> &'static str {
        match self.mineralogy {
            Mineralogy::Calcite => "Calcite/Ca(aq)",
            Mineralogy::Aragonite => "Aragonite/Ca(aq)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RainfallRow {
    pub age: f64,
    pub d44ca: f64,
    pub f_paleo: f64,
    pub rainfall_paleo: f64,
}

/// Remaining calcium fraction for a precipitate d44Ca given the source
/// d44Ca and the precipitate/solution fractionation factor.
pub fn remaining_fraction(d44ca: f64, source_d44ca: f64, alpha: f64) -> f64 {
    let rs = d44ca / 1000.0 + 1.0;
    let ro = source_d44ca / 1000.0 + 1.0;
    (rs / (alpha * ro)).powf(1.0 / (alpha - 1.0))
}

/// Rows for every measured timepoint with a d44Ca value.
pub fn rainfall_rows(inputs: &RainfallInputs, measured: &MeasuredSeries, alpha: f64) -> CdaResult<Vec<RainfallRow>> {
    if !measured.has(Proxy::D44Ca) {
        return Err(CdaError::NoData {
            path: measured.source.clone(),
            column: "d44ca",
        });
    }
    let f_modern = remaining_fraction(inputs.d44ca_modern, inputs.bedrock_d44ca, alpha);
    Ok((0..measured.len())
        .filter_map(|row| {
            let d44ca = measured.value(Proxy::D44Ca, row)?;
            let f_paleo = remaining_fraction(d44ca, inputs.bedrock_d44ca, alpha);
            Some(RainfallRow {
                age: measured.ages[row],
                d44ca,
                f_paleo,
                rainfall_paleo: inputs.rainfall_amount * f_paleo / f_modern,
            })
        })
        .collect())
}

/// Run the calculator for one parameter set and write
/// `<output_dir>/rainfall_calculator.csv`.
pub fn run_rainfall_calculator(params: &ParameterSet, output_dir: &Path) -> CdaResult<(PathBuf, Vec<RainfallRow>)> {
    let inputs = RainfallInputs::from_params(params)?;
    let measured = MeasuredSeries::load(&inputs.measured)?;
    let mut db = ThermoDatabase::open(&inputs.database)?;
    let alpha = db.get_alpha(
        "44Ca",
        inputs.species_pair(),
        celsius_to_kelvin(inputs.temperature_c),
    )?;
    let rows = rainfall_rows(&inputs, &measured, alpha)?;

    let mut table = Table::new(
        ["age", "d44Ca", "f_paleo", "rainfall_paleo"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    );
    for r in &rows {
        table.rows.push(vec![
            r.age.to_string(),
            r.d44ca.to_string(),
            r.f_paleo.to_string(),
            r.rainfall_paleo.to_string(),
        ]);
    }

    fs::create_dir_all(output_dir).map_err(|e| CdaError::io(output_dir, e))?;
    let path = output_dir.join(RAINFALL_FILE);
    write_table(&path, &table)?;
    info!(path = %path.display(), rows = rows.len(), alpha, "rainfall calculator written");
    Ok((path, rows))
}
