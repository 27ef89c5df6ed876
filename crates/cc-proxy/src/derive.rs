//! Post-processing of raw solver output into proxy records.

use cc_core::{ratio_or_zero, scrub_opt};
use cc_params::{Mineralogy, ParameterSet};
use tracing::debug;

use crate::error::{ProxyError, ProxyResult};
use crate::keys;
use crate::kinetic::{apply_kinetic_fractionation, apply_pcp_d18o};
use crate::radiocarbon::normalise_radiocarbon;
use crate::series::StepSeries;

/// Solver-reported U concentrations are scaled up by this factor to keep the
/// solver's isotope bookkeeping stable.
const U_SCALE: f64 = 0.001;

/// Run every post-processing stage on one model's output, in place.
///
/// Fails when the series has no dissolution step or lacks a quantity the
/// stages depend on.
pub fn derive_proxies(series: &mut StepSeries, params: &ParameterSet) -> ProxyResult<()> {
    let mineralogy = params.precipitate_mineralogy()?;

    remaining_fractions(series)?;
    trace_element_ratios(series, mineralogy)?;
    rescale_uranium(series, mineralogy);
    d18o_to_vpdb(series, mineralogy)?;
    tidy(series);
    normalise_radiocarbon(series)?;
    apply_kinetic_fractionation(series, params, mineralogy)?;
    apply_pcp_d18o(series, params, mineralogy)?;
    series.map_values(scrub_opt);

    debug!(id = params.id, steps = series.len(), "proxies derived");
    Ok(())
}

/// Adds `f_ca` and `f_c`, the fractions of Ca and C left in solution
/// relative to the first dissolution step.
pub fn remaining_fractions(series: &mut StepSeries) -> ProxyResult<()> {
    let init = series
        .first_step_containing("dissolve")
        .ok_or(ProxyError::MissingStep { tag: "dissolve" })?;

    for (source, target) in [(keys::CA, keys::F_CA), (keys::C, keys::F_C)] {
        let values = series.require(source)?;
        let fractions: Vec<Option<f64>> = match values[init] {
            // A zero initial value gives fractions of 0.
            Some(start) => values.iter().map(|v| v.map(|x| ratio_or_zero(x, start))).collect(),
            None => vec![None; values.len()],
        };
        series.insert(target, fractions)?;
    }
    Ok(())
}

/// Adds dissolved `X/Ca(mol/mol)` and precipitated `X/Ca(mol/mol)_<mineral>`
/// for Ba, Sr, Mg and U.
///
/// The precipitate ratio at a `CaCO3_precipitation` step is the X lost from
/// solution over the Ca lost since the previous step. It is 0 elsewhere and
/// whenever a denominator is 0.
pub fn trace_element_ratios(series: &mut StepSeries, mineralogy: Mineralogy) -> ProxyResult<()> {
    let water = series.require(keys::WATER_MASS)?.to_vec();
    let ca = series.require(keys::CA)?.to_vec();
    let dissolved_ca: Vec<Option<f64>> = ca
        .iter()
        .zip(&water)
        .map(|(c, w)| Some((*c)? * (*w)?))
        .collect();
    let precipitating: Vec<bool> = series
        .step_desc()
        .iter()
        .map(|d| d.contains("CaCO3_precipitation"))
        .collect();

    for element in keys::TRACE_ELEMENTS {
        let x = series.require(&keys::molality(element))?;
        let dissolved_x: Vec<Option<f64>> = x
            .iter()
            .zip(&water)
            .map(|(v, w)| Some((*v)? * (*w)?))
            .collect();

        let dissolved: Vec<Option<f64>> = dissolved_x
            .iter()
            .zip(&dissolved_ca)
            .map(|(x, ca)| Some(ratio_or_zero((*x)?, (*ca)?)))
            .collect();

        let precipitated: Vec<Option<f64>> = (0..series.len())
            .map(|i| {
                if !precipitating[i] || i == 0 {
                    return Some(0.0);
                }
                let solid_x = dissolved_x[i]? - dissolved_x[i - 1]?;
                let solid_ca = dissolved_ca[i]? - dissolved_ca[i - 1]?;
                Some(ratio_or_zero(solid_x, solid_ca))
            })
            .collect();

        series.insert(keys::dissolved_ratio(element), dissolved)?;
        series.insert(keys::precipitate_ratio(element, mineralogy), precipitated)?;
    }
    Ok(())
}

/// Undo the solver-side U scaling on both U/Ca series.
pub fn rescale_uranium(series: &mut StepSeries, mineralogy: Mineralogy) {
    for key in [
        keys::dissolved_ratio("U"),
        keys::precipitate_ratio("U", mineralogy),
    ] {
        if let Some(values) = series.get_mut(&key) {
            for v in values.iter_mut() {
                *v = v.map(|x| x * U_SCALE);
            }
        }
    }
}

/// `d18O_PDB` from the precipitate's VSMOW ratio. The first two steps
/// precede any precipitate and are left missing.
pub fn d18o_to_vpdb(series: &mut StepSeries, mineralogy: Mineralogy) -> ProxyResult<()> {
    let Some(raw) = series.get(&keys::raw_isotope("18O", mineralogy)) else {
        return Ok(());
    };
    let pdb: Vec<Option<f64>> = raw
        .iter()
        .enumerate()
        .map(|(i, v)| if i < 2 { None } else { v.map(vsmow_to_vpdb) })
        .collect();
    series.insert(keys::D18O_PDB, pdb)
}

pub fn vsmow_to_vpdb(d18o: f64) -> f64 {
    d18o * 0.97001 - 29.99
}

/// Drop solver-internal series and rename the rest into output vocabulary.
pub fn tidy(series: &mut StepSeries) {
    for key in keys::INTERNAL_KEYS {
        series.remove(key);
    }
    let renames: Vec<(String, String)> = series
        .keys()
        .filter_map(|k| keys::tidy_name(k).map(|new| (k.to_string(), new)))
        .collect();
    for (old, new) in renames {
        series.rename(&old, new);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_series() -> StepSeries {
        let desc = ["dissolve_bedrock", "degas_1", "CaCO3_precipitation_1", "CaCO3_precipitation_2"];
        let mut s = StepSeries::new(desc.iter().map(|d| d.to_string()).collect());
        let put = |s: &mut StepSeries, k: &str, v: [f64; 4]| {
            s.insert(k, v.iter().map(|x| Some(*x)).collect()).unwrap()
        };
        put(&mut s, keys::CA, [4.0e-3, 4.0e-3, 3.0e-3, 3.0e-3]);
        put(&mut s, keys::C, [8.0e-3, 6.0e-3, 5.0e-3, 4.0e-3]);
        put(&mut s, keys::WATER_MASS, [1.0, 1.0, 1.0, 1.0]);
        put(&mut s, "Mg(mol/kgw)", [4.0e-4, 4.0e-4, 3.9e-4, 3.9e-4]);
        put(&mut s, "Sr(mol/kgw)", [2.0e-6, 2.0e-6, 1.9e-6, 1.8e-6]);
        put(&mut s, "Ba(mol/kgw)", [1.0e-6, 1.0e-6, 0.9e-6, 0.9e-6]);
        put(&mut s, "U(mol/kgw)", [3.0e-6, 3.0e-6, 2.0e-6, 2.0e-6]);
        put(&mut s, "I_R(18O)_Calcite", [-999.0, -999.0, 25.0, 25.5]);
        put(&mut s, "I_R(13C)_Calcite", [-999.0, -999.0, -10.0, -9.5]);
        put(&mut s, "I_R(14C)", [100.0, 95.0, 95.1, 94.9]);
        put(&mut s, "I_R(14C)_CO2(aq)", [1.0, 1.0, 1.0, 1.0]);
        put(&mut s, "m_Ca+2", [3.9e-3, 3.9e-3, 2.9e-3, 2.9e-3]);
        put(&mut s, "s_Calcite", [0.0, 0.0, 1.0e-3, 1.0e-3]);
        put(&mut s, "soln", [1.0, 2.0, 3.0, 4.0]);
        put(&mut s, "pct_err", [0.0; 4]);
        put(&mut s, "temp(C)", [10.0; 4]);
        s
    }

    fn params() -> ParameterSet {
        ParameterSet::new(0)
            .with("precipitate_mineralogy", "Calcite")
            .with("temperature", 10.0)
    }

    #[test]
    fn full_pipeline() {
        let mut s = raw_series();
        derive_proxies(&mut s, &params()).unwrap();

        assert!((s.value(keys::F_CA, 2).unwrap() - 0.75).abs() < 1e-12);
        assert_eq!(s.get(keys::F_C).unwrap()[3], Some(0.5));

        for gone in ["soln", "mass_H2O", "pct_err", "temp(C)", "I_R(14C)_CO2(aq)", "m_Ca+2"] {
            assert!(!s.contains(gone), "{gone} should have been removed");
        }
        assert!(s.contains("Ca+2"));
        assert!(s.contains("moles_Calcite"));
        assert!(s.contains("d13C_Calcite"));
        assert!(s.contains("d18O_Calcite"));

        // Sentinels are gone, real values converted.
        assert_eq!(s.value("d18O_Calcite", 0), None);
        assert_eq!(s.value(keys::D18O_PDB, 1), None);
        let pdb = s.value(keys::D18O_PDB, 2).unwrap();
        assert!((pdb - (25.0 * 0.97001 - 29.99)).abs() < 1e-12);

        // Mg precipitate: lost 1e-5 Mg over 1e-3 Ca.
        let mg = s.value("Mg/Ca(mol/mol)_Calcite", 2).unwrap();
        assert!((mg - 0.01).abs() < 1e-12);
        assert_eq!(s.value("Mg/Ca(mol/mol)_Calcite", 1), Some(0.0));

        // U scaled once.
        let u = s.value("U/Ca(mol/mol)_Calcite", 2).unwrap();
        assert!((u - 1.0e-3 * U_SCALE).abs() < 1e-15);
        let u_dissolved = s.value("U/Ca(mol/mol)", 0).unwrap();
        assert!((u_dissolved - 3.0e-6 / 4.0e-3 * U_SCALE).abs() < 1e-15);

        // Radiocarbon held after dissolution.
        assert_eq!(s.get(keys::R14C).unwrap(), &[Some(100.0), Some(95.0), Some(95.0), Some(95.0)]);
        assert!((s.value(keys::DCP, 1).unwrap() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn zero_calcium_change_gives_zero_ratio() {
        let mut s = raw_series();
        derive_proxies(&mut s, &params()).unwrap();
        // Step 3 loses no Ca: denominator 0.
        for element in keys::TRACE_ELEMENTS {
            let v = s.value(&keys::precipitate_ratio(element, Mineralogy::Calcite), 3);
            assert_eq!(v, Some(0.0), "{element}");
        }
    }

    #[test]
    fn zero_dissolved_calcium_gives_zero_ratio() {
        let mut s = raw_series();
        s.insert(keys::CA, vec![Some(4.0e-3), Some(0.0), Some(3.0e-3), Some(3.0e-3)])
            .unwrap();
        trace_element_ratios(&mut s, Mineralogy::Calcite).unwrap();
        assert_eq!(s.value("Mg/Ca(mol/mol)", 1), Some(0.0));
        assert!(s.get("Sr/Ca(mol/mol)").unwrap().iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn zero_initial_calcium_gives_zero_fraction() {
        let mut s = raw_series();
        s.insert(keys::CA, vec![Some(0.0), Some(4.0e-3), Some(3.0e-3), Some(0.0)])
            .unwrap();
        remaining_fractions(&mut s).unwrap();
        assert_eq!(s.get(keys::F_CA).unwrap(), &[Some(0.0); 4]);
        assert_eq!(s.value(keys::F_C, 3), Some(0.5));
    }

    #[test]
    fn missing_dissolve_step_is_fatal() {
        let raw = raw_series();
        let mut s = StepSeries::new(vec!["a".into(), "b".into(), "c".into(), "d".into()]);
        for (k, v) in raw.iter() {
            s.insert(k, v.to_vec()).unwrap();
        }
        let err = derive_proxies(&mut s, &params()).unwrap_err();
        assert!(matches!(err, ProxyError::MissingStep { tag: "dissolve" }));
    }

    #[test]
    fn missing_trace_element_is_fatal() {
        let mut s = raw_series();
        s.remove("Ba(mol/kgw)");
        let err = derive_proxies(&mut s, &params()).unwrap_err();
        assert!(err.to_string().contains("Ba(mol/kgw)"));
    }

    #[test]
    fn aragonite_keys() {
        let mut s = raw_series();
        s.rename("I_R(18O)_Calcite", "I_R(18O)_Aragonite");
        let p = params().with("precipitate_mineralogy", "Aragonite");
        derive_proxies(&mut s, &p).unwrap();
        assert!(s.contains("Sr/Ca(mol/mol)_Aragonite"));
        assert!(!s.contains("Sr/Ca(mol/mol)_Calcite"));
        assert!(s.value(keys::D18O_PDB, 3).is_some());
    }

    #[test]
    fn unknown_mineralogy_is_fatal() {
        let mut s = raw_series();
        let p = params().with("precipitate_mineralogy", "Vaterite");
        assert!(matches!(
            derive_proxies(&mut s, &p),
            Err(ProxyError::Params(_))
        ));
    }
}
