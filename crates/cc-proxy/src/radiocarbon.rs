//! Radiocarbon normalisation and unit conversions.

use crate::error::ProxyResult;
use crate::keys;
use crate::series::StepSeries;

/// Absolute 14C/C ratio of the modern standard.
pub const STND_14C: f64 = 1.175887709e-12;
/// 13C/12C ratio of VPDB.
pub const STND_13C: f64 = 0.0111802;
/// pMC of modern carbon, the zero point of DCP.
pub const MODERN_PMC: f64 = 100.0;

/// d13C-corrected percent modern carbon from a 14C/C ratio.
pub fn pmc(c14: f64, d13c: f64, stnd14c: f64) -> f64 {
    c14 / stnd14c * 100.0 * (0.975 / (1.0 + 0.001 * d13c)).powi(2)
}

/// Inverse of [`pmc`].
pub fn pmc_to_c14(r14c: f64, d13c: f64, stnd14c: f64) -> f64 {
    stnd14c * 0.01 * r14c * ((1.0 + 0.001 * d13c) / 0.975).powi(2)
}

/// Returns `(d13C, R14C)` from isotope abundances.
pub fn c14_to_pmc(c12: f64, c13: f64, c14: f64, stnd13c: f64, stnd14c: f64) -> (f64, f64) {
    let d13c = ((c13 / c12) / stnd13c - 1.0) * 1000.0;
    (d13c, pmc(c14, d13c, stnd14c))
}

/// Normalised ratio (as reported by the solver, in percent of the standard)
/// to d13C-corrected pMC.
pub fn pmc_normalise(r14c: f64, d13c: f64, stnd14c: f64) -> f64 {
    pmc(0.01 * r14c * stnd14c, d13c, stnd14c)
}

/// d13C-corrected pMC to a normalised ratio.
pub fn pmc_denormalise(pmc: f64, d13c: f64, stnd14c: f64) -> f64 {
    100.0 * pmc_to_c14(pmc, d13c, stnd14c) / stnd14c
}

/// Hold every `R14C*` series constant after bedrock dissolution, then add
/// `DCP` from the solution `R14C` series when it is present.
///
/// The held value is the one reported at the first step following the
/// bedrock-tagged step(s). Series without a bedrock step are left alone.
pub fn normalise_radiocarbon(series: &mut StepSeries) -> ProxyResult<()> {
    if let Some(first_post) = first_post_bedrock_step(series.step_desc()) {
        let held_keys: Vec<String> = series
            .keys()
            .filter(|k| k.contains(keys::R14C))
            .map(str::to_string)
            .collect();
        for key in held_keys {
            if let Some(values) = series.get_mut(&key) {
                let held = values[first_post];
                for v in values.iter_mut().skip(first_post + 1) {
                    *v = held;
                }
            }
        }
    }

    if let Some(r14c) = series.get(keys::R14C) {
        let dcp: Vec<Option<f64>> = r14c
            .iter()
            .map(|v| v.map(|pmc| (1.0 - pmc / MODERN_PMC) * 100.0))
            .collect();
        series.insert(keys::DCP, dcp)?;
    }
    Ok(())
}

fn first_post_bedrock_step(step_desc: &[String]) -> Option<usize> {
    let bedrock = step_desc.iter().position(|d| d.contains("bedrock"))?;
    (bedrock + 1..step_desc.len()).find(|&i| !step_desc[i].contains("bedrock"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(desc: &[&str], r14c: &[f64]) -> StepSeries {
        let mut s = StepSeries::new(desc.iter().map(|d| d.to_string()).collect());
        s.insert(keys::R14C, r14c.iter().map(|v| Some(*v)).collect())
            .unwrap();
        s
    }

    #[test]
    fn freezes_post_dissolution_values() {
        let mut s = series(
            &["dissolve_bedrock", "degas_1", "degas_2", "degas_3"],
            &[100.0, 95.0, 95.1, 94.9],
        );
        normalise_radiocarbon(&mut s).unwrap();

        let r = s.get(keys::R14C).unwrap();
        assert_eq!(r[0], Some(100.0));
        assert_eq!(&r[1..], &[Some(95.0), Some(95.0), Some(95.0)]);
        let dcp = s.value(keys::DCP, 1).unwrap();
        assert!((dcp - 5.0).abs() < 1e-12);
    }

    #[test]
    fn every_r14c_series_is_held() {
        let mut s = series(&["init", "bedrock_dissolution", "degas", "precip"], &[1.0, 2.0, 3.0, 4.0]);
        s.insert("R14C_Calcite", vec![None, Some(80.0), Some(81.0), Some(82.0)])
            .unwrap();
        normalise_radiocarbon(&mut s).unwrap();
        assert_eq!(
            s.get("R14C_Calcite").unwrap(),
            &[None, Some(80.0), Some(81.0), Some(81.0)]
        );
    }

    #[test]
    fn consecutive_bedrock_steps_hold_first_later_value() {
        let mut s = series(
            &["init", "dissolve_bedrock_1", "dissolve_bedrock_2", "degas_1", "CaCO3_precipitation_1"],
            &[100.0, 98.0, 96.0, 95.0, 94.0],
        );
        normalise_radiocarbon(&mut s).unwrap();
        assert_eq!(
            s.get(keys::R14C).unwrap(),
            &[Some(100.0), Some(98.0), Some(96.0), Some(95.0), Some(95.0)]
        );
        assert!((s.value(keys::DCP, 4).unwrap() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn no_bedrock_step_leaves_values() {
        let mut s = series(&["a", "b", "c"], &[100.0, 90.0, 80.0]);
        normalise_radiocarbon(&mut s).unwrap();
        assert_eq!(s.value(keys::R14C, 2), Some(80.0));
        assert!((s.value(keys::DCP, 2).unwrap() - 20.0).abs() < 1e-12);
    }

    #[test]
    fn pmc_conversions_invert() {
        let c14 = pmc_to_c14(87.5, -9.0, STND_14C);
        assert!((pmc(c14, -9.0, STND_14C) - 87.5).abs() < 1e-9);

        let norm = pmc_denormalise(60.0, -25.0, STND_14C);
        assert!((pmc_normalise(norm, -25.0, STND_14C) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn abundance_to_pmc() {
        let c12 = 1.0;
        let c13 = STND_13C;
        let c14 = STND_14C;
        let (d13c, r14c) = c14_to_pmc(c12, c13, c14, STND_13C, STND_14C);
        assert!(d13c.abs() < 1e-9);
        assert!((r14c - 100.0 * 0.975f64.powi(2)).abs() < 1e-9);
    }
}
