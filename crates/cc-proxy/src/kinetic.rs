//! Optional oxygen and carbon isotope corrections: kinetic fractionation
//! during calcite growth and prior carbonate precipitation along the flow
//! path.

use cc_core::celsius_to_kelvin;
use cc_params::{Mineralogy, ParameterSet};
use tracing::{debug, info};

use crate::error::{ProxyError, ProxyResult};
use crate::keys;
use crate::series::StepSeries;

/// Measured kinetic enrichment factors: (temperature °C, cave pCO2 ppmv,
/// initial Ca mmol/kgw, epsilon permil).
const KINETIC_EPSILON: [(f64, f64, f64, f64); 8] = [
    (30.0, 1000.0, 5.0, -10.5),
    (30.0, 3000.0, 5.0, -9.2),
    (30.0, 1000.0, 2.0, -4.7),
    (20.0, 1000.0, 5.0, -13.7),
    (20.0, 3000.0, 5.0, -12.1),
    (20.0, 1000.0, 3.0, -9.8),
    (10.0, 1000.0, 5.0, -11.9),
    (10.0, 3000.0, 5.0, -7.4),
];

/// Epsilon of the table entry closest to the given conditions.
pub fn nearest_kinetic_epsilon(temp_c: f64, cave_pco2: f64, ca_init_mmol: f64) -> f64 {
    let mut best = (f64::INFINITY, KINETIC_EPSILON[0].3);
    for (t, pco2, ca, eps) in KINETIC_EPSILON {
        let dist = ((temp_c - t).powi(2) + (cave_pco2 - pco2).powi(2) + (ca_init_mmol - ca).powi(2))
            .sqrt();
        if dist < best.0 {
            best = (dist, eps);
        }
    }
    best.1
}

fn required_value(series: &StepSeries, key: &str, step: usize) -> ProxyResult<f64> {
    series.value(key, step).ok_or_else(|| ProxyError::MissingKey {
        key: format!("{key} at step {step}"),
    })
}

fn require_steps(series: &StepSeries, what: &'static str) -> ProxyResult<()> {
    if series.len() < 3 {
        return Err(ProxyError::TooFewSteps {
            what,
            needed: 3,
            found: series.len(),
        });
    }
    Ok(())
}

/// Adds `d13C_calcite_kinetic` and `d18O_calcite_kinetic`. Only applies to
/// calcite with `kinetic_fractionation` enabled.
pub fn apply_kinetic_fractionation(
    series: &mut StepSeries,
    params: &ParameterSet,
    mineralogy: Mineralogy,
) -> ProxyResult<()> {
    if !params.kinetic_fractionation() || mineralogy != Mineralogy::Calcite {
        return Ok(());
    }
    require_steps(series, "kinetic fractionation")?;

    let temp_c = params.temperature()?;
    let cave_pco2 = params.require_number("cave_pCO2")?;
    let ca_init = required_value(series, keys::CA, 1)? * 1000.0;

    let epsilon = nearest_kinetic_epsilon(temp_c, cave_pco2, ca_init);
    let alpha = (epsilon / 1000.0).exp();
    let epsilon_oxygen = 16.516e3 / celsius_to_kelvin(temp_c) - 26.141;
    let alpha_oxygen = (epsilon_oxygen / 1000.0).exp();
    info!(epsilon, epsilon_oxygen, "kinetic fractionation enabled");

    let d18o_water = required_value(series, "d18O", 1)?;
    let d18o_kinetic = alpha_oxygen * (d18o_water + 1000.0) - 1000.0;
    series.insert(keys::D18O_KINETIC, vec![Some(d18o_kinetic); series.len()])?;

    let ro = required_value(series, "d13C_HCO3-", 2)? / 1000.0 + 1.0;
    let d13c_kinetic: Vec<Option<f64>> = series
        .require(keys::F_CA)?
        .iter()
        .map(|f| match f {
            Some(f) if *f != 0.0 && *f != 1.0 => {
                let rs = f.powf(alpha - 1.0) * (ro * alpha);
                Some((rs - 1.0) * 1000.0)
            }
            _ => None,
        })
        .collect();
    series.insert(keys::D13C_KINETIC, d13c_kinetic)
}

/// Oxygen isotope fractionation exponent for prior carbonate precipitation.
pub fn pcp_exponent(temp_c: f64, mineralogy: Mineralogy) -> f64 {
    let tk = celsius_to_kelvin(temp_c);
    let tk2 = tk * tk;

    let alpha_h2o_caco3 = match mineralogy {
        Mineralogy::Calcite => (18.03 / tk - 0.03242).exp(),
        Mineralogy::Aragonite => (17.88 / tk - 0.03114).exp(),
    };
    let alpha_hco3_h2o_ref = 1.0 / ((2.59e6 / tk2 + 1.89) / 1000.0 + 1.0);
    let alpha_hco3_caco3 = alpha_hco3_h2o_ref * alpha_h2o_caco3;

    let alpha_hco3_h2o = (-(2.59e6 / tk2 + 1.89) / 1000.0).exp();
    let alpha_h2o_co2aq = ((2.52e6 / tk2 + 12.12) / 1000.0).exp();
    let alpha_co2aq_co2g = 1.0 / ((-1.9585 + 1.44176e3 / tk - 0.160515e6 / tk2) / 1000.0 + 1.0);
    let alpha_hco3_co2 = alpha_hco3_h2o * alpha_h2o_co2aq * alpha_co2aq_co2g;

    alpha_hco3_h2o / 6.0 + alpha_hco3_caco3 / 2.0 + alpha_hco3_co2 / 3.0 - 1.0
}

/// Adds `d18O_PCP`. Only applies with `pcarbp_d18o` enabled.
///
/// Steps at or above the reference calcium `Cai` keep the undisturbed
/// `d18O_PDB` of step 2; steps below it are shifted by `((Ca/Cai)^frac - 1)`.
pub fn apply_pcp_d18o(
    series: &mut StepSeries,
    params: &ParameterSet,
    mineralogy: Mineralogy,
) -> ProxyResult<()> {
    if !params.pcarbp_d18o() {
        return Ok(());
    }
    require_steps(series, "prior carbonate precipitation")?;

    let temp_c = params.temperature()?;
    let influence = params.flow_path_influence()?;
    let cai = influence / 100.0 * required_value(series, keys::CA, 1)?;
    let base = required_value(series, keys::D18O_PDB, 2)?;
    let frac = pcp_exponent(temp_c, mineralogy);
    debug!(cai, frac, "prior carbonate precipitation d18O");

    let shifted: Vec<Option<f64>> = series
        .require(keys::CA)?
        .iter()
        .map(|ca| match ca {
            None => None,
            Some(ca) if *ca == 0.0 => None,
            Some(ca) if *ca >= cai => Some(base),
            Some(ca) => Some(base + ((ca / cai).powf(frac) - 1.0) * 1000.0),
        })
        .collect();
    series.insert(keys::D18O_PCP, shifted)
}
