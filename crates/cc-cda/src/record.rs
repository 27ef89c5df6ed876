//! Rows of the All-outputs and Matches tables.

use cc_params::{ParamValue, ParameterSet, Proxy, ToleranceSet};

/// Settings copied into every comparison row.
pub const SNAPSHOT_KEYS: [&str; 30] = [
    "atm_O2",
    "atm_d18O",
    "atm_pCO2",
    "atm_d13C",
    "atm_R14C",
    "soil_O2",
    "soil_R14C",
    "soil_d13C",
    "soil_pCO2",
    "soil_Ba",
    "soil_Ca",
    "soil_Mg",
    "soil_Sr",
    "soil_U",
    "bedrock_BaCa",
    "bedrock_MgCa",
    "bedrock_SrCa",
    "bedrock_UCa",
    "bedrock_d13C",
    "bedrock_d44Ca",
    "bedrock_mineral",
    "bedrock_pyrite",
    "gas_volume",
    "reprecip",
    "cave_pCO2",
    "cave_R14C",
    "cave_d13C",
    "temperature",
    "kinetics_mode",
    "precipitate_mineralogy",
];

/// One (model step, measured timepoint) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRecord {
    pub model_id: u32,
    pub step: usize,
    pub age: f64,
    /// Indexed by [`Proxy::index`].
    pub measured: [Option<f64>; 8],
    pub predicted: [Option<f64>; 8],
    pub f_ca: Option<f64>,
    pub d13c_init: Option<f64>,
    pub ca: Option<f64>,
    pub settings: Vec<(String, ParamValue)>,
}

/// A comparison that passed every tolerance check.
pub type MatchRecord = ComparisonRecord;
/// A comparison recorded whether or not it matched.
pub type AllOutputsRecord = ComparisonRecord;

impl ComparisonRecord {
    /// `predicted - measured`, when both sides and the result are finite.
    pub fn residual(&self, proxy: Proxy) -> Option<f64> {
        let i = proxy.index();
        let r = self.predicted[i]? - self.measured[i]?;
        r.is_finite().then_some(r)
    }

    /// Every proxy within tolerance, and the model precipitated at this step.
    pub fn is_match(&self, tolerances: &ToleranceSet) -> bool {
        self.predicted[Proxy::D13C.index()].is_some()
            && Proxy::ALL
                .into_iter()
                .all(|p| tolerances.passes(p, self.residual(p)))
    }

    /// Named cells for table output. Only proxies in `proxies` get columns,
    /// d13C always does.
    pub fn cells(&self, proxies: &[Proxy]) -> Vec<(String, String)> {
        let mut cells = vec![
            ("Model".to_string(), self.model_id.to_string()),
            ("Step".to_string(), self.step.to_string()),
            ("Age".to_string(), self.age.to_string()),
        ];
        self.push_proxy(&mut cells, Proxy::D13C);
        cells.push(("fCa".to_string(), fmt_opt(self.f_ca)));
        cells.push(("d13C_init".to_string(), fmt_opt(self.d13c_init)));
        cells.push(("Ca (mol/kgw)".to_string(), fmt_opt(self.ca)));
        for proxy in proxies.iter().filter(|p| **p != Proxy::D13C) {
            self.push_proxy(&mut cells, *proxy);
        }
        for (key, value) in &self.settings {
            cells.push((key.clone(), value.to_string()));
        }
        cells
    }

    fn push_proxy(&self, cells: &mut Vec<(String, String)>, proxy: Proxy) {
        let label = proxy.label();
        cells.push((label.to_string(), fmt_opt(self.measured[proxy.index()])));
        cells.push((format!("CaveCalc {label}"), fmt_opt(self.predicted[proxy.index()])));
        cells.push((format!("{label} residual"), fmt_opt(self.residual(proxy))));
    }
}

/// Column order matching [`ComparisonRecord::cells`].
pub fn record_header(proxies: &[Proxy]) -> Vec<String> {
    let mut header: Vec<String> = ["Model", "Step", "Age"].iter().map(|s| s.to_string()).collect();
    push_proxy_header(&mut header, Proxy::D13C);
    header.extend(["fCa", "d13C_init", "Ca (mol/kgw)"].iter().map(|s| s.to_string()));
    for proxy in proxies.iter().filter(|p| **p != Proxy::D13C) {
        push_proxy_header(&mut header, *proxy);
    }
    header.extend(SNAPSHOT_KEYS.iter().map(|s| s.to_string()));
    header
}

fn push_proxy_header(header: &mut Vec<String>, proxy: Proxy) {
    let label = proxy.label();
    header.push(label.to_string());
    header.push(format!("CaveCalc {label}"));
    header.push(format!("{label} residual"));
}

/// Snapshot of the reported settings; absent keys are written empty.
pub fn settings_snapshot(params: &ParameterSet) -> Vec<(String, ParamValue)> {
    SNAPSHOT_KEYS
        .iter()
        .map(|k| (k.to_string(), params.get(k).cloned().unwrap_or(ParamValue::Null)))
        .collect()
}

pub(crate) fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}
