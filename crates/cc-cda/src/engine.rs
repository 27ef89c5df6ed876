//! Multi-proxy tolerance matching of model output against measured data.

use std::path::Path;

use cc_params::{MatchScope, Mineralogy, ParameterSet, Proxy, ToleranceSet};
use cc_proxy::derive::vsmow_to_vpdb;
use cc_proxy::{StepSeries, keys};
use tracing::{debug, info};

use crate::error::CdaResult;
use crate::measured::MeasuredSeries;
use crate::persist::{CdaTables, PersistSummary};
use crate::record::{ComparisonRecord, settings_snapshot};

/// X/Ca ratios are compared in mmol/mol.
const MMOL_PER_MOL: f64 = 1000.0;

/// Output key read for each proxy, in [`Proxy::ALL`] order.
pub fn proxy_keys(mineralogy: Mineralogy, kinetic: bool) -> [String; 8] {
    let kinetic = kinetic && mineralogy == Mineralogy::Calcite;
    Proxy::ALL.map(|proxy| match proxy {
        Proxy::D13C if kinetic => keys::D13C_KINETIC.to_string(),
        Proxy::D18O if kinetic => keys::D18O_KINETIC.to_string(),
        Proxy::D13C => keys::isotope("13C", mineralogy),
        Proxy::D18O => keys::isotope("18O", mineralogy),
        Proxy::MgCa => keys::precipitate_ratio("Mg", mineralogy),
        Proxy::SrCa => keys::precipitate_ratio("Sr", mineralogy),
        Proxy::BaCa => keys::precipitate_ratio("Ba", mineralogy),
        Proxy::UCa => keys::precipitate_ratio("U", mineralogy),
        Proxy::Dcp => keys::DCP.to_string(),
        Proxy::D44Ca => keys::isotope("44Ca", mineralogy),
    })
}

/// Predicted proxies at `step`, in the units measured data is given in.
pub fn predicted_at(series: &StepSeries, lookup: &[String; 8], step: usize) -> [Option<f64>; 8] {
    let mut out = [None; 8];
    for proxy in Proxy::ALL {
        let raw = series.value(&lookup[proxy.index()], step);
        out[proxy.index()] = match proxy {
            Proxy::D18O => raw.map(vsmow_to_vpdb),
            Proxy::MgCa | Proxy::SrCa | Proxy::BaCa | Proxy::UCa => raw.map(|v| v * MMOL_PER_MOL),
            Proxy::D13C | Proxy::Dcp | Proxy::D44Ca => raw,
        }
        .filter(|v| v.is_finite());
    }
    out
}

/// Everything one model contributes to the CDA tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelComparison {
    pub model_id: u32,
    pub tolerances: ToleranceSet,
    /// Proxies with measured data, which get table columns.
    pub proxies: Vec<Proxy>,
    pub all_outputs: Vec<ComparisonRecord>,
    pub matches: Vec<ComparisonRecord>,
}

/// Matches and counters carried across the models of a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CdaAccumulator {
    pub matches: Vec<ComparisonRecord>,
    pub all_outputs_rows: usize,
    pub models_compared: usize,
}

impl CdaAccumulator {
    pub fn absorb(mut self, comparison: ModelComparison) -> Self {
        self.models_compared += 1;
        self.all_outputs_rows += comparison.all_outputs.len();
        self.matches.extend(comparison.matches);
        self
    }

    /// Matches grouped by model id, in id order.
    pub fn matched_models(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.matches.iter().map(|m| m.model_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// Compares derived model output with the user's measured series and
/// persists the four CDA tables under `<output_dir>/CDA Results`.
#[derive(Debug, Clone)]
pub struct MatchEngine {
    tables: CdaTables,
    scope: MatchScope,
}

impl MatchEngine {
    pub fn new(output_dir: &Path, scope: MatchScope) -> Self {
        Self {
            tables: CdaTables::new(output_dir),
            scope,
        }
    }

    pub fn tables(&self) -> &CdaTables {
        &self.tables
    }

    pub fn scope(&self) -> MatchScope {
        self.scope
    }

    /// Run matching for one model and fold the result into `acc`.
    ///
    /// Models without a `user_filepath` are skipped and `acc` is returned
    /// unchanged.
    pub fn match_model(
        &self,
        series: &StepSeries,
        params: &ParameterSet,
        acc: CdaAccumulator,
    ) -> CdaResult<CdaAccumulator> {
        Ok(match self.match_one(series, params)? {
            Some(comparison) => acc.absorb(comparison),
            None => acc,
        })
    }

    /// Compare one model and persist its rows. `None` when the model has no
    /// `user_filepath`.
    pub fn match_one(
        &self,
        series: &StepSeries,
        params: &ParameterSet,
    ) -> CdaResult<Option<ModelComparison>> {
        let Some(path) = params.user_filepath() else {
            return Ok(None);
        };
        let measured = MeasuredSeries::load(&path)?;
        let comparison = self.compare(series, params, &measured)?;
        let summary = self.tables.persist(params, &comparison)?;
        log_summary(params.id, &summary);
        Ok(Some(comparison))
    }

    /// Build every comparison row for one model without touching disk.
    pub fn compare(
        &self,
        series: &StepSeries,
        params: &ParameterSet,
        measured: &MeasuredSeries,
    ) -> CdaResult<ModelComparison> {
        let mineralogy = params.precipitate_mineralogy()?;
        let tolerances = params.tolerances();
        let lookup = proxy_keys(mineralogy, params.kinetic_fractionation());
        let settings = settings_snapshot(params);
        let d13c_init = series.value("d13C", 1);

        let steps: Vec<usize> = match self.scope {
            MatchScope::AllSteps => (0..series.len()).collect(),
            MatchScope::FinalStep => series.last_index().into_iter().collect(),
        };

        let mut comparison = ModelComparison {
            model_id: params.id,
            tolerances,
            proxies: measured.present(),
            ..Default::default()
        };

        for step in steps {
            let predicted = predicted_at(series, &lookup, step);
            for row in 0..measured.len() {
                let mut observed = [None; 8];
                for proxy in Proxy::ALL {
                    observed[proxy.index()] = measured.value(proxy, row);
                }
                let record = ComparisonRecord {
                    model_id: params.id,
                    step,
                    age: measured.ages[row],
                    measured: observed,
                    predicted,
                    f_ca: series.value(keys::F_CA, step),
                    d13c_init,
                    ca: series.value(keys::CA, step),
                    settings: settings.clone(),
                };
                if record.is_match(&tolerances) {
                    comparison.matches.push(record.clone());
                }
                comparison.all_outputs.push(record);
            }
        }

        debug!(
            id = params.id,
            rows = comparison.all_outputs.len(),
            matches = comparison.matches.len(),
            "model compared"
        );
        Ok(comparison)
    }
}

fn log_summary(id: u32, summary: &PersistSummary) {
    if summary.created_all_outputs {
        info!(path = %summary.all_outputs.display(), "CDA initialised in output directory");
    }
    if summary.match_rows > 0 {
        info!(id, rows = summary.match_rows, path = %summary.matches.display(), "match recorded");
    }
}
