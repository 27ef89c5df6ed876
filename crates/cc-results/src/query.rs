//! Filters and summaries over loaded runs.
//!
//! Every filter returns a new list and leaves its input untouched.

use std::collections::BTreeMap;

use cc_params::ParamValue;

use crate::types::ModelRun;

/// Runs with at least one precipitation step.
pub fn filter_out_noprecip(runs: &[ModelRun]) -> Vec<ModelRun> {
    runs.iter()
        .filter(|r| r.series.step_desc().iter().any(|d| d.contains("precip")))
        .cloned()
        .collect()
}

/// Keep only step `index` of every run, or every step but it when `invert`.
///
/// Negative indices count from the end. Runs left with no steps are dropped.
pub fn filter_by_index(runs: &[ModelRun], index: isize, invert: bool) -> Vec<ModelRun> {
    runs.iter()
        .filter_map(|run| {
            let len = run.series.len() as isize;
            let target = if index < 0 { len + index } else { index };
            let series = run.series.select_steps(|i| (i as isize == target) != invert);
            (!series.is_empty()).then(|| ModelRun::new(run.params.clone(), series))
        })
        .collect()
}

/// Keep steps whose description contains `needle`, or those that don't.
pub fn filter_by_step_desc(runs: &[ModelRun], needle: &str, invert: bool) -> Vec<ModelRun> {
    runs.iter()
        .map(|run| {
            let desc = run.series.step_desc();
            let series = run.series.select_steps(|i| desc[i].contains(needle) != invert);
            ModelRun::new(run.params.clone(), series)
        })
        .collect()
}

/// Runs whose `setting` equals `value`; text values match as substrings.
/// Runs without the setting never match.
pub fn filter_by_setting(
    runs: &[ModelRun],
    setting: &str,
    value: &ParamValue,
    invert: bool,
) -> Vec<ModelRun> {
    runs.iter()
        .filter(|run| {
            let hit = match (run.params.get(setting), value) {
                (None, _) => false,
                (Some(ParamValue::Text(have)), ParamValue::Text(want)) => have.contains(want.as_str()),
                (Some(have), want) => have == want,
            };
            hit != invert
        })
        .cloned()
        .collect()
}

/// Distinct values of every setting across `runs`, in first-seen order.
pub fn settings_report(runs: &[ModelRun]) -> BTreeMap<String, Vec<ParamValue>> {
    let mut report: BTreeMap<String, Vec<ParamValue>> = BTreeMap::new();
    for run in runs {
        for (key, value) in &run.params.values {
            let seen = report.entry(key.clone()).or_default();
            if !seen.contains(value) {
                seen.push(value.clone());
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_params::ParameterSet;
    use cc_proxy::StepSeries;

    fn run(id: u32, steps: &[&str], gas: f64, mineral: &str) -> ModelRun {
        let mut series = StepSeries::new(steps.iter().map(|s| s.to_string()).collect());
        let values = (0..steps.len()).map(|i| Some(i as f64)).collect();
        series.insert("Ca(mol/kgw)", values).unwrap();
        ModelRun::new(
            ParameterSet::new(id)
                .with("gas_volume", gas)
                .with("bedrock_mineral", mineral),
            series,
        )
    }

    fn runs() -> Vec<ModelRun> {
        vec![
            run(0, &["dissolve_bedrock", "degas_1", "CaCO3_precipitation_1"], 10.0, "Calcite"),
            run(1, &["dissolve_bedrock", "degas_1"], 20.0, "Dolomite"),
        ]
    }

    #[test]
    fn noprecip_models_removed() {
        let kept = filter_out_noprecip(&runs());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id(), 0);
    }

    #[test]
    fn index_from_end() {
        let last = filter_by_index(&runs(), -1, false);
        assert_eq!(last[0].series.step_desc(), &["CaCO3_precipitation_1".to_string()]);
        assert_eq!(last[1].series.value("Ca(mol/kgw)", 0), Some(1.0));

        let rest = filter_by_index(&runs(), -1, true);
        assert_eq!(rest[0].series.len(), 2);
        assert_eq!(rest[1].series.step_desc(), &["dissolve_bedrock".to_string()]);
    }

    #[test]
    fn out_of_range_index_drops_runs() {
        assert!(filter_by_index(&runs(), 5, false).is_empty());
    }

    #[test]
    fn step_desc_substring() {
        let degas = filter_by_step_desc(&runs(), "degas", false);
        assert!(degas.iter().all(|r| r.series.len() == 1));
        let other = filter_by_step_desc(&runs(), "degas", true);
        assert_eq!(other[0].series.len(), 2);
    }

    #[test]
    fn setting_filters() {
        let by_gas = filter_by_setting(&runs(), "gas_volume", &ParamValue::Number(20.0), false);
        assert_eq!(by_gas.len(), 1);
        assert_eq!(by_gas[0].id(), 1);

        let by_text = filter_by_setting(&runs(), "bedrock_mineral", &"Cal".into(), false);
        assert_eq!(by_text[0].id(), 0);

        let inverted = filter_by_setting(&runs(), "bedrock_mineral", &"Cal".into(), true);
        assert_eq!(inverted.len(), 1);
        assert_eq!(inverted[0].id(), 1);

        assert!(filter_by_setting(&runs(), "missing", &ParamValue::Null, false).is_empty());
    }

    #[test]
    fn report_collects_unique_values() {
        let mut all = runs();
        all.push(run(2, &["dissolve_bedrock"], 10.0, "Calcite"));
        let report = settings_report(&all);
        assert_eq!(report["gas_volume"], vec![ParamValue::Number(10.0), ParamValue::Number(20.0)]);
        assert_eq!(report["bedrock_mineral"].len(), 2);
        assert!(!report.contains_key("id"));
    }
}
