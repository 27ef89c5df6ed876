//! Equal-length named value sequences, one entry per solver step.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ProxyError, ProxyResult};

/// Quantities reported by the solver for a single step.
pub type StepOutput = BTreeMap<String, f64>;

/// One model run's step-by-step output.
///
/// Every series has exactly `step_desc.len()` entries. `None` marks a value
/// that is missing or not applicable at that step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSeries")]
pub struct StepSeries {
    step_desc: Vec<String>,
    values: BTreeMap<String, Vec<Option<f64>>>,
}

#[derive(Deserialize)]
struct RawSeries {
    step_desc: Vec<String>,
    #[serde(default)]
    values: BTreeMap<String, Vec<Option<f64>>>,
}

impl TryFrom<RawSeries> for StepSeries {
    type Error = ProxyError;

    fn try_from(raw: RawSeries) -> ProxyResult<Self> {
        let mut series = StepSeries::new(raw.step_desc);
        for (key, values) in raw.values {
            series.insert(key, values)?;
        }
        Ok(series)
    }
}

impl StepSeries {
    pub fn new(step_desc: Vec<String>) -> Self {
        Self {
            step_desc,
            values: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.step_desc.len()
    }

    pub fn is_empty(&self) -> bool {
        self.step_desc.is_empty()
    }

    pub fn step_desc(&self) -> &[String] {
        &self.step_desc
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Option<f64>])> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&[Option<f64>]> {
        self.values.get(key).map(Vec::as_slice)
    }

    pub fn require(&self, key: &str) -> ProxyResult<&[Option<f64>]> {
        self.get(key).ok_or_else(|| ProxyError::MissingKey {
            key: key.to_string(),
        })
    }

    /// Value of `key` at `step`; `None` if the key, step or value is absent.
    pub fn value(&self, key: &str, step: usize) -> Option<f64> {
        self.values.get(key)?.get(step).copied().flatten()
    }

    /// Insert or replace a series. Rejects sequences of the wrong length.
    pub fn insert(&mut self, key: impl Into<String>, values: Vec<Option<f64>>) -> ProxyResult<()> {
        let key = key.into();
        if values.len() != self.len() {
            return Err(ProxyError::LengthMismatch {
                key,
                expected: self.len(),
                found: values.len(),
            });
        }
        self.values.insert(key, values);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<Option<f64>>> {
        self.values.remove(key)
    }

    /// Move a series to a new key, replacing anything already there.
    pub fn rename(&mut self, from: &str, to: impl Into<String>) -> bool {
        match self.values.remove(from) {
            Some(values) => {
                self.values.insert(to.into(), values);
                true
            }
            None => false,
        }
    }

    /// Apply `f` to every stored value in place.
    pub fn map_values(&mut self, mut f: impl FnMut(Option<f64>) -> Option<f64>) {
        for series in self.values.values_mut() {
            for v in series.iter_mut() {
                *v = f(*v);
            }
        }
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut [Option<f64>]> {
        self.values.get_mut(key).map(Vec::as_mut_slice)
    }

    /// Index of the first step whose description contains `tag`.
    pub fn first_step_containing(&self, tag: &str) -> Option<usize> {
        self.step_desc.iter().position(|d| d.contains(tag))
    }

    pub fn last_index(&self) -> Option<usize> {
        self.len().checked_sub(1)
    }

    /// Copy holding only the steps for which `keep` returns true.
    pub fn select_steps(&self, keep: impl Fn(usize) -> bool) -> StepSeries {
        let pick = |values: &[Option<f64>]| -> Vec<Option<f64>> {
            values
                .iter()
                .enumerate()
                .filter(|(i, _)| keep(*i))
                .map(|(_, v)| *v)
                .collect()
        };
        StepSeries {
            step_desc: self
                .step_desc
                .iter()
                .enumerate()
                .filter(|(i, _)| keep(*i))
                .map(|(_, d)| d.clone())
                .collect(),
            values: self
                .values
                .iter()
                .map(|(k, v)| (k.clone(), pick(v)))
                .collect(),
        }
    }
}

/// Collects per-step solver outputs into a [`StepSeries`].
///
/// Keys that appear at some steps but not others are padded with `None`.
#[derive(Debug, Default)]
pub struct StepSeriesBuilder {
    step_desc: Vec<String>,
    values: BTreeMap<String, Vec<Option<f64>>>,
}

impl StepSeriesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, description: impl Into<String>, output: &StepOutput) {
        let step = self.step_desc.len();
        self.step_desc.push(description.into());
        for (key, value) in output {
            let series = self
                .values
                .entry(key.clone())
                .or_insert_with(|| vec![None; step]);
            series.push(Some(*value));
        }
        for series in self.values.values_mut() {
            if series.len() == step {
                series.push(None);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.step_desc.len()
    }

    pub fn is_empty(&self) -> bool {
        self.step_desc.is_empty()
    }

    pub fn build(self) -> ProxyResult<StepSeries> {
        let mut series = StepSeries::new(self.step_desc);
        for (key, values) in self.values {
            series.insert(key, values)?;
        }
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(pairs: &[(&str, f64)]) -> StepOutput {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn insert_enforces_length() {
        let mut s = StepSeries::new(vec!["a".into(), "b".into()]);
        s.insert("x", vec![Some(1.0), None]).unwrap();
        let err = s.insert("y", vec![Some(1.0)]).unwrap_err();
        assert!(matches!(
            err,
            ProxyError::LengthMismatch {
                expected: 2,
                found: 1,
                ..
            }
        ));
        assert!(!s.contains("y"));
    }

    #[test]
    fn select_steps_keeps_alignment() {
        let mut s = StepSeries::new(vec!["a".into(), "b".into(), "c".into()]);
        s.insert("x", vec![Some(1.0), None, Some(3.0)]).unwrap();
        let picked = s.select_steps(|i| i != 1);
        assert_eq!(picked.step_desc(), &["a".to_string(), "c".to_string()]);
        assert_eq!(picked.get("x"), Some(&[Some(1.0), Some(3.0)][..]));
    }

    #[test]
    fn builder_pads_late_and_missing_keys() {
        let mut b = StepSeriesBuilder::new();
        b.push("dissolve_bedrock", &output(&[("Ca(mol/kgw)", 2.0e-3)]));
        b.push("degas_1", &output(&[("Ca(mol/kgw)", 1.9e-3), ("si_Calcite", 0.1)]));
        b.push("degas_2", &output(&[("si_Calcite", 0.2)]));
        let s = b.build().unwrap();

        assert_eq!(s.len(), 3);
        assert_eq!(s.get("Ca(mol/kgw)").unwrap(), &[Some(2.0e-3), Some(1.9e-3), None]);
        assert_eq!(s.get("si_Calcite").unwrap(), &[None, Some(0.1), Some(0.2)]);
    }

    #[test]
    fn rename_and_lookup() {
        let mut s = StepSeries::new(vec!["dissolve".into(), "degas".into()]);
        s.insert("m_Ca+2", vec![Some(1.0), Some(2.0)]).unwrap();
        assert!(s.rename("m_Ca+2", "Ca+2"));
        assert!(!s.rename("m_Ca+2", "Ca+2"));
        assert_eq!(s.value("Ca+2", 1), Some(2.0));
        assert_eq!(s.value("Ca+2", 5), None);
        assert_eq!(s.first_step_containing("degas"), Some(1));
        assert_eq!(s.last_index(), Some(1));
    }

    #[test]
    fn deserialize_rejects_ragged_series() {
        let json = r#"{"step_desc": ["a", "b"], "values": {"x": [1.0]}}"#;
        assert!(serde_json::from_str::<StepSeries>(json).is_err());

        let json = r#"{"step_desc": ["a", "b"], "values": {"x": [1.0, null]}}"#;
        let s: StepSeries = serde_json::from_str(json).unwrap();
        assert_eq!(s.get("x").unwrap(), &[Some(1.0), None]);
    }
}
