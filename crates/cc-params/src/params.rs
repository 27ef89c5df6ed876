//! Concrete per-model parameter sets.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::tolerance::{Proxy, ToleranceSet};
use crate::{ParamsError, ParamsResult};

/// A single scalar setting value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Bool(bool),
    Text(String),
    Null,
}

impl ParamValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParamValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ParamValue::Null)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Number(v) => write!(f, "{v}"),
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::Text(v) => f.write_str(v),
            ParamValue::Null => Ok(()),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Number(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mineralogy {
    Calcite,
    Aragonite,
}

impl Mineralogy {
    pub fn as_str(self) -> &'static str {
        match self {
            Mineralogy::Calcite => "Calcite",
            Mineralogy::Aragonite => "Aragonite",
        }
    }
}

impl fmt::Display for Mineralogy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One model's settings. `id` orders runs and is excluded from reuse
/// comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    pub id: u32,
    #[serde(default)]
    pub values: BTreeMap<String, ParamValue>,
}

impl ParameterSet {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<ParamValue>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    /// Exact key and value equality, ignoring `id`.
    pub fn same_inputs(&self, other: &ParameterSet) -> bool {
        self.values == other.values
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(ParamValue::as_number)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ParamValue::as_text)
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(ParamValue::as_bool)
    }

    pub fn require_number(&self, key: &str) -> ParamsResult<f64> {
        match self.get(key) {
            None | Some(ParamValue::Null) => Err(ParamsError::MissingKey {
                id: self.id,
                key: key.to_string(),
            }),
            Some(ParamValue::Number(v)) => Ok(*v),
            Some(_) => Err(ParamsError::WrongType {
                id: self.id,
                key: key.to_string(),
                expected: "number",
            }),
        }
    }

    /// The precipitating carbonate. Required: an unset or unknown value is
    /// an error.
    pub fn precipitate_mineralogy(&self) -> ParamsResult<Mineralogy> {
        match self.get("precipitate_mineralogy") {
            None | Some(ParamValue::Null) => Err(ParamsError::MissingKey {
                id: self.id,
                key: "precipitate_mineralogy".to_string(),
            }),
            Some(ParamValue::Text(v)) => match v.trim() {
                "Calcite" | "calcite" => Ok(Mineralogy::Calcite),
                "Aragonite" | "aragonite" => Ok(Mineralogy::Aragonite),
                other => Err(ParamsError::UnknownMineralogy {
                    id: self.id,
                    value: other.to_string(),
                }),
            },
            Some(other) => Err(ParamsError::UnknownMineralogy {
                id: self.id,
                value: other.to_string(),
            }),
        }
    }

    pub fn kinetic_fractionation(&self) -> bool {
        self.flag("kinetic_fractionation").unwrap_or(false)
    }

    pub fn pcarbp_d18o(&self) -> bool {
        self.flag("pcarbp_d18o").unwrap_or(false)
    }

    /// Cave temperature in °C.
    pub fn temperature(&self) -> ParamsResult<f64> {
        self.require_number("temperature")
    }

    pub fn flow_path_influence(&self) -> ParamsResult<f64> {
        self.require_number("flow_path_influence")
    }

    /// Measured-data path; `None` when unset or blank.
    pub fn user_filepath(&self) -> Option<PathBuf> {
        self.text("user_filepath")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }

    /// Per-proxy tolerances from `tolerance_<proxy>` keys, falling back to
    /// the defaults.
    pub fn tolerances(&self) -> ToleranceSet {
        let mut set = ToleranceSet::default();
        for proxy in Proxy::ALL {
            if let Some(v) = self.number(&format!("tolerance_{}", proxy.label())) {
                set.set(proxy, v);
            }
        }
        set
    }
}
