//! The eight matched proxies and their tolerances.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Proxy {
    D13C,
    D18O,
    MgCa,
    Dcp,
    D44Ca,
    SrCa,
    BaCa,
    UCa,
}

impl Proxy {
    /// Table order used for every persisted proxy column.
    pub const ALL: [Proxy; 8] = [
        Proxy::D13C,
        Proxy::D18O,
        Proxy::MgCa,
        Proxy::Dcp,
        Proxy::D44Ca,
        Proxy::SrCa,
        Proxy::BaCa,
        Proxy::UCa,
    ];

    pub fn index(self) -> usize {
        match self {
            Proxy::D13C => 0,
            Proxy::D18O => 1,
            Proxy::MgCa => 2,
            Proxy::Dcp => 3,
            Proxy::D44Ca => 4,
            Proxy::SrCa => 5,
            Proxy::BaCa => 6,
            Proxy::UCa => 7,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Proxy::D13C => "d13C",
            Proxy::D18O => "d18O",
            Proxy::MgCa => "MgCa",
            Proxy::Dcp => "DCP",
            Proxy::D44Ca => "d44Ca",
            Proxy::SrCa => "SrCa",
            Proxy::BaCa => "BaCa",
            Proxy::UCa => "UCa",
        }
    }

    pub fn default_tolerance(self) -> f64 {
        match self {
            Proxy::D13C | Proxy::D18O | Proxy::D44Ca => 0.5,
            Proxy::Dcp => 1.5,
            Proxy::MgCa | Proxy::SrCa | Proxy::BaCa | Proxy::UCa => 0.3,
        }
    }

    pub fn from_label(label: &str) -> Option<Proxy> {
        Proxy::ALL.into_iter().find(|p| p.label() == label)
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceSet {
    values: [f64; 8],
}

impl Default for ToleranceSet {
    fn default() -> Self {
        let mut values = [0.0; 8];
        for proxy in Proxy::ALL {
            values[proxy.index()] = proxy.default_tolerance();
        }
        Self { values }
    }
}

impl ToleranceSet {
    pub fn get(&self, proxy: Proxy) -> f64 {
        self.values[proxy.index()]
    }

    pub fn set(&mut self, proxy: Proxy, value: f64) {
        self.values[proxy.index()] = value;
    }

    /// A missing residual passes. The boundary is inclusive.
    pub fn passes(&self, proxy: Proxy, residual: Option<f64>) -> bool {
        match residual {
            Some(r) if r.is_finite() => r.abs() <= self.get(proxy),
            _ => true,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Proxy, f64)> + '_ {
        Proxy::ALL.into_iter().map(|p| (p, self.get(p)))
    }
}
