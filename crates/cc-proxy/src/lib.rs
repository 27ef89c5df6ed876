//! cc-proxy: typed step series and derived speleothem proxies.
//!
//! A [`StepSeries`] holds one model run's output, one value per solver step.
//! [`derive_proxies`] turns raw solver vocabulary into fractions remaining,
//! X/Ca ratios, VPDB oxygen isotopes and radiocarbon depletion.

pub mod derive;
pub mod error;
pub mod keys;
pub mod kinetic;
pub mod radiocarbon;
pub mod series;

pub use derive::derive_proxies;
pub use error::{ProxyError, ProxyResult};
pub use radiocarbon::{c14_to_pmc, pmc, pmc_denormalise, pmc_normalise, pmc_to_c14};
pub use series::{StepOutput, StepSeries, StepSeriesBuilder};
