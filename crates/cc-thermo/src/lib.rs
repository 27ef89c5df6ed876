//! cc-thermo: thermodynamic database lookups.
//!
//! Reads a PHREEQC-style flat-file database and evaluates the reaction
//! constants and isotope fractionation expressions stored in it.
//!
//! # Example
//!
//! ```no_run
//! use cc_thermo::ThermoDatabase;
//!
//! let mut db = ThermoDatabase::open("data/calcite.dat").unwrap();
//! let alpha = db.get_alpha("13C", "Calcite/HCO3-", 298.15).unwrap();
//! println!("alpha = {alpha}");
//! ```

pub mod database;
pub mod error;
pub mod expression;

pub use database::{KValues, ThermoDatabase};
pub use error::{ThermoError, ThermoResult};
pub use expression::{analytic_terms, evaluate_analytic};
