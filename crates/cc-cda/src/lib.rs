//! cc-cda: matching modelled proxy series against measured speleothem records.
//!
//! [`MatchEngine`] compares each model's derived step series with the
//! user's measured time series, keeps the (step, timepoint) pairs whose
//! residuals are all within tolerance, and maintains four CSV tables under
//! `<output_dir>/CDA Results`.

pub mod engine;
pub mod error;
pub mod measured;
pub mod persist;
pub mod rainfall;
pub mod record;
pub mod table;

pub use engine::{CdaAccumulator, MatchEngine, ModelComparison, predicted_at, proxy_keys};
pub use error::{CdaError, CdaResult};
pub use measured::MeasuredSeries;
pub use persist::{CdaTables, INPUT_RANGE_KEYS, PersistSummary};
pub use rainfall::{RainfallInputs, RainfallRow, run_rainfall_calculator};
pub use record::{AllOutputsRecord, ComparisonRecord, MatchRecord, record_header};
pub use table::{Table, read_table};
