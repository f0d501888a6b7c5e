//! Passes for circuits with mid-circuit measurement and classical control.

mod analysis;
mod defer;
mod reset;

pub use analysis::{DynamicCircuitAnalysis, is_dynamic_circuit};
pub use defer::{DeferMeasurements, defer_measurements};
pub use reset::{EliminateResets, eliminate_resets};
