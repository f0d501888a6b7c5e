//! Gate-level simplification passes.

mod cnot;
mod fusion;
mod identity;
mod measurement;

#[cfg(test)]
mod tests;

pub use cnot::{CancelCnots, SwapReconstruction, cancel_cnots, swap_reconstruction};
pub use fusion::{SingleQubitGateFusion, single_qubit_gate_fusion};
pub use identity::{RemoveIdentities, remove_identities};
pub use measurement::{
    RemoveDiagonalGatesBeforeMeasure, RemoveFinalMeasurements,
    remove_diagonal_gates_before_measure, remove_final_measurements,
};
