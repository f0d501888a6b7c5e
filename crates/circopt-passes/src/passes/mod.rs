//! Built-in optimization passes.
//!
//! Passes are organized into four groups:
//! - [`simplify`]: Local gate-level simplifications (identities, CNOT
//!   cancellation, single-qubit fusion, measurement cleanup)
//! - [`rewrite`]: Gate decompositions (SWAP expansion, MCX to MCZ)
//! - [`dynamic`]: Reset elimination, measurement deferral and the
//!   dynamic-circuit analysis
//! - [`canonical`]: Reordering, flattening, block collection and output
//!   permutation back-propagation
//!
//! Every pass is available both as a free function operating on a
//! [`Circuit`](circopt_ir::Circuit) and as a [`Pass`](crate::Pass) for use
//! in a [`PassManager`](crate::PassManager).

pub mod canonical;
pub mod dynamic;
pub mod rewrite;
pub mod simplify;

pub use canonical::{
    BackpropagateOutputPermutation, CollectBlocks, FlattenOperations, ReorderOperations,
    backpropagate_output_permutation, collect_blocks, flatten_operations, reorder_operations,
};
pub use dynamic::{
    DeferMeasurements, DynamicCircuitAnalysis, EliminateResets, defer_measurements,
    eliminate_resets, is_dynamic_circuit,
};
pub use rewrite::{DecomposeSwap, ReplaceMcxWithMcz, decompose_swap, replace_mcx_with_mcz};
pub use simplify::{
    CancelCnots, RemoveDiagonalGatesBeforeMeasure, RemoveFinalMeasurements, RemoveIdentities,
    SingleQubitGateFusion, SwapReconstruction, cancel_cnots, remove_diagonal_gates_before_measure,
    remove_final_measurements, remove_identities, single_qubit_gate_fusion, swap_reconstruction,
};

/// Mutable references to two distinct elements, in argument order.
pub(crate) fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> Option<(&mut T, &mut T)> {
    if a == b || a.max(b) >= items.len() {
        return None;
    }
    if a < b {
        let (head, tail) = items.split_at_mut(b);
        Some((&mut head[a], &mut tail[0]))
    } else {
        let (head, tail) = items.split_at_mut(a);
        Some((&mut tail[0], &mut head[b]))
    }
}
