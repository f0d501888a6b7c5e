//! Output permutation backpropagation.

use std::collections::BTreeSet;

use circopt_ir::{Circuit, Operation, Permutation, QubitId};
use tracing::debug;

use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;

/// Remove `preferred` from the pool if present, otherwise the smallest
/// remaining logical qubit.
fn take_preferred(pool: &mut BTreeSet<QubitId>, preferred: QubitId) -> CompileResult<QubitId> {
    if pool.remove(&preferred) {
        return Ok(preferred);
    }
    pool.pop_first().ok_or_else(|| {
        CompileError::InvalidPermutation(format!(
            "no unplaced logical qubit left for physical qubit {preferred}"
        ))
    })
}

fn walk_back(
    ops: &[Operation],
    permutation: &mut Permutation,
    pool: &mut BTreeSet<QubitId>,
) -> CompileResult<()> {
    for op in ops.iter().rev() {
        let gate = match op {
            Operation::Compound(comp) => {
                walk_back(&comp.ops, permutation, pool)?;
                continue;
            }
            Operation::Standard(gate) if gate.is_swap() => gate,
            _ => continue,
        };

        let (a, b) = (gate.targets[0], gate.targets[1]);
        match (permutation.get(a), permutation.get(b)) {
            (Some(_), Some(_)) => permutation.swap(a, b),
            (Some(logical), None) => {
                permutation.insert(b, logical);
                permutation.insert(a, take_preferred(pool, a)?);
            }
            (None, Some(logical)) => {
                permutation.insert(a, logical);
                permutation.insert(b, take_preferred(pool, b)?);
            }
            (None, None) => {}
        }
    }
    Ok(())
}

/// Derive the initial layout by pushing the output permutation backwards
/// through every uncontrolled SWAP.
///
/// Physical qubits the output permutation leaves unassigned receive logical
/// qubits nobody else holds, preferring the identity assignment.
///
/// # Errors
///
/// [`CompileError::InvalidPermutation`] when the layout refers to more
/// physical qubits than there are logical qubits to place.
pub fn backpropagate_output_permutation(circuit: &mut Circuit) -> CompileResult<()> {
    let mut permutation = circuit.output_permutation().clone();
    let num_qubits = circuit.num_qubits();

    let placed: BTreeSet<QubitId> = permutation.logical_qubits().collect();
    let mut pool: BTreeSet<QubitId> = (0..num_qubits)
        .map(QubitId)
        .filter(|q| !placed.contains(q))
        .collect();

    walk_back(circuit.ops(), &mut permutation, &mut pool)?;

    if permutation.len() != num_qubits as usize {
        for physical in (0..num_qubits).map(QubitId) {
            if !permutation.contains(physical) {
                permutation.insert(physical, take_preferred(&mut pool, physical)?);
            }
        }
    }

    debug!(entries = permutation.len(), "backpropagated output permutation");
    *circuit.initial_layout_mut() = permutation;
    Ok(())
}

/// Pass wrapper for [`backpropagate_output_permutation`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BackpropagateOutputPermutation;

impl BackpropagateOutputPermutation {
    /// Create a new backpropagation pass.
    pub fn new() -> Self {
        Self
    }
}

impl Pass for BackpropagateOutputPermutation {
    fn name(&self) -> &'static str {
        "backpropagate_output_permutation"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, circuit: &mut Circuit, _properties: &mut PropertySet) -> CompileResult<()> {
        backpropagate_output_permutation(circuit)
    }
}
