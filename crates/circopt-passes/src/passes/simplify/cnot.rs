//! CNOT and SWAP algebra on adjacent two-qubit gates.
//!
//! Both passes walk the circuit once, building the lane DAG as they go, and
//! look at the most recent operation on the lanes of the current gate. Two
//! lanes ending in the same slot means nothing else touched either qubit in
//! between, so the pair can be rewritten locally. Removed gates are retyped
//! to identity and popped off the lanes; the identity sweep at the end
//! deletes them.

use circopt_ir::{Circuit, Control, OpType, Operation, QubitId, StandardOperation};
use tracing::debug;

use crate::dag::LaneDag;
use crate::error::CompileResult;
use crate::pass::{Pass, PassKind};
use crate::passes::pair_mut;
use crate::property::PropertySet;

use super::identity::remove_identities;

/// `(control, target)` of a CNOT.
fn cnot_operands(op: &Operation) -> Option<(QubitId, QubitId)> {
    let gate = op.as_standard().filter(|g| g.is_cnot())?;
    Some((gate.control_qubit()?, gate.targets[0]))
}

fn sorted_pair(a: QubitId, b: QubitId) -> [QubitId; 2] {
    if a <= b { [a, b] } else { [b, a] }
}

fn rewrite_as_swap(gate: &mut StandardOperation, a: QubitId, b: QubitId) {
    gate.op_type = OpType::Swap;
    gate.controls.clear();
    gate.set_targets(sorted_pair(a, b));
}

fn rewrite_as_cnot(gate: &mut StandardOperation, control: QubitId, target: QubitId) {
    gate.op_type = OpType::X;
    gate.set_controls([Control::pos(control)]);
    gate.set_targets([target]);
}

/// Fold adjacent CNOT pairs.
///
/// Two identical CNOTs cancel. A CNOT followed by the reversed CNOT is
/// rewritten as a SWAP followed by the first CNOT, using
/// `CX(b,a)·CX(a,b) = SWAP·CX(b,a)` in time order.
pub fn swap_reconstruction(circuit: &mut Circuit) -> CompileResult<()> {
    const PASS: &str = "swap_reconstruction";

    let mut dag = LaneDag::for_circuit(circuit);
    let ops = circuit.ops_mut();
    let mut cancelled = 0usize;
    let mut swaps = 0usize;

    for slot in 0..ops.len() {
        let Some((control, target)) = cnot_operands(&ops[slot]) else {
            dag.add(slot, &ops[slot], PASS)?;
            continue;
        };

        let prev = match (dag.last(control), dag.last(target)) {
            (Some(a), Some(b)) if a == b => a,
            _ => {
                dag.add(slot, &ops[slot], PASS)?;
                continue;
            }
        };
        let Some((prev_control, prev_target)) = cnot_operands(&ops[prev]) else {
            dag.add(slot, &ops[slot], PASS)?;
            continue;
        };

        dag.pop(control);
        dag.pop(target);

        let Some((earlier, current)) = pair_mut(ops, prev, slot) else {
            continue;
        };
        if prev_control == control && prev_target == target {
            earlier.soft_delete();
            current.soft_delete();
            cancelled += 1;
        } else {
            if let Some(gate) = earlier.as_standard_mut() {
                rewrite_as_swap(gate, control, target);
            }
            dag.add(prev, earlier, PASS)?;
            if let Some(gate) = current.as_standard_mut() {
                rewrite_as_cnot(gate, target, control);
            }
            dag.add(slot, current, PASS)?;
            swaps += 1;
        }
    }

    debug!(cancelled, swaps, "swap reconstruction");
    remove_identities(circuit);
    Ok(())
}

/// The two qubits a CNOT or SWAP is keyed on: `(target, control)` for a
/// CNOT, the two targets for a SWAP.
fn cancel_key(gate: &StandardOperation) -> Option<(QubitId, QubitId)> {
    if gate.is_cnot() {
        Some((gate.targets[0], gate.control_qubit()?))
    } else if gate.is_swap() {
        Some((gate.targets[0], gate.targets[1]))
    } else {
        None
    }
}

/// Cancel and fuse adjacent CNOT/SWAP gates.
///
/// - identical adjacent CNOTs cancel, as do adjacent SWAPs on the same pair
/// - a CNOT after a SWAP, or a SWAP after a CNOT, become two CNOTs
/// - `CX(a,b) CX(b,a) CX(a,b)` collapses into one SWAP
pub fn cancel_cnots(circuit: &mut Circuit) -> CompileResult<()> {
    const PASS: &str = "cancel_cnots";

    let mut dag = LaneDag::for_circuit(circuit);
    let ops = circuit.ops_mut();
    let mut rewrites = 0usize;

    for slot in 0..ops.len() {
        let Some((current_is_cnot, q0, q1)) = ops[slot]
            .as_standard()
            .and_then(|g| cancel_key(g).map(|(a, b)| (g.is_cnot(), a, b)))
        else {
            dag.add(slot, &ops[slot], PASS)?;
            continue;
        };

        let prev = match (dag.last(q0), dag.last(q1)) {
            (Some(a), Some(b)) if a == b => a,
            _ => {
                dag.add(slot, &ops[slot], PASS)?;
                continue;
            }
        };
        let Some((prev_is_cnot, prev_q0, prev_q1)) = ops[prev]
            .as_standard()
            .and_then(|g| cancel_key(g).map(|(a, b)| (g.is_cnot(), a, b)))
        else {
            dag.add(slot, &ops[slot], PASS)?;
            continue;
        };

        match (prev_is_cnot, current_is_cnot) {
            (true, true) if prev_q0 == q0 && prev_q1 == q1 => {
                dag.pop(q0);
                dag.pop(q1);
                ops[prev].soft_delete();
                ops[slot].soft_delete();
                rewrites += 1;
            }
            (true, true) => {
                let first = match (dag.second_last(q0), dag.second_last(q1)) {
                    (Some(a), Some(b)) if a == b => Some(a),
                    _ => None,
                };
                let matches_first = first
                    .and_then(|s| ops[s].as_standard())
                    .filter(|g| g.is_cnot())
                    .and_then(cancel_key)
                    == Some((q0, q1));
                match first {
                    Some(first) if matches_first => {
                        if let Some(gate) = ops[first].as_standard_mut() {
                            rewrite_as_swap(gate, q0, q1);
                        }
                        ops[prev].soft_delete();
                        ops[slot].soft_delete();
                        dag.pop(q0);
                        dag.pop(q1);
                        rewrites += 1;
                    }
                    _ => dag.add(slot, &ops[slot], PASS)?,
                }
            }
            (false, false) => {
                dag.pop(q0);
                dag.pop(q1);
                ops[prev].soft_delete();
                ops[slot].soft_delete();
                rewrites += 1;
            }
            (false, true) => {
                // SWAP then CX(q1 -> q0) equals CX(q1 -> q0) then CX(q0 -> q1).
                if let Some((earlier, current)) = pair_mut(ops, prev, slot) {
                    if let Some(gate) = earlier.as_standard_mut() {
                        rewrite_as_cnot(gate, q1, q0);
                    }
                    if let Some(gate) = current.as_standard_mut() {
                        rewrite_as_cnot(gate, q0, q1);
                    }
                }
                dag.add(slot, &ops[slot], PASS)?;
                rewrites += 1;
            }
            (true, false) => {
                // CX(c -> t) then SWAP equals CX(t -> c) then CX(c -> t).
                if let Some((earlier, current)) = pair_mut(ops, prev, slot) {
                    if let Some(gate) = earlier.as_standard_mut() {
                        rewrite_as_cnot(gate, prev_q0, prev_q1);
                    }
                    if let Some(gate) = current.as_standard_mut() {
                        rewrite_as_cnot(gate, prev_q1, prev_q0);
                    }
                }
                dag.add(slot, &ops[slot], PASS)?;
                rewrites += 1;
            }
        }
    }

    debug!(rewrites, "cancel cnots");
    remove_identities(circuit);
    Ok(())
}

/// Pass wrapper for [`swap_reconstruction`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SwapReconstruction;

impl SwapReconstruction {
    /// Create a new swap reconstruction pass.
    pub fn new() -> Self {
        Self
    }
}

impl Pass for SwapReconstruction {
    fn name(&self) -> &'static str {
        "swap_reconstruction"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, circuit: &mut Circuit, _properties: &mut PropertySet) -> CompileResult<()> {
        swap_reconstruction(circuit)
    }
}

/// Pass wrapper for [`cancel_cnots`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CancelCnots;

impl CancelCnots {
    /// Create a new CNOT cancellation pass.
    pub fn new() -> Self {
        Self
    }
}

impl Pass for CancelCnots {
    fn name(&self) -> &'static str {
        "cancel_cnots"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, circuit: &mut Circuit, _properties: &mut PropertySet) -> CompileResult<()> {
        cancel_cnots(circuit)
    }
}
