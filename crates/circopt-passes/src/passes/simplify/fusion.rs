//! Single-qubit gate fusion.

use circopt_ir::{Circuit, OpType, Operation, StandardOperation};
use tracing::debug;

use crate::dag::LaneDag;
use crate::error::CompileResult;
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;

use super::identity::remove_identities;

/// The gate that undoes `op_type`, for gates without parameters.
fn inverse_of(op_type: OpType) -> Option<OpType> {
    match op_type {
        OpType::I | OpType::X | OpType::Y | OpType::Z | OpType::H => Some(op_type),
        OpType::S => Some(OpType::Sdg),
        OpType::Sdg => Some(OpType::S),
        OpType::T => Some(OpType::Tdg),
        OpType::Tdg => Some(OpType::T),
        OpType::SX => Some(OpType::SXdg),
        OpType::SXdg => Some(OpType::SX),
        _ => None,
    }
}

fn is_inverse_pair(first: OpType, second: OpType) -> bool {
    inverse_of(first) == Some(second)
}

/// An uncontrolled gate with exactly one target.
fn single_qubit_gate(op: &Operation) -> Option<&StandardOperation> {
    op.as_standard()
        .filter(|g| g.controls.is_empty() && g.targets.len() == 1)
}

/// Merge runs of uncontrolled single-qubit gates on the same qubit into
/// compound operations.
///
/// Adjacent inverse pairs (`H·H`, `S·Sdg`, `T·Tdg`, ...) cancel instead of
/// being merged. A run is broken by any operation touching the qubit that
/// is not an uncontrolled single-qubit gate.
pub fn single_qubit_gate_fusion(circuit: &mut Circuit) -> CompileResult<()> {
    const PASS: &str = "single_qubit_gate_fusion";

    let mut dag = LaneDag::for_circuit(circuit);
    let ops = circuit.ops_mut();
    let mut fused = 0usize;
    let mut cancelled = 0usize;

    for slot in 0..ops.len() {
        let Some(current) = single_qubit_gate(&ops[slot]).cloned() else {
            dag.add(slot, &ops[slot], PASS)?;
            continue;
        };
        let target = current.targets[0];
        let Some(prev) = dag.last(target) else {
            dag.add(slot, &ops[slot], PASS)?;
            continue;
        };

        match &mut ops[prev] {
            Operation::Compound(comp)
                if comp.iter().all(Operation::is_unitary) && comp.used_qubits().len() <= 1 =>
            {
                let undoes_last = comp
                    .last()
                    .and_then(Operation::as_standard)
                    .is_some_and(|last| is_inverse_pair(last.op_type, current.op_type));
                if undoes_last {
                    comp.pop();
                    cancelled += 1;
                } else {
                    comp.push(current);
                    fused += 1;
                }
                ops[slot].soft_delete();
            }
            Operation::Standard(gate) if gate.controls.is_empty() && gate.targets.len() == 1 => {
                if is_inverse_pair(gate.op_type, current.op_type) {
                    ops[prev].soft_delete();
                    ops[slot].soft_delete();
                    dag.pop(target);
                    cancelled += 1;
                } else {
                    let earlier = std::mem::replace(&mut ops[prev], Operation::compound([]));
                    ops[prev] = Operation::compound([earlier, current.into()]);
                    ops[slot].soft_delete();
                    fused += 1;
                }
            }
            _ => dag.add(slot, &ops[slot], PASS)?,
        }
    }

    debug!(fused, cancelled, "single-qubit gate fusion");
    remove_identities(circuit);
    Ok(())
}

/// Pass wrapper for [`single_qubit_gate_fusion`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleQubitGateFusion;

impl SingleQubitGateFusion {
    /// Create a new single-qubit fusion pass.
    pub fn new() -> Self {
        Self
    }
}

impl Pass for SingleQubitGateFusion {
    fn name(&self) -> &'static str {
        "single_qubit_gate_fusion"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, circuit: &mut Circuit, _properties: &mut PropertySet) -> CompileResult<()> {
        single_qubit_gate_fusion(circuit)
    }
}
