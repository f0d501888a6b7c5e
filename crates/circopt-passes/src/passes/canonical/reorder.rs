//! Canonical operation ordering.

use std::collections::{BTreeMap, BTreeSet};

use circopt_ir::{Circuit, ClbitId, Operation};
use tracing::{debug, warn};

use crate::dag::LaneDag;
use crate::error::CompileResult;
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;

/// Classical bits read or written by `op`, children included.
fn classical_bits(op: &Operation, bits: &mut BTreeSet<ClbitId>) {
    match op {
        Operation::NonUnitary(nu) => bits.extend(nu.classics.iter().copied()),
        Operation::ClassicControlled(cc) => {
            bits.extend(cc.register.bits());
            classical_bits(&cc.op, bits);
        }
        Operation::Compound(comp) => {
            for child in comp.iter() {
                classical_bits(child, bits);
            }
        }
        Operation::Standard(_) => {}
    }
}

/// Compute the canonical schedule as a list of slots.
///
/// Bit lanes only hold operations that also sit on a qubit lane, so the
/// lowest unscheduled slot heads every lane it is on and each sweep
/// schedules at least one operation.
fn schedule(dag: &LaneDag, ops: &[Operation]) -> Vec<usize> {
    let qubits: Vec<Vec<usize>> = ops
        .iter()
        .map(|op| op.used_qubits().into_iter().map(|q| q.index()).collect())
        .collect();
    let bits: Vec<BTreeSet<ClbitId>> = ops
        .iter()
        .map(|op| {
            let mut bits = BTreeSet::new();
            classical_bits(op, &mut bits);
            bits
        })
        .collect();

    let mut bit_lanes: BTreeMap<ClbitId, Vec<usize>> = BTreeMap::new();
    for (slot, used) in bits.iter().enumerate() {
        if qubits[slot].is_empty() {
            continue;
        }
        for &bit in used {
            bit_lanes.entry(bit).or_default().push(slot);
        }
    }

    let lanes = dag.lanes();
    let mut cursors = vec![0usize; lanes.len()];
    let mut bit_cursors: BTreeMap<ClbitId, usize> =
        bit_lanes.keys().map(|&bit| (bit, 0)).collect();
    let mut order = Vec::with_capacity(ops.len());

    loop {
        let mut done = true;
        let mut progressed = false;

        for q in (0..lanes.len()).rev() {
            let Some(&slot) = lanes[q].get(cursors[q]) else {
                continue;
            };
            done = false;

            let qubits_ready = qubits[slot]
                .iter()
                .all(|&other| lanes[other].get(cursors[other]) == Some(&slot));
            let bits_ready = bits[slot].iter().all(|bit| {
                let lane = bit_lanes.get(bit).map_or(&[][..], Vec::as_slice);
                let cursor = bit_cursors.get(bit).copied().unwrap_or(0);
                lane.get(cursor) == Some(&slot)
            });
            if !qubits_ready || !bits_ready {
                continue;
            }

            order.push(slot);
            progressed = true;
            for &other in &qubits[slot] {
                cursors[other] += 1;
            }
            for bit in &bits[slot] {
                if let Some(cursor) = bit_cursors.get_mut(bit) {
                    *cursor += 1;
                }
            }
        }

        if done {
            return order;
        }
        debug_assert!(progressed, "stalled after {} of {}", order.len(), ops.len());
    }
}

/// Reorder the operations into a canonical order.
///
/// Operations are scheduled greedily, sweeping the qubits from the highest
/// to the lowest; an operation is emitted once every qubit it touches has
/// reached it. Measurements and classically controlled operations on the
/// same bit keep their relative order. Operations touching no qubit are
/// moved to the end. Running the pass twice yields the same circuit.
pub fn reorder_operations(circuit: &mut Circuit) -> CompileResult<()> {
    const PASS: &str = "reorder_operations";

    if circuit
        .ops()
        .iter()
        .any(Operation::is_classic_controlled_operation)
    {
        warn!("reordering a circuit with classically controlled operations");
    }

    let dag = LaneDag::build(circuit, PASS)?;
    let order = schedule(&dag, circuit.ops());

    let mut slots: Vec<Option<Operation>> = circuit.take_ops().into_iter().map(Some).collect();
    let mut ops: Vec<Operation> = order.iter().filter_map(|&slot| slots[slot].take()).collect();
    let unscheduled = slots.len() - ops.len();
    ops.extend(slots.into_iter().flatten());
    circuit.set_ops(ops);

    debug!(unscheduled, "reordered operations");
    Ok(())
}

/// Pass wrapper for [`reorder_operations`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ReorderOperations;

impl ReorderOperations {
    /// Create a new reordering pass.
    pub fn new() -> Self {
        Self
    }
}

impl Pass for ReorderOperations {
    fn name(&self) -> &'static str {
        "reorder_operations"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, circuit: &mut Circuit, _properties: &mut PropertySet) -> CompileResult<()> {
        reorder_operations(circuit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileError;
    use circopt_ir::{ClassicalRegister, NonUnitaryOperation, OpType, QubitId, StandardOperation};

    fn q(i: u32) -> QubitId {
        QubitId(i)
    }

    fn h(qubit: u32) -> Operation {
        Operation::gate(OpType::H, [q(qubit)])
    }

    #[test]
    fn test_highest_qubit_first() {
        let mut circuit = Circuit::with_size("test", 3, 0);
        circuit.h(q(0)).unwrap();
        circuit.h(q(1)).unwrap();
        circuit.h(q(2)).unwrap();

        reorder_operations(&mut circuit).unwrap();
        assert_eq!(circuit.ops(), &[h(2), h(1), h(0)]);
    }

    #[test]
    fn test_dependencies_respected() {
        let mut circuit = Circuit::with_size("test", 2, 0);
        circuit.x(q(0)).unwrap();
        circuit.cx(q(0), q(1)).unwrap();
        circuit.h(q(1)).unwrap();

        reorder_operations(&mut circuit).unwrap();
        assert_eq!(
            circuit.ops(),
            &[
                Operation::gate(OpType::X, [q(0)]),
                StandardOperation::cx(q(0), q(1)).into(),
                h(1),
            ]
        );
    }

    #[test]
    fn test_fixed_point() {
        let mut circuit = Circuit::with_size("test", 4, 0);
        circuit.h(q(0)).unwrap();
        circuit.cx(q(2), q(3)).unwrap();
        circuit.cx(q(0), q(2)).unwrap();
        circuit.h(q(1)).unwrap();
        circuit.cx(q(1), q(3)).unwrap();

        reorder_operations(&mut circuit).unwrap();
        let once = circuit.clone();
        reorder_operations(&mut circuit).unwrap();
        assert_eq!(circuit, once);
    }

    #[test]
    fn test_classical_dependency_kept() {
        let mut circuit = Circuit::with_size("test", 2, 1);
        circuit.measure(q(0), ClbitId(0)).unwrap();
        circuit
            .if_bit(StandardOperation::new(OpType::X, [q(1)]), ClbitId(0), 1)
            .unwrap();

        reorder_operations(&mut circuit).unwrap();
        assert!(circuit.ops()[0].is_measure());
        assert!(circuit.ops()[1].is_classic_controlled_operation());
    }

    #[test]
    fn test_qubitless_bit_writer_does_not_block() {
        let mut circuit = Circuit::with_size("test", 1, 1);
        circuit.ops_mut().push(Operation::NonUnitary(NonUnitaryOperation {
            op_type: OpType::Measure,
            targets: vec![],
            classics: vec![ClbitId(0)],
        }));
        circuit
            .if_bit(StandardOperation::new(OpType::X, [q(0)]), ClbitId(0), 1)
            .unwrap();

        reorder_operations(&mut circuit).unwrap();
        assert!(circuit.ops()[0].is_classic_controlled_operation());
        assert!(circuit.ops()[1].is_measure());
    }

    #[test]
    fn test_classic_controlled_block_rejected() {
        let mut circuit = Circuit::with_size("test", 1, 1);
        circuit.ops_mut().push(Operation::classic_controlled(
            Operation::compound([
                Operation::gate(OpType::X, [q(0)]),
                Operation::gate(OpType::H, [q(0)]),
            ]),
            ClassicalRegister::bit(ClbitId(0)),
            1,
        ));
        circuit.h(q(0)).unwrap();

        let before = circuit.clone();
        let err = reorder_operations(&mut circuit).unwrap_err();
        assert!(matches!(err, CompileError::MalformedClassicControlled { .. }));
        assert_eq!(circuit, before);
    }

    #[test]
    fn test_qubitless_operations_moved_last() {
        let mut circuit = Circuit::with_size("test", 1, 0);
        circuit.barrier([]).unwrap();
        circuit.h(q(0)).unwrap();

        reorder_operations(&mut circuit).unwrap();
        assert_eq!(circuit.ops()[0], h(0));
        assert_eq!(circuit.ops()[1], Operation::barrier([]));
    }
}
