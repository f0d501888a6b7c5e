//! Removal of operations that cannot influence measurement results.
//!
//! Both passes walk every lane backwards from its end. A multi-qubit
//! operation is only removed once all of its lanes have been walked back to
//! it; the walk on one lane drives the others forward as needed.

use std::collections::BTreeSet;

use circopt_ir::{Circuit, Control, OpType, Operation, QubitId, StandardOperation};
use tracing::debug;

use crate::dag::LaneDag;
use crate::error::CompileResult;
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;

use super::identity::remove_identities;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// The step handled the slot and moved the cursors.
    Advanced,
    /// The lane cannot be walked any further.
    Stop,
}

type Step = fn(&mut ReverseWalk<'_>, usize, usize) -> Flow;

/// Per-lane cursors walking the lanes from the back.
struct ReverseWalk<'a> {
    lanes: &'a [Vec<usize>],
    ops: &'a mut [Operation],
    /// Position in each lane; `None` once the lane is exhausted or blocked.
    cursors: Vec<Option<usize>>,
    step: Step,
}

impl<'a> ReverseWalk<'a> {
    fn new(
        lanes: &'a [Vec<usize>],
        ops: &'a mut [Operation],
        cursors: Vec<Option<usize>>,
        step: Step,
    ) -> Self {
        Self {
            lanes,
            ops,
            cursors,
            step,
        }
    }

    /// Slot under the cursor of lane `q`.
    fn slot(&self, q: usize) -> Option<usize> {
        let pos = (*self.cursors.get(q)?)?;
        self.lanes[q].get(pos).copied()
    }

    fn advance(&mut self, q: usize) {
        if let Some(cursor) = self.cursors.get_mut(q) {
            *cursor = cursor.and_then(|pos| pos.checked_sub(1));
        }
    }

    fn stop(&mut self, q: usize) {
        if let Some(cursor) = self.cursors.get_mut(q) {
            *cursor = None;
        }
    }

    /// Walk lane `q` backwards until it is blocked, exhausted, or reaches a
    /// slot at or before `until`.
    fn drive(&mut self, q: usize, until: Option<usize>) {
        while let Some(slot) = self.slot(q) {
            if until.is_some_and(|u| slot <= u) {
                return;
            }
            let step = self.step;
            if step(self, q, slot) == Flow::Stop {
                self.stop(q);
                return;
            }
        }
    }

    /// Bring every lane in `others` to `slot`. Fails if any of them gets
    /// blocked first.
    fn sync(&mut self, others: &[usize], slot: usize) -> bool {
        others.iter().all(|&other| {
            self.drive(other, Some(slot));
            self.slot(other) == Some(slot)
        })
    }

    fn run(&mut self) {
        for q in 0..self.lanes.len() {
            self.drive(q, None);
        }
    }
}

fn indices(qubits: impl IntoIterator<Item = QubitId>) -> BTreeSet<usize> {
    qubits.into_iter().map(QubitId::index).collect()
}

// =============================================================================
// Diagonal gates before measurement
// =============================================================================

/// The gate inside a standard or classically controlled operation.
fn wrapped_gate(op: &Operation) -> Option<&StandardOperation> {
    match op {
        Operation::Standard(gate) => Some(gate),
        Operation::ClassicControlled(cc) => cc.op.as_standard(),
        _ => None,
    }
}

fn diagonal_step(walk: &mut ReverseWalk<'_>, q: usize, slot: usize) -> Flow {
    match &walk.ops[slot] {
        Operation::Standard(_) | Operation::ClassicControlled(_) => {
            remove_diagonal_gate(walk, q, slot)
        }
        Operation::Compound(_) => remove_diagonal_compound(walk, q, slot),
        Operation::NonUnitary(_) => Flow::Stop,
    }
}

fn remove_diagonal_gate(walk: &mut ReverseWalk<'_>, q: usize, slot: usize) -> Flow {
    let Some(gate) = wrapped_gate(&walk.ops[slot]) else {
        return Flow::Stop;
    };
    if !gate.op_type.is_diagonal() {
        return Flow::Stop;
    }
    let negative = gate
        .controls
        .iter()
        .find(|c| !c.is_positive())
        .map(|c| c.qubit.index());
    let used = indices(
        gate.controls
            .iter()
            .map(|c| c.qubit)
            .chain(gate.targets.iter().copied()),
    );

    if let Some(control) = negative {
        walk.stop(control);
        return Flow::Stop;
    }

    let others: Vec<usize> = used.iter().copied().filter(|&o| o != q).collect();
    if !walk.sync(&others, slot) {
        return Flow::Stop;
    }
    walk.ops[slot].set_gate(OpType::I);
    for &qubit in &used {
        walk.advance(qubit);
    }
    Flow::Advanced
}

fn remove_diagonal_compound(walk: &mut ReverseWalk<'_>, q: usize, slot: usize) -> Flow {
    let Some(comp) = walk.ops[slot].as_compound() else {
        return Flow::Stop;
    };
    let used = indices(comp.used_qubits());

    if used.len() <= 1 {
        let Some(comp) = walk.ops[slot].as_compound_mut() else {
            return Flow::Stop;
        };
        for child in comp.ops.iter_mut().rev() {
            let diagonal = child
                .as_standard()
                .is_some_and(|g| g.op_type.is_diagonal());
            if !diagonal {
                return Flow::Stop;
            }
            child.set_gate(OpType::I);
        }
        walk.advance(q);
        return Flow::Advanced;
    }

    // Multi-qubit compounds are removed as a whole or not at all.
    let removable = comp.iter().all(|child| {
        child.as_standard().is_some_and(|g| {
            g.op_type.is_diagonal() && g.controls.iter().all(Control::is_positive)
        })
    });
    if !removable {
        return Flow::Stop;
    }
    let others: Vec<usize> = used.iter().copied().filter(|&o| o != q).collect();
    if !walk.sync(&others, slot) {
        return Flow::Stop;
    }
    if let Some(comp) = walk.ops[slot].as_compound_mut() {
        for child in &mut comp.ops {
            child.set_gate(OpType::I);
        }
    }
    for &qubit in &used {
        walk.advance(qubit);
    }
    Flow::Advanced
}

/// Remove diagonal gates that directly precede a measurement.
///
/// A diagonal gate only changes phases, which a computational-basis
/// measurement cannot observe. Multi-qubit diagonal gates are removed only
/// when every qubit they touch is measured with nothing but removable
/// diagonal gates in between. Gates with negative controls are kept.
pub fn remove_diagonal_gates_before_measure(circuit: &mut Circuit) -> CompileResult<()> {
    const PASS: &str = "remove_diagonal_gates_before_measure";

    let dag = LaneDag::build(circuit, PASS)?;
    let ops = circuit.ops_mut();
    let cursors = dag
        .lanes()
        .iter()
        .map(|lane| match lane.last() {
            Some(&last) if ops[last].is_measure() => lane.len().checked_sub(2),
            _ => None,
        })
        .collect();

    ReverseWalk::new(dag.lanes(), ops, cursors, diagonal_step).run();

    let before = circuit.num_ops();
    remove_identities(circuit);
    debug!(removed = before - circuit.num_ops(), "diagonal gates before measure");
    Ok(())
}

// =============================================================================
// Final measurements
// =============================================================================

fn is_measurement_like(op: &Operation) -> bool {
    matches!(
        op,
        Operation::NonUnitary(nu)
            if matches!(nu.op_type, OpType::Measure | OpType::Barrier | OpType::I)
    )
}

fn final_measurement_step(walk: &mut ReverseWalk<'_>, q: usize, slot: usize) -> Flow {
    match &walk.ops[slot] {
        Operation::NonUnitary(op) if matches!(op.op_type, OpType::Measure | OpType::Barrier) => {
            let targets = indices(op.targets.iter().copied());
            if targets.is_empty() {
                return Flow::Stop;
            }
            let others: Vec<usize> = targets.iter().copied().filter(|&o| o != q).collect();
            if !walk.sync(&others, slot) {
                return Flow::Stop;
            }
            walk.ops[slot].set_gate(OpType::I);
            for &target in &targets {
                walk.advance(target);
            }
            Flow::Advanced
        }
        Operation::Compound(comp) if comp.iter().all(is_measurement_like) => {
            remove_final_compound(walk, q, slot)
        }
        _ => Flow::Stop,
    }
}

/// Strip the children of a measurement compound that start on lane `q`.
fn remove_final_compound(walk: &mut ReverseWalk<'_>, q: usize, slot: usize) -> Flow {
    let len = walk.ops[slot].as_compound().map_or(0, |c| c.len());

    for idx in (0..len).rev() {
        let Some(child) = walk.ops[slot].as_compound().and_then(|c| c.ops.get(idx)) else {
            continue;
        };
        if child.op_type() == OpType::I || child.targets().first().map(|t| t.index()) != Some(q) {
            continue;
        }
        let others: Vec<usize> = indices(child.targets().iter().copied())
            .into_iter()
            .filter(|&o| o != q)
            .collect();
        if !walk.sync(&others, slot) {
            return Flow::Stop;
        }
        if let Some(child) = walk.ops[slot]
            .as_compound_mut()
            .and_then(|c| c.ops.get_mut(idx))
        {
            child.set_gate(OpType::I);
        }
    }

    // A joint child owned by another lane still reads this qubit.
    let still_used = walk.ops[slot].as_compound().is_some_and(|c| {
        c.iter().any(|child| {
            child.op_type() != OpType::I && child.targets().iter().any(|t| t.index() == q)
        })
    });
    if still_used {
        return Flow::Stop;
    }
    walk.advance(q);
    Flow::Advanced
}

/// Remove measurements and barriers at the end of the circuit.
///
/// Only operations followed by nothing else on any of their qubits are
/// removed.
pub fn remove_final_measurements(circuit: &mut Circuit) -> CompileResult<()> {
    const PASS: &str = "remove_final_measurements";

    let dag = LaneDag::build(circuit, PASS)?;
    let ops = circuit.ops_mut();
    let cursors = dag
        .lanes()
        .iter()
        .map(|lane| lane.len().checked_sub(1))
        .collect();

    ReverseWalk::new(dag.lanes(), ops, cursors, final_measurement_step).run();

    let before = circuit.num_ops();
    remove_identities(circuit);
    debug!(removed = before - circuit.num_ops(), "final measurements");
    Ok(())
}

/// Pass wrapper for [`remove_diagonal_gates_before_measure`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveDiagonalGatesBeforeMeasure;

impl RemoveDiagonalGatesBeforeMeasure {
    /// Create a new diagonal gate removal pass.
    pub fn new() -> Self {
        Self
    }
}

impl Pass for RemoveDiagonalGatesBeforeMeasure {
    fn name(&self) -> &'static str {
        "remove_diagonal_gates_before_measure"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, circuit: &mut Circuit, _properties: &mut PropertySet) -> CompileResult<()> {
        remove_diagonal_gates_before_measure(circuit)
    }
}

/// Pass wrapper for [`remove_final_measurements`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveFinalMeasurements;

impl RemoveFinalMeasurements {
    /// Create a new final measurement removal pass.
    pub fn new() -> Self {
        Self
    }
}

impl Pass for RemoveFinalMeasurements {
    fn name(&self) -> &'static str {
        "remove_final_measurements"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, circuit: &mut Circuit, _properties: &mut PropertySet) -> CompileResult<()> {
        remove_final_measurements(circuit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use circopt_ir::ClbitId;

    fn q(i: u32) -> QubitId {
        QubitId(i)
    }

    fn c(i: u32) -> ClbitId {
        ClbitId(i)
    }

    fn measure(qubit: u32, clbit: u32) -> Operation {
        Operation::measure([q(qubit)], [c(clbit)]).unwrap()
    }

    #[test]
    fn test_diagonal_run_removed() {
        let mut circuit = Circuit::with_size("test", 1, 1);
        circuit.h(q(0)).unwrap();
        circuit.t(q(0)).unwrap();
        circuit.z(q(0)).unwrap();
        circuit.measure(q(0), c(0)).unwrap();

        remove_diagonal_gates_before_measure(&mut circuit).unwrap();
        assert_eq!(
            circuit.ops(),
            &[Operation::gate(OpType::H, [q(0)]), measure(0, 0)]
        );
    }

    #[test]
    fn test_non_diagonal_gate_blocks() {
        let mut circuit = Circuit::with_size("test", 1, 1);
        circuit.t(q(0)).unwrap();
        circuit.h(q(0)).unwrap();
        circuit.s(q(0)).unwrap();
        circuit.measure(q(0), c(0)).unwrap();

        remove_diagonal_gates_before_measure(&mut circuit).unwrap();
        assert_eq!(circuit.num_ops(), 3);
        assert_eq!(circuit.count_ops(OpType::T), 1);
        assert_eq!(circuit.count_ops(OpType::S), 0);
    }

    #[test]
    fn test_unmeasured_qubit_untouched() {
        let mut circuit = Circuit::with_size("test", 1, 0);
        circuit.z(q(0)).unwrap();

        remove_diagonal_gates_before_measure(&mut circuit).unwrap();
        assert_eq!(circuit.num_ops(), 1);
    }

    #[test]
    fn test_cz_removed_when_both_measured() {
        let mut circuit = Circuit::with_size("test", 2, 2);
        circuit.h(q(0)).unwrap();
        circuit.h(q(1)).unwrap();
        circuit.cz(q(0), q(1)).unwrap();
        circuit.measure(q(0), c(0)).unwrap();
        circuit.measure(q(1), c(1)).unwrap();

        remove_diagonal_gates_before_measure(&mut circuit).unwrap();
        assert_eq!(circuit.count_ops(OpType::Z), 0);
        assert_eq!(circuit.num_ops(), 4);
    }

    #[test]
    fn test_cz_kept_when_partner_unmeasured() {
        let mut circuit = Circuit::with_size("test", 2, 1);
        circuit.cz(q(0), q(1)).unwrap();
        circuit.measure(q(0), c(0)).unwrap();

        let before = circuit.clone();
        remove_diagonal_gates_before_measure(&mut circuit).unwrap();
        assert_eq!(circuit, before);
    }

    #[test]
    fn test_negative_control_kept() {
        let mut circuit = Circuit::with_size("test", 2, 2);
        circuit
            .controlled_gate(OpType::Z, [Control::neg(q(0))], [q(1)])
            .unwrap();
        circuit.measure(q(0), c(0)).unwrap();
        circuit.measure(q(1), c(1)).unwrap();

        let before = circuit.clone();
        remove_diagonal_gates_before_measure(&mut circuit).unwrap();
        assert_eq!(circuit, before);
    }

    #[test]
    fn test_trailing_diagonal_children_of_compound() {
        let mut circuit = Circuit::with_size("test", 1, 1);
        circuit
            .compound([
                Operation::gate(OpType::H, [q(0)]),
                Operation::gate(OpType::T, [q(0)]),
                Operation::gate(OpType::S, [q(0)]),
            ])
            .unwrap();
        circuit.measure(q(0), c(0)).unwrap();

        remove_diagonal_gates_before_measure(&mut circuit).unwrap();
        assert_eq!(
            circuit.ops(),
            &[Operation::gate(OpType::H, [q(0)]), measure(0, 0)]
        );
    }

    #[test]
    fn test_multi_qubit_diagonal_compound() {
        let mut circuit = Circuit::with_size("test", 2, 2);
        circuit
            .compound([
                Operation::controlled(OpType::Z, [Control::pos(q(0))], [q(1)]),
                Operation::gate(OpType::T, [q(0)]),
            ])
            .unwrap();
        circuit.measure(q(0), c(0)).unwrap();
        circuit.measure(q(1), c(1)).unwrap();

        remove_diagonal_gates_before_measure(&mut circuit).unwrap();
        assert_eq!(circuit.ops(), &[measure(0, 0), measure(1, 1)]);
    }

    #[test]
    fn test_final_measurements_removed() {
        let mut circuit = Circuit::with_size("test", 2, 2);
        circuit.h(q(0)).unwrap();
        circuit.cx(q(0), q(1)).unwrap();
        circuit.barrier([q(0), q(1)]).unwrap();
        circuit.measure_many([q(0), q(1)], [c(0), c(1)]).unwrap();

        remove_final_measurements(&mut circuit).unwrap();
        assert_eq!(circuit.num_ops(), 2);
        assert_eq!(circuit.count_ops(OpType::Measure), 0);
        assert_eq!(circuit.count_ops(OpType::Barrier), 0);
    }

    #[test]
    fn test_mid_circuit_measurement_kept() {
        let mut circuit = Circuit::with_size("test", 1, 1);
        circuit.measure(q(0), c(0)).unwrap();
        circuit.x(q(0)).unwrap();

        let before = circuit.clone();
        remove_final_measurements(&mut circuit).unwrap();
        assert_eq!(circuit, before);
    }

    #[test]
    fn test_joint_measurement_blocked_by_later_gate() {
        let mut circuit = Circuit::with_size("test", 2, 2);
        circuit.measure_many([q(0), q(1)], [c(0), c(1)]).unwrap();
        circuit.x(q(1)).unwrap();

        let before = circuit.clone();
        remove_final_measurements(&mut circuit).unwrap();
        assert_eq!(circuit, before);
    }

    #[test]
    fn test_measurement_compound_removed() {
        let mut circuit = Circuit::with_size("test", 2, 2);
        circuit.h(q(1)).unwrap();
        circuit.compound([measure(0, 0), measure(1, 1)]).unwrap();

        remove_final_measurements(&mut circuit).unwrap();
        assert_eq!(circuit.ops(), &[Operation::gate(OpType::H, [q(1)])]);
    }
}
