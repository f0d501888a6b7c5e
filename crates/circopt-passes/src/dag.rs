//! Per-qubit lanes over a circuit's operation list.
//!
//! A [`LaneDag`] holds one lane per physical qubit. Each lane lists, in
//! program order, the indices (slots) of the top-level operations that
//! touch that qubit. A multi-qubit operation appears once in every lane it
//! touches, so two lanes refer to the same operation exactly when they hold
//! the same slot.
//!
//! Slots stay valid as long as the pass does not insert into or erase from
//! the operation list; passes retype operations to identity instead and
//! sweep them afterwards.

use std::fmt;
use std::fmt::Write as _;

use circopt_ir::{Circuit, Operation, QubitId};

use crate::error::{CompileError, CompileResult};

/// Reject an operation whose variant and contents disagree, compound
/// children included.
///
/// A classically controlled operation must wrap a standard gate; anything
/// else is [`CompileError::MalformedClassicControlled`].
pub(crate) fn check_well_formed(op: &Operation, pass: &'static str) -> CompileResult<()> {
    match op {
        Operation::ClassicControlled(cc) if !cc.op.is_standard_operation() => {
            Err(CompileError::MalformedClassicControlled {
                name: cc.op.name().to_string(),
            })
        }
        _ if !op.is_well_formed() => Err(CompileError::UnexpectedOperation {
            name: op.name().to_string(),
            pass,
        }),
        Operation::Compound(comp) => comp
            .iter()
            .try_for_each(|child| check_well_formed(child, pass)),
        _ => Ok(()),
    }
}

/// Per-qubit lanes of operation slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaneDag {
    lanes: Vec<Vec<usize>>,
}

impl LaneDag {
    /// Create `num_lanes` empty lanes.
    pub fn with_lanes(num_lanes: usize) -> Self {
        Self {
            lanes: vec![Vec::new(); num_lanes],
        }
    }

    /// Create empty lanes covering every physical qubit of `circuit`.
    pub fn for_circuit(circuit: &Circuit) -> Self {
        Self::with_lanes(circuit.max_physical_qubit().map_or(0, |q| q.index() + 1))
    }

    /// Build the lanes for all top-level operations of `circuit`.
    pub fn build(circuit: &Circuit, pass: &'static str) -> CompileResult<Self> {
        let mut dag = Self::for_circuit(circuit);
        for (slot, op) in circuit.ops().iter().enumerate() {
            dag.add(slot, op, pass)?;
        }
        Ok(dag)
    }

    /// Append `slot` to the lane of every qubit `op` touches.
    ///
    /// Gates use their controls and targets, compounds the union of their
    /// children's qubits, non-unitary operations their targets, and
    /// classically controlled operations the qubits of the wrapped
    /// operation.
    pub fn add(&mut self, slot: usize, op: &Operation, pass: &'static str) -> CompileResult<()> {
        check_well_formed(op, pass)?;
        for qubit in op.used_qubits() {
            self.push(qubit, slot);
        }
        Ok(())
    }

    /// Append `slot` to the lane of `qubit`.
    pub fn push(&mut self, qubit: QubitId, slot: usize) {
        let idx = qubit.index();
        if idx >= self.lanes.len() {
            self.lanes.resize_with(idx + 1, Vec::new);
        }
        self.lanes[idx].push(slot);
    }

    /// Remove the last slot of `qubit`'s lane.
    pub fn pop(&mut self, qubit: QubitId) -> Option<usize> {
        self.lanes.get_mut(qubit.index()).and_then(Vec::pop)
    }

    /// Number of lanes.
    pub fn num_lanes(&self) -> usize {
        self.lanes.len()
    }

    /// The lane of `qubit`; empty when the qubit is out of range.
    pub fn lane(&self, qubit: QubitId) -> &[usize] {
        self.lanes.get(qubit.index()).map_or(&[], Vec::as_slice)
    }

    /// All lanes, indexed by qubit.
    pub fn lanes(&self) -> &[Vec<usize>] {
        &self.lanes
    }

    /// Most recent slot on `qubit`'s lane.
    pub fn last(&self, qubit: QubitId) -> Option<usize> {
        self.lane(qubit).last().copied()
    }

    /// Slot preceding the most recent one on `qubit`'s lane.
    pub fn second_last(&self, qubit: QubitId) -> Option<usize> {
        let lane = self.lane(qubit);
        lane.len().checked_sub(2).map(|i| lane[i])
    }

    /// Render the lanes with operation names resolved against `ops`.
    pub fn describe(&self, ops: &[Operation]) -> String {
        let mut out = String::new();
        for (qubit, lane) in self.lanes.iter().enumerate() {
            let _ = write!(out, "q{qubit}:");
            for &slot in lane {
                let name = ops.get(slot).map_or("?", Operation::name);
                let _ = write!(out, " {name}#{slot}");
            }
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for LaneDag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (qubit, lane) in self.lanes.iter().enumerate() {
            write!(f, "q{qubit}:")?;
            for slot in lane {
                write!(f, " {slot}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
