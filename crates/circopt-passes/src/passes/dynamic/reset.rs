//! Reset elimination.

use circopt_ir::{Circuit, Operation, QubitId};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::CompileResult;
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;

/// Qubit renaming state while resets are being replaced.
struct Renaming {
    /// Original qubit to the fresh qubit that currently stands in for it.
    map: FxHashMap<QubitId, QubitId>,
    next: u32,
    added: usize,
}

impl Renaming {
    fn fresh_qubit(&mut self, circuit: &mut Circuit, replaced: QubitId) -> CompileResult<()> {
        let fresh = QubitId(self.next);
        circuit.add_qubit(fresh, fresh, fresh)?;
        self.map.insert(replaced, fresh);
        self.next += 1;
        self.added += 1;
        Ok(())
    }

    fn rewrite(
        &mut self,
        op: Operation,
        circuit: &mut Circuit,
    ) -> CompileResult<Option<Operation>> {
        if op.is_reset() {
            for &target in op.targets() {
                self.fresh_qubit(circuit, target)?;
            }
            return Ok(None);
        }
        match op {
            Operation::Compound(comp) => {
                let mut children = Vec::with_capacity(comp.len());
                for child in comp.ops {
                    if let Some(child) = self.rewrite(child, circuit)? {
                        children.push(child);
                    }
                }
                Ok((!children.is_empty()).then(|| Operation::compound(children)))
            }
            mut other => {
                if !self.map.is_empty() {
                    let map = &self.map;
                    other.map_qubits(&|q| map.get(&q).copied().unwrap_or(q));
                }
                Ok(Some(other))
            }
        }
    }
}

/// Replace every reset by a fresh qubit.
///
/// Each reset target gets a new physical qubit, appended after the highest
/// one in use and mapped to itself in both layouts. The reset is dropped and
/// every later reference to the target is redirected to the new qubit, so
/// the circuit no longer reuses measured qubits.
pub fn eliminate_resets(circuit: &mut Circuit) -> CompileResult<()> {
    let next = circuit
        .max_physical_qubit()
        .map_or(0, |q| q.0 + 1)
        .max(circuit.num_qubits());
    let mut renaming = Renaming {
        map: FxHashMap::default(),
        next,
        added: 0,
    };

    let ops = circuit.take_ops();
    let mut rewritten = Vec::with_capacity(ops.len());
    for op in ops {
        if let Some(op) = renaming.rewrite(op, circuit)? {
            rewritten.push(op);
        }
    }
    circuit.set_ops(rewritten);

    debug!(added_qubits = renaming.added, "eliminated resets");
    Ok(())
}

/// Pass wrapper for [`eliminate_resets`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EliminateResets;

impl EliminateResets {
    /// Create a new reset elimination pass.
    pub fn new() -> Self {
        Self
    }
}

impl Pass for EliminateResets {
    fn name(&self) -> &'static str {
        "eliminate_resets"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, circuit: &mut Circuit, _properties: &mut PropertySet) -> CompileResult<()> {
        eliminate_resets(circuit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use circopt_ir::{ClbitId, OpType, StandardOperation};

    fn q(i: u32) -> QubitId {
        QubitId(i)
    }

    fn c(i: u32) -> ClbitId {
        ClbitId(i)
    }

    #[test]
    fn test_reset_moves_to_fresh_qubit() {
        let mut circuit = Circuit::with_size("test", 1, 2);
        circuit.h(q(0)).unwrap();
        circuit.measure(q(0), c(0)).unwrap();
        circuit.reset(q(0)).unwrap();
        circuit.h(q(0)).unwrap();
        circuit.measure(q(0), c(1)).unwrap();

        eliminate_resets(&mut circuit).unwrap();

        assert_eq!(circuit.num_qubits(), 2);
        assert_eq!(
            circuit.ops(),
            &[
                Operation::gate(OpType::H, [q(0)]),
                Operation::measure([q(0)], [c(0)]).unwrap(),
                Operation::gate(OpType::H, [q(1)]),
                Operation::measure([q(1)], [c(1)]).unwrap(),
            ]
        );
        assert_eq!(circuit.initial_layout().get(q(1)), Some(q(1)));
        assert_eq!(circuit.output_permutation().get(q(1)), Some(q(1)));
    }

    #[test]
    fn test_repeated_resets_chain() {
        let mut circuit = Circuit::with_size("test", 2, 0);
        circuit.reset(q(0)).unwrap();
        circuit.x(q(0)).unwrap();
        circuit.reset(q(0)).unwrap();
        circuit.cx(q(0), q(1)).unwrap();

        eliminate_resets(&mut circuit).unwrap();

        assert_eq!(circuit.num_qubits(), 4);
        assert_eq!(
            circuit.ops(),
            &[
                Operation::gate(OpType::X, [q(2)]),
                StandardOperation::cx(q(3), q(1)).into(),
            ]
        );
    }

    #[test]
    fn test_reset_inside_compound() {
        let mut circuit = Circuit::with_size("test", 1, 0);
        circuit
            .compound([
                Operation::gate(OpType::H, [q(0)]),
                Operation::reset([q(0)]),
                Operation::gate(OpType::X, [q(0)]),
            ])
            .unwrap();
        circuit.z(q(0)).unwrap();

        eliminate_resets(&mut circuit).unwrap();

        assert_eq!(
            circuit.ops(),
            &[
                Operation::compound([
                    Operation::gate(OpType::H, [q(0)]),
                    Operation::gate(OpType::X, [q(1)]),
                ]),
                Operation::gate(OpType::Z, [q(1)]),
            ]
        );
    }

    #[test]
    fn test_without_resets_unchanged() {
        let mut circuit = Circuit::with_size("test", 2, 1);
        circuit.h(q(0)).unwrap();
        circuit.cx(q(0), q(1)).unwrap();
        circuit.measure(q(1), c(0)).unwrap();

        let before = circuit.clone();
        eliminate_resets(&mut circuit).unwrap();
        assert_eq!(circuit, before);
    }
}
