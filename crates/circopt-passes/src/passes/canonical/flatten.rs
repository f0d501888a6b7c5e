//! Compound flattening.

use circopt_ir::{Circuit, Operation};
use tracing::trace;

use crate::error::CompileResult;
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;

fn splice(ops: Vec<Operation>, out: &mut Vec<Operation>) {
    for op in ops {
        match op {
            Operation::Compound(comp) => splice(comp.ops, out),
            other => out.push(other),
        }
    }
}

/// Replace every compound operation by its children, recursively, so the
/// circuit holds no compounds afterwards.
pub fn flatten_operations(circuit: &mut Circuit) {
    let ops = circuit.take_ops();
    let before = ops.len();
    let mut flat = Vec::with_capacity(before);
    splice(ops, &mut flat);
    trace!(before, after = flat.len(), "flattened compounds");
    circuit.set_ops(flat);
}

/// Pass wrapper for [`flatten_operations`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FlattenOperations;

impl FlattenOperations {
    /// Create a new flattening pass.
    pub fn new() -> Self {
        Self
    }
}

impl Pass for FlattenOperations {
    fn name(&self) -> &'static str {
        "flatten_operations"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, circuit: &mut Circuit, _properties: &mut PropertySet) -> CompileResult<()> {
        flatten_operations(circuit);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use circopt_ir::{OpType, QubitId};

    fn gate(op_type: OpType) -> Operation {
        Operation::gate(op_type, [QubitId(0)])
    }

    #[test]
    fn test_nested_compounds_spliced_in_order() {
        let mut circuit = Circuit::with_size("test", 1, 0);
        circuit.h(QubitId(0)).unwrap();
        circuit
            .compound([
                gate(OpType::X),
                Operation::compound([gate(OpType::Y), gate(OpType::Z)]),
                gate(OpType::S),
            ])
            .unwrap();
        circuit.t(QubitId(0)).unwrap();

        flatten_operations(&mut circuit);
        assert_eq!(
            circuit.ops(),
            &[
                gate(OpType::H),
                gate(OpType::X),
                gate(OpType::Y),
                gate(OpType::Z),
                gate(OpType::S),
                gate(OpType::T),
            ]
        );
    }

    #[test]
    fn test_empty_compound_disappears() {
        let mut circuit = Circuit::with_size("test", 1, 0);
        circuit.compound([]).unwrap();
        flatten_operations(&mut circuit);
        assert!(circuit.is_empty());
    }
}
