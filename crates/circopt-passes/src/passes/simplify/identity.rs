//! Identity removal.

use circopt_ir::{Circuit, Operation};
use tracing::trace;

use crate::error::CompileResult;
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;

/// Delete every identity operation from `circuit`, at any nesting level.
///
/// Compounds left empty are deleted; compounds left with a single child
/// are replaced by that child. Classically controlled operations whose
/// wrapped gate was reduced to identity go as well.
pub fn remove_identities(circuit: &mut Circuit) {
    let before = circuit.num_ops();
    strip_identities(circuit.ops_mut());
    trace!(
        before,
        after = circuit.num_ops(),
        "removed identity operations"
    );
}

fn strip_identities(ops: &mut Vec<Operation>) {
    ops.retain_mut(|op| {
        let collapsed = match op {
            Operation::Compound(comp) => {
                strip_identities(&mut comp.ops);
                if comp.is_empty() {
                    return false;
                }
                if comp.is_convertible_to_single_operation() {
                    comp.pop()
                } else {
                    None
                }
            }
            _ => return !op.is_identity(),
        };
        if let Some(single) = collapsed {
            *op = single;
        }
        true
    });
}

/// Pass wrapper for [`remove_identities`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveIdentities;

impl RemoveIdentities {
    /// Create a new identity removal pass.
    pub fn new() -> Self {
        Self
    }
}

impl Pass for RemoveIdentities {
    fn name(&self) -> &'static str {
        "remove_identities"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, circuit: &mut Circuit, _properties: &mut PropertySet) -> CompileResult<()> {
        remove_identities(circuit);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use circopt_ir::{ClassicalRegister, ClbitId, OpType, QubitId, StandardOperation};

    fn q(i: u32) -> QubitId {
        QubitId(i)
    }

    #[test]
    fn test_top_level_identities_removed() {
        let mut circuit = Circuit::with_size("test", 2, 0);
        circuit.i(q(0)).unwrap();
        circuit.h(q(1)).unwrap();
        circuit.i(q(1)).unwrap();

        remove_identities(&mut circuit);
        assert_eq!(circuit.ops(), &[Operation::gate(OpType::H, [q(1)])]);
    }

    #[test]
    fn test_compound_collapses() {
        let mut circuit = Circuit::with_size("test", 2, 0);
        circuit
            .compound([
                Operation::identity(q(0)),
                Operation::gate(OpType::X, [q(0)]),
            ])
            .unwrap();
        circuit
            .compound([Operation::identity(q(1)), Operation::identity(q(1))])
            .unwrap();

        remove_identities(&mut circuit);
        assert_eq!(circuit.ops(), &[Operation::gate(OpType::X, [q(0)])]);
    }

    #[test]
    fn test_nested_compounds() {
        let inner = Operation::compound([
            Operation::identity(q(0)),
            Operation::gate(OpType::S, [q(0)]),
        ]);
        let mut circuit = Circuit::with_size("test", 1, 0);
        circuit
            .compound([inner, Operation::gate(OpType::T, [q(0)])])
            .unwrap();

        remove_identities(&mut circuit);
        assert_eq!(
            circuit.ops(),
            &[Operation::compound([
                Operation::gate(OpType::S, [q(0)]),
                Operation::gate(OpType::T, [q(0)]),
            ])]
        );
    }

    #[test]
    fn test_classic_controlled_identity_removed() {
        let mut circuit = Circuit::with_size("test", 1, 1);
        circuit
            .classic_controlled(
                StandardOperation::new(OpType::I, [q(0)]),
                ClassicalRegister::bit(ClbitId(0)),
                1,
            )
            .unwrap();
        remove_identities(&mut circuit);
        assert!(circuit.is_empty());
    }

    #[test]
    fn test_idempotent() {
        let mut circuit = Circuit::with_size("test", 2, 0);
        circuit.i(q(0)).unwrap();
        circuit.cx(q(0), q(1)).unwrap();
        circuit
            .compound([Operation::identity(q(0)), Operation::identity(q(1))])
            .unwrap();

        remove_identities(&mut circuit);
        let once = circuit.clone();
        remove_identities(&mut circuit);
        assert_eq!(circuit, once);
    }
}
