//! Deferred measurement.

use std::collections::BTreeMap;

use circopt_ir::{Circuit, ClbitId, Control, Operation, QubitId};
use tracing::debug;

use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;

/// `(qubit, clbit)` of a single-qubit measurement.
fn measurement_operands(op: &Operation) -> CompileResult<Option<(QubitId, ClbitId)>> {
    if !op.is_measure() {
        return Ok(None);
    }
    match (op.targets(), op.classics()) {
        ([qubit], [clbit]) => Ok(Some((*qubit, *clbit))),
        (qubits, clbits) => Err(CompileError::UnsupportedMeasurement {
            qubits: qubits.len(),
            clbits: clbits.len(),
        }),
    }
}

/// Turn a classically controlled gate on the measured bit into a quantum
/// controlled gate on the measured qubit.
fn quantum_controlled(op: &Operation, qubit: QubitId) -> CompileResult<Operation> {
    let Operation::ClassicControlled(cc) = op else {
        return Err(CompileError::MalformedClassicControlled {
            name: op.name().to_string(),
        });
    };
    let Some(gate) = cc.op.as_standard() else {
        return Err(CompileError::MalformedClassicControlled {
            name: cc.op.name().to_string(),
        });
    };
    if gate.targets.contains(&qubit) {
        return Err(CompileError::ImplicitReset { qubit });
    }

    let mut gate = gate.clone();
    gate.controls.insert(if cc.expected_value == 1 {
        Control::pos(qubit)
    } else {
        Control::neg(qubit)
    });
    Ok(gate.into())
}

/// Move every measurement to the end of the circuit.
///
/// Classically controlled gates conditioned on a measured bit become gates
/// controlled by the measured qubit, inserted before the next operation
/// that touches that qubit. The measurements are re-appended at the end and
/// the output permutation is rebuilt from them.
///
/// # Errors
///
/// Fails on measurements of more than one qubit, classical control on more
/// than one bit, resets after a deferred measurement (run
/// [`eliminate_resets`](crate::passes::eliminate_resets) first), wrapped
/// operations that are not plain gates, and gates that target the qubit
/// they were conditioned on.
pub fn defer_measurements(circuit: &mut Circuit) -> CompileResult<()> {
    let mut deferred: BTreeMap<QubitId, ClbitId> = BTreeMap::new();
    let mut rewired = 0usize;
    let ops = circuit.ops_mut();

    let mut i = 0;
    while i < ops.len() {
        let Some((qubit, clbit)) = measurement_operands(&ops[i])? else {
            i += 1;
            continue;
        };
        if i + 1 == ops.len() {
            break;
        }

        deferred.insert(qubit, clbit);
        ops.remove(i);

        let mut op_idx = i;
        let mut insertion = i;
        while op_idx < ops.len() {
            let op = &ops[op_idx];

            if op.is_unitary() {
                if !op.acts_on(qubit) {
                    insertion += 1;
                }
                op_idx += 1;
                continue;
            }
            if op.is_reset() {
                return Err(CompileError::ResetDuringDeferral);
            }
            if op.is_measure() {
                if op.targets() == [qubit] && op.classics() == [clbit] {
                    break;
                }
                insertion += 1;
                op_idx += 1;
                continue;
            }
            if let Operation::ClassicControlled(cc) = op {
                if cc.register.size != 1 {
                    return Err(CompileError::UnsupportedClassicControl {
                        size: cc.register.size,
                    });
                }
                if cc.register.start == clbit {
                    let replacement = quantum_controlled(op, qubit)?;
                    ops.remove(op_idx);
                    ops.insert(insertion, replacement);
                    insertion += 1;
                    op_idx = insertion;
                    rewired += 1;
                    continue;
                }
            }

            // Classical control on other bits and directives.
            if !op.acts_on(qubit) {
                insertion += 1;
            }
            op_idx += 1;
        }
        // The operation now at `i` has not been inspected yet.
    }

    if deferred.is_empty() {
        return Ok(());
    }

    debug!(measurements = deferred.len(), rewired, "deferred measurements");
    circuit.output_permutation_mut().clear();
    for (qubit, clbit) in deferred {
        circuit.measure(qubit, clbit)?;
    }
    circuit.initialize_io_mapping();
    Ok(())
}

/// Pass wrapper for [`defer_measurements`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DeferMeasurements;

impl DeferMeasurements {
    /// Create a new measurement deferral pass.
    pub fn new() -> Self {
        Self
    }
}

impl Pass for DeferMeasurements {
    fn name(&self) -> &'static str {
        "defer_measurements"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, circuit: &mut Circuit, _properties: &mut PropertySet) -> CompileResult<()> {
        defer_measurements(circuit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use circopt_ir::{ClassicalRegister, OpType, StandardOperation};

    fn q(i: u32) -> QubitId {
        QubitId(i)
    }

    fn c(i: u32) -> ClbitId {
        ClbitId(i)
    }

    fn x(qubit: u32) -> StandardOperation {
        StandardOperation::new(OpType::X, [q(qubit)])
    }

    fn measure(qubit: u32, clbit: u32) -> Operation {
        Operation::measure([q(qubit)], [c(clbit)]).unwrap()
    }

    #[test]
    fn test_classic_control_becomes_quantum_control() {
        let mut circuit = Circuit::with_size("test", 2, 1);
        circuit.h(q(0)).unwrap();
        circuit.measure(q(0), c(0)).unwrap();
        circuit.if_bit(x(1), c(0), 1).unwrap();

        defer_measurements(&mut circuit).unwrap();

        assert_eq!(
            circuit.ops(),
            &[
                Operation::gate(OpType::H, [q(0)]),
                StandardOperation::cx(q(0), q(1)).into(),
                measure(0, 0),
            ]
        );
        assert_eq!(circuit.output_permutation().get(q(0)), Some(q(0)));
        assert_eq!(circuit.output_permutation().len(), 1);
    }

    #[test]
    fn test_expected_zero_gives_negative_control() {
        let mut circuit = Circuit::with_size("test", 2, 1);
        circuit.measure(q(0), c(0)).unwrap();
        circuit.if_bit(x(1), c(0), 0).unwrap();

        defer_measurements(&mut circuit).unwrap();

        assert_eq!(
            circuit.ops()[0],
            Operation::controlled(OpType::X, [Control::neg(q(0))], [q(1)])
        );
        assert_eq!(circuit.ops()[1], measure(0, 0));
    }

    #[test]
    fn test_inserted_before_later_use_of_qubit() {
        let mut circuit = Circuit::with_size("test", 2, 1);
        circuit.measure(q(0), c(0)).unwrap();
        circuit.h(q(0)).unwrap();
        circuit.if_bit(x(1), c(0), 1).unwrap();

        defer_measurements(&mut circuit).unwrap();

        assert_eq!(
            circuit.ops(),
            &[
                StandardOperation::cx(q(0), q(1)).into(),
                Operation::gate(OpType::H, [q(0)]),
                measure(0, 0),
            ]
        );
    }

    #[test]
    fn test_consecutive_measurements() {
        let mut circuit = Circuit::with_size("test", 3, 2);
        circuit.measure(q(0), c(0)).unwrap();
        circuit.measure(q(1), c(1)).unwrap();
        circuit.if_bit(x(2), c(0), 1).unwrap();
        circuit.if_bit(x(2), c(1), 1).unwrap();

        defer_measurements(&mut circuit).unwrap();

        assert_eq!(
            circuit.ops(),
            &[
                StandardOperation::cx(q(0), q(2)).into(),
                StandardOperation::cx(q(1), q(2)).into(),
                measure(0, 0),
                measure(1, 1),
            ]
        );
    }

    #[test]
    fn test_barrier_does_not_stall() {
        let mut circuit = Circuit::with_size("test", 2, 1);
        circuit.measure(q(0), c(0)).unwrap();
        circuit.barrier([q(0), q(1)]).unwrap();
        circuit.if_bit(x(1), c(0), 1).unwrap();

        defer_measurements(&mut circuit).unwrap();
        assert_eq!(circuit.num_ops(), 3);
        assert_eq!(circuit.ops()[2], measure(0, 0));
    }

    #[test]
    fn test_final_measurement_untouched() {
        let mut circuit = Circuit::with_size("test", 1, 1);
        circuit.h(q(0)).unwrap();
        circuit.measure(q(0), c(0)).unwrap();

        let before = circuit.clone();
        defer_measurements(&mut circuit).unwrap();
        assert_eq!(circuit, before);
    }

    #[test]
    fn test_reset_after_measurement_rejected() {
        let mut circuit = Circuit::with_size("test", 1, 1);
        circuit.measure(q(0), c(0)).unwrap();
        circuit.reset(q(0)).unwrap();

        let err = defer_measurements(&mut circuit).unwrap_err();
        assert!(matches!(err, CompileError::ResetDuringDeferral));
    }

    #[test]
    fn test_multi_qubit_measurement_rejected() {
        let mut circuit = Circuit::with_size("test", 2, 2);
        circuit.measure_many([q(0), q(1)], [c(0), c(1)]).unwrap();
        circuit.h(q(0)).unwrap();

        let err = defer_measurements(&mut circuit).unwrap_err();
        assert!(matches!(
            err,
            CompileError::UnsupportedMeasurement { qubits: 2, clbits: 2 }
        ));
    }

    #[test]
    fn test_implicit_reset_rejected() {
        let mut circuit = Circuit::with_size("test", 1, 1);
        circuit.measure(q(0), c(0)).unwrap();
        circuit.if_bit(x(0), c(0), 1).unwrap();

        let err = defer_measurements(&mut circuit).unwrap_err();
        assert!(matches!(err, CompileError::ImplicitReset { qubit } if qubit == q(0)));
    }

    #[test]
    fn test_classic_controlled_block_rejected() {
        let mut circuit = Circuit::with_size("test", 2, 1);
        circuit.measure(q(0), c(0)).unwrap();
        circuit.ops_mut().push(Operation::classic_controlled(
            Operation::compound([Operation::from(x(1))]),
            ClassicalRegister::bit(c(0)),
            1,
        ));

        let err = defer_measurements(&mut circuit).unwrap_err();
        assert!(matches!(
            err,
            CompileError::MalformedClassicControlled { ref name } if name == "compound"
        ));
    }

    #[test]
    fn test_wide_register_rejected() {
        let mut circuit = Circuit::with_size("test", 2, 2);
        circuit.measure(q(0), c(0)).unwrap();
        circuit
            .classic_controlled(
                x(1),
                ClassicalRegister {
                    start: c(0),
                    size: 2,
                },
                3,
            )
            .unwrap();

        let err = defer_measurements(&mut circuit).unwrap_err();
        assert!(matches!(
            err,
            CompileError::UnsupportedClassicControl { size: 2 }
        ));
    }
}
