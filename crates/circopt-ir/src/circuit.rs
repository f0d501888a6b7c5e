//! The circuit container and its builder API.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::OpType;
use crate::operation::{
    ClassicalRegister, CompoundOperation, NonUnitaryOperation, Operation, StandardOperation,
};
use crate::permutation::Permutation;
use crate::qubit::{ClbitId, Control, QubitId};

/// A quantum circuit: an ordered list of operations plus layout metadata.
///
/// Operation order is the only dependency information; passes derive
/// per-qubit ordering from it on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Name of the circuit.
    name: String,
    /// Number of qubits.
    num_qubits: u32,
    /// Number of classical bits.
    num_clbits: u32,
    /// Operations in program order.
    ops: Vec<Operation>,
    /// Physical-to-logical mapping at the start of the circuit.
    initial_layout: Permutation,
    /// Physical-to-logical mapping at the end of the circuit.
    output_permutation: Permutation,
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            num_qubits: 0,
            num_clbits: 0,
            ops: vec![],
            initial_layout: Permutation::new(),
            output_permutation: Permutation::new(),
        }
    }

    /// Create a circuit with a given number of qubits and classical bits.
    ///
    /// Both layouts start as the identity.
    pub fn with_size(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        Self {
            num_qubits,
            num_clbits,
            initial_layout: Permutation::identity(num_qubits),
            output_permutation: Permutation::identity(num_qubits),
            ..Self::new(name)
        }
    }

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Get the number of classical bits.
    pub fn num_clbits(&self) -> u32 {
        self.num_clbits
    }

    /// Get the number of top-level operations.
    pub fn num_ops(&self) -> usize {
        self.ops.len()
    }

    /// Whether the circuit has no operations.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Get the operations.
    pub fn ops(&self) -> &[Operation] {
        &self.ops
    }

    /// Get mutable access to the operation list.
    ///
    /// No validation is performed on edits made through this handle.
    pub fn ops_mut(&mut self) -> &mut Vec<Operation> {
        &mut self.ops
    }

    /// Take the operation list, leaving the circuit empty.
    pub fn take_ops(&mut self) -> Vec<Operation> {
        std::mem::take(&mut self.ops)
    }

    /// Replace the operation list.
    pub fn set_ops(&mut self, ops: Vec<Operation>) {
        self.ops = ops;
    }

    /// Get the initial layout.
    pub fn initial_layout(&self) -> &Permutation {
        &self.initial_layout
    }

    /// Get the initial layout mutably.
    pub fn initial_layout_mut(&mut self) -> &mut Permutation {
        &mut self.initial_layout
    }

    /// Get the output permutation.
    pub fn output_permutation(&self) -> &Permutation {
        &self.output_permutation
    }

    /// Get the output permutation mutably.
    pub fn output_permutation_mut(&mut self) -> &mut Permutation {
        &mut self.output_permutation
    }

    /// Count top-level operations of a given type.
    pub fn count_ops(&self, op_type: OpType) -> usize {
        self.ops.iter().filter(|op| op.op_type() == op_type).count()
    }

    /// Highest physical qubit index referenced by the layout, the qubit
    /// count or any operation.
    pub fn max_physical_qubit(&self) -> Option<QubitId> {
        let from_count = self.num_qubits.checked_sub(1).map(QubitId);
        let from_ops = self
            .ops
            .iter()
            .filter_map(|op| op.used_qubits().last().copied())
            .max();
        [self.initial_layout.max_physical(), from_count, from_ops]
            .into_iter()
            .flatten()
            .max()
    }

    // =========================================================================
    // Registers and layout
    // =========================================================================

    /// Add a qubit at `physical`, mapped to `logical` initially and to
    /// `output_logical` at the end of the circuit.
    pub fn add_qubit(
        &mut self,
        physical: QubitId,
        logical: QubitId,
        output_logical: QubitId,
    ) -> IrResult<()> {
        if self.initial_layout.contains(physical) {
            return Err(IrError::DuplicateQubit {
                qubit: physical,
                gate_name: None,
            });
        }
        self.initial_layout.insert(physical, logical);
        self.output_permutation.insert(physical, output_logical);
        self.num_qubits += 1;
        Ok(())
    }

    /// Add classical bits, returning the id of the first new bit.
    pub fn add_clbits(&mut self, count: u32) -> ClbitId {
        let first = ClbitId(self.num_clbits);
        self.num_clbits += count;
        first
    }

    /// Rebuild the layout metadata.
    ///
    /// An empty initial layout becomes the identity. An empty output
    /// permutation is derived from the measurements (measured qubit →
    /// classical bit index); without measurements it copies the initial
    /// layout.
    pub fn initialize_io_mapping(&mut self) {
        if self.initial_layout.is_empty() {
            self.initial_layout = Permutation::identity(self.num_qubits);
        }
        if !self.output_permutation.is_empty() {
            return;
        }

        let mut measured = Permutation::new();
        for op in &self.ops {
            if op.is_measure() {
                for (qubit, clbit) in op.targets().iter().zip(op.classics()) {
                    measured.insert(*qubit, QubitId(clbit.0));
                }
            }
        }

        self.output_permutation = if measured.is_empty() {
            self.initial_layout.clone()
        } else {
            measured
        };
    }

    // =========================================================================
    // Generic application
    // =========================================================================

    /// Append an operation after validating its shape and operands.
    pub fn push(&mut self, op: impl Into<Operation>) -> IrResult<&mut Self> {
        let op = op.into();
        op.validate()?;
        self.check_operands(&op)?;
        self.ops.push(op);
        Ok(self)
    }

    fn check_operands(&self, op: &Operation) -> IrResult<()> {
        for qubit in op.used_qubits() {
            if qubit.0 >= self.num_qubits && !self.initial_layout.contains(qubit) {
                return Err(IrError::QubitNotFound {
                    qubit,
                    gate_name: Some(op.name().to_string()),
                });
            }
        }
        let mut clbits: Vec<ClbitId> = op.classics().to_vec();
        if let Operation::ClassicControlled(cc) = op {
            clbits.extend(cc.register.bits());
        }
        for clbit in clbits {
            if clbit.0 >= self.num_clbits {
                return Err(IrError::ClbitNotFound {
                    clbit,
                    gate_name: Some(op.name().to_string()),
                });
            }
        }
        Ok(())
    }

    /// Apply an uncontrolled, unparameterized gate.
    pub fn gate(
        &mut self,
        op_type: OpType,
        targets: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.push(StandardOperation::new(op_type, targets))
    }

    /// Apply a controlled gate.
    pub fn controlled_gate(
        &mut self,
        op_type: OpType,
        controls: impl IntoIterator<Item = Control>,
        targets: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.push(StandardOperation::controlled(op_type, controls, targets))
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply identity gate.
    pub fn i(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(OpType::I, [qubit])
    }

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(OpType::H, [qubit])
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(OpType::X, [qubit])
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(OpType::Y, [qubit])
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(OpType::Z, [qubit])
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(OpType::S, [qubit])
    }

    /// Apply S-dagger gate.
    pub fn sdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(OpType::Sdg, [qubit])
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(OpType::T, [qubit])
    }

    /// Apply T-dagger gate.
    pub fn tdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(OpType::Tdg, [qubit])
    }

    /// Apply sqrt(X) gate.
    pub fn sx(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(OpType::SX, [qubit])
    }

    /// Apply sqrt(X)-dagger gate.
    pub fn sxdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(OpType::SXdg, [qubit])
    }

    /// Apply Rx rotation gate.
    pub fn rx(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(StandardOperation::with_params(OpType::RX, [qubit], [theta]))
    }

    /// Apply Ry rotation gate.
    pub fn ry(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(StandardOperation::with_params(OpType::RY, [qubit], [theta]))
    }

    /// Apply Rz rotation gate.
    pub fn rz(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(StandardOperation::with_params(OpType::RZ, [qubit], [theta]))
    }

    /// Apply phase gate.
    pub fn p(&mut self, lambda: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(StandardOperation::with_params(
            OpType::Phase,
            [qubit],
            [lambda],
        ))
    }

    // =========================================================================
    // Multi-qubit gates
    // =========================================================================

    /// Apply CNOT (CX) gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.push(StandardOperation::cx(control, target))
    }

    /// Apply CZ gate.
    pub fn cz(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.controlled_gate(OpType::Z, [Control::pos(control)], [target])
    }

    /// Apply multi-controlled X gate with positive controls.
    pub fn mcx(&mut self, controls: &[QubitId], target: QubitId) -> IrResult<&mut Self> {
        self.controlled_gate(
            OpType::X,
            controls.iter().map(|&q| Control::pos(q)),
            [target],
        )
    }

    /// Apply multi-controlled Z gate with positive controls.
    pub fn mcz(&mut self, controls: &[QubitId], target: QubitId) -> IrResult<&mut Self> {
        self.controlled_gate(
            OpType::Z,
            controls.iter().map(|&q| Control::pos(q)),
            [target],
        )
    }

    /// Apply SWAP gate.
    pub fn swap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.gate(OpType::Swap, [q1, q2])
    }

    /// Apply controlled SWAP (Fredkin) gate.
    pub fn cswap(&mut self, control: QubitId, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.controlled_gate(OpType::Swap, [Control::pos(control)], [q1, q2])
    }

    /// Apply ZZ rotation gate.
    pub fn rzz(&mut self, theta: f64, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.push(StandardOperation::with_params(
            OpType::RZZ,
            [q1, q2],
            [theta],
        ))
    }

    // =========================================================================
    // Non-unitary operations
    // =========================================================================

    /// Measure a qubit into a classical bit.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.push(NonUnitaryOperation::measure([qubit], [clbit])?)
    }

    /// Measure several qubits in one operation.
    pub fn measure_many(
        &mut self,
        qubits: impl IntoIterator<Item = QubitId>,
        clbits: impl IntoIterator<Item = ClbitId>,
    ) -> IrResult<&mut Self> {
        self.push(NonUnitaryOperation::measure(qubits, clbits)?)
    }

    /// Reset a qubit to |0⟩.
    pub fn reset(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(NonUnitaryOperation::reset([qubit]))
    }

    /// Add a barrier across `qubits`.
    pub fn barrier(&mut self, qubits: impl IntoIterator<Item = QubitId>) -> IrResult<&mut Self> {
        self.push(NonUnitaryOperation::barrier(qubits))
    }

    /// Apply `op` when classical bit `clbit` equals `expected_value`.
    pub fn if_bit(
        &mut self,
        op: impl Into<Operation>,
        clbit: ClbitId,
        expected_value: u64,
    ) -> IrResult<&mut Self> {
        self.classic_controlled(op, ClassicalRegister::bit(clbit), expected_value)
    }

    /// Apply `op` when `register` holds `expected_value`.
    pub fn classic_controlled(
        &mut self,
        op: impl Into<Operation>,
        register: ClassicalRegister,
        expected_value: u64,
    ) -> IrResult<&mut Self> {
        self.push(Operation::classic_controlled(op, register, expected_value))
    }

    /// Group `ops` into one compound operation.
    pub fn compound(&mut self, ops: impl IntoIterator<Item = Operation>) -> IrResult<&mut Self> {
        self.push(CompoundOperation::from(ops.into_iter().collect::<Vec<_>>()))
    }
}
