//! Operations: the records a circuit is made of.
//!
//! An [`Operation`] is a closed set of four shapes:
//!
//! - [`StandardOperation`]: a unitary gate with controls, targets and
//!   parameters
//! - [`CompoundOperation`]: an owned, ordered group of child operations
//! - [`NonUnitaryOperation`]: measurement, reset, barrier and simulator
//!   directives
//! - [`ClassicControlledOperation`]: an operation executed only when a
//!   classical register holds an expected value
//!
//! Optimization passes retype operations in place (see
//! [`Operation::set_gate`]) instead of removing them mid-scan; an
//! operation retyped to [`OpType::I`] reports [`Operation::is_identity`]
//! and is swept up afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::{IrError, IrResult};
use crate::gate::OpType;
use crate::qubit::{ClbitId, Control, Controls, QubitId};

static NO_CONTROLS: Controls = BTreeSet::new();

/// A unitary gate application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardOperation {
    /// The gate type.
    pub op_type: OpType,
    /// Control qubits with polarity.
    pub controls: Controls,
    /// Target qubits, in gate operand order.
    pub targets: Vec<QubitId>,
    /// Real-valued gate parameters.
    pub params: Vec<f64>,
}

impl StandardOperation {
    /// Create an uncontrolled, unparameterized gate.
    pub fn new(op_type: OpType, targets: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            op_type,
            controls: Controls::new(),
            targets: targets.into_iter().collect(),
            params: vec![],
        }
    }

    /// Create an uncontrolled gate with parameters.
    pub fn with_params(
        op_type: OpType,
        targets: impl IntoIterator<Item = QubitId>,
        params: impl IntoIterator<Item = f64>,
    ) -> Self {
        Self {
            params: params.into_iter().collect(),
            ..Self::new(op_type, targets)
        }
    }

    /// Create a controlled gate.
    pub fn controlled(
        op_type: OpType,
        controls: impl IntoIterator<Item = Control>,
        targets: impl IntoIterator<Item = QubitId>,
    ) -> Self {
        Self {
            controls: controls.into_iter().collect(),
            ..Self::new(op_type, targets)
        }
    }

    /// Create a CNOT with a positive control.
    pub fn cx(control: QubitId, target: QubitId) -> Self {
        Self::controlled(OpType::X, [Control::pos(control)], [target])
    }

    /// Whether this is an X gate with exactly one positive control and one
    /// target.
    pub fn is_cnot(&self) -> bool {
        self.op_type == OpType::X
            && self.targets.len() == 1
            && self.controls.len() == 1
            && self.controls.iter().all(Control::is_positive)
    }

    /// Whether this is an uncontrolled two-target SWAP.
    pub fn is_swap(&self) -> bool {
        self.op_type == OpType::Swap && self.controls.is_empty() && self.targets.len() == 2
    }

    /// The single control qubit of a singly controlled gate.
    pub fn control_qubit(&self) -> Option<QubitId> {
        match self.controls.len() {
            1 => self.controls.first().map(|c| c.qubit),
            _ => None,
        }
    }

    /// Whether the gate touches `qubit` as a control or target.
    pub fn acts_on(&self, qubit: QubitId) -> bool {
        self.targets.contains(&qubit) || self.controls.iter().any(|c| c.qubit == qubit)
    }

    /// Replace the targets.
    pub fn set_targets(&mut self, targets: impl IntoIterator<Item = QubitId>) {
        self.targets = targets.into_iter().collect();
    }

    /// Replace the controls.
    pub fn set_controls(&mut self, controls: impl IntoIterator<Item = Control>) {
        self.controls = controls.into_iter().collect();
    }
}

/// An ordered group of operations treated as one unit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompoundOperation {
    /// Child operations in execution order.
    pub ops: Vec<Operation>,
}

impl CompoundOperation {
    /// Create an empty compound operation.
    pub fn new() -> Self {
        Self { ops: vec![] }
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether the compound has no children.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Append a child.
    pub fn push(&mut self, op: impl Into<Operation>) {
        self.ops.push(op.into());
    }

    /// Remove and return the last child.
    pub fn pop(&mut self) -> Option<Operation> {
        self.ops.pop()
    }

    /// The last child.
    pub fn last(&self) -> Option<&Operation> {
        self.ops.last()
    }

    /// Move all children of `other` to the end of this compound.
    pub fn merge(&mut self, other: CompoundOperation) {
        self.ops.extend(other.ops);
    }

    /// Iterate over the direct children.
    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.ops.iter()
    }

    /// Union of the qubits used by all children.
    pub fn used_qubits(&self) -> BTreeSet<QubitId> {
        self.ops.iter().flat_map(Operation::used_qubits).collect()
    }

    /// Whether the compound holds exactly one child.
    pub fn is_convertible_to_single_operation(&self) -> bool {
        self.ops.len() == 1
    }

    /// Unwrap a single-child compound; otherwise keep the compound.
    pub fn collapse_to_single_operation(mut self) -> Operation {
        if self.is_convertible_to_single_operation() {
            if let Some(op) = self.ops.pop() {
                return op;
            }
        }
        Operation::Compound(self)
    }
}

impl From<Vec<Operation>> for CompoundOperation {
    fn from(ops: Vec<Operation>) -> Self {
        Self { ops }
    }
}

/// Measurement, reset, barrier and simulator directives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonUnitaryOperation {
    /// The operation type.
    pub op_type: OpType,
    /// Qubits the operation acts on.
    pub targets: Vec<QubitId>,
    /// Classical bits written by a measurement, paired 1:1 with `targets`.
    pub classics: Vec<ClbitId>,
}

impl NonUnitaryOperation {
    /// Create a measurement of `qubits` into `clbits`.
    ///
    /// Returns an error if the lists differ in length.
    pub fn measure(
        qubits: impl IntoIterator<Item = QubitId>,
        clbits: impl IntoIterator<Item = ClbitId>,
    ) -> IrResult<Self> {
        let targets: Vec<_> = qubits.into_iter().collect();
        let classics: Vec<_> = clbits.into_iter().collect();
        if targets.len() != classics.len() {
            return Err(IrError::MeasureShapeMismatch {
                qubits: targets.len(),
                clbits: classics.len(),
            });
        }
        Ok(Self {
            op_type: OpType::Measure,
            targets,
            classics,
        })
    }

    /// Create a reset of `qubits`.
    pub fn reset(qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self::directive(OpType::Reset, qubits)
    }

    /// Create a barrier across `qubits`.
    pub fn barrier(qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self::directive(OpType::Barrier, qubits)
    }

    /// Create a directive without classical outputs.
    pub fn directive(op_type: OpType, qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            op_type,
            targets: qubits.into_iter().collect(),
            classics: vec![],
        }
    }
}

/// A contiguous range of classical bits read as one unsigned value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassicalRegister {
    /// First bit of the register.
    pub start: ClbitId,
    /// Number of bits.
    pub size: u32,
}

impl ClassicalRegister {
    /// A one-bit register.
    pub fn bit(bit: ClbitId) -> Self {
        Self {
            start: bit,
            size: 1,
        }
    }

    /// Iterate over the bits of the register.
    pub fn bits(&self) -> impl Iterator<Item = ClbitId> {
        let start = self.start.0;
        (start..start + self.size).map(ClbitId)
    }
}

/// An operation gated on a classical register value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassicControlledOperation {
    /// The wrapped operation, normally a [`StandardOperation`].
    pub op: Box<Operation>,
    /// The register whose value is compared.
    pub register: ClassicalRegister,
    /// Value the register must hold for `op` to execute.
    pub expected_value: u64,
}

/// A single record of a circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// A unitary gate.
    Standard(StandardOperation),
    /// An owned group of operations.
    Compound(CompoundOperation),
    /// Measurement, reset, barrier or simulator directive.
    NonUnitary(NonUnitaryOperation),
    /// An operation gated on classical bits.
    ClassicControlled(ClassicControlledOperation),
}

impl Operation {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// An uncontrolled, unparameterized gate.
    pub fn gate(op_type: OpType, targets: impl IntoIterator<Item = QubitId>) -> Self {
        Operation::Standard(StandardOperation::new(op_type, targets))
    }

    /// A controlled gate.
    pub fn controlled(
        op_type: OpType,
        controls: impl IntoIterator<Item = Control>,
        targets: impl IntoIterator<Item = QubitId>,
    ) -> Self {
        Operation::Standard(StandardOperation::controlled(op_type, controls, targets))
    }

    /// An identity on `qubit`.
    pub fn identity(qubit: QubitId) -> Self {
        Self::gate(OpType::I, [qubit])
    }

    /// A measurement of `qubits` into `clbits`.
    pub fn measure(
        qubits: impl IntoIterator<Item = QubitId>,
        clbits: impl IntoIterator<Item = ClbitId>,
    ) -> IrResult<Self> {
        NonUnitaryOperation::measure(qubits, clbits).map(Operation::NonUnitary)
    }

    /// A reset of `qubits`.
    pub fn reset(qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Operation::NonUnitary(NonUnitaryOperation::reset(qubits))
    }

    /// A barrier across `qubits`.
    pub fn barrier(qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Operation::NonUnitary(NonUnitaryOperation::barrier(qubits))
    }

    /// A compound of `ops`.
    pub fn compound(ops: impl IntoIterator<Item = Operation>) -> Self {
        Operation::Compound(CompoundOperation {
            ops: ops.into_iter().collect(),
        })
    }

    /// `op` executed when `register` holds `expected_value`.
    pub fn classic_controlled(
        op: impl Into<Operation>,
        register: ClassicalRegister,
        expected_value: u64,
    ) -> Self {
        Operation::ClassicControlled(ClassicControlledOperation {
            op: Box::new(op.into()),
            register,
            expected_value,
        })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The operation's type tag.
    pub fn op_type(&self) -> OpType {
        match self {
            Operation::Standard(op) => op.op_type,
            Operation::Compound(_) => OpType::Compound,
            Operation::NonUnitary(op) => op.op_type,
            Operation::ClassicControlled(_) => OpType::ClassicControlled,
        }
    }

    /// Get the name of this operation.
    pub fn name(&self) -> &'static str {
        self.op_type().name()
    }

    /// Controls of the gate; wrappers report the wrapped gate's controls.
    pub fn controls(&self) -> &Controls {
        match self {
            Operation::Standard(op) => &op.controls,
            Operation::ClassicControlled(cc) => cc.op.controls(),
            Operation::Compound(_) | Operation::NonUnitary(_) => &NO_CONTROLS,
        }
    }

    /// Targets of the operation; a compound reports none.
    pub fn targets(&self) -> &[QubitId] {
        match self {
            Operation::Standard(op) => &op.targets,
            Operation::NonUnitary(op) => &op.targets,
            Operation::ClassicControlled(cc) => cc.op.targets(),
            Operation::Compound(_) => &[],
        }
    }

    /// Classical bits written by a measurement.
    pub fn classics(&self) -> &[ClbitId] {
        match self {
            Operation::NonUnitary(op) => &op.classics,
            _ => &[],
        }
    }

    /// Gate parameters.
    pub fn params(&self) -> &[f64] {
        match self {
            Operation::Standard(op) => &op.params,
            Operation::ClassicControlled(cc) => cc.op.params(),
            _ => &[],
        }
    }

    /// Number of controls.
    pub fn n_controls(&self) -> usize {
        self.controls().len()
    }

    /// Number of targets.
    pub fn n_targets(&self) -> usize {
        self.targets().len()
    }

    /// Whether the operation has at least one control.
    pub fn is_controlled(&self) -> bool {
        !self.controls().is_empty()
    }

    /// Every qubit the operation touches, children included.
    pub fn used_qubits(&self) -> BTreeSet<QubitId> {
        match self {
            Operation::Compound(comp) => comp.used_qubits(),
            Operation::ClassicControlled(cc) => cc.op.used_qubits(),
            _ => self
                .controls()
                .iter()
                .map(|c| c.qubit)
                .chain(self.targets().iter().copied())
                .collect(),
        }
    }

    /// Whether the operation touches `qubit`.
    pub fn acts_on(&self, qubit: QubitId) -> bool {
        match self {
            Operation::Standard(op) => op.acts_on(qubit),
            Operation::Compound(comp) => comp.iter().any(|op| op.acts_on(qubit)),
            Operation::NonUnitary(op) => op.targets.contains(&qubit),
            Operation::ClassicControlled(cc) => cc.op.acts_on(qubit),
        }
    }

    /// Whether the operation is a plain unitary.
    ///
    /// A compound is unitary when all of its children are; a classically
    /// controlled operation never is.
    pub fn is_unitary(&self) -> bool {
        match self {
            Operation::Standard(_) => true,
            Operation::Compound(comp) => comp.iter().all(Operation::is_unitary),
            Operation::NonUnitary(_) | Operation::ClassicControlled(_) => false,
        }
    }

    /// Whether the operation has been reduced to an identity.
    pub fn is_identity(&self) -> bool {
        match self {
            Operation::Standard(op) => op.op_type == OpType::I,
            Operation::NonUnitary(op) => op.op_type == OpType::I,
            Operation::ClassicControlled(cc) => cc.op.is_identity(),
            Operation::Compound(_) => false,
        }
    }

    /// Whether this is a [`StandardOperation`].
    pub fn is_standard_operation(&self) -> bool {
        matches!(self, Operation::Standard(_))
    }

    /// Whether this is a [`CompoundOperation`].
    pub fn is_compound_operation(&self) -> bool {
        matches!(self, Operation::Compound(_))
    }

    /// Whether this is a [`NonUnitaryOperation`].
    pub fn is_non_unitary_operation(&self) -> bool {
        matches!(self, Operation::NonUnitary(_))
    }

    /// Whether this is a [`ClassicControlledOperation`].
    pub fn is_classic_controlled_operation(&self) -> bool {
        matches!(self, Operation::ClassicControlled(_))
    }

    /// Whether this is a measurement.
    pub fn is_measure(&self) -> bool {
        matches!(self, Operation::NonUnitary(op) if op.op_type == OpType::Measure)
    }

    /// Whether this is a reset.
    pub fn is_reset(&self) -> bool {
        matches!(self, Operation::NonUnitary(op) if op.op_type == OpType::Reset)
    }

    /// Whether the variant and the type tag agree.
    ///
    /// Identity is accepted on non-unitary records since passes retype
    /// them to [`OpType::I`] before sweeping. A classically controlled
    /// operation must wrap a well-formed [`StandardOperation`].
    pub fn is_well_formed(&self) -> bool {
        match self {
            Operation::Standard(op) => op.op_type.is_gate(),
            Operation::NonUnitary(op) => op.op_type.is_non_unitary() || op.op_type == OpType::I,
            Operation::ClassicControlled(cc) => {
                cc.op.is_standard_operation() && cc.op.is_well_formed()
            }
            Operation::Compound(_) => true,
        }
    }

    /// Borrow as a standard operation.
    pub fn as_standard(&self) -> Option<&StandardOperation> {
        match self {
            Operation::Standard(op) => Some(op),
            _ => None,
        }
    }

    /// Mutably borrow as a standard operation.
    pub fn as_standard_mut(&mut self) -> Option<&mut StandardOperation> {
        match self {
            Operation::Standard(op) => Some(op),
            _ => None,
        }
    }

    /// Borrow as a compound operation.
    pub fn as_compound(&self) -> Option<&CompoundOperation> {
        match self {
            Operation::Compound(comp) => Some(comp),
            _ => None,
        }
    }

    /// Mutably borrow as a compound operation.
    pub fn as_compound_mut(&mut self) -> Option<&mut CompoundOperation> {
        match self {
            Operation::Compound(comp) => Some(comp),
            _ => None,
        }
    }

    // =========================================================================
    // In-place edits
    // =========================================================================

    /// Retype the operation.
    ///
    /// Wrappers forward to the wrapped operation; compounds are unchanged.
    pub fn set_gate(&mut self, op_type: OpType) {
        match self {
            Operation::Standard(op) => op.op_type = op_type,
            Operation::NonUnitary(op) => op.op_type = op_type,
            Operation::ClassicControlled(cc) => cc.op.set_gate(op_type),
            Operation::Compound(_) => {}
        }
    }

    /// Drop all controls.
    pub fn clear_controls(&mut self) {
        match self {
            Operation::Standard(op) => op.controls.clear(),
            Operation::ClassicControlled(cc) => cc.op.clear_controls(),
            Operation::Compound(_) | Operation::NonUnitary(_) => {}
        }
    }

    /// Retype to identity and drop controls.
    pub fn soft_delete(&mut self) {
        self.set_gate(OpType::I);
        self.clear_controls();
    }

    /// Rewrite every qubit reference through `f`, children included.
    ///
    /// Control polarity is preserved.
    pub fn map_qubits(&mut self, f: &impl Fn(QubitId) -> QubitId) {
        match self {
            Operation::Standard(op) => {
                for target in &mut op.targets {
                    *target = f(*target);
                }
                op.controls = op
                    .controls
                    .iter()
                    .map(|c| Control {
                        qubit: f(c.qubit),
                        kind: c.kind,
                    })
                    .collect();
            }
            Operation::NonUnitary(op) => {
                for target in &mut op.targets {
                    *target = f(*target);
                }
            }
            Operation::ClassicControlled(cc) => cc.op.map_qubits(f),
            Operation::Compound(comp) => {
                for child in &mut comp.ops {
                    child.map_qubits(f);
                }
            }
        }
    }

    /// Check shape constraints: tag/variant agreement, gate arity,
    /// measurement pairing and duplicate qubits.
    pub fn validate(&self) -> IrResult<()> {
        if let Operation::ClassicControlled(cc) = self {
            if !cc.op.is_standard_operation() {
                return Err(IrError::InvalidOperation(format!(
                    "classically controlled '{}' must wrap a standard gate",
                    cc.op.name()
                )));
            }
        }
        if !self.is_well_formed() {
            return Err(IrError::InvalidOperation(format!(
                "'{}' is not valid for this operation kind",
                self.name()
            )));
        }
        match self {
            Operation::Standard(op) => {
                if let Some(expected) = op.op_type.num_targets() {
                    let got = u32::try_from(op.targets.len()).unwrap_or(u32::MAX);
                    if got != expected {
                        return Err(IrError::QubitCountMismatch {
                            gate_name: op.op_type.name().to_string(),
                            expected,
                            got,
                        });
                    }
                }
                let mut seen = BTreeSet::new();
                for qubit in op.controls.iter().map(|c| c.qubit).chain(op.targets.iter().copied()) {
                    if !seen.insert(qubit) {
                        return Err(IrError::DuplicateQubit {
                            qubit,
                            gate_name: Some(op.op_type.name().to_string()),
                        });
                    }
                }
                Ok(())
            }
            Operation::NonUnitary(op) => {
                if op.op_type == OpType::Measure && op.targets.len() != op.classics.len() {
                    return Err(IrError::MeasureShapeMismatch {
                        qubits: op.targets.len(),
                        clbits: op.classics.len(),
                    });
                }
                Ok(())
            }
            Operation::Compound(comp) => comp.iter().try_for_each(Operation::validate),
            Operation::ClassicControlled(cc) => cc.op.validate(),
        }
    }
}

impl From<StandardOperation> for Operation {
    fn from(op: StandardOperation) -> Self {
        Operation::Standard(op)
    }
}

impl From<CompoundOperation> for Operation {
    fn from(op: CompoundOperation) -> Self {
        Operation::Compound(op)
    }
}

impl From<NonUnitaryOperation> for Operation {
    fn from(op: NonUnitaryOperation) -> Self {
        Operation::NonUnitary(op)
    }
}

fn write_qubits(f: &mut fmt::Formatter<'_>, qubits: &[QubitId]) -> fmt::Result {
    for (i, qubit) in qubits.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{qubit}")?;
    }
    Ok(())
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Standard(op) => {
                for _ in &op.controls {
                    f.write_str("c")?;
                }
                f.write_str(op.op_type.name())?;
                if !op.params.is_empty() {
                    let params: Vec<String> = op.params.iter().map(ToString::to_string).collect();
                    write!(f, "({})", params.join(", "))?;
                }
                f.write_str(" ")?;
                for control in &op.controls {
                    write!(f, "{control}, ")?;
                }
                write_qubits(f, &op.targets)
            }
            Operation::Compound(comp) => {
                f.write_str("compound {")?;
                for (i, child) in comp.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{child}")?;
                }
                f.write_str("}")
            }
            Operation::NonUnitary(op) => {
                write!(f, "{} ", op.op_type.name())?;
                write_qubits(f, &op.targets)?;
                if !op.classics.is_empty() {
                    let bits: Vec<String> = op.classics.iter().map(ToString::to_string).collect();
                    write!(f, " -> {}", bits.join(", "))?;
                }
                Ok(())
            }
            Operation::ClassicControlled(cc) => write!(
                f,
                "if ({}[{}] == {}) {}",
                cc.register.start, cc.register.size, cc.expected_value, cc.op
            ),
        }
    }
}
