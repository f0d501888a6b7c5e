//! Operation type tags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type tag of an operation.
///
/// Unitary gates carry their parameters separately, so a tag can be
/// rewritten in place (`set_gate`) without touching the operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpType {
    // Single-qubit gates
    /// Identity gate.
    I,
    /// Hadamard gate.
    H,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// sqrt(X) gate.
    SX,
    /// sqrt(X)-dagger gate.
    SXdg,
    /// V gate.
    V,
    /// V-dagger gate.
    Vdg,
    /// Universal single-qubit gate U(θ, φ, λ).
    U3,
    /// U2(φ, λ) gate.
    U2,
    /// Phase gate.
    Phase,
    /// Rotation around X axis.
    RX,
    /// Rotation around Y axis.
    RY,
    /// Rotation around Z axis.
    RZ,

    // Two-qubit gates
    /// SWAP gate.
    Swap,
    /// iSWAP gate.
    ISwap,
    /// Peres gate.
    Peres,
    /// Inverse Peres gate.
    Peresdg,
    /// Double CNOT gate.
    DCX,
    /// Echoed cross-resonance gate.
    ECR,
    /// XX rotation gate.
    RXX,
    /// YY rotation gate.
    RYY,
    /// ZZ rotation gate.
    RZZ,
    /// ZX rotation gate.
    RZX,
    /// XX-YY interaction.
    XXminusYY,
    /// XX+YY interaction.
    XXplusYY,

    // Structural and non-unitary
    /// Container of child operations.
    Compound,
    /// Computational-basis measurement.
    Measure,
    /// Reset to |0⟩.
    Reset,
    /// Scheduling barrier.
    Barrier,
    /// Simulator snapshot.
    Snapshot,
    /// Simulator probability dump.
    ShowProbabilities,
    /// Operation gated on a classical register value.
    ClassicControlled,
}

impl OpType {
    /// Get the name of this operation type.
    pub fn name(&self) -> &'static str {
        match self {
            OpType::I => "id",
            OpType::H => "h",
            OpType::X => "x",
            OpType::Y => "y",
            OpType::Z => "z",
            OpType::S => "s",
            OpType::Sdg => "sdg",
            OpType::T => "t",
            OpType::Tdg => "tdg",
            OpType::SX => "sx",
            OpType::SXdg => "sxdg",
            OpType::V => "v",
            OpType::Vdg => "vdg",
            OpType::U3 => "u3",
            OpType::U2 => "u2",
            OpType::Phase => "p",
            OpType::RX => "rx",
            OpType::RY => "ry",
            OpType::RZ => "rz",
            OpType::Swap => "swap",
            OpType::ISwap => "iswap",
            OpType::Peres => "peres",
            OpType::Peresdg => "peresdg",
            OpType::DCX => "dcx",
            OpType::ECR => "ecr",
            OpType::RXX => "rxx",
            OpType::RYY => "ryy",
            OpType::RZZ => "rzz",
            OpType::RZX => "rzx",
            OpType::XXminusYY => "xx_minus_yy",
            OpType::XXplusYY => "xx_plus_yy",
            OpType::Compound => "compound",
            OpType::Measure => "measure",
            OpType::Reset => "reset",
            OpType::Barrier => "barrier",
            OpType::Snapshot => "snapshot",
            OpType::ShowProbabilities => "show_probabilities",
            OpType::ClassicControlled => "classic_controlled",
        }
    }

    /// Number of target qubits a unitary gate of this type acts on.
    ///
    /// Returns `None` for structural and non-unitary types, whose arity
    /// is variable.
    pub fn num_targets(&self) -> Option<u32> {
        match self {
            OpType::I
            | OpType::H
            | OpType::X
            | OpType::Y
            | OpType::Z
            | OpType::S
            | OpType::Sdg
            | OpType::T
            | OpType::Tdg
            | OpType::SX
            | OpType::SXdg
            | OpType::V
            | OpType::Vdg
            | OpType::U3
            | OpType::U2
            | OpType::Phase
            | OpType::RX
            | OpType::RY
            | OpType::RZ => Some(1),

            OpType::Swap
            | OpType::ISwap
            | OpType::Peres
            | OpType::Peresdg
            | OpType::DCX
            | OpType::ECR
            | OpType::RXX
            | OpType::RYY
            | OpType::RZZ
            | OpType::RZX
            | OpType::XXminusYY
            | OpType::XXplusYY => Some(2),

            OpType::Compound
            | OpType::Measure
            | OpType::Reset
            | OpType::Barrier
            | OpType::Snapshot
            | OpType::ShowProbabilities
            | OpType::ClassicControlled => None,
        }
    }

    /// Number of real parameters a gate of this type takes.
    pub fn num_params(&self) -> usize {
        match self {
            OpType::U3 => 3,
            OpType::U2 | OpType::XXminusYY | OpType::XXplusYY => 2,
            OpType::Phase
            | OpType::RX
            | OpType::RY
            | OpType::RZ
            | OpType::RXX
            | OpType::RYY
            | OpType::RZZ
            | OpType::RZX => 1,
            _ => 0,
        }
    }

    /// Whether the gate is diagonal in the computational basis.
    ///
    /// Such gates commute with a subsequent measurement and can be
    /// dropped directly in front of one.
    pub fn is_diagonal(&self) -> bool {
        matches!(
            self,
            OpType::I
                | OpType::Z
                | OpType::S
                | OpType::Sdg
                | OpType::T
                | OpType::Tdg
                | OpType::Phase
                | OpType::RZ
                | OpType::RZZ
        )
    }

    /// Whether this tag belongs to a non-unitary operation.
    pub fn is_non_unitary(&self) -> bool {
        matches!(
            self,
            OpType::Measure
                | OpType::Reset
                | OpType::Barrier
                | OpType::Snapshot
                | OpType::ShowProbabilities
        )
    }

    /// Whether this tag is a unitary gate type.
    pub fn is_gate(&self) -> bool {
        self.num_targets().is_some()
    }
}

impl fmt::Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
