//! circopt Circuit Intermediate Representation
//!
//! This crate provides the operation model consumed by the circopt
//! optimization passes: a flat, ordered list of operation records together
//! with the physical-to-logical layout information needed to interpret it.
//!
//! # Overview
//!
//! A [`Circuit`] owns a `Vec<Operation>` in program order. There is no
//! explicit dependency graph; passes rebuild per-qubit ordering from the
//! list whenever they need it. Operations come in four shapes (see
//! [`Operation`]): unitary gates, compound groups, non-unitary directives
//! and classically controlled wrappers.
//!
//! # Core Components
//!
//! - **Qubits and Classical Bits**: [`QubitId`], [`ClbitId`], and
//!   [`Control`] (a qubit with [`ControlKind`] polarity)
//! - **Type tags**: [`OpType`] for the gate catalog and the structural kinds
//! - **Operations**: [`Operation`] and its payloads [`StandardOperation`],
//!   [`CompoundOperation`], [`NonUnitaryOperation`],
//!   [`ClassicControlledOperation`]
//! - **Layouts**: [`Permutation`] for the initial layout and output
//!   permutation
//! - **Circuit**: [`Circuit`] container with a builder API
//!
//! # Example: Building a Bell State
//!
//! ```rust
//! use circopt_ir::{Circuit, ClbitId, OpType, QubitId};
//!
//! let mut circuit = Circuit::with_size("bell_state", 2, 2);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.measure(QubitId(0), ClbitId(0)).unwrap();
//! circuit.measure(QubitId(1), ClbitId(1)).unwrap();
//!
//! assert_eq!(circuit.num_ops(), 4);
//! assert_eq!(circuit.count_ops(OpType::Measure), 2);
//! ```
//!
//! # Example: Classically Controlled Gate
//!
//! ```rust
//! use circopt_ir::{Circuit, ClbitId, OpType, QubitId, StandardOperation};
//!
//! let mut circuit = Circuit::with_size("feed_forward", 2, 1);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.measure(QubitId(0), ClbitId(0)).unwrap();
//! circuit
//!     .if_bit(StandardOperation::new(OpType::X, [QubitId(1)]), ClbitId(0), 1)
//!     .unwrap();
//!
//! assert!(circuit.ops()[2].is_classic_controlled_operation());
//! ```
//!
//! # Supported Gates
//!
//! | Gate | Targets | Description |
//! |------|---------|-------------|
//! | `I`, `H` | 1 | Identity and Hadamard |
//! | `X`, `Y`, `Z` | 1 | Pauli gates |
//! | `S`, `Sdg`, `T`, `Tdg` | 1 | Phase family |
//! | `SX`, `SXdg`, `V`, `Vdg` | 1 | Square roots of X |
//! | `U3`, `U2`, `Phase`, `RX`, `RY`, `RZ` | 1 | Parameterized rotations |
//! | `Swap`, `ISwap`, `DCX`, `ECR` | 2 | Two-qubit exchange family |
//! | `Peres`, `Peresdg` | 2 | Peres gate and inverse |
//! | `RXX`, `RYY`, `RZZ`, `RZX` | 2 | Two-qubit rotations |
//! | `XXminusYY`, `XXplusYY` | 2 | Two-qubit interactions |
//!
//! Any gate may carry an arbitrary set of positive or negative controls.

pub mod circuit;
pub mod error;
pub mod gate;
pub mod operation;
pub mod permutation;
pub mod qubit;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::OpType;
pub use operation::{
    ClassicControlledOperation, ClassicalRegister, CompoundOperation, NonUnitaryOperation,
    Operation, StandardOperation,
};
pub use permutation::Permutation;
pub use qubit::{ClbitId, Control, ControlKind, Controls, QubitId};
