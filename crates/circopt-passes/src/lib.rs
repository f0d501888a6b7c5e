//! Circopt Optimization Passes
//!
//! This crate provides the optimization passes for circuits built with
//! [`circopt_ir`]. Each pass is a single sequential rewrite over the flat
//! operation list of a [`Circuit`](circopt_ir::Circuit), available both as a
//! free function and as a [`Pass`] that a [`PassManager`] can schedule.
//!
//! # Architecture
//!
//! ```text
//! Input Circuit
//!       |
//!       v
//! +-------------+
//! | PassManager | <-- PropertySet (DynamicCircuit, custom properties)
//! +-------------+
//!       |
//!       |-- EliminateResets / DeferMeasurements
//!       |-- RemoveIdentities
//!       |-- SwapReconstruction / CancelCnots / SingleQubitGateFusion
//!       |-- RemoveDiagonalGatesBeforeMeasure / RemoveFinalMeasurements
//!       |-- CollectBlocks
//!       `-- FlattenOperations / BackpropagateOutputPermutation
//!       |
//!       v
//! Optimized Circuit
//! ```
//!
//! Passes that need per-qubit adjacency build a [`LaneDag`]: one ordered
//! lane of operation indices per qubit.
//!
//! # Example: Running a Pipeline
//!
//! ```rust
//! use circopt_ir::{Circuit, QubitId};
//! use circopt_passes::PassManagerBuilder;
//!
//! let mut circuit = Circuit::with_size("example", 2, 0);
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.cx(QubitId(1), QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.h(QubitId(0)).unwrap();
//! circuit.h(QubitId(0)).unwrap();
//!
//! let (pm, mut props) = PassManagerBuilder::new()
//!     .with_optimization_level(1)
//!     .build();
//! pm.run(&mut circuit, &mut props).unwrap();
//!
//! // The three CNOTs become one SWAP and the Hadamards cancel.
//! assert_eq!(circuit.num_ops(), 1);
//! ```
//!
//! # Optimization Levels
//!
//! | Level | Passes Included |
//! |-------|-----------------|
//! | 0 | Dynamic-circuit analysis, identity removal |
//! | 1 | + SWAP reconstruction, CNOT cancellation, single-qubit fusion |
//! | 2 | + Diagonal gate removal before measurement |
//! | 3 | + Block collection |
//!
//! [`OptimizerConfig`] adds the optional passes (reset elimination,
//! measurement deferral, SWAP decomposition, final measurement removal,
//! flattening and output permutation back-propagation).
//!
//! # Custom Passes
//!
//! Implement the [`Pass`] trait to create custom passes:
//!
//! ```rust
//! use circopt_ir::Circuit;
//! use circopt_passes::{CompileResult, Pass, PassKind, PropertySet};
//!
//! struct MyCustomPass;
//!
//! impl Pass for MyCustomPass {
//!     fn name(&self) -> &str { "my_custom_pass" }
//!     fn kind(&self) -> PassKind { PassKind::Transformation }
//!
//!     fn run(&self, circuit: &mut Circuit, props: &mut PropertySet) -> CompileResult<()> {
//!         // Your pass logic here
//!         Ok(())
//!     }
//! }
//! ```

pub mod config;
pub mod dag;
pub mod error;
pub mod manager;
pub mod pass;
pub mod property;

// Built-in passes
pub mod passes;

pub use config::{ConfigError, OptimizerConfig};
pub use dag::LaneDag;
pub use error::{CompileError, CompileResult};
pub use manager::{PassManager, PassManagerBuilder};
pub use pass::{Pass, PassKind};
pub use property::{DynamicCircuit, PropertySet};
