//! Error types for the optimization crate.

use circopt_ir::QubitId;
use thiserror::Error;

/// Errors that can occur while running optimization passes.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Error from the IR crate.
    #[error("IR error: {0}")]
    Ir(#[from] circopt_ir::IrError),

    /// An operation whose variant and type tag disagree.
    #[error("Unexpected operation '{name}' in pass '{pass}'")]
    UnexpectedOperation {
        /// Name of the offending operation.
        name: String,
        /// Pass that encountered it.
        pass: &'static str,
    },

    /// Measurement deferral only handles single-qubit measurements.
    #[error("Cannot defer a measurement of {qubits} qubits into {clbits} bits")]
    UnsupportedMeasurement {
        /// Number of measured qubits.
        qubits: usize,
        /// Number of classical bits.
        clbits: usize,
    },

    /// Classical control on more than one bit.
    #[error("Classical control on a {size}-bit register is not supported")]
    UnsupportedClassicControl {
        /// Size of the control register.
        size: u32,
    },

    /// A reset follows a measurement that is being deferred.
    #[error("Reset after a deferred measurement; eliminate resets first")]
    ResetDuringDeferral,

    /// A classically controlled operation wraps something other than a gate.
    #[error("Classically controlled '{name}' does not wrap a standard gate")]
    MalformedClassicControlled {
        /// Name of the wrapped operation.
        name: String,
    },

    /// A classically controlled gate acts on the qubit whose measurement
    /// controls it.
    #[error("Classically controlled gate targets measured qubit {qubit}; this is an implicit reset")]
    ImplicitReset {
        /// The measured qubit.
        qubit: QubitId,
    },

    /// Layout data inconsistent with the qubit count.
    #[error("Invalid permutation: {0}")]
    InvalidPermutation(String),

    /// Pass execution failed.
    #[error("Pass '{name}' failed: {reason}")]
    PassFailed {
        /// Name of the pass.
        name: String,
        /// Failure description.
        reason: String,
    },

    /// Invalid pass configuration.
    #[error("Invalid pass configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for optimization operations.
pub type CompileResult<T> = Result<T, CompileError>;
