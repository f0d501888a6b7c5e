//! Dynamic circuit detection.

use circopt_ir::{Circuit, Operation};
use tracing::debug;

use crate::dag::check_well_formed;
use crate::error::CompileResult;
use crate::pass::{Pass, PassKind};
use crate::property::{DynamicCircuit, PropertySet};

const PASS: &str = "dynamic_circuit_analysis";

/// Per-qubit record of the operations seen while scanning, compounds
/// flattened.
struct Scan<'a> {
    lanes: Vec<Vec<&'a Operation>>,
    has_measurements: bool,
}

impl<'a> Scan<'a> {
    /// Record `op`; returns `true` as soon as the circuit is known to be
    /// dynamic.
    fn visit(&mut self, op: &'a Operation) -> CompileResult<bool> {
        check_well_formed(op, PASS)?;
        match op {
            Operation::ClassicControlled(_) => return Ok(true),
            Operation::NonUnitary(_) if op.is_reset() => return Ok(true),
            Operation::Compound(comp) => {
                for child in comp.iter() {
                    if self.visit(child)? {
                        return Ok(true);
                    }
                }
                return Ok(false);
            }
            _ => {}
        }

        self.has_measurements |= op.is_measure();
        let qubits = match op {
            Operation::NonUnitary(nu) => nu.targets.iter().copied().collect(),
            _ => op.used_qubits(),
        };
        for qubit in qubits {
            let idx = qubit.index();
            if idx >= self.lanes.len() {
                self.lanes.resize_with(idx + 1, Vec::new);
            }
            self.lanes[idx].push(op);
        }
        Ok(false)
    }
}

/// Whether any lane has a non-trivial operation after its last measurement.
fn operation_after_measurement(lane: &[&Operation]) -> bool {
    let mut operation = false;
    for op in lane.iter().rev() {
        if op.is_measure() {
            return operation;
        }
        operation |= matches!(op, Operation::Standard(_)) || op.is_reset();
    }
    false
}

/// Whether the circuit needs mid-circuit classical feedback.
///
/// A circuit is dynamic if it contains a reset or a classically controlled
/// operation anywhere, or if some qubit is acted on by a gate after being
/// measured. Barriers and further measurements after a measurement do not
/// count.
pub fn is_dynamic_circuit(circuit: &Circuit) -> CompileResult<bool> {
    let mut scan = Scan {
        lanes: Vec::new(),
        has_measurements: false,
    };
    for op in circuit.ops() {
        if scan.visit(op)? {
            return Ok(true);
        }
    }
    if !scan.has_measurements {
        return Ok(false);
    }
    Ok(scan
        .lanes
        .iter()
        .any(|lane| operation_after_measurement(lane)))
}

/// Analysis pass storing [`DynamicCircuit`] in the property set.
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicCircuitAnalysis;

impl DynamicCircuitAnalysis {
    /// Create a new dynamic circuit analysis pass.
    pub fn new() -> Self {
        Self
    }
}

impl Pass for DynamicCircuitAnalysis {
    fn name(&self) -> &'static str {
        PASS
    }

    fn kind(&self) -> PassKind {
        PassKind::Analysis
    }

    fn run(&self, circuit: &mut Circuit, properties: &mut PropertySet) -> CompileResult<()> {
        let dynamic = is_dynamic_circuit(circuit)?;
        debug!(dynamic, "dynamic circuit analysis");
        properties.insert(DynamicCircuit(dynamic));
        Ok(())
    }
}
