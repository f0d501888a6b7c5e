//! Tests for simplification passes run through the `Pass` interface.

use circopt_ir::{Circuit, ClbitId, OpType, QubitId};

use crate::pass::Pass;
use crate::property::PropertySet;

use super::{
    CancelCnots, RemoveDiagonalGatesBeforeMeasure, RemoveFinalMeasurements, RemoveIdentities,
    SingleQubitGateFusion, SwapReconstruction,
};

fn run(pass: &dyn Pass, circuit: &mut Circuit) {
    let mut props = PropertySet::new();
    pass.run(circuit, &mut props).unwrap();
    assert!(props.is_empty());
}

#[test]
fn test_pass_names() {
    assert_eq!(RemoveIdentities::new().name(), "remove_identities");
    assert_eq!(SwapReconstruction::new().name(), "swap_reconstruction");
    assert_eq!(CancelCnots::new().name(), "cancel_cnots");
    assert_eq!(SingleQubitGateFusion::new().name(), "single_qubit_gate_fusion");
    assert_eq!(
        RemoveDiagonalGatesBeforeMeasure::new().name(),
        "remove_diagonal_gates_before_measure"
    );
    assert_eq!(RemoveFinalMeasurements::new().name(), "remove_final_measurements");
}

#[test]
fn test_reconstructed_swap_then_cancelled() {
    // CX(1,0) CX(0,1) -> SWAP CX(1,0); a trailing CX(1,0) then cancels.
    let mut circuit = Circuit::with_size("test", 2, 0);
    circuit.cx(QubitId(1), QubitId(0)).unwrap();
    circuit.cx(QubitId(0), QubitId(1)).unwrap();
    circuit.cx(QubitId(1), QubitId(0)).unwrap();

    run(&SwapReconstruction::new(), &mut circuit);
    assert_eq!(circuit.count_ops(OpType::Swap), 1);
    assert_eq!(circuit.num_ops(), 1);
}

#[test]
fn test_fusion_then_diagonal_removal() {
    let mut circuit = Circuit::with_size("test", 1, 1);
    circuit.x(QubitId(0)).unwrap();
    circuit.x(QubitId(0)).unwrap();
    circuit.h(QubitId(0)).unwrap();
    circuit.t(QubitId(0)).unwrap();
    circuit.measure(QubitId(0), ClbitId(0)).unwrap();

    run(&SingleQubitGateFusion::new(), &mut circuit);
    assert_eq!(circuit.num_ops(), 2);

    run(&RemoveDiagonalGatesBeforeMeasure::new(), &mut circuit);
    assert_eq!(circuit.count_ops(OpType::H), 1);
    assert_eq!(circuit.count_ops(OpType::Measure), 1);
    assert_eq!(circuit.num_ops(), 2);
}

#[test]
fn test_passes_leave_empty_circuit_alone() {
    let passes: Vec<Box<dyn Pass>> = vec![
        Box::new(RemoveIdentities::new()),
        Box::new(SwapReconstruction::new()),
        Box::new(CancelCnots::new()),
        Box::new(SingleQubitGateFusion::new()),
        Box::new(RemoveDiagonalGatesBeforeMeasure::new()),
        Box::new(RemoveFinalMeasurements::new()),
    ];
    for pass in &passes {
        let mut circuit = Circuit::new("empty");
        run(pass.as_ref(), &mut circuit);
        assert!(circuit.is_empty(), "{} changed an empty circuit", pass.name());
    }
}

#[test]
fn test_final_measurement_removal_after_cancellation() {
    let mut circuit = Circuit::with_size("test", 2, 2);
    circuit.h(QubitId(0)).unwrap();
    circuit.cx(QubitId(0), QubitId(1)).unwrap();
    circuit.cx(QubitId(0), QubitId(1)).unwrap();
    circuit.measure(QubitId(0), ClbitId(0)).unwrap();
    circuit.measure(QubitId(1), ClbitId(1)).unwrap();

    run(&CancelCnots::new(), &mut circuit);
    run(&RemoveFinalMeasurements::new(), &mut circuit);
    assert_eq!(circuit.num_ops(), 1);
    assert_eq!(circuit.count_ops(OpType::H), 1);
}
