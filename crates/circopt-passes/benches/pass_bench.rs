//! Benchmarks for circopt optimization passes
//!
//! Run with: cargo bench -p circopt-passes

use circopt_ir::{Circuit, ClbitId, QubitId};
use circopt_passes::{PassManagerBuilder, PropertySet};
use circopt_passes::passes::{
    cancel_cnots, collect_blocks, reorder_operations, single_qubit_gate_fusion,
};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

/// Layered circuit of single-qubit rotations and nearest-neighbour CNOTs.
fn layered_circuit(num_qubits: u32, layers: u32) -> Circuit {
    let mut circuit = Circuit::with_size("bench", num_qubits, num_qubits);
    for layer in 0..layers {
        for q in 0..num_qubits {
            circuit.h(QubitId(q)).unwrap();
            circuit.t(QubitId(q)).unwrap();
        }
        let offset = layer % 2;
        for q in (offset..num_qubits.saturating_sub(1)).step_by(2) {
            circuit.cx(QubitId(q), QubitId(q + 1)).unwrap();
            circuit.cx(QubitId(q), QubitId(q + 1)).unwrap();
        }
    }
    for q in 0..num_qubits {
        circuit.measure(QubitId(q), ClbitId(q)).unwrap();
    }
    circuit
}

/// Benchmark the individual passes
fn bench_passes(c: &mut Criterion) {
    let mut group = c.benchmark_group("passes");

    for num_qubits in &[5, 10, 20] {
        let circuit = layered_circuit(*num_qubits, 20);

        group.bench_with_input(
            BenchmarkId::new("cancel_cnots", num_qubits),
            &circuit,
            |b, circuit| {
                b.iter(|| {
                    let mut circuit = circuit.clone();
                    cancel_cnots(black_box(&mut circuit)).unwrap();
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("single_qubit_gate_fusion", num_qubits),
            &circuit,
            |b, circuit| {
                b.iter(|| {
                    let mut circuit = circuit.clone();
                    single_qubit_gate_fusion(black_box(&mut circuit)).unwrap();
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("reorder_operations", num_qubits),
            &circuit,
            |b, circuit| {
                b.iter(|| {
                    let mut circuit = circuit.clone();
                    reorder_operations(black_box(&mut circuit)).unwrap();
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("collect_blocks", num_qubits),
            &circuit,
            |b, circuit| {
                b.iter(|| {
                    let mut circuit = circuit.clone();
                    collect_blocks(black_box(&mut circuit), 3).unwrap();
                });
            },
        );
    }

    group.finish();
}

/// Benchmark the preset pipelines
fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let circuit = layered_circuit(10, 20);

    for level in 0..=3u8 {
        let (pm, _) = PassManagerBuilder::new()
            .with_optimization_level(level)
            .build();
        group.bench_with_input(BenchmarkId::new("level", level), &circuit, |b, circuit| {
            b.iter(|| {
                let mut circuit = circuit.clone();
                let mut props = PropertySet::new();
                pm.run(black_box(&mut circuit), &mut props).unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_passes, bench_pipeline);
criterion_main!(benches);
