//! Benchmarks for circuit building and rewriting
//!
//! Run with: cargo bench -p arvak-circuit

use arvak_circuit::{Circuit, OpGroupTransfer, StandardGate, VertexDeletion};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

fn layered(num_qubits: u32, layers: usize) -> Circuit {
    let mut circuit = Circuit::with_units(num_qubits, 0);
    for _ in 0..layers {
        for q in 0..num_qubits {
            circuit.h(q).unwrap();
        }
        for q in (0..num_qubits - 1).step_by(2) {
            circuit.cx(q, q + 1).unwrap();
        }
    }
    circuit
}

/// Benchmark building layered circuits
fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");

    for num_qubits in &[5, 20, 50] {
        group.bench_with_input(
            BenchmarkId::new("layered", num_qubits),
            num_qubits,
            |b, &n| {
                b.iter(|| black_box(layered(black_box(n), 5)));
            },
        );
    }

    group.finish();
}

/// Benchmark sequential composition
fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("append");

    for num_qubits in &[5, 20, 50] {
        let block = layered(*num_qubits, 3);
        group.bench_with_input(
            BenchmarkId::new("sequential", num_qubits),
            &block,
            |b, block| {
                b.iter(|| black_box(Circuit::sequential(block, block).unwrap()));
            },
        );
    }

    group.finish();
}

/// Benchmark replacing every CX with H·CZ·H
fn bench_substitute(c: &mut Criterion) {
    let mut group = c.benchmark_group("substitute");

    let mut replacement = Circuit::with_units(2, 0);
    replacement.h(1).unwrap();
    replacement
        .apply(
            StandardGate::CZ.into_op(),
            &[arvak_circuit::UnitId::qubit(0), arvak_circuit::UnitId::qubit(1)],
        )
        .unwrap();
    replacement.h(1).unwrap();

    for num_qubits in &[5, 20] {
        let circuit = layered(*num_qubits, 5);
        group.bench_with_input(
            BenchmarkId::new("all_cx", num_qubits),
            &circuit,
            |b, circuit| {
                b.iter(|| {
                    let mut target = circuit.clone();
                    target
                        .substitute_all(&replacement, &StandardGate::CX)
                        .unwrap();
                    black_box(target)
                });
            },
        );
        let single = circuit.get_commands()[*num_qubits as usize].vertex;
        group.bench_with_input(
            BenchmarkId::new("single_vertex", num_qubits),
            &circuit,
            |b, circuit| {
                b.iter(|| {
                    let mut target = circuit.clone();
                    target
                        .substitute_vertex(
                            &replacement,
                            single,
                            VertexDeletion::Yes,
                            OpGroupTransfer::Preserve,
                        )
                        .unwrap();
                    black_box(target)
                });
            },
        );
    }

    group.finish();
}

/// Benchmark the commands walk and depth
fn bench_commands(c: &mut Criterion) {
    let mut group = c.benchmark_group("commands");

    for num_qubits in &[5, 20, 50] {
        let circuit = layered(*num_qubits, 5);
        group.bench_with_input(
            BenchmarkId::new("depth", num_qubits),
            &circuit,
            |b, circuit| {
                b.iter(|| black_box(circuit.depth()));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_build,
    bench_append,
    bench_substitute,
    bench_commands,
);

criterion_main!(benches);
