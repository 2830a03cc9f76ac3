//! Benchmarks for circuit encoding and decoding
//!
//! Run with: cargo bench -p qcir-proto

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use qcir_ir::{Argument, Circuit, GateDecl};

fn layered(num_qubits: usize, layers: usize) -> Circuit {
    let mut circuit = Circuit::new();
    for layer in 0..layers {
        for q in 0..num_qubits {
            circuit.rx(0.1 * (layer + q) as f64, q).unwrap();
        }
        for q in (0..num_qubits - 1).step_by(2) {
            circuit.cx(q, q + 1).unwrap();
        }
        for q in 0..num_qubits {
            circuit.measure(q, q).unwrap();
        }
    }
    circuit
}

fn with_declarations(num_qubits: usize, calls: usize) -> Circuit {
    let decl = GateDecl::build("entangle", &["theta"], |body, args| {
        body.h(0)?.cx(0, 1)?.rz(args[0].clone(), 1)?;
        Ok(())
    })
    .unwrap();
    let mut circuit = Circuit::new();
    for i in 0..calls {
        let q = i % (num_qubits - 1);
        let call = decl.call(vec![Argument::from(0.01 * i as f64)]).unwrap();
        circuit.gate(call, &[q, q + 1]).unwrap();
    }
    circuit
}

/// Benchmark encode and decode of layered circuits
fn bench_layered(c: &mut Criterion) {
    let mut group = c.benchmark_group("layered");
    for n in &[8_usize, 32, 128] {
        let circuit = layered(*n, 10);
        let bytes = qcir_proto::encode(&circuit).unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_with_input(BenchmarkId::new("encode", n), &circuit, |b, circuit| {
            b.iter(|| black_box(qcir_proto::encode(circuit).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("decode", n), &bytes, |b, bytes| {
            b.iter(|| black_box(qcir_proto::decode(bytes).unwrap()));
        });
    }
    group.finish();
}

/// Benchmark declaration caching
fn bench_declarations(c: &mut Criterion) {
    let mut group = c.benchmark_group("declarations");
    for calls in &[10_usize, 1000] {
        let circuit = with_declarations(16, *calls);
        let bytes = qcir_proto::encode(&circuit).unwrap();

        group.bench_with_input(BenchmarkId::new("encode", calls), &circuit, |b, circuit| {
            b.iter(|| black_box(qcir_proto::encode(circuit).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("decode", calls), &bytes, |b, bytes| {
            b.iter(|| black_box(qcir_proto::decode(bytes).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_layered, bench_declarations);

criterion_main!(benches);
