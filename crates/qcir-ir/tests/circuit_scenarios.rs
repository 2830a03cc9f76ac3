//! End-to-end scenarios over the public circuit API.

use qcir_ir::{
    Argument, BitString, Block, Circuit, Endianness, Gate, GateDecl, IrError, Operation, PauliChannel, Repeat,
    SimpleOpKind, StandardGate, Target, matrix,
};
use std::collections::HashMap;

fn cx() -> Gate {
    Gate::from(StandardGate::X).control(1).unwrap()
}

#[test]
fn test_ghz_by_broadcast() {
    let mut circuit = Circuit::new();
    circuit.push(StandardGate::H, [0]).unwrap();
    circuit.push(cx(), [Target::from(0), Target::from(1..5)]).unwrap();

    assert_eq!(circuit, Circuit::ghz(5).unwrap());
    assert_eq!(circuit.num_qubits(), 5);
    assert_eq!(circuit.len(), 5);
    for (i, inst) in circuit.iter().skip(1).enumerate() {
        assert_eq!(inst.qtargets(), &[0, i + 1]);
    }
}

#[test]
fn test_remove_unused_sparse_qubits() {
    let mut circuit = Circuit::new();
    circuit.h(0).unwrap().cx(2, 5).unwrap().rz(0.1, 5).unwrap();
    assert_eq!(circuit.num_qubits(), 6);

    let (compact, maps) = circuit.remove_unused();
    assert_eq!(compact.num_qubits(), 3);
    let mut pairs: Vec<(usize, usize)> = maps.qubits.into_iter().collect();
    pairs.sort_unstable();
    assert_eq!(pairs, vec![(0, 0), (2, 1), (5, 2)]);
}

#[test]
fn test_remove_swaps_relabels() {
    let mut circuit = Circuit::new();
    circuit.h(1).unwrap().swap(1, 2).unwrap().cx(2, 3).unwrap();
    let (out, perm) = circuit.remove_swaps(false).unwrap();

    let mut expected = Circuit::new();
    expected.h(1).unwrap().cx(1, 3).unwrap();
    assert_eq!(out.instructions(), expected.instructions());
    assert_eq!(perm[1], 2);
    assert_eq!(perm[2], 1);
}

#[test]
fn test_decompose_nested_composites() {
    let decl = GateDecl::build("layer", &["theta"], |body, args| {
        let rx = Gate::from(StandardGate::Rx(args[0].clone()));
        body.gate(rx.power(3), &[0])?;
        body.gate(Gate::from(StandardGate::Ry(args[0].clone() * 2)).inverse(), &[1])?;
        body.cx(0, 1)?;
        Ok(())
    })
    .unwrap();
    let call = Gate::from(decl.call(vec![Argument::from(0.3)]).unwrap());

    let mut circuit = Circuit::new();
    circuit.gate(call.control(2).unwrap(), &[0, 1, 2, 3]).unwrap();

    let flat = circuit.decompose().unwrap();
    assert_eq!(flat.decompose().unwrap(), flat);
    assert_eq!(flat.num_qubits(), 4);
    assert!(matrix::approx_eq(&flat.matrix().unwrap(), &circuit.matrix().unwrap(), 1e-9));
}

#[test]
fn test_gate_decl_substitution() {
    let decl = GateDecl::build("rot", &["a", "b"], |body, args| {
        body.rx(args[0].clone(), 0)?.rz(args[1].clone() + 1, 0)?;
        Ok(())
    })
    .unwrap();
    assert!(decl.body().is_symbolic());

    let call = decl.call(vec![Argument::pi(), Argument::from(2)]).unwrap();
    let bound = call.bound_body();
    assert!(!bound.is_symbolic());
    let angles: Vec<f64> = bound.parameters().iter().map(|a| a.as_f64().unwrap()).collect();
    assert!((angles[0] - std::f64::consts::PI).abs() < 1e-12);
    assert!((angles[1] - 3.0).abs() < 1e-12);

    assert!(matches!(decl.call(vec![]), Err(IrError::ArityMismatch { .. })));
}

#[test]
fn test_argument_evaluation() {
    let expr = Argument::symbol("x") * 2 + Argument::pi().sin();
    assert!(expr.is_symbolic());
    assert!(matches!(expr.as_f64(), Err(IrError::UnboundSymbol(_))));

    let bindings = HashMap::from([("x".to_string(), Argument::from(1.5))]);
    let value = expr.evaluate(&bindings).unwrap().to_f64();
    assert!((value - 3.0).abs() < 1e-12);
}

#[test]
fn test_probability_validation() {
    let err = PauliChannel::from_letters(vec![0.5.into(), 0.6.into()], &["II", "XX"]).unwrap_err();
    assert!(matches!(err, IrError::InvalidProbability { .. }));
    assert!(PauliChannel::from_letters(vec![0.25.into(), 0.75.into()], &["II", "XX"]).is_ok());
}

#[test]
fn test_bitstring_conventions() {
    let bits = BitString::parse("101010").unwrap();
    assert_eq!(bits.to_integer(Endianness::Big).unwrap(), 21);
    assert_eq!(bits.to_integer(Endianness::Little).unwrap(), 42);

    let a = BitString::parse("1100").unwrap();
    let b = BitString::parse("1010").unwrap();
    assert_eq!((&a & &b).unwrap(), BitString::parse("1000").unwrap());
    assert_eq!((&a | &b).unwrap(), BitString::parse("1110").unwrap());
    assert_eq!((&a ^ &b).unwrap(), BitString::parse("0110").unwrap());
}

#[test]
fn test_mid_circuit_measurement_flow() {
    let mut block = Block::new(2, 2, 0);
    block.push(StandardGate::H, [0]).unwrap();
    block.push(cx(), [0, 1]).unwrap();
    block.push(Operation::measure(), [Target::from(0..2), Target::from(0..2)]).unwrap();

    let mut circuit = Circuit::new();
    circuit.push(Repeat::new(2, block), [1, 2, 0, 1]).unwrap();
    circuit
        .if_bits(StandardGate::X, BitString::parse("11").unwrap(), &[0], &[0, 1])
        .unwrap();
    circuit.push(Operation::simple(SimpleOpKind::VonNeumannEntropy), [0, 0]).unwrap();

    assert_eq!((circuit.num_qubits(), circuit.num_bits(), circuit.num_zvars()), (3, 2, 1));
    let flat = circuit.decompose().unwrap();
    assert_eq!(flat.len(), 2 * 4 + 2);
    assert!(matches!(circuit.inverse(), Err(IrError::NotInvertible(_))));
}
