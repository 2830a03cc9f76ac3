//! Wire round trips over every operation family.

use ndarray::array;
use num_complex::Complex64;
use prost::Message;
use qcir_ir::{
    Annotation, Argument, BitString, Block, Circuit, CustomGate, CustomKraus, CustomOperator, Exponent, Gate,
    GateDecl, GeneralizedGate, GeneralizedOpKind, GeneralizedOperation, Instruction, KrausChannel, KrausKind,
    MixedUnitary, Operation, Operator, OperatorKind, PauliChannel, PauliString, RPauli, Repeat, RescaledGate,
    SimpleOpKind, SimpleOperation, SimpleOperator, StandardGate,
};
use qcir_ir::{Hamiltonian, IdleRelation, NoiseModel, ReadoutErr};
use qcir_proto::{
    ProtoError, decode, decode_hamiltonian, decode_noise_model, encode, encode_hamiltonian, encode_noise_model,
    from_proto, schema, to_proto,
};
use std::sync::Arc;

/// Place `op` on the first indices of each register it needs.
fn single(op: impl Into<Operation>) -> Circuit {
    let op = op.into();
    let inst = Instruction::new(
        op.clone(),
        (0..op.num_qubits()).collect(),
        (0..op.num_bits()).collect(),
        (0..op.num_zvars()).collect(),
    )
    .unwrap();
    Circuit::from(vec![inst])
}

fn assert_round_trip(circuit: &Circuit) {
    let bytes = encode(circuit).unwrap();
    let decoded = decode(&bytes).unwrap();
    assert_eq!(&decoded, circuit, "round trip changed {circuit:?}");
}

fn x() -> Gate {
    Gate::from(StandardGate::X)
}

fn arg(v: f64) -> Argument {
    Argument::from(v)
}

#[test]
fn test_ghz_bytes_round_trip() {
    let ghz = Circuit::ghz(5).unwrap();
    let msg = to_proto(&ghz).unwrap();
    assert_eq!(msg.instructions.len(), 5);
    assert_eq!(msg.instructions[0].qtargets, vec![1]);
    assert_eq!(msg.instructions[4].qtargets, vec![1, 5]);
    assert!(msg.decls.is_empty());

    let decoded = decode(&msg.encode_to_vec()).unwrap();
    assert_eq!(decoded, ghz);
    assert_eq!(decoded.num_qubits(), 5);
}

#[test]
fn test_standard_gates_round_trip() {
    let gates = vec![
        StandardGate::Id,
        StandardGate::HXY,
        StandardGate::HYZ,
        StandardGate::Delay(arg(12.5)),
        StandardGate::U(arg(0.1), arg(0.2), arg(0.3), arg(0.0)),
        StandardGate::R(arg(0.4), Argument::pi() / 2),
        StandardGate::U1(arg(0.7)),
        StandardGate::U2(arg(0.1), arg(-0.2)),
        StandardGate::U3(arg(1.0), arg(2.0), arg(3.0)),
        StandardGate::ISwap,
        StandardGate::ECR,
        StandardGate::DCX,
        StandardGate::RXX(arg(0.3)),
        StandardGate::RYY(Argument::symbol("a")),
        StandardGate::RZZ(Argument::symbol("a") * 2),
        StandardGate::RZX(arg(0.3)),
        StandardGate::XXPlusYY(arg(0.1), arg(0.2)),
        StandardGate::XXMinusYY(arg(0.1), Argument::pi()),
    ];
    for g in gates {
        assert_round_trip(&single(g));
    }
}

#[test]
fn test_composite_gates_round_trip() {
    let gates = vec![
        x().control(3).unwrap(),
        Gate::from(StandardGate::Rx(arg(0.25))).power(2),
        Gate::from(StandardGate::H).power(Exponent::rational(1, 3).unwrap()),
        Gate::from(StandardGate::S).power(0.5),
        Gate::from(StandardGate::T).inverse(),
        Gate::from(StandardGate::H).parallel(3).unwrap(),
        Gate::from(StandardGate::Swap).control(1).unwrap().power(3),
    ];
    for g in gates {
        assert_round_trip(&single(g));
    }
}

#[test]
fn test_custom_and_generalized_gates_round_trip() {
    let i = Complex64::new(0.0, 1.0);
    let one = Complex64::new(1.0, 0.0);
    let zero = Complex64::new(0.0, 0.0);
    let custom = CustomGate::new(1, array![[zero, one], [i, zero]]).unwrap();
    assert_round_trip(&single(Gate::from(custom)));

    let generalized = vec![
        GeneralizedGate::qft(3).unwrap(),
        GeneralizedGate::phase_gradient(2).unwrap(),
        GeneralizedGate::diffusion(4).unwrap(),
        GeneralizedGate::polynomial_oracle(2, 2, 1, 2, 3, 4).unwrap(),
        GeneralizedGate::rnz(3, Argument::symbol("theta")).unwrap(),
    ];
    for g in generalized {
        assert_round_trip(&single(Gate::from(g)));
    }

    let pauli = PauliString::new("XIZY").unwrap();
    assert_round_trip(&single(Gate::from(pauli.clone())));
    assert_round_trip(&single(Gate::from(RPauli::new(pauli, arg(0.5)))));
}

#[test]
fn test_noise_round_trip() {
    let channels = vec![
        KrausChannel::simple(KrausKind::ResetZ, vec![]).unwrap(),
        KrausChannel::simple(KrausKind::AmplitudeDamping, vec![arg(0.1)]).unwrap(),
        KrausChannel::simple(KrausKind::ThermalNoise, vec![arg(1.0), arg(2.0), arg(0.5), arg(0.1)]).unwrap(),
        KrausChannel::depolarizing(2, arg(0.05)).unwrap(),
        KrausChannel::Custom(
            CustomKraus::new(vec![
                Operator::from(SimpleOperator::unit(OperatorKind::Projector0)),
                Operator::from(SimpleOperator::unit(OperatorKind::Projector1)),
            ])
            .unwrap(),
        ),
        KrausChannel::MixedUnitary(
            MixedUnitary::new(vec![(arg(0.25), x()), (arg(0.75), Gate::from(StandardGate::Id))]).unwrap(),
        ),
        KrausChannel::MixedUnitary(
            MixedUnitary::new(vec![
                (Argument::symbol("p"), x()),
                (Argument::from(1) - Argument::symbol("p"), Gate::from(StandardGate::Z)),
            ])
            .unwrap(),
        ),
        KrausChannel::Pauli(PauliChannel::from_letters(vec![arg(0.25), arg(0.75)], &["II", "XX"]).unwrap()),
    ];
    for channel in channels {
        assert_round_trip(&single(channel));
    }
}

#[test]
fn test_operators_round_trip() {
    let zero = Complex64::new(0.0, 0.0);
    let two = Complex64::new(2.0, 0.0);
    let operators = vec![
        Operator::from(SimpleOperator::unit(OperatorKind::SigmaMinus)),
        Operator::from(SimpleOperator::unit(OperatorKind::Projector10)),
        Operator::from(CustomOperator::new(1, array![[zero, two], [zero, zero]]).unwrap()),
        Operator::from(RescaledGate::new(x(), arg(0.5))),
    ];
    for op in operators {
        assert_round_trip(&single(Operation::Operator(op.clone())));
        assert_round_trip(&single(Operation::expectation_value(op)));
    }
    assert_round_trip(&single(Operation::expectation_value(Gate::from(
        PauliString::new("ZZ").unwrap(),
    ))));
}

#[test]
fn test_classical_and_annotation_round_trip() {
    let mut ops: Vec<Operation> = SimpleOpKind::ALL
        .iter()
        .map(|&k| Operation::Simple(SimpleOperation::unit(k)))
        .collect();
    ops.push(Operation::pow(arg(2.5)));
    ops.push(GeneralizedOperation::barrier(3).unwrap().into());
    ops.push(GeneralizedOperation::add(2, arg(1.5)).unwrap().into());
    ops.push(GeneralizedOperation::multiply(3, arg(2.0)).unwrap().into());
    for kind in [
        GeneralizedOpKind::And,
        GeneralizedOpKind::Or,
        GeneralizedOpKind::Xor,
        GeneralizedOpKind::ParityCheck,
    ] {
        ops.push(GeneralizedOperation::logic(kind, 2).unwrap().into());
    }
    ops.push(Annotation::qubit_coordinates(vec![1.0, 2.5]).into());
    ops.push(Annotation::shift_coordinates(vec![0.0, 0.0, 1.0]).into());
    ops.push(Annotation::tick().into());
    ops.push(Annotation::detector(2, vec![3.0, -1.5]).unwrap().into());
    ops.push(Annotation::observable_include(1, vec![0.0]).unwrap().into());
    ops.push(Operation::Amplitude(BitString::parse("0110").unwrap()));

    for op in ops {
        assert_round_trip(&single(op));
    }
}

#[test]
fn test_structural_round_trip() {
    let mut circuit = Circuit::new();
    circuit
        .if_bits(StandardGate::X, BitString::parse("101").unwrap(), &[0], &[0, 1, 2])
        .unwrap();

    let mut block = Block::new(2, 2, 0);
    block.push(StandardGate::H, [0]).unwrap();
    block.push(x().control(1).unwrap(), [0, 1]).unwrap();
    block.push(Operation::measure(), [1, 1]).unwrap();
    let block = Arc::new(block);
    circuit.push(Operation::Block(block.clone()), [0, 1, 0, 1]).unwrap();
    circuit.push(Repeat::new(3, Operation::Block(block)), [1, 2, 1, 2]).unwrap();
    circuit.push(Repeat::new(2, StandardGate::T), [0]).unwrap();

    assert_round_trip(&circuit);
}

#[test]
fn test_declarations_are_cached_and_shared() {
    let inner = GateDecl::build("entangle", &[], |body, _| {
        body.h(0)?.cx(0, 1)?;
        Ok(())
    })
    .unwrap();
    let outer = GateDecl::build("layer", &["theta"], |body, args| {
        body.gate(inner.call(vec![]).unwrap(), &[0, 1])?;
        body.rz(args[0].clone(), 1)?;
        Ok(())
    })
    .unwrap();

    let mut circuit = Circuit::new();
    circuit.gate(outer.call(vec![arg(0.1)]).unwrap(), &[0, 1]).unwrap();
    circuit.gate(outer.call(vec![arg(0.2)]).unwrap(), &[1, 2]).unwrap();
    circuit.gate(inner.call(vec![]).unwrap(), &[2, 3]).unwrap();

    let msg = to_proto(&circuit).unwrap();
    assert_eq!(msg.decls.len(), 2);
    assert_eq!(msg.declorder, vec![0, 1]);

    let decoded = from_proto(&msg).unwrap();
    assert_eq!(decoded, circuit);

    let decl_of = |i: usize| match decoded.instructions()[i].operation() {
        Operation::Gate(Gate::Call(call)) => call.decl().clone(),
        other => panic!("expected a gate call, got {other:?}"),
    };
    assert!(Arc::ptr_eq(&decl_of(0), &decl_of(1)));
    assert!(!Arc::ptr_eq(&decl_of(0), &decl_of(2)));
}

#[test]
fn test_inline_gate_call_accepted() {
    let decl = GateDecl::build("flip", &[], |body, _| {
        body.x(0)?;
        Ok(())
    })
    .unwrap();
    let mut circuit = Circuit::new();
    circuit.gate(decl.call(vec![]).unwrap(), &[0]).unwrap();

    let mut msg = to_proto(&circuit).unwrap();
    let decl_msg = match msg.decls.remove(&0).and_then(|d| d.declaration) {
        Some(schema::declaration::Declaration::Gatedecl(g)) => g,
        other => panic!("expected a gate declaration, got {other:?}"),
    };
    msg.declorder.clear();
    msg.instructions[0].operation = Some(schema::Operation {
        operation: Some(schema::operation::Operation::Gatecall(schema::GateCall {
            decl: Some(decl_msg),
            args: vec![],
        })),
    });

    assert_eq!(from_proto(&msg).unwrap(), circuit);
}

#[test]
fn test_schema_violations() {
    let circuit = Circuit::ghz(2).unwrap();

    let mut msg = to_proto(&circuit).unwrap();
    msg.instructions[0].operation = None;
    assert!(matches!(from_proto(&msg), Err(ProtoError::SchemaViolation { .. })));

    let mut msg = to_proto(&circuit).unwrap();
    msg.instructions[1].qtargets = vec![1];
    assert!(matches!(from_proto(&msg), Err(ProtoError::Ir(_))));

    let mut msg = to_proto(&circuit).unwrap();
    msg.instructions[1].qtargets = vec![1, -2];
    assert!(matches!(from_proto(&msg), Err(ProtoError::SchemaViolation { .. })));

    assert!(matches!(decode(&[0x0a, 0xff]), Err(ProtoError::Decode(_))));
}

#[test]
fn test_if_statement_requires_matching_condition() {
    let circuit = {
        let mut c = Circuit::new();
        c.if_bits(StandardGate::X, BitString::parse("1").unwrap(), &[0], &[0]).unwrap();
        c
    };
    let mut msg = to_proto(&circuit).unwrap();
    let Some(schema::operation::Operation::Ifstatement(stmt)) =
        msg.instructions[0].operation.as_mut().and_then(|o| o.operation.as_mut())
    else {
        panic!("expected an if statement");
    };
    stmt.operation = Some(Box::new(schema::Operation {
        operation: Some(schema::operation::Operation::Simpleoperation(schema::SimpleOperation {
            mtype: schema::OperationType::MeasureZ as i32,
            parameters: vec![],
        })),
    }));
    assert!(matches!(from_proto(&msg), Err(ProtoError::Ir(_))));
}

#[test]
fn test_readout_error_round_trip() {
    let mut circuit = Circuit::new();
    circuit.measure(2, 1).unwrap();
    circuit
        .push_instruction(Instruction::new(ReadoutErr::new(0.01, Argument::symbol("p")).unwrap(), vec![], vec![1], vec![]).unwrap());
    let msg = to_proto(&circuit).unwrap();
    assert_eq!(msg.instructions[1].ctargets, vec![2]);
    assert_round_trip(&circuit);

    let mut msg = msg;
    if let Some(schema::operation::Operation::Readouterr(e)) =
        msg.instructions[1].operation.as_mut().and_then(|o| o.operation.as_mut())
    {
        e.p0 = Some(qcir_proto::to_proto_arg(&arg(1.5)));
    }
    assert!(matches!(from_proto(&msg), Err(ProtoError::Ir(_))));
}

#[test]
fn test_hamiltonian_round_trip() {
    let mut h = Hamiltonian::new();
    h.push(0.5, "XX", &[0, 1])
        .unwrap()
        .push(Argument::symbol("J") * 2, "ZIZ", &[1, 2, 4])
        .unwrap()
        .push(-1, "Y", &[3])
        .unwrap();
    let decoded = decode_hamiltonian(&encode_hamiltonian(&h)).unwrap();
    assert_eq!(decoded, h);
    assert_eq!(decoded.num_qubits(), 5);
}

#[test]
fn test_noise_model_round_trip() {
    let decl = GateDecl::build("flip", &[], |body, _| {
        body.x(0)?;
        Ok(())
    })
    .unwrap();
    let theta = Argument::symbol("theta");
    let t = Argument::symbol("t");
    let damping = |p: Argument| KrausChannel::simple(KrausKind::AmplitudeDamping, vec![p]).unwrap();

    let mut model = NoiseModel::new("device");
    model
        .add_readout_noise(ReadoutErr::new(0.01, 0.02).unwrap(), None, false)
        .unwrap()
        .add_readout_noise(ReadoutErr::new(0.05, 0.03).unwrap(), Some(&[2, 0]), true)
        .unwrap()
        .add_readout_noise(ReadoutErr::new(0.1, 0.1).unwrap(), Some(&[3, 1]), false)
        .unwrap()
        .add_gate_noise(StandardGate::Rx(theta.clone()), StandardGate::Rx(theta / 10), None, false, true)
        .unwrap()
        .add_gate_noise(x().control(1).unwrap(), KrausChannel::depolarizing(2, 0.01).unwrap(), Some(&[0, 1]), true, false)
        .unwrap()
        .add_gate_noise(StandardGate::H, Gate::from(decl.call(vec![]).unwrap()), Some(&[1, 2]), false, false)
        .unwrap()
        .add_idle_noise(IdleRelation::with_variable("t", damping(t / 1000)).unwrap(), Some(&[0]))
        .unwrap()
        .add_idle_noise(IdleRelation::constant(damping(arg(0.001))).unwrap(), None)
        .unwrap();

    let bytes = encode_noise_model(&model).unwrap();
    let decoded = decode_noise_model(&bytes).unwrap();
    assert_eq!(decoded, model);

    let msg = schema::NoiseModel::decode(bytes.as_slice()).unwrap();
    assert_eq!(msg.declorder.len(), 1);
    assert_eq!(msg.rules.len(), 8);

    let mut circuit = Circuit::new();
    circuit.h(1).unwrap().cx(0, 1).unwrap().measure(0, 0).unwrap();
    assert_eq!(
        circuit.apply_noise_model(&decoded).unwrap(),
        circuit.apply_noise_model(&model).unwrap()
    );
}
