//! IR to wire conversion.

use num_complex::Complex64;
use qcir_ir::{
    Annotation, AnnotationKind, Argument, BitString, Circuit, CustomOperator, Exponent, FunctionKind, Gate,
    GateDecl, GeneralizedGate, GeneralizedOpKind, Instruction, Irrational, KrausChannel, KrausKind, Operation,
    Operator, OperatorKind, PauliString, SimpleOpKind, SimpleOperator, StandardGate,
};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::trace;

use crate::error::{ProtoError, ProtoResult};
use crate::schema::{self, arg, arg_value, gate, note, operation, operator, power};

/// Largest magnitude at which every whole `f64` is an exact integer.
const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;

/// Position of `kind` in its wire-ordered table.
pub(crate) fn wire_index<T: PartialEq>(all: &[T], kind: &T) -> i32 {
    all.iter().position(|k| k == kind).map_or(0, |i| i as i32)
}

fn wire_count(n: usize) -> i64 {
    n as i64
}

pub(crate) fn wire_targets(targets: &[usize]) -> Vec<i64> {
    targets.iter().map(|&t| t as i64 + 1).collect()
}

fn is_whole(x: f64) -> bool {
    x.fract() == 0.0 && x.abs() < EXACT_INTEGER_LIMIT
}

fn value(v: arg_value::Value) -> arg::Arg {
    arg::Arg::ArgvalueValue(schema::ArgValue { value: Some(v) })
}

fn function_type(kind: FunctionKind) -> schema::FunctionType {
    use schema::FunctionType as F;
    match kind {
        FunctionKind::Add => F::Add,
        FunctionKind::Mul => F::Mul,
        FunctionKind::Div => F::Div,
        FunctionKind::Pow => F::Pow,
        FunctionKind::Sin => F::Sin,
        FunctionKind::Cos => F::Cos,
        FunctionKind::Tan => F::Tan,
        FunctionKind::Exp => F::Exp,
        FunctionKind::Log => F::Log,
        FunctionKind::Identity => F::Identity,
    }
}

fn irrational(c: Irrational) -> schema::Irrational {
    match c {
        Irrational::Pi => schema::Irrational::Pi,
        Irrational::Euler => schema::Irrational::Euler,
    }
}

/// Encode an argument. Whole floats are written as integers.
pub fn to_proto_arg(a: &Argument) -> schema::Arg {
    let inner = match a {
        Argument::Integer(i) => value(arg_value::Value::IntegerValue(*i)),
        Argument::Real(x) if is_whole(*x) => value(arg_value::Value::IntegerValue(*x as i64)),
        Argument::Real(x) => value(arg_value::Value::DoubleValue(*x)),
        Argument::Bool(b) => value(arg_value::Value::BoolValue(*b)),
        Argument::Symbol(name) => arg::Arg::SymbolValue(schema::Symbol { value: name.clone() }),
        Argument::Irrational(c) => arg::Arg::IrrationalValue(irrational(*c) as i32),
        Argument::Function(kind, args) => arg::Arg::ArgfunctionValue(schema::ArgFunction {
            mtype: function_type(*kind) as i32,
            args: args.iter().map(to_proto_arg).collect(),
        }),
    };
    schema::Arg { arg: Some(inner) }
}

fn args<'a>(params: impl IntoIterator<Item = &'a Argument>) -> Vec<schema::Arg> {
    params.into_iter().map(to_proto_arg).collect()
}

fn complex(z: &Complex64) -> schema::ComplexArg {
    schema::ComplexArg {
        real: Some(to_proto_arg(&Argument::Real(z.re))),
        imag: Some(to_proto_arg(&Argument::Real(z.im))),
    }
}

/// Encode a bit string.
pub fn to_proto_bits(bits: &BitString) -> schema::BitVector {
    schema::BitVector {
        len: wire_count(bits.len()),
        data: bits.to_bytes(),
    }
}

pub(crate) fn pauli_string(p: &PauliString) -> schema::PauliString {
    schema::PauliString {
        numqubits: wire_count(p.num_qubits()),
        pauli: p.to_string(),
    }
}

fn notes(values: &[f64]) -> Vec<schema::Note> {
    values
        .iter()
        .map(|&x| schema::Note {
            note: Some(if is_whole(x) {
                note::Note::IntNote(x as i64)
            } else {
                note::Note::DoubleNote(x)
            }),
        })
        .collect()
}

fn simple_operator(s: &SimpleOperator) -> schema::SimpleOperator {
    schema::SimpleOperator {
        mtype: wire_index(&OperatorKind::ALL, &s.kind()),
        parameters: args(s.parameters()),
    }
}

/// Row-major, unlike custom gates.
fn custom_operator(c: &CustomOperator) -> schema::CustomOperator {
    schema::CustomOperator {
        numqubits: wire_count(c.num_qubits()),
        matrix: c.matrix().iter().map(complex).collect(),
    }
}

fn gate_type(g: &StandardGate) -> schema::GateType {
    use StandardGate as G;
    use schema::GateType as T;
    match g {
        G::Id => T::Id,
        G::X => T::X,
        G::Y => T::Y,
        G::Z => T::Z,
        G::H => T::H,
        G::HXY => T::Hxy,
        G::HYZ => T::Hyz,
        G::S => T::S,
        G::T => T::T,
        G::Delay(_) => T::Delay,
        G::U(..) => T::U,
        G::P(_) => T::P,
        G::Rx(_) => T::Rx,
        G::Ry(_) => T::Ry,
        G::Rz(_) => T::Rz,
        G::R(..) => T::R,
        G::U1(_) => T::U1,
        G::U2(..) => T::U2,
        G::U3(..) => T::U3,
        G::Swap => T::Swap,
        G::ISwap => T::Iswap,
        G::ECR => T::Ecr,
        G::DCX => T::Dcx,
        G::RXX(_) => T::Rxx,
        G::RYY(_) => T::Ryy,
        G::RZZ(_) => T::Rzz,
        G::RZX(_) => T::Rzx,
        G::XXPlusYY(..) => T::XxPlusYy,
        G::XXMinusYY(..) => T::XxMinusYy,
    }
}

fn generalized_type(g: &GeneralizedGate) -> schema::GeneralizedType {
    use schema::GeneralizedType as T;
    match g {
        GeneralizedGate::Qft { .. } => T::Qft,
        GeneralizedGate::PhaseGradient { .. } => T::PhaseGradient,
        GeneralizedGate::PolynomialOracle { .. } => T::PolynomialOracle,
        GeneralizedGate::Diffusion { .. } => T::Diffusion,
        GeneralizedGate::Rnz { .. } => T::GateRnz,
    }
}

/// Place a gate variant in the flattened operation union.
fn gate_operation(g: gate::Gate) -> operation::Operation {
    use operation::Operation as O;
    match g {
        gate::Gate::Simplegate(m) => O::Simplegate(m),
        gate::Gate::Customgate(m) => O::Customgate(m),
        gate::Gate::Generalized(m) => O::Generalized(m),
        gate::Gate::Control(m) => O::Control(m),
        gate::Gate::Power(m) => O::Power(m),
        gate::Gate::Inverse(m) => O::Inverse(m),
        gate::Gate::Parallel(m) => O::Parallel(m),
        gate::Gate::Gatecall(m) => O::Gatecall(m),
        gate::Gate::Cachedgatecall(m) => O::Cachedgatecall(m),
        gate::Gate::Paulistring(m) => O::Paulistring(m),
        gate::Gate::Rpauli(m) => O::Rpauli(m),
    }
}

/// Place a gate variant in the operator union, when it has a slot there.
fn gate_operator(g: gate::Gate) -> Option<operator::Operator> {
    use operator::Operator as O;
    Some(match g {
        gate::Gate::Simplegate(m) => O::Simplegate(m),
        gate::Gate::Customgate(m) => O::Customgate(m),
        gate::Gate::Control(m) => O::Control(m),
        gate::Gate::Power(m) => O::Power(m),
        gate::Gate::Inverse(m) => O::Inverse(m),
        gate::Gate::Parallel(m) => O::Parallel(m),
        gate::Gate::Paulistring(m) => O::Paulistring(m),
        _ => return None,
    })
}

/// Stateful encoder that emits each gate declaration once.
#[derive(Default)]
pub(crate) struct Encoder {
    ids: FxHashMap<*const GateDecl, u64>,
    decls: BTreeMap<u64, schema::Declaration>,
    order: Vec<u64>,
}

impl Encoder {
    pub(crate) fn circuit(mut self, circuit: &Circuit) -> ProtoResult<schema::Circuit> {
        let instructions = self.instructions(circuit.instructions())?;
        trace!(
            instructions = instructions.len(),
            decls = self.order.len(),
            "encoded circuit message"
        );
        Ok(schema::Circuit {
            instructions,
            decls: self.decls,
            declorder: self.order,
        })
    }

    /// The declarations collected so far and their dependency order.
    pub(crate) fn into_decls(self) -> (BTreeMap<u64, schema::Declaration>, Vec<u64>) {
        (self.decls, self.order)
    }

    fn instructions(&mut self, instructions: &[Instruction]) -> ProtoResult<Vec<schema::Instruction>> {
        instructions.iter().map(|inst| self.instruction(inst)).collect()
    }

    fn instruction(&mut self, inst: &Instruction) -> ProtoResult<schema::Instruction> {
        Ok(schema::Instruction {
            operation: Some(self.operation(inst.operation())?),
            qtargets: wire_targets(inst.qtargets()),
            ctargets: wire_targets(inst.ctargets()),
            ztargets: wire_targets(inst.ztargets()),
        })
    }

    pub(crate) fn operation(&mut self, op: &Operation) -> ProtoResult<schema::Operation> {
        use operation::Operation as O;
        let inner = match op {
            Operation::Gate(g) => gate_operation(self.gate(g)?),
            Operation::Kraus(k) => self.kraus(k)?,
            Operation::Operator(o) => match o {
                Operator::Simple(s) => O::Simpleoperator(simple_operator(s)),
                Operator::Custom(c) => O::Customoperator(custom_operator(c)),
                Operator::Rescaled(r) => O::Rescaledgate(self.rescaled(r.gate(), r.scale())?),
                Operator::Gate(g) => gate_operation(self.gate(g)?),
            },
            Operation::Simple(s) => O::Simpleoperation(schema::SimpleOperation {
                mtype: wire_index(&SimpleOpKind::ALL, &s.kind()),
                parameters: args(s.parameters()),
            }),
            Operation::Generalized(g) => O::Generalizedoperation(schema::GeneralizedOperation {
                mtype: wire_index(&GeneralizedOpKind::ALL, &g.kind()),
                numqubits: wire_count(g.num_qubits()),
                numbits: wire_count(g.num_bits()),
                numzvars: wire_count(g.num_zvars()),
                parameters: args(g.parameters()),
            }),
            Operation::Annotation(a) => annotation(a),
            Operation::Amplitude(bits) => O::Amplitude(schema::Amplitude {
                bs: Some(to_proto_bits(bits)),
            }),
            Operation::ExpectationValue(o) => O::Expectationvalue(schema::ExpectationValue {
                operator: Some(schema::Operator {
                    operator: Some(self.operator(o)?),
                }),
            }),
            Operation::If(stmt) => O::Ifstatement(schema::IfStatement {
                operation: Some(Box::new(schema::Operation {
                    operation: Some(gate_operation(self.gate(stmt.gate())?)),
                })),
                bitstring: Some(to_proto_bits(stmt.condition())),
            }),
            Operation::Block(block) => O::Block(schema::Block {
                numqubits: wire_count(block.num_qubits()),
                numbits: wire_count(block.num_bits()),
                numzvars: wire_count(block.num_zvars()),
                instructions: self.instructions(block.instructions())?,
            }),
            Operation::Repeat(r) => O::Repeat(schema::Repeat {
                numrepeats: wire_count(r.num_repeats()),
                operation: Some(Box::new(self.operation(r.operation())?)),
            }),
            Operation::ReadoutErr(e) => O::Readouterr(schema::ReadoutErr {
                p0: Some(to_proto_arg(e.p0())),
                p1: Some(to_proto_arg(e.p1())),
            }),
        };
        Ok(schema::Operation { operation: Some(inner) })
    }

    fn boxed_gate(&mut self, g: &Gate) -> ProtoResult<Option<Box<schema::Gate>>> {
        Ok(Some(Box::new(schema::Gate {
            gate: Some(self.gate(g)?),
        })))
    }

    pub(crate) fn gate(&mut self, g: &Gate) -> ProtoResult<gate::Gate> {
        Ok(match g {
            Gate::Standard(s) => gate::Gate::Simplegate(schema::SimpleGate {
                mtype: gate_type(s) as i32,
                parameters: args(s.parameters()),
            }),
            Gate::Custom(c) => gate::Gate::Customgate(schema::CustomGate {
                numqubits: wire_count(c.num_qubits()),
                // column-major
                matrix: c.matrix().t().iter().map(complex).collect(),
            }),
            Gate::Generalized(g) => gate::Gate::Generalized(schema::GeneralizedGate {
                mtype: generalized_type(g) as i32,
                args: args(&g.parameters()),
                qregsizes: g.qreg_sizes().into_iter().map(wire_count).collect(),
            }),
            Gate::PauliString(p) => gate::Gate::Paulistring(pauli_string(p)),
            Gate::RPauli(r) => gate::Gate::Rpauli(schema::RPauli {
                pauli: Some(pauli_string(r.pauli())),
                theta: Some(to_proto_arg(r.theta())),
            }),
            Gate::Control(c) => gate::Gate::Control(schema::Control {
                operation: self.boxed_gate(c.gate())?,
                numcontrols: wire_count(c.num_controls()),
            }),
            Gate::Power(p) => gate::Gate::Power(schema::Power {
                operation: self.boxed_gate(p.gate())?,
                power: Some(match p.exponent() {
                    Exponent::Int(n) => power::Power::IntVal(n),
                    Exponent::Rational(num, den) => power::Power::RationalVal(schema::Rational { num, den }),
                    Exponent::Double(x) => power::Power::DoubleVal(x),
                }),
            }),
            Gate::Inverse(i) => gate::Gate::Inverse(schema::Inverse {
                operation: self.boxed_gate(i.gate())?,
            }),
            Gate::Parallel(p) => gate::Gate::Parallel(schema::Parallel {
                operation: self.boxed_gate(p.gate())?,
                numrepeats: wire_count(p.num_repeats()),
            }),
            Gate::Call(call) => gate::Gate::Cachedgatecall(schema::CachedGateCall {
                id: self.declare(call.decl())?,
                args: args(call.args()),
            }),
        })
    }

    /// Id of `decl`, encoding it (and the declarations its body uses) on
    /// first sight.
    fn declare(&mut self, decl: &Arc<GateDecl>) -> ProtoResult<u64> {
        let key = Arc::as_ptr(decl);
        if let Some(&id) = self.ids.get(&key) {
            return Ok(id);
        }
        let message = schema::GateDecl {
            name: decl.name().to_string(),
            args: decl
                .arguments()
                .iter()
                .map(|a| schema::Symbol { value: a.clone() })
                .collect(),
            instructions: self.instructions(decl.body().instructions())?,
        };
        let id = self.order.len() as u64;
        self.ids.insert(key, id);
        self.order.push(id);
        self.decls.insert(
            id,
            schema::Declaration {
                declaration: Some(schema::declaration::Declaration::Gatedecl(message)),
            },
        );
        trace!(id, name = decl.name(), "cached gate declaration");
        Ok(id)
    }

    fn operator(&mut self, o: &Operator) -> ProtoResult<operator::Operator> {
        Ok(match o {
            Operator::Simple(s) => operator::Operator::Simpleoperator(simple_operator(s)),
            Operator::Custom(c) => operator::Operator::Customoperator(custom_operator(c)),
            Operator::Rescaled(r) => operator::Operator::Rescaledgate(self.rescaled(r.gate(), r.scale())?),
            Operator::Gate(g) => {
                let encoded = self.gate(g)?;
                gate_operator(encoded).ok_or_else(|| {
                    ProtoError::schema(
                        "operator",
                        format!("gate '{}' cannot be used as an operator on the wire", g.name()),
                    )
                })?
            }
        })
    }

    fn rescaled(&mut self, g: &Gate, scale: &Argument) -> ProtoResult<schema::RescaledGate> {
        Ok(schema::RescaledGate {
            operation: Some(schema::Gate {
                gate: Some(self.gate(g)?),
            }),
            scale: Some(to_proto_arg(scale)),
        })
    }

    fn kraus(&mut self, k: &KrausChannel) -> ProtoResult<operation::Operation> {
        use operation::Operation as O;
        Ok(match k {
            KrausChannel::Simple(s) => O::Simplekrauschannel(schema::SimpleKrausChannel {
                mtype: wire_index(&KrausKind::ALL, &s.kind()),
                parameters: args(s.parameters()),
            }),
            KrausChannel::Custom(c) => O::Customkrauschannel(schema::CustomKrausChannel {
                numqubits: wire_count(c.num_qubits()),
                operators: c
                    .operators()
                    .iter()
                    .map(|o| {
                        Ok(schema::Operator {
                            operator: Some(self.operator(o)?),
                        })
                    })
                    .collect::<ProtoResult<_>>()?,
            }),
            // Each gate is weighted by the square root of its probability.
            KrausChannel::MixedUnitary(m) => O::Mixedunitarychannel(schema::MixedUnitaryChannel {
                operators: m
                    .terms()
                    .iter()
                    .map(|(p, g)| self.rescaled(g, &p.clone().sqrt()))
                    .collect::<ProtoResult<_>>()?,
            }),
            KrausChannel::Pauli(p) => O::Paulichannel(schema::PauliChannel {
                probabilities: p.terms().iter().map(|(prob, _)| to_proto_arg(prob)).collect(),
                paulistrings: p.terms().iter().map(|(_, s)| pauli_string(s)).collect(),
            }),
            KrausChannel::Depolarizing {
                num_qubits,
                probability,
            } => O::Depolarizingchannel(schema::DepolarizingChannel {
                numqubits: wire_count(*num_qubits),
                probability: Some(to_proto_arg(probability)),
            }),
        })
    }
}

fn annotation(a: &Annotation) -> operation::Operation {
    use schema::{AnnotationType as A, GeneralizedAnnotationType as G};
    let simple = |mtype: A| {
        operation::Operation::Simpleannotation(schema::SimpleAnnotation {
            mtype: mtype as i32,
            notes: notes(a.notes()),
        })
    };
    let generalized = |mtype: G| {
        operation::Operation::Generalizedannotation(schema::GeneralizedAnnotation {
            mtype: mtype as i32,
            numqubits: wire_count(a.num_qubits()),
            numbits: wire_count(a.num_bits()),
            numzvars: 0,
            notes: notes(a.notes()),
        })
    };
    match a.kind() {
        AnnotationKind::QubitCoordinates => simple(A::QubitCoordinates),
        AnnotationKind::ShiftCoordinates => simple(A::ShiftCoordinates),
        AnnotationKind::Tick => simple(A::Tick),
        AnnotationKind::Detector => generalized(G::Detector),
        AnnotationKind::ObservableInclude => generalized(G::ObservableInclude),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use qcir_ir::CustomGate;

    #[test]
    fn test_whole_floats_encode_as_integers() {
        let encoded = to_proto_arg(&Argument::Real(3.0));
        assert_eq!(
            encoded.arg,
            Some(value(arg_value::Value::IntegerValue(3)))
        );
        let encoded = to_proto_arg(&Argument::Real(0.25));
        assert_eq!(
            encoded.arg,
            Some(value(arg_value::Value::DoubleValue(0.25)))
        );
    }

    #[test]
    fn test_irrational_stays_symbolic() {
        let encoded = to_proto_arg(&Argument::pi_frac(1, 2));
        match encoded.arg {
            Some(arg::Arg::ArgfunctionValue(f)) => {
                assert_eq!(f.mtype, schema::FunctionType::Div as i32);
                assert_eq!(
                    f.args[0].arg,
                    Some(arg::Arg::IrrationalValue(schema::Irrational::Pi as i32))
                );
            }
            other => panic!("expected a function node, got {other:?}"),
        }
    }

    #[test]
    fn test_targets_are_one_based() {
        let mut circuit = Circuit::new();
        circuit.cx(0, 3).unwrap().measure(3, 1).unwrap();
        let msg = Encoder::default().circuit(&circuit).unwrap();
        assert_eq!(msg.instructions[0].qtargets, vec![1, 4]);
        assert_eq!(msg.instructions[1].qtargets, vec![4]);
        assert_eq!(msg.instructions[1].ctargets, vec![2]);
    }

    #[test]
    fn test_custom_gate_is_column_major() {
        let i = Complex64::new(0.0, 1.0);
        let zero = Complex64::new(0.0, 0.0);
        let m = array![[zero, Complex64::new(1.0, 0.0)], [i, zero]];
        let g = Gate::from(CustomGate::new(1, m).unwrap());
        let encoded = match Encoder::default().gate(&g).unwrap() {
            gate::Gate::Customgate(c) => c,
            other => panic!("expected custom gate, got {other:?}"),
        };
        // element (1, 0) = i comes second in column-major order
        assert_eq!(encoded.matrix[1], complex(&i));
        assert_eq!(encoded.matrix[2], complex(&Complex64::new(1.0, 0.0)));
    }

    #[test]
    fn test_declaration_emitted_once() {
        let decl = GateDecl::build("bell", &[], |body, _| {
            body.h(0)?.cx(0, 1)?;
            Ok(())
        })
        .unwrap();
        let mut circuit = Circuit::new();
        circuit.gate(decl.call(vec![]).unwrap(), &[0, 1]).unwrap();
        circuit.gate(decl.call(vec![]).unwrap(), &[2, 3]).unwrap();
        let msg = Encoder::default().circuit(&circuit).unwrap();
        assert_eq!(msg.decls.len(), 1);
        assert_eq!(msg.declorder, vec![0]);
    }

    #[test]
    fn test_wire_index_matches_enum() {
        assert_eq!(
            wire_index(&SimpleOpKind::ALL, &SimpleOpKind::SetBit1),
            schema::OperationType::SetBit1 as i32
        );
        assert_eq!(
            wire_index(&GeneralizedOpKind::ALL, &GeneralizedOpKind::ParityCheck),
            schema::GeneralizedOperationType::ParityCheck as i32
        );
        assert_eq!(
            wire_index(&KrausKind::ALL, &KrausKind::ProjectiveNoiseZ),
            schema::KrausChannelType::ProjectiveNoiseZ as i32
        );
        assert_eq!(
            wire_index(&OperatorKind::ALL, &OperatorKind::DiagonalOp),
            schema::OperatorType::DiagonalOp as i32
        );
    }
}
