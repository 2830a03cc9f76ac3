//! Wire to IR conversion.

use ndarray::Array2;
use num_complex::Complex64;
use qcir_ir::{
    Annotation, AnnotationKind, Argument, BitString, Block, Circuit, CustomGate, CustomKraus, CustomOperator,
    Exponent, FunctionKind, Gate, GateDecl, GeneralizedGate, GeneralizedOpKind, GeneralizedOperation,
    IfStatement, Instruction, KrausChannel, KrausKind, MixedUnitary, Operation, Operator, OperatorKind,
    PauliChannel, PauliString, RPauli, ReadoutErr, Repeat, RescaledGate, SimpleOpKind, SimpleOperation, SimpleOperator,
    StandardGate,
};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::trace;

use crate::error::{ProtoError, ProtoResult};
use crate::schema::{self, arg, arg_value, declaration, gate, note, operation, operator, power};

/// Widest custom matrix accepted from the wire.
const MAX_MATRIX_QUBITS: usize = 16;

fn count(context: &'static str, value: i64) -> ProtoResult<usize> {
    usize::try_from(value).map_err(|_| ProtoError::schema(context, format!("negative count {value}")))
}

pub(crate) fn targets(context: &'static str, values: &[i64]) -> ProtoResult<Vec<usize>> {
    values
        .iter()
        .map(|&t| {
            if t < 1 {
                return Err(ProtoError::schema(context, format!("target {t} is not 1-based")));
            }
            count(context, t - 1)
        })
        .collect()
}

/// Look up a kind by its position in a wire-ordered table.
fn wire_kind<T: Copy>(context: &'static str, all: &[T], value: i32) -> ProtoResult<T> {
    usize::try_from(value)
        .ok()
        .and_then(|i| all.get(i))
        .copied()
        .ok_or_else(|| ProtoError::unknown_tag(context, value))
}

pub(crate) fn required<'a, T>(context: &'static str, field: &'a Option<T>) -> ProtoResult<&'a T> {
    field.as_ref().ok_or_else(|| ProtoError::unset(context))
}

fn function_kind(value: i32) -> ProtoResult<FunctionKind> {
    use schema::FunctionType as F;
    let t = F::try_from(value).map_err(|_| ProtoError::unknown_tag("function type", value))?;
    Ok(match t {
        F::Add => FunctionKind::Add,
        F::Mul => FunctionKind::Mul,
        F::Div => FunctionKind::Div,
        F::Pow => FunctionKind::Pow,
        F::Sin => FunctionKind::Sin,
        F::Cos => FunctionKind::Cos,
        F::Tan => FunctionKind::Tan,
        F::Exp => FunctionKind::Exp,
        F::Log => FunctionKind::Log,
        F::Identity => FunctionKind::Identity,
    })
}

/// Decode an argument. Function nodes are rebuilt as sent, without folding.
pub fn from_proto_arg(msg: &schema::Arg) -> ProtoResult<Argument> {
    Ok(match required("argument", &msg.arg)? {
        arg::Arg::ArgvalueValue(v) => match required("argument value", &v.value)? {
            arg_value::Value::IntegerValue(i) => Argument::Integer(*i),
            arg_value::Value::DoubleValue(x) => Argument::Real(*x),
            arg_value::Value::BoolValue(b) => Argument::Bool(*b),
        },
        arg::Arg::SymbolValue(s) => Argument::Symbol(s.value.clone()),
        arg::Arg::IrrationalValue(v) => match schema::Irrational::try_from(*v) {
            Ok(schema::Irrational::Pi) => Argument::pi(),
            Ok(schema::Irrational::Euler) => Argument::euler(),
            Err(_) => return Err(ProtoError::unknown_tag("irrational", *v)),
        },
        arg::Arg::ArgfunctionValue(f) => {
            let kind = function_kind(f.mtype)?;
            let args = decode_args(&f.args)?;
            if let Some(n) = kind.arity() {
                if args.len() != n {
                    return Err(ProtoError::schema(
                        "argument function",
                        format!("{} expects {n} operands, got {}", kind.name(), args.len()),
                    ));
                }
            }
            Argument::Function(kind, args)
        }
    })
}

fn decode_args(args: &[schema::Arg]) -> ProtoResult<Vec<Argument>> {
    args.iter().map(from_proto_arg).collect()
}

fn complex(msg: &schema::ComplexArg) -> ProtoResult<Complex64> {
    let re = from_proto_arg(required("complex real part", &msg.real)?)?;
    let im = from_proto_arg(required("complex imaginary part", &msg.imag)?)?;
    Ok(Complex64::new(re.as_f64()?, im.as_f64()?))
}

fn matrix(
    context: &'static str,
    num_qubits: usize,
    entries: &[schema::ComplexArg],
    column_major: bool,
) -> ProtoResult<Array2<Complex64>> {
    if num_qubits > MAX_MATRIX_QUBITS {
        return Err(ProtoError::schema(
            context,
            format!("{num_qubits} qubits exceeds the limit of {MAX_MATRIX_QUBITS}"),
        ));
    }
    let dim = 1usize << num_qubits;
    if entries.len() != dim * dim {
        return Err(ProtoError::schema(
            context,
            format!(
                "expected {} entries for {num_qubits} qubits, got {}",
                dim * dim,
                entries.len()
            ),
        ));
    }
    let data = entries.iter().map(complex).collect::<ProtoResult<Vec<_>>>()?;
    let m = Array2::from_shape_vec((dim, dim), data).map_err(|e| ProtoError::schema(context, e.to_string()))?;
    Ok(if column_major { m.reversed_axes() } else { m })
}

/// Decode a bit string.
pub fn from_proto_bits(msg: &schema::BitVector) -> ProtoResult<BitString> {
    Ok(BitString::from_bytes(count("bit vector", msg.len)?, &msg.data)?)
}

pub(crate) fn pauli_string(msg: &schema::PauliString) -> ProtoResult<PauliString> {
    let p = PauliString::new(&msg.pauli)?;
    if count("pauli string", msg.numqubits)? != p.num_qubits() {
        return Err(ProtoError::schema(
            "pauli string",
            format!("declares {} qubits but has {} letters", msg.numqubits, p.num_qubits()),
        ));
    }
    Ok(p)
}

fn notes(msgs: &[schema::Note]) -> ProtoResult<Vec<f64>> {
    msgs.iter()
        .map(|n| {
            Ok(match required("note", &n.note)? {
                note::Note::IntNote(i) => *i as f64,
                note::Note::DoubleNote(x) => *x,
            })
        })
        .collect()
}

fn standard_gate(mtype: i32, params: Vec<Argument>) -> ProtoResult<StandardGate> {
    use StandardGate as G;
    use schema::GateType as T;
    let t = T::try_from(mtype).map_err(|_| ProtoError::unknown_tag("gate type", mtype))?;
    let z = Argument::default;
    let template = match t {
        T::Id => G::Id,
        T::X => G::X,
        T::Y => G::Y,
        T::Z => G::Z,
        T::H => G::H,
        T::Hxy => G::HXY,
        T::Hyz => G::HYZ,
        T::S => G::S,
        T::T => G::T,
        T::Delay => G::Delay(z()),
        T::U => G::U(z(), z(), z(), z()),
        T::P => G::P(z()),
        T::Rx => G::Rx(z()),
        T::Ry => G::Ry(z()),
        T::Rz => G::Rz(z()),
        T::R => G::R(z(), z()),
        T::U1 => G::U1(z()),
        T::U2 => G::U2(z(), z()),
        T::U3 => G::U3(z(), z(), z()),
        T::Swap => G::Swap,
        T::Iswap => G::ISwap,
        T::Ecr => G::ECR,
        T::Dcx => G::DCX,
        T::Rxx => G::RXX(z()),
        T::Ryy => G::RYY(z()),
        T::Rzz => G::RZZ(z()),
        T::Rzx => G::RZX(z()),
        T::XxPlusYy => G::XXPlusYY(z(), z()),
        T::XxMinusYy => G::XXMinusYY(z(), z()),
    };
    Ok(template.with_parameters(params)?)
}

fn generalized_gate(msg: &schema::GeneralizedGate) -> ProtoResult<GeneralizedGate> {
    use schema::GeneralizedType as T;
    let name = match T::try_from(msg.mtype).map_err(|_| ProtoError::unknown_tag("generalized type", msg.mtype))? {
        T::Qft => "qft",
        T::PhaseGradient => "phasegradient",
        T::PolynomialOracle => "polynomialoracle",
        T::Diffusion => "diffusion",
        T::GateRnz => "rnz",
    };
    let sizes = msg
        .qregsizes
        .iter()
        .map(|&s| count("register size", s))
        .collect::<ProtoResult<Vec<_>>>()?;
    Ok(GeneralizedGate::from_parts(name, &sizes, &decode_args(&msg.args)?)?)
}

/// Borrowed view of the gate variants, shared by the gate, operator and
/// operation unions.
enum GateMsg<'a> {
    Simple(&'a schema::SimpleGate),
    Custom(&'a schema::CustomGate),
    Generalized(&'a schema::GeneralizedGate),
    Control(&'a schema::Control),
    Power(&'a schema::Power),
    Inverse(&'a schema::Inverse),
    Parallel(&'a schema::Parallel),
    Call(&'a schema::GateCall),
    Cached(&'a schema::CachedGateCall),
    Pauli(&'a schema::PauliString),
    RPauli(&'a schema::RPauli),
}

impl<'a> GateMsg<'a> {
    fn from_gate(g: &'a gate::Gate) -> Self {
        match g {
            gate::Gate::Simplegate(m) => Self::Simple(m),
            gate::Gate::Customgate(m) => Self::Custom(m),
            gate::Gate::Generalized(m) => Self::Generalized(m),
            gate::Gate::Control(m) => Self::Control(m),
            gate::Gate::Power(m) => Self::Power(m),
            gate::Gate::Inverse(m) => Self::Inverse(m),
            gate::Gate::Parallel(m) => Self::Parallel(m),
            gate::Gate::Gatecall(m) => Self::Call(m),
            gate::Gate::Cachedgatecall(m) => Self::Cached(m),
            gate::Gate::Paulistring(m) => Self::Pauli(m),
            gate::Gate::Rpauli(m) => Self::RPauli(m),
        }
    }

    fn from_operation(op: &'a operation::Operation) -> Option<Self> {
        use operation::Operation as O;
        Some(match op {
            O::Simplegate(m) => Self::Simple(m),
            O::Customgate(m) => Self::Custom(m),
            O::Generalized(m) => Self::Generalized(m),
            O::Control(m) => Self::Control(m),
            O::Power(m) => Self::Power(m),
            O::Inverse(m) => Self::Inverse(m),
            O::Parallel(m) => Self::Parallel(m),
            O::Gatecall(m) => Self::Call(m),
            O::Cachedgatecall(m) => Self::Cached(m),
            O::Paulistring(m) => Self::Pauli(m),
            O::Rpauli(m) => Self::RPauli(m),
            _ => return None,
        })
    }

    fn from_operator(op: &'a operator::Operator) -> Option<Self> {
        use operator::Operator as O;
        Some(match op {
            O::Simplegate(m) => Self::Simple(m),
            O::Customgate(m) => Self::Custom(m),
            O::Control(m) => Self::Control(m),
            O::Power(m) => Self::Power(m),
            O::Inverse(m) => Self::Inverse(m),
            O::Parallel(m) => Self::Parallel(m),
            O::Paulistring(m) => Self::Pauli(m),
            _ => return None,
        })
    }
}

/// Stateful decoder holding the declarations rebuilt so far.
#[derive(Default)]
pub(crate) struct Decoder {
    decls: FxHashMap<u64, Arc<GateDecl>>,
}

impl Decoder {
    pub(crate) fn circuit(mut self, msg: &schema::Circuit) -> ProtoResult<Circuit> {
        self.declare(&msg.decls, &msg.declorder)?;
        let instructions = self.instructions(&msg.instructions)?;
        trace!(
            instructions = instructions.len(),
            decls = self.decls.len(),
            "decoded circuit message"
        );
        Ok(Circuit::from(instructions))
    }

    /// Rebuild the declarations listed in `order`.
    pub(crate) fn declare(&mut self, decls: &BTreeMap<u64, schema::Declaration>, order: &[u64]) -> ProtoResult<()> {
        for &id in order {
            let decl = decls.get(&id).ok_or_else(|| {
                ProtoError::schema("declaration order", format!("id {id} has no declaration"))
            })?;
            match required("declaration", &decl.declaration)? {
                declaration::Declaration::Gatedecl(g) => {
                    let rebuilt = Arc::new(self.gate_decl(g)?);
                    self.decls.insert(id, rebuilt);
                }
                // Blocks travel inline; a declared one is only validated.
                declaration::Declaration::Block(b) => {
                    self.block(b)?;
                }
            }
        }
        Ok(())
    }

    fn instructions(&self, msgs: &[schema::Instruction]) -> ProtoResult<Vec<Instruction>> {
        msgs.iter().map(|m| self.instruction(m)).collect()
    }

    fn instruction(&self, msg: &schema::Instruction) -> ProtoResult<Instruction> {
        let op = self.operation(required("instruction operation", &msg.operation)?)?;
        Ok(Instruction::new(
            op,
            targets("qubit targets", &msg.qtargets)?,
            targets("bit targets", &msg.ctargets)?,
            targets("zvar targets", &msg.ztargets)?,
        )?)
    }

    fn gate_decl(&self, msg: &schema::GateDecl) -> ProtoResult<GateDecl> {
        let arguments = msg.args.iter().map(|s| s.value.clone()).collect();
        let body = Circuit::from(self.instructions(&msg.instructions)?);
        Ok(GateDecl::new(msg.name.clone(), arguments, body)?)
    }

    fn block(&self, msg: &schema::Block) -> ProtoResult<Block> {
        Ok(Block::with_instructions(
            count("block qubits", msg.numqubits)?,
            count("block bits", msg.numbits)?,
            count("block zvars", msg.numzvars)?,
            self.instructions(&msg.instructions)?,
        )?)
    }

    fn inner_gate(&self, context: &'static str, msg: &Option<Box<schema::Gate>>) -> ProtoResult<Gate> {
        let g = required(context, msg)?;
        self.gate(required(context, &g.gate)?)
    }

    pub(crate) fn gate(&self, msg: &gate::Gate) -> ProtoResult<Gate> {
        self.gate_msg(GateMsg::from_gate(msg))
    }

    fn gate_msg(&self, msg: GateMsg<'_>) -> ProtoResult<Gate> {
        Ok(match msg {
            GateMsg::Simple(m) => standard_gate(m.mtype, decode_args(&m.parameters)?)?.into(),
            GateMsg::Custom(m) => {
                let n = count("custom gate", m.numqubits)?;
                CustomGate::new(n, matrix("custom gate", n, &m.matrix, true)?)?.into()
            }
            GateMsg::Generalized(m) => generalized_gate(m)?.into(),
            GateMsg::Control(m) => self
                .inner_gate("control", &m.operation)?
                .control(count("control", m.numcontrols)?)?,
            GateMsg::Power(m) => {
                let exponent = match required("power exponent", &m.power)? {
                    power::Power::IntVal(n) => Exponent::Int(*n),
                    power::Power::RationalVal(r) => Exponent::rational(r.num, r.den)?,
                    power::Power::DoubleVal(x) => Exponent::Double(*x),
                };
                self.inner_gate("power", &m.operation)?.power(exponent)
            }
            GateMsg::Inverse(m) => self.inner_gate("inverse", &m.operation)?.inverse(),
            GateMsg::Parallel(m) => self
                .inner_gate("parallel", &m.operation)?
                .parallel(count("parallel", m.numrepeats)?)?,
            GateMsg::Call(m) => {
                let decl = Arc::new(self.gate_decl(required("gate call declaration", &m.decl)?)?);
                decl.call(decode_args(&m.args)?)?.into()
            }
            GateMsg::Cached(m) => {
                let decl = self.decls.get(&m.id).ok_or_else(|| {
                    ProtoError::schema(
                        "cached gate call",
                        format!("declaration {} is not defined", m.id),
                    )
                })?;
                decl.call(decode_args(&m.args)?)?.into()
            }
            GateMsg::Pauli(m) => pauli_string(m)?.into(),
            GateMsg::RPauli(m) => {
                let pauli = pauli_string(required("rpauli string", &m.pauli)?)?;
                let theta = from_proto_arg(required("rpauli angle", &m.theta)?)?;
                RPauli::new(pauli, theta).into()
            }
        })
    }

    fn rescaled(&self, msg: &schema::RescaledGate) -> ProtoResult<RescaledGate> {
        let g = required("rescaled gate", &msg.operation)?;
        let g = self.gate(required("rescaled gate", &g.gate)?)?;
        let scale = from_proto_arg(required("rescaled gate scale", &msg.scale)?)?;
        Ok(RescaledGate::new(g, scale))
    }

    fn simple_operator(msg: &schema::SimpleOperator) -> ProtoResult<SimpleOperator> {
        let kind = wire_kind("operator type", &OperatorKind::ALL, msg.mtype)?;
        Ok(SimpleOperator::new(kind, decode_args(&msg.parameters)?)?)
    }

    fn custom_operator(msg: &schema::CustomOperator) -> ProtoResult<CustomOperator> {
        let n = count("custom operator", msg.numqubits)?;
        Ok(CustomOperator::new(n, matrix("custom operator", n, &msg.matrix, false)?)?)
    }

    fn operator(&self, msg: &schema::Operator) -> ProtoResult<Operator> {
        let op = required("operator", &msg.operator)?;
        if let Some(g) = GateMsg::from_operator(op) {
            return Ok(Operator::Gate(self.gate_msg(g)?));
        }
        Ok(match op {
            operator::Operator::Simpleoperator(m) => Self::simple_operator(m)?.into(),
            operator::Operator::Customoperator(m) => Self::custom_operator(m)?.into(),
            operator::Operator::Rescaledgate(m) => self.rescaled(m)?.into(),
            _ => return Err(ProtoError::schema("operator", "unexpected gate variant")),
        })
    }

    fn kraus(&self, op: &operation::Operation) -> ProtoResult<Option<KrausChannel>> {
        use operation::Operation as O;
        Ok(Some(match op {
            O::Simplekrauschannel(m) => {
                let kind = wire_kind("kraus channel type", &KrausKind::ALL, m.mtype)?;
                KrausChannel::simple(kind, decode_args(&m.parameters)?)?
            }
            O::Customkrauschannel(m) => {
                let operators = m
                    .operators
                    .iter()
                    .map(|o| self.operator(o))
                    .collect::<ProtoResult<Vec<_>>>()?;
                let channel = CustomKraus::new(operators)?;
                if channel.num_qubits() != count("kraus channel", m.numqubits)? {
                    return Err(ProtoError::schema(
                        "kraus channel",
                        format!(
                            "declares {} qubits but its operators act on {}",
                            m.numqubits,
                            channel.num_qubits()
                        ),
                    ));
                }
                KrausChannel::Custom(channel)
            }
            O::Mixedunitarychannel(m) => {
                let terms = m
                    .operators
                    .iter()
                    .map(|r| {
                        let r = self.rescaled(r)?;
                        Ok((probability_from_scale(r.scale()), r.gate().clone()))
                    })
                    .collect::<ProtoResult<Vec<_>>>()?;
                KrausChannel::MixedUnitary(MixedUnitary::new(terms)?)
            }
            O::Paulichannel(m) => {
                let paulis = m.paulistrings.iter().map(pauli_string).collect::<ProtoResult<Vec<_>>>()?;
                KrausChannel::Pauli(PauliChannel::new(decode_args(&m.probabilities)?, paulis)?)
            }
            O::Depolarizingchannel(m) => KrausChannel::depolarizing(
                count("depolarizing", m.numqubits)?,
                from_proto_arg(required("depolarizing probability", &m.probability)?)?,
            )?,
            _ => return Ok(None),
        }))
    }

    pub(crate) fn operation(&self, msg: &schema::Operation) -> ProtoResult<Operation> {
        use operation::Operation as O;
        let op = required("operation", &msg.operation)?;
        if let Some(g) = GateMsg::from_operation(op) {
            return Ok(Operation::Gate(self.gate_msg(g)?));
        }
        if let Some(channel) = self.kraus(op)? {
            return Ok(Operation::Kraus(channel));
        }
        Ok(match op {
            O::Simpleoperator(m) => Operation::Operator(Self::simple_operator(m)?.into()),
            O::Customoperator(m) => Operation::Operator(Self::custom_operator(m)?.into()),
            O::Rescaledgate(m) => Operation::Operator(self.rescaled(m)?.into()),
            O::Simpleoperation(m) => {
                let kind = wire_kind("operation type", &SimpleOpKind::ALL, m.mtype)?;
                Operation::Simple(SimpleOperation::new(kind, decode_args(&m.parameters)?)?)
            }
            O::Generalizedoperation(m) => {
                let kind = wire_kind("generalized operation type", &GeneralizedOpKind::ALL, m.mtype)?;
                // Exactly one register is sized for each kind.
                let size = count("generalized operation", m.numqubits)?
                    + count("generalized operation", m.numbits)?
                    + count("generalized operation", m.numzvars)?;
                Operation::Generalized(GeneralizedOperation::new(kind, size, decode_args(&m.parameters)?)?)
            }
            O::Simpleannotation(m) => {
                use schema::AnnotationType as A;
                let kind = match A::try_from(m.mtype).map_err(|_| ProtoError::unknown_tag("annotation type", m.mtype))? {
                    A::QubitCoordinates => AnnotationKind::QubitCoordinates,
                    A::ShiftCoordinates => AnnotationKind::ShiftCoordinates,
                    A::Tick => AnnotationKind::Tick,
                };
                Operation::Annotation(Annotation::new(kind, 0, notes(&m.notes)?)?)
            }
            O::Generalizedannotation(m) => {
                use schema::GeneralizedAnnotationType as G;
                let kind = match G::try_from(m.mtype)
                    .map_err(|_| ProtoError::unknown_tag("generalized annotation type", m.mtype))?
                {
                    G::Detector => AnnotationKind::Detector,
                    G::ObservableInclude => AnnotationKind::ObservableInclude,
                };
                let num_bits = count("generalized annotation", m.numbits)?;
                Operation::Annotation(Annotation::new(kind, num_bits, notes(&m.notes)?)?)
            }
            O::Amplitude(m) => Operation::Amplitude(from_proto_bits(required("amplitude", &m.bs)?)?),
            O::Expectationvalue(m) => {
                Operation::ExpectationValue(self.operator(required("expectation value", &m.operator)?)?)
            }
            O::Ifstatement(m) => {
                let inner = self.operation(required("if statement", &m.operation)?)?;
                let condition = from_proto_bits(required("if statement condition", &m.bitstring)?)?;
                Operation::If(IfStatement::new(inner, condition)?)
            }
            O::Block(m) => Operation::Block(Arc::new(self.block(m)?)),
            O::Repeat(m) => {
                let inner = self.operation(required("repeat", &m.operation)?)?;
                Operation::Repeat(Repeat::new(count("repeat", m.numrepeats)?, inner))
            }
            O::Readouterr(m) => Operation::ReadoutErr(ReadoutErr::new(
                from_proto_arg(required("readout error p0", &m.p0)?)?,
                from_proto_arg(required("readout error p1", &m.p1)?)?,
            )?),
            _ => return Err(ProtoError::schema("operation", "unexpected variant")),
        })
    }
}

/// Recover `p` from the `sqrt(p)` weight of a mixed unitary term.
fn probability_from_scale(scale: &Argument) -> Argument {
    match scale {
        Argument::Function(FunctionKind::Pow, args)
            if args.len() == 2 && args[1].literal() == Some(0.5) =>
        {
            args[0].clone()
        }
        other => other.clone().pow(2),
    }
}
