//! Protobuf message definitions for circuits and simulation results.
//!
//! The messages are written out with `prost` derives instead of being
//! generated from `.proto` files. Field tags follow the declaration order of
//! the schema and enum values are part of the wire contract: never renumber
//! them, only append.

use std::collections::{BTreeMap, HashMap};

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Standard gate kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum GateType {
    Id = 0,
    X = 1,
    Y = 2,
    Z = 3,
    H = 4,
    Hxy = 5,
    Hyz = 6,
    S = 7,
    T = 8,
    Delay = 9,
    U = 10,
    P = 11,
    Rx = 12,
    Ry = 13,
    Rz = 14,
    R = 15,
    U1 = 16,
    U2 = 17,
    U3 = 18,
    Swap = 19,
    Iswap = 20,
    Ecr = 21,
    Dcx = 22,
    Rxx = 23,
    Ryy = 24,
    Rzz = 25,
    Rzx = 26,
    XxPlusYy = 27,
    XxMinusYy = 28,
}

/// Register-sized gate kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum GeneralizedType {
    Qft = 0,
    PhaseGradient = 1,
    PolynomialOracle = 2,
    Diffusion = 3,
    GateRnz = 4,
}

/// Non-unitary operations on qubits, bits and z-variables.
///
/// `SetBit0` and `SetBit1` are appended after the original range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum OperationType {
    MeasureX = 0,
    MeasureY = 1,
    MeasureZ = 2,
    MeasureXx = 3,
    MeasureYy = 4,
    MeasureZz = 5,
    MeasureResetX = 6,
    MeasureResetY = 7,
    MeasureResetZ = 8,
    BondDim = 9,
    SchmidtRank = 10,
    VonNeumannEntropy = 11,
    Not = 12,
    Pow = 13,
    SetBit0 = 14,
    SetBit1 = 15,
}

/// Register-sized operations.
///
/// The classical logic kinds are appended after `Multiply`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum GeneralizedOperationType {
    Barrier = 0,
    Add = 1,
    Multiply = 2,
    And = 3,
    Or = 4,
    Xor = 5,
    ParityCheck = 6,
}

/// Built-in noise channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum KrausChannelType {
    ResetX = 0,
    ResetY = 1,
    ResetZ = 2,
    AmplitudeDamping = 3,
    GeneralizedAmplitudeDamping = 4,
    PhaseAmplitudeDamping = 5,
    ThermalNoise = 6,
    PauliX = 7,
    PauliY = 8,
    PauliZ = 9,
    ProjectiveNoiseX = 10,
    ProjectiveNoiseY = 11,
    ProjectiveNoiseZ = 12,
}

/// Built-in operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum OperatorType {
    SigmaMinus = 0,
    SigmaPlus = 1,
    Projector0 = 2,
    Projector1 = 3,
    Projector00 = 4,
    Projector01 = 5,
    Projector10 = 6,
    Projector11 = 7,
    ProjectorX0 = 8,
    ProjectorX1 = 9,
    ProjectorY0 = 10,
    ProjectorY1 = 11,
    DiagonalOp = 12,
}

/// Function nodes of symbolic arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum FunctionType {
    Add = 0,
    Mul = 1,
    Div = 2,
    Pow = 3,
    Sin = 4,
    Cos = 5,
    Tan = 6,
    Exp = 7,
    Log = 8,
    Identity = 9,
}

/// Exact irrational constants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Irrational {
    Pi = 0,
    Euler = 1,
}

/// Annotations without classical targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum AnnotationType {
    QubitCoordinates = 0,
    ShiftCoordinates = 1,
    Tick = 2,
}

/// Annotations over a variable number of bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum GeneralizedAnnotationType {
    Detector = 0,
    ObservableInclude = 1,
}

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

/// Literal argument value.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ArgValue {
    #[prost(oneof = "arg_value::Value", tags = "1, 2, 3")]
    pub value: Option<arg_value::Value>,
}

pub mod arg_value {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Value {
        #[prost(int64, tag = "1")]
        IntegerValue(i64),
        #[prost(double, tag = "2")]
        DoubleValue(f64),
        #[prost(bool, tag = "3")]
        BoolValue(bool),
    }
}

/// Named symbol.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Symbol {
    #[prost(string, tag = "1")]
    pub value: String,
}

/// Function applied to arguments.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ArgFunction {
    #[prost(enumeration = "FunctionType", tag = "1")]
    pub mtype: i32,
    #[prost(message, repeated, tag = "2")]
    pub args: Vec<Arg>,
}

/// A symbolic or numeric argument.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Arg {
    #[prost(oneof = "arg::Arg", tags = "1, 2, 3, 4")]
    pub arg: Option<arg::Arg>,
}

pub mod arg {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Arg {
        #[prost(message, tag = "1")]
        ArgvalueValue(super::ArgValue),
        #[prost(message, tag = "2")]
        SymbolValue(super::Symbol),
        #[prost(enumeration = "super::Irrational", tag = "3")]
        IrrationalValue(i32),
        #[prost(message, tag = "4")]
        ArgfunctionValue(super::ArgFunction),
    }
}

/// Complex number with symbolic parts.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ComplexArg {
    #[prost(message, optional, tag = "1")]
    pub real: Option<Arg>,
    #[prost(message, optional, tag = "2")]
    pub imag: Option<Arg>,
}

/// Annotation note.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Note {
    #[prost(oneof = "note::Note", tags = "1, 2")]
    pub note: Option<note::Note>,
}

pub mod note {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Note {
        #[prost(int64, tag = "1")]
        IntNote(i64),
        #[prost(double, tag = "2")]
        DoubleNote(f64),
    }
}

/// Packed bit string. Bit `i` is stored in byte `i / 8` at position `i % 8`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BitVector {
    #[prost(int64, tag = "1")]
    pub len: i64,
    #[prost(bytes = "vec", tag = "2")]
    pub data: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Gates
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SimpleGate {
    #[prost(enumeration = "GateType", tag = "1")]
    pub mtype: i32,
    #[prost(message, repeated, tag = "2")]
    pub parameters: Vec<Arg>,
}

/// Gate given by its matrix, stored column-major.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CustomGate {
    #[prost(int64, tag = "1")]
    pub numqubits: i64,
    #[prost(message, repeated, tag = "2")]
    pub matrix: Vec<ComplexArg>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GeneralizedGate {
    #[prost(enumeration = "GeneralizedType", tag = "1")]
    pub mtype: i32,
    #[prost(message, repeated, tag = "2")]
    pub args: Vec<Arg>,
    #[prost(int64, repeated, tag = "3")]
    pub qregsizes: Vec<i64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Control {
    #[prost(message, optional, boxed, tag = "1")]
    pub operation: Option<Box<Gate>>,
    #[prost(int64, tag = "2")]
    pub numcontrols: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Rational {
    #[prost(int64, tag = "1")]
    pub num: i64,
    #[prost(int64, tag = "2")]
    pub den: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Power {
    #[prost(message, optional, boxed, tag = "1")]
    pub operation: Option<Box<Gate>>,
    #[prost(oneof = "power::Power", tags = "2, 3, 4")]
    pub power: Option<power::Power>,
}

pub mod power {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Power {
        #[prost(double, tag = "2")]
        DoubleVal(f64),
        #[prost(message, tag = "3")]
        RationalVal(super::Rational),
        #[prost(int64, tag = "4")]
        IntVal(i64),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Inverse {
    #[prost(message, optional, boxed, tag = "1")]
    pub operation: Option<Box<Gate>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Parallel {
    #[prost(message, optional, boxed, tag = "1")]
    pub operation: Option<Box<Gate>>,
    #[prost(int64, tag = "2")]
    pub numrepeats: i64,
}

/// Named gate definition with symbolic arguments.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GateDecl {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, repeated, tag = "2")]
    pub args: Vec<Symbol>,
    #[prost(message, repeated, tag = "3")]
    pub instructions: Vec<Instruction>,
}

/// Call carrying its declaration inline.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GateCall {
    #[prost(message, optional, tag = "1")]
    pub decl: Option<GateDecl>,
    #[prost(message, repeated, tag = "2")]
    pub args: Vec<Arg>,
}

/// Call referencing an entry of [`Circuit::decls`].
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CachedGateCall {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(message, repeated, tag = "2")]
    pub args: Vec<Arg>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PauliString {
    #[prost(int64, tag = "1")]
    pub numqubits: i64,
    #[prost(string, tag = "2")]
    pub pauli: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RPauli {
    #[prost(message, optional, tag = "1")]
    pub pauli: Option<PauliString>,
    #[prost(message, optional, tag = "2")]
    pub theta: Option<Arg>,
}

/// Any unitary gate.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Gate {
    #[prost(oneof = "gate::Gate", tags = "1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11")]
    pub gate: Option<gate::Gate>,
}

pub mod gate {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Gate {
        #[prost(message, tag = "1")]
        Simplegate(super::SimpleGate),
        #[prost(message, tag = "2")]
        Customgate(super::CustomGate),
        #[prost(message, tag = "3")]
        Generalized(super::GeneralizedGate),
        #[prost(message, tag = "4")]
        Control(super::Control),
        #[prost(message, tag = "5")]
        Power(super::Power),
        #[prost(message, tag = "6")]
        Inverse(super::Inverse),
        #[prost(message, tag = "7")]
        Parallel(super::Parallel),
        #[prost(message, tag = "8")]
        Gatecall(super::GateCall),
        #[prost(message, tag = "9")]
        Cachedgatecall(super::CachedGateCall),
        #[prost(message, tag = "10")]
        Paulistring(super::PauliString),
        #[prost(message, tag = "11")]
        Rpauli(super::RPauli),
    }
}

// ---------------------------------------------------------------------------
// Operators and noise
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SimpleOperator {
    #[prost(enumeration = "OperatorType", tag = "1")]
    pub mtype: i32,
    #[prost(message, repeated, tag = "2")]
    pub parameters: Vec<Arg>,
}

/// Operator given by its matrix, stored row-major.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CustomOperator {
    #[prost(int64, tag = "1")]
    pub numqubits: i64,
    #[prost(message, repeated, tag = "2")]
    pub matrix: Vec<ComplexArg>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RescaledGate {
    #[prost(message, optional, tag = "1")]
    pub operation: Option<Gate>,
    #[prost(message, optional, tag = "2")]
    pub scale: Option<Arg>,
}

/// Any operator, including the gates usable as operators.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Operator {
    #[prost(oneof = "operator::Operator", tags = "1, 2, 3, 4, 5, 6, 7, 8, 9, 10")]
    pub operator: Option<operator::Operator>,
}

pub mod operator {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Operator {
        #[prost(message, tag = "1")]
        Simpleoperator(super::SimpleOperator),
        #[prost(message, tag = "2")]
        Customoperator(super::CustomOperator),
        #[prost(message, tag = "3")]
        Rescaledgate(super::RescaledGate),
        #[prost(message, tag = "4")]
        Simplegate(super::SimpleGate),
        #[prost(message, tag = "5")]
        Customgate(super::CustomGate),
        #[prost(message, tag = "6")]
        Control(super::Control),
        #[prost(message, tag = "7")]
        Power(super::Power),
        #[prost(message, tag = "8")]
        Inverse(super::Inverse),
        #[prost(message, tag = "9")]
        Parallel(super::Parallel),
        #[prost(message, tag = "10")]
        Paulistring(super::PauliString),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SimpleKrausChannel {
    #[prost(enumeration = "KrausChannelType", tag = "1")]
    pub mtype: i32,
    #[prost(message, repeated, tag = "2")]
    pub parameters: Vec<Arg>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CustomKrausChannel {
    #[prost(int64, tag = "1")]
    pub numqubits: i64,
    #[prost(message, repeated, tag = "2")]
    pub operators: Vec<Operator>,
}

/// Mixture of gates, each scaled by the square root of its probability.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MixedUnitaryChannel {
    #[prost(message, repeated, tag = "1")]
    pub operators: Vec<RescaledGate>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PauliChannel {
    #[prost(message, repeated, tag = "1")]
    pub probabilities: Vec<Arg>,
    #[prost(message, repeated, tag = "2")]
    pub paulistrings: Vec<PauliString>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DepolarizingChannel {
    #[prost(int64, tag = "1")]
    pub numqubits: i64,
    #[prost(message, optional, tag = "2")]
    pub probability: Option<Arg>,
}

/// Classical readout error: `p0` flips a read 0, `p1` flips a read 1.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReadoutErr {
    #[prost(message, optional, tag = "1")]
    pub p0: Option<Arg>,
    #[prost(message, optional, tag = "2")]
    pub p1: Option<Arg>,
}

// ---------------------------------------------------------------------------
// Other operations
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SimpleOperation {
    #[prost(enumeration = "OperationType", tag = "1")]
    pub mtype: i32,
    #[prost(message, repeated, tag = "2")]
    pub parameters: Vec<Arg>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GeneralizedOperation {
    #[prost(enumeration = "GeneralizedOperationType", tag = "1")]
    pub mtype: i32,
    #[prost(int64, tag = "2")]
    pub numqubits: i64,
    #[prost(int64, tag = "3")]
    pub numbits: i64,
    #[prost(int64, tag = "4")]
    pub numzvars: i64,
    #[prost(message, repeated, tag = "5")]
    pub parameters: Vec<Arg>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SimpleAnnotation {
    #[prost(enumeration = "AnnotationType", tag = "1")]
    pub mtype: i32,
    #[prost(message, repeated, tag = "2")]
    pub notes: Vec<Note>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GeneralizedAnnotation {
    #[prost(enumeration = "GeneralizedAnnotationType", tag = "1")]
    pub mtype: i32,
    #[prost(int64, tag = "2")]
    pub numqubits: i64,
    #[prost(int64, tag = "3")]
    pub numbits: i64,
    #[prost(int64, tag = "4")]
    pub numzvars: i64,
    #[prost(message, repeated, tag = "5")]
    pub notes: Vec<Note>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Amplitude {
    #[prost(message, optional, tag = "1")]
    pub bs: Option<BitVector>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ExpectationValue {
    #[prost(message, optional, tag = "1")]
    pub operator: Option<Operator>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IfStatement {
    #[prost(message, optional, boxed, tag = "1")]
    pub operation: Option<Box<Operation>>,
    #[prost(message, optional, tag = "2")]
    pub bitstring: Option<BitVector>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Block {
    #[prost(int64, tag = "1")]
    pub numqubits: i64,
    #[prost(int64, tag = "2")]
    pub numbits: i64,
    #[prost(int64, tag = "3")]
    pub numzvars: i64,
    #[prost(message, repeated, tag = "4")]
    pub instructions: Vec<Instruction>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Repeat {
    #[prost(int64, tag = "1")]
    pub numrepeats: i64,
    #[prost(message, optional, boxed, tag = "2")]
    pub operation: Option<Box<Operation>>,
}

/// Any operation. Gate, channel and operator variants are inlined rather
/// than nested in their own union.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Operation {
    #[prost(
        oneof = "operation::Operation",
        tags = "1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27, 28, 29"
    )]
    pub operation: Option<operation::Operation>,
}

pub mod operation {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Operation {
        #[prost(message, tag = "1")]
        Simplegate(super::SimpleGate),
        #[prost(message, tag = "2")]
        Customgate(super::CustomGate),
        #[prost(message, tag = "3")]
        Generalized(super::GeneralizedGate),
        #[prost(message, tag = "4")]
        Control(super::Control),
        #[prost(message, tag = "5")]
        Power(super::Power),
        #[prost(message, tag = "6")]
        Inverse(super::Inverse),
        #[prost(message, tag = "7")]
        Parallel(super::Parallel),
        #[prost(message, tag = "8")]
        Gatecall(super::GateCall),
        #[prost(message, tag = "9")]
        Cachedgatecall(super::CachedGateCall),
        #[prost(message, tag = "10")]
        Paulistring(super::PauliString),
        #[prost(message, tag = "11")]
        Rpauli(super::RPauli),
        #[prost(message, tag = "12")]
        Simplekrauschannel(super::SimpleKrausChannel),
        #[prost(message, tag = "13")]
        Customkrauschannel(super::CustomKrausChannel),
        #[prost(message, tag = "14")]
        Mixedunitarychannel(super::MixedUnitaryChannel),
        #[prost(message, tag = "15")]
        Paulichannel(super::PauliChannel),
        #[prost(message, tag = "16")]
        Depolarizingchannel(super::DepolarizingChannel),
        #[prost(message, tag = "17")]
        Simpleoperator(super::SimpleOperator),
        #[prost(message, tag = "18")]
        Customoperator(super::CustomOperator),
        #[prost(message, tag = "19")]
        Rescaledgate(super::RescaledGate),
        #[prost(message, tag = "20")]
        Simpleoperation(super::SimpleOperation),
        #[prost(message, tag = "21")]
        Generalizedoperation(super::GeneralizedOperation),
        #[prost(message, tag = "22")]
        Simpleannotation(super::SimpleAnnotation),
        #[prost(message, tag = "23")]
        Generalizedannotation(super::GeneralizedAnnotation),
        #[prost(message, tag = "24")]
        Amplitude(super::Amplitude),
        #[prost(message, tag = "25")]
        Expectationvalue(super::ExpectationValue),
        #[prost(message, tag = "26")]
        Ifstatement(super::IfStatement),
        #[prost(message, tag = "27")]
        Block(super::Block),
        #[prost(message, tag = "28")]
        Repeat(super::Repeat),
        #[prost(message, tag = "29")]
        Readouterr(super::ReadoutErr),
    }
}

// ---------------------------------------------------------------------------
// Circuits
// ---------------------------------------------------------------------------

/// Operation bound to 1-based register targets.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Instruction {
    #[prost(message, optional, tag = "1")]
    pub operation: Option<Operation>,
    #[prost(int64, repeated, tag = "2")]
    pub qtargets: Vec<i64>,
    #[prost(int64, repeated, tag = "3")]
    pub ctargets: Vec<i64>,
    #[prost(int64, repeated, tag = "4")]
    pub ztargets: Vec<i64>,
}

/// Shared definition referenced by id from the instruction list.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Declaration {
    #[prost(oneof = "declaration::Declaration", tags = "1, 2")]
    pub declaration: Option<declaration::Declaration>,
}

pub mod declaration {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Declaration {
        #[prost(message, tag = "1")]
        Gatedecl(super::GateDecl),
        #[prost(message, tag = "2")]
        Block(super::Block),
    }
}

/// Top-level circuit message.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Circuit {
    #[prost(message, repeated, tag = "1")]
    pub instructions: Vec<Instruction>,
    #[prost(btree_map = "uint64, message", tag = "2")]
    pub decls: BTreeMap<u64, Declaration>,
    /// Declaration ids in dependency order: each one only references ids
    /// listed before it.
    #[prost(uint64, repeated, tag = "3")]
    pub declorder: Vec<u64>,
}

// ---------------------------------------------------------------------------
// Hamiltonians
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HamiltonianTerm {
    #[prost(message, optional, tag = "1")]
    pub coefficient: Option<Arg>,
    #[prost(message, optional, tag = "2")]
    pub pauli: Option<PauliString>,
    #[prost(int64, repeated, tag = "3")]
    pub qubits: Vec<i64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Hamiltonian {
    #[prost(message, repeated, tag = "1")]
    pub terms: Vec<HamiltonianTerm>,
}

// ---------------------------------------------------------------------------
// Noise models
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GlobalReadoutNoise {
    #[prost(message, optional, tag = "1")]
    pub noise: Option<Operation>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QubitReadoutNoise {
    #[prost(message, optional, tag = "1")]
    pub noise: Option<Operation>,
    #[prost(int64, repeated, tag = "2")]
    pub qubits: Vec<i64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GateInstanceNoise {
    #[prost(message, optional, tag = "1")]
    pub gate: Option<Operation>,
    #[prost(message, optional, tag = "2")]
    pub noise: Option<Operation>,
    #[prost(bool, tag = "3")]
    pub before: bool,
    /// Empty for rules without a qubit restriction.
    #[prost(int64, repeated, tag = "4")]
    pub qubits: Vec<i64>,
}

/// Idle noise, optionally parametrized by the delay duration. At most one
/// variable is used.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IdleRelation {
    #[prost(message, repeated, tag = "1")]
    pub variables: Vec<Arg>,
    #[prost(message, optional, tag = "2")]
    pub operation: Option<Operation>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IdleNoise {
    #[prost(message, optional, tag = "1")]
    pub relation: Option<IdleRelation>,
    /// Empty for rules without a qubit restriction.
    #[prost(int64, repeated, tag = "2")]
    pub qubits: Vec<i64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NoiseRule {
    #[prost(oneof = "noise_rule::Kind", tags = "1, 2, 3, 4, 5, 6, 7, 8")]
    pub kind: Option<noise_rule::Kind>,
}

pub mod noise_rule {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Kind {
        #[prost(message, tag = "1")]
        GlobalReadout(super::GlobalReadoutNoise),
        #[prost(message, tag = "2")]
        ExactQubitReadout(super::QubitReadoutNoise),
        #[prost(message, tag = "3")]
        SetQubitReadout(super::QubitReadoutNoise),
        #[prost(message, tag = "4")]
        GateInstanceNoise(super::GateInstanceNoise),
        #[prost(message, tag = "5")]
        ExactGateInstanceNoise(super::GateInstanceNoise),
        #[prost(message, tag = "6")]
        SetGateInstanceNoise(super::GateInstanceNoise),
        #[prost(message, tag = "7")]
        IdleNoise(super::IdleNoise),
        #[prost(message, tag = "8")]
        SetIdleNoise(super::IdleNoise),
    }
}

/// Noise model. Gate declarations used by rule patterns or noise are
/// stored as in [`Circuit`].
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NoiseModel {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, repeated, tag = "2")]
    pub rules: Vec<NoiseRule>,
    #[prost(btree_map = "uint64, message", tag = "3")]
    pub decls: BTreeMap<u64, Declaration>,
    #[prost(uint64, repeated, tag = "4")]
    pub declorder: Vec<u64>,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ComplexDouble {
    #[prost(double, tag = "1")]
    pub real: f64,
    #[prost(double, tag = "2")]
    pub imag: f64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ComplexVector {
    #[prost(message, repeated, tag = "1")]
    pub data: Vec<ComplexDouble>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AmplitudeEntry {
    #[prost(message, optional, tag = "1")]
    pub key: Option<BitVector>,
    #[prost(message, optional, tag = "2")]
    pub val: Option<ComplexDouble>,
}

/// Results of executing one or more circuits.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QcsResults {
    #[prost(string, tag = "1")]
    pub simulator: String,
    #[prost(string, tag = "2")]
    pub version: String,
    #[prost(double, repeated, tag = "3")]
    pub fidelities: Vec<f64>,
    #[prost(double, repeated, tag = "4")]
    pub avggateerrors: Vec<f64>,
    #[prost(message, repeated, tag = "5")]
    pub cstates: Vec<BitVector>,
    #[prost(message, repeated, tag = "6")]
    pub zstates: Vec<ComplexVector>,
    #[prost(map = "string, double", tag = "7")]
    pub timings: HashMap<String, f64>,
    #[prost(message, repeated, tag = "8")]
    pub amplitudes: Vec<AmplitudeEntry>,
}
