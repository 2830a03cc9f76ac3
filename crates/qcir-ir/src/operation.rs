//! The closed set of operations an instruction can carry.
//!
//! Every operation declares how many qubits, classical bits and complex
//! z-variables it touches. Gates are the unitary subset; everything else
//! (measurements, noise, classical logic, statistics, annotations) is
//! layered around them.

use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::argument::Argument;
use crate::bitstring::BitString;
use crate::block::Block;
use crate::error::{IrError, IrResult};
use crate::gate::{Gate, StandardGate};
use crate::instruction::Instruction;
use crate::matrix;
use crate::noise::{KrausChannel, KrausKind, ReadoutErr, SimpleKraus};
use crate::operator::Operator;

/// Built-in operations with a fixed arity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimpleOpKind {
    /// Measure in the X basis.
    MeasureX,
    /// Measure in the Y basis.
    MeasureY,
    /// Measure in the Z basis.
    MeasureZ,
    /// Measure the two-qubit XX parity.
    MeasureXX,
    /// Measure the two-qubit YY parity.
    MeasureYY,
    /// Measure the two-qubit ZZ parity.
    MeasureZZ,
    /// Measure in the X basis and prepare `|+⟩`.
    MeasureResetX,
    /// Measure in the Y basis and prepare `|+i⟩`.
    MeasureResetY,
    /// Measure in the Z basis and prepare `|0⟩`.
    MeasureResetZ,
    /// Bond dimension across the cut after a qubit.
    BondDim,
    /// Schmidt rank across the cut after a qubit.
    SchmidtRank,
    /// Von Neumann entropy of the reduced state of a qubit.
    VonNeumannEntropy,
    /// Classical NOT of one bit.
    Not,
    /// Raise a z-variable to a power.
    Pow,
    /// Clear a bit.
    SetBit0,
    /// Set a bit.
    SetBit1,
}

impl SimpleOpKind {
    /// All kinds, in wire order.
    pub const ALL: [SimpleOpKind; 16] = [
        SimpleOpKind::MeasureX,
        SimpleOpKind::MeasureY,
        SimpleOpKind::MeasureZ,
        SimpleOpKind::MeasureXX,
        SimpleOpKind::MeasureYY,
        SimpleOpKind::MeasureZZ,
        SimpleOpKind::MeasureResetX,
        SimpleOpKind::MeasureResetY,
        SimpleOpKind::MeasureResetZ,
        SimpleOpKind::BondDim,
        SimpleOpKind::SchmidtRank,
        SimpleOpKind::VonNeumannEntropy,
        SimpleOpKind::Not,
        SimpleOpKind::Pow,
        SimpleOpKind::SetBit0,
        SimpleOpKind::SetBit1,
    ];

    /// Operation name.
    pub fn name(self) -> &'static str {
        match self {
            SimpleOpKind::MeasureX => "mx",
            SimpleOpKind::MeasureY => "my",
            SimpleOpKind::MeasureZ => "measure",
            SimpleOpKind::MeasureXX => "mxx",
            SimpleOpKind::MeasureYY => "myy",
            SimpleOpKind::MeasureZZ => "mzz",
            SimpleOpKind::MeasureResetX => "mrx",
            SimpleOpKind::MeasureResetY => "mry",
            SimpleOpKind::MeasureResetZ => "mrz",
            SimpleOpKind::BondDim => "bonddim",
            SimpleOpKind::SchmidtRank => "schmidtrank",
            SimpleOpKind::VonNeumannEntropy => "vonneumannentropy",
            SimpleOpKind::Not => "not",
            SimpleOpKind::Pow => "pow",
            SimpleOpKind::SetBit0 => "setbit0",
            SimpleOpKind::SetBit1 => "setbit1",
        }
    }

    /// Number of qubits.
    pub fn num_qubits(self) -> usize {
        match self {
            SimpleOpKind::MeasureXX | SimpleOpKind::MeasureYY | SimpleOpKind::MeasureZZ => 2,
            SimpleOpKind::Not | SimpleOpKind::Pow | SimpleOpKind::SetBit0 | SimpleOpKind::SetBit1 => 0,
            _ => 1,
        }
    }

    /// Number of classical bits.
    pub fn num_bits(self) -> usize {
        match self {
            SimpleOpKind::BondDim
            | SimpleOpKind::SchmidtRank
            | SimpleOpKind::VonNeumannEntropy
            | SimpleOpKind::Pow => 0,
            _ => 1,
        }
    }

    /// Number of z-variables.
    pub fn num_zvars(self) -> usize {
        match self {
            SimpleOpKind::BondDim
            | SimpleOpKind::SchmidtRank
            | SimpleOpKind::VonNeumannEntropy
            | SimpleOpKind::Pow => 1,
            _ => 0,
        }
    }

    /// Number of parameters.
    pub fn num_parameters(self) -> usize {
        match self {
            SimpleOpKind::Pow => 1,
            _ => 0,
        }
    }

    /// Whether the operation samples the quantum state.
    pub fn is_measurement(self) -> bool {
        matches!(
            self,
            SimpleOpKind::MeasureX
                | SimpleOpKind::MeasureY
                | SimpleOpKind::MeasureZ
                | SimpleOpKind::MeasureXX
                | SimpleOpKind::MeasureYY
                | SimpleOpKind::MeasureZZ
                | SimpleOpKind::MeasureResetX
                | SimpleOpKind::MeasureResetY
                | SimpleOpKind::MeasureResetZ
        )
    }
}

/// A fixed-arity operation with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SimpleOperationRepr")]
pub struct SimpleOperation {
    kind: SimpleOpKind,
    params: Vec<Argument>,
}

#[derive(Deserialize)]
struct SimpleOperationRepr {
    kind: SimpleOpKind,
    params: Vec<Argument>,
}

impl TryFrom<SimpleOperationRepr> for SimpleOperation {
    type Error = IrError;

    fn try_from(r: SimpleOperationRepr) -> IrResult<Self> {
        SimpleOperation::new(r.kind, r.params)
    }
}

impl SimpleOperation {
    /// Create an operation, checking the parameter count.
    pub fn new(kind: SimpleOpKind, params: Vec<Argument>) -> IrResult<Self> {
        if params.len() != kind.num_parameters() {
            return Err(IrError::invalid(
                kind.name(),
                format!(
                    "expects {} parameters, got {}",
                    kind.num_parameters(),
                    params.len()
                ),
            ));
        }
        Ok(Self { kind, params })
    }

    /// Operation with default parameters (exponent 1 for [`SimpleOpKind::Pow`]).
    pub fn unit(kind: SimpleOpKind) -> Self {
        Self {
            kind,
            params: vec![Argument::Integer(1); kind.num_parameters()],
        }
    }

    /// The operation kind.
    pub fn kind(&self) -> SimpleOpKind {
        self.kind
    }

    /// The parameters.
    pub fn parameters(&self) -> &[Argument] {
        &self.params
    }
}

/// Operations whose register size is chosen at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeneralizedOpKind {
    /// Optimization barrier over `n` qubits.
    Barrier,
    /// `z[0] += c + z[1] + …`.
    Add,
    /// `z[0] *= c · z[1] · …`.
    Multiply,
    /// `c[0] = c[1] ∧ …`.
    And,
    /// `c[0] = c[1] ∨ …`.
    Or,
    /// `c[0] = c[1] ⊕ …`.
    Xor,
    /// `c[0]` = parity of the input bits.
    ParityCheck,
}

impl GeneralizedOpKind {
    /// All kinds, in wire order.
    pub const ALL: [GeneralizedOpKind; 7] = [
        GeneralizedOpKind::Barrier,
        GeneralizedOpKind::Add,
        GeneralizedOpKind::Multiply,
        GeneralizedOpKind::And,
        GeneralizedOpKind::Or,
        GeneralizedOpKind::Xor,
        GeneralizedOpKind::ParityCheck,
    ];

    /// Operation name.
    pub fn name(self) -> &'static str {
        match self {
            GeneralizedOpKind::Barrier => "barrier",
            GeneralizedOpKind::Add => "add",
            GeneralizedOpKind::Multiply => "multiply",
            GeneralizedOpKind::And => "and",
            GeneralizedOpKind::Or => "or",
            GeneralizedOpKind::Xor => "xor",
            GeneralizedOpKind::ParityCheck => "paritycheck",
        }
    }

    /// Number of parameters.
    pub fn num_parameters(self) -> usize {
        match self {
            GeneralizedOpKind::Add | GeneralizedOpKind::Multiply => 1,
            _ => 0,
        }
    }

    fn is_logic(self) -> bool {
        matches!(
            self,
            GeneralizedOpKind::And
                | GeneralizedOpKind::Or
                | GeneralizedOpKind::Xor
                | GeneralizedOpKind::ParityCheck
        )
    }
}

/// A variable-size operation.
///
/// `size` counts the qubits of a barrier, the z-variables of `Add` and
/// `Multiply`, and the bits (destination included) of the logic operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GeneralizedOperationRepr")]
pub struct GeneralizedOperation {
    kind: GeneralizedOpKind,
    size: usize,
    params: Vec<Argument>,
}

#[derive(Deserialize)]
struct GeneralizedOperationRepr {
    kind: GeneralizedOpKind,
    size: usize,
    params: Vec<Argument>,
}

impl TryFrom<GeneralizedOperationRepr> for GeneralizedOperation {
    type Error = IrError;

    fn try_from(r: GeneralizedOperationRepr) -> IrResult<Self> {
        GeneralizedOperation::new(r.kind, r.size, r.params)
    }
}

impl GeneralizedOperation {
    /// Barrier over `n` qubits.
    pub fn barrier(n: usize) -> IrResult<Self> {
        Self::new(GeneralizedOpKind::Barrier, n, vec![])
    }

    /// Add `n - 1` z-variables and the constant `c` into the first.
    pub fn add(n: usize, c: impl Into<Argument>) -> IrResult<Self> {
        Self::new(GeneralizedOpKind::Add, n, vec![c.into()])
    }

    /// Multiply `n - 1` z-variables and the constant `c` into the first.
    pub fn multiply(n: usize, c: impl Into<Argument>) -> IrResult<Self> {
        Self::new(GeneralizedOpKind::Multiply, n, vec![c.into()])
    }

    /// Logic operation over `inputs` input bits writing one destination bit.
    pub fn logic(kind: GeneralizedOpKind, inputs: usize) -> IrResult<Self> {
        if !kind.is_logic() {
            return Err(IrError::invalid(kind.name(), "is not a logic operation"));
        }
        Self::new(kind, inputs + 1, vec![])
    }

    /// Create from the kind, its register size and its parameters.
    pub fn new(kind: GeneralizedOpKind, size: usize, params: Vec<Argument>) -> IrResult<Self> {
        let min = if kind.is_logic() { 2 } else { 1 };
        if size < min {
            return Err(IrError::invalid(
                kind.name(),
                format!("register size must be at least {min}, got {size}"),
            ));
        }
        if params.len() != kind.num_parameters() {
            return Err(IrError::invalid(
                kind.name(),
                format!(
                    "expects {} parameters, got {}",
                    kind.num_parameters(),
                    params.len()
                ),
            ));
        }
        Ok(Self { kind, size, params })
    }

    /// The operation kind.
    pub fn kind(&self) -> GeneralizedOpKind {
        self.kind
    }

    /// Register size.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The parameters.
    pub fn parameters(&self) -> &[Argument] {
        &self.params
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        match self.kind {
            GeneralizedOpKind::Barrier => self.size,
            _ => 0,
        }
    }

    /// Number of bits.
    pub fn num_bits(&self) -> usize {
        if self.kind.is_logic() { self.size } else { 0 }
    }

    /// Number of z-variables.
    pub fn num_zvars(&self) -> usize {
        match self.kind {
            GeneralizedOpKind::Add | GeneralizedOpKind::Multiply => self.size,
            _ => 0,
        }
    }
}

/// Annotation kinds. They carry metadata for decoders and leave the state untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationKind {
    /// Coordinates of one qubit.
    QubitCoordinates,
    /// Offset applied to subsequent coordinates.
    ShiftCoordinates,
    /// Time step separator.
    Tick,
    /// Parity of a set of measurement bits.
    Detector,
    /// Bits contributing to a logical observable.
    ObservableInclude,
}

impl AnnotationKind {
    /// Annotation name.
    pub fn name(self) -> &'static str {
        match self {
            AnnotationKind::QubitCoordinates => "qubitcoordinates",
            AnnotationKind::ShiftCoordinates => "shiftcoordinates",
            AnnotationKind::Tick => "tick",
            AnnotationKind::Detector => "detector",
            AnnotationKind::ObservableInclude => "observableinclude",
        }
    }

    /// Whether the annotation is sized over classical bits.
    pub fn is_generalized(self) -> bool {
        matches!(self, AnnotationKind::Detector | AnnotationKind::ObservableInclude)
    }
}

/// An annotation with its numeric notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AnnotationRepr")]
pub struct Annotation {
    kind: AnnotationKind,
    num_bits: usize,
    notes: Vec<f64>,
}

#[derive(Deserialize)]
struct AnnotationRepr {
    kind: AnnotationKind,
    num_bits: usize,
    notes: Vec<f64>,
}

impl TryFrom<AnnotationRepr> for Annotation {
    type Error = IrError;

    fn try_from(r: AnnotationRepr) -> IrResult<Self> {
        Annotation::new(r.kind, r.num_bits, r.notes)
    }
}

impl Annotation {
    /// Coordinates of a single qubit.
    pub fn qubit_coordinates(notes: Vec<f64>) -> Self {
        Self {
            kind: AnnotationKind::QubitCoordinates,
            num_bits: 0,
            notes,
        }
    }

    /// Coordinate shift.
    pub fn shift_coordinates(notes: Vec<f64>) -> Self {
        Self {
            kind: AnnotationKind::ShiftCoordinates,
            num_bits: 0,
            notes,
        }
    }

    /// Tick marker.
    pub fn tick() -> Self {
        Self {
            kind: AnnotationKind::Tick,
            num_bits: 0,
            notes: vec![],
        }
    }

    /// Detector over `num_bits` bits.
    pub fn detector(num_bits: usize, notes: Vec<f64>) -> IrResult<Self> {
        Self::new(AnnotationKind::Detector, num_bits, notes)
    }

    /// Observable inclusion of `num_bits` bits.
    pub fn observable_include(num_bits: usize, notes: Vec<f64>) -> IrResult<Self> {
        Self::new(AnnotationKind::ObservableInclude, num_bits, notes)
    }

    /// Create from the kind, its bit count and its notes.
    pub fn new(kind: AnnotationKind, num_bits: usize, notes: Vec<f64>) -> IrResult<Self> {
        match (kind.is_generalized(), num_bits) {
            (true, 0) => Err(IrError::invalid(kind.name(), "needs at least one bit")),
            (false, n) if n > 0 => Err(IrError::invalid(kind.name(), "does not act on bits")),
            _ => Ok(Self {
                kind,
                num_bits,
                notes,
            }),
        }
    }

    /// The annotation kind.
    pub fn kind(&self) -> AnnotationKind {
        self.kind
    }

    /// Notes attached to the annotation.
    pub fn notes(&self) -> &[f64] {
        &self.notes
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        match self.kind {
            AnnotationKind::QubitCoordinates => 1,
            _ => 0,
        }
    }

    /// Number of bits.
    pub fn num_bits(&self) -> usize {
        self.num_bits
    }
}

/// A gate applied only when the condition bits match a bit string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStatement {
    gate: Gate,
    condition: BitString,
}

impl IfStatement {
    /// Condition `op` on `condition`. Only gates can be conditioned.
    pub fn new(op: impl Into<Operation>, condition: BitString) -> IrResult<Self> {
        match op.into() {
            Operation::Gate(gate) => Ok(Self { gate, condition }),
            other => Err(IrError::NonUnitaryCondition(other.name().to_string())),
        }
    }

    /// The conditioned gate.
    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    /// The required value of the condition bits.
    pub fn condition(&self) -> &BitString {
        &self.condition
    }
}

/// An operation applied `num_repeats` times on the same targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repeat {
    num_repeats: usize,
    operation: Box<Operation>,
}

impl Repeat {
    /// Repeat `op` `num_repeats` times.
    pub fn new(num_repeats: usize, op: impl Into<Operation>) -> Self {
        Self {
            num_repeats,
            operation: Box::new(op.into()),
        }
    }

    /// Number of repetitions.
    pub fn num_repeats(&self) -> usize {
        self.num_repeats
    }

    /// The repeated operation.
    pub fn operation(&self) -> &Operation {
        &self.operation
    }
}

/// An operation of any kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// A unitary gate.
    Gate(Gate),
    /// A noise channel, resets included.
    Kraus(KrausChannel),
    /// A bare operator.
    Operator(Operator),
    /// Fixed-arity measurements, classical and statistical operations.
    Simple(SimpleOperation),
    /// Variable-size barrier, arithmetic and logic.
    Generalized(GeneralizedOperation),
    /// Metadata for decoders.
    Annotation(Annotation),
    /// Amplitude of a basis state, written to one z-variable.
    Amplitude(BitString),
    /// Expectation value of an operator, written to one z-variable.
    ExpectationValue(Operator),
    /// Classically conditioned gate.
    If(IfStatement),
    /// A fixed-size sub-circuit.
    Block(Arc<Block>),
    /// Repetition of an operation.
    Repeat(Repeat),
    /// Classical readout error on one measured bit.
    ReadoutErr(ReadoutErr),
}

impl Operation {
    /// Simple operation with default parameters.
    pub fn simple(kind: SimpleOpKind) -> Operation {
        Operation::Simple(SimpleOperation::unit(kind))
    }

    /// Z-basis measurement.
    pub fn measure() -> Operation {
        Operation::simple(SimpleOpKind::MeasureZ)
    }

    /// Reset to `|0⟩`.
    pub fn reset() -> Operation {
        Operation::Kraus(KrausChannel::Simple(SimpleKraus::reset()))
    }

    /// Barrier over `n` qubits.
    pub fn barrier(n: usize) -> IrResult<Operation> {
        GeneralizedOperation::barrier(n).map(Operation::Generalized)
    }

    /// Raise a z-variable to `exponent`.
    pub fn pow(exponent: impl Into<Argument>) -> Operation {
        Operation::Simple(SimpleOperation {
            kind: SimpleOpKind::Pow,
            params: vec![exponent.into()],
        })
    }

    /// Expectation value of `op`.
    pub fn expectation_value(op: impl Into<Operator>) -> Operation {
        Operation::ExpectationValue(op.into())
    }

    /// Get the name of this operation.
    pub fn name(&self) -> &str {
        match self {
            Operation::Gate(g) => g.name(),
            Operation::Kraus(k) => k.name(),
            Operation::Operator(o) => o.name(),
            Operation::Simple(s) => s.kind.name(),
            Operation::Generalized(g) => g.kind.name(),
            Operation::Annotation(a) => a.kind.name(),
            Operation::Amplitude(_) => "amplitude",
            Operation::ExpectationValue(_) => "expectationvalue",
            Operation::If(_) => "if",
            Operation::Block(_) => "block",
            Operation::Repeat(_) => "repeat",
            Operation::ReadoutErr(_) => "readouterr",
        }
    }

    /// Number of qubit targets.
    pub fn num_qubits(&self) -> usize {
        match self {
            Operation::Gate(g) => g.num_qubits(),
            Operation::Kraus(k) => k.num_qubits(),
            Operation::Operator(o) | Operation::ExpectationValue(o) => o.num_qubits(),
            Operation::Simple(s) => s.kind.num_qubits(),
            Operation::Generalized(g) => g.num_qubits(),
            Operation::Annotation(a) => a.num_qubits(),
            Operation::Amplitude(_) | Operation::ReadoutErr(_) => 0,
            Operation::If(s) => s.gate.num_qubits(),
            Operation::Block(b) => b.num_qubits(),
            Operation::Repeat(r) => r.operation.num_qubits(),
        }
    }

    /// Number of classical bit targets.
    pub fn num_bits(&self) -> usize {
        match self {
            Operation::Simple(s) => s.kind.num_bits(),
            Operation::Generalized(g) => g.num_bits(),
            Operation::Annotation(a) => a.num_bits(),
            Operation::If(s) => s.condition.len(),
            Operation::Block(b) => b.num_bits(),
            Operation::Repeat(r) => r.operation.num_bits(),
            Operation::ReadoutErr(_) => 1,
            _ => 0,
        }
    }

    /// Number of z-variable targets.
    pub fn num_zvars(&self) -> usize {
        match self {
            Operation::Simple(s) => s.kind.num_zvars(),
            Operation::Generalized(g) => g.num_zvars(),
            Operation::Amplitude(_) | Operation::ExpectationValue(_) => 1,
            Operation::Block(b) => b.num_zvars(),
            Operation::Repeat(r) => r.operation.num_zvars(),
            _ => 0,
        }
    }

    /// Total number of targets.
    pub fn num_targets(&self) -> usize {
        self.num_qubits() + self.num_bits() + self.num_zvars()
    }

    /// Parameters, including those of nested operations.
    pub fn parameters(&self) -> Vec<Argument> {
        match self {
            Operation::Gate(g) => g.parameters(),
            Operation::Kraus(k) => k.parameters(),
            Operation::Operator(o) | Operation::ExpectationValue(o) => o.parameters(),
            Operation::Simple(s) => s.params.clone(),
            Operation::Generalized(g) => g.params.clone(),
            Operation::Annotation(_) | Operation::Amplitude(_) => vec![],
            Operation::If(s) => s.gate.parameters(),
            Operation::Block(b) => b
                .instructions()
                .iter()
                .flat_map(|i| i.operation().parameters())
                .collect(),
            Operation::Repeat(r) => r.operation.parameters(),
            Operation::ReadoutErr(e) => e.parameters(),
        }
    }

    /// Free symbols appearing in the parameters.
    pub fn symbols(&self) -> BTreeSet<String> {
        let mut set = BTreeSet::new();
        for p in self.parameters() {
            p.collect_symbols(&mut set);
        }
        set
    }

    /// Check whether any parameter is symbolic.
    pub fn is_symbolic(&self) -> bool {
        self.parameters().iter().any(Argument::is_symbolic)
    }

    /// Whether the operation is a unitary transformation of the qubits.
    pub fn is_unitary(&self) -> bool {
        match self {
            Operation::Gate(_) => true,
            Operation::Block(b) => b.instructions().iter().all(|i| i.operation().is_unitary()),
            Operation::Repeat(r) => r.operation.is_unitary(),
            _ => false,
        }
    }

    /// The gate, when the operation is one.
    pub fn as_gate(&self) -> Option<&Gate> {
        match self {
            Operation::Gate(g) => Some(g),
            _ => None,
        }
    }

    /// Inverse operation.
    ///
    /// Gates, conditioned gates, blocks and repeats of invertible content
    /// invert. Barriers, annotations and `Not` are their own inverse.
    /// Measurements, resets, noise and statistics are not invertible.
    pub fn inverse(&self) -> IrResult<Operation> {
        match self {
            Operation::Gate(g) => Ok(Operation::Gate(g.inverse())),
            Operation::If(s) => Ok(Operation::If(IfStatement {
                gate: s.gate.inverse(),
                condition: s.condition.clone(),
            })),
            Operation::Block(b) => Ok(Operation::Block(Arc::new(b.inverse()?))),
            Operation::Repeat(r) => Ok(Operation::Repeat(Repeat {
                num_repeats: r.num_repeats,
                operation: Box::new(r.operation.inverse()?),
            })),
            Operation::Generalized(g) if g.kind == GeneralizedOpKind::Barrier => Ok(self.clone()),
            Operation::Annotation(_) => Ok(self.clone()),
            Operation::Simple(s) => match s.kind {
                SimpleOpKind::Not => Ok(self.clone()),
                SimpleOpKind::Pow => {
                    let e = &s.params[0];
                    if matches!(e.literal(), Some(v) if v == 0.0) {
                        return Err(IrError::NotInvertible("pow(0)".into()));
                    }
                    Ok(Operation::pow(Argument::Integer(1) / e.clone()))
                }
                _ => Err(IrError::NotInvertible(self.name().to_string())),
            },
            _ => Err(IrError::NotInvertible(self.name().to_string())),
        }
    }

    /// Rebuild with every argument passed through `f`.
    pub fn map_arguments(&self, f: &impl Fn(&Argument) -> Argument) -> Operation {
        match self {
            Operation::Gate(g) => Operation::Gate(g.map_arguments(f)),
            Operation::Kraus(k) => Operation::Kraus(k.map_arguments(f)),
            Operation::Operator(o) => Operation::Operator(o.map_arguments(f)),
            Operation::ExpectationValue(o) => Operation::ExpectationValue(o.map_arguments(f)),
            Operation::Simple(s) => Operation::Simple(SimpleOperation {
                kind: s.kind,
                params: s.params.iter().map(f).collect(),
            }),
            Operation::Generalized(g) => Operation::Generalized(GeneralizedOperation {
                kind: g.kind,
                size: g.size,
                params: g.params.iter().map(f).collect(),
            }),
            Operation::Annotation(_) | Operation::Amplitude(_) => self.clone(),
            Operation::If(s) => Operation::If(IfStatement {
                gate: s.gate.map_arguments(f),
                condition: s.condition.clone(),
            }),
            Operation::Block(b) => Operation::Block(Arc::new(b.map_arguments(f))),
            Operation::Repeat(r) => Operation::Repeat(Repeat {
                num_repeats: r.num_repeats,
                operation: Box::new(r.operation.map_arguments(f)),
            }),
            Operation::ReadoutErr(e) => Operation::ReadoutErr(e.map_arguments(f)),
        }
    }

    /// Substitute symbol bindings in every argument.
    pub fn substitute(&self, bindings: &HashMap<String, Argument>) -> Operation {
        self.map_arguments(&|a| a.substitute(bindings))
    }

    /// Dense unitary of a gate-like operation.
    pub fn matrix(&self) -> IrResult<Array2<Complex64>> {
        match self {
            Operation::Gate(g) => g.matrix(),
            Operation::Repeat(r) => {
                let m = r.operation.matrix()?;
                let n = i64::try_from(r.num_repeats)
                    .map_err(|_| IrError::Domain("repeat count too large".into()))?;
                Ok(matrix::matrix_power(&m, n))
            }
            Operation::Block(b) if self.is_unitary() => b.to_circuit().matrix(),
            _ => Err(IrError::unsupported(self.name(), "matrix")),
        }
    }

    /// Rewrite of a non-Z-basis measurement or reset into Z-basis primitives
    /// and gates, on local targets. `None` when the operation is already
    /// primitive.
    pub(crate) fn z_basis_expansion(&self) -> IrResult<Option<Vec<Instruction>>> {
        use StandardGate as G;
        let gate = |g: G, q: &[usize]| Instruction::new(Operation::Gate(g.into()), q.to_vec(), vec![], vec![]);
        let cx = |c: usize, t: usize| {
            Instruction::new(
                Operation::Gate(Gate::from(G::X).control(1)?),
                vec![c, t],
                vec![],
                vec![],
            )
        };
        let op = |kind: SimpleOpKind, q: &[usize]| {
            Instruction::new(Operation::simple(kind), q.to_vec(), vec![0], vec![])
        };
        let sandwich = |basis: G, inner: Instruction| -> IrResult<Vec<Instruction>> {
            Ok(vec![gate(basis.clone(), &[0])?, inner, gate(basis, &[0])?])
        };
        let out = match self {
            Operation::Simple(s) => match s.kind {
                SimpleOpKind::MeasureX => sandwich(G::H, op(SimpleOpKind::MeasureZ, &[0])?)?,
                SimpleOpKind::MeasureY => sandwich(G::HYZ, op(SimpleOpKind::MeasureZ, &[0])?)?,
                SimpleOpKind::MeasureZZ => vec![
                    cx(0, 1)?,
                    op(SimpleOpKind::MeasureZ, &[1])?,
                    cx(0, 1)?,
                ],
                SimpleOpKind::MeasureXX => vec![
                    cx(0, 1)?,
                    gate(G::H, &[0])?,
                    op(SimpleOpKind::MeasureZ, &[0])?,
                    gate(G::H, &[0])?,
                    cx(0, 1)?,
                ],
                SimpleOpKind::MeasureYY => {
                    let sdg = || G::P(-Argument::pi_frac(1, 2));
                    vec![
                        gate(sdg(), &[0])?,
                        gate(sdg(), &[1])?,
                        op(SimpleOpKind::MeasureXX, &[0, 1])?,
                        gate(G::S, &[0])?,
                        gate(G::S, &[1])?,
                    ]
                }
                SimpleOpKind::MeasureResetZ => vec![
                    op(SimpleOpKind::MeasureZ, &[0])?,
                    Instruction::new(
                        Operation::If(IfStatement {
                            gate: G::X.into(),
                            condition: BitString::from_bits(vec![true]),
                        }),
                        vec![0],
                        vec![0],
                        vec![],
                    )?,
                ],
                SimpleOpKind::MeasureResetX => {
                    sandwich(G::H, op(SimpleOpKind::MeasureResetZ, &[0])?)?
                }
                SimpleOpKind::MeasureResetY => {
                    sandwich(G::HYZ, op(SimpleOpKind::MeasureResetZ, &[0])?)?
                }
                _ => return Ok(None),
            },
            Operation::Kraus(KrausChannel::Simple(k)) => {
                let basis = match k.kind() {
                    KrausKind::ResetX => G::H,
                    KrausKind::ResetY => G::HYZ,
                    _ => return Ok(None),
                };
                sandwich(
                    basis,
                    Instruction::new(Operation::reset(), vec![0], vec![], vec![])?,
                )?
            }
            _ => return Ok(None),
        };
        Ok(Some(out))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Gate(g) => write!(f, "{g}"),
            Operation::Kraus(k) => write!(f, "{k}"),
            Operation::Operator(o) => write!(f, "{o}"),
            Operation::Simple(s) if s.params.is_empty() => write!(f, "{}", s.kind.name()),
            Operation::Simple(s) => {
                let p: Vec<String> = s.params.iter().map(ToString::to_string).collect();
                write!(f, "{}({})", s.kind.name(), p.join(", "))
            }
            Operation::Generalized(g) => {
                let mut parts = vec![g.size.to_string()];
                parts.extend(g.params.iter().map(ToString::to_string));
                write!(f, "{}({})", g.kind.name(), parts.join(", "))
            }
            Operation::Annotation(a) => {
                let notes: Vec<String> = a.notes.iter().map(ToString::to_string).collect();
                write!(f, "{}({})", a.kind.name(), notes.join(", "))
            }
            Operation::Amplitude(bs) => write!(f, "amplitude({bs})"),
            Operation::ExpectationValue(o) => write!(f, "⟨{o}⟩"),
            Operation::If(s) => write!(f, "if(c == {}) {}", s.condition, s.gate),
            Operation::Block(b) => write!(
                f,
                "block({}, {}, {}; {} instructions)",
                b.num_qubits(),
                b.num_bits(),
                b.num_zvars(),
                b.len()
            ),
            Operation::Repeat(r) => write!(f, "repeat({}, {})", r.num_repeats, r.operation),
            Operation::ReadoutErr(e) => write!(f, "{e}"),
        }
    }
}

impl From<Gate> for Operation {
    fn from(g: Gate) -> Self {
        Operation::Gate(g)
    }
}

impl From<StandardGate> for Operation {
    fn from(g: StandardGate) -> Self {
        Operation::Gate(Gate::Standard(g))
    }
}

impl From<KrausChannel> for Operation {
    fn from(k: KrausChannel) -> Self {
        Operation::Kraus(k)
    }
}

impl From<Operator> for Operation {
    fn from(o: Operator) -> Self {
        Operation::Operator(o)
    }
}

impl From<SimpleOperation> for Operation {
    fn from(s: SimpleOperation) -> Self {
        Operation::Simple(s)
    }
}

impl From<GeneralizedOperation> for Operation {
    fn from(g: GeneralizedOperation) -> Self {
        Operation::Generalized(g)
    }
}

impl From<Annotation> for Operation {
    fn from(a: Annotation) -> Self {
        Operation::Annotation(a)
    }
}

impl From<IfStatement> for Operation {
    fn from(s: IfStatement) -> Self {
        Operation::If(s)
    }
}

impl From<Block> for Operation {
    fn from(b: Block) -> Self {
        Operation::Block(Arc::new(b))
    }
}

impl From<Arc<Block>> for Operation {
    fn from(b: Arc<Block>) -> Self {
        Operation::Block(b)
    }
}

impl From<Repeat> for Operation {
    fn from(r: Repeat) -> Self {
        Operation::Repeat(r)
    }
}

impl From<ReadoutErr> for Operation {
    fn from(e: ReadoutErr) -> Self {
        Operation::ReadoutErr(e)
    }
}
