//! Non-unitary operators used by expectation values and Kraus channels.

use ndarray::{Array2, array};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::argument::Argument;
use crate::error::{IrError, IrResult};
use crate::gate::Gate;
use crate::matrix;

/// Kinds of built-in operators, each scaled by its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorKind {
    /// `a|0⟩⟨1|`.
    SigmaMinus,
    /// `a|1⟩⟨0|`.
    SigmaPlus,
    /// `a|0⟩⟨0|`.
    Projector0,
    /// `a|1⟩⟨1|`.
    Projector1,
    /// `a|00⟩⟨00|`.
    Projector00,
    /// `a|01⟩⟨01|`.
    Projector01,
    /// `a|10⟩⟨10|`.
    Projector10,
    /// `a|11⟩⟨11|`.
    Projector11,
    /// `a|+⟩⟨+|`.
    ProjectorX0,
    /// `a|-⟩⟨-|`.
    ProjectorX1,
    /// `a|+i⟩⟨+i|`.
    ProjectorY0,
    /// `a|-i⟩⟨-i|`.
    ProjectorY1,
    /// `diag(a, b)`.
    DiagonalOp,
}

impl OperatorKind {
    /// All kinds, in wire order.
    pub const ALL: [OperatorKind; 13] = [
        OperatorKind::SigmaMinus,
        OperatorKind::SigmaPlus,
        OperatorKind::Projector0,
        OperatorKind::Projector1,
        OperatorKind::Projector00,
        OperatorKind::Projector01,
        OperatorKind::Projector10,
        OperatorKind::Projector11,
        OperatorKind::ProjectorX0,
        OperatorKind::ProjectorX1,
        OperatorKind::ProjectorY0,
        OperatorKind::ProjectorY1,
        OperatorKind::DiagonalOp,
    ];

    /// Operator name.
    pub fn name(self) -> &'static str {
        match self {
            OperatorKind::SigmaMinus => "sigmaminus",
            OperatorKind::SigmaPlus => "sigmaplus",
            OperatorKind::Projector0 => "projector0",
            OperatorKind::Projector1 => "projector1",
            OperatorKind::Projector00 => "projector00",
            OperatorKind::Projector01 => "projector01",
            OperatorKind::Projector10 => "projector10",
            OperatorKind::Projector11 => "projector11",
            OperatorKind::ProjectorX0 => "projectorx0",
            OperatorKind::ProjectorX1 => "projectorx1",
            OperatorKind::ProjectorY0 => "projectory0",
            OperatorKind::ProjectorY1 => "projectory1",
            OperatorKind::DiagonalOp => "diagonalop",
        }
    }

    /// Number of qubits.
    pub fn num_qubits(self) -> usize {
        match self {
            OperatorKind::Projector00
            | OperatorKind::Projector01
            | OperatorKind::Projector10
            | OperatorKind::Projector11 => 2,
            _ => 1,
        }
    }

    /// Number of parameters.
    pub fn num_parameters(self) -> usize {
        match self {
            OperatorKind::DiagonalOp => 2,
            _ => 1,
        }
    }
}

/// A built-in operator with its scale parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SimpleOperatorRepr")]
pub struct SimpleOperator {
    kind: OperatorKind,
    params: Vec<Argument>,
}

#[derive(Deserialize)]
struct SimpleOperatorRepr {
    kind: OperatorKind,
    params: Vec<Argument>,
}

impl TryFrom<SimpleOperatorRepr> for SimpleOperator {
    type Error = IrError;

    fn try_from(r: SimpleOperatorRepr) -> IrResult<Self> {
        SimpleOperator::new(r.kind, r.params)
    }
}

impl SimpleOperator {
    /// Create an operator, checking the parameter count.
    pub fn new(kind: OperatorKind, params: Vec<Argument>) -> IrResult<Self> {
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

    /// Operator with unit scale (`diag(1, 1)` for [`OperatorKind::DiagonalOp`]).
    pub fn unit(kind: OperatorKind) -> Self {
        Self {
            kind,
            params: vec![Argument::Integer(1); kind.num_parameters()],
        }
    }

    /// The operator kind.
    pub fn kind(&self) -> OperatorKind {
        self.kind
    }

    /// The scale parameters.
    pub fn parameters(&self) -> &[Argument] {
        &self.params
    }

    /// Dense matrix.
    pub fn matrix(&self) -> IrResult<Array2<Complex64>> {
        let p: Vec<f64> = self
            .params
            .iter()
            .map(Argument::as_f64)
            .collect::<IrResult<_>>()?;
        let a = Complex64::new(p[0], 0.0);
        let z = Complex64::new(0.0, 0.0);
        let half = a / 2.0;
        let i = Complex64::i();
        Ok(match self.kind {
            OperatorKind::SigmaMinus => array![[z, a], [z, z]],
            OperatorKind::SigmaPlus => array![[z, z], [a, z]],
            OperatorKind::Projector0 => array![[a, z], [z, z]],
            OperatorKind::Projector1 => array![[z, z], [z, a]],
            OperatorKind::Projector00 => basis_projector(0, a),
            OperatorKind::Projector01 => basis_projector(1, a),
            OperatorKind::Projector10 => basis_projector(2, a),
            OperatorKind::Projector11 => basis_projector(3, a),
            OperatorKind::ProjectorX0 => array![[half, half], [half, half]],
            OperatorKind::ProjectorX1 => array![[half, -half], [-half, half]],
            OperatorKind::ProjectorY0 => array![[half, -i * half], [i * half, half]],
            OperatorKind::ProjectorY1 => array![[half, i * half], [-i * half, half]],
            OperatorKind::DiagonalOp => array![[a, z], [z, Complex64::new(p[1], 0.0)]],
        })
    }

    fn map_parameters(&self, f: &impl Fn(&Argument) -> Argument) -> Self {
        Self {
            kind: self.kind,
            params: self.params.iter().map(f).collect(),
        }
    }
}

fn basis_projector(index: usize, a: Complex64) -> Array2<Complex64> {
    let mut m = Array2::zeros((4, 4));
    m[[index, index]] = a;
    m
}

/// An operator given by an explicit matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CustomOperatorRepr")]
pub struct CustomOperator {
    num_qubits: usize,
    matrix: Arc<Array2<Complex64>>,
}

#[derive(Deserialize)]
struct CustomOperatorRepr {
    num_qubits: usize,
    matrix: Array2<Complex64>,
}

impl TryFrom<CustomOperatorRepr> for CustomOperator {
    type Error = IrError;

    fn try_from(r: CustomOperatorRepr) -> IrResult<Self> {
        CustomOperator::new(r.num_qubits, r.matrix)
    }
}

impl CustomOperator {
    /// Create an operator, checking that the matrix is `2^n x 2^n`.
    pub fn new(num_qubits: usize, matrix: Array2<Complex64>) -> IrResult<Self> {
        matrix::check_dimension("custom operator", num_qubits, &matrix)?;
        Ok(Self {
            num_qubits,
            matrix: Arc::new(matrix),
        })
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// The operator matrix.
    pub fn matrix(&self) -> &Array2<Complex64> {
        &self.matrix
    }
}

/// A gate multiplied by a scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescaledGate {
    gate: Gate,
    scale: Argument,
}

impl RescaledGate {
    /// Create a rescaled gate.
    pub fn new(gate: Gate, scale: impl Into<Argument>) -> Self {
        Self {
            gate,
            scale: scale.into(),
        }
    }

    /// The underlying gate.
    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    /// The scale factor.
    pub fn scale(&self) -> &Argument {
        &self.scale
    }
}

/// Operator acting on qubits, not necessarily unitary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operator {
    /// A built-in operator.
    Simple(SimpleOperator),
    /// An explicit matrix.
    Custom(CustomOperator),
    /// A scaled gate.
    Rescaled(RescaledGate),
    /// A unitary gate used as an operator.
    Gate(Gate),
}

impl Operator {
    /// Get the name of this operator.
    pub fn name(&self) -> &str {
        match self {
            Operator::Simple(op) => op.kind.name(),
            Operator::Custom(_) => "operator",
            Operator::Rescaled(_) => "rescaledgate",
            Operator::Gate(g) => g.name(),
        }
    }

    /// Number of qubits the operator acts on.
    pub fn num_qubits(&self) -> usize {
        match self {
            Operator::Simple(op) => op.kind.num_qubits(),
            Operator::Custom(op) => op.num_qubits,
            Operator::Rescaled(r) => r.gate.num_qubits(),
            Operator::Gate(g) => g.num_qubits(),
        }
    }

    /// Parameters of the operator.
    pub fn parameters(&self) -> Vec<Argument> {
        match self {
            Operator::Simple(op) => op.params.clone(),
            Operator::Custom(_) => vec![],
            Operator::Rescaled(r) => {
                let mut params = r.gate.parameters();
                params.push(r.scale.clone());
                params
            }
            Operator::Gate(g) => g.parameters(),
        }
    }

    /// Rebuild with every argument passed through `f`.
    pub fn map_arguments(&self, f: &impl Fn(&Argument) -> Argument) -> Operator {
        match self {
            Operator::Simple(op) => Operator::Simple(op.map_parameters(f)),
            Operator::Custom(_) => self.clone(),
            Operator::Rescaled(r) => Operator::Rescaled(RescaledGate {
                gate: r.gate.map_arguments(f),
                scale: f(&r.scale),
            }),
            Operator::Gate(g) => Operator::Gate(g.map_arguments(f)),
        }
    }

    /// Dense matrix.
    pub fn matrix(&self) -> IrResult<Array2<Complex64>> {
        match self {
            Operator::Simple(op) => op.matrix(),
            Operator::Custom(op) => Ok((*op.matrix).clone()),
            Operator::Rescaled(r) => {
                let scale = r.scale.as_f64()?;
                Ok(r.gate.matrix()? * Complex64::new(scale, 0.0))
            }
            Operator::Gate(g) => g.matrix(),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Simple(op) => {
                let p: Vec<String> = op.params.iter().map(ToString::to_string).collect();
                write!(f, "{}({})", op.kind.name(), p.join(", "))
            }
            Operator::Custom(op) => write!(f, "operator({})", op.num_qubits),
            Operator::Rescaled(r) => write!(f, "{} * {}", r.scale, r.gate),
            Operator::Gate(g) => write!(f, "{g}"),
        }
    }
}

impl From<SimpleOperator> for Operator {
    fn from(op: SimpleOperator) -> Self {
        Operator::Simple(op)
    }
}

impl From<CustomOperator> for Operator {
    fn from(op: CustomOperator) -> Self {
        Operator::Custom(op)
    }
}

impl From<RescaledGate> for Operator {
    fn from(op: RescaledGate) -> Self {
        Operator::Rescaled(op)
    }
}

impl From<Gate> for Operator {
    fn from(g: Gate) -> Self {
        Operator::Gate(g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::StandardGate;

    fn close(a: &Array2<Complex64>, b: &Array2<Complex64>) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).norm() < 1e-12)
    }

    #[test]
    fn test_projectors_are_idempotent() {
        for kind in OperatorKind::ALL {
            if kind == OperatorKind::SigmaMinus || kind == OperatorKind::SigmaPlus {
                continue;
            }
            let m = SimpleOperator::unit(kind).matrix().unwrap();
            assert!(close(&m.dot(&m), &m), "{} is not a projector", kind.name());
        }
    }

    #[test]
    fn test_parameter_count() {
        assert!(SimpleOperator::new(OperatorKind::DiagonalOp, vec![1.into()]).is_err());
        let d = SimpleOperator::new(OperatorKind::DiagonalOp, vec![1.into(), 0.5.into()]).unwrap();
        assert_eq!(d.matrix().unwrap()[[1, 1]], Complex64::new(0.5, 0.0));
    }

    #[test]
    fn test_custom_operator_dimension() {
        let m = Array2::<Complex64>::zeros((2, 3));
        assert!(matches!(
            CustomOperator::new(1, m),
            Err(IrError::Dimension { rows: 2, cols: 3, .. })
        ));
    }

    #[test]
    fn test_rescaled_gate_matrix() {
        let op = Operator::from(RescaledGate::new(StandardGate::X.into(), 0.5));
        let m = op.matrix().unwrap();
        assert_eq!(m[[0, 1]], Complex64::new(0.5, 0.0));
        assert_eq!(op.num_qubits(), 1);
    }
}
