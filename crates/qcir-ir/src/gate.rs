//! Quantum gate types.

use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::argument::Argument;
use crate::composite::{Control, GateRepr, Inverse, Parallel, Power};
use crate::error::{IrError, IrResult};
use crate::gatedecl::GateCall;
use crate::generalized::{GeneralizedGate, PauliString, RPauli};
use crate::matrix;

/// Standard gates with known semantics.
///
/// Single-qubit gates follow the convention
/// `U(θ, φ, λ, γ) = e^{iγ} [[cos(θ/2), -e^{iλ} sin(θ/2)], [e^{iφ} sin(θ/2), e^{i(φ+λ)} cos(θ/2)]]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    // Single-qubit Pauli and Clifford gates
    /// Identity gate.
    Id,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,
    /// Hadamard gate.
    H,
    /// Hadamard-like gate swapping X and Y, `(X + Y)/√2`.
    HXY,
    /// Hadamard-like gate swapping Y and Z, `(Y + Z)/√2`.
    HYZ,
    /// S gate (sqrt(Z)).
    S,
    /// T gate (fourth root of Z).
    T,
    /// Identity for a given duration.
    Delay(Argument),

    // Single-qubit rotation gates
    /// Universal single-qubit gate U(θ, φ, λ, γ).
    U(Argument, Argument, Argument, Argument),
    /// Phase gate.
    P(Argument),
    /// Rotation around X axis.
    Rx(Argument),
    /// Rotation around Y axis.
    Ry(Argument),
    /// Rotation around Z axis.
    Rz(Argument),
    /// Rotation by θ around the axis `cos(φ) X + sin(φ) Y`.
    R(Argument, Argument),
    /// OpenQASM 2 U1 gate.
    U1(Argument),
    /// OpenQASM 2 U2 gate.
    U2(Argument, Argument),
    /// OpenQASM 2 U3 gate.
    U3(Argument, Argument, Argument),

    // Two-qubit gates
    /// SWAP gate.
    Swap,
    /// iSWAP gate.
    ISwap,
    /// Echoed cross-resonance gate.
    ECR,
    /// Double CNOT gate.
    DCX,
    /// XX rotation gate.
    RXX(Argument),
    /// YY rotation gate.
    RYY(Argument),
    /// ZZ rotation gate.
    RZZ(Argument),
    /// ZX rotation gate.
    RZX(Argument),
    /// XX+YY interaction gate.
    XXPlusYY(Argument, Argument),
    /// XX-YY interaction gate.
    XXMinusYY(Argument, Argument),
}

impl StandardGate {
    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::Id => "id",
            StandardGate::X => "x",
            StandardGate::Y => "y",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::HXY => "hxy",
            StandardGate::HYZ => "hyz",
            StandardGate::S => "s",
            StandardGate::T => "t",
            StandardGate::Delay(_) => "delay",
            StandardGate::U(..) => "u",
            StandardGate::P(_) => "p",
            StandardGate::Rx(_) => "rx",
            StandardGate::Ry(_) => "ry",
            StandardGate::Rz(_) => "rz",
            StandardGate::R(..) => "r",
            StandardGate::U1(_) => "u1",
            StandardGate::U2(..) => "u2",
            StandardGate::U3(..) => "u3",
            StandardGate::Swap => "swap",
            StandardGate::ISwap => "iswap",
            StandardGate::ECR => "ecr",
            StandardGate::DCX => "dcx",
            StandardGate::RXX(_) => "rxx",
            StandardGate::RYY(_) => "ryy",
            StandardGate::RZZ(_) => "rzz",
            StandardGate::RZX(_) => "rzx",
            StandardGate::XXPlusYY(..) => "xxplusyy",
            StandardGate::XXMinusYY(..) => "xxminusyy",
        }
    }

    /// Get the number of qubits this gate operates on.
    #[inline]
    pub fn num_qubits(&self) -> usize {
        match self {
            StandardGate::Swap
            | StandardGate::ISwap
            | StandardGate::ECR
            | StandardGate::DCX
            | StandardGate::RXX(_)
            | StandardGate::RYY(_)
            | StandardGate::RZZ(_)
            | StandardGate::RZX(_)
            | StandardGate::XXPlusYY(..)
            | StandardGate::XXMinusYY(..) => 2,
            _ => 1,
        }
    }

    /// Get the parameters of this gate.
    pub fn parameters(&self) -> Vec<&Argument> {
        match self {
            StandardGate::Delay(a)
            | StandardGate::P(a)
            | StandardGate::Rx(a)
            | StandardGate::Ry(a)
            | StandardGate::Rz(a)
            | StandardGate::U1(a)
            | StandardGate::RXX(a)
            | StandardGate::RYY(a)
            | StandardGate::RZZ(a)
            | StandardGate::RZX(a) => vec![a],
            StandardGate::R(a, b)
            | StandardGate::U2(a, b)
            | StandardGate::XXPlusYY(a, b)
            | StandardGate::XXMinusYY(a, b) => vec![a, b],
            StandardGate::U3(a, b, c) => vec![a, b, c],
            StandardGate::U(a, b, c, d) => vec![a, b, c, d],
            _ => vec![],
        }
    }

    /// Number of parameters the gate kind takes.
    pub fn num_parameters(&self) -> usize {
        self.parameters().len()
    }

    /// Rebuild the gate with every parameter passed through `f`.
    pub fn map_parameters(&self, f: &impl Fn(&Argument) -> Argument) -> StandardGate {
        use StandardGate as G;
        match self {
            G::Delay(a) => G::Delay(f(a)),
            G::U(a, b, c, d) => G::U(f(a), f(b), f(c), f(d)),
            G::P(a) => G::P(f(a)),
            G::Rx(a) => G::Rx(f(a)),
            G::Ry(a) => G::Ry(f(a)),
            G::Rz(a) => G::Rz(f(a)),
            G::R(a, b) => G::R(f(a), f(b)),
            G::U1(a) => G::U1(f(a)),
            G::U2(a, b) => G::U2(f(a), f(b)),
            G::U3(a, b, c) => G::U3(f(a), f(b), f(c)),
            G::RXX(a) => G::RXX(f(a)),
            G::RYY(a) => G::RYY(f(a)),
            G::RZZ(a) => G::RZZ(f(a)),
            G::RZX(a) => G::RZX(f(a)),
            G::XXPlusYY(a, b) => G::XXPlusYY(f(a), f(b)),
            G::XXMinusYY(a, b) => G::XXMinusYY(f(a), f(b)),
            other => other.clone(),
        }
    }

    /// Build a gate of the same kind as `self` from a parameter list.
    pub fn with_parameters(&self, params: Vec<Argument>) -> IrResult<StandardGate> {
        if params.len() != self.num_parameters() {
            return Err(IrError::invalid(
                self.name(),
                format!(
                    "expects {} parameters, got {}",
                    self.num_parameters(),
                    params.len()
                ),
            ));
        }
        let mut it = params.into_iter();
        let mut next = || it.next().unwrap_or_default();
        Ok(self.clone().fill(&mut next))
    }

    fn fill(self, next: &mut impl FnMut() -> Argument) -> StandardGate {
        use StandardGate as G;
        match self {
            G::Delay(_) => G::Delay(next()),
            G::U(..) => G::U(next(), next(), next(), next()),
            G::P(_) => G::P(next()),
            G::Rx(_) => G::Rx(next()),
            G::Ry(_) => G::Ry(next()),
            G::Rz(_) => G::Rz(next()),
            G::R(..) => G::R(next(), next()),
            G::U1(_) => G::U1(next()),
            G::U2(..) => G::U2(next(), next()),
            G::U3(..) => G::U3(next(), next(), next()),
            G::RXX(_) => G::RXX(next()),
            G::RYY(_) => G::RYY(next()),
            G::RZZ(_) => G::RZZ(next()),
            G::RZX(_) => G::RZX(next()),
            G::XXPlusYY(..) => G::XXPlusYY(next(), next()),
            G::XXMinusYY(..) => G::XXMinusYY(next(), next()),
            other => other,
        }
    }

    /// Exact `U(θ, φ, λ, γ)` form of a single-qubit gate, including global phase.
    pub fn u_parameters(&self) -> Option<[Argument; 4]> {
        use StandardGate as G;
        let zero = || Argument::Integer(0);
        let pi = Argument::pi;
        let half_pi = || Argument::pi_frac(1, 2);
        Some(match self {
            G::Id | G::Delay(_) => [zero(), zero(), zero(), zero()],
            G::X => [pi(), zero(), pi(), zero()],
            G::Y => [pi(), half_pi(), half_pi(), zero()],
            G::Z => [zero(), zero(), pi(), zero()],
            G::H => [half_pi(), zero(), pi(), zero()],
            G::HXY => [pi(), Argument::pi_frac(1, 4), Argument::pi_frac(3, 4), zero()],
            G::HYZ => [half_pi(), half_pi(), half_pi(), zero()],
            G::S => [zero(), zero(), half_pi(), zero()],
            G::T => [zero(), zero(), Argument::pi_frac(1, 4), zero()],
            G::U(a, b, c, d) => [a.clone(), b.clone(), c.clone(), d.clone()],
            G::P(l) | G::U1(l) => [zero(), zero(), l.clone(), zero()],
            G::Rx(t) => [t.clone(), -half_pi(), half_pi(), zero()],
            G::Ry(t) => [t.clone(), zero(), zero(), zero()],
            G::Rz(l) => [zero(), zero(), l.clone(), -(l.clone() / 2)],
            G::R(t, p) => [
                t.clone(),
                p.clone() - half_pi(),
                half_pi() - p.clone(),
                zero(),
            ],
            G::U2(p, l) => [half_pi(), p.clone(), l.clone(), zero()],
            G::U3(t, p, l) => [t.clone(), p.clone(), l.clone(), zero()],
            _ => return None,
        })
    }

    /// Inverse expressible as a standard gate of the same kind.
    ///
    /// Applying this twice returns a gate equal to the original.
    pub fn inverse_gate(&self) -> Option<StandardGate> {
        use StandardGate as G;
        Some(match self {
            G::Id | G::X | G::Y | G::Z | G::H | G::HXY | G::HYZ | G::Swap | G::ECR => self.clone(),
            // identity on the state, so the same wait undoes it
            G::Delay(t) => G::Delay(t.clone()),
            G::U(t, p, l, g) => G::U(-t.clone(), -l.clone(), -p.clone(), -g.clone()),
            G::U3(t, p, l) => G::U3(-t.clone(), -l.clone(), -p.clone()),
            G::R(t, p) => G::R(-t.clone(), p.clone()),
            G::XXPlusYY(t, b) => G::XXPlusYY(-t.clone(), b.clone()),
            G::XXMinusYY(t, b) => G::XXMinusYY(-t.clone(), b.clone()),
            G::P(_)
            | G::Rx(_)
            | G::Ry(_)
            | G::Rz(_)
            | G::U1(_)
            | G::RXX(_)
            | G::RYY(_)
            | G::RZZ(_)
            | G::RZX(_) => self.map_parameters(&|a| -a.clone()),
            G::S | G::T | G::U2(..) | G::ISwap | G::DCX => return None,
        })
    }

    /// Check whether any parameter is symbolic.
    pub fn is_symbolic(&self) -> bool {
        self.parameters().iter().any(|a| a.is_symbolic())
    }
}

impl fmt::Display for StandardGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self.parameters();
        if params.is_empty() {
            write!(f, "{}", self.name())
        } else {
            let p: Vec<String> = params.iter().map(ToString::to_string).collect();
            write!(f, "{}({})", self.name(), p.join(", "))
        }
    }
}

/// A user-defined gate given by its unitary matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CustomGateRepr")]
pub struct CustomGate {
    num_qubits: usize,
    matrix: Arc<Array2<Complex64>>,
}

#[derive(Deserialize)]
struct CustomGateRepr {
    num_qubits: usize,
    matrix: Arc<Array2<Complex64>>,
}

impl TryFrom<CustomGateRepr> for CustomGate {
    type Error = IrError;

    fn try_from(r: CustomGateRepr) -> IrResult<Self> {
        CustomGate::from_shared(r.num_qubits, r.matrix)
    }
}

impl CustomGate {
    /// Create a custom gate, checking shape and unitarity.
    pub fn new(num_qubits: usize, matrix: Array2<Complex64>) -> IrResult<Self> {
        Self::from_shared(num_qubits, Arc::new(matrix))
    }

    /// Create a custom gate sharing an existing matrix.
    pub fn from_shared(num_qubits: usize, matrix: Arc<Array2<Complex64>>) -> IrResult<Self> {
        matrix::check_dimension("custom gate", num_qubits, &matrix)?;
        if !matrix::is_unitary(&matrix, 1e-8) {
            return Err(IrError::invalid("custom gate", "matrix is not unitary"));
        }
        Ok(Self { num_qubits, matrix })
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// The unitary matrix.
    pub fn matrix(&self) -> &Array2<Complex64> {
        &self.matrix
    }

    /// Shared handle to the unitary matrix.
    pub fn shared_matrix(&self) -> &Arc<Array2<Complex64>> {
        &self.matrix
    }

    /// Conjugate transpose.
    pub fn adjoint(&self) -> CustomGate {
        Self {
            num_qubits: self.num_qubits,
            matrix: Arc::new(self.matrix.t().mapv(|z| z.conj())),
        }
    }
}

/// A unitary, gate-like operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GateRepr")]
pub enum Gate {
    /// A standard gate.
    Standard(StandardGate),
    /// A gate given by an explicit matrix.
    Custom(CustomGate),
    /// A generalized, register-sized gate.
    Generalized(GeneralizedGate),
    /// A tensor product of Pauli operators.
    PauliString(PauliString),
    /// Rotation generated by a Pauli string.
    RPauli(RPauli),
    /// Controlled gate.
    Control(Control),
    /// Gate raised to a power.
    Power(Power),
    /// Adjoint of a gate.
    Inverse(Inverse),
    /// Same gate applied on consecutive qubit groups.
    Parallel(Parallel),
    /// Invocation of a gate declaration.
    Call(GateCall),
}

impl Gate {
    /// Get the name of this gate.
    pub fn name(&self) -> &str {
        match self {
            Gate::Standard(g) => g.name(),
            Gate::Custom(_) => "custom",
            Gate::Generalized(g) => g.name(),
            Gate::PauliString(_) => "paulistring",
            Gate::RPauli(_) => "rpauli",
            Gate::Control(_) => "control",
            Gate::Power(_) => "power",
            Gate::Inverse(_) => "inverse",
            Gate::Parallel(_) => "parallel",
            Gate::Call(c) => c.decl().name(),
        }
    }

    /// Get the number of qubits this gate operates on.
    pub fn num_qubits(&self) -> usize {
        match self {
            Gate::Standard(g) => g.num_qubits(),
            Gate::Custom(g) => g.num_qubits(),
            Gate::Generalized(g) => g.num_qubits(),
            Gate::PauliString(p) => p.num_qubits(),
            Gate::RPauli(r) => r.pauli().num_qubits(),
            Gate::Control(c) => c.num_controls() + c.gate().num_qubits(),
            Gate::Power(p) => p.gate().num_qubits(),
            Gate::Inverse(i) => i.gate().num_qubits(),
            Gate::Parallel(p) => p.num_repeats() * p.gate().num_qubits(),
            Gate::Call(c) => c.decl().num_qubits(),
        }
    }

    /// Get the parameters of this gate, including those of wrapped gates.
    pub fn parameters(&self) -> Vec<Argument> {
        match self {
            Gate::Standard(g) => g.parameters().into_iter().cloned().collect(),
            Gate::Custom(_) | Gate::PauliString(_) => vec![],
            Gate::Generalized(g) => g.parameters(),
            Gate::RPauli(r) => vec![r.theta().clone()],
            Gate::Control(c) => c.gate().parameters(),
            Gate::Power(p) => p.gate().parameters(),
            Gate::Inverse(i) => i.gate().parameters(),
            Gate::Parallel(p) => p.gate().parameters(),
            Gate::Call(c) => c.args().to_vec(),
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

    /// Rebuild with every argument passed through `f`.
    ///
    /// The structure of composite gates is preserved as is.
    pub fn map_arguments(&self, f: &impl Fn(&Argument) -> Argument) -> Gate {
        match self {
            Gate::Standard(g) => Gate::Standard(g.map_parameters(f)),
            Gate::Custom(_) | Gate::PauliString(_) => self.clone(),
            Gate::Generalized(g) => Gate::Generalized(g.map_parameters(f)),
            Gate::RPauli(r) => Gate::RPauli(RPauli::new(r.pauli().clone(), f(r.theta()))),
            Gate::Control(c) => Gate::Control(c.map_gate(|g| g.map_arguments(f))),
            Gate::Power(p) => Gate::Power(p.map_gate(|g| g.map_arguments(f))),
            Gate::Inverse(i) => Gate::Inverse(i.map_gate(|g| g.map_arguments(f))),
            Gate::Parallel(p) => Gate::Parallel(p.map_gate(|g| g.map_arguments(f))),
            Gate::Call(c) => Gate::Call(c.map_args(f)),
        }
    }

    /// Substitute symbol bindings in every argument.
    pub fn substitute(&self, bindings: &HashMap<String, Argument>) -> Gate {
        self.map_arguments(&|a| a.substitute(bindings))
    }

    /// Dense unitary matrix, big-endian in the gate's own targets.
    pub fn matrix(&self) -> IrResult<Array2<Complex64>> {
        matrix::gate_matrix(self)
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gate::Standard(g) => write!(f, "{g}"),
            Gate::Custom(g) => write!(f, "custom({})", g.num_qubits()),
            Gate::Generalized(g) => write!(f, "{g}"),
            Gate::PauliString(p) => write!(f, "{p}"),
            Gate::RPauli(r) => write!(f, "rpauli({}, {})", r.pauli(), r.theta()),
            Gate::Control(c) => write!(f, "c{}({})", c.num_controls(), c.gate()),
            Gate::Power(p) => write!(f, "({})^{}", p.gate(), p.exponent()),
            Gate::Inverse(i) => write!(f, "({})†", i.gate()),
            Gate::Parallel(p) => write!(f, "parallel({}, {})", p.num_repeats(), p.gate()),
            Gate::Call(c) => {
                let args: Vec<String> = c.args().iter().map(ToString::to_string).collect();
                write!(f, "{}({})", c.decl().name(), args.join(", "))
            }
        }
    }
}

impl From<StandardGate> for Gate {
    fn from(g: StandardGate) -> Self {
        Gate::Standard(g)
    }
}

impl From<CustomGate> for Gate {
    fn from(g: CustomGate) -> Self {
        Gate::Custom(g)
    }
}

impl From<GeneralizedGate> for Gate {
    fn from(g: GeneralizedGate) -> Self {
        Gate::Generalized(g)
    }
}

impl From<PauliString> for Gate {
    fn from(p: PauliString) -> Self {
        Gate::PauliString(p)
    }
}

impl From<RPauli> for Gate {
    fn from(r: RPauli) -> Self {
        Gate::RPauli(r)
    }
}

impl From<GateCall> for Gate {
    fn from(c: GateCall) -> Self {
        Gate::Call(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_gate_names() {
        assert_eq!(StandardGate::H.name(), "h");
        assert_eq!(StandardGate::XXPlusYY(0.1.into(), 0.2.into()).name(), "xxplusyy");
        assert_eq!(Gate::from(StandardGate::ECR).name(), "ecr");
    }

    #[test]
    fn test_delay_inverts_to_itself() {
        let delay = Gate::from(StandardGate::Delay(12.5.into()));
        assert_eq!(delay.inverse(), delay);
        let id = Gate::from(StandardGate::Id).matrix().unwrap();
        assert!(matrix::approx_eq(&delay.inverse().matrix().unwrap(), &id, 1e-12));
    }

    #[test]
    fn test_gate_qubits() {
        assert_eq!(StandardGate::Rx(0.5.into()).num_qubits(), 1);
        assert_eq!(StandardGate::DCX.num_qubits(), 2);
        assert_eq!(StandardGate::RZX(0.5.into()).num_qubits(), 2);
    }

    #[test]
    fn test_with_parameters() {
        let g = StandardGate::U3(0.into(), 0.into(), 0.into());
        let filled = g
            .with_parameters(vec![1.0.into(), 2.0.into(), 3.0.into()])
            .unwrap();
        assert_eq!(
            filled,
            StandardGate::U3(1.0.into(), 2.0.into(), 3.0.into())
        );
        assert!(g.with_parameters(vec![1.0.into()]).is_err());
    }

    #[test]
    fn test_inverse_gate_is_involutive() {
        let theta = Argument::symbol("theta");
        let gates = vec![
            StandardGate::Rx(theta.clone()),
            StandardGate::U(theta.clone(), 0.3.into(), Argument::pi(), 0.into()),
            StandardGate::R(theta.clone(), 0.1.into()),
            StandardGate::XXMinusYY(theta.clone(), 0.4.into()),
            StandardGate::H,
        ];
        for g in gates {
            let inv = g.inverse_gate().unwrap();
            assert_eq!(inv.inverse_gate().unwrap(), g);
        }
        assert!(StandardGate::S.inverse_gate().is_none());
    }

    #[test]
    fn test_custom_gate_dimension_check() {
        let bad = Array2::<Complex64>::eye(3);
        assert!(matches!(
            CustomGate::new(1, bad),
            Err(IrError::Dimension { expected: 2, .. })
        ));

        let x = array![
            [Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)],
            [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)]
        ];
        let g = CustomGate::new(1, x).unwrap();
        assert_eq!(g.adjoint(), g);
    }

    #[test]
    fn test_display() {
        assert_eq!(StandardGate::Rx(0.5.into()).to_string(), "rx(0.5)");
        assert_eq!(StandardGate::X.to_string(), "x");
    }
}
