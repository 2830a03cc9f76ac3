//! Register-sized gates: QFT, phase gradient, diffusion, oracles and Pauli rotations.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::argument::Argument;
use crate::error::{IrError, IrResult};

/// Gates whose size is chosen at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GeneralizedGateRepr")]
pub enum GeneralizedGate {
    /// Quantum Fourier transform.
    Qft {
        /// Number of qubits.
        num_qubits: usize,
    },
    /// Phase gradient `|k⟩ → e^{iπk/2^(n-1)}|k⟩`.
    PhaseGradient {
        /// Number of qubits.
        num_qubits: usize,
    },
    /// Grover diffusion operator.
    Diffusion {
        /// Number of qubits.
        num_qubits: usize,
    },
    /// Oracle for `a·x·y + b·x + c·y + d` over an x register and a y register.
    ///
    /// Executed natively by the backend. It has no matrix and no expansion.
    PolynomialOracle {
        /// Size of the x register.
        nx: usize,
        /// Size of the y register.
        ny: usize,
        /// Polynomial coefficients `[a, b, c, d]`.
        coefficients: [i64; 4],
    },
    /// Multi-qubit Z rotation `exp(-iθ/2 Z⊗…⊗Z)`.
    Rnz {
        /// Number of qubits.
        num_qubits: usize,
        /// Rotation angle.
        theta: Argument,
    },
}

#[derive(Deserialize)]
enum GeneralizedGateRepr {
    Qft { num_qubits: usize },
    PhaseGradient { num_qubits: usize },
    Diffusion { num_qubits: usize },
    PolynomialOracle { nx: usize, ny: usize, coefficients: [i64; 4] },
    Rnz { num_qubits: usize, theta: Argument },
}

impl TryFrom<GeneralizedGateRepr> for GeneralizedGate {
    type Error = IrError;

    fn try_from(r: GeneralizedGateRepr) -> IrResult<Self> {
        match r {
            GeneralizedGateRepr::Qft { num_qubits } => Self::qft(num_qubits),
            GeneralizedGateRepr::PhaseGradient { num_qubits } => Self::phase_gradient(num_qubits),
            GeneralizedGateRepr::Diffusion { num_qubits } => Self::diffusion(num_qubits),
            GeneralizedGateRepr::PolynomialOracle {
                nx,
                ny,
                coefficients: [a, b, c, d],
            } => Self::polynomial_oracle(nx, ny, a, b, c, d),
            GeneralizedGateRepr::Rnz { num_qubits, theta } => Self::rnz(num_qubits, theta),
        }
    }
}

fn require_qubits(name: &str, n: usize) -> IrResult<()> {
    if n == 0 {
        return Err(IrError::invalid(name, "needs at least one qubit"));
    }
    Ok(())
}

impl GeneralizedGate {
    /// Quantum Fourier transform on `n` qubits.
    pub fn qft(n: usize) -> IrResult<Self> {
        require_qubits("qft", n)?;
        Ok(GeneralizedGate::Qft { num_qubits: n })
    }

    /// Phase gradient on `n` qubits.
    pub fn phase_gradient(n: usize) -> IrResult<Self> {
        require_qubits("phasegradient", n)?;
        Ok(GeneralizedGate::PhaseGradient { num_qubits: n })
    }

    /// Diffusion operator on `n` qubits.
    pub fn diffusion(n: usize) -> IrResult<Self> {
        require_qubits("diffusion", n)?;
        Ok(GeneralizedGate::Diffusion { num_qubits: n })
    }

    /// Polynomial oracle on an `nx`-qubit and an `ny`-qubit register.
    pub fn polynomial_oracle(nx: usize, ny: usize, a: i64, b: i64, c: i64, d: i64) -> IrResult<Self> {
        if nx == 0 || ny == 0 {
            return Err(IrError::invalid(
                "polynomialoracle",
                "both registers need at least one qubit",
            ));
        }
        Ok(GeneralizedGate::PolynomialOracle {
            nx,
            ny,
            coefficients: [a, b, c, d],
        })
    }

    /// Z-parity rotation on `n` qubits.
    pub fn rnz(n: usize, theta: impl Into<Argument>) -> IrResult<Self> {
        require_qubits("rnz", n)?;
        Ok(GeneralizedGate::Rnz {
            num_qubits: n,
            theta: theta.into(),
        })
    }

    /// Get the name of this gate.
    pub fn name(&self) -> &'static str {
        match self {
            GeneralizedGate::Qft { .. } => "qft",
            GeneralizedGate::PhaseGradient { .. } => "phasegradient",
            GeneralizedGate::Diffusion { .. } => "diffusion",
            GeneralizedGate::PolynomialOracle { .. } => "polynomialoracle",
            GeneralizedGate::Rnz { .. } => "rnz",
        }
    }

    /// Get the number of qubits this gate operates on.
    pub fn num_qubits(&self) -> usize {
        match self {
            GeneralizedGate::Qft { num_qubits }
            | GeneralizedGate::PhaseGradient { num_qubits }
            | GeneralizedGate::Diffusion { num_qubits }
            | GeneralizedGate::Rnz { num_qubits, .. } => *num_qubits,
            GeneralizedGate::PolynomialOracle { nx, ny, .. } => nx + ny,
        }
    }

    /// Sizes of the quantum registers the gate acts on.
    pub fn qreg_sizes(&self) -> Vec<usize> {
        match self {
            GeneralizedGate::PolynomialOracle { nx, ny, .. } => vec![*nx, *ny],
            other => vec![other.num_qubits()],
        }
    }

    /// Get the parameters of this gate.
    pub fn parameters(&self) -> Vec<Argument> {
        match self {
            GeneralizedGate::PolynomialOracle { coefficients, .. } => {
                coefficients.iter().map(|&c| Argument::Integer(c)).collect()
            }
            GeneralizedGate::Rnz { theta, .. } => vec![theta.clone()],
            _ => vec![],
        }
    }

    /// Rebuild with every parameter passed through `f`.
    pub fn map_parameters(&self, f: &impl Fn(&Argument) -> Argument) -> Self {
        match self {
            GeneralizedGate::Rnz { num_qubits, theta } => GeneralizedGate::Rnz {
                num_qubits: *num_qubits,
                theta: f(theta),
            },
            other => other.clone(),
        }
    }

    /// Rebuild from a kind, register sizes and parameters.
    pub fn from_parts(name: &str, qreg_sizes: &[usize], params: &[Argument]) -> IrResult<Self> {
        let size = |i: usize| {
            qreg_sizes
                .get(i)
                .copied()
                .ok_or_else(|| IrError::invalid(name, format!("missing register size {i}")))
        };
        match name {
            "qft" => Self::qft(size(0)?),
            "phasegradient" => Self::phase_gradient(size(0)?),
            "diffusion" => Self::diffusion(size(0)?),
            "rnz" => {
                let theta = params
                    .first()
                    .cloned()
                    .ok_or_else(|| IrError::invalid(name, "missing angle"))?;
                Self::rnz(size(0)?, theta)
            }
            "polynomialoracle" => {
                if params.len() != 4 {
                    return Err(IrError::invalid(name, "expects four coefficients"));
                }
                let mut coeffs = [0i64; 4];
                for (slot, p) in coeffs.iter_mut().zip(params) {
                    *slot = p
                        .to_number()?
                        .as_integer()
                        .ok_or_else(|| IrError::invalid(name, "coefficients must be integers"))?;
                }
                let [a, b, c, d] = coeffs;
                Self::polynomial_oracle(size(0)?, size(1)?, a, b, c, d)
            }
            other => Err(IrError::invalid(other, "unknown generalized gate")),
        }
    }
}

impl fmt::Display for GeneralizedGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneralizedGate::PolynomialOracle {
                coefficients: [a, b, c, d],
                ..
            } => write!(f, "polynomialoracle({a}, {b}, {c}, {d})"),
            GeneralizedGate::Rnz { num_qubits, theta } => write!(f, "rnz({num_qubits}, {theta})"),
            other => write!(f, "{}({})", other.name(), other.num_qubits()),
        }
    }
}

/// Single-qubit Pauli operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pauli {
    /// Identity.
    I,
    /// Pauli X.
    X,
    /// Pauli Y.
    Y,
    /// Pauli Z.
    Z,
}

impl Pauli {
    /// Letter representation.
    pub fn as_char(self) -> char {
        match self {
            Pauli::I => 'I',
            Pauli::X => 'X',
            Pauli::Y => 'Y',
            Pauli::Z => 'Z',
        }
    }
}

/// A tensor product of Pauli operators, one letter per qubit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PauliStringRepr")]
pub struct PauliString {
    paulis: Vec<Pauli>,
}

#[derive(Deserialize)]
struct PauliStringRepr {
    paulis: Vec<Pauli>,
}

impl TryFrom<PauliStringRepr> for PauliString {
    type Error = IrError;

    fn try_from(r: PauliStringRepr) -> IrResult<Self> {
        PauliString::from_paulis(r.paulis)
    }
}

impl PauliString {
    /// Parse a string of `I`, `X`, `Y`, `Z` letters.
    pub fn new(letters: &str) -> IrResult<Self> {
        if letters.is_empty() {
            return Err(IrError::Parse("empty Pauli string".into()));
        }
        let paulis = letters
            .chars()
            .map(|c| match c {
                'I' => Ok(Pauli::I),
                'X' => Ok(Pauli::X),
                'Y' => Ok(Pauli::Y),
                'Z' => Ok(Pauli::Z),
                other => Err(IrError::Parse(format!(
                    "invalid Pauli letter '{other}' in \"{letters}\""
                ))),
            })
            .collect::<IrResult<Vec<_>>>()?;
        Ok(Self { paulis })
    }

    /// Build from individual operators. At least one is required.
    pub fn from_paulis(paulis: Vec<Pauli>) -> IrResult<Self> {
        if paulis.is_empty() {
            return Err(IrError::Parse("empty Pauli string".into()));
        }
        Ok(Self { paulis })
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.paulis.len()
    }

    /// The individual Pauli operators.
    pub fn paulis(&self) -> &[Pauli] {
        &self.paulis
    }

    /// Check if every letter is the identity.
    pub fn is_identity(&self) -> bool {
        self.paulis.iter().all(|&p| p == Pauli::I)
    }
}

impl fmt::Display for PauliString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for p in &self.paulis {
            write!(f, "{}", p.as_char())?;
        }
        Ok(())
    }
}

/// Rotation `exp(-iθ/2 P)` generated by a Pauli string `P`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RPauli {
    pauli: PauliString,
    theta: Argument,
}

impl RPauli {
    /// Create a Pauli rotation.
    pub fn new(pauli: PauliString, theta: impl Into<Argument>) -> Self {
        Self {
            pauli,
            theta: theta.into(),
        }
    }

    /// The generating Pauli string.
    pub fn pauli(&self) -> &PauliString {
        &self.pauli
    }

    /// The rotation angle.
    pub fn theta(&self) -> &Argument {
        &self.theta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pauli_string_parse() {
        let p = PauliString::new("IXYZ").unwrap();
        assert_eq!(p.num_qubits(), 4);
        assert_eq!(p.to_string(), "IXYZ");
        assert!(!p.is_identity());
        assert!(PauliString::new("III").unwrap().is_identity());
        assert!(matches!(PauliString::new("XA"), Err(IrError::Parse(_))));
    }

    #[test]
    fn test_oracle_registers() {
        let g = GeneralizedGate::polynomial_oracle(2, 3, 1, 2, 3, 4).unwrap();
        assert_eq!(g.num_qubits(), 5);
        assert_eq!(g.qreg_sizes(), vec![2, 3]);
        assert_eq!(g.parameters().len(), 4);
        assert!(GeneralizedGate::polynomial_oracle(0, 3, 1, 2, 3, 4).is_err());
    }

    #[test]
    fn test_from_parts() {
        let rnz = GeneralizedGate::from_parts("rnz", &[3], &[0.5.into()]).unwrap();
        assert_eq!(rnz, GeneralizedGate::rnz(3, 0.5).unwrap());

        let oracle = GeneralizedGate::from_parts(
            "polynomialoracle",
            &[2, 2],
            &[1.into(), 2.into(), 3.into(), 4.into()],
        )
        .unwrap();
        assert_eq!(oracle.to_string(), "polynomialoracle(1, 2, 3, 4)");
        assert!(GeneralizedGate::from_parts("qft", &[], &[]).is_err());
    }
}
