//! Gates built from other gates: controlled, powered, inverted and parallel.
//!
//! The wrappers are only constructed through the smart constructors on
//! [`Gate`], which apply the algebraic simplifications (flattening nested
//! controls, folding trivial exponents, cancelling double inverses).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::argument::Argument;
use crate::error::{IrError, IrResult};
use crate::gate::{Gate, StandardGate};
use crate::generalized::GeneralizedGate;

/// Exponent of a [`Power`] gate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ExponentRepr")]
pub enum Exponent {
    /// Integer exponent.
    Int(i64),
    /// Exact rational exponent, normalized with a positive denominator.
    Rational(i64, i64),
    /// Floating-point exponent.
    Double(f64),
}

impl Exponent {
    /// Rational exponent, reduced. A unit denominator yields [`Exponent::Int`].
    pub fn rational(num: i64, den: i64) -> IrResult<Self> {
        if den == 0 {
            return Err(IrError::invalid("power", "zero denominator"));
        }
        let g = gcd(num, den).max(1);
        let (mut n, mut d) = (num / g, den / g);
        if d < 0 {
            n = -n;
            d = -d;
        }
        Ok(if d == 1 {
            Exponent::Int(n)
        } else {
            Exponent::Rational(n, d)
        })
    }

    /// Numeric value.
    pub fn to_f64(self) -> f64 {
        match self {
            Exponent::Int(n) => n as f64,
            Exponent::Rational(n, d) => n as f64 / d as f64,
            Exponent::Double(x) => x,
        }
    }

    /// Integer value, if the exponent is a whole number.
    pub fn as_integer(self) -> Option<i64> {
        match self {
            Exponent::Int(n) => Some(n),
            Exponent::Rational(..) => None,
            Exponent::Double(x) if x.fract() == 0.0 && x.abs() < i64::MAX as f64 => Some(x as i64),
            Exponent::Double(_) => None,
        }
    }

    /// Exponent as an argument.
    pub fn to_argument(self) -> Argument {
        match self {
            Exponent::Int(n) => Argument::Integer(n),
            Exponent::Rational(n, d) => Argument::Integer(n) / Argument::Integer(d),
            Exponent::Double(x) => Argument::Real(x),
        }
    }

    /// Product of two exponents, exact when both are exact.
    pub fn mul(self, other: Exponent) -> Exponent {
        let exact = |e: Exponent| match e {
            Exponent::Int(n) => Some((n, 1)),
            Exponent::Rational(n, d) => Some((n, d)),
            Exponent::Double(_) => None,
        };
        if let (Some((a, b)), Some((c, d))) = (exact(self), exact(other)) {
            if let (Some(n), Some(m)) = (a.checked_mul(c), b.checked_mul(d)) {
                if let Ok(e) = Exponent::rational(n, m) {
                    return e;
                }
            }
        }
        Exponent::Double(self.to_f64() * other.to_f64())
    }
}

#[derive(Deserialize)]
enum ExponentRepr {
    Int(i64),
    Rational(i64, i64),
    Double(f64),
}

impl TryFrom<ExponentRepr> for Exponent {
    type Error = IrError;

    fn try_from(r: ExponentRepr) -> IrResult<Self> {
        match r {
            ExponentRepr::Int(n) => Ok(Exponent::Int(n)),
            ExponentRepr::Rational(n, d) => Exponent::rational(n, d),
            ExponentRepr::Double(x) if x.is_finite() => Ok(Exponent::Double(x)),
            ExponentRepr::Double(x) => Err(IrError::invalid("power", format!("non-finite exponent {x}"))),
        }
    }
}

fn gcd(mut a: i64, mut b: i64) -> i64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    i64::try_from(a.unsigned_abs()).unwrap_or(1)
}

impl From<i64> for Exponent {
    fn from(n: i64) -> Self {
        Exponent::Int(n)
    }
}

impl From<i32> for Exponent {
    fn from(n: i32) -> Self {
        Exponent::Int(n.into())
    }
}

impl From<f64> for Exponent {
    fn from(x: f64) -> Self {
        Exponent::Double(x)
    }
}

impl fmt::Display for Exponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exponent::Int(n) => write!(f, "{n}"),
            Exponent::Rational(n, d) => write!(f, "({n}/{d})"),
            Exponent::Double(x) => write!(f, "{x}"),
        }
    }
}

/// Gate applied only when all control qubits are one.
///
/// Targets are ordered controls first, then the inner gate's targets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Control {
    num_controls: usize,
    gate: Box<Gate>,
}

impl Control {
    /// Number of control qubits.
    pub fn num_controls(&self) -> usize {
        self.num_controls
    }

    /// The controlled gate.
    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    /// Rebuild with the inner gate replaced by `f(inner)`.
    pub fn map_gate(&self, f: impl FnOnce(&Gate) -> Gate) -> Control {
        Control {
            num_controls: self.num_controls,
            gate: Box::new(f(&self.gate)),
        }
    }
}

/// Gate raised to a power.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Power {
    gate: Box<Gate>,
    exponent: Exponent,
}

impl Power {
    /// The base gate.
    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    /// The exponent.
    pub fn exponent(&self) -> Exponent {
        self.exponent
    }

    /// Rebuild with the inner gate replaced by `f(inner)`.
    pub fn map_gate(&self, f: impl FnOnce(&Gate) -> Gate) -> Power {
        Power {
            gate: Box::new(f(&self.gate)),
            exponent: self.exponent,
        }
    }
}

/// Adjoint of a gate with no closed-form inverse.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inverse {
    gate: Box<Gate>,
}

impl Inverse {
    /// The gate being inverted.
    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    /// Rebuild with the inner gate replaced by `f(inner)`.
    pub fn map_gate(&self, f: impl FnOnce(&Gate) -> Gate) -> Inverse {
        Inverse {
            gate: Box::new(f(&self.gate)),
        }
    }
}

/// The same gate applied to consecutive groups of qubits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parallel {
    num_repeats: usize,
    gate: Box<Gate>,
}

impl Parallel {
    /// Number of copies.
    pub fn num_repeats(&self) -> usize {
        self.num_repeats
    }

    /// The repeated gate.
    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    /// Rebuild with the inner gate replaced by `f(inner)`.
    pub fn map_gate(&self, f: impl FnOnce(&Gate) -> Gate) -> Parallel {
        Parallel {
            num_repeats: self.num_repeats,
            gate: Box::new(f(&self.gate)),
        }
    }
}

/// Serde mirror of [`Gate`]. Wrappers are rebuilt through the smart
/// constructors so that deserialized gates obey the same invariants.
#[derive(Deserialize)]
pub(crate) enum GateRepr {
    Standard(StandardGate),
    Custom(crate::gate::CustomGate),
    Generalized(GeneralizedGate),
    PauliString(crate::generalized::PauliString),
    RPauli(crate::generalized::RPauli),
    Control { num_controls: usize, gate: Box<Gate> },
    Power { gate: Box<Gate>, exponent: Exponent },
    Inverse { gate: Box<Gate> },
    Parallel { num_repeats: usize, gate: Box<Gate> },
    Call(crate::gatedecl::GateCall),
}

impl TryFrom<GateRepr> for Gate {
    type Error = IrError;

    fn try_from(r: GateRepr) -> IrResult<Self> {
        Ok(match r {
            GateRepr::Standard(g) => Gate::Standard(g),
            GateRepr::Custom(g) => Gate::Custom(g),
            GateRepr::Generalized(g) => Gate::Generalized(g),
            GateRepr::PauliString(p) => Gate::PauliString(p),
            GateRepr::RPauli(r) => Gate::RPauli(r),
            GateRepr::Control { num_controls, gate } => (*gate).control(num_controls)?,
            GateRepr::Power { gate, exponent } => (*gate).power(exponent),
            GateRepr::Inverse { gate } => gate.inverse(),
            GateRepr::Parallel { num_repeats, gate } => (*gate).parallel(num_repeats)?,
            GateRepr::Call(c) => Gate::Call(c),
        })
    }
}

impl Gate {
    /// Identity on `n` qubits.
    pub fn identity(n: usize) -> Gate {
        if n == 1 {
            Gate::Standard(StandardGate::Id)
        } else {
            Gate::Parallel(Parallel {
                num_repeats: n,
                gate: Box::new(Gate::Standard(StandardGate::Id)),
            })
        }
    }

    /// Add `num_controls` control qubits. Nested controls are merged.
    pub fn control(self, num_controls: usize) -> IrResult<Gate> {
        if num_controls == 0 {
            return Err(IrError::invalid(
                format!("control of {}", self.name()),
                "needs at least one control qubit",
            ));
        }
        Ok(match self {
            Gate::Control(c) => Gate::Control(Control {
                num_controls: c.num_controls + num_controls,
                gate: c.gate,
            }),
            other => Gate::Control(Control {
                num_controls,
                gate: Box::new(other),
            }),
        })
    }

    /// Raise to a power.
    ///
    /// Exponent zero yields the identity of the same size and exponent one
    /// the gate itself. Nested powers multiply their exponents.
    pub fn power(self, exponent: impl Into<Exponent>) -> Gate {
        let exponent = exponent.into();
        match exponent.as_integer() {
            Some(0) => return Gate::identity(self.num_qubits()),
            Some(1) => return self,
            _ => {}
        }
        match self {
            Gate::Power(p) => (*p.gate).power(p.exponent.mul(exponent)),
            other => Gate::Power(Power {
                gate: Box::new(other),
                exponent,
            }),
        }
    }

    /// Adjoint. `g.inverse().inverse() == g` for every gate.
    pub fn inverse(&self) -> Gate {
        match self {
            Gate::Standard(g) => match g.inverse_gate() {
                Some(inv) => Gate::Standard(inv),
                None => self.wrap_inverse(),
            },
            Gate::Custom(g) => Gate::Custom(g.adjoint()),
            Gate::Generalized(g) => match g {
                GeneralizedGate::Rnz { num_qubits, theta } => Gate::Generalized(GeneralizedGate::Rnz {
                    num_qubits: *num_qubits,
                    theta: -theta.clone(),
                }),
                GeneralizedGate::Diffusion { .. } | GeneralizedGate::PolynomialOracle { .. } => {
                    self.clone()
                }
                GeneralizedGate::Qft { .. } | GeneralizedGate::PhaseGradient { .. } => {
                    self.wrap_inverse()
                }
            },
            Gate::PauliString(_) => self.clone(),
            Gate::RPauli(r) => Gate::RPauli(crate::generalized::RPauli::new(
                r.pauli().clone(),
                -r.theta().clone(),
            )),
            Gate::Control(c) => Gate::Control(c.map_gate(Gate::inverse)),
            Gate::Power(p) => match p.exponent.as_integer() {
                Some(_) => Gate::Power(p.map_gate(Gate::inverse)),
                None => self.wrap_inverse(),
            },
            Gate::Inverse(i) => (*i.gate).clone(),
            Gate::Parallel(p) => Gate::Parallel(p.map_gate(Gate::inverse)),
            Gate::Call(_) => self.wrap_inverse(),
        }
    }

    fn wrap_inverse(&self) -> Gate {
        Gate::Inverse(Inverse {
            gate: Box::new(self.clone()),
        })
    }

    /// Apply `num_repeats` copies on consecutive qubit groups.
    pub fn parallel(self, num_repeats: usize) -> IrResult<Gate> {
        if num_repeats == 0 {
            return Err(IrError::invalid(
                format!("parallel of {}", self.name()),
                "needs at least one repetition",
            ));
        }
        Ok(Gate::Parallel(Parallel {
            num_repeats,
            gate: Box::new(self),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_flattens() {
        let g = Gate::from(StandardGate::X).control(1).unwrap().control(2).unwrap();
        match &g {
            Gate::Control(c) => {
                assert_eq!(c.num_controls(), 3);
                assert_eq!(c.gate(), &Gate::from(StandardGate::X));
            }
            other => panic!("expected control, got {other}"),
        }
        assert_eq!(g.num_qubits(), 4);
        assert!(Gate::from(StandardGate::X).control(0).is_err());
    }

    #[test]
    fn test_power_trivial_exponents() {
        let h = Gate::from(StandardGate::H);
        assert_eq!(h.clone().power(1), h);
        assert_eq!(h.clone().power(0), Gate::identity(1));
        assert_eq!(Gate::from(StandardGate::Swap).power(0).num_qubits(), 2);
        assert_eq!(h.clone().power(1.0), h);
    }

    #[test]
    fn test_power_nesting_multiplies() {
        let g = Gate::from(StandardGate::S).power(Exponent::rational(1, 2).unwrap());
        let g = g.power(4);
        match g {
            Gate::Power(p) => assert_eq!(p.exponent(), Exponent::Int(2)),
            other => panic!("expected power, got {other}"),
        }
        let back = Gate::from(StandardGate::T).power(Exponent::rational(1, 2).unwrap()).power(2);
        assert_eq!(back, Gate::from(StandardGate::T));
    }

    #[test]
    fn test_inverse_involution() {
        let theta = Argument::symbol("theta");
        let gates = vec![
            Gate::from(StandardGate::S),
            Gate::from(StandardGate::Rx(theta.clone())),
            Gate::from(StandardGate::ISwap).control(2).unwrap(),
            Gate::from(StandardGate::T).power(3),
            Gate::from(StandardGate::T).power(0.5),
            Gate::from(GeneralizedGate::qft(3).unwrap()),
            Gate::from(GeneralizedGate::rnz(2, theta).unwrap()),
            Gate::from(StandardGate::DCX).parallel(2).unwrap(),
        ];
        for g in gates {
            assert_eq!(g.inverse().inverse(), g, "failed for {g}");
        }
    }

    #[test]
    fn test_inverse_in_place() {
        assert_eq!(
            Gate::from(StandardGate::Rz(0.25.into())).inverse(),
            Gate::from(StandardGate::Rz((-0.25).into()))
        );
        assert!(matches!(Gate::from(StandardGate::S).inverse(), Gate::Inverse(_)));
    }

    #[test]
    fn test_exponent_rational() {
        assert_eq!(Exponent::rational(4, 2).unwrap(), Exponent::Int(2));
        assert_eq!(Exponent::rational(2, -4).unwrap(), Exponent::Rational(-1, 2));
        assert!(Exponent::rational(1, 0).is_err());
        assert_eq!(Exponent::Rational(1, 3).mul(Exponent::Int(3)), Exponent::Int(1));
    }
}
