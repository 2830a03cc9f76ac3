//! Expansion of composite and generalized gates.
//!
//! [`expand`] performs one level of expansion into gates on local targets
//! (indices into the expanded gate's own target list). Standard gates,
//! `CX`, custom gates and polynomial oracles are primitives and return
//! `None`. Every expansion is exact, including the global phase, so that
//! the unitary of a gate and of its expansion agree.

use crate::argument::Argument;
use crate::composite::Exponent;
use crate::error::{IrError, IrResult};
use crate::gate::{CustomGate, Gate, StandardGate};
use crate::generalized::{GeneralizedGate, Pauli};
use crate::matrix;

/// A gate on local target indices.
pub type Piece = (Gate, Vec<usize>);

fn piece(g: StandardGate, targets: &[usize]) -> Piece {
    (Gate::Standard(g), targets.to_vec())
}

fn cx(control: usize, target: usize) -> IrResult<Piece> {
    Ok((Gate::Standard(StandardGate::X).control(1)?, vec![control, target]))
}

fn is_zero(a: &Argument) -> bool {
    matches!(a.literal(), Some(v) if v == 0.0)
}

/// Gate equal to `gate^exponent` for non-integer exponents, when a closed
/// form exists.
pub fn power_rule(gate: &Gate, exponent: Exponent) -> Option<Gate> {
    use StandardGate as G;
    let t = exponent.to_argument();
    let scale = |a: &Argument| a.clone() * t.clone();
    let pi_t = || Argument::pi() * t.clone();
    let zero = || Argument::Integer(0);
    let out = match gate {
        Gate::Standard(g) => Gate::Standard(match g {
            G::Id | G::Delay(_) => G::Id,
            G::X => G::U(
                pi_t(),
                -Argument::pi_frac(1, 2),
                Argument::pi_frac(1, 2),
                pi_t() / 2,
            ),
            G::Y => G::U(pi_t(), zero(), zero(), pi_t() / 2),
            G::Z => G::P(pi_t()),
            G::S => G::P(pi_t() / 2),
            G::T => G::P(pi_t() / 4),
            G::P(_)
            | G::U1(_)
            | G::Rx(_)
            | G::Ry(_)
            | G::Rz(_)
            | G::RXX(_)
            | G::RYY(_)
            | G::RZZ(_)
            | G::RZX(_) => g.map_parameters(&scale),
            G::R(theta, phi) => G::R(scale(theta), phi.clone()),
            G::XXPlusYY(theta, beta) => G::XXPlusYY(scale(theta), beta.clone()),
            G::XXMinusYY(theta, beta) => G::XXMinusYY(scale(theta), beta.clone()),
            G::ISwap => G::XXPlusYY(-pi_t(), zero()),
            _ => return None,
        }),
        Gate::Generalized(GeneralizedGate::Rnz { num_qubits, theta }) => {
            Gate::Generalized(GeneralizedGate::Rnz {
                num_qubits: *num_qubits,
                theta: scale(theta),
            })
        }
        Gate::RPauli(r) => Gate::RPauli(crate::generalized::RPauli::new(
            r.pauli().clone(),
            scale(r.theta()),
        )),
        Gate::Parallel(p) => {
            let inner = power_rule(p.gate(), exponent)?;
            inner.parallel(p.num_repeats()).ok()?
        }
        Gate::Control(c) => {
            let inner = power_rule(c.gate(), exponent)?;
            inner.control(c.num_controls()).ok()?
        }
        _ => return None,
    };
    Some(out)
}

/// Exact CX-basis expansion of a two-qubit standard gate.
pub fn expand_standard(gate: &StandardGate) -> IrResult<Option<Vec<Piece>>> {
    use StandardGate as G;
    let half_pi = || Argument::pi_frac(1, 2);
    let zz = |theta: &Argument, basis: Option<StandardGate>| -> IrResult<Vec<Piece>> {
        let mut out = Vec::new();
        if let Some(b) = &basis {
            out.push(piece(b.clone(), &[0]));
            out.push(piece(b.clone(), &[1]));
        }
        out.push(cx(0, 1)?);
        out.push(piece(G::Rz(theta.clone()), &[1]));
        out.push(cx(0, 1)?);
        if let Some(b) = basis {
            out.push(piece(b.clone(), &[0]));
            out.push(piece(b, &[1]));
        }
        Ok(out)
    };
    Ok(Some(match gate {
        G::Swap => vec![cx(0, 1)?, cx(1, 0)?, cx(0, 1)?],
        G::DCX => vec![cx(0, 1)?, cx(1, 0)?],
        G::RZZ(t) => zz(t, None)?,
        G::RXX(t) => zz(t, Some(G::H))?,
        G::RYY(t) => zz(t, Some(G::HYZ))?,
        G::RZX(t) => vec![
            piece(G::H, &[1]),
            cx(0, 1)?,
            piece(G::Rz(t.clone()), &[1]),
            cx(0, 1)?,
            piece(G::H, &[1]),
        ],
        G::ISwap => vec![
            piece(G::RXX(-half_pi()), &[0, 1]),
            piece(G::RYY(-half_pi()), &[0, 1]),
        ],
        G::ECR => vec![
            piece(G::RZX(Argument::pi_frac(1, 4)), &[0, 1]),
            piece(G::X, &[0]),
            piece(G::RZX(-Argument::pi_frac(1, 4)), &[0, 1]),
        ],
        G::XXPlusYY(t, b) => vec![
            piece(G::Rz(b.clone()), &[0]),
            piece(G::RXX(t.clone() / 2), &[0, 1]),
            piece(G::RYY(t.clone() / 2), &[0, 1]),
            piece(G::Rz(-b.clone()), &[0]),
        ],
        G::XXMinusYY(t, b) => vec![
            piece(G::Rz(-b.clone()), &[0]),
            piece(G::RXX(t.clone() / 2), &[0, 1]),
            piece(G::RYY(-(t.clone() / 2)), &[0, 1]),
            piece(G::Rz(b.clone()), &[0]),
        ],
        _ => return Ok(None),
    }))
}

/// One level of expansion, `None` for primitives.
pub fn expand(gate: &Gate) -> IrResult<Option<Vec<Piece>>> {
    match gate {
        Gate::Standard(_) | Gate::Custom(_) => Ok(None),
        Gate::Generalized(g) => expand_generalized(g),
        Gate::PauliString(p) => Ok(Some(
            p.paulis()
                .iter()
                .enumerate()
                .map(|(q, letter)| piece(pauli_gate(*letter), &[q]))
                .collect(),
        )),
        Gate::RPauli(r) => {
            let support: Vec<(usize, Pauli)> = r
                .pauli()
                .paulis()
                .iter()
                .copied()
                .enumerate()
                .filter(|(_, p)| *p != Pauli::I)
                .collect();
            if support.is_empty() {
                let phase = -(r.theta().clone() / 2);
                let zero = || Argument::Integer(0);
                return Ok(Some(vec![piece(
                    StandardGate::U(zero(), zero(), zero(), phase),
                    &[0],
                )]));
            }
            let mut out = Vec::new();
            let basis = |out: &mut Vec<Piece>| {
                for (q, p) in &support {
                    match p {
                        Pauli::X => out.push(piece(StandardGate::H, &[*q])),
                        Pauli::Y => out.push(piece(StandardGate::HYZ, &[*q])),
                        _ => {}
                    }
                }
            };
            basis(&mut out);
            let qubits: Vec<usize> = support.iter().map(|(q, _)| *q).collect();
            out.push((
                Gate::Generalized(GeneralizedGate::rnz(qubits.len(), r.theta().clone())?),
                qubits,
            ));
            basis(&mut out);
            Ok(Some(out))
        }
        Gate::Control(c) => expand_control(c.num_controls(), c.gate()),
        Gate::Power(p) => match p.exponent().as_integer() {
            Some(n) => {
                let base = if n < 0 { p.gate().inverse() } else { p.gate().clone() };
                let targets: Vec<usize> = (0..gate.num_qubits()).collect();
                Ok(Some(
                    (0..n.unsigned_abs())
                        .map(|_| (base.clone(), targets.clone()))
                        .collect(),
                ))
            }
            None => Ok(power_rule(p.gate(), p.exponent())
                .map(|g| vec![(g, (0..gate.num_qubits()).collect())])),
        },
        Gate::Inverse(i) => expand_inverse(i.gate()),
        Gate::Parallel(p) => {
            let k = p.gate().num_qubits();
            Ok(Some(
                (0..p.num_repeats())
                    .map(|r| (p.gate().clone(), (r * k..(r + 1) * k).collect()))
                    .collect(),
            ))
        }
        Gate::Call(call) => {
            let body = call.bound_body();
            let mut out = Vec::with_capacity(body.len());
            for inst in body.iter() {
                if let Some(g) = inst.operation().as_gate() {
                    out.push((g.clone(), inst.qtargets().to_vec()));
                }
            }
            Ok(Some(out))
        }
    }
}

fn pauli_gate(p: Pauli) -> StandardGate {
    match p {
        Pauli::I => StandardGate::Id,
        Pauli::X => StandardGate::X,
        Pauli::Y => StandardGate::Y,
        Pauli::Z => StandardGate::Z,
    }
}

fn expand_generalized(g: &GeneralizedGate) -> IrResult<Option<Vec<Piece>>> {
    let phase = |k: usize| Argument::pi() / Argument::Integer(2).pow(i64::try_from(k).unwrap_or(i64::MAX));
    if g.num_qubits() == 0 {
        return Err(IrError::invalid(g.name(), "needs at least one qubit"));
    }
    Ok(Some(match g {
        GeneralizedGate::PolynomialOracle { .. } => return Ok(None),
        GeneralizedGate::Qft { num_qubits } => {
            let n = *num_qubits;
            let q: Vec<usize> = (0..n).rev().collect();
            let mut out = vec![piece(StandardGate::H, &[q[0]])];
            for i in 1..n {
                for j in 0..i {
                    let cp = Gate::Standard(StandardGate::P(phase(i - j))).control(1)?;
                    out.push((cp, vec![q[i], q[j]]));
                }
                out.push(piece(StandardGate::H, &[q[i]]));
            }
            out
        }
        GeneralizedGate::PhaseGradient { num_qubits } => (0..*num_qubits)
            .rev()
            .map(|i| piece(StandardGate::P(phase(i)), &[i]))
            .collect(),
        GeneralizedGate::Diffusion { num_qubits } => {
            let n = *num_qubits;
            let mut out: Vec<Piece> = (0..n)
                .map(|q| piece(StandardGate::Ry(Argument::pi_frac(1, 2)), &[q]))
                .collect();
            let z = Gate::Standard(StandardGate::Z);
            let cz = if n > 1 { z.control(n - 1)? } else { z };
            out.push((cz, (0..n).collect()));
            out.extend((0..n).map(|q| piece(StandardGate::Ry(-Argument::pi_frac(1, 2)), &[q])));
            out
        }
        GeneralizedGate::Rnz { num_qubits, theta } => {
            let n = *num_qubits;
            let mut out = Vec::with_capacity(2 * n - 1);
            for q in 0..n - 1 {
                out.push(cx(q, q + 1)?);
            }
            out.push(piece(StandardGate::Rz(theta.clone()), &[n - 1]));
            for q in (0..n - 1).rev() {
                out.push(cx(q, q + 1)?);
            }
            out
        }
    }))
}

fn expand_control(k: usize, inner: &Gate) -> IrResult<Option<Vec<Piece>>> {
    let target_offset = |targets: &[usize]| -> Vec<usize> { targets.iter().map(|t| t + k).collect() };
    let controls: Vec<usize> = (0..k).collect();
    let lift = |pieces: Vec<Piece>| -> IrResult<Vec<Piece>> {
        pieces
            .into_iter()
            .map(|(g, targets)| {
                let mut all = controls.clone();
                all.extend(target_offset(&targets));
                Ok((g.control(k)?, all))
            })
            .collect()
    };
    match inner {
        Gate::Standard(g) if g.num_qubits() == 1 => controlled_single(k, g),
        Gate::Standard(g) => match expand_standard(g)? {
            Some(pieces) => lift(pieces).map(Some),
            None => Ok(None),
        },
        Gate::Custom(c) => {
            let m = matrix::controlled(c.matrix(), k);
            let custom = CustomGate::new(k + c.num_qubits(), m)?;
            Ok(Some(vec![(Gate::Custom(custom), (0..k + c.num_qubits()).collect())]))
        }
        Gate::Control(c) => expand_control(k + c.num_controls(), c.gate()),
        Gate::Power(p) if p.exponent().as_integer().is_some() => {
            let pieces = expand(&Gate::Power(p.clone()))?.unwrap_or_default();
            lift(pieces).map(Some)
        }
        Gate::Power(p) => match power_rule(p.gate(), p.exponent()) {
            Some(g) => Ok(Some(vec![(g.control(k)?, (0..k + inner.num_qubits()).collect())])),
            None => Ok(None),
        },
        other => match expand(other)? {
            Some(pieces) => lift(pieces).map(Some),
            None => Ok(None),
        },
    }
}

/// Controlled single-qubit standard gate. Target is local index `k`.
fn controlled_single(k: usize, g: &StandardGate) -> IrResult<Option<Vec<Piece>>> {
    use StandardGate as G;
    let t = k;
    match g {
        G::Id | G::Delay(_) => return Ok(Some(vec![piece(G::Id, &[t])])),
        G::X if k == 1 => return Ok(None),
        G::X if k == 2 => return Ok(Some(toffoli(0, 1, 2)?)),
        G::X => {
            // C^kX = C(V)[c_k] C^{k-1}X[->c_k] C(V†)[c_k] C^{k-1}X[->c_k] C^{k-1}(V)
            let v = power_rule(&Gate::Standard(G::X), Exponent::Rational(1, 2))
                .unwrap_or_else(|| Gate::Standard(G::X));
            let last = k - 1;
            let rest: Vec<usize> = (0..last).collect();
            let with = |mut qs: Vec<usize>, extra: &[usize]| {
                qs.extend_from_slice(extra);
                qs
            };
            let ckx = Gate::Standard(G::X).control(last)?;
            return Ok(Some(vec![
                (v.clone().control(1)?, vec![last, t]),
                (ckx.clone(), with(rest.clone(), &[last])),
                (v.inverse().control(1)?, vec![last, t]),
                (ckx, with(rest.clone(), &[last])),
                (v.control(last)?, with(rest, &[t])),
            ]));
        }
        _ => {}
    }
    let Some([theta, phi, lambda, gamma]) = g.u_parameters() else {
        return Ok(None);
    };
    let alpha = gamma + (phi.clone() + lambda.clone()) / 2;
    let mut out = Vec::new();
    let rz = |out: &mut Vec<Piece>, a: Argument| {
        if !is_zero(&a) {
            out.push(piece(G::Rz(a), &[t]));
        }
    };
    let ry = |out: &mut Vec<Piece>, a: Argument| {
        if !is_zero(&a) {
            out.push(piece(G::Ry(a), &[t]));
        }
    };
    let ckx = Gate::Standard(G::X).control(k)?;
    let all: Vec<usize> = (0..=k).collect();
    // C
    rz(&mut out, (lambda.clone() - phi.clone()) / 2);
    out.push((ckx.clone(), all.clone()));
    // B
    rz(&mut out, -((phi.clone() + lambda) / 2));
    ry(&mut out, -(theta.clone() / 2));
    out.push((ckx, all));
    // A
    ry(&mut out, theta / 2);
    rz(&mut out, phi);
    if !is_zero(&alpha) {
        let phase = Gate::Standard(G::P(alpha));
        if k == 1 {
            out.push((phase, vec![0]));
        } else {
            out.push((phase.control(k - 1)?, (0..k).collect()));
        }
    }
    Ok(Some(out))
}

fn toffoli(c1: usize, c2: usize, t: usize) -> IrResult<Vec<Piece>> {
    use StandardGate as G;
    let tdg = || G::P(-Argument::pi_frac(1, 4));
    Ok(vec![
        piece(G::H, &[t]),
        cx(c2, t)?,
        piece(tdg(), &[t]),
        cx(c1, t)?,
        piece(G::T, &[t]),
        cx(c2, t)?,
        piece(tdg(), &[t]),
        cx(c1, t)?,
        piece(G::T, &[c2]),
        piece(G::T, &[t]),
        piece(G::H, &[t]),
        cx(c1, c2)?,
        piece(G::T, &[c1]),
        piece(tdg(), &[c2]),
        cx(c1, c2)?,
    ])
}

fn expand_inverse(inner: &Gate) -> IrResult<Option<Vec<Piece>>> {
    let reversed = |pieces: Vec<Piece>| -> Vec<Piece> {
        pieces
            .into_iter()
            .rev()
            .map(|(g, targets)| (g.inverse(), targets))
            .collect()
    };
    match inner {
        Gate::Standard(g) => {
            if let Some([t, p, l, gm]) = g.u_parameters() {
                return Ok(Some(vec![piece(StandardGate::U(-t, -l, -p, -gm), &[0])]));
            }
            Ok(expand_standard(g)?.map(reversed))
        }
        other => Ok(expand(other)?.map(reversed)),
    }
}

/// Fully expand `gate` on `targets` down to primitives.
pub fn flatten(gate: &Gate, targets: &[usize], out: &mut Vec<Piece>) -> IrResult<()> {
    match expand(gate)? {
        None => out.push((gate.clone(), targets.to_vec())),
        Some(pieces) => {
            for (g, local) in pieces {
                let mapped: Vec<usize> = local.iter().map(|&i| targets[i]).collect();
                flatten(&g, &mapped, out)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generalized::{PauliString, RPauli};

    fn assert_expansion_exact(gate: &Gate) {
        let mut pieces = Vec::new();
        let targets: Vec<usize> = (0..gate.num_qubits()).collect();
        flatten(gate, &targets, &mut pieces).unwrap();
        let expanded = matrix::sequence(&pieces, gate.num_qubits()).unwrap();
        let direct = gate.matrix().unwrap();
        assert!(
            matrix::approx_eq(&expanded, &direct, 1e-9),
            "expansion of {gate} does not match its matrix"
        );
    }

    #[test]
    fn test_two_qubit_expansions_exact() {
        let a = || Argument::from(0.73);
        let b = || Argument::from(-0.41);
        for g in [
            StandardGate::Swap,
            StandardGate::ISwap,
            StandardGate::ECR,
            StandardGate::DCX,
            StandardGate::RXX(a()),
            StandardGate::RYY(a()),
            StandardGate::RZZ(a()),
            StandardGate::RZX(a()),
            StandardGate::XXPlusYY(a(), b()),
            StandardGate::XXMinusYY(a(), b()),
        ] {
            let pieces = expand_standard(&g).unwrap().unwrap();
            let m = matrix::sequence(&pieces, 2).unwrap();
            let direct = Gate::Standard(g.clone()).matrix().unwrap();
            assert!(matrix::approx_eq(&m, &direct, 1e-9), "{g}");
        }
    }

    #[test]
    fn test_controlled_expansions_exact() {
        let u = StandardGate::U(0.3.into(), 1.1.into(), (-0.7).into(), 0.2.into());
        let gates = vec![
            Gate::from(StandardGate::H).control(1).unwrap(),
            Gate::from(StandardGate::X).control(2).unwrap(),
            Gate::from(StandardGate::X).control(3).unwrap(),
            Gate::from(StandardGate::Z).control(2).unwrap(),
            Gate::from(u).control(2).unwrap(),
            Gate::from(StandardGate::Swap).control(1).unwrap(),
            Gate::from(StandardGate::RXX(0.4.into())).control(1).unwrap(),
        ];
        for g in gates {
            assert_expansion_exact(&g);
        }
    }

    #[test]
    fn test_wrapper_expansions_exact() {
        let gates = vec![
            Gate::from(StandardGate::S).inverse(),
            Gate::from(StandardGate::ISwap).inverse(),
            Gate::from(StandardGate::T).power(3),
            Gate::from(StandardGate::H).power(-2),
            Gate::from(StandardGate::X).power(0.5),
            Gate::from(StandardGate::ISwap).power(Exponent::rational(1, 3).unwrap()),
            Gate::from(StandardGate::H).parallel(3).unwrap(),
            Gate::from(GeneralizedGate::rnz(3, 0.9).unwrap()),
            Gate::from(RPauli::new(PauliString::new("XYZ").unwrap(), 0.6)),
            Gate::from(RPauli::new(PauliString::new("II").unwrap(), 0.6)),
            Gate::from(PauliString::new("XIZ").unwrap()),
        ];
        for g in gates {
            assert_expansion_exact(&g);
        }
    }

    #[test]
    fn test_power_rule_matches_square_root() {
        let v = power_rule(&Gate::from(StandardGate::X), Exponent::Rational(1, 2)).unwrap();
        let m = v.matrix().unwrap();
        let x = Gate::from(StandardGate::X).matrix().unwrap();
        assert!(matrix::approx_eq(&m.dot(&m), &x, 1e-12));
        assert!(power_rule(&Gate::from(StandardGate::H), Exponent::Double(0.5)).is_none());
    }

    #[test]
    fn test_qft_is_unitary_and_dft() {
        let qft = Gate::from(GeneralizedGate::qft(3).unwrap());
        let m = qft.matrix().unwrap();
        assert!(matrix::is_unitary(&m, 1e-10));
        // first column is the uniform superposition
        for r in 0..8 {
            assert!((m[[r, 0]].norm() - 1.0 / 8f64.sqrt()).abs() < 1e-10);
        }
    }

    #[test]
    fn test_phase_gradient_angles_halve_beyond_64_qubits() {
        let pieces = expand(&Gate::from(GeneralizedGate::phase_gradient(70).unwrap()))
            .unwrap()
            .unwrap();
        let angle = |i: usize| match &pieces[i].0 {
            Gate::Standard(StandardGate::P(a)) => a.as_f64().unwrap(),
            other => panic!("unexpected piece {other}"),
        };
        // pieces run from qubit 69 down to qubit 0
        assert!((angle(69) - std::f64::consts::PI).abs() < 1e-15);
        for i in 0..69 {
            assert!(angle(i) > 0.0);
            assert!((2.0 * angle(i) - angle(i + 1)).abs() <= 1e-12 * angle(i + 1));
        }
    }

    #[test]
    fn test_fractional_power_without_rule_is_primitive() {
        let g = Gate::from(StandardGate::H).power(Exponent::Double(0.5));
        assert!(matches!(g, Gate::Power(_)));
        assert!(expand(&g).unwrap().is_none());

        let mut pieces = Vec::new();
        flatten(&g, &[3], &mut pieces).unwrap();
        assert_eq!(pieces, vec![(g.clone(), vec![3])]);
    }

    #[test]
    fn test_empty_register_gate_is_rejected() {
        let rnz = Gate::Generalized(GeneralizedGate::Rnz {
            num_qubits: 0,
            theta: Argument::from(0.5),
        });
        assert!(matches!(expand(&rnz), Err(IrError::InvalidArgument { .. })));
    }

    #[test]
    fn test_cx_is_primitive() {
        let cx = Gate::from(StandardGate::X).control(1).unwrap();
        assert!(expand(&cx).unwrap().is_none());
    }

    #[test]
    fn test_oracle_is_primitive() {
        let g = Gate::from(GeneralizedGate::polynomial_oracle(2, 2, 1, 0, 0, 1).unwrap());
        assert!(expand(&g).unwrap().is_none());
    }
}
