//! Dense matrix helpers and gate unitaries.
//!
//! All matrices are big-endian in the operation's targets: the first target
//! is the most significant bit of the row/column index.

use ndarray::{Array2, array};
use num_complex::Complex64;

use crate::argument::Argument;
use crate::composite::Exponent;
use crate::decompose;
use crate::error::{IrError, IrResult};
use crate::gate::{Gate, StandardGate};
use crate::generalized::GeneralizedGate;
use crate::noise::pauli_string_matrix;

/// Check that `m` is a `2^n x 2^n` matrix.
pub fn check_dimension(context: &str, num_qubits: usize, m: &Array2<Complex64>) -> IrResult<()> {
    let expected = 1usize.checked_shl(num_qubits as u32).unwrap_or(0);
    let (rows, cols) = m.dim();
    if expected == 0 || rows != expected || cols != expected {
        return Err(IrError::Dimension {
            context: context.to_string(),
            expected,
            rows,
            cols,
        });
    }
    Ok(())
}

/// Identity on `n` qubits.
pub fn identity(num_qubits: usize) -> Array2<Complex64> {
    Array2::eye(1 << num_qubits)
}

/// Conjugate transpose.
pub fn adjoint(m: &Array2<Complex64>) -> Array2<Complex64> {
    m.t().mapv(|z| z.conj())
}

/// Element-wise comparison within `tol`.
pub fn approx_eq(a: &Array2<Complex64>, b: &Array2<Complex64>, tol: f64) -> bool {
    a.dim() == b.dim() && a.iter().zip(b.iter()).all(|(x, y)| (x - y).norm() <= tol)
}

/// Check `U†U = I` within `tol`.
pub fn is_unitary(m: &Array2<Complex64>, tol: f64) -> bool {
    let (rows, cols) = m.dim();
    rows == cols && approx_eq(&adjoint(m).dot(m), &Array2::eye(rows), tol)
}

/// Kronecker product, `a` on the most significant qubits.
pub fn kron(a: &Array2<Complex64>, b: &Array2<Complex64>) -> Array2<Complex64> {
    let (ar, ac) = a.dim();
    let (br, bc) = b.dim();
    let mut out = Array2::zeros((ar * br, ac * bc));
    for ((i, j), &x) in a.indexed_iter() {
        if x == Complex64::new(0.0, 0.0) {
            continue;
        }
        for ((k, l), &y) in b.indexed_iter() {
            out[[i * br + k, j * bc + l]] = x * y;
        }
    }
    out
}

/// Lift `op`, acting on `targets`, to the full `num_qubits` space.
pub fn embed(op: &Array2<Complex64>, targets: &[usize], num_qubits: usize) -> Array2<Complex64> {
    let dim = 1usize << num_qubits;
    let k = targets.len();
    let bit = |x: usize, q: usize| (x >> (num_qubits - 1 - q)) & 1;
    let mut out = Array2::zeros((dim, dim));
    for x in 0..dim {
        let col = targets
            .iter()
            .fold(0usize, |acc, &q| (acc << 1) | bit(x, q));
        let rest = targets
            .iter()
            .fold(x, |acc, &q| acc & !(1 << (num_qubits - 1 - q)));
        for row in 0..(1usize << k) {
            let amp = op[[row, col]];
            if amp == Complex64::new(0.0, 0.0) {
                continue;
            }
            let y = targets.iter().enumerate().fold(rest, |acc, (j, &q)| {
                acc | (((row >> (k - 1 - j)) & 1) << (num_qubits - 1 - q))
            });
            out[[y, x]] += amp;
        }
    }
    out
}

/// Product of gates applied in order, each on its own targets.
pub fn sequence(pieces: &[(Gate, Vec<usize>)], num_qubits: usize) -> IrResult<Array2<Complex64>> {
    let mut acc = identity(num_qubits);
    for (gate, targets) in pieces {
        acc = embed(&gate.matrix()?, targets, num_qubits).dot(&acc);
    }
    Ok(acc)
}

/// `U(θ, φ, λ, γ)`.
pub fn u_matrix(theta: f64, phi: f64, lambda: f64, gamma: f64) -> Array2<Complex64> {
    let c = (theta / 2.0).cos();
    let s = (theta / 2.0).sin();
    let g = Complex64::from_polar(1.0, gamma);
    array![
        [g * c, -g * Complex64::from_polar(s, lambda)],
        [g * Complex64::from_polar(s, phi), g * Complex64::from_polar(c, phi + lambda)]
    ]
}

fn rotation(generator: &Array2<Complex64>, theta: f64) -> Array2<Complex64> {
    let dim = generator.nrows();
    let c = Complex64::new((theta / 2.0).cos(), 0.0);
    let s = Complex64::new(0.0, -(theta / 2.0).sin());
    Array2::<Complex64>::eye(dim) * c + generator * s
}

fn two_qubit_pauli(letters: &str) -> IrResult<Array2<Complex64>> {
    Ok(pauli_string_matrix(&crate::generalized::PauliString::new(letters)?))
}

/// Unitary of a standard gate.
pub fn standard_matrix(gate: &StandardGate) -> IrResult<Array2<Complex64>> {
    use StandardGate as G;
    if let Some([t, p, l, g]) = gate.u_parameters() {
        return Ok(u_matrix(t.as_f64()?, p.as_f64()?, l.as_f64()?, g.as_f64()?));
    }
    let o = Complex64::new(1.0, 0.0);
    let z = Complex64::new(0.0, 0.0);
    let i = Complex64::i();
    let f = |a: &Argument| a.as_f64();
    Ok(match gate {
        G::Swap => array![[o, z, z, z], [z, z, o, z], [z, o, z, z], [z, z, z, o]],
        G::ISwap => array![[o, z, z, z], [z, z, i, z], [z, i, z, z], [z, z, z, o]],
        G::DCX => array![[o, z, z, z], [z, z, o, z], [z, z, z, o], [z, o, z, z]],
        G::ECR => {
            let h = Complex64::new(std::f64::consts::FRAC_1_SQRT_2, 0.0);
            array![
                [z, z, o, i],
                [z, z, i, o],
                [o, -i, z, z],
                [-i, o, z, z]
            ] * h
        }
        G::RXX(t) => rotation(&two_qubit_pauli("XX")?, f(t)?),
        G::RYY(t) => rotation(&two_qubit_pauli("YY")?, f(t)?),
        G::RZZ(t) => rotation(&two_qubit_pauli("ZZ")?, f(t)?),
        G::RZX(t) => rotation(&two_qubit_pauli("ZX")?, f(t)?),
        G::XXPlusYY(t, b) => {
            let (t, b) = (f(t)?, f(b)?);
            let c = Complex64::new((t / 2.0).cos(), 0.0);
            let s = (t / 2.0).sin();
            let mut m = identity(2);
            m[[1, 1]] = c;
            m[[2, 2]] = c;
            m[[1, 2]] = -i * Complex64::from_polar(s, b);
            m[[2, 1]] = -i * Complex64::from_polar(s, -b);
            m
        }
        G::XXMinusYY(t, b) => {
            let (t, b) = (f(t)?, f(b)?);
            let c = Complex64::new((t / 2.0).cos(), 0.0);
            let s = (t / 2.0).sin();
            let mut m = identity(2);
            m[[0, 0]] = c;
            m[[3, 3]] = c;
            m[[0, 3]] = -i * Complex64::from_polar(s, -b);
            m[[3, 0]] = -i * Complex64::from_polar(s, b);
            m
        }
        other => return Err(IrError::unsupported(other.name(), "matrix")),
    })
}

/// Block-diagonal embedding of `m` in the all-controls-one subspace.
pub fn controlled(m: &Array2<Complex64>, num_controls: usize) -> Array2<Complex64> {
    let inner = m.nrows();
    let dim = inner << num_controls;
    let mut out = Array2::eye(dim);
    let offset = dim - inner;
    for ((r, c), &x) in m.indexed_iter() {
        out[[offset + r, offset + c]] = x;
    }
    out
}

/// Integer matrix power; negative exponents use the adjoint.
pub fn matrix_power(m: &Array2<Complex64>, exponent: i64) -> Array2<Complex64> {
    let mut base = if exponent < 0 { adjoint(m) } else { m.clone() };
    let mut e = exponent.unsigned_abs();
    let mut acc = Array2::eye(m.nrows());
    while e > 0 {
        if e & 1 == 1 {
            acc = acc.dot(&base);
        }
        base = base.dot(&base);
        e >>= 1;
    }
    acc
}

/// Unitary of any gate.
pub fn gate_matrix(gate: &Gate) -> IrResult<Array2<Complex64>> {
    match gate {
        Gate::Standard(g) => standard_matrix(g),
        Gate::Custom(g) => Ok(g.matrix().clone()),
        Gate::Generalized(g) => generalized_matrix(gate, g),
        Gate::PauliString(p) => Ok(pauli_string_matrix(p)),
        Gate::RPauli(r) => Ok(rotation(&pauli_string_matrix(r.pauli()), r.theta().as_f64()?)),
        Gate::Control(c) => Ok(controlled(&c.gate().matrix()?, c.num_controls())),
        Gate::Power(p) => match p.exponent().as_integer() {
            Some(n) => Ok(matrix_power(&p.gate().matrix()?, n)),
            None => fractional_power(p.gate(), p.exponent()),
        },
        Gate::Inverse(i) => Ok(adjoint(&i.gate().matrix()?)),
        Gate::Parallel(p) => {
            let inner = p.gate().matrix()?;
            Ok((1..p.num_repeats()).fold(inner.clone(), |acc, _| kron(&acc, &inner)))
        }
        Gate::Call(call) => {
            let body = call.bound_body();
            let pieces = body
                .iter()
                .map(|inst| match inst.operation().as_gate() {
                    Some(g) => Ok((g.clone(), inst.qtargets().to_vec())),
                    None => Err(IrError::unsupported(call.decl().name(), "matrix")),
                })
                .collect::<IrResult<Vec<_>>>()?;
            sequence(&pieces, call.decl().num_qubits())
        }
    }
}

fn generalized_matrix(gate: &Gate, g: &GeneralizedGate) -> IrResult<Array2<Complex64>> {
    match g {
        GeneralizedGate::PolynomialOracle { .. } => Err(IrError::unsupported(g.name(), "matrix")),
        GeneralizedGate::Rnz { num_qubits, theta } => {
            let theta = theta.as_f64()?;
            let dim = 1usize << num_qubits;
            let mut m = Array2::zeros((dim, dim));
            for x in 0..dim {
                let sign = if x.count_ones() % 2 == 0 { -1.0 } else { 1.0 };
                m[[x, x]] = Complex64::from_polar(1.0, sign * theta / 2.0);
            }
            Ok(m)
        }
        _ => {
            let pieces = decompose::expand(gate)?
                .ok_or_else(|| IrError::unsupported(g.name(), "matrix"))?;
            sequence(&pieces, g.num_qubits())
        }
    }
}

fn fractional_power(base: &Gate, exponent: Exponent) -> IrResult<Array2<Complex64>> {
    match decompose::power_rule(base, exponent) {
        Some(g) => g.matrix(),
        None => Err(IrError::unsupported(
            format!("({base})^{exponent}"),
            "matrix of a non-integer power",
        )),
    }
}
