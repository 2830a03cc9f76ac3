//! Pauli-sum Hamiltonians, their expectation values and Trotterized time
//! evolution.
//!
//! A [`Hamiltonian`] is a list of weighted Pauli strings `H = Σ c_j P_j`,
//! each on its own qubits. Term qubits are local: the circuit methods in this
//! module map them onto the circuit qubits passed by the caller.
//!
//! Time evolution `exp(-iHt)` is built from gate declarations so the
//! resulting circuit stays compact: one declaration holds a single step and
//! the circuit calls it once per step.

use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::argument::Argument;
use crate::circuit::Circuit;
use crate::error::{IrError, IrResult};
use crate::gate::{Gate, StandardGate};
use crate::gatedecl::GateDecl;
use crate::generalized::{PauliString, RPauli};
use crate::instruction::Instruction;
use crate::matrix;
use crate::operation::{GeneralizedOperation, Operation};
use crate::operator::Operator;

/// A weighted Pauli string `c · P` on distinct qubits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "HamiltonianTermRepr")]
pub struct HamiltonianTerm {
    coefficient: Argument,
    pauli: PauliString,
    qubits: Vec<usize>,
}

#[derive(Deserialize)]
struct HamiltonianTermRepr {
    coefficient: Argument,
    pauli: PauliString,
    qubits: Vec<usize>,
}

impl TryFrom<HamiltonianTermRepr> for HamiltonianTerm {
    type Error = IrError;

    fn try_from(r: HamiltonianTermRepr) -> IrResult<Self> {
        HamiltonianTerm::new(r.coefficient, r.pauli, r.qubits)
    }
}

impl HamiltonianTerm {
    /// Create a term with one qubit per Pauli letter.
    pub fn new(coefficient: impl Into<Argument>, pauli: PauliString, qubits: Vec<usize>) -> IrResult<Self> {
        if qubits.len() != pauli.num_qubits() {
            return Err(IrError::LengthMismatch {
                context: format!("Hamiltonian term {pauli}"),
                left: pauli.num_qubits(),
                right: qubits.len(),
            });
        }
        for (i, q) in qubits.iter().enumerate() {
            if qubits[..i].contains(q) {
                return Err(IrError::DuplicateTarget {
                    op: pauli.to_string(),
                    register: "qubits",
                    index: *q,
                });
            }
        }
        Ok(Self {
            coefficient: coefficient.into(),
            pauli,
            qubits,
        })
    }

    /// The weight `c`.
    pub fn coefficient(&self) -> &Argument {
        &self.coefficient
    }

    /// The Pauli string `P`.
    pub fn pauli(&self) -> &PauliString {
        &self.pauli
    }

    /// Qubits of the term, one per Pauli letter.
    pub fn qubits(&self) -> &[usize] {
        &self.qubits
    }

    /// `exp(-i c θ P / 2)` on the term's qubits. Named rotations are used
    /// for the one- and two-qubit strings that have one.
    pub fn rotation(&self, theta: &Argument) -> (Gate, Vec<usize>) {
        use StandardGate as G;
        let angle = self.coefficient.clone() * theta.clone();
        let qubits = self.qubits.clone();
        let gate = match self.pauli.to_string().as_str() {
            "X" => G::Rx(angle),
            "Y" => G::Ry(angle),
            "Z" => G::Rz(angle),
            "XX" => G::RXX(angle),
            "YY" => G::RYY(angle),
            "ZZ" => G::RZZ(angle),
            "ZX" => G::RZX(angle),
            "XZ" => return (G::RZX(angle).into(), qubits.into_iter().rev().collect()),
            _ => return (RPauli::new(self.pauli.clone(), angle).into(), qubits),
        };
        (gate.into(), qubits)
    }
}

impl fmt::Display for HamiltonianTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let qubits: Vec<String> = self.qubits.iter().map(ToString::to_string).collect();
        write!(f, "{} * {} @ q[{}]", self.coefficient, self.pauli, qubits.join(","))
    }
}

/// A sum of weighted Pauli strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hamiltonian {
    terms: Vec<HamiltonianTerm>,
}

impl Hamiltonian {
    /// Create an empty Hamiltonian.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from a list of terms.
    pub fn from_terms(terms: Vec<HamiltonianTerm>) -> Self {
        Self { terms }
    }

    /// Add `coefficient · letters` on `qubits`.
    ///
    /// ```
    /// use qcir_ir::Hamiltonian;
    ///
    /// let mut h = Hamiltonian::new();
    /// h.push(0.5, "ZZ", &[0, 1]).unwrap().push(-1.0, "X", &[2]).unwrap();
    /// assert_eq!(h.num_qubits(), 3);
    /// ```
    pub fn push(&mut self, coefficient: impl Into<Argument>, letters: &str, qubits: &[usize]) -> IrResult<&mut Self> {
        let term = HamiltonianTerm::new(coefficient, PauliString::new(letters)?, qubits.to_vec())?;
        self.terms.push(term);
        Ok(self)
    }

    /// Add a prepared term.
    pub fn add_term(&mut self, term: HamiltonianTerm) -> &mut Self {
        self.terms.push(term);
        self
    }

    /// The terms, in insertion order.
    pub fn terms(&self) -> &[HamiltonianTerm] {
        &self.terms
    }

    /// Iterate over the terms.
    pub fn iter(&self) -> std::slice::Iter<'_, HamiltonianTerm> {
        self.terms.iter()
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether there are no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// One more than the highest qubit used by any term.
    pub fn num_qubits(&self) -> usize {
        self.terms
            .iter()
            .flat_map(|t| t.qubits.iter())
            .max()
            .map_or(0, |&q| q + 1)
    }

    /// Check if any coefficient is symbolic.
    pub fn is_symbolic(&self) -> bool {
        self.terms.iter().any(|t| t.coefficient.is_symbolic())
    }

    /// Substitute symbol bindings in every coefficient.
    pub fn substitute(&self, bindings: &HashMap<String, Argument>) -> Hamiltonian {
        Hamiltonian {
            terms: self
                .terms
                .iter()
                .map(|t| HamiltonianTerm {
                    coefficient: t.coefficient.substitute(bindings),
                    ..t.clone()
                })
                .collect(),
        }
    }

    /// Dense matrix over [`Hamiltonian::num_qubits`] qubits, big-endian.
    pub fn matrix(&self) -> IrResult<Array2<Complex64>> {
        let n = self.num_qubits();
        let dim = 1usize << n;
        let mut h = Array2::<Complex64>::zeros((dim, dim));
        for term in &self.terms {
            let c = Complex64::new(term.coefficient.as_f64()?, 0.0);
            let p = Gate::PauliString(term.pauli.clone()).matrix()?;
            h = h + matrix::embed(&p, &term.qubits, n) * c;
        }
        Ok(h)
    }
}

impl<'a> IntoIterator for &'a Hamiltonian {
    type Item = &'a HamiltonianTerm;
    type IntoIter = std::slice::Iter<'a, HamiltonianTerm>;

    fn into_iter(self) -> Self::IntoIter {
        self.terms.iter()
    }
}

impl FromIterator<HamiltonianTerm> for Hamiltonian {
    fn from_iter<I: IntoIterator<Item = HamiltonianTerm>>(iter: I) -> Self {
        Self::from_terms(iter.into_iter().collect())
    }
}

impl fmt::Display for Hamiltonian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-qubit Hamiltonian with {} terms",
            self.num_qubits(),
            self.terms.len()
        )?;
        for term in &self.terms {
            write!(f, "\n  {term}")?;
        }
        Ok(())
    }
}

fn check_register(h: &Hamiltonian, qubits: &[usize]) -> IrResult<()> {
    if h.is_empty() {
        return Err(IrError::invalid("hamiltonian", "has no terms"));
    }
    if qubits.len() != h.num_qubits() {
        return Err(IrError::LengthMismatch {
            context: "Hamiltonian qubits".into(),
            left: h.num_qubits(),
            right: qubits.len(),
        });
    }
    for (i, q) in qubits.iter().enumerate() {
        if qubits[..i].contains(q) {
            return Err(IrError::DuplicateTarget {
                op: "hamiltonian".into(),
                register: "qubits",
                index: *q,
            });
        }
    }
    Ok(())
}

fn check_order(name: &str, order: usize) -> IrResult<()> {
    if order < 2 || order % 2 != 0 {
        return Err(IrError::invalid(
            name,
            format!("order must be an even integer >= 2, got {order}"),
        ));
    }
    Ok(())
}

fn time_step(t: Argument, steps: usize) -> IrResult<Argument> {
    if steps == 0 {
        return Err(IrError::invalid("trotter", "needs at least one step"));
    }
    let n = i64::try_from(steps).map_err(|_| IrError::Domain("too many Trotter steps".into()))?;
    Ok(t / n)
}

/// Second-order symmetric step: every term rotated by `λ/2`, forward then
/// backward.
fn strang_step(name: &str, h: &Hamiltonian) -> IrResult<Arc<GateDecl>> {
    GateDecl::build(name, &["λ"], |body, args| {
        for term in h.iter().chain(h.iter().rev()) {
            let (gate, qubits) = term.rotation(&args[0]);
            body.gate(gate, &qubits)?;
        }
        Ok(())
    })
}

/// Step calling `inner` once per weight, each with `weight · λ`.
fn compose(name: &str, inner: &Arc<GateDecl>, weights: &[f64]) -> IrResult<Arc<GateDecl>> {
    let qubits: Vec<usize> = (0..inner.num_qubits()).collect();
    GateDecl::build(name, &["λ"], |body, args| {
        for &w in weights {
            body.gate(inner.call(vec![Argument::from(w) * args[0].clone()])?, &qubits)?;
        }
        Ok(())
    })
}

impl Circuit {
    /// Push the expectation value of `h` on `qubits`.
    ///
    /// Term `j` writes `c_j ⟨P_j⟩` to z-variable `first_zvar + j` (by default
    /// the first unused one) and a final `Add` sums them into `first_zvar`.
    pub fn push_expval(&mut self, h: &Hamiltonian, qubits: &[usize], first_zvar: Option<usize>) -> IrResult<&mut Self> {
        check_register(h, qubits)?;
        let first = first_zvar.unwrap_or(self.num_zvars());
        let mut new = Vec::with_capacity(2 * h.len() + 1);
        for (zvar, term) in (first..).zip(h.iter()) {
            let targets = term.qubits.iter().map(|&q| qubits[q]).collect();
            let observable = Operator::from(Gate::PauliString(term.pauli.clone()));
            new.push(Instruction::new(
                Operation::ExpectationValue(observable),
                targets,
                vec![],
                vec![zvar],
            )?);
            new.push(Instruction::new(
                GeneralizedOperation::multiply(1, term.coefficient.clone())?,
                vec![],
                vec![],
                vec![zvar],
            )?);
        }
        new.push(Instruction::new(
            GeneralizedOperation::add(h.len(), 0)?,
            vec![],
            vec![],
            (first..first + h.len()).collect(),
        )?);
        self.extend(new);
        Ok(self)
    }

    /// First-order product formula: `steps` calls of a `trotter(dt)` gate
    /// applying `exp(-i c_j P_j dt)` for every term in order, `dt = t / steps`.
    pub fn push_lie_trotter(
        &mut self,
        h: &Hamiltonian,
        qubits: &[usize],
        t: impl Into<Argument>,
        steps: usize,
    ) -> IrResult<&mut Self> {
        check_register(h, qubits)?;
        let dt = time_step(t.into(), steps)?;
        let decl = GateDecl::build("trotter", &["Δt"], |body, args| {
            let theta = args[0].clone() * 2;
            for term in h {
                let (gate, q) = term.rotation(&theta);
                body.gate(gate, &q)?;
            }
            Ok(())
        })?;
        self.push_steps(&decl, dt, qubits, steps)
    }

    /// Suzuki product formula of the given even `order` (2 is the usual
    /// choice). Orders above 2 nest the lower order as
    /// `S(p λ)² · S((1 - 4p) λ) · S(p λ)²` with `p = 1 / (4 - 4^(1/(2k-1)))`.
    pub fn push_suzuki_trotter(
        &mut self,
        h: &Hamiltonian,
        qubits: &[usize],
        t: impl Into<Argument>,
        steps: usize,
        order: usize,
    ) -> IrResult<&mut Self> {
        check_register(h, qubits)?;
        check_order("suzukitrotter", order)?;
        let dt = time_step(t.into(), steps)?;
        let mut decl = strang_step("suzukitrotter_2", h)?;
        for k in 2..=order / 2 {
            let p = 1.0 / (4.0 - 4f64.powf(1.0 / (2 * k - 1) as f64));
            decl = compose(&format!("suzukitrotter_{}", 2 * k), &decl, &[p, p, 1.0 - 4.0 * p, p, p])?;
        }
        self.push_steps(&decl, dt, qubits, steps)
    }

    /// Yoshida product formula of the given even `order` (4 is the usual
    /// choice). Each level is the symmetric triple `S(α λ) · S(β λ) · S(α λ)`
    /// with `α = 1 / (2 - 2^(1/(2k-1)))` and `β = 1 - 2α`.
    pub fn push_yoshida_trotter(
        &mut self,
        h: &Hamiltonian,
        qubits: &[usize],
        t: impl Into<Argument>,
        steps: usize,
        order: usize,
    ) -> IrResult<&mut Self> {
        check_register(h, qubits)?;
        check_order("yoshida", order)?;
        let dt = time_step(t.into(), steps)?;
        let mut decl = strang_step("yoshida_2", h)?;
        for k in 2..=order / 2 {
            let root = 2f64.powf(1.0 / (2 * k - 1) as f64);
            let alpha = 1.0 / (2.0 - root);
            let beta = -root / (2.0 - root);
            decl = compose(&format!("yoshida_{}", 2 * k), &decl, &[alpha, beta, alpha])?;
        }
        self.push_steps(&decl, dt, qubits, steps)
    }

    fn push_steps(&mut self, decl: &Arc<GateDecl>, dt: Argument, qubits: &[usize], steps: usize) -> IrResult<&mut Self> {
        let step = Gate::from(decl.call(vec![dt])?);
        for _ in 0..steps {
            self.gate(step.clone(), qubits)?;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distance(a: &Array2<Complex64>, b: &Array2<Complex64>) -> f64 {
        a.iter().zip(b.iter()).map(|(x, y)| (x - y).norm()).fold(0.0, f64::max)
    }

    fn evolve_exactly(a: f64, b: f64, t: f64) -> Array2<Complex64> {
        // exp(-i t (a X + b Z)) in closed form
        let r = a.hypot(b);
        let (c, s) = ((r * t).cos(), (r * t).sin());
        let i = Complex64::i();
        ndarray::array![
            [c - i * s * b / r, -i * s * a / r],
            [-i * s * a / r, c + i * s * b / r]
        ]
    }

    fn x_plus_z() -> Hamiltonian {
        let mut h = Hamiltonian::new();
        h.push(0.8, "X", &[0]).unwrap().push(0.6, "Z", &[0]).unwrap();
        h
    }

    #[test]
    fn test_term_validation() {
        let zz = PauliString::new("ZZ").unwrap();
        assert!(matches!(
            HamiltonianTerm::new(1.0, zz.clone(), vec![0]),
            Err(IrError::LengthMismatch { left: 2, right: 1, .. })
        ));
        assert!(matches!(
            HamiltonianTerm::new(1.0, zz.clone(), vec![3, 3]),
            Err(IrError::DuplicateTarget { index: 3, .. })
        ));
        let term = HamiltonianTerm::new(0.5, zz, vec![0, 2]).unwrap();
        assert_eq!(term.to_string(), "0.5 * ZZ @ q[0,2]");
    }

    #[test]
    fn test_hamiltonian_display_and_size() {
        let mut h = Hamiltonian::new();
        assert_eq!(h.num_qubits(), 0);
        h.push(0.5, "XZ", &[0, 1]).unwrap().push(-1, "Y", &[3]).unwrap();
        assert_eq!(h.num_qubits(), 4);
        assert_eq!(h.len(), 2);
        assert_eq!(
            h.to_string(),
            "4-qubit Hamiltonian with 2 terms\n  0.5 * XZ @ q[0,1]\n  -1 * Y @ q[3]"
        );
        assert!(h.push(1.0, "XQ", &[0, 1]).is_err());
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn test_matrix_is_big_endian() {
        let mut h = Hamiltonian::new();
        h.push(0.5, "Z", &[0]).unwrap().push(0.25, "X", &[1]).unwrap();
        let m = h.matrix().unwrap();
        assert_eq!(m.dim(), (4, 4));
        assert!((m[[0, 0]] - Complex64::new(0.5, 0.0)).norm() < 1e-12);
        assert!((m[[2, 2]] - Complex64::new(-0.5, 0.0)).norm() < 1e-12);
        assert!((m[[0, 1]] - Complex64::new(0.25, 0.0)).norm() < 1e-12);
        assert!(m[[0, 2]].norm() < 1e-12);
    }

    #[test]
    fn test_symbolic_coefficients() {
        let mut h = Hamiltonian::new();
        h.push(Argument::symbol("j"), "ZZ", &[0, 1]).unwrap();
        assert!(h.is_symbolic());
        assert!(matches!(h.matrix(), Err(IrError::UnboundSymbol(_))));

        let bound = h.substitute(&HashMap::from([("j".to_string(), Argument::from(2.0))]));
        assert!(!bound.is_symbolic());
        assert!((bound.matrix().unwrap()[[0, 0]] - Complex64::new(2.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_push_expval() {
        let mut h = Hamiltonian::new();
        h.push(1.0, "ZZ", &[0, 1]).unwrap();
        let mut c = Circuit::new();
        c.push_expval(&h, &[1, 2], None).unwrap();

        assert_eq!(c.len(), 3);
        assert_eq!((c.num_qubits(), c.num_zvars()), (3, 1));
        let first = &c.instructions()[0];
        assert_eq!(first.operation().name(), "expectationvalue");
        assert_eq!(first.qtargets(), &[1, 2]);
        assert_eq!(first.ztargets(), &[0]);
        assert_eq!(c.instructions()[1].operation().name(), "multiply");
        assert_eq!(c.instructions()[2].operation().name(), "add");

        let two = x_plus_z();
        c.push_expval(&two, &[0], None).unwrap();
        assert_eq!(c.num_zvars(), 3);
        assert_eq!(c.instructions()[7].ztargets(), &[1, 2]);
    }

    #[test]
    fn test_register_checks() {
        let mut h = Hamiltonian::new();
        h.push(1.0, "ZZ", &[0, 1]).unwrap();
        let mut c = Circuit::new();
        assert!(matches!(
            c.push_expval(&h, &[0], None),
            Err(IrError::LengthMismatch { .. })
        ));
        assert!(matches!(
            c.push_lie_trotter(&h, &[2, 2], 1.0, 1),
            Err(IrError::DuplicateTarget { .. })
        ));
        assert!(c.push_lie_trotter(&h, &[0, 1], 1.0, 0).is_err());
        assert!(c.push_suzuki_trotter(&h, &[0, 1], 1.0, 1, 3).is_err());
        assert!(c.push_yoshida_trotter(&h, &[0, 1], 1.0, 1, 0).is_err());
        assert!(c.push_expval(&Hamiltonian::new(), &[], None).is_err());
        assert!(c.is_empty());
    }

    #[test]
    fn test_lie_trotter_of_single_term_is_exact() {
        let mut h = Hamiltonian::new();
        h.push(0.7, "ZZ", &[0, 1]).unwrap();
        let mut c = Circuit::new();
        c.push_lie_trotter(&h, &[0, 1], 0.6, 3).unwrap();

        assert_eq!(c.len(), 3);
        assert_eq!(c.count_ops().get("trotter"), Some(&3));
        let expected = Gate::from(StandardGate::RZZ(Argument::from(2.0 * 0.7 * 0.6)))
            .matrix()
            .unwrap();
        assert!(distance(&c.matrix().unwrap(), &expected) < 1e-12);

        let flat = c.decompose().unwrap();
        assert!(!flat.count_ops().contains_key("trotter"));
        assert!(distance(&flat.matrix().unwrap(), &expected) < 1e-10);
    }

    #[test]
    fn test_commuting_terms_are_exact_at_any_order() {
        let mut h = Hamiltonian::new();
        h.push(0.3, "Z", &[0]).unwrap().push(0.7, "ZZ", &[0, 1]).unwrap();
        let mut exact = Circuit::new();
        exact.rz(2.0 * 0.3 * 1.5, 0).unwrap();
        exact.gate(StandardGate::RZZ(Argument::from(2.0 * 0.7 * 1.5)), &[0, 1]).unwrap();
        let exact = exact.matrix().unwrap();

        let mut suzuki = Circuit::new();
        suzuki.push_suzuki_trotter(&h, &[0, 1], 1.5, 2, 4).unwrap();
        assert_eq!(suzuki.count_ops().get("suzukitrotter_4"), Some(&2));
        assert!(distance(&suzuki.matrix().unwrap(), &exact) < 1e-10);

        let mut yoshida = Circuit::new();
        yoshida.push_yoshida_trotter(&h, &[0, 1], 1.5, 2, 4).unwrap();
        assert_eq!(yoshida.count_ops().get("yoshida_4"), Some(&2));
        assert!(distance(&yoshida.matrix().unwrap(), &exact) < 1e-10);
    }

    #[test]
    fn test_higher_orders_converge_faster() {
        let h = x_plus_z();
        let exact = evolve_exactly(0.8, 0.6, 1.0);
        let error = |c: &Circuit| distance(&c.matrix().unwrap(), &exact);
        let mut circuits = vec![Circuit::new(), Circuit::new(), Circuit::new(), Circuit::new()];
        circuits[0].push_lie_trotter(&h, &[0], 1.0, 4).unwrap();
        circuits[1].push_suzuki_trotter(&h, &[0], 1.0, 4, 2).unwrap();
        circuits[2].push_suzuki_trotter(&h, &[0], 1.0, 4, 4).unwrap();
        circuits[3].push_yoshida_trotter(&h, &[0], 1.0, 4, 4).unwrap();
        let [lie, s2, s4, y4] = [0, 1, 2, 3].map(|i| error(&circuits[i]));

        assert!(lie > 0.05, "{lie}");
        assert!(s2 < 1e-2 && s2 < lie / 10.0, "{s2}");
        assert!(s4 < 1e-4, "{s4}");
        assert!(y4 < 1e-3 && y4 < s2, "{y4}");
    }

    #[test]
    fn test_nested_steps_use_local_qubits() {
        let mut h = Hamiltonian::new();
        h.push(1.0, "XX", &[0, 1]).unwrap();
        let mut c = Circuit::new();
        c.push_suzuki_trotter(&h, &[4, 7], 1.0, 1, 6).unwrap();

        let Operation::Gate(Gate::Call(call)) = c.instructions()[0].operation() else {
            panic!("expected a gate call");
        };
        assert_eq!(call.decl().name(), "suzukitrotter_6");
        assert_eq!(call.decl().num_qubits(), 2);
        assert!(call.decl().body().iter().all(|i| i.qtargets() == [0, 1]));

        let flat = c.decompose().unwrap();
        assert!(flat.iter().all(|i| i.qtargets().iter().all(|q| [4, 7].contains(q))));
        assert!(flat.iter().all(|i| !matches!(i.operation(), Operation::Gate(Gate::Call(_)))));
    }
}
