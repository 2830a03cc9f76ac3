//! Kraus channels modelling open-system noise.
//!
//! A channel is described by a list of Kraus operators `{E_k}` with
//! `Σ E_k† E_k = I`. Built-in channels carry symbolic parameters; their
//! dense operators are only available once every parameter is numeric.

use ndarray::{Array2, array};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::argument::Argument;
use crate::error::{IrError, IrResult};
use crate::gate::{Gate, StandardGate};
use crate::generalized::{Pauli, PauliString};
use crate::matrix;
use crate::operator::{Operator, OperatorKind, SimpleOperator};

const PROBABILITY_TOLERANCE: f64 = 1e-8;

/// Kinds of built-in Kraus channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KrausKind {
    /// Reset to `|+⟩`.
    ResetX,
    /// Reset to `|+i⟩`.
    ResetY,
    /// Reset to `|0⟩`.
    ResetZ,
    /// Amplitude damping with rate γ.
    AmplitudeDamping,
    /// Generalized amplitude damping `(p, γ)`.
    GeneralizedAmplitudeDamping,
    /// Phase amplitude damping `(p, γ, β)`.
    PhaseAmplitudeDamping,
    /// Thermal relaxation `(T1, T2, t, n_e)`.
    ThermalNoise,
    /// Bit flip with probability p.
    PauliX,
    /// Y flip with probability p.
    PauliY,
    /// Phase flip with probability p.
    PauliZ,
    /// Non-selective X-basis measurement.
    ProjectiveNoiseX,
    /// Non-selective Y-basis measurement.
    ProjectiveNoiseY,
    /// Non-selective Z-basis measurement.
    ProjectiveNoiseZ,
}

impl KrausKind {
    /// All kinds, in wire order.
    pub const ALL: [KrausKind; 13] = [
        KrausKind::ResetX,
        KrausKind::ResetY,
        KrausKind::ResetZ,
        KrausKind::AmplitudeDamping,
        KrausKind::GeneralizedAmplitudeDamping,
        KrausKind::PhaseAmplitudeDamping,
        KrausKind::ThermalNoise,
        KrausKind::PauliX,
        KrausKind::PauliY,
        KrausKind::PauliZ,
        KrausKind::ProjectiveNoiseX,
        KrausKind::ProjectiveNoiseY,
        KrausKind::ProjectiveNoiseZ,
    ];

    /// Channel name.
    pub fn name(self) -> &'static str {
        match self {
            KrausKind::ResetX => "resetx",
            KrausKind::ResetY => "resety",
            KrausKind::ResetZ => "reset",
            KrausKind::AmplitudeDamping => "ampdamp",
            KrausKind::GeneralizedAmplitudeDamping => "genampdamp",
            KrausKind::PhaseAmplitudeDamping => "phaseampdamp",
            KrausKind::ThermalNoise => "thermalnoise",
            KrausKind::PauliX => "paulix",
            KrausKind::PauliY => "pauliy",
            KrausKind::PauliZ => "pauliz",
            KrausKind::ProjectiveNoiseX => "projectivenoisex",
            KrausKind::ProjectiveNoiseY => "projectivenoisey",
            KrausKind::ProjectiveNoiseZ => "projectivenoisez",
        }
    }

    /// Number of parameters.
    pub fn num_parameters(self) -> usize {
        match self {
            KrausKind::AmplitudeDamping
            | KrausKind::PauliX
            | KrausKind::PauliY
            | KrausKind::PauliZ => 1,
            KrausKind::GeneralizedAmplitudeDamping => 2,
            KrausKind::PhaseAmplitudeDamping => 3,
            KrausKind::ThermalNoise => 4,
            _ => 0,
        }
    }

    /// Whether every Kraus operator is proportional to a unitary.
    pub fn is_mixed_unitary(self) -> bool {
        matches!(
            self,
            KrausKind::PauliX | KrausKind::PauliY | KrausKind::PauliZ
        )
    }
}

/// A built-in channel with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SimpleKrausRepr")]
pub struct SimpleKraus {
    kind: KrausKind,
    params: Vec<Argument>,
}

#[derive(Deserialize)]
struct SimpleKrausRepr {
    kind: KrausKind,
    params: Vec<Argument>,
}

impl TryFrom<SimpleKrausRepr> for SimpleKraus {
    type Error = IrError;

    fn try_from(r: SimpleKrausRepr) -> IrResult<Self> {
        SimpleKraus::new(r.kind, r.params)
    }
}

fn numeric(arg: &Argument) -> Option<f64> {
    if arg.is_symbolic() {
        None
    } else {
        arg.as_f64().ok()
    }
}

fn check_unit_interval(channel: &str, name: &str, arg: &Argument) -> IrResult<()> {
    match numeric(arg) {
        Some(v) if !(0.0..=1.0).contains(&v) => Err(IrError::invalid(
            channel,
            format!("{name} must be between 0 and 1, got {v}"),
        )),
        _ => Ok(()),
    }
}

impl SimpleKraus {
    /// Create a channel, validating the parameter count and numeric ranges.
    pub fn new(kind: KrausKind, params: Vec<Argument>) -> IrResult<Self> {
        let name = kind.name();
        if params.len() != kind.num_parameters() {
            return Err(IrError::invalid(
                name,
                format!(
                    "expects {} parameters, got {}",
                    kind.num_parameters(),
                    params.len()
                ),
            ));
        }
        match kind {
            KrausKind::AmplitudeDamping => check_unit_interval(name, "gamma", &params[0])?,
            KrausKind::PauliX | KrausKind::PauliY | KrausKind::PauliZ => {
                check_unit_interval(name, "p", &params[0])?
            }
            KrausKind::GeneralizedAmplitudeDamping => {
                check_unit_interval(name, "p", &params[0])?;
                check_unit_interval(name, "gamma", &params[1])?;
            }
            KrausKind::PhaseAmplitudeDamping => {
                check_unit_interval(name, "p", &params[0])?;
                check_unit_interval(name, "gamma", &params[1])?;
                check_unit_interval(name, "beta", &params[2])?;
            }
            KrausKind::ThermalNoise => {
                let [t1, t2, time, ne] = [0, 1, 2, 3].map(|i| numeric(&params[i]));
                if t1.is_some_and(|v| v < 0.0) {
                    return Err(IrError::invalid(name, "T1 must be >= 0"));
                }
                if let (Some(t1), Some(t2)) = (t1, t2) {
                    if t2 > 2.0 * t1 {
                        return Err(IrError::invalid(name, "T2 must be <= 2 * T1"));
                    }
                }
                if time.is_some_and(|v| v < 0.0) {
                    return Err(IrError::invalid(name, "time must be >= 0"));
                }
                if ne.is_some_and(|v| !(0.0..=1.0).contains(&v)) {
                    return Err(IrError::invalid(name, "ne must be between 0 and 1"));
                }
            }
            _ => {}
        }
        Ok(Self { kind, params })
    }

    /// Reset to `|0⟩`.
    pub fn reset() -> Self {
        Self {
            kind: KrausKind::ResetZ,
            params: vec![],
        }
    }

    /// The channel kind.
    pub fn kind(&self) -> KrausKind {
        self.kind
    }

    /// The channel parameters.
    pub fn parameters(&self) -> &[Argument] {
        &self.params
    }

    fn values(&self) -> IrResult<Vec<f64>> {
        self.params.iter().map(Argument::as_f64).collect()
    }

    /// Dense Kraus operators.
    pub fn kraus_matrices(&self) -> IrResult<Vec<Array2<Complex64>>> {
        let p = self.values()?;
        let c = |x: f64| Complex64::new(x, 0.0);
        let z = c(0.0);
        let sigma_minus = |a: f64| array![[z, c(a)], [z, z]];
        let sigma_plus = |a: f64| array![[z, z], [c(a), z]];
        let diag = |a: f64, b: f64| array![[c(a), z], [z, c(b)]];
        let unit = |k: OperatorKind| SimpleOperator::unit(k).matrix();
        let pauli = |letter: Pauli, prob: f64| -> Vec<Array2<Complex64>> {
            vec![
                matrix::identity(1) * c((1.0 - prob).sqrt()),
                pauli_matrix(letter) * c(prob.sqrt()),
            ]
        };
        Ok(match self.kind {
            KrausKind::ResetZ => vec![diag(1.0, 0.0), sigma_minus(1.0)],
            KrausKind::ResetX | KrausKind::ResetY => {
                let basis = if self.kind == KrausKind::ResetX {
                    StandardGate::H
                } else {
                    StandardGate::HYZ
                };
                let u = Gate::Standard(basis).matrix()?;
                let u_dag = matrix::adjoint(&u);
                vec![
                    u.dot(&diag(1.0, 0.0)).dot(&u_dag),
                    u.dot(&sigma_minus(1.0)).dot(&u_dag),
                ]
            }
            KrausKind::AmplitudeDamping => {
                let g = p[0];
                vec![diag(1.0, (1.0 - g).sqrt()), sigma_minus(g.sqrt())]
            }
            KrausKind::GeneralizedAmplitudeDamping => {
                let (pp, g) = (p[0], p[1]);
                let (sp, sq, sg) = (pp.sqrt(), (1.0 - pp).sqrt(), (1.0 - g).sqrt());
                vec![
                    diag(sp, sp * sg),
                    diag(sq * sg, sq),
                    sigma_minus(sp * g.sqrt()),
                    sigma_plus(sq * g.sqrt()),
                ]
            }
            KrausKind::PhaseAmplitudeDamping => phase_amplitude_damping(p[0], p[1], p[2])?,
            KrausKind::ThermalNoise => {
                let (t1, t2, time, ne) = (p[0], p[1], p[2], p[3]);
                if t1 <= 0.0 || t2 <= 0.0 {
                    return Err(IrError::Domain(
                        "thermal noise needs positive T1 and T2".into(),
                    ));
                }
                let gamma = 1.0 - (-time / t1).exp();
                let beta = 0.5 * (1.0 - (-(1.0 / t2 - 1.0 / (2.0 * t1)) * time).exp());
                phase_amplitude_damping(1.0 - ne, gamma, beta)?
            }
            KrausKind::PauliX => pauli(Pauli::X, p[0]),
            KrausKind::PauliY => pauli(Pauli::Y, p[0]),
            KrausKind::PauliZ => pauli(Pauli::Z, p[0]),
            KrausKind::ProjectiveNoiseX => {
                vec![unit(OperatorKind::ProjectorX0)?, unit(OperatorKind::ProjectorX1)?]
            }
            KrausKind::ProjectiveNoiseY => {
                vec![unit(OperatorKind::ProjectorY0)?, unit(OperatorKind::ProjectorY1)?]
            }
            KrausKind::ProjectiveNoiseZ => vec![diag(1.0, 0.0), diag(0.0, 1.0)],
        })
    }

    fn map_parameters(&self, f: &impl Fn(&Argument) -> Argument) -> Self {
        Self {
            kind: self.kind,
            params: self.params.iter().map(f).collect(),
        }
    }
}

fn phase_amplitude_damping(p: f64, gamma: f64, beta: f64) -> IrResult<Vec<Array2<Complex64>>> {
    let c = |x: f64| Complex64::new(x, 0.0);
    let z = c(0.0);
    let denom = 1.0 - gamma * p;
    if denom <= 0.0 {
        return Err(IrError::Domain(
            "phase amplitude damping is singular for gamma * p = 1".into(),
        ));
    }
    let k = (1.0 - gamma).sqrt() * (1.0 - 2.0 * beta) / denom;
    let pref1 = denom.sqrt();
    let pref2 = (1.0 - gamma * (1.0 - p) - denom * k * k).max(0.0).sqrt();
    Ok(vec![
        array![[c(pref1 * k), z], [z, c(pref1)]],
        array![[c(pref2), z], [z, z]],
        array![[z, c((gamma * p).sqrt())], [z, z]],
        array![[z, z], [c((gamma * (1.0 - p)).sqrt()), z]],
    ])
}

pub(crate) fn pauli_matrix(p: Pauli) -> Array2<Complex64> {
    let o = Complex64::new(1.0, 0.0);
    let z = Complex64::new(0.0, 0.0);
    let i = Complex64::i();
    match p {
        Pauli::I => array![[o, z], [z, o]],
        Pauli::X => array![[z, o], [o, z]],
        Pauli::Y => array![[z, -i], [i, z]],
        Pauli::Z => array![[o, z], [z, -o]],
    }
}

/// Channel given by an explicit list of Kraus operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CustomKrausRepr")]
pub struct CustomKraus {
    num_qubits: usize,
    operators: Vec<Operator>,
}

#[derive(Deserialize)]
struct CustomKrausRepr {
    num_qubits: usize,
    operators: Vec<Operator>,
}

impl TryFrom<CustomKrausRepr> for CustomKraus {
    type Error = IrError;

    fn try_from(r: CustomKrausRepr) -> IrResult<Self> {
        let kraus = CustomKraus::new(r.operators)?;
        if kraus.num_qubits != r.num_qubits {
            return Err(IrError::LengthMismatch {
                context: "kraus operator qubits".into(),
                left: r.num_qubits,
                right: kraus.num_qubits,
            });
        }
        Ok(kraus)
    }
}

impl CustomKraus {
    /// Create from operators that all act on the same number of qubits.
    pub fn new(operators: Vec<Operator>) -> IrResult<Self> {
        let first = operators
            .first()
            .ok_or_else(|| IrError::invalid("kraus", "needs at least one operator"))?;
        let num_qubits = first.num_qubits();
        for op in &operators {
            if op.num_qubits() != num_qubits {
                return Err(IrError::LengthMismatch {
                    context: "kraus operator qubits".into(),
                    left: num_qubits,
                    right: op.num_qubits(),
                });
            }
        }
        Ok(Self {
            num_qubits,
            operators,
        })
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// The Kraus operators.
    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }
}

/// Channel applying one of several unitaries with given probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MixedUnitaryRepr")]
pub struct MixedUnitary {
    terms: Vec<(Argument, Gate)>,
}

#[derive(Deserialize)]
struct MixedUnitaryRepr {
    terms: Vec<(Argument, Gate)>,
}

impl TryFrom<MixedUnitaryRepr> for MixedUnitary {
    type Error = IrError;

    fn try_from(r: MixedUnitaryRepr) -> IrResult<Self> {
        MixedUnitary::new(r.terms)
    }
}

fn check_distribution(context: &str, probs: &[&Argument]) -> IrResult<()> {
    let mut total = 0.0;
    let mut all_numeric = true;
    for p in probs {
        match numeric(p) {
            Some(v) if v < 0.0 => {
                return Err(IrError::InvalidProbability {
                    context: context.into(),
                    reason: format!("negative probability {v}"),
                });
            }
            Some(v) => total += v,
            None => all_numeric = false,
        }
    }
    if all_numeric && (total - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(IrError::InvalidProbability {
            context: context.into(),
            reason: format!("probabilities sum to {total}, not 1"),
        });
    }
    Ok(())
}

impl MixedUnitary {
    /// Create from `(probability, gate)` pairs acting on the same qubits.
    pub fn new(terms: Vec<(Argument, Gate)>) -> IrResult<Self> {
        let (_, first) = terms
            .first()
            .ok_or_else(|| IrError::invalid("mixedunitary", "needs at least one term"))?;
        let n = first.num_qubits();
        if let Some((_, g)) = terms.iter().find(|(_, g)| g.num_qubits() != n) {
            return Err(IrError::LengthMismatch {
                context: "mixed unitary gate qubits".into(),
                left: n,
                right: g.num_qubits(),
            });
        }
        let probs: Vec<&Argument> = terms.iter().map(|(p, _)| p).collect();
        check_distribution("mixedunitary", &probs)?;
        Ok(Self { terms })
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.terms.first().map_or(0, |(_, g)| g.num_qubits())
    }

    /// The `(probability, gate)` terms.
    pub fn terms(&self) -> &[(Argument, Gate)] {
        &self.terms
    }
}

/// Channel applying Pauli strings with given probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PauliChannelRepr")]
pub struct PauliChannel {
    terms: Vec<(Argument, PauliString)>,
}

#[derive(Deserialize)]
struct PauliChannelRepr {
    terms: Vec<(Argument, PauliString)>,
}

impl TryFrom<PauliChannelRepr> for PauliChannel {
    type Error = IrError;

    fn try_from(r: PauliChannelRepr) -> IrResult<Self> {
        let (probabilities, paulis) = r.terms.into_iter().unzip();
        PauliChannel::new(probabilities, paulis)
    }
}

impl PauliChannel {
    /// Create from parallel lists of probabilities and Pauli strings.
    pub fn new(probabilities: Vec<Argument>, paulis: Vec<PauliString>) -> IrResult<Self> {
        if probabilities.len() != paulis.len() {
            return Err(IrError::LengthMismatch {
                context: "pauli channel".into(),
                left: probabilities.len(),
                right: paulis.len(),
            });
        }
        let first = paulis
            .first()
            .ok_or_else(|| IrError::invalid("paulichannel", "needs at least one Pauli string"))?;
        let n = first.num_qubits();
        if let Some(p) = paulis.iter().find(|p| p.num_qubits() != n) {
            return Err(IrError::LengthMismatch {
                context: "pauli string length".into(),
                left: n,
                right: p.num_qubits(),
            });
        }
        check_distribution("paulichannel", &probabilities.iter().collect::<Vec<_>>())?;
        Ok(Self {
            terms: probabilities.into_iter().zip(paulis).collect(),
        })
    }

    /// Parse the Pauli strings from letters.
    pub fn from_letters(probabilities: Vec<Argument>, letters: &[&str]) -> IrResult<Self> {
        let paulis = letters
            .iter()
            .map(|s| PauliString::new(s))
            .collect::<IrResult<Vec<_>>>()?;
        Self::new(probabilities, paulis)
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.terms.first().map_or(0, |(_, p)| p.num_qubits())
    }

    /// The `(probability, pauli)` terms.
    pub fn terms(&self) -> &[(Argument, PauliString)] {
        &self.terms
    }
}

/// A noise channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "KrausChannelRepr")]
pub enum KrausChannel {
    /// A built-in channel.
    Simple(SimpleKraus),
    /// An explicit operator list.
    Custom(CustomKraus),
    /// Probabilistic mixture of gates.
    MixedUnitary(MixedUnitary),
    /// Probabilistic mixture of Pauli strings.
    Pauli(PauliChannel),
    /// Depolarizing noise on `num_qubits` qubits.
    Depolarizing {
        /// Number of qubits.
        num_qubits: usize,
        /// Depolarizing probability.
        probability: Argument,
    },
}

#[derive(Deserialize)]
enum KrausChannelRepr {
    Simple(SimpleKraus),
    Custom(CustomKraus),
    MixedUnitary(MixedUnitary),
    Pauli(PauliChannel),
    Depolarizing { num_qubits: usize, probability: Argument },
}

impl TryFrom<KrausChannelRepr> for KrausChannel {
    type Error = IrError;

    fn try_from(r: KrausChannelRepr) -> IrResult<Self> {
        Ok(match r {
            KrausChannelRepr::Simple(k) => KrausChannel::Simple(k),
            KrausChannelRepr::Custom(k) => KrausChannel::Custom(k),
            KrausChannelRepr::MixedUnitary(k) => KrausChannel::MixedUnitary(k),
            KrausChannelRepr::Pauli(k) => KrausChannel::Pauli(k),
            KrausChannelRepr::Depolarizing {
                num_qubits,
                probability,
            } => KrausChannel::depolarizing(num_qubits, probability)?,
        })
    }
}

impl KrausChannel {
    /// Built-in channel without parameters, e.g. a reset.
    pub fn simple(kind: KrausKind, params: Vec<Argument>) -> IrResult<Self> {
        SimpleKraus::new(kind, params).map(KrausChannel::Simple)
    }

    /// Depolarizing channel, validating `0 <= p <= 1` when numeric.
    pub fn depolarizing(num_qubits: usize, probability: impl Into<Argument>) -> IrResult<Self> {
        if num_qubits == 0 {
            return Err(IrError::invalid("depolarizing", "needs at least one qubit"));
        }
        let probability = probability.into();
        check_unit_interval("depolarizing", "p", &probability)?;
        Ok(KrausChannel::Depolarizing {
            num_qubits,
            probability,
        })
    }

    /// Get the name of this channel.
    pub fn name(&self) -> &str {
        match self {
            KrausChannel::Simple(k) => k.kind.name(),
            KrausChannel::Custom(_) => "kraus",
            KrausChannel::MixedUnitary(_) => "mixedunitary",
            KrausChannel::Pauli(_) => "paulichannel",
            KrausChannel::Depolarizing { .. } => "depolarizing",
        }
    }

    /// Number of qubits the channel acts on.
    pub fn num_qubits(&self) -> usize {
        match self {
            KrausChannel::Simple(_) => 1,
            KrausChannel::Custom(k) => k.num_qubits,
            KrausChannel::MixedUnitary(m) => m.num_qubits(),
            KrausChannel::Pauli(p) => p.num_qubits(),
            KrausChannel::Depolarizing { num_qubits, .. } => *num_qubits,
        }
    }

    /// Parameters of the channel.
    pub fn parameters(&self) -> Vec<Argument> {
        match self {
            KrausChannel::Simple(k) => k.params.clone(),
            KrausChannel::Custom(k) => k.operators.iter().flat_map(Operator::parameters).collect(),
            KrausChannel::MixedUnitary(m) => m.terms.iter().map(|(p, _)| p.clone()).collect(),
            KrausChannel::Pauli(p) => p.terms.iter().map(|(p, _)| p.clone()).collect(),
            KrausChannel::Depolarizing { probability, .. } => vec![probability.clone()],
        }
    }

    /// Whether the channel is a probabilistic mixture of unitaries.
    pub fn is_mixed_unitary(&self) -> bool {
        match self {
            KrausChannel::Simple(k) => k.kind.is_mixed_unitary(),
            KrausChannel::Custom(_) => false,
            _ => true,
        }
    }

    /// Rebuild with every argument passed through `f`.
    pub fn map_arguments(&self, f: &impl Fn(&Argument) -> Argument) -> KrausChannel {
        match self {
            KrausChannel::Simple(k) => KrausChannel::Simple(k.map_parameters(f)),
            KrausChannel::Custom(k) => KrausChannel::Custom(CustomKraus {
                num_qubits: k.num_qubits,
                operators: k.operators.iter().map(|o| o.map_arguments(f)).collect(),
            }),
            KrausChannel::MixedUnitary(m) => KrausChannel::MixedUnitary(MixedUnitary {
                terms: m
                    .terms
                    .iter()
                    .map(|(p, g)| (f(p), g.map_arguments(f)))
                    .collect(),
            }),
            KrausChannel::Pauli(p) => KrausChannel::Pauli(PauliChannel {
                terms: p.terms.iter().map(|(a, s)| (f(a), s.clone())).collect(),
            }),
            KrausChannel::Depolarizing {
                num_qubits,
                probability,
            } => KrausChannel::Depolarizing {
                num_qubits: *num_qubits,
                probability: f(probability),
            },
        }
    }

    /// Dense Kraus operators, big-endian in the channel's targets.
    pub fn kraus_operators(&self) -> IrResult<Vec<Array2<Complex64>>> {
        match self {
            KrausChannel::Simple(k) => k.kraus_matrices(),
            KrausChannel::Custom(k) => k.operators.iter().map(Operator::matrix).collect(),
            KrausChannel::MixedUnitary(m) => m
                .terms
                .iter()
                .map(|(p, g)| Ok(g.matrix()? * Complex64::new(p.as_f64()?.sqrt(), 0.0)))
                .collect(),
            KrausChannel::Pauli(p) => p
                .terms
                .iter()
                .map(|(prob, s)| {
                    Ok(pauli_string_matrix(s) * Complex64::new(prob.as_f64()?.sqrt(), 0.0))
                })
                .collect(),
            KrausChannel::Depolarizing {
                num_qubits,
                probability,
            } => {
                let p = probability.as_f64()?;
                let n = u32::try_from(*num_qubits)
                    .map_err(|_| IrError::Domain("depolarizing channel too large".into()))?;
                let others = 4f64.powi(n as i32) - 1.0;
                let mut ops = vec![matrix::identity(*num_qubits) * Complex64::new((1.0 - p).sqrt(), 0.0)];
                let weight = Complex64::new((p / others).sqrt(), 0.0);
                for s in all_pauli_strings(*num_qubits).into_iter().skip(1) {
                    ops.push(pauli_string_matrix(&s) * weight);
                }
                Ok(ops)
            }
        }
    }
}

/// Dense matrix of a Pauli string, first letter on the most significant qubit.
pub(crate) fn pauli_string_matrix(s: &PauliString) -> Array2<Complex64> {
    s.paulis()
        .iter()
        .fold(Array2::eye(1), |acc, &p| matrix::kron(&acc, &pauli_matrix(p)))
}

fn all_pauli_strings(n: usize) -> Vec<PauliString> {
    const LETTERS: [char; 4] = ['I', 'X', 'Y', 'Z'];
    let mut words = vec![String::new()];
    for _ in 0..n {
        words = words
            .into_iter()
            .flat_map(|w| LETTERS.iter().map(move |c| format!("{w}{c}")))
            .collect();
    }
    words
        .iter()
        .filter_map(|w| PauliString::new(w).ok())
        .collect()
}

impl fmt::Display for KrausChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.parameters().iter().map(ToString::to_string).collect();
        match self {
            KrausChannel::Pauli(p) => {
                let terms: Vec<String> = p.terms.iter().map(|(a, s)| format!("{a}:{s}")).collect();
                write!(f, "paulichannel({})", terms.join(", "))
            }
            KrausChannel::Depolarizing {
                num_qubits,
                probability,
            } => write!(f, "depolarizing({num_qubits}, {probability})"),
            KrausChannel::Custom(k) => write!(f, "kraus({} ops)", k.operators.len()),
            _ if params.is_empty() => write!(f, "{}", self.name()),
            _ => write!(f, "{}({})", self.name(), params.join(", ")),
        }
    }
}

impl From<SimpleKraus> for KrausChannel {
    fn from(k: SimpleKraus) -> Self {
        KrausChannel::Simple(k)
    }
}

impl From<CustomKraus> for KrausChannel {
    fn from(k: CustomKraus) -> Self {
        KrausChannel::Custom(k)
    }
}

impl From<MixedUnitary> for KrausChannel {
    fn from(m: MixedUnitary) -> Self {
        KrausChannel::MixedUnitary(m)
    }
}

impl From<PauliChannel> for KrausChannel {
    fn from(p: PauliChannel) -> Self {
        KrausChannel::Pauli(p)
    }
}

/// Classical readout error on one measured bit.
///
/// `p0` is the probability of reading 1 when the outcome was 0, `p1` the
/// probability of reading 0 when it was 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ReadoutErrRepr")]
pub struct ReadoutErr {
    p0: Argument,
    p1: Argument,
}

#[derive(Deserialize)]
struct ReadoutErrRepr {
    p0: Argument,
    p1: Argument,
}

impl TryFrom<ReadoutErrRepr> for ReadoutErr {
    type Error = IrError;

    fn try_from(r: ReadoutErrRepr) -> IrResult<Self> {
        ReadoutErr::new(r.p0, r.p1)
    }
}

impl ReadoutErr {
    /// Create from the two flip probabilities, checked when numeric.
    pub fn new(p0: impl Into<Argument>, p1: impl Into<Argument>) -> IrResult<Self> {
        let (p0, p1) = (p0.into(), p1.into());
        check_unit_interval("readouterr", "p0", &p0)?;
        check_unit_interval("readouterr", "p1", &p1)?;
        Ok(Self { p0, p1 })
    }

    /// Create from a 2x2 confusion matrix whose row `i` holds the
    /// probabilities of reading 0 and 1 when the outcome was `i`.
    pub fn from_confusion_matrix(m: [[f64; 2]; 2]) -> IrResult<Self> {
        for row in &m {
            if row.iter().any(|v| !(0.0..=1.0).contains(v)) {
                return Err(IrError::InvalidProbability {
                    context: "readouterr".into(),
                    reason: "confusion matrix entries must be between 0 and 1".into(),
                });
            }
            if (row[0] + row[1] - 1.0).abs() > 1e-8 {
                return Err(IrError::InvalidProbability {
                    context: "readouterr".into(),
                    reason: format!("confusion matrix rows must sum to 1, got {}", row[0] + row[1]),
                });
            }
        }
        Ok(Self {
            p0: Argument::from(m[0][1]),
            p1: Argument::from(m[1][0]),
        })
    }

    /// Probability of flipping a 0 outcome.
    pub fn p0(&self) -> &Argument {
        &self.p0
    }

    /// Probability of flipping a 1 outcome.
    pub fn p1(&self) -> &Argument {
        &self.p1
    }

    /// Both probabilities, `p0` first.
    pub fn parameters(&self) -> Vec<Argument> {
        vec![self.p0.clone(), self.p1.clone()]
    }

    /// The confusion matrix `[[1-p0, p0], [p1, 1-p1]]`.
    pub fn confusion_matrix(&self) -> IrResult<[[f64; 2]; 2]> {
        let (p0, p1) = (self.p0.as_f64()?, self.p1.as_f64()?);
        Ok([[1.0 - p0, p0], [p1, 1.0 - p1]])
    }

    /// Rebuild with both probabilities passed through `f`.
    pub fn map_arguments(&self, f: &impl Fn(&Argument) -> Argument) -> ReadoutErr {
        ReadoutErr {
            p0: f(&self.p0),
            p1: f(&self.p1),
        }
    }
}

impl fmt::Display for ReadoutErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "readouterr({}, {})", self.p0, self.p1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readout_error_confusion_matrix() {
        let err = ReadoutErr::new(0.1, 0.25).unwrap();
        assert_eq!(err.confusion_matrix().unwrap(), [[0.9, 0.1], [0.25, 0.75]]);
        let back = ReadoutErr::from_confusion_matrix([[0.9, 0.1], [0.25, 0.75]]).unwrap();
        assert_eq!(back, err);
        assert_eq!(err.to_string(), "readouterr(0.1, 0.25)");

        assert!(ReadoutErr::new(1.2, 0.0).is_err());
        assert!(ReadoutErr::new(Argument::symbol("p"), 0.0).is_ok());
        assert!(matches!(
            ReadoutErr::from_confusion_matrix([[0.9, 0.2], [0.0, 1.0]]),
            Err(IrError::InvalidProbability { .. })
        ));
    }

    fn completeness(ops: &[Array2<Complex64>]) -> bool {
        let dim = ops[0].nrows();
        let sum = ops
            .iter()
            .fold(Array2::<Complex64>::zeros((dim, dim)), |acc, k| {
                acc + matrix::adjoint(k).dot(k)
            });
        matrix::approx_eq(&sum, &Array2::eye(dim), 1e-10)
    }

    #[test]
    fn test_builtin_channels_are_complete() {
        let params = |k: KrausKind| -> Vec<Argument> {
            match k {
                KrausKind::AmplitudeDamping | KrausKind::PauliX | KrausKind::PauliY | KrausKind::PauliZ => {
                    vec![0.3.into()]
                }
                KrausKind::GeneralizedAmplitudeDamping => vec![0.2.into(), 0.4.into()],
                KrausKind::PhaseAmplitudeDamping => vec![0.2.into(), 0.4.into(), 0.1.into()],
                KrausKind::ThermalNoise => vec![2.0.into(), 1.0.into(), 0.5.into(), 0.1.into()],
                _ => vec![],
            }
        };
        for kind in KrausKind::ALL {
            let ch = KrausChannel::simple(kind, params(kind)).unwrap();
            let ops = ch.kraus_operators().unwrap();
            assert!(completeness(&ops), "{} is not trace preserving", kind.name());
        }
    }

    #[test]
    fn test_probability_range() {
        assert!(KrausChannel::simple(KrausKind::AmplitudeDamping, vec![1.5.into()]).is_err());
        assert!(KrausChannel::simple(KrausKind::AmplitudeDamping, vec![Argument::symbol("g")]).is_ok());
        assert!(KrausChannel::simple(KrausKind::PauliX, vec![]).is_err());
        assert!(KrausChannel::depolarizing(1, -0.1).is_err());
    }

    #[test]
    fn test_pauli_channel_rejects_unnormalized() {
        let err = PauliChannel::from_letters(vec![0.5.into(), 0.6.into()], &["II", "XX"]).unwrap_err();
        assert!(matches!(err, IrError::InvalidProbability { .. }));

        let ok = PauliChannel::from_letters(vec![0.5.into(), 0.5.into()], &["II", "XX"]).unwrap();
        assert_eq!(ok.num_qubits(), 2);
        assert!(completeness(&KrausChannel::Pauli(ok).kraus_operators().unwrap()));
    }

    #[test]
    fn test_mixed_unitary_validation() {
        let terms = vec![
            (Argument::from(0.7), Gate::from(StandardGate::Id)),
            (Argument::from(-0.1), Gate::from(StandardGate::X)),
        ];
        assert!(matches!(
            MixedUnitary::new(terms),
            Err(IrError::InvalidProbability { .. })
        ));
        let terms = vec![
            (Argument::from(0.9), Gate::from(StandardGate::Id)),
            (Argument::from(0.1), Gate::from(StandardGate::Swap)),
        ];
        assert!(matches!(MixedUnitary::new(terms), Err(IrError::LengthMismatch { .. })));
    }

    #[test]
    fn test_depolarizing_operators() {
        let ch = KrausChannel::depolarizing(2, 0.15).unwrap();
        let ops = ch.kraus_operators().unwrap();
        assert_eq!(ops.len(), 16);
        assert!(completeness(&ops));
    }

    #[test]
    fn test_reset_x_prepares_plus() {
        let ops = KrausChannel::simple(KrausKind::ResetX, vec![])
            .unwrap()
            .kraus_operators()
            .unwrap();
        // |1⟩⟨1| maps to |+⟩⟨+|
        let rho = array![
            [Complex64::new(0.0, 0.0), Complex64::new(0.0, 0.0)],
            [Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)]
        ];
        let out = ops
            .iter()
            .fold(Array2::<Complex64>::zeros((2, 2)), |acc, k| {
                acc + k.dot(&rho).dot(&matrix::adjoint(k))
            });
        let half = Complex64::new(0.5, 0.0);
        assert!(matrix::approx_eq(&out, &array![[half, half], [half, half]], 1e-12));
    }
}
