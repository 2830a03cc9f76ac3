//! Noise models: prioritized rules that turn an ideal circuit into a noisy
//! one, and the lower-level `decorate`/`add_noise` circuit rewrites.
//!
//! A [`NoiseModel`] keeps its rules sorted by priority (lower first). When a
//! model is applied every instruction is offered to the rules in that order
//! and the first match wins: its noise is inserted after the instruction,
//! before it, or in its place.
//!
//! ```
//! use qcir_ir::{Circuit, KrausChannel, KrausKind, NoiseModel, ReadoutErr, StandardGate};
//!
//! let mut model = NoiseModel::new("demo");
//! model
//!     .add_readout_noise(ReadoutErr::new(0.01, 0.02).unwrap(), None, false)
//!     .unwrap()
//!     .add_gate_noise(
//!         StandardGate::H,
//!         KrausChannel::simple(KrausKind::AmplitudeDamping, vec![0.001.into()]).unwrap(),
//!         None,
//!         false,
//!         false,
//!     )
//!     .unwrap();
//!
//! let mut circuit = Circuit::new();
//! circuit.h(0).unwrap().cx(0, 1).unwrap().measure(0, 0).unwrap();
//! let noisy = circuit.apply_noise_model(&model).unwrap();
//! assert_eq!(noisy.len(), 5);
//! ```

use rustc_hash::FxHashSet;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::argument::Argument;
use crate::circuit::Circuit;
use crate::error::{IrError, IrResult};
use crate::gate::{Gate, StandardGate};
use crate::instruction::Instruction;
use crate::noise::ReadoutErr;
use crate::operation::Operation;

type Matcher = Arc<dyn Fn(&Instruction) -> bool + Send + Sync>;
type Generator = Arc<dyn Fn(&Instruction) -> IrResult<Instruction> + Send + Sync>;

/// A rule defined by user code.
///
/// The matcher selects instructions and the generator builds the noise
/// instruction for each of them. Custom rules live in memory only and
/// cannot be written to the wire format.
#[derive(Clone)]
pub struct CustomNoiseRule {
    matcher: Matcher,
    generator: Generator,
    priority: i32,
    before: bool,
    replace: bool,
}

impl CustomNoiseRule {
    /// Default priority of a custom rule.
    pub const DEFAULT_PRIORITY: i32 = 100;

    /// Create a rule inserting the generated instruction after each match.
    pub fn new(
        matcher: impl Fn(&Instruction) -> bool + Send + Sync + 'static,
        generator: impl Fn(&Instruction) -> IrResult<Instruction> + Send + Sync + 'static,
    ) -> Self {
        Self {
            matcher: Arc::new(matcher),
            generator: Arc::new(generator),
            priority: Self::DEFAULT_PRIORITY,
            before: false,
            replace: false,
        }
    }

    /// Set the priority (lower runs first).
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Insert the noise before the matched instruction.
    pub fn inserted_before(mut self) -> Self {
        self.before = true;
        self
    }

    /// Put the noise in place of the matched instruction.
    pub fn replacing(mut self) -> Self {
        self.replace = true;
        self
    }
}

impl fmt::Debug for CustomNoiseRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomNoiseRule")
            .field("priority", &self.priority)
            .field("before", &self.before)
            .field("replace", &self.replace)
            .finish_non_exhaustive()
    }
}

impl PartialEq for CustomNoiseRule {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.matcher, &other.matcher)
            && Arc::ptr_eq(&self.generator, &other.generator)
            && self.priority == other.priority
            && self.before == other.before
            && self.replace == other.replace
    }
}

/// Noise applied to delay gates, optionally depending on their duration.
#[derive(Debug, Clone, PartialEq)]
pub struct IdleRelation {
    variable: Option<String>,
    noise: Operation,
}

impl IdleRelation {
    /// The same noise for every delay.
    pub fn constant(noise: impl Into<Operation>) -> IrResult<Self> {
        Self::new(None, noise.into())
    }

    /// Noise in which `variable` is bound to the delay duration.
    pub fn with_variable(variable: impl Into<String>, noise: impl Into<Operation>) -> IrResult<Self> {
        Self::new(Some(variable.into()), noise.into())
    }

    /// Create from an optional duration variable and the noise.
    pub fn new(variable: Option<String>, noise: Operation) -> IrResult<Self> {
        if (noise.num_qubits(), noise.num_bits(), noise.num_zvars()) != (1, 0, 0) {
            return Err(IrError::invalid(
                noise.name(),
                "idle noise must act on exactly one qubit",
            ));
        }
        if variable.as_deref().is_some_and(str::is_empty) {
            return Err(IrError::invalid(noise.name(), "idle noise variable name is empty"));
        }
        Ok(Self { variable, noise })
    }

    /// Name of the duration variable, if any.
    pub fn variable(&self) -> Option<&str> {
        self.variable.as_deref()
    }

    /// The noise, possibly symbolic in [`IdleRelation::variable`].
    pub fn noise(&self) -> &Operation {
        &self.noise
    }

    fn noise_for(&self, duration: &Argument) -> Operation {
        match &self.variable {
            Some(v) => self
                .noise
                .substitute(&HashMap::from([(v.clone(), duration.clone())])),
            None => self.noise.clone(),
        }
    }
}

impl fmt::Display for IdleRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.variable {
            Some(v) => write!(f, "{v} => {}", self.noise),
            None => write!(f, "{}", self.noise),
        }
    }
}

/// One rule of a [`NoiseModel`].
///
/// Use the constructors, which validate the patterns and the noise.
#[derive(Debug, Clone, PartialEq)]
pub enum NoiseRule {
    /// Readout error after every measurement.
    GlobalReadout {
        /// The readout error.
        noise: ReadoutErr,
    },
    /// Readout error after measurements on exactly these qubits, in order.
    ExactQubitReadout {
        /// Measured qubits.
        qubits: Vec<usize>,
        /// The readout error.
        noise: ReadoutErr,
    },
    /// Readout error after measurements whose qubits all lie in a set.
    SetQubitReadout {
        /// Allowed qubits.
        qubits: BTreeSet<usize>,
        /// The readout error.
        noise: ReadoutErr,
    },
    /// Noise next to every instance of a gate pattern.
    GateInstance {
        /// Gate pattern; bare symbols match any value.
        gate: Gate,
        /// Gate or Kraus channel of the same arity.
        noise: Operation,
        /// Insert the noise before the gate.
        before: bool,
    },
    /// Noise next to a gate pattern on exactly these qubits, in order.
    ExactGateInstanceQubit {
        /// Gate pattern.
        gate: Gate,
        /// Target qubits.
        qubits: Vec<usize>,
        /// Gate or Kraus channel of the same arity.
        noise: Operation,
        /// Insert the noise before the gate.
        before: bool,
    },
    /// Noise next to a gate pattern whose qubits all lie in a set.
    SetGateInstanceQubit {
        /// Gate pattern.
        gate: Gate,
        /// Allowed qubits.
        qubits: BTreeSet<usize>,
        /// Gate or Kraus channel of the same arity.
        noise: Operation,
        /// Insert the noise before the gate.
        before: bool,
    },
    /// Noise replacing every delay.
    Idle {
        /// Noise, possibly depending on the duration.
        relation: IdleRelation,
    },
    /// Noise replacing delays on qubits of a set.
    SetIdleQubit {
        /// Noise, possibly depending on the duration.
        relation: IdleRelation,
        /// Allowed qubits.
        qubits: BTreeSet<usize>,
    },
    /// User-defined rule.
    Custom(CustomNoiseRule),
}

fn qubit_list(context: &str, qubits: &[usize]) -> IrResult<()> {
    if qubits.is_empty() {
        return Err(IrError::invalid(context, "qubit list must not be empty"));
    }
    for (i, q) in qubits.iter().enumerate() {
        if qubits[..i].contains(q) {
            return Err(IrError::DuplicateTarget {
                op: context.to_string(),
                register: "qubits",
                index: *q,
            });
        }
    }
    Ok(())
}

fn check_gate_noise(gate: &Gate, noise: &Operation) -> IrResult<()> {
    for (i, p) in gate.parameters().iter().enumerate() {
        if p.is_symbolic() && !matches!(p, Argument::Symbol(_)) {
            return Err(IrError::invalid(
                gate.name(),
                format!("pattern parameter {} ({p}) must be numeric or a single symbol", i + 1),
            ));
        }
    }
    if !matches!(noise, Operation::Gate(_) | Operation::Kraus(_)) {
        return Err(IrError::invalid(noise.name(), "noise must be a gate or a Kraus channel"));
    }
    if noise.num_qubits() != gate.num_qubits() {
        return Err(IrError::ArityMismatch {
            op: noise.name().to_string(),
            register: "qubits",
            expected: gate.num_qubits(),
            got: noise.num_qubits(),
        });
    }
    Ok(())
}

/// Whether `gate` is an instance of `pattern`.
///
/// Concrete patterns match by equality. Symbolic patterns match concrete
/// gates of the same shape whose values agree on the non-symbol positions.
fn instance_of(pattern: &Gate, gate: &Gate) -> bool {
    if !pattern.is_symbolic() {
        return gate == pattern;
    }
    if gate.is_symbolic() {
        return false;
    }
    let blank = |_: &Argument| Argument::Integer(0);
    if gate.map_arguments(&blank) != pattern.map_arguments(&blank) {
        return false;
    }
    pattern
        .parameters()
        .iter()
        .zip(gate.parameters())
        .all(|(p, v)| matches!(p, Argument::Symbol(_)) || *p == v)
}

/// `noise` with the pattern's symbols bound to the gate's values.
fn bind_noise(pattern: &Gate, gate: &Gate, noise: &Operation) -> Operation {
    let bindings: HashMap<String, Argument> = pattern
        .parameters()
        .into_iter()
        .zip(gate.parameters())
        .filter_map(|(p, v)| match p {
            Argument::Symbol(name) => Some((name, v)),
            _ => None,
        })
        .collect();
    if bindings.is_empty() {
        noise.clone()
    } else {
        noise.substitute(&bindings)
    }
}

fn is_measurement(op: &Operation) -> bool {
    matches!(op, Operation::Simple(s) if s.kind().is_measurement())
}

fn delay_duration(op: &Operation) -> Option<&Argument> {
    match op {
        Operation::Gate(Gate::Standard(StandardGate::Delay(t))) => Some(t),
        _ => None,
    }
}

impl NoiseRule {
    /// Readout error on every measurement.
    pub fn global_readout(noise: ReadoutErr) -> Self {
        NoiseRule::GlobalReadout { noise }
    }

    /// Readout error on measurements targeting exactly `qubits`.
    pub fn exact_qubit_readout(qubits: Vec<usize>, noise: ReadoutErr) -> IrResult<Self> {
        qubit_list("readout noise", &qubits)?;
        Ok(NoiseRule::ExactQubitReadout { qubits, noise })
    }

    /// Readout error on measurements whose qubits all lie in `qubits`.
    pub fn set_qubit_readout(qubits: Vec<usize>, noise: ReadoutErr) -> IrResult<Self> {
        qubit_list("readout noise", &qubits)?;
        Ok(NoiseRule::SetQubitReadout {
            qubits: qubits.into_iter().collect(),
            noise,
        })
    }

    /// Noise next to every instance of `gate`.
    pub fn gate_instance(gate: impl Into<Gate>, noise: impl Into<Operation>, before: bool) -> IrResult<Self> {
        let (gate, noise) = (gate.into(), noise.into());
        check_gate_noise(&gate, &noise)?;
        Ok(NoiseRule::GateInstance { gate, noise, before })
    }

    /// Noise next to instances of `gate` on exactly `qubits`.
    pub fn exact_gate_instance_qubit(
        gate: impl Into<Gate>,
        qubits: Vec<usize>,
        noise: impl Into<Operation>,
        before: bool,
    ) -> IrResult<Self> {
        let (gate, noise) = (gate.into(), noise.into());
        check_gate_noise(&gate, &noise)?;
        qubit_list(gate.name(), &qubits)?;
        if qubits.len() != gate.num_qubits() {
            return Err(IrError::ArityMismatch {
                op: gate.name().to_string(),
                register: "qubits",
                expected: gate.num_qubits(),
                got: qubits.len(),
            });
        }
        Ok(NoiseRule::ExactGateInstanceQubit {
            gate,
            qubits,
            noise,
            before,
        })
    }

    /// Noise next to instances of `gate` whose qubits all lie in `qubits`.
    pub fn set_gate_instance_qubit(
        gate: impl Into<Gate>,
        qubits: Vec<usize>,
        noise: impl Into<Operation>,
        before: bool,
    ) -> IrResult<Self> {
        let (gate, noise) = (gate.into(), noise.into());
        check_gate_noise(&gate, &noise)?;
        qubit_list(gate.name(), &qubits)?;
        if qubits.len() < gate.num_qubits() {
            return Err(IrError::invalid(
                gate.name(),
                format!("{} qubits cannot hold a {}-qubit gate", qubits.len(), gate.num_qubits()),
            ));
        }
        Ok(NoiseRule::SetGateInstanceQubit {
            gate,
            qubits: qubits.into_iter().collect(),
            noise,
            before,
        })
    }

    /// Noise replacing every delay.
    pub fn idle(relation: IdleRelation) -> Self {
        NoiseRule::Idle { relation }
    }

    /// Noise replacing delays on `qubits`.
    pub fn set_idle_qubit(relation: IdleRelation, qubits: Vec<usize>) -> IrResult<Self> {
        qubit_list("idle noise", &qubits)?;
        Ok(NoiseRule::SetIdleQubit {
            relation,
            qubits: qubits.into_iter().collect(),
        })
    }

    /// Lower values are tried first.
    pub fn priority(&self) -> i32 {
        match self {
            NoiseRule::ExactGateInstanceQubit { .. } => 40,
            NoiseRule::SetGateInstanceQubit { .. } => 50,
            NoiseRule::ExactQubitReadout { .. } => 70,
            NoiseRule::SetQubitReadout { .. } | NoiseRule::GateInstance { .. } => 80,
            NoiseRule::GlobalReadout { .. } => 90,
            NoiseRule::SetIdleQubit { .. } => 199,
            NoiseRule::Idle { .. } => 200,
            NoiseRule::Custom(c) => c.priority,
        }
    }

    /// Whether the noise goes before the matched instruction.
    pub fn before(&self) -> bool {
        match self {
            NoiseRule::GateInstance { before, .. }
            | NoiseRule::ExactGateInstanceQubit { before, .. }
            | NoiseRule::SetGateInstanceQubit { before, .. } => *before,
            NoiseRule::Custom(c) => c.before,
            _ => false,
        }
    }

    /// Whether the noise replaces the matched instruction.
    pub fn replaces(&self) -> bool {
        match self {
            NoiseRule::Idle { .. } | NoiseRule::SetIdleQubit { .. } => true,
            NoiseRule::Custom(c) => c.replace,
            _ => false,
        }
    }

    /// Whether the rule applies to `inst`.
    pub fn matches(&self, inst: &Instruction) -> bool {
        let op = inst.operation();
        let within = |set: &BTreeSet<usize>| inst.qtargets().iter().all(|q| set.contains(q));
        match self {
            NoiseRule::GlobalReadout { .. } => is_measurement(op),
            NoiseRule::ExactQubitReadout { qubits, .. } => is_measurement(op) && inst.qtargets() == qubits.as_slice(),
            NoiseRule::SetQubitReadout { qubits, .. } => is_measurement(op) && within(qubits),
            NoiseRule::GateInstance { gate, .. } => op.as_gate().is_some_and(|g| instance_of(gate, g)),
            NoiseRule::ExactGateInstanceQubit { gate, qubits, .. } => {
                inst.qtargets() == qubits.as_slice() && op.as_gate().is_some_and(|g| instance_of(gate, g))
            }
            NoiseRule::SetGateInstanceQubit { gate, qubits, .. } => {
                within(qubits) && op.as_gate().is_some_and(|g| instance_of(gate, g))
            }
            NoiseRule::Idle { .. } => delay_duration(op).is_some(),
            NoiseRule::SetIdleQubit { qubits, .. } => delay_duration(op).is_some() && within(qubits),
            NoiseRule::Custom(c) => (c.matcher)(inst),
        }
    }

    /// The noise instruction for a matched `inst`.
    pub fn apply(&self, inst: &Instruction) -> IrResult<Instruction> {
        let op = inst.operation();
        match self {
            NoiseRule::GlobalReadout { noise }
            | NoiseRule::ExactQubitReadout { noise, .. }
            | NoiseRule::SetQubitReadout { noise, .. } => Instruction::new(
                Operation::ReadoutErr(noise.clone()),
                vec![],
                inst.ctargets().to_vec(),
                vec![],
            ),
            NoiseRule::GateInstance { gate, noise, .. }
            | NoiseRule::ExactGateInstanceQubit { gate, noise, .. }
            | NoiseRule::SetGateInstanceQubit { gate, noise, .. } => {
                let bound = match op.as_gate() {
                    Some(g) => bind_noise(gate, g, noise),
                    None => noise.clone(),
                };
                Instruction::new(bound, inst.qtargets().to_vec(), vec![], vec![])
            }
            NoiseRule::Idle { relation } | NoiseRule::SetIdleQubit { relation, .. } => {
                let noise = match delay_duration(op) {
                    Some(t) => relation.noise_for(t),
                    None => relation.noise.clone(),
                };
                Instruction::new(noise, inst.qtargets().to_vec(), vec![], vec![])
            }
            NoiseRule::Custom(c) => (c.generator)(inst),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            NoiseRule::GlobalReadout { .. } => "global readout noise",
            NoiseRule::ExactQubitReadout { .. } => "exact qubit readout noise",
            NoiseRule::SetQubitReadout { .. } => "qubit set readout noise",
            NoiseRule::GateInstance { .. } => "gate instance noise",
            NoiseRule::ExactGateInstanceQubit { .. } => "exact qubit gate instance noise",
            NoiseRule::SetGateInstanceQubit { .. } => "qubit set gate instance noise",
            NoiseRule::Idle { .. } => "idle noise",
            NoiseRule::SetIdleQubit { .. } => "qubit set idle noise",
            NoiseRule::Custom(_) => "custom rule",
        }
    }
}

fn sorted(qubits: &BTreeSet<usize>) -> Vec<usize> {
    qubits.iter().copied().collect()
}

impl fmt::Display for NoiseRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoiseRule::GlobalReadout { noise } => write!(f, "{noise} on all measurements"),
            NoiseRule::ExactQubitReadout { qubits, noise } => {
                write!(f, "{noise} on measurements of qubits {qubits:?} (exact order)")
            }
            NoiseRule::SetQubitReadout { qubits, noise } => {
                write!(f, "{noise} on measurements within qubits {:?}", sorted(qubits))
            }
            NoiseRule::GateInstance { gate, noise, .. } => write!(f, "{noise} on gate pattern {gate}"),
            NoiseRule::ExactGateInstanceQubit { gate, qubits, noise, .. } => {
                write!(f, "{noise} on gate pattern {gate} at qubits {qubits:?} (exact order)")
            }
            NoiseRule::SetGateInstanceQubit { gate, qubits, noise, .. } => {
                write!(f, "{noise} on gate pattern {gate} within qubits {:?}", sorted(qubits))
            }
            NoiseRule::Idle { relation } => write!(f, "{relation} on all idle qubits"),
            NoiseRule::SetIdleQubit { relation, qubits } => {
                write!(f, "{relation} on idle qubits {:?}", sorted(qubits))
            }
            NoiseRule::Custom(_) => write!(f, "user-defined matcher"),
        }
    }
}

/// A named, priority-ordered list of noise rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoiseModel {
    name: String,
    rules: Vec<NoiseRule>,
}

impl NoiseModel {
    /// Create an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: vec![],
        }
    }

    /// Create a model from rules in any order.
    pub fn with_rules(name: impl Into<String>, rules: Vec<NoiseRule>) -> Self {
        let mut model = Self { name: name.into(), rules };
        model.rules.sort_by_key(NoiseRule::priority);
        model
    }

    /// Model name; may be empty.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The rules, by increasing priority value. Ties keep insertion order.
    pub fn rules(&self) -> &[NoiseRule] {
        &self.rules
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the model has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Add a rule at its priority position.
    pub fn add_rule(&mut self, rule: NoiseRule) -> &mut Self {
        let at = self.rules.partition_point(|r| r.priority() <= rule.priority());
        self.rules.insert(at, rule);
        self
    }

    /// Readout noise on all measurements, or only on `qubits`: exactly
    /// those qubits in order when `exact`, any subset of them otherwise.
    pub fn add_readout_noise(&mut self, noise: ReadoutErr, qubits: Option<&[usize]>, exact: bool) -> IrResult<&mut Self> {
        let rule = match qubits {
            None => NoiseRule::global_readout(noise),
            Some(q) if exact => NoiseRule::exact_qubit_readout(q.to_vec(), noise)?,
            Some(q) => NoiseRule::set_qubit_readout(q.to_vec(), noise)?,
        };
        Ok(self.add_rule(rule))
    }

    /// Noise on instances of `gate`, optionally restricted to `qubits` as in
    /// [`NoiseModel::add_readout_noise`].
    pub fn add_gate_noise(
        &mut self,
        gate: impl Into<Gate>,
        noise: impl Into<Operation>,
        qubits: Option<&[usize]>,
        exact: bool,
        before: bool,
    ) -> IrResult<&mut Self> {
        let rule = match qubits {
            None => NoiseRule::gate_instance(gate, noise, before)?,
            Some(q) if exact => NoiseRule::exact_gate_instance_qubit(gate, q.to_vec(), noise, before)?,
            Some(q) => NoiseRule::set_gate_instance_qubit(gate, q.to_vec(), noise, before)?,
        };
        Ok(self.add_rule(rule))
    }

    /// Noise replacing delays, optionally only on `qubits`.
    pub fn add_idle_noise(&mut self, relation: IdleRelation, qubits: Option<&[usize]>) -> IrResult<&mut Self> {
        let rule = match qubits {
            None => NoiseRule::idle(relation),
            Some(q) => NoiseRule::set_idle_qubit(relation, q.to_vec())?,
        };
        Ok(self.add_rule(rule))
    }
}

impl fmt::Display for NoiseModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            writeln!(f, "NoiseModel")?;
        } else {
            writeln!(f, "NoiseModel: {}", self.name)?;
        }
        write!(f, "{}", "=".repeat(80))?;
        for (i, rule) in self.rules.iter().enumerate() {
            write!(
                f,
                "\nRule {} (priority {}): {}\n  → {rule}",
                i + 1,
                rule.priority(),
                rule.kind_name()
            )?;
            if rule.before() {
                write!(f, "\n    (applied before the operation)")?;
            }
            if rule.replaces() {
                write!(f, "\n    (replaces the operation)")?;
            }
            write!(f, "\n{}", "-".repeat(80))?;
        }
        Ok(())
    }
}

/// Selects the operations [`Circuit::add_noise`] decorates.
#[derive(Debug, Clone, PartialEq)]
pub enum OpPattern {
    /// Operations equal to this one.
    Instance(Operation),
    /// Operations with this name, whatever their parameters.
    Name(String),
}

impl OpPattern {
    /// Whether `op` is selected.
    pub fn matches(&self, op: &Operation) -> bool {
        match self {
            OpPattern::Instance(pattern) => op == pattern,
            OpPattern::Name(name) => op.name() == name,
        }
    }
}

impl From<Operation> for OpPattern {
    fn from(op: Operation) -> Self {
        OpPattern::Instance(op)
    }
}

impl From<Gate> for OpPattern {
    fn from(gate: Gate) -> Self {
        OpPattern::Instance(gate.into())
    }
}

impl From<StandardGate> for OpPattern {
    fn from(gate: StandardGate) -> Self {
        OpPattern::Instance(gate.into())
    }
}

impl From<&str> for OpPattern {
    fn from(name: &str) -> Self {
        OpPattern::Name(name.to_string())
    }
}

#[derive(Default)]
struct Footprint {
    qubits: FxHashSet<usize>,
    bits: FxHashSet<usize>,
    zvars: FxHashSet<usize>,
}

impl Footprint {
    fn add(&mut self, inst: &Instruction) {
        self.qubits.extend(inst.qtargets());
        self.bits.extend(inst.ctargets());
        self.zvars.extend(inst.ztargets());
    }

    fn is_disjoint(&self, inst: &Instruction) -> bool {
        !inst.qtargets().iter().any(|q| self.qubits.contains(q))
            && !inst.ctargets().iter().any(|c| self.bits.contains(c))
            && !inst.ztargets().iter().any(|z| self.zvars.contains(z))
    }
}

impl Circuit {
    /// Noisy copy of the circuit under `model`.
    ///
    /// Each instruction takes the noise of the first matching rule; the
    /// noise instruction is placed after it, before it, or replaces it.
    /// Register sizes of the original circuit are kept.
    pub fn apply_noise_model(&self, model: &NoiseModel) -> IrResult<Circuit> {
        let mut noisy = Circuit::new();
        let mut inserted = 0usize;
        for inst in self.iter() {
            let Some(rule) = model.rules().iter().find(|r| r.matches(inst)) else {
                noisy.push_instruction(inst.clone());
                continue;
            };
            let noise = rule.apply(inst)?;
            inserted += 1;
            if rule.replaces() {
                noisy.push_instruction(noise);
            } else if rule.before() {
                noisy.push_instruction(noise).push_instruction(inst.clone());
            } else {
                noisy.push_instruction(inst.clone()).push_instruction(noise);
            }
        }
        noisy.reserve_registers(self.num_qubits(), self.num_bits(), self.num_zvars());
        debug!(model = model.name(), rules = model.len(), inserted, "applied noise model");
        Ok(noisy)
    }

    /// Copy of the circuit with `generator(inst)` inserted next to every
    /// instruction selected by `matcher`.
    ///
    /// With `parallel`, consecutive matches on disjoint registers form a
    /// block and their generated instructions are inserted together, before
    /// or after the whole block, as long as they too stay disjoint.
    pub fn decorate<M, G>(&self, matcher: M, generator: G, before: bool, parallel: bool) -> IrResult<Circuit>
    where
        M: Fn(&Instruction) -> bool,
        G: Fn(&Instruction) -> IrResult<Instruction>,
    {
        let insts = self.instructions();
        let mut out = Vec::with_capacity(insts.len());
        let mut i = 0;
        while i < insts.len() {
            if !matcher(&insts[i]) {
                out.push(insts[i].clone());
                i += 1;
                continue;
            }
            let mut originals = vec![insts[i].clone()];
            let mut generated = vec![generator(&insts[i])?];
            if parallel {
                let mut used = Footprint::default();
                let mut used_generated = Footprint::default();
                used.add(&originals[0]);
                used_generated.add(&generated[0]);
                while let Some(next) = insts.get(i + originals.len()) {
                    if !(matcher(next) && used.is_disjoint(next) && used_generated.is_disjoint(next)) {
                        break;
                    }
                    let g = generator(next)?;
                    used.add(next);
                    used_generated.add(&g);
                    originals.push(next.clone());
                    generated.push(g);
                }
            }
            i += originals.len();
            if before {
                out.extend(generated);
                out.extend(originals);
            } else {
                out.extend(originals);
                out.extend(generated);
            }
        }
        let mut decorated = Circuit::from(out);
        decorated.reserve_registers(self.num_qubits(), self.num_bits(), self.num_zvars());
        Ok(decorated)
    }

    /// Copy of the circuit with `noise` on the qubits of every operation
    /// selected by `pattern`. The noise must be a gate or a Kraus channel.
    pub fn add_noise(
        &self,
        pattern: &OpPattern,
        noise: impl Into<Operation>,
        before: bool,
        parallel: bool,
    ) -> IrResult<Circuit> {
        let noise = noise.into();
        if !matches!(noise, Operation::Gate(_) | Operation::Kraus(_)) {
            return Err(IrError::invalid(noise.name(), "noise must be a gate or a Kraus channel"));
        }
        self.decorate(
            |inst| pattern.matches(inst.operation()),
            |inst| Instruction::new(noise.clone(), inst.qtargets().to_vec(), vec![], vec![]),
            before,
            parallel,
        )
    }
}
