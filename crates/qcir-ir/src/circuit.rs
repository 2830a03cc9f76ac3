//! Circuit container and builder API.

use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::ops::{Range, RangeInclusive};
use tracing::debug;

use crate::argument::Argument;
use crate::bitstring::BitString;
use crate::decompose;
use crate::error::{IrError, IrResult};
use crate::gate::{Gate, StandardGate};
use crate::generalized::GeneralizedGate;
use crate::instruction::Instruction;
use crate::matrix;
use crate::operation::{IfStatement, Operation};
use crate::passes::{self, RegisterMaps};

/// One target position of a push.
///
/// A single index is reused by every instruction the push creates; a list
/// contributes one index per instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// One index.
    Single(i64),
    /// One index per instruction.
    Many(Vec<i64>),
}

macro_rules! impl_target_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Target {
                #[allow(clippy::cast_possible_wrap)]
                fn from(i: $t) -> Self {
                    Target::Single(i as i64)
                }
            }

            impl From<Range<$t>> for Target {
                #[allow(clippy::cast_possible_wrap)]
                fn from(r: Range<$t>) -> Self {
                    Target::Many(r.map(|i| i as i64).collect())
                }
            }

            impl From<RangeInclusive<$t>> for Target {
                #[allow(clippy::cast_possible_wrap)]
                fn from(r: RangeInclusive<$t>) -> Self {
                    Target::Many(r.map(|i| i as i64).collect())
                }
            }

            impl From<Vec<$t>> for Target {
                #[allow(clippy::cast_possible_wrap)]
                fn from(v: Vec<$t>) -> Self {
                    Target::Many(v.into_iter().map(|i| i as i64).collect())
                }
            }

            impl From<&[$t]> for Target {
                #[allow(clippy::cast_possible_wrap)]
                fn from(v: &[$t]) -> Self {
                    Target::Many(v.iter().map(|&i| i as i64).collect())
                }
            }
        )*
    };
}

impl_target_from_int!(i32, i64, u32, usize);

fn to_index(i: i64) -> IrResult<usize> {
    usize::try_from(i).map_err(|_| IrError::Index {
        index: i,
        bound: None,
    })
}

/// Expand `targets` into one instruction per index set.
///
/// The number of instructions is the length of the shortest list; single
/// indices are broadcast. In strict mode lists of different lengths are an
/// error instead of being truncated. All instructions are validated before
/// any is returned.
pub(crate) fn resolve_targets<T: Into<Target>>(
    op: Operation,
    targets: impl IntoIterator<Item = T>,
    strict: bool,
) -> IrResult<Vec<Instruction>> {
    let targets: Vec<Target> = targets.into_iter().map(Into::into).collect();
    let expected = op.num_targets();
    if targets.len() != expected {
        return Err(IrError::ArityMismatch {
            op: op.name().to_string(),
            register: "targets",
            expected,
            got: targets.len(),
        });
    }

    let mut count: Option<usize> = None;
    for t in &targets {
        if let Target::Many(list) = t {
            count = Some(match count {
                None => list.len(),
                Some(n) if strict && n != list.len() => {
                    return Err(IrError::LengthMismatch {
                        context: format!("targets of {}", op.name()),
                        left: n,
                        right: list.len(),
                    });
                }
                Some(n) => n.min(list.len()),
            });
        }
    }
    let count = count.unwrap_or(1);

    let (nq, nb) = (op.num_qubits(), op.num_bits());
    let mut out = Vec::with_capacity(count);
    for k in 0..count {
        let indices = targets
            .iter()
            .map(|t| match t {
                Target::Single(i) => to_index(*i),
                Target::Many(list) => to_index(list[k]),
            })
            .collect::<IrResult<Vec<usize>>>()?;
        let q = indices[..nq].to_vec();
        let c = indices[nq..nq + nb].to_vec();
        let z = indices[nq + nb..].to_vec();
        out.push(Instruction::new(op.clone(), q, c, z)?);
    }
    Ok(out)
}

/// A quantum circuit.
///
/// An ordered list of instructions over three index spaces: qubits,
/// classical bits and complex z-variables. Register sizes are one more than
/// the highest index used and never shrink while the circuit is edited.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Instruction>", into = "Vec<Instruction>")]
pub struct Circuit {
    instructions: Vec<Instruction>,
    num_qubits: usize,
    num_bits: usize,
    num_zvars: usize,
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new() -> Self {
        Self::default()
    }

    fn grow(&mut self, inst: &Instruction) {
        let (q, c, z) = inst.max_targets();
        if let Some(q) = q {
            self.num_qubits = self.num_qubits.max(q + 1);
        }
        if let Some(c) = c {
            self.num_bits = self.num_bits.max(c + 1);
        }
        if let Some(z) = z {
            self.num_zvars = self.num_zvars.max(z + 1);
        }
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Push `op` on the given targets.
    ///
    /// Targets are listed qubits first, then bits, then z-variables. Each
    /// target is an index, a range or a vector; with ranges or vectors one
    /// instruction is pushed per position, truncated to the shortest list.
    ///
    /// ```
    /// use qcir_ir::{Circuit, StandardGate};
    ///
    /// let mut c = Circuit::new();
    /// c.push(StandardGate::H, [0..4]).unwrap();
    /// assert_eq!(c.len(), 4);
    /// ```
    pub fn push<T: Into<Target>>(
        &mut self,
        op: impl Into<Operation>,
        targets: impl IntoIterator<Item = T>,
    ) -> IrResult<&mut Self> {
        let new = resolve_targets(op.into(), targets, false)?;
        self.extend(new);
        Ok(self)
    }

    /// Like [`Circuit::push`] but fails on target lists of different lengths.
    pub fn push_strict<T: Into<Target>>(
        &mut self,
        op: impl Into<Operation>,
        targets: impl IntoIterator<Item = T>,
    ) -> IrResult<&mut Self> {
        let new = resolve_targets(op.into(), targets, true)?;
        self.extend(new);
        Ok(self)
    }

    /// Insert before position `index`; past the end appends.
    pub fn insert<T: Into<Target>>(
        &mut self,
        index: usize,
        op: impl Into<Operation>,
        targets: impl IntoIterator<Item = T>,
    ) -> IrResult<&mut Self> {
        let new = resolve_targets(op.into(), targets, false)?;
        self.insert_instructions(index, new);
        Ok(self)
    }

    /// Like [`Circuit::insert`] but fails on target lists of different lengths.
    pub fn insert_strict<T: Into<Target>>(
        &mut self,
        index: usize,
        op: impl Into<Operation>,
        targets: impl IntoIterator<Item = T>,
    ) -> IrResult<&mut Self> {
        let new = resolve_targets(op.into(), targets, true)?;
        self.insert_instructions(index, new);
        Ok(self)
    }

    fn insert_instructions(&mut self, index: usize, new: Vec<Instruction>) {
        let at = index.min(self.instructions.len());
        for inst in &new {
            self.grow(inst);
        }
        self.instructions.splice(at..at, new);
    }

    /// Push a prepared instruction.
    pub fn push_instruction(&mut self, inst: Instruction) -> &mut Self {
        self.grow(&inst);
        self.instructions.push(inst);
        self
    }

    /// Grow the registers to at least the given sizes.
    pub fn reserve_registers(&mut self, num_qubits: usize, num_bits: usize, num_zvars: usize) -> &mut Self {
        self.num_qubits = self.num_qubits.max(num_qubits);
        self.num_bits = self.num_bits.max(num_bits);
        self.num_zvars = self.num_zvars.max(num_zvars);
        self
    }

    /// Append every instruction of `other`. Register indices are shared.
    pub fn append(&mut self, other: &Circuit) -> &mut Self {
        self.instructions.extend(other.instructions.iter().cloned());
        self.num_qubits = self.num_qubits.max(other.num_qubits);
        self.num_bits = self.num_bits.max(other.num_bits);
        self.num_zvars = self.num_zvars.max(other.num_zvars);
        self
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    fn gate1(&mut self, g: StandardGate, qubit: usize) -> IrResult<&mut Self> {
        self.push_instruction(Instruction::gate(g, [qubit])?);
        Ok(self)
    }

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: usize) -> IrResult<&mut Self> {
        self.gate1(StandardGate::H, qubit)
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: usize) -> IrResult<&mut Self> {
        self.gate1(StandardGate::X, qubit)
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: usize) -> IrResult<&mut Self> {
        self.gate1(StandardGate::Y, qubit)
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: usize) -> IrResult<&mut Self> {
        self.gate1(StandardGate::Z, qubit)
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: usize) -> IrResult<&mut Self> {
        self.gate1(StandardGate::S, qubit)
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: usize) -> IrResult<&mut Self> {
        self.gate1(StandardGate::T, qubit)
    }

    /// Apply RX rotation.
    pub fn rx(&mut self, theta: impl Into<Argument>, qubit: usize) -> IrResult<&mut Self> {
        self.gate1(StandardGate::Rx(theta.into()), qubit)
    }

    /// Apply RY rotation.
    pub fn ry(&mut self, theta: impl Into<Argument>, qubit: usize) -> IrResult<&mut Self> {
        self.gate1(StandardGate::Ry(theta.into()), qubit)
    }

    /// Apply RZ rotation.
    pub fn rz(&mut self, theta: impl Into<Argument>, qubit: usize) -> IrResult<&mut Self> {
        self.gate1(StandardGate::Rz(theta.into()), qubit)
    }

    /// Apply phase gate.
    pub fn p(&mut self, lambda: impl Into<Argument>, qubit: usize) -> IrResult<&mut Self> {
        self.gate1(StandardGate::P(lambda.into()), qubit)
    }

    /// Apply the universal U gate with global phase.
    pub fn u(
        &mut self,
        theta: impl Into<Argument>,
        phi: impl Into<Argument>,
        lambda: impl Into<Argument>,
        qubit: usize,
    ) -> IrResult<&mut Self> {
        let g = StandardGate::U(theta.into(), phi.into(), lambda.into(), Argument::Integer(0));
        self.gate1(g, qubit)
    }

    // =========================================================================
    // Multi-qubit gates
    // =========================================================================

    /// Apply a gate on the given qubits.
    pub fn gate(&mut self, gate: impl Into<Gate>, qubits: &[usize]) -> IrResult<&mut Self> {
        self.push_instruction(Instruction::gate(gate.into(), qubits.iter().copied())?);
        Ok(self)
    }

    fn controlled(&mut self, g: StandardGate, controls: &[usize], target: &[usize]) -> IrResult<&mut Self> {
        let gate = Gate::from(g).control(controls.len())?;
        let qubits: Vec<usize> = controls.iter().chain(target).copied().collect();
        self.gate(gate, &qubits)
    }

    /// Apply CNOT.
    pub fn cx(&mut self, control: usize, target: usize) -> IrResult<&mut Self> {
        self.controlled(StandardGate::X, &[control], &[target])
    }

    /// Apply controlled-Y.
    pub fn cy(&mut self, control: usize, target: usize) -> IrResult<&mut Self> {
        self.controlled(StandardGate::Y, &[control], &[target])
    }

    /// Apply controlled-Z.
    pub fn cz(&mut self, control: usize, target: usize) -> IrResult<&mut Self> {
        self.controlled(StandardGate::Z, &[control], &[target])
    }

    /// Apply controlled-Hadamard.
    pub fn ch(&mut self, control: usize, target: usize) -> IrResult<&mut Self> {
        self.controlled(StandardGate::H, &[control], &[target])
    }

    /// Apply controlled phase.
    pub fn cp(&mut self, lambda: impl Into<Argument>, control: usize, target: usize) -> IrResult<&mut Self> {
        self.controlled(StandardGate::P(lambda.into()), &[control], &[target])
    }

    /// Apply SWAP.
    pub fn swap(&mut self, q1: usize, q2: usize) -> IrResult<&mut Self> {
        self.gate(StandardGate::Swap, &[q1, q2])
    }

    /// Apply iSWAP.
    pub fn iswap(&mut self, q1: usize, q2: usize) -> IrResult<&mut Self> {
        self.gate(StandardGate::ISwap, &[q1, q2])
    }

    /// Apply Toffoli.
    pub fn ccx(&mut self, c1: usize, c2: usize, target: usize) -> IrResult<&mut Self> {
        self.controlled(StandardGate::X, &[c1, c2], &[target])
    }

    /// Apply Fredkin.
    pub fn cswap(&mut self, control: usize, t1: usize, t2: usize) -> IrResult<&mut Self> {
        self.controlled(StandardGate::Swap, &[control], &[t1, t2])
    }

    // =========================================================================
    // Non-unitary operations
    // =========================================================================

    /// Measure a qubit in the Z basis into a classical bit.
    pub fn measure(&mut self, qubit: usize, bit: usize) -> IrResult<&mut Self> {
        self.push_instruction(Instruction::new(Operation::measure(), vec![qubit], vec![bit], vec![])?);
        Ok(self)
    }

    /// Reset a qubit to `|0⟩`.
    pub fn reset(&mut self, qubit: usize) -> IrResult<&mut Self> {
        self.push_instruction(Instruction::gate(Operation::reset(), [qubit])?);
        Ok(self)
    }

    /// Barrier across the given qubits.
    pub fn barrier(&mut self, qubits: impl IntoIterator<Item = usize>) -> IrResult<&mut Self> {
        let qubits: Vec<usize> = qubits.into_iter().collect();
        let inst = Instruction::gate(Operation::barrier(qubits.len())?, qubits)?;
        self.push_instruction(inst);
        Ok(self)
    }

    /// Apply `gate` when the bits `bits` equal `condition`.
    pub fn if_bits(
        &mut self,
        gate: impl Into<Gate>,
        condition: BitString,
        qubits: &[usize],
        bits: &[usize],
    ) -> IrResult<&mut Self> {
        let gate: Gate = gate.into();
        let op = IfStatement::new(gate, condition)?;
        self.push_instruction(Instruction::new(op, qubits.to_vec(), bits.to_vec(), vec![])?);
        Ok(self)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Iterate over the instructions.
    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    /// The instructions.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Instruction at `index`.
    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether the circuit has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Number of qubits, one more than the highest qubit index used.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Number of classical bits.
    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    /// Number of z-variables.
    pub fn num_zvars(&self) -> usize {
        self.num_zvars
    }

    /// Length of the longest chain of instructions sharing a target.
    pub fn depth(&self) -> usize {
        let mut qlevel = vec![0usize; self.num_qubits];
        let mut clevel = vec![0usize; self.num_bits];
        let mut zlevel = vec![0usize; self.num_zvars];
        let mut depth = 0;
        for inst in &self.instructions {
            let level = 1 + inst
                .qtargets()
                .iter()
                .map(|&q| qlevel[q])
                .chain(inst.ctargets().iter().map(|&c| clevel[c]))
                .chain(inst.ztargets().iter().map(|&z| zlevel[z]))
                .max()
                .unwrap_or(0);
            for &q in inst.qtargets() {
                qlevel[q] = level;
            }
            for &c in inst.ctargets() {
                clevel[c] = level;
            }
            for &z in inst.ztargets() {
                zlevel[z] = level;
            }
            depth = depth.max(level);
        }
        depth
    }

    /// Number of instructions per operation name.
    pub fn count_ops(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for inst in &self.instructions {
            *counts.entry(inst.operation().name().to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// All parameters, in instruction order.
    pub fn parameters(&self) -> Vec<Argument> {
        self.instructions
            .iter()
            .flat_map(|i| i.operation().parameters())
            .collect()
    }

    /// Free symbols of the circuit.
    pub fn symbols(&self) -> BTreeSet<String> {
        let mut set = BTreeSet::new();
        for p in self.parameters() {
            p.collect_symbols(&mut set);
        }
        set
    }

    /// Check whether any parameter is symbolic.
    pub fn is_symbolic(&self) -> bool {
        self.instructions.iter().any(|i| i.operation().is_symbolic())
    }

    // =========================================================================
    // Transformations
    // =========================================================================

    /// Copy with symbol bindings substituted.
    pub fn substitute(&self, bindings: &HashMap<String, Argument>) -> Circuit {
        Circuit {
            instructions: self
                .instructions
                .iter()
                .map(|i| i.with_operation(i.operation().substitute(bindings)))
                .collect(),
            ..self.sizes_only()
        }
    }

    fn sizes_only(&self) -> Circuit {
        Circuit {
            instructions: vec![],
            num_qubits: self.num_qubits,
            num_bits: self.num_bits,
            num_zvars: self.num_zvars,
        }
    }

    /// Fully expand composite gates, gate calls, blocks, repeats and
    /// conditioned composites into primitive instructions.
    ///
    /// Standard gates, `CX`, custom gates, polynomial oracles and every
    /// non-gate operation are primitives. Register sizes are kept.
    pub fn decompose(&self) -> IrResult<Circuit> {
        self.decompose_with(false)
    }

    /// Like [`Circuit::decompose`], additionally rewriting X/Y-basis and
    /// two-qubit measurements, measure-resets and resets into Z-basis
    /// measurement, Z reset, conditioned X and gates.
    pub fn decompose_to_z_basis(&self) -> IrResult<Circuit> {
        self.decompose_with(true)
    }

    fn decompose_with(&self, z_basis: bool) -> IrResult<Circuit> {
        let mut out = self.sizes_only();
        for inst in &self.instructions {
            decompose_into(inst, z_basis, &mut out.instructions)?;
        }
        debug!(
            before = self.len(),
            after = out.len(),
            z_basis,
            "decomposed circuit"
        );
        Ok(out)
    }

    /// Reversed circuit with every operation inverted.
    pub fn inverse(&self) -> IrResult<Circuit> {
        let instructions = self
            .instructions
            .iter()
            .rev()
            .map(|i| Ok(i.with_operation(i.operation().inverse()?)))
            .collect::<IrResult<Vec<_>>>()?;
        Ok(Circuit {
            instructions,
            ..self.sizes_only()
        })
    }

    /// Dense unitary over all qubits, big-endian (qubit 0 is the most
    /// significant bit). Only defined for circuits of gates.
    pub fn matrix(&self) -> IrResult<Array2<Complex64>> {
        let mut acc = matrix::identity(self.num_qubits);
        for inst in &self.instructions {
            let m = match inst.operation() {
                Operation::Gate(g) => g.matrix()?,
                op @ (Operation::Block(_) | Operation::Repeat(_)) => op.matrix()?,
                op => return Err(IrError::unsupported(op.name(), "matrix")),
            };
            acc = matrix::embed(&m, inst.qtargets(), self.num_qubits).dot(&acc);
        }
        Ok(acc)
    }

    /// Drop unused qubits, bits and z-variables, renumbering the rest.
    pub fn remove_unused(&self) -> (Circuit, RegisterMaps) {
        passes::remove_unused(self)
    }

    /// Remove SWAP gates by relabeling the qubits after them.
    ///
    /// Returns the circuit and the final permutation: entry `i` is the
    /// physical qubit holding logical qubit `i` at the end.
    pub fn remove_swaps(&self, recursive: bool) -> IrResult<(Circuit, Vec<usize>)> {
        passes::remove_swaps(self, recursive)
    }

    // =========================================================================
    // Pre-built circuits
    // =========================================================================

    /// Create a Bell state circuit.
    pub fn bell() -> IrResult<Self> {
        let mut circuit = Self::new();
        circuit.h(0)?.cx(0, 1)?;
        Ok(circuit)
    }

    /// Create a GHZ state circuit on `n` qubits.
    pub fn ghz(n: usize) -> IrResult<Self> {
        let mut circuit = Self::new();
        if n == 0 {
            return Ok(circuit);
        }
        circuit.h(0)?;
        for i in 1..n {
            circuit.cx(0, i)?;
        }
        Ok(circuit)
    }

    /// Create a circuit applying the quantum Fourier transform on `n` qubits.
    pub fn qft(n: usize) -> IrResult<Self> {
        let mut circuit = Self::new();
        let qubits: Vec<usize> = (0..n).collect();
        circuit.gate(GeneralizedGate::qft(n)?, &qubits)?;
        Ok(circuit)
    }
}

fn decompose_into(inst: &Instruction, z_basis: bool, out: &mut Vec<Instruction>) -> IrResult<()> {
    match inst.operation() {
        Operation::Gate(g) => {
            let mut pieces = Vec::new();
            decompose::flatten(g, inst.qtargets(), &mut pieces)?;
            for (gate, qubits) in pieces {
                out.push(Instruction::new(gate, qubits, vec![], vec![])?);
            }
        }
        Operation::If(s) => {
            let mut pieces = Vec::new();
            decompose::flatten(s.gate(), inst.qtargets(), &mut pieces)?;
            for (gate, qubits) in pieces {
                let op = IfStatement::new(gate, s.condition().clone())?;
                out.push(Instruction::new(op, qubits, inst.ctargets().to_vec(), vec![])?);
            }
        }
        Operation::Block(block) => {
            for local in block.iter() {
                let inner = local.relocate(inst.qtargets(), inst.ctargets(), inst.ztargets());
                decompose_into(&inner, z_basis, out)?;
            }
        }
        Operation::Repeat(r) => {
            let inner = inst.with_operation(r.operation().clone());
            for _ in 0..r.num_repeats() {
                decompose_into(&inner, z_basis, out)?;
            }
        }
        op => match op.z_basis_expansion()?.filter(|_| z_basis) {
            Some(locals) => {
                for local in locals {
                    let inner = local.relocate(inst.qtargets(), inst.ctargets(), inst.ztargets());
                    decompose_into(&inner, z_basis, out)?;
                }
            }
            None => out.push(inst.clone()),
        },
    }
    Ok(())
}

impl From<Vec<Instruction>> for Circuit {
    fn from(instructions: Vec<Instruction>) -> Self {
        let mut circuit = Circuit::new();
        circuit.extend(instructions);
        circuit
    }
}

impl From<Circuit> for Vec<Instruction> {
    fn from(circuit: Circuit) -> Self {
        circuit.instructions
    }
}

impl Extend<Instruction> for Circuit {
    fn extend<I: IntoIterator<Item = Instruction>>(&mut self, iter: I) {
        for inst in iter {
            self.push_instruction(inst);
        }
    }
}

impl FromIterator<Instruction> for Circuit {
    fn from_iter<I: IntoIterator<Item = Instruction>>(iter: I) -> Self {
        let mut circuit = Circuit::new();
        circuit.extend(iter);
        circuit
    }
}

impl<'a> IntoIterator for &'a Circuit {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sizes = vec![];
        for (n, unit) in [
            (self.num_qubits, "qubit"),
            (self.num_bits, "bit"),
            (self.num_zvars, "zvar"),
        ] {
            if n > 0 {
                sizes.push(format!("{n}-{unit}"));
            }
        }
        if sizes.is_empty() {
            sizes.push("empty".to_string());
        }
        write!(
            f,
            "{} circuit with {} instructions",
            sizes.join(", "),
            self.instructions.len()
        )?;
        for inst in &self.instructions {
            write!(f, "\n  {inst}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gatedecl::GateDecl;
    use crate::operation::{Repeat, SimpleOpKind};

    fn cx_gate() -> Gate {
        Gate::from(StandardGate::X).control(1).unwrap()
    }

    #[test]
    fn test_new_circuit() {
        let circuit = Circuit::new();
        assert!(circuit.is_empty());
        assert_eq!(circuit.num_qubits(), 0);
        assert_eq!(circuit.depth(), 0);
    }

    #[test]
    fn test_bell_state() {
        let circuit = Circuit::bell().unwrap();
        assert_eq!(circuit.num_qubits(), 2);
        assert_eq!(circuit.len(), 2);
        assert_eq!(circuit.depth(), 2);
    }

    #[test]
    fn test_ghz_state() {
        let circuit = Circuit::ghz(5).unwrap();
        assert_eq!(circuit.num_qubits(), 5);
        assert_eq!(circuit.len(), 5);
        assert_eq!(circuit.depth(), 5);
    }

    #[test]
    fn test_fluent_api() {
        let mut circuit = Circuit::new();
        circuit
            .h(0)
            .unwrap()
            .cx(0, 1)
            .unwrap()
            .rz(0.5, 2)
            .unwrap()
            .measure(2, 0)
            .unwrap();
        assert_eq!(circuit.len(), 4);
        assert_eq!(circuit.num_qubits(), 3);
        assert_eq!(circuit.num_bits(), 1);
    }

    #[test]
    fn test_push_zips_ranges() {
        let mut c = Circuit::new();
        c.push(cx_gate(), [Target::from(0), Target::from(1..4)]).unwrap();
        assert_eq!(c.len(), 3);
        assert_eq!(c.get(2).unwrap().qtargets(), &[0, 3]);
        assert_eq!(c.num_qubits(), 4);
    }

    #[test]
    fn test_push_truncates_to_shortest() {
        let mut c = Circuit::new();
        c.push(cx_gate(), [Target::from(0..2), Target::from(2..7)]).unwrap();
        assert_eq!(c.len(), 2);
        assert_eq!(c.num_qubits(), 4);

        let err = c
            .push_strict(cx_gate(), [Target::from(0..2), Target::from(2..7)])
            .unwrap_err();
        assert!(matches!(err, IrError::LengthMismatch { left: 2, right: 5, .. }));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_push_rejects_negative_index() {
        let mut c = Circuit::new();
        let err = c.push(StandardGate::H, [-1]).unwrap_err();
        assert!(matches!(err, IrError::Index { index: -1, .. }));
        assert!(c.is_empty());
    }

    #[test]
    fn test_push_target_count() {
        let mut c = Circuit::new();
        assert!(matches!(
            c.push(StandardGate::H, [0, 1]),
            Err(IrError::ArityMismatch { expected: 1, got: 2, .. })
        ));
        c.push(Operation::measure(), [3, 5]).unwrap();
        assert_eq!((c.num_qubits(), c.num_bits()), (4, 6));
        c.push(Operation::simple(SimpleOpKind::VonNeumannEntropy), [0, 2]).unwrap();
        assert_eq!(c.num_zvars(), 3);
    }

    #[test]
    fn test_push_is_atomic() {
        let mut c = Circuit::new();
        let err = c.push(cx_gate(), [Target::from(vec![0, 1, 2]), Target::from(vec![1, 1, 3])]);
        assert!(matches!(err, Err(IrError::DuplicateTarget { .. })));
        assert!(c.is_empty());
        assert_eq!(c.num_qubits(), 0);
    }

    #[test]
    fn test_insert() {
        let mut c = Circuit::new();
        c.h(0).unwrap().h(1).unwrap();
        c.insert(1, StandardGate::X, [5]).unwrap();
        assert_eq!(c.get(1).unwrap().qtargets(), &[5]);
        c.insert(100, StandardGate::Z, [0]).unwrap();
        assert_eq!(c.len(), 4);
        assert_eq!(c.num_qubits(), 6);
    }

    #[test]
    fn test_append_takes_max() {
        let mut a = Circuit::ghz(3).unwrap();
        let b = Circuit::ghz(2).unwrap();
        a.append(&b);
        assert_eq!(a.num_qubits(), 3);
        assert_eq!(a.len(), 5);
    }

    #[test]
    fn test_count_ops() {
        let c = Circuit::ghz(4).unwrap();
        let counts = c.count_ops();
        assert_eq!(counts.get("h"), Some(&1));
        assert_eq!(counts.get("control"), Some(&3));
    }

    #[test]
    fn test_decompose_primitives_unchanged() {
        let mut c = Circuit::new();
        c.h(0).unwrap().rx(0.3, 1).unwrap().cx(0, 1).unwrap();
        c.measure(0, 0).unwrap().reset(1).unwrap();
        assert_eq!(c.decompose().unwrap(), c);
    }

    #[test]
    fn test_decompose_flattens_nested() {
        let decl = GateDecl::build("inner", &["a"], |body, args| {
            body.gate(Gate::from(StandardGate::Rx(args[0].clone())).power(2), &[0])?;
            body.cx(0, 1)?;
            Ok(())
        })
        .unwrap();
        let call = Gate::from(decl.call(vec![0.25.into()]).unwrap());
        let mut c = Circuit::new();
        c.gate(call.control(2).unwrap(), &[0, 1, 2, 3]).unwrap();

        let flat = c.decompose().unwrap();
        for inst in &flat {
            match inst.operation().as_gate() {
                Some(Gate::Standard(_)) => {}
                Some(Gate::Control(ctl)) => {
                    assert_eq!(ctl.num_controls(), 1);
                    assert_eq!(ctl.gate(), &Gate::from(StandardGate::X));
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        assert!(matrix::approx_eq(
            &flat.matrix().unwrap(),
            &c.matrix().unwrap(),
            1e-9
        ));
    }

    #[test]
    fn test_decompose_blocks_and_repeats() {
        let mut block = crate::block::Block::new(2, 1, 0);
        block.push(cx_gate(), [0, 1]).unwrap();
        block.push(Operation::measure(), [1, 0]).unwrap();
        let mut c = Circuit::new();
        c.push(block, [3, 5, 2]).unwrap();
        c.push(Repeat::new(3, StandardGate::T), [1]).unwrap();
        let flat = c.decompose().unwrap();
        assert_eq!(flat.len(), 5);
        assert_eq!(flat.get(0).unwrap().qtargets(), &[3, 5]);
        assert_eq!(flat.get(1).unwrap().ctargets(), &[2]);
        assert_eq!(flat.num_qubits(), 6);
    }

    #[test]
    fn test_decompose_conditioned_composite() {
        let mut c = Circuit::new();
        c.if_bits(
            Gate::from(StandardGate::Swap),
            BitString::parse("1").unwrap(),
            &[0, 1],
            &[0],
        )
        .unwrap();
        let flat = c.decompose().unwrap();
        assert_eq!(flat.len(), 3);
        assert!(flat.iter().all(|i| matches!(i.operation(), Operation::If(_))));
    }

    #[test]
    fn test_decompose_to_z_basis() {
        let mut c = Circuit::new();
        c.push(Operation::simple(SimpleOpKind::MeasureYY), [0, 1, 0]).unwrap();
        let flat = c.decompose_to_z_basis().unwrap();
        let measurements: Vec<_> = flat
            .iter()
            .filter(|i| !i.operation().is_unitary())
            .collect();
        assert_eq!(measurements.len(), 1);
        assert_eq!(measurements[0].operation(), &Operation::measure());
        assert_eq!(c.decompose().unwrap(), c);
    }

    #[test]
    fn test_inverse_involution() {
        let mut c = Circuit::new();
        c.h(0).unwrap().s(1).unwrap().cx(0, 1).unwrap().rz(0.7, 1).unwrap();
        let inv = c.inverse().unwrap();
        assert_eq!(inv.inverse().unwrap(), c);

        let mut both = c.clone();
        both.append(&inv);
        assert!(matrix::approx_eq(&both.matrix().unwrap(), &matrix::identity(2), 1e-9));
    }

    #[test]
    fn test_inverse_rejects_measurement() {
        let mut c = Circuit::bell().unwrap();
        c.measure(0, 0).unwrap();
        assert!(matches!(c.inverse(), Err(IrError::NotInvertible(_))));
    }

    #[test]
    fn test_substitute() {
        let mut c = Circuit::new();
        c.rx(Argument::symbol("a"), 0).unwrap();
        assert_eq!(c.symbols().into_iter().collect::<Vec<_>>(), vec!["a"]);
        let bound = c.substitute(&HashMap::from([("a".to_string(), Argument::from(0.5))]));
        assert!(!bound.is_symbolic());
        assert!(c.is_symbolic());
    }

    #[test]
    fn test_qft_matches_decomposition() {
        let c = Circuit::qft(3).unwrap();
        let flat = c.decompose().unwrap();
        assert!(flat.len() > 1);
        assert!(matrix::approx_eq(&flat.matrix().unwrap(), &c.matrix().unwrap(), 1e-9));
    }

    #[test]
    fn test_serde_round_trip() {
        let c = Circuit::ghz(3).unwrap();
        let json = serde_json::to_string(&c).unwrap();
        let back: Circuit = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_display() {
        let c = Circuit::bell().unwrap();
        let text = c.to_string();
        assert!(text.starts_with("2-qubit circuit with 2 instructions"));
        assert!(text.contains("h @ q[0]"));
    }
}
