//! Register compaction and SWAP elimination.

use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

use crate::block::Block;
use crate::circuit::Circuit;
use crate::error::IrResult;
use crate::gate::{Gate, StandardGate};
use crate::gatedecl::GateDecl;
use crate::instruction::Instruction;
use crate::operation::Operation;

/// Old-to-new index maps produced by [`remove_unused`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterMaps {
    /// Qubit renumbering.
    pub qubits: FxHashMap<usize, usize>,
    /// Classical bit renumbering.
    pub bits: FxHashMap<usize, usize>,
    /// Z-variable renumbering.
    pub zvars: FxHashMap<usize, usize>,
}

fn compact(used: BTreeSet<usize>) -> FxHashMap<usize, usize> {
    used.into_iter().enumerate().map(|(new, old)| (old, new)).collect()
}

/// Drop every qubit, bit and z-variable no instruction references.
///
/// Remaining indices are renumbered densely in their original order.
pub fn remove_unused(circuit: &Circuit) -> (Circuit, RegisterMaps) {
    let (mut q, mut c, mut z) = (BTreeSet::new(), BTreeSet::new(), BTreeSet::new());
    for inst in circuit {
        q.extend(inst.qtargets().iter().copied());
        c.extend(inst.ctargets().iter().copied());
        z.extend(inst.ztargets().iter().copied());
    }
    let maps = RegisterMaps {
        qubits: compact(q),
        bits: compact(c),
        zvars: compact(z),
    };
    let out: Circuit = circuit
        .iter()
        .map(|inst| inst.map_targets(|t| maps.qubits[&t], |t| maps.bits[&t], |t| maps.zvars[&t]))
        .collect();
    debug!(
        qubits_before = circuit.num_qubits(),
        qubits_after = out.num_qubits(),
        bits_after = out.num_bits(),
        zvars_after = out.num_zvars(),
        "removed unused registers"
    );
    (out, maps)
}

/// Remove SWAP gates, relabeling the qubits of later instructions.
///
/// Returns the filtered circuit and the final permutation, where entry `i`
/// is the qubit that holds the state of original qubit `i` at the end. With
/// `recursive`, block contents and gate declaration bodies are processed
/// first and their residual permutations folded into the outer one.
pub fn remove_swaps(circuit: &Circuit, recursive: bool) -> IrResult<(Circuit, Vec<usize>)> {
    let mut decls = DeclCache::default();
    let (instructions, perm) = strip_swaps(circuit.instructions(), circuit.num_qubits(), recursive, &mut decls)?;
    let removed = circuit.len() - instructions.len();
    let mut out = Circuit::from(instructions);
    out.reserve_registers(circuit.num_qubits(), circuit.num_bits(), circuit.num_zvars());
    debug!(removed, recursive, "removed swaps");
    Ok((out, perm))
}

/// Rebuilt declaration (`None` when only swaps remained) and the residual
/// permutation of its body, keyed by declaration identity.
type DeclCache = FxHashMap<*const GateDecl, (Option<Arc<GateDecl>>, Vec<usize>)>;

fn is_swap(op: &Operation) -> bool {
    matches!(op, Operation::Gate(Gate::Standard(StandardGate::Swap)))
}

/// Fold the residual permutation `inner` of a sub-sequence applied on
/// `targets` into `perm`. Targets are in the original labeling.
fn fold(perm: &mut [usize], targets: &[usize], inner: &[usize]) {
    let phys: Vec<usize> = targets.iter().map(|&t| perm[t]).collect();
    for (j, &t) in targets.iter().enumerate() {
        perm[t] = phys[inner[j]];
    }
}

fn strip_swaps(
    instructions: &[Instruction],
    num_qubits: usize,
    recursive: bool,
    decls: &mut DeclCache,
) -> IrResult<(Vec<Instruction>, Vec<usize>)> {
    let mut perm: Vec<usize> = (0..num_qubits).collect();
    let mut out = Vec::with_capacity(instructions.len());
    for inst in instructions {
        let op = inst.operation();
        if is_swap(op) {
            perm.swap(inst.qtargets()[0], inst.qtargets()[1]);
            continue;
        }
        let emitted = inst.map_targets(|t| perm[t], |c| c, |z| z);
        match op {
            Operation::Block(block) if recursive => {
                let (body, inner) = strip_swaps(block.instructions(), block.num_qubits(), true, decls)?;
                fold(&mut perm, inst.qtargets(), &inner);
                if !body.is_empty() {
                    let rebuilt = Block::with_instructions(block.num_qubits(), block.num_bits(), block.num_zvars(), body)?;
                    out.push(emitted.with_operation(Operation::Block(Arc::new(rebuilt))));
                }
            }
            Operation::Gate(Gate::Call(call)) if recursive => {
                let (decl, inner) = strip_decl(call.decl(), decls)?;
                fold(&mut perm, inst.qtargets(), &inner);
                if let Some(decl) = decl {
                    let call = decl.call(call.args().to_vec())?;
                    out.push(emitted.with_operation(Operation::Gate(Gate::Call(call))));
                }
            }
            _ => out.push(emitted),
        }
    }
    Ok((out, perm))
}

fn strip_decl(decl: &Arc<GateDecl>, decls: &mut DeclCache) -> IrResult<(Option<Arc<GateDecl>>, Vec<usize>)> {
    let key = Arc::as_ptr(decl);
    if let Some(cached) = decls.get(&key) {
        return Ok(cached.clone());
    }
    let body = decl.body();
    let (stripped, inner) = strip_swaps(body.instructions(), decl.num_qubits(), true, decls)?;
    let rebuilt = if stripped.is_empty() {
        None
    } else if stripped == body.instructions() {
        Some(Arc::clone(decl))
    } else {
        let mut new_body = Circuit::from(stripped);
        new_body.reserve_registers(body.num_qubits(), body.num_bits(), body.num_zvars());
        Some(Arc::new(GateDecl::new(decl.name(), decl.arguments().to_vec(), new_body)?))
    };
    decls.insert(key, (rebuilt.clone(), inner.clone()));
    Ok((rebuilt, inner))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix;

    fn cx() -> Gate {
        Gate::from(StandardGate::X).control(1).unwrap()
    }

    #[test]
    fn test_remove_unused_compacts() {
        let mut c = Circuit::new();
        c.h(0).unwrap().cx(2, 5).unwrap().measure(5, 3).unwrap();
        let (out, maps) = c.remove_unused();
        assert_eq!(out.num_qubits(), 3);
        assert_eq!(out.num_bits(), 1);
        assert_eq!(maps.qubits.len(), 3);
        assert_eq!(maps.qubits[&0], 0);
        assert_eq!(maps.qubits[&2], 1);
        assert_eq!(maps.qubits[&5], 2);
        assert_eq!(maps.bits[&3], 0);
        assert_eq!(out.get(1).unwrap().qtargets(), &[1, 2]);
        assert_eq!(out.get(2).unwrap().ctargets(), &[0]);
    }

    #[test]
    fn test_remove_unused_empty() {
        let (out, maps) = Circuit::new().remove_unused();
        assert!(out.is_empty());
        assert!(maps.qubits.is_empty());
    }

    #[test]
    fn test_remove_swaps() {
        let mut c = Circuit::new();
        c.h(1).unwrap().swap(1, 2).unwrap().cx(2, 3).unwrap();
        let (out, perm) = c.remove_swaps(false).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.get(0).unwrap().qtargets(), &[1]);
        assert_eq!(out.get(1).unwrap().qtargets(), &[1, 3]);
        assert_eq!(perm, vec![0, 2, 1, 3]);
        assert_eq!(out.num_qubits(), 4);
    }

    /// The filtered circuit followed by the permutation equals the original.
    fn assert_equivalent(original: &Circuit, filtered: &Circuit, perm: &[usize]) {
        let n = original.num_qubits();
        let mut restored = filtered.clone();
        // Undo the relabeling with explicit swaps: move the state of
        // original qubit i from perm[i] back to i.
        let mut at: Vec<usize> = perm.to_vec();
        for i in 0..n {
            if at[i] != i {
                let j = at.iter().position(|&p| p == i).unwrap();
                restored.swap(at[i], i).unwrap();
                at.swap(i, j);
            }
        }
        assert!(matrix::approx_eq(
            &restored.matrix().unwrap(),
            &original.matrix().unwrap(),
            1e-9
        ));
    }

    #[test]
    fn test_remove_swaps_preserves_unitary() {
        let mut c = Circuit::new();
        c.h(0).unwrap().swap(0, 2).unwrap().rx(0.4, 0).unwrap();
        c.swap(1, 2).unwrap().cx(1, 0).unwrap().t(2).unwrap();
        let (out, perm) = c.remove_swaps(false).unwrap();
        assert_eq!(out.len(), 4);
        assert_equivalent(&c, &out, &perm);
    }

    #[test]
    fn test_remove_swaps_recursive_block() {
        let mut block = Block::new(2, 0, 0);
        block.push(StandardGate::H, [0]).unwrap();
        block.push(StandardGate::Swap, [0, 1]).unwrap();
        let mut c = Circuit::new();
        c.push(block, [1, 2]).unwrap();
        c.push(cx(), [1, 0]).unwrap();

        let (flat, _) = c.remove_swaps(false).unwrap();
        assert_eq!(flat, c);

        let (out, perm) = c.remove_swaps(true).unwrap();
        assert_eq!(perm, vec![0, 2, 1]);
        match out.get(0).unwrap().operation() {
            Operation::Block(b) => assert_eq!(b.len(), 1),
            other => panic!("expected block, got {other}"),
        }
        assert_eq!(out.get(1).unwrap().qtargets(), &[2, 0]);
        assert_equivalent(&c, &out, &perm);
    }

    #[test]
    fn test_remove_swaps_recursive_decl() {
        let decl = GateDecl::build("hswap", &[], |body, _| {
            body.h(0)?.swap(0, 1)?;
            Ok(())
        })
        .unwrap();
        let only_swap = GateDecl::build("sw", &[], |body, _| {
            body.swap(0, 1)?;
            Ok(())
        })
        .unwrap();
        let mut c = Circuit::new();
        c.gate(decl.call(vec![]).unwrap(), &[0, 1]).unwrap();
        c.gate(decl.call(vec![]).unwrap(), &[1, 2]).unwrap();
        c.gate(only_swap.call(vec![]).unwrap(), &[0, 2]).unwrap();
        c.t(0).unwrap();

        let (out, perm) = c.remove_swaps(true).unwrap();
        assert_eq!(out.len(), 3);
        let decls: Vec<_> = out
            .iter()
            .filter_map(|i| match i.operation() {
                Operation::Gate(Gate::Call(call)) => Some(Arc::clone(call.decl())),
                _ => None,
            })
            .collect();
        assert_eq!(decls.len(), 2);
        assert!(Arc::ptr_eq(&decls[0], &decls[1]));
        assert_eq!(decls[0].body().len(), 1);
        assert_equivalent(&c, &out, &perm);
    }
}
