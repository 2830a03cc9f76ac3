//! Property-based tests for the circuit container and composition algebra.

use proptest::prelude::*;
use qcir_ir::{BitString, Circuit, Endianness, Gate, IrError, Operation, StandardGate, Target, matrix};

/// Gate operations that can be applied to a circuit.
#[derive(Debug, Clone)]
enum GateOp {
    H(usize),
    S(usize),
    T(usize),
    Rx(f64, usize),
    Rz(f64, usize),
    CX(usize, usize),
    CP(f64, usize, usize),
    Swap(usize, usize),
}

impl GateOp {
    fn apply(self, circuit: &mut Circuit) {
        let result = match self {
            GateOp::H(q) => circuit.h(q).map(|_| ()),
            GateOp::S(q) => circuit.s(q).map(|_| ()),
            GateOp::T(q) => circuit.t(q).map(|_| ()),
            GateOp::Rx(a, q) => circuit.rx(a, q).map(|_| ()),
            GateOp::Rz(a, q) => circuit.rz(a, q).map(|_| ()),
            GateOp::CX(c, t) => circuit.cx(c, t).map(|_| ()),
            GateOp::CP(a, c, t) => circuit.cp(a, c, t).map(|_| ()),
            GateOp::Swap(a, b) => circuit.swap(a, b).map(|_| ()),
        };
        result.expect("generated gate must be valid");
    }
}

fn arb_pair(num_qubits: usize) -> impl Strategy<Value = (usize, usize)> {
    (0..num_qubits, 0..num_qubits).prop_filter("targets must differ", |(a, b)| a != b)
}

fn arb_gate_op(num_qubits: usize) -> impl Strategy<Value = GateOp> {
    let angle = -3.2_f64..3.2;
    prop_oneof![
        (0..num_qubits).prop_map(GateOp::H),
        (0..num_qubits).prop_map(GateOp::S),
        (0..num_qubits).prop_map(GateOp::T),
        (angle.clone(), 0..num_qubits).prop_map(|(a, q)| GateOp::Rx(a, q)),
        (angle.clone(), 0..num_qubits).prop_map(|(a, q)| GateOp::Rz(a, q)),
        arb_pair(num_qubits).prop_map(|(c, t)| GateOp::CX(c, t)),
        (angle, arb_pair(num_qubits)).prop_map(|(a, (c, t))| GateOp::CP(a, c, t)),
        arb_pair(num_qubits).prop_map(|(a, b)| GateOp::Swap(a, b)),
    ]
}

/// Random unitary circuits on 2-4 qubits.
fn arb_circuit() -> impl Strategy<Value = Circuit> {
    (2_usize..=4).prop_flat_map(|n| {
        prop::collection::vec(arb_gate_op(n), 1..=12).prop_map(|ops| {
            let mut circuit = Circuit::new();
            for op in ops {
                op.apply(&mut circuit);
            }
            circuit
        })
    })
}

fn arb_bits(len: usize) -> impl Strategy<Value = BitString> {
    prop::collection::vec(any::<bool>(), len).prop_map(BitString::from_bits)
}

proptest! {
    /// Register sizes are one more than the highest index pushed.
    #[test]
    fn test_registers_track_max_index(q in 0_usize..64, c in 0_usize..64) {
        let mut circuit = Circuit::new();
        circuit.measure(q, c).unwrap();
        prop_assert_eq!(circuit.num_qubits(), q + 1);
        prop_assert_eq!(circuit.num_bits(), c + 1);
        circuit.h(0).unwrap();
        prop_assert_eq!(circuit.num_qubits(), q + 1);
    }

    /// Broadcast pushes create one instruction per position of the shortest list.
    #[test]
    fn test_push_count_is_shortest_list(a in 1_usize..10, b in 1_usize..10) {
        let cx = Gate::from(StandardGate::X).control(1).unwrap();
        let mut circuit = Circuit::new();
        let offset = 16;
        circuit
            .push(cx, [Target::from(0..a), Target::from(offset..offset + b)])
            .unwrap();
        prop_assert_eq!(circuit.len(), a.min(b));
    }

    /// Pushing the wrong number of targets never changes the circuit.
    #[test]
    fn test_wrong_arity_rejected(extra in 1_usize..4) {
        let mut circuit = Circuit::ghz(3).unwrap();
        let before = circuit.clone();
        let targets: Vec<i64> = (0..(1 + extra) as i64).collect();
        let err = circuit.push(StandardGate::H, targets).unwrap_err();
        let is_arity = matches!(err, IrError::ArityMismatch { .. });
        prop_assert!(is_arity);
        prop_assert_eq!(circuit, before);
    }

    /// The inverse of the inverse is the original circuit.
    #[test]
    fn test_inverse_involution(circuit in arb_circuit()) {
        let twice = circuit.inverse().unwrap().inverse().unwrap();
        prop_assert_eq!(twice, circuit);
    }

    /// A circuit followed by its inverse is the identity.
    #[test]
    fn test_inverse_cancels(circuit in arb_circuit()) {
        let mut both = circuit.clone();
        both.append(&circuit.inverse().unwrap());
        let identity = matrix::identity(circuit.num_qubits());
        prop_assert!(matrix::approx_eq(&both.matrix().unwrap(), &identity, 1e-8));
    }

    /// Decomposition preserves the unitary and reaches a fixed point.
    #[test]
    fn test_decompose_fixed_point(circuit in arb_circuit()) {
        let once = circuit.decompose().unwrap();
        let twice = once.decompose().unwrap();
        prop_assert_eq!(&twice, &once);
        prop_assert!(matrix::approx_eq(&once.matrix().unwrap(), &circuit.matrix().unwrap(), 1e-8));
    }

    /// Removing swaps leaves no SWAP instruction behind.
    #[test]
    fn test_remove_swaps_drops_all(circuit in arb_circuit()) {
        let (out, perm) = circuit.remove_swaps(false).unwrap();
        let is_swap = |op: &Operation| matches!(op, Operation::Gate(Gate::Standard(StandardGate::Swap)));
        prop_assert!(out.iter().all(|i| !is_swap(i.operation())));
        let mut sorted = perm.clone();
        sorted.sort_unstable();
        prop_assert_eq!(sorted, (0..circuit.num_qubits()).collect::<Vec<_>>());
    }

    /// Bitwise operators agree with their truth tables.
    #[test]
    fn test_bitstring_algebra((a, b) in (0_usize..24).prop_flat_map(|n| (arb_bits(n), arb_bits(n)))) {
        let and = (&a & &b).unwrap();
        let or = (&a | &b).unwrap();
        let xor = (&a ^ &b).unwrap();
        for i in 0..a.len() {
            let (x, y) = (a.get(i).unwrap(), b.get(i).unwrap());
            prop_assert_eq!(and.get(i), Some(x && y));
            prop_assert_eq!(or.get(i), Some(x || y));
            prop_assert_eq!(xor.get(i), Some(x != y));
        }
        prop_assert_eq!(!&!&a, a.clone());
        prop_assert_eq!((&a + &b).len(), a.len() + b.len());
    }

    /// Big- and little-endian readings are bit reversals of each other.
    #[test]
    fn test_bitstring_endianness(value in 0_u64..(1 << 20), len in 20_usize..32) {
        let big = BitString::from_integer(value, len, Endianness::Big);
        prop_assert_eq!(big.to_integer(Endianness::Big).unwrap(), value);
        let reversed = BitString::from_bits(big.iter().rev().collect());
        prop_assert_eq!(reversed.to_integer(Endianness::Little).unwrap(), value);
    }

    /// Mismatched lengths are rejected by binary operators.
    #[test]
    fn test_bitstring_length_mismatch(n in 1_usize..16) {
        let a = BitString::zeros(n);
        let b = BitString::zeros(n + 1);
        let is_mismatch = matches!(&a & &b, Err(IrError::LengthMismatch { .. }));
        prop_assert!(is_mismatch);
    }
}
