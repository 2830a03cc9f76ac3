//! Hamiltonian messages.
//!
//! Terms carry their Pauli string and 1-based qubits like instructions do.

use prost::Message;
use qcir_ir::{Hamiltonian, HamiltonianTerm};
use tracing::debug;

use crate::decode::{from_proto_arg, pauli_string, required, targets};
use crate::encode::{pauli_string as pauli_message, to_proto_arg, wire_targets};
use crate::error::ProtoResult;
use crate::schema;

/// Convert a Hamiltonian to its wire message.
pub fn to_proto_hamiltonian(h: &Hamiltonian) -> schema::Hamiltonian {
    schema::Hamiltonian {
        terms: h
            .iter()
            .map(|t| schema::HamiltonianTerm {
                coefficient: Some(to_proto_arg(t.coefficient())),
                pauli: Some(pauli_message(t.pauli())),
                qubits: wire_targets(t.qubits()),
            })
            .collect(),
    }
}

/// Rebuild a Hamiltonian from its wire message.
pub fn from_proto_hamiltonian(msg: &schema::Hamiltonian) -> ProtoResult<Hamiltonian> {
    let terms = msg
        .terms
        .iter()
        .map(|t| {
            Ok(HamiltonianTerm::new(
                from_proto_arg(required("hamiltonian term coefficient", &t.coefficient)?)?,
                pauli_string(required("hamiltonian term pauli", &t.pauli)?)?,
                targets("hamiltonian term qubits", &t.qubits)?,
            )?)
        })
        .collect::<ProtoResult<Vec<_>>>()?;
    Ok(Hamiltonian::from_terms(terms))
}

/// Serialize a Hamiltonian to protobuf bytes.
pub fn encode_hamiltonian(h: &Hamiltonian) -> Vec<u8> {
    let bytes = to_proto_hamiltonian(h).encode_to_vec();
    debug!(bytes = bytes.len(), terms = h.len(), "encoded hamiltonian");
    bytes
}

/// Parse a Hamiltonian from protobuf bytes.
pub fn decode_hamiltonian(bytes: &[u8]) -> ProtoResult<Hamiltonian> {
    let h = from_proto_hamiltonian(&schema::Hamiltonian::decode(bytes)?)?;
    debug!(bytes = bytes.len(), terms = h.len(), "decoded hamiltonian");
    Ok(h)
}
