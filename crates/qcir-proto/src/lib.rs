//! Protobuf wire format for qcir circuits
//!
//! This crate converts [`qcir_ir::Circuit`] values to and from the protobuf
//! schema used by the remote execution service, and decodes the results it
//! returns. Hamiltonians and noise models have their own messages.
//!
//! # Wire conventions
//!
//! - Qubit, bit and z-variable targets are 1-based.
//! - Custom gate matrices are stored column-major, custom operator matrices
//!   row-major.
//! - Whole-valued floating point arguments travel as integers.
//! - Each distinct gate declaration is stored once in `Circuit.decls` and
//!   referenced by id from `CachedGateCall` operations.
//!
//! # Example
//!
//! ```rust
//! use qcir_ir::Circuit;
//!
//! let ghz = Circuit::ghz(4).unwrap();
//! let bytes = qcir_proto::encode(&ghz).unwrap();
//! assert_eq!(qcir_proto::decode(&bytes).unwrap(), ghz);
//! ```

pub mod error;
pub mod hamiltonian;
pub mod noisemodel;
pub mod results;
pub mod schema;

mod decode;
mod encode;

use prost::Message;
use qcir_ir::Circuit;
use tracing::debug;

pub use decode::{from_proto_arg, from_proto_bits};
pub use encode::{to_proto_arg, to_proto_bits};
pub use error::{ProtoError, ProtoResult};
pub use hamiltonian::{decode_hamiltonian, encode_hamiltonian, from_proto_hamiltonian, to_proto_hamiltonian};
pub use noisemodel::{decode_noise_model, encode_noise_model, from_proto_noise_model, to_proto_noise_model};
pub use results::{QcsResults, decode_results, encode_results};

/// Convert a circuit to its wire message.
pub fn to_proto(circuit: &Circuit) -> ProtoResult<schema::Circuit> {
    encode::Encoder::default().circuit(circuit)
}

/// Rebuild a circuit from its wire message.
pub fn from_proto(msg: &schema::Circuit) -> ProtoResult<Circuit> {
    decode::Decoder::default().circuit(msg)
}

/// Serialize a circuit to protobuf bytes.
pub fn encode(circuit: &Circuit) -> ProtoResult<Vec<u8>> {
    let msg = to_proto(circuit)?;
    let bytes = msg.encode_to_vec();
    debug!(
        bytes = bytes.len(),
        instructions = circuit.len(),
        decls = msg.declorder.len(),
        "encoded circuit"
    );
    Ok(bytes)
}

/// Parse a circuit from protobuf bytes.
pub fn decode(bytes: &[u8]) -> ProtoResult<Circuit> {
    let msg = schema::Circuit::decode(bytes)?;
    let circuit = from_proto(&msg)?;
    debug!(bytes = bytes.len(), instructions = circuit.len(), "decoded circuit");
    Ok(circuit)
}
