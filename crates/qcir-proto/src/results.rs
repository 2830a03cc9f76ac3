//! Simulation results.
//!
//! The execution service answers with a [`schema::QcsResults`] message. Each
//! entry of `cstates` is the classical register of one sample, read with the
//! same bit numbering as the circuit that produced it, and each entry of
//! `zstates` is the matching Z-register.

use num_complex::Complex64;
use prost::Message;
use qcir_ir::BitString;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::decode::from_proto_bits;
use crate::encode::to_proto_bits;
use crate::error::{ProtoError, ProtoResult};
use crate::schema;

/// Typed view of a results message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QcsResults {
    /// Name of the simulator that ran the circuit.
    pub simulator: String,
    /// Simulator version string.
    pub version: String,
    /// Estimated fidelity per executed circuit.
    pub fidelities: Vec<f64>,
    /// Average gate error per executed circuit.
    pub avg_gate_errors: Vec<f64>,
    /// Sampled classical registers.
    pub cstates: Vec<BitString>,
    /// Sampled Z-registers.
    pub zstates: Vec<Vec<Complex64>>,
    /// Named timing measurements in seconds.
    pub timings: HashMap<String, f64>,
    /// Requested amplitudes, in the order they were reported.
    pub amplitudes: Vec<(BitString, Complex64)>,
}

impl QcsResults {
    /// Number of samples.
    pub fn num_samples(&self) -> usize {
        self.cstates.len().max(self.zstates.len())
    }

    /// Count how often each classical state was sampled.
    pub fn histogram(&self) -> BTreeMap<BitString, usize> {
        let mut counts = BTreeMap::new();
        for state in &self.cstates {
            *counts.entry(state.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Look up a reported amplitude.
    pub fn amplitude(&self, bits: &BitString) -> Option<Complex64> {
        self.amplitudes.iter().find(|(k, _)| k == bits).map(|(_, v)| *v)
    }

    /// Convert to the wire message.
    pub fn to_proto(&self) -> schema::QcsResults {
        schema::QcsResults {
            simulator: self.simulator.clone(),
            version: self.version.clone(),
            fidelities: self.fidelities.clone(),
            avggateerrors: self.avg_gate_errors.clone(),
            cstates: self.cstates.iter().map(to_proto_bits).collect(),
            zstates: self
                .zstates
                .iter()
                .map(|z| schema::ComplexVector {
                    data: z.iter().map(|c| complex_double(*c)).collect(),
                })
                .collect(),
            timings: self.timings.clone(),
            amplitudes: self
                .amplitudes
                .iter()
                .map(|(k, v)| schema::AmplitudeEntry {
                    key: Some(to_proto_bits(k)),
                    val: Some(complex_double(*v)),
                })
                .collect(),
        }
    }

    /// Convert from the wire message.
    pub fn from_proto(msg: &schema::QcsResults) -> ProtoResult<Self> {
        let cstates = msg
            .cstates
            .iter()
            .map(from_proto_bits)
            .collect::<ProtoResult<Vec<_>>>()?;
        let zstates = msg
            .zstates
            .iter()
            .map(|z| z.data.iter().map(from_complex_double).collect())
            .collect();
        let amplitudes = msg
            .amplitudes
            .iter()
            .map(|entry| {
                let key = entry.key.as_ref().ok_or_else(|| ProtoError::unset("amplitude key"))?;
                let val = entry.val.as_ref().ok_or_else(|| ProtoError::unset("amplitude value"))?;
                Ok((from_proto_bits(key)?, from_complex_double(val)))
            })
            .collect::<ProtoResult<Vec<_>>>()?;

        Ok(Self {
            simulator: msg.simulator.clone(),
            version: msg.version.clone(),
            fidelities: msg.fidelities.clone(),
            avg_gate_errors: msg.avggateerrors.clone(),
            cstates,
            zstates,
            timings: msg.timings.clone(),
            amplitudes,
        })
    }
}

fn complex_double(c: Complex64) -> schema::ComplexDouble {
    schema::ComplexDouble { real: c.re, imag: c.im }
}

fn from_complex_double(c: &schema::ComplexDouble) -> Complex64 {
    Complex64::new(c.real, c.imag)
}

/// Serialize results to protobuf bytes.
pub fn encode_results(results: &QcsResults) -> Vec<u8> {
    let bytes = results.to_proto().encode_to_vec();
    debug!(bytes = bytes.len(), samples = results.num_samples(), "encoded results");
    bytes
}

/// Parse results from protobuf bytes.
pub fn decode_results(bytes: &[u8]) -> ProtoResult<QcsResults> {
    let msg = schema::QcsResults::decode(bytes)?;
    let results = QcsResults::from_proto(&msg)?;
    debug!(bytes = bytes.len(), samples = results.num_samples(), "decoded results");
    Ok(results)
}
