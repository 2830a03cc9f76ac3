//! Noise model messages.
//!
//! Rule patterns and noise travel as [`schema::Operation`] messages, with
//! any gate declarations they use stored once at the model level. Custom
//! rules hold user code and cannot be encoded.

use prost::Message;
use qcir_ir::{Argument, Gate, IdleRelation, NoiseModel, NoiseRule, Operation, ReadoutErr};
use std::collections::BTreeSet;
use tracing::debug;

use crate::decode::{Decoder, from_proto_arg, required, targets};
use crate::encode::{Encoder, to_proto_arg, wire_targets};
use crate::error::{ProtoError, ProtoResult};
use crate::schema::{self, noise_rule::Kind};

fn set_targets(qubits: &BTreeSet<usize>) -> Vec<i64> {
    qubits.iter().map(|&q| q as i64 + 1).collect()
}

struct RuleEncoder {
    inner: Encoder,
}

impl RuleEncoder {
    fn operation(&mut self, op: &Operation) -> ProtoResult<Option<schema::Operation>> {
        Ok(Some(self.inner.operation(op)?))
    }

    fn readout(&mut self, noise: &ReadoutErr) -> ProtoResult<Option<schema::Operation>> {
        self.operation(&Operation::ReadoutErr(noise.clone()))
    }

    fn gate_rule(
        &mut self,
        gate: &Gate,
        noise: &Operation,
        before: bool,
        qubits: Vec<i64>,
    ) -> ProtoResult<schema::GateInstanceNoise> {
        Ok(schema::GateInstanceNoise {
            gate: self.operation(&Operation::Gate(gate.clone()))?,
            noise: self.operation(noise)?,
            before,
            qubits,
        })
    }

    fn idle(&mut self, relation: &IdleRelation, qubits: Vec<i64>) -> ProtoResult<schema::IdleNoise> {
        Ok(schema::IdleNoise {
            relation: Some(schema::IdleRelation {
                variables: relation
                    .variable()
                    .map(|v| to_proto_arg(&Argument::symbol(v)))
                    .into_iter()
                    .collect(),
                operation: self.operation(relation.noise())?,
            }),
            qubits,
        })
    }

    fn rule(&mut self, rule: &NoiseRule) -> ProtoResult<schema::NoiseRule> {
        let kind = match rule {
            NoiseRule::GlobalReadout { noise } => Kind::GlobalReadout(schema::GlobalReadoutNoise {
                noise: self.readout(noise)?,
            }),
            NoiseRule::ExactQubitReadout { qubits, noise } => Kind::ExactQubitReadout(schema::QubitReadoutNoise {
                noise: self.readout(noise)?,
                qubits: wire_targets(qubits),
            }),
            NoiseRule::SetQubitReadout { qubits, noise } => Kind::SetQubitReadout(schema::QubitReadoutNoise {
                noise: self.readout(noise)?,
                qubits: set_targets(qubits),
            }),
            NoiseRule::GateInstance { gate, noise, before } => {
                Kind::GateInstanceNoise(self.gate_rule(gate, noise, *before, vec![])?)
            }
            NoiseRule::ExactGateInstanceQubit {
                gate,
                qubits,
                noise,
                before,
            } => Kind::ExactGateInstanceNoise(self.gate_rule(gate, noise, *before, wire_targets(qubits))?),
            NoiseRule::SetGateInstanceQubit {
                gate,
                qubits,
                noise,
                before,
            } => Kind::SetGateInstanceNoise(self.gate_rule(gate, noise, *before, set_targets(qubits))?),
            NoiseRule::Idle { relation } => Kind::IdleNoise(self.idle(relation, vec![])?),
            NoiseRule::SetIdleQubit { relation, qubits } => Kind::SetIdleNoise(self.idle(relation, set_targets(qubits))?),
            NoiseRule::Custom(_) => {
                return Err(ProtoError::schema(
                    "noise rule",
                    "custom rules hold user code and cannot be encoded",
                ));
            }
        };
        Ok(schema::NoiseRule { kind: Some(kind) })
    }
}

struct RuleDecoder {
    inner: Decoder,
}

impl RuleDecoder {
    fn operation(&self, context: &'static str, msg: &Option<schema::Operation>) -> ProtoResult<Operation> {
        self.inner.operation(required(context, msg)?)
    }

    fn readout(&self, msg: &Option<schema::Operation>) -> ProtoResult<ReadoutErr> {
        match self.operation("readout noise", msg)? {
            Operation::ReadoutErr(e) => Ok(e),
            other => Err(ProtoError::schema(
                "readout noise",
                format!("expected a readout error, got '{}'", other.name()),
            )),
        }
    }

    fn gate(&self, msg: &schema::GateInstanceNoise) -> ProtoResult<(Gate, Operation)> {
        let gate = match self.operation("gate noise pattern", &msg.gate)? {
            Operation::Gate(g) => g,
            other => {
                return Err(ProtoError::schema(
                    "gate noise pattern",
                    format!("expected a gate, got '{}'", other.name()),
                ));
            }
        };
        Ok((gate, self.operation("gate noise", &msg.noise)?))
    }

    fn idle(&self, msg: &schema::IdleNoise) -> ProtoResult<IdleRelation> {
        let relation = required("idle noise relation", &msg.relation)?;
        let noise = self.operation("idle noise", &relation.operation)?;
        let variable = match relation.variables.as_slice() {
            [] => None,
            [v] => match from_proto_arg(v)? {
                Argument::Symbol(name) => Some(name),
                other => {
                    return Err(ProtoError::schema(
                        "idle noise relation",
                        format!("variable must be a symbol, got {other}"),
                    ));
                }
            },
            more => {
                return Err(ProtoError::schema(
                    "idle noise relation",
                    format!("expected at most one variable, got {}", more.len()),
                ));
            }
        };
        Ok(IdleRelation::new(variable, noise)?)
    }

    fn rule(&self, msg: &schema::NoiseRule) -> ProtoResult<NoiseRule> {
        Ok(match required("noise rule", &msg.kind)? {
            Kind::GlobalReadout(m) => NoiseRule::global_readout(self.readout(&m.noise)?),
            Kind::ExactQubitReadout(m) => {
                NoiseRule::exact_qubit_readout(targets("readout noise qubits", &m.qubits)?, self.readout(&m.noise)?)?
            }
            Kind::SetQubitReadout(m) => {
                NoiseRule::set_qubit_readout(targets("readout noise qubits", &m.qubits)?, self.readout(&m.noise)?)?
            }
            Kind::GateInstanceNoise(m) => {
                let (gate, noise) = self.gate(m)?;
                NoiseRule::gate_instance(gate, noise, m.before)?
            }
            Kind::ExactGateInstanceNoise(m) => {
                let (gate, noise) = self.gate(m)?;
                NoiseRule::exact_gate_instance_qubit(gate, targets("gate noise qubits", &m.qubits)?, noise, m.before)?
            }
            Kind::SetGateInstanceNoise(m) => {
                let (gate, noise) = self.gate(m)?;
                NoiseRule::set_gate_instance_qubit(gate, targets("gate noise qubits", &m.qubits)?, noise, m.before)?
            }
            Kind::IdleNoise(m) => NoiseRule::idle(self.idle(m)?),
            Kind::SetIdleNoise(m) => NoiseRule::set_idle_qubit(self.idle(m)?, targets("idle noise qubits", &m.qubits)?)?,
        })
    }
}

/// Convert a noise model to its wire message.
///
/// Fails on custom rules.
pub fn to_proto_noise_model(model: &NoiseModel) -> ProtoResult<schema::NoiseModel> {
    let mut encoder = RuleEncoder {
        inner: Encoder::default(),
    };
    let rules = model
        .rules()
        .iter()
        .map(|r| encoder.rule(r))
        .collect::<ProtoResult<Vec<_>>>()?;
    let (decls, declorder) = encoder.inner.into_decls();
    Ok(schema::NoiseModel {
        name: model.name().to_string(),
        rules,
        decls,
        declorder,
    })
}

/// Rebuild a noise model from its wire message.
pub fn from_proto_noise_model(msg: &schema::NoiseModel) -> ProtoResult<NoiseModel> {
    let mut inner = Decoder::default();
    inner.declare(&msg.decls, &msg.declorder)?;
    let decoder = RuleDecoder { inner };
    let rules = msg
        .rules
        .iter()
        .map(|r| decoder.rule(r))
        .collect::<ProtoResult<Vec<_>>>()?;
    Ok(NoiseModel::with_rules(msg.name.clone(), rules))
}

/// Serialize a noise model to protobuf bytes.
pub fn encode_noise_model(model: &NoiseModel) -> ProtoResult<Vec<u8>> {
    let bytes = to_proto_noise_model(model)?.encode_to_vec();
    debug!(bytes = bytes.len(), rules = model.len(), name = model.name(), "encoded noise model");
    Ok(bytes)
}

/// Parse a noise model from protobuf bytes.
pub fn decode_noise_model(bytes: &[u8]) -> ProtoResult<NoiseModel> {
    let model = from_proto_noise_model(&schema::NoiseModel::decode(bytes)?)?;
    debug!(bytes = bytes.len(), rules = model.len(), name = model.name(), "decoded noise model");
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qcir_ir::{CustomNoiseRule, KrausChannel, StandardGate};

    #[test]
    fn test_custom_rule_cannot_be_encoded() {
        let rule = CustomNoiseRule::new(|_| true, |inst| Ok(inst.clone()));
        let model = NoiseModel::with_rules("custom", vec![NoiseRule::Custom(rule)]);
        assert!(matches!(
            to_proto_noise_model(&model),
            Err(ProtoError::SchemaViolation { context: "noise rule", .. })
        ));
    }

    #[test]
    fn test_set_qubits_are_sorted_and_one_based() {
        let mut model = NoiseModel::new("set");
        model
            .add_gate_noise(
                StandardGate::H,
                KrausChannel::depolarizing(1, 0.01).unwrap(),
                Some(&[4, 0, 2]),
                false,
                false,
            )
            .unwrap();
        let msg = to_proto_noise_model(&model).unwrap();
        match &msg.rules[0].kind {
            Some(Kind::SetGateInstanceNoise(m)) => assert_eq!(m.qubits, vec![1, 3, 5]),
            other => panic!("expected a qubit set gate rule, got {other:?}"),
        }
    }

    #[test]
    fn test_readout_rule_needs_readout_error() {
        let mut encoder = Encoder::default();
        let msg = schema::NoiseModel {
            name: "bad".into(),
            rules: vec![schema::NoiseRule {
                kind: Some(Kind::GlobalReadout(schema::GlobalReadoutNoise {
                    noise: Some(encoder.operation(&StandardGate::X.into()).unwrap()),
                })),
            }],
            ..schema::NoiseModel::default()
        };
        let err = from_proto_noise_model(&msg).unwrap_err();
        assert!(err.to_string().contains("expected a readout error, got 'x'"), "{err}");
    }

    #[test]
    fn test_idle_variable_must_be_symbol() {
        let mut encoder = Encoder::default();
        let msg = schema::NoiseModel {
            name: String::new(),
            rules: vec![schema::NoiseRule {
                kind: Some(Kind::IdleNoise(schema::IdleNoise {
                    relation: Some(schema::IdleRelation {
                        variables: vec![to_proto_arg(&Argument::Integer(3))],
                        operation: Some(
                            encoder
                                .operation(&KrausChannel::depolarizing(1, 0.1).unwrap().into())
                                .unwrap(),
                        ),
                    }),
                    qubits: vec![],
                })),
            }],
            ..schema::NoiseModel::default()
        };
        assert!(from_proto_noise_model(&msg).is_err());
    }
}
