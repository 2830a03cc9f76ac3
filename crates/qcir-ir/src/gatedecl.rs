//! Named, parameterized gate definitions and their invocations.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::argument::Argument;
use crate::circuit::Circuit;
use crate::error::{IrError, IrResult};

/// A named gate defined by a body circuit over symbolic arguments.
///
/// The body may only contain gates and acts on qubits only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GateDeclRepr")]
pub struct GateDecl {
    name: String,
    arguments: Vec<String>,
    body: Circuit,
}

#[derive(Deserialize)]
struct GateDeclRepr {
    name: String,
    arguments: Vec<String>,
    body: Circuit,
}

impl TryFrom<GateDeclRepr> for GateDecl {
    type Error = IrError;

    fn try_from(r: GateDeclRepr) -> IrResult<Self> {
        GateDecl::new(r.name, r.arguments, r.body)
    }
}

impl GateDecl {
    /// Create a declaration, checking that the body is a non-empty gate sequence.
    pub fn new(name: impl Into<String>, arguments: Vec<String>, body: Circuit) -> IrResult<Self> {
        let name = name.into();
        if body.is_empty() {
            return Err(IrError::invalid(&name, "gate declaration body is empty"));
        }
        for inst in body.iter() {
            if inst.operation().as_gate().is_none() {
                return Err(IrError::invalid(
                    &name,
                    format!(
                        "gate declaration body may only contain gates, found '{}'",
                        inst.operation().name()
                    ),
                ));
            }
        }
        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = arguments.iter().find(|a| !seen.insert(a.as_str())) {
            return Err(IrError::invalid(&name, format!("duplicate argument '{dup}'")));
        }
        Ok(Self {
            name,
            arguments,
            body,
        })
    }

    /// Build a declaration by running `f` on an empty body with one symbol
    /// per argument name.
    pub fn build<F>(name: impl Into<String>, arguments: &[&str], f: F) -> IrResult<Arc<Self>>
    where
        F: FnOnce(&mut Circuit, &[Argument]) -> IrResult<()>,
    {
        let symbols: Vec<Argument> = arguments.iter().map(|a| Argument::symbol(*a)).collect();
        let mut body = Circuit::new();
        f(&mut body, &symbols)?;
        let arguments = arguments.iter().map(|a| (*a).to_string()).collect();
        Self::new(name, arguments, body).map(Arc::new)
    }

    /// Declaration name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of the formal arguments.
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// The body circuit.
    pub fn body(&self) -> &Circuit {
        &self.body
    }

    /// Number of qubits the gate acts on.
    pub fn num_qubits(&self) -> usize {
        self.body.num_qubits()
    }

    /// Instantiate with concrete (or symbolic) arguments.
    pub fn call(self: &Arc<Self>, args: Vec<Argument>) -> IrResult<GateCall> {
        if args.len() != self.arguments.len() {
            return Err(IrError::ArityMismatch {
                op: self.name.clone(),
                register: "arguments",
                expected: self.arguments.len(),
                got: args.len(),
            });
        }
        Ok(GateCall {
            decl: Arc::clone(self),
            args,
        })
    }
}

impl fmt::Display for GateDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "gate {}({}) {{", self.name, self.arguments.join(", "))?;
        for inst in self.body.iter() {
            writeln!(f, "    {inst}")?;
        }
        write!(f, "}}")
    }
}

/// Invocation of a [`GateDecl`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GateCallRepr")]
pub struct GateCall {
    decl: Arc<GateDecl>,
    args: Vec<Argument>,
}

#[derive(Deserialize)]
struct GateCallRepr {
    decl: Arc<GateDecl>,
    args: Vec<Argument>,
}

impl TryFrom<GateCallRepr> for GateCall {
    type Error = IrError;

    fn try_from(r: GateCallRepr) -> IrResult<Self> {
        r.decl.call(r.args)
    }
}

impl GateCall {
    /// The called declaration.
    pub fn decl(&self) -> &Arc<GateDecl> {
        &self.decl
    }

    /// Actual arguments.
    pub fn args(&self) -> &[Argument] {
        &self.args
    }

    /// Rebuild with every argument passed through `f`.
    pub fn map_args(&self, f: &impl Fn(&Argument) -> Argument) -> GateCall {
        GateCall {
            decl: Arc::clone(&self.decl),
            args: self.args.iter().map(f).collect(),
        }
    }

    /// The body with the formal arguments replaced by the actual ones.
    pub fn bound_body(&self) -> Circuit {
        let bindings: HashMap<String, Argument> = self
            .decl
            .arguments
            .iter()
            .cloned()
            .zip(self.args.iter().cloned())
            .collect();
        self.decl.body.substitute(&bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{Gate, StandardGate};
    use crate::operation::{Operation, SimpleOpKind};

    fn rot_decl() -> Arc<GateDecl> {
        GateDecl::build("rot", &["a", "b"], |c, args| {
            c.rx(args[0].clone(), 0)?.ry(args[1].clone() * 2, 1)?.cx(0, 1)?;
            Ok(())
        })
        .unwrap()
    }

    #[test]
    fn test_build_declaration() {
        let decl = rot_decl();
        assert_eq!(decl.name(), "rot");
        assert_eq!(decl.num_qubits(), 2);
        assert_eq!(decl.arguments(), ["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_call_substitutes_lazily() {
        let decl = rot_decl();
        let call = decl.call(vec![0.5.into(), 0.25.into()]).unwrap();
        let body = call.bound_body();
        let first = body.iter().next().unwrap();
        assert_eq!(
            first.operation(),
            &Operation::Gate(Gate::from(StandardGate::Rx(0.5.into())))
        );
        assert!(!body.is_symbolic());
        assert!(decl.body().is_symbolic());
    }

    #[test]
    fn test_call_argument_count() {
        let decl = rot_decl();
        assert!(matches!(
            decl.call(vec![1.into()]),
            Err(IrError::ArityMismatch {
                register: "arguments",
                ..
            })
        ));
    }

    #[test]
    fn test_body_must_be_gates() {
        let err = GateDecl::build("bad", &[], |c, _| {
            c.push(Operation::simple(SimpleOpKind::MeasureZ), [0, 0])?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, IrError::InvalidArgument { .. }));
        assert!(GateDecl::build("empty", &[], |_, _| Ok(())).is_err());
    }
}
