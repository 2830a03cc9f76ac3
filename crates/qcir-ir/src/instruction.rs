//! Instructions binding an operation to register targets.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IrError, IrResult};
use crate::operation::Operation;

/// An operation with its qubit, bit and z-variable targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "InstructionRepr")]
pub struct Instruction {
    operation: Operation,
    qtargets: Vec<usize>,
    ctargets: Vec<usize>,
    ztargets: Vec<usize>,
}

#[derive(Deserialize)]
struct InstructionRepr {
    operation: Operation,
    qtargets: Vec<usize>,
    ctargets: Vec<usize>,
    ztargets: Vec<usize>,
}

impl TryFrom<InstructionRepr> for Instruction {
    type Error = IrError;

    fn try_from(r: InstructionRepr) -> IrResult<Self> {
        Instruction::new(r.operation, r.qtargets, r.ctargets, r.ztargets)
    }
}

fn check_register(op: &Operation, register: &'static str, expected: usize, targets: &[usize]) -> IrResult<()> {
    if targets.len() != expected {
        return Err(IrError::ArityMismatch {
            op: op.name().to_string(),
            register,
            expected,
            got: targets.len(),
        });
    }
    for (i, t) in targets.iter().enumerate() {
        if targets[..i].contains(t) {
            return Err(IrError::DuplicateTarget {
                op: op.name().to_string(),
                register,
                index: *t,
            });
        }
    }
    Ok(())
}

impl Instruction {
    /// Create an instruction, checking the arity and uniqueness of each
    /// target list.
    pub fn new(
        operation: impl Into<Operation>,
        qtargets: Vec<usize>,
        ctargets: Vec<usize>,
        ztargets: Vec<usize>,
    ) -> IrResult<Self> {
        let operation = operation.into();
        check_register(&operation, "qubits", operation.num_qubits(), &qtargets)?;
        check_register(&operation, "bits", operation.num_bits(), &ctargets)?;
        check_register(&operation, "zvars", operation.num_zvars(), &ztargets)?;
        Ok(Self {
            operation,
            qtargets,
            ctargets,
            ztargets,
        })
    }

    /// Create a qubit-only instruction.
    pub fn gate(operation: impl Into<Operation>, qtargets: impl IntoIterator<Item = usize>) -> IrResult<Self> {
        Self::new(operation, qtargets.into_iter().collect(), vec![], vec![])
    }

    /// The operation.
    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Qubit targets.
    pub fn qtargets(&self) -> &[usize] {
        &self.qtargets
    }

    /// Classical bit targets.
    pub fn ctargets(&self) -> &[usize] {
        &self.ctargets
    }

    /// Z-variable targets.
    pub fn ztargets(&self) -> &[usize] {
        &self.ztargets
    }

    /// Split into the operation and its target lists.
    pub fn into_parts(self) -> (Operation, Vec<usize>, Vec<usize>, Vec<usize>) {
        (self.operation, self.qtargets, self.ctargets, self.ztargets)
    }

    /// Same targets with a different operation of the same arity.
    pub(crate) fn with_operation(&self, operation: Operation) -> Instruction {
        Instruction {
            operation,
            qtargets: self.qtargets.clone(),
            ctargets: self.ctargets.clone(),
            ztargets: self.ztargets.clone(),
        }
    }

    /// Rewrite every target through the given maps. Maps are injective so
    /// the uniqueness of targets is preserved.
    pub(crate) fn map_targets(
        &self,
        q: impl Fn(usize) -> usize,
        c: impl Fn(usize) -> usize,
        z: impl Fn(usize) -> usize,
    ) -> Instruction {
        Instruction {
            operation: self.operation.clone(),
            qtargets: self.qtargets.iter().map(|&t| q(t)).collect(),
            ctargets: self.ctargets.iter().map(|&t| c(t)).collect(),
            ztargets: self.ztargets.iter().map(|&t| z(t)).collect(),
        }
    }

    /// Translate local targets (positions) into the given target lists.
    pub(crate) fn relocate(&self, q: &[usize], c: &[usize], z: &[usize]) -> Instruction {
        self.map_targets(|t| q[t], |t| c[t], |t| z[t])
    }

    /// Highest target of each register, if any.
    pub(crate) fn max_targets(&self) -> (Option<usize>, Option<usize>, Option<usize>) {
        (
            self.qtargets.iter().copied().max(),
            self.ctargets.iter().copied().max(),
            self.ztargets.iter().copied().max(),
        )
    }
}

fn write_register(f: &mut fmt::Formatter<'_>, prefix: &str, targets: &[usize]) -> fmt::Result {
    let list: Vec<String> = targets.iter().map(ToString::to_string).collect();
    write!(f, "{prefix}[{}]", list.join(","))
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.operation)?;
        let registers = [
            ("q", &self.qtargets),
            ("c", &self.ctargets),
            ("z", &self.ztargets),
        ];
        let mut first = true;
        for (prefix, targets) in registers {
            if targets.is_empty() {
                continue;
            }
            f.write_str(if first { " @ " } else { ", " })?;
            write_register(f, prefix, targets)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{Gate, StandardGate};

    #[test]
    fn test_instruction_arity() {
        let inst = Instruction::new(Operation::measure(), vec![0], vec![3], vec![]).unwrap();
        assert_eq!(inst.qtargets(), &[0]);
        assert_eq!(inst.ctargets(), &[3]);

        let err = Instruction::new(Operation::measure(), vec![0], vec![], vec![]).unwrap_err();
        assert!(matches!(
            err,
            IrError::ArityMismatch {
                register: "bits",
                expected: 1,
                got: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_duplicate_targets() {
        let cx = Gate::from(StandardGate::X).control(1).unwrap();
        let err = Instruction::gate(cx, [2, 2]).unwrap_err();
        assert!(matches!(err, IrError::DuplicateTarget { index: 2, .. }));
    }

    #[test]
    fn test_relocate() {
        let cx = Gate::from(StandardGate::X).control(1).unwrap();
        let inst = Instruction::gate(cx, [1, 0]).unwrap();
        let moved = inst.relocate(&[7, 4], &[], &[]);
        assert_eq!(moved.qtargets(), &[4, 7]);
    }

    #[test]
    fn test_display() {
        let inst = Instruction::new(Operation::measure(), vec![1], vec![0], vec![]).unwrap();
        assert_eq!(inst.to_string(), "measure @ q[1], c[0]");
        let h = Instruction::gate(StandardGate::H, [0]).unwrap();
        assert_eq!(h.to_string(), "h @ q[0]");
    }
}
