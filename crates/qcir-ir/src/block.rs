//! Fixed-size sub-circuits usable as a single operation.

use serde::{Deserialize, Serialize};

use crate::argument::Argument;
use crate::circuit::{Circuit, Target, resolve_targets};
use crate::error::{IrError, IrResult};
use crate::instruction::Instruction;
use crate::operation::Operation;

/// A sequence of instructions over a fixed number of qubits, bits and
/// z-variables.
///
/// Unlike a [`Circuit`], a block never grows: pushing an instruction that
/// reaches past the declared sizes fails and leaves the block unchanged.
/// The content is not required to be unitary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BlockRepr")]
pub struct Block {
    num_qubits: usize,
    num_bits: usize,
    num_zvars: usize,
    instructions: Vec<Instruction>,
}

#[derive(Deserialize)]
struct BlockRepr {
    num_qubits: usize,
    num_bits: usize,
    num_zvars: usize,
    instructions: Vec<Instruction>,
}

impl TryFrom<BlockRepr> for Block {
    type Error = IrError;

    fn try_from(r: BlockRepr) -> IrResult<Self> {
        Block::with_instructions(r.num_qubits, r.num_bits, r.num_zvars, r.instructions)
    }
}

impl Block {
    /// Create an empty block with the given register sizes.
    pub fn new(num_qubits: usize, num_bits: usize, num_zvars: usize) -> Self {
        Self {
            num_qubits,
            num_bits,
            num_zvars,
            instructions: vec![],
        }
    }

    /// Create a block with the given sizes and content.
    pub fn with_instructions(
        num_qubits: usize,
        num_bits: usize,
        num_zvars: usize,
        instructions: Vec<Instruction>,
    ) -> IrResult<Self> {
        let mut block = Self::new(num_qubits, num_bits, num_zvars);
        for inst in &instructions {
            block.check_capacity(inst)?;
        }
        block.instructions = instructions;
        Ok(block)
    }

    /// Copy a circuit, sizing the block to the circuit's registers.
    pub fn from_circuit(circuit: &Circuit) -> Self {
        Self {
            num_qubits: circuit.num_qubits(),
            num_bits: circuit.num_bits(),
            num_zvars: circuit.num_zvars(),
            instructions: circuit.iter().cloned().collect(),
        }
    }

    fn check_capacity(&self, inst: &Instruction) -> IrResult<()> {
        let (q, c, z) = inst.max_targets();
        let checks = [
            ("qubits", "qubit", q, self.num_qubits),
            ("bits", "bit", c, self.num_bits),
            ("zvars", "zvar", z, self.num_zvars),
        ];
        for (register, register_singular, max, capacity) in checks {
            if let Some(index) = max.filter(|&m| m >= capacity) {
                return Err(IrError::Capacity {
                    register,
                    register_singular,
                    index,
                    capacity,
                });
            }
        }
        Ok(())
    }

    /// Push `op` on the given targets, with the same target resolution as
    /// [`Circuit::push`]. Nothing is added if any resulting instruction does
    /// not fit.
    pub fn push<T: Into<Target>>(
        &mut self,
        op: impl Into<Operation>,
        targets: impl IntoIterator<Item = T>,
    ) -> IrResult<&mut Self> {
        let new = resolve_targets(op.into(), targets, false)?;
        for inst in &new {
            self.check_capacity(inst)?;
        }
        self.instructions.extend(new);
        Ok(self)
    }

    /// Push a prepared instruction.
    pub fn push_instruction(&mut self, inst: Instruction) -> IrResult<&mut Self> {
        self.check_capacity(&inst)?;
        self.instructions.push(inst);
        Ok(self)
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Number of bits.
    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    /// Number of z-variables.
    pub fn num_zvars(&self) -> usize {
        self.num_zvars
    }

    /// The instructions.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Iterate over the instructions.
    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter()
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether the block has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// The content as a circuit with the block's register sizes.
    pub fn to_circuit(&self) -> Circuit {
        let mut circuit = Circuit::from(self.instructions.clone());
        circuit.reserve_registers(self.num_qubits, self.num_bits, self.num_zvars);
        circuit
    }

    /// Reversed block with every operation inverted.
    pub fn inverse(&self) -> IrResult<Block> {
        let instructions = self
            .instructions
            .iter()
            .rev()
            .map(|inst| Ok(inst.with_operation(inst.operation().inverse()?)))
            .collect::<IrResult<Vec<_>>>()?;
        Ok(Block {
            num_qubits: self.num_qubits,
            num_bits: self.num_bits,
            num_zvars: self.num_zvars,
            instructions,
        })
    }

    /// Rebuild with every argument passed through `f`.
    pub fn map_arguments(&self, f: &impl Fn(&Argument) -> Argument) -> Block {
        Block {
            num_qubits: self.num_qubits,
            num_bits: self.num_bits,
            num_zvars: self.num_zvars,
            instructions: self
                .instructions
                .iter()
                .map(|inst| inst.with_operation(inst.operation().map_arguments(f)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{Gate, StandardGate};

    #[test]
    fn test_block_capacity() {
        let mut block = Block::new(2, 1, 0);
        block.push(StandardGate::H, [0]).unwrap();
        let err = block.push(StandardGate::H, [2]).unwrap_err();
        assert!(matches!(
            err,
            IrError::Capacity {
                register: "qubits",
                index: 2,
                capacity: 2,
                ..
            }
        ));
        assert_eq!(block.len(), 1);
    }

    #[test]
    fn test_block_push_is_atomic() {
        let mut block = Block::new(3, 0, 0);
        let err = block.push(StandardGate::X, [0..5]);
        assert!(err.is_err());
        assert!(block.is_empty());
        block.push(StandardGate::X, [0..3]).unwrap();
        assert_eq!(block.len(), 3);
    }

    #[test]
    fn test_block_zero_capacity() {
        let mut block = Block::new(1, 0, 0);
        assert!(matches!(
            block.push(Operation::measure(), [0, 0]),
            Err(IrError::Capacity {
                register: "bits",
                capacity: 0,
                ..
            })
        ));
    }

    #[test]
    fn test_block_from_circuit_and_inverse() {
        let mut c = Circuit::new();
        c.h(0).unwrap().cx(0, 1).unwrap().s(1).unwrap();
        let block = Block::from_circuit(&c);
        assert_eq!(block.num_qubits(), 2);
        let inv = block.inverse().unwrap();
        assert_eq!(inv.len(), 3);
        assert_eq!(
            inv.instructions()[0].operation(),
            &Operation::Gate(Gate::from(StandardGate::S).inverse())
        );
        assert_eq!(inv.inverse().unwrap(), block);
    }

    #[test]
    fn test_block_with_measurement_not_invertible() {
        let mut block = Block::new(1, 1, 0);
        block.push(Operation::measure(), [0, 0]).unwrap();
        assert!(matches!(block.inverse(), Err(IrError::NotInvertible(_))));
    }
}
