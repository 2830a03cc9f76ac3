//! Quantum Circuit Intermediate Representation
//!
//! This crate provides the data model for quantum circuits: symbolic
//! arguments, bit strings, a closed family of operations, instructions that
//! bind operations to register targets, and the [`Circuit`] container with
//! its composition algebra.
//!
//! # Overview
//!
//! A circuit is an ordered list of [`Instruction`]s over three index spaces:
//! qubits, classical bits and complex z-variables. Registers grow as
//! instructions are pushed. Operations nest freely: a [`Gate`] can be
//! controlled, raised to a power, inverted, repeated in parallel or defined
//! by a [`GateDecl`] whose body is itself a circuit.
//!
//! # Core Components
//!
//! - **Arguments**: [`Argument`] for numeric and symbolic parameters
//! - **Bit strings**: [`BitString`] for classical values and conditions
//! - **Gates**: [`StandardGate`], [`CustomGate`], [`GeneralizedGate`] and the
//!   composite wrappers [`Control`], [`Power`], [`Inverse`], [`Parallel`]
//! - **Noise**: [`KrausChannel`] and its variants, [`ReadoutErr`] for
//!   classical readout errors, and [`NoiseModel`] rules applied to whole
//!   circuits
//! - **Hamiltonians**: [`Hamiltonian`] Pauli sums with expectation values
//!   and Lie, Suzuki and Yoshida product formulas for time evolution
//! - **Operators**: [`Operator`] for non-unitary matrices and observables
//! - **Operations**: [`Operation`], the sum of everything a circuit can hold
//! - **Circuit**: [`Circuit`] with push/insert/append, `decompose`,
//!   `inverse`, `matrix`, `remove_unused` and `remove_swaps`
//!
//! # Example: Building a GHZ State
//!
//! ```rust
//! use qcir_ir::{Circuit, StandardGate, Target};
//!
//! let mut circuit = Circuit::new();
//! circuit.h(0).unwrap();
//! circuit
//!     .push(
//!         qcir_ir::Gate::from(StandardGate::X).control(1).unwrap(),
//!         [Target::from(0), Target::from(1..5)],
//!     )
//!     .unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 5);
//! assert_eq!(circuit.len(), 5);
//! ```
//!
//! # Example: Parameterized Gate Declaration
//!
//! ```rust
//! use qcir_ir::{Argument, Circuit, GateDecl};
//!
//! let decl = GateDecl::build("rxy", &["theta"], |body, args| {
//!     body.rx(args[0].clone(), 0)?.ry(args[0].clone() * 2, 1)?;
//!     Ok(())
//! })
//! .unwrap();
//!
//! let call = decl.call(vec![Argument::from(0.5)]).unwrap();
//! let mut circuit = Circuit::new();
//! circuit.gate(call, &[0, 1]).unwrap();
//! assert_eq!(circuit.decompose().unwrap().len(), 2);
//! ```
//!
//! # Matrix Convention
//!
//! Every matrix is big-endian in its targets: the first target qubit is the
//! most significant bit of the row and column index.

pub mod argument;
pub mod bitstring;
pub mod block;
pub mod circuit;
pub mod composite;
pub mod decompose;
pub mod error;
pub mod gate;
pub mod gatedecl;
pub mod generalized;
pub mod hamiltonian;
pub mod instruction;
pub mod matrix;
pub mod noise;
pub mod noisemodel;
pub mod operation;
pub mod operator;
pub mod passes;

pub use argument::{Argument, ComplexArg, FunctionKind, Irrational, Number};
pub use bitstring::{BitString, Endianness};
pub use block::Block;
pub use circuit::{Circuit, Target};
pub use composite::{Control, Exponent, Inverse, Parallel, Power};
pub use error::{IrError, IrResult};
pub use gate::{CustomGate, Gate, StandardGate};
pub use gatedecl::{GateCall, GateDecl};
pub use generalized::{GeneralizedGate, Pauli, PauliString, RPauli};
pub use hamiltonian::{Hamiltonian, HamiltonianTerm};
pub use instruction::Instruction;
pub use noise::{CustomKraus, KrausChannel, KrausKind, MixedUnitary, PauliChannel, ReadoutErr, SimpleKraus};
pub use noisemodel::{CustomNoiseRule, IdleRelation, NoiseModel, NoiseRule, OpPattern};
pub use operation::{
    Annotation, AnnotationKind, GeneralizedOpKind, GeneralizedOperation, IfStatement, Operation, Repeat,
    SimpleOpKind, SimpleOperation,
};
pub use operator::{CustomOperator, Operator, OperatorKind, RescaledGate, SimpleOperator};
pub use passes::RegisterMaps;
