//! GHZ sample circuit command.

use std::path::Path;

use anyhow::Result;
use console::style;

use qcir_ir::{Circuit, Gate, Operation, StandardGate, Target};

use super::common::{check_size, save_circuit};
use crate::config::Config;

/// Build an `n`-qubit GHZ circuit, optionally measuring every qubit.
///
/// The entangling layer is one broadcast push of a controlled X from qubit
/// 0 onto qubits `1..n`.
pub fn build(n: usize, measure: bool, strict: bool) -> Result<Circuit> {
    if n == 0 {
        anyhow::bail!("A GHZ circuit needs at least one qubit");
    }
    let mut circuit = Circuit::new();
    circuit.h(0)?;
    if n > 1 {
        let cx = Gate::from(StandardGate::X).control(1)?;
        let targets = [Target::from(0_usize), Target::from(1..n)];
        if strict {
            circuit.push_strict(cx, targets)?;
        } else {
            circuit.push(cx, targets)?;
        }
    }
    if measure {
        circuit.push(Operation::measure(), [Target::from(0..n), Target::from(0..n)])?;
    }
    Ok(circuit)
}

/// Execute the ghz command.
pub fn execute(n: usize, output: &Path, measure: bool, config: &Config) -> Result<()> {
    let circuit = build(n, measure, config.circuit.strict_targets)?;
    check_size(&circuit, config)?;
    save_circuit(&circuit, output)?;

    println!(
        "{} Wrote {}-qubit GHZ circuit ({} instructions) to {}",
        style("✓").green().bold(),
        n,
        circuit.len(),
        style(output.display()).green()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_prebuilt_ghz() {
        for strict in [false, true] {
            assert_eq!(build(5, false, strict).unwrap(), Circuit::ghz(5).unwrap());
        }
        assert_eq!(build(1, false, false).unwrap(), Circuit::ghz(1).unwrap());
    }

    #[test]
    fn test_measured() {
        let circuit = build(3, true, true).unwrap();
        assert_eq!(circuit.len(), 6);
        assert_eq!(circuit.num_bits(), 3);
    }

    #[test]
    fn test_zero_qubits_rejected() {
        assert!(build(0, false, false).is_err());
    }
}
