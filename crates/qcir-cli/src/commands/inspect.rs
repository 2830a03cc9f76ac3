//! Inspect command implementation.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use console::style;
use serde::Serialize;

use qcir_ir::Circuit;

use super::common::{load_circuit, report_format};
use crate::config::Config;

/// Machine-readable circuit summary.
#[derive(Debug, Serialize)]
pub struct Summary {
    pub num_qubits: usize,
    pub num_bits: usize,
    pub num_zvars: usize,
    pub instructions: usize,
    pub depth: usize,
    pub symbols: Vec<String>,
    pub ops: BTreeMap<String, usize>,
    pub listing: Vec<String>,
}

impl Summary {
    pub fn of(circuit: &Circuit) -> Self {
        Summary {
            num_qubits: circuit.num_qubits(),
            num_bits: circuit.num_bits(),
            num_zvars: circuit.num_zvars(),
            instructions: circuit.len(),
            depth: circuit.depth(),
            symbols: circuit.symbols().into_iter().collect(),
            ops: circuit.count_ops(),
            listing: circuit.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Execute the inspect command.
pub fn execute(input: &Path, format: Option<&str>, config: &Config) -> Result<()> {
    let format = report_format(format, config)?;
    let circuit = load_circuit(input, config)?;
    let summary = Summary::of(&circuit);

    if format == "json" {
        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| anyhow::anyhow!("JSON serialization failed: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    println!(
        "{} {}",
        style("→").cyan().bold(),
        style(input.display()).green()
    );
    println!(
        "  Registers: {} qubits, {} bits, {} zvars",
        style(summary.num_qubits).yellow(),
        style(summary.num_bits).yellow(),
        style(summary.num_zvars).yellow()
    );
    println!(
        "  Instructions: {}, depth {}",
        summary.instructions, summary.depth
    );
    if !summary.symbols.is_empty() {
        println!("  Symbols: {}", summary.symbols.join(", "));
    }

    println!("\n  {}", style("Operation counts").bold());
    for (name, count) in &summary.ops {
        println!("    {:<20} {:>6}", style(name).cyan(), count);
    }

    println!("\n  {}", style("Instructions").bold());
    for (i, line) in summary.listing.iter().enumerate() {
        println!("    {:>4}  {}", style(i).dim(), line);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let mut circuit = Circuit::ghz(3).unwrap();
        circuit.rz(qcir_ir::Argument::symbol("phi"), 2).unwrap();
        circuit.measure(2, 0).unwrap();

        let summary = Summary::of(&circuit);
        assert_eq!(summary.num_qubits, 3);
        assert_eq!(summary.num_bits, 1);
        assert_eq!(summary.instructions, 5);
        assert_eq!(summary.symbols, vec!["phi".to_string()]);
        assert_eq!(summary.listing.len(), 5);
        assert_eq!(summary.ops.values().sum::<usize>(), 5);
    }
}
