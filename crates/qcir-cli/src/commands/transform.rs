//! Transform command implementation.
//!
//! Runs the structural passes over a circuit file: decomposition, SWAP
//! elimination and register compaction, in that order.

use std::path::Path;

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use qcir_ir::Circuit;

use super::common::{load_circuit, save_circuit};
use crate::config::Config;

/// Which passes to run.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passes {
    pub decompose: bool,
    pub z_basis: bool,
    pub remove_swaps: bool,
    pub recursive: bool,
    pub remove_unused: bool,
}

/// What the passes did.
#[derive(Debug, Default)]
pub struct Report {
    pub steps: Vec<String>,
    /// Final wire permutation left by SWAP elimination.
    pub permutation: Option<Vec<usize>>,
}

/// Apply `passes` to `circuit`.
pub fn apply(circuit: Circuit, passes: Passes, progress: &ProgressBar) -> Result<(Circuit, Report)> {
    let mut report = Report::default();
    let mut circuit = circuit;

    if passes.decompose || passes.z_basis {
        progress.set_message("Decomposing...");
        let before = circuit.len();
        circuit = if passes.z_basis {
            circuit.decompose_to_z_basis()?
        } else {
            circuit.decompose()?
        };
        report
            .steps
            .push(format!("decompose: {before} -> {} instructions", circuit.len()));
    }

    if passes.remove_swaps {
        progress.set_message("Removing SWAPs...");
        let before = circuit.len();
        let (out, perm) = circuit.remove_swaps(passes.recursive)?;
        report.steps.push(format!(
            "remove-swaps: {} swaps removed{}",
            before.saturating_sub(out.len()),
            if passes.recursive { " (recursive)" } else { "" }
        ));
        report.permutation = Some(perm);
        circuit = out;
    }

    if passes.remove_unused {
        progress.set_message("Compacting registers...");
        let before = (circuit.num_qubits(), circuit.num_bits(), circuit.num_zvars());
        let (out, _maps) = circuit.remove_unused();
        report.steps.push(format!(
            "remove-unused: {}q/{}b/{}z -> {}q/{}b/{}z",
            before.0,
            before.1,
            before.2,
            out.num_qubits(),
            out.num_bits(),
            out.num_zvars()
        ));
        circuit = out;
    }

    Ok((circuit, report))
}

/// Execute the transform command.
pub fn execute(input: &Path, output: &Path, mut passes: Passes, config: &Config) -> Result<()> {
    if passes.remove_swaps && config.circuit.remove_swaps_recursive {
        passes.recursive = true;
    }

    println!(
        "{} Transforming {}",
        style("→").cyan().bold(),
        style(input.display()).green()
    );

    let circuit = load_circuit(input, config)?;
    println!(
        "  Loaded: {} qubits, {} instructions, depth {}",
        circuit.num_qubits(),
        circuit.len(),
        circuit.depth()
    );

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let result = apply(circuit, passes, &spinner);
    spinner.finish_and_clear();
    let (circuit, report) = result?;

    for step in &report.steps {
        info!("{step}");
        println!("  {}", step);
    }
    if let Some(perm) = report.permutation.as_ref().filter(|p| !p.is_empty()) {
        println!("  Final wire permutation: {perm:?}");
    }

    save_circuit(&circuit, output)?;
    println!("{} Transform complete", style("✓").green().bold());
    println!(
        "  Result: {} qubits, {} instructions, depth {}",
        circuit.num_qubits(),
        circuit.len(),
        circuit.depth()
    );
    println!("  Output: {}", style(output.display()).green());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Circuit {
        let mut circuit = Circuit::new();
        circuit
            .h(1)
            .unwrap()
            .swap(1, 2)
            .unwrap()
            .ccx(2, 3, 5)
            .unwrap();
        circuit
    }

    #[test]
    fn test_no_passes_is_identity() {
        let (out, report) = apply(sample(), Passes::default(), &ProgressBar::hidden()).unwrap();
        assert_eq!(out, sample());
        assert!(report.steps.is_empty());
        assert!(report.permutation.is_none());
    }

    #[test]
    fn test_remove_swaps_then_compact() {
        let passes = Passes {
            remove_swaps: true,
            remove_unused: true,
            ..Passes::default()
        };
        let (out, report) = apply(sample(), passes, &ProgressBar::hidden()).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.num_qubits(), 3);
        assert_eq!(report.steps.len(), 2);
        assert!(report.steps[0].contains("1 swaps removed"));
    }

    #[test]
    fn test_decompose_flattens() {
        let passes = Passes {
            decompose: true,
            ..Passes::default()
        };
        let (out, _) = apply(sample(), passes, &ProgressBar::hidden()).unwrap();
        assert!(out.len() > sample().len());
        assert_eq!(out.decompose().unwrap(), out);
    }
}
