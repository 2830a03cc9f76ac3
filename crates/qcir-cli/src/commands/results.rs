//! Results command implementation.
//!
//! Decode a results file returned by the execution service and display it.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use serde::Serialize;

use qcir_proto::{QcsResults, decode_results};

use super::common::report_format;
use crate::config::Config;

/// JSON report; bit strings are rendered as `0/1` literals.
#[derive(Debug, Serialize)]
struct Report<'a> {
    simulator: &'a str,
    version: &'a str,
    fidelities: &'a [f64],
    avg_gate_errors: &'a [f64],
    samples: usize,
    histogram: BTreeMap<String, usize>,
    timings: BTreeMap<&'a str, f64>,
    amplitudes: BTreeMap<String, [f64; 2]>,
}

impl<'a> Report<'a> {
    fn new(results: &'a QcsResults) -> Self {
        Report {
            simulator: &results.simulator,
            version: &results.version,
            fidelities: &results.fidelities,
            avg_gate_errors: &results.avg_gate_errors,
            samples: results.num_samples(),
            histogram: results
                .histogram()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            timings: results.timings.iter().map(|(k, v)| (k.as_str(), *v)).collect(),
            amplitudes: results
                .amplitudes
                .iter()
                .map(|(k, v)| (k.to_string(), [v.re, v.im]))
                .collect(),
        }
    }
}

/// Execute the results command.
pub fn execute(input: &Path, format: Option<&str>, config: &Config) -> Result<()> {
    let format = report_format(format, config)?;
    let bytes = fs::read(input).with_context(|| format!("Failed to read file: {}", input.display()))?;
    let results = decode_results(&bytes).map_err(|e| anyhow::anyhow!("Decode error: {e}"))?;

    if format == "json" {
        let json = serde_json::to_string_pretty(&Report::new(&results))
            .map_err(|e| anyhow::anyhow!("JSON serialization failed: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    print_results(&results, config.output.histogram_rows);
    Ok(())
}

/// Print results in a table format.
pub fn print_results(results: &QcsResults, max_rows: usize) {
    println!(
        "{} {} {}",
        style("✓").green().bold(),
        style(&results.simulator).cyan(),
        style(&results.version).dim()
    );

    for (i, fidelity) in results.fidelities.iter().enumerate() {
        let error = results.avg_gate_errors.get(i).copied();
        match error {
            Some(e) => println!("  Circuit {i}: fidelity {fidelity:.6}, avg gate error {e:.3e}"),
            None => println!("  Circuit {i}: fidelity {fidelity:.6}"),
        }
    }

    let histogram = results.histogram();
    if !histogram.is_empty() {
        let total = results.cstates.len() as f64;
        let mut sorted: Vec<_> = histogram.iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        println!("\n{} Samples ({}):", style("✓").green().bold(), results.cstates.len());
        for (bits, count) in sorted.iter().take(max_rows) {
            let prob = **count as f64 / total * 100.0;
            let bar_len = (prob / 2.0).round() as usize;
            let bar: String = "█".repeat(bar_len);

            println!(
                "  {}: {:>6} ({:>5.2}%) {}",
                style(bits).cyan(),
                count,
                prob,
                style(bar).green()
            );
        }
        if sorted.len() > max_rows {
            println!("  ... and {} more outcomes", sorted.len() - max_rows);
        }
    }

    if !results.amplitudes.is_empty() {
        println!("\n  Amplitudes:");
        for (bits, amp) in &results.amplitudes {
            println!("  {}: {:.6} {:+.6}i", style(bits).cyan(), amp.re, amp.im);
        }
    }

    if !results.timings.is_empty() {
        println!("\n  Timings:");
        let timings: BTreeMap<_, _> = results.timings.iter().collect();
        for (name, seconds) in timings {
            println!("  {:<20} {}", name, style(format!("{seconds:.4} s")).yellow());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qcir_ir::BitString;

    #[test]
    fn test_report_renders_bit_strings() {
        let results = QcsResults {
            simulator: "statevector".into(),
            cstates: vec![
                BitString::parse("10").unwrap(),
                BitString::parse("10").unwrap(),
                BitString::parse("01").unwrap(),
            ],
            ..QcsResults::default()
        };
        let report = Report::new(&results);
        assert_eq!(report.samples, 3);
        assert_eq!(report.histogram["10"], 2);
        assert_eq!(report.histogram["01"], 1);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["histogram"]["10"], 2);
    }
}
