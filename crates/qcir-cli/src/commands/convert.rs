//! Convert command implementation.

use std::path::Path;

use anyhow::Result;
use console::style;

use super::common::{CircuitFormat, load_circuit, save_circuit};
use crate::config::Config;

/// Execute the convert command.
pub fn execute(input: &Path, output: &Path, config: &Config) -> Result<()> {
    let from = CircuitFormat::from_path(input);
    let to = CircuitFormat::from_path(output);

    let circuit = load_circuit(input, config)?;
    save_circuit(&circuit, output)?;

    println!(
        "{} Converted {} ({:?}) to {} ({:?}), {} instructions",
        style("✓").green().bold(),
        style(input.display()).green(),
        from,
        style(output.display()).green(),
        to,
        circuit.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qcir_ir::{Argument, Circuit};

    #[test]
    fn test_protobuf_json_protobuf() {
        let dir = tempfile::tempdir().unwrap();
        let mut circuit = Circuit::qft(3).unwrap();
        circuit.rx(Argument::symbol("t") / 2, 1).unwrap();
        circuit.measure(0, 0).unwrap();

        let pb = dir.path().join("c.pb");
        let json = dir.path().join("c.json");
        let back = dir.path().join("back.pb");
        save_circuit(&circuit, &pb).unwrap();

        let config = Config::default();
        execute(&pb, &json, &config).unwrap();
        execute(&json, &back, &config).unwrap();
        assert_eq!(load_circuit(&back, &config).unwrap(), circuit);
    }
}
