//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use qcir_ir::Circuit;

use crate::config::Config;

/// On-disk circuit encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitFormat {
    /// Protobuf bytes (`.pb`, `.bin`, or any unknown extension).
    Protobuf,
    /// `serde_json` rendering of the IR (`.json`).
    Json,
}

impl CircuitFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("json") => CircuitFormat::Json,
            _ => CircuitFormat::Protobuf,
        }
    }
}

/// Load a circuit from a protobuf or JSON file.
pub fn load_circuit(path: &Path, config: &Config) -> Result<Circuit> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }

    let circuit = match CircuitFormat::from_path(path) {
        CircuitFormat::Json => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("Failed to read file: {}", path.display()))?;
            serde_json::from_str(&source).map_err(|e| anyhow::anyhow!("Parse error: {e}"))?
        }
        CircuitFormat::Protobuf => {
            let bytes =
                fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
            qcir_proto::decode(&bytes).map_err(|e| anyhow::anyhow!("Decode error: {e}"))?
        }
    };

    check_size(&circuit, config)?;
    debug!(path = %path.display(), instructions = circuit.len(), "loaded circuit");
    Ok(circuit)
}

/// Save a circuit, choosing the encoding from the extension.
pub fn save_circuit(circuit: &Circuit, path: &Path) -> Result<()> {
    let content = match CircuitFormat::from_path(path) {
        CircuitFormat::Json => serde_json::to_vec_pretty(circuit)
            .map_err(|e| anyhow::anyhow!("JSON serialization failed: {e}"))?,
        CircuitFormat::Protobuf => {
            qcir_proto::encode(circuit).map_err(|e| anyhow::anyhow!("Encode error: {e}"))?
        }
    };

    fs::write(path, content).with_context(|| format!("Failed to write file: {}", path.display()))?;
    Ok(())
}

/// Reject circuits wider than the configured limit.
pub fn check_size(circuit: &Circuit, config: &Config) -> Result<()> {
    if circuit.num_qubits() > config.circuit.max_qubits {
        anyhow::bail!(
            "Circuit uses {} qubits, above the configured limit of {}",
            circuit.num_qubits(),
            config.circuit.max_qubits
        );
    }
    Ok(())
}

/// Resolve the report format from a flag or the configuration.
pub fn report_format<'a>(flag: Option<&'a str>, config: &'a Config) -> Result<&'a str> {
    match flag.unwrap_or(config.output.format.as_str()) {
        f @ ("table" | "json") => Ok(f),
        other => anyhow::bail!("Unknown format: '{other}'. Available: table, json"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(CircuitFormat::from_path(Path::new("a.json")), CircuitFormat::Json);
        assert_eq!(CircuitFormat::from_path(Path::new("a.JSON")), CircuitFormat::Json);
        assert_eq!(CircuitFormat::from_path(Path::new("a.pb")), CircuitFormat::Protobuf);
        assert_eq!(CircuitFormat::from_path(Path::new("a")), CircuitFormat::Protobuf);
    }

    #[test]
    fn test_save_and_load_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        let circuit = Circuit::ghz(3).unwrap();
        let config = Config::default();

        for name in ["ghz.pb", "ghz.json"] {
            let path = dir.path().join(name);
            save_circuit(&circuit, &path).unwrap();
            assert_eq!(load_circuit(&path, &config).unwrap(), circuit);
        }
    }

    #[test]
    fn test_size_limit() {
        let mut config = Config::default();
        config.circuit.max_qubits = 2;
        assert!(check_size(&Circuit::ghz(3).unwrap(), &config).is_err());
        assert!(check_size(&Circuit::ghz(2).unwrap(), &config).is_ok());
    }

    #[test]
    fn test_report_format() {
        let config = Config::default();
        assert_eq!(report_format(None, &config).unwrap(), "table");
        assert_eq!(report_format(Some("json"), &config).unwrap(), "json");
        assert!(report_format(Some("xml"), &config).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = load_circuit(Path::new("/nonexistent/c.pb"), &Config::default()).unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }
}
