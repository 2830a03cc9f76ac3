//! Configuration for the qcir CLI.
//!
//! Supports loading configuration from:
//! 1. A YAML file given with `--config`, or `~/.qcir/config.yaml` if present
//! 2. Environment variables (with QCIR_ prefix)
//! 3. .env files
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Output rendering
    #[serde(default)]
    pub output: OutputConfig,

    /// Circuit handling
    #[serde(default)]
    pub circuit: CircuitConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Level used when no `-v` flag is given: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "console" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default report format: "table" or "json"
    #[serde(default = "default_output_format")]
    pub format: String,

    /// Maximum number of histogram rows printed in table mode
    #[serde(default = "default_histogram_rows")]
    pub histogram_rows: usize,
}

/// Circuit handling configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitConfig {
    /// Reject broadcast pushes whose target lists differ in length
    #[serde(default)]
    pub strict_targets: bool,

    /// Largest qubit register accepted from input files
    #[serde(default = "default_max_qubits")]
    pub max_qubits: usize,

    /// Let `transform --remove-swaps` descend into blocks and declarations
    #[serde(default)]
    pub remove_swaps_recursive: bool,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "console".to_string()
}

fn default_output_format() -> String {
    "table".to_string()
}

fn default_histogram_rows() -> usize {
    16
}

fn default_max_qubits() -> usize {
    1024
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            format: default_output_format(),
            histogram_rows: default_histogram_rows(),
        }
    }
}

impl Default for CircuitConfig {
    fn default() -> Self {
        CircuitConfig {
            strict_targets: false,
            max_qubits: default_max_qubits(),
            remove_swaps_recursive: false,
        }
    }
}

/// Path of the per-user configuration file.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".qcir").join("config.yaml"))
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {e}", path.display())))?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config =
            serde_yaml_ng::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with the following precedence:
    /// 1. Load from file if provided, else from the per-user file if it exists
    /// 2. Load .env file if it exists
    /// 3. Apply environment variable overrides
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(path)?,
                None => Config::default(),
            },
        };

        dotenvy::dotenv().ok();

        let config = config.merge_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `QCIR_*` overrides read through `lookup`.
    ///
    /// Only variables that are set override the current values.
    pub fn merge_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(v) = lookup("QCIR_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = lookup("QCIR_LOG_FORMAT") {
            self.logging.format = v;
        }
        if let Some(v) = lookup("QCIR_OUTPUT_FORMAT") {
            self.output.format = v;
        }
        if let Some(v) = lookup("QCIR_STRICT_TARGETS") {
            self.circuit.strict_targets = parse_flag("QCIR_STRICT_TARGETS", &v)?;
        }
        if let Some(v) = lookup("QCIR_MAX_QUBITS") {
            self.circuit.max_qubits = v.parse().map_err(|_| {
                ConfigError::ValidationError(format!("QCIR_MAX_QUBITS is not a number: {v}"))
            })?;
        }
        if let Some(v) = lookup("QCIR_REMOVE_SWAPS_RECURSIVE") {
            self.circuit.remove_swaps_recursive = parse_flag("QCIR_REMOVE_SWAPS_RECURSIVE", &v)?;
        }
        Ok(self)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: {other}"
                )));
            }
        }

        match self.logging.format.as_str() {
            "console" | "json" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format: {other}"
                )));
            }
        }

        match self.output.format.as_str() {
            "table" | "json" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid output format: {other}"
                )));
            }
        }

        if self.circuit.max_qubits == 0 {
            return Err(ConfigError::ValidationError(
                "max_qubits must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::ValidationError(format!(
            "{key} must be a boolean, got {value}"
        ))),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, "console");
        assert_eq!(config.output.format, "table");
        assert_eq!(config.circuit.max_qubits, 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = Config::from_yaml("circuit:\n  strict_targets: true\n").unwrap();
        assert!(config.circuit.strict_targets);
        assert_eq!(config.circuit.max_qubits, 1024);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            Config::from_yaml("logging: [unclosed"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_validate_invalid_values() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        let mut config = Config::default();
        config.circuit.max_qubits = 0;
        assert!(config.validate().is_err());

        assert!(Config::from_yaml("output:\n  format: csv\n").is_err());
    }

    #[test]
    fn test_env_overrides_file_values() {
        let config = Config::from_yaml("output:\n  format: json\n").unwrap();
        let config = config
            .merge_env(env(&[
                ("QCIR_OUTPUT_FORMAT", "table"),
                ("QCIR_MAX_QUBITS", "64"),
                ("QCIR_REMOVE_SWAPS_RECURSIVE", "yes"),
            ]))
            .unwrap();
        assert_eq!(config.output.format, "table");
        assert_eq!(config.circuit.max_qubits, 64);
        assert!(config.circuit.remove_swaps_recursive);
        assert!(!config.circuit.strict_targets);
    }

    #[test]
    fn test_env_rejects_malformed_values() {
        let err = Config::default()
            .merge_env(env(&[("QCIR_STRICT_TARGETS", "maybe")]))
            .unwrap_err();
        assert!(err.to_string().contains("QCIR_STRICT_TARGETS"));
        assert!(
            Config::default()
                .merge_env(env(&[("QCIR_MAX_QUBITS", "-3")]))
                .is_err()
        );
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Config::from_file("/nonexistent/qcir.yaml"),
            Err(ConfigError::IoError(_))
        ));
    }
}
