//! Optimizer configuration.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML or JSON, chosen by extension)
//! 2. Environment variables (with `CIRCOPT_` prefix)
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options controlling which passes a [`PassManagerBuilder`] schedules.
///
/// [`PassManagerBuilder`]: crate::PassManagerBuilder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Optimization level (0-3)
    #[serde(default = "default_optimization_level")]
    pub optimization_level: u8,

    /// Maximum number of qubits per collected block (level 3)
    #[serde(default = "default_max_block_size")]
    pub max_block_size: usize,

    /// Expand SWAP gates into CNOTs
    #[serde(default)]
    pub decompose_swaps: bool,

    /// Use the Hadamard-conjugated middle CNOT when expanding SWAPs
    #[serde(default)]
    pub directed_architecture: bool,

    /// Replace each reset with a fresh qubit
    #[serde(default)]
    pub eliminate_resets: bool,

    /// Move measurements to the end of the circuit
    #[serde(default)]
    pub defer_measurements: bool,

    /// Drop trailing measurements (level 2 and above)
    #[serde(default)]
    pub remove_final_measurements: bool,

    /// Absorb trailing SWAPs into the output permutation
    #[serde(default)]
    pub backpropagate_output_permutation: bool,

    /// Inline compound operations at the end of the pipeline
    #[serde(default)]
    pub flatten: bool,
}

fn default_optimization_level() -> u8 {
    1
}

fn default_max_block_size() -> usize {
    2
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig {
            optimization_level: default_optimization_level(),
            max_block_size: default_max_block_size(),
            decompose_swaps: false,
            directed_architecture: false,
            eliminate_resets: false,
            defer_measurements: false,
            remove_final_measurements: false,
            backpropagate_output_permutation: false,
            flatten: false,
        }
    }
}

impl OptimizerConfig {
    /// Load configuration from a YAML or JSON file.
    ///
    /// Files ending in `.json` are parsed as JSON, everything else as YAML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&contents)
        } else {
            Self::from_yaml_str(&contents)
        }
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: OptimizerConfig = serde_yaml_ng::from_str(contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        let config: OptimizerConfig =
            serde_json::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with the following precedence:
    /// 1. Load from file if provided
    /// 2. Apply environment variable overrides
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => OptimizerConfig::default(),
        };

        let config = config.merge_env();
        config.validate()?;
        Ok(config)
    }

    /// Merge `CIRCOPT_*` environment variables into this configuration.
    pub fn merge_env(self) -> Self {
        self.merge_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by environment variable name.
    ///
    /// Only keys that resolve override the current values; values that do
    /// not parse are ignored.
    pub fn merge_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(val) = lookup("CIRCOPT_OPTIMIZATION_LEVEL").and_then(|v| v.parse().ok()) {
            self.optimization_level = val;
        }
        if let Some(val) = lookup("CIRCOPT_MAX_BLOCK_SIZE").and_then(|v| v.parse().ok()) {
            self.max_block_size = val;
        }

        let flags: [(&str, &mut bool); 7] = [
            ("CIRCOPT_DECOMPOSE_SWAPS", &mut self.decompose_swaps),
            ("CIRCOPT_DIRECTED_ARCHITECTURE", &mut self.directed_architecture),
            ("CIRCOPT_ELIMINATE_RESETS", &mut self.eliminate_resets),
            ("CIRCOPT_DEFER_MEASUREMENTS", &mut self.defer_measurements),
            ("CIRCOPT_REMOVE_FINAL_MEASUREMENTS", &mut self.remove_final_measurements),
            (
                "CIRCOPT_BACKPROPAGATE_OUTPUT_PERMUTATION",
                &mut self.backpropagate_output_permutation,
            ),
            ("CIRCOPT_FLATTEN", &mut self.flatten),
        ];
        for (key, field) in flags {
            if let Some(val) = lookup(key).as_deref().and_then(parse_flag) {
                *field = val;
            }
        }

        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.optimization_level > 3 {
            return Err(ConfigError::ValidationError(format!(
                "Invalid optimization level: {} (expected 0-3)",
                self.optimization_level
            )));
        }

        if self.max_block_size == 0 {
            return Err(ConfigError::ValidationError(
                "max_block_size must be greater than 0".to_string(),
            ));
        }

        if self.directed_architecture && !self.decompose_swaps {
            return Err(ConfigError::ValidationError(
                "directed_architecture requires decompose_swaps".to_string(),
            ));
        }

        if self.flatten && self.optimization_level >= 3 {
            return Err(ConfigError::ValidationError(
                "flatten would undo block collection at optimization level 3".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
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

    #[test]
    fn test_default_config() {
        let config = OptimizerConfig::default();
        assert_eq!(config.optimization_level, 1);
        assert_eq!(config.max_block_size, 2);
        assert!(!config.flatten);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_partial_uses_defaults() {
        let config = OptimizerConfig::from_yaml_str(
            "optimization_level: 2\nremove_final_measurements: true\n",
        )
        .unwrap();
        assert_eq!(config.optimization_level, 2);
        assert!(config.remove_final_measurements);
        assert_eq!(config.max_block_size, 2);
    }

    #[test]
    fn test_json_config() {
        let config =
            OptimizerConfig::from_json_str(r#"{"max_block_size": 3, "eliminate_resets": true}"#)
                .unwrap();
        assert_eq!(config.max_block_size, 3);
        assert!(config.eliminate_resets);
    }

    #[test]
    fn test_parse_error() {
        let err = OptimizerConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_validate_invalid_level() {
        let config = OptimizerConfig {
            optimization_level: 4,
            ..OptimizerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_zero_block_size() {
        let err = OptimizerConfig::from_yaml_str("max_block_size: 0").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_directed_without_decomposition() {
        let config = OptimizerConfig {
            directed_architecture: true,
            ..OptimizerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_flatten_at_level_three() {
        let config = OptimizerConfig {
            optimization_level: 3,
            flatten: true,
            ..OptimizerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("CIRCOPT_OPTIMIZATION_LEVEL", "3"),
            ("CIRCOPT_MAX_BLOCK_SIZE", "not a number"),
            ("CIRCOPT_DEFER_MEASUREMENTS", "true"),
            ("CIRCOPT_FLATTEN", "maybe"),
        ]
        .into_iter()
        .collect();

        let config = OptimizerConfig::default()
            .merge_overrides(|key| env.get(key).map(|v| (*v).to_string()));
        assert_eq!(config.optimization_level, 3);
        assert_eq!(config.max_block_size, 2);
        assert!(config.defer_measurements);
        assert!(!config.flatten);
    }

    #[test]
    fn test_missing_file() {
        let err = OptimizerConfig::from_file("/nonexistent/circopt.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("ON"), Some(true));
        assert_eq!(parse_flag(" 0 "), Some(false));
        assert_eq!(parse_flag("2"), None);
    }
}
