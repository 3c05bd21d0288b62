// Tue Jan 13 2026 - Alex

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub alignment: usize,
    pub limit: Option<usize>,
    /// Upper bound of a scan when no range is given.
    pub range_max: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub function_alignment: u32,
    /// How far directional prologue/epilogue searches may walk.
    pub max_search_distance: u32,
    pub string_section: String,
    pub data_section: String,
    pub string_alignment: usize,
    pub null_terminate_strings: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            alignment: 1,
            limit: None,
            range_max: 0x8000_0000,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            function_alignment: 16,
            max_search_distance: 0x0100_0000,
            string_section: ".rdata".to_string(),
            data_section: ".data".to_string(),
            string_alignment: 4,
            null_terminate_strings: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan: ScanConfig::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_function_alignment(mut self, alignment: u32) -> Self {
        self.analysis.function_alignment = alignment;
        self
    }

    pub fn with_max_search_distance(mut self, distance: u32) -> Self {
        self.analysis.max_search_distance = distance;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan.alignment == 0 {
            return Err(ConfigError::Invalid("scan.alignment must be greater than 0".to_string()));
        }
        if self.analysis.string_alignment == 0 {
            return Err(ConfigError::Invalid("analysis.string_alignment must be greater than 0".to_string()));
        }
        if !self.analysis.function_alignment.is_power_of_two() {
            return Err(ConfigError::Invalid("analysis.function_alignment must be a power of two".to_string()));
        }
        if self.scan.range_max > 1 << 32 {
            return Err(ConfigError::Invalid("scan.range_max exceeds the 32-bit address space".to_string()));
        }
        Ok(())
    }
}
