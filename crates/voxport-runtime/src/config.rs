use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use voxport_mesh::{DEFAULT_MAX_PASSES, DEFAULT_OVERLAP_DISTANCE};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Export session settings. Every key is optional in TOML.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportConfig {
    /// Worker count; 1 runs every chunk on the calling thread.
    pub threads: usize,
    /// Horizontal export radius in blocks.
    pub radius: i32,
    pub lower_height: i32,
    pub upper_height: i32,
    /// Shift output so the export centre lands on the origin (x/z).
    pub relative_coordinates: bool,
    pub optimize_mesh: bool,
    pub enable_entities: bool,
    pub overlap_distance: f32,
    pub max_overlap_passes: usize,
    pub chunks_per_delivery: usize,
    pub privileged_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub task_queue_depth: usize,
    pub cache_capacity: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            radius: 32,
            lower_height: 0,
            upper_height: 255,
            relative_coordinates: true,
            optimize_mesh: true,
            enable_entities: true,
            overlap_distance: DEFAULT_OVERLAP_DISTANCE,
            max_overlap_passes: DEFAULT_MAX_PASSES,
            chunks_per_delivery: 10,
            privileged_timeout_ms: 30_000,
            poll_interval_ms: 50,
            task_queue_depth: 10,
            cache_capacity: 8192,
        }
    }
}

impl ExportConfig {
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        let cfg: ExportConfig = toml::from_str(src)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let src = std::fs::read_to_string(path)?;
        Self::from_toml_str(&src)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));
        if self.threads == 0 {
            return invalid("threads must be at least 1");
        }
        if self.radius < 0 {
            return invalid("radius must not be negative");
        }
        if self.lower_height > self.upper_height {
            return invalid("lower_height is above upper_height");
        }
        if !(self.overlap_distance.is_finite() && self.overlap_distance > 0.0) {
            return invalid("overlap_distance must be a positive number");
        }
        if self.max_overlap_passes == 0 {
            return invalid("max_overlap_passes must be at least 1");
        }
        if self.chunks_per_delivery == 0 {
            return invalid("chunks_per_delivery must be at least 1");
        }
        if self.task_queue_depth == 0 {
            return invalid("task_queue_depth must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        assert_eq!(ExportConfig::from_toml_str("").unwrap(), ExportConfig::default());
    }

    #[test]
    fn partial_override() {
        let cfg = ExportConfig::from_toml_str("threads = 4\noptimize_mesh = false\n").unwrap();
        assert_eq!(cfg.threads, 4);
        assert!(!cfg.optimize_mesh);
        assert_eq!(cfg.radius, 32);
    }

    #[test]
    fn rejects_inverted_heights() {
        let err = ExportConfig::from_toml_str("lower_height = 10\nupper_height = 5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_types() {
        assert!(matches!(
            ExportConfig::from_toml_str("threads = \"many\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
