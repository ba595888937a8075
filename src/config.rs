//! Configuration module for container layouts and generation settings

use crate::error::{ModelSynthError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Format tag written at offset 0 of every container
pub const MAGIC: [u8; 4] = *b"TFL3";

/// Container format version
pub const FORMAT_VERSION: u32 = 1;

/// Seed used when none is configured
pub const DEFAULT_SEED: u64 = 42;

/// Where the container lands unless told otherwise
pub const DEFAULT_OUTPUT_PATH: &str = "assets/models/big_mood_detector/big_mood_detector.tflite";

/// Production model metadata record
pub const DEFAULT_METADATA_PATH: &str =
    "/tmp/big-mood-detector/model_weights/pat/production/pat_conv_l_v0.5929.json";

/// Feature scaler statistics record
pub const DEFAULT_SCALER_PATH: &str =
    "/tmp/big-mood-detector/model_weights/pat/production/nhanes_scaler_stats.json";

/// Supported container layouts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    /// Header only, one float block (~100KB)
    Simple,
    /// Header with metadata fields, conv and dense blocks (~25MB)
    #[default]
    Production,
}

impl ContainerFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Production => "production",
        }
    }

    /// Declared size used when the caller does not pick one
    pub fn default_declared_size(&self) -> u32 {
        match self {
            Self::Simple => 100_000,
            Self::Production => 25_000_000,
        }
    }
}

/// One run of synthetic float32 weights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerSpec {
    pub name: &'static str,
    pub count: usize,
    /// Inclusive lower bound of the uniform draw
    pub low: f32,
    /// Inclusive upper bound of the uniform draw
    pub high: f32,
}

impl LayerSpec {
    /// Size of the serialized block in bytes
    pub fn size_bytes(&self) -> usize {
        self.count * std::mem::size_of::<f32>()
    }
}

/// Byte layout of a container
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerLayout {
    pub format: ContainerFormat,
    pub magic: [u8; 4],
    pub version: u32,
    /// Whether `input_size` and `auc` follow the size field
    pub metadata_fields: bool,
    pub layers: Vec<LayerSpec>,
}

impl ContainerLayout {
    /// Layout for the given format
    pub fn for_format(format: ContainerFormat) -> Self {
        match format {
            ContainerFormat::Simple => Self {
                format,
                magic: MAGIC,
                version: FORMAT_VERSION,
                metadata_fields: false,
                layers: vec![LayerSpec {
                    name: "dense",
                    count: 1000,
                    low: -1.0,
                    high: 1.0,
                }],
            },
            ContainerFormat::Production => Self {
                format,
                magic: MAGIC,
                version: FORMAT_VERSION,
                metadata_fields: true,
                layers: vec![
                    LayerSpec {
                        name: "conv1d",
                        count: 1000,
                        low: -0.5,
                        high: 0.5,
                    },
                    LayerSpec {
                        name: "dense",
                        count: 5000,
                        low: -1.0,
                        high: 1.0,
                    },
                ],
            },
        }
    }

    /// Bytes before the first layer block
    pub fn header_len(&self) -> usize {
        let base = 12; // magic + version + declared_size
        if self.metadata_fields {
            base + 8
        } else {
            base
        }
    }

    /// Header plus every layer block; the container is never shorter than this
    pub fn fixed_len(&self) -> usize {
        self.header_len() + self.layers.iter().map(LayerSpec::size_bytes).sum::<usize>()
    }

    /// Byte offset at which layer `index` starts
    pub fn layer_offset(&self, index: usize) -> usize {
        self.header_len()
            + self.layers[..index]
                .iter()
                .map(LayerSpec::size_bytes)
                .sum::<usize>()
    }
}

impl Default for ContainerLayout {
    fn default() -> Self {
        Self::for_format(ContainerFormat::default())
    }
}

/// Generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    pub format: ContainerFormat,
    /// Total container length; the format default when unset
    pub declared_size: Option<u32>,
    pub seed: u64,
    pub output: PathBuf,
    pub metadata_path: PathBuf,
    pub scaler_path: PathBuf,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            format: ContainerFormat::default(),
            declared_size: None,
            seed: DEFAULT_SEED,
            output: PathBuf::from(DEFAULT_OUTPUT_PATH),
            metadata_path: PathBuf::from(DEFAULT_METADATA_PATH),
            scaler_path: PathBuf::from(DEFAULT_SCALER_PATH),
        }
    }
}

impl SynthConfig {
    /// Create a configuration for `format` with every other field defaulted
    pub fn new(format: ContainerFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    /// Load a configuration from a JSON file; absent keys keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ModelSynthError::with_context(format!("reading config {}", path.display()), e)
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Declared size after applying the format default
    pub fn effective_declared_size(&self) -> u32 {
        self.declared_size
            .unwrap_or_else(|| self.format.default_declared_size())
    }

    /// Layout implied by the configured format
    pub fn layout(&self) -> ContainerLayout {
        ContainerLayout::for_format(self.format)
    }

    /// Reject settings that cannot produce a container file
    pub fn validate(&self) -> Result<()> {
        if self.output.file_name().is_none() {
            return Err(ModelSynthError::invalid_config(format!(
                "output path '{}' does not name a file",
                self.output.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_production_layout() {
        let layout = ContainerLayout::for_format(ContainerFormat::Production);
        assert_eq!(layout.header_len(), 20);
        assert_eq!(layout.layer_offset(0), 20);
        assert_eq!(layout.layer_offset(1), 4020);
        assert_eq!(layout.fixed_len(), 24_020);
    }

    #[test]
    fn test_simple_layout() {
        let layout = ContainerLayout::for_format(ContainerFormat::Simple);
        assert_eq!(layout.header_len(), 12);
        assert_eq!(layout.fixed_len(), 4012);
        assert!(!layout.metadata_fields);
    }

    #[test]
    fn test_effective_declared_size() {
        let mut config = SynthConfig::new(ContainerFormat::Simple);
        assert_eq!(config.effective_declared_size(), 100_000);

        config.declared_size = Some(5);
        assert_eq!(config.effective_declared_size(), 5);

        let config = SynthConfig::default();
        assert_eq!(config.effective_declared_size(), 25_000_000);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_config_from_partial_json() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("synth.json");
        fs::write(&path, r#"{"format": "simple", "seed": 7}"#).unwrap();

        let config = SynthConfig::from_json_file(&path).unwrap();
        assert_eq!(config.format, ContainerFormat::Simple);
        assert_eq!(config.seed, 7);
        assert_eq!(config.output, PathBuf::from(DEFAULT_OUTPUT_PATH));
    }

    #[test]
    fn test_config_rejects_directory_output() {
        let config = SynthConfig {
            output: PathBuf::from("/"),
            ..SynthConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ModelSynthError::InvalidConfig(_))
        ));
    }
}
