//! Model metadata resolution with fallback to built-in defaults

use crate::config::{DEFAULT_METADATA_PATH, DEFAULT_SCALER_PATH};
use crate::error::MetadataError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Feature count of the NHANES scaler, used whenever metadata is unavailable
pub const DEFAULT_INPUT_SIZE: u32 = 18;

/// Metadata embedded into (or reported alongside) a container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_type: String,
    pub auc: f32,
    /// Informational; unrelated to the payload size
    pub parameter_count: u64,
    pub input_size: u32,
    pub date_trained: Option<String>,
}

impl Default for ModelMetadata {
    fn default() -> Self {
        Self {
            model_type: "PAT-Conv-L".to_string(),
            auc: 0.5929,
            parameter_count: 1_984_289,
            input_size: DEFAULT_INPUT_SIZE,
            date_trained: None,
        }
    }
}

/// On-disk model metadata record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub model_type: String,
    pub auc: f32,
    #[serde(alias = "parameter_count")]
    pub parameters: u64,
    pub date_trained: String,
}

/// On-disk feature scaler statistics; only the length of `mean` is used
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalerStats {
    #[serde(default)]
    pub mean: Option<Vec<Value>>,
}

impl ScalerStats {
    /// Number of scaled features, if the record carries a `mean` vector
    pub fn feature_count(&self) -> Option<usize> {
        self.mean.as_ref().map(Vec::len)
    }
}

/// Where the resolver reads its two records from
pub trait MetadataSource {
    /// Load the model metadata record
    fn load_metadata(&self) -> Result<MetadataRecord, MetadataError>;

    /// Load the scaler statistics record
    fn load_scaler_stats(&self) -> Result<ScalerStats, MetadataError>;

    /// Path of the scaler record, for diagnostics
    fn scaler_location(&self) -> PathBuf;
}

/// Reads both records as JSON files
#[derive(Debug, Clone, PartialEq)]
pub struct JsonFileSource {
    metadata_path: PathBuf,
    scaler_path: PathBuf,
}

impl JsonFileSource {
    pub fn new(metadata_path: impl Into<PathBuf>, scaler_path: impl Into<PathBuf>) -> Self {
        Self {
            metadata_path: metadata_path.into(),
            scaler_path: scaler_path.into(),
        }
    }

    fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, MetadataError> {
        let content = fs::read_to_string(path).map_err(|source| MetadataError::Missing {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| MetadataError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Default for JsonFileSource {
    fn default() -> Self {
        Self::new(DEFAULT_METADATA_PATH, DEFAULT_SCALER_PATH)
    }
}

impl MetadataSource for JsonFileSource {
    fn load_metadata(&self) -> Result<MetadataRecord, MetadataError> {
        Self::read_json(&self.metadata_path)
    }

    fn load_scaler_stats(&self) -> Result<ScalerStats, MetadataError> {
        Self::read_json(&self.scaler_path)
    }

    fn scaler_location(&self) -> PathBuf {
        self.scaler_path.clone()
    }
}

/// Outcome of metadata resolution
#[derive(Debug)]
pub enum Resolution {
    /// Both records were read successfully
    Loaded(ModelMetadata),
    /// Something failed; `metadata` holds the built-in defaults
    Defaulted {
        metadata: ModelMetadata,
        reason: MetadataError,
    },
}

impl Resolution {
    pub fn metadata(&self) -> &ModelMetadata {
        match self {
            Self::Loaded(metadata) | Self::Defaulted { metadata, .. } => metadata,
        }
    }

    pub fn into_metadata(self) -> ModelMetadata {
        match self {
            Self::Loaded(metadata) | Self::Defaulted { metadata, .. } => metadata,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, Self::Defaulted { .. })
    }

    /// Why the defaults were used, if they were
    pub fn reason(&self) -> Option<&MetadataError> {
        match self {
            Self::Loaded(_) => None,
            Self::Defaulted { reason, .. } => Some(reason),
        }
    }
}

/// Resolves [`ModelMetadata`] from a source, never failing
pub struct MetadataResolver<S = JsonFileSource> {
    source: S,
}

impl<S: MetadataSource> MetadataResolver<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Read both records; any failure substitutes [`ModelMetadata::default`]
    pub fn resolve(&self) -> Resolution {
        match self.try_resolve() {
            Ok(metadata) => {
                info!(
                    model_type = %metadata.model_type,
                    auc = metadata.auc,
                    parameters = metadata.parameter_count,
                    input_size = metadata.input_size,
                    "loaded model metadata"
                );
                Resolution::Loaded(metadata)
            }
            Err(reason) => {
                warn!(error = %reason, "metadata unavailable, using defaults");
                Resolution::Defaulted {
                    metadata: ModelMetadata::default(),
                    reason,
                }
            }
        }
    }

    fn try_resolve(&self) -> Result<ModelMetadata, MetadataError> {
        let record = self.source.load_metadata()?;
        let stats = self.source.load_scaler_stats()?;

        let input_size = stats
            .feature_count()
            .ok_or_else(|| MetadataError::MissingField {
                path: self.source.scaler_location(),
                field: "mean",
            })?;
        debug!(input_size, "scaler statistics read");

        Ok(ModelMetadata {
            model_type: record.model_type,
            auc: record.auc,
            parameter_count: record.parameters,
            input_size: header_input_size(input_size, &self.source.scaler_location())?,
            date_trained: Some(record.date_trained),
        })
    }
}

/// Feature count as the `u32` header field; larger counts cannot be encoded
fn header_input_size(count: usize, path: &Path) -> Result<u32, MetadataError> {
    u32::try_from(count).map_err(|_| MetadataError::InvalidField {
        path: path.to_path_buf(),
        field: "mean",
        reason: format!("{} features do not fit the 32-bit input size", count),
    })
}

impl Default for MetadataResolver<JsonFileSource> {
    fn default() -> Self {
        Self::new(JsonFileSource::default())
    }
}
