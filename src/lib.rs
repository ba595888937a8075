//! modelsynth - Deterministic synthetic model assets
//!
//! This crate produces placeholder model binaries for mobile ML pipelines:
//! a `TFL3`-tagged container with a fixed header, embedded model metadata and
//! a pseudo-random payload that is byte-for-byte reproducible from its seed.
//!
//! # Features
//!
//! - **Metadata resolution**: reads model and scaler records, falling back to
//!   built-in defaults when they are missing or malformed
//! - **Deterministic payload**: one seeded generator stream, consumed in a
//!   fixed order across layer blocks and padding
//! - **Streaming output**: padding is written in bounded chunks, and the file
//!   only appears at its destination once fully written
//!
//! # Example
//!
//! ```rust
//! use modelsynth::{ContainerBuilder, ContainerFormat, ContainerLayout, ModelMetadata};
//!
//! let builder = ContainerBuilder::new(ContainerLayout::for_format(ContainerFormat::Production));
//! let data = builder.build(&ModelMetadata::default(), 100_000);
//!
//! assert_eq!(data.len(), 100_000);
//! assert_eq!(&data[0..4], b"TFL3");
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod generator;
pub mod metadata;

pub use builder::{ContainerBuilder, ContainerHeader};
pub use config::{ContainerFormat, ContainerLayout, LayerSpec, SynthConfig};
pub use error::{MetadataError, ModelSynthError, Result};
pub use generator::{GenerationResult, SyntheticGenerator};
pub use metadata::{JsonFileSource, MetadataResolver, MetadataSource, ModelMetadata, Resolution};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types
pub mod prelude {
    pub use crate::builder::ContainerBuilder;
    pub use crate::config::{ContainerFormat, ContainerLayout, SynthConfig};
    pub use crate::error::{ModelSynthError, Result};
    pub use crate::generator::SyntheticGenerator;
    pub use crate::metadata::{MetadataResolver, ModelMetadata, Resolution};
}
