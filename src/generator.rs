//! End-to-end container generation: resolve metadata, build, write

use crate::builder::ContainerBuilder;
use crate::config::{ContainerFormat, SynthConfig};
use crate::error::{ModelSynthError, Result};
use crate::metadata::{JsonFileSource, MetadataResolver, MetadataSource, ModelMetadata};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Result of synthetic generation
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub output_path: PathBuf,
    pub format: ContainerFormat,
    pub metadata: ModelMetadata,
    /// Whether the built-in metadata defaults were used
    pub metadata_defaulted: bool,
    pub declared_size: u32,
    /// Seed the payload was generated from
    pub seed: u64,
    pub bytes_written: u64,
    pub magic: [u8; 4],
    pub elapsed: Duration,
}

impl GenerationResult {
    /// Print a summary of the generation
    pub fn print_summary(&self) {
        println!("✅ Container generated!");
        println!("  📁 Location: {}", self.output_path.display());
        println!(
            "  📊 Size: {} bytes ({:.1} MB)",
            self.bytes_written,
            self.bytes_written as f64 / 1024.0 / 1024.0
        );
        println!("  🔍 Magic: {}", String::from_utf8_lossy(&self.magic));
        println!("  🎲 Seed: {}", self.seed);
        if self.format == ContainerFormat::Production {
            println!("  🎯 AUC: {}", self.metadata.auc);
            println!("  📈 Parameters: {}", self.metadata.parameter_count);
            println!("  🔢 Input size: {}", self.metadata.input_size);
        }
        if self.metadata_defaulted {
            println!("  ⚠️  Metadata: built-in defaults");
        }
        println!("  ⏱️  Elapsed: {:.2}s", self.elapsed.as_secs_f64());
    }
}

/// Drives metadata resolution, container construction and the final write
pub struct SyntheticGenerator {
    config: SynthConfig,
    builder: ContainerBuilder,
    show_progress: bool,
}

impl SyntheticGenerator {
    /// Create a new synthetic generator
    pub fn new(config: SynthConfig) -> Self {
        let builder = ContainerBuilder::new(config.layout()).with_seed(config.seed);
        Self {
            config,
            builder,
            show_progress: false,
        }
    }

    /// Enable progress bar
    pub fn with_progress(mut self) -> Self {
        self.show_progress = true;
        self
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    /// Generate using the configured JSON metadata files
    pub fn generate(&self) -> Result<GenerationResult> {
        let source = JsonFileSource::new(&self.config.metadata_path, &self.config.scaler_path);
        self.generate_from(&MetadataResolver::new(source))
    }

    /// Generate using an explicit metadata resolver
    pub fn generate_from<S: MetadataSource>(
        &self,
        resolver: &MetadataResolver<S>,
    ) -> Result<GenerationResult> {
        self.config.validate()?;
        let start = Instant::now();

        info!(format = self.config.format.as_str(), "generating synthetic container");

        let resolution = resolver.resolve();
        let metadata_defaulted = resolution.is_defaulted();
        let metadata = resolution.into_metadata();

        let declared_size = self.config.effective_declared_size();
        let bytes_written = self.write_container(&metadata, declared_size)?;

        info!(
            path = %self.config.output.display(),
            bytes = bytes_written,
            "container written"
        );

        Ok(GenerationResult {
            output_path: self.config.output.clone(),
            format: self.config.format,
            metadata,
            metadata_defaulted,
            declared_size,
            seed: self.builder.seed(),
            bytes_written,
            magic: self.builder.layout().magic,
            elapsed: start.elapsed(),
        })
    }

    /// Stream the container into a temp file next to the output, then rename it
    /// into place. A failure at any point leaves the output path untouched.
    fn write_container(&self, metadata: &ModelMetadata, declared_size: u32) -> Result<u64> {
        let output = &self.config.output;
        let dir = output_dir(output);
        let fail = |e| ModelSynthError::write_failure(output, e);

        fs::create_dir_all(dir).map_err(fail)?;
        let mut tmp = NamedTempFile::new_in(dir).map_err(fail)?;
        debug!(tmp = %tmp.path().display(), "staging container");

        let progress = self
            .show_progress
            .then(|| self.progress_bar(self.builder.output_len(declared_size) as u64));

        let mut buffered = BufWriter::new(&mut tmp);
        let written = match &progress {
            Some(pb) => {
                self.builder
                    .write_to(metadata, declared_size, &mut pb.wrap_write(&mut buffered))
            }
            None => self.builder.write_to(metadata, declared_size, &mut buffered),
        }
        .map_err(fail)?;
        buffered.flush().map_err(fail)?;
        drop(buffered);

        if let Some(pb) = progress {
            pb.finish_with_message("written");
        }

        tmp.as_file().sync_all().map_err(fail)?;
        tmp.persist(output).map_err(|e| fail(e.error))?;

        Ok(written)
    }

    fn progress_bar(&self, total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(style);
        pb
    }
}

/// Directory the output file lives in; a bare file name means the working directory
fn output_dir(output: &Path) -> &Path {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config_in(dir: &Path) -> SynthConfig {
        SynthConfig {
            declared_size: Some(30_000),
            output: dir.join("models").join("model.tflite"),
            metadata_path: dir.join("missing.json"),
            scaler_path: dir.join("missing_scaler.json"),
            ..SynthConfig::default()
        }
    }

    #[test]
    fn test_generation_creates_directories() {
        let temp_dir = tempdir().unwrap();
        let generator = SyntheticGenerator::new(config_in(temp_dir.path()));

        let result = generator.generate().unwrap();

        assert!(result.metadata_defaulted);
        assert_eq!(result.seed, 42);
        assert_eq!(result.bytes_written, 30_000);
        assert_eq!(fs::metadata(&result.output_path).unwrap().len(), 30_000);
    }

    #[test]
    fn test_overwrites_existing_file() {
        let temp_dir = tempdir().unwrap();
        let config = config_in(temp_dir.path());
        fs::create_dir_all(config.output.parent().unwrap()).unwrap();
        fs::write(&config.output, b"stale").unwrap();

        SyntheticGenerator::new(config.clone()).generate().unwrap();

        let data = fs::read(&config.output).unwrap();
        assert_eq!(data.len(), 30_000);
        assert_eq!(&data[0..4], b"TFL3");
    }

    #[test]
    fn test_output_dir_for_bare_name() {
        assert_eq!(output_dir(Path::new("model.tflite")), Path::new("."));
        assert_eq!(output_dir(Path::new("a/b.tflite")), Path::new("a"));
    }

    #[test]
    fn test_result_reports_configured_seed() {
        let temp_dir = tempdir().unwrap();
        let config = SynthConfig {
            seed: 1234,
            ..config_in(temp_dir.path())
        };
        let generator = SyntheticGenerator::new(config);
        assert_eq!(generator.config().seed, 1234);

        let result = generator.generate().unwrap();
        assert_eq!(result.seed, 1234);
        assert_eq!(result.declared_size, generator.config().effective_declared_size());
    }

    #[test]
    fn test_progress_generation() {
        let temp_dir = tempdir().unwrap();
        let generator = SyntheticGenerator::new(config_in(temp_dir.path())).with_progress();
        let result = generator.generate().unwrap();
        assert_eq!(result.bytes_written, 30_000);
    }
}
