//! modelsynth - Command-line interface for synthetic model containers

use clap::{Parser, ValueEnum};
use modelsynth::{ContainerFormat, Result, SynthConfig, SyntheticGenerator};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "modelsynth",
    about = "Deterministic synthetic model containers for mobile ML pipelines",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    /// Container layout to generate
    #[arg(short = 'f', long, value_enum)]
    format: Option<CliFormat>,

    /// Declared container size in bytes (format default when omitted)
    #[arg(short = 's', long)]
    size: Option<u32>,

    /// Output file
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Model metadata JSON record
    #[arg(long)]
    metadata: Option<PathBuf>,

    /// Scaler statistics JSON record
    #[arg(long)]
    scaler: Option<PathBuf>,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Load settings from a JSON file; other flags override it
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Show progress bar
    #[arg(short = 'p', long)]
    progress: bool,

    /// Verbose output
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[derive(Debug, ValueEnum, Clone, Copy)]
enum CliFormat {
    Simple,
    Production,
}

impl From<CliFormat> for ContainerFormat {
    fn from(cli: CliFormat) -> Self {
        match cli {
            CliFormat::Simple => ContainerFormat::Simple,
            CliFormat::Production => ContainerFormat::Production,
        }
    }
}

impl Cli {
    /// Merge the optional config file with explicit flags
    fn to_config(&self) -> Result<SynthConfig> {
        let mut config = match &self.config {
            Some(path) => SynthConfig::from_json_file(path)?,
            None => SynthConfig::default(),
        };

        if let Some(format) = self.format {
            config.format = format.into();
        }
        if let Some(size) = self.size {
            config.declared_size = Some(size);
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if let Some(metadata) = &self.metadata {
            config.metadata_path = metadata.clone();
        }
        if let Some(scaler) = &self.scaler {
            config.scaler_path = scaler.clone();
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }

        Ok(config)
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.to_config()?;

    println!("🤖 Generating {} container...", config.format.as_str());
    println!("  Output: {}", config.output.display());
    println!("  Declared size: {} bytes", config.effective_declared_size());
    println!("  Seed: {}", config.seed);
    println!();

    let mut generator = SyntheticGenerator::new(config);
    if cli.progress {
        generator = generator.with_progress();
    }

    let result = generator.generate()?;

    println!();
    result.print_summary();

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        "modelsynth=debug"
    } else {
        "modelsynth=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "generation failed");
            eprintln!("❌ {}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from(["modelsynth", "-f", "simple", "--seed", "7", "-s", "5000"]);
        let config = cli.to_config().unwrap();

        assert_eq!(config.format, ContainerFormat::Simple);
        assert_eq!(config.seed, 7);
        assert_eq!(config.effective_declared_size(), 5000);
    }

    #[test]
    fn test_defaults_without_flags() {
        let cli = Cli::parse_from(["modelsynth"]);
        assert_eq!(cli.to_config().unwrap(), SynthConfig::default());
    }
}
