//! Deterministic container construction
//!
//! The builder owns one seeded generator per call and consumes it in a fixed
//! order: every float of every layer block, then the padding bytes. Header
//! fields never touch the generator.

use crate::config::{ContainerLayout, LayerSpec, DEFAULT_SEED};
use crate::metadata::ModelMetadata;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Uniform};
use std::convert::Infallible;
use std::io::{self, Write};
use tracing::debug;

/// Padding is generated and flushed in chunks of this many bytes
pub const PADDING_CHUNK: usize = 64 * 1024;

/// Fixed header written at offset 0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerHeader {
    pub magic: [u8; 4],
    pub version: u32,
    pub declared_size: u32,
    /// `(input_size, auc)` for layouts that embed metadata
    pub fields: Option<(u32, f32)>,
}

impl ContainerHeader {
    pub fn new(layout: &ContainerLayout, metadata: &ModelMetadata, declared_size: u32) -> Self {
        Self {
            magic: layout.magic,
            version: layout.version,
            declared_size,
            fields: layout
                .metadata_fields
                .then_some((metadata.input_size, metadata.auc)),
        }
    }

    /// Serialize to little-endian bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(20);
        buf.extend_from_slice(&self.magic);
        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.extend_from_slice(&self.declared_size.to_le_bytes());
        if let Some((input_size, auc)) = self.fields {
            buf.extend_from_slice(&input_size.to_le_bytes());
            buf.extend_from_slice(&auc.to_le_bytes());
        }
        buf
    }
}

/// Builds containers for one layout
#[derive(Debug, Clone)]
pub struct ContainerBuilder {
    layout: ContainerLayout,
    seed: u64,
}

impl ContainerBuilder {
    /// Create a builder seeded with [`DEFAULT_SEED`]
    pub fn new(layout: ContainerLayout) -> Self {
        Self {
            layout,
            seed: DEFAULT_SEED,
        }
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn layout(&self) -> &ContainerLayout {
        &self.layout
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Header plus layer blocks; no container is shorter than this
    pub fn fixed_len(&self) -> usize {
        self.layout.fixed_len()
    }

    /// Length the container will have for `declared_size`
    pub fn output_len(&self, declared_size: u32) -> usize {
        (declared_size as usize).max(self.fixed_len())
    }

    /// Build the whole container in memory
    pub fn build(&self, metadata: &ModelMetadata, declared_size: u32) -> Vec<u8> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.build_with_rng(&mut rng, metadata, declared_size)
    }

    /// Build using a caller-supplied generator instead of the seeded one
    pub fn build_with_rng<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        metadata: &ModelMetadata,
        declared_size: u32,
    ) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.output_len(declared_size));
        let emitted: Result<u64, Infallible> =
            self.emit(rng, metadata, declared_size, |chunk| {
                out.extend_from_slice(chunk);
                Ok(())
            });
        match emitted {
            Ok(_) => out,
            Err(never) => match never {},
        }
    }

    /// Stream the container to `writer`, returning the number of bytes written.
    ///
    /// Produces exactly the bytes [`build`](Self::build) would, but only holds
    /// one layer block or one padding chunk in memory at a time.
    pub fn write_to<W: Write + ?Sized>(
        &self,
        metadata: &ModelMetadata,
        declared_size: u32,
        writer: &mut W,
    ) -> io::Result<u64> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.emit(&mut rng, metadata, declared_size, |chunk| {
            writer.write_all(chunk)
        })
    }

    fn emit<R, E, F>(
        &self,
        rng: &mut R,
        metadata: &ModelMetadata,
        declared_size: u32,
        mut sink: F,
    ) -> Result<u64, E>
    where
        R: Rng + ?Sized,
        F: FnMut(&[u8]) -> Result<(), E>,
    {
        let header = ContainerHeader::new(&self.layout, metadata, declared_size).to_bytes();
        sink(&header)?;
        let mut written = header.len();

        let mut buf = Vec::new();
        for spec in &self.layout.layers {
            buf.clear();
            sample_layer(rng, spec, &mut buf);
            sink(&buf)?;
            written += buf.len();
            debug!(layer = spec.name, count = spec.count, offset = written, "layer block emitted");
        }

        let mut remaining = (declared_size as usize).saturating_sub(written);
        debug!(padding = remaining, "padding container");
        while remaining > 0 {
            let len = remaining.min(PADDING_CHUNK);
            buf.clear();
            sample_padding(rng, len, &mut buf);
            sink(&buf)?;
            written += len;
            remaining -= len;
        }

        Ok(written as u64)
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new(ContainerLayout::default())
    }
}

/// Append `spec.count` uniform floats in `[low, high]` as little-endian bytes
fn sample_layer<R: Rng + ?Sized>(rng: &mut R, spec: &LayerSpec, out: &mut Vec<u8>) {
    let uniform = Uniform::new_inclusive(spec.low, spec.high);
    out.reserve(spec.size_bytes());
    for _ in 0..spec.count {
        let value: f32 = uniform.sample(rng);
        out.extend_from_slice(&value.to_le_bytes());
    }
}

/// Append `len` uniform bytes in `[0, 255]`
fn sample_padding<R: Rng + ?Sized>(rng: &mut R, len: usize, out: &mut Vec<u8>) {
    let uniform = Uniform::new_inclusive(0u8, 255);
    out.reserve(len);
    for _ in 0..len {
        out.push(uniform.sample(rng));
    }
}
