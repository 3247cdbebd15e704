//! Binary capture decoding.
//!
//! A capture file is a bare sequence of 4-byte little-endian unsigned
//! integers: no header, no footer. The decoder reads it in fixed-size chunks,
//! polls the [`CancelToken`] before each chunk, and drops a trailing partial
//! record.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use log::{debug, warn};

use super::cancel::CancelToken;

/// Bytes per decoded sample.
pub const SAMPLE_SIZE: usize = 4;

/// Default chunk size between cancellation checks (must be a multiple of 4).
pub const DEFAULT_CHUNK_BYTES: usize = 64 * 1024;

/// Largest accepted chunk size.
pub const MAX_CHUNK_BYTES: usize = 64 * 1024 * 1024;

/// How a decode ended.
#[derive(Debug)]
pub enum DecodeOutcome {
    /// End of file reached.
    Complete,
    /// The cancellation flag was observed between chunks.
    Cancelled,
    /// An I/O error stopped the read; samples hold whatever was decoded before it.
    Failed(io::Error),
}

/// Samples decoded from one capture file plus how the read ended.
///
/// Decoding never raises: I/O failures are reported through
/// [`DecodeOutcome::Failed`] and the caller decides what to surface.
#[derive(Debug)]
pub struct DecodedWaveform {
    /// Decoded samples (partial when the outcome is not `Complete`).
    pub samples: Vec<u32>,
    /// How the read ended.
    pub outcome: DecodeOutcome,
}

impl DecodedWaveform {
    /// Whether the whole file was decoded.
    pub fn is_complete(&self) -> bool {
        matches!(self.outcome, DecodeOutcome::Complete)
    }
}

/// Decoder for `.data32` capture files.
#[derive(Debug, Clone, Copy)]
pub struct WaveformDecoder {
    chunk_bytes: usize,
}

impl Default for WaveformDecoder {
    fn default() -> Self {
        Self {
            chunk_bytes: DEFAULT_CHUNK_BYTES,
        }
    }
}

impl WaveformDecoder {
    /// Create a decoder with the default chunk size.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different chunk size. Clamped to `4..=MAX_CHUNK_BYTES` and
    /// rounded down to a multiple of 4.
    pub fn with_chunk_bytes(mut self, chunk_bytes: usize) -> Self {
        let clamped = chunk_bytes.min(MAX_CHUNK_BYTES);
        self.chunk_bytes = (clamped / SAMPLE_SIZE).max(1) * SAMPLE_SIZE;
        self
    }

    /// Chunk size in bytes.
    pub fn chunk_bytes(&self) -> usize {
        self.chunk_bytes
    }

    /// Decode the file at `path`.
    pub fn decode_file<P: AsRef<Path>>(&self, path: P, cancel: &CancelToken) -> DecodedWaveform {
        let path = path.as_ref();
        match File::open(path) {
            Ok(file) => {
                let decoded = self.decode_reader(BufReader::new(file), cancel);
                if let DecodeOutcome::Failed(ref e) = decoded.outcome {
                    warn!("Read error in {} after {} samples: {}", path.display(), decoded.samples.len(), e);
                } else {
                    debug!("Decoded {} samples from {}", decoded.samples.len(), path.display());
                }
                decoded
            }
            Err(e) => {
                warn!("Cannot open capture {}: {}", path.display(), e);
                DecodedWaveform {
                    samples: Vec::new(),
                    outcome: DecodeOutcome::Failed(e),
                }
            }
        }
    }

    /// Decode from any reader.
    pub fn decode_reader<R: Read>(&self, mut reader: R, cancel: &CancelToken) -> DecodedWaveform {
        let mut samples = Vec::new();
        let mut chunk = Vec::with_capacity(self.chunk_bytes);

        loop {
            if cancel.is_cancelled() {
                return DecodedWaveform {
                    samples,
                    outcome: DecodeOutcome::Cancelled,
                };
            }

            chunk.clear();
            let read = (&mut reader)
                .take(self.chunk_bytes as u64)
                .read_to_end(&mut chunk);

            match read {
                Ok(0) => break,
                Ok(_) => {
                    // Only the final chunk can be short; its partial tail is dropped.
                    samples.extend(chunk.chunks_exact(SAMPLE_SIZE).map(LittleEndian::read_u32));
                    if chunk.len() < self.chunk_bytes {
                        break;
                    }
                }
                Err(e) => {
                    return DecodedWaveform {
                        samples,
                        outcome: DecodeOutcome::Failed(e),
                    };
                }
            }
        }

        DecodedWaveform {
            samples,
            outcome: DecodeOutcome::Complete,
        }
    }
}
