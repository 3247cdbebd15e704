//! # Waveform capture input
//!
//! Reading and summing raw digitizer captures:
//!
//! - [`WaveformDecoder`] decodes one `.data32` file (4-byte little-endian
//!   unsigned samples) with cooperative cancellation between chunks.
//! - [`FolderAggregator`] sums every capture in a folder into one
//!   [`Trace`](crate::trace::Trace), reporting progress per file.
//! - [`FileOrdering`] controls the order files are visited and listed.
//!
//! ## Failure policy
//!
//! A capture that cannot be read is logged and left out of the sum so one bad
//! file does not sink a folder of thousands. Captures that decode fully but
//! disagree in length are an error ([`AggregateError::RaggedCaptures`]).

mod aggregator;
mod cancel;
mod decoder;
mod error;
mod ordering;

pub use aggregator::{AggregateOutcome, FolderAggregator, FolderSum};
pub use cancel::CancelToken;
pub use decoder::{DecodeOutcome, DecodedWaveform, WaveformDecoder, DEFAULT_CHUNK_BYTES, MAX_CHUNK_BYTES, SAMPLE_SIZE};
pub use error::AggregateError;
pub use ordering::{
    list_files_with_extension, natural_cmp, shot_number, FileOrdering, CAPTURE_EXTENSION,
};
