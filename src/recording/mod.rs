//! Recording pipeline for the analysis artifacts
//!
//! Two independent streams run for the whole session:
//! - audio-for-analysis: PCM frames finalized into one WAV file
//! - video-for-analysis: encoded container chunks finalized by concatenation
//!
//! Each stream is a `RecordingHandle` that can be paused and resumed any
//! number of times but never records again once stopped.

mod buffer;
mod handle;
mod media;
mod pipeline;

pub use buffer::{ChunkBuffer, StreamBuffer, WavBuffer};
pub use handle::{RecordingHandle, RecordingStatus};
pub use media::{AudioFrame, MediaBlob, MediaChunk, StreamKind, Track, VideoChunk};
pub use pipeline::{FinalizedRecordings, RecordingConfig, RecordingPipeline};
