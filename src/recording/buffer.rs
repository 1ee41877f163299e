use anyhow::{Context, Result};
use std::io::Cursor;
use tracing::warn;

use super::media::AudioFrame;

/// In-memory accumulation for one recording stream
pub trait StreamBuffer: Send {
    type Chunk;

    fn push(&mut self, chunk: Self::Chunk);

    fn is_empty(&self) -> bool;

    /// Encode everything accumulated so far into one artifact
    fn encode(&mut self) -> Result<Vec<u8>>;

    fn mime_type(&self) -> &str;

    fn extension(&self) -> &str;
}

/// Accumulates PCM frames and encodes them as a single WAV file
pub struct WavBuffer {
    sample_rate: u32,
    channels: u16,
    samples: Vec<i16>,
    skipped_frames: usize,
}

impl WavBuffer {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            samples: Vec::new(),
            skipped_frames: 0,
        }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }
}

impl StreamBuffer for WavBuffer {
    type Chunk = AudioFrame;

    fn push(&mut self, frame: AudioFrame) {
        // A WAV file has one format; frames in another format are dropped
        if frame.sample_rate != self.sample_rate || frame.channels != self.channels {
            self.skipped_frames += 1;
            if self.skipped_frames == 1 {
                warn!(
                    "Dropping audio frame: {}Hz/{}ch does not match recording format {}Hz/{}ch",
                    frame.sample_rate, frame.channels, self.sample_rate, self.channels
                );
            }
            return;
        }

        self.samples.extend_from_slice(&frame.samples);
    }

    fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    fn encode(&mut self) -> Result<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::with_capacity(44 + self.samples.len() * 2));
        {
            let mut writer =
                hound::WavWriter::new(&mut cursor, spec).context("Failed to create WAV writer")?;
            for &sample in &self.samples {
                writer
                    .write_sample(sample)
                    .context("Failed to write sample to WAV")?;
            }
            writer.finalize().context("Failed to finalize WAV data")?;
        }

        Ok(cursor.into_inner())
    }

    fn mime_type(&self) -> &str {
        "audio/wav"
    }

    fn extension(&self) -> &str {
        "wav"
    }
}

/// Accumulates already-encoded container chunks in arrival order
pub struct ChunkBuffer {
    mime_type: String,
    extension: String,
    chunks: Vec<Vec<u8>>,
}

impl ChunkBuffer {
    pub fn new(mime_type: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            extension: extension.into(),
            chunks: Vec::new(),
        }
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

impl StreamBuffer for ChunkBuffer {
    type Chunk = Vec<u8>;

    fn push(&mut self, chunk: Vec<u8>) {
        if !chunk.is_empty() {
            self.chunks.push(chunk);
        }
    }

    fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    fn encode(&mut self) -> Result<Vec<u8>> {
        Ok(self.chunks.concat())
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn extension(&self) -> &str {
        &self.extension
    }
}
