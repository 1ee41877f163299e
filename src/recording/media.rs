use serde::{Deserialize, Serialize};
use std::fmt;

use crate::session::SessionId;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Track a video-stream chunk belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Track {
    Video,
    Audio,
}

/// Encoded chunk produced by the camera recorder
#[derive(Debug, Clone, PartialEq)]
pub struct VideoChunk {
    pub track: Track,
    pub data: Vec<u8>,
}

/// Captured media delivered on the session queue
#[derive(Debug, Clone, PartialEq)]
pub enum MediaChunk {
    Audio(AudioFrame),
    Video(VideoChunk),
}

/// The two analysis streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Audio,
    Video,
}

impl StreamKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finalized recording, tagged with its session
#[derive(Debug, Clone, PartialEq)]
pub struct MediaBlob {
    pub kind: StreamKind,
    pub session_id: SessionId,
    pub mime_type: String,
    /// `<session-id>.<ext>`
    pub file_name: String,
    pub bytes: Vec<u8>,
}
