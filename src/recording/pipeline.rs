use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::buffer::{ChunkBuffer, WavBuffer};
use super::handle::{RecordingHandle, RecordingStatus};
use super::media::{MediaBlob, MediaChunk, StreamKind, Track};
use crate::session::SessionId;

/// Recording format configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Sample rate of the analysis WAV
    pub sample_rate: u32,

    /// Channel count of the analysis WAV
    pub channels: u16,

    /// MIME type of the chunks produced by the camera recorder
    pub video_mime_type: String,

    /// File extension for the finalized video
    pub video_extension: String,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            video_mime_type: "video/webm".to_string(),
            video_extension: "webm".to_string(),
        }
    }
}

/// Result of stopping both streams; each finalizes independently
#[derive(Debug)]
pub struct FinalizedRecordings {
    pub audio: Result<Option<MediaBlob>>,
    pub video: Result<Option<MediaBlob>>,
}

/// Owns the audio and video analysis streams for one session
pub struct RecordingPipeline {
    config: RecordingConfig,
    audio: Option<RecordingHandle<WavBuffer>>,
    video: Option<RecordingHandle<ChunkBuffer>>,
    audio_paused: bool,
}

impl RecordingPipeline {
    pub fn new(config: RecordingConfig) -> Self {
        Self {
            config,
            audio: None,
            video: None,
            audio_paused: false,
        }
    }

    /// Start both streams, tagged with the session id
    pub fn start(&mut self, session_id: &SessionId) {
        if self.audio.is_some() || self.video.is_some() {
            warn!("Recording already started for session {}", session_id);
            return;
        }

        self.audio = Some(RecordingHandle::start(
            StreamKind::Audio,
            session_id.clone(),
            WavBuffer::new(self.config.sample_rate, self.config.channels),
        ));
        self.video = Some(RecordingHandle::start(
            StreamKind::Video,
            session_id.clone(),
            ChunkBuffer::new(
                self.config.video_mime_type.clone(),
                self.config.video_extension.clone(),
            ),
        ));
    }

    pub fn audio(&self) -> Option<&RecordingHandle<WavBuffer>> {
        self.audio.as_ref()
    }

    pub fn video(&self) -> Option<&RecordingHandle<ChunkBuffer>> {
        self.video.as_ref()
    }

    pub fn status(&self, kind: StreamKind) -> Option<RecordingStatus> {
        match kind {
            StreamKind::Audio => self.audio.as_ref().map(RecordingHandle::status),
            StreamKind::Video => self.video.as_ref().map(RecordingHandle::status),
        }
    }

    /// Whether the audio component is currently paused for agent playback
    pub fn is_audio_paused(&self) -> bool {
        self.audio_paused
    }

    /// Route captured media into its stream
    pub fn append(&mut self, chunk: MediaChunk) {
        match chunk {
            MediaChunk::Audio(frame) => {
                if let Some(audio) = &mut self.audio {
                    audio.append(frame);
                }
            }
            MediaChunk::Video(chunk) => {
                if chunk.track == Track::Audio && self.audio_paused {
                    return;
                }
                if let Some(video) = &mut self.video {
                    video.append(chunk.data);
                }
            }
        }
    }

    /// Keep the agent's voice out of both recordings
    pub fn pause_audio(&mut self) {
        if let Some(audio) = &mut self.audio {
            audio.pause();
        }
        if self.is_video_live() && !self.audio_paused {
            info!("Video recording audio track muted");
        }
        self.audio_paused = true;
    }

    pub fn resume_audio(&mut self) {
        if let Some(audio) = &mut self.audio {
            audio.resume();
        }
        if self.is_video_live() && self.audio_paused {
            info!("Video recording audio track unmuted");
        }
        self.audio_paused = false;
    }

    /// Stop both streams and finalize their buffers
    pub fn stop(&mut self) -> FinalizedRecordings {
        let audio = match &mut self.audio {
            Some(handle) => handle.stop(),
            None => Ok(None),
        };
        let video = match &mut self.video {
            Some(handle) => handle.stop(),
            None => Ok(None),
        };

        FinalizedRecordings { audio, video }
    }

    /// Stop both streams and drop whatever was captured
    pub fn discard(&mut self) {
        let finalized = self.stop();
        let dropped = [finalized.audio, finalized.video]
            .into_iter()
            .filter(|blob| matches!(blob, Ok(Some(_))))
            .count();
        if dropped > 0 {
            info!("Discarded {} unfinished recording(s)", dropped);
        }
    }

    fn is_video_live(&self) -> bool {
        self.video
            .as_ref()
            .is_some_and(|video| video.status() != RecordingStatus::Stopped)
    }
}
