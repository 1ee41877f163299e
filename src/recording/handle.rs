use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::buffer::StreamBuffer;
use super::media::{MediaBlob, StreamKind};
use crate::session::SessionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingStatus {
    Recording,
    Paused,
    Stopped,
}

/// One recording stream.
///
/// `pause` and `resume` are idempotent, and every method is a no-op once the
/// handle is stopped.
pub struct RecordingHandle<B: StreamBuffer> {
    kind: StreamKind,
    session_id: SessionId,
    status: RecordingStatus,
    buffer: B,
}

impl<B: StreamBuffer> RecordingHandle<B> {
    /// Start recording into `buffer` for the given session
    pub fn start(kind: StreamKind, session_id: SessionId, buffer: B) -> Self {
        info!("Started {} recording for session {}", kind, session_id);

        Self {
            kind,
            session_id,
            status: RecordingStatus::Recording,
            buffer,
        }
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    pub fn status(&self) -> RecordingStatus {
        self.status
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn buffer(&self) -> &B {
        &self.buffer
    }

    /// Returns true if the handle transitioned to paused
    pub fn pause(&mut self) -> bool {
        if self.status != RecordingStatus::Recording {
            debug!("{} recording not active ({:?}), pause ignored", self.kind, self.status);
            return false;
        }

        self.status = RecordingStatus::Paused;
        info!("{} recording paused", self.kind);
        true
    }

    /// Returns true if the handle transitioned back to recording
    pub fn resume(&mut self) -> bool {
        if self.status != RecordingStatus::Paused {
            debug!("{} recording not paused ({:?}), resume ignored", self.kind, self.status);
            return false;
        }

        self.status = RecordingStatus::Recording;
        info!("{} recording resumed", self.kind);
        true
    }

    /// Buffer a chunk. Dropped unless recording.
    pub fn append(&mut self, chunk: B::Chunk) -> bool {
        if self.status != RecordingStatus::Recording {
            return false;
        }

        self.buffer.push(chunk);
        true
    }

    /// Stop and finalize. Returns `None` if already stopped or nothing was captured.
    pub fn stop(&mut self) -> Result<Option<MediaBlob>> {
        if self.status == RecordingStatus::Stopped {
            debug!("{} recording already stopped", self.kind);
            return Ok(None);
        }

        self.status = RecordingStatus::Stopped;
        info!("{} recording stopped", self.kind);

        if self.buffer.is_empty() {
            return Ok(None);
        }

        let bytes = self.buffer.encode()?;

        info!(
            "Finalized {} recording: {} bytes ({})",
            self.kind,
            bytes.len(),
            self.buffer.mime_type()
        );

        Ok(Some(MediaBlob {
            kind: self.kind,
            session_id: self.session_id.clone(),
            mime_type: self.buffer.mime_type().to_string(),
            file_name: format!("{}.{}", self.session_id, self.buffer.extension()),
            bytes,
        }))
    }
}
