use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::id::SessionId;
use crate::speech::{ConversationTurn, SpeechState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Starting,
    Active,
    Ending,
    Ended,
}

/// Read-only view of a session, republished after every handled event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,

    pub status: SessionStatus,

    /// When the session started
    pub started_at: DateTime<Utc>,

    pub speech_state: SpeechState,

    /// Interim transcript of the utterance in progress
    pub draft: String,

    /// Agent typing indicator
    pub agent_typing: bool,

    pub connected: bool,

    pub camera_enabled: bool,

    /// Last user-visible error
    pub error: Option<String>,

    pub turns: Vec<ConversationTurn>,
}

pub type SharedSnapshot = Arc<RwLock<SessionSnapshot>>;

/// Result of one upload attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum UploadOutcome {
    Uploaded { analysis_id: Option<String> },
    Failed { reason: String },
    /// Nothing was recorded
    Skipped,
}

/// What teardown did, returned to the caller before it navigates away
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: SessionId,

    pub audio: UploadOutcome,

    pub video: UploadOutcome,

    /// Teardown steps that failed; later steps still ran
    pub errors: Vec<String>,

    pub ended_at: DateTime<Utc>,
}

impl SessionReport {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            audio: UploadOutcome::Skipped,
            video: UploadOutcome::Skipped,
            errors: Vec::new(),
            ended_at: Utc::now(),
        }
    }
}
