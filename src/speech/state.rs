use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical owner of the audio channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechState {
    #[default]
    Idle,
    Listening,
    AgentSpeaking,
    AgentSpeakingPaused,
    /// Transient while a barge-in is being handled
    Interrupting,
}

impl SpeechState {
    /// Agent playback is in flight (playing or paused)
    pub fn is_agent_speaking(self) -> bool {
        matches!(self, Self::AgentSpeaking | Self::AgentSpeakingPaused)
    }
}

/// Running status of the speech recognizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognizerStatus {
    #[default]
    Stopped,
    /// Start issued, `Started` not yet reported
    Starting,
    Running,
    /// Terminal error, never restarted within the session
    Blocked,
}

/// Identifies one synthesized playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UtteranceId(pub u64);

impl fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "utterance-{}", self.0)
    }
}
