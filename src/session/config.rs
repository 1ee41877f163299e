use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::recording::RecordingConfig;
use crate::speech::{RestartTiming, WelcomeScope};

/// Configuration for a conversation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Greeting spoken when the agent's `connection` frame has none
    pub default_greeting: String,

    /// Delay before restarting recognition after it ended on its own
    pub restart_after_end: Duration,

    /// Delay before restarting recognition after a transient error
    pub restart_after_error: Duration,

    /// Whether the welcome gate resets when the session ends
    pub welcome_scope: WelcomeScope,

    /// Analysis recording formats
    pub recording: RecordingConfig,
}

impl SessionConfig {
    pub fn restart_timing(&self) -> RestartTiming {
        RestartTiming {
            after_end: self.restart_after_end,
            after_error: self.restart_after_error,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        let timing = RestartTiming::default();

        Self {
            default_greeting: "Hello! I'm here to help you improve your communication skills. How can I assist you today?".to_string(),
            restart_after_end: timing.after_end,
            restart_after_error: timing.after_error,
            welcome_scope: WelcomeScope::Process,
            recording: RecordingConfig::default(),
        }
    }
}
