use thiserror::Error;

/// Speech recognition engine errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognizerError {
    #[error("speech recognition permission denied")]
    PermissionDenied,

    #[error("speech recognition network error")]
    Network,

    #[error("speech recognition aborted")]
    Aborted,

    #[error("audio capture failed")]
    AudioCapture,

    #[error("no speech detected")]
    NoSpeech,

    #[error("speech recognition already started")]
    AlreadyStarted,

    #[error("speech recognition error: {0}")]
    Other(String),
}

impl RecognizerError {
    /// Map an engine error code (`not-allowed`, `network`, ...) to an error
    pub fn from_code(code: &str) -> Self {
        match code {
            "not-allowed" | "permission-denied" | "service-not-allowed" => Self::PermissionDenied,
            "network" => Self::Network,
            "aborted" => Self::Aborted,
            "audio-capture" => Self::AudioCapture,
            "no-speech" => Self::NoSpeech,
            other => Self::Other(other.to_string()),
        }
    }

    /// Recognition cannot continue this session
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::PermissionDenied | Self::Network)
    }

    /// Recovered by one delayed restart
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Aborted | Self::AudioCapture)
    }

    /// Message shown to the user for terminal errors
    pub fn user_message(&self) -> String {
        match self {
            Self::PermissionDenied => {
                "Microphone permission denied. Please enable microphone access to use voice features."
                    .to_string()
            }
            Self::Network => {
                "Network error with speech recognition. Please check your connection.".to_string()
            }
            other => other.to_string(),
        }
    }
}
