//! Capability interfaces for the capture collaborators
//!
//! The session only issues commands through these traits and reacts to the
//! events the implementations push onto the session queue:
//! - `CaptureDevices`: camera/microphone acquisition, feeds `MediaChunk`s
//! - `SpeechRecognizer`: emits `RecognizerEvent`s
//! - `SpeechSynthesizer`: emits `SynthesizerEvent`s per utterance
//!
//! `console` and `file` provide terminal and WAV-file backed implementations.

pub mod console;
pub mod file;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use crate::events::EventSender;
use crate::speech::{RecognizerError, UtteranceId};

pub use console::{ConsoleRecognizer, ConsoleSynthesizer};
pub use file::{AudioFile, FileCapture};

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("camera or microphone permission denied")]
    PermissionDenied,

    #[error("capture device unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DeviceError {
    /// Message shown to the user
    pub fn user_message(&self) -> String {
        match self {
            Self::PermissionDenied => "Camera access denied or not available".to_string(),
            Self::Unavailable(_) | Self::Other(_) => {
                "Failed to initialize session components. Please refresh and try again."
                    .to_string()
            }
        }
    }
}

/// Camera and microphone
#[async_trait]
pub trait CaptureDevices: Send {
    /// Acquire the devices and start delivering media to `events`
    async fn acquire(&mut self, events: EventSender) -> Result<(), DeviceError>;

    /// Enable or disable the camera track without releasing it
    fn set_camera_enabled(&mut self, enabled: bool) -> Result<()>;

    /// Stop delivering media and release the devices
    async fn release(&mut self) -> Result<()>;

    /// Device name for logging
    fn name(&self) -> &str;
}

/// Speech-to-text engine
pub trait SpeechRecognizer: Send {
    /// Start recognition; events go to `events`
    fn start(&mut self, events: EventSender) -> Result<(), RecognizerError>;

    /// Stop recognition; `Ended` follows
    fn stop(&mut self) -> Result<()>;
}

/// Text-to-speech engine
pub trait SpeechSynthesizer: Send {
    /// Generate and play `text`; `Finished` or `Failed` follows for `utterance`
    fn speak(&mut self, utterance: UtteranceId, text: &str, events: EventSender) -> Result<()>;

    /// Stop the current playback immediately. No event follows.
    fn stop(&mut self) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    fn resume(&mut self) -> Result<()>;
}
