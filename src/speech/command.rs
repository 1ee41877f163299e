use std::time::Duration;

use super::state::UtteranceId;
use crate::events::{RecognizerEvent, SynthesizerEvent};

/// Input symbols consumed by the turn-taking state machine
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechInput {
    /// Capture devices are ready, start listening
    Begin,
    Recognizer(RecognizerEvent),
    Synthesizer(SynthesizerEvent),
    /// Agent turn from the channel
    AgentMessage(String),
    /// Greeting from the channel, spoken only if the welcome gate fires
    Greeting(String),
    /// Typed user message
    UserText(String),
    /// Explicit pause/resume of agent speech
    TogglePause,
    /// Agent typing indicator
    Typing(bool),
    /// Recognizer restart timer fired
    RestartTimer,
    /// Session teardown started
    Halt,
}

/// Commands the session executes, in order, after each input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechCommand {
    StartRecognizer,
    StopRecognizer,
    Speak { utterance: UtteranceId, text: String },
    StopSpeaking,
    PauseSpeaking,
    ResumeSpeaking,
    /// Pause the audio component of both recordings
    PauseRecording,
    ResumeRecording,
    /// Send a user turn to the agent
    Send(String),
    /// Deliver `RestartTimer` after the delay
    ScheduleRestart(Duration),
    /// User-visible error
    ReportError(String),
}
