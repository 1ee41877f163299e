//! Session event queue
//!
//! Device callbacks, channel frames, timers and user controls are all
//! delivered as a `SessionEvent` on one unbounded queue. The session loop is
//! the only consumer, so no two handlers ever run at the same time.

use tokio::sync::mpsc;
use tracing::debug;

use crate::recording::MediaChunk;
use crate::speech::{RecognizerError, UtteranceId};

/// Events emitted by the speech recognizer
#[derive(Debug, Clone, PartialEq)]
pub enum RecognizerEvent {
    /// Recognition is running
    Started,
    /// Partial transcript, display only
    Interim(String),
    /// Completed utterance
    Final(String),
    /// Recognition stopped (on request or on its own)
    Ended,
    /// Engine error
    Error(RecognizerError),
}

/// Events emitted by the speech synthesizer
#[derive(Debug, Clone, PartialEq)]
pub enum SynthesizerEvent {
    /// Playback of the utterance completed
    Finished(UtteranceId),
    /// Generation or playback of the utterance failed
    Failed { utterance: UtteranceId, message: String },
}

/// Events emitted by the agent channel
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Connected,
    Disconnected,
    /// `connection` frame, with the greeting text if the agent sent one
    Greeting(Option<String>),
    /// Agent turn
    Inbound(String),
    TypingStart,
    TypingStop,
    Error(String),
}

/// User controls coming from the UI collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    /// Pause or resume agent speech
    ToggleSpeechPause,
    /// Disable or re-enable the camera track
    ToggleCamera,
    /// Typed message, handled like a final transcript
    SubmitText(String),
    /// Explicit end-session action
    End,
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    Recognizer(RecognizerEvent),
    Synthesizer(SynthesizerEvent),
    Channel(ChannelEvent),
    Media(MediaChunk),
    Control(ControlEvent),
    /// Delayed recognizer restart timer fired
    RestartRecognizer,
}

/// Cloneable handle for pushing events onto the session queue
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

pub type EventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

/// Create the session queue
pub fn event_queue() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, rx)
}

impl EventSender {
    /// Push an event. Returns false once the session has gone away.
    pub fn send(&self, event: SessionEvent) -> bool {
        match self.tx.send(event) {
            Ok(()) => true,
            Err(e) => {
                debug!("Session queue closed, dropping {:?}", e.0);
                false
            }
        }
    }

    pub fn recognizer(&self, event: RecognizerEvent) -> bool {
        self.send(SessionEvent::Recognizer(event))
    }

    pub fn synthesizer(&self, event: SynthesizerEvent) -> bool {
        self.send(SessionEvent::Synthesizer(event))
    }

    pub fn channel(&self, event: ChannelEvent) -> bool {
        self.send(SessionEvent::Channel(event))
    }

    pub fn control(&self, event: ControlEvent) -> bool {
        self.send(SessionEvent::Control(event))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
