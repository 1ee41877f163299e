pub mod channel;
pub mod config;
pub mod devices;
pub mod events;
pub mod http;
pub mod recording;
pub mod session;
pub mod speech;
pub mod upload;

pub use channel::{AgentChannel, ChannelError, ChannelTransport, WebSocketTransport};
pub use config::Config;
pub use devices::{CaptureDevices, DeviceError, SpeechRecognizer, SpeechSynthesizer};
pub use events::{event_queue, ChannelEvent, ControlEvent, EventSender, SessionEvent};
pub use http::{create_router, AppState};
pub use recording::{AudioFrame, MediaBlob, RecordingHandle, RecordingPipeline, RecordingStatus};
pub use session::{
    Collaborators, ConversationSession, SessionConfig, SessionId, SessionReport, SessionStatus,
};
pub use speech::{ConversationTurn, Role, SpeechState, TurnTaker, WelcomeGate};
pub use upload::{HttpUploader, UploadError, UploadReceipt, Uploader};
