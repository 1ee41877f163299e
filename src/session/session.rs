use super::config::SessionConfig;
use super::id::SessionId;
use super::report::{SessionReport, SessionSnapshot, SessionStatus, SharedSnapshot, UploadOutcome};
use crate::channel::{AgentChannel, ChannelError, ChannelTransport, ConnectionState};
use crate::devices::{CaptureDevices, DeviceError, SpeechRecognizer, SpeechSynthesizer};
use crate::events::{
    event_queue, ChannelEvent, ControlEvent, EventReceiver, EventSender, RecognizerEvent,
    SessionEvent, SynthesizerEvent,
};
use crate::recording::{MediaBlob, RecordingPipeline, StreamKind};
use crate::speech::{
    ConversationTurn, SpeechCommand, SpeechInput, SpeechState, TurnTaker, WelcomeGate,
    WelcomeScope,
};
use crate::upload::Uploader;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to acquire capture devices: {0}")]
    Devices(#[from] DeviceError),

    #[error("failed to open agent channel: {0}")]
    Channel(#[from] ChannelError),

    #[error("session cannot start from {0:?}")]
    InvalidState(SessionStatus),
}

/// Everything a session talks to
pub struct Collaborators {
    pub capture: Box<dyn CaptureDevices>,
    pub recognizer: Box<dyn SpeechRecognizer>,
    pub synthesizer: Box<dyn SpeechSynthesizer>,
    pub transport: Box<dyn ChannelTransport>,
    pub uploader: Arc<dyn Uploader>,
}

/// A spoken conversation with the agent, recorded for later analysis.
///
/// All state is owned here and mutated only from the session task: device,
/// channel and timer callbacks arrive as `SessionEvent`s on one queue.
pub struct ConversationSession {
    /// Session configuration
    config: SessionConfig,

    id: SessionId,

    /// When the session started
    started_at: chrono::DateTime<chrono::Utc>,

    status: SessionStatus,

    speech: TurnTaker,

    recording: RecordingPipeline,

    channel: AgentChannel,

    capture: Box<dyn CaptureDevices>,

    recognizer: Box<dyn SpeechRecognizer>,

    synthesizer: Box<dyn SpeechSynthesizer>,

    uploader: Arc<dyn Uploader>,

    /// Shared with other sessions of this process
    welcome: Arc<WelcomeGate>,

    events: EventSender,

    queue: EventReceiver,

    camera_enabled: bool,

    /// Last user-visible error
    error: Option<String>,

    snapshot: SharedSnapshot,

    report: Option<SessionReport>,
}

impl ConversationSession {
    /// Create a new session with a fresh id
    pub fn new(
        config: SessionConfig,
        collaborators: Collaborators,
        welcome: Arc<WelcomeGate>,
    ) -> Self {
        let id = SessionId::generate();
        info!("Creating conversation session: {}", id);

        let (events, queue) = event_queue();
        let started_at = Utc::now();
        let speech = TurnTaker::new(Arc::clone(&welcome), config.restart_timing());
        let recording = RecordingPipeline::new(config.recording.clone());

        let snapshot = Arc::new(RwLock::new(SessionSnapshot {
            session_id: id.clone(),
            status: SessionStatus::Starting,
            started_at,
            speech_state: SpeechState::Idle,
            draft: String::new(),
            agent_typing: false,
            connected: false,
            camera_enabled: true,
            error: None,
            turns: Vec::new(),
        }));

        Self {
            config,
            id,
            started_at,
            status: SessionStatus::Starting,
            speech,
            recording,
            channel: AgentChannel::new(collaborators.transport),
            capture: collaborators.capture,
            recognizer: collaborators.recognizer,
            synthesizer: collaborators.synthesizer,
            uploader: collaborators.uploader,
            welcome,
            events,
            queue,
            camera_enabled: true,
            error: None,
            snapshot,
            report: None,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn speech_state(&self) -> SpeechState {
        self.speech.state()
    }

    pub fn speech(&self) -> &TurnTaker {
        &self.speech
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        self.speech.turns()
    }

    pub fn recording(&self) -> &RecordingPipeline {
        &self.recording
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.channel.state()
    }

    /// Last user-visible error
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Handle for pushing events (controls, device callbacks) onto the queue
    pub fn events(&self) -> EventSender {
        self.events.clone()
    }

    pub fn snapshot(&self) -> SharedSnapshot {
        Arc::clone(&self.snapshot)
    }

    /// Acquire devices, start recording, open the agent channel and begin
    /// listening. On failure the session is cleaned up and left `Ended`.
    pub async fn start(&mut self, token: Option<&str>) -> Result<(), SessionError> {
        if self.status != SessionStatus::Starting {
            return Err(SessionError::InvalidState(self.status));
        }

        info!("Starting conversation session: {}", self.id);

        if let Err(e) = self.capture.acquire(self.events.clone()).await {
            error!("Failed to acquire capture devices: {}", e);
            self.report_error(e.user_message());
            self.status = SessionStatus::Ended;
            self.publish().await;
            return Err(SessionError::Devices(e));
        }
        info!("Capture devices ready: {}", self.capture.name());

        self.recording.start(&self.id);

        if let Err(e) = self.channel.open(token, self.events.clone()).await {
            error!("Failed to open agent channel: {}", e);
            self.report_error(match &e {
                ChannelError::MissingCredential => "Authentication required".to_string(),
                other => format!("Connection error: {}", other),
            });
            self.recording.discard();
            if let Err(e) = self.capture.release().await {
                error!("Failed to release capture devices: {:#}", e);
            }
            self.status = SessionStatus::Ended;
            self.publish().await;
            return Err(SessionError::Channel(e));
        }

        let commands = self.speech.handle(SpeechInput::Begin);
        self.execute(commands);

        self.status = SessionStatus::Active;
        self.publish().await;

        info!("Conversation session started: {}", self.id);
        Ok(())
    }

    /// Process events until the user ends the session, then tear down
    pub async fn run(&mut self) -> SessionReport {
        while self.status == SessionStatus::Active {
            let Some(event) = self.queue.recv().await else {
                warn!("Session queue closed");
                break;
            };

            if self.handle_event(event).await {
                break;
            }
        }

        self.end().await
    }

    /// Handle every event already queued. Returns true if an end was requested.
    pub async fn process_pending(&mut self) -> bool {
        while let Ok(event) = self.queue.try_recv() {
            if self.handle_event(event).await {
                return true;
            }
        }
        false
    }

    /// Handle one event. Returns true if the user asked to end the session.
    pub async fn handle_event(&mut self, event: SessionEvent) -> bool {
        if self.status != SessionStatus::Active {
            debug!("Session {:?}, ignoring event", self.status);
            return false;
        }

        let end_requested = self.dispatch(event);
        self.publish().await;
        end_requested
    }

    fn dispatch(&mut self, event: SessionEvent) -> bool {
        let input = match event {
            SessionEvent::Recognizer(event) => SpeechInput::Recognizer(event),
            SessionEvent::Synthesizer(event) => SpeechInput::Synthesizer(event),
            SessionEvent::Channel(event) => {
                self.channel.observe(&event);
                match event {
                    ChannelEvent::Connected => {
                        info!("Agent connected");
                        return false;
                    }
                    ChannelEvent::Disconnected => {
                        self.report_error(
                            "Connection to the agent was lost. Start a new session to continue.",
                        );
                        return false;
                    }
                    ChannelEvent::Error(message) => {
                        self.report_error(format!("Connection error: {}", message));
                        return false;
                    }
                    ChannelEvent::Greeting(message) => SpeechInput::Greeting(
                        message.unwrap_or_else(|| self.config.default_greeting.clone()),
                    ),
                    ChannelEvent::Inbound(text) => SpeechInput::AgentMessage(text),
                    ChannelEvent::TypingStart => SpeechInput::Typing(true),
                    ChannelEvent::TypingStop => SpeechInput::Typing(false),
                }
            }
            SessionEvent::Media(chunk) => {
                self.recording.append(chunk);
                return false;
            }
            SessionEvent::Control(ControlEvent::End) => {
                info!("End of session requested");
                return true;
            }
            SessionEvent::Control(ControlEvent::ToggleCamera) => {
                self.toggle_camera();
                return false;
            }
            SessionEvent::Control(ControlEvent::ToggleSpeechPause) => SpeechInput::TogglePause,
            SessionEvent::Control(ControlEvent::SubmitText(text)) => SpeechInput::UserText(text),
            SessionEvent::RestartRecognizer => SpeechInput::RestartTimer,
        };

        let commands = self.speech.handle(input);
        self.execute(commands);
        false
    }

    /// Run commands in order. A command that fails synchronously is fed
    /// back to the state machine, and its follow-ups run next.
    fn execute(&mut self, commands: Vec<SpeechCommand>) {
        let mut pending: VecDeque<SpeechCommand> = commands.into();

        while let Some(command) = pending.pop_front() {
            let Some(feedback) = self.apply(command) else {
                continue;
            };

            let follow_ups = self.speech.handle(feedback);
            for command in follow_ups.into_iter().rev() {
                pending.push_front(command);
            }
        }
    }

    fn apply(&mut self, command: SpeechCommand) -> Option<SpeechInput> {
        debug!("Executing {:?}", command);

        match command {
            SpeechCommand::StartRecognizer => {
                if let Err(e) = self.recognizer.start(self.events.clone()) {
                    warn!("Could not start speech recognition: {}", e);
                    return Some(SpeechInput::Recognizer(RecognizerEvent::Error(e)));
                }
            }
            SpeechCommand::StopRecognizer => {
                if let Err(e) = self.recognizer.stop() {
                    warn!("Could not stop speech recognition: {:#}", e);
                }
            }
            SpeechCommand::Speak { utterance, text } => {
                if let Err(e) = self.synthesizer.speak(utterance, &text, self.events.clone()) {
                    return Some(SpeechInput::Synthesizer(SynthesizerEvent::Failed {
                        utterance,
                        message: format!("{:#}", e),
                    }));
                }
            }
            SpeechCommand::StopSpeaking => {
                if let Err(e) = self.synthesizer.stop() {
                    warn!("Could not stop agent speech: {:#}", e);
                }
            }
            SpeechCommand::PauseSpeaking => {
                if let Err(e) = self.synthesizer.pause() {
                    warn!("Could not pause agent speech: {:#}", e);
                }
            }
            SpeechCommand::ResumeSpeaking => {
                if let Err(e) = self.synthesizer.resume() {
                    warn!("Could not resume agent speech: {:#}", e);
                }
            }
            SpeechCommand::PauseRecording => self.recording.pause_audio(),
            SpeechCommand::ResumeRecording => self.recording.resume_audio(),
            SpeechCommand::Send(text) => {
                if let Err(e) = self.channel.send_text(&text) {
                    warn!("Message not sent: {}", e);
                    self.report_error(match e {
                        ChannelError::ConnectionLost | ChannelError::Transport(_) => {
                            "Connection to the agent was lost. Start a new session to continue."
                                .to_string()
                        }
                        other => format!("Message not sent: {}", other),
                    });
                }
            }
            SpeechCommand::ScheduleRestart(delay) => {
                let events = self.events.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    events.send(SessionEvent::RestartRecognizer);
                });
            }
            SpeechCommand::ReportError(message) => self.report_error(message),
        }

        None
    }

    fn toggle_camera(&mut self) {
        let enabled = !self.camera_enabled;
        match self.capture.set_camera_enabled(enabled) {
            Ok(()) => self.camera_enabled = enabled,
            Err(e) => warn!("Could not toggle camera: {:#}", e),
        }
    }

    /// End the session: stop speech, finalize and upload both recordings,
    /// close the channel and release devices. Every step runs even if an
    /// earlier one failed. Calling again returns the same report.
    pub async fn end(&mut self) -> SessionReport {
        if let Some(report) = &self.report {
            return report.clone();
        }

        let mut report = SessionReport::new(self.id.clone());

        if self.status == SessionStatus::Ended {
            // Start failed; cleanup already ran
            self.report = Some(report.clone());
            return report;
        }

        info!("Ending conversation session: {}", self.id);
        self.status = SessionStatus::Ending;
        self.publish().await;

        let commands = self.speech.handle(SpeechInput::Halt);
        self.execute(commands);

        let finalized = self.recording.stop();
        report.audio = self
            .upload(StreamKind::Audio, finalized.audio, &mut report.errors)
            .await;
        report.video = self
            .upload(StreamKind::Video, finalized.video, &mut report.errors)
            .await;

        if let Err(e) = self.channel.close().await {
            error!("Failed to close agent channel: {:#}", e);
            report.errors.push(format!("close channel: {:#}", e));
        }

        if let Err(e) = self.capture.release().await {
            error!("Failed to release capture devices: {:#}", e);
            report.errors.push(format!("release devices: {:#}", e));
        }

        if self.config.welcome_scope == WelcomeScope::Session {
            self.welcome.reset();
        }

        self.status = SessionStatus::Ended;
        report.ended_at = Utc::now();
        self.publish().await;

        let duration = Utc::now().signed_duration_since(self.started_at);
        info!(
            "Conversation session ended: {} ({:.1}s, {} turns)",
            self.id,
            duration.num_milliseconds() as f64 / 1000.0,
            self.speech.turns().len()
        );

        self.report = Some(report.clone());
        report
    }

    async fn upload(
        &mut self,
        kind: StreamKind,
        finalized: anyhow::Result<Option<MediaBlob>>,
        errors: &mut Vec<String>,
    ) -> UploadOutcome {
        let blob = match finalized {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                info!("No {} recorded, skipping upload", kind);
                return UploadOutcome::Skipped;
            }
            Err(e) => {
                error!("Failed to finalize {} recording: {:#}", kind, e);
                errors.push(format!("finalize {}: {:#}", kind, e));
                return UploadOutcome::Failed {
                    reason: format!("{:#}", e),
                };
            }
        };

        match self.uploader.upload(&blob).await {
            Ok(receipt) => UploadOutcome::Uploaded {
                analysis_id: receipt.analysis_id,
            },
            Err(e) => {
                error!("Failed to upload {} recording: {}", kind, e);
                errors.push(format!("upload {}: {}", kind, e));
                self.report_error(format!("Upload of {} recording failed", kind));
                UploadOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn report_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.error = Some(message);
    }

    async fn publish(&self) {
        let mut snapshot = self.snapshot.write().await;
        snapshot.status = self.status;
        snapshot.speech_state = self.speech.state();
        snapshot.draft = self.speech.draft().to_string();
        snapshot.agent_typing = self.speech.is_typing();
        snapshot.connected = self.channel.is_connected();
        snapshot.camera_enabled = self.camera_enabled;
        snapshot.error = self.error.clone();
        if snapshot.turns.len() != self.speech.turns().len() {
            snapshot.turns = self.speech.turns().to_vec();
        }
    }
}
