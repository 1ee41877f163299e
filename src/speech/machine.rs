use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::command::{SpeechCommand, SpeechInput};
use super::error::RecognizerError;
use super::state::{RecognizerStatus, SpeechState, UtteranceId};
use super::turn::{ConversationTurn, Role};
use super::welcome::WelcomeGate;
use crate::events::{RecognizerEvent, SynthesizerEvent};

/// Delays before restarting the recognizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartTiming {
    /// After the recognizer ended on its own while listening
    pub after_end: Duration,
    /// After a transient engine error
    pub after_error: Duration,
}

impl Default for RestartTiming {
    fn default() -> Self {
        Self {
            after_end: Duration::from_millis(400),
            after_error: Duration::from_millis(1000),
        }
    }
}

/// Turn-taking state machine.
///
/// Sole writer of `SpeechState`. Listening and agent speech are never active
/// together: agent playback stops the recognizer and pauses recording audio,
/// and a final user utterance during playback stops the playback first.
pub struct TurnTaker {
    state: SpeechState,
    recognizer: RecognizerStatus,
    draft: String,
    typing: bool,
    turns: Vec<ConversationTurn>,
    current_utterance: Option<UtteranceId>,
    next_utterance: u64,
    halted: bool,
    welcome: Arc<WelcomeGate>,
    timing: RestartTiming,
}

impl TurnTaker {
    pub fn new(welcome: Arc<WelcomeGate>, timing: RestartTiming) -> Self {
        Self {
            state: SpeechState::Idle,
            recognizer: RecognizerStatus::Stopped,
            draft: String::new(),
            typing: false,
            turns: Vec::new(),
            current_utterance: None,
            next_utterance: 1,
            halted: false,
            welcome,
            timing,
        }
    }

    pub fn state(&self) -> SpeechState {
        self.state
    }

    pub fn recognizer_status(&self) -> RecognizerStatus {
        self.recognizer
    }

    /// Interim transcript shown while the user is still speaking
    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn current_utterance(&self) -> Option<UtteranceId> {
        self.current_utterance
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Consume one input and return the commands to execute, in order
    pub fn handle(&mut self, input: SpeechInput) -> Vec<SpeechCommand> {
        let mut commands = Vec::new();

        if self.halted {
            debug!("Speech halted, ignoring {:?}", input);
            return commands;
        }

        let before = self.state;

        match input {
            SpeechInput::Begin => self.begin(&mut commands),
            SpeechInput::Recognizer(RecognizerEvent::Started) => {
                if self.recognizer != RecognizerStatus::Blocked {
                    self.recognizer = RecognizerStatus::Running;
                }
            }
            SpeechInput::Recognizer(RecognizerEvent::Interim(text)) => {
                self.draft = text;
            }
            SpeechInput::Recognizer(RecognizerEvent::Final(text)) | SpeechInput::UserText(text) => {
                self.user_utterance(&text, &mut commands)
            }
            SpeechInput::Recognizer(RecognizerEvent::Ended) => self.recognizer_ended(&mut commands),
            SpeechInput::Recognizer(RecognizerEvent::Error(err)) => {
                self.recognizer_failed(err, &mut commands)
            }
            SpeechInput::Synthesizer(SynthesizerEvent::Finished(utterance)) => {
                self.playback_done(utterance, &mut commands)
            }
            SpeechInput::Synthesizer(SynthesizerEvent::Failed { utterance, message }) => {
                warn!("Agent speech {} failed: {}", utterance, message);
                self.playback_done(utterance, &mut commands)
            }
            SpeechInput::AgentMessage(text) => {
                self.typing = false;
                self.agent_utterance(&text, &mut commands)
            }
            SpeechInput::Greeting(text) => {
                if self.welcome.try_claim() {
                    info!("Speaking welcome message");
                    self.agent_utterance(&text, &mut commands)
                } else {
                    info!("Welcome message already spoken, ignoring duplicate");
                }
            }
            SpeechInput::TogglePause => self.toggle_pause(&mut commands),
            SpeechInput::Typing(typing) => self.typing = typing,
            SpeechInput::RestartTimer => self.restart_recognizer(&mut commands),
            SpeechInput::Halt => self.halt(&mut commands),
        }

        if before != self.state {
            info!("Speech state: {:?} -> {:?}", before, self.state);
        }

        commands
    }

    fn begin(&mut self, commands: &mut Vec<SpeechCommand>) {
        if self.state != SpeechState::Idle {
            warn!("Listening already started (state {:?})", self.state);
            return;
        }

        self.state = SpeechState::Listening;
        self.start_recognizer(commands);
    }

    fn user_utterance(&mut self, text: &str, commands: &mut Vec<SpeechCommand>) {
        let text = text.trim();
        if text.is_empty() {
            debug!("Empty final transcript treated as silence");
            self.draft.clear();
            return;
        }

        if self.state == SpeechState::Idle {
            warn!("User speech before listening started, dropping: {}", text);
            return;
        }

        if self.state.is_agent_speaking() {
            info!("User barge-in, interrupting agent speech");
            self.state = SpeechState::Interrupting;
            commands.push(SpeechCommand::StopSpeaking);
            self.current_utterance = None;
            commands.push(SpeechCommand::ResumeRecording);
            self.start_recognizer(commands);
            self.state = SpeechState::Listening;
        }

        self.turns.push(ConversationTurn::new(Role::User, text));
        commands.push(SpeechCommand::Send(text.to_string()));
        self.draft.clear();
    }

    fn agent_utterance(&mut self, text: &str, commands: &mut Vec<SpeechCommand>) {
        let text = text.trim();
        if text.is_empty() {
            warn!("Empty agent message, nothing to speak");
            return;
        }

        if self.state.is_agent_speaking() {
            info!("Stopping previous agent speech for new message");
            commands.push(SpeechCommand::StopSpeaking);
        } else {
            self.stop_recognizer(commands);
            commands.push(SpeechCommand::PauseRecording);
        }

        let utterance = UtteranceId(self.next_utterance);
        self.next_utterance += 1;

        self.turns.push(ConversationTurn::new(Role::Agent, text));
        commands.push(SpeechCommand::Speak {
            utterance,
            text: text.to_string(),
        });
        self.current_utterance = Some(utterance);
        self.state = SpeechState::AgentSpeaking;
    }

    fn playback_done(&mut self, utterance: UtteranceId, commands: &mut Vec<SpeechCommand>) {
        if self.current_utterance != Some(utterance) {
            debug!("Ignoring stale completion for {}", utterance);
            return;
        }

        self.current_utterance = None;
        self.state = SpeechState::Listening;
        commands.push(SpeechCommand::ResumeRecording);
        self.start_recognizer(commands);
    }

    fn toggle_pause(&mut self, commands: &mut Vec<SpeechCommand>) {
        match self.state {
            SpeechState::AgentSpeaking => {
                commands.push(SpeechCommand::PauseSpeaking);
                self.state = SpeechState::AgentSpeakingPaused;
            }
            SpeechState::AgentSpeakingPaused => {
                commands.push(SpeechCommand::ResumeSpeaking);
                self.state = SpeechState::AgentSpeaking;
            }
            other => warn!("No agent speech playing (state {:?})", other),
        }
    }

    fn recognizer_ended(&mut self, commands: &mut Vec<SpeechCommand>) {
        if self.recognizer == RecognizerStatus::Blocked {
            return;
        }
        self.recognizer = RecognizerStatus::Stopped;

        // Continuous listening: the engine stops on its own after silence
        if self.state == SpeechState::Listening {
            commands.push(SpeechCommand::ScheduleRestart(self.timing.after_end));
        }
    }

    fn recognizer_failed(&mut self, err: RecognizerError, commands: &mut Vec<SpeechCommand>) {
        if err.is_terminal() {
            warn!("Speech recognition disabled: {}", err);
            self.recognizer = RecognizerStatus::Blocked;
            commands.push(SpeechCommand::ReportError(err.user_message()));
            return;
        }

        if self.recognizer == RecognizerStatus::Blocked {
            return;
        }

        if err == RecognizerError::AlreadyStarted {
            self.recognizer = RecognizerStatus::Running;
            return;
        }

        warn!("Speech recognition error: {}", err);
        self.recognizer = RecognizerStatus::Stopped;

        let delay = if err.is_transient() {
            self.timing.after_error
        } else {
            self.timing.after_end
        };
        commands.push(SpeechCommand::ScheduleRestart(delay));
    }

    fn restart_recognizer(&mut self, commands: &mut Vec<SpeechCommand>) {
        if self.state == SpeechState::Listening && self.recognizer == RecognizerStatus::Stopped {
            info!("Restarting speech recognition");
            self.start_recognizer(commands);
        } else {
            debug!(
                "Skipping recognizer restart (state {:?}, recognizer {:?})",
                self.state, self.recognizer
            );
        }
    }

    fn halt(&mut self, commands: &mut Vec<SpeechCommand>) {
        if self.state.is_agent_speaking() {
            commands.push(SpeechCommand::StopSpeaking);
        }
        self.current_utterance = None;
        self.stop_recognizer(commands);
        self.state = SpeechState::Idle;
        self.halted = true;
    }

    fn start_recognizer(&mut self, commands: &mut Vec<SpeechCommand>) {
        if self.recognizer == RecognizerStatus::Stopped {
            commands.push(SpeechCommand::StartRecognizer);
            self.recognizer = RecognizerStatus::Starting;
        }
    }

    fn stop_recognizer(&mut self, commands: &mut Vec<SpeechCommand>) {
        if matches!(
            self.recognizer,
            RecognizerStatus::Starting | RecognizerStatus::Running
        ) {
            commands.push(SpeechCommand::StopRecognizer);
            self.recognizer = RecognizerStatus::Stopped;
        }
    }
}
