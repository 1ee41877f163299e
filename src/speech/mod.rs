//! Turn-taking between speech recognition, speech synthesis and the agent
//!
//! `TurnTaker` consumes every device and channel event as a `SpeechInput`
//! and answers with the ordered `SpeechCommand`s the session must execute.
//! It never touches a device itself, so the whole transition table can be
//! exercised without audio hardware.

mod command;
mod error;
mod machine;
mod state;
mod turn;
mod welcome;

pub use command::{SpeechCommand, SpeechInput};
pub use error::RecognizerError;
pub use machine::{RestartTiming, TurnTaker};
pub use state::{RecognizerStatus, SpeechState, UtteranceId};
pub use turn::{ConversationTurn, Role};
pub use welcome::{WelcomeGate, WelcomeScope};
