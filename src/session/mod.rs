//! Conversation session lifecycle
//!
//! This module provides the `ConversationSession` that manages:
//! - Session identity shared by every artifact of one conversation
//! - Startup: devices, recording streams, agent channel, listening
//! - The single-threaded event loop driving turn-taking
//! - Teardown: stop speech, finalize recordings, upload, release

mod config;
mod id;
mod report;
mod session;

pub use config::SessionConfig;
pub use id::SessionId;
pub use report::{SessionReport, SessionSnapshot, SessionStatus, SharedSnapshot, UploadOutcome};
pub use session::{Collaborators, ConversationSession, SessionError};
