//! Message channel to the remote agent
//!
//! - `messages`: JSON wire frames
//! - `adapter`: single-connection guard and send gating
//! - `websocket`: WebSocket transport

pub mod adapter;
pub mod messages;
pub mod websocket;

pub use adapter::{AgentChannel, ChannelError, ChannelTransport, ConnectionState};
pub use messages::{decode_frame, InboundFrame, OutboundFrame};
pub use websocket::WebSocketTransport;
