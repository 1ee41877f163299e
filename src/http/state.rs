use crate::events::EventSender;
use crate::session::SharedSnapshot;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Queue of the running session
    pub control: EventSender,

    /// Latest published session state
    pub snapshot: SharedSnapshot,
}

impl AppState {
    pub fn new(control: EventSender, snapshot: SharedSnapshot) -> Self {
        Self { control, snapshot }
    }
}
