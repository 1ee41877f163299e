use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

/// How long the welcome gate stays closed once it has fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WelcomeScope {
    /// Once per process, across sessions
    #[default]
    Process,
    /// Reset during session teardown
    Session,
}

/// Single-fire gate for speaking the agent's greeting.
///
/// Created once by the process and shared with every session, so a greeting
/// delivered twice (reconnect, duplicate frame) is only spoken the first time.
#[derive(Debug, Default)]
pub struct WelcomeGate {
    fired: AtomicBool,
}

impl WelcomeGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true exactly once until `reset` is called
    pub fn try_claim(&self) -> bool {
        !self.fired.swap(true, Ordering::SeqCst)
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.fired.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_until_reset() {
        let gate = WelcomeGate::new();
        assert!(gate.try_claim());
        assert!(!gate.try_claim());
        assert!(gate.has_fired());

        gate.reset();
        assert!(!gate.has_fired());
        assert!(gate.try_claim());
    }
}
