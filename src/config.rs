use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

use crate::recording::RecordingConfig;
use crate::session::SessionConfig;
use crate::speech::WelcomeScope;
use crate::upload::UploadConfig;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub agent: AgentConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub recording: RecordingConfig,
    #[serde(default)]
    pub session: SessionSection,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct AgentConfig {
    /// WebSocket endpoint of the agent
    pub url: String,
    pub default_greeting: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub restart_after_end_ms: u64,
    pub restart_after_error_ms: u64,
    /// Speaking rate of the terminal synthesizer
    pub words_per_minute: u32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            restart_after_end_ms: 400,
            restart_after_error_ms: 1000,
            words_per_minute: 160,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    pub welcome_scope: WelcomeScope,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("VOICE_COACH").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Per-session settings derived from the file
    pub fn session_config(&self) -> SessionConfig {
        let defaults = SessionConfig::default();

        SessionConfig {
            default_greeting: self
                .agent
                .default_greeting
                .clone()
                .unwrap_or(defaults.default_greeting),
            restart_after_end: Duration::from_millis(self.speech.restart_after_end_ms),
            restart_after_error: Duration::from_millis(self.speech.restart_after_error_ms),
            welcome_scope: self.session.welcome_scope,
            recording: self.recording.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_file_and_fills_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[service]
name = "coach-test"

[service.http]
bind = "0.0.0.0"
port = 9000

[agent]
url = "ws://agent.test/ws/chat"
default_greeting = "Hi from config"

[session]
welcome_scope = "session"
"#
        )
        .unwrap();

        let cfg = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.service.http.port, 9000);
        assert_eq!(cfg.speech.restart_after_end_ms, 400);
        assert_eq!(cfg.recording.sample_rate, 16000);

        let session = cfg.session_config();
        assert_eq!(session.default_greeting, "Hi from config");
        assert_eq!(session.welcome_scope, WelcomeScope::Session);
        assert_eq!(session.restart_after_error, Duration::from_millis(1000));
    }
}
