// Test doubles for the session collaborators.
//
// Every fake writes into one shared, ordered command log so tests can assert
// on the order in which the session drove its collaborators.

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use voice_coach::channel::OutboundFrame;
use voice_coach::devices::{CaptureDevices, DeviceError, SpeechRecognizer, SpeechSynthesizer};
use voice_coach::events::{EventSender, RecognizerEvent};
use voice_coach::recording::StreamKind;
use voice_coach::speech::{RecognizerError, UtteranceId};
use voice_coach::upload::{UploadError, UploadReceipt, Uploader};
use voice_coach::{
    ChannelTransport, Collaborators, ConversationSession, MediaBlob, SessionConfig, WelcomeGate,
};

#[derive(Clone, Default)]
pub struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries().iter().filter(|e| *e == entry).count()
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.entries().iter().filter(|e| e.starts_with(prefix)).count()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

pub struct FakeCapture {
    pub log: Log,
    pub deny: bool,
}

#[async_trait]
impl CaptureDevices for FakeCapture {
    async fn acquire(&mut self, _events: EventSender) -> Result<(), DeviceError> {
        if self.deny {
            self.log.push("devices.denied");
            return Err(DeviceError::PermissionDenied);
        }
        self.log.push("devices.acquire");
        Ok(())
    }

    fn set_camera_enabled(&mut self, enabled: bool) -> Result<()> {
        self.log.push(format!("camera.{}", enabled));
        Ok(())
    }

    async fn release(&mut self) -> Result<()> {
        self.log.push("devices.release");
        Ok(())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Reports `Started` as soon as it is started, like a responsive engine
pub struct FakeRecognizer {
    pub log: Log,
}

impl SpeechRecognizer for FakeRecognizer {
    fn start(&mut self, events: EventSender) -> Result<(), RecognizerError> {
        self.log.push("stt.start");
        events.recognizer(RecognizerEvent::Started);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.log.push("stt.stop");
        Ok(())
    }
}

pub struct FakeSynthesizer {
    pub log: Log,
    pub fail: bool,
}

impl SpeechSynthesizer for FakeSynthesizer {
    fn speak(&mut self, utterance: UtteranceId, text: &str, _events: EventSender) -> Result<()> {
        if self.fail {
            self.log.push(format!("tts.fail:{}", text));
            return Err(anyhow!("voice unavailable"));
        }
        self.log.push(format!("tts.speak:{}:{}", utterance.0, text));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.log.push("tts.stop");
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.log.push("tts.pause");
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        self.log.push("tts.resume");
        Ok(())
    }
}

pub struct FakeTransport {
    pub log: Log,
    pub fail_connect: bool,
}

#[async_trait]
impl ChannelTransport for FakeTransport {
    async fn connect(&mut self, token: &str, _events: EventSender) -> Result<()> {
        if self.fail_connect {
            self.log.push("channel.refused");
            return Err(anyhow!("connection refused"));
        }
        self.log.push(format!("channel.open:{}", token));
        Ok(())
    }

    fn send(&mut self, frame: String) -> Result<()> {
        self.log.push(format!("channel.send:{}", frame));
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.log.push("channel.close");
        Ok(())
    }
}

pub struct FakeUploader {
    pub log: Log,
    pub fail: Vec<StreamKind>,
    pub uploaded: Arc<Mutex<Vec<MediaBlob>>>,
}

#[async_trait]
impl Uploader for FakeUploader {
    async fn upload(&self, blob: &MediaBlob) -> Result<UploadReceipt, UploadError> {
        self.log
            .push(format!("upload.{}:{}", blob.kind, blob.session_id));
        self.uploaded.lock().unwrap().push(blob.clone());

        if self.fail.contains(&blob.kind) {
            return Err(UploadError::Rejected {
                status: 500,
                body: "storage offline".to_string(),
            });
        }

        Ok(UploadReceipt {
            analysis_id: Some(format!("analysis-{}", blob.kind)),
        })
    }
}

/// Knobs for building a session over fakes
#[derive(Default)]
pub struct Harness {
    pub deny_devices: bool,
    pub fail_connect: bool,
    pub fail_speech: bool,
    pub fail_uploads: Vec<StreamKind>,
    pub welcome: Option<Arc<WelcomeGate>>,
    pub config: Option<SessionConfig>,
}

pub struct Built {
    pub session: ConversationSession,
    pub log: Log,
    pub uploaded: Arc<Mutex<Vec<MediaBlob>>>,
}

impl Harness {
    pub fn build(self) -> Built {
        let log = Log::default();
        let uploaded = Arc::new(Mutex::new(Vec::new()));

        let collaborators = Collaborators {
            capture: Box::new(FakeCapture {
                log: log.clone(),
                deny: self.deny_devices,
            }),
            recognizer: Box::new(FakeRecognizer { log: log.clone() }),
            synthesizer: Box::new(FakeSynthesizer {
                log: log.clone(),
                fail: self.fail_speech,
            }),
            transport: Box::new(FakeTransport {
                log: log.clone(),
                fail_connect: self.fail_connect,
            }),
            uploader: Arc::new(FakeUploader {
                log: log.clone(),
                fail: self.fail_uploads,
                uploaded: Arc::clone(&uploaded),
            }),
        };

        let session = ConversationSession::new(
            self.config.unwrap_or_default(),
            collaborators,
            self.welcome.unwrap_or_default(),
        );

        Built {
            session,
            log,
            uploaded,
        }
    }
}

/// Outbound frame as the fake transport logs it
pub fn sent(text: &str) -> String {
    let frame = serde_json::to_string(&OutboundFrame::message(text)).unwrap();
    format!("channel.send:{}", frame)
}
