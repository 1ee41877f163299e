use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{SpeechRecognizer, SpeechSynthesizer};
use crate::events::{ControlEvent, EventSender, RecognizerEvent, SynthesizerEvent};
use crate::speech::{RecognizerError, UtteranceId};

/// Recognizer driven by lines typed on stdin.
///
/// - `~text` is an interim transcript
/// - `/pause`, `/camera`, `/end` are user controls
/// - any other line is a final transcript while listening, or a typed
///   message while the agent is speaking
pub struct ConsoleRecognizer {
    listening: Arc<AtomicBool>,
    events: Option<EventSender>,
    reader: Option<JoinHandle<()>>,
}

impl ConsoleRecognizer {
    pub fn new() -> Self {
        Self {
            listening: Arc::new(AtomicBool::new(false)),
            events: None,
            reader: None,
        }
    }

    fn spawn_reader(&self, events: EventSender) -> JoinHandle<()> {
        let listening = Arc::clone(&self.listening);

        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();

            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        events.control(ControlEvent::End);
                        break;
                    }
                    Err(e) => {
                        warn!("Failed to read stdin: {}", e);
                        events.recognizer(RecognizerEvent::Error(RecognizerError::AudioCapture));
                        break;
                    }
                };

                let line = line.trim();
                let delivered = match line {
                    "" => true,
                    "/end" => events.control(ControlEvent::End),
                    "/pause" => events.control(ControlEvent::ToggleSpeechPause),
                    "/camera" => events.control(ControlEvent::ToggleCamera),
                    _ if line.starts_with('~') => {
                        events.recognizer(RecognizerEvent::Interim(line[1..].to_string()))
                    }
                    _ if listening.load(Ordering::SeqCst) => {
                        events.recognizer(RecognizerEvent::Final(line.to_string()))
                    }
                    _ => events.control(ControlEvent::SubmitText(line.to_string())),
                };

                if !delivered {
                    break;
                }
            }
        })
    }
}

impl Default for ConsoleRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechRecognizer for ConsoleRecognizer {
    fn start(&mut self, events: EventSender) -> Result<(), RecognizerError> {
        if self.listening.swap(true, Ordering::SeqCst) {
            return Err(RecognizerError::AlreadyStarted);
        }

        if self.reader.is_none() {
            self.reader = Some(self.spawn_reader(events.clone()));
        }

        events.recognizer(RecognizerEvent::Started);
        self.events = Some(events);
        info!("Listening (type to speak, ~ for interim, /end to finish)");
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if self.listening.swap(false, Ordering::SeqCst) {
            if let Some(events) = &self.events {
                events.recognizer(RecognizerEvent::Ended);
            }
            debug!("Listening stopped");
        }
        Ok(())
    }
}

impl Drop for ConsoleRecognizer {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

struct Playback {
    utterance: UtteranceId,
    remaining: Duration,
    resumed_at: Instant,
    timer: Option<JoinHandle<()>>,
    events: EventSender,
}

/// Synthesizer that prints agent speech and "plays" it for as long as it
/// would take to say at the configured speaking rate.
pub struct ConsoleSynthesizer {
    words_per_minute: u32,
    playback: Option<Playback>,
}

impl ConsoleSynthesizer {
    pub fn new(words_per_minute: u32) -> Self {
        Self {
            words_per_minute: words_per_minute.max(1),
            playback: None,
        }
    }

    fn speaking_time(&self, text: &str) -> Duration {
        let words = text.split_whitespace().count().max(1) as u64;
        Duration::from_millis(words * 60_000 / self.words_per_minute as u64)
    }

    fn spawn_timer(utterance: UtteranceId, after: Duration, events: EventSender) -> JoinHandle<()> {
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            events.synthesizer(SynthesizerEvent::Finished(utterance));
        })
    }
}

impl SpeechSynthesizer for ConsoleSynthesizer {
    fn speak(&mut self, utterance: UtteranceId, text: &str, events: EventSender) -> Result<()> {
        self.stop()?;

        println!("agent> {}", text);

        let remaining = self.speaking_time(text);
        let timer = Self::spawn_timer(utterance, remaining, events.clone());
        self.playback = Some(Playback {
            utterance,
            remaining,
            resumed_at: Instant::now(),
            timer: Some(timer),
            events,
        });
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(mut playback) = self.playback.take() {
            if let Some(timer) = playback.timer.take() {
                timer.abort();
            }
            debug!("Stopped {}", playback.utterance);
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        if let Some(playback) = &mut self.playback {
            if let Some(timer) = playback.timer.take() {
                timer.abort();
                playback.remaining = playback.remaining.saturating_sub(playback.resumed_at.elapsed());
                info!("Agent speech paused");
            }
        }
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        if let Some(playback) = &mut self.playback {
            if playback.timer.is_none() {
                playback.resumed_at = Instant::now();
                playback.timer = Some(Self::spawn_timer(
                    playback.utterance,
                    playback.remaining,
                    playback.events.clone(),
                ));
                info!("Agent speech resumed");
            }
        }
        Ok(())
    }
}
