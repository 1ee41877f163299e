use anyhow::{Context, Result};
use async_trait::async_trait;
use hound::WavReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::{CaptureDevices, DeviceError};
use crate::events::{EventSender, SessionEvent};
use crate::recording::{AudioFrame, MediaChunk};

pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path)
            .context("Failed to open WAV file")?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        let duration_seconds = samples.len() as f64 /
            (spec.sample_rate as f64 * spec.channels as f64);

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    /// Split into frames of `frame_ms` milliseconds
    pub fn frames(&self, frame_ms: u64) -> Vec<AudioFrame> {
        let per_frame = (self.sample_rate as u64 * frame_ms / 1000) as usize * self.channels as usize;
        if per_frame == 0 {
            return Vec::new();
        }

        self.samples
            .chunks(per_frame)
            .enumerate()
            .map(|(i, chunk)| AudioFrame {
                samples: chunk.to_vec(),
                sample_rate: self.sample_rate,
                channels: self.channels,
                timestamp_ms: i as u64 * frame_ms,
            })
            .collect()
    }
}

/// Microphone stand-in that plays a WAV file (or silence) in real time.
///
/// There is no camera: no video chunks are produced.
pub struct FileCapture {
    source: Option<PathBuf>,
    sample_rate: u32,
    channels: u16,
    frame_ms: u64,
    camera_enabled: bool,
    feeder: Option<JoinHandle<()>>,
}

impl FileCapture {
    pub fn new(source: Option<PathBuf>, sample_rate: u32, channels: u16) -> Self {
        Self {
            source,
            sample_rate,
            channels,
            frame_ms: 100,
            camera_enabled: true,
            feeder: None,
        }
    }

    pub fn camera_enabled(&self) -> bool {
        self.camera_enabled
    }

    fn load_frames(&self) -> Result<Vec<AudioFrame>, DeviceError> {
        match &self.source {
            Some(path) => {
                let file = AudioFile::open(path)
                    .map_err(|e| DeviceError::Unavailable(format!("{}: {:#}", path.display(), e)))?;

                // The analysis WAV has one format; a mismatched source would record nothing
                if file.sample_rate != self.sample_rate || file.channels != self.channels {
                    return Err(DeviceError::Unavailable(format!(
                        "{}: {}Hz/{}ch does not match recording format {}Hz/{}ch",
                        path.display(),
                        file.sample_rate,
                        file.channels,
                        self.sample_rate,
                        self.channels
                    )));
                }

                Ok(file.frames(self.frame_ms))
            }
            None => {
                let samples = (self.sample_rate as u64 * self.frame_ms / 1000) as usize
                    * self.channels as usize;
                Ok(vec![AudioFrame {
                    samples: vec![0; samples],
                    sample_rate: self.sample_rate,
                    channels: self.channels,
                    timestamp_ms: 0,
                }])
            }
        }
    }
}

#[async_trait]
impl CaptureDevices for FileCapture {
    async fn acquire(&mut self, events: EventSender) -> Result<(), DeviceError> {
        if self.feeder.is_some() {
            warn!("Capture already acquired");
            return Ok(());
        }

        let frames = self.load_frames()?;
        if frames.is_empty() {
            return Err(DeviceError::Unavailable("audio source is empty".to_string()));
        }

        let frame_ms = self.frame_ms;
        self.feeder = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(frame_ms));
            let mut elapsed_ms = 0;

            for frame in frames.iter().cycle() {
                ticker.tick().await;
                let frame = AudioFrame {
                    timestamp_ms: elapsed_ms,
                    ..frame.clone()
                };
                if !events.send(SessionEvent::Media(MediaChunk::Audio(frame))) {
                    break;
                }
                elapsed_ms += frame_ms;
            }
        }));

        info!("Capture acquired: {}", self.name());
        Ok(())
    }

    fn set_camera_enabled(&mut self, enabled: bool) -> Result<()> {
        self.camera_enabled = enabled;
        info!("Camera {}", if enabled { "enabled" } else { "disabled" });
        Ok(())
    }

    async fn release(&mut self) -> Result<()> {
        if let Some(feeder) = self.feeder.take() {
            feeder.abort();
            info!("Capture released: {}", self.name());
        }
        Ok(())
    }

    fn name(&self) -> &str {
        match &self.source {
            Some(_) => "wav-file",
            None => "silence",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::events::event_queue;

    fn write_wav(sample_rate: u32, channels: u16, samples: usize) -> tempfile::NamedTempFile {
        let file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(file.path(), spec).unwrap();
        for i in 0..samples {
            writer.write_sample(i as i16).unwrap();
        }
        writer.finalize().unwrap();
        file
    }

    #[test]
    fn splits_wav_into_timed_frames() {
        let file = write_wav(16000, 1, 4000);

        let audio = AudioFile::open(file.path()).unwrap();
        assert_eq!(audio.sample_rate, 16000);
        assert!((audio.duration_seconds - 0.25).abs() < 1e-9);

        let frames = audio.frames(100);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].samples.len(), 1600);
        assert_eq!(frames[2].samples.len(), 800);
        assert_eq!(frames[2].timestamp_ms, 200);
    }

    #[test]
    fn missing_file_is_unavailable() {
        let capture = FileCapture::new(Some(PathBuf::from("/nonexistent/voice.wav")), 16000, 1);
        assert!(matches!(
            capture.load_frames(),
            Err(DeviceError::Unavailable(_))
        ));
    }

    #[test]
    fn silence_without_source() {
        let capture = FileCapture::new(None, 16000, 1);
        let frames = capture.load_frames().unwrap();
        assert_eq!(frames.len(), 1);
        assert!(frames[0].samples.iter().all(|&s| s == 0));
        assert_eq!(capture.name(), "silence");
    }

    #[tokio::test]
    async fn rejects_source_in_another_format() {
        let file = write_wav(44100, 2, 44100);
        let mut capture = FileCapture::new(Some(file.path().to_path_buf()), 16000, 1);
        let (events, mut rx) = event_queue();

        let result = capture.acquire(events).await;

        match result {
            Err(DeviceError::Unavailable(message)) => {
                assert!(message.contains("44100Hz/2ch"), "{}", message)
            }
            other => panic!("expected unavailable, got {:?}", other),
        }
        assert!(rx.try_recv().is_err());
    }
}
