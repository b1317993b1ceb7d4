use anyhow::{Context, Result};
use hound::WavReader;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{error, info};

use super::backend::{spawn_frame_pump, AudioFrame, MediaStream, MediaTrack, MicrophoneDevice, TrackKind};
use crate::config::RecordingConfig;
use crate::error::CaptureError;

/// A WAV recording decoded into interleaved 16-bit samples
pub struct AudioFile {
    pub path: PathBuf,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = WavReader::open(path)
            .with_context(|| format!("Failed to open replay source {}", path.display()))?;

        let spec = reader.spec();
        let samples = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to decode replay samples")?;

        let file = Self {
            path: path.to_path_buf(),
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        };

        info!(
            "Replay source {} ready: {:.1}s at {}Hz x{}",
            path.display(),
            file.duration_secs(),
            file.sample_rate,
            file.channels
        );

        Ok(file)
    }

    pub fn duration_secs(&self) -> f64 {
        let per_sec = self.sample_rate as f64 * self.channels as f64;
        if per_sec == 0.0 {
            return 0.0;
        }
        self.samples.len() as f64 / per_sec
    }

    /// Samples in one `buffer_ms` slice starting at `timestamp_ms`, or `None`
    /// past the end of the file
    pub fn slice(&self, timestamp_ms: u64, buffer_ms: u64) -> Option<AudioFrame> {
        let per_ms = self.sample_rate as u64 * self.channels as u64;
        let start = (per_ms * timestamp_ms / 1000) as usize;
        if start >= self.samples.len() {
            return None;
        }
        let end = ((per_ms * (timestamp_ms + buffer_ms) / 1000) as usize).min(self.samples.len());

        Some(AudioFrame {
            samples: self.samples[start..end].to_vec(),
            sample_rate: self.sample_rate,
            channels: self.channels,
            timestamp_ms,
        })
    }
}

/// Microphone that replays a WAV file at real-time pace
pub struct WavFileMicrophone {
    path: PathBuf,
    buffer_ms: u64,
}

impl WavFileMicrophone {
    pub fn new(path: impl Into<PathBuf>, config: &RecordingConfig) -> Self {
        Self {
            path: path.into(),
            buffer_ms: config.buffer_ms,
        }
    }
}

#[async_trait::async_trait]
impl MicrophoneDevice for WavFileMicrophone {
    async fn request_microphone(&self) -> Result<MediaStream, CaptureError> {
        let path = self.path.clone();
        let audio = tokio::task::spawn_blocking(move || AudioFile::open(path))
            .await
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?
            .map_err(|e| {
                error!("Failed to open replay source: {:#}", e);
                CaptureError::DeviceUnavailable(format!("{:#}", e))
            })?;

        let track = MediaTrack::new(TrackKind::Audio);
        let (tx, rx) = mpsc::channel(100);
        let buffer_ms = self.buffer_ms;

        spawn_frame_pump(&track, tx, buffer_ms, move |ts| audio.slice(ts, buffer_ms));

        Ok(MediaStream::new(vec![track], rx))
    }

    fn name(&self) -> &str {
        "wav-file"
    }
}
