// Synthetic microphone: a sine tone generator standing in for real capture
// hardware. Also lets callers simulate a refused permission prompt.

use tokio::sync::mpsc;
use tracing::{info, warn};

use super::backend::{spawn_frame_pump, AudioFrame, MediaStream, MediaTrack, MicrophoneDevice, TrackKind};
use crate::config::RecordingConfig;
use crate::error::CaptureError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

#[derive(Debug, Clone)]
pub struct SyntheticMicrophone {
    sample_rate: u32,
    channels: u16,
    buffer_ms: u64,
    tone_hz: f32,
    permission: Permission,
}

impl SyntheticMicrophone {
    pub fn new(sample_rate: u32, channels: u16, buffer_ms: u64) -> Self {
        Self {
            sample_rate,
            channels,
            buffer_ms,
            tone_hz: 440.0,
            permission: Permission::Granted,
        }
    }

    pub fn from_config(config: &RecordingConfig) -> Self {
        let permission = if config.deny_permission {
            Permission::Denied
        } else {
            Permission::Granted
        };

        Self {
            sample_rate: config.sample_rate,
            channels: config.channels,
            buffer_ms: config.buffer_ms,
            tone_hz: config.tone_hz,
            permission,
        }
    }

    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permission = permission;
        self
    }

    fn render(&self, timestamp_ms: u64) -> AudioFrame {
        let frames_per_buffer = (self.sample_rate as u64 * self.buffer_ms / 1000) as usize;
        let start = self.sample_rate as u64 * timestamp_ms / 1000;
        let step = 2.0 * std::f32::consts::PI * self.tone_hz / self.sample_rate as f32;

        let mut samples = Vec::with_capacity(frames_per_buffer * self.channels as usize);
        for n in 0..frames_per_buffer as u64 {
            let phase = ((start + n) as f32 * step).sin();
            let value = (phase * i16::MAX as f32 * 0.25) as i16;
            for _ in 0..self.channels {
                samples.push(value);
            }
        }

        AudioFrame {
            samples,
            sample_rate: self.sample_rate,
            channels: self.channels,
            timestamp_ms,
        }
    }
}

#[async_trait::async_trait]
impl MicrophoneDevice for SyntheticMicrophone {
    async fn request_microphone(&self) -> Result<MediaStream, CaptureError> {
        if self.permission == Permission::Denied {
            warn!("Microphone permission denied");
            return Err(CaptureError::PermissionDenied);
        }

        let track = MediaTrack::new(TrackKind::Audio);
        let (tx, rx) = mpsc::channel(100);

        let generator = self.clone();
        spawn_frame_pump(&track, tx, self.buffer_ms, move |ts| Some(generator.render(ts)));

        info!(
            "Synthetic microphone started ({}Hz, {} channels, {}Hz tone)",
            self.sample_rate, self.channels, self.tone_hz
        );

        Ok(MediaStream::new(vec![track], rx))
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}
