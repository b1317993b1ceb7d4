use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::config::{MicrophoneKind, RecordingConfig};
use crate::error::CaptureError;

use super::file::WavFileMicrophone;
use super::synthetic::SyntheticMicrophone;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Audio,
}

/// Handle to one live track of a capture stream.
///
/// Clones share state, so a caller can keep a handle around and check that
/// the device was actually released after the stream is gone.
#[derive(Debug, Clone)]
pub struct MediaTrack {
    id: String,
    kind: TrackKind,
    live: Arc<watch::Sender<bool>>,
}

impl MediaTrack {
    pub fn new(kind: TrackKind) -> Self {
        let (live, _) = watch::channel(true);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            live: Arc::new(live),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn is_live(&self) -> bool {
        *self.live.borrow()
    }

    /// Stop the track. Stopping twice is harmless.
    pub fn stop(&self) {
        if self.live.send_replace(false) {
            debug!("Track {} stopped", self.id);
        }
    }

    /// Receiver that flips to `false` once the track is stopped. Producers
    /// select on this to know when to quit.
    pub fn stopped_signal(&self) -> watch::Receiver<bool> {
        self.live.subscribe()
    }
}

/// A granted microphone: its tracks plus the frames they produce
#[derive(Debug)]
pub struct MediaStream {
    tracks: Vec<MediaTrack>,
    frames: Option<mpsc::Receiver<AudioFrame>>,
}

impl MediaStream {
    pub fn new(tracks: Vec<MediaTrack>, frames: mpsc::Receiver<AudioFrame>) -> Self {
        Self {
            tracks,
            frames: Some(frames),
        }
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    /// Hand the frame receiver to a consumer. Only the first call gets it.
    pub fn take_frames(&mut self) -> Option<mpsc::Receiver<AudioFrame>> {
        self.frames.take()
    }

    pub fn stop_all_tracks(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }

    pub fn is_active(&self) -> bool {
        self.tracks.iter().any(MediaTrack::is_live)
    }
}

impl Drop for MediaStream {
    fn drop(&mut self) {
        self.stop_all_tracks();
    }
}

/// Drive a device: every `buffer_ms` ask `next_frame` for the buffer starting
/// at the given timestamp and push it downstream. Ends when the track is
/// stopped, the source runs dry, or nobody is listening any more. Ending
/// drops the sender, which closes the consumer's channel.
pub(crate) fn spawn_frame_pump<F>(
    track: &MediaTrack,
    tx: mpsc::Sender<AudioFrame>,
    buffer_ms: u64,
    mut next_frame: F,
) -> tokio::task::JoinHandle<()>
where
    F: FnMut(u64) -> Option<AudioFrame> + Send + 'static,
{
    let mut stopped = track.stopped_signal();
    let track_id = track.id().to_string();

    tokio::spawn(async move {
        let period = std::time::Duration::from_millis(buffer_ms.max(1));
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        let mut timestamp_ms = 0u64;

        loop {
            if !*stopped.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    let Some(frame) = next_frame(timestamp_ms) else {
                        debug!("Track {} source exhausted", track_id);
                        break;
                    };
                    if tx.send(frame).await.is_err() {
                        break;
                    }
                    timestamp_ms += buffer_ms;
                }
                changed = stopped.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        debug!("Frame pump for track {} finished", track_id);
    })
}

/// Microphone capture collaborator
///
/// Implementations:
/// - Synthetic: generated tone, for demos and tests
/// - WAV file: replays a recording as live input
#[async_trait::async_trait]
pub trait MicrophoneDevice: Send + Sync {
    /// Ask for microphone access. On success the stream is already
    /// producing frames.
    async fn request_microphone(&self) -> Result<MediaStream, CaptureError>;

    /// Device name for logging
    fn name(&self) -> &str;
}

/// Used when no capture hardware is configured
pub struct NoMicrophone;

#[async_trait::async_trait]
impl MicrophoneDevice for NoMicrophone {
    async fn request_microphone(&self) -> Result<MediaStream, CaptureError> {
        Err(CaptureError::DeviceUnavailable(
            "no microphone configured".to_string(),
        ))
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// Microphone factory
pub struct MicrophoneFactory;

impl MicrophoneFactory {
    /// Create the microphone described by the recording config
    pub fn create(config: &RecordingConfig) -> anyhow::Result<Arc<dyn MicrophoneDevice>> {
        let device: Arc<dyn MicrophoneDevice> = match config.microphone {
            MicrophoneKind::Synthetic => Arc::new(SyntheticMicrophone::from_config(config)),
            MicrophoneKind::WavFile => {
                let path = config.wav_path.clone().ok_or_else(|| {
                    anyhow::anyhow!("recording.wav_path is required for the wav_file microphone")
                })?;
                Arc::new(WavFileMicrophone::new(path, config))
            }
            MicrophoneKind::None => Arc::new(NoMicrophone),
        };

        info!("Microphone backend: {}", device.name());

        Ok(device)
    }
}
