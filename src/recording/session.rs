use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::audio::{AudioClip, ChunkBuffer, MediaStream, MicrophoneDevice};
use crate::error::CaptureError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Stopped,
}

impl RecorderState {
    fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Stopped => "stopped",
        }
    }
}

/// Records one voice note at a time from a microphone.
///
/// The device stream is held only while recording. `stop`, `reset` and
/// dropping the session all release it, so a track is never left live.
pub struct MediaRecorderSession {
    device: Arc<dyn MicrophoneDevice>,

    state: RecorderState,

    /// When the current take started
    started_at: Option<Instant>,

    /// Whole seconds recorded, refreshed every second while frames flow
    elapsed_secs: Arc<AtomicU64>,

    /// Open device stream, only while recording
    stream: Option<MediaStream>,

    /// Task collecting frames into chunks and driving the timer
    collector_handle: Option<JoinHandle<ChunkBuffer>>,

    /// Finalized clip, only while stopped
    clip: Option<AudioClip>,
}

impl MediaRecorderSession {
    pub fn new(device: Arc<dyn MicrophoneDevice>) -> Self {
        Self {
            device,
            state: RecorderState::Idle,
            started_at: None,
            elapsed_secs: Arc::new(AtomicU64::new(0)),
            stream: None,
            collector_handle: None,
            clip: None,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs.load(Ordering::SeqCst)
    }

    /// Timer as displayed next to the record button, e.g. `0:03`
    pub fn elapsed_label(&self) -> String {
        format_elapsed(self.elapsed_secs())
    }

    /// The finalized clip, present only in [`RecorderState::Stopped`]
    pub fn clip(&self) -> Option<&AudioClip> {
        self.clip.as_ref()
    }

    /// Start recording
    pub async fn start(&mut self) -> Result<(), CaptureError> {
        if self.state == RecorderState::Recording {
            return Err(CaptureError::InvalidState {
                op: "start",
                state: self.state.as_str(),
            });
        }

        let mut stream = match self.device.request_microphone().await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Microphone request failed on {}: {}", self.device.name(), e);
                return Err(e);
            }
        };

        // A new take replaces whatever was recorded before
        self.clip = None;

        let Some(mut frames) = stream.take_frames() else {
            return Err(CaptureError::DeviceUnavailable(
                "stream has no frame source".to_string(),
            ));
        };

        info!("Recording started on {}", self.device.name());

        let started_at = Instant::now();
        self.elapsed_secs.store(0, Ordering::SeqCst);

        let elapsed = Arc::clone(&self.elapsed_secs);
        let collector = tokio::spawn(async move {
            let period = Duration::from_secs(1);
            let mut ticker = tokio::time::interval_at(started_at + period, period);
            let mut chunks = ChunkBuffer::new();

            loop {
                tokio::select! {
                    frame = frames.recv() => match frame {
                        Some(frame) => chunks.push(frame),
                        None => break,
                    },
                    _ = ticker.tick() => {
                        elapsed.store(started_at.elapsed().as_secs(), Ordering::SeqCst);
                    }
                }
            }

            // Source closed: the timer stops where the audio stops
            elapsed.store(started_at.elapsed().as_secs(), Ordering::SeqCst);
            chunks
        });

        self.started_at = Some(started_at);
        self.stream = Some(stream);
        self.collector_handle = Some(collector);
        self.state = RecorderState::Recording;

        Ok(())
    }

    /// Stop recording and finalize the clip
    pub async fn stop(&mut self) -> Result<AudioClip, CaptureError> {
        if self.state != RecorderState::Recording {
            return Err(CaptureError::InvalidState {
                op: "stop",
                state: self.state.as_str(),
            });
        }

        let source_ended = self
            .collector_handle
            .as_ref()
            .map_or(true, JoinHandle::is_finished);
        let stopped_secs = self.started_at.take().map(|t| t.elapsed().as_secs());

        // Release the device; the frame channel closes once the producer sees it
        if let Some(stream) = self.stream.take() {
            stream.stop_all_tracks();
        }

        let chunks = match self.collector_handle.take() {
            Some(collector) => collector.await.map_err(|e| {
                error!("Chunk collector failed: {}", e);
                self.state = RecorderState::Idle;
                CaptureError::Encode(e.to_string())
            })?,
            None => ChunkBuffer::new(),
        };

        if source_ended {
            info!("Microphone source ran out before stop");
        } else if let Some(secs) = stopped_secs {
            self.elapsed_secs.store(secs, Ordering::SeqCst);
        }
        let duration_secs = self.elapsed_secs();

        let chunk_count = chunks.chunk_count();
        let clip = chunks.finalize(duration_secs).map_err(|e| {
            error!("Failed to encode recording: {:#}", e);
            self.state = RecorderState::Idle;
            CaptureError::Encode(format!("{:#}", e))
        })?;

        info!(
            "Recording stopped: {} ({} chunks, {} bytes)",
            format_elapsed(duration_secs),
            chunk_count,
            clip.size()
        );

        self.clip = Some(clip.clone());
        self.state = RecorderState::Stopped;

        Ok(clip)
    }

    /// Back to idle, discarding any clip. Releases the device if a
    /// recording was in progress.
    pub fn reset(&mut self) {
        self.release();
        self.clip = None;
        self.elapsed_secs.store(0, Ordering::SeqCst);
        self.state = RecorderState::Idle;
    }

    fn release(&mut self) {
        self.started_at = None;
        if let Some(stream) = self.stream.take() {
            stream.stop_all_tracks();
        }
        if let Some(collector) = self.collector_handle.take() {
            collector.abort();
        }
    }
}

impl Drop for MediaRecorderSession {
    fn drop(&mut self) {
        if self.state == RecorderState::Recording {
            warn!("Recorder dropped mid-recording, releasing microphone");
        }
        self.release();
    }
}

/// `m:ss` with zero-padded seconds
pub fn format_elapsed(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
