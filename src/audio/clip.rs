use anyhow::{Context, Result};
use std::io::Cursor;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::warn;

pub const WAV_CONTENT_TYPE: &str = "audio/wav";

/// A finalized voice note, ready to preview or upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    /// Encoded audio
    pub bytes: Vec<u8>,
    pub content_type: String,
    /// Whole seconds, as shown on the recorder timer
    pub duration_secs: u64,
}

impl AudioClip {
    /// Wrap audio that arrived already encoded (e.g. over HTTP). The
    /// duration is read from the container; unknown formats get 0.
    pub fn from_encoded(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        let content_type = content_type.into();
        let duration_secs = match probe_duration_secs(&bytes, &content_type) {
            Ok(secs) => secs.round() as u64,
            Err(e) => {
                warn!("Could not determine voice note duration: {:#}", e);
                0
            }
        };

        Self {
            bytes,
            content_type,
            duration_secs,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// File extension used when uploading
    pub fn extension(&self) -> &'static str {
        match self.content_type.as_str() {
            "audio/mpeg" | "audio/mp3" => "mp3",
            "audio/ogg" => "ogg",
            "audio/flac" => "flac",
            "audio/mp4" | "audio/m4a" | "audio/x-m4a" => "m4a",
            "audio/webm" => "webm",
            _ => "wav",
        }
    }
}

/// Duration of an encoded audio buffer in seconds
pub fn probe_duration_secs(bytes: &[u8], content_type: &str) -> Result<f64> {
    let source = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

    let mut hint = Hint::new();
    hint.mime_type(content_type);

    let probed = symphonia::default::get_probe()
        .format(&hint, source, &FormatOptions::default(), &MetadataOptions::default())
        .context("Unrecognized audio format")?;

    let track = probed
        .format
        .default_track()
        .context("Audio has no playable track")?;

    let params = &track.codec_params;
    let frames = params.n_frames.context("Audio frame count unknown")?;
    let sample_rate = params.sample_rate.context("Audio sample rate unknown")?;

    Ok(frames as f64 / sample_rate as f64)
}
