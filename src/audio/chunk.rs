use anyhow::{Context, Result};
use std::io::Cursor;

use super::backend::AudioFrame;
use super::clip::{AudioClip, WAV_CONTENT_TYPE};

/// In-memory chunk accumulator for one recording.
///
/// Every frame the device delivers is kept as its own chunk; nothing is
/// written anywhere until [`ChunkBuffer::finalize`] encodes the lot into a
/// single WAV clip.
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    chunks: Vec<Vec<i16>>,
    sample_rate: Option<u32>,
    channels: Option<u16>,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: AudioFrame) {
        // Format is fixed by the first frame
        self.sample_rate.get_or_insert(frame.sample_rate);
        self.channels.get_or_insert(frame.channels);
        if !frame.samples.is_empty() {
            self.chunks.push(frame.samples);
        }
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn sample_count(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    /// Encode accumulated chunks as 16-bit PCM WAV
    pub fn finalize(self, duration_secs: u64) -> Result<AudioClip> {
        let spec = hound::WavSpec {
            channels: self.channels.unwrap_or(1),
            sample_rate: self.sample_rate.unwrap_or(16000),
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut buffer, spec)
                .context("Failed to create WAV writer")?;

            for chunk in &self.chunks {
                for &sample in chunk {
                    writer.write_sample(sample)
                        .context("Failed to write sample to WAV")?;
                }
            }

            writer.finalize()
                .context("Failed to finalize WAV data")?;
        }

        Ok(AudioClip {
            bytes: buffer.into_inner(),
            content_type: WAV_CONTENT_TYPE.to_string(),
            duration_secs,
        })
    }
}
