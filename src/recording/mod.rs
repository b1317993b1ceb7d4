//! Voice note recording
//!
//! `MediaRecorderSession` owns the microphone for the duration of one take:
//! - Requests the device and collects frames into in-memory chunks
//! - Runs the 1-second elapsed timer
//! - Finalizes chunks into a WAV clip on stop
//! - Releases every device track on stop, reset or drop

mod session;

pub use session::{format_elapsed, MediaRecorderSession, RecorderState};
