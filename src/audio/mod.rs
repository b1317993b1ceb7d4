pub mod backend;
pub mod chunk;
pub mod clip;
pub mod file;
pub mod synthetic;

pub use backend::{AudioFrame, MediaStream, MediaTrack, MicrophoneDevice, MicrophoneFactory, NoMicrophone, TrackKind};
pub use chunk::ChunkBuffer;
pub use clip::{AudioClip, WAV_CONTENT_TYPE};
pub use file::{AudioFile, WavFileMicrophone};
pub use synthetic::{Permission, SyntheticMicrophone};
