use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

/// 5 MiB, the largest photo a draft may carry
pub const DEFAULT_MAX_PHOTO_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub user: UserConfig,
    pub recording: RecordingConfig,
    pub attachments: AttachmentsConfig,
    pub storage: StorageConfig,
    pub realtime: RealtimeConfig,
    pub assistant: AssistantConfig,
    pub progress: ProgressConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "eco-echo".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

/// The signed-in identity. Authentication itself is out of scope, so this
/// is simply whoever the config says it is.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub id: String,
    pub display_name: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            id: "default-user-id".to_string(),
            display_name: "Demo User".to_string(),
        }
    }
}

/// Which microphone the recorder opens
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MicrophoneKind {
    /// Generated sine tone
    Synthetic,
    /// Replays `wav_path` as if it were live input
    WavFile,
    /// No capture device present
    None,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    pub microphone: MicrophoneKind,
    pub sample_rate: u32,
    pub channels: u16,
    pub buffer_ms: u64,
    pub tone_hz: f32,
    pub wav_path: Option<PathBuf>,
    /// Simulates the user refusing the browser permission prompt
    pub deny_permission: bool,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            microphone: MicrophoneKind::Synthetic,
            sample_rate: 16000,
            channels: 1,
            buffer_ms: 100,
            tone_hz: 440.0,
            wav_path: None,
            deny_permission: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AttachmentsConfig {
    pub max_photo_bytes: u64,
}

impl Default for AttachmentsConfig {
    fn default() -> Self {
        Self {
            max_photo_bytes: DEFAULT_MAX_PHOTO_BYTES,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub root: PathBuf,
    pub public_base_url: String,
    pub photo_bucket: String,
    pub audio_bucket: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data/objects"),
            public_base_url: "http://127.0.0.1:8787/media".to_string(),
            photo_bucket: "eco-photos".to_string(),
            audio_bucket: "eco-audio".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// When unset, realtime pushes come straight from the in-process store
    pub nats_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub thinking_delay_ms: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            thinking_delay_ms: 1500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    pub goal_points: u32,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self { goal_points: 50 }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("ECO_ECHO").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let cfg = Config::default();
        assert_eq!(cfg.attachments.max_photo_bytes, 5_242_880);
        assert_eq!(cfg.assistant.thinking_delay_ms, 1500);
        assert_eq!(cfg.progress.goal_points, 50);
        assert_eq!(cfg.recording.microphone, MicrophoneKind::Synthetic);
    }

    #[test]
    fn test_load_partial_toml() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("eco-echo.toml");
        std::fs::write(
            &path,
            "[user]\nid = \"u-42\"\n\n[recording]\nmicrophone = \"none\"\n",
        )?;

        let cfg = Config::load(path.with_extension("").to_str().unwrap())?;
        assert_eq!(cfg.user.id, "u-42");
        assert_eq!(cfg.recording.microphone, MicrophoneKind::None);
        assert_eq!(cfg.recording.sample_rate, 16000);
        assert_eq!(cfg.storage.photo_bucket, "eco-photos");
        Ok(())
    }
}
