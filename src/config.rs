use anyhow::Result;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::audio::{AudioBackendConfig, AudioSource};
use crate::recording::PermissionStatus;
use crate::upload::PartialFailurePolicy;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub backend: BackendConfig,
    pub audio: AudioConfig,
    pub tasks: TasksConfig,
    pub upload: UploadConfig,
    pub session: SessionStoreConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "voice-study".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Rest,
    #[default]
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub url: String,
    pub anon_key: String,
    pub bucket: String,
    pub timeout_secs: u64,
    /// keycode -> user id, seeds the memory backend
    pub demo_keycodes: BTreeMap<String, String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Memory,
            url: "http://localhost:54321".to_string(),
            anon_key: String::new(),
            bucket: "recordings".to_string(),
            timeout_secs: 30,
            demo_keycodes: BTreeMap::from([("123456".to_string(), "demo-user".to_string())]),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Tone,
    Silence,
    File,
    Microphone,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub recordings_path: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub source: SourceKind,
    pub source_file: Option<String>,
    pub tone_hz: f32,
    pub microphone_access: PermissionStatus,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            recordings_path: "~/.local/share/voice-study/recordings".to_string(),
            sample_rate: 16000,
            channels: 1,
            source: SourceKind::Tone,
            source_file: None,
            tone_hz: 220.0,
            microphone_access: PermissionStatus::Granted,
        }
    }
}

impl AudioConfig {
    pub fn recordings_dir(&self) -> PathBuf {
        expand(&self.recordings_path)
    }

    pub fn backend_config(&self) -> Result<AudioBackendConfig> {
        self.validate()?;
        Ok(AudioBackendConfig {
            target_sample_rate: self.sample_rate,
            target_channels: self.channels,
            ..AudioBackendConfig::default()
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            anyhow::bail!("audio.sample_rate must be greater than 0");
        }
        if self.channels == 0 {
            anyhow::bail!("audio.channels must be greater than 0");
        }
        Ok(())
    }

    pub fn source(&self) -> Result<AudioSource> {
        Ok(match self.source {
            SourceKind::Tone => AudioSource::Tone {
                frequency_hz: self.tone_hz,
            },
            SourceKind::Silence => AudioSource::Silence,
            SourceKind::File => {
                let path = self
                    .source_file
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("audio.source_file is required for the file source"))?;
                AudioSource::File(expand(path).display().to_string())
            }
            SourceKind::Microphone => AudioSource::Microphone,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TasksConfig {
    pub reading_secs: u64,
    pub vowel_secs: u64,
    pub vowels: Vec<String>,
    pub poll_interval_ms: u64,
    pub reading_passage: String,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            reading_secs: 10,
            vowel_secs: 5,
            vowels: ["a", "e", "i", "o", "u"].iter().map(|v| v.to_string()).collect(),
            poll_interval_ms: 100,
            reading_passage: "When the sunlight strikes raindrops in the air, they act as a prism \
                              and form a rainbow. The rainbow is a division of white light into \
                              many beautiful colors."
                .to_string(),
        }
    }
}

impl TasksConfig {
    pub fn reading_duration(&self) -> Duration {
        Duration::from_secs(self.reading_secs)
    }

    pub fn vowel_duration(&self) -> Duration {
        Duration::from_secs(self.vowel_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub partial_failure: PartialFailurePolicy,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SessionStoreConfig {
    pub store_path: String,
}

impl Default for SessionStoreConfig {
    fn default() -> Self {
        Self {
            store_path: "~/.local/share/voice-study/session.json".to_string(),
        }
    }
}

impl SessionStoreConfig {
    pub fn path(&self) -> PathBuf {
        expand(&self.store_path)
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

impl Config {
    /// Load `path` (any extension the `config` crate knows, optional) and
    /// `VOICE_STUDY__SECTION__KEY` environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("VOICE_STUDY").separator("__"))
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.audio.validate()?;
        Ok(cfg)
    }
}
