use crate::defaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub limits: LimitsConfig,
    pub transcoder: TranscoderConfig,
    pub transcription: TranscriptionConfig,
    pub rewrite: RewriteConfig,
    pub synthesis: SynthesisConfig,
    pub server: ServerConfig,
}

/// Upload limits enforced before transcoding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_upload_bytes: usize,
    pub max_duration_secs: u64,
}

/// External transcoder configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranscoderConfig {
    pub ffmpeg_path: PathBuf,
    /// Parent directory for per-request scratch directories (system temp if unset)
    pub temp_dir: Option<PathBuf>,
}

/// Speech recognition configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub endpoint: String,
    pub language: String,
    pub model: String,
    pub api_key: Option<String>,
}

/// Text generation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RewriteConfig {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub site_url: String,
    pub site_name: String,
    pub api_key: Option<String>,
}

/// Speech synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SynthesisConfig {
    pub endpoint: String,
    pub model_id: String,
    pub stability: f32,
    pub similarity_boost: f32,
    pub stream_timeout_secs: u64,
    /// Credential slots, slot 1 first
    pub api_keys: Vec<String>,
}

/// HTTP surface configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: defaults::MAX_UPLOAD_BYTES,
            max_duration_secs: defaults::MAX_DURATION_SECS,
        }
    }
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from(defaults::FFMPEG_BINARY),
            temp_dir: None,
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::RECOGNITION_ENDPOINT.to_string(),
            language: defaults::RECOGNITION_LANGUAGE.to_string(),
            model: defaults::RECOGNITION_MODEL.to_string(),
            api_key: None,
        }
    }
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::REWRITE_ENDPOINT.to_string(),
            model: defaults::REWRITE_MODEL.to_string(),
            temperature: defaults::REWRITE_TEMPERATURE,
            site_url: defaults::SITE_URL.to_string(),
            site_name: defaults::SITE_NAME.to_string(),
            api_key: None,
        }
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::SYNTHESIS_ENDPOINT.to_string(),
            model_id: defaults::SYNTHESIS_MODEL.to_string(),
            stability: defaults::SYNTHESIS_STABILITY,
            similarity_boost: defaults::SYNTHESIS_SIMILARITY_BOOST,
            stream_timeout_secs: defaults::STREAM_TIMEOUT_SECS,
            api_keys: Vec::new(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: defaults::SERVER_BIND.to_string(),
        }
    }
}

impl SynthesisConfig {
    /// API key for a 1-based credential slot, if configured and non-empty.
    pub fn api_key_for_slot(&self, slot: u8) -> Option<&str> {
        let index = usize::from(slot).checked_sub(1)?;
        self.api_keys
            .get(index)
            .map(String::as_str)
            .filter(|key| !key.is_empty())
    }

    fn set_slot(&mut self, slot: u8, key: String) {
        let index = usize::from(slot.saturating_sub(1));
        if self.api_keys.len() <= index {
            self.api_keys.resize(index + 1, String::new());
        }
        self.api_keys[index] = key;
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if the file doesn't exist
    ///
    /// Invalid TOML is still an error.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e)
                if e.downcast_ref::<std::io::Error>()
                    .is_some_and(|io_err| io_err.kind() == std::io::ErrorKind::NotFound) =>
            {
                Ok(Self::default())
            }
            Err(e) => Err(e.context(format!("Failed to load config from {}", path.display()))),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - GOOGLE_SPEECH_API_KEY → transcription.api_key
    /// - OPENROUTER_API_KEY → rewrite.api_key
    /// - OPENROUTER_SITE_URL → rewrite.site_url
    /// - OPENROUTER_SITE_NAME → rewrite.site_name
    /// - ELEVENLABS_API_KEY1..3 → synthesis.api_keys[0..3]
    /// - TONETWIST_FFMPEG → transcoder.ffmpeg_path
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(key) = non_empty_env("GOOGLE_SPEECH_API_KEY") {
            self.transcription.api_key = Some(key);
        }

        if let Some(key) = non_empty_env("OPENROUTER_API_KEY") {
            self.rewrite.api_key = Some(key);
        }

        if let Some(url) = non_empty_env("OPENROUTER_SITE_URL") {
            self.rewrite.site_url = url;
        }

        if let Some(name) = non_empty_env("OPENROUTER_SITE_NAME") {
            self.rewrite.site_name = name;
        }

        for slot in 1..=defaults::CREDENTIAL_SLOTS {
            if let Some(key) = non_empty_env(&format!("ELEVENLABS_API_KEY{slot}")) {
                self.synthesis.set_slot(slot, key);
            }
        }

        if let Some(path) = non_empty_env("TONETWIST_FFMPEG") {
            self.transcoder.ffmpeg_path = PathBuf::from(path);
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/tonetwist/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("tonetwist")
            .join("config.toml")
    }

    /// Render the configuration as TOML with credentials masked.
    pub fn to_display_toml(&self) -> anyhow::Result<String> {
        let mut masked = self.clone();
        masked.transcription.api_key = masked.transcription.api_key.as_deref().map(mask);
        masked.rewrite.api_key = masked.rewrite.api_key.as_deref().map(mask);
        masked.synthesis.api_keys = masked.synthesis.api_keys.iter().map(|k| mask(k)).collect();
        Ok(toml::to_string_pretty(&masked)?)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        "********".to_string()
    }
}
