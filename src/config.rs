use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub storage: StorageConfig,
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
            name: "voice-journal".to_string(),
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

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Full chat-completions URL
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    /// Environment variable holding the bearer credential
    pub api_key_env: String,
    /// Optional bound on a completion request; elapsed requests use the fallback reply
    pub timeout_secs: Option<u64>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 150,
            api_key_env: "JOURNAL_COMPLETION_API_KEY".to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    /// Voice name substrings; the first host voice matching any of them is used
    pub preferred_voices: Vec<String>,
    /// Delay before restarting a recognizer that ended mid-call
    pub restart_delay_ms: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            rate: 0.9,
            pitch: 1.0,
            volume: 0.8,
            preferred_voices: vec![
                "Google".to_string(),
                "Natural".to_string(),
                "Samantha".to_string(),
            ],
            restart_delay_ms: 100,
        }
    }
}

impl SpeechConfig {
    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Event sink URL; delivery is disabled when unset
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "~/.voice-journal/state.json".to_string(),
        }
    }
}

impl StorageConfig {
    /// Storage path with `~` and environment variables expanded
    pub fn resolved_path(&self) -> Result<PathBuf> {
        let expanded = shellexpand::full(&self.path)
            .with_context(|| format!("Failed to expand storage path: {}", self.path))?;
        Ok(PathBuf::from(expanded.as_ref()))
    }
}

impl Config {
    /// Load from a TOML file (extension optional) with `JOURNAL__*` overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("JOURNAL").separator("__"))
            .build()
            .with_context(|| format!("Failed to load config from {}", path))?;

        Ok(settings.try_deserialize()?)
    }
}
