//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

/// Backend identifier for the OpenAI-compatible search endpoint.
pub const OPENAI_BACKEND: &str = "openai";

/// Backend identifier for the Akash chat API.
pub const AKASH_BACKEND: &str = "akash";

// ---------------------------------------------------------------------------
// BackendConfig
// ---------------------------------------------------------------------------

/// Connection settings for one OpenAI-compatible completion backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL; `/chat/completions` is appended per request.
    pub base_url: String,
    /// API key — `None` for endpoints that need no authentication.
    pub api_key: Option<String>,
    /// Model used when a channel does not name one explicitly.
    pub default_model: String,
    /// Maximum seconds to wait for a completion before timing out.
    pub timeout_secs: u64,
}

impl BackendConfig {
    fn openai_default() -> Self {
        Self {
            base_url: "https://api.perplexity.ai".into(),
            api_key: None,
            default_model: "sonar".into(),
            timeout_secs: 60,
        }
    }

    fn akash_default() -> Self {
        Self {
            base_url: "https://chatapi.akash.network/api/v1".into(),
            api_key: None,
            default_model: "Meta-Llama-3-3-70B-Instruct".into(),
            timeout_secs: 60,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::openai_default()
    }
}

// ---------------------------------------------------------------------------
// ChannelSettings
// ---------------------------------------------------------------------------

/// Per-channel routing: which backend, model and personality answer there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSettings {
    /// Backend identifier (key of [`AppConfig::backends`]).
    pub backend: String,
    /// Model override; `None` uses the backend's `default_model`.
    pub model: Option<String>,
    /// Personality name resolved through the personality registry.
    pub personality: String,
}

impl ChannelSettings {
    fn new(backend: &str, model: Option<&str>, personality: &str) -> Self {
        Self {
            backend: backend.into(),
            model: model.map(str::to_string),
            personality: personality.into(),
        }
    }
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self::new(OPENAI_BACKEND, None, "default")
    }
}

// ---------------------------------------------------------------------------
// JudgementConfig
// ---------------------------------------------------------------------------

/// Settings for the multi-judge verdict pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgementConfig {
    /// Seconds a cached verdict stays valid.
    pub cache_ttl_secs: u64,
    /// Fraction of judges that must share the first judge's sentiment.
    pub consensus_threshold: f32,
    /// Output-token budget for the arbiter and the fallback judge.
    pub max_tokens: u32,
}

impl Default for JudgementConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 3600,
            consensus_threshold: 0.8,
            max_tokens: 512,
        }
    }
}

// ---------------------------------------------------------------------------
// ConversationConfig
// ---------------------------------------------------------------------------

/// Settings for ordinary channel replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 1.0).
    pub temperature: f32,
    /// Number of prior channel messages included with `+history`.
    pub history_limit: usize,
    /// Backend used by `online:` queries.
    pub online_backend: String,
    /// Model used by `online:` queries.
    pub online_model: String,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.7,
            history_limit: 10,
            online_backend: OPENAI_BACKEND.into(),
            online_model: "sonar-pro".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// MediaConfig
// ---------------------------------------------------------------------------

/// Settings for video-link audio extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Channel in which `get <link>` requests are honoured.
    pub channel: String,
    /// Upload ceiling enforced by the chat platform, in bytes.
    pub max_upload_bytes: u64,
    /// Downloader executable.
    pub downloader: String,
    /// Where converted files are staged; `None` uses [`AppPaths::audio_dir`].
    pub output_dir: Option<PathBuf>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            channel: "music".into(),
            max_upload_bytes: 10 * 1024 * 1024,
            downloader: "yt-dlp".into(),
            output_dir: None,
        }
    }
}

impl MediaConfig {
    /// Resolved staging directory.
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| AppPaths::new().audio_dir)
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// Missing sections fall back to their defaults, so a settings file only
/// needs to name what it changes.
///
/// ```rust,no_run
/// use pal_assistant::config::AppConfig;
///
/// let mut config = AppConfig::load().unwrap();
/// config.apply_env_overrides();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Completion backends keyed by identifier.
    pub backends: BTreeMap<String, BackendConfig>,
    /// Channel routing keyed by channel name; `"default"` covers the rest.
    pub channels: BTreeMap<String, ChannelSettings>,
    pub judgement: JudgementConfig,
    pub conversation: ConversationConfig,
    pub media: MediaConfig,
    /// Extra or replacement personality prompts keyed by name.
    pub personalities: BTreeMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let backends = BTreeMap::from([
            (OPENAI_BACKEND.to_string(), BackendConfig::openai_default()),
            (AKASH_BACKEND.to_string(), BackendConfig::akash_default()),
        ]);

        let channels = BTreeMap::from([
            ("default".to_string(), ChannelSettings::default()),
            ("general".to_string(), ChannelSettings::default()),
            (
                "pal-akash-deepseek".to_string(),
                ChannelSettings::new(AKASH_BACKEND, Some("DeepSeek-V3-1"), "default"),
            ),
            (
                "pal-akash-llama".to_string(),
                ChannelSettings::new(
                    AKASH_BACKEND,
                    Some("Meta-Llama-4-Maverick-17B-128E-Instruct-FP8"),
                    "default",
                ),
            ),
            (
                "pal-online".to_string(),
                ChannelSettings::new(OPENAI_BACKEND, Some("sonar-pro"), "online"),
            ),
            (
                "pal-offline".to_string(),
                ChannelSettings::new(OPENAI_BACKEND, Some("sonar"), "default"),
            ),
        ]);

        Self {
            backends,
            channels,
            judgement: JudgementConfig::default(),
            conversation: ConversationConfig::default(),
            media: MediaConfig::default(),
            personalities: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply `OPENAI_*` / `AKASH_*` environment variables on top of the
    /// loaded settings.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Recognised keys: `<PREFIX>_API_KEY`, `<PREFIX>_BASE_URL` and
    /// `<PREFIX>_MODEL` for the `OPENAI` and `AKASH` prefixes. Empty values
    /// are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for (prefix, id) in [("OPENAI", OPENAI_BACKEND), ("AKASH", AKASH_BACKEND)] {
            let get = |suffix: &str| lookup(&format!("{prefix}_{suffix}")).filter(|v| !v.is_empty());
            let backend = self.backends.entry(id.to_string()).or_default();

            if let Some(key) = get("API_KEY") {
                backend.api_key = Some(key);
            }
            if let Some(url) = get("BASE_URL") {
                backend.base_url = url;
            }
            if let Some(model) = get("MODEL") {
                backend.default_model = model;
            }
        }
    }

    /// Settings for `channel`, falling back to the `"default"` entry.
    pub fn channel(&self, channel: &str) -> ChannelSettings {
        self.channels
            .get(channel)
            .or_else(|| self.channels.get("default"))
            .cloned()
            .unwrap_or_default()
    }

    /// Model a channel should use after applying the backend default.
    pub fn channel_model(&self, settings: &ChannelSettings) -> String {
        settings.model.clone().unwrap_or_else(|| {
            self.backends
                .get(&settings.backend)
                .map(|b| b.default_model.clone())
                .unwrap_or_default()
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.backends, loaded.backends);
        assert_eq!(original.channels, loaded.channels);
        assert_eq!(
            original.judgement.cache_ttl_secs,
            loaded.judgement.cache_ttl_secs
        );
        assert_eq!(
            original.judgement.consensus_threshold,
            loaded.judgement.consensus_threshold
        );
        assert_eq!(
            original.conversation.online_model,
            loaded.conversation.online_model
        );
        assert_eq!(
            original.media.max_upload_bytes,
            loaded.media.max_upload_bytes
        );
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config.judgement.cache_ttl_secs, 3600);
        assert_eq!(config.backends.len(), 2);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(
            &path,
            "[judgement]\ncache_ttl_secs = 60\nconsensus_threshold = 0.5\nmax_tokens = 256\n\n\
             [personalities]\npirate = \"Talk like a pirate.\"\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).expect("load");
        assert_eq!(config.judgement.cache_ttl_secs, 60);
        assert_eq!(config.conversation.max_tokens, 1024);
        assert_eq!(config.channels.len(), 6);
        assert_eq!(config.personalities["pirate"], "Talk like a pirate.");
    }

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.judgement.cache_ttl_secs, 3600);
        assert!((cfg.judgement.consensus_threshold - 0.8).abs() < f32::EPSILON);
        assert_eq!(cfg.judgement.max_tokens, 512);
        assert_eq!(cfg.conversation.max_tokens, 1024);
        assert_eq!(cfg.conversation.history_limit, 10);
        assert_eq!(cfg.media.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(cfg.media.channel, "music");
        assert!(cfg.backends[AKASH_BACKEND].base_url.contains("akash"));
    }

    #[test]
    fn env_overrides_apply_to_matching_backend() {
        let vars = HashMap::from([
            ("OPENAI_API_KEY", "pplx-test"),
            ("OPENAI_MODEL", "sonar-reasoning"),
            ("AKASH_BASE_URL", "https://akash.example/v1"),
            ("AKASH_API_KEY", ""),
        ]);

        let mut cfg = AppConfig::default();
        cfg.apply_overrides_from(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.backends[OPENAI_BACKEND].api_key.as_deref(), Some("pplx-test"));
        assert_eq!(cfg.backends[OPENAI_BACKEND].default_model, "sonar-reasoning");
        assert_eq!(cfg.backends[AKASH_BACKEND].base_url, "https://akash.example/v1");
        // Empty values are ignored.
        assert!(cfg.backends[AKASH_BACKEND].api_key.is_none());
    }

    #[test]
    fn unknown_channel_uses_default_entry() {
        let cfg = AppConfig::default();
        let settings = cfg.channel("random-chat");
        assert_eq!(settings, cfg.channels["default"]);
        assert_eq!(cfg.channel_model(&settings), "sonar");
    }

    #[test]
    fn channel_model_override_wins() {
        let cfg = AppConfig::default();
        let settings = cfg.channel("pal-akash-deepseek");
        assert_eq!(settings.backend, AKASH_BACKEND);
        assert_eq!(cfg.channel_model(&settings), "DeepSeek-V3-1");
    }
}
