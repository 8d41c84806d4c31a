// SYNOID Reel Configuration
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Everything a run needs from the environment is read once in `main` and
// handed down as plain values. Components never look at env vars themselves.

use crate::agent::voice::TtsBackend;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_SEARCH_URL: &str = "https://api.pexels.com/v1/search";
pub const DEFAULT_OUTPUT: &str = "synoid_reel_output.mp4";

pub const ENV_API_KEY: &str = "PEXELS_API_KEY";
pub const ENV_SEARCH_URL: &str = "SYNOID_REEL_SEARCH_URL";
pub const ENV_TTS: &str = "SYNOID_REEL_TTS";
pub const ENV_VOICE: &str = "SYNOID_REEL_VOICE";
pub const ENV_FONT: &str = "SYNOID_REEL_FONT";

/// Stock image search settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// `None` means placeholder-only mode.
    pub api_key: Option<String>,
    pub endpoint: String,
    pub search_timeout: Duration,
    pub download_timeout: Duration,
}

impl SearchConfig {
    /// No credential: every scene gets a placeholder and no request is made.
    pub fn offline() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_SEARCH_URL.to_string(),
            search_timeout: Duration::from_secs(20),
            download_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_api_key(key: impl Into<String>) -> Self {
        let key = key.into();
        let mut config = Self::offline();
        if !key.trim().is_empty() {
            config.api_key = Some(key.trim().to_string());
        }
        config
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::offline()
    }
}

/// Full configuration for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct ReelConfig {
    pub search: SearchConfig,
    pub tts: TtsBackend,
    pub voice: Option<String>,
    pub font_path: Option<PathBuf>,
    pub output: PathBuf,
}

impl Default for ReelConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig::offline(),
            tts: TtsBackend::default(),
            voice: None,
            font_path: None,
            output: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

impl ReelConfig {
    /// Read the process environment (call `dotenv()` first to pick up `.env`).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut search = match get(ENV_API_KEY) {
            Some(key) => SearchConfig::with_api_key(key),
            None => SearchConfig::offline(),
        };
        if let Some(endpoint) = get(ENV_SEARCH_URL) {
            search = search.with_endpoint(endpoint);
        }

        let tts = match get(ENV_TTS) {
            Some(name) => TtsBackend::parse(&name).unwrap_or_else(|| {
                warn!("[CONFIG] Unknown {}='{}', using default backend", ENV_TTS, name);
                TtsBackend::default()
            }),
            None => TtsBackend::default(),
        };

        Self {
            search,
            tts,
            voice: get(ENV_VOICE),
            font_path: get(ENV_FONT).map(PathBuf::from),
            output: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_empty_environment_is_offline() {
        let config = ReelConfig::from_lookup(lookup(&[]));
        assert!(!config.search.has_credential());
        assert_eq!(config.search.endpoint, DEFAULT_SEARCH_URL);
        assert_eq!(config.tts, TtsBackend::Edge);
        assert_eq!(config.output, PathBuf::from(DEFAULT_OUTPUT));
    }

    #[test]
    fn test_blank_key_counts_as_unset() {
        let config = ReelConfig::from_lookup(lookup(&[(ENV_API_KEY, "   ")]));
        assert!(config.search.api_key.is_none());
    }

    #[test]
    fn test_values_are_picked_up() {
        let config = ReelConfig::from_lookup(lookup(&[
            (ENV_API_KEY, "abc123"),
            (ENV_SEARCH_URL, "http://localhost:9000/search"),
            (ENV_TTS, "espeak"),
            (ENV_VOICE, "en-gb"),
            (ENV_FONT, "/tmp/font.ttf"),
        ]));
        assert_eq!(config.search.api_key.as_deref(), Some("abc123"));
        assert_eq!(config.search.endpoint, "http://localhost:9000/search");
        assert_eq!(config.tts, TtsBackend::Espeak);
        assert_eq!(config.voice.as_deref(), Some("en-gb"));
        assert_eq!(config.font_path, Some(PathBuf::from("/tmp/font.ttf")));
    }

    #[test]
    fn test_unknown_backend_falls_back() {
        let config = ReelConfig::from_lookup(lookup(&[(ENV_TTS, "banana")]));
        assert_eq!(config.tts, TtsBackend::default());
    }
}
