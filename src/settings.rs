use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::{DEFAULT_SOURCE_LANG, DEFAULT_TARGET_LANG};
use crate::client::api_base;
use crate::utils::app_config_dir;

pub const SETTINGS_FILENAME: &str = "settings.toml";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_API_PREFIX: &str = "/api";
pub const DEFAULT_HISTORY_LIMIT: usize = 10;
/// Overrides `backend_url` for this run only.
pub const ENV_BACKEND_URL: &str = "OPEN_TRANSLATE_BACKEND_URL";

/// User settings persisted in settings.toml.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Backend origin, e.g. an ngrok tunnel in front of the GPU box.
    pub backend_url: String,
    pub api_prefix: String,
    // None means no timeout at all
    pub timeout_secs: Option<u64>,
    // UI language (auto/en/zh-TW)
    pub ui_language: String,
    // Last used pair
    pub source_lang: String,
    pub target_lang: String,
    pub history_limit: usize,
    // Set from ENV_BACKEND_URL; wins over backend_url and is never written back
    #[serde(skip)]
    pub env_backend_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            timeout_secs: None,
            ui_language: "auto".to_string(),
            source_lang: DEFAULT_SOURCE_LANG.to_string(),
            target_lang: DEFAULT_TARGET_LANG.to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            env_backend_url: None,
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        app_config_dir().join(SETTINGS_FILENAME)
    }

    /// Load from the OS config dir, then apply environment overrides.
    pub fn load() -> Self {
        let mut settings = Self::load_from(&Self::config_path()).unwrap_or_else(|e| {
            tracing::info!("using default settings: {:#}", e);
            Self::default()
        });
        settings.apply_env_overrides(|key| std::env::var(key).ok());
        settings
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parse {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Atomic-ish write: temp file then rename.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string(self).context("serialize settings")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let tmp_path = path.with_extension("toml.tmp");
        let mut f = std::fs::File::create(&tmp_path)
            .with_context(|| format!("create {}", tmp_path.display()))?;
        f.write_all(config_str.as_bytes())?;
        f.flush()?;
        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("rename to {}", path.display()))?;
        Ok(())
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BACKEND_URL) {
            let url = url.trim();
            if !url.is_empty() {
                tracing::info!("backend URL overridden by {}: {}", ENV_BACKEND_URL, url);
                self.env_backend_url = Some(url.to_string());
            }
        }
    }

    pub fn effective_backend_url(&self) -> &str {
        if let Some(url) = self.env_backend_url.as_deref() {
            return url;
        }
        let trimmed = self.backend_url.trim();
        if trimmed.is_empty() {
            DEFAULT_BACKEND_URL
        } else {
            trimmed
        }
    }

    /// Base every endpoint path is joined onto.
    pub fn api_base(&self) -> String {
        api_base(self.effective_backend_url(), &self.api_prefix)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn effective_history_limit(&self) -> usize {
        self.history_limit.clamp(1, 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_backend() {
        let s = Settings::default();
        assert_eq!(s.api_base(), "http://localhost:8000/api");
        assert_eq!(s.timeout(), None);
        assert_eq!((s.source_lang.as_str(), s.target_lang.as_str()), ("en", "zh-TW"));
    }

    #[test]
    fn save_then_load_preserves_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILENAME);
        let s = Settings {
            backend_url: "https://abc.ngrok.app".into(),
            timeout_secs: Some(90),
            target_lang: "ja".into(),
            ..Settings::default()
        };
        s.save_to(&path).unwrap();
        assert!(!path.with_extension("toml.tmp").exists());
        assert_eq!(Settings::load_from(&path).unwrap(), s);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILENAME);
        std::fs::write(&path, "backend_url = \"http://gpu:9000\"\n").unwrap();
        let s = Settings::load_from(&path).unwrap();
        assert_eq!(s.api_base(), "http://gpu:9000/api");
        assert_eq!(s.history_limit, DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn env_override_replaces_backend_url() {
        let mut s = Settings::default();
        s.apply_env_overrides(|key| {
            (key == ENV_BACKEND_URL).then(|| " http://10.0.0.5:8000/ ".to_string())
        });
        assert_eq!(s.api_base(), "http://10.0.0.5:8000/api");
        assert_eq!(s.backend_url, DEFAULT_BACKEND_URL);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILENAME);
        s.save_to(&path).unwrap();
        let reloaded = Settings::load_from(&path).unwrap();
        assert_eq!(reloaded.env_backend_url, None);
        assert_eq!(reloaded.api_base(), "http://localhost:8000/api");

        let mut untouched = Settings::default();
        untouched.apply_env_overrides(|_| Some("   ".to_string()));
        assert_eq!(untouched.env_backend_url, None);
    }

    #[test]
    fn blank_url_and_zero_timeout_fall_back() {
        let s = Settings {
            backend_url: "  ".into(),
            timeout_secs: Some(0),
            history_limit: 0,
            ..Settings::default()
        };
        assert_eq!(s.effective_backend_url(), DEFAULT_BACKEND_URL);
        assert_eq!(s.timeout(), None);
        assert_eq!(s.effective_history_limit(), 1);
    }
}
