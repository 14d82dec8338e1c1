use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Body of `POST <base>/translate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextRequest {
    pub text: String,
    pub source_lang: String,
    pub target_lang: String,
}

/// Fields of the multipart `POST <base>/translate-image` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub file_name: String,
    pub bytes: Arc<[u8]>,
    pub source_lang: String,
    pub target_lang: String,
}

/// Response of both translate endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TranslationResult {
    pub translated_text: String,
}

/// Response of `GET <base>/health`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub model_loaded: bool,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Text,
    Image,
}

/// One row of `GET <base>/history`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    #[serde(default)]
    pub source_text: Option<String>,
    #[serde(default)]
    pub image_name: Option<String>,
    #[serde(default)]
    pub translated_text: Option<String>,
    #[serde(default)]
    pub source_lang: Option<String>,
    #[serde(default)]
    pub target_lang: Option<String>,
    #[serde(default)]
    pub translation_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl HistoryEntry {
    pub fn kind(&self) -> EntryKind {
        match self.translation_type.as_deref() {
            Some("image") => EntryKind::Image,
            Some(_) => EntryKind::Text,
            None if self.image_name.is_some() && self.source_text.is_none() => EntryKind::Image,
            None => EntryKind::Text,
        }
    }

    /// `created_at` as `YYYY-MM-DD HH:MM`, or the raw value if it does not parse.
    pub fn created_at_display(&self) -> Option<String> {
        let raw = self.created_at.as_deref()?;
        match raw.parse::<NaiveDateTime>() {
            Ok(ts) => Some(ts.format("%Y-%m-%d %H:%M").to_string()),
            Err(_) => Some(raw.to_string()),
        }
    }
}
