use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use std::time::{Duration, Instant};

mod error;
mod types;

pub use error::{TranslateError, TranslateResult};
pub use types::{
    EntryKind, HealthStatus, HistoryEntry, ImageRequest, TextRequest, TranslationResult,
};

const USER_AGENT_VALUE: &str = concat!("open-translate/", env!("CARGO_PKG_VERSION"));
const TRANSLATE_PATH: &str = "translate";
const TRANSLATE_IMAGE_PATH: &str = "translate-image";
const HEALTH_PATH: &str = "health";
const HISTORY_PATH: &str = "history";
const MAX_ERROR_BODY_PREVIEW: usize = 300;

/// The two calls the view/state controller needs from a backend.
pub trait TranslateBackend: Send + Sync {
    fn translate_text(&self, request: &TextRequest) -> TranslateResult<TranslationResult>;
    fn translate_image(&self, request: &ImageRequest) -> TranslateResult<TranslationResult>;
}

/// Backend reached over HTTP at `<backend_url><api_prefix>`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base: String,
}

impl HttpBackend {
    /// `timeout` of `None` waits as long as the backend takes; the blocking
    /// client would otherwise cut requests off at 30 s.
    pub fn new(base: &str, timeout: Option<Duration>) -> TranslateResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| TranslateError::InvalidRequest(format!("create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn health(&self) -> TranslateResult<HealthStatus> {
        let url = join_url(&self.base, HEALTH_PATH);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(error::map_reqwest_error)?;
        read_json(response)
    }

    /// Most recent backend log rows, newest first.
    pub fn history(&self, limit: usize) -> TranslateResult<Vec<HistoryEntry>> {
        let url = join_url(&self.base, HISTORY_PATH);
        let response = self
            .client
            .get(&url)
            .query(&[("limit", limit)])
            .send()
            .map_err(error::map_reqwest_error)?;
        read_json(response)
    }
}

impl TranslateBackend for HttpBackend {
    fn translate_text(&self, request: &TextRequest) -> TranslateResult<TranslationResult> {
        let url = join_url(&self.base, TRANSLATE_PATH);
        tracing::info!(
            "POST {} ({} -> {}, {} chars)",
            url,
            request.source_lang,
            request.target_lang,
            request.text.chars().count()
        );
        let start = Instant::now();
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .map_err(error::map_reqwest_error)?;
        let result = read_json(response);
        tracing::debug!("text translation finished in {} ms", start.elapsed().as_millis());
        result
    }

    fn translate_image(&self, request: &ImageRequest) -> TranslateResult<TranslationResult> {
        let url = join_url(&self.base, TRANSLATE_IMAGE_PATH);
        tracing::info!(
            "POST {} ({} -> {}, {} '{}' bytes)",
            url,
            request.source_lang,
            request.target_lang,
            request.bytes.len(),
            request.file_name
        );
        let file = Part::bytes(request.bytes.to_vec())
            .file_name(request.file_name.clone())
            .mime_str(guess_mime(&request.file_name))
            .map_err(|e| TranslateError::InvalidRequest(e.to_string()))?;
        let form = Form::new()
            .part("file", file)
            .text("source_lang", request.source_lang.clone())
            .text("target_lang", request.target_lang.clone());
        let start = Instant::now();
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .map_err(error::map_reqwest_error)?;
        let result = read_json(response);
        tracing::debug!(
            "image translation finished in {} ms",
            start.elapsed().as_millis()
        );
        result
    }
}

/// `<backend_url>` + `<api_prefix>` with exactly one slash between them.
pub fn api_base(backend_url: &str, api_prefix: &str) -> String {
    let origin = backend_url.trim().trim_end_matches('/');
    let prefix = api_prefix.trim().trim_matches('/');
    if prefix.is_empty() {
        origin.to_string()
    } else {
        format!("{}/{}", origin, prefix)
    }
}

fn join_url(base: &str, path: &str) -> String {
    let mut joined = base.trim_end_matches('/').to_string();
    joined.push('/');
    joined.push_str(path.trim_start_matches('/'));
    joined
}

fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> TranslateResult<T> {
    let status = response.status();
    let body = response.text().map_err(error::map_reqwest_error)?;
    if !status.is_success() {
        return Err(TranslateError::Rejected {
            status: status.as_u16(),
            detail: rejection_detail(&body),
        });
    }
    parse_body(&body)
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &str) -> TranslateResult<T> {
    serde_json::from_str(body).map_err(|e| {
        TranslateError::MalformedResponse(format!("{} (body: {})", e, preview_body(body)))
    })
}

/// FastAPI error bodies look like `{"detail": "..."}`.
fn rejection_detail(body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        match map.get("detail") {
            Some(Value::String(s)) => return preview_body(s),
            Some(other) => return preview_body(&other.to_string()),
            None => {}
        }
    }
    preview_body(body)
}

fn preview_body(body: &str) -> String {
    let mut out = String::new();
    let mut truncated = false;
    for (count, ch) in body.chars().enumerate() {
        if count >= MAX_ERROR_BODY_PREVIEW {
            truncated = true;
            break;
        }
        out.push(ch);
    }
    let trimmed = out.trim();
    if truncated {
        format!("{}…", trimmed)
    } else {
        trimmed.to_string()
    }
}

fn guess_mime(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}
