use thiserror::Error;

/// Why a backend call failed. The view picks the wording per variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    /// No HTTP status was received (connect/DNS failure, timeout, broken body).
    #[error("backend unreachable: {0}")]
    Unreachable(String),
    /// The backend answered with a non-2xx status.
    #[error("backend rejected the request (HTTP {status}): {detail}")]
    Rejected { status: u16, detail: String },
    /// 2xx, but the body was not `{"translated_text": "..."}`.
    #[error("malformed backend response: {0}")]
    MalformedResponse(String),
    /// The request could not be built locally.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

pub type TranslateResult<T> = std::result::Result<T, TranslateError>;

impl TranslateError {
    /// Fluent message id for the user-facing notice.
    pub fn notice_id(&self) -> &'static str {
        match self {
            TranslateError::Unreachable(_) => "notice-unreachable",
            TranslateError::Rejected { .. } => "notice-rejected",
            TranslateError::MalformedResponse(_) => "notice-malformed",
            TranslateError::InvalidRequest(_) => "notice-invalid-request",
        }
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> TranslateError {
    if err.is_timeout() {
        return TranslateError::Unreachable("request timed out".to_string());
    }
    if err.is_connect() {
        return TranslateError::Unreachable(format!("failed to connect: {}", err));
    }
    if err.is_builder() {
        return TranslateError::InvalidRequest(err.to_string());
    }
    if let Some(status) = err.status() {
        return TranslateError::Rejected {
            status: status.as_u16(),
            detail: err.to_string(),
        };
    }
    TranslateError::Unreachable(format!("HTTP request failed: {}", err))
}
