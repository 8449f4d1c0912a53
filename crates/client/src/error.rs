use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

pub const GENERIC_UPLOAD_FAILURE: &str =
    "Upload failed. Check your network connection and the backend service.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server returned {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Server { status: u16, detail: Option<String> },

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Message suitable for the status line. Prefers the server-supplied
    /// `detail` and falls back to a generic network failure text.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Server {
                detail: Some(detail),
                ..
            } if !detail.trim().is_empty() => redact_secrets(detail),
            _ => GENERIC_UPLOAD_FAILURE.to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            ApiError::Server { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not encode settings: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Could not determine a storage directory")]
    NoStorageDir,
}

static SECRET_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(AIza|sk-)[A-Za-z0-9_\-]{4,}|Bearer\s+\S+").expect("secret pattern is valid")
});

/// Masks API keys and bearer tokens before a string reaches logs or the screen.
pub fn redact_secrets(input: &str) -> String {
    SECRET_PATTERN
        .replace_all(input, |caps: &regex::Captures| {
            if caps[0].starts_with("Bearer") {
                "Bearer [REDACTED]".to_string()
            } else {
                format!("{}[REDACTED]", &caps[1])
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_prefers_server_detail() {
        let err = ApiError::Server {
            status: 400,
            detail: Some("Only PDF files are supported".to_string()),
        };
        assert_eq!(err.user_message(), "Only PDF files are supported");
    }

    #[test]
    fn user_message_falls_back_without_detail() {
        let err = ApiError::Server {
            status: 502,
            detail: None,
        };
        assert_eq!(err.user_message(), GENERIC_UPLOAD_FAILURE);

        let err = ApiError::Decode("bad json".to_string());
        assert_eq!(err.user_message(), GENERIC_UPLOAD_FAILURE);
    }

    #[test]
    fn server_errors_retry_only_when_transient() {
        assert!(ApiError::Server { status: 503, detail: None }.is_retryable());
        assert!(ApiError::Server { status: 429, detail: None }.is_retryable());
        assert!(!ApiError::Server { status: 404, detail: None }.is_retryable());
    }

    #[test]
    fn redacts_keys_and_bearer_tokens() {
        let redacted = redact_secrets("key AIzaSyD-abc123 and sk-proj_999 via Bearer xyz");
        assert_eq!(
            redacted,
            "key AIza[REDACTED] and sk-[REDACTED] via Bearer [REDACTED]"
        );
    }

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(redact_secrets("PDF not found"), "PDF not found");
    }
}
