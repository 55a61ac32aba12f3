use thiserror::Error;

/// Failure surfaced by a `ConnectClient` call.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("authentication failed ({status}): {message}")]
    Auth { status: u16, message: String },

    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response from {endpoint}: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("value cannot be sent as an HTTP header: {0:?}")]
    Header(String),

    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ConnectError {
    /// Build an API error from a non-success body, preferring the JSON
    /// `message` / `error` field when present.
    pub fn from_body(status: u16, body: &str) -> Self {
        ConnectError::Api {
            status,
            message: extract_message(body),
        }
    }
}

pub(crate) fn extract_message(body: &str) -> String {
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error_description", "error"] {
            if let Some(m) = v.get(key).and_then(|m| m.as_str()) {
                return m.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "<empty body>".to_string()
    } else {
        trimmed.to_string()
    }
}
