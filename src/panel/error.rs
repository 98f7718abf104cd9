//! Panel error types

use thiserror::Error;

/// Panel API error with classification
#[derive(Debug, Error)]
#[error("{message}")]
pub struct PanelError {
    pub kind: PanelErrorKind,
    pub message: String,
}

impl PanelError {
    pub fn new(kind: PanelErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PanelErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(PanelErrorKind::Timeout, message)
    }

    pub fn status(status: u16, body: &str) -> Self {
        let body = body.chars().take(200).collect::<String>();
        Self::new(PanelErrorKind::Status(status), format!("HTTP {status}: {body}"))
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(PanelErrorKind::Decode, message)
    }

    /// Classify a transport-level reqwest failure
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(format!("Request timed out: {err}"))
        } else if err.is_decode() {
            Self::decode(format!("Malformed response body: {err}"))
        } else {
            Self::network(format!("Request failed: {err}"))
        }
    }
}

/// Error classification, used for logging only: every kind maps to the same
/// absent result at the runtime boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelErrorKind {
    /// Connection refused, DNS, TLS
    Network,
    /// Request exceeded the configured timeout
    Timeout,
    /// Non-2xx response
    Status(u16),
    /// Body was not the JSON shape we expected
    Decode,
}

impl PanelErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Status(_) => "status",
            Self::Decode => "decode",
        }
    }
}
