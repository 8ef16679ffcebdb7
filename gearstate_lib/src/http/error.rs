use std::fmt::{Display, Formatter};

use serde::Deserialize;
use thiserror::Error;

use crate::ratelimit::Cancelled;

/// Errors a caller of the dispatcher can get back. Being rate limited is not one of them, that
/// is handled internally.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("gave up after {attempts} attempts that all hit a bad gateway")]
    RetriesExhausted { attempts: u32 },
    #[error("api responded with {status}: {error}")]
    Api { status: u16, error: ApiError },
    #[error("request was cancelled")]
    Cancelled,
    #[error("failed to deserialize the response body: {0}")]
    Deserialize(#[from] serde_json::Error),
}

impl From<Cancelled> for HttpError {
    fn from(_: Cancelled) -> Self {
        HttpError::Cancelled
    }
}

impl HttpError {
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    #[error("{0}")]
    Other(String),
}

/// Body of a failed api call, decoded when the api sent its usual error object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    Decoded { code: i64, message: String },
    Raw(String),
}

#[derive(Deserialize)]
struct ErrorBody {
    code: i64,
    message: String,
}

impl ApiError {
    pub fn from_body(body: &[u8]) -> Self {
        match serde_json::from_slice::<ErrorBody>(body) {
            Ok(error) => ApiError::Decoded {
                code: error.code,
                message: error.message,
            },
            Err(_) => ApiError::Raw(String::from_utf8_lossy(body).into_owned()),
        }
    }

    pub fn code(&self) -> Option<i64> {
        match self {
            ApiError::Decoded { code, .. } => Some(*code),
            ApiError::Raw(_) => None,
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Decoded { code, message } => write!(f, "{} (code {})", message, code),
            ApiError::Raw(body) if body.is_empty() => write!(f, "<empty body>"),
            ApiError::Raw(body) => write!(f, "{}", body),
        }
    }
}
