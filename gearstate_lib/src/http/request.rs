use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::Serialize;

use crate::ratelimit::BucketKey;

/// A single api call, kept around as a whole so it can be sent again on retry
#[derive(Clone, Debug)]
pub struct Request {
    pub method: Method,
    /// Path relative to the api base, e.g. `/channels/123/messages`
    pub path: String,
    pub body: Option<Bytes>,
    /// Shows up in the audit log of the guild
    pub reason: Option<String>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Request {
            method,
            path: path.into(),
            body: None,
            reason: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Request::new(Method::GET, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Request::new(Method::DELETE, path)
    }

    pub fn post_json<T: Serialize>(path: impl Into<String>, body: &T) -> Result<Self, serde_json::Error> {
        Ok(Request::new(Method::POST, path).body(serde_json::to_vec(body)?))
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn bucket_key(&self) -> BucketKey {
        BucketKey::from_route(&self.path)
    }
}

/// What came back from the transport, before any interpretation
#[derive(Clone, Debug)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}
