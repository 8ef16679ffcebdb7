use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use tracing::trace;

use crate::http::{Request, TransportError, TransportResponse};

const AUDIT_LOG_REASON: &str = "x-audit-log-reason";

/// Sends a request over the wire. Knows nothing about rate limits or retries.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &Request) -> Result<TransportResponse, TransportError>;
}

pub struct ReqwestTransport {
    client: Client,
    base: String,
}

impl ReqwestTransport {
    pub fn new(base: &str, token: Option<&str>, timeout: Duration) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bot {}", token))
                .map_err(|_| TransportError::InvalidHeader("token contains invalid characters".to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("DiscordBot (gearstate, ", env!("CARGO_PKG_VERSION"), ")")),
        );

        let client = Client::builder().timeout(timeout).default_headers(headers).build()?;

        Ok(ReqwestTransport {
            client,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base, path)
        } else {
            format!("{}/{}", self.base, path)
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &Request) -> Result<TransportResponse, TransportError> {
        let url = self.url(&request.path);
        trace!("{} {}", request.method, url);

        let mut builder = self.client.request(request.method.clone(), url);
        if let Some(body) = &request.body {
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(body.clone());
        }
        if let Some(reason) = &request.reason {
            let value = HeaderValue::from_str(reason)
                .map_err(|_| TransportError::InvalidHeader(format!("audit log reason {:?}", reason)))?;
            builder = builder.header(AUDIT_LOG_REASON, value);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(TransportResponse { status, headers, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_urls() {
        let transport = ReqwestTransport::new("https://example.com/api/v10/", None, Duration::from_secs(1)).unwrap();
        assert_eq!(transport.url("/users/@me"), "https://example.com/api/v10/users/@me");
        assert_eq!(transport.url("gateway"), "https://example.com/api/v10/gateway");
    }

    #[test]
    fn rejects_broken_tokens() {
        let result = ReqwestTransport::new("https://example.com", Some("bad\ntoken"), Duration::from_secs(1));
        assert!(matches!(result, Err(TransportError::InvalidHeader(_))));
    }
}
