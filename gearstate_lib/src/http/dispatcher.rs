use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

use crate::http::{ApiError, HttpError, Request, Transport};
use crate::ratelimit::{BucketKey, RateLimitInfo, RateLimiter};
use crate::util::metrics::Metrics;

/// Cooldown for a 429 that didn't tell us how long to back off
const FALLBACK_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Runs requests through the rate limiter and the transport, retrying what is safe to retry.
pub struct Dispatcher<T> {
    transport: T,
    limiter: RateLimiter,
    max_retries: u32,
    metrics: Option<Arc<Metrics>>,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: T, max_retries: u32) -> Self {
        Dispatcher {
            transport,
            limiter: RateLimiter::new(),
            max_retries,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Same as `execute`, with the bucket derived from the request path
    pub async fn request(&self, request: &Request, cancel: &CancellationToken) -> Result<Bytes, HttpError> {
        self.execute(&request.bucket_key(), request, cancel).await
    }

    pub async fn execute_json<R: DeserializeOwned>(
        &self,
        bucket: &BucketKey,
        request: &Request,
        cancel: &CancellationToken,
    ) -> Result<R, HttpError> {
        let body = self.execute(bucket, request, cancel).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Execute one logical request. Rate limited responses are retried until they go through
    /// (they don't count towards the retry budget), bad gateways are retried up to `max_retries`
    /// times, everything else is returned to the caller as is.
    pub async fn execute(
        &self,
        bucket: &BucketKey,
        request: &Request,
        cancel: &CancellationToken,
    ) -> Result<Bytes, HttpError> {
        let mut attempts: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(HttpError::Cancelled);
            }

            let ticket = self.limiter.acquire(bucket, cancel).await?;
            self.count_waits(ticket.waited_on_bucket(), ticket.waited_on_global());

            let response = match self.transport.send(request).await {
                Ok(response) => response,
                Err(e) => {
                    self.limiter.release(ticket, None);
                    error!("{} {} failed to send: {}", request.method, request.path, e);
                    return Err(e.into());
                }
            };

            let info = RateLimitInfo::from_headers(&response.headers);
            let status = response.status;
            self.count_status(status);

            match status {
                200..=299 => {
                    self.limiter.release(ticket, Some(&info));
                    trace!("{} {} => {}", request.method, request.path, status);
                    return Ok(response.body);
                }
                429 => {
                    debug!("Rate limited on {} (global: {}), retrying", bucket, info.global);
                    self.limiter.throttle(ticket, &info, FALLBACK_RETRY_AFTER);
                }
                502 => {
                    self.limiter.release(ticket, Some(&info));
                    attempts += 1;
                    if attempts > self.max_retries {
                        error!(
                            "{} {} kept hitting bad gateways, giving up after {} attempts",
                            request.method, request.path, attempts
                        );
                        return Err(HttpError::RetriesExhausted { attempts });
                    }
                    warn!(
                        "Bad gateway on {} {}, retrying ({}/{})",
                        request.method, request.path, attempts, self.max_retries
                    );
                }
                _ => {
                    self.limiter.release(ticket, Some(&info));
                    return Err(HttpError::Api {
                        status,
                        error: ApiError::from_body(&response.body),
                    });
                }
            }
        }
    }

    fn count_status(&self, status: u16) {
        if let Some(metrics) = &self.metrics {
            metrics.requests.with_label_values(&[&status.to_string()]).inc();
        }
    }

    fn count_waits(&self, bucket: bool, global: bool) {
        if let Some(metrics) = &self.metrics {
            if bucket {
                metrics.ratelimit_hits.with_label_values(&["bucket"]).inc();
            }
            if global {
                metrics.ratelimit_hits.with_label_values(&["global"]).inc();
            }
        }
    }
}
