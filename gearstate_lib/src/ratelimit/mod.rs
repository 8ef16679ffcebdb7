use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

pub mod bucket;
pub mod global;
pub mod headers;
pub mod route;

pub use bucket::{Bucket, BucketState, BucketTicket};
pub use global::GlobalLimiter;
pub use headers::RateLimitInfo;
pub use route::BucketKey;

#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
#[error("rate limit wait was cancelled")]
pub struct Cancelled;

/// Admission control for api requests: one bucket per route key plus the shared global cooldown.
/// Buckets are created on first use and live as long as the limiter.
#[derive(Default)]
pub struct RateLimiter {
    buckets: Mutex<HashMap<BucketKey, Arc<Bucket>>>,
    global: GlobalLimiter,
}

impl RateLimiter {
    pub fn new() -> Self {
        RateLimiter::default()
    }

    pub fn global(&self) -> &GlobalLimiter {
        &self.global
    }

    pub fn bucket(&self, key: &BucketKey) -> Arc<Bucket> {
        self.buckets
            .lock()
            .entry(key.clone())
            .or_insert_with(|| {
                trace!("Creating rate limit bucket {}", key);
                Arc::new(Bucket::new(key.clone()))
            })
            .clone()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.lock().len()
    }

    /// Wait until a request may go out on this bucket. Takes the bucket slot first, then waits for
    /// the bucket to reset if it is exhausted, then for the global cooldown. A cancelled wait
    /// gives the slot back without using up a request.
    pub async fn acquire(&self, key: &BucketKey, cancel: &CancellationToken) -> Result<BucketTicket, Cancelled> {
        let bucket = self.bucket(key);

        let mut state = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Cancelled),
            state = bucket.lock() => state,
        };

        let mut waited_on_bucket = false;
        if state.is_exhausted(Instant::now()) {
            if let Some(reset_at) = state.reset_at {
                debug!(
                    "Bucket {} is exhausted, waiting {:?} for it to reset",
                    key,
                    reset_at - Instant::now()
                );
                waited_on_bucket = true;
                sleep_until(reset_at, cancel).await?;
            }
        }

        let waited_on_global = self.global.wait(cancel).await?;

        state.remaining -= 1;

        Ok(BucketTicket {
            key: key.clone(),
            state,
            waited_on_bucket,
            waited_on_global,
        })
    }

    /// Record what the response told us and free the bucket. `None` means the request never got
    /// a response, the bucket state is left as it was.
    pub fn release(&self, mut ticket: BucketTicket, info: Option<&RateLimitInfo>) {
        let info = match info {
            Some(info) => info,
            None => return,
        };

        if info.global {
            match info.retry_after {
                Some(retry_after) => self.global.trigger(retry_after),
                None => warn!("Got a global rate limit on {} without a retry after, ignoring it", ticket.key),
            }
            return;
        }

        let now = Instant::now();
        if let Some(retry_after) = info.retry_after {
            debug!("Bucket {} got rate limited, retrying after {:?}", ticket.key, retry_after);
            ticket.state.remaining = 0;
            ticket.state.reset_at = Some(now + retry_after);
            return;
        }

        if let Some(reset_after) = info.reset_after {
            ticket.state.reset_at = Some(now + reset_after);
        }
        if let Some(remaining) = info.remaining {
            ticket.state.remaining = remaining;
        }
    }

    /// Record a 429. The retry after wins over the reset header, and when neither leaves a wait in
    /// the future `fallback` is used, so a throttled request never goes straight back out.
    /// Global limits hold back every bucket, the others only this one.
    pub fn throttle(&self, mut ticket: BucketTicket, info: &RateLimitInfo, fallback: Duration) {
        let usable = |cooldown: &Duration| !cooldown.is_zero();
        let cooldown = match info.retry_after.filter(usable).or(info.reset_after.filter(usable)) {
            Some(cooldown) => cooldown,
            None => {
                warn!(
                    "Rate limited on {} without a usable cooldown, backing off for {:?}",
                    ticket.key, fallback
                );
                fallback
            }
        };

        if info.global {
            self.global.trigger(cooldown);
        } else {
            debug!("Bucket {} got rate limited, retrying after {:?}", ticket.key, cooldown);
            ticket.state.remaining = 0;
            ticket.state.reset_at = Some(Instant::now() + cooldown);
        }
    }
}

pub(crate) async fn sleep_until(deadline: Instant, cancel: &CancellationToken) -> Result<(), Cancelled> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Cancelled),
        _ = tokio::time::sleep_until(deadline) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(remaining: i64, reset_after: Duration) -> RateLimitInfo {
        RateLimitInfo {
            remaining: Some(remaining),
            reset_after: Some(reset_after),
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_buckets_are_optimistic() {
        let limiter = RateLimiter::new();
        let start = Instant::now();
        let ticket = limiter.acquire(&"/a".into(), &CancellationToken::new()).await.unwrap();
        assert_eq!(Instant::now(), start);
        assert_eq!(ticket.remaining(), 0);
        assert!(!ticket.waited_on_bucket());
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_bucket_waits_for_reset() {
        let limiter = RateLimiter::new();
        let key = BucketKey::from("/channels/1/messages");
        let cancel = CancellationToken::new();
        let start = Instant::now();

        let ticket = limiter.acquire(&key, &cancel).await.unwrap();
        limiter.release(ticket, Some(&info(0, Duration::from_secs(3))));

        let ticket = limiter.acquire(&key, &cancel).await.unwrap();
        assert!(Instant::now() >= start + Duration::from_secs(3));
        assert!(ticket.waited_on_bucket());
        // nothing told us the new count yet
        assert_eq!(ticket.remaining(), -1);
    }

    #[tokio::test(start_paused = true)]
    async fn remaining_tokens_do_not_wait() {
        let limiter = RateLimiter::new();
        let key = BucketKey::from("/guilds/1");
        let cancel = CancellationToken::new();
        let start = Instant::now();

        let ticket = limiter.acquire(&key, &cancel).await.unwrap();
        limiter.release(ticket, Some(&info(5, Duration::from_secs(60))));
        let ticket = limiter.acquire(&key, &cancel).await.unwrap();
        assert_eq!(Instant::now(), start);
        assert_eq!(ticket.remaining(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn release_without_response_keeps_state() {
        let limiter = RateLimiter::new();
        let key = BucketKey::from("/guilds/2");
        let cancel = CancellationToken::new();

        let ticket = limiter.acquire(&key, &cancel).await.unwrap();
        limiter.release(ticket, Some(&info(7, Duration::from_secs(10))));
        let ticket = limiter.acquire(&key, &cancel).await.unwrap();
        limiter.release(ticket, None);

        let state = limiter.bucket(&key).try_state().unwrap();
        assert_eq!(state.remaining, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn route_429_sets_bucket_cooldown() {
        let limiter = RateLimiter::new();
        let key = BucketKey::from("/channels/9/messages");
        let cancel = CancellationToken::new();
        let start = Instant::now();

        let ticket = limiter.acquire(&key, &cancel).await.unwrap();
        limiter.release(
            ticket,
            Some(&RateLimitInfo {
                retry_after: Some(Duration::from_millis(750)),
                ..Default::default()
            }),
        );
        assert_eq!(limiter.global().cooldown_until(), None);

        limiter.acquire(&key, &cancel).await.unwrap();
        assert!(Instant::now() >= start + Duration::from_millis(750));
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_without_usable_cooldown_falls_back() {
        let limiter = RateLimiter::new();
        let key = BucketKey::from("/channels/4/messages");
        let cancel = CancellationToken::new();
        let start = Instant::now();

        // reset already passed
        let ticket = limiter.acquire(&key, &cancel).await.unwrap();
        limiter.throttle(ticket, &info(0, Duration::ZERO), Duration::from_secs(1));
        limiter.acquire(&key, &cancel).await.unwrap();
        assert!(Instant::now() >= start + Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn global_throttle_uses_reset_then_fallback() {
        let limiter = RateLimiter::new();
        let cancel = CancellationToken::new();
        let global = RateLimitInfo {
            global: true,
            reset_after: Some(Duration::from_secs(2)),
            ..Default::default()
        };

        let ticket = limiter.acquire(&"/a".into(), &cancel).await.unwrap();
        limiter.throttle(ticket, &global, Duration::from_secs(1));
        let until = limiter.global().cooldown_until().unwrap();
        assert_eq!(until, Instant::now() + Duration::from_secs(2));

        tokio::time::sleep(Duration::from_secs(3)).await;
        let bare = RateLimitInfo {
            global: true,
            ..Default::default()
        };
        let ticket = limiter.acquire(&"/b".into(), &cancel).await.unwrap();
        limiter.throttle(ticket, &bare, Duration::from_secs(1));
        let until = limiter.global().cooldown_until().unwrap();
        assert_eq!(until, Instant::now() + Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_wait_keeps_the_token() {
        let limiter = Arc::new(RateLimiter::new());
        let key = BucketKey::from("/channels/3/messages");
        let cancel = CancellationToken::new();

        let ticket = limiter.acquire(&key, &cancel).await.unwrap();
        limiter.release(ticket, Some(&info(0, Duration::from_secs(30))));

        let waiter = {
            let limiter = limiter.clone();
            let key = key.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { limiter.acquire(&key, &cancel).await.map(|_| ()) })
        };

        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();
        assert_eq!(waiter.await.unwrap(), Err(Cancelled));

        let state = limiter.bucket(&key).try_state().unwrap();
        assert_eq!(state.remaining, 0);
    }
}
