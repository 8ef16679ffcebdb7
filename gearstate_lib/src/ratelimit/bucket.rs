use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::Instant;

use crate::ratelimit::BucketKey;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BucketState {
    /// Requests left in the current window. Goes negative when requests are sent after a reset
    /// before a response has told us the new count.
    pub remaining: i64,
    pub reset_at: Option<Instant>,
}

impl Default for BucketState {
    // unknown buckets are optimistic, the first response fills in the real numbers
    fn default() -> Self {
        BucketState {
            remaining: 1,
            reset_at: None,
        }
    }
}

impl BucketState {
    pub fn is_exhausted(&self, now: Instant) -> bool {
        self.remaining < 1 && self.reset_at.map_or(false, |reset_at| reset_at > now)
    }
}

/// A single rate limit bucket. The state lock doubles as the in-flight slot: it is held from
/// acquiring until the response has been processed, so a bucket only ever has one request out.
pub struct Bucket {
    pub key: BucketKey,
    state: Arc<Mutex<BucketState>>,
}

impl Bucket {
    pub fn new(key: BucketKey) -> Self {
        Bucket {
            key,
            state: Arc::new(Mutex::new(BucketState::default())),
        }
    }

    pub(crate) async fn lock(&self) -> OwnedMutexGuard<BucketState> {
        self.state.clone().lock_owned().await
    }

    /// Current state, or `None` while a request holds the bucket
    pub fn try_state(&self) -> Option<BucketState> {
        self.state.try_lock().ok().map(|state| state.clone())
    }
}

/// Proof of admission for one request. Hand it back through `RateLimiter::release` once the
/// response is in; dropping it frees the bucket without touching its state.
pub struct BucketTicket {
    pub(crate) key: BucketKey,
    pub(crate) state: OwnedMutexGuard<BucketState>,
    pub(crate) waited_on_bucket: bool,
    pub(crate) waited_on_global: bool,
}

impl BucketTicket {
    pub fn key(&self) -> &BucketKey {
        &self.key
    }

    pub fn remaining(&self) -> i64 {
        self.state.remaining
    }

    pub fn waited_on_bucket(&self) -> bool {
        self.waited_on_bucket
    }

    pub fn waited_on_global(&self) -> bool {
        self.waited_on_global
    }
}
