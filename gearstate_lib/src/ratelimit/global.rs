use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::ratelimit::{sleep_until, Cancelled};

/// Cooldown shared by every bucket of a single limiter. Once the api reports a global rate limit
/// no request may go out until it has passed, regardless of the bucket it belongs to.
#[derive(Default)]
pub struct GlobalLimiter {
    cooldown_until: Mutex<Option<Instant>>,
}

impl GlobalLimiter {
    pub fn new() -> Self {
        GlobalLimiter::default()
    }

    /// The end of the current cooldown, if one is still active
    pub fn cooldown_until(&self) -> Option<Instant> {
        let now = Instant::now();
        let until = *self.cooldown_until.lock();
        until.filter(|until| *until > now)
    }

    /// Start (or extend) the global cooldown. A shorter cooldown never cuts an active one short.
    pub fn trigger(&self, retry_after: Duration) {
        let until = Instant::now() + retry_after;
        let mut cooldown = self.cooldown_until.lock();
        match *cooldown {
            Some(current) if current >= until => {}
            _ => {
                warn!("Globally rate limited for {:?}", retry_after);
                *cooldown = Some(until);
            }
        }
    }

    /// Wait out the cooldown. Loops since the cooldown can be extended while we sleep.
    /// Returns if we had to wait at all.
    pub async fn wait(&self, cancel: &CancellationToken) -> Result<bool, Cancelled> {
        let mut waited = false;
        while let Some(until) = self.cooldown_until() {
            debug!("Waiting {:?} for the global rate limit to pass", until - Instant::now());
            waited = true;
            sleep_until(until, cancel).await?;
        }
        Ok(waited)
    }
}
