use std::io;

use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, trace, warn};

use gearstate_lib::{ApplyOutcome, Event, EventApplier};

/// Tally of what happened to the events of one feed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FeedSummary {
    pub changed: u64,
    pub suppressed: u64,
    pub conditions: u64,
    pub skipped: u64,
}

impl FeedSummary {
    fn count(&mut self, outcome: &ApplyOutcome) {
        match outcome {
            ApplyOutcome::Changed => self.changed += 1,
            ApplyOutcome::Suppressed => self.suppressed += 1,
            ApplyOutcome::Condition(_) => self.conditions += 1,
        }
    }
}

/// Feed gateway events into the applier, one json object per line, from a file or stdin
pub async fn run(
    applier: &mut EventApplier,
    source: Option<&str>,
    shutdown: &CancellationToken,
) -> io::Result<FeedSummary> {
    match source {
        Some(path) => {
            info!("Reading gateway events from {}", path);
            let file = File::open(path).await?;
            apply_lines(applier, BufReader::new(file), shutdown).await
        }
        None => {
            info!("Reading gateway events from stdin");
            apply_lines(applier, BufReader::new(tokio::io::stdin()), shutdown).await
        }
    }
}

pub async fn apply_lines<R: AsyncBufRead + Unpin>(
    applier: &mut EventApplier,
    reader: R,
    shutdown: &CancellationToken,
) -> io::Result<FeedSummary> {
    let mut summary = FeedSummary::default();
    let mut lines = reader.lines();
    let mut line_number = 0u64;

    loop {
        let line = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!("Shutting down, stopped reading events after line {}", line_number);
                break;
            }
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            break;
        };
        line_number += 1;

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<Event>(line) {
            Ok(event) => {
                let outcome = applier.apply(event);
                trace!("Line {}: {:?}", line_number, outcome);
                summary.count(&outcome);
            }
            Err(e) => {
                // most likely an event we don't cache anything for
                warn!("Skipping line {}, not a usable event: {}", line_number, e);
                summary.skipped += 1;
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gearstate_lib::Cache;
    use twilight_model::id::Id;

    use super::*;

    const FEED: &str = r#"
{"t": "GUILD_CREATE", "d": {"id": "1", "name": "early", "owner_id": "2", "verification_level": 0, "mfa_level": 0}}
{"t": "READY", "d": {"user": {"id": "9", "username": "me"}, "guilds": [{"id": "1", "unavailable": true}]}}
{"t": "MESSAGE_CREATE", "d": {"id": "5", "content": "hi"}}

{"t": "GUILD_CREATE", "d": {"id": "1", "name": "gears", "owner_id": "2", "verification_level": 0, "mfa_level": 0}}
{"t": "CHANNEL_CREATE", "d": {"id": "3", "type": 0, "guild_id": "1", "name": "general"}}
not even json
"#;

    #[tokio::test]
    async fn applies_every_line() {
        let cache = Arc::new(Cache::new());
        let mut applier = EventApplier::new(cache.clone());

        let summary = apply_lines(&mut applier, FEED.as_bytes(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            summary,
            FeedSummary {
                changed: 2,
                suppressed: 1,
                conditions: 1,
                skipped: 2,
            }
        );
        assert_eq!(cache.get_guild(&Id::new(1)).unwrap().name(), "gears");
        assert!(cache.get_channel(&Id::new(3)).is_some());
    }

    #[tokio::test]
    async fn stops_on_shutdown() {
        let mut applier = EventApplier::new(Arc::new(Cache::new()));
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let summary = apply_lines(&mut applier, FEED.as_bytes(), &shutdown).await.unwrap();
        assert_eq!(summary, FeedSummary::default());
    }
}
