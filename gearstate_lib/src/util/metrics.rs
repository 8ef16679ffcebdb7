use std::collections::HashMap;

use prometheus::{IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry};

use crate::cache::CacheStats;

pub struct Metrics {
    pub registry: Registry,
    pub status: IntGaugeVec,

    pub gateway_events: IntCounterVec,
    pub event_conditions: IntCounterVec,

    pub guilds: IntGaugeVec,
    pub channels: IntGaugeVec,
    pub members: IntGauge,

    pub requests: IntCounterVec,
    pub ratelimit_hits: IntCounterVec,
}

impl Metrics {
    pub fn new(instance: &str) -> prometheus::Result<Self> {
        let mut labels = HashMap::new();
        labels.insert("instance".to_string(), instance.to_string());
        let registry = Registry::new_custom(Some("gearstate".to_string()), Some(labels))?;

        let status = IntGaugeVec::new(Opts::new("status", "Current process status"), &["status"])?;
        registry.register(Box::new(status.clone()))?;

        let gateway_events = IntCounterVec::new(Opts::new("gateway_events", "Applied gateway events"), &["event"])?;
        registry.register(Box::new(gateway_events.clone()))?;

        let event_conditions = IntCounterVec::new(
            Opts::new("event_conditions", "Gateway events that were dropped or only partially applied"),
            &["condition"],
        )?;
        registry.register(Box::new(event_conditions.clone()))?;

        let guilds = IntGaugeVec::new(Opts::new("guilds", "Cached guilds per cache state"), &["state"])?;
        registry.register(Box::new(guilds.clone()))?;

        let channels = IntGaugeVec::new(Opts::new("channels", "Cached channels per index"), &["kind"])?;
        registry.register(Box::new(channels.clone()))?;

        let members = IntGauge::new("members", "Total cached members")?;
        registry.register(Box::new(members.clone()))?;

        let requests = IntCounterVec::new(Opts::new("requests", "Api responses per status code"), &["status"])?;
        registry.register(Box::new(requests.clone()))?;

        let ratelimit_hits = IntCounterVec::new(
            Opts::new("ratelimit_hits", "Requests that had to wait on a rate limit"),
            &["scope"],
        )?;
        registry.register(Box::new(ratelimit_hits.clone()))?;

        Ok(Metrics {
            registry,
            status,
            gateway_events,
            event_conditions,
            guilds,
            channels,
            members,
            requests,
            ratelimit_hits,
        })
    }

    /// Refresh the cache gauges, these are cheap enough to recompute on every scrape
    pub fn observe_cache(&self, stats: &CacheStats) {
        self.guilds.reset();
        for (state, count) in &stats.guilds {
            self.guilds.with_label_values(&[state.name()]).set(*count as i64);
        }
        self.channels.with_label_values(&["guild"]).set(stats.guild_channels as i64);
        self.channels.with_label_values(&["private"]).set(stats.private_channels as i64);
        self.members.set(stats.members as i64);
    }
}
