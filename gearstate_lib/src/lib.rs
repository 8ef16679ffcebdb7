//! Rate limit aware request dispatching and an event sourced cache for a chat platform api.
//!
//! [`http::Dispatcher`] sends requests through a [`ratelimit::RateLimiter`], [`events::EventApplier`]
//! folds gateway events into a [`cache::Cache`] that can be read from anywhere.

pub mod cache;
pub mod events;
pub mod http;
pub mod model;
pub mod ratelimit;
pub mod util;

pub use cache::Cache;
pub use events::{ApplyOutcome, Condition, Event, EventApplier};
pub use http::{Dispatcher, HttpError};
