pub mod context;
pub mod metrics;

pub use context::{Context, ProcessStatus};
pub use metrics::serve_metrics;
