use std::sync::Arc;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use gearstate_lib::http::{Dispatcher, ReqwestTransport};
use gearstate_lib::util::metrics::Metrics;
use gearstate_lib::Cache;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProcessStatus {
    Starting,
    Running,
    Terminating,
}

impl ProcessStatus {
    pub fn name(&self) -> &'static str {
        match self {
            ProcessStatus::Starting => "STARTING",
            ProcessStatus::Running => "RUNNING",
            ProcessStatus::Terminating => "TERMINATING",
        }
    }
}

/// Everything the different parts of the process share
pub struct Context {
    pub cache: Arc<Cache>,
    pub dispatcher: Dispatcher<ReqwestTransport>,
    pub metrics: Arc<Metrics>,

    status: RwLock<ProcessStatus>,
    // cancelled once we start shutting down, aborts pending rate limit waits
    pub shutdown: CancellationToken,

    //uuid used to identify this instance
    pub uuid: Uuid,
}

impl Context {
    pub fn new(
        cache: Arc<Cache>,
        dispatcher: Dispatcher<ReqwestTransport>,
        metrics: Arc<Metrics>,
        uuid: Uuid,
    ) -> Self {
        metrics
            .status
            .with_label_values(&[ProcessStatus::Starting.name()])
            .set(1);
        Context {
            cache,
            dispatcher,
            metrics,
            status: RwLock::new(ProcessStatus::Starting),
            shutdown: CancellationToken::new(),
            uuid,
        }
    }

    pub fn set_status(&self, new_status: ProcessStatus) {
        // get lock
        let mut status = self.status.write();

        info!("Status change: {} => {}", status.name(), new_status.name());

        // update metrics
        self.metrics.status.reset();
        self.metrics.status.with_label_values(&[new_status.name()]).set(1);

        //store new status
        *status = new_status;
    }

    pub fn is_status(&self, status: ProcessStatus) -> bool {
        *self.status.read() == status
    }

    pub fn shutdown(&self) {
        if self.is_status(ProcessStatus::Terminating) {
            return;
        }
        info!("Shutdown initiated...");
        self.set_status(ProcessStatus::Terminating);
        self.shutdown.cancel();
    }
}
