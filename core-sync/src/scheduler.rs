//! Recurring sync timer.

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::background::{BackgroundExecutor, TaskHandler, TaskId};
use core_runtime::config::SyncConfig;
use tracing::{debug, warn};

use crate::error::Result;

/// Owns the single named timer that triggers `sync_now`.
pub struct Scheduler {
    executor: Arc<dyn BackgroundExecutor>,
    task_id: TaskId,
    sync_delay: Duration,
    sync_interval: Duration,
}

impl Scheduler {
    pub fn new(executor: Arc<dyn BackgroundExecutor>, config: &SyncConfig) -> Self {
        Self {
            executor,
            task_id: TaskId::new(config.task_name.clone()),
            sync_delay: config.sync_delay,
            sync_interval: config.sync_interval,
        }
    }

    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Install the callback run on every tick.
    pub async fn register(&self, handler: TaskHandler) -> Result<()> {
        self.executor
            .register_task_handler(self.task_id.as_str(), handler)
            .await?;
        Ok(())
    }

    /// Replace the timer: first tick after `delay`, then every `period`.
    pub async fn arm(&self, delay: Duration, period: Duration) -> Result<()> {
        // At most one live timer per name.
        self.executor.cancel_task(&self.task_id).await?;
        self.executor
            .schedule_task(self.task_id.as_str(), delay, period)
            .await?;
        debug!(task = %self.task_id.as_str(), ?delay, ?period, "Sync timer armed");
        Ok(())
    }

    /// Short delay used after a local write.
    pub async fn arm_after_write(&self) -> Result<()> {
        self.arm(self.sync_delay, self.sync_interval).await
    }

    /// Long delay used once a drive is connected.
    pub async fn arm_periodic(&self) -> Result<()> {
        self.arm(self.sync_interval, self.sync_interval).await
    }

    pub async fn disarm(&self) {
        if let Err(e) = self.executor.cancel_task(&self.task_id).await {
            warn!(error = %e, "Failed to cancel sync timer");
        }
    }
}
