//! Background Task Execution Implementation

use async_trait::async_trait;
use bridge_traits::{
    background::{BackgroundExecutor, TaskHandler, TaskId, TaskStatus},
    error::{BridgeError, Result},
    time::{Clock, SystemClock},
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

type TaskMap = Arc<RwLock<HashMap<TaskId, TaskInfo>>>;

/// Tokio-based background executor for desktop.
///
/// Each scheduled task runs on its own tokio task. Rescheduling a name
/// cancels the previous timer; a handler that is already running is allowed
/// to finish.
pub struct TokioBackgroundExecutor {
    tasks: TaskMap,
    handlers: Arc<RwLock<HashMap<String, TaskHandler>>>,
    clock: Arc<dyn Clock>,
    generation: AtomicU64,
}

struct TaskInfo {
    generation: u64,
    status: TaskStatus,
    handle: Option<JoinHandle<()>>,
    cancel: Option<oneshot::Sender<()>>,
    last_run: Option<i64>,
    next_run: Option<i64>,
}

impl TaskInfo {
    fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        self.handle.take();
    }
}

impl TokioBackgroundExecutor {
    /// Create a new background executor using the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a background executor with a custom clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
            handlers: Arc::new(RwLock::new(HashMap::new())),
            clock,
            generation: AtomicU64::new(0),
        }
    }

    fn now_millis(clock: &dyn Clock) -> i64 {
        clock.unix_timestamp_millis()
    }

    fn duration_to_millis(duration: Duration) -> i64 {
        duration.as_millis().min(i64::MAX as u128) as i64
    }

    fn schedule_after(clock: &dyn Clock, delay: Duration) -> i64 {
        Self::now_millis(clock).saturating_add(Self::duration_to_millis(delay))
    }

    fn millis_to_duration(millis: i64) -> Duration {
        if millis <= 0 {
            Duration::from_secs(0)
        } else {
            Duration::from_millis(millis as u64)
        }
    }

    async fn handler_for(&self, task_id: &str) -> Option<TaskHandler> {
        let handlers = self.handlers.read().await;
        handlers.get(task_id).cloned()
    }

    /// Apply `update` to the entry of `id` if it still belongs to `generation`.
    async fn update_current<F>(tasks: &TaskMap, id: &TaskId, generation: u64, update: F)
    where
        F: FnOnce(&mut TaskInfo),
    {
        let mut tasks = tasks.write().await;
        if let Some(info) = tasks.get_mut(id) {
            if info.generation == generation {
                update(info);
            }
        }
    }

    async fn run_task(
        tasks: TaskMap,
        id: TaskId,
        generation: u64,
        handler: TaskHandler,
        delay: Duration,
        period: Duration,
        mut cancel_rx: oneshot::Receiver<()>,
        clock: Arc<dyn Clock>,
    ) {
        let mut ticker = interval_at(Instant::now() + delay, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let period_millis = Self::duration_to_millis(period);

        loop {
            tokio::select! {
                _ = &mut cancel_rx => {
                    debug!(task_id = %id.0, "Timer cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    Self::update_current(&tasks, &id, generation, |info| {
                        info.status = TaskStatus::Running;
                    })
                    .await;

                    let result = handler().await;

                    Self::update_current(&tasks, &id, generation, |info| {
                        let now = Self::now_millis(clock.as_ref());
                        info.last_run = Some(now);
                        info.next_run = Some(now.saturating_add(period_millis));
                        info.status = match result {
                            Ok(()) => TaskStatus::Completed,
                            Err(err) => {
                                warn!(task_id = %id.0, error = %err, "Scheduled task failed");
                                TaskStatus::Failed
                            }
                        };
                    })
                    .await;
                }
            }
        }
    }

    /// Time of the last completed run, as Unix milliseconds.
    pub async fn last_run(&self, task_id: &TaskId) -> Option<i64> {
        let tasks = self.tasks.read().await;
        tasks.get(task_id).and_then(|info| info.last_run)
    }
}

impl Default for TokioBackgroundExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TokioBackgroundExecutor {
    fn drop(&mut self) {
        if let Ok(mut tasks) = self.tasks.try_write() {
            for (_, mut info) in tasks.drain() {
                if let Some(handle) = info.handle.take() {
                    handle.abort();
                }
            }
        }
    }
}

#[async_trait]
impl BackgroundExecutor for TokioBackgroundExecutor {
    async fn register_task_handler(&self, task_id: &str, handler: TaskHandler) -> Result<()> {
        let mut handlers = self.handlers.write().await;
        handlers.insert(task_id.to_string(), handler);
        debug!(task_id, "Registered task handler");
        Ok(())
    }

    async fn schedule_task(
        &self,
        task_id: &str,
        delay: Duration,
        period: Duration,
    ) -> Result<TaskId> {
        if period.is_zero() {
            return Err(BridgeError::OperationFailed(format!(
                "Task {} needs a non-zero period",
                task_id
            )));
        }

        let id = TaskId::new(task_id);
        let handler = self.handler_for(task_id).await.ok_or_else(|| {
            BridgeError::OperationFailed(format!("No handler registered for task: {}", task_id))
        })?;

        debug!(
            task_id,
            delay_secs = delay.as_secs(),
            period_secs = period.as_secs(),
            "Scheduling task"
        );

        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let (cancel_tx, cancel_rx) = oneshot::channel();

        // Held until the new entry is in place: one live timer per name.
        let mut tasks = self.tasks.write().await;
        if let Some(mut previous) = tasks.remove(&id) {
            debug!(task_id, "Replacing existing timer");
            previous.stop();
        }

        let handle = tokio::spawn(Self::run_task(
            Arc::clone(&self.tasks),
            id.clone(),
            generation,
            handler,
            delay,
            period,
            cancel_rx,
            Arc::clone(&self.clock),
        ));

        tasks.insert(
            id.clone(),
            TaskInfo {
                generation,
                status: TaskStatus::Scheduled,
                handle: Some(handle),
                cancel: Some(cancel_tx),
                last_run: None,
                next_run: Some(Self::schedule_after(self.clock.as_ref(), delay)),
            },
        );

        Ok(id)
    }

    async fn cancel_task(&self, task_id: &TaskId) -> Result<()> {
        let mut tasks = self.tasks.write().await;
        match tasks.remove(task_id) {
            Some(mut info) => {
                debug!(task_id = %task_id.0, "Cancelling task");
                info.stop();
            }
            None => debug!(task_id = %task_id.0, "Cancel of unknown task ignored"),
        }
        Ok(())
    }

    async fn get_task_status(&self, task_id: &TaskId) -> Result<TaskStatus> {
        let tasks = self.tasks.read().await;
        Ok(tasks
            .get(task_id)
            .map(|info| info.status.clone())
            .unwrap_or(TaskStatus::Cancelled))
    }

    async fn list_tasks(&self) -> Result<Vec<TaskId>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.keys().cloned().collect())
    }

    async fn next_execution_time(&self, task_id: &TaskId) -> Result<Option<Duration>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.get(task_id).and_then(|info| info.next_run).map(|next| {
            let now = Self::now_millis(self.clock.as_ref());
            Self::millis_to_duration(next - now)
        }))
    }
}
