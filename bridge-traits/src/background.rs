//! Background Execution and Task Scheduling
//!
//! Provides named, replaceable periodic timers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::Result;

/// Callback run every time a scheduled task fires.
pub type TaskHandler = Arc<dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Scheduled task identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Task execution status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// Task is scheduled but not yet running
    Scheduled,
    /// Task is currently executing
    Running,
    /// Last run completed successfully
    Completed,
    /// Last run failed
    Failed,
    /// Task was cancelled
    Cancelled,
}

/// Background task executor trait
///
/// Abstracts the host's timer facility. A task is identified by name; the
/// handler registered under that name is invoked first after `delay` and then
/// every `period` until the task is cancelled.
///
/// Scheduling a task whose name is already scheduled replaces the existing
/// timer, so a name never has more than one live timer.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::background::BackgroundExecutor;
/// use std::time::Duration;
///
/// async fn schedule_sync(executor: &dyn BackgroundExecutor) -> Result<()> {
///     executor
///         .schedule_task("syncNow", Duration::from_secs(60), Duration::from_secs(1800))
///         .await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait BackgroundExecutor: Send + Sync {
    /// Register the handler invoked when the named task fires.
    ///
    /// Registering again under the same name replaces the previous handler.
    async fn register_task_handler(&self, task_id: &str, handler: TaskHandler) -> Result<()>;

    /// Schedule (or reschedule) a recurring task.
    ///
    /// # Arguments
    ///
    /// * `task_id` - Name of the task; must have a registered handler
    /// * `delay` - Time until the first run
    /// * `period` - Time between subsequent runs
    async fn schedule_task(&self, task_id: &str, delay: Duration, period: Duration)
        -> Result<TaskId>;

    /// Cancel a scheduled task. Cancelling an unknown task is not an error.
    async fn cancel_task(&self, task_id: &TaskId) -> Result<()>;

    /// Get status of a task
    async fn get_task_status(&self, task_id: &TaskId) -> Result<TaskStatus>;

    /// List all scheduled tasks
    async fn list_tasks(&self) -> Result<Vec<TaskId>>;

    /// Get estimated time until next execution
    ///
    /// Returns `None` if the information is not available.
    async fn next_execution_time(&self, task_id: &TaskId) -> Result<Option<Duration>>;
}
