//! Task group barrier
//!
//! Fans out independent units of work and waits for all of them. Each task
//! reports a [`TaskOutcome`] instead of only logging, so phase completion and
//! per-device results are observable by callers and tests.

use tokio::task::JoinSet;
use tracing::error;

/// Outcome of a single sanitize task.
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    /// Device path the task operated on.
    pub device: String,
    /// Unit identifier, when the task maps to a discovered unit.
    pub unit_id: Option<i32>,
    /// Whether every command the task ran succeeded.
    pub success: bool,
    /// Human-readable summary, including failure detail.
    pub message: String,
}

impl TaskOutcome {
    pub fn succeeded(device: impl Into<String>, unit_id: Option<i32>) -> Self {
        Self {
            device: device.into(),
            unit_id,
            success: true,
            message: "sanitized".to_string(),
        }
    }

    pub fn failed(
        device: impl Into<String>,
        unit_id: Option<i32>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            device: device.into(),
            unit_id,
            success: false,
            message: message.into(),
        }
    }
}

/// Group of concurrently running sanitize tasks forming one phase.
///
/// `wait` is the phase barrier: it returns only once every submitted task has
/// finished, successfully or not. A panicking task is converted into a failed
/// outcome rather than poisoning the phase.
#[derive(Default)]
pub struct TaskGroup {
    tasks: JoinSet<TaskOutcome>,
}

impl TaskGroup {
    pub fn new() -> Self {
        Self {
            tasks: JoinSet::new(),
        }
    }

    /// Number of tasks submitted and not yet reaped.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Submit one unit of work.
    pub fn spawn<F>(&mut self, task: F)
    where
        F: std::future::Future<Output = TaskOutcome> + Send + 'static,
    {
        self.tasks.spawn(task);
    }

    /// Block until every task has finished and collect all outcomes.
    pub async fn wait(mut self) -> Vec<TaskOutcome> {
        let mut outcomes = Vec::with_capacity(self.tasks.len());

        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    error!("sanitize task aborted: {e}");
                    outcomes.push(TaskOutcome::failed(
                        "<unknown>",
                        None,
                        format!("task aborted: {e}"),
                    ));
                }
            }
        }

        outcomes
    }
}
