//! Bounded polling of asynchronous controller tasks.
//!
//! A poll *timeout* and a *failed job* are different outcomes: a task that
//! reached its end time is [`PollOutcome::Completed`] even when its error
//! flag is set (the failure reason is logged), while a task still running
//! after `max_attempts` fetches is [`PollOutcome::TimedOut`]. Callers decide
//! what each means for their flow.

use std::time::Duration;

use templar_core::{PollSettings, TaskId, TaskStatus};

use crate::api::Controller;
use crate::error::ControllerError;

/// Interval and bound for one kind of task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }
}

impl From<PollSettings> for RetryPolicy {
    fn from(settings: PollSettings) -> Self {
        Self::new(settings.interval(), settings.max_attempts)
    }
}

/// Result of [`poll_task`].
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The task reached a terminal state; inspect `is_error` for the job's
    /// own verdict.
    Completed(TaskStatus),
    /// The task was still running after the last permitted fetch.
    TimedOut { attempts: u32 },
}

impl PollOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, PollOutcome::Completed(_))
    }
}

/// Fetch `task_id` until it completes or `policy.max_attempts` fetches have
/// been made, sleeping `policy.interval` between fetches.
///
/// A failing status fetch is returned as an error immediately.
pub fn poll_task<C: Controller + ?Sized>(
    controller: &C,
    task_id: &TaskId,
    policy: &RetryPolicy,
) -> Result<PollOutcome, ControllerError> {
    for attempt in 1..=policy.max_attempts {
        let status = controller.task_status(task_id)?;
        if status.is_complete() {
            tracing::info!(
                "task {task_id} finished after {attempt} poll(s): {}",
                status.progress.as_deref().unwrap_or("no progress message")
            );
            if status.is_error {
                tracing::warn!(
                    "task {task_id} failed: {}",
                    status
                        .failure_reason
                        .as_deref()
                        .unwrap_or("no failure reason given")
                );
            }
            return Ok(PollOutcome::Completed(status));
        }
        tracing::debug!("task {task_id} still running (poll {attempt}/{})", policy.max_attempts);
        if attempt < policy.max_attempts {
            std::thread::sleep(policy.interval);
        }
    }
    Ok(PollOutcome::TimedOut {
        attempts: policy.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryController;
    use templar_core::ProjectName;

    fn instant(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(Duration::ZERO, max_attempts)
    }

    #[test]
    fn completes_once_end_time_is_set() {
        let controller = MemoryController::new().with_polls_until_complete(3);
        let task = controller.create_project(&ProjectName::from("p")).unwrap();

        let outcome = poll_task(&controller, &task, &instant(5)).unwrap();
        assert!(outcome.is_completed());
        assert_eq!(controller.status_fetches(&task), 3);
    }

    #[test]
    fn times_out_after_exactly_max_attempts() {
        let controller = MemoryController::new().with_polls_until_complete(10);
        let task = controller.create_project(&ProjectName::from("p")).unwrap();

        let outcome = poll_task(&controller, &task, &instant(4)).unwrap();
        assert_eq!(outcome, PollOutcome::TimedOut { attempts: 4 });
        assert_eq!(controller.status_fetches(&task), 4);
    }

    #[test]
    fn failed_job_is_still_completed() {
        let controller = MemoryController::new().with_failing_project("p");
        let task = controller.create_project(&ProjectName::from("p")).unwrap();

        let PollOutcome::Completed(status) = poll_task(&controller, &task, &instant(1)).unwrap()
        else {
            panic!("a failed job must not be reported as a timeout");
        };
        assert!(status.is_error);
        assert!(status.failure_reason.is_some());
    }

    #[test]
    fn unknown_task_is_an_error() {
        let controller = MemoryController::new();
        let err = poll_task(&controller, &TaskId::from("nope"), &instant(3)).unwrap_err();
        assert!(matches!(err, ControllerError::Status { status: 404, .. }));
    }

    #[test]
    fn policy_converts_from_settings() {
        let policy = RetryPolicy::from(PollSettings {
            interval_ms: 250,
            max_attempts: 7,
        });
        assert_eq!(policy, RetryPolicy::new(Duration::from_millis(250), 7));
    }
}
