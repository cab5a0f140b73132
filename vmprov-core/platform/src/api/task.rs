//! 任务跟踪 API
//!
//! 平台上的变更操作都是异步任务：提交后立即返回任务 ID，
//! 通过轮询任务状态等待其成功或失败。

use std::time::Duration;

use reqwest::Method;
use tracing::{debug, info, warn};

use crate::client::PlatformClient;
use crate::error::{PlatformError, Result};
use crate::models::{Task, TaskInfo, TaskResult, TaskState};

/// 任务跟踪 API
pub struct TaskApi<'a> {
    client: &'a PlatformClient,
}

impl<'a> TaskApi<'a> {
    pub(crate) fn new(client: &'a PlatformClient) -> Self {
        Self { client }
    }

    /// 获取任务详情
    pub async fn get(&self, task_id: &str) -> Result<TaskInfo> {
        debug!("获取任务状态: {}", task_id);
        self.client
            .request(
                Method::GET,
                &format!("/api/v1/task/{}", task_id),
                None::<()>,
            )
            .await
    }

    /// 等待任务结束
    ///
    /// `deadline` 为 None 时无限等待；超时返回 [`PlatformError::Timeout`]，
    /// 任务本身不会被取消。
    pub async fn wait_for_result(&self, task: &Task, deadline: Option<Duration>) -> Result<TaskResult> {
        info!("等待任务完成: {} ({})", task.id, task.operation);

        match deadline {
            Some(limit) => tokio::time::timeout(limit, self.poll_until_done(task))
                .await
                .map_err(|_| {
                    warn!("等待任务超时: {} ({:?})", task.id, limit);
                    PlatformError::Timeout(format!("任务 {} 在 {:?} 内未完成", task.id, limit))
                })?,
            None => self.poll_until_done(task).await,
        }
    }

    async fn poll_until_done(&self, task: &Task) -> Result<TaskResult> {
        let interval = Duration::from_millis(self.client.config().task_poll_interval_ms);
        loop {
            let info = self.get(&task.id).await?;
            if let Some(outcome) = task_outcome(info) {
                return outcome;
            }
            tokio::time::sleep(interval).await;
        }
    }
}

/// 将任务详情转换为最终结果，未结束时返回 None
pub fn task_outcome(info: TaskInfo) -> Option<Result<TaskResult>> {
    if !info.state.is_terminal() {
        return None;
    }

    if info.state == TaskState::Success {
        Some(Ok(TaskResult {
            result: info.result,
        }))
    } else {
        Some(Err(PlatformError::TaskFailed(
            info.fault.unwrap_or_else(|| format!("任务 {} 失败", info.id)),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ObjectKind, ObjectRef};

    fn info(state: TaskState) -> TaskInfo {
        TaskInfo {
            id: "task-1".to_string(),
            state,
            progress: None,
            result: None,
            fault: None,
        }
    }

    #[test]
    fn test_running_task_has_no_outcome() {
        assert!(task_outcome(info(TaskState::Queued)).is_none());
        assert!(task_outcome(info(TaskState::Running)).is_none());
    }

    #[test]
    fn test_successful_task_carries_result() {
        let mut done = info(TaskState::Success);
        done.result = Some(ObjectRef::new(ObjectKind::VirtualMachine, "vm-7", "worker-01"));

        let result = task_outcome(done).unwrap().unwrap();
        assert_eq!(result.result.unwrap().id, "vm-7");
    }

    #[test]
    fn test_failed_task_carries_fault() {
        let mut failed = info(TaskState::Error);
        failed.fault = Some("InsufficientResourcesFault".to_string());

        let err = task_outcome(failed).unwrap().unwrap_err();
        assert_eq!(
            err,
            PlatformError::TaskFailed("InsufficientResourcesFault".to_string())
        );
    }

    #[test]
    fn test_failed_task_without_fault() {
        let err = task_outcome(info(TaskState::Error)).unwrap().unwrap_err();
        assert!(matches!(err, PlatformError::TaskFailed(msg) if msg.contains("task-1")));
    }
}
