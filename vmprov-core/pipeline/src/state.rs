//! 流水线共享状态
//!
//! 一次置备运行对应一个 [`PipelineState`]：步骤按顺序读写其中的字段，
//! 同一时刻只有一个步骤持有可变引用，因此不需要加锁。

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use vmprov_platform::{ObjectRef, PlatformError, Task, TaskResult, VirtPlatform};

use crate::PipelineError;

/// 用户界面输出
///
/// 只负责输出，流水线不读取任何返回值
pub trait Ui: Send + Sync {
    fn say(&self, message: &str);

    fn error(&self, message: &str);
}

/// 任务等待策略
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskWaitPolicy {
    /// 单次等待的截止时间，None 表示无限等待
    pub deadline: Option<Duration>,

    /// 超时后重新等待同一任务的次数
    pub retries_on_timeout: u32,
}

/// 流水线共享状态
pub struct PipelineState {
    platform: Arc<dyn VirtPlatform>,
    ui: Arc<dyn Ui>,
    cancel: CancellationToken,
    task_policy: TaskWaitPolicy,

    /// 克隆出的新虚拟机
    pub vm: Option<ObjectRef>,

    /// 源模板虚拟机
    pub source_vm: Option<ObjectRef>,

    /// 第一个失败的步骤及其错误
    error: Option<(String, PipelineError)>,

    halted: bool,
    cancelled: bool,
}

impl PipelineState {
    pub fn new(platform: Arc<dyn VirtPlatform>, ui: Arc<dyn Ui>) -> Self {
        Self {
            platform,
            ui,
            cancel: CancellationToken::new(),
            task_policy: TaskWaitPolicy::default(),
            vm: None,
            source_vm: None,
            error: None,
            halted: false,
            cancelled: false,
        }
    }

    /// 使用外部取消令牌（如 Ctrl-C 处理器持有的令牌）
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// 设置任务等待策略
    pub fn with_task_policy(mut self, policy: TaskWaitPolicy) -> Self {
        self.task_policy = policy;
        self
    }

    pub fn platform(&self) -> &dyn VirtPlatform {
        self.platform.as_ref()
    }

    pub fn ui(&self) -> &dyn Ui {
        self.ui.as_ref()
    }

    pub fn task_policy(&self) -> &TaskWaitPolicy {
        &self.task_policy
    }

    /// 取消令牌的副本
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 外部是否请求了取消（尚未被执行器处理）
    pub fn cancellation_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// 执行器在步骤边界处理取消请求后置位
    pub fn mark_cancelled(&mut self) {
        self.cancelled = true;
    }

    pub fn mark_halted(&mut self) {
        self.halted = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// 运行是否以中止或取消结束（回滚条件）
    pub fn ended_abnormally(&self) -> bool {
        self.halted || self.cancelled
    }

    /// 记录错误，只保留第一个；返回是否被记录
    pub fn record_error(&mut self, step: &str, err: PipelineError) -> bool {
        if self.error.is_some() {
            warn!("忽略后续错误 [{}]: {}", step, err);
            return false;
        }
        self.error = Some((step.to_string(), err));
        true
    }

    /// 已记录的第一个错误
    pub fn error(&self) -> Option<&PipelineError> {
        self.error.as_ref().map(|(_, err)| err)
    }

    pub(crate) fn take_error(&mut self) -> Option<(String, PipelineError)> {
        self.error.take()
    }

    /// 按策略等待任务结束
    ///
    /// 超时后重新等待同一任务，重试耗尽时返回最后一次超时错误
    pub async fn wait_for_task(&self, task: &Task) -> std::result::Result<TaskResult, PlatformError> {
        let mut attempt = 0;
        loop {
            match self
                .platform
                .wait_for_task(task, self.task_policy.deadline)
                .await
            {
                Err(err) if err.is_timeout() && attempt < self.task_policy.retries_on_timeout => {
                    attempt += 1;
                    warn!(
                        "等待任务 {} 超时，重新等待 ({}/{})",
                        task.id, attempt, self.task_policy.retries_on_timeout
                    );
                }
                other => return other,
            }
        }
    }
}
