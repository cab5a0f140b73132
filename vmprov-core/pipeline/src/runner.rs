//! 流水线执行器

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::state::PipelineState;
use crate::step::{Step, StepAction};
use crate::{PipelineError, Result};

/// 流水线执行器
///
/// 严格串行执行步骤：第一个中止（或错误）后不再执行后续步骤，
/// 取消请求只在步骤之间检查。结束后对已执行的步骤逆序调用清理。
pub struct PipelineRunner {
    steps: Vec<Box<dyn Step>>,

    /// 最近一次运行的报告
    last_report: Option<RunReport>,
}

impl PipelineRunner {
    pub fn new(steps: Vec<Box<dyn Step>>) -> Self {
        Self {
            steps,
            last_report: None,
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// 最近一次运行的报告（失败时同样保留）
    pub fn last_report(&self) -> Option<&RunReport> {
        self.last_report.as_ref()
    }

    /// 执行流水线
    ///
    /// 成功返回运行报告；失败返回第一个步骤错误，取消返回
    /// [`PipelineError::Cancelled`]。清理阶段的错误只记录日志。
    pub async fn run(&mut self, state: &mut PipelineState) -> Result<RunReport> {
        let start_time = Instant::now();
        let mut report = RunReport::new();
        let mut executed = 0;
        let total = self.steps.len();

        info!("开始执行流水线: {} 个步骤", total);

        for (index, step) in self.steps.iter_mut().enumerate() {
            if state.cancellation_requested() {
                warn!("收到取消请求，停止执行 (已完成 {} 个步骤)", executed);
                state.mark_cancelled();
                break;
            }

            info!("执行步骤 {}/{}: {}", index + 1, total, step.name());
            executed = index + 1;
            let step_start = Instant::now();

            let (step_report, halt) = match step.run(state).await {
                Ok(StepAction::Continue) => (StepReport::success(index, step.name()), false),
                Ok(StepAction::Skipped) => (StepReport::skipped(index, step.name()), false),
                Ok(StepAction::Halt) => {
                    warn!("步骤 {} 请求中止", step.name());
                    state.record_error(step.name(), PipelineError::Halted(step.name().to_string()));
                    (StepReport::failed(index, step.name(), "中止"), true)
                }
                Err(e) => {
                    error!("步骤 {} 失败: {}", step.name(), e);
                    state.ui().error(&e.to_string());
                    let failed = StepReport::failed(index, step.name(), &e.to_string());
                    state.record_error(step.name(), e);
                    (failed, true)
                }
            };

            report.add_step(step_report.with_duration(step_start.elapsed().as_millis() as u64));

            if halt {
                state.mark_halted();
                break;
            }
        }

        // 逆序清理已执行的步骤
        for step in self.steps[..executed].iter_mut().rev() {
            if let Err(e) = step.cleanup(state).await {
                warn!("步骤 {} 清理失败: {}", step.name(), e);
                state.ui().error(&format!("清理失败 [{}]: {}", step.name(), e));
            }
        }

        report.cancelled = state.is_cancelled();
        report.vm = state.vm.as_ref().map(|vm| vm.name.clone());
        report.duration_ms = start_time.elapsed().as_millis() as u64;

        let outcome = if let Some((step, err)) = state.take_error() {
            report.error = Some(err.to_string());
            Err(PipelineError::StepFailed {
                step,
                source: Box::new(err),
            })
        } else if state.is_cancelled() {
            report.passed = false;
            report.error = Some("已取消".to_string());
            Err(PipelineError::Cancelled {
                completed: executed,
            })
        } else {
            Ok(())
        };

        info!(
            "流水线执行结束: {}/{} 步骤成功, {} 跳过",
            report.passed_count, report.steps_executed, report.skipped_count
        );

        self.last_report = Some(report.clone());
        outcome.map(|_| report)
    }
}

/// 运行报告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// 运行 ID
    pub run_id: String,

    /// 开始时间
    pub started_at: DateTime<Utc>,

    /// 是否成功
    pub passed: bool,

    /// 是否被取消
    pub cancelled: bool,

    /// 已执行步骤数
    pub steps_executed: usize,

    /// 成功步骤数
    pub passed_count: usize,

    /// 跳过步骤数
    pub skipped_count: usize,

    /// 失败步骤数
    pub failed_count: usize,

    /// 总耗时 (毫秒)
    pub duration_ms: u64,

    /// 新虚拟机名称
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vm: Option<String>,

    /// 终止错误
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// 步骤报告
    pub steps: Vec<StepReport>,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            passed: true,
            cancelled: false,
            steps_executed: 0,
            passed_count: 0,
            skipped_count: 0,
            failed_count: 0,
            duration_ms: 0,
            vm: None,
            error: None,
            steps: Vec::new(),
        }
    }

    pub fn add_step(&mut self, step: StepReport) {
        self.steps_executed += 1;

        match step.status {
            StepStatus::Success => self.passed_count += 1,
            StepStatus::Skipped => self.skipped_count += 1,
            StepStatus::Failed => {
                self.failed_count += 1;
                self.passed = false;
            }
        }

        self.steps.push(step);
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_yaml(&self) -> serde_yaml::Result<String> {
        serde_yaml::to_string(self)
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

/// 步骤报告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    /// 步骤索引
    pub step_index: usize,

    /// 步骤名称
    pub name: String,

    /// 执行状态
    pub status: StepStatus,

    /// 错误信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// 执行时长 (毫秒)
    pub duration_ms: u64,
}

impl StepReport {
    pub fn success(index: usize, name: &str) -> Self {
        Self {
            step_index: index,
            name: name.to_string(),
            status: StepStatus::Success,
            error: None,
            duration_ms: 0,
        }
    }

    pub fn skipped(index: usize, name: &str) -> Self {
        Self {
            status: StepStatus::Skipped,
            ..Self::success(index, name)
        }
    }

    pub fn failed(index: usize, name: &str, error: &str) -> Self {
        Self {
            status: StepStatus::Failed,
            error: Some(error.to_string()),
            ..Self::success(index, name)
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

/// 步骤状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// 成功
    Success,
    /// 跳过
    Skipped,
    /// 失败
    Failed,
}
