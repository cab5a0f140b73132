//! 步骤抽象接口

use async_trait::async_trait;

use crate::state::PipelineState;
use crate::Result;

/// 步骤执行结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    /// 完成，继续下一步
    Continue,

    /// 无事可做，继续下一步
    Skipped,

    /// 停止流水线
    Halt,
}

/// 流水线步骤
///
/// 执行器按顺序调用 `run`，结束后对已执行的步骤逆序调用 `cleanup`。
/// `cleanup` 不能假设 `run` 已完整执行。
#[async_trait]
pub trait Step: Send {
    /// 步骤名称
    fn name(&self) -> &'static str;

    /// 执行步骤，返回错误等同于中止
    async fn run(&mut self, state: &mut PipelineState) -> Result<StepAction>;

    /// 回滚步骤产生的副作用，错误只记录不上抛
    async fn cleanup(&mut self, _state: &mut PipelineState) -> Result<()> {
        Ok(())
    }
}
