//! 创建快照步骤

use async_trait::async_trait;
use tracing::info;

use vmprov_platform::SnapshotRequest;

use super::{submission_error, task_error};
use crate::config::SnapshotTarget;
use crate::state::PipelineState;
use crate::step::{Step, StepAction};
use crate::{PipelineError, Result};

/// 创建快照步骤
///
/// 快照包含内存并静默文件系统，描述为空。快照不随回滚删除。
pub struct CreateSnapshotStep {
    create: bool,
    name: String,
    target: SnapshotTarget,
}

impl CreateSnapshotStep {
    pub fn new(create: bool, name: impl Into<String>, target: SnapshotTarget) -> Self {
        Self {
            create,
            name: name.into(),
            target,
        }
    }
}

#[async_trait]
impl Step for CreateSnapshotStep {
    fn name(&self) -> &'static str {
        "create_snapshot"
    }

    async fn run(&mut self, state: &mut PipelineState) -> Result<StepAction> {
        if !self.create {
            return Ok(StepAction::Skipped);
        }

        let vm = match self.target {
            SnapshotTarget::Clone => state.vm.clone().ok_or(PipelineError::MissingState("vm"))?,
            SnapshotTarget::Source => state
                .source_vm
                .clone()
                .ok_or(PipelineError::MissingState("source_vm"))?,
        };

        state.ui().say("创建快照...");
        let req = SnapshotRequest::quiesced_with_memory(self.name.clone());
        let task = state
            .platform()
            .create_snapshot(&vm, &req)
            .await
            .map_err(|e| submission_error("snapshot", e))?;

        state
            .wait_for_task(&task)
            .await
            .map_err(|e| task_error("snapshot", e, PipelineError::SnapshotTask))?;

        info!("快照已创建: {} -> {}", vm.name, self.name);
        state.ui().say("快照创建完成");
        Ok(StepAction::Continue)
    }
}
