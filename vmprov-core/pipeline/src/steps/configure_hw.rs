//! 修改虚拟硬件步骤
//!
//! 只提交配置中明确给出的字段；未给出的字段在请求中保持未设置，
//! 平台保留模板的原值。

use async_trait::async_trait;
use tracing::info;

use vmprov_platform::ConfigSpec;

use super::{submission_error, task_error};
use crate::config::HardwareConfig;
use crate::state::PipelineState;
use crate::step::{Step, StepAction};
use crate::{PipelineError, Result};

/// 解析硬件配置字符串
///
/// 空字符串表示不修改；无法解析或不是正数时返回
/// [`PipelineError::InvalidHardwareValue`]
pub fn parse_hardware(cpus: &str, memory: &str) -> Result<ConfigSpec> {
    let mut spec = ConfigSpec::default();

    if !cpus.is_empty() {
        let value = cpus
            .parse::<i32>()
            .ok()
            .filter(|v| *v > 0)
            .ok_or_else(|| PipelineError::InvalidHardwareValue {
                field: "cpus",
                value: cpus.to_string(),
            })?;
        spec.num_cpus = Some(value);
    }

    if !memory.is_empty() {
        let value = memory
            .parse::<i64>()
            .ok()
            .filter(|v| *v > 0)
            .ok_or_else(|| PipelineError::InvalidHardwareValue {
                field: "memory",
                value: memory.to_string(),
            })?;
        spec.memory_mb = Some(value);
    }

    Ok(spec)
}

/// 修改虚拟硬件步骤
pub struct ConfigureHardwareStep {
    hardware: HardwareConfig,
}

impl ConfigureHardwareStep {
    pub fn new(hardware: HardwareConfig) -> Self {
        Self { hardware }
    }
}

#[async_trait]
impl Step for ConfigureHardwareStep {
    fn name(&self) -> &'static str {
        "configure_hw"
    }

    async fn run(&mut self, state: &mut PipelineState) -> Result<StepAction> {
        let spec = parse_hardware(&self.hardware.cpus, &self.hardware.memory)?;

        if spec.is_empty() {
            state.ui().say("跳过虚拟硬件配置...");
            return Ok(StepAction::Skipped);
        }

        let vm = state.vm.clone().ok_or(PipelineError::MissingState("vm"))?;

        state.ui().say("配置虚拟硬件...");
        let task = state
            .platform()
            .reconfigure_vm(&vm, &spec)
            .await
            .map_err(|e| submission_error("reconfigure", e))?;

        state
            .wait_for_task(&task)
            .await
            .map_err(|e| task_error("reconfigure", e, PipelineError::ReconfigureTask))?;

        info!(
            "虚拟硬件已更新: {}, CPU: {:?}, 内存: {:?} MB",
            vm.name, spec.num_cpus, spec.memory_mb
        );
        Ok(StepAction::Continue)
    }
}
