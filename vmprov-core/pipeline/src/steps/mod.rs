//! 置备步骤
//!
//! - 克隆虚拟机 (CloneVmStep)
//! - 修改虚拟硬件 (ConfigureHardwareStep)
//! - 创建快照 (CreateSnapshotStep)

mod clone_vm;
mod configure_hw;
mod create_snapshot;

pub use clone_vm::{CloneProgress, CloneVmStep};
pub use configure_hw::{parse_hardware, ConfigureHardwareStep};
pub use create_snapshot::CreateSnapshotStep;

use vmprov_platform::PlatformError;

use crate::PipelineError;

/// 提交变更请求失败（任务未创建）
fn submission_error(operation: &str, err: PlatformError) -> PipelineError {
    PipelineError::TaskSubmission {
        operation: operation.to_string(),
        message: err.to_string(),
    }
}

/// 等待任务失败：超时单独归类，其余交给各步骤的错误类型
fn task_error(
    operation: &str,
    err: PlatformError,
    failed: fn(String) -> PipelineError,
) -> PipelineError {
    match err {
        PlatformError::Timeout(message) => PipelineError::TaskTimeout {
            operation: operation.to_string(),
            message,
        },
        PlatformError::TaskFailed(fault) => failed(fault),
        other => failed(other.to_string()),
    }
}
