//! vmprov 流水线
//!
//! 按固定顺序执行置备步骤（克隆 → 修改硬件 → 创建快照），
//! 失败或取消时按相反顺序回滚已执行的步骤。

pub mod config;
pub mod runner;
pub mod state;
pub mod step;
pub mod steps;

pub use config::{
    HardwareConfig, LocationConfig, PlatformSection, ProvisionConfig, SnapshotConfig,
    SnapshotTarget, TaskConfig, VmConfig,
};
pub use runner::{PipelineRunner, RunReport, StepReport, StepStatus};
pub use state::{PipelineState, TaskWaitPolicy, Ui};
pub use step::{Step, StepAction};
pub use steps::{
    parse_hardware, CloneProgress, CloneVmStep, ConfigureHardwareStep, CreateSnapshotStep,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("会话错误: {0}")]
    Session(String),

    #[error("数据中心解析失败 ({name}): {message}")]
    DatacenterResolution { name: String, message: String },

    #[error("文件夹解析失败 ({name}): {message}")]
    FolderResolution { name: String, message: String },

    #[error("资源池不存在: {path}")]
    ResourcePoolNotFound { path: String },

    #[error("存储不存在 ({name}): {message}")]
    DatastoreNotFound { name: String, message: String },

    #[error("模板不存在 ({path}): {message}")]
    TemplateNotFound { path: String, message: String },

    #[error("目标虚拟机已存在: {path} ({id})")]
    VmAlreadyExists { path: String, id: String },

    #[error("任务提交失败 [{operation}]: {message}")]
    TaskSubmission { operation: String, message: String },

    #[error("克隆任务失败: {0}")]
    CloneTask(String),

    #[error("配置变更任务失败: {0}")]
    ReconfigureTask(String),

    #[error("快照任务失败: {0}")]
    SnapshotTask(String),

    #[error("销毁任务失败: {0}")]
    DestroyTask(String),

    #[error("等待任务超时 [{operation}]: {message}")]
    TaskTimeout { operation: String, message: String },

    #[error("无效的硬件参数 {field}: {value:?}")]
    InvalidHardwareValue { field: &'static str, value: String },

    #[error("流水线状态缺少 {0}")]
    MissingState(&'static str),

    #[error("步骤 {0} 请求中止")]
    Halted(String),

    #[error("流水线已取消 (已完成 {completed} 个步骤)")]
    Cancelled { completed: usize },

    #[error("步骤 {step} 失败: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// 去掉 StepFailed 包装后的原始错误
    pub fn root_cause(&self) -> &PipelineError {
        match self {
            PipelineError::StepFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// 是否为清单对象解析失败
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self.root_cause(),
            PipelineError::DatacenterResolution { .. }
                | PipelineError::FolderResolution { .. }
                | PipelineError::ResourcePoolNotFound { .. }
                | PipelineError::DatastoreNotFound { .. }
                | PipelineError::TemplateNotFound { .. }
                | PipelineError::VmAlreadyExists { .. }
        )
    }
}

impl From<vmprov_platform::PlatformError> for PipelineError {
    fn from(err: vmprov_platform::PlatformError) -> Self {
        PipelineError::Session(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
