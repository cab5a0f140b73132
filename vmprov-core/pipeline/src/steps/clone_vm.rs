//! 克隆虚拟机步骤
//!
//! 解析数据中心、文件夹、资源池、存储和模板，提交克隆任务并等待完成，
//! 将新虚拟机写入流水线状态。运行以中止或取消结束时，清理阶段销毁新虚拟机。

use async_trait::async_trait;
use tracing::{debug, info, warn};

use vmprov_platform::{resource_pool_path, CloneSpec, ObjectRef, PlatformError};

use super::{submission_error, task_error};
use crate::config::{LocationConfig, VmConfig};
use crate::state::PipelineState;
use crate::step::{Step, StepAction};
use crate::{PipelineError, Result};

/// 克隆进度，决定清理阶段是否需要回滚
#[derive(Debug, Clone, PartialEq)]
pub enum CloneProgress {
    /// 尚未提交克隆任务
    NotStarted,

    /// 克隆任务已提交，但结果未知（等待超时、连接中断或未返回引用）
    ///
    /// 平台可能已经创建了虚拟机，清理时按清单路径查找。
    /// 提交前已确认该路径没有同名虚拟机，找到的只能是本次克隆的产物。
    Submitted { inventory_path: String },

    /// 克隆完成
    Completed { vm: ObjectRef },

    /// 已发起销毁，不再重复回滚
    RolledBack,
}

/// 克隆所需的已解析对象
struct CloneParameters {
    folder: ObjectRef,
    resource_pool: ObjectRef,
    datastore: Option<ObjectRef>,
    source: ObjectRef,
    target_path: String,
}

/// 克隆虚拟机步骤
pub struct CloneVmStep {
    location: LocationConfig,
    vm: VmConfig,
    progress: CloneProgress,
}

impl CloneVmStep {
    pub fn new(location: LocationConfig, vm: VmConfig) -> Self {
        Self {
            location,
            vm,
            progress: CloneProgress::NotStarted,
        }
    }

    pub fn progress(&self) -> &CloneProgress {
        &self.progress
    }

    /// 依次解析克隆参数并确认目标名称未被占用，任何一步失败都不会提交变更请求
    async fn resolve(&self, state: &PipelineState) -> Result<CloneParameters> {
        let platform = state.platform();
        let loc = &self.location;

        let datacenter = platform
            .datacenter_or_default(&loc.datacenter)
            .await
            .map_err(|e| PipelineError::DatacenterResolution {
                name: loc.datacenter.clone(),
                message: e.to_string(),
            })?;
        debug!("数据中心: {} ({})", datacenter.name, datacenter.inventory_path);

        let folder = platform
            .folder_or_default(&datacenter, &loc.folder)
            .await
            .map_err(|e| PipelineError::FolderResolution {
                name: loc.folder.clone(),
                message: e.to_string(),
            })?;
        debug!("文件夹: {} ({})", folder.name, folder.inventory_path);

        let pool_path = resource_pool_path(&datacenter.name, &loc.host, &loc.resource_pool);
        let resource_pool = match platform.resource_pool(&pool_path).await {
            Ok(Some(pool)) => pool,
            Ok(None) => {
                return Err(PipelineError::ResourcePoolNotFound { path: pool_path });
            }
            Err(e) => {
                warn!("查找资源池失败: {}", e);
                return Err(PipelineError::ResourcePoolNotFound { path: pool_path });
            }
        };

        let datastore = match loc.datastore.as_deref().filter(|name| !name.is_empty()) {
            Some(name) => Some(platform.datastore(&datacenter, name).await.map_err(|e| {
                PipelineError::DatastoreNotFound {
                    name: name.to_string(),
                    message: e.to_string(),
                }
            })?),
            None => None,
        };

        let source = platform
            .virtual_machine(&self.vm.template)
            .await
            .map_err(|e| PipelineError::TemplateNotFound {
                path: self.vm.template.clone(),
                message: e.to_string(),
            })?;

        let target_path = format!("{}/{}", folder.inventory_path, self.vm.name);
        match platform.virtual_machine(&target_path).await {
            Ok(existing) => {
                return Err(PipelineError::VmAlreadyExists {
                    path: target_path,
                    id: existing.id,
                });
            }
            Err(PlatformError::NotFound(_)) => {}
            Err(e) => {
                return Err(PipelineError::FolderResolution {
                    name: loc.folder.clone(),
                    message: e.to_string(),
                });
            }
        }

        Ok(CloneParameters {
            folder,
            resource_pool,
            datastore,
            source,
            target_path,
        })
    }

    /// 确定需要销毁的虚拟机
    async fn rollback_target(&self, state: &PipelineState) -> Option<ObjectRef> {
        match &self.progress {
            CloneProgress::NotStarted | CloneProgress::RolledBack => None,
            CloneProgress::Completed { vm } => Some(vm.clone()),
            CloneProgress::Submitted { inventory_path } => {
                match state.platform().virtual_machine(inventory_path).await {
                    Ok(vm) => {
                        info!("找到未完成克隆留下的虚拟机: {}", vm);
                        Some(vm)
                    }
                    Err(e) => {
                        debug!("未找到克隆残留的虚拟机 {}: {}", inventory_path, e);
                        None
                    }
                }
            }
        }
    }
}

#[async_trait]
impl Step for CloneVmStep {
    fn name(&self) -> &'static str {
        "clone_vm"
    }

    async fn run(&mut self, state: &mut PipelineState) -> Result<StepAction> {
        state.ui().say("开始克隆虚拟机...");

        let params = self.resolve(state).await?;

        let spec = CloneSpec::powered_off(&params.resource_pool, params.datastore.as_ref());
        let task = state
            .platform()
            .clone_vm(&params.source, &params.folder, &self.vm.name, &spec)
            .await
            .map_err(|e| submission_error("clone", e))?;

        // 任务已被平台接受，即使等待失败也可能留下虚拟机
        self.progress = CloneProgress::Submitted {
            inventory_path: params.target_path,
        };

        state.ui().say("等待克隆任务完成...");
        let result = match state.wait_for_task(&task).await {
            Ok(result) => result,
            Err(e) => {
                // 任务明确失败时平台不会留下虚拟机
                if matches!(e, PlatformError::TaskFailed(_)) {
                    self.progress = CloneProgress::NotStarted;
                }
                return Err(task_error("clone", e, PipelineError::CloneTask));
            }
        };

        let vm = result.result.ok_or_else(|| {
            PipelineError::CloneTask(format!("任务 {} 未返回新虚拟机引用", task.id))
        })?;

        info!("克隆完成: {}", vm);
        state.vm = Some(vm.clone());
        state.source_vm = Some(params.source);
        self.progress = CloneProgress::Completed { vm };

        Ok(StepAction::Continue)
    }

    async fn cleanup(&mut self, state: &mut PipelineState) -> Result<()> {
        if !state.ended_abnormally() {
            return Ok(());
        }

        let Some(vm) = self.rollback_target(state).await else {
            return Ok(());
        };

        state.ui().say(&format!("销毁虚拟机 {}...", vm.name));
        self.progress = CloneProgress::RolledBack;

        let task = state
            .platform()
            .destroy_vm(&vm)
            .await
            .map_err(|e| PipelineError::DestroyTask(e.to_string()))?;

        state
            .wait_for_task(&task)
            .await
            .map_err(|e| task_error("destroy", e, PipelineError::DestroyTask))?;

        state.ui().say("虚拟机已销毁");
        Ok(())
    }
}
