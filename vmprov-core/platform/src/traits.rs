//! 平台能力接口
//!
//! 流水线步骤只依赖这个 trait，不直接依赖 HTTP 客户端，
//! 便于在测试中替换为内存实现。

use std::time::Duration;

use async_trait::async_trait;

use crate::client::PlatformClient;
use crate::error::Result;
use crate::models::{CloneSpec, ConfigSpec, ObjectKind, ObjectRef, SnapshotRequest, Task, TaskResult};

/// 虚拟化平台能力
#[async_trait]
pub trait VirtPlatform: Send + Sync {
    /// 查找数据中心（名称为空时使用默认值）
    async fn datacenter_or_default(&self, name: &str) -> Result<ObjectRef>;

    /// 查找文件夹（名称为空时使用默认值）
    async fn folder_or_default(&self, datacenter: &ObjectRef, name: &str) -> Result<ObjectRef>;

    /// 按清单路径查找资源池，空结果返回 None
    async fn resource_pool(&self, path: &str) -> Result<Option<ObjectRef>>;

    /// 按名称查找存储
    async fn datastore(&self, datacenter: &ObjectRef, name: &str) -> Result<ObjectRef>;

    /// 按清单路径查找虚拟机
    async fn virtual_machine(&self, path: &str) -> Result<ObjectRef>;

    /// 提交克隆请求
    async fn clone_vm(
        &self,
        source: &ObjectRef,
        folder: &ObjectRef,
        name: &str,
        spec: &CloneSpec,
    ) -> Result<Task>;

    /// 提交配置变更请求
    async fn reconfigure_vm(&self, vm: &ObjectRef, spec: &ConfigSpec) -> Result<Task>;

    /// 提交创建快照请求
    async fn create_snapshot(&self, vm: &ObjectRef, req: &SnapshotRequest) -> Result<Task>;

    /// 提交销毁请求
    async fn destroy_vm(&self, vm: &ObjectRef) -> Result<Task>;

    /// 等待任务结束
    async fn wait_for_task(&self, task: &Task, deadline: Option<Duration>) -> Result<TaskResult>;
}

#[async_trait]
impl VirtPlatform for PlatformClient {
    async fn datacenter_or_default(&self, name: &str) -> Result<ObjectRef> {
        self.inventory().datacenter_or_default(name).await
    }

    async fn folder_or_default(&self, datacenter: &ObjectRef, name: &str) -> Result<ObjectRef> {
        self.inventory().folder_or_default(datacenter, name).await
    }

    async fn resource_pool(&self, path: &str) -> Result<Option<ObjectRef>> {
        self.inventory()
            .find_by_path(ObjectKind::ResourcePool, path)
            .await
    }

    async fn datastore(&self, datacenter: &ObjectRef, name: &str) -> Result<ObjectRef> {
        self.inventory().datastore(datacenter, name).await
    }

    async fn virtual_machine(&self, path: &str) -> Result<ObjectRef> {
        self.inventory().virtual_machine(path).await
    }

    async fn clone_vm(
        &self,
        source: &ObjectRef,
        folder: &ObjectRef,
        name: &str,
        spec: &CloneSpec,
    ) -> Result<Task> {
        self.vm().clone(source, folder, name, spec).await
    }

    async fn reconfigure_vm(&self, vm: &ObjectRef, spec: &ConfigSpec) -> Result<Task> {
        self.vm().reconfigure(vm, spec).await
    }

    async fn create_snapshot(&self, vm: &ObjectRef, req: &SnapshotRequest) -> Result<Task> {
        self.snapshot().create(vm, req).await
    }

    async fn destroy_vm(&self, vm: &ObjectRef) -> Result<Task> {
        self.vm().destroy(vm).await
    }

    async fn wait_for_task(&self, task: &Task, deadline: Option<Duration>) -> Result<TaskResult> {
        self.task().wait_for_result(task, deadline).await
    }
}
