//! 虚拟机管理 API
//!
//! 克隆、修改配置、销毁。所有变更操作都只返回任务句柄，
//! 完成状态通过 [`TaskApi`](crate::api::TaskApi) 等待。

use reqwest::Method;
use tracing::info;

use crate::client::PlatformClient;
use crate::error::Result;
use crate::models::{CloneSpec, ConfigSpec, ObjectRef, Task};

/// 虚拟机管理 API
pub struct VmApi<'a> {
    client: &'a PlatformClient,
}

impl<'a> VmApi<'a> {
    pub(crate) fn new(client: &'a PlatformClient) -> Self {
        Self { client }
    }

    /// 从源虚拟机（模板）克隆新虚拟机
    ///
    /// # Arguments
    /// * `source` - 源虚拟机
    /// * `folder` - 目标文件夹
    /// * `name` - 新虚拟机名称
    /// * `spec` - 克隆规格
    pub async fn clone(
        &self,
        source: &ObjectRef,
        folder: &ObjectRef,
        name: &str,
        spec: &CloneSpec,
    ) -> Result<Task> {
        info!("克隆虚拟机: {} -> {}/{}", source.name, folder.name, name);
        self.client
            .request(
                Method::POST,
                &format!("/api/v1/vm/{}/clone", source.id),
                Some(serde_json::json!({
                    "folder": folder.id,
                    "name": name,
                    "spec": spec,
                })),
            )
            .await
    }

    /// 修改虚拟硬件配置
    pub async fn reconfigure(&self, vm: &ObjectRef, spec: &ConfigSpec) -> Result<Task> {
        info!(
            "修改虚拟机配置: {}, CPU: {:?}, 内存: {:?} MB",
            vm.name, spec.num_cpus, spec.memory_mb
        );
        self.client
            .request(
                Method::POST,
                &format!("/api/v1/vm/{}/reconfigure", vm.id),
                Some(spec),
            )
            .await
    }

    /// 销毁虚拟机
    pub async fn destroy(&self, vm: &ObjectRef) -> Result<Task> {
        info!("销毁虚拟机: {}", vm.name);
        self.client
            .request(
                Method::DELETE,
                &format!("/api/v1/vm/{}", vm.id),
                None::<()>,
            )
            .await
    }
}
