//! 快照管理 API

use reqwest::Method;
use tracing::info;

use crate::client::PlatformClient;
use crate::error::Result;
use crate::models::{ObjectRef, SnapshotRequest, Task};

/// 快照管理 API
pub struct SnapshotApi<'a> {
    client: &'a PlatformClient,
}

impl<'a> SnapshotApi<'a> {
    pub(crate) fn new(client: &'a PlatformClient) -> Self {
        Self { client }
    }

    /// 创建快照
    ///
    /// # Arguments
    /// * `vm` - 虚拟机
    /// * `req` - 快照名称、描述、是否包含内存、是否静默
    pub async fn create(&self, vm: &ObjectRef, req: &SnapshotRequest) -> Result<Task> {
        info!("创建虚拟机快照: {} -> {}", vm.name, req.name);
        self.client
            .request(
                Method::POST,
                &format!("/api/v1/vm/{}/snapshot", vm.id),
                Some(req),
            )
            .await
    }
}
