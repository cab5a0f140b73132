//! 清单查询 API
//!
//! 按名称或清单路径定位数据中心、文件夹、资源池、存储和虚拟机。
//! 名称为空时数据中心和文件夹回退到平台默认值。

use reqwest::Method;
use tracing::info;
use urlencoding::encode;

use crate::client::PlatformClient;
use crate::error::{PlatformError, Result};
use crate::models::{ObjectKind, ObjectRef};

/// 清单查询 API
pub struct InventoryApi<'a> {
    client: &'a PlatformClient,
}

impl<'a> InventoryApi<'a> {
    pub(crate) fn new(client: &'a PlatformClient) -> Self {
        Self { client }
    }

    /// 查找数据中心，名称为空时返回默认数据中心
    pub async fn datacenter_or_default(&self, name: &str) -> Result<ObjectRef> {
        info!("查找数据中心: {}", display_name(name));
        self.client
            .request(
                Method::GET,
                &format!("/api/v1/datacenter?name={}", encode(name)),
                None::<()>,
            )
            .await
    }

    /// 查找数据中心下的文件夹，名称为空时返回默认虚拟机文件夹
    pub async fn folder_or_default(&self, datacenter: &ObjectRef, name: &str) -> Result<ObjectRef> {
        info!("查找文件夹: {} (数据中心: {})", display_name(name), datacenter.name);
        self.client
            .request(
                Method::GET,
                &format!(
                    "/api/v1/datacenter/{}/folder?name={}",
                    datacenter.id,
                    encode(name)
                ),
                None::<()>,
            )
            .await
    }

    /// 按清单路径查找对象
    ///
    /// 路径不存在时平台返回空结果而不是错误，这里保留为 `None`
    pub async fn find_by_path(&self, kind: ObjectKind, path: &str) -> Result<Option<ObjectRef>> {
        info!("按路径查找 {}: {}", kind.as_str(), path);
        let result = self
            .client
            .request(
                Method::GET,
                &format!(
                    "/api/v1/inventory?kind={}&path={}",
                    kind.as_str(),
                    encode(path)
                ),
                None::<()>,
            )
            .await;

        match result {
            Err(PlatformError::NotFound(_)) => Ok(None),
            other => other,
        }
    }

    /// 按名称查找数据中心下的存储
    pub async fn datastore(&self, datacenter: &ObjectRef, name: &str) -> Result<ObjectRef> {
        info!("查找存储: {}", name);
        self.client
            .request(
                Method::GET,
                &format!(
                    "/api/v1/datacenter/{}/datastore?name={}",
                    datacenter.id,
                    encode(name)
                ),
                None::<()>,
            )
            .await
    }

    /// 按清单路径查找虚拟机
    pub async fn virtual_machine(&self, path: &str) -> Result<ObjectRef> {
        self.find_by_path(ObjectKind::VirtualMachine, path)
            .await?
            .ok_or_else(|| PlatformError::NotFound(format!("虚拟机 {}", path)))
    }
}

fn display_name(name: &str) -> &str {
    if name.is_empty() {
        "<default>"
    } else {
        name
    }
}
