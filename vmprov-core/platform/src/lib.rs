//! vmprov 平台客户端
//!
//! 提供与虚拟化管理平台 REST API 交互的会话客户端，以及流水线使用的能力接口。
//!
//! # 功能
//!
//! - **会话** (`PlatformClient`): URL 校验、MD5 密码登录、Token 认证
//! - **清单查询** (`InventoryApi`): 数据中心、文件夹、资源池、存储、虚拟机
//! - **虚拟机管理** (`VmApi`): 克隆、修改配置、销毁
//! - **快照管理** (`SnapshotApi`): 创建快照
//! - **任务跟踪** (`TaskApi`): 轮询等待异步任务，可选截止时间
//!
//! # 示例
//!
//! ```ignore
//! use vmprov_platform::{PlatformClient, PlatformConfig, VirtPlatform};
//!
//! let client = PlatformClient::connect(
//!     "https://vcenter.local:8088",
//!     "admin",
//!     "password",
//!     PlatformConfig::default(),
//! ).await?;
//!
//! let dc = client.datacenter_or_default("").await?;
//! let template = client.virtual_machine("/DC1/vm/templates/base").await?;
//! ```

pub mod api;
pub mod client;
pub mod error;
pub mod models;
pub mod traits;

pub use client::{PlatformClient, PlatformConfig};
pub use error::{PlatformError, Result};
pub use traits::VirtPlatform;

pub use api::{InventoryApi, SnapshotApi, TaskApi, VmApi};

pub use models::{
    resource_pool_path, CloneSpec, ConfigSpec, ObjectKind, ObjectRef, RelocateSpec,
    SnapshotRequest, Task, TaskInfo, TaskResult, TaskState,
};
