//! 平台 API 模块
//!
//! - 清单查询 (InventoryApi)
//! - 虚拟机管理 (VmApi)
//! - 快照管理 (SnapshotApi)
//! - 任务跟踪 (TaskApi)

pub mod inventory;
pub mod snapshot;
pub mod task;
pub mod vm;

pub use inventory::InventoryApi;
pub use snapshot::SnapshotApi;
pub use task::TaskApi;
pub use vm::VmApi;
