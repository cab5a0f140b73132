//! 平台数据模型
//!
//! 清单对象引用、克隆/迁移规格、配置变更规格、快照请求以及异步任务。
//! 所有模型都通过 serde 与平台 REST API 的 JSON 结构互相转换。

use serde::{Deserialize, Serialize};

/// 清单对象类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Datacenter,
    Folder,
    ResourcePool,
    Datastore,
    VirtualMachine,
}

impl ObjectKind {
    /// 对象类型名称
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Datacenter => "datacenter",
            ObjectKind::Folder => "folder",
            ObjectKind::ResourcePool => "resource_pool",
            ObjectKind::Datastore => "datastore",
            ObjectKind::VirtualMachine => "virtual_machine",
        }
    }
}

/// 平台对象引用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    /// 对象类型
    pub kind: ObjectKind,

    /// 平台内部 ID
    pub id: String,

    /// 对象名称
    pub name: String,

    /// 清单路径
    #[serde(default)]
    pub inventory_path: String,
}

impl ObjectRef {
    pub fn new(kind: ObjectKind, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            name: name.into(),
            inventory_path: String::new(),
        }
    }

    /// 设置清单路径
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.inventory_path = path.into();
        self
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} ({})", self.kind.as_str(), self.id, self.name)
    }
}

/// 拼接资源池清单路径
///
/// 纯字符串拼接，不做任何校验: `/<datacenter>/host/<host>/Resources/<pool>`
pub fn resource_pool_path(datacenter: &str, host: &str, pool: &str) -> String {
    format!("/{}/host/{}/Resources/{}", datacenter, host, pool)
}

/// 迁移（放置）规格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelocateSpec {
    /// 目标资源池 ID
    pub pool: String,

    /// 目标存储 ID，None 表示沿用源虚拟机所在存储
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datastore: Option<String>,
}

/// 克隆规格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloneSpec {
    /// 放置位置
    pub location: RelocateSpec,

    /// 克隆后是否开机
    pub power_on: bool,
}

impl CloneSpec {
    /// 构建关机状态的克隆规格
    pub fn powered_off(pool: &ObjectRef, datastore: Option<&ObjectRef>) -> Self {
        Self {
            location: RelocateSpec {
                pool: pool.id.clone(),
                datastore: datastore.map(|ds| ds.id.clone()),
            },
            power_on: false,
        }
    }
}

/// 虚拟硬件配置变更规格
///
/// 未设置的字段不会出现在请求体中，平台保留原值
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigSpec {
    /// CPU 数量
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_cpus: Option<i32>,

    /// 内存大小 (MB)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_mb: Option<i64>,
}

impl ConfigSpec {
    pub fn is_empty(&self) -> bool {
        self.num_cpus.is_none() && self.memory_mb.is_none()
    }
}

/// 创建快照请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRequest {
    /// 快照名称
    pub name: String,

    /// 快照描述
    pub description: String,

    /// 是否包含内存
    pub memory: bool,

    /// 是否静默文件系统
    pub quiesce: bool,
}

impl SnapshotRequest {
    /// 内存 + 静默快照，描述为空
    pub fn quiesced_with_memory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            memory: true,
            quiesce: true,
        }
    }
}

/// 异步任务句柄
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// 任务 ID
    pub id: String,

    /// 任务描述 (如 "clone", "destroy")
    #[serde(default)]
    pub operation: String,
}

impl Task {
    pub fn new(id: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            operation: operation.into(),
        }
    }
}

/// 任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Queued,
    Running,
    Success,
    Error,
}

impl TaskState {
    /// 是否已结束
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Success | TaskState::Error)
    }
}

/// 任务详情
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInfo {
    pub id: String,

    pub state: TaskState,

    /// 进度 (0-100)
    #[serde(default)]
    pub progress: Option<u8>,

    /// 成功时的结果对象 (如克隆出的新虚拟机)
    #[serde(default)]
    pub result: Option<ObjectRef>,

    /// 失败时平台返回的故障信息
    #[serde(default)]
    pub fault: Option<String>,
}

/// 任务结果
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskResult {
    pub result: Option<ObjectRef>,
}
