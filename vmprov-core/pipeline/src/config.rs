//! 置备配置管理
//!
//! 支持从多个源加载配置:
//! - 环境变量 (优先级最高)
//! - 配置文件 (TOML/YAML/JSON)
//! - 默认值 (优先级最低)
//!
//! 配置文件搜索路径 (按优先级):
//! 1. `VMPROV_CONFIG` 环境变量指定的路径
//! 2. `./vmprov.toml` / `./vmprov.yaml` / `./vmprov.json` (当前目录)
//! 3. `~/.config/vmprov/config.toml` (用户配置目录)
//! 4. `/etc/vmprov/config.toml` (系统配置目录)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use vmprov_platform::PlatformConfig;

use crate::state::TaskWaitPolicy;

// ============================================
// 核心配置结构
// ============================================

/// 置备配置 (顶层)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionConfig {
    /// 日志级别 (debug/info/warn/error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// 平台连接配置
    #[serde(default)]
    pub platform: PlatformSection,

    /// 放置位置配置
    #[serde(default)]
    pub location: LocationConfig,

    /// 虚拟机配置
    #[serde(default)]
    pub vm: VmConfig,

    /// 虚拟硬件配置
    #[serde(default)]
    pub hardware: HardwareConfig,

    /// 快照配置
    #[serde(default)]
    pub snapshot: SnapshotConfig,

    /// 任务等待配置
    #[serde(default)]
    pub task: TaskConfig,
}

/// 平台连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformSection {
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,

    /// 连接超时 (秒)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// 请求超时 (秒)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

/// 放置位置配置
///
/// datacenter / folder 为空时使用平台默认值
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationConfig {
    #[serde(default)]
    pub datacenter: String,

    #[serde(default)]
    pub folder: String,

    /// 主机或集群名
    #[serde(default)]
    pub host: String,

    /// 资源池名
    #[serde(default)]
    pub resource_pool: String,

    /// 目标存储，None 表示沿用模板所在存储
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datastore: Option<String>,
}

/// 虚拟机配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VmConfig {
    /// 模板虚拟机清单路径
    #[serde(default)]
    pub template: String,

    /// 新虚拟机名称
    #[serde(default)]
    pub name: String,
}

/// 虚拟硬件配置
///
/// 保留原始字符串，空字符串表示不修改该项
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HardwareConfig {
    /// CPU 数量
    #[serde(default)]
    pub cpus: String,

    /// 内存大小 (MB)
    #[serde(default)]
    pub memory: String,
}

/// 快照目标
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotTarget {
    /// 克隆出的新虚拟机
    #[default]
    Clone,

    /// 源模板虚拟机
    Source,
}

impl std::str::FromStr for SnapshotTarget {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "clone" => Ok(SnapshotTarget::Clone),
            "source" => Ok(SnapshotTarget::Source),
            other => anyhow::bail!("unknown snapshot target: {}", other),
        }
    }
}

/// 快照配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// 是否创建快照
    #[serde(default)]
    pub create: bool,

    /// 快照名称，为空时使用新虚拟机名称
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub target: SnapshotTarget,
}

/// 任务等待配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    /// 单次等待超时 (秒)，不设置则无限等待
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// 超时后重新等待的次数
    #[serde(default)]
    pub retries_on_timeout: u32,

    /// 任务状态轮询间隔 (毫秒)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

// ============================================
// 默认值函数
// ============================================

fn default_log_level() -> String {
    "info".to_string()
}
fn default_verify_ssl() -> bool {
    false
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_request_timeout() -> u64 {
    30
}
fn default_poll_interval() -> u64 {
    1000
}

// ============================================
// Default 实现
// ============================================

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            platform: PlatformSection::default(),
            location: LocationConfig::default(),
            vm: VmConfig::default(),
            hardware: HardwareConfig::default(),
            snapshot: SnapshotConfig::default(),
            task: TaskConfig::default(),
        }
    }
}

impl Default for PlatformSection {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: String::new(),
            password: String::new(),
            verify_ssl: default_verify_ssl(),
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            retries_on_timeout: 0,
            poll_interval_ms: default_poll_interval(),
        }
    }
}

// ============================================
// 配置加载实现
// ============================================

impl ProvisionConfig {
    /// 从多个源加载配置 (优先级: 环境变量 > 配置文件 > 默认值)
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_file() {
            Some(path) => {
                tracing::debug!("Loading config from: {:?}", path);
                Self::load_from_file(&path)?
            }
            None => {
                tracing::debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.apply_env_vars()?;

        Ok(config)
    }

    /// 从指定文件加载配置，再叠加环境变量
    pub fn load_with_overrides(path: &Path) -> Result<Self> {
        let mut config = Self::load_from_file(path)?;
        config.apply_env_vars()?;
        Ok(config)
    }

    /// 从指定文件加载配置
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config = match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {:?}", path))?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {:?}", path))?,
            Some("json") => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {:?}", path))?,
            _ => anyhow::bail!("Unsupported config file format: {:?}", path),
        };

        Ok(config)
    }

    /// 查找配置文件 (按优先级搜索)
    fn find_config_file() -> Option<PathBuf> {
        if let Ok(path) = env::var("VMPROV_CONFIG") {
            let p = PathBuf::from(path);
            if p.exists() {
                return Some(p);
            }
        }

        let mut candidates = vec![
            PathBuf::from("./vmprov.toml"),
            PathBuf::from("./vmprov.yaml"),
            PathBuf::from("./vmprov.json"),
        ];

        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(".config/vmprov/config.toml"));
            candidates.push(home.join(".config/vmprov/config.yaml"));
        }

        #[cfg(target_os = "linux")]
        candidates.push(PathBuf::from("/etc/vmprov/config.toml"));

        candidates.into_iter().find(|p| p.exists())
    }

    /// 从环境变量覆盖配置
    fn apply_env_vars(&mut self) -> Result<()> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    /// 按给定的查找函数覆盖配置项
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("VMPROV_LOG_LEVEL") {
            self.log_level = level;
        }

        // Platform
        if let Some(url) = lookup("VMPROV_URL") {
            self.platform.url = url;
        }
        if let Some(username) = lookup("VMPROV_USERNAME") {
            self.platform.username = username;
        }
        if let Some(password) = lookup("VMPROV_PASSWORD") {
            self.platform.password = password;
        }
        if let Some(verify_ssl) = lookup("VMPROV_VERIFY_SSL") {
            self.platform.verify_ssl = verify_ssl
                .parse()
                .context("Invalid VMPROV_VERIFY_SSL value")?;
        }

        // Location
        if let Some(datacenter) = lookup("VMPROV_DATACENTER") {
            self.location.datacenter = datacenter;
        }
        if let Some(folder) = lookup("VMPROV_FOLDER") {
            self.location.folder = folder;
        }
        if let Some(host) = lookup("VMPROV_HOST") {
            self.location.host = host;
        }
        if let Some(pool) = lookup("VMPROV_RESOURCE_POOL") {
            self.location.resource_pool = pool;
        }
        if let Some(datastore) = lookup("VMPROV_DATASTORE") {
            self.location.datastore = Some(datastore).filter(|d| !d.is_empty());
        }

        // VM
        if let Some(template) = lookup("VMPROV_TEMPLATE") {
            self.vm.template = template;
        }
        if let Some(name) = lookup("VMPROV_VM_NAME") {
            self.vm.name = name;
        }

        // Hardware
        if let Some(cpus) = lookup("VMPROV_CPUS") {
            self.hardware.cpus = cpus;
        }
        if let Some(memory) = lookup("VMPROV_MEMORY") {
            self.hardware.memory = memory;
        }

        // Snapshot
        if let Some(create) = lookup("VMPROV_CREATE_SNAPSHOT") {
            self.snapshot.create = create
                .parse()
                .context("Invalid VMPROV_CREATE_SNAPSHOT value")?;
        }
        if let Some(name) = lookup("VMPROV_SNAPSHOT_NAME") {
            self.snapshot.name = name;
        }
        if let Some(target) = lookup("VMPROV_SNAPSHOT_TARGET") {
            self.snapshot.target = target
                .parse()
                .context("Invalid VMPROV_SNAPSHOT_TARGET value")?;
        }

        // Task
        if let Some(timeout) = lookup("VMPROV_TASK_TIMEOUT") {
            self.task.timeout = Some(
                timeout
                    .parse()
                    .context("Invalid VMPROV_TASK_TIMEOUT value")?,
            );
        }
        if let Some(retries) = lookup("VMPROV_TASK_RETRIES") {
            self.task.retries_on_timeout = retries
                .parse()
                .context("Invalid VMPROV_TASK_RETRIES value")?;
        }
        if let Some(interval) = lookup("VMPROV_TASK_POLL_INTERVAL") {
            self.task.poll_interval_ms = interval
                .parse()
                .context("Invalid VMPROV_TASK_POLL_INTERVAL value")?;
        }

        Ok(())
    }

    /// 验证配置
    pub fn validate(&self) -> Result<()> {
        if self.platform.url.is_empty() {
            anyhow::bail!("platform url cannot be empty");
        }
        if self.platform.username.is_empty() {
            anyhow::bail!("platform username cannot be empty");
        }
        if self.vm.template.is_empty() {
            anyhow::bail!("VM template cannot be empty");
        }
        if self.vm.name.is_empty() {
            anyhow::bail!("VM name cannot be empty");
        }
        if self.snapshot.create && self.snapshot_name().is_empty() {
            anyhow::bail!("snapshot name cannot be empty");
        }

        Ok(())
    }

    /// 快照名称，未配置时使用新虚拟机名称
    pub fn snapshot_name(&self) -> &str {
        if self.snapshot.name.is_empty() {
            &self.vm.name
        } else {
            &self.snapshot.name
        }
    }

    /// 平台客户端配置
    pub fn platform_config(&self) -> PlatformConfig {
        PlatformConfig {
            connect_timeout: self.platform.connect_timeout,
            request_timeout: self.platform.request_timeout,
            verify_ssl: self.platform.verify_ssl,
            task_poll_interval_ms: self.task.poll_interval_ms,
        }
    }

    /// 任务等待策略
    pub fn task_policy(&self) -> TaskWaitPolicy {
        TaskWaitPolicy {
            deadline: self.task.timeout.map(Duration::from_secs),
            retries_on_timeout: self.task.retries_on_timeout,
        }
    }

    /// 保存配置到文件
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }

        let content = match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => toml::to_string_pretty(self).context("Failed to serialize to TOML")?,
            Some("yaml") | Some("yml") => {
                serde_yaml::to_string(self).context("Failed to serialize to YAML")?
            }
            Some("json") => {
                serde_json::to_string_pretty(self).context("Failed to serialize to JSON")?
            }
            _ => anyhow::bail!("Unsupported config file format: {:?}", path),
        };

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }
}
