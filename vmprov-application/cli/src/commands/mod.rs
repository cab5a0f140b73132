//! CLI 命令实现

pub mod build;
pub mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use vmprov_pipeline::ProvisionConfig;

/// 展开 `~` 和环境变量
pub fn expand_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path).with_context(|| format!("无法展开路径: {}", path))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// 加载配置：指定路径时读取该文件，否则按默认搜索路径加载；环境变量始终覆盖
pub fn load_config(path: Option<&str>) -> Result<ProvisionConfig> {
    match path {
        Some(p) => {
            let path = expand_path(p)?;
            ProvisionConfig::load_with_overrides(&path)
                .with_context(|| format!("加载配置失败: {}", path.display()))
        }
        None => ProvisionConfig::load().context("加载配置失败"),
    }
}
