//! validate / init-config 命令

use anyhow::{Context, Result};
use colored::Colorize;

use vmprov_pipeline::{parse_hardware, ProvisionConfig};
use vmprov_platform::resource_pool_path;

use super::expand_path;

/// 校验配置并打印解析结果
pub fn validate(config: &ProvisionConfig) -> Result<()> {
    config.validate()?;
    let hardware = parse_hardware(&config.hardware.cpus, &config.hardware.memory)?;

    let datacenter = if config.location.datacenter.is_empty() {
        "<default>"
    } else {
        &config.location.datacenter
    };

    println!("{}", "配置有效".green().bold());
    println!("  平台: {}", config.platform.url);
    println!("  模板: {}", config.vm.template);
    println!("  新虚拟机: {}", config.vm.name.green());
    println!(
        "  资源池: {}",
        resource_pool_path(datacenter, &config.location.host, &config.location.resource_pool)
    );
    if let Some(datastore) = &config.location.datastore {
        println!("  存储: {}", datastore);
    }
    if hardware.is_empty() {
        println!("  硬件: {}", "沿用模板".yellow());
    } else {
        println!("  硬件: CPU {:?}, 内存 {:?} MB", hardware.num_cpus, hardware.memory_mb);
    }
    if config.snapshot.create {
        println!("  快照: {} ({:?})", config.snapshot_name(), config.snapshot.target);
    }

    Ok(())
}

/// 写出配置模板
pub fn init(path: &str, force: bool) -> Result<()> {
    let path = expand_path(path)?;
    if path.exists() && !force {
        anyhow::bail!("文件已存在: {} (使用 --force 覆盖)", path.display());
    }

    let mut config = ProvisionConfig::default();
    config.platform.url = "https://platform.example.com:8088".to_string();
    config.platform.username = "admin".to_string();
    config.location.host = "cluster1".to_string();
    config.location.resource_pool = "default".to_string();
    config.vm.template = "/DC1/vm/templates/base".to_string();
    config.vm.name = "worker-01".to_string();

    config
        .save_to_file(&path)
        .with_context(|| format!("写入配置失败: {}", path.display()))?;

    println!("{} {}", "已生成配置:".green(), path.display());
    Ok(())
}
