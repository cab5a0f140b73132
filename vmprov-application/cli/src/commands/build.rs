//! build 命令：执行置备流水线

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use vmprov_pipeline::{
    CloneVmStep, ConfigureHardwareStep, CreateSnapshotStep, PipelineError, PipelineRunner,
    PipelineState, ProvisionConfig, RunReport, Step, StepStatus,
};
use vmprov_platform::PlatformClient;

use super::expand_path;
use crate::ui::ConsoleUi;

/// 按固定顺序组装步骤
pub fn build_steps(config: &ProvisionConfig) -> Vec<Box<dyn Step>> {
    vec![
        Box::new(CloneVmStep::new(config.location.clone(), config.vm.clone())),
        Box::new(ConfigureHardwareStep::new(config.hardware.clone())),
        Box::new(CreateSnapshotStep::new(
            config.snapshot.create,
            config.snapshot_name(),
            config.snapshot.target,
        )),
    ]
}

pub async fn handle(config: ProvisionConfig, report_path: Option<String>) -> Result<()> {
    config.validate().context("配置校验失败")?;

    println!("{} {}", "连接平台:".bold(), config.platform.url.cyan());
    let client = PlatformClient::connect(
        &config.platform.url,
        &config.platform.username,
        &config.platform.password,
        config.platform_config(),
    )
    .await
    .map_err(PipelineError::from)?;

    let token = CancellationToken::new();
    tokio::spawn({
        let token = token.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("收到中断信号，当前步骤结束后取消");
                token.cancel();
            }
        }
    });

    let mut state = PipelineState::new(Arc::new(client), Arc::new(ConsoleUi))
        .with_cancellation(token)
        .with_task_policy(config.task_policy());

    let mut runner = PipelineRunner::new(build_steps(&config));
    let result = runner.run(&mut state).await;

    if let (Some(path), Some(report)) = (report_path.as_deref(), runner.last_report()) {
        let path = expand_path(path)?;
        write_report(report, &path)?;
        info!("运行报告已保存: {}", path.display());
    }

    match result {
        Ok(report) => {
            print_summary(&report);
            Ok(())
        }
        Err(e) => {
            if let Some(report) = runner.last_report() {
                print_summary(report);
            }
            Err(e.into())
        }
    }
}

/// 按扩展名写出运行报告
fn write_report(report: &RunReport, path: &Path) -> Result<()> {
    let content = match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => report.to_yaml().context("序列化报告失败")?,
        _ => report.to_json().context("序列化报告失败")?,
    };

    std::fs::write(path, content).with_context(|| format!("写入报告失败: {}", path.display()))
}

fn print_summary(report: &RunReport) {
    println!();
    println!("{}", "置备结果".bold());
    for step in &report.steps {
        let status = match step.status {
            StepStatus::Success => "成功".green(),
            StepStatus::Skipped => "跳过".yellow(),
            StepStatus::Failed => "失败".red(),
        };
        println!("  [{}] {} ({} ms)", status, step.name, step.duration_ms);
    }

    if let Some(vm) = &report.vm {
        println!("  虚拟机: {}", vm.green());
    }
    if report.cancelled {
        println!("  {}", "已取消".yellow());
    }
    if let Some(err) = &report.error {
        println!("  错误: {}", err.red());
    }
}
