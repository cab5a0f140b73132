//! vmprov CLI 应用

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, Level};

mod commands;
mod ui;

#[derive(Parser)]
#[command(name = "vmprov")]
#[command(about = "vmprov - 从模板置备虚拟机", long_about = None)]
#[command(version)]
struct Cli {
    /// 日志级别 (默认取配置文件中的 log_level)
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 执行置备流水线: 克隆 → 修改硬件 → 创建快照
    Build {
        /// 配置文件路径
        #[arg(short, long)]
        config: Option<String>,

        /// 运行报告输出路径 (.json / .yaml)
        #[arg(long)]
        report: Option<String>,
    },

    /// 校验配置
    Validate {
        /// 配置文件路径
        #[arg(short, long)]
        config: Option<String>,
    },

    /// 生成配置文件模板
    InitConfig {
        /// 输出路径 (.toml / .yaml / .json)
        path: String,

        /// 覆盖已存在的文件
        #[arg(long)]
        force: bool,
    },
}

fn init_logging(level: &str) {
    let log_level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt().with_max_level(log_level).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { config, report } => {
            let config = commands::load_config(config.as_deref())?;
            init_logging(cli.log_level.as_deref().unwrap_or(&config.log_level));
            info!("vmprov 启动");
            commands::build::handle(config, report).await?
        }
        Commands::Validate { config } => {
            let config = commands::load_config(config.as_deref())?;
            init_logging(cli.log_level.as_deref().unwrap_or(&config.log_level));
            commands::config::validate(&config)?
        }
        Commands::InitConfig { path, force } => {
            init_logging(cli.log_level.as_deref().unwrap_or("info"));
            commands::config::init(&path, force)?
        }
    }

    Ok(())
}
