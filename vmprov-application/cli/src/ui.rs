//! 终端输出

use colored::Colorize;
use vmprov_pipeline::Ui;

/// 彩色终端界面
#[derive(Debug, Default, Clone)]
pub struct ConsoleUi;

impl Ui for ConsoleUi {
    fn say(&self, message: &str) {
        println!("{} {}", "==>".green().bold(), message);
    }

    fn error(&self, message: &str) {
        eprintln!("{} {}", "==>".red().bold(), message.red());
    }
}
