//! # Slider CLI
//!
//! 三轴电动相机滑轨命令行工具。
//!
//! ```bash
//! # 延时摄影：X 轴 100 mm，拍 50 张
//! slider interval -x 100 -s 50 --name sunset
//!
//! # 焦点堆栈：每组 10 张，共 3 组
//! slider macro -x 2 -y 30 --stack-count 10 -s 3
//!
//! # 解锁控制器
//! slider disable
//! ```
//!
//! Ctrl+C 取消当前运行：串口与相机照常释放，退出码 130。

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use slider_control::{ExecError, ShootingMode};
use slider_driver::{CancelToken, LinkError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod validation;

use commands::{ConfigCommand, RunArgs};
use config::SliderConfig;

/// 被 Ctrl+C 中断时的退出码
const EXIT_INTERRUPTED: u8 = 130;

/// Slider CLI - 电动相机滑轨命令行工具
#[derive(Parser, Debug)]
#[command(name = "slider")]
#[command(about = "Command-line interface for the motorized camera slider", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件路径
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 输出调试日志（包括每次串口收发）
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 延时摄影：N 个等距位置各拍一张，然后回原点
    Interval {
        #[command(flatten)]
        args: RunArgs,
    },

    /// 焦点堆栈：N 组，每组沿 X 轴拍 S 张，然后回原点
    Macro {
        #[command(flatten)]
        args: RunArgs,
    },

    /// 移动到目标后返回原点
    Bounce {
        #[command(flatten)]
        args: RunArgs,
    },

    /// 移动到目标位置
    Move {
        #[command(flatten)]
        args: RunArgs,
    },

    /// 以视频速度移动到目标位置
    Video {
        #[command(flatten)]
        args: RunArgs,
    },

    /// 完成初始化后暂停
    Wait {
        #[command(flatten)]
        args: RunArgs,
    },

    /// 解锁控制器（`$X`）
    Disable {
        #[command(flatten)]
        args: RunArgs,
    },

    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Commands {
    fn into_mode(self) -> Option<(ShootingMode, RunArgs)> {
        let pair = match self {
            Commands::Interval { args } => (ShootingMode::Interval, args),
            Commands::Macro { args } => (ShootingMode::Macro, args),
            Commands::Bounce { args } => (ShootingMode::Bounce, args),
            Commands::Move { args } => (ShootingMode::Move, args),
            Commands::Video { args } => (ShootingMode::Video, args),
            Commands::Wait { args } => (ShootingMode::Wait, args),
            Commands::Disable { args } => (ShootingMode::Disable, args),
            Commands::Config(_) => return None,
        };
        Some(pair)
    }
}

fn init_tracing(debug: bool) {
    let default = if debug {
        "slider=debug,slider_control=debug,slider_driver=debug,slider_serial=debug"
    } else {
        "slider=info,slider_control=info,slider_driver=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Ctrl+C 只设置取消标志，由执行器走正常的释放路径退出
///
/// 重复的中断不会跳过释放：串口与相机始终由 `ExecutionContext` 关闭。
fn handle_interrupt(cancel: &CancelToken) {
    if cancel.is_cancelled() {
        eprintln!("\nAlready stopping, waiting for the current command to finish...");
        return;
    }
    eprintln!("\nReceived interrupt signal. Stopping after the current command...");
    cancel.cancel();
}

fn install_interrupt_handler(cancel: CancelToken) -> Result<()> {
    ctrlc::set_handler(move || handle_interrupt(&cancel)).context("Failed to install Ctrl+C handler")
}

/// 错误链中是否有取消
fn is_cancelled(e: &anyhow::Error) -> bool {
    e.downcast_ref::<ExecError>().is_some_and(ExecError::is_cancelled)
        || e.downcast_ref::<LinkError>().is_some_and(LinkError::is_cancelled)
}

fn run(cli: Cli) -> Result<()> {
    let explicit = cli.config.as_deref();

    let (mode, args) = match cli.command {
        Commands::Config(cmd) => return cmd.execute(explicit),
        other => match other.into_mode() {
            Some(pair) => pair,
            None => return Ok(()),
        },
    };

    let config = SliderConfig::load(explicit)?;
    let cancel = CancelToken::new();
    install_interrupt_handler(cancel.clone())?;

    let summary = commands::run::execute(mode, &args, &config, cancel)?;
    info!(
        "{} finished: {} steps, {} captures in {:.1}s",
        summary.mode,
        summary.steps,
        summary.captures.len(),
        summary.elapsed.as_secs_f64()
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if is_cancelled(&e) {
                eprintln!("Cancelled");
                ExitCode::from(EXIT_INTERRUPTED)
            } else {
                eprintln!("Error: {:#}", e);
                ExitCode::FAILURE
            }
        },
    }
}
