//! # FRI CLI
//!
//! FRI 会话命令行工具：打开循环会话、周期打印状态快照，
//! `Ctrl-C` 时断开并退出。
//!
//! ```bash
//! # 默认端口 + 从首包学习对端地址
//! fri-cli connect --port 30200
//!
//! # 指定控制器地址与安全限制文件
//! fri-cli connect --port 30200 --host 192.168.1.50 --limits limits.toml
//!
//! # 校验安全限制文件
//! fri-cli check-limits limits.toml
//! ```

use clap::{Parser, Subcommand};
use fri_sdk::driver::{MAX_PORT, MIN_PORT};
use fri_sdk::{CommandGuard, FriDriverBuilder, GuardLimits};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{error, info};

/// FRI CLI - 循环会话命令行工具
#[derive(Parser, Debug)]
#[command(name = "fri-cli")]
#[command(about = "Command-line interface for FRI-style robot arm sessions", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 打开会话并持续打印状态快照，Ctrl-C 断开
    Connect {
        /// 本地监听端口（30200..=30209）
        #[arg(long, default_value_t = 30200)]
        port: u16,

        /// 控制器地址（缺省时从首个状态帧学习）
        #[arg(long)]
        host: Option<String>,

        /// 安全限制 TOML 文件（缺省时使用出厂限制）
        #[arg(long)]
        limits: Option<PathBuf>,

        /// 快照打印间隔（毫秒）
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },

    /// 校验安全限制 TOML 文件并打印生效值
    CheckLimits {
        /// 限制文件路径
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    fri_sdk::init_logging();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Connect {
            port,
            host,
            limits,
            interval_ms,
        } => run_connect(port, host, limits, interval_ms),
        Commands::CheckLimits { path } => run_check_limits(&path),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("{message}");
            ExitCode::FAILURE
        }
    }
}

/// 打开会话，周期打印快照，直到 Ctrl-C 或会话自行断开
fn run_connect(
    port: u16,
    host: Option<String>,
    limits: Option<PathBuf>,
    interval_ms: u64,
) -> Result<(), String> {
    let mut builder = FriDriverBuilder::new();
    if let Some(path) = limits {
        builder = builder.guard_limits_file(path);
    }
    let driver = builder.build().map_err(|e| e.to_string())?;

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || {
            info!("Ctrl-C received, shutting down");
            running.store(false, Ordering::Release);
        })
        .map_err(|e| format!("Failed to install Ctrl-C handler: {e}"))?;
    }

    info!("Opening session on port {port} (valid range [{MIN_PORT}, {MAX_PORT}])");
    if !driver
        .manager
        .connect(port, host.as_deref())
        .map_err(|e| e.to_string())?
    {
        return Err(format!("Failed to open session on port {port}"));
    }

    let interval = Duration::from_millis(interval_ms.max(1));
    while running.load(Ordering::Acquire) && driver.manager.is_connected() {
        let snapshot = driver.intermediary.snapshot();
        info!(
            session_state = ?snapshot.session_state,
            command_mode = ?snapshot.client_command_mode,
            safety_state = ?snapshot.safety_state,
            quality = ?snapshot.connection_quality,
            sample_time = snapshot.sample_time,
            tracking = snapshot.tracking_performance,
            "session snapshot"
        );
        thread::sleep(interval);
    }

    if !driver.manager.is_connected() {
        info!("Session closed by step loop");
    }
    driver.manager.disconnect().map_err(|e| e.to_string())?;
    info!("Session closed");
    Ok(())
}

/// 读取并校验限制文件，成功时打印生效值
fn run_check_limits(path: &PathBuf) -> Result<(), String> {
    let limits = GuardLimits::from_file(path).map_err(|e| e.to_string())?;
    CommandGuard::new(limits.clone()).map_err(|e| e.to_string())?;
    println!("min_joint_position = {:?}", limits.min_joint_position);
    println!("max_joint_position = {:?}", limits.max_joint_position);
    println!("max_joint_velocity = {:?}", limits.max_joint_velocity);
    println!("max_torque         = {:?}", limits.max_torque);
    println!("max_wrench         = {:?}", limits.max_wrench);
    info!("Limits file is valid: {}", path.display());
    Ok(())
}
