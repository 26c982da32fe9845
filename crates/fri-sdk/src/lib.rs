//! # FRI SDK
//!
//! 面向 7 轴机械臂实时控制的统一 SDK 入口。
//!
//! ## 分层
//!
//! - [`protocol`]: 循环协议定义（枚举、状态帧、指令帧）
//! - [`transport`]: 循环会话传输（UDP / mock）
//! - [`driver`]: 会话生命周期 + 安全门中介者
//!
//! ## 快速上手
//!
//! ```no_run
//! use fri_sdk::FriDriverBuilder;
//!
//! let driver = FriDriverBuilder::new().build().unwrap();
//! driver.manager.connect(30200, None).unwrap();
//!
//! // 控制循环：读快照、写候选指令
//! let snapshot = driver.intermediary.snapshot();
//! println!("session state: {:?}", snapshot.session_state);
//!
//! driver.manager.disconnect().unwrap();
//! ```

pub use fri_driver as driver;
pub use fri_protocol as protocol;
pub use fri_transport as transport;

// 顶层便捷重导出
pub use fri_driver::{
    AppConnectRequest, AppConnectResponse, AppDisconnectResponse, CommandGuard, DriverError,
    FriApp, FriDriver, FriDriverBuilder, FriIntermediary, GuardLimits, RobotCommand, RobotState,
    SessionManager,
};
pub use fri_protocol::{ClientCommandMode, JOINT_COUNT, SessionState, WRENCH_DIM};

/// 初始化日志订阅器（进程级，幂等失败安全）
///
/// 读取 `RUST_LOG` 环境变量作为过滤器，默认 `info`。重复调用时
/// 第二次安装失败会被忽略（测试进程中常见）。
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
