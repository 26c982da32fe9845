//! 驱动层模块
//!
//! 本模块提供 FRI 客户端的会话与指令管理功能，包括：
//! - 会话生命周期管理（单会话 + 后台步循环线程）
//! - 状态 / 指令中介者（arc-swap 无锁快照 + 指令邮箱）
//! - 指令安全校验（CommandGuard，进缓冲前的唯一安全门）
//! - 远程操作适配器（connect / disconnect 请求响应负载）
//!
//! # 使用场景
//!
//! 控制逻辑通过 [`FriIntermediary`] 读状态、写候选指令；
//! [`SessionManager`] 负责把中介者挂到循环会话上并维持周期交换。

mod builder;
pub mod app;
pub mod buffer;
mod error;
pub mod guard;
pub mod intermediary;
pub mod session;

pub use app::{AppConnectRequest, AppConnectResponse, AppDisconnectResponse, FriApp};
pub use buffer::{RobotCommand, RobotState};
pub use builder::{FriDriver, FriDriverBuilder};
pub use error::DriverError;
pub use guard::{CommandGuard, GuardLimits};
pub use intermediary::FriIntermediary;
pub use session::{MAX_PORT, MIN_PORT, SessionManager};
