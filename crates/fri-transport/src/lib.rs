//! # FRI Transport
//!
//! 循环会话传输层，提供统一的会话抽象。
//!
//! ## 模块
//!
//! - [`FriSession`]: 会话 trait（打开 / 单周期 step / 关闭）
//! - [`SessionHandler`]: 周期回调 trait，由驱动层的中介者实现
//! - `udp`: 基于 UDP 数据报的真实会话实现
//! - `mock`（feature `mock`）: 可脚本化的模拟会话，用于无控制器测试

use fri_protocol::{CommandFrame, MonitorFrame};
use thiserror::Error;

pub mod udp;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use udp::{UdpConfig, UdpFriSession};

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockFriSession, MockSessionHandle, StepScript};

/// 传输层统一错误类型
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] fri_protocol::ProtocolError),

    /// 会话未打开就调用了 step
    #[error("Session not open")]
    NotOpen,

    /// 连续超时超过容忍上限，控制器被认为已离线
    #[error("Controller unreachable: {missed} consecutive cycles missed")]
    ControllerUnreachable { missed: u32 },
}

/// 周期回调接口
///
/// 会话在每个周期内先把收到的状态帧交给 `on_state`，再通过
/// `fill_command` 取回要发送的指令帧。两个方法都以 `bool` 报告
/// 成功与否；失败由会话记录日志并跳过本周期，不终止会话。
///
/// 驱动层的中介者（Intermediary）实现此 trait；传输层因此不依赖
/// 驱动层类型。
pub trait SessionHandler: Send + Sync {
    /// 收到一帧新状态。返回 false 表示状态未被接受（例如包含未知枚举值）。
    fn on_state(&self, state: &MonitorFrame) -> bool;

    /// 渲染本周期要发送的指令帧。返回 false 表示渲染失败。
    fn fill_command(&self, command: &mut CommandFrame) -> bool;
}

/// 循环会话抽象
///
/// 一个会话对应一条到控制器实时侧的逻辑连接。`step` 执行一次完整的
/// 状态接收 + 指令发送交换：
/// - `Ok(true)`: 本周期正常（或可恢复地跳过），继续循环
/// - `Ok(false)`: 会话应正常结束（控制器主动收尾）
/// - `Err(_)`: 致命传输错误，由调用方记录日志并强制断开
pub trait FriSession {
    /// 打开会话。`remote_host` 为 None 时等待控制器首包确定对端地址。
    fn open(&mut self, port: u16, remote_host: Option<&str>) -> Result<bool, TransportError>;

    /// 执行一次循环交换
    fn step(&mut self) -> Result<bool, TransportError>;

    /// 关闭会话（幂等）
    fn close(&mut self);
}
