//! 驱动层错误类型定义

use fri_transport::TransportError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 端口超出允许范围
    ///
    /// 在任何传输调用之前同步检查。
    #[error("Invalid port {port}: expected port in [30200, 30209]")]
    InvalidPort { port: u16 },

    /// 传输层错误
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// 安全限制配置非法（如下限大于上限）
    #[error("Invalid guard limits: {0}")]
    InvalidLimits(String),

    /// 限制配置文件读取失败
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 限制配置文件解析失败
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}
