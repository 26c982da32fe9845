//! 远程操作适配器
//!
//! 把会话管理器的 connect / disconnect 包装为请求 / 响应负载：
//! 内部组件用布尔 + 日志报告结果，只有这一层把失败翻译成携带
//! 可读消息的外部响应。上层消息总线（如何承载这些负载）不在
//! 本 crate 范围内。

use crate::session::SessionManager;
use serde::{Deserialize, Serialize};
use tracing::error;

/// connect 请求负载
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConnectRequest {
    /// 会话端口，必须在 [30200, 30209] 内
    pub port: u16,
    /// 控制器地址；空字符串表示未显式指定（从首包学习）
    #[serde(default)]
    pub remote_host: String,
}

/// connect 响应负载
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConnectResponse {
    /// 会话是否处于打开状态
    pub connected: bool,
    /// 人类可读的结果消息
    pub message: String,
}

/// disconnect 响应负载（请求为空）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppDisconnectResponse {
    /// 会话是否处于关闭状态
    pub disconnected: bool,
    /// 人类可读的结果消息
    pub message: String,
}

/// 远程操作适配器
pub struct FriApp {
    manager: SessionManager,
}

impl FriApp {
    /// 包装一个会话管理器
    pub fn new(manager: SessionManager) -> Self {
        Self { manager }
    }

    /// 底层会话管理器
    pub fn manager(&self) -> &SessionManager {
        &self.manager
    }

    /// 处理 connect 请求
    pub fn on_connect(&self, request: &AppConnectRequest) -> AppConnectResponse {
        let remote_host = if request.remote_host.is_empty() {
            None
        } else {
            Some(request.remote_host.as_str())
        };

        match self.manager.connect(request.port, remote_host) {
            Ok(true) => AppConnectResponse {
                connected: true,
                message: "Connected successfully".to_string(),
            },
            Ok(false) => AppConnectResponse {
                connected: false,
                message: "Failed to connect".to_string(),
            },
            Err(e) => {
                error!("Connect failed: {}", e);
                AppConnectResponse {
                    connected: false,
                    message: e.to_string(),
                }
            },
        }
    }

    /// 处理 disconnect 请求
    pub fn on_disconnect(&self) -> AppDisconnectResponse {
        match self.manager.disconnect() {
            Ok(disconnected) => AppDisconnectResponse {
                disconnected,
                message: "Disconnected successfully".to_string(),
            },
            Err(e) => {
                error!("Disconnect failed: {}", e);
                AppDisconnectResponse {
                    disconnected: !self.manager.is_connected(),
                    message: e.to_string(),
                }
            },
        }
    }
}
