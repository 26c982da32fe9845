//! Builder 模式实现
//!
//! 提供链式构造驱动实例（会话管理器 + 中介者）的便捷方式。

use crate::error::DriverError;
use crate::guard::{CommandGuard, GuardLimits};
use crate::intermediary::FriIntermediary;
use crate::session::SessionManager;
use fri_transport::udp::{UdpConfig, UdpFriSession};
use fri_transport::{FriSession, SessionHandler};
use std::path::PathBuf;
use std::sync::Arc;

/// 驱动实例：会话管理器 + 共享中介者
///
/// 中介者以 `Arc` 共享：会话线程通过传输回调访问，控制逻辑通过
/// 此结构体的克隆访问。
pub struct FriDriver {
    /// 会话管理器
    pub manager: SessionManager,
    /// 状态 / 指令中介者
    pub intermediary: Arc<FriIntermediary>,
}

/// 驱动 Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use fri_driver::FriDriverBuilder;
///
/// // 默认限制 + 默认 UDP 配置
/// let driver = FriDriverBuilder::new().build().unwrap();
/// driver.manager.connect(30200, None).unwrap();
/// ```
pub struct FriDriverBuilder {
    /// 安全限制（可选，默认出厂限制）
    limits: Option<GuardLimits>,
    /// 安全限制配置文件路径（与 `limits` 互斥，文件优先）
    limits_file: Option<PathBuf>,
    /// UDP 会话配置（可选）
    udp_config: Option<UdpConfig>,
}

impl FriDriverBuilder {
    /// 创建新的 Builder
    pub fn new() -> Self {
        Self {
            limits: None,
            limits_file: None,
            udp_config: None,
        }
    }

    /// 设置安全限制（可选）
    pub fn guard_limits(mut self, limits: GuardLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// 从 TOML 文件加载安全限制（可选，优先于 `guard_limits`）
    pub fn guard_limits_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.limits_file = Some(path.into());
        self
    }

    /// 设置 UDP 会话配置（可选）
    pub fn udp_config(mut self, config: UdpConfig) -> Self {
        self.udp_config = Some(config);
        self
    }

    /// 解析最终生效的安全限制
    fn resolve_limits(&self) -> Result<GuardLimits, DriverError> {
        match &self.limits_file {
            Some(path) => GuardLimits::from_file(path),
            None => Ok(self.limits.clone().unwrap_or_default()),
        }
    }

    /// 构建驱动实例（UDP 会话）
    ///
    /// # 错误
    /// - [`DriverError::InvalidLimits`]: 限制配置非法
    /// - [`DriverError::Io`] / [`DriverError::ConfigParse`]: 限制文件读取 / 解析失败
    pub fn build(self) -> Result<FriDriver, DriverError> {
        let udp_config = self.udp_config.clone().unwrap_or_default();
        self.build_with_session(|intermediary| {
            Box::new(UdpFriSession::new(intermediary, udp_config))
        })
    }

    /// 构建驱动实例，由调用方提供会话（测试注入模拟会话用）
    ///
    /// 工厂以中介者为参数，便于把它作为周期回调接入会话。
    pub fn build_with_session(
        self,
        session_factory: impl FnOnce(Arc<dyn SessionHandler>) -> Box<dyn FriSession + Send>,
    ) -> Result<FriDriver, DriverError> {
        let limits = self.resolve_limits()?;
        let guard = CommandGuard::new(limits)?;
        let intermediary = Arc::new(FriIntermediary::new(guard));

        let session = session_factory(intermediary.clone());
        let manager = SessionManager::new(session);

        Ok(FriDriver {
            manager,
            intermediary,
        })
    }
}

impl Default for FriDriverBuilder {
    fn default() -> Self {
        Self::new()
    }
}
