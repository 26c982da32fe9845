//! 控制器状态枚举定义
//!
//! 所有枚举均由控制器在每个周期的状态帧中下发，线上表示为单字节。
//! 使用 `num_enum` 做封闭枚举与原始字节之间的转换：未知字节在
//! `try_from` 时报错，而不是携带一个开放的 "Unknown" 变体。

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// 客户端指令模式
///
/// 由控制器声明本周期指令帧中哪些字段有意义。客户端只负责回显，
/// 不允许自行切换模式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ClientCommandMode {
    /// 无指令模式（监控阶段，不需要下发任何指令字段）
    NoCommand = 0,
    /// 关节位置模式
    JointPosition = 1,
    /// 力旋量模式（关节位置 + 笛卡尔力旋量）
    Wrench = 2,
    /// 力矩模式（关节位置 + 关节力矩）
    Torque = 3,
}

/// 会话状态
///
/// 只有 `CommandingWait` 和 `CommandingActive` 两个状态下控制器
/// 才会填充插值关节位置（参见 `MonitorFrame::ipo_joint_position`）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum SessionState {
    Idle = 0,
    MonitoringWait = 1,
    MonitoringReady = 2,
    CommandingWait = 3,
    CommandingActive = 4,
}

impl SessionState {
    /// 是否处于指令阶段（控制器会下发插值关节位置）
    pub fn is_commanding(&self) -> bool {
        matches!(self, SessionState::CommandingWait | SessionState::CommandingActive)
    }
}

/// 连接质量
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ConnectionQuality {
    Poor = 0,
    Fair = 1,
    Good = 2,
    Excellent = 3,
}

/// 安全状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum SafetyState {
    NormalOperation = 0,
    SafetyStopLevel0 = 1,
    SafetyStopLevel1 = 2,
    SafetyStopLevel2 = 3,
}

/// 操作模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum OperationMode {
    TestMode1 = 0,
    TestMode2 = 1,
    AutomaticMode = 2,
}

/// 驱动器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum DriveState {
    Off = 0,
    Transitioning = 1,
    Active = 2,
}

/// 控制模式（控制器侧当前生效的控制律）
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ControlMode {
    PositionControl = 0,
    CartesianImpedanceControl = 1,
    JointImpedanceControl = 2,
    NoControl = 3,
}

/// 叠加类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum OverlayType {
    NoOverlay = 0,
    Joint = 1,
    Cartesian = 2,
}
