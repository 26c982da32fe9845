//! 应用层状态 / 指令缓冲类型
//!
//! 纯数据容器：[`RobotCommand`] 保存最近一次通过安全校验的候选指令，
//! [`RobotState`] 保存最近一次收到的控制器状态快照。两者不含任何
//! 行为，所有读写都经由中介者（[`crate::FriIntermediary`]）完成。

use fri_protocol::{
    ClientCommandMode, ConnectionQuality, ControlMode, DriveState, JOINT_COUNT, OperationMode,
    OverlayType, SafetyState, SessionState, WRENCH_DIM,
};

/// 应用层指令缓冲
///
/// 字段是否有意义由控制器下发的 [`ClientCommandMode`] 决定；
/// 渲染为指令帧时只写入当前模式要求的字段。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobotCommand {
    /// 关节位置目标（rad）
    pub joint_position: [f64; JOINT_COUNT],
    /// 笛卡尔力旋量（fx, fy, fz, tx, ty, tz）
    pub wrench: [f64; WRENCH_DIM],
    /// 关节力矩目标（Nm）
    pub torque: [f64; JOINT_COUNT],
}

impl Default for RobotCommand {
    fn default() -> Self {
        Self {
            joint_position: [0.0; JOINT_COUNT],
            wrench: [0.0; WRENCH_DIM],
            torque: [0.0; JOINT_COUNT],
        }
    }
}

/// 应用层状态快照
///
/// 每个周期被中介者整体替换（arc-swap 原子发布），不存在部分更新：
/// 转换失败时上一份快照保持完整。`ipo_joint_position` 仅在指令阶段
/// （CommandingWait / CommandingActive）更新，其余会话状态下保留
/// 上一次的值，使用前必须先检查 `session_state`。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobotState {
    /// 会话状态
    pub session_state: SessionState,
    /// 连接质量
    pub connection_quality: ConnectionQuality,
    /// 安全状态
    pub safety_state: SafetyState,
    /// 操作模式
    pub operation_mode: OperationMode,
    /// 驱动器状态
    pub drive_state: DriveState,
    /// 控制模式
    pub control_mode: ControlMode,
    /// 叠加类型
    pub overlay_type: OverlayType,
    /// 客户端指令模式（总是反映最近一帧状态）
    pub client_command_mode: ClientCommandMode,
    /// 采样周期（秒）
    pub sample_time: f64,
    /// 时间戳（秒部分）
    pub timestamp_sec: u32,
    /// 时间戳（纳秒部分）
    pub timestamp_nanosec: u32,
    /// 跟踪性能指标
    pub tracking_performance: f64,
    /// 测量关节位置（rad）
    pub measured_joint_position: [f64; JOINT_COUNT],
    /// 测量关节力矩（Nm）
    pub measured_torque: [f64; JOINT_COUNT],
    /// 指令关节力矩（Nm）
    pub commanded_torque: [f64; JOINT_COUNT],
    /// 外部关节力矩（Nm）
    pub external_torque: [f64; JOINT_COUNT],
    /// 插值关节位置（rad），仅指令阶段有效
    pub ipo_joint_position: [f64; JOINT_COUNT],
}

impl Default for RobotState {
    fn default() -> Self {
        Self {
            session_state: SessionState::Idle,
            connection_quality: ConnectionQuality::Poor,
            safety_state: SafetyState::NormalOperation,
            operation_mode: OperationMode::TestMode1,
            drive_state: DriveState::Off,
            control_mode: ControlMode::NoControl,
            overlay_type: OverlayType::NoOverlay,
            client_command_mode: ClientCommandMode::NoCommand,
            sample_time: 0.0,
            timestamp_sec: 0,
            timestamp_nanosec: 0,
            tracking_performance: 0.0,
            measured_joint_position: [0.0; JOINT_COUNT],
            measured_torque: [0.0; JOINT_COUNT],
            commanded_torque: [0.0; JOINT_COUNT],
            external_torque: [0.0; JOINT_COUNT],
            ipo_joint_position: [0.0; JOINT_COUNT],
        }
    }
}
