//! 状态 / 指令中介者
//!
//! 每个控制周期在实时执行上下文中被调用一次，完成 wire 表示与应用层
//! 缓冲之间的四个方向转换，并在指令进入缓冲前套用安全校验。
//!
//! ## 并发契约
//!
//! - 状态快照用 `ArcSwap` 发布：会话线程是唯一写者（整帧替换），
//!   控制线程无锁读取（`load`），不存在半新半旧的快照
//! - 指令缓冲用 `parking_lot::Mutex` 作为邮箱：控制线程写入
//!   （通过安全门），会话线程每周期读出渲染

use crate::buffer::{RobotCommand, RobotState};
use crate::guard::CommandGuard;
use arc_swap::ArcSwap;
use fri_protocol::{
    ClientCommandMode, CommandFrame, ConnectionQuality, ControlMode, DriveState, MonitorFrame,
    OperationMode, OverlayType, SafetyState, SessionState,
};
use fri_transport::SessionHandler;
use num_enum::TryFromPrimitive;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::warn;

/// 解码单个枚举字节；未知取值记录日志并返回 None
fn decode_enum<T: TryFromPrimitive<Primitive = u8>>(field: &'static str, value: u8) -> Option<T> {
    match T::try_from_primitive(value) {
        Ok(decoded) => Some(decoded),
        Err(_) => {
            warn!("Unknown {} byte in monitor frame: {}", field, value);
            None
        },
    }
}

/// 状态 / 指令中介者
///
/// 持有状态快照与指令邮箱，是指令到达控制器前的唯一安全门：
/// 任何候选指令必须先通过 [`CommandGuard`] 才能进入缓冲。
/// `buffer_to_command` 信任缓冲内容（已经过安全门），不做二次校验。
pub struct FriIntermediary {
    /// 安全校验器（构造后不可变）
    guard: CommandGuard,
    /// 最近一帧状态快照（会话线程整帧替换，控制线程无锁读取）
    state: ArcSwap<RobotState>,
    /// 指令邮箱（最近一次通过校验的指令）
    command: Mutex<RobotCommand>,
}

impl FriIntermediary {
    /// 创建中介者；快照与指令缓冲初始为全零默认值
    pub fn new(guard: CommandGuard) -> Self {
        Self {
            guard,
            state: ArcSwap::from_pointee(RobotState::default()),
            command: Mutex::new(RobotCommand::default()),
        }
    }

    /// 将指令缓冲重置为全零
    ///
    /// 在产生第一条有效指令之前、或作为故障安全回退时使用。
    pub fn zero_command_buffer(&self) -> bool {
        *self.command.lock() = RobotCommand::default();
        true
    }

    /// 候选指令经安全门进入指令缓冲
    ///
    /// - `None` 立即拒绝，缓冲不变
    /// - 校验失败拒绝（正常结果，不是错误），缓冲不变
    /// - 校验通过则整份拷入缓冲
    pub fn command_to_buffer(&self, candidate: Option<&RobotCommand>) -> bool {
        let Some(candidate) = candidate else {
            return false;
        };
        if self.guard.is_valid(candidate, &self.state.load()) {
            *self.command.lock() = *candidate;
            return true;
        }
        false
    }

    /// 按当前指令模式把指令缓冲渲染进 wire 指令帧
    ///
    /// 快照中的模式是封闭枚举（未知字节在 `state_to_buffer` 解码时
    /// 已被拒绝），因此这里的 match 是穷尽的，不需要未知分支。
    pub fn buffer_to_command(&self, out: &mut CommandFrame) -> bool {
        let state = self.state.load();
        let command = *self.command.lock();

        match state.client_command_mode {
            // 监控阶段：什么都不发
            ClientCommandMode::NoCommand => true,
            ClientCommandMode::JointPosition => {
                out.set_joint_position(&command.joint_position);
                true
            },
            ClientCommandMode::Wrench => {
                out.set_joint_position(&command.joint_position);
                out.set_wrench(&command.wrench);
                true
            },
            ClientCommandMode::Torque => {
                out.set_joint_position(&command.joint_position);
                out.set_torque(&command.torque);
                true
            },
        }
    }

    /// 将收到的 wire 状态帧转入状态快照（整帧原子替换）
    ///
    /// 在旧快照的副本上完成全部字段填充与枚举解码，任何一个枚举
    /// 字节非法都会放弃整次转换（返回 false），已发布的快照保持
    /// 完整。插值关节位置仅在指令阶段覆盖，其余阶段保留旧值。
    pub fn state_to_buffer(&self, wire: &MonitorFrame) -> bool {
        let mut next = **self.state.load();

        let Some(session_state) = decode_enum::<SessionState>("session state", wire.session_state)
        else {
            return false;
        };
        let Some(connection_quality) =
            decode_enum::<ConnectionQuality>("connection quality", wire.connection_quality)
        else {
            return false;
        };
        let Some(safety_state) = decode_enum::<SafetyState>("safety state", wire.safety_state)
        else {
            return false;
        };
        let Some(operation_mode) =
            decode_enum::<OperationMode>("operation mode", wire.operation_mode)
        else {
            return false;
        };
        let Some(drive_state) = decode_enum::<DriveState>("drive state", wire.drive_state) else {
            return false;
        };
        let Some(control_mode) = decode_enum::<ControlMode>("control mode", wire.control_mode)
        else {
            return false;
        };
        let Some(overlay_type) = decode_enum::<OverlayType>("overlay type", wire.overlay_type)
        else {
            return false;
        };
        let Some(client_command_mode) =
            decode_enum::<ClientCommandMode>("client command mode", wire.client_command_mode)
        else {
            return false;
        };

        next.session_state = session_state;
        next.connection_quality = connection_quality;
        next.safety_state = safety_state;
        next.operation_mode = operation_mode;
        next.drive_state = drive_state;
        next.control_mode = control_mode;
        next.overlay_type = overlay_type;
        next.client_command_mode = client_command_mode;
        next.sample_time = wire.sample_time;
        next.timestamp_sec = wire.timestamp_sec;
        next.timestamp_nanosec = wire.timestamp_nanosec;
        next.tracking_performance = wire.tracking_performance;
        next.measured_joint_position = wire.measured_joint_position;
        next.measured_torque = wire.measured_torque;
        next.commanded_torque = wire.commanded_torque;
        next.external_torque = wire.external_torque;
        // 插值位置只在指令阶段有效；其余阶段保留旧值（陈旧数据，
        // 使用方必须先检查 session_state）
        if session_state.is_commanding() {
            next.ipo_joint_position = wire.ipo_joint_position;
        }

        self.state.store(Arc::new(next));
        true
    }

    /// 将状态快照拷出到调用方提供的缓冲
    pub fn buffer_to_state(&self, out: &mut RobotState) -> bool {
        *out = **self.state.load();
        true
    }

    /// 获取状态快照（无锁，纳秒级返回）
    ///
    /// 返回 Arc 引用，适合控制循环高频读取。
    pub fn snapshot(&self) -> Arc<RobotState> {
        self.state.load_full()
    }

    /// 当前指令缓冲内容（拷贝）
    pub fn command_buffer(&self) -> RobotCommand {
        *self.command.lock()
    }
}

impl SessionHandler for FriIntermediary {
    fn on_state(&self, state: &MonitorFrame) -> bool {
        self.state_to_buffer(state)
    }

    fn fill_command(&self, command: &mut CommandFrame) -> bool {
        self.buffer_to_command(command)
    }
}
