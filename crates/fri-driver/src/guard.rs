//! 指令安全校验（CommandGuard）
//!
//! 候选指令是否允许进入指令缓冲的唯一裁决者。校验是其两个输入
//! （候选指令 + 当前状态快照）加固定限制配置的纯函数：没有内部
//! 计数器，同样的输入永远得到同样的结论，可独立测试。
//!
//! 限制配置在构造时提供并校验，对象生命周期内不可变（不支持
//! 安全限制热更新）。

use crate::buffer::{RobotCommand, RobotState};
use crate::error::DriverError;
use fri_protocol::{ClientCommandMode, JOINT_COUNT, WRENCH_DIM};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// 安全限制配置
///
/// 所有数组按关节序号索引。可从 TOML 文件加载：
///
/// ```toml
/// min_joint_position = [-2.96, -2.09, -2.96, -2.09, -2.96, -2.09, -3.05]
/// max_joint_position = [2.96, 2.09, 2.96, 2.09, 2.96, 2.09, 3.05]
/// max_joint_velocity = [1.71, 1.71, 1.74, 2.26, 2.44, 3.14, 3.14]
/// max_torque = [320.0, 320.0, 176.0, 176.0, 110.0, 40.0, 40.0]
/// max_wrench = [150.0, 150.0, 150.0, 30.0, 30.0, 30.0]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardLimits {
    /// 关节位置下限（rad）
    pub min_joint_position: [f64; JOINT_COUNT],
    /// 关节位置上限（rad）
    pub max_joint_position: [f64; JOINT_COUNT],
    /// 关节最大速度（rad/s），用于折算单周期最大步长
    pub max_joint_velocity: [f64; JOINT_COUNT],
    /// 关节力矩上限（Nm）
    pub max_torque: [f64; JOINT_COUNT],
    /// 力旋量分量上限（N / Nm）
    pub max_wrench: [f64; WRENCH_DIM],
}

impl Default for GuardLimits {
    fn default() -> Self {
        Self {
            min_joint_position: [
                (-170.0_f64).to_radians(),
                (-120.0_f64).to_radians(),
                (-170.0_f64).to_radians(),
                (-120.0_f64).to_radians(),
                (-170.0_f64).to_radians(),
                (-120.0_f64).to_radians(),
                (-175.0_f64).to_radians(),
            ],
            max_joint_position: [
                170.0_f64.to_radians(),
                120.0_f64.to_radians(),
                170.0_f64.to_radians(),
                120.0_f64.to_radians(),
                170.0_f64.to_radians(),
                120.0_f64.to_radians(),
                175.0_f64.to_radians(),
            ],
            max_joint_velocity: [
                98.0_f64.to_radians(),
                98.0_f64.to_radians(),
                100.0_f64.to_radians(),
                130.0_f64.to_radians(),
                140.0_f64.to_radians(),
                180.0_f64.to_radians(),
                180.0_f64.to_radians(),
            ],
            max_torque: [320.0, 320.0, 176.0, 176.0, 110.0, 40.0, 40.0],
            max_wrench: [150.0, 150.0, 150.0, 30.0, 30.0, 30.0],
        }
    }
}

impl GuardLimits {
    /// 从 TOML 文件加载限制配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DriverError> {
        let content = std::fs::read_to_string(path)?;
        let limits: Self = toml::from_str(&content)?;
        Ok(limits)
    }

    /// 校验配置自身的一致性
    fn validate(&self) -> Result<(), DriverError> {
        for i in 0..JOINT_COUNT {
            if self.min_joint_position[i] >= self.max_joint_position[i] {
                return Err(DriverError::InvalidLimits(format!(
                    "joint {}: min position {} >= max position {}",
                    i, self.min_joint_position[i], self.max_joint_position[i]
                )));
            }
            if self.max_joint_velocity[i] <= 0.0 || !self.max_joint_velocity[i].is_finite() {
                return Err(DriverError::InvalidLimits(format!(
                    "joint {}: max velocity {} must be finite and positive",
                    i, self.max_joint_velocity[i]
                )));
            }
            if self.max_torque[i] <= 0.0 || !self.max_torque[i].is_finite() {
                return Err(DriverError::InvalidLimits(format!(
                    "joint {}: max torque {} must be finite and positive",
                    i, self.max_torque[i]
                )));
            }
        }
        for (i, max) in self.max_wrench.iter().enumerate() {
            if *max <= 0.0 || !max.is_finite() {
                return Err(DriverError::InvalidLimits(format!(
                    "wrench component {}: max {} must be finite and positive",
                    i, max
                )));
            }
        }
        Ok(())
    }
}

/// 指令安全校验器
#[derive(Debug, Clone)]
pub struct CommandGuard {
    limits: GuardLimits,
}

impl CommandGuard {
    /// 创建校验器；非法限制配置同步报错
    pub fn new(limits: GuardLimits) -> Result<Self, DriverError> {
        limits.validate()?;
        Ok(Self { limits })
    }

    /// 当前生效的限制配置
    pub fn limits(&self) -> &GuardLimits {
        &self.limits
    }

    /// 候选指令是否允许进入指令缓冲
    ///
    /// 按当前指令模式检查对应字段：
    /// - `NoCommand`: 监控阶段不接受任何候选指令
    /// - `JointPosition`: 关节位置范围 + 单周期步长
    /// - `Wrench`: 关节位置检查 + 力旋量幅值
    /// - `Torque`: 关节位置检查 + 力矩幅值
    pub fn is_valid(&self, command: &RobotCommand, state: &RobotState) -> bool {
        match state.client_command_mode {
            ClientCommandMode::NoCommand => {
                warn!("Rejecting command: controller is in no-command mode");
                false
            },
            ClientCommandMode::JointPosition => self.check_joint_position(command, state),
            ClientCommandMode::Wrench => {
                self.check_joint_position(command, state) && self.check_wrench(command)
            },
            ClientCommandMode::Torque => {
                self.check_joint_position(command, state) && self.check_torque(command)
            },
        }
    }

    /// 关节位置：有限值、范围、单周期步长
    fn check_joint_position(&self, command: &RobotCommand, state: &RobotState) -> bool {
        // 步长参考：指令阶段以控制器插值位置为准，其余阶段用测量位置
        let reference = if state.session_state.is_commanding() {
            &state.ipo_joint_position
        } else {
            &state.measured_joint_position
        };

        for i in 0..JOINT_COUNT {
            let target = command.joint_position[i];
            if !target.is_finite() {
                warn!("Rejecting command: joint {} position is not finite", i);
                return false;
            }
            if target < self.limits.min_joint_position[i] || target > self.limits.max_joint_position[i] {
                warn!(
                    "Rejecting command: joint {} position {} outside [{}, {}]",
                    i, target, self.limits.min_joint_position[i], self.limits.max_joint_position[i]
                );
                return false;
            }
            // sample_time 为 0 时（尚未收到有效状态）无法折算步长，跳过速度检查
            if state.sample_time > 0.0 {
                let max_step = self.limits.max_joint_velocity[i] * state.sample_time;
                let step = (target - reference[i]).abs();
                if step > max_step {
                    warn!(
                        "Rejecting command: joint {} step {} exceeds per-cycle limit {}",
                        i, step, max_step
                    );
                    return false;
                }
            }
        }
        true
    }

    /// 力旋量：有限值、分量幅值
    fn check_wrench(&self, command: &RobotCommand) -> bool {
        for i in 0..WRENCH_DIM {
            let value = command.wrench[i];
            if !value.is_finite() {
                warn!("Rejecting command: wrench component {} is not finite", i);
                return false;
            }
            if value.abs() > self.limits.max_wrench[i] {
                warn!(
                    "Rejecting command: wrench component {} magnitude {} exceeds limit {}",
                    i,
                    value.abs(),
                    self.limits.max_wrench[i]
                );
                return false;
            }
        }
        true
    }

    /// 力矩：有限值、幅值
    fn check_torque(&self, command: &RobotCommand) -> bool {
        for i in 0..JOINT_COUNT {
            let value = command.torque[i];
            if !value.is_finite() {
                warn!("Rejecting command: joint {} torque is not finite", i);
                return false;
            }
            if value.abs() > self.limits.max_torque[i] {
                warn!(
                    "Rejecting command: joint {} torque magnitude {} exceeds limit {}",
                    i,
                    value.abs(),
                    self.limits.max_torque[i]
                );
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fri_protocol::SessionState;

    /// 指令阶段、关节位置模式的基准状态
    fn commanding_state(mode: ClientCommandMode) -> RobotState {
        RobotState {
            session_state: SessionState::CommandingActive,
            client_command_mode: mode,
            sample_time: 0.005,
            ipo_joint_position: [0.0; JOINT_COUNT],
            measured_joint_position: [0.0; JOINT_COUNT],
            ..Default::default()
        }
    }

    fn guard() -> CommandGuard {
        CommandGuard::new(GuardLimits::default()).unwrap()
    }

    #[test]
    fn test_invalid_limits_rejected_at_construction() {
        let mut limits = GuardLimits::default();
        limits.min_joint_position[2] = 1.0;
        limits.max_joint_position[2] = -1.0;
        assert!(matches!(CommandGuard::new(limits), Err(DriverError::InvalidLimits(_))));

        let mut limits = GuardLimits::default();
        limits.max_joint_velocity[0] = 0.0;
        assert!(CommandGuard::new(limits).is_err());

        let mut limits = GuardLimits::default();
        limits.max_wrench[5] = -1.0;
        assert!(CommandGuard::new(limits).is_err());
    }

    #[test]
    fn test_no_command_mode_rejects_everything() {
        let guard = guard();
        let state = commanding_state(ClientCommandMode::NoCommand);
        assert!(!guard.is_valid(&RobotCommand::default(), &state));
    }

    #[test]
    fn test_small_step_within_limits_is_valid() {
        let guard = guard();
        let state = commanding_state(ClientCommandMode::JointPosition);

        let mut command = RobotCommand::default();
        // 0.005s 周期下 98°/s 允许约 0.0086 rad 步长
        command.joint_position[0] = 0.005;
        assert!(guard.is_valid(&command, &state));
    }

    #[test]
    fn test_step_exceeding_velocity_limit_is_rejected() {
        let guard = guard();
        let state = commanding_state(ClientCommandMode::JointPosition);

        let mut command = RobotCommand::default();
        command.joint_position[0] = 0.5; // 一个周期跳 0.5 rad
        assert!(!guard.is_valid(&command, &state));
    }

    #[test]
    fn test_position_outside_range_is_rejected() {
        let guard = guard();
        let mut state = commanding_state(ClientCommandMode::JointPosition);
        // 把参考位置推到上限附近，使步长检查不先触发
        state.ipo_joint_position[1] = 120.0_f64.to_radians();

        let mut command = RobotCommand::default();
        command.joint_position[1] = 121.0_f64.to_radians();
        assert!(!guard.is_valid(&command, &state));
    }

    #[test]
    fn test_non_finite_position_is_rejected() {
        let guard = guard();
        let state = commanding_state(ClientCommandMode::JointPosition);

        let mut command = RobotCommand::default();
        command.joint_position[3] = f64::NAN;
        assert!(!guard.is_valid(&command, &state));

        command.joint_position[3] = f64::INFINITY;
        assert!(!guard.is_valid(&command, &state));
    }

    #[test]
    fn test_wrench_mode_checks_wrench_magnitude() {
        let guard = guard();
        let state = commanding_state(ClientCommandMode::Wrench);

        let mut command = RobotCommand::default();
        command.wrench = [10.0, -10.0, 20.0, 1.0, -1.0, 2.0];
        assert!(guard.is_valid(&command, &state));

        command.wrench[3] = 31.0; // 力矩分量上限 30
        assert!(!guard.is_valid(&command, &state));
    }

    #[test]
    fn test_torque_mode_checks_torque_magnitude() {
        let guard = guard();
        let state = commanding_state(ClientCommandMode::Torque);

        let mut command = RobotCommand::default();
        command.torque = [10.0, -10.0, 5.0, 5.0, 5.0, 5.0, 5.0];
        assert!(guard.is_valid(&command, &state));

        command.torque[6] = 41.0; // 关节 7 力矩上限 40
        assert!(!guard.is_valid(&command, &state));
    }

    #[test]
    fn test_step_reference_uses_measured_outside_commanding() {
        let guard = guard();
        let mut state = commanding_state(ClientCommandMode::JointPosition);
        state.session_state = SessionState::MonitoringReady;
        state.measured_joint_position[0] = 1.0;
        state.ipo_joint_position[0] = 0.0; // 指令阶段外插值位置是陈旧数据

        let mut command = RobotCommand::default();
        command.joint_position[0] = 1.005;
        assert!(guard.is_valid(&command, &state));
    }

    #[test]
    fn test_guard_is_pure() {
        // 同样的输入反复校验，结论必须一致（热路径上不允许隐藏状态）
        let guard = guard();
        let state = commanding_state(ClientCommandMode::JointPosition);
        let mut command = RobotCommand::default();
        command.joint_position[0] = 0.005;

        for _ in 0..100 {
            assert!(guard.is_valid(&command, &state));
        }
    }
}
