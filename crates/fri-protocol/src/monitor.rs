//! 状态帧（控制器 -> 客户端）定义与编解码
//!
//! 每个周期控制器下发一帧 `MonitorFrame`，包含会话/安全/驱动等状态
//! 枚举、逐关节测量量以及两段式单调时间戳。
//!
//! 枚举字段在本层保持原始字节（`u8`）：封闭枚举的解码与防御性检查
//! 由上层（驱动层的 state_to_buffer）负责，协议层只保证布局正确。

use crate::{
    JOINT_COUNT, ProtocolError, get_f64, get_f64_array, get_u32, put_f64, put_f64_array, put_u32,
};

/// 状态帧编码后的字节长度
///
/// 布局：8 个枚举字节 + sample_time(f64) + timestamp_sec(u32) +
/// timestamp_nanosec(u32) + tracking_performance(f64) + 5 组逐关节 f64 数组
pub const MONITOR_FRAME_LEN: usize = 8 + 8 + 4 + 4 + 8 + 5 * JOINT_COUNT * 8;

/// 状态帧（wire 表示）
///
/// 字段顺序与线上布局一致。所有逐关节数组长度固定为 [`JOINT_COUNT`]。
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonitorFrame {
    /// 会话状态（原始字节，见 [`crate::SessionState`]）
    pub session_state: u8,
    /// 连接质量（原始字节）
    pub connection_quality: u8,
    /// 安全状态（原始字节）
    pub safety_state: u8,
    /// 操作模式（原始字节）
    pub operation_mode: u8,
    /// 驱动器状态（原始字节）
    pub drive_state: u8,
    /// 控制模式（原始字节）
    pub control_mode: u8,
    /// 叠加类型（原始字节）
    pub overlay_type: u8,
    /// 客户端指令模式（原始字节，见 [`crate::ClientCommandMode`]）
    pub client_command_mode: u8,
    /// 采样周期（秒）
    pub sample_time: f64,
    /// 时间戳（秒部分，单调递增）
    pub timestamp_sec: u32,
    /// 时间戳（纳秒部分）
    pub timestamp_nanosec: u32,
    /// 跟踪性能指标（0.0 - 1.0）
    pub tracking_performance: f64,
    /// 测量关节位置（rad）
    pub measured_joint_position: [f64; JOINT_COUNT],
    /// 测量关节力矩（Nm）
    pub measured_torque: [f64; JOINT_COUNT],
    /// 指令关节力矩（Nm）
    pub commanded_torque: [f64; JOINT_COUNT],
    /// 外部关节力矩（Nm）
    pub external_torque: [f64; JOINT_COUNT],
    /// 插值关节位置（rad），仅在指令阶段有效
    pub ipo_joint_position: [f64; JOINT_COUNT],
}

impl Default for MonitorFrame {
    fn default() -> Self {
        Self {
            session_state: 0,
            connection_quality: 0,
            safety_state: 0,
            operation_mode: 0,
            drive_state: 0,
            control_mode: 0,
            overlay_type: 0,
            client_command_mode: 0,
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

impl MonitorFrame {
    /// 编码为线上字节（大端）
    pub fn encode(&self) -> [u8; MONITOR_FRAME_LEN] {
        let mut buf = [0u8; MONITOR_FRAME_LEN];
        let mut offset = 0;

        buf[0] = self.session_state;
        buf[1] = self.connection_quality;
        buf[2] = self.safety_state;
        buf[3] = self.operation_mode;
        buf[4] = self.drive_state;
        buf[5] = self.control_mode;
        buf[6] = self.overlay_type;
        buf[7] = self.client_command_mode;
        offset += 8;

        put_f64(&mut buf, &mut offset, self.sample_time);
        put_u32(&mut buf, &mut offset, self.timestamp_sec);
        put_u32(&mut buf, &mut offset, self.timestamp_nanosec);
        put_f64(&mut buf, &mut offset, self.tracking_performance);

        put_f64_array(&mut buf, &mut offset, &self.measured_joint_position);
        put_f64_array(&mut buf, &mut offset, &self.measured_torque);
        put_f64_array(&mut buf, &mut offset, &self.commanded_torque);
        put_f64_array(&mut buf, &mut offset, &self.external_torque);
        put_f64_array(&mut buf, &mut offset, &self.ipo_joint_position);

        debug_assert_eq!(offset, MONITOR_FRAME_LEN);
        buf
    }

    /// 从线上字节解码
    ///
    /// 长度不符时返回 [`ProtocolError::InvalidLength`]。枚举字节在本层
    /// 不做取值检查（上层负责）。
    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.len() != MONITOR_FRAME_LEN {
            return Err(ProtocolError::InvalidLength {
                expected: MONITOR_FRAME_LEN,
                actual: buf.len(),
            });
        }

        let mut offset = 8;
        Ok(Self {
            session_state: buf[0],
            connection_quality: buf[1],
            safety_state: buf[2],
            operation_mode: buf[3],
            drive_state: buf[4],
            control_mode: buf[5],
            overlay_type: buf[6],
            client_command_mode: buf[7],
            sample_time: get_f64(buf, &mut offset),
            timestamp_sec: get_u32(buf, &mut offset),
            timestamp_nanosec: get_u32(buf, &mut offset),
            tracking_performance: get_f64(buf, &mut offset),
            measured_joint_position: get_f64_array(buf, &mut offset),
            measured_torque: get_f64_array(buf, &mut offset),
            commanded_torque: get_f64_array(buf, &mut offset),
            external_torque: get_f64_array(buf, &mut offset),
            ipo_joint_position: get_f64_array(buf, &mut offset),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> MonitorFrame {
        MonitorFrame {
            session_state: 4,
            connection_quality: 3,
            safety_state: 0,
            operation_mode: 2,
            drive_state: 2,
            control_mode: 0,
            overlay_type: 0,
            client_command_mode: 1,
            sample_time: 0.005,
            timestamp_sec: 1_700_000_000,
            timestamp_nanosec: 123_456_789,
            tracking_performance: 0.97,
            measured_joint_position: [0.1, -0.2, 0.3, -1.2, 0.5, 0.7, -0.1],
            measured_torque: [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0],
            commanded_torque: [0.5; JOINT_COUNT],
            external_torque: [-0.25; JOINT_COUNT],
            ipo_joint_position: [0.11, -0.21, 0.31, -1.21, 0.51, 0.71, -0.11],
        }
    }

    #[test]
    fn test_monitor_frame_roundtrip() {
        let frame = sample_frame();
        let encoded = frame.encode();
        assert_eq!(encoded.len(), MONITOR_FRAME_LEN);

        let decoded = MonitorFrame::decode(&encoded).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_monitor_frame_invalid_length() {
        let err = MonitorFrame::decode(&[0u8; 10]).unwrap_err();
        match err {
            ProtocolError::InvalidLength { expected, actual } => {
                assert_eq!(expected, MONITOR_FRAME_LEN);
                assert_eq!(actual, 10);
            },
            other => panic!("Expected InvalidLength, got {:?}", other),
        }
    }

    #[test]
    fn test_monitor_frame_enum_bytes_passthrough() {
        // 协议层不校验枚举取值，未知字节原样保留，由上层做防御性检查
        let mut frame = sample_frame();
        frame.client_command_mode = 0xFF;
        let decoded = MonitorFrame::decode(&frame.encode()).unwrap();
        assert_eq!(decoded.client_command_mode, 0xFF);
    }
}
