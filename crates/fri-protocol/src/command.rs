//! 指令帧（客户端 -> 控制器）定义与编解码
//!
//! 指令帧携带关节位置目标、笛卡尔力旋量和关节力矩目标，外加一个
//! 置位掩码记录哪些字段被显式写入。控制器只读取掩码中置位的字段，
//! 因此 "不写任何字段" 与 "写入全零" 在线上是可区分的两种帧。

use crate::{JOINT_COUNT, ProtocolError, WRENCH_DIM, get_f64_array, put_f64_array};

/// 指令帧编码后的字节长度（掩码 1 字节 + 7+6+7 个 f64）
pub const COMMAND_FRAME_LEN: usize = 1 + (JOINT_COUNT + WRENCH_DIM + JOINT_COUNT) * 8;

/// 关节位置字段置位标志
pub const FIELD_JOINT_POSITION: u8 = 1 << 0;
/// 力旋量字段置位标志
pub const FIELD_WRENCH: u8 = 1 << 1;
/// 力矩字段置位标志
pub const FIELD_TORQUE: u8 = 1 << 2;

/// 指令帧（wire 表示）
///
/// 新构造的帧不置位任何字段；通过 `set_joint_position` /
/// `set_wrench` / `set_torque` 写入数据并置位对应标志。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommandFrame {
    fields: u8,
    joint_position: [f64; JOINT_COUNT],
    wrench: [f64; WRENCH_DIM],
    torque: [f64; JOINT_COUNT],
}

impl CommandFrame {
    /// 创建空指令帧（不置位任何字段）
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入关节位置目标（rad）并置位
    pub fn set_joint_position(&mut self, joint_position: &[f64; JOINT_COUNT]) {
        self.joint_position = *joint_position;
        self.fields |= FIELD_JOINT_POSITION;
    }

    /// 写入笛卡尔力旋量并置位
    pub fn set_wrench(&mut self, wrench: &[f64; WRENCH_DIM]) {
        self.wrench = *wrench;
        self.fields |= FIELD_WRENCH;
    }

    /// 写入关节力矩目标（Nm）并置位
    pub fn set_torque(&mut self, torque: &[f64; JOINT_COUNT]) {
        self.torque = *torque;
        self.fields |= FIELD_TORQUE;
    }

    /// 置位掩码
    pub fn fields(&self) -> u8 {
        self.fields
    }

    /// 是否未写入任何字段
    pub fn is_empty(&self) -> bool {
        self.fields == 0
    }

    /// 关节位置目标（仅当 [`FIELD_JOINT_POSITION`] 置位时有意义）
    pub fn joint_position(&self) -> &[f64; JOINT_COUNT] {
        &self.joint_position
    }

    /// 力旋量（仅当 [`FIELD_WRENCH`] 置位时有意义）
    pub fn wrench(&self) -> &[f64; WRENCH_DIM] {
        &self.wrench
    }

    /// 力矩目标（仅当 [`FIELD_TORQUE`] 置位时有意义）
    pub fn torque(&self) -> &[f64; JOINT_COUNT] {
        &self.torque
    }

    /// 编码为线上字节（大端）
    pub fn encode(&self) -> [u8; COMMAND_FRAME_LEN] {
        let mut buf = [0u8; COMMAND_FRAME_LEN];
        buf[0] = self.fields;
        let mut offset = 1;
        put_f64_array(&mut buf, &mut offset, &self.joint_position);
        put_f64_array(&mut buf, &mut offset, &self.wrench);
        put_f64_array(&mut buf, &mut offset, &self.torque);
        debug_assert_eq!(offset, COMMAND_FRAME_LEN);
        buf
    }

    /// 从线上字节解码
    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.len() != COMMAND_FRAME_LEN {
            return Err(ProtocolError::InvalidLength {
                expected: COMMAND_FRAME_LEN,
                actual: buf.len(),
            });
        }

        let mut offset = 1;
        Ok(Self {
            fields: buf[0],
            joint_position: get_f64_array(buf, &mut offset),
            wrench: get_f64_array(buf, &mut offset),
            torque: get_f64_array(buf, &mut offset),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_command_frame_is_empty() {
        let frame = CommandFrame::new();
        assert!(frame.is_empty());
        assert_eq!(frame.fields(), 0);
    }

    #[test]
    fn test_setters_raise_field_flags() {
        let mut frame = CommandFrame::new();

        frame.set_joint_position(&[0.1; JOINT_COUNT]);
        assert_eq!(frame.fields(), FIELD_JOINT_POSITION);

        frame.set_wrench(&[1.0, 2.0, 3.0, 0.1, 0.2, 0.3]);
        assert_eq!(frame.fields(), FIELD_JOINT_POSITION | FIELD_WRENCH);

        frame.set_torque(&[-0.5; JOINT_COUNT]);
        assert_eq!(frame.fields(), FIELD_JOINT_POSITION | FIELD_WRENCH | FIELD_TORQUE);
        assert_eq!(frame.joint_position(), &[0.1; JOINT_COUNT]);
        assert_eq!(frame.torque(), &[-0.5; JOINT_COUNT]);
    }

    #[test]
    fn test_command_frame_roundtrip() {
        let mut frame = CommandFrame::new();
        frame.set_joint_position(&[0.1, -0.2, 0.3, -0.4, 0.5, -0.6, 0.7]);
        frame.set_wrench(&[5.0, -5.0, 2.5, 0.0, 1.0, -1.0]);

        let encoded = frame.encode();
        assert_eq!(encoded.len(), COMMAND_FRAME_LEN);

        let decoded = CommandFrame::decode(&encoded).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_command_frame_invalid_length() {
        assert!(CommandFrame::decode(&[0u8; COMMAND_FRAME_LEN - 1]).is_err());
        assert!(CommandFrame::decode(&[]).is_err());
    }
}
