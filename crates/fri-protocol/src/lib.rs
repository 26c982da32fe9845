//! # FRI Protocol
//!
//! 机械臂实时控制（FRI 风格）循环协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `enums`: 控制器状态枚举定义（会话状态、指令模式等）
//! - `monitor`: 状态帧（控制器 -> 客户端）定义与编解码
//! - `command`: 指令帧（客户端 -> 控制器）定义与编解码
//!
//! ## 字节序
//!
//! 协议使用高位在前（大端字节序），所有浮点字段为 IEEE 754 f64。
//! 每个周期控制器下发一帧 `MonitorFrame`，客户端必须在周期截止前
//! 回复一帧 `CommandFrame`。

pub mod command;
pub mod enums;
pub mod monitor;

// 重新导出常用类型
pub use command::*;
pub use enums::*;
pub use monitor::*;

use thiserror::Error;

/// 机械臂关节数（7 轴）
pub const JOINT_COUNT: usize = 7;

/// 笛卡尔力旋量维度（fx, fy, fz, tx, ty, tz）
pub const WRENCH_DIM: usize = 6;

/// 协议解析错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid frame length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Invalid value for field {field}: {value}")]
    InvalidValue { field: &'static str, value: u8 },
}

/// 字节序转换工具函数
///
/// 协议使用高位在前（大端字节序），这些函数用于在协议层按偏移
/// 顺序读写字段。
///
/// 写入 f64（大端）并前移偏移
pub(crate) fn put_f64(buf: &mut [u8], offset: &mut usize, value: f64) {
    buf[*offset..*offset + 8].copy_from_slice(&value.to_be_bytes());
    *offset += 8;
}

/// 读取 f64（大端）并前移偏移
pub(crate) fn get_f64(buf: &[u8], offset: &mut usize) -> f64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[*offset..*offset + 8]);
    *offset += 8;
    f64::from_be_bytes(bytes)
}

/// 写入 u32（大端）并前移偏移
pub(crate) fn put_u32(buf: &mut [u8], offset: &mut usize, value: u32) {
    buf[*offset..*offset + 4].copy_from_slice(&value.to_be_bytes());
    *offset += 4;
}

/// 读取 u32（大端）并前移偏移
pub(crate) fn get_u32(buf: &[u8], offset: &mut usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buf[*offset..*offset + 4]);
    *offset += 4;
    u32::from_be_bytes(bytes)
}

/// 写入定长 f64 数组（大端）并前移偏移
pub(crate) fn put_f64_array(buf: &mut [u8], offset: &mut usize, values: &[f64]) {
    for value in values {
        put_f64(buf, offset, *value);
    }
}

/// 读取定长 f64 数组（大端）并前移偏移
pub(crate) fn get_f64_array<const N: usize>(buf: &[u8], offset: &mut usize) -> [f64; N] {
    let mut values = [0.0; N];
    for value in values.iter_mut() {
        *value = get_f64(buf, offset);
    }
    values
}
