//! UDP 循环会话实现
//!
//! 客户端绑定本地端口，控制器按固定周期向该端口发送状态数据报；
//! 客户端在周期截止前把指令数据报回发给对端。
//!
//! ## 对端地址
//!
//! - 指定 `remote_host` 时，指令直接发往该地址
//! - 未指定时，从收到的第一个状态数据报学习对端地址
//!
//! ## 超时语义
//!
//! 单次接收超时视为丢失一个周期（可恢复，跳过本周期继续）；
//! 连续丢失超过 `max_missed_cycles` 个周期则认为控制器离线，
//! step 返回致命错误，由上层强制断开会话。

use crate::{FriSession, SessionHandler, TransportError};
use fri_protocol::{CommandFrame, MONITOR_FRAME_LEN, MonitorFrame};
use std::io::ErrorKind;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, trace, warn};

/// UDP 会话配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpConfig {
    /// 单次接收超时（毫秒）
    pub receive_timeout_ms: u64,
    /// 连续丢失周期容忍上限，超过即认为控制器离线
    pub max_missed_cycles: u32,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            // 控制器周期为毫秒级，20ms 足以覆盖抖动
            receive_timeout_ms: 20,
            max_missed_cycles: 10,
        }
    }
}

/// UDP 循环会话
pub struct UdpFriSession {
    /// 周期回调（驱动层中介者）
    handler: Arc<dyn SessionHandler>,
    /// 会话配置
    config: UdpConfig,
    /// 已绑定的 socket（None 表示会话未打开）
    socket: Option<UdpSocket>,
    /// 对端地址（显式配置或从首包学习）
    peer: Option<SocketAddr>,
    /// 连续丢失周期计数
    missed: u32,
    /// 接收缓冲区（状态帧定长，留出余量以检测超长数据报）
    buf: [u8; MONITOR_FRAME_LEN + 64],
}

impl UdpFriSession {
    /// 创建新的 UDP 会话（未打开）
    pub fn new(handler: Arc<dyn SessionHandler>, config: UdpConfig) -> Self {
        Self {
            handler,
            config,
            socket: None,
            peer: None,
            missed: 0,
            buf: [0u8; MONITOR_FRAME_LEN + 64],
        }
    }

    /// 解析显式对端地址
    fn resolve_peer(remote_host: &str, port: u16) -> Result<SocketAddr, TransportError> {
        let mut addrs = (remote_host, port).to_socket_addrs()?;
        addrs.next().ok_or_else(|| {
            TransportError::Io(std::io::Error::new(
                ErrorKind::AddrNotAvailable,
                format!("Failed to resolve remote host '{}'", remote_host),
            ))
        })
    }
}

impl FriSession for UdpFriSession {
    fn open(&mut self, port: u16, remote_host: Option<&str>) -> Result<bool, TransportError> {
        let socket = UdpSocket::bind(("0.0.0.0", port))?;
        socket.set_read_timeout(Some(Duration::from_millis(self.config.receive_timeout_ms)))?;

        self.peer = match remote_host {
            Some(host) => Some(Self::resolve_peer(host, port)?),
            // 对端地址从控制器首包学习
            None => None,
        };
        self.socket = Some(socket);
        self.missed = 0;

        info!("UDP session bound on port {} (peer: {:?})", port, self.peer);
        Ok(true)
    }

    fn step(&mut self) -> Result<bool, TransportError> {
        let socket = self.socket.as_ref().ok_or(TransportError::NotOpen)?;

        // 1. 接收状态数据报（带超时）
        let (len, addr) = match socket.recv_from(&mut self.buf) {
            Ok(received) => received,
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                self.missed += 1;
                if self.missed >= self.config.max_missed_cycles {
                    return Err(TransportError::ControllerUnreachable { missed: self.missed });
                }
                trace!("Cycle missed ({}/{})", self.missed, self.config.max_missed_cycles);
                return Ok(true);
            },
            Err(e) => return Err(TransportError::Io(e)),
        };

        // 来自未知对端的数据报直接丢弃
        if let Some(peer) = self.peer
            && addr != peer
        {
            warn!("Dropping datagram from unexpected peer {}", addr);
            return Ok(true);
        }

        // 2. 解码状态帧（畸形数据报跳过本周期，不终止会话）
        let state = match MonitorFrame::decode(&self.buf[..len]) {
            Ok(state) => state,
            Err(e) => {
                warn!("Failed to decode monitor frame from {}: {}", addr, e);
                return Ok(true);
            },
        };

        // 控制器仍然在线，重置丢失计数并记录对端
        self.missed = 0;
        let peer = *self.peer.get_or_insert_with(|| {
            info!("Learned controller address from first datagram: {}", addr);
            addr
        });

        // 3. 状态交给中介者
        if !self.handler.on_state(&state) {
            warn!("Monitor frame rejected by handler, command left unchanged");
        }

        // 4. 取回指令帧并发送；渲染失败时发送空帧（无字段置位）保住周期
        let mut command = CommandFrame::new();
        if !self.handler.fill_command(&mut command) {
            warn!("Failed to render command, sending empty frame");
            command = CommandFrame::new();
        }

        socket.send_to(&command.encode(), peer)?;

        Ok(true)
    }

    fn close(&mut self) {
        if self.socket.take().is_some() {
            trace!("UDP session closed");
        }
        self.peer = None;
        self.missed = 0;
    }
}
