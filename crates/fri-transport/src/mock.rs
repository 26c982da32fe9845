//! 模拟会话实现（无控制器测试）
//!
//! 通过 [`MockSessionHandle`] 向会话脚本化地投递周期事件，并取回
//! 会话发出的指令帧。用于驱动层与 SDK 的集成测试。

use crate::{FriSession, SessionHandler, TransportError};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use fri_protocol::{CommandFrame, MonitorFrame};
use parking_lot::Mutex;
use std::io::ErrorKind;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;
use tracing::trace;

/// 脚本化的单周期事件
#[derive(Debug, Clone)]
pub enum StepScript {
    /// 投递一帧状态并完成一次正常交换（step 返回 Ok(true)）
    Deliver(MonitorFrame),
    /// 会话正常收尾（step 返回 Ok(false)）
    Finish,
    /// 注入致命传输错误（step 返回 Err）
    Fail,
}

/// 模拟会话共享内部状态
struct MockInner {
    /// 会话发出的全部指令帧
    sent: Mutex<Vec<CommandFrame>>,
    /// open 时记录的端口
    opened_ports: Mutex<Vec<u16>>,
    /// 会话是否处于打开状态
    open: AtomicBool,
    /// 下一次 open 的返回值（测试打开失败路径）
    open_result: AtomicBool,
    /// close 调用计数
    close_count: AtomicU32,
}

/// 模拟循环会话
///
/// `step` 阻塞等待脚本事件（带 50ms 超时，超时视为空闲周期），
/// 因此步循环在无事件时不会空转，断开操作也不会被无限期阻塞。
pub struct MockFriSession {
    handler: Arc<dyn SessionHandler>,
    script_rx: Receiver<StepScript>,
    inner: Arc<MockInner>,
}

/// 测试侧控制句柄
#[derive(Clone)]
pub struct MockSessionHandle {
    script_tx: Sender<StepScript>,
    inner: Arc<MockInner>,
}

impl MockFriSession {
    /// 创建模拟会话及其控制句柄
    pub fn new(handler: Arc<dyn SessionHandler>) -> (Self, MockSessionHandle) {
        let (script_tx, script_rx) = unbounded();
        let inner = Arc::new(MockInner {
            sent: Mutex::new(Vec::new()),
            opened_ports: Mutex::new(Vec::new()),
            open: AtomicBool::new(false),
            open_result: AtomicBool::new(true),
            close_count: AtomicU32::new(0),
        });

        let session = Self {
            handler,
            script_rx,
            inner: inner.clone(),
        };
        let handle = MockSessionHandle { script_tx, inner };
        (session, handle)
    }
}

impl FriSession for MockFriSession {
    fn open(&mut self, port: u16, _remote_host: Option<&str>) -> Result<bool, TransportError> {
        self.inner.opened_ports.lock().push(port);
        if !self.inner.open_result.load(Ordering::Acquire) {
            return Ok(false);
        }
        self.inner.open.store(true, Ordering::Release);
        Ok(true)
    }

    fn step(&mut self) -> Result<bool, TransportError> {
        if !self.inner.open.load(Ordering::Acquire) {
            return Err(TransportError::NotOpen);
        }

        let event = match self.script_rx.recv_timeout(Duration::from_millis(50)) {
            Ok(event) => event,
            // 无脚本事件：空闲周期
            Err(RecvTimeoutError::Timeout) => return Ok(true),
            // 句柄已丢弃：会话正常收尾
            Err(RecvTimeoutError::Disconnected) => return Ok(false),
        };

        match event {
            StepScript::Deliver(state) => {
                if !self.handler.on_state(&state) {
                    trace!("Mock: monitor frame rejected by handler");
                }
                let mut command = CommandFrame::new();
                if !self.handler.fill_command(&mut command) {
                    command = CommandFrame::new();
                }
                self.inner.sent.lock().push(command);
                Ok(true)
            },
            StepScript::Finish => Ok(false),
            StepScript::Fail => Err(TransportError::Io(std::io::Error::new(
                ErrorKind::ConnectionReset,
                "Injected transport fault",
            ))),
        }
    }

    fn close(&mut self) {
        self.inner.open.store(false, Ordering::Release);
        self.inner.close_count.fetch_add(1, Ordering::AcqRel);
    }
}

impl MockSessionHandle {
    /// 投递一个脚本事件
    pub fn push(&self, event: StepScript) {
        // 接收端随会话销毁而关闭，此时投递结果无关紧要
        let _ = self.script_tx.send(event);
    }

    /// 投递一帧状态
    pub fn deliver(&self, state: MonitorFrame) {
        self.push(StepScript::Deliver(state));
    }

    /// 设置下一次 open 的返回值
    pub fn set_open_result(&self, result: bool) {
        self.inner.open_result.store(result, Ordering::Release);
    }

    /// 会话是否处于打开状态
    pub fn is_open(&self) -> bool {
        self.inner.open.load(Ordering::Acquire)
    }

    /// open 时记录的端口列表
    pub fn opened_ports(&self) -> Vec<u16> {
        self.inner.opened_ports.lock().clone()
    }

    /// close 调用次数
    pub fn close_count(&self) -> u32 {
        self.inner.close_count.load(Ordering::Acquire)
    }

    /// 会话发出的全部指令帧
    pub fn sent_commands(&self) -> Vec<CommandFrame> {
        self.inner.sent.lock().clone()
    }

    /// 等待会话发出至少 `count` 帧指令（轮询，带超时）
    pub fn wait_for_commands(&self, count: usize, timeout: Duration) -> bool {
        let deadline = std::time::Instant::now() + timeout;
        while std::time::Instant::now() < deadline {
            if self.inner.sent.lock().len() >= count {
                return true;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        false
    }
}
