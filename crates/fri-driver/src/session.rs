//! 会话生命周期管理
//!
//! 单会话生命周期 + 后台步循环线程。同一时刻最多一条打开的会话；
//! 连接标志（AtomicBool）是两个执行上下文之间的首要同步点：
//! 步循环每周期检查它决定是否继续，断开操作通过 `swap(false)`
//! 保证恰好一个关闭者（可从步循环内部或外部并发调用，不会双关）。
//!
//! 步循环线程的 JoinHandle 被保留：外部断开 / 销毁时 stop-and-wait，
//! 而不是 detach 后放任（避免销毁与仍在运行的循环之间的竞态）。

use crate::error::DriverError;
use fri_transport::FriSession;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{error, info, warn};

/// 会话端口下限
pub const MIN_PORT: u16 = 30200;
/// 会话端口上限
pub const MAX_PORT: u16 = 30209;

/// 会话共享核心（管理器与步循环线程共同持有）
struct SessionCore {
    /// 传输会话（步循环逐周期持锁 step，关闭路径持锁 close）
    session: Mutex<Box<dyn FriSession + Send>>,
    /// 打开 / 关闭标志（首要同步点）
    connected: AtomicBool,
}

impl SessionCore {
    /// 关闭会话（幂等，可重入安全）
    ///
    /// `swap(false)` 保证并发调用时只有一个执行者真正关闭传输会话。
    fn close_session(&self) {
        if self.connected.swap(false, Ordering::AcqRel) {
            self.session.lock().close();
            info!("Session closed");
        } else {
            info!("Port already closed");
        }
    }
}

/// 会话管理器
///
/// 拥有传输会话和后台步循环线程，保证同一时刻最多一条打开的会话。
pub struct SessionManager {
    core: Arc<SessionCore>,
    /// 进程收尾信号（Drop 时置位，步循环每周期检查）
    shutdown: Arc<AtomicBool>,
    /// 步循环线程句柄（断开时 join，除非从循环线程内部调用）
    loop_thread: Mutex<Option<JoinHandle<()>>>,
    /// 连接管理锁：串行化 connect 流程，防止并发双开
    endpoint: Mutex<Option<(u16, Option<String>)>>,
}

impl SessionManager {
    /// 创建会话管理器（初始为关闭状态）
    pub fn new(session: Box<dyn FriSession + Send>) -> Self {
        Self {
            core: Arc::new(SessionCore {
                session: Mutex::new(session),
                connected: AtomicBool::new(false),
            }),
            shutdown: Arc::new(AtomicBool::new(false)),
            loop_thread: Mutex::new(None),
            endpoint: Mutex::new(None),
        }
    }

    /// 打开会话并启动步循环
    ///
    /// - 端口不在 [`MIN_PORT`]..=[`MAX_PORT`] 范围内：在任何传输调用前
    ///   返回 [`DriverError::InvalidPort`]
    /// - 会话已打开：幂等空操作，记录日志后返回 Ok(true)
    /// - 传输打开失败：返回 Ok(false)，状态保持关闭
    pub fn connect(&self, port: u16, remote_host: Option<&str>) -> Result<bool, DriverError> {
        if !(MIN_PORT..=MAX_PORT).contains(&port) {
            error!("Expected port in [{}, {}], got {}", MIN_PORT, MAX_PORT, port);
            return Err(DriverError::InvalidPort { port });
        }

        // 串行化 connect，防止两个调用者同时通过打开检查
        let mut endpoint = self.endpoint.lock();

        if self.core.connected.load(Ordering::Acquire) {
            info!("Port already open");
            return Ok(true);
        }

        info!("Attempting to open session on port {}...", port);
        let opened = self.core.session.lock().open(port, remote_host)?;
        if !opened {
            warn!("Failed to connect");
            return Ok(false);
        }

        *endpoint = Some((port, remote_host.map(str::to_owned)));
        self.core.connected.store(true, Ordering::Release);

        let core = self.core.clone();
        let shutdown = self.shutdown.clone();
        let handle = thread::Builder::new()
            .name("fri-step-loop".into())
            .spawn(move || step_loop(core, shutdown));

        match handle {
            Ok(handle) => {
                *self.loop_thread.lock() = Some(handle);
                info!("Connected successfully");
                Ok(true)
            },
            Err(e) => {
                // 线程没起来就不能留着打开的会话
                self.core.close_session();
                Err(DriverError::Io(e))
            },
        }
    }

    /// 关闭会话并等待步循环退出
    ///
    /// 已关闭时是记录日志的空操作，仍返回 Ok(true)。可重入安全：
    /// 从步循环线程内部调用时跳过 join（避免自我 join 死锁）。
    pub fn disconnect(&self) -> Result<bool, DriverError> {
        self.core.close_session();

        // stop-and-wait：等待步循环线程退出
        let handle = self.loop_thread.lock().take();
        if let Some(handle) = handle {
            if handle.thread().id() == thread::current().id() {
                // 自身就是步循环线程，跳过 join
                warn!("disconnect() called from step loop thread, skipping join");
            } else if handle.join().is_err() {
                error!("Step loop thread panicked");
            }
        }

        info!("Disconnected successfully");
        Ok(true)
    }

    /// 会话是否处于打开状态
    pub fn is_connected(&self) -> bool {
        self.core.connected.load(Ordering::Acquire)
    }

    /// 当前记录的端口（会话打开时）
    pub fn port(&self) -> Option<u16> {
        if self.is_connected() {
            self.endpoint.lock().as_ref().map(|(port, _)| *port)
        } else {
            None
        }
    }
}

impl Drop for SessionManager {
    /// 销毁时无条件断开，避免泄漏打开的会话或悬空的步循环线程
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        let _ = self.disconnect();
    }
}

/// 步循环（运行在专属线程上）
///
/// 只要单周期 step 成功、会话仍打开且进程未收尾就继续循环。
/// 任何 step 错误都被捕获、记录并终止循环（对本会话致命，对进程
/// 不致命）。循环退出时若会话仍标记为打开，由循环自己执行关闭，
/// 保证不会出现 "会话仍打开但循环已死" 的状态。
fn step_loop(core: Arc<SessionCore>, shutdown: Arc<AtomicBool>) {
    #[cfg(feature = "realtime")]
    if let Err(e) =
        thread_priority::set_current_thread_priority(thread_priority::ThreadPriority::Max)
    {
        warn!("Failed to raise step loop thread priority: {:?}", e);
    }

    info!("Step loop started");
    while core.connected.load(Ordering::Acquire) && !shutdown.load(Ordering::Acquire) {
        let result = core.session.lock().step();
        match result {
            Ok(true) => {},
            Ok(false) => {
                info!("Session finished by controller");
                break;
            },
            Err(e) => {
                error!("Step failed: {}", e);
                break;
            },
        }
    }

    // 自发关闭路径：步循环失败 / 正常收尾时会话可能仍标记为打开
    if core.connected.load(Ordering::Acquire) {
        core.close_session();
    }
    info!("Step loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use fri_protocol::{CommandFrame, MonitorFrame};
    use fri_transport::SessionHandler;
    use fri_transport::mock::{MockFriSession, StepScript};
    use std::time::{Duration, Instant};

    // 仅透传的空回调：会话管理器测试不关心转换语义
    struct NullHandler;

    impl SessionHandler for NullHandler {
        fn on_state(&self, _state: &MonitorFrame) -> bool {
            true
        }

        fn fill_command(&self, _command: &mut CommandFrame) -> bool {
            true
        }
    }

    fn manager_with_mock() -> (SessionManager, fri_transport::mock::MockSessionHandle) {
        let (session, handle) = MockFriSession::new(Arc::new(NullHandler));
        (SessionManager::new(Box::new(session)), handle)
    }

    /// 轮询等待条件成立（步循环异步退出）
    fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        false
    }

    #[test]
    fn test_connect_rejects_out_of_range_port() {
        let (manager, handle) = manager_with_mock();

        for port in [30199, 30210, 8080, 65535] {
            match manager.connect(port, None) {
                Err(DriverError::InvalidPort { port: p }) => assert_eq!(p, port),
                other => panic!("Expected InvalidPort, got {:?}", other.map(|_| ())),
            }
        }

        // 端口检查发生在任何传输调用之前
        assert!(handle.opened_ports().is_empty());
        assert!(!manager.is_connected());
    }

    #[test]
    fn test_connect_is_idempotent_while_open() {
        let (manager, handle) = manager_with_mock();

        assert!(manager.connect(30200, None).unwrap());
        assert!(manager.is_connected());
        assert_eq!(manager.port(), Some(30200));

        // 第二次 connect：成功返回，但不打开第二条会话
        assert!(manager.connect(30200, None).unwrap());
        assert_eq!(handle.opened_ports(), vec![30200]);

        assert!(manager.disconnect().unwrap());
    }

    #[test]
    fn test_connect_reports_transport_open_failure() {
        let (manager, handle) = manager_with_mock();
        handle.set_open_result(false);

        assert!(!manager.connect(30201, None).unwrap());
        assert!(!manager.is_connected());
        assert_eq!(handle.close_count(), 0);
    }

    #[test]
    fn test_disconnect_when_closed_is_noop() {
        let (manager, handle) = manager_with_mock();

        assert!(manager.disconnect().unwrap());
        assert!(manager.disconnect().unwrap());
        // 传输层从未被调用
        assert_eq!(handle.close_count(), 0);
    }

    #[test]
    fn test_disconnect_closes_session_once() {
        let (manager, handle) = manager_with_mock();

        assert!(manager.connect(30202, None).unwrap());
        assert!(manager.disconnect().unwrap());
        assert!(!manager.is_connected());
        assert_eq!(handle.close_count(), 1);

        // 再次断开：空操作，不再触发传输关闭
        assert!(manager.disconnect().unwrap());
        assert_eq!(handle.close_count(), 1);
    }

    #[test]
    fn test_step_failure_forces_disconnect() {
        let (manager, handle) = manager_with_mock();

        assert!(manager.connect(30203, None).unwrap());

        // 三个正常周期后注入致命错误
        for _ in 0..3 {
            handle.deliver(MonitorFrame::default());
        }
        handle.push(StepScript::Fail);

        // 步循环自行退出并关闭会话
        assert!(wait_until(Duration::from_secs(2), || !manager.is_connected()));
        assert_eq!(handle.close_count(), 1);
        assert_eq!(handle.sent_commands().len(), 3);

        // 随后的 disconnect 仍然成功且不报错
        assert!(manager.disconnect().unwrap());
        assert_eq!(handle.close_count(), 1);
    }

    #[test]
    fn test_controller_finish_ends_loop() {
        let (manager, handle) = manager_with_mock();

        assert!(manager.connect(30204, None).unwrap());
        handle.push(StepScript::Finish);

        assert!(wait_until(Duration::from_secs(2), || !manager.is_connected()));
        assert_eq!(handle.close_count(), 1);
    }

    #[test]
    fn test_drop_closes_open_session() {
        let (manager, handle) = manager_with_mock();
        assert!(manager.connect(30205, None).unwrap());

        drop(manager);
        assert!(!handle.is_open());
        assert_eq!(handle.close_count(), 1);
    }

    #[test]
    fn test_reconnect_after_disconnect() {
        let (manager, handle) = manager_with_mock();

        assert!(manager.connect(30206, None).unwrap());
        assert!(manager.disconnect().unwrap());
        assert!(manager.connect(30207, None).unwrap());
        assert_eq!(handle.opened_ports(), vec![30206, 30207]);
        assert_eq!(manager.port(), Some(30207));

        assert!(manager.disconnect().unwrap());
    }
}
