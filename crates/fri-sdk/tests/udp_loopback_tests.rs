//! UDP 回环集成测试
//!
//! 在本机起一个模拟控制器线程，按固定周期下发状态帧并回收指令帧，
//! 验证完整链路：UDP 会话 -> 中介者 -> 安全门 -> 指令帧回发。

use fri_protocol::{
    ClientCommandMode, CommandFrame, FIELD_JOINT_POSITION, JOINT_COUNT, MonitorFrame, SessionState,
};
use fri_sdk::transport::udp::UdpConfig;
use fri_sdk::{FriDriverBuilder, RobotCommand};
use parking_lot::Mutex;
use std::net::UdpSocket;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

const PORT: u16 = 30206;
const CYCLE: Duration = Duration::from_millis(5);

/// 模拟控制器：固定周期下发状态帧，回收指令帧
fn controller_loop(stop: Arc<AtomicBool>, commands: Arc<Mutex<Vec<CommandFrame>>>) {
    let socket = UdpSocket::bind("127.0.0.1:0").expect("bind controller socket");
    socket
        .set_read_timeout(Some(Duration::from_millis(2)))
        .expect("set controller read timeout");

    let mut frame = MonitorFrame {
        session_state: SessionState::CommandingActive.into(),
        client_command_mode: ClientCommandMode::JointPosition.into(),
        sample_time: 0.005,
        ..Default::default()
    };

    let mut buf = [0u8; 512];
    while !stop.load(Ordering::Acquire) {
        frame.timestamp_nanosec = frame.timestamp_nanosec.wrapping_add(5_000_000);
        socket
            .send_to(&frame.encode(), ("127.0.0.1", PORT))
            .expect("send monitor frame");

        if let Ok((len, _)) = socket.recv_from(&mut buf)
            && let Ok(command) = CommandFrame::decode(&buf[..len])
        {
            commands.lock().push(command);
        }

        spin_sleep::sleep(CYCLE);
    }
}

#[test]
fn test_udp_loopback_cycle_exchange() {
    let driver = FriDriverBuilder::new()
        .udp_config(UdpConfig {
            receive_timeout_ms: 20,
            max_missed_cycles: 50,
        })
        .build()
        .unwrap();

    let stop = Arc::new(AtomicBool::new(false));
    let commands = Arc::new(Mutex::new(Vec::new()));

    let controller = {
        let stop = stop.clone();
        let commands = commands.clone();
        thread::spawn(move || controller_loop(stop, commands))
    };

    // 对端地址从控制器首包学习
    assert!(driver.manager.connect(PORT, None).unwrap());

    // 等控制逻辑侧看到指令阶段快照
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if driver.intermediary.snapshot().session_state == SessionState::CommandingActive {
            break;
        }
        thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(
        driver.intermediary.snapshot().session_state,
        SessionState::CommandingActive
    );

    // 写入一条合法候选指令（步长在限制内）
    let mut candidate = RobotCommand::default();
    candidate.joint_position[0] = 0.004;
    assert!(driver.intermediary.command_to_buffer(Some(&candidate)));

    // 等控制器收到足够多的指令帧
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if commands.lock().len() >= 5 {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }

    assert!(driver.manager.disconnect().unwrap());
    assert!(!driver.manager.is_connected());

    stop.store(true, Ordering::Release);
    controller.join().expect("controller thread");

    // 指令帧按关节位置模式渲染；末段帧应携带写入的候选位置
    let received = commands.lock();
    assert!(received.len() >= 5, "controller received {} commands", received.len());
    let last = received.last().unwrap();
    assert_eq!(last.fields(), FIELD_JOINT_POSITION);
    assert_eq!(last.joint_position()[0], 0.004);
    assert_eq!(last.joint_position()[1..], [0.0; JOINT_COUNT - 1]);
}
