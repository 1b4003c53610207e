//! 驱动站连接
//!
//! 每个被占用的工位对应一条连接：负责按节拍构造并发送下行控制包、
//! 排空入站状态帧并发布最新状态快照。状态快照通过 `ArcSwap` 发布，
//! 接收路径（独立线程或 tick 内轮询）写入、tick 循环无锁读取。
//!
//! 快照里带着最近一帧状态帧的到达时刻：驱动站静默超过
//! [`DS_LINK_TIMEOUT_MS`] 后，机器人链路位在下一次轮询中被清除，
//! 就绪判定因此不会相信一条早已沉默的链路。
//!
//! 连接在队伍被分配到工位时建立，在队伍撤换或清空时关闭；网络
//! 句柄由连接独占。

use crate::arena::station::StationKey;
use crate::net::{DsTransport, NetError};
use crate::protocol::constants::{CONTROL_PACKET_LEN, DS_LINK_TIMEOUT_MS};
use crate::protocol::{ControlPacket, StatusFrame};
use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{trace, warn};

/// 单次轮询最多处理的状态帧数，避免积压帧长时间占用 tick
const MAX_FRAMES_PER_POLL: usize = 8;

/// 驱动站最近上报的状态快照
#[derive(Debug, Clone, Default)]
pub struct DsStatus {
    /// 驱动站到机器人控制器的链路是否在线
    pub robot_linked: bool,
    /// 驱动站到场地无线电的链路是否在线
    pub radio_linked: bool,
    /// 驱动站侧急停按钮是否按下
    pub estop_pressed: bool,
    /// 机器人电池电压（伏）
    pub battery_voltage: f64,
    /// 最近一帧的序列号
    pub last_seq: u16,
    /// 累计收到的状态帧数
    pub frames_received: u32,
    /// 最近一帧状态帧的到达时刻（从未收到过为 None）
    pub last_frame_at: Option<Instant>,
}

impl DsStatus {
    /// 驱动站是否已静默超时
    ///
    /// 只对收到过真实状态帧的链路有意义；从未收到帧（或只被测试
    /// 钩子覆盖过链路位）的快照不判静默。
    pub fn link_silent(&self, timeout: Duration) -> bool {
        self.frames_received > 0
            && self
                .last_frame_at
                .is_none_or(|at| at.elapsed() >= timeout)
    }
}

/// 一条驱动站连接
///
/// 广播标志（`auto` / `enabled` / `emergency_stop`）由 tick 循环在每次
/// 推进时重算，随下一个控制包发出；状态快照可由任意线程发布。
pub struct DriverStationConnection {
    pub team_id: u32,
    pub station: StationKey,
    pub auto: bool,
    pub enabled: bool,
    pub emergency_stop: bool,
    /// 已尝试发送的控制包计数（发送失败也计数）
    pub packet_count: u32,
    status: Arc<ArcSwap<DsStatus>>,
    transport: Box<dyn DsTransport>,
}

impl DriverStationConnection {
    pub fn new(team_id: u32, station: StationKey, transport: Box<dyn DsTransport>) -> Self {
        Self {
            team_id,
            station,
            // 初始为赛前广播值，首个 tick 会立即重算
            auto: true,
            enabled: false,
            emergency_stop: false,
            packet_count: 0,
            status: Arc::new(ArcSwap::from_pointee(DsStatus::default())),
            transport,
        }
    }

    /// 最近一次发布的状态快照（无锁读取）
    pub fn status(&self) -> Arc<DsStatus> {
        self.status.load_full()
    }

    /// 状态句柄：可交给独立的接收线程直接发布新快照
    pub fn status_handle(&self) -> Arc<ArcSwap<DsStatus>> {
        self.status.clone()
    }

    /// 机器人链路是否在线（就绪判定读取此位）
    pub fn robot_linked(&self) -> bool {
        self.status.load().robot_linked
    }

    /// 覆盖机器人链路位（测试钩子与外部接收器使用）
    pub fn set_robot_linked(&self, linked: bool) {
        let mut next = (*self.status.load_full()).clone();
        next.robot_linked = linked;
        next.last_frame_at = Some(Instant::now());
        self.status.store(Arc::new(next));
    }

    /// 应用一帧解析后的状态
    pub fn apply_status_frame(&self, frame: &StatusFrame) {
        let prev = self.status.load_full();
        self.status.store(Arc::new(DsStatus {
            robot_linked: frame.robot_linked,
            radio_linked: frame.radio_linked,
            estop_pressed: frame.estop_pressed,
            battery_voltage: frame.battery_voltage,
            last_seq: frame.seq,
            frames_received: prev.frames_received.wrapping_add(1),
            last_frame_at: Some(Instant::now()),
        }));
    }

    /// 排空入站状态帧（tick 循环每次推进时调用，带帧数预算）
    ///
    /// 解码失败只记日志；传输错误中止本次轮询但不向上传播，单个
    /// 工位的故障不能拖住整个场地。
    pub fn poll_status(&mut self) {
        let mut buf = [0u8; 64];
        for _ in 0..MAX_FRAMES_PER_POLL {
            match self.transport.try_recv(&mut buf) {
                Ok(n) => match StatusFrame::decode(&buf[..n]) {
                    Ok(frame) => {
                        if u32::from(frame.team_id) != self.team_id {
                            warn!(
                                team = self.team_id,
                                reported = frame.team_id,
                                "Status frame from unexpected team, dropping"
                            );
                            continue;
                        }
                        self.apply_status_frame(&frame);
                    }
                    Err(e) => {
                        warn!(team = self.team_id, "Failed to decode status frame: {e}");
                    }
                },
                Err(NetError::Timeout) => break,
                Err(e) => {
                    warn!(team = self.team_id, "Status receive error: {e}");
                    break;
                }
            }
        }

        // 驱动站静默超时：清除 robot_linked，就绪判定只读快照
        let current = self.status.load_full();
        if current.robot_linked && current.link_silent(Duration::from_millis(DS_LINK_TIMEOUT_MS)) {
            let mut next = (*current).clone();
            next.robot_linked = false;
            self.status.store(Arc::new(next));
            trace!(team = self.team_id, station = %self.station, "Robot link dropped after driver station went silent");
        }
    }

    /// 构造并发送一个控制包
    ///
    /// 计数无条件递增：发送失败由调用方记日志，计数语义不变。
    pub fn send_control_packet(&mut self, match_time_remaining_sec: u16) -> Result<(), NetError> {
        let packet = ControlPacket {
            seq: self.packet_count as u16,
            team_id: self.team_id as u16,
            station_code: self.station.code(),
            auto: self.auto,
            enabled: self.enabled,
            emergency_stop: self.emergency_stop,
            match_time_remaining_sec,
        };
        let mut buf = [0u8; CONTROL_PACKET_LEN];
        let encoded = packet.encode(&mut buf);
        self.packet_count = self.packet_count.wrapping_add(1);
        self.transport.send(encoded)?;
        Ok(())
    }

    /// 关闭底层传输；重复关闭由底层句柄报错
    pub fn close(&mut self) -> Result<(), NetError> {
        self.transport.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    // 最小化的模拟传输：可注入入站帧、可控制发送结果
    struct MockTransport {
        inbound: VecDeque<Vec<u8>>,
        sent: Arc<Mutex<Vec<Vec<u8>>>>,
        fail_sends: bool,
        closed: bool,
    }

    impl MockTransport {
        fn new() -> Self {
            Self {
                inbound: VecDeque::new(),
                sent: Arc::new(Mutex::new(Vec::new())),
                fail_sends: false,
                closed: false,
            }
        }
    }

    impl DsTransport for MockTransport {
        fn send(&mut self, buf: &[u8]) -> Result<usize, NetError> {
            if self.fail_sends {
                return Err(NetError::Io(std::io::Error::from(
                    std::io::ErrorKind::NetworkUnreachable,
                )));
            }
            self.sent.lock().push(buf.to_vec());
            Ok(buf.len())
        }

        fn try_recv(&mut self, buf: &mut [u8]) -> Result<usize, NetError> {
            match self.inbound.pop_front() {
                Some(frame) => {
                    buf[..frame.len()].copy_from_slice(&frame);
                    Ok(frame.len())
                }
                None => Err(NetError::Timeout),
            }
        }

        fn close(&mut self) -> Result<(), NetError> {
            if self.closed {
                return Err(NetError::AlreadyClosed);
            }
            self.closed = true;
            Ok(())
        }
    }

    fn test_conn() -> (DriverStationConnection, Arc<Mutex<Vec<Vec<u8>>>>) {
        let transport = MockTransport::new();
        let sent = transport.sent.clone();
        (
            DriverStationConnection::new(254, StationKey::B1, Box::new(transport)),
            sent,
        )
    }

    #[test]
    fn test_send_increments_packet_count_and_seq() {
        let (mut conn, sent) = test_conn();
        conn.send_control_packet(152).unwrap();
        conn.send_control_packet(151).unwrap();
        assert_eq!(conn.packet_count, 2);

        let sent = sent.lock();
        let first = ControlPacket::decode(&sent[0]).unwrap();
        let second = ControlPacket::decode(&sent[1]).unwrap();
        assert_eq!(first.seq, 0);
        assert_eq!(second.seq, 1);
        assert_eq!(first.team_id, 254);
        assert_eq!(first.station_code, StationKey::B1.code());
    }

    #[test]
    fn test_send_failure_still_counts() {
        let transport = MockTransport {
            fail_sends: true,
            ..MockTransport::new()
        };
        let mut conn = DriverStationConnection::new(254, StationKey::B1, Box::new(transport));
        assert!(conn.send_control_packet(0).is_err());
        assert_eq!(conn.packet_count, 1);
    }

    #[test]
    fn test_poll_status_applies_frames() {
        let mut transport = MockTransport::new();
        let frame = StatusFrame {
            seq: 5,
            team_id: 254,
            station_code: StationKey::B1.code(),
            robot_linked: true,
            radio_linked: true,
            estop_pressed: false,
            battery_voltage: 12.5,
        };
        let mut buf = [0u8; crate::protocol::constants::STATUS_FRAME_LEN];
        transport.inbound.push_back(frame.encode(&mut buf).to_vec());
        let mut conn = DriverStationConnection::new(254, StationKey::B1, Box::new(transport));

        assert!(!conn.robot_linked());
        conn.poll_status();
        let status = conn.status();
        assert!(status.robot_linked);
        assert_eq!(status.last_seq, 5);
        assert_eq!(status.frames_received, 1);
        assert_eq!(status.battery_voltage, 12.5);
    }

    #[test]
    fn test_poll_status_drops_wrong_team() {
        let mut transport = MockTransport::new();
        let frame = StatusFrame {
            seq: 1,
            team_id: 9000,
            station_code: StationKey::B1.code(),
            robot_linked: true,
            radio_linked: false,
            estop_pressed: false,
            battery_voltage: 12.0,
        };
        let mut buf = [0u8; crate::protocol::constants::STATUS_FRAME_LEN];
        transport.inbound.push_back(frame.encode(&mut buf).to_vec());
        let mut conn = DriverStationConnection::new(254, StationKey::B1, Box::new(transport));

        conn.poll_status();
        assert!(!conn.robot_linked());
    }

    #[test]
    fn test_set_robot_linked_override() {
        let (conn, _) = test_conn();
        conn.set_robot_linked(true);
        assert!(conn.robot_linked());
        conn.set_robot_linked(false);
        assert!(!conn.robot_linked());
    }

    #[test]
    fn test_silent_link_drops_after_timeout() {
        let mut transport = MockTransport::new();
        let frame = StatusFrame {
            seq: 1,
            team_id: 254,
            station_code: StationKey::B1.code(),
            robot_linked: true,
            radio_linked: true,
            estop_pressed: false,
            battery_voltage: 12.1,
        };
        let mut buf = [0u8; crate::protocol::constants::STATUS_FRAME_LEN];
        transport.inbound.push_back(frame.encode(&mut buf).to_vec());
        let mut conn = DriverStationConnection::new(254, StationKey::B1, Box::new(transport));

        conn.poll_status();
        assert!(conn.robot_linked());

        // 把最后一帧的到达时刻拨回超时窗口之前
        let handle = conn.status_handle();
        let mut stale = (*handle.load_full()).clone();
        stale.last_frame_at =
            Some(Instant::now() - Duration::from_millis(2 * DS_LINK_TIMEOUT_MS));
        handle.store(Arc::new(stale));

        conn.poll_status();
        assert!(!conn.robot_linked());
    }

    #[test]
    fn test_override_link_is_exempt_from_silence_timeout() {
        let (mut conn, _) = test_conn();
        conn.set_robot_linked(true);

        // 从未收到过状态帧（frames_received 为 0）的快照不判静默
        let handle = conn.status_handle();
        let mut stale = (*handle.load_full()).clone();
        stale.last_frame_at = None;
        handle.store(Arc::new(stale));

        conn.poll_status();
        assert!(conn.robot_linked());
    }

    #[test]
    fn test_close_twice_errors() {
        let (mut conn, _) = test_conn();
        assert!(conn.close().is_ok());
        assert!(matches!(conn.close(), Err(NetError::AlreadyClosed)));
    }
}
