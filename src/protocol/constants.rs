//! 协议常量

/// 控制包最小发送间隔（毫秒）
///
/// 六个工位共享同一节拍：同一 tick 内要么全部发包，要么全部不发。
pub const DS_PACKET_PERIOD_MS: u64 = 250;

/// 控制包下行端口（FMS → 驱动站）
pub const DS_CONTROL_PORT: u16 = 1120;

/// 状态帧上行端口（驱动站 → FMS）
pub const DS_STATUS_PORT: u16 = 1160;

/// 控制包长度（字节）
pub const CONTROL_PACKET_LEN: usize = 10;

/// 状态帧长度（字节）
pub const STATUS_FRAME_LEN: usize = 8;

/// 协议版本号
pub const PROTOCOL_VERSION: u8 = 0x01;

/// 机器人链路超时（毫秒）
///
/// 超过该时间未收到状态帧的连接，其 `robot_linked` 位会被清除。
pub const DS_LINK_TIMEOUT_MS: u64 = 1000;
