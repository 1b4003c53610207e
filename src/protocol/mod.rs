//! 驱动站线协议
//!
//! FMS 与驱动站之间的固定布局二进制协议：
//! - 下行控制包（[`ControlPacket`]）：按节拍向每个工位广播
//!   `(auto, enabled, e-stop)` 标志与剩余比赛时间
//! - 上行状态帧（[`StatusFrame`]）：驱动站上报机器人链路等状态
//!
//! 编码统一写入调用方提供的栈上缓冲区，不做堆分配。

pub mod constants;
pub mod control;
pub mod status;

pub use control::ControlPacket;
pub use status::StatusFrame;

use thiserror::Error;

/// 协议错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    /// 数据不足一个完整包
    #[error("Packet too short: expected {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    /// 工位编码超出 0-5
    #[error("Invalid alliance station code: {0}")]
    InvalidStationCode(u8),

    /// 协议版本不匹配
    #[error("Unsupported protocol version: {0}")]
    UnsupportedVersion(u8),
}
