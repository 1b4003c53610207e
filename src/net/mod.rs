//! 驱动站传输层
//!
//! 每个被占用的工位持有一条独占的点对点传输通道。通道由工厂在
//! 分配队伍时建立，在队伍撤换或工位清空时关闭；底层句柄重复关闭
//! 必须报错（上层连接的幂等性不依赖句柄幂等）。

mod udp;

pub use udp::{UdpTransport, UdpTransportFactory};

use crate::arena::station::StationKey;
use std::io;
use thiserror::Error;

/// 传输层错误类型
#[derive(Error, Debug)]
pub enum NetError {
    /// 底层 I/O 错误
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// 句柄已关闭（包括重复关闭）
    #[error("Connection already closed")]
    AlreadyClosed,

    /// 非阻塞接收时无数据
    #[error("Receive timeout")]
    Timeout,

    /// 队号无法映射到场地网络地址
    #[error("No driver station address for team {0}")]
    InvalidAddress(u32),
}

/// 单个驱动站的点对点传输通道
pub trait DsTransport: Send {
    /// 发送一个完整数据包（尽力而为，不保证送达）
    fn send(&mut self, buf: &[u8]) -> Result<usize, NetError>;

    /// 非阻塞接收一个数据包；无数据时返回 [`NetError::Timeout`]
    fn try_recv(&mut self, buf: &mut [u8]) -> Result<usize, NetError>;

    /// 关闭底层句柄；重复关闭必须返回错误
    fn close(&mut self) -> Result<(), NetError>;
}

/// 传输通道工厂
///
/// 把"为某队某工位建立连接"与具体网络实现解耦，测试用模拟工厂
/// 替换。
pub trait DsTransportFactory: Send + Sync {
    fn open(&self, team_id: u32, station: StationKey) -> Result<Box<dyn DsTransport>, NetError>;
}
