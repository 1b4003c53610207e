//! UDP 传输实现
//!
//! 驱动站地址按场地网络约定从队号推导：`10.TE.AM.5`，其中 TE/AM
//! 是四位队号的前后两段。控制包与状态帧都走同一个已连接的套接字。

use super::{DsTransport, DsTransportFactory, NetError};
use crate::arena::station::StationKey;
use crate::protocol::constants::DS_CONTROL_PORT;
use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use tracing::debug;

/// 已连接到单个驱动站的 UDP 通道
pub struct UdpTransport {
    socket: Option<UdpSocket>,
    peer: SocketAddr,
}

impl UdpTransport {
    /// 绑定本地临时端口并连接到指定驱动站
    pub fn connect(peer: SocketAddr) -> Result<Self, NetError> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.connect(peer)?;
        socket.set_nonblocking(true)?;
        Ok(Self {
            socket: Some(socket),
            peer,
        })
    }

    /// 对端地址
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

impl DsTransport for UdpTransport {
    fn send(&mut self, buf: &[u8]) -> Result<usize, NetError> {
        let socket = self.socket.as_ref().ok_or(NetError::AlreadyClosed)?;
        Ok(socket.send(buf)?)
    }

    fn try_recv(&mut self, buf: &mut [u8]) -> Result<usize, NetError> {
        let socket = self.socket.as_ref().ok_or(NetError::AlreadyClosed)?;
        match socket.recv(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                Err(NetError::Timeout)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn close(&mut self) -> Result<(), NetError> {
        match self.socket.take() {
            Some(socket) => {
                drop(socket);
                debug!(peer = %self.peer, "Driver station transport closed");
                Ok(())
            }
            None => Err(NetError::AlreadyClosed),
        }
    }
}

/// 按场地网络约定建立 UDP 通道的工厂
pub struct UdpTransportFactory;

impl UdpTransportFactory {
    /// 队号 → 驱动站地址（`10.TE.AM.5`）
    ///
    /// 只接受 1-9999 的队号：超出四位的队号无法放进两段八位地址。
    pub fn team_address(team_id: u32) -> Result<SocketAddr, NetError> {
        if team_id == 0 || team_id > 9999 {
            return Err(NetError::InvalidAddress(team_id));
        }
        let ip = Ipv4Addr::new(10, (team_id / 100) as u8, (team_id % 100) as u8, 5);
        Ok(SocketAddr::V4(SocketAddrV4::new(ip, DS_CONTROL_PORT)))
    }
}

impl DsTransportFactory for UdpTransportFactory {
    fn open(&self, team_id: u32, station: StationKey) -> Result<Box<dyn DsTransport>, NetError> {
        let peer = Self::team_address(team_id)?;
        let transport = UdpTransport::connect(peer)?;
        debug!(team = team_id, station = %station, peer = %peer, "Opened driver station transport");
        Ok(Box::new(transport))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_address_mapping() {
        let addr = UdpTransportFactory::team_address(254).unwrap();
        assert_eq!(addr.to_string(), "10.2.54.5:1120");
        let addr = UdpTransportFactory::team_address(1114).unwrap();
        assert_eq!(addr.to_string(), "10.11.14.5:1120");
        let addr = UdpTransportFactory::team_address(9999).unwrap();
        assert_eq!(addr.to_string(), "10.99.99.5:1120");
    }

    #[test]
    fn test_team_address_rejects_out_of_range() {
        assert!(matches!(
            UdpTransportFactory::team_address(0),
            Err(NetError::InvalidAddress(0))
        ));
        assert!(matches!(
            UdpTransportFactory::team_address(10_000),
            Err(NetError::InvalidAddress(10_000))
        ));
    }

    #[test]
    fn test_double_close_errors() {
        // 回环地址即可，关闭语义与对端无关
        let mut transport = UdpTransport::connect("127.0.0.1:39999".parse().unwrap()).unwrap();
        assert!(transport.close().is_ok());
        assert!(matches!(transport.close(), Err(NetError::AlreadyClosed)));
        assert!(matches!(transport.send(&[0u8; 4]), Err(NetError::AlreadyClosed)));
    }

    #[test]
    fn test_try_recv_empty_is_timeout() {
        let mut transport = UdpTransport::connect("127.0.0.1:39998".parse().unwrap()).unwrap();
        let mut buf = [0u8; 16];
        assert!(matches!(transport.try_recv(&mut buf), Err(NetError::Timeout)));
    }
}
