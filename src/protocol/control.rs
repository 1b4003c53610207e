//! 下行控制包编解码
//!
//! 布局（10 字节，多字节字段大端序）：
//!
//! ```text
//! [0..2]  序列号（单调递增，16 位回绕）
//! [2]     协议版本
//! [3]     控制位：Bit 0 = auto，Bit 1 = enabled，Bit 2 = e-stop
//! [4]     工位编码（0-5）
//! [5..7]  队号
//! [7..9]  比赛剩余时间（秒）
//! [9]     保留（置 0）
//! ```

use super::PacketError;
use super::constants::{CONTROL_PACKET_LEN, PROTOCOL_VERSION};

const FLAG_AUTO: u8 = 1 << 0;
const FLAG_ENABLED: u8 = 1 << 1;
const FLAG_ESTOP: u8 = 1 << 2;

/// 一个下行控制包
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlPacket {
    pub seq: u16,
    pub team_id: u16,
    pub station_code: u8,
    pub auto: bool,
    pub enabled: bool,
    pub emergency_stop: bool,
    pub match_time_remaining_sec: u16,
}

impl ControlPacket {
    /// 编码到栈上缓冲区，返回有效字节切片
    pub fn encode<'a>(&self, buf: &'a mut [u8; CONTROL_PACKET_LEN]) -> &'a [u8] {
        buf[0..2].copy_from_slice(&self.seq.to_be_bytes());
        buf[2] = PROTOCOL_VERSION;
        let mut flags = 0u8;
        if self.auto {
            flags |= FLAG_AUTO;
        }
        if self.enabled {
            flags |= FLAG_ENABLED;
        }
        if self.emergency_stop {
            flags |= FLAG_ESTOP;
        }
        buf[3] = flags;
        buf[4] = self.station_code;
        buf[5..7].copy_from_slice(&self.team_id.to_be_bytes());
        buf[7..9].copy_from_slice(&self.match_time_remaining_sec.to_be_bytes());
        buf[9] = 0;
        &buf[..CONTROL_PACKET_LEN]
    }

    /// 从字节序列解码
    pub fn decode(data: &[u8]) -> Result<Self, PacketError> {
        if data.len() < CONTROL_PACKET_LEN {
            return Err(PacketError::TooShort {
                expected: CONTROL_PACKET_LEN,
                actual: data.len(),
            });
        }
        if data[2] != PROTOCOL_VERSION {
            return Err(PacketError::UnsupportedVersion(data[2]));
        }
        let station_code = data[4];
        if station_code > 5 {
            return Err(PacketError::InvalidStationCode(station_code));
        }
        let flags = data[3];
        Ok(Self {
            seq: u16::from_be_bytes([data[0], data[1]]),
            team_id: u16::from_be_bytes([data[5], data[6]]),
            station_code,
            auto: flags & FLAG_AUTO != 0,
            enabled: flags & FLAG_ENABLED != 0,
            emergency_stop: flags & FLAG_ESTOP != 0,
            match_time_remaining_sec: u16::from_be_bytes([data[7], data[8]]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ControlPacket {
        ControlPacket {
            seq: 1234,
            team_id: 254,
            station_code: 4,
            auto: false,
            enabled: true,
            emergency_stop: false,
            match_time_remaining_sec: 97,
        }
    }

    #[test]
    fn test_control_packet_roundtrip() {
        let packet = sample();
        let mut buf = [0u8; CONTROL_PACKET_LEN];
        let encoded = packet.encode(&mut buf);
        assert_eq!(encoded.len(), CONTROL_PACKET_LEN);

        let decoded = ControlPacket::decode(encoded).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_flag_bits() {
        let mut packet = sample();
        packet.auto = true;
        packet.enabled = false;
        packet.emergency_stop = true;
        let mut buf = [0u8; CONTROL_PACKET_LEN];
        packet.encode(&mut buf);
        assert_eq!(buf[3], FLAG_AUTO | FLAG_ESTOP);

        let decoded = ControlPacket::decode(&buf).unwrap();
        assert!(decoded.auto);
        assert!(!decoded.enabled);
        assert!(decoded.emergency_stop);
    }

    #[test]
    fn test_decode_too_short() {
        let err = ControlPacket::decode(&[0u8; 4]).unwrap_err();
        assert_eq!(
            err,
            PacketError::TooShort {
                expected: CONTROL_PACKET_LEN,
                actual: 4
            }
        );
    }

    #[test]
    fn test_decode_bad_version() {
        let mut buf = [0u8; CONTROL_PACKET_LEN];
        sample().encode(&mut buf);
        buf[2] = 0x7F;
        assert_eq!(
            ControlPacket::decode(&buf),
            Err(PacketError::UnsupportedVersion(0x7F))
        );
    }

    #[test]
    fn test_decode_bad_station_code() {
        let mut buf = [0u8; CONTROL_PACKET_LEN];
        sample().encode(&mut buf);
        buf[4] = 6;
        assert_eq!(
            ControlPacket::decode(&buf),
            Err(PacketError::InvalidStationCode(6))
        );
    }
}
