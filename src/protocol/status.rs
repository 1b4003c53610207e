//! 上行状态帧编解码
//!
//! 布局（8 字节，多字节字段大端序）：
//!
//! ```text
//! [0..2]  序列号
//! [2]     状态位：Bit 0 = robot link，Bit 1 = radio link，Bit 2 = e-stop 按下
//! [3..5]  电池电压（厘伏）
//! [5]     工位编码回显（0-5）
//! [6..8]  队号
//! ```

use super::PacketError;
use super::constants::STATUS_FRAME_LEN;

const FLAG_ROBOT_LINKED: u8 = 1 << 0;
const FLAG_RADIO_LINKED: u8 = 1 << 1;
const FLAG_ESTOP_PRESSED: u8 = 1 << 2;

/// 驱动站上报的一帧状态
#[derive(Debug, Clone, PartialEq)]
pub struct StatusFrame {
    pub seq: u16,
    pub team_id: u16,
    pub station_code: u8,
    pub robot_linked: bool,
    pub radio_linked: bool,
    pub estop_pressed: bool,
    pub battery_voltage: f64,
}

impl StatusFrame {
    /// 编码到栈上缓冲区，返回有效字节切片
    pub fn encode<'a>(&self, buf: &'a mut [u8; STATUS_FRAME_LEN]) -> &'a [u8] {
        buf[0..2].copy_from_slice(&self.seq.to_be_bytes());
        let mut flags = 0u8;
        if self.robot_linked {
            flags |= FLAG_ROBOT_LINKED;
        }
        if self.radio_linked {
            flags |= FLAG_RADIO_LINKED;
        }
        if self.estop_pressed {
            flags |= FLAG_ESTOP_PRESSED;
        }
        buf[2] = flags;
        let centivolts = (self.battery_voltage * 100.0).round().clamp(0.0, f64::from(u16::MAX)) as u16;
        buf[3..5].copy_from_slice(&centivolts.to_be_bytes());
        buf[5] = self.station_code;
        buf[6..8].copy_from_slice(&self.team_id.to_be_bytes());
        &buf[..STATUS_FRAME_LEN]
    }

    /// 从字节序列解码
    pub fn decode(data: &[u8]) -> Result<Self, PacketError> {
        if data.len() < STATUS_FRAME_LEN {
            return Err(PacketError::TooShort {
                expected: STATUS_FRAME_LEN,
                actual: data.len(),
            });
        }
        let station_code = data[5];
        if station_code > 5 {
            return Err(PacketError::InvalidStationCode(station_code));
        }
        let flags = data[2];
        let centivolts = u16::from_be_bytes([data[3], data[4]]);
        Ok(Self {
            seq: u16::from_be_bytes([data[0], data[1]]),
            team_id: u16::from_be_bytes([data[6], data[7]]),
            station_code,
            robot_linked: flags & FLAG_ROBOT_LINKED != 0,
            radio_linked: flags & FLAG_RADIO_LINKED != 0,
            estop_pressed: flags & FLAG_ESTOP_PRESSED != 0,
            battery_voltage: f64::from(centivolts) / 100.0,
        })
    }
}
