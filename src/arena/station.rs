//! 联盟工位定义
//!
//! 场地上固定的六个工位（红方 R1-R3，蓝方 B1-B3）。每个工位保存
//! 分配的队伍、旁路与急停开关，以及该工位的驱动站连接。
//! 工位集合永不增减，工位标识永不变更。

use crate::ds::DriverStationConnection;
use crate::store::Team;
use std::fmt;
use std::str::FromStr;

/// 联盟（红/蓝）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alliance {
    Red,
    Blue,
}

impl fmt::Display for Alliance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alliance::Red => write!(f, "red"),
            Alliance::Blue => write!(f, "blue"),
        }
    }
}

/// 工位标识
///
/// 固定域：`R1 R2 R3 B1 B2 B3`。线协议中用 0-5 的单字节编码表示。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StationKey {
    R1,
    R2,
    R3,
    B1,
    B2,
    B3,
}

impl StationKey {
    /// 全部六个工位（固定顺序，与线协议编码一致）
    pub const ALL: [StationKey; 6] = [
        StationKey::R1,
        StationKey::R2,
        StationKey::R3,
        StationKey::B1,
        StationKey::B2,
        StationKey::B3,
    ];

    /// 工位所属联盟
    pub fn alliance(self) -> Alliance {
        match self {
            StationKey::R1 | StationKey::R2 | StationKey::R3 => Alliance::Red,
            StationKey::B1 | StationKey::B2 | StationKey::B3 => Alliance::Blue,
        }
    }

    /// 线协议编码（0-5）
    pub fn code(self) -> u8 {
        self.index() as u8
    }

    /// 从线协议编码还原工位
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// 工位在固定数组中的下标
    pub fn index(self) -> usize {
        match self {
            StationKey::R1 => 0,
            StationKey::R2 => 1,
            StationKey::R3 => 2,
            StationKey::B1 => 3,
            StationKey::B2 => 4,
            StationKey::B3 => 5,
        }
    }
}

impl fmt::Display for StationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StationKey::R1 => "R1",
            StationKey::R2 => "R2",
            StationKey::R3 => "R3",
            StationKey::B1 => "B1",
            StationKey::B2 => "B2",
            StationKey::B3 => "B3",
        };
        write!(f, "{name}")
    }
}

impl FromStr for StationKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "R1" => Ok(StationKey::R1),
            "R2" => Ok(StationKey::R2),
            "R3" => Ok(StationKey::R3),
            "B1" => Ok(StationKey::B1),
            "B2" => Ok(StationKey::B2),
            "B3" => Ok(StationKey::B3),
            _ => Err(()),
        }
    }
}

/// 联盟工位状态
///
/// 不变量：`ds_conn` 非空当且仅当 `team` 非空且队号大于 0，
/// 且连接上的队号、工位与本工位一致。`bypass` 与 `emergency_stop`
/// 是互相独立的操作员开关。
pub struct AllianceStation {
    pub key: StationKey,
    pub team: Option<Team>,
    pub bypass: bool,
    pub emergency_stop: bool,
    pub ds_conn: Option<Box<DriverStationConnection>>,
}

impl AllianceStation {
    pub fn new(key: StationKey) -> Self {
        Self {
            key,
            team: None,
            bypass: false,
            emergency_stop: false,
            ds_conn: None,
        }
    }

    /// 工位是否处于"活动"状态（未急停且未旁路）
    ///
    /// 非活动工位的 `enabled` 恒为 false，`auto` 仍跟随阶段广播值。
    pub fn is_live(&self) -> bool {
        !self.emergency_stop && !self.bypass
    }

    /// 开赛就绪判定：旁路，或队伍在位、连接存在且机器人链路正常
    ///
    /// 旁路可以替代缺席的队伍、缺失的连接和断开的链路，但不能替代
    /// 急停解除（急停在聚合层单独检查，且优先级更高）。
    pub fn is_ready(&self) -> bool {
        if self.bypass {
            return true;
        }
        match (&self.team, &self.ds_conn) {
            (Some(_), Some(conn)) => conn.robot_linked(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_key_parse() {
        for key in StationKey::ALL {
            let parsed: StationKey = key.to_string().parse().unwrap();
            assert_eq!(parsed, key);
        }
        assert!("R4".parse::<StationKey>().is_err());
        assert!("r1".parse::<StationKey>().is_err());
        assert!("".parse::<StationKey>().is_err());
    }

    #[test]
    fn test_station_key_codes() {
        // 编码与固定顺序一致，且可逆
        for (i, key) in StationKey::ALL.iter().enumerate() {
            assert_eq!(key.code() as usize, i);
            assert_eq!(StationKey::from_code(key.code()), Some(*key));
        }
        assert_eq!(StationKey::from_code(6), None);
    }

    #[test]
    fn test_station_key_alliance() {
        assert_eq!(StationKey::R2.alliance(), Alliance::Red);
        assert_eq!(StationKey::B1.alliance(), Alliance::Blue);
    }

    #[test]
    fn test_empty_station_not_ready_unless_bypassed() {
        let mut station = AllianceStation::new(StationKey::R1);
        assert!(!station.is_ready());
        station.bypass = true;
        assert!(station.is_ready());
    }

    #[test]
    fn test_live_flags_independent() {
        let mut station = AllianceStation::new(StationKey::B2);
        assert!(station.is_live());
        station.bypass = true;
        assert!(!station.is_live());
        station.bypass = false;
        station.emergency_stop = true;
        assert!(!station.is_live());
    }
}
