//! 队伍与比赛存储
//!
//! 核心通过 [`EventStore`] 契约读写队伍、比赛与赛果；对核心而言
//! 存储是读多写少的外部协作者。内置 SQLite 实现（[`SqliteStore`]），
//! 测试用内存库。

mod sqlite;

pub use sqlite::SqliteStore;

use crate::arena::score::{CardType, Score};
use crate::arena::station::StationKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// 存储层错误类型
#[derive(Error, Debug)]
pub enum StoreError {
    /// 底层数据库错误
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// 比分/判罚卡序列化错误
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 参赛队伍
///
/// 队号为正整数；0 是"无队伍"哨兵，不会出现在存储里。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: u32,
    pub name: String,
    pub nickname: String,
}

/// 比赛类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// 测试赛（全零 `Match` 哨兵即此类型）
    #[default]
    Test,
    Practice,
    Qualification,
    Elimination,
}

impl MatchType {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchType::Test => "test",
            MatchType::Practice => "practice",
            MatchType::Qualification => "qualification",
            MatchType::Elimination => "elimination",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "test" => Some(MatchType::Test),
            "practice" => Some(MatchType::Practice),
            "qualification" => Some(MatchType::Qualification),
            "elimination" => Some(MatchType::Elimination),
            _ => None,
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 胜负结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Winner {
    Red,
    Blue,
    Tie,
    #[default]
    None,
}

impl Winner {
    /// 存储编码（单字母，未定为空串）
    pub fn as_str(self) -> &'static str {
        match self {
            Winner::Red => "R",
            Winner::Blue => "B",
            Winner::Tie => "T",
            Winner::None => "",
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "R" => Winner::Red,
            "B" => Winner::Blue,
            "T" => Winner::Tie,
            _ => Winner::None,
        }
    }
}

/// 一场比赛的定义
///
/// 六个队位存队号，0 表示空位。`Match::default()` 是合法的测试赛
/// 哨兵，可以直接装载。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Match {
    pub id: i64,
    pub display_name: String,
    pub match_type: MatchType,
    pub red1: u32,
    pub red2: u32,
    pub red3: u32,
    pub blue1: u32,
    pub blue2: u32,
    pub blue3: u32,
    pub winner: Winner,
}

impl Match {
    /// 指定工位对应的队号（0 表示空位）
    pub fn team_for_station(&self, key: StationKey) -> u32 {
        match key {
            StationKey::R1 => self.red1,
            StationKey::R2 => self.red2,
            StationKey::R3 => self.red3,
            StationKey::B1 => self.blue1,
            StationKey::B2 => self.blue2,
            StationKey::B3 => self.blue3,
        }
    }
}

/// 一场比赛的赛果（比分与判罚卡，按联盟分开）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchResult {
    pub match_id: i64,
    pub red_score: Score,
    pub blue_score: Score,
    pub red_cards: HashMap<String, CardType>,
    pub blue_cards: HashMap<String, CardType>,
}

/// 存储契约
///
/// 核心只依赖这组窄接口；底层错误原样向上抛出。
pub trait EventStore: Send + Sync {
    fn create_team(&self, team: &Team) -> Result<(), StoreError>;
    fn get_team_by_id(&self, id: u32) -> Result<Option<Team>, StoreError>;

    /// 插入比赛；id 为 0 时由存储分配，返回最终 id
    fn create_match(&self, new_match: &Match) -> Result<i64, StoreError>;
    fn get_match_by_id(&self, id: i64) -> Result<Option<Match>, StoreError>;
    fn get_matches_by_type(&self, match_type: MatchType) -> Result<Vec<Match>, StoreError>;

    fn save_match_result(&self, result: &MatchResult) -> Result<(), StoreError>;
    fn get_match_result(&self, match_id: i64) -> Result<Option<MatchResult>, StoreError>;
}
