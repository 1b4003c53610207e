//! 实时比分与判罚
//!
//! 每个联盟持有一份进行中的比分（得分、犯规列表、判罚卡）。
//! 计分规则引擎不在本层：这里只保存裁判台录入的原始事实。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 一次犯规记录
///
/// `time_in_match_sec` 记录录入时刻的比赛时间，用于复核时区分
/// 同一条规则下的多次犯规。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Foul {
    pub team_id: u32,
    pub rule: String,
    pub is_technical: bool,
    pub time_in_match_sec: f64,
}

/// 判罚卡
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Yellow,
    Red,
}

/// 单个联盟的比分
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub auto_points: i32,
    pub teleop_points: i32,
    pub fouls: Vec<Foul>,
}

impl Score {
    /// 己方得分合计（犯规加给对方的分值由规则引擎计算）
    pub fn total(&self) -> i32 {
        self.auto_points + self.teleop_points
    }
}

/// 一个联盟的实时计分状态
///
/// `fouls_committed` 在裁判确认提交后置位，外部界面据此锁定录入。
#[derive(Debug, Clone, Default)]
pub struct RealtimeScore {
    pub score: Score,
    pub cards: HashMap<String, CardType>,
    pub fouls_committed: bool,
}

impl RealtimeScore {
    pub fn new() -> Self {
        Self::default()
    }
}
