//! 场地核心错误类型定义
//!
//! 操作员可见错误的措辞保持稳定：外部界面按子串匹配向操作员提示，
//! 不要改写既有消息。

use crate::arena::state::MatchState;
use crate::net::NetError;
use crate::store::StoreError;
use thiserror::Error;

/// 场地核心错误
#[derive(Error, Debug)]
pub enum ArenaError {
    /// 非法工位标识
    #[error("Invalid alliance station: {0}")]
    InvalidStation(String),

    /// 存储中不存在的队号
    #[error("Invalid team number: {0}")]
    InvalidTeam(u32),

    /// 在当前阶段不允许的比赛生命周期操作
    #[error("Cannot {op} match while the field is in {state}")]
    PhaseViolation {
        op: &'static str,
        state: MatchState,
    },

    /// 未装载比赛就启动
    #[error("Cannot start match because no match is loaded")]
    NoMatchLoaded,

    /// 有工位处于急停
    #[error("Cannot start match while an emergency stop is active")]
    EmergencyStopActive,

    /// 有工位既未旁路也未连上机器人
    #[error("Cannot start match until all robots are connected or bypassed")]
    RobotsNotReady,

    /// 建立驱动站连接失败
    #[error("Driver station connection failed: {0}")]
    Connection(#[from] NetError),

    /// 存储层错误（原样上抛）
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// 复核目标比赛不存在
    #[error("No such match: {0}")]
    NoSuchMatch(i64),
}
