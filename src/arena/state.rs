//! 比赛状态机
//!
//! 六个阶段按累计时间阈值推进，所有阈值都相对开赛时刻计算，
//! 没有任何隐藏的中间时间戳。因此把 `match_start_time` 向过去回拨
//! 即可快进任意阶段，一次推进调用也可能跨越多个阈值。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// 比赛阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    /// 赛前：可装载/启动比赛
    PreMatch,
    /// 自动阶段
    Auto,
    /// 自动与手动之间的停顿
    Pause,
    /// 手动阶段
    Teleop,
    /// 终局（手动阶段的最后一段）
    Endgame,
    /// 赛后：等待复位
    PostMatch,
}

impl MatchState {
    /// 该阶段是否处于比赛进行中（`match_start_time` 仅在此期间有意义）
    pub fn is_running(self) -> bool {
        matches!(
            self,
            MatchState::Auto | MatchState::Pause | MatchState::Teleop | MatchState::Endgame
        )
    }
}

impl fmt::Display for MatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchState::PreMatch => "pre-match",
            MatchState::Auto => "autonomous",
            MatchState::Pause => "pause",
            MatchState::Teleop => "teleop",
            MatchState::Endgame => "endgame",
            MatchState::PostMatch => "post-match",
        };
        write!(f, "{name}")
    }
}

/// 每个阶段广播到驱动站的 `(auto, enabled)` 标志
///
/// `enabled` 仅对活动工位生效；急停或旁路的工位 `enabled` 恒为 false。
pub fn broadcast_flags(state: MatchState) -> (bool, bool) {
    match state {
        MatchState::PreMatch => (true, false),
        MatchState::Auto => (true, true),
        MatchState::Pause => (false, false),
        MatchState::Teleop => (false, true),
        MatchState::Endgame => (false, true),
        MatchState::PostMatch => (false, false),
    }
}

/// 比赛阶段时长（秒）
///
/// 进程启动时确定，运行期间不变。`endgame_time_left_sec` 表示
/// "手动阶段剩余多少秒时进入终局"。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchTiming {
    pub auto_duration_sec: u64,
    pub pause_duration_sec: u64,
    pub teleop_duration_sec: u64,
    pub endgame_time_left_sec: u64,
}

impl Default for MatchTiming {
    fn default() -> Self {
        Self {
            auto_duration_sec: 15,
            pause_duration_sec: 2,
            teleop_duration_sec: 135,
            endgame_time_left_sec: 30,
        }
    }
}

impl MatchTiming {
    /// 自动阶段结束阈值
    pub fn auto_end(&self) -> Duration {
        Duration::from_secs(self.auto_duration_sec)
    }

    /// 手动阶段开始阈值
    pub fn teleop_start(&self) -> Duration {
        Duration::from_secs(self.auto_duration_sec + self.pause_duration_sec)
    }

    /// 终局开始阈值
    pub fn endgame_start(&self) -> Duration {
        let total = self.auto_duration_sec + self.pause_duration_sec + self.teleop_duration_sec;
        Duration::from_secs(total - self.endgame_time_left_sec.min(self.teleop_duration_sec))
    }

    /// 比赛结束阈值
    pub fn match_end(&self) -> Duration {
        Duration::from_secs(
            self.auto_duration_sec + self.pause_duration_sec + self.teleop_duration_sec,
        )
    }

    /// 由开赛以来的时间计算当前阶段
    ///
    /// 阈值严格单调，直接映射到目标阶段，时钟跳变时自然跨越
    /// 中间阶段。入参仅在比赛进行中有意义，返回值不含赛前阶段。
    pub fn state_for_elapsed(&self, elapsed: Duration) -> MatchState {
        if elapsed >= self.match_end() {
            MatchState::PostMatch
        } else if elapsed >= self.endgame_start() {
            MatchState::Endgame
        } else if elapsed >= self.teleop_start() {
            MatchState::Teleop
        } else if elapsed >= self.auto_end() {
            MatchState::Pause
        } else {
            MatchState::Auto
        }
    }

    /// 比赛剩余时间（下限为零）
    pub fn time_remaining(&self, elapsed: Duration) -> Duration {
        self.match_end().saturating_sub(elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_state_thresholds() {
        let timing = MatchTiming::default();
        assert_eq!(timing.state_for_elapsed(secs(0)), MatchState::Auto);
        assert_eq!(timing.state_for_elapsed(secs(14)), MatchState::Auto);
        assert_eq!(timing.state_for_elapsed(secs(15)), MatchState::Pause);
        assert_eq!(timing.state_for_elapsed(secs(16)), MatchState::Pause);
        assert_eq!(timing.state_for_elapsed(secs(17)), MatchState::Teleop);
        assert_eq!(timing.state_for_elapsed(secs(121)), MatchState::Teleop);
        assert_eq!(timing.state_for_elapsed(secs(122)), MatchState::Endgame);
        assert_eq!(timing.state_for_elapsed(secs(151)), MatchState::Endgame);
        assert_eq!(timing.state_for_elapsed(secs(152)), MatchState::PostMatch);
        assert_eq!(timing.state_for_elapsed(secs(100_000)), MatchState::PostMatch);
    }

    #[test]
    fn test_broadcast_flags_table() {
        assert_eq!(broadcast_flags(MatchState::PreMatch), (true, false));
        assert_eq!(broadcast_flags(MatchState::Auto), (true, true));
        assert_eq!(broadcast_flags(MatchState::Pause), (false, false));
        assert_eq!(broadcast_flags(MatchState::Teleop), (false, true));
        assert_eq!(broadcast_flags(MatchState::Endgame), (false, true));
        assert_eq!(broadcast_flags(MatchState::PostMatch), (false, false));
    }

    #[test]
    fn test_time_remaining_clamped() {
        let timing = MatchTiming::default();
        assert_eq!(timing.time_remaining(secs(0)), secs(152));
        assert_eq!(timing.time_remaining(secs(122)), secs(30));
        assert_eq!(timing.time_remaining(secs(200)), secs(0));
    }

    #[test]
    fn test_endgame_longer_than_teleop_saturates() {
        // 终局窗口不可能早于手动阶段开始
        let timing = MatchTiming {
            auto_duration_sec: 10,
            pause_duration_sec: 1,
            teleop_duration_sec: 20,
            endgame_time_left_sec: 60,
        };
        assert_eq!(timing.endgame_start(), secs(11));
    }
}
