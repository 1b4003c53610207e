//! 裁判指令通道
//!
//! 裁判台通过消息通道向场地下发判罚与赛后流程指令。比分类指令随时
//! 生效并广播实时比分；场地复位与赛果提交只在赛后阶段生效，其余
//! 阶段静默忽略。

use super::score::{CardType, Foul};
use super::{Alliance, Arena, DisplayScreen, MatchState};
use tracing::debug;

/// 裁判台下发的指令
#[derive(Debug, Clone, PartialEq)]
pub enum RefereeCommand {
    /// 记一次犯规（录入时刻的比赛时间由场地补上）
    AddFoul {
        alliance: Alliance,
        team_id: u32,
        rule: String,
        is_technical: bool,
    },
    /// 撤销一次犯规（按全部字段精确匹配第一条）
    DeleteFoul {
        alliance: Alliance,
        team_id: u32,
        rule: String,
        is_technical: bool,
        time_in_match_sec: f64,
    },
    /// 出示判罚卡
    Card {
        alliance: Alliance,
        team_id: u32,
        card: CardType,
    },
    /// 场地复位信号（仅赛后）
    SignalReset,
    /// 提交赛果（仅赛后）：锁定两个联盟的犯规录入
    CommitMatch,
}

impl Arena {
    /// 处理一条裁判指令
    pub fn handle_referee_command(&mut self, command: RefereeCommand) {
        match command {
            RefereeCommand::AddFoul {
                alliance,
                team_id,
                rule,
                is_technical,
            } => {
                let foul = Foul {
                    team_id,
                    rule,
                    is_technical,
                    time_in_match_sec: self.match_time_sec(),
                };
                self.realtime_score_mut(alliance).score.fouls.push(foul);
                self.notifiers.realtime_score.notify(None);
            }
            RefereeCommand::DeleteFoul {
                alliance,
                team_id,
                rule,
                is_technical,
                time_in_match_sec,
            } => {
                let fouls = &mut self.realtime_score_mut(alliance).score.fouls;
                if let Some(pos) = fouls.iter().position(|f| {
                    f.team_id == team_id
                        && f.rule == rule
                        && f.is_technical == is_technical
                        && f.time_in_match_sec == time_in_match_sec
                }) {
                    fouls.remove(pos);
                }
                self.notifiers.realtime_score.notify(None);
            }
            RefereeCommand::Card {
                alliance,
                team_id,
                card,
            } => {
                self.realtime_score_mut(alliance)
                    .cards
                    .insert(team_id.to_string(), card);
            }
            RefereeCommand::SignalReset => {
                if self.match_state != MatchState::PostMatch {
                    // 比赛结束前不允许清场
                    debug!(state = %self.match_state, "Ignoring field reset signal");
                    return;
                }
                self.field_reset = true;
                self.alliance_station_display_screen = DisplayScreen::FieldReset;
                self.notifiers.alliance_station_display.notify(None);
            }
            RefereeCommand::CommitMatch => {
                if self.match_state != MatchState::PostMatch {
                    // 比赛结束前不允许提交犯规
                    debug!(state = %self.match_state, "Ignoring match commit");
                    return;
                }
                self.red_realtime_score.fouls_committed = true;
                self.blue_realtime_score.fouls_committed = true;
                self.field_reset = true;
                self.alliance_station_display_screen = DisplayScreen::FieldReset;
                self.notifiers.alliance_station_display.notify(None);
                self.notifiers.scoring_status.notify(None);
            }
        }
    }
}
