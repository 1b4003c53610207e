//! 赛果复核
//!
//! 列出各类型比赛的结果供复核界面展示；编辑"当前比赛"时直接写回
//! 内存中的实时比分（哨兵标识 `"current"`），其余比赛写入存储。

use super::Arena;
use crate::error::ArenaError;
use crate::store::{Match, MatchResult, MatchType, Winner};

/// 复核目标：当前比赛（内存）或已存比赛（按 id）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSelector {
    Current,
    Id(i64),
}

impl MatchSelector {
    /// 解析来自外部接口的比赛标识
    pub fn parse(raw: &str) -> Option<Self> {
        if raw == "current" {
            Some(MatchSelector::Current)
        } else {
            raw.parse().ok().map(MatchSelector::Id)
        }
    }
}

/// 复核列表的一行
#[derive(Debug, Clone, PartialEq)]
pub struct MatchReviewItem {
    pub id: i64,
    pub display_name: String,
    pub red_teams: [u32; 3],
    pub blue_teams: [u32; 3],
    pub red_score: i32,
    pub blue_score: i32,
    pub winner: Winner,
}

impl Arena {
    /// 构造某一比赛类型的复核列表
    ///
    /// 未打完的比赛没有赛果，比分按 0 展示。
    pub fn match_review_list(
        &self,
        match_type: MatchType,
    ) -> Result<Vec<MatchReviewItem>, ArenaError> {
        let prefix = match match_type {
            MatchType::Practice => "P",
            MatchType::Qualification => "Q",
            _ => "",
        };
        let matches = self.store().get_matches_by_type(match_type)?;
        let mut items = Vec::with_capacity(matches.len());
        for m in matches {
            let result = self.store().get_match_result(m.id)?;
            let (red_score, blue_score) = match &result {
                Some(r) => (r.red_score.total(), r.blue_score.total()),
                None => (0, 0),
            };
            items.push(MatchReviewItem {
                id: m.id,
                display_name: format!("{prefix}{}", m.display_name),
                red_teams: [m.red1, m.red2, m.red3],
                blue_teams: [m.blue1, m.blue2, m.blue3],
                red_score,
                blue_score,
                winner: m.winner,
            });
        }
        Ok(items)
    }

    /// 读取复核目标的比赛与赛果
    ///
    /// 当前比赛取内存中的实时比分快照；已存比赛还没有赛果时返回
    /// 空白赛果（先复核后补打的比赛是允许的）。
    pub fn match_for_review(
        &self,
        selector: MatchSelector,
    ) -> Result<(Match, MatchResult), ArenaError> {
        match selector {
            MatchSelector::Current => {
                let current = self
                    .current_match
                    .clone()
                    .ok_or(ArenaError::NoMatchLoaded)?;
                let result = self.current_match_result();
                Ok((current, result))
            }
            MatchSelector::Id(id) => {
                let found = self
                    .store()
                    .get_match_by_id(id)?
                    .ok_or(ArenaError::NoSuchMatch(id))?;
                let result = self
                    .store()
                    .get_match_result(id)?
                    .unwrap_or_else(|| MatchResult {
                        match_id: id,
                        ..Default::default()
                    });
                Ok((found, result))
            }
        }
    }

    /// 当前实时比分的赛果快照
    pub fn current_match_result(&self) -> MatchResult {
        MatchResult {
            match_id: self.current_match.as_ref().map(|m| m.id).unwrap_or(0),
            red_score: self.red_realtime_score.score.clone(),
            blue_score: self.blue_realtime_score.score.clone(),
            red_cards: self.red_realtime_score.cards.clone(),
            blue_cards: self.blue_realtime_score.cards.clone(),
        }
    }

    /// 保存复核编辑
    ///
    /// 当前比赛写回内存实时比分而不持久化；其余比赛持久化到存储。
    pub fn save_match_review(
        &mut self,
        selector: MatchSelector,
        result: MatchResult,
    ) -> Result<(), ArenaError> {
        match selector {
            MatchSelector::Current => {
                self.red_realtime_score.score = result.red_score;
                self.red_realtime_score.cards = result.red_cards;
                self.blue_realtime_score.score = result.blue_score;
                self.blue_realtime_score.cards = result.blue_cards;
                Ok(())
            }
            MatchSelector::Id(_) => {
                self.store().save_match_result(&result)?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_parse() {
        assert_eq!(MatchSelector::parse("current"), Some(MatchSelector::Current));
        assert_eq!(MatchSelector::parse("12"), Some(MatchSelector::Id(12)));
        assert_eq!(MatchSelector::parse("latest"), None);
        assert_eq!(MatchSelector::parse(""), None);
    }
}
