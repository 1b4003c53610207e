//! SQLite 存储实现
//!
//! 单连接加互斥锁即可满足场地侧的读写压力。比分与判罚卡按 JSON
//! 文本列存储，复核界面用同一套序列化格式编辑。

use super::{EventStore, Match, MatchResult, MatchType, StoreError, Team, Winner};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, params};

/// SQLite 存储
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// 打开（或创建）数据库并确保表结构存在
    ///
    /// 传 `":memory:"` 得到进程内临时库（测试用）。
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS teams (
                id       INTEGER PRIMARY KEY,
                name     TEXT NOT NULL DEFAULT '',
                nickname TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE IF NOT EXISTS matches (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                display_name TEXT NOT NULL DEFAULT '',
                match_type   TEXT NOT NULL,
                red1         INTEGER NOT NULL DEFAULT 0,
                red2         INTEGER NOT NULL DEFAULT 0,
                red3         INTEGER NOT NULL DEFAULT 0,
                blue1        INTEGER NOT NULL DEFAULT 0,
                blue2        INTEGER NOT NULL DEFAULT 0,
                blue3        INTEGER NOT NULL DEFAULT 0,
                winner       TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE IF NOT EXISTS match_results (
                match_id        INTEGER PRIMARY KEY,
                red_score_json  TEXT NOT NULL,
                blue_score_json TEXT NOT NULL,
                red_cards_json  TEXT NOT NULL,
                blue_cards_json TEXT NOT NULL
            );
            ",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// 打开进程内临时库
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::open(":memory:")
    }
}

fn row_to_match(row: &Row<'_>) -> rusqlite::Result<Match> {
    let match_type: String = row.get("match_type")?;
    let winner: String = row.get("winner")?;
    Ok(Match {
        id: row.get("id")?,
        display_name: row.get("display_name")?,
        match_type: MatchType::parse(&match_type).unwrap_or_default(),
        red1: row.get("red1")?,
        red2: row.get("red2")?,
        red3: row.get("red3")?,
        blue1: row.get("blue1")?,
        blue2: row.get("blue2")?,
        blue3: row.get("blue3")?,
        winner: Winner::parse(&winner),
    })
}

impl EventStore for SqliteStore {
    fn create_team(&self, team: &Team) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO teams (id, name, nickname) VALUES (?1, ?2, ?3)",
            params![team.id, team.name, team.nickname],
        )?;
        Ok(())
    }

    fn get_team_by_id(&self, id: u32) -> Result<Option<Team>, StoreError> {
        let conn = self.conn.lock();
        let team = conn
            .query_row(
                "SELECT id, name, nickname FROM teams WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Team {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        nickname: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(team)
    }

    fn create_match(&self, new_match: &Match) -> Result<i64, StoreError> {
        let conn = self.conn.lock();
        if new_match.id > 0 {
            conn.execute(
                "INSERT INTO matches (id, display_name, match_type, red1, red2, red3, blue1, blue2, blue3, winner)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    new_match.id,
                    new_match.display_name,
                    new_match.match_type.as_str(),
                    new_match.red1,
                    new_match.red2,
                    new_match.red3,
                    new_match.blue1,
                    new_match.blue2,
                    new_match.blue3,
                    new_match.winner.as_str(),
                ],
            )?;
            Ok(new_match.id)
        } else {
            conn.execute(
                "INSERT INTO matches (display_name, match_type, red1, red2, red3, blue1, blue2, blue3, winner)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    new_match.display_name,
                    new_match.match_type.as_str(),
                    new_match.red1,
                    new_match.red2,
                    new_match.red3,
                    new_match.blue1,
                    new_match.blue2,
                    new_match.blue3,
                    new_match.winner.as_str(),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        }
    }

    fn get_match_by_id(&self, id: i64) -> Result<Option<Match>, StoreError> {
        let conn = self.conn.lock();
        let found = conn
            .query_row(
                "SELECT * FROM matches WHERE id = ?1",
                params![id],
                row_to_match,
            )
            .optional()?;
        Ok(found)
    }

    fn get_matches_by_type(&self, match_type: MatchType) -> Result<Vec<Match>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT * FROM matches WHERE match_type = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![match_type.as_str()], row_to_match)?;
        let mut matches = Vec::new();
        for row in rows {
            matches.push(row?);
        }
        Ok(matches)
    }

    fn save_match_result(&self, result: &MatchResult) -> Result<(), StoreError> {
        let red_score_json = serde_json::to_string(&result.red_score)?;
        let blue_score_json = serde_json::to_string(&result.blue_score)?;
        let red_cards_json = serde_json::to_string(&result.red_cards)?;
        let blue_cards_json = serde_json::to_string(&result.blue_cards)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO match_results
                 (match_id, red_score_json, blue_score_json, red_cards_json, blue_cards_json)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                result.match_id,
                red_score_json,
                blue_score_json,
                red_cards_json,
                blue_cards_json,
            ],
        )?;
        Ok(())
    }

    fn get_match_result(&self, match_id: i64) -> Result<Option<MatchResult>, StoreError> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                "SELECT red_score_json, blue_score_json, red_cards_json, blue_cards_json
                 FROM match_results WHERE match_id = ?1",
                params![match_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;
        match row {
            Some((red_score, blue_score, red_cards, blue_cards)) => Ok(Some(MatchResult {
                match_id,
                red_score: serde_json::from_str(&red_score)?,
                blue_score: serde_json::from_str(&blue_score)?,
                red_cards: serde_json::from_str(&red_cards)?,
                blue_cards: serde_json::from_str(&blue_cards)?,
            })),
            None => Ok(None),
        }
    }
}
