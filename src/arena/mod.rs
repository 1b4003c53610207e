//! 场地控制核心
//!
//! [`Arena`] 聚合六个联盟工位、当前比赛、比赛状态机与通知主题，
//! 由单一驱动循环（[`Arena::update`]）推进：每次推进采样一次时钟、
//! 推进状态机、重算各工位的广播标志，并在共享节拍到达时向所有
//! 连接的驱动站发送控制包。
//!
//! 所有操作员命令在进入前按当前阶段校验；tick 循环本身从不向
//! 调用方返回错误。

pub mod referee;
pub mod review;
pub mod score;
pub mod state;
pub mod station;

pub use referee::RefereeCommand;
pub use review::{MatchReviewItem, MatchSelector};
pub use score::{CardType, Foul, RealtimeScore, Score};
pub use state::{MatchState, MatchTiming, broadcast_flags};
pub use station::{Alliance, AllianceStation, StationKey};

use crate::ds::DriverStationConnection;
use crate::error::ArenaError;
use crate::net::DsTransportFactory;
use crate::notifier::ArenaNotifiers;
use crate::protocol::constants::DS_PACKET_PERIOD_MS;
use crate::store::{EventStore, Match};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// 工位显示屏内容
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayScreen {
    #[default]
    Blank,
    Logo,
    MatchPlay,
    FieldReset,
}

impl fmt::Display for DisplayScreen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DisplayScreen::Blank => "blank",
            DisplayScreen::Logo => "logo",
            DisplayScreen::MatchPlay => "match",
            DisplayScreen::FieldReset => "fieldReset",
        };
        write!(f, "{name}")
    }
}

/// 场地聚合
///
/// 不变量：
/// - 工位数组恒为六个固定工位，键永不变更
/// - `current_match` 仅可能在赛前阶段为空
/// - `match_start_time` 仅在比赛进行阶段有意义
/// - 工位连接上的队号与工位始终与该工位一致
///
/// `match_start_time` 与 `last_ds_packet_time` 公开可写：阶段转换
/// 只依赖 `now - match_start_time`，测试把它们向过去回拨即可快进。
pub struct Arena {
    stations: [AllianceStation; 6],
    pub current_match: Option<Match>,
    pub match_state: MatchState,
    /// 开赛时刻
    pub match_start_time: Instant,
    /// 上次向全部驱动站发包的时刻（六个工位共享同一节拍）
    pub last_ds_packet_time: Instant,
    pub red_realtime_score: RealtimeScore,
    pub blue_realtime_score: RealtimeScore,
    /// 赛后场地复位标志（裁判发出复位信号后置位）
    pub field_reset: bool,
    pub alliance_station_display_screen: DisplayScreen,
    pub notifiers: ArenaNotifiers,
    timing: MatchTiming,
    store: Arc<dyn EventStore>,
    transports: Arc<dyn DsTransportFactory>,
}

impl Arena {
    pub fn new(
        store: Arc<dyn EventStore>,
        transports: Arc<dyn DsTransportFactory>,
        timing: MatchTiming,
    ) -> Self {
        let now = Instant::now();
        // 发包时间戳初始化为"节拍已到"，首个 tick 即发出第一轮包
        let packet_epoch = now
            .checked_sub(Duration::from_millis(2 * DS_PACKET_PERIOD_MS))
            .unwrap_or(now);
        Self {
            stations: StationKey::ALL.map(AllianceStation::new),
            current_match: None,
            match_state: MatchState::PreMatch,
            match_start_time: now,
            last_ds_packet_time: packet_epoch,
            red_realtime_score: RealtimeScore::new(),
            blue_realtime_score: RealtimeScore::new(),
            field_reset: false,
            alliance_station_display_screen: DisplayScreen::Blank,
            notifiers: ArenaNotifiers::default(),
            timing,
            store,
            transports,
        }
    }

    /// 阶段时长配置
    pub fn timing(&self) -> MatchTiming {
        self.timing
    }

    /// 存储句柄
    pub fn store(&self) -> &dyn EventStore {
        self.store.as_ref()
    }

    pub fn station(&self, key: StationKey) -> &AllianceStation {
        &self.stations[key.index()]
    }

    pub fn station_mut(&mut self, key: StationKey) -> &mut AllianceStation {
        &mut self.stations[key.index()]
    }

    /// 按固定顺序遍历六个工位
    pub fn stations(&self) -> impl Iterator<Item = &AllianceStation> {
        self.stations.iter()
    }

    /// 指定联盟的实时比分
    pub fn realtime_score(&self, alliance: Alliance) -> &RealtimeScore {
        match alliance {
            Alliance::Red => &self.red_realtime_score,
            Alliance::Blue => &self.blue_realtime_score,
        }
    }

    pub fn realtime_score_mut(&mut self, alliance: Alliance) -> &mut RealtimeScore {
        match alliance {
            Alliance::Red => &mut self.red_realtime_score,
            Alliance::Blue => &mut self.blue_realtime_score,
        }
    }

    /// 把队伍分配到工位（工位名形式，供外部接口使用）
    pub fn assign_team(&mut self, team_id: u32, station_name: &str) -> Result<(), ArenaError> {
        let key: StationKey = station_name
            .parse()
            .map_err(|_| ArenaError::InvalidStation(station_name.to_string()))?;
        self.assign_team_to_station(team_id, key)
    }

    /// 把队伍分配到工位
    ///
    /// - 队号 0 表示清空工位：关闭既有连接、移除队伍，旁路与急停
    ///   开关保持不动
    /// - 同队重复分配是空操作，既有连接原样保留
    /// - 换队时先关闭旧连接，再建立新连接；新链路建立失败时工位
    ///   保持空置，不会留下半套状态
    ///
    /// 分配本身不触发广播；装载比赛与 `setup` 负责通知。
    pub fn assign_team_to_station(
        &mut self,
        team_id: u32,
        key: StationKey,
    ) -> Result<(), ArenaError> {
        if team_id == 0 {
            self.release_station(key);
            return Ok(());
        }

        let team = self
            .store
            .get_team_by_id(team_id)?
            .ok_or(ArenaError::InvalidTeam(team_id))?;

        if self.stations[key.index()].team.as_ref().map(|t| t.id) == Some(team_id) {
            // 同队重复分配：保留既有连接
            return Ok(());
        }

        // 旧连接必须在新连接出现之前关闭
        self.release_station(key);
        let transport = self.transports.open(team_id, key)?;
        let station = &mut self.stations[key.index()];
        station.team = Some(team);
        station.ds_conn = Some(Box::new(DriverStationConnection::new(
            team_id, key, transport,
        )));
        Ok(())
    }

    /// 清空工位：关闭既有连接并移除队伍
    fn release_station(&mut self, key: StationKey) {
        let station = &mut self.stations[key.index()];
        if let Some(mut conn) = station.ds_conn.take() {
            if let Err(e) = conn.close() {
                warn!(team = conn.team_id, station = %key, "Error closing driver station connection: {e}");
            }
        }
        station.team = None;
    }

    /// 装载一场比赛
    ///
    /// 仅赛前阶段可用。按比赛定义重新分配六个工位，重置实时比分，
    /// 并广播 `match_load_teams`。
    pub fn load_match(&mut self, new_match: Match) -> Result<(), ArenaError> {
        if self.match_state != MatchState::PreMatch {
            return Err(ArenaError::PhaseViolation {
                op: "load",
                state: self.match_state,
            });
        }
        for key in StationKey::ALL {
            self.assign_team_to_station(new_match.team_for_station(key), key)?;
        }
        info!(match_id = new_match.id, name = %new_match.display_name, "Match loaded");
        self.current_match = Some(new_match);
        self.red_realtime_score = RealtimeScore::new();
        self.blue_realtime_score = RealtimeScore::new();
        self.notifiers.match_load_teams.notify(None);
        Ok(())
    }

    /// 启动已装载的比赛
    ///
    /// 仅赛前阶段可用，且必须通过就绪判定（急停优先于链路检查）。
    /// 成功后记录开赛时刻并进入自动阶段。
    pub fn start_match(&mut self) -> Result<(), ArenaError> {
        if self.match_state != MatchState::PreMatch {
            return Err(ArenaError::PhaseViolation {
                op: "start",
                state: self.match_state,
            });
        }
        if self.current_match.is_none() {
            return Err(ArenaError::NoMatchLoaded);
        }
        self.check_can_start_match()?;

        self.match_start_time = Instant::now();
        self.match_state = MatchState::Auto;
        info!("Match started");
        Ok(())
    }

    /// 复位比赛
    ///
    /// 赛前（幂等）或赛后可用。回到赛前阶段、卸载当前比赛，并清除
    /// 所有工位的旁路与急停开关。
    pub fn reset_match(&mut self) -> Result<(), ArenaError> {
        if !matches!(self.match_state, MatchState::PreMatch | MatchState::PostMatch) {
            return Err(ArenaError::PhaseViolation {
                op: "reset",
                state: self.match_state,
            });
        }
        self.enter_pre_match();
        info!("Match reset");
        Ok(())
    }

    /// 把场地恢复为初始赛前状态
    ///
    /// 释放全部连接并清除开关；若已装载比赛，则按其定义重新分配
    /// 六个工位并广播 `match_load_teams`。未装载比赛时装入全零的
    /// 测试赛哨兵，空场也能直接开赛。
    pub fn setup(&mut self) -> Result<(), ArenaError> {
        let loaded = self.current_match.clone();
        for key in StationKey::ALL {
            self.assign_team_to_station(0, key)?;
        }
        self.enter_pre_match();
        match loaded {
            Some(loaded) => {
                for key in StationKey::ALL {
                    self.assign_team_to_station(loaded.team_for_station(key), key)?;
                }
                self.current_match = Some(loaded);
                self.notifiers.match_load_teams.notify(None);
            }
            None => {
                self.current_match = Some(Match::default());
            }
        }
        Ok(())
    }

    /// 就绪判定：先查急停，再逐工位查旁路或链路
    fn check_can_start_match(&self) -> Result<(), ArenaError> {
        if self.stations.iter().any(|s| s.emergency_stop) {
            return Err(ArenaError::EmergencyStopActive);
        }
        if self.stations.iter().all(AllianceStation::is_ready) {
            Ok(())
        } else {
            Err(ArenaError::RobotsNotReady)
        }
    }

    /// 进入赛前阶段时统一执行的清理
    fn enter_pre_match(&mut self) {
        self.match_state = MatchState::PreMatch;
        self.current_match = None;
        for station in &mut self.stations {
            station.bypass = false;
            station.emergency_stop = false;
        }
        self.red_realtime_score = RealtimeScore::new();
        self.blue_realtime_score = RealtimeScore::new();
        self.field_reset = false;
        self.alliance_station_display_screen = DisplayScreen::Blank;
        self.notifiers.reload_displays.notify(None);
    }

    /// 推进一个 tick
    ///
    /// 1. 采样一次时钟
    /// 2. 推进状态机（时钟跳变时一次跨越多个阈值）
    /// 3. 重算各工位的 `(auto, enabled)` 并排空入站状态帧
    /// 4. 节拍到达时向所有连接发送控制包（同一 tick 内全发或全不发）
    ///
    /// 传输错误只记日志，单个工位的故障不能拖住整个场地。
    pub fn update(&mut self) {
        let now = Instant::now();

        if self.match_state.is_running() {
            let elapsed = now.saturating_duration_since(self.match_start_time);
            let next = self.timing.state_for_elapsed(elapsed);
            if next != self.match_state {
                info!(from = %self.match_state, to = %next, "Match state transition");
                self.match_state = next;
            }
        }

        let (auto, enabled) = broadcast_flags(self.match_state);
        for station in &mut self.stations {
            let live = !station.emergency_stop && !station.bypass;
            if let Some(conn) = station.ds_conn.as_deref_mut() {
                conn.auto = auto;
                conn.enabled = enabled && live;
                conn.emergency_stop = station.emergency_stop;
                conn.poll_status();
            }
        }

        if now.saturating_duration_since(self.last_ds_packet_time)
            >= Duration::from_millis(DS_PACKET_PERIOD_MS)
        {
            let remaining = self.match_time_remaining_sec(now);
            for station in &mut self.stations {
                if let Some(conn) = station.ds_conn.as_deref_mut() {
                    if let Err(e) = conn.send_control_packet(remaining) {
                        warn!(team = conn.team_id, station = %station.key, "Failed to send control packet: {e}");
                    }
                }
            }
            self.last_ds_packet_time = now;
        }
    }

    /// 开赛以来的秒数（未在比赛中为 0）
    ///
    /// 裁判录入的犯规用它打时间戳。
    pub fn match_time_sec(&self) -> f64 {
        if self.match_state.is_running() {
            self.match_start_time.elapsed().as_secs_f64()
        } else {
            0.0
        }
    }

    /// 控制包携带的剩余比赛时间（秒）
    fn match_time_remaining_sec(&self, now: Instant) -> u16 {
        match self.match_state {
            MatchState::PreMatch => self.timing.match_end().as_secs() as u16,
            MatchState::PostMatch => 0,
            _ => {
                let elapsed = now.saturating_duration_since(self.match_start_time);
                self.timing.time_remaining(elapsed).as_secs() as u16
            }
        }
    }
}
