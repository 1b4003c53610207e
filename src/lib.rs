//! Arena SDK - 机器人竞赛场地控制核心
//!
//! 竞赛场地的权威协调者：为六个联盟工位分配队伍、执行开赛前的
//! 就绪判定、驱动比赛状态机、按固定节拍向各驱动站下发控制包，
//! 并通过通知主题向外部界面广播变更。
//!
//! # 架构层次
//!
//! - **底层** (`net`, `protocol`): 驱动站传输与线协议，零抽象开销
//! - **连接层** (`ds`): 每个被占用工位一条驱动站连接
//! - **核心** (`arena`): 状态机、就绪判定与 tick 循环
//! - **周边** (`store`, `notifier`, `config`): 存储契约、通知总线与配置

pub mod arena;
pub mod config;
pub mod ds;
pub mod error;
pub mod net;
pub mod notifier;
pub mod protocol;
pub mod store;

// Re-export 核心类型（简化用户导入）
pub use arena::{Alliance, AllianceStation, Arena, MatchState, MatchTiming, StationKey};
pub use ds::{DriverStationConnection, DsStatus};
pub use error::ArenaError;
pub use net::{DsTransport, DsTransportFactory, NetError};
pub use notifier::Notifier;
pub use protocol::{ControlPacket, PacketError, StatusFrame};
pub use store::{EventStore, Match, MatchResult, SqliteStore, StoreError, Team};
