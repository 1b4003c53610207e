//! 场地控制守护进程
//!
//! 打开事件存储、构建场地聚合，然后以固定周期驱动 tick 循环。
//! 操作员与裁判界面作为外部协作者接入同一个场地实例。

use anyhow::Context;
use arena_sdk::arena::Arena;
use arena_sdk::config::FieldConfig;
use arena_sdk::net::UdpTransportFactory;
use arena_sdk::store::SqliteStore;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 场地控制守护进程
///
/// 驱动比赛状态机，并按固定节拍向各驱动站下发控制包
#[derive(Parser, Debug)]
#[command(name = "field_daemon")]
#[command(about = "Field control daemon - drives the match state machine and DS packet cadence", long_about = None)]
struct Args {
    /// 配置文件路径（TOML）
    ///
    /// 缺省使用标准赛制参数
    #[arg(long)]
    config: Option<PathBuf>,

    /// SQLite 数据库路径（覆盖配置文件）
    #[arg(long)]
    db: Option<String>,

    /// tick 周期（毫秒，覆盖配置文件）
    #[arg(long)]
    tick_ms: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => FieldConfig::load(path).context("failed to load field config")?,
        None => FieldConfig::default(),
    };
    if let Some(db) = args.db {
        config.db_path = db;
    }
    if let Some(tick_ms) = args.tick_ms {
        config.tick_period_ms = tick_ms;
    }

    let store =
        Arc::new(SqliteStore::open(&config.db_path).context("failed to open event store")?);
    let mut arena = Arena::new(store, Arc::new(UdpTransportFactory), config.timing);
    arena.setup().context("failed to set up arena")?;

    info!(
        db = %config.db_path,
        tick_ms = config.tick_period_ms,
        "Field daemon started"
    );

    // 单线程驱动循环：状态机与发包节拍都由这里推进。
    // 使用 spin_sleep 获得亚毫秒级周期精度。
    let tick = Duration::from_millis(config.tick_period_ms.max(1));
    loop {
        arena.update();
        spin_sleep::sleep(tick);
    }
}
