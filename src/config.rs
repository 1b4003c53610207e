//! 场地配置
//!
//! TOML 配置文件加载；缺省值即标准赛制参数，不给配置文件也能
//! 直接起场。

use crate::arena::state::MatchTiming;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// 场地控制配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// 比赛阶段时长
    pub timing: MatchTiming,
    /// SQLite 数据库路径
    pub db_path: String,
    /// tick 周期（毫秒）
    pub tick_period_ms: u64,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            timing: MatchTiming::default(),
            db_path: "arena.db".to_string(),
            tick_period_ms: 2,
        }
    }
}

impl FieldConfig {
    /// 从 TOML 文件加载配置
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FieldConfig::default();
        assert_eq!(config.timing.auto_duration_sec, 15);
        assert_eq!(config.timing.teleop_duration_sec, 135);
        assert_eq!(config.db_path, "arena.db");
        assert_eq!(config.tick_period_ms, 2);
    }

    #[test]
    fn test_parse_partial_config() {
        // 缺失的字段落回缺省值
        let raw = "
            db_path = \"event.db\"

            [timing]
            auto_duration_sec = 10
            pause_duration_sec = 1
            teleop_duration_sec = 140
            endgame_time_left_sec = 30
        ";
        let config: FieldConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.db_path, "event.db");
        assert_eq!(config.timing.auto_duration_sec, 10);
        assert_eq!(config.tick_period_ms, 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = FieldConfig::load(Path::new("/nonexistent/field.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }
}
