//! # Config 模块
//!
//! 宿主配置管理。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (JSON)
//! 3. 默认值（最低）

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use lyric_runtime::{Granularity, PlayerConfig, TextEffect};

/// 宿主配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// 播放器配置
    #[serde(default)]
    pub player: PlayerConfig,

    /// 帧率
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// 用户设置文件
    #[serde(default = "default_settings_path")]
    pub settings_path: PathBuf,
}

fn default_fps() -> u32 {
    60
}

fn default_settings_path() -> PathBuf {
    PathBuf::from("lyric-settings.json")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            player: PlayerConfig::default(),
            fps: default_fps(),
            settings_path: default_settings_path(),
        }
    }
}

/// 命令行覆盖项
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub fps: Option<u32>,
    pub settings_path: Option<PathBuf>,
    pub granularity: Option<Granularity>,
    pub effect: Option<TextEffect>,
}

impl AppConfig {
    /// 加载配置文件
    ///
    /// 文件不存在、读取失败或解析失败时返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = %path.display(), "配置文件不存在，使用默认配置");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => {
                    info!(path = %path.display(), "配置文件加载成功");
                    config
                }
                Err(e) => {
                    warn!(error = %e, "配置文件解析失败，使用默认配置");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(error = %e, "配置文件读取失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// 应用命令行覆盖
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(fps) = overrides.fps {
            self.fps = fps;
        }
        if let Some(path) = &overrides.settings_path {
            self.settings_path = path.clone();
        }
        if let Some(granularity) = overrides.granularity {
            self.player.lyrics.granularity = granularity;
        }
        if let Some(effect) = overrides.effect {
            self.player.lyrics.effect = effect;
        }
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fps == 0 || self.fps > 1000 {
            return Err(ConfigError::ValidationFailed(format!(
                "帧率必须在 1 - 1000 之间，当前 {}",
                self.fps
            )));
        }
        self.player.validate()?;
        Ok(())
    }

    /// 每帧间隔（毫秒）
    pub fn frame_interval_ms(&self) -> f64 {
        1000.0 / self.fps as f64
    }
}

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("配置 IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("配置验证失败: {0}")]
    ValidationFailed(String),

    #[error("播放器配置无效: {0}")]
    Player(#[from] lyric_runtime::ConfigError),
}
