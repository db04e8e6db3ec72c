//! # Settings 模块
//!
//! 用户偏好的持久化（透明背景开关）。

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, warn};

use lyric_runtime::UserSettings;

/// 用户设置文件
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取设置；文件不存在或损坏时返回默认设置
    pub fn load(&self) -> UserSettings {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "用户设置不可读，使用默认值");
                return UserSettings::default();
            }
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "用户设置解析失败，使用默认值");
            UserSettings::default()
        })
    }

    pub fn save(&self, settings: &UserSettings) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, json)
            .with_context(|| format!("无法写入用户设置: {}", self.path.display()))?;
        debug!(path = %self.path.display(), ?settings, "用户设置已保存");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        assert_eq!(store.load(), UserSettings::default());
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        let settings = UserSettings {
            transparent_background: true,
        };
        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn test_corrupt_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "true").unwrap();
        assert_eq!(SettingsStore::new(path).load(), UserSettings::default());
    }

    #[test]
    fn test_save_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("missing").join("settings.json"));
        let err = store.save(&UserSettings::default()).unwrap_err();
        assert!(format!("{err:#}").contains("无法写入用户设置"));
    }
}
