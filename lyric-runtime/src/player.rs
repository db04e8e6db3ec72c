//! # Player 模块
//!
//! 播放器状态机：把播放位置、歌词列表和对象池串成逐帧循环。
//!
//! ```text
//! Loading ──mark_ready──► Ready ──start──► Started
//!    │                      │
//!    └───────fail───────────┴──► Failed（持久，不重试）
//! ```
//!
//! 每帧（[`LyricPlayer::tick`]）：
//! 读取播放位置 → 推进 Cue → 按生成计划创建文字对象 → 对象池更新/回收/绘制。
//! 对象池每帧都会推进；Cue 只在 `Started` 状态推进。

use std::fmt;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::PlayerConfig;
use crate::cue::layout::TextMeasurer;
use crate::cue::{CueTrack, LayoutContext};
use crate::error::LyricResult;
use crate::pool::ObjectPool;
use crate::render::{Color, RenderCommand, Viewport};
use crate::timecode::format_timecode;
use crate::visual::{TextTemplate, UpdateContext};

const START_HINT: &str =
    "Press S to Start | R: Reset | B: Toggle Background (Color or Transparent) | M: Mute/Unmute";

/// 音频播放协作者
pub trait Transport {
    /// 当前播放位置（毫秒）
    fn position_ms(&self) -> f64;

    fn is_playing(&self) -> bool;

    fn play(&mut self);

    /// 播放/暂停切换
    fn play_pause(&mut self);

    fn seek(&mut self, position_ms: f64);

    fn is_muted(&self) -> bool;

    fn set_muted(&mut self, muted: bool);
}

/// 由外部持久化的用户偏好
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserSettings {
    /// 使用透明背景
    #[serde(default)]
    pub transparent_background: bool,
}

/// 播放器状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerStatus {
    /// 资源加载中
    Loading,
    /// 资源就绪，等待开始
    Ready,
    /// 已开始
    Started,
    /// 启动资源加载失败
    Failed(String),
}

/// 键盘操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// `S`：开始，或在开始后播放/暂停
    StartOrToggle,
    /// `R`：回到开头
    Reset,
    /// `B`：切换背景（颜色/透明）
    ToggleBackground,
    /// `M`：静音切换
    ToggleMute,
    /// 空格：吞掉，不做处理
    Swallow,
}

impl KeyAction {
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            's' => Some(Self::StartOrToggle),
            'r' => Some(Self::Reset),
            'b' => Some(Self::ToggleBackground),
            'm' => Some(Self::ToggleMute),
            ' ' => Some(Self::Swallow),
            _ => None,
        }
    }
}

/// 背景
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Background {
    Color(Color),
    Transparent,
}

/// 叠加在画面上的提示信息
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Overlay {
    /// 启动失败
    Error(String),
    Loading,
    /// 等待按键开始
    StartHint,
    /// 播放状态行
    Status(String),
}

impl fmt::Display for Overlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Overlay::Error(message) => write!(f, "Error: {}", message),
            Overlay::Loading => write!(f, "Loading..."),
            Overlay::StartHint => write!(f, "{}", START_HINT),
            Overlay::Status(line) => write!(f, "{}", line),
        }
    }
}

/// 单帧输出
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub background: Background,
    /// 按插入顺序排列的绘制描述
    pub commands: Vec<RenderCommand>,
    pub overlay: Overlay,
    /// 本帧使用的播放位置（未开始时为 `None`）
    pub position_ms: Option<f64>,
}

/// 歌词播放器
pub struct LyricPlayer<T: Transport, M: TextMeasurer> {
    config: PlayerConfig,
    transport: T,
    measurer: M,
    track: CueTrack,
    pool: ObjectPool,
    template: TextTemplate,
    status: PlayerStatus,
    playing: bool,
    transparent: bool,
    viewport: Viewport,
    font_size: f32,
    rng: StdRng,
}

impl<T: Transport, M: TextMeasurer> LyricPlayer<T, M> {
    /// 创建播放器（状态为 `Loading`）
    pub fn new(
        config: PlayerConfig,
        track: CueTrack,
        transport: T,
        measurer: M,
        settings: UserSettings,
    ) -> LyricResult<Self> {
        config.validate()?;
        let viewport = config.viewport();
        let font_size = config.font_size(viewport.width);
        let template = config.text_template();

        Ok(Self {
            config,
            transport,
            measurer,
            track,
            pool: ObjectPool::new(),
            template,
            status: PlayerStatus::Loading,
            playing: false,
            transparent: settings.transparent_background,
            viewport,
            font_size,
            rng: StdRng::from_os_rng(),
        })
    }

    /// 固定随机种子（用于可重复的输出）
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// 资源加载完成
    pub fn mark_ready(&mut self) {
        if self.status == PlayerStatus::Loading {
            info!(cues = self.track.len(), "资源加载完成");
            self.status = PlayerStatus::Ready;
        }
    }

    /// 启动资源加载失败
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!(error = %message, "资源加载失败");
        self.status = PlayerStatus::Failed(message);
    }

    /// 开始播放；只在 `Ready` 状态有效
    pub fn start(&mut self) -> bool {
        if self.status != PlayerStatus::Ready {
            return false;
        }
        self.transport.play();
        self.status = PlayerStatus::Started;
        self.playing = true;
        debug!("开始播放");
        true
    }

    /// 播放/暂停切换
    pub fn toggle_play(&mut self) {
        self.transport.play_pause();
        self.playing = self.transport.is_playing();
    }

    /// 回到开头：跳转到 0，重置所有 Cue，清空对象池
    pub fn reset_playback(&mut self) {
        self.transport.seek(0.0);
        self.track.reset();
        self.pool.clear();
        debug!("播放已重置");
    }

    /// 切换透明背景，返回需要持久化的新设置
    pub fn toggle_background(&mut self) -> UserSettings {
        self.transparent = !self.transparent;
        self.settings()
    }

    pub fn toggle_mute(&mut self) {
        let muted = self.transport.is_muted();
        self.transport.set_muted(!muted);
    }

    /// 处理按键；设置发生变化时返回新设置
    pub fn handle_key(&mut self, action: KeyAction) -> Option<UserSettings> {
        match action {
            KeyAction::StartOrToggle => match self.status {
                PlayerStatus::Ready => {
                    self.start();
                }
                PlayerStatus::Started => self.toggle_play(),
                PlayerStatus::Loading | PlayerStatus::Failed(_) => {}
            },
            KeyAction::Reset => self.reset_playback(),
            KeyAction::ToggleBackground => return Some(self.toggle_background()),
            KeyAction::ToggleMute => self.toggle_mute(),
            KeyAction::Swallow => {}
        }
        None
    }

    /// 窗口尺寸变化
    ///
    /// 非固定画布跟随窗口尺寸；字号和测量缓存总是刷新。
    pub fn resize(&mut self, width: f32, height: f32) {
        if !self.config.canvas.fixed {
            self.viewport = Viewport::new(width, height);
        }
        self.font_size = self.config.font_size(self.viewport.width);
        self.track.invalidate_layout();
    }

    /// 推进一帧
    ///
    /// `now_ms` 为墙钟时间，驱动视觉对象的生命周期；
    /// 播放位置从 [`Transport`] 读取，驱动 Cue。
    pub fn tick(&mut self, now_ms: f64) -> Frame {
        let (overlay, position_ms) = match self.status.clone() {
            PlayerStatus::Failed(message) => (Overlay::Error(message), None),
            PlayerStatus::Loading => (Overlay::Loading, None),
            PlayerStatus::Ready => (Overlay::StartHint, None),
            PlayerStatus::Started => {
                let position = self.transport.position_ms();
                self.playing = self.transport.is_playing();
                self.update_cues(position, now_ms);
                (Overlay::Status(self.status_line(position)), Some(position))
            }
        };

        let mut ctx = UpdateContext::new(now_ms, self.viewport, &mut self.rng);
        let commands = self.pool.tick(&mut ctx);

        Frame {
            background: self.background(),
            commands,
            overlay,
            position_ms,
        }
    }

    fn update_cues(&mut self, position: f64, now_ms: f64) {
        let ctx = LayoutContext {
            measurer: &self.measurer,
            font_size: self.font_size,
            viewport: self.viewport,
        };
        for plan in self.track.update(position, &ctx) {
            let text = self.template.instantiate(plan, now_ms, &mut self.rng);
            self.pool.spawn(Box::new(text));
        }
    }

    fn status_line(&self, position: f64) -> String {
        let block = self
            .track
            .current_block_id()
            .map_or_else(|| "-".to_string(), |id| format!("#{}", id));
        let state = if self.playing { "Playing" } else { "Paused" };
        let muted = if self.transport.is_muted() {
            " (Muted)"
        } else {
            ""
        };
        format!(
            "Time: {} | Block: {} | Status: {}{}",
            format_timecode(position),
            block,
            state,
            muted
        )
    }

    fn background(&self) -> Background {
        match (&self.config.style.background_color, self.transparent) {
            (Some(color), false) => Background::Color(color.clone()),
            _ => Background::Transparent,
        }
    }

    pub fn settings(&self) -> UserSettings {
        UserSettings {
            transparent_background: self.transparent,
        }
    }

    pub fn status(&self) -> &PlayerStatus {
        &self.status
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn track(&self) -> &CueTrack {
        &self.track
    }

    pub fn pool(&self) -> &ObjectPool {
        &self.pool
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cue::layout::tests::FixedMeasurer;
    use crate::cue::parser::CueRecord;
    use crate::error::LyricError;
    use crate::strategy::{CueStrategy, Granularity};

    #[derive(Debug, Default)]
    struct FakeTransport {
        position: f64,
        playing: bool,
        muted: bool,
        seeks: Vec<f64>,
    }

    impl Transport for FakeTransport {
        fn position_ms(&self) -> f64 {
            self.position
        }

        fn is_playing(&self) -> bool {
            self.playing
        }

        fn play(&mut self) {
            self.playing = true;
        }

        fn play_pause(&mut self) {
            self.playing = !self.playing;
        }

        fn seek(&mut self, position_ms: f64) {
            self.position = position_ms;
            self.seeks.push(position_ms);
        }

        fn is_muted(&self) -> bool {
            self.muted
        }

        fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
        }
    }

    fn track() -> CueTrack {
        let records = vec![
            CueRecord {
                id: "1".to_string(),
                start_ms: 1000,
                end_ms: 2000,
                text: "hello".to_string(),
            },
            CueRecord {
                id: "2".to_string(),
                start_ms: 3000,
                end_ms: 4000,
                text: "world".to_string(),
            },
        ];
        CueTrack::build(records, CueStrategy::new(Granularity::Line), 200.0)
    }

    fn player(config: PlayerConfig) -> LyricPlayer<FakeTransport, FixedMeasurer> {
        LyricPlayer::new(
            config,
            track(),
            FakeTransport::default(),
            FixedMeasurer::new(),
            UserSettings::default(),
        )
        .unwrap()
        .with_seed(0)
    }

    #[test]
    fn test_overlay_follows_status() {
        let mut p = player(PlayerConfig::default());
        assert_eq!(p.tick(0.0).overlay, Overlay::Loading);

        // 加载中按 S 无效
        p.handle_key(KeyAction::StartOrToggle);
        assert_eq!(p.status(), &PlayerStatus::Loading);

        p.mark_ready();
        assert_eq!(p.tick(16.0).overlay, Overlay::StartHint);

        p.handle_key(KeyAction::StartOrToggle);
        assert_eq!(p.status(), &PlayerStatus::Started);
        assert!(p.transport().is_playing());
    }

    #[test]
    fn test_failed_status_is_sticky() {
        let mut p = player(PlayerConfig::default());
        p.fail("Failed to load font: fonts/x.ttf");
        p.mark_ready();
        assert!(!p.start());

        p.transport_mut().position = 1500.0;
        let frame = p.tick(0.0);
        assert_eq!(
            frame.overlay.to_string(),
            "Error: Failed to load font: fonts/x.ttf"
        );
        assert!(frame.commands.is_empty());
        assert!(p.pool().is_empty());
    }

    #[test]
    fn test_status_line() {
        let mut p = player(PlayerConfig::default());
        p.mark_ready();
        p.start();

        p.transport_mut().position = 500.0;
        assert_eq!(
            p.tick(0.0).overlay.to_string(),
            "Time: 00:00:00,500 | Block: - | Status: Playing"
        );

        p.transport_mut().position = 1500.0;
        p.handle_key(KeyAction::ToggleMute);
        p.handle_key(KeyAction::StartOrToggle);
        let frame = p.tick(16.0);
        assert_eq!(
            frame.overlay.to_string(),
            "Time: 00:00:01,500 | Block: #1 | Status: Paused (Muted)"
        );
        assert_eq!(frame.position_ms, Some(1500.0));
    }

    #[test]
    fn test_cue_spawns_text_object() {
        let mut p = player(PlayerConfig::default());
        p.mark_ready();
        p.start();
        p.transport_mut().position = 1000.0;

        let frame = p.tick(0.0);
        assert_eq!(frame.commands.len(), 1);
        assert!(frame.commands[0].enabled);
        assert_eq!(p.pool().len(), 1);

        // 同一 Cue 不会重复生成
        p.transport_mut().position = 1100.0;
        assert_eq!(p.tick(100.0).commands.len(), 1);
        assert_eq!(p.pool().len(), 1);
    }

    #[test]
    fn test_pool_keeps_ticking_after_failure() {
        let mut p = player(PlayerConfig::default());
        p.mark_ready();
        p.start();
        p.transport_mut().position = 1000.0;
        p.tick(0.0);
        assert_eq!(p.pool().len(), 1);

        // 生命周期按墙钟计算：block = 1200ms 后消亡
        p.fail("audio device lost");
        assert!(p.tick(1200.0).commands.is_empty());
        assert!(p.pool().is_empty());
    }

    #[test]
    fn test_reset_playback_is_atomic() {
        let mut p = player(PlayerConfig::default());
        p.mark_ready();
        p.start();
        p.transport_mut().position = 1000.0;
        p.tick(0.0);

        p.handle_key(KeyAction::Reset);
        assert!(p.pool().is_empty());
        assert_eq!(p.transport().seeks, vec![0.0]);
        assert!(p.track().iter().all(|c| c.processed_units().is_empty()));

        // 再次到达同一位置会重新生成
        p.transport_mut().position = 1000.0;
        assert_eq!(p.tick(50.0).commands.len(), 1);
    }

    #[test]
    fn test_toggle_background() {
        let mut p = player(PlayerConfig::default());
        assert_eq!(
            p.tick(0.0).background,
            Background::Color(Color::hex("#00FF00"))
        );

        let settings = p.handle_key(KeyAction::ToggleBackground);
        assert_eq!(
            settings,
            Some(UserSettings {
                transparent_background: true
            })
        );
        assert_eq!(p.tick(0.0).background, Background::Transparent);

        let mut config = PlayerConfig::default();
        config.style.background_color = None;
        let mut p = player(config);
        assert_eq!(p.tick(0.0).background, Background::Transparent);
    }

    #[test]
    fn test_injected_settings() {
        let p = LyricPlayer::new(
            PlayerConfig::default(),
            track(),
            FakeTransport::default(),
            FixedMeasurer::new(),
            UserSettings {
                transparent_background: true,
            },
        )
        .unwrap();
        assert!(p.settings().transparent_background);
    }

    #[test]
    fn test_resize() {
        let mut p = player(PlayerConfig::default());
        p.resize(600.0, 400.0);
        // 固定画布：尺寸不变
        assert_eq!(p.viewport(), Viewport::new(1920.0, 1080.0));
        assert_eq!(p.font_size(), 80.0);

        let mut config = PlayerConfig::default();
        config.canvas.fixed = false;
        let mut p = player(config);
        p.resize(600.0, 400.0);
        assert_eq!(p.viewport(), Viewport::new(600.0, 400.0));
        assert_eq!(p.font_size(), 40.0);
    }

    #[test]
    fn test_resize_invalidates_layouts() {
        let mut p = player(PlayerConfig::default());
        p.mark_ready();
        p.start();
        p.transport_mut().position = 1000.0;
        p.tick(0.0);
        assert!(p.track().get(0).is_some_and(|c| c.layout().is_some()));

        p.resize(800.0, 600.0);
        assert!(p.track().iter().all(|c| c.layout().is_none()));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = PlayerConfig::default();
        config.style.font_size_max = 10.0;
        let result = LyricPlayer::new(
            config,
            track(),
            FakeTransport::default(),
            FixedMeasurer::new(),
            UserSettings::default(),
        );
        assert!(matches!(result, Err(LyricError::Config(_))));
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(KeyAction::from_key('S'), Some(KeyAction::StartOrToggle));
        assert_eq!(KeyAction::from_key('r'), Some(KeyAction::Reset));
        assert_eq!(KeyAction::from_key('B'), Some(KeyAction::ToggleBackground));
        assert_eq!(KeyAction::from_key('m'), Some(KeyAction::ToggleMute));
        assert_eq!(KeyAction::from_key(' '), Some(KeyAction::Swallow));
        assert_eq!(KeyAction::from_key('x'), None);
    }
}
