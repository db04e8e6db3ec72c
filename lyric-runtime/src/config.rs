//! # Config 模块
//!
//! 播放器配置。所有字段都有默认值，配置文件只需写出要覆盖的部分。
//!
//! ```json
//! {
//!   "canvas": { "width": 1280, "height": 720, "fixed": false },
//!   "style": { "background_color": null },
//!   "lyrics": { "granularity": "current_chars", "effect": "city_pop_star" }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::cue::DEFAULT_WARMUP_MS;
use crate::error::ConfigError;
use crate::render::{Color, Viewport};
use crate::strategy::{CueStrategy, Granularity, TimingProfile};
use crate::visual::{AlphaMode, TextEffect, TextStyle, TextTemplate};

/// 播放器配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// 画布配置
    #[serde(default)]
    pub canvas: CanvasConfig,

    /// 样式配置
    #[serde(default)]
    pub style: StyleConfig,

    /// 歌曲资源
    #[serde(default)]
    pub song: SongConfig,

    /// 歌词动画配置
    #[serde(default)]
    pub lyrics: LyricsConfig,
}

/// 画布配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasConfig {
    #[serde(default = "default_canvas_width")]
    pub width: f32,

    #[serde(default = "default_canvas_height")]
    pub height: f32,

    /// 固定尺寸：窗口缩放时画布大小不变
    #[serde(default = "default_true")]
    pub fixed: bool,
}

/// 样式配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleConfig {
    /// 背景色；`null` 表示透明
    #[serde(default = "default_background_color")]
    pub background_color: Option<Color>,

    /// 文字填充色；`null` 表示不填充
    #[serde(default = "default_text_fill_color")]
    pub text_fill_color: Option<Color>,

    /// 文字描边色；`null` 表示不描边
    #[serde(default = "default_text_stroke_color")]
    pub text_stroke_color: Option<Color>,

    #[serde(default = "default_text_stroke_weight")]
    pub text_stroke_weight: f32,

    /// 未激活时的透明度 (0-255)
    #[serde(default = "default_text_alpha_disabled")]
    pub text_alpha_disabled: f32,

    /// 激活时的透明度 (0-255)
    #[serde(default = "default_text_alpha_enabled")]
    pub text_alpha_enabled: f32,

    /// 字体文件
    #[serde(default = "default_font_filename")]
    pub font_filename: String,

    /// 字号 = 画布宽度 / ratio
    #[serde(default = "default_font_size_ratio")]
    pub font_size_ratio: f32,

    #[serde(default = "default_font_size_min")]
    pub font_size_min: f32,

    #[serde(default = "default_font_size_max")]
    pub font_size_max: f32,
}

/// 歌曲资源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongConfig {
    #[serde(default = "default_audio_filename")]
    pub audio_filename: String,

    #[serde(default = "default_lyric_filename")]
    pub lyric_filename: String,
}

/// 歌词动画配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricsConfig {
    /// 生成粒度
    #[serde(default)]
    pub granularity: Granularity,

    /// 文字特效
    #[serde(default)]
    pub effect: TextEffect,

    /// 覆盖特效默认的透明度计算方式
    #[serde(default)]
    pub alpha_mode: Option<AlphaMode>,

    /// 覆盖策略默认的时间修正
    #[serde(default)]
    pub timing: Option<TimingProfile>,

    /// 预热时间（毫秒）
    #[serde(default = "default_warmup_ms")]
    pub warmup_ms: f64,
}

fn default_true() -> bool {
    true
}

fn default_canvas_width() -> f32 {
    1920.0
}

fn default_canvas_height() -> f32 {
    1080.0
}

fn default_background_color() -> Option<Color> {
    Some(Color::hex("#00FF00"))
}

fn default_text_fill_color() -> Option<Color> {
    Some(Color::Gray(255))
}

fn default_text_stroke_color() -> Option<Color> {
    Some(Color::Gray(0))
}

fn default_text_stroke_weight() -> f32 {
    2.0
}

fn default_text_alpha_disabled() -> f32 {
    100.0
}

fn default_text_alpha_enabled() -> f32 {
    255.0
}

fn default_font_filename() -> String {
    "fonts/BIZUDPGothic-Regular.ttf".to_string()
}

fn default_font_size_ratio() -> f32 {
    15.0
}

fn default_font_size_min() -> f32 {
    30.0
}

fn default_font_size_max() -> f32 {
    80.0
}

fn default_audio_filename() -> String {
    "data/sample_song.mp3".to_string()
}

fn default_lyric_filename() -> String {
    "data/sample_song.srt".to_string()
}

fn default_warmup_ms() -> f64 {
    DEFAULT_WARMUP_MS
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: default_canvas_width(),
            height: default_canvas_height(),
            fixed: true,
        }
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            background_color: default_background_color(),
            text_fill_color: default_text_fill_color(),
            text_stroke_color: default_text_stroke_color(),
            text_stroke_weight: default_text_stroke_weight(),
            text_alpha_disabled: default_text_alpha_disabled(),
            text_alpha_enabled: default_text_alpha_enabled(),
            font_filename: default_font_filename(),
            font_size_ratio: default_font_size_ratio(),
            font_size_min: default_font_size_min(),
            font_size_max: default_font_size_max(),
        }
    }
}

impl Default for SongConfig {
    fn default() -> Self {
        Self {
            audio_filename: default_audio_filename(),
            lyric_filename: default_lyric_filename(),
        }
    }
}

impl Default for LyricsConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::default(),
            effect: TextEffect::default(),
            alpha_mode: None,
            timing: None,
            warmup_ms: default_warmup_ms(),
        }
    }
}

impl PlayerConfig {
    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        let canvas = &self.canvas;
        if !(canvas.width > 0.0 && canvas.height > 0.0) {
            return Err(ConfigError::invalid(
                "canvas",
                format!("画布尺寸必须为正数，当前 {}x{}", canvas.width, canvas.height),
            ));
        }

        let style = &self.style;
        for (field, alpha) in [
            ("style.text_alpha_enabled", style.text_alpha_enabled),
            ("style.text_alpha_disabled", style.text_alpha_disabled),
        ] {
            if !(0.0..=255.0).contains(&alpha) {
                return Err(ConfigError::invalid(field, "透明度必须在 0 - 255 之间"));
            }
        }

        if style.text_stroke_weight < 0.0 {
            return Err(ConfigError::invalid(
                "style.text_stroke_weight",
                "描边宽度不能为负数",
            ));
        }

        if !(style.font_size_ratio > 0.0) {
            return Err(ConfigError::invalid(
                "style.font_size_ratio",
                "字号比例必须为正数",
            ));
        }

        if style.font_size_min <= 0.0 || style.font_size_min > style.font_size_max {
            return Err(ConfigError::invalid(
                "style.font_size_min",
                format!(
                    "字号范围无效：{} - {}",
                    style.font_size_min, style.font_size_max
                ),
            ));
        }

        if self.lyrics.warmup_ms < 0.0 {
            return Err(ConfigError::invalid(
                "lyrics.warmup_ms",
                "预热时间不能为负数",
            ));
        }

        Ok(())
    }

    /// 画布尺寸
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.canvas.width, self.canvas.height)
    }

    /// 按画布宽度计算字号，限制在 `[min, max]`
    pub fn font_size(&self, width: f32) -> f32 {
        let style = &self.style;
        (width / style.font_size_ratio).clamp(style.font_size_min, style.font_size_max)
    }

    /// 歌词策略（含时间修正覆盖）
    pub fn strategy(&self) -> CueStrategy {
        let strategy = CueStrategy::new(self.lyrics.granularity);
        match self.lyrics.timing {
            Some(profile) => strategy.with_profile(profile),
            None => strategy,
        }
    }

    /// 文字基础样式
    pub fn text_style(&self) -> TextStyle {
        TextStyle {
            fill: self.style.text_fill_color.clone(),
            stroke: self.style.text_stroke_color.clone(),
            stroke_weight: self.style.text_stroke_weight,
            alpha_enabled: self.style.text_alpha_enabled,
            alpha_disabled: self.style.text_alpha_disabled,
        }
    }

    /// 文字对象模板
    pub fn text_template(&self) -> TextTemplate {
        let template = TextTemplate::new(self.lyrics.effect, self.text_style());
        match self.lyrics.alpha_mode {
            Some(mode) => template.with_alpha_mode(mode),
            None => template,
        }
    }
}
