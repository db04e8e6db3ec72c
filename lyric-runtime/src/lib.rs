//! # Lyric Runtime
//!
//! 歌词动画播放器的核心运行时库。
//!
//! ## 架构概述
//!
//! `lyric-runtime` 是纯逻辑核心，不做 IO、不绘制、不播放音频。
//! 宿主层（Host）提供播放位置和文字测量，核心输出每帧的绘制描述：
//!
//! ```text
//! Host                                  Runtime
//!   │                                      │
//!   │── Transport（播放位置/播放控制）────►│
//!   │── TextMeasurer（字形/宽度）────────►│ tick(now_ms)
//!   │◄── Frame（背景 + RenderCommand + 提示）│
//!   │                                      │
//! ```
//!
//! ## 逐帧数据流
//!
//! ```text
//! 播放位置 → Cue::update → 可见性变化 → 生成计划（按策略）
//!         → TextObject 追加到对象池 → 对象更新 → 回收死亡对象 → RenderCommand
//! ```
//!
//! ## 模块结构
//!
//! - [`cue`]：SRT 解析、Cue 列表、测量缓存
//! - [`strategy`]：按粒度区分的可见性与生成计划
//! - [`lifecycle`]：视觉对象共享的限时状态机
//! - [`visual`]：文字对象、文字特效、粒子
//! - [`pool`]：对象池
//! - [`player`]：播放器状态机
//! - [`config`]：播放器配置
//! - [`render`]：绘制描述
//! - [`timecode`]：时间码
//! - [`diagnostic`]：解析诊断
//! - [`error`]：错误类型

pub mod config;
pub mod cue;
pub mod diagnostic;
pub mod error;
pub mod lifecycle;
pub mod player;
pub mod pool;
pub mod render;
pub mod strategy;
pub mod timecode;
pub mod visual;

// 重导出核心类型
pub use config::{CanvasConfig, LyricsConfig, PlayerConfig, SongConfig, StyleConfig};
pub use cue::layout::{CueLayout, MeasuredText, TextMeasurer, UnitLayout};
pub use cue::parser::{CueRecord, ParseOutcome, Parser};
pub use cue::{Cue, CueTrack, CueWindow, DEFAULT_WARMUP_MS, LayoutContext};
pub use diagnostic::{Diagnostic, DiagnosticLevel};
pub use error::{ConfigError, LyricError, LyricResult, MeasureError, ParseError};
pub use lifecycle::{LifeTiming, Lifecycle, Phase};
pub use player::{
    Background, Frame, KeyAction, LyricPlayer, Overlay, PlayerStatus, Transport, UserSettings,
};
pub use pool::ObjectPool;
pub use render::{
    Bounds, Color, GlyphPath, LocalTransform, Paint, PathCommand, RenderCommand, Shape, Vec2,
    Viewport,
};
pub use strategy::{CueStrategy, Granularity, SpawnPlan, TimingProfile, UnitKind};
pub use timecode::{format_timecode, parse_timecode};
pub use visual::{
    AlphaMode, Sparkle, TextEffect, TextObject, TextStyle, TextTemplate, UpdateContext, Visual,
};
