//! # Visual 模块
//!
//! 对象池中的视觉对象：歌词文字与粒子。
//!
//! ## 核心概念
//!
//! - [`Visual`]：所有视觉对象的统一接口，持有一个 [`Lifecycle`]
//! - [`UpdateContext`]：单次更新的外部输入（墙钟、画布、随机数），
//!   对象可以通过它生成子对象（如粒子爆发）
//! - [`TextObject`]：由生成计划实例化的文字对象，外观由 [`TextEffect`] 决定
//! - [`Sparkle`]：文字渐出时迸发的星星粒子
//!
//! 特效只读取生命周期状态，从不修改它。

mod easing;
mod particle;
mod text;

pub use easing::{EasingFunction, lerp};
pub use particle::Sparkle;
pub use text::{AlphaMode, TextEffect, TextObject, TextStyle, TextTemplate};

use std::fmt::Debug;

use rand::rngs::StdRng;

use crate::lifecycle::Lifecycle;
use crate::render::{RenderCommand, Viewport};

/// 单次更新的上下文
pub struct UpdateContext<'a> {
    /// 当前墙钟时间（毫秒）
    pub now_ms: f64,
    /// 画布尺寸
    pub viewport: Viewport,
    /// 特效使用的随机源
    pub rng: &'a mut StdRng,
    spawned: Vec<Box<dyn Visual>>,
}

impl<'a> UpdateContext<'a> {
    pub fn new(now_ms: f64, viewport: Viewport, rng: &'a mut StdRng) -> Self {
        Self {
            now_ms,
            viewport,
            rng,
            spawned: Vec::new(),
        }
    }

    /// 生成子对象，由对象池在本帧追加
    pub fn spawn(&mut self, visual: Box<dyn Visual>) {
        self.spawned.push(visual);
    }

    /// 取出本次更新期间生成的对象
    pub(crate) fn take_spawned(&mut self) -> Vec<Box<dyn Visual>> {
        std::mem::take(&mut self.spawned)
    }
}

/// 视觉对象
pub trait Visual: Debug {
    /// 生命周期状态
    fn lifecycle(&self) -> &Lifecycle;

    /// 逐帧更新；死亡后调用无效果
    fn update(&mut self, ctx: &mut UpdateContext<'_>);

    /// 本帧的绘制描述；死亡或无图形时为 `None`
    fn render(&self) -> Option<RenderCommand>;

    fn is_dead(&self) -> bool {
        self.lifecycle().is_dead()
    }
}
