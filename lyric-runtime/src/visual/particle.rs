//! # Particle 模块
//!
//! 星星粒子：向右上方抛出，受重力下落并自转，离开画布即消亡。

use rand::Rng;
use rand::rngs::StdRng;

use crate::lifecycle::{LifeTiming, Lifecycle};
use crate::render::{Color, LocalTransform, Paint, RenderCommand, Shape, Vec2};

use super::{UpdateContext, Visual};

/// 粒子寿命（毫秒）
pub const SPARKLE_LIFETIME_MS: f64 = 2000.0;

const SPARKLE_GLYPH: &str = "★";
const SPARKLE_SIZE: f32 = 60.0;
const SPARKLE_STROKE_WEIGHT: f32 = 8.0;
const GRAVITY: f32 = 0.98;

/// 星星粒子
#[derive(Debug, Clone)]
pub struct Sparkle {
    life: Lifecycle,
    position: Vec2,
    velocity: Vec2,
    spin: f32,
    rotation: f32,
    fill: Option<Color>,
    stroke: Option<Color>,
}

impl Sparkle {
    /// 在 `position` 生成，速度与自转速度随机
    pub fn new(
        position: Vec2,
        fill: Option<Color>,
        stroke: Option<Color>,
        now_ms: f64,
        rng: &mut StdRng,
    ) -> Self {
        Self {
            life: Lifecycle::new(LifeTiming::new(SPARKLE_LIFETIME_MS, 0.0, 0.0), now_ms),
            position,
            velocity: Vec2::new(rng.random_range(2.0..10.0), rng.random_range(-30.0..-15.0)),
            spin: rng.random_range(0.1..0.4),
            rotation: 0.0,
            fill,
            stroke,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }
}

impl Visual for Sparkle {
    fn lifecycle(&self) -> &Lifecycle {
        &self.life
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        if self.life.is_dead() {
            return;
        }
        self.life.update(ctx.now_ms);

        self.velocity.y += GRAVITY;
        self.position = self.position + self.velocity;
        self.rotation += self.spin;

        if !ctx.viewport.contains(self.position) {
            self.life.die();
        }
    }

    fn render(&self) -> Option<RenderCommand> {
        if self.life.is_dead() {
            return None;
        }
        Some(RenderCommand {
            anchor: self.position,
            shape: Shape::Glyph {
                text: SPARKLE_GLYPH.to_string(),
                size: SPARKLE_SIZE,
            },
            enabled: self.life.is_enabled(),
            fade_in: self.life.fade_in(),
            fade_out: self.life.fade_out(),
            pre_active_offset: None,
            paint: Paint {
                fill: self.fill.clone(),
                stroke: self.stroke.clone(),
                stroke_weight: SPARKLE_STROKE_WEIGHT,
                alpha: 255.0,
            },
            transform: LocalTransform {
                rotation: self.rotation,
                ..LocalTransform::default()
            },
        })
    }
}
