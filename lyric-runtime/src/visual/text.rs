//! # Text 模块
//!
//! 文字对象与文字特效。
//!
//! | 特效 | 透明度 | 运动 | 变换 |
//! |------|--------|------|------|
//! | `Simple` | 激活/未激活 | 无 | 无 |
//! | `Jitter` | 渐入渐出 | 每帧随机 ±10px | 随机旋转 ±10°、缩放 1–5，渐出时再放大到 3 倍 |
//! | `CityPop` | 渐入渐出 | 渐入时左移，渐出时上浮 | `shear_y = -0.2`，缩放 2 |
//! | `CityPopStar` | 同 `CityPop` | 同 `CityPop` | 渐出开始时迸发星星 |

use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::cue::layout::MeasuredText;
use crate::lifecycle::Lifecycle;
use crate::render::{Color, LocalTransform, Paint, RenderCommand, Shape, Vec2};
use crate::strategy::SpawnPlan;

use super::easing::{EasingFunction, lerp};
use super::particle::Sparkle;
use super::{UpdateContext, Visual};

const JITTER_MAX: f32 = 10.0;
const CITY_POP_STROKE_WEIGHT: f32 = 3.0;
const CITY_POP_SHEAR_Y: f32 = -0.2;
const CITY_POP_SCALE: f32 = 2.0;
const STAR_SPREAD: f32 = 20.0;

/// 霓虹配色（填充, 描边）
const CITY_POP_PALETTE: [(&str, &str); 12] = [
    ("#ffffff", "#ff00ff"),
    ("#00ffff", "#0000ff"),
    ("#ffff00", "#ff0055"),
    ("#ffcc00", "#ff6600"),
    ("#ff99cc", "#660066"),
    ("#ffffff", "#fb8500"),
    ("#ffffff", "#00b4d8"),
    ("#90e0ef", "#0077b6"),
    ("#ffea00", "#0096c7"),
    ("#fec5bb", "#84a59d"),
    ("#bde0fe", "#ffafcc"),
    ("#ffffff", "#a2d2ff"),
];

/// 文字特效
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextEffect {
    #[default]
    Simple,
    Jitter,
    CityPop,
    CityPopStar,
}

impl TextEffect {
    pub const ALL: [TextEffect; 4] = [
        TextEffect::Simple,
        TextEffect::Jitter,
        TextEffect::CityPop,
        TextEffect::CityPopStar,
    ];

    /// 配置名
    pub fn name(&self) -> &'static str {
        match self {
            TextEffect::Simple => "simple",
            TextEffect::Jitter => "jitter",
            TextEffect::CityPop => "city_pop",
            TextEffect::CityPopStar => "city_pop_star",
        }
    }

    /// 特效默认的透明度计算方式
    pub fn default_alpha_mode(&self) -> AlphaMode {
        match self {
            TextEffect::Simple => AlphaMode::EnabledDisabled,
            _ => AlphaMode::FadeInOut,
        }
    }

    fn is_city_pop(&self) -> bool {
        matches!(self, TextEffect::CityPop | TextEffect::CityPopStar)
    }
}

impl std::str::FromStr for TextEffect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TextEffect::ALL
            .into_iter()
            .find(|e| e.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<&str> = TextEffect::ALL.iter().map(|e| e.name()).collect();
                format!("未知特效 '{}'，可选：{}", s, names.join(", "))
            })
    }
}

/// 透明度计算方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlphaMode {
    /// 激活期用激活透明度，其余时间用未激活透明度
    EnabledDisabled,
    /// 恒为激活透明度
    OnOnly,
    /// 渐入时 `fade_in * max`，渐出时 `(1 - fade_out) * max`
    FadeInOut,
}

impl AlphaMode {
    pub fn alpha(&self, life: &Lifecycle, style: &TextStyle) -> f32 {
        match self {
            AlphaMode::EnabledDisabled => {
                if life.is_enabled() {
                    style.alpha_enabled
                } else {
                    style.alpha_disabled
                }
            }
            AlphaMode::OnOnly => style.alpha_enabled,
            AlphaMode::FadeInOut => {
                let max = style.alpha_enabled;
                let mut alpha = 0.0;
                if life.fade_in() > 0.0 {
                    alpha = life.fade_in() * max;
                }
                if life.fade_out() > 0.0 {
                    alpha = (1.0 - life.fade_out()) * max;
                }
                alpha.clamp(0.0, 255.0)
            }
        }
    }
}

/// 文字的基础样式
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_weight: f32,
    pub alpha_enabled: f32,
    pub alpha_disabled: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            fill: Some(Color::Gray(255)),
            stroke: Some(Color::Gray(0)),
            stroke_weight: 2.0,
            alpha_enabled: 255.0,
            alpha_disabled: 100.0,
        }
    }
}

/// 由生成计划创建文字对象的模板
#[derive(Debug, Clone, PartialEq)]
pub struct TextTemplate {
    pub effect: TextEffect,
    pub alpha_mode: AlphaMode,
    pub style: TextStyle,
}

impl TextTemplate {
    /// 使用特效默认的透明度计算方式
    pub fn new(effect: TextEffect, style: TextStyle) -> Self {
        Self {
            effect,
            alpha_mode: effect.default_alpha_mode(),
            style,
        }
    }

    pub fn with_alpha_mode(mut self, alpha_mode: AlphaMode) -> Self {
        self.alpha_mode = alpha_mode;
        self
    }

    pub fn instantiate(&self, plan: SpawnPlan, now_ms: f64, rng: &mut StdRng) -> TextObject {
        TextObject::new(plan, self, now_ms, rng)
    }
}

/// 文字对象
#[derive(Debug, Clone)]
pub struct TextObject {
    life: Lifecycle,
    unit: usize,
    glyphs: MeasuredText,
    position: Vec2,
    pre_active_offset: Option<Vec2>,
    effect: TextEffect,
    alpha_mode: AlphaMode,
    style: TextStyle,
    transform: LocalTransform,
    stars_spawned: bool,
}

impl TextObject {
    pub fn new(plan: SpawnPlan, template: &TextTemplate, now_ms: f64, rng: &mut StdRng) -> Self {
        let mut style = template.style.clone();
        let mut transform = LocalTransform::default();

        if template.effect.is_city_pop() {
            let (fill, stroke) = CITY_POP_PALETTE[rng.random_range(0..CITY_POP_PALETTE.len())];
            style.fill = Some(Color::hex(fill));
            style.stroke = Some(Color::hex(stroke));
            style.stroke_weight = CITY_POP_STROKE_WEIGHT;
            transform.shear_y = CITY_POP_SHEAR_Y;
            transform.scale = CITY_POP_SCALE;
        }

        Self {
            life: Lifecycle::new(plan.timing, now_ms),
            unit: plan.unit,
            glyphs: plan.glyphs,
            position: plan.anchor,
            pre_active_offset: plan.pre_active_offset,
            effect: template.effect,
            alpha_mode: template.alpha_mode,
            style,
            transform,
            stars_spawned: false,
        }
    }

    /// 来源单元索引
    pub fn unit(&self) -> usize {
        self.unit
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn effect(&self) -> TextEffect {
        self.effect
    }

    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    pub fn stars_spawned(&self) -> bool {
        self.stars_spawned
    }

    fn update_jitter(&mut self, rng: &mut StdRng) {
        self.position.x += rng.random_range(-JITTER_MAX..JITTER_MAX);
        self.position.y += rng.random_range(-JITTER_MAX..JITTER_MAX);

        let wobble: f32 = rng.random_range(0.0..1.0);
        self.transform.rotation = lerp(-JITTER_MAX, JITTER_MAX, wobble).to_radians();
        self.transform.scale = lerp(1.0, 5.0, wobble);

        let fade_out = self.life.fade_out();
        if fade_out > 0.0 {
            self.transform.scale *= lerp(1.0, 3.0, EasingFunction::EaseInExpo.apply(fade_out));
        }
    }

    fn update_city_pop(&mut self, ctx: &UpdateContext<'_>) {
        if self.life.fade_in() < 1.0 {
            self.position.x -= 1.0;
        }
        let fade_out = self.life.fade_out();
        if fade_out > 0.0 {
            self.position.y -=
                EasingFunction::EaseInBack.apply(fade_out) * (ctx.viewport.height / 50.0);
        }
    }

    fn spawn_stars(&mut self, ctx: &mut UpdateContext<'_>) {
        if self.stars_spawned || self.life.fade_out() <= 0.0 {
            return;
        }
        let origin = Vec2::new(self.position.x + self.glyphs.bounds.w, self.position.y);
        let count = ctx.rng.random_range(3..10);

        for _ in 0..count {
            let offset = Vec2::new(
                ctx.rng.random_range(-STAR_SPREAD..STAR_SPREAD),
                ctx.rng.random_range(-STAR_SPREAD..STAR_SPREAD),
            );
            let star = Sparkle::new(
                origin + offset,
                self.style.fill.clone(),
                self.style.stroke.clone(),
                ctx.now_ms,
                ctx.rng,
            );
            ctx.spawn(Box::new(star));
        }
        self.stars_spawned = true;
    }
}

impl Visual for TextObject {
    fn lifecycle(&self) -> &Lifecycle {
        &self.life
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        if self.life.is_dead() {
            return;
        }
        self.life.update(ctx.now_ms);

        match self.effect {
            TextEffect::Simple => {}
            TextEffect::Jitter => self.update_jitter(ctx.rng),
            TextEffect::CityPop => self.update_city_pop(ctx),
            TextEffect::CityPopStar => {
                self.update_city_pop(ctx);
                self.spawn_stars(ctx);
            }
        }
    }

    fn render(&self) -> Option<RenderCommand> {
        if self.life.is_dead() || self.glyphs.path.is_empty() {
            return None;
        }
        Some(RenderCommand {
            anchor: self.position,
            shape: Shape::Path {
                path: self.glyphs.path.clone(),
                bounds: self.glyphs.bounds,
            },
            enabled: self.life.is_enabled(),
            fade_in: self.life.fade_in(),
            fade_out: self.life.fade_out(),
            pre_active_offset: self.pre_active_offset,
            paint: Paint {
                fill: self.style.fill.clone(),
                stroke: self.style.stroke.clone(),
                stroke_weight: self.style.stroke_weight,
                alpha: self.alpha_mode.alpha(&self.life, &self.style),
            },
            transform: self.transform,
        })
    }
}
