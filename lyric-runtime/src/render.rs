//! # Render 模块
//!
//! 核心向渲染器输出的绘制描述。
//!
//! 核心从不发出绘制调用，也不修改共享的绘制状态：每个存活对象每帧
//! 产出一个 [`RenderCommand`]，由外部渲染器按顺序消费。

use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// 二维向量
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    /// 创建新的向量
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// 零向量
    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// 画布尺寸
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// 水平中心
    pub fn center_x(&self) -> f32 {
        self.width / 2.0
    }

    /// 是否在可视区域内（上方不做限制）
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= 0.0 && point.x <= self.width && point.y <= self.height
    }
}

/// 文本包围盒（相对字形原点）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Bounds {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }
}

/// 字形路径指令
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PathCommand {
    /// 移动到（开始新轮廓）
    M { x: f32, y: f32 },
    /// 直线
    L { x: f32, y: f32 },
    /// 二次贝塞尔
    Q { x1: f32, y1: f32, x: f32, y: f32 },
    /// 三次贝塞尔
    C {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        x: f32,
        y: f32,
    },
    /// 闭合轮廓
    Z,
}

/// 一段文本的字形路径
///
/// 为空表示"无图形"（测量失败或该策略不需要整行路径）。
pub type GlyphPath = Rc<[PathCommand]>;

/// 空路径
pub fn empty_path() -> GlyphPath {
    Rc::from(Vec::new())
}

/// 颜色描述
///
/// 渲染器负责解释：灰度值或 CSS 风格的十六进制字符串。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Color {
    /// 灰度 (0-255)
    Gray(u8),
    /// 十六进制，如 `#ff00ff`
    Hex(String),
}

impl Color {
    pub fn hex(value: impl Into<String>) -> Self {
        Self::Hex(value.into())
    }
}

/// 填充/描边样式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paint {
    /// 填充色（None 表示不填充）
    pub fill: Option<Color>,
    /// 描边色（None 表示不描边）
    pub stroke: Option<Color>,
    /// 描边宽度
    pub stroke_weight: f32,
    /// 透明度 (0-255)
    pub alpha: f32,
}

/// 局部变换（以绘制原点为中心，按 shear → rotation → scale 顺序应用）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalTransform {
    /// 旋转角度（弧度）
    pub rotation: f32,
    /// 统一缩放
    pub scale: f32,
    /// Y 方向错切
    pub shear_y: f32,
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self {
            rotation: 0.0,
            scale: 1.0,
            shear_y: 0.0,
        }
    }
}

/// 绘制形状
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// 字形路径（歌词文本）
    Path {
        path: GlyphPath,
        bounds: Bounds,
    },
    /// 单个字符（以锚点为中心绘制，如粒子星星）
    Glyph { text: String, size: f32 },
}

/// 单个对象的单帧绘制描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderCommand {
    /// 锚点
    pub anchor: Vec2,
    /// 形状
    pub shape: Shape,
    /// 是否处于激活期
    pub enabled: bool,
    /// 渐入进度 (0-1)
    pub fade_in: f32,
    /// 渐出进度 (0-1)
    pub fade_out: f32,
    /// 未激活时的显示偏移提示（由渲染器解释）
    pub pre_active_offset: Option<Vec2>,
    /// 颜色与透明度
    pub paint: Paint,
    /// 局部变换
    pub transform: LocalTransform,
}

impl RenderCommand {
    /// 路径绘制原点
    ///
    /// 水平方向让包围盒左边对齐锚点，垂直方向让包围盒中心对齐锚点；
    /// 未激活且带偏移提示时再叠加偏移。
    pub fn origin(&self) -> Vec2 {
        let base = match &self.shape {
            Shape::Path { bounds, .. } => Vec2::new(
                self.anchor.x - bounds.x,
                self.anchor.y - (bounds.h / 2.0 + bounds.y),
            ),
            Shape::Glyph { .. } => self.anchor,
        };
        match self.pre_active_offset {
            Some(offset) if !self.enabled => base + offset,
            _ => base,
        }
    }
}
