//! # Layout 模块
//!
//! 文本测量边界与每条歌词的测量缓存。
//!
//! 字形生成和宽度测量由外部协作者（[`TextMeasurer`]）完成，核心只消费结果。
//! 单元测量失败时该单元得到空图形，兄弟单元和整条歌词照常继续。

use tracing::warn;

use crate::error::MeasureError;
use crate::render::{Bounds, GlyphPath, empty_path};

/// 单段文本的测量结果
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredText {
    /// 字形路径（以 (0, 0) 为原点）
    pub path: GlyphPath,
    /// 包围盒
    pub bounds: Bounds,
}

impl MeasuredText {
    /// 空结果（无图形）
    pub fn empty() -> Self {
        Self {
            path: empty_path(),
            bounds: Bounds::default(),
        }
    }
}

/// 文本测量协作者
pub trait TextMeasurer {
    /// 生成文本的字形路径与包围盒
    fn measure(&self, text: &str, font_size: f32) -> Result<MeasuredText, MeasureError>;

    /// 文本的排版前进宽度
    fn advance(&self, text: &str, font_size: f32) -> Result<f32, MeasureError>;
}

/// 单元（词或字）的布局
#[derive(Debug, Clone, PartialEq)]
pub struct UnitLayout {
    /// 测量结果（失败时为空）
    pub glyphs: MeasuredText,
    /// 相对单元行左端的偏移
    pub offset_x: f32,
}

/// 一条歌词的测量缓存
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CueLayout {
    /// 整行测量结果
    pub line: Option<MeasuredText>,
    /// 单元布局
    pub units: Vec<UnitLayout>,
    /// 单元行总宽度（不含末尾间隔）
    pub units_width: f32,
}

impl CueLayout {
    /// 测量整行
    ///
    /// 失败时返回空图形。
    pub fn measure_line(measurer: &dyn TextMeasurer, text: &str, font_size: f32) -> Self {
        let line = measurer.measure(text, font_size).unwrap_or_else(|e| {
            warn!(text = %text.replace('\n', " "), error = %e, "整行测量失败");
            MeasuredText::empty()
        });
        Self {
            line: Some(line),
            ..Self::default()
        }
    }

    /// 测量按词切分的单元
    ///
    /// 每个词前进 `宽度(词) + 宽度(" ") + spacing`，总宽去掉末尾的间隔。
    pub fn measure_words(
        measurer: &dyn TextMeasurer,
        words: &[String],
        font_size: f32,
        spacing: f32,
    ) -> Self {
        let space = measurer.advance(" ", font_size).unwrap_or_else(|e| {
            warn!(error = %e, "空格宽度测量失败，按 0 处理");
            0.0
        });
        let gap = space + spacing;
        let (units, pen) = layout_units(measurer, words, font_size, gap);
        let units_width = if words.is_empty() { 0.0 } else { pen - gap };
        Self {
            line: None,
            units,
            units_width,
        }
    }

    /// 测量按字切分的单元
    ///
    /// 每个字前进 `宽度(字) + spacing`，总宽去掉末尾的 spacing。
    pub fn measure_chars(
        measurer: &dyn TextMeasurer,
        chars: &[String],
        font_size: f32,
        spacing: f32,
    ) -> Self {
        let (units, pen) = layout_units(measurer, chars, font_size, spacing);
        let units_width = if chars.is_empty() { 0.0 } else { pen - spacing };
        Self {
            line: None,
            units,
            units_width,
        }
    }

    /// 单元的测量结果与偏移
    pub fn unit(&self, index: usize) -> Option<&UnitLayout> {
        self.units.get(index)
    }
}

/// 依次排版单元，返回布局和最终笔位置
///
/// 失败的单元偏移为 0 且不推进笔位置。
fn layout_units(
    measurer: &dyn TextMeasurer,
    units: &[String],
    font_size: f32,
    gap: f32,
) -> (Vec<UnitLayout>, f32) {
    let mut pen = 0.0;
    let mut layouts = Vec::with_capacity(units.len());

    for unit in units {
        let measured = measurer
            .measure(unit, font_size)
            .and_then(|glyphs| Ok((glyphs, measurer.advance(unit, font_size)?)));
        match measured {
            Ok((glyphs, width)) => {
                layouts.push(UnitLayout {
                    glyphs,
                    offset_x: pen,
                });
                pen += width + gap;
            }
            Err(e) => {
                warn!(unit = %unit, error = %e, "单元测量失败");
                layouts.push(UnitLayout {
                    glyphs: MeasuredText::empty(),
                    offset_x: 0.0,
                });
            }
        }
    }

    (layouts, pen)
}
