//! # Measure 模块
//!
//! 无字体环境下的估算测量器。
//!
//! 不做真实字形塑形：每个字符按字宽估算前进量，字形路径是每个字符的矩形框。
//! 足够驱动布局和锚点计算，并保持输出可复现。

use std::rc::Rc;

use lyric_runtime::{Bounds, MeasureError, MeasuredText, PathCommand, TextMeasurer};

/// 半角字符宽度（相对字号）
const NARROW_WIDTH: f32 = 0.5;
/// 全角字符宽度
const WIDE_WIDTH: f32 = 1.0;
/// 空白宽度
const SPACE_WIDTH: f32 = 0.3;
/// 行高（相对字号）
const LINE_HEIGHT: f32 = 1.2;
/// 字符框内缩，避免相邻框连成一片
const GLYPH_INSET: f32 = 0.05;

/// 按字符类别估算宽度的测量器
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimatingMeasurer;

impl EstimatingMeasurer {
    pub fn new() -> Self {
        Self
    }
}

fn char_width(c: char) -> f32 {
    if c.is_whitespace() {
        SPACE_WIDTH
    } else if c.is_ascii() {
        NARROW_WIDTH
    } else if is_wide(c) {
        WIDE_WIDTH
    } else {
        NARROW_WIDTH
    }
}

/// CJK、假名、全角符号等按全角处理
fn is_wide(c: char) -> bool {
    matches!(c as u32,
        0x1100..=0x115F
        | 0x2E80..=0x303E
        | 0x3041..=0x33FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xA000..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x1F300..=0x1F64F
        | 0x20000..=0x3FFFD)
}

fn check_shapeable(text: &str) -> Result<(), MeasureError> {
    match text.chars().find(|&c| c.is_control() && c != '\n') {
        Some(c) => Err(MeasureError::ShapingFailed {
            text: text.to_string(),
            message: format!("无法塑形的控制字符 U+{:04X}", c as u32),
        }),
        None => Ok(()),
    }
}

impl TextMeasurer for EstimatingMeasurer {
    fn measure(&self, text: &str, font_size: f32) -> Result<MeasuredText, MeasureError> {
        check_shapeable(text)?;

        let line_height = font_size * LINE_HEIGHT;
        let inset = font_size * GLYPH_INSET;
        let mut path = Vec::new();
        let mut width: f32 = 0.0;
        let mut lines = 0usize;

        for (row, line) in text.split('\n').enumerate() {
            lines += 1;
            // 基线在 y = 0，后续行向下排列
            let baseline = row as f32 * line_height;
            let top = baseline - font_size;
            let mut x = 0.0;

            for c in line.chars() {
                let advance = char_width(c) * font_size;
                if !c.is_whitespace() {
                    path.extend([
                        PathCommand::M { x: x + inset, y: top + inset },
                        PathCommand::L { x: x + advance - inset, y: top + inset },
                        PathCommand::L { x: x + advance - inset, y: baseline },
                        PathCommand::L { x: x + inset, y: baseline },
                        PathCommand::Z,
                    ]);
                }
                x += advance;
            }
            width = width.max(x);
        }

        let height = font_size + (lines.saturating_sub(1)) as f32 * line_height;
        Ok(MeasuredText {
            path: Rc::from(path),
            bounds: Bounds::new(0.0, -font_size, width, height),
        })
    }

    fn advance(&self, text: &str, font_size: f32) -> Result<f32, MeasureError> {
        check_shapeable(text)?;
        Ok(text
            .split('\n')
            .map(|line| line.chars().map(char_width).sum::<f32>() * font_size)
            .fold(0.0, f32::max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_and_wide_widths() {
        let m = EstimatingMeasurer::new();
        assert_eq!(m.advance("ab", 40.0).unwrap(), 40.0);
        assert_eq!(m.advance("歌词", 40.0).unwrap(), 80.0);
        assert!((m.advance("a b", 40.0).unwrap() - 52.0).abs() < 1e-3);
    }

    #[test]
    fn test_single_line_bounds() {
        let m = EstimatingMeasurer::new();
        let measured = m.measure("hey", 20.0).unwrap();
        assert_eq!(measured.bounds, Bounds::new(0.0, -20.0, 30.0, 20.0));
        // 每个可见字符一个闭合矩形
        assert_eq!(measured.path.len(), 15);
    }

    #[test]
    fn test_multi_line_bounds() {
        let m = EstimatingMeasurer::new();
        let measured = m.measure("ab\n歌词歌", 10.0).unwrap();
        assert_eq!(measured.bounds.w, 30.0);
        assert!((measured.bounds.h - 22.0).abs() < 1e-3);
        assert_eq!(m.advance("ab\n歌词歌", 10.0).unwrap(), 30.0);
    }

    #[test]
    fn test_whitespace_has_no_glyph() {
        let m = EstimatingMeasurer::new();
        let measured = m.measure("   ", 10.0).unwrap();
        assert!(measured.path.is_empty());
        assert!(measured.bounds.w > 0.0);
    }

    #[test]
    fn test_control_char_fails() {
        let m = EstimatingMeasurer::new();
        assert!(matches!(
            m.measure("bad\u{7}", 10.0),
            Err(MeasureError::ShapingFailed { .. })
        ));
        assert!(m.advance("tab\there", 10.0).is_err());
    }
}
