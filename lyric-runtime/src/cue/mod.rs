//! # Cue 模块
//!
//! 歌词条目（Cue）的数据模型、解析与排序链接。
//!
//! ## 模块结构
//!
//! - [`parser`]：SRT 记录提取
//! - [`track`]：排序、链接，逐帧驱动所有 Cue
//! - [`layout`]：文本测量边界与测量缓存

pub mod layout;
pub mod parser;
pub mod track;

use std::collections::BTreeSet;

use tracing::debug;

use crate::render::Viewport;
use crate::strategy::{CueStrategy, UnitKind};
use crate::timecode::format_timecode;

use layout::{CueLayout, TextMeasurer};
use parser::CueRecord;

pub use track::CueTrack;

/// 默认预热时间（毫秒）
pub const DEFAULT_WARMUP_MS: f64 = 200.0;

/// Cue 的时间窗口 `[start_ms, end_ms)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CueWindow {
    pub start_ms: f64,
    pub end_ms: f64,
}

impl CueWindow {
    /// `time` 是否落在窗口内
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start_ms && time < self.end_ms
    }
}

/// 每帧布局所需的外部上下文
#[derive(Clone, Copy)]
pub struct LayoutContext<'a> {
    /// 测量协作者
    pub measurer: &'a dyn TextMeasurer,
    /// 当前字号
    pub font_size: f32,
    /// 画布尺寸
    pub viewport: Viewport,
}

/// 歌词条目
///
/// 解析时创建一次，整个会话内不销毁；每帧由 [`Cue::update`] 推进，
/// [`Cue::reset`] 在时间轴回卷时重新允许生成。
#[derive(Debug, Clone)]
pub struct Cue {
    /// 记录编号
    pub id: String,
    /// 开始时间（毫秒）
    pub start_ms: u64,
    /// 结束时间（毫秒），不早于 `start_ms`
    pub end_ms: u64,
    /// 文本
    pub text: String,
    /// 预热时间（毫秒）
    pub warmup_ms: f64,
    pub(crate) prev: Option<usize>,
    pub(crate) next: Option<usize>,
    was_visible: bool,
    progress: f64,
    processed: BTreeSet<usize>,
    current_unit: Option<usize>,
    units: Vec<String>,
    layout: Option<CueLayout>,
}

impl Cue {
    /// 由记录创建，按单元类型预先切分文本
    pub fn new(record: CueRecord, unit_kind: UnitKind, warmup_ms: f64) -> Self {
        let units = unit_kind.split(&record.text);
        Self {
            id: record.id,
            start_ms: record.start_ms,
            end_ms: record.end_ms,
            text: record.text,
            warmup_ms,
            prev: None,
            next: None,
            was_visible: false,
            progress: 0.0,
            processed: BTreeSet::new(),
            current_unit: None,
            units,
            layout: None,
        }
    }

    /// 自身的时间窗口
    pub fn window(&self) -> CueWindow {
        CueWindow {
            start_ms: self.start_ms as f64,
            end_ms: self.end_ms as f64,
        }
    }

    /// 显示时长：`(end - start) + warmup`
    pub fn block_duration(&self) -> f64 {
        self.end_ms.saturating_sub(self.start_ms) as f64 + self.warmup_ms
    }

    /// 时间 `time` 处的进度；零长度 Cue 恒为 0
    pub fn progress_at(&self, time: f64) -> f64 {
        if self.end_ms <= self.start_ms {
            return 0.0;
        }
        (time - self.start_ms as f64) / (self.end_ms - self.start_ms) as f64
    }

    /// 默认可见性：`start - warmup <= time < end`
    pub fn is_visible_default(&self, time: f64) -> bool {
        time >= self.start_ms as f64 - self.warmup_ms && time < self.end_ms as f64
    }

    /// 逐帧推进：更新进度、当前单元，检测可见性变化并按需测量
    pub fn update(
        &mut self,
        time: f64,
        prev: Option<CueWindow>,
        strategy: &CueStrategy,
        ctx: &LayoutContext<'_>,
    ) {
        self.progress = self.progress_at(time);

        if !self.units.is_empty() {
            let n = self.units.len() as f64;
            let index = (self.progress * n).floor().clamp(-1.0, n - 1.0);
            self.current_unit = (index >= 0.0).then_some(index as usize);
        }

        let now_visible = strategy.is_visible(self, prev, time);

        match (self.was_visible, now_visible) {
            (true, false) => {
                debug!(
                    "[Text End] Time: {} | Hide: \"{}\"",
                    format_timecode(time),
                    self.text.replace('\n', " ")
                );
                self.was_visible = false;
            }
            (false, true) => {
                debug!(
                    "[Text Start] Time: {} | Show: \"{}\"",
                    format_timecode(time),
                    self.text.replace('\n', " ")
                );
                self.was_visible = true;
                self.ensure_layout(strategy, ctx);
            }
            (true, true) => self.ensure_layout(strategy, ctx),
            (false, false) => {}
        }
    }

    /// 测量缓存为空时测量一次
    fn ensure_layout(&mut self, strategy: &CueStrategy, ctx: &LayoutContext<'_>) {
        if self.layout.is_some() {
            return;
        }
        let layout = match strategy.granularity.unit_kind() {
            UnitKind::Line => CueLayout::measure_line(ctx.measurer, &self.text, ctx.font_size),
            UnitKind::Word => CueLayout::measure_words(
                ctx.measurer,
                &self.units,
                ctx.font_size,
                strategy.granularity.unit_spacing(),
            ),
            UnitKind::Char => CueLayout::measure_chars(
                ctx.measurer,
                &self.units,
                ctx.font_size,
                strategy.granularity.unit_spacing(),
            ),
        };
        self.layout = Some(layout);
    }

    /// 丢弃测量缓存（如窗口尺寸变化），下次可见时重新测量
    pub fn invalidate_layout(&mut self) {
        self.layout = None;
    }

    /// 重新允许生成：清空已处理单元并复位进度
    ///
    /// 幂等；不改变 id、时间和链接。
    pub fn reset(&mut self) {
        self.progress = 0.0;
        self.current_unit = None;
        self.processed.clear();
    }

    /// 标记单元已生成；已生成过时返回 `false`
    pub(crate) fn mark_processed(&mut self, unit: usize) -> bool {
        self.processed.insert(unit)
    }

    pub fn is_processed(&self, unit: usize) -> bool {
        self.processed.contains(&unit)
    }

    pub fn processed_units(&self) -> &BTreeSet<usize> {
        &self.processed
    }

    pub fn was_visible(&self) -> bool {
        self.was_visible
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// 当前进行到的单元（仅单元策略）
    pub fn current_unit(&self) -> Option<usize> {
        self.current_unit
    }

    /// 切分后的单元
    pub fn units(&self) -> &[String] {
        &self.units
    }

    pub fn layout(&self) -> Option<&CueLayout> {
        self.layout.as_ref()
    }

    /// 前一条 Cue 的索引
    pub fn prev(&self) -> Option<usize> {
        self.prev
    }

    /// 后一条 Cue 的索引
    pub fn next(&self) -> Option<usize> {
        self.next
    }
}
