//! # Track 模块
//!
//! 一次会话的全部 Cue：连续存储，`prev`/`next` 以索引链接。

use tracing::warn;

use crate::diagnostic::Diagnostic;
use crate::strategy::{CueStrategy, SpawnPlan};

use super::parser::{CueRecord, Parser};
use super::{Cue, CueWindow, LayoutContext};

/// 排好序、链接好的 Cue 列表及其策略
#[derive(Debug, Clone, Default)]
pub struct CueTrack {
    cues: Vec<Cue>,
    strategy: CueStrategy,
}

impl CueTrack {
    /// 由已解析的记录构建
    ///
    /// 结束时间早于开始时间的记录被丢弃；其余按开始时间稳定排序
    /// （相同开始时间保持原顺序），按排序位置链接。
    pub fn build(records: Vec<CueRecord>, strategy: CueStrategy, warmup_ms: f64) -> Self {
        let mut records: Vec<CueRecord> = records
            .into_iter()
            .filter(|r| {
                let ok = r.end_ms >= r.start_ms;
                if !ok {
                    warn!(
                        id = %r.id,
                        start_ms = r.start_ms,
                        end_ms = r.end_ms,
                        "丢弃结束时间早于开始时间的记录"
                    );
                }
                ok
            })
            .collect();
        records.sort_by_key(|r| r.start_ms);

        let unit_kind = strategy.granularity.unit_kind();
        let mut cues: Vec<Cue> = records
            .into_iter()
            .map(|record| Cue::new(record, unit_kind, warmup_ms))
            .collect();

        let len = cues.len();
        for (i, cue) in cues.iter_mut().enumerate() {
            cue.prev = i.checked_sub(1);
            cue.next = (i + 1 < len).then_some(i + 1);
        }

        Self { cues, strategy }
    }

    /// 解析 SRT 文本并构建，返回被丢弃记录的诊断
    pub fn from_srt(text: &str, strategy: CueStrategy, warmup_ms: f64) -> (Self, Vec<Diagnostic>) {
        let outcome = Parser::new().parse(text);
        (
            Self::build(outcome.records, strategy, warmup_ms),
            outcome.diagnostics,
        )
    }

    /// 按播放位置推进所有 Cue，返回本帧的生成计划
    ///
    /// 计划按 Cue 顺序排列，同一 Cue 内按单元顺序排列。
    pub fn update(&mut self, time: f64, ctx: &LayoutContext<'_>) -> Vec<SpawnPlan> {
        let strategy = self.strategy;
        let mut plans = Vec::new();

        for i in 0..self.cues.len() {
            let prev = self.cues[i].prev.map(|p| self.cues[p].window());
            let cue = &mut self.cues[i];
            cue.update(time, prev, &strategy, ctx);
            plans.extend(strategy.plan_spawns(cue, prev, ctx));
        }

        plans
    }

    /// 重新允许所有 Cue 生成
    pub fn reset(&mut self) {
        self.cues.iter_mut().for_each(Cue::reset);
    }

    /// 丢弃所有测量缓存
    pub fn invalidate_layout(&mut self) {
        self.cues.iter_mut().for_each(Cue::invalidate_layout);
    }

    pub fn strategy(&self) -> &CueStrategy {
        &self.strategy
    }

    pub fn get(&self, index: usize) -> Option<&Cue> {
        self.cues.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cue> {
        self.cues.iter()
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// 最后一条处于可见状态的 Cue 的编号
    pub fn current_block_id(&self) -> Option<&str> {
        self.cues
            .iter()
            .rev()
            .find(|cue| cue.was_visible())
            .map(|cue| cue.id.as_str())
    }

    /// 上一条 Cue 的时间窗口
    pub fn prev_window(&self, index: usize) -> Option<CueWindow> {
        self.cues
            .get(index)
            .and_then(|cue| cue.prev)
            .map(|p| self.cues[p].window())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cue::layout::tests::FixedMeasurer;
    use crate::render::Viewport;
    use crate::strategy::Granularity;

    fn rec(id: &str, start_ms: u64, end_ms: u64) -> CueRecord {
        CueRecord {
            id: id.to_string(),
            start_ms,
            end_ms,
            text: format!("cue {}", id),
        }
    }

    fn line_track(records: Vec<CueRecord>) -> CueTrack {
        CueTrack::build(records, CueStrategy::new(Granularity::Line), 200.0)
    }

    #[test]
    fn test_build_sorts_stably() {
        let track = line_track(vec![
            rec("3", 5000, 6000),
            rec("1", 1000, 2000),
            rec("2a", 3000, 4000),
            rec("2b", 3000, 3500),
        ]);
        let ids: Vec<&str> = track.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2a", "2b", "3"]);

        for pair in track.iter().collect::<Vec<_>>().windows(2) {
            assert!(pair[0].start_ms <= pair[1].start_ms);
        }
    }

    #[test]
    fn test_links_are_symmetric() {
        let track = line_track(vec![rec("b", 2000, 3000), rec("a", 0, 1000), rec("c", 4000, 5000)]);

        assert_eq!(track.get(0).and_then(Cue::prev), None);
        assert_eq!(track.get(2).and_then(Cue::next), None);

        for (i, cue) in track.iter().enumerate() {
            if let Some(n) = cue.next() {
                assert_eq!(track.get(n).and_then(Cue::prev), Some(i));
            }
            if let Some(p) = cue.prev() {
                assert_eq!(track.get(p).and_then(Cue::next), Some(i));
            }
        }
    }

    #[test]
    fn test_build_drops_inverted_records() {
        let track = line_track(vec![rec("bad", 2000, 1000), rec("ok", 3000, 4000)]);
        assert_eq!(track.len(), 1);
        assert_eq!(track.get(0).map(|c| c.id.as_str()), Some("ok"));
        assert!(track.iter().all(|c| c.start_ms <= c.end_ms));
        assert_eq!(track.get(0).and_then(Cue::prev), None);
    }

    #[test]
    fn test_single_and_empty() {
        let track = line_track(vec![rec("1", 0, 1000)]);
        assert_eq!(track.len(), 1);
        assert_eq!(track.get(0).and_then(Cue::prev), None);
        assert_eq!(track.get(0).and_then(Cue::next), None);

        let empty = line_track(Vec::new());
        assert!(empty.is_empty());
    }

    #[test]
    fn test_from_srt_collects_diagnostics() {
        let srt = "2\n00:00:03,000 --> 00:00:04,000\nsecond\n\nx\nbad\ntext\n\n1\n00:00:01,000 --> 00:00:02,000\nfirst\n";
        let (track, diagnostics) =
            CueTrack::from_srt(srt, CueStrategy::new(Granularity::Line), 200.0);
        assert_eq!(track.len(), 2);
        assert_eq!(track.get(0).map(|c| c.text.as_str()), Some("first"));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].block_index, 1);
    }

    #[test]
    fn test_update_uses_previous_window_for_two_rows() {
        let m = FixedMeasurer::new();
        let ctx = LayoutContext {
            measurer: &m,
            font_size: 20.0,
            viewport: Viewport::new(1920.0, 1080.0),
        };
        let mut track = CueTrack::build(
            vec![rec("A", 1000, 3000), rec("B", 2500, 4000)],
            CueStrategy::new(Granularity::TwoRows),
            200.0,
        );

        // t = 1000：A 自身可见，B 借 A 的窗口可见
        let plans = track.update(1000.0, &ctx);
        assert_eq!(plans.len(), 2);
        assert!(track.get(1).is_some_and(Cue::was_visible));
        assert_eq!(
            track.prev_window(1),
            Some(CueWindow {
                start_ms: 1000.0,
                end_ms: 3000.0
            })
        );

        assert!(track.update(1100.0, &ctx).is_empty());
    }

    #[test]
    fn test_reset_rearms_every_cue() {
        let m = FixedMeasurer::new();
        let ctx = LayoutContext {
            measurer: &m,
            font_size: 20.0,
            viewport: Viewport::new(1920.0, 1080.0),
        };
        let mut track = line_track(vec![rec("1", 0, 1000), rec("2", 0, 2000)]);
        assert_eq!(track.update(100.0, &ctx).len(), 2);
        assert!(track.update(200.0, &ctx).is_empty());

        track.reset();
        track.reset();
        assert!(track.iter().all(|c| c.processed_units().is_empty()));
        assert_eq!(track.update(200.0, &ctx).len(), 2);
    }

    #[test]
    fn test_current_block_id() {
        let m = FixedMeasurer::new();
        let ctx = LayoutContext {
            measurer: &m,
            font_size: 20.0,
            viewport: Viewport::new(1920.0, 1080.0),
        };
        let mut track = line_track(vec![rec("1", 1000, 3000), rec("2", 2000, 4000)]);
        track.update(0.0, &ctx);
        assert_eq!(track.current_block_id(), None);
        track.update(900.0, &ctx);
        assert_eq!(track.current_block_id(), Some("1"));
        // 两条同时可见时取后一条
        track.update(2500.0, &ctx);
        assert_eq!(track.current_block_id(), Some("2"));
    }
}
