//! # Strategy 模块
//!
//! 按粒度区分的生成策略：同一套可见性/进度基础，不同的生成计算。
//!
//! | 策略 | 单元 | 生成时机 | 时间参数 |
//! |------|------|----------|----------|
//! | `Line` | 整行 | 首个可见帧 | `lifetime = term = block`, `duration = 0` |
//! | `TwoRows` | 整行 | 首个可见帧（可见窗口向前延伸到上一行） | 见 [`Granularity::TwoRows`] |
//! | `Words` / `Chars` | 词 / 字 | 首个可见帧，每个单元一次 | `duration = i * unit`, `term = unit` |
//! | `CurrentWords` / `CurrentChars` | 词 / 字 | 单元成为当前单元时 | `duration = 0`, `term = lifetime = unit` |
//!
//! 其中 `block = (end - start) + warmup`，`unit = block / N`。
//! 所有策略最后再叠加 [`TimingProfile`]。

use serde::{Deserialize, Serialize};

use crate::cue::layout::MeasuredText;
use crate::cue::{Cue, CueWindow, LayoutContext};
use crate::lifecycle::LifeTiming;
use crate::render::Vec2;

/// 首行（无上一行）时两行策略的提前量（毫秒）
pub const TWO_ROWS_FIRST_LEAD_MS: f64 = 2000.0;

/// 按词切分时词之间的额外间隔
pub const WORD_SPACING: f32 = 32.0;

/// 按字切分时字之间的额外间隔
pub const CHAR_SPACING: f32 = 24.0;

/// 单元类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// 整行
    Line,
    /// 词（按空白和逗号切分，丢弃空串）
    Word,
    /// 字（每个字符，包括空格和换行）
    Char,
}

impl UnitKind {
    /// 将文本切分为单元；整行类型返回空
    pub fn split(&self, text: &str) -> Vec<String> {
        match self {
            UnitKind::Line => Vec::new(),
            UnitKind::Word => text
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|w| !w.is_empty())
                .map(str::to_string)
                .collect(),
            UnitKind::Char => text.chars().map(String::from).collect(),
        }
    }
}

/// 生成粒度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// 整行一次生成
    #[default]
    Line,
    /// 两行续接：本行在上一行的时间窗口内已显示在第二行
    ///
    /// 以 `ref = prev.start`（首行为 `max(0, start - 2000)`）：
    /// `lifetime = end - ref`，`duration = max(0, start - ref)`，
    /// `term = (end - start) + warmup`。
    TwoRows,
    /// 按词错开激活
    Words,
    /// 按字错开激活
    Chars,
    /// 只生成当前词
    CurrentWords,
    /// 只生成当前字
    CurrentChars,
}

impl Granularity {
    /// 所有策略
    pub const ALL: [Granularity; 6] = [
        Granularity::Line,
        Granularity::TwoRows,
        Granularity::Words,
        Granularity::Chars,
        Granularity::CurrentWords,
        Granularity::CurrentChars,
    ];

    /// 配置名
    pub fn name(&self) -> &'static str {
        match self {
            Granularity::Line => "line",
            Granularity::TwoRows => "two_rows",
            Granularity::Words => "words",
            Granularity::Chars => "chars",
            Granularity::CurrentWords => "current_words",
            Granularity::CurrentChars => "current_chars",
        }
    }

    pub fn unit_kind(&self) -> UnitKind {
        match self {
            Granularity::Line | Granularity::TwoRows => UnitKind::Line,
            Granularity::Words | Granularity::CurrentWords => UnitKind::Word,
            Granularity::Chars | Granularity::CurrentChars => UnitKind::Char,
        }
    }

    /// 单元之间的额外间隔
    pub fn unit_spacing(&self) -> f32 {
        match self.unit_kind() {
            UnitKind::Line => 0.0,
            UnitKind::Word => WORD_SPACING,
            UnitKind::Char => CHAR_SPACING,
        }
    }

    /// 默认时间修正
    pub fn default_profile(&self) -> TimingProfile {
        match self {
            Granularity::CurrentWords => TimingProfile::new(100.0, 400.0),
            Granularity::CurrentChars => TimingProfile::new(200.0, 1200.0),
            _ => TimingProfile::default(),
        }
    }

    /// 行基线位置（占画布高度的比例）
    pub fn row_ratio(&self) -> f32 {
        match self {
            Granularity::TwoRows => 9.0 / 12.0,
            _ => 6.0 / 12.0,
        }
    }
}

impl std::str::FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Granularity::ALL
            .into_iter()
            .find(|g| g.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<&str> = Granularity::ALL.iter().map(|g| g.name()).collect();
                format!("未知策略 '{}'，可选：{}", s, names.join(", "))
            })
    }
}

/// 生成对象时叠加的时间修正（毫秒）
///
/// `active_duration += duration_lead`，`lifetime += lifetime_extend`。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimingProfile {
    #[serde(default)]
    pub duration_lead: f64,
    #[serde(default)]
    pub lifetime_extend: f64,
}

impl TimingProfile {
    pub fn new(duration_lead: f64, lifetime_extend: f64) -> Self {
        Self {
            duration_lead,
            lifetime_extend,
        }
    }

    /// 长寿命文字：当前字策略的加长版本
    pub fn long_lifetime_text() -> Self {
        Self::new(500.0, 1500.0)
    }

    fn apply(&self, timing: LifeTiming) -> LifeTiming {
        LifeTiming::new(
            timing.lifetime + self.lifetime_extend,
            timing.active_duration + self.duration_lead,
            timing.active_term,
        )
    }
}

/// 单个生成计划
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnPlan {
    /// 单元索引（整行为 0）
    pub unit: usize,
    /// 图形
    pub glyphs: MeasuredText,
    /// 锚点
    pub anchor: Vec2,
    /// 时间参数（已叠加修正）
    pub timing: LifeTiming,
    /// 未激活时的显示偏移提示
    pub pre_active_offset: Option<Vec2>,
}

/// 一条 Cue 列表使用的策略
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CueStrategy {
    pub granularity: Granularity,
    pub profile: TimingProfile,
}

impl CueStrategy {
    /// 使用策略默认的时间修正
    pub fn new(granularity: Granularity) -> Self {
        Self {
            granularity,
            profile: granularity.default_profile(),
        }
    }

    /// 覆盖时间修正
    pub fn with_profile(mut self, profile: TimingProfile) -> Self {
        self.profile = profile;
        self
    }

    /// 可见性判断
    ///
    /// 两行策略额外覆盖上一行自己的 `[start, end)`；首行以
    /// `[max(0, start - 2000), end)` 代替。
    pub fn is_visible(&self, cue: &Cue, prev: Option<CueWindow>, time: f64) -> bool {
        if self.granularity == Granularity::TwoRows {
            let lead_window = match prev {
                Some(prev) => prev,
                None => CueWindow {
                    start_ms: first_row_lead(cue),
                    end_ms: cue.end_ms as f64,
                },
            };
            if lead_window.contains(time) {
                return true;
            }
        }
        cue.is_visible_default(time)
    }

    /// 计算本帧要生成的对象，并把对应单元标记为已处理
    ///
    /// 只在 Cue 可见时生成；每个单元在两次 `reset` 之间最多生成一次。
    pub fn plan_spawns(
        &self,
        cue: &mut Cue,
        prev: Option<CueWindow>,
        ctx: &LayoutContext<'_>,
    ) -> Vec<SpawnPlan> {
        if !cue.was_visible() {
            return Vec::new();
        }

        let plans = match self.granularity {
            Granularity::Line => self.plan_line(cue, ctx),
            Granularity::TwoRows => self.plan_two_rows(cue, prev, ctx),
            Granularity::Words | Granularity::Chars => self.plan_staggered(cue, ctx),
            Granularity::CurrentWords | Granularity::CurrentChars => self.plan_current(cue, ctx),
        };

        plans
            .into_iter()
            .filter(|plan| cue.mark_processed(plan.unit))
            .map(|mut plan| {
                plan.timing = self.profile.apply(plan.timing);
                plan
            })
            .collect()
    }

    fn row_y(&self, ctx: &LayoutContext<'_>) -> f32 {
        ctx.viewport.height * self.granularity.row_ratio()
    }

    fn line_glyphs(cue: &Cue) -> MeasuredText {
        cue.layout()
            .and_then(|layout| layout.line.clone())
            .unwrap_or_else(MeasuredText::empty)
    }

    fn plan_line(&self, cue: &Cue, ctx: &LayoutContext<'_>) -> Vec<SpawnPlan> {
        if cue.is_processed(0) {
            return Vec::new();
        }
        let glyphs = Self::line_glyphs(cue);
        let block = cue.block_duration();
        vec![SpawnPlan {
            unit: 0,
            anchor: Vec2::new(
                ctx.viewport.center_x() - glyphs.bounds.w / 2.0,
                self.row_y(ctx),
            ),
            glyphs,
            timing: LifeTiming::new(block, 0.0, block),
            pre_active_offset: None,
        }]
    }

    fn plan_two_rows(
        &self,
        cue: &Cue,
        prev: Option<CueWindow>,
        ctx: &LayoutContext<'_>,
    ) -> Vec<SpawnPlan> {
        if cue.is_processed(0) {
            return Vec::new();
        }
        let glyphs = Self::line_glyphs(cue);
        let reference = prev.map_or_else(|| first_row_lead(cue), |p| p.start_ms);
        let start = cue.start_ms as f64;
        let end = cue.end_ms as f64;

        let timing = LifeTiming::new(
            end - reference,
            (start - reference).max(0.0),
            (end - start) + cue.warmup_ms,
        );
        let row_height = glyphs.bounds.h * 1.5;

        vec![SpawnPlan {
            unit: 0,
            anchor: Vec2::new(
                ctx.viewport.center_x() - glyphs.bounds.w / 2.0,
                self.row_y(ctx),
            ),
            glyphs,
            timing,
            pre_active_offset: Some(Vec2::new(0.0, row_height)),
        }]
    }

    fn plan_staggered(&self, cue: &Cue, ctx: &LayoutContext<'_>) -> Vec<SpawnPlan> {
        let n = cue.units().len();
        if n == 0 {
            return Vec::new();
        }
        let block = cue.block_duration();
        let unit_duration = block / n as f64;

        (0..n)
            .filter(|&i| !cue.is_processed(i))
            .map(|i| {
                let timing = LifeTiming::new(block, i as f64 * unit_duration, unit_duration);
                self.unit_plan(cue, i, timing, ctx)
            })
            .collect()
    }

    fn plan_current(&self, cue: &Cue, ctx: &LayoutContext<'_>) -> Vec<SpawnPlan> {
        let Some(i) = cue.current_unit() else {
            return Vec::new();
        };
        if cue.is_processed(i) {
            return Vec::new();
        }
        let unit_duration = cue.block_duration() / cue.units().len() as f64;
        let timing = LifeTiming::new(unit_duration, 0.0, unit_duration);
        vec![self.unit_plan(cue, i, timing, ctx)]
    }

    fn unit_plan(
        &self,
        cue: &Cue,
        index: usize,
        timing: LifeTiming,
        ctx: &LayoutContext<'_>,
    ) -> SpawnPlan {
        let (glyphs, offset_x, total) = match cue.layout() {
            Some(layout) => match layout.unit(index) {
                Some(unit) => (unit.glyphs.clone(), unit.offset_x, layout.units_width),
                None => (MeasuredText::empty(), 0.0, layout.units_width),
            },
            None => (MeasuredText::empty(), 0.0, 0.0),
        };
        SpawnPlan {
            unit: index,
            glyphs,
            anchor: Vec2::new(
                ctx.viewport.center_x() - total / 2.0 + offset_x,
                self.row_y(ctx),
            ),
            timing,
            pre_active_offset: None,
        }
    }
}

/// 首行的合成提前时刻：`max(0, start - 2000)`
fn first_row_lead(cue: &Cue) -> f64 {
    (cue.start_ms as f64 - TWO_ROWS_FIRST_LEAD_MS).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cue::layout::tests::FixedMeasurer;
    use crate::cue::tests::record;
    use crate::render::Viewport;

    fn ctx(measurer: &FixedMeasurer) -> LayoutContext<'_> {
        LayoutContext {
            measurer,
            font_size: 20.0,
            viewport: Viewport::new(1000.0, 1200.0),
        }
    }

    fn cue(strategy: &CueStrategy, start: u64, end: u64, text: &str) -> Cue {
        Cue::new(
            record(start, end, text),
            strategy.granularity.unit_kind(),
            200.0,
        )
    }

    #[test]
    fn test_split_units() {
        assert_eq!(
            UnitKind::Word.split("hello, world\tfoo\nbar  ,,baz"),
            vec!["hello", "world", "foo", "bar", "baz"]
        );
        assert_eq!(UnitKind::Char.split("a b"), vec!["a", " ", "b"]);
        assert_eq!(UnitKind::Char.split("日本"), vec!["日", "本"]);
        assert!(UnitKind::Line.split("a b").is_empty());
    }

    #[test]
    fn test_granularity_from_str() {
        assert_eq!("two_rows".parse::<Granularity>(), Ok(Granularity::TwoRows));
        assert_eq!(
            "CURRENT_CHARS".parse::<Granularity>(),
            Ok(Granularity::CurrentChars)
        );
        assert!("bogus".parse::<Granularity>().is_err());
    }

    #[test]
    fn test_line_spawns_once() {
        let m = FixedMeasurer::new();
        let strategy = CueStrategy::new(Granularity::Line);
        let mut c = cue(&strategy, 1000, 3000, "abcd");

        c.update(1000.0, None, &strategy, &ctx(&m));
        let plans = strategy.plan_spawns(&mut c, None, &ctx(&m));
        assert_eq!(plans.len(), 1);
        let plan = &plans[0];
        assert_eq!(plan.timing, LifeTiming::new(2200.0, 0.0, 2200.0));
        // 宽 40，居中
        assert_eq!(plan.anchor, Vec2::new(480.0, 600.0));

        c.update(1100.0, None, &strategy, &ctx(&m));
        assert!(strategy.plan_spawns(&mut c, None, &ctx(&m)).is_empty());
        assert_eq!(c.processed_units().len(), 1);
    }

    #[test]
    fn test_hidden_cue_does_not_spawn() {
        let m = FixedMeasurer::new();
        let strategy = CueStrategy::new(Granularity::Words);
        let mut c = cue(&strategy, 5000, 6000, "a b");
        c.update(0.0, None, &strategy, &ctx(&m));
        assert!(strategy.plan_spawns(&mut c, None, &ctx(&m)).is_empty());
    }

    #[test]
    fn test_staggered_units() {
        let m = FixedMeasurer::new();
        let strategy = CueStrategy::new(Granularity::Words);
        // block = 1800 + 200 = 2000, N = 4
        let mut c = cue(&strategy, 1000, 2800, "one two three four");
        c.update(1000.0, None, &strategy, &ctx(&m));
        let plans = strategy.plan_spawns(&mut c, None, &ctx(&m));

        assert_eq!(plans.len(), 4);
        for (i, plan) in plans.iter().enumerate() {
            assert_eq!(plan.unit, i);
            assert_eq!(plan.timing.active_duration, i as f64 * 500.0);
            assert_eq!(plan.timing.active_term, 500.0);
            assert_eq!(plan.timing.lifetime, 2000.0);
        }

        // 激活窗口互不重叠且首尾相接
        for pair in plans.windows(2) {
            assert_eq!(pair[0].timing.active_end(), pair[1].timing.active_duration);
        }

        c.update(1500.0, None, &strategy, &ctx(&m));
        assert!(strategy.plan_spawns(&mut c, None, &ctx(&m)).is_empty());
        assert_eq!(c.processed_units().len(), 4);
    }

    #[test]
    fn test_unit_anchors_follow_offsets() {
        let m = FixedMeasurer::new();
        let strategy = CueStrategy::new(Granularity::Chars);
        let mut c = cue(&strategy, 0, 1000, "ab");
        c.update(0.0, None, &strategy, &ctx(&m));
        let plans = strategy.plan_spawns(&mut c, None, &ctx(&m));
        // 字宽 10，间隔 24，总宽 10 + 24 + 10 = 44
        assert_eq!(plans[0].anchor.x, 500.0 - 22.0);
        assert_eq!(plans[1].anchor.x, 500.0 - 22.0 + 34.0);
    }

    #[test]
    fn test_failed_unit_still_spawns_empty() {
        let m = FixedMeasurer { fail_on: Some("b") };
        let strategy = CueStrategy::new(Granularity::Chars);
        let mut c = cue(&strategy, 0, 1000, "abc");
        c.update(0.0, None, &strategy, &ctx(&m));
        let plans = strategy.plan_spawns(&mut c, None, &ctx(&m));
        assert_eq!(plans.len(), 3);
        assert!(plans[1].glyphs.path.is_empty());
        assert!(!plans[0].glyphs.path.is_empty());
        assert!(!plans[2].glyphs.path.is_empty());
    }

    #[test]
    fn test_current_unit_spawns_in_order_exactly_once() {
        let m = FixedMeasurer::new();
        let strategy = CueStrategy::new(Granularity::CurrentWords);
        // block = 1800 + 200 = 2000, N = 4, unit = 500
        let mut c = cue(&strategy, 1000, 2800, "one two three four");

        let mut spawned = Vec::new();
        let mut t = 700.0;
        while t < 3000.0 {
            c.update(t, None, &strategy, &ctx(&m));
            for plan in strategy.plan_spawns(&mut c, None, &ctx(&m)) {
                assert_eq!(plan.timing.active_duration, 100.0);
                assert_eq!(plan.timing.active_term, 500.0);
                assert_eq!(plan.timing.lifetime, 900.0);
                spawned.push(plan.unit);
            }
            t += 16.0;
        }
        assert_eq!(spawned, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_current_unit_not_respawned_after_backward_seek() {
        let m = FixedMeasurer::new();
        let strategy = CueStrategy::new(Granularity::CurrentChars);
        let mut c = cue(&strategy, 0, 1000, "ab");

        c.update(100.0, None, &strategy, &ctx(&m));
        assert_eq!(strategy.plan_spawns(&mut c, None, &ctx(&m)).len(), 1);

        // 回退到同一单元：不再生成
        c.update(50.0, None, &strategy, &ctx(&m));
        assert!(strategy.plan_spawns(&mut c, None, &ctx(&m)).is_empty());

        c.reset();
        c.update(50.0, None, &strategy, &ctx(&m));
        assert_eq!(strategy.plan_spawns(&mut c, None, &ctx(&m)).len(), 1);
    }

    #[test]
    fn test_two_rows_visibility_extends_to_prev_window() {
        let strategy = CueStrategy::new(Granularity::TwoRows);
        let b = cue(&strategy, 2500, 4000, "B");
        let prev = Some(CueWindow {
            start_ms: 1000.0,
            end_ms: 3000.0,
        });
        assert!(!strategy.is_visible(&b, prev, 999.0));
        assert!(strategy.is_visible(&b, prev, 1000.0));
        assert!(strategy.is_visible(&b, prev, 3500.0));
        assert!(!strategy.is_visible(&b, prev, 4000.0));
    }

    #[test]
    fn test_two_rows_first_cue_lead() {
        let strategy = CueStrategy::new(Granularity::TwoRows);
        let first = cue(&strategy, 5000, 6000, "A");
        assert!(strategy.is_visible(&first, None, 3000.0));
        assert!(!strategy.is_visible(&first, None, 2999.0));

        let early = cue(&strategy, 500, 1500, "A");
        assert!(strategy.is_visible(&early, None, 0.0));
    }

    #[test]
    fn test_two_rows_timing() {
        let m = FixedMeasurer::new();
        let strategy = CueStrategy::new(Granularity::TwoRows);
        let prev = Some(CueWindow {
            start_ms: 1000.0,
            end_ms: 3000.0,
        });
        let mut b = cue(&strategy, 2500, 4000, "B");
        b.update(1000.0, prev, &strategy, &ctx(&m));
        let plans = strategy.plan_spawns(&mut b, prev, &ctx(&m));
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].timing, LifeTiming::new(3000.0, 1500.0, 1700.0));
        assert_eq!(plans[0].anchor.y, 900.0);
        assert_eq!(plans[0].pre_active_offset, Some(Vec2::new(0.0, 30.0)));

        let mut first = cue(&strategy, 1000, 2000, "A");
        first.update(0.0, None, &strategy, &ctx(&m));
        let plans = strategy.plan_spawns(&mut first, None, &ctx(&m));
        // ref = max(0, 1000 - 2000) = 0
        assert_eq!(plans[0].timing, LifeTiming::new(2000.0, 1000.0, 1200.0));
    }

    #[test]
    fn test_profile_override() {
        let m = FixedMeasurer::new();
        let strategy = CueStrategy::new(Granularity::CurrentChars)
            .with_profile(TimingProfile::long_lifetime_text());
        let mut c = cue(&strategy, 0, 800, "ab");
        c.update(0.0, None, &strategy, &ctx(&m));
        let plans = strategy.plan_spawns(&mut c, None, &ctx(&m));
        // unit = (800 + 200) / 2 = 500
        assert_eq!(plans[0].timing, LifeTiming::new(2000.0, 500.0, 500.0));
    }

    #[test]
    fn test_separator_only_text_has_no_units() {
        let m = FixedMeasurer::new();
        let strategy = CueStrategy::new(Granularity::Words);
        let mut c = cue(&strategy, 0, 1000, " , ,");
        c.update(0.0, None, &strategy, &ctx(&m));
        assert!(strategy.plan_spawns(&mut c, None, &ctx(&m)).is_empty());
    }
}
