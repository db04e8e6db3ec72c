//! # Lifecycle 模块
//!
//! 所有视觉对象共享的限时状态机。
//!
//! ```text
//! spawn ── activeDuration ──► active ── activeTerm ──► post-active ──► lifetime 到期 → dead
//!          (fade_in 0→1)               (fade_in=1, fade_out=0)   (fade_out 0→1)
//! ```
//!
//! 时间以墙钟毫秒计（与播放位置无关），进度均为线性插值并限制在 [0, 1]。

/// 生命周期阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// 激活前
    #[default]
    PreActive,
    /// 激活中
    Active,
    /// 激活后（渐出）
    PostActive,
}

/// 生成时的时间参数（毫秒）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LifeTiming {
    /// 总寿命
    pub lifetime: f64,
    /// 激活前时长
    pub active_duration: f64,
    /// 激活期时长
    pub active_term: f64,
}

impl LifeTiming {
    pub fn new(lifetime: f64, active_duration: f64, active_term: f64) -> Self {
        Self {
            lifetime,
            active_duration,
            active_term,
        }
    }

    /// 激活期结束时刻（相对生成时刻）
    pub fn active_end(&self) -> f64 {
        self.active_duration + self.active_term
    }
}

/// 生命周期状态
#[derive(Debug, Clone, PartialEq)]
pub struct Lifecycle {
    timing: LifeTiming,
    spawn_time: f64,
    elapsed: f64,
    enabled: bool,
    dead: bool,
    fade_in: f32,
    fade_out: f32,
}

impl Lifecycle {
    /// 在 `spawn_time`（墙钟毫秒）创建
    pub fn new(timing: LifeTiming, spawn_time: f64) -> Self {
        Self {
            timing,
            spawn_time,
            elapsed: 0.0,
            enabled: false,
            dead: false,
            fade_in: 0.0,
            fade_out: 0.0,
        }
    }

    /// 按当前墙钟时间推进
    ///
    /// 死亡后调用无效果。到期的那一帧仍会计算渐变进度。
    pub fn update(&mut self, now: f64) {
        if self.dead {
            return;
        }

        self.elapsed = now - self.spawn_time;
        self.enabled = self.phase() == Phase::Active;

        if self.elapsed >= self.timing.lifetime {
            self.dead = true;
        }

        self.update_fades();
    }

    fn update_fades(&mut self) {
        let LifeTiming {
            lifetime,
            active_duration,
            ..
        } = self.timing;

        match self.phase() {
            Phase::PreActive => {
                self.fade_in = if active_duration > 0.0 {
                    ratio(self.elapsed, active_duration)
                } else {
                    1.0
                };
            }
            Phase::Active => {
                self.fade_in = 1.0;
                self.fade_out = 0.0;
            }
            Phase::PostActive => {
                let fade_start = self.timing.active_end();
                let fade_duration = lifetime - fade_start;
                self.fade_out = if fade_duration > 0.0 {
                    ratio(self.elapsed - fade_start, fade_duration)
                } else {
                    1.0
                };
            }
        }
    }

    /// 提前死亡（如离开可视区域）
    pub fn die(&mut self) {
        self.dead = true;
    }

    /// 当前阶段
    pub fn phase(&self) -> Phase {
        if self.elapsed < self.timing.active_duration {
            Phase::PreActive
        } else if self.elapsed < self.timing.active_end() {
            Phase::Active
        } else {
            Phase::PostActive
        }
    }

    pub fn timing(&self) -> LifeTiming {
        self.timing
    }

    pub fn spawn_time(&self) -> f64 {
        self.spawn_time
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn is_live(&self) -> bool {
        !self.dead
    }

    pub fn fade_in(&self) -> f32 {
        self.fade_in
    }

    pub fn fade_out(&self) -> f32 {
        self.fade_out
    }
}

fn ratio(value: f64, total: f64) -> f32 {
    (value / total).clamp(0.0, 1.0) as f32
}
