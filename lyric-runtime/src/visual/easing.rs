//! # Easing 模块
//!
//! 文字特效使用的缓动函数。

/// 缓动函数类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EasingFunction {
    /// 线性（匀速）
    #[default]
    Linear,
    /// 指数缓入
    EaseInExpo,
    /// 回弹缓入（开头先反向再加速，结果可能为负）
    EaseInBack,
}

impl EasingFunction {
    /// 计算缓动值
    ///
    /// # 参数
    /// - `t`: 时间进度 (0.0 - 1.0)，超出范围会被限制
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            EasingFunction::Linear => t,
            EasingFunction::EaseInExpo => {
                if t == 0.0 {
                    0.0
                } else {
                    2.0_f32.powf(10.0 * t - 10.0)
                }
            }
            EasingFunction::EaseInBack => {
                let c1 = 1.70158;
                let c3 = c1 + 1.0;
                c3 * t * t * t - c1 * t * t
            }
        }
    }
}

/// 线性映射 `value` 从 `[0, 1]` 到 `[lo, hi]`
pub fn lerp(lo: f32, hi: f32, value: f32) -> f32 {
    lo + (hi - lo) * value
}
