//! # Transport 模块
//!
//! 无音频环境下的模拟播放传输：播放位置随墙钟推进。

use tracing::debug;

use lyric_runtime::Transport;

/// 模拟时钟传输
#[derive(Debug, Clone, Default)]
pub struct SimulatedTransport {
    position_ms: f64,
    playing: bool,
    muted: bool,
    /// 音频时长；到达后自动停止
    duration_ms: Option<f64>,
}

impl SimulatedTransport {
    pub fn new(duration_ms: Option<f64>) -> Self {
        Self {
            duration_ms,
            ..Self::default()
        }
    }

    /// 墙钟前进 `delta_ms`，播放中时同步推进播放位置
    pub fn advance(&mut self, delta_ms: f64) {
        if !self.playing {
            return;
        }
        self.position_ms += delta_ms;
        if let Some(duration) = self.duration_ms
            && self.position_ms >= duration
        {
            self.position_ms = duration;
            self.playing = false;
            debug!(position_ms = duration, "播放结束");
        }
    }
}

impl Transport for SimulatedTransport {
    fn position_ms(&self) -> f64 {
        self.position_ms
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn play(&mut self) {
        self.playing = true;
    }

    fn play_pause(&mut self) {
        self.playing = !self.playing;
    }

    fn seek(&mut self, position_ms: f64) {
        let mut position = position_ms.max(0.0);
        if let Some(duration) = self.duration_ms {
            position = position.min(duration);
        }
        self.position_ms = position;
    }

    fn is_muted(&self) -> bool {
        self.muted
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }
}
