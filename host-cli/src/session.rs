//! # Session 模块
//!
//! 无窗口的逐帧循环：按固定帧间隔推进墙钟，按脚本注入按键，把每帧交给输出。

use std::io::Write;
use std::str::FromStr;

use anyhow::{Context, bail};
use tracing::{debug, info};

use lyric_runtime::{KeyAction, LyricPlayer, Transport};

use crate::measure::EstimatingMeasurer;
use crate::output::{FrameSink, FrameStats};
use crate::settings::SettingsStore;
use crate::transport::SimulatedTransport;

/// 按键脚本中的一次按键
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyPress {
    /// 墙钟时间（毫秒）
    pub at_ms: f64,
    pub action: KeyAction,
}

impl FromStr for KeyPress {
    type Err = String;

    /// 格式：`AT_MS:KEY`，例如 `1500:b`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (at, key) = s
            .split_once(':')
            .ok_or_else(|| format!("按键格式应为 AT_MS:KEY，实际为 '{}'", s))?;
        let at_ms: f64 = at
            .trim()
            .parse()
            .map_err(|_| format!("无效的按键时间 '{}'", at))?;
        if !at_ms.is_finite() || at_ms < 0.0 {
            return Err(format!("按键时间必须为非负数：'{}'", at));
        }

        let mut chars = key.chars();
        let action = match (chars.next(), chars.next()) {
            (Some(c), None) => KeyAction::from_key(c),
            _ if key.eq_ignore_ascii_case("space") => KeyAction::from_key(' '),
            _ => None,
        }
        .ok_or_else(|| format!("未绑定的按键 '{}'（可用：s r b m space）", key))?;

        Ok(Self { at_ms, action })
    }
}

pub type HeadlessPlayer = LyricPlayer<SimulatedTransport, EstimatingMeasurer>;

/// 一次无窗口播放
pub struct PlaySession {
    player: HeadlessPlayer,
    store: SettingsStore,
    keys: Vec<KeyPress>,
    frame_interval_ms: f64,
}

impl PlaySession {
    pub fn new(
        player: HeadlessPlayer,
        store: SettingsStore,
        mut keys: Vec<KeyPress>,
        frame_interval_ms: f64,
    ) -> Self {
        keys.sort_by(|a, b| a.at_ms.total_cmp(&b.at_ms));
        Self {
            player,
            store,
            keys,
            frame_interval_ms,
        }
    }

    pub fn player(&self) -> &HeadlessPlayer {
        &self.player
    }

    /// 运行到播放位置到达 `until_ms`
    ///
    /// 播放暂停且没有后续按键时提前结束。
    pub fn run<W: Write>(
        &mut self,
        until_ms: f64,
        sink: &mut FrameSink<W>,
    ) -> anyhow::Result<()> {
        if self.frame_interval_ms <= 0.0 {
            bail!("帧间隔必须为正数");
        }

        let mut now_ms = 0.0;
        let mut next_key = 0;

        loop {
            while let Some(press) = self.keys.get(next_key)
                && press.at_ms <= now_ms
            {
                let action = press.action;
                next_key += 1;
                self.press(action)?;
            }

            let frame = self.player.tick(now_ms);
            sink.write_frame(now_ms, &frame)?;

            let transport = self.player.transport();
            if transport.position_ms() >= until_ms {
                break;
            }
            if !transport.is_playing() && next_key >= self.keys.len() {
                debug!(now_ms, "播放已停止且没有后续按键");
                break;
            }

            self.player.transport_mut().advance(self.frame_interval_ms);
            now_ms += self.frame_interval_ms;
        }

        info!(
            now_ms,
            position_ms = self.player.transport().position_ms(),
            "播放结束"
        );
        Ok(())
    }

    fn press(&mut self, action: KeyAction) -> anyhow::Result<()> {
        debug!(?action, "按键");
        if let Some(settings) = self.player.handle_key(action) {
            self.store
                .save(&settings)
                .context("切换背景后保存用户设置失败")?;
        }
        Ok(())
    }
}

/// 运行并返回统计
pub fn run_to_end<W: Write>(
    session: &mut PlaySession,
    until_ms: f64,
    mut sink: FrameSink<W>,
) -> anyhow::Result<(W, FrameStats)> {
    session.run(until_ms, &mut sink)?;
    sink.finish()
}
