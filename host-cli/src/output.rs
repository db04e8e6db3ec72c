//! # Output 模块
//!
//! 帧输出：每帧一行 JSON，或只在画面变化时打印的文字摘要。

use std::io::Write;

use anyhow::Context;
use clap::ValueEnum;
use serde::Serialize;

use lyric_runtime::{Frame, Overlay};

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// 每帧一行 JSON
    Json,
    /// 文字摘要
    #[default]
    Summary,
}

#[derive(Serialize)]
struct FrameRecord<'a> {
    now_ms: f64,
    #[serde(flatten)]
    frame: &'a Frame,
}

/// 帧输出统计
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameStats {
    pub frames: usize,
    pub peak_commands: usize,
    pub total_commands: usize,
}

/// 帧输出
pub struct FrameSink<W: Write> {
    format: OutputFormat,
    writer: W,
    stats: FrameStats,
    last: Option<(usize, Overlay)>,
}

impl<W: Write> FrameSink<W> {
    pub fn new(format: OutputFormat, writer: W) -> Self {
        Self {
            format,
            writer,
            stats: FrameStats::default(),
            last: None,
        }
    }

    pub fn write_frame(&mut self, now_ms: f64, frame: &Frame) -> anyhow::Result<()> {
        let count = frame.commands.len();
        self.stats.frames += 1;
        self.stats.total_commands += count;
        self.stats.peak_commands = self.stats.peak_commands.max(count);

        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.writer, &FrameRecord { now_ms, frame })
                    .context("帧序列化失败")?;
                writeln!(self.writer)?;
            }
            OutputFormat::Summary => {
                let changed = self
                    .last
                    .as_ref()
                    .is_none_or(|(c, overlay)| *c != count || *overlay != frame.overlay);
                if changed {
                    writeln!(
                        self.writer,
                        "[{:>8.0}ms] {:>3} 个对象 | {}",
                        now_ms, count, frame.overlay
                    )?;
                    self.last = Some((count, frame.overlay.clone()));
                }
            }
        }
        Ok(())
    }

    /// 写出统计并交还 writer
    pub fn finish(mut self) -> anyhow::Result<(W, FrameStats)> {
        if self.format == OutputFormat::Summary {
            writeln!(
                self.writer,
                "共 {} 帧，单帧最多 {} 个绘制描述，累计 {} 个",
                self.stats.frames, self.stats.peak_commands, self.stats.total_commands
            )?;
        }
        self.writer.flush()?;
        Ok((self.writer, self.stats))
    }
}
