//! # Parser 模块
//!
//! SRT 字幕记录提取。
//!
//! ## 架构
//!
//! ```text
//! 原始文本 → [阶段1: 块识别] → Vec<RecordBlock> → [阶段2: 记录解析] → Vec<CueRecord>
//! ```
//!
//! 容错解析：坏记录（编号、时间轴、文本任一无效）被丢弃并记为诊断，
//! 其余记录照常输出，顺序与文件中一致（排序由 `CueTrack` 负责）。

mod blocks;


use tracing::warn;

use crate::diagnostic::Diagnostic;
use crate::error::ParseError;
use crate::timecode::parse_timecode;

pub use blocks::{RecordBlock, recognize_blocks};

/// 时间轴分隔符
const ARROW: &str = " --> ";

/// 一条已解析的字幕记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueRecord {
    /// 记录编号（原样保留）
    pub id: String,
    /// 开始时间（毫秒）
    pub start_ms: u64,
    /// 结束时间（毫秒）
    pub end_ms: u64,
    /// 文本（多行以 `\n` 连接）
    pub text: String,
}

/// 解析结果
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    /// 有效记录（文件顺序）
    pub records: Vec<CueRecord>,
    /// 被丢弃记录的诊断
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseOutcome {
    /// 是否有记录被丢弃
    pub fn has_dropped(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// SRT 解析器
#[derive(Debug, Default)]
pub struct Parser;

impl Parser {
    /// 创建新的解析器
    pub fn new() -> Self {
        Self
    }

    /// 解析 SRT 文本
    ///
    /// 永不失败：坏记录进入 `ParseOutcome::diagnostics`。
    pub fn parse(&self, text: &str) -> ParseOutcome {
        let mut outcome = ParseOutcome::default();

        for (block_index, block) in recognize_blocks(text).into_iter().enumerate() {
            match parse_record(&block) {
                Ok(record) => outcome.records.push(record),
                Err(err) => {
                    warn!(block = block_index, error = %err, "丢弃无效字幕记录");
                    outcome
                        .diagnostics
                        .push(Diagnostic::dropped(block_index, &err, &block.raw()));
                }
            }
        }

        outcome
    }
}

/// 解析单个记录块
pub fn parse_record(block: &RecordBlock) -> Result<CueRecord, ParseError> {
    let [id_line, time_line, text_lines @ ..] = block.lines.as_slice() else {
        return Err(ParseError::IncompleteRecord {
            line: block.start_line,
            found: block.lines.len(),
        });
    };

    if text_lines.is_empty() {
        return Err(ParseError::IncompleteRecord {
            line: block.start_line,
            found: block.lines.len(),
        });
    }

    let id = id_line.trim();
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidId {
            line: block.line_number(0),
            id: id.to_string(),
        });
    }

    let time_line_number = block.line_number(1);
    let (start_ms, end_ms) = parse_time_range(time_line).map_err(|message| {
        ParseError::InvalidTimeRange {
            line: time_line_number,
            message,
        }
    })?;

    if end_ms < start_ms {
        return Err(ParseError::InvertedRange {
            line: time_line_number,
            start_ms,
            end_ms,
        });
    }

    let text = text_lines.join("\n");
    if text.trim().is_empty() {
        return Err(ParseError::EmptyText {
            line: block.line_number(2),
        });
    }

    Ok(CueRecord {
        id: id.to_string(),
        start_ms,
        end_ms,
        text,
    })
}

/// 解析 `HH:MM:SS,mmm --> HH:MM:SS,mmm`
///
/// 结束时间后面的附加内容（如坐标 `X1:...`）会被忽略。
fn parse_time_range(line: &str) -> Result<(u64, u64), String> {
    let parts: Vec<&str> = line.split(ARROW).collect();
    let [start, end] = parts.as_slice() else {
        return Err(format!("需要恰好一个 '{}'", ARROW.trim()));
    };

    let end = end.split_whitespace().next().unwrap_or_default();
    let start_ms = parse_timecode(start).map_err(|e| e.to_string())?;
    let end_ms = parse_timecode(end).map_err(|e| e.to_string())?;
    Ok((start_ms, end_ms))
}
