//! # 诊断模块
//!
//! 记录解析过程中被丢弃的字幕记录，不依赖 IO。
//!
//! 坏记录不会中断整批解析，而是转成一条诊断，由 Host 决定如何展示。

use crate::error::ParseError;

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticLevel {
    /// 信息提示
    Info,
    /// 警告（记录被丢弃）
    Warn,
    /// 错误（整个文件不可用）
    Error,
}

impl std::fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// 诊断条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 诊断级别
    pub level: DiagnosticLevel,
    /// 记录在文件中的序号（从 0 开始）
    pub block_index: usize,
    /// 行号（从 1 开始）
    pub line: Option<usize>,
    /// 诊断消息
    pub message: String,
    /// 原始记录内容
    pub detail: Option<String>,
}

impl Diagnostic {
    /// 创建警告诊断
    pub fn warn(block_index: usize, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warn,
            block_index,
            line: None,
            message: message.into(),
            detail: None,
        }
    }

    /// 创建错误诊断
    pub fn error(block_index: usize, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            block_index,
            line: None,
            message: message.into(),
            detail: None,
        }
    }

    /// 由被丢弃记录的解析错误生成诊断
    pub fn dropped(block_index: usize, error: &ParseError, raw: &str) -> Self {
        let mut diagnostic = Self::warn(block_index, format!("记录已丢弃：{error}"));
        diagnostic.line = error_line(error);
        diagnostic.detail = Some(raw.replace('\n', " | "));
        diagnostic
    }
}

fn error_line(error: &ParseError) -> Option<usize> {
    match error {
        ParseError::IncompleteRecord { line, .. }
        | ParseError::InvalidId { line, .. }
        | ParseError::InvalidTimeRange { line, .. }
        | ParseError::InvertedRange { line, .. }
        | ParseError::EmptyText { line } => Some(*line),
        ParseError::InvalidTimecode { .. } => None,
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] 记录 #{}", self.level, self.block_index)?;
        if let Some(line) = self.line {
            write!(f, " (第 {} 行)", line)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, "\n  | {}", detail)?;
        }
        Ok(())
    }
}
