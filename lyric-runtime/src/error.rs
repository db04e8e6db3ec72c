//! # Error 模块
//!
//! 定义 lyric-runtime 中使用的错误类型。

use thiserror::Error;

/// 字幕记录解析错误
///
/// 单条记录的错误只会导致该记录被丢弃，不会中断整批解析。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// 记录行数不足（至少需要编号、时间轴、文本三行）
    #[error("第 {line} 行：记录不完整，只有 {found} 行")]
    IncompleteRecord { line: usize, found: usize },

    /// 无效的编号
    #[error("第 {line} 行：无效的记录编号 '{id}'")]
    InvalidId { line: usize, id: String },

    /// 无效的时间轴行
    #[error("第 {line} 行：无效的时间轴 - {message}")]
    InvalidTimeRange { line: usize, message: String },

    /// 无效的时间码
    #[error("无效的时间码 '{input}'：{message}")]
    InvalidTimecode { input: String, message: String },

    /// 结束时间早于开始时间
    #[error("第 {line} 行：结束时间 {end_ms}ms 早于开始时间 {start_ms}ms")]
    InvertedRange {
        line: usize,
        start_ms: u64,
        end_ms: u64,
    },

    /// 没有文本内容
    #[error("第 {line} 行：记录没有文本内容")]
    EmptyText { line: usize },
}

/// 文字测量错误
///
/// 由外部字形/测量协作者返回。单元测量失败只让该单元变为空图形。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeasureError {
    /// 字体尚未加载
    #[error("字体尚未加载")]
    FontUnavailable,

    /// 无法为文本生成字形路径
    #[error("无法生成文本 '{text}' 的字形：{message}")]
    ShapingFailed { text: String, message: String },
}

/// 播放器配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 配置项数值无效
    #[error("配置项 '{field}' 无效：{message}")]
    InvalidValue { field: String, message: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// lyric-runtime 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LyricError {
    /// 解析错误
    #[error("解析错误: {0}")]
    Parse(#[from] ParseError),

    /// 测量错误
    #[error("测量错误: {0}")]
    Measure(#[from] MeasureError),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// Result 类型别名
pub type LyricResult<T> = Result<T, LyricError>;
