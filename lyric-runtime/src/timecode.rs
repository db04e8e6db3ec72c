//! # Timecode 模块
//!
//! SRT 时间码 `HH:MM:SS,mmm` 与毫秒之间的转换。

use crate::error::ParseError;

/// 解析 `HH:MM:SS,mmm` 格式的时间码，返回毫秒
///
/// 也接受 `.` 作为毫秒分隔符；缺少毫秒部分时按 0 处理。
pub fn parse_timecode(input: &str) -> Result<u64, ParseError> {
    let trimmed = input.trim();
    let invalid = |message: &str| ParseError::InvalidTimecode {
        input: trimmed.to_string(),
        message: message.to_string(),
    };

    let parts: Vec<&str> = trimmed.split(':').collect();
    let [hours, minutes, rest] = parts.as_slice() else {
        return Err(invalid("需要 HH:MM:SS 三段"));
    };

    let (seconds, millis) = match rest.split_once([',', '.']) {
        Some((s, ms)) => (s, ms),
        None => (*rest, ""),
    };

    let hours = parse_field(hours).ok_or_else(|| invalid("小时不是整数"))?;
    let minutes = parse_field(minutes).ok_or_else(|| invalid("分钟不是整数"))?;
    let seconds = parse_field(seconds).ok_or_else(|| invalid("秒不是整数"))?;
    let millis = if millis.is_empty() {
        0
    } else {
        parse_field(millis).ok_or_else(|| invalid("毫秒不是整数"))?
    };

    if minutes >= 60 || seconds >= 60 {
        return Err(invalid("分钟和秒必须小于 60"));
    }
    if millis >= 1000 {
        return Err(invalid("毫秒必须小于 1000"));
    }

    hours
        .checked_mul(3_600_000)
        .and_then(|ms| ms.checked_add(minutes * 60_000 + seconds * 1000 + millis))
        .ok_or_else(|| invalid("超出范围"))
}

fn parse_field(field: &str) -> Option<u64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

/// 将毫秒格式化为 `HH:MM:SS,mmm`
///
/// 负数按 0 处理，小数部分截断。
pub fn format_timecode(ms: f64) -> String {
    let ms = if ms.is_finite() && ms > 0.0 {
        ms.floor() as u64
    } else {
        0
    };
    let total_seconds = ms / 1000;
    let millis = ms % 1000;
    let seconds = total_seconds % 60;
    let minutes = (total_seconds / 60) % 60;
    let hours = total_seconds / 3600;
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}
