//! # 阶段 1：块识别
//!
//! 将原始 SRT 文本按空行切分为记录块，并保留行号。

/// 记录块（阶段 1 输出）
#[derive(Debug, Clone, PartialEq)]
pub struct RecordBlock {
    /// 块内的行（已去掉行尾 `\r`）
    pub lines: Vec<String>,
    /// 块的起始行号（从 1 开始）
    pub start_line: usize,
}

impl RecordBlock {
    /// 块内第 `offset` 行的行号
    pub fn line_number(&self, offset: usize) -> usize {
        self.start_line + offset
    }

    /// 原始文本（用于诊断）
    pub fn raw(&self) -> String {
        self.lines.join("\n")
    }
}

/// 识别文本中的记录块
///
/// 空行作为分隔符，连续多个空行视为一个分隔。只含空白字符的行在块内
/// 属于该块的文本，在块外被跳过。开头的 BOM 会被忽略。
pub fn recognize_blocks(text: &str) -> Vec<RecordBlock> {
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);

    let mut blocks = Vec::new();
    let mut current: Option<RecordBlock> = None;

    for (line_idx, line) in text.lines().enumerate() {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.is_empty() {
            if let Some(block) = current.take() {
                blocks.push(block);
            }
            continue;
        }
        if current.is_none() && line.trim().is_empty() {
            continue;
        }

        current
            .get_or_insert_with(|| RecordBlock {
                lines: Vec::new(),
                start_line: line_idx + 1,
            })
            .lines
            .push(line.to_string());
    }

    if let Some(block) = current {
        blocks.push(block);
    }

    blocks
}
