//! 应答清洗与解码
//!
//! 串口线路上可能出现噪声、残帧或控制字符。所有应答在解析前都要经过清洗：
//! 只保留字母数字、下划线、空格、小数点和美元符号（`$` 出现在 `$X` 等系统指令的回显中）。
//!
//! 状态报告（`?` 的应答）额外把字段分隔符 `< > | : ,` 归一化为空格，
//! 使首个状态字段成为独立的 token：
//!
//! ```text
//! <Idle|MPos:17.530,0.000,0.000|FS:0,0>  →  Idle MPos 17.530 0.000 0.000 FS 0 0
//! ```

use crate::ProtocolError;

/// 成功应答前缀
pub const OK_TOKEN: &str = "ok";

/// 成功应答前缀的固定宽度（`ok` + 一个分隔字符）
///
/// 负载从该偏移量开始截取。
pub const OK_PREFIX_WIDTH: usize = 3;

/// 状态报告字段分隔符
const STATUS_SEPARATORS: [char; 5] = ['<', '>', '|', ':', ','];

/// 字符是否在允许集合内
#[inline]
pub fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | ' ' | '.' | '$')
}

/// 清洗应答：丢弃允许集合之外的所有字符
pub fn sanitize(raw: &str) -> String {
    raw.chars().filter(|&c| is_allowed_char(c)).collect()
}

/// 清洗状态报告：分隔符转空格，清洗后压缩连续空白
pub fn sanitize_status(raw: &str) -> String {
    let spaced: String = raw
        .chars()
        .map(|c| if STATUS_SEPARATORS.contains(&c) { ' ' } else { c })
        .collect();
    sanitize(&spaced).split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 单条指令的解码结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// `ok` 应答，附带可选负载
    Ok(Option<String>),
    /// 非 `ok` 应答（诊断文本为清洗后的完整应答）
    Failure(String),
}

impl Response {
    /// 解码已清洗的应答
    ///
    /// 1. 若应答以（清洗后的）指令回显开头，去掉回显
    /// 2. 剩余部分必须以 `ok` 开头，否则为 `Failure`
    /// 3. 跳过固定宽度前缀后的内容即负载；空负载为 `None`
    pub fn decode(command: &str, sanitized: &str) -> Self {
        let echo = sanitize(command);
        let rest = if echo.is_empty() {
            sanitized
        } else {
            sanitized.strip_prefix(echo.as_str()).unwrap_or(sanitized)
        };

        if !rest.starts_with(OK_TOKEN) {
            return Response::Failure(sanitized.to_string());
        }

        let payload = rest.get(OK_PREFIX_WIDTH..).unwrap_or("").trim();
        if payload.is_empty() {
            Response::Ok(None)
        } else {
            Response::Ok(Some(payload.to_string()))
        }
    }

    /// 是否为成功应答
    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok(_))
    }

    /// 转换为 `Result`，失败时携带指令与应答文本
    pub fn into_result(self, command: &str) -> Result<Option<String>, ProtocolError> {
        match self {
            Response::Ok(payload) => Ok(payload),
            Response::Failure(response) => Err(ProtocolError::NotOk {
                command: command.to_string(),
                response,
            }),
        }
    }
}
