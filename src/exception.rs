// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了请求处理管线在生命周期中可能抛出的各类异常情况。
//!
//! ## 设计意图
//! - **错误分类**：涵盖协议解析错误、处理器（Processor）执行故障以及输出阶段的 I/O 错误。
//! - **语义映射**：每个变体对应特定的处理策略——有的在 Responder 内部被就地恢复
//!   （如响应头计算失败），有的必须作为致命错误向上传播（如处理器故障）。
//! - **用户友好**：通过实现 `std::fmt::Display`，确保错误信息可以被安全地记录到日志中。

use std::fmt;
use std::io;

/// 请求处理过程中发生的异常类型。
///
/// 该枚举通常作为 `Result` 的 `Err` 部分返回，用于指示处理失败的具体原因。
/// 注意：管线的正常短路（处理器提交终态响应）不属于异常，它由
/// [`crate::chain::Flow::Terminate`] 这一显式分支表达。
#[derive(Debug, Clone)]
pub enum Exception {
    /// 客户端发送的请求字节流无法解析为合法的 UTF-8 字符串。
    RequestIsNotUtf8,
    /// 客户端使用了暂不支持的 HTTP 方法。
    UnSupportedRequestMethod,
    /// 客户端使用了不支持的 HTTP 协议版本。
    UnsupportedHttpVersion,
    /// 处理器内部出现编程或逻辑故障。属于致命错误，必须从管线向上传播，
    /// 由最外层调用者转化为 500 级响应。
    ProcessorFailed(String),
    /// 响应对象计算自身响应头时失败。Responder 会就地恢复，
    /// 以已合并的部分头继续输出。
    HeaderComputeFailed(String),
    /// 响应对象在按协商结果重写自身时失败。Responder 会就地恢复，
    /// 继续使用未转换的原响应。
    TransformFailed(String),
    /// 向客户端写出字节时发生 I/O 错误。
    OutputFailed(String),
}

use Exception::*;

/// 为 `Exception` 实现 `Display` 特性，使其支持字符串格式化输出。
impl fmt::Display for Exception {
    /// 根据错误类型写入人类可读的描述文本。
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestIsNotUtf8 => write!(f, "Request bytes can't be parsed in UTF-8"),
            UnSupportedRequestMethod => write!(f, "Unsupported request method"),
            UnsupportedHttpVersion => write!(f, "Unsupported HTTP version"),
            ProcessorFailed(msg) => write!(f, "Processor failed: {}", msg),
            HeaderComputeFailed(msg) => write!(f, "Couldn't compute response headers: {}", msg),
            TransformFailed(msg) => write!(f, "Couldn't transform response: {}", msg),
            OutputFailed(msg) => write!(f, "Couldn't write output: {}", msg),
        }
    }
}

impl From<io::Error> for Exception {
    /// 输出阶段的底层 I/O 错误统一折叠为 `OutputFailed`
    fn from(e: io::Error) -> Self {
        OutputFailed(e.to_string())
    }
}
