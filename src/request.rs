// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 请求解析模块
//!
//! 负责将 TCP 流中读取的原始字节码解析为强类型的 [`Request`]：
//! 1. 请求行（Request-Line）的解析（方法、路径、版本）。
//! 2. 常用标头的提取（`User-Agent`、`Accept-Encoding` 等）。
//! 3. 内容协商标头的解析：`Accept` 与 `Accept-Language`
//!    在解析期即被构建为 [`Accept`] 偏好列表，后续协商不再碰原始字符串。
//!
//! 缺省规则：
//! - 无 `Accept` 头时采用 [`DEFAULT_ACCEPT`]（浏览器语义的兜底偏好）。
//! - 无 `Accept-Language` 头时采用全开放偏好（任何语言都以 1.0 接受）。

use log::error;

use crate::accept::{Accept, AcceptKind};
use crate::cache::AcceptCache;
use crate::exception::Exception;
use crate::param::*;

/// 一个已解析的 HTTP 请求的元数据。
///
/// 不保存请求体的大数据部分，主要服务于管线分发与内容协商。
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP 请求方法（GET, POST 等）
    method: HttpRequestMethod,
    /// 请求的资源路径（包含查询字符串）
    path: String,
    /// HTTP 协议版本
    version: HttpVersion,
    /// 客户端标识字符串
    user_agent: String,
    /// 客户端支持的压缩编码列表（按解析顺序排列）
    accept_encoding: Vec<HttpEncoding>,
    /// 客户端的 MIME 偏好（已解析）
    accept: Accept,
    /// 客户端的语言偏好（已解析）
    accept_language: Accept,
}

/// 从请求各行中提取指定标头的原始值（字段名大小写不敏感）
fn header_value<'a>(lines: &[&'a str], name: &str) -> Option<&'a str> {
    let prefix = format!("{}:", name.to_lowercase());
    for line in lines {
        if line.to_lowercase().starts_with(&prefix) {
            return line.split(": ").nth(1).map(|v| v.trim());
        }
    }
    None
}

/// 解析协商类标头，可选地借助缓存跳过重复解析
fn parse_accept(raw: &str, kind: AcceptKind, cache: Option<&mut AcceptCache>) -> Accept {
    match cache {
        Some(cache) => {
            if let Some(entries) = cache.find(raw, kind) {
                return Accept::from_entries(entries.clone(), kind);
            }
            let accept = Accept::from_header(raw, kind);
            cache.push(raw, kind, accept.entries().to_vec());
            accept
        }
        None => Accept::from_header(raw, kind),
    }
}

impl Request {
    /// 从原始字节缓冲区尝试构建 `Request` 实例。
    ///
    /// # 参数
    /// * `buffer` - 从网络 Socket 读取的原始数据。
    /// * `id` - 全局请求 ID，用于在多线程环境下追踪日志。
    ///
    /// # 错误处理
    /// 请求不是合法 UTF-8、方法或版本不受支持时返回相应的 `Exception`。
    pub fn try_from(buffer: &Vec<u8>, id: u128) -> Result<Self, Exception> {
        Self::build(buffer, id, None)
    }

    /// 同 [`try_from`](Self::try_from)，但 `Accept` / `Accept-Language`
    /// 的解析结果经由 LRU 缓存复用。
    pub fn try_from_with_cache(
        buffer: &Vec<u8>,
        id: u128,
        cache: &mut AcceptCache,
    ) -> Result<Self, Exception> {
        Self::build(buffer, id, Some(cache))
    }

    fn build(
        buffer: &Vec<u8>,
        id: u128,
        mut cache: Option<&mut AcceptCache>,
    ) -> Result<Self, Exception> {
        // 1. 将字节流转换为字符串，失败则判定为非法的 HTTP 请求
        let request_string = match String::from_utf8(buffer.to_vec()) {
            Ok(string) => string,
            Err(_) => {
                error!("[ID{}]无法解析HTTP请求", id);
                return Err(Exception::RequestIsNotUtf8);
            }
        };

        let request_lines: Vec<&str> = request_string.split(CRLF).collect();

        // 2. 解析请求行 (e.g., "GET /index.html HTTP/1.1")
        let first_line_parts: Vec<&str> = request_lines[0].split(" ").collect();

        if first_line_parts.len() < 3 {
            error!("[ID{}]HTTP请求行格式不正确：{}", id, request_lines[0]);
            return Err(Exception::UnSupportedRequestMethod);
        }

        let method_str = first_line_parts[0].to_uppercase();
        let method = match method_str.as_str() {
            "GET" => HttpRequestMethod::Get,
            "HEAD" => HttpRequestMethod::Head,
            "OPTIONS" => HttpRequestMethod::Options,
            "POST" => HttpRequestMethod::Post,
            _ => {
                error!("[ID{}]不支持的HTTP请求方法：{}", id, &method_str);
                return Err(Exception::UnSupportedRequestMethod);
            }
        };

        let version_str = first_line_parts.last().unwrap().to_uppercase();
        let version = match version_str.as_str() {
            "HTTP/1.1" => HttpVersion::V1_1,
            _ => {
                error!("[ID{}]不支持的HTTP协议版本：{}", id, &version_str);
                return Err(Exception::UnsupportedHttpVersion);
            }
        };

        // 路径中可能包含空格（不规范但常见），通过 join 尝试恢复
        let path = if first_line_parts.len() == 3 {
            first_line_parts[1].to_string()
        } else {
            first_line_parts[1..first_line_parts.len() - 1].join(" ")
        };

        // 3. 提取标头
        let user_agent = header_value(&request_lines, "User-Agent")
            .unwrap_or("")
            .to_string();

        // Accept 缺省时采用浏览器语义的兜底偏好
        let accept_raw = header_value(&request_lines, "Accept").unwrap_or("");
        let accept_raw = if accept_raw.is_empty() {
            DEFAULT_ACCEPT
        } else {
            accept_raw
        };
        let accept = parse_accept(accept_raw, AcceptKind::Mime, cache.as_deref_mut());

        // Accept-Language 缺省时全开放（空偏好列表对任何值都返回 1.0）
        let language_raw = header_value(&request_lines, "Accept-Language").unwrap_or("");
        let accept_language = if language_raw.is_empty() {
            Accept::from_entries(vec![], AcceptKind::Language)
        } else {
            parse_accept(language_raw, AcceptKind::Language, cache.as_deref_mut())
        };

        // 4. 解析 Accept-Encoding 标头（只要包含关键词即视为支持）
        let mut accept_encoding = vec![];
        if let Some(encoding) = header_value(&request_lines, "Accept-Encoding") {
            if encoding.contains("gzip") {
                accept_encoding.push(HttpEncoding::Gzip);
            }
            if encoding.contains("deflate") {
                accept_encoding.push(HttpEncoding::Deflate);
            }
            if encoding.contains("br") {
                accept_encoding.push(HttpEncoding::Br);
            }
        }

        Ok(Self {
            method,
            path,
            version,
            user_agent,
            accept_encoding,
            accept,
            accept_language,
        })
    }
}

// --- Getter 访问器实现 ---

impl Request {
    /// 获取 HTTP 协议版本
    pub fn version(&self) -> &HttpVersion {
        &self.version
    }

    /// 获取请求路径（含查询参数）
    pub fn path(&self) -> &str {
        &self.path
    }

    /// 获取请求方法
    pub fn method(&self) -> HttpRequestMethod {
        self.method
    }

    /// 获取用户代理字符串
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// 获取客户端支持的压缩算法列表
    pub fn accept_encoding(&self) -> &Vec<HttpEncoding> {
        &self.accept_encoding
    }

    /// 获取客户端的 MIME 偏好
    pub fn accept(&self) -> &Accept {
        &self.accept
    }

    /// 获取客户端的语言偏好
    pub fn accept_language(&self) -> &Accept {
        &self.accept_language
    }
}
