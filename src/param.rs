// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 协议参数与常量模块
//!
//! 该模块定义了 `webcore` 请求处理核心遵循的 HTTP 协议相关常量和数据结构，包括：
//! - 常见的 HTTP 状态码及其原因短语（Reason Phrase）。
//! - 内容协商所需的 MIME 映射表与快捷名称表。
//! - HTTP 方法、版本及编码格式的强类型枚举。

use lazy_static::lazy_static;
use std::collections::HashMap;

/// 框架名称标识，可由上层写入响应头的 `Server` 字段
pub const SERVER_NAME: &str = "shaneyale-webcore";

/// HTTP 协议规定的换行符（Carriage Return Line Feed）
pub const CRLF: &str = "\r\n";

/// 客户端未携带 `Accept` 头时采用的默认偏好列表。
///
/// 浏览器语义下的兜底：优先 HTML，其余类型以 0.9 的权重全部放行。
pub const DEFAULT_ACCEPT: &str = "text/html;q=1.0,*/*;q=0.9";

lazy_static! {
    /// HTTP 状态码与其对应的标准原因短语映射表。
    ///
    /// 参考标准：[RFC 9110: HTTP Semantics](https://www.rfc-editor.org/rfc/rfc9110.html)。
    pub static ref STATUS_CODES: HashMap<u16, &'static str> = {
        let mut map = HashMap::new();
        // 1xx: 信息响应 (Informational)
        map.insert(100, "Continue");
        map.insert(101, "Switching Protocols");

        // 2xx: 成功响应 (Successful)
        map.insert(200, "OK");
        map.insert(201, "Created");
        map.insert(202, "Accepted");
        map.insert(203, "Non-Authoritative Information");
        map.insert(204, "No Content");
        map.insert(205, "Reset Content");
        map.insert(206, "Partial Content");

        // 3xx: 重定向 (Redirection)
        map.insert(300, "Multiple Choices");
        map.insert(301, "Moved Permanently");
        map.insert(302, "Found");
        map.insert(303, "See Other");
        map.insert(304, "Not Modified");
        map.insert(307, "Temporary Redirect");
        map.insert(308, "Permanent Redirect");

        // 4xx: 客户端错误 (Client Error)
        map.insert(400, "Bad Request");
        map.insert(401, "Unauthorized");
        map.insert(403, "Forbidden");
        map.insert(404, "Not Found");
        map.insert(405, "Method Not Allowed");
        map.insert(406, "Not Acceptable");
        map.insert(408, "Request Timeout");
        map.insert(409, "Conflict");
        map.insert(410, "Gone");
        map.insert(411, "Length Required");
        map.insert(412, "Precondition Failed");
        map.insert(413, "Content Too Large");
        map.insert(414, "URI Too Long");
        map.insert(415, "Unsupported Media Type");
        map.insert(416, "Range Not Satisfiable");
        map.insert(417, "Expectation Failed");
        map.insert(418, "I'm a teapot");
        map.insert(422, "Unprocessable Content");
        map.insert(426, "Upgrade Required");

        // 5xx: 服务端错误 (Server Error)
        map.insert(500, "Internal Server Error");
        map.insert(501, "Not Implemented");
        map.insert(502, "Bad Gateway");
        map.insert(503, "Service Unavailable");
        map.insert(504, "Gateway Timeout");
        map.insert(505, "HTTP Version Not Supported");
        map
    };
}

lazy_static! {
    /// 文件后缀名到 MIME 类型（Media Type）的映射表。
    ///
    /// 用于 `FileResponse` 在未显式指定类型时根据扩展名声明自身的候选 MIME。
    pub static ref MIME_TYPES: HashMap<&'static str, &'static str> = {
        let mut map = HashMap::new();
        map.insert("avif", "image/avif");
        map.insert("bin", "application/octet-stream");
        map.insert("bmp", "image/bmp");
        map.insert("css", "text/css");
        map.insert("csv", "text/csv");
        map.insert("gif", "image/gif");
        map.insert("gz", "application/gzip");
        map.insert("htm", "text/html");
        map.insert("html", "text/html");
        map.insert("ico", "image/x-icon");
        map.insert("jpeg", "image/jpeg");
        map.insert("jpg", "image/jpeg");
        map.insert("js", "text/javascript");
        map.insert("json", "application/json");
        map.insert("mp3", "audio/mpeg");
        map.insert("mp4", "video/mp4");
        map.insert("otf", "font/otf");
        map.insert("pdf", "application/pdf");
        map.insert("png", "image/png");
        map.insert("svg", "image/svg+xml");
        map.insert("tar", "application/x-tar");
        map.insert("tiff", "image/tiff");
        map.insert("ttf", "font/ttf");
        map.insert("txt", "text/plain");
        map.insert("wasm", "application/wasm");
        map.insert("wav", "audio/wav");
        map.insert("webm", "video/webm");
        map.insert("webp", "image/webp");
        map.insert("woff", "font/woff");
        map.insert("woff2", "font/woff2");
        map.insert("xhtml", "application/xhtml+xml");
        map.insert("xml", "application/xml");
        map.insert("zip", "application/zip");
        // 兜底类型（通常用于无法识别后缀的二进制流）
        map.insert("_", "application/octet-stream");
        map
    };
}

lazy_static! {
    /// 纯文本家族的 MIME 类型。
    ///
    /// 命中该集合的响应在写出 `Content-Type` 时追加 `; charset=utf-8`。
    pub static ref TEXT_MIMES: Vec<&'static str> = {
        vec![
            "text/html",
            "text/plain",
            "text/css",
            "text/csv",
            "text/javascript",
            "text/xml",
            "application/json",
            "application/xml",
            "application/javascript",
            "application/xhtml+xml",
        ]
    };
}

lazy_static! {
    /// MIME 快捷名称表。
    ///
    /// 上层可以用 `json`、`html`
    /// 之类的短名称查询客户端的接受度，而不必写全 MIME 字符串。
    pub static ref MIME_SHORTCUTS: HashMap<&'static str, &'static str> = {
        let mut map = HashMap::new();
        map.insert("atom", "application/atom+xml");
        map.insert("css", "text/css");
        map.insert("csv", "text/csv");
        map.insert("html", "text/html");
        map.insert("javascript", "application/javascript");
        map.insert("js", "application/javascript");
        map.insert("json", "application/json");
        map.insert("rss", "application/rss+xml");
        map.insert("text", "text/plain");
        map.insert("txt", "text/plain");
        map.insert("xhtml", "application/xhtml+xml");
        map.insert("xml", "application/xml");
        map
    };
}

/// 判断给定 MIME 是否属于纯文本家族（需要追加 charset 标注）
pub fn is_text_mime(mime: &str) -> bool {
    TEXT_MIMES.iter().any(|t| t.eq_ignore_ascii_case(mime))
}

/// 支持的 HTTP 协议版本
#[derive(Debug, Clone, Copy)]
pub enum HttpVersion {
    /// HTTP/1.1 版本
    V1_1,
}

/// 标准 HTTP 请求方法
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HttpRequestMethod {
    /// 获取资源
    Get,
    /// 获取资源的元数据（不包含响应体）
    Head,
    /// 查询服务器支持的选项
    Options,
    /// 提交数据或执行操作
    Post,
}

/// 支持的内容编码（压缩）格式
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HttpEncoding {
    /// GNU zip 压缩
    Gzip,
    /// zlib 压缩
    Deflate,
    /// Brotli 压缩
    Br,
}

use std::fmt;

impl fmt::Display for HttpVersion {
    /// 将枚举格式化为 HTTP 报文中的版本字符串
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HttpVersion::V1_1 => write!(f, "1.1"),
        }
    }
}

impl fmt::Display for HttpRequestMethod {
    /// 将枚举格式化为 HTTP 标准大写方法名
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HttpRequestMethod::Get => write!(f, "GET"),
            HttpRequestMethod::Head => write!(f, "HEAD"),
            HttpRequestMethod::Options => write!(f, "OPTIONS"),
            HttpRequestMethod::Post => write!(f, "POST"),
        }
    }
}

impl fmt::Display for HttpEncoding {
    /// 将枚举格式化为 `Content-Encoding` 头所使用的标识符
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HttpEncoding::Gzip => write!(f, "gzip"),
            HttpEncoding::Deflate => write!(f, "deflate"),
            HttpEncoding::Br => write!(f, "br"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_common() {
        assert_eq!(STATUS_CODES.get(&200), Some(&"OK"));
        assert_eq!(STATUS_CODES.get(&406), Some(&"Not Acceptable"));
        assert_eq!(STATUS_CODES.get(&500), Some(&"Internal Server Error"));
    }

    #[test]
    fn test_mime_types_lookup() {
        assert_eq!(MIME_TYPES.get("json"), Some(&"application/json"));
        assert_eq!(MIME_TYPES.get("_"), Some(&"application/octet-stream"));
    }

    #[test]
    fn test_is_text_mime() {
        assert!(is_text_mime("text/html"));
        assert!(is_text_mime("APPLICATION/JSON"));
        assert!(!is_text_mime("image/png"));
    }

    #[test]
    fn test_mime_shortcuts() {
        assert_eq!(MIME_SHORTCUTS.get("json"), Some(&"application/json"));
        assert_eq!(MIME_SHORTCUTS.get("html"), Some(&"text/html"));
    }

    #[test]
    fn test_encoding_display() {
        assert_eq!(HttpEncoding::Gzip.to_string(), "gzip");
        assert_eq!(HttpEncoding::Br.to_string(), "br");
    }
}
