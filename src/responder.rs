// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 响应输出模块
//!
//! [`Responder`] 是请求处理的最后一环，负责把管线产出的 `ProcessResult`
//! 变成一个完整的 HTTP 响应报文：
//! 1. 管线没有产出响应时合成 500 错误响应。
//! 2. 内容协商：在响应声明的 MIME 候选中，选取**第一个**被客户端接受的
//!    类型（按服务端声明顺序，不做权重重排）；全部被拒时降级为 406。
//! 3. 调用响应的 `transform` 钩子，允许其按协商结果重写自身；
//!    转换失败可恢复，记录日志后继续使用原响应。
//! 4. 合并分层响应头、渲染 Set-Cookie、校验状态码、可选压缩，
//!    最后经由 [`OutputSink`] 一次性写出。

use std::collections::HashMap;
use std::io::Write;

use log::{error, warn};

use crate::config::Config;
use crate::cookie::Cookie;
use crate::exception::Exception;
use crate::param::{is_text_mime, CRLF, SERVER_NAME};
use crate::request::Request;
use crate::response::{status_reason, ErrorResponse, Response};
use crate::result::ProcessResult;
use crate::util::{compress, decide_encoding, should_skip_compression};

/// 合法状态码区间。越界视为编程错误，强制纠正为 500。
const STATUS_MIN: u16 = 100;
const STATUS_MAX: u16 = 599;

/// 对底层输出流的一层薄包装，跟踪响应头是否已经写出。
///
/// 头部只能发送一次。一旦头部落到线路上，本次响应的状态码和
/// 头部集合就再也无法更改。
pub struct OutputSink<W: Write> {
    writer: W,
    headers_sent: bool,
}

impl<W: Write> OutputSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            headers_sent: false,
        }
    }

    /// 头部是否已经写出
    pub fn headers_sent(&self) -> bool {
        self.headers_sent
    }

    /// 取回底层输出流（测试与连接收尾用）
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// 一次性写出完整响应：状态行、头部（按名称排序）、Cookie、正文。
    ///
    /// 头部按名称排序以保证报文字节稳定，方便测试与抓包比对。
    pub fn send(
        &mut self,
        status: u16,
        headers: &HashMap<String, String>,
        cookies: &[&Cookie],
        body: &[u8],
    ) -> Result<(), Exception> {
        if self.headers_sent {
            error!("响应头已发送，状态行与头部无法再次写出，正文仍将写出");
            self.writer.write_all(body)?;
            self.writer.flush()?;
            return Ok(());
        }

        let mut head = String::new();
        head.push_str(&format!("HTTP/1.1 {} {}", status, status_reason(status)));
        head.push_str(CRLF);

        let mut names: Vec<&String> = headers.keys().collect();
        names.sort();
        for name in names {
            head.push_str(&format!("{}: {}{}", name, headers[name], CRLF));
        }

        let mut cookies: Vec<&&Cookie> = cookies.iter().collect();
        cookies.sort_by(|a, b| a.name().cmp(b.name()));
        for cookie in cookies {
            head.push_str(&format!("Set-Cookie: {}{}", cookie.header_value(), CRLF));
        }
        head.push_str(CRLF);

        self.writer.write_all(head.as_bytes())?;
        self.headers_sent = true;
        self.writer.write_all(body)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// 响应输出器。无状态，可被多个请求线程共享。
pub struct Responder {
    /// 响应未声明任何 MIME 候选时采用的默认类型
    default_mime: String,
    /// 是否启用输出压缩（仍受客户端编码协商与 MIME 类型约束）
    enable_compression: bool,
}

impl Responder {
    pub fn new(default_mime: &str, enable_compression: bool) -> Self {
        Self {
            default_mime: default_mime.to_string(),
            enable_compression,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.default_mime(), config.enable_compression())
    }

    /// 把管线结果写出为完整的 HTTP 响应。
    ///
    /// 返回 `Err` 仅发生在输出流本身故障时；协商失败、转换失败、
    /// 状态码非法等都在内部降级处理，不会中断输出。
    pub fn respond<W: Write>(
        &self,
        request: &Request,
        mut result: ProcessResult,
        sink: &mut OutputSink<W>,
    ) -> Result<(), Exception> {
        // 处理器散落的输出不属于响应正文，排空并记入日志
        let stray = result.take_buffer();
        if !stray.is_empty() {
            warn!("处理器产生了散落输出（不会下发给客户端）：{}", stray);
        }

        let mut response: Box<dyn Response> = match result.take_response() {
            Some(response) => response,
            None => {
                error!("处理管线未产出任何响应，合成500错误响应");
                Box::new(ErrorResponse::internal("No output produced"))
            }
        };

        // 内容协商：候选按服务端声明顺序，取第一个被客户端接受的
        let mut candidates = response.mime_types();
        if candidates.is_empty() {
            candidates.push(self.default_mime.clone());
        }
        let accept = request.accept();
        let mime = match candidates.iter().find(|c| accept.accepts(c) > 0.0) {
            Some(mime) => mime.clone(),
            None => {
                warn!("内容协商失败：候选{:?}均被客户端拒绝，降级为406", candidates);
                response = Box::new(ErrorResponse::not_acceptable());
                "text/html".to_string()
            }
        };

        // 转换钩子：响应可按协商出的 MIME 重写自身。失败可恢复。
        match response.transform(&mime) {
            Ok(Some(transformed)) => response = transformed,
            Ok(None) => {}
            Err(e) => {
                error!("响应转换失败：{}，继续使用原响应", e);
            }
        }

        // 放回 Result，让分层头合并能看到响应自带的头与缓存策略
        result.set_response(response);

        // 状态码校验。越界是编程错误，纠正为 500 并记录
        let mut status = result
            .response()
            .map(|r| r.status_code())
            .unwrap_or(500);
        if !(STATUS_MIN..=STATUS_MAX).contains(&status) {
            error!("非法HTTP状态码：{}，强制纠正为500", status);
            status = 500;
        }

        let content_type = if is_text_mime(&mime) {
            format!("{}; charset=utf-8", mime)
        } else {
            mime.clone()
        };
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), content_type);
        headers.insert("Server".to_string(), SERVER_NAME.to_string());
        // 分层头在协商结果之后合并，响应显式声明的 Content-Type 优先
        for (name, value) in result.all_headers() {
            headers.insert(name, value);
        }

        // 渲染正文。这里 take 不可能失败，上面刚刚 set 过
        let mut body: Vec<u8> = Vec::new();
        if let Some(mut response) = result.take_response() {
            response.output(&mime, &mut body)?;
        }

        // 输出压缩：需要配置开启、客户端声明支持且 MIME 可压缩
        if self.enable_compression && !body.is_empty() && !should_skip_compression(&mime) {
            if let Some(encoding) = decide_encoding(request.accept_encoding()) {
                body = compress(body, Some(encoding))?;
                headers.insert("Content-Encoding".to_string(), encoding.to_string());
            }
        }

        // X-Sendfile 模式下 Content-Length 描述的是被委托的文件而非本报文
        if !headers.contains_key("X-Sendfile") {
            headers.insert("Content-Length".to_string(), body.len().to_string());
        }

        sink.send(status, &headers, &result.cookies(), &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache_policy::{CachePolicy, CacheVisibility};
    use crate::response::StringResponse;
    use serde_json::Value;

    fn request_with(headers: &str) -> Request {
        let raw = format!("GET / HTTP/1.1\r\nHost: x\r\n{}\r\n", headers);
        Request::try_from(&raw.as_bytes().to_vec(), 0).unwrap()
    }

    fn respond_to(responder: &Responder, request: &Request, result: ProcessResult) -> Vec<u8> {
        let mut sink = OutputSink::new(Vec::new());
        responder.respond(request, result, &mut sink).unwrap();
        sink.into_inner()
    }

    /// 把响应报文拆成（状态行, 头部表, 正文字节）
    fn parse_response(raw: &[u8]) -> (String, HashMap<String, String>, Vec<u8>) {
        let split = raw
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .expect("response has no header terminator");
        let head = String::from_utf8(raw[..split].to_vec()).unwrap();
        let body = raw[split + 4..].to_vec();

        let mut lines = head.split(CRLF);
        let status_line = lines.next().unwrap().to_string();
        let mut headers = HashMap::new();
        for line in lines {
            if let Some((name, value)) = line.split_once(": ") {
                headers.insert(name.to_string(), value.to_string());
            }
        }
        (status_line, headers, body)
    }

    #[test]
    fn test_basic_string_response() {
        let responder = Responder::new("text/html", false);
        let request = request_with("Accept: text/html\r\n");
        let mut result = ProcessResult::new();
        result.set_response(Box::new(StringResponse::new("hello")));

        let raw = respond_to(&responder, &request, result);
        let (status_line, headers, body) = parse_response(&raw);

        assert_eq!(status_line, "HTTP/1.1 200 OK");
        assert_eq!(headers.get("Content-Type").unwrap(), "text/html; charset=utf-8");
        assert_eq!(headers.get("Content-Length").unwrap(), "5");
        assert_eq!(headers.get("Server").unwrap(), SERVER_NAME);
        assert_eq!(body, b"hello");
    }

    /// 协商取第一个被接受的候选，不按客户端权重重排
    #[test]
    fn test_first_declared_accepted_wins() {
        let responder = Responder::new("text/html", false);
        // 客户端更偏好 json，但响应先声明 plain 且 plain 被接受
        let request = request_with("Accept: application/json;q=1.0,text/plain;q=0.1\r\n");
        let mut result = ProcessResult::new();
        result.set_response(Box::new(StringResponse::with_mimes(
            "x",
            vec!["text/plain".to_string(), "application/json".to_string()],
        )));

        let raw = respond_to(&responder, &request, result);
        let (_, headers, _) = parse_response(&raw);

        assert_eq!(headers.get("Content-Type").unwrap(), "text/plain; charset=utf-8");
    }

    /// 全部候选被拒绝时降级为 406，以 HTML 错误页写出
    #[test]
    fn test_negotiation_failure_406() {
        let responder = Responder::new("text/html", false);
        let request = request_with("Accept: image/png\r\n");
        let mut result = ProcessResult::new();
        result.set_response(Box::new(StringResponse::with_mimes(
            "x",
            vec!["text/plain".to_string()],
        )));

        let raw = respond_to(&responder, &request, result);
        let (status_line, headers, body) = parse_response(&raw);

        assert_eq!(status_line, "HTTP/1.1 406 Not Acceptable");
        assert_eq!(headers.get("Content-Type").unwrap(), "text/html; charset=utf-8");
        assert!(String::from_utf8(body).unwrap().contains("406"));
    }

    /// 管线没有产出响应时合成 500
    #[test]
    fn test_missing_response_becomes_500() {
        let responder = Responder::new("text/html", false);
        let request = request_with("");
        let result = ProcessResult::new();

        let raw = respond_to(&responder, &request, result);
        let (status_line, _, body) = parse_response(&raw);

        assert_eq!(status_line, "HTTP/1.1 500 Internal Server Error");
        assert!(String::from_utf8(body).unwrap().contains("500"));
    }

    /// 错误响应按协商结果转换为 JSON
    #[test]
    fn test_error_transforms_to_json() {
        let responder = Responder::new("text/html", false);
        let request = request_with("Accept: application/json\r\n");
        let mut result = ProcessResult::new();
        result.set_response(Box::new(ErrorResponse::new(404, "missing")));

        let raw = respond_to(&responder, &request, result);
        let (status_line, headers, body) = parse_response(&raw);

        assert_eq!(status_line, "HTTP/1.1 404 Not Found");
        assert_eq!(
            headers.get("Content-Type").unwrap(),
            "application/json; charset=utf-8"
        );
        let parsed: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["status"], 404);
        assert_eq!(parsed["error"], "missing");
    }

    /// 越界状态码被纠正为 500
    #[test]
    fn test_invalid_status_coerced() {
        let responder = Responder::new("text/html", false);
        let request = request_with("Accept: text/html\r\n");
        let mut result = ProcessResult::new();
        let mut response = StringResponse::new("x");
        response.set_status(777);
        result.set_response(Box::new(response));

        let raw = respond_to(&responder, &request, result);
        let (status_line, _, _) = parse_response(&raw);

        assert_eq!(status_line, "HTTP/1.1 500 Internal Server Error");
    }

    /// Cookie 渲染为 Set-Cookie 行
    #[test]
    fn test_cookies_emitted() {
        let responder = Responder::new("text/html", false);
        let request = request_with("Accept: text/html\r\n");
        let mut result = ProcessResult::new();
        result.set_response(Box::new(StringResponse::new("x")));
        result.add_cookie(Cookie::new("session", "abc"));

        let raw = respond_to(&responder, &request, result);
        let head = String::from_utf8(raw).unwrap();

        assert!(head.contains("Set-Cookie: session=abc; Path=/"));
    }

    /// 默认缓存策略（禁用）的头出现在报文中
    #[test]
    fn test_default_cache_headers_present() {
        let responder = Responder::new("text/html", false);
        let request = request_with("Accept: text/html\r\n");
        let mut result = ProcessResult::new();
        result.set_response(Box::new(StringResponse::new("x")));

        let raw = respond_to(&responder, &request, result);
        let (_, headers, _) = parse_response(&raw);

        assert_eq!(headers.get("Cache-Control").unwrap(), "no-cache");
        assert_eq!(headers.get("Pragma").unwrap(), "no-cache");
    }

    /// 响应自带的缓存策略覆盖默认策略
    #[test]
    fn test_response_cache_policy_applied() {
        let responder = Responder::new("text/html", false);
        let request = request_with("Accept: text/html\r\n");
        let mut result = ProcessResult::new();
        let mut response = StringResponse::new("x");
        let mut policy = CachePolicy::new(CacheVisibility::Public);
        policy.set_expire_seconds(60);
        response.set_cache_policy(policy);
        result.set_response(Box::new(response));

        let raw = respond_to(&responder, &request, result);
        let (_, headers, _) = parse_response(&raw);

        assert_eq!(headers.get("Cache-Control").unwrap(), "public, max-age=60");
    }

    /// 开启压缩且客户端支持 gzip 时，正文被压缩并标注 Content-Encoding
    #[test]
    fn test_compression_applied() {
        let responder = Responder::new("text/html", true);
        let request = request_with("Accept: text/html\r\nAccept-Encoding: gzip\r\n");
        let mut result = ProcessResult::new();
        let body_text = "compressible ".repeat(50);
        result.set_response(Box::new(StringResponse::new(&body_text)));

        let raw = respond_to(&responder, &request, result);
        let (_, headers, body) = parse_response(&raw);

        assert_eq!(headers.get("Content-Encoding").unwrap(), "gzip");
        assert_eq!(&body[0..2], &[0x1f, 0x8b]);
        assert_eq!(
            headers.get("Content-Length").unwrap(),
            &body.len().to_string()
        );
    }

    /// 客户端不支持压缩时正文原样写出
    #[test]
    fn test_compression_skipped_without_client_support() {
        let responder = Responder::new("text/html", true);
        let request = request_with("Accept: text/html\r\n");
        let mut result = ProcessResult::new();
        result.set_response(Box::new(StringResponse::new("plain body")));

        let raw = respond_to(&responder, &request, result);
        let (_, headers, body) = parse_response(&raw);

        assert!(headers.get("Content-Encoding").is_none());
        assert_eq!(body, b"plain body");
    }

    /// 转换钩子失败是可恢复错误：记录日志后继续使用原响应
    #[test]
    fn test_transform_failure_recovers() {
        struct BrokenTransform;
        impl Response for BrokenTransform {
            fn mime_types(&self) -> Vec<String> {
                vec!["text/plain".to_string()]
            }
            fn transform(
                &self,
                _mime: &str,
            ) -> Result<Option<Box<dyn Response>>, Exception> {
                Err(Exception::TransformFailed("broken".to_string()))
            }
            fn output(
                &mut self,
                _mime: &str,
                out: &mut dyn std::io::Write,
            ) -> Result<(), Exception> {
                out.write_all(b"original")?;
                Ok(())
            }
        }

        let responder = Responder::new("text/html", false);
        let request = request_with("Accept: text/plain\r\n");
        let mut result = ProcessResult::new();
        result.set_response(Box::new(BrokenTransform));

        let raw = respond_to(&responder, &request, result);
        let (status_line, _, body) = parse_response(&raw);

        assert_eq!(status_line, "HTTP/1.1 200 OK");
        assert_eq!(body, b"original");
    }

    /// 响应未声明 MIME 候选时采用配置的默认类型
    #[test]
    fn test_empty_mime_candidates_use_default() {
        struct NoMimes;
        impl Response for NoMimes {
            fn mime_types(&self) -> Vec<String> {
                vec![]
            }
            fn output(
                &mut self,
                _mime: &str,
                out: &mut dyn std::io::Write,
            ) -> Result<(), Exception> {
                out.write_all(b"x")?;
                Ok(())
            }
        }

        let responder = Responder::new("text/plain", false);
        let request = request_with("Accept: text/plain\r\n");
        let mut result = ProcessResult::new();
        result.set_response(Box::new(NoMimes));

        let raw = respond_to(&responder, &request, result);
        let (_, headers, _) = parse_response(&raw);

        assert_eq!(headers.get("Content-Type").unwrap(), "text/plain; charset=utf-8");
    }

    /// 散落输出被排空，不会混入响应正文
    #[test]
    fn test_stray_buffer_not_in_body() {
        let responder = Responder::new("text/html", false);
        let request = request_with("Accept: text/html\r\n");
        let mut result = ProcessResult::new();
        result.echo("debug junk");
        result.set_response(Box::new(StringResponse::new("clean")));

        let raw = respond_to(&responder, &request, result);
        let (_, _, body) = parse_response(&raw);

        assert_eq!(body, b"clean");
    }

    /// 头部只能发送一次：重复发送不是致命错误，状态行与头部保持
    /// 首次写出的内容，但后续正文仍会写出
    #[test]
    fn test_sink_double_send_keeps_head_but_writes_body() {
        let mut sink = OutputSink::new(Vec::new());
        let headers = HashMap::new();

        sink.send(200, &headers, &[], b"first").unwrap();
        assert!(sink.headers_sent());

        sink.send(500, &headers, &[], b"second").unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert!(out.starts_with("HTTP/1.1 200 OK"));
        assert!(!out.contains("500"));
        assert_eq!(out.matches("HTTP/1.1").count(), 1);
        assert!(out.ends_with("firstsecond"));
    }

    /// 结果中显式声明的 Content-Type 覆盖协商出的类型
    #[test]
    fn test_declared_content_type_overrides_negotiated() {
        let responder = Responder::new("text/html", false);
        let request = request_with("Accept: text/html\r\n");
        let mut result = ProcessResult::new();
        result.set_header("Content-Type", "text/html; charset=gbk");
        result.set_response(Box::new(StringResponse::new("x")));

        let raw = respond_to(&responder, &request, result);
        let (_, headers, _) = parse_response(&raw);

        assert_eq!(headers.get("Content-Type").unwrap(), "text/html; charset=gbk");
    }
}
