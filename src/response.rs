// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 响应模块
//!
//! 该模块定义了输出单元的统一抽象 [`Response`] 及其各种实现：
//! - [`StringResponse`]：已渲染好的文本内容。
//! - [`DataResponse`]：结构化数据，经由外部 [`DataWriter`] 序列化。
//! - [`FileResponse`] / [`FileHandleResponse`]：字节直通。
//! - [`RedirectResponse`]：重定向（`Location` 或 `Refresh`）。
//! - [`ErrorResponse`]：错误占位，可按协商出的 MIME 重写自身。
//!
//! 一个 Response 的生命周期：由应用代码构造，可能被 Responder 按协商结果
//! 转换为另一种 Response，最终被 `output` 恰好消费一次。

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::PathBuf;

use bytes::Bytes;
use serde_json::Value;

use crate::cache_policy::CachePolicy;
use crate::exception::Exception;
use crate::param::{MIME_TYPES, STATUS_CODES};
use crate::util::HtmlBuilder;

/// 输出单元的统一能力接口。
///
/// 实现者声明自己能产出的 MIME 候选（按服务端偏好排列）、附加头、
/// 状态码与可选的缓存策略，并在 `output` 中把协商出的 MIME 对应的
/// 字节写入输出流。
pub trait Response: Send {
    /// 本响应能产出的 MIME 类型，按服务端声明的偏好顺序排列。
    /// 返回空列表表示「由 Responder 决定默认类型」。
    fn mime_types(&self) -> Vec<String>;

    /// 本响应要求附加的响应头。计算失败是可恢复错误：
    /// Responder 会记录日志并以已合并的部分头继续。
    fn headers(&self) -> Result<HashMap<String, String>, Exception> {
        Ok(HashMap::new())
    }

    /// HTTP 状态码
    fn status_code(&self) -> u16 {
        200
    }

    /// 本响应自带的缓存策略，优先于 `ProcessResult` 自身的策略
    fn cache_policy(&self) -> Option<&CachePolicy> {
        None
    }

    /// 按协商出的 MIME 把自身重写为另一种响应（如错误页转 JSON）。
    /// 返回 `Ok(None)` 表示不需要转换。转换失败是可恢复错误。
    fn transform(&self, _mime: &str) -> Result<Option<Box<dyn Response>>, Exception> {
        Ok(None)
    }

    /// 将协商出的 MIME 对应的字节写入输出流。
    /// 这是本核心中唯一会执行阻塞 I/O 的位置。
    fn output(&mut self, mime: &str, out: &mut dyn Write) -> Result<(), Exception>;
}

/// 查询状态码的标准原因短语
pub fn status_reason(code: u16) -> &'static str {
    STATUS_CODES.get(&code).copied().unwrap_or("Unknown")
}

// --- StringResponse ---

/// 已渲染为文本的响应内容
pub struct StringResponse {
    body: String,
    status: u16,
    mimes: Vec<String>,
    headers: HashMap<String, String>,
    cache_policy: Option<CachePolicy>,
}

impl StringResponse {
    pub fn new(body: &str) -> Self {
        Self {
            body: body.to_string(),
            status: 200,
            mimes: vec!["text/html".to_string()],
            headers: HashMap::new(),
            cache_policy: None,
        }
    }

    /// 指定本响应声明的 MIME 候选
    pub fn with_mimes(body: &str, mimes: Vec<String>) -> Self {
        let mut response = Self::new(body);
        response.mimes = mimes;
        response
    }

    pub fn set_status(&mut self, status: u16) -> &mut Self {
        self.status = status;
        self
    }

    pub fn set_header(&mut self, name: &str, value: &str) -> &mut Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn set_cache_policy(&mut self, policy: CachePolicy) -> &mut Self {
        self.cache_policy = Some(policy);
        self
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

impl Response for StringResponse {
    fn mime_types(&self) -> Vec<String> {
        self.mimes.clone()
    }

    fn headers(&self) -> Result<HashMap<String, String>, Exception> {
        Ok(self.headers.clone())
    }

    fn status_code(&self) -> u16 {
        self.status
    }

    fn cache_policy(&self) -> Option<&CachePolicy> {
        self.cache_policy.as_ref()
    }

    fn output(&mut self, _mime: &str, out: &mut dyn Write) -> Result<(), Exception> {
        out.write_all(self.body.as_bytes())?;
        Ok(())
    }
}

// --- DataResponse ---

/// 结构化数据的序列化器。`DataResponse` 自身不关心数据如何变成字节，
/// 由外部 Writer 决定格式（JSON、XML 等）。
pub trait DataWriter: Send {
    /// 该 Writer 能产出的 MIME 类型
    fn mime_types(&self) -> Vec<String>;

    /// 将数据写入输出流
    fn write(&self, data: &Value, mime: &str, out: &mut dyn Write) -> Result<(), Exception>;
}

/// 基于 serde_json 的默认 Writer
pub struct JsonWriter;

impl DataWriter for JsonWriter {
    fn mime_types(&self) -> Vec<String> {
        vec!["application/json".to_string()]
    }

    fn write(&self, data: &Value, _mime: &str, out: &mut dyn Write) -> Result<(), Exception> {
        serde_json::to_writer(&mut *out, data)
            .map_err(|e| Exception::OutputFailed(e.to_string()))?;
        Ok(())
    }
}

/// 携带结构化数据的响应，输出时交由 [`DataWriter`] 序列化
pub struct DataResponse {
    data: Value,
    writer: Box<dyn DataWriter>,
    status: u16,
    cache_policy: Option<CachePolicy>,
}

impl DataResponse {
    /// 以默认的 JSON Writer 构造
    pub fn new(data: Value) -> Self {
        Self::with_writer(data, Box::new(JsonWriter))
    }

    pub fn with_writer(data: Value, writer: Box<dyn DataWriter>) -> Self {
        Self {
            data,
            writer,
            status: 200,
            cache_policy: None,
        }
    }

    pub fn set_status(&mut self, status: u16) -> &mut Self {
        self.status = status;
        self
    }

    pub fn set_cache_policy(&mut self, policy: CachePolicy) -> &mut Self {
        self.cache_policy = Some(policy);
        self
    }

    pub fn data(&self) -> &Value {
        &self.data
    }
}

impl Response for DataResponse {
    fn mime_types(&self) -> Vec<String> {
        self.writer.mime_types()
    }

    fn status_code(&self) -> u16 {
        self.status
    }

    fn cache_policy(&self) -> Option<&CachePolicy> {
        self.cache_policy.as_ref()
    }

    fn output(&mut self, mime: &str, out: &mut dyn Write) -> Result<(), Exception> {
        self.writer.write(&self.data, mime, out)
    }
}

// --- FileResponse ---

/// 磁盘文件的字节直通响应。
///
/// 可选地通过 `X-Sendfile` 把实际传输委托给前端服务器，此时 `output`
/// 不写出任何字节。
pub struct FileResponse {
    path: PathBuf,
    file_name: Option<String>,
    download: bool,
    x_sendfile: bool,
    mime_override: Option<String>,
}

impl FileResponse {
    pub fn new(path: &str) -> Self {
        Self {
            path: PathBuf::from(path),
            file_name: None,
            download: false,
            x_sendfile: false,
            mime_override: None,
        }
    }

    /// 作为附件下发（`Content-Disposition: download`）
    pub fn set_download(&mut self, download: bool) -> &mut Self {
        self.download = download;
        self
    }

    /// 指定下发给客户端的文件名
    pub fn set_file_name(&mut self, name: &str) -> &mut Self {
        self.file_name = Some(name.to_string());
        self
    }

    /// 委托前端服务器传输文件
    pub fn set_x_sendfile(&mut self, enabled: bool) -> &mut Self {
        self.x_sendfile = enabled;
        self
    }

    pub fn set_mime(&mut self, mime: &str) -> &mut Self {
        self.mime_override = Some(mime.to_string());
        self
    }

    /// 下发文件名：显式指定优先，否则取路径末段
    fn effective_name(&self) -> String {
        match &self.file_name {
            Some(name) => name.clone(),
            None => self
                .path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
        }
    }
}

impl Response for FileResponse {
    fn mime_types(&self) -> Vec<String> {
        if let Some(mime) = &self.mime_override {
            return vec![mime.clone()];
        }
        let extension = self
            .path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let mime = MIME_TYPES
            .get(extension.as_str())
            .or_else(|| MIME_TYPES.get("_"))
            .copied()
            .unwrap_or("application/octet-stream");
        vec![mime.to_string()]
    }

    fn headers(&self) -> Result<HashMap<String, String>, Exception> {
        let mut headers = HashMap::new();
        let disposition = if self.download { "download" } else { "inline" };
        headers.insert(
            "Content-Disposition".to_string(),
            format!("{}; filename={}", disposition, self.effective_name()),
        );
        let metadata = fs::metadata(&self.path)
            .map_err(|e| Exception::HeaderComputeFailed(format!("{}: {}", self.path.display(), e)))?;
        headers.insert("Content-Length".to_string(), metadata.len().to_string());
        if self.x_sendfile {
            headers.insert(
                "X-Sendfile".to_string(),
                self.path.to_string_lossy().to_string(),
            );
        }
        Ok(headers)
    }

    fn output(&mut self, _mime: &str, out: &mut dyn Write) -> Result<(), Exception> {
        // X-Sendfile 模式下传输由前端服务器完成，这里不写出任何字节
        if self.x_sendfile {
            return Ok(());
        }
        let mut file = File::open(&self.path)?;
        io::copy(&mut file, out)?;
        Ok(())
    }
}

// --- FileHandleResponse ---

/// 已打开的字节流直通响应（例如进程管道、内存流）
pub struct FileHandleResponse {
    reader: Box<dyn Read + Send>,
    mimes: Vec<String>,
}

impl FileHandleResponse {
    pub fn new(reader: Box<dyn Read + Send>, mimes: Vec<String>) -> Self {
        Self { reader, mimes }
    }

    /// 从共享的内存字节构造。`Bytes` 的克隆是引用计数的，
    /// 同一份内容可以廉价地服务多个请求。
    pub fn from_bytes(bytes: Bytes, mimes: Vec<String>) -> Self {
        Self::new(Box::new(io::Cursor::new(bytes)), mimes)
    }
}

impl Response for FileHandleResponse {
    fn mime_types(&self) -> Vec<String> {
        self.mimes.clone()
    }

    fn output(&mut self, _mime: &str, out: &mut dyn Write) -> Result<(), Exception> {
        io::copy(&mut self.reader, out)?;
        Ok(())
    }
}

// --- RedirectResponse ---

/// 重定向响应。默认发送 `Location` 头；设置了延迟秒数则改用
/// `Refresh: <n>; url=<url>` 形式。
pub struct RedirectResponse {
    url: String,
    delay: Option<u32>,
    status: u16,
}

impl RedirectResponse {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            delay: None,
            status: 302,
        }
    }

    /// 永久重定向（301）
    pub fn permanent(url: &str) -> Self {
        let mut response = Self::new(url);
        response.status = 301;
        response
    }

    /// 延迟 n 秒后跳转（Refresh 语义）
    pub fn set_delay(&mut self, seconds: u32) -> &mut Self {
        self.delay = Some(seconds);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Response for RedirectResponse {
    fn mime_types(&self) -> Vec<String> {
        vec!["text/html".to_string()]
    }

    fn headers(&self) -> Result<HashMap<String, String>, Exception> {
        let mut headers = HashMap::new();
        match self.delay {
            Some(seconds) => {
                headers.insert(
                    "Refresh".to_string(),
                    format!("{}; url={}", seconds, self.url),
                );
            }
            None => {
                headers.insert("Location".to_string(), self.url.clone());
            }
        }
        Ok(headers)
    }

    fn status_code(&self) -> u16 {
        self.status
    }

    fn output(&mut self, _mime: &str, out: &mut dyn Write) -> Result<(), Exception> {
        let body = format!(
            r#"<html><body>Redirecting to <a href="{}">{}</a></body></html>"#,
            self.url, self.url
        );
        out.write_all(body.as_bytes())?;
        Ok(())
    }
}

// --- ErrorResponse ---

/// 错误占位响应。声明多种候选 MIME，按协商结果把自身重写为
/// HTML 错误页、纯文本或 JSON 数据响应。
pub struct ErrorResponse {
    status: u16,
    message: String,
}

impl ErrorResponse {
    pub fn new(status: u16, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
        }
    }

    /// 500：管线没有产出任何响应等内部故障
    pub fn internal(message: &str) -> Self {
        Self::new(500, message)
    }

    /// 406：内容协商失败
    pub fn not_acceptable() -> Self {
        Self::new(406, "No acceptable content type could be negotiated")
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Response for ErrorResponse {
    fn mime_types(&self) -> Vec<String> {
        vec![
            "text/html".to_string(),
            "application/json".to_string(),
            "text/plain".to_string(),
        ]
    }

    fn status_code(&self) -> u16 {
        self.status
    }

    fn transform(&self, mime: &str) -> Result<Option<Box<dyn Response>>, Exception> {
        let transformed: Box<dyn Response> = if mime.eq_ignore_ascii_case("application/json") {
            let mut data = DataResponse::new(serde_json::json!({
                "status": self.status,
                "error": self.message,
            }));
            data.set_status(self.status);
            Box::new(data)
        } else if mime.eq_ignore_ascii_case("text/plain") {
            let body = format!("{} {}: {}", self.status, status_reason(self.status), self.message);
            let mut response =
                StringResponse::with_mimes(&body, vec!["text/plain".to_string()]);
            response.set_status(self.status);
            Box::new(response)
        } else {
            let html = HtmlBuilder::from_status_code(self.status, Some(&self.message)).build();
            let mut response = StringResponse::new(&html);
            response.set_status(self.status);
            Box::new(response)
        };
        Ok(Some(transformed))
    }

    fn output(&mut self, _mime: &str, out: &mut dyn Write) -> Result<(), Exception> {
        // 正常路径上 transform 会先把自身重写掉；这里是未转换时的兜底
        let body = format!("{} {}: {}", self.status, status_reason(self.status), self.message);
        out.write_all(body.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_response_output() {
        let mut response = StringResponse::new("hello");
        let mut out = Vec::new();
        response.output("text/html", &mut out).unwrap();

        assert_eq!(out, b"hello");
        assert_eq!(response.status_code(), 200);
    }

    #[test]
    fn test_string_response_headers_and_status() {
        let mut response = StringResponse::new("x");
        response.set_status(201).set_header("X-Custom", "1");

        assert_eq!(response.status_code(), 201);
        assert_eq!(response.headers().unwrap().get("X-Custom").unwrap(), "1");
    }

    #[test]
    fn test_data_response_json_output() {
        let mut response = DataResponse::new(serde_json::json!({"key": "value"}));
        let mut out = Vec::new();
        response.output("application/json", &mut out).unwrap();

        let parsed: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed["key"], "value");
        assert_eq!(response.mime_types(), vec!["application/json"]);
    }

    #[test]
    fn test_file_response_mime_from_extension() {
        let response = FileResponse::new("static/logo.png");
        assert_eq!(response.mime_types(), vec!["image/png"]);

        let response = FileResponse::new("static/unknown.zzz");
        assert_eq!(response.mime_types(), vec!["application/octet-stream"]);
    }

    #[test]
    fn test_file_response_headers() {
        use std::io::Write as _;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"file body").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let mut response = FileResponse::new(&path);
        response.set_download(true).set_file_name("report.bin");
        let headers = response.headers().unwrap();

        assert_eq!(
            headers.get("Content-Disposition").unwrap(),
            "download; filename=report.bin"
        );
        assert_eq!(headers.get("Content-Length").unwrap(), "9");
        assert!(headers.get("X-Sendfile").is_none());
    }

    #[test]
    fn test_file_response_x_sendfile() {
        use std::io::Write as _;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"abc").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let mut response = FileResponse::new(&path);
        response.set_x_sendfile(true);

        let headers = response.headers().unwrap();
        assert_eq!(headers.get("X-Sendfile").unwrap(), &path);

        // X-Sendfile 模式下不写出正文
        let mut out = Vec::new();
        response.output("application/octet-stream", &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_file_response_missing_file_header_error() {
        let response = FileResponse::new("/nonexistent/path/file.bin");
        match response.headers() {
            Err(Exception::HeaderComputeFailed(_)) => {}
            Err(e) => panic!("Expected HeaderComputeFailed, got {}", e),
            Ok(_) => panic!("Expected HeaderComputeFailed"),
        }
    }

    #[test]
    fn test_file_handle_response_passthrough() {
        let reader = Box::new(io::Cursor::new(b"stream bytes".to_vec()));
        let mut response =
            FileHandleResponse::new(reader, vec!["application/octet-stream".to_string()]);

        let mut out = Vec::new();
        response.output("application/octet-stream", &mut out).unwrap();
        assert_eq!(out, b"stream bytes");
    }

    #[test]
    fn test_file_handle_response_from_bytes() {
        let payload = Bytes::from_static(b"shared payload");
        let mut response =
            FileHandleResponse::from_bytes(payload.clone(), vec!["text/plain".to_string()]);

        let mut out = Vec::new();
        response.output("text/plain", &mut out).unwrap();
        assert_eq!(out, payload.as_ref());
    }

    #[test]
    fn test_redirect_location() {
        let response = RedirectResponse::new("https://example.com/next");
        let headers = response.headers().unwrap();

        assert_eq!(response.status_code(), 302);
        assert_eq!(headers.get("Location").unwrap(), "https://example.com/next");
        assert!(headers.get("Refresh").is_none());
    }

    #[test]
    fn test_redirect_refresh_with_delay() {
        let mut response = RedirectResponse::new("https://example.com/next");
        response.set_delay(3);
        let headers = response.headers().unwrap();

        assert_eq!(
            headers.get("Refresh").unwrap(),
            "3; url=https://example.com/next"
        );
        assert!(headers.get("Location").is_none());
    }

    #[test]
    fn test_redirect_permanent() {
        let response = RedirectResponse::permanent("https://example.com/");
        assert_eq!(response.status_code(), 301);
    }

    #[test]
    fn test_error_response_transform_to_json() {
        let error = ErrorResponse::new(404, "missing");
        let mut transformed = error.transform("application/json").unwrap().unwrap();

        assert_eq!(transformed.status_code(), 404);
        let mut out = Vec::new();
        transformed.output("application/json", &mut out).unwrap();
        let parsed: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed["status"], 404);
        assert_eq!(parsed["error"], "missing");
    }

    #[test]
    fn test_error_response_transform_to_html() {
        let error = ErrorResponse::new(500, "boom");
        let mut transformed = error.transform("text/html").unwrap().unwrap();

        let mut out = Vec::new();
        transformed.output("text/html", &mut out).unwrap();
        let body = String::from_utf8(out).unwrap();
        assert!(body.contains("<!DOCTYPE html>"));
        assert!(body.contains("500"));
        assert!(body.contains("boom"));
    }

    #[test]
    fn test_error_response_transform_to_plain() {
        let error = ErrorResponse::new(406, "nope");
        let mut transformed = error.transform("text/plain").unwrap().unwrap();

        let mut out = Vec::new();
        transformed.output("text/plain", &mut out).unwrap();
        let body = String::from_utf8(out).unwrap();
        assert_eq!(body, "406 Not Acceptable: nope");
    }

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(200), "OK");
        assert_eq!(status_reason(406), "Not Acceptable");
        assert_eq!(status_reason(599), "Unknown");
    }
}
