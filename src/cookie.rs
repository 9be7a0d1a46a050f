//! # Cookie 模块
//!
//! 描述一条 `Set-Cookie` 指令的值对象。由响应层或会话层构造，
//! 可通过 setter 修改，一旦交给 `ProcessResult` / Responder 即视为只读，
//! 仅在输出阶段被消费一次。

use chrono::{DateTime, Utc};

use crate::util::http_date;

/// 一条待下发的 Cookie。
///
/// `expires` 为 Unix 时间戳（秒），`0` 表示会话 Cookie（不写 Expires 属性）。
#[derive(Debug, Clone, PartialEq)]
pub struct Cookie {
    name: String,
    value: String,
    domain: String,
    path: String,
    expires: i64,
    secure: bool,
    http_only: bool,
}

impl Cookie {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            domain: String::new(),
            path: "/".to_string(),
            expires: 0,
            secure: false,
            http_only: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn expires(&self) -> i64 {
        self.expires
    }

    pub fn secure(&self) -> bool {
        self.secure
    }

    pub fn http_only(&self) -> bool {
        self.http_only
    }

    pub fn set_value(&mut self, value: &str) -> &mut Self {
        self.value = value.to_string();
        self
    }

    pub fn set_domain(&mut self, domain: &str) -> &mut Self {
        self.domain = domain.to_string();
        self
    }

    pub fn set_path(&mut self, path: &str) -> &mut Self {
        self.path = path.to_string();
        self
    }

    /// 以 Unix 时间戳（秒）设置过期时间
    pub fn set_expires(&mut self, timestamp: i64) -> &mut Self {
        self.expires = timestamp;
        self
    }

    pub fn set_secure(&mut self, secure: bool) -> &mut Self {
        self.secure = secure;
        self
    }

    pub fn set_http_only(&mut self, http_only: bool) -> &mut Self {
        self.http_only = http_only;
        self
    }

    /// 渲染为 `Set-Cookie` 头的值部分
    pub fn header_value(&self) -> String {
        let mut parts = vec![format!("{}={}", self.name, self.value)];
        if self.expires > 0 {
            if let Some(date) = DateTime::<Utc>::from_timestamp(self.expires, 0) {
                parts.push(format!("Expires={}", http_date(&date)));
            }
        }
        if !self.path.is_empty() {
            parts.push(format!("Path={}", self.path));
        }
        if !self.domain.is_empty() {
            parts.push(format!("Domain={}", self.domain));
        }
        if self.secure {
            parts.push("Secure".to_string());
        }
        if self.http_only {
            parts.push("HttpOnly".to_string());
        }
        parts.join("; ")
    }
}
